//! Reverie Metadata
//!
//! Tag decoding, track metadata and library scanning for Reverie.
//!
//! This crate provides:
//! - An ID3v2.3 / v2.4 tag decoder that tolerates damaged tags
//! - [`TrackMetadata`] built from decoded frames
//! - [`Track`], the library's unit of playback
//! - A directory scanner that turns audio files into tracks
//!
//! # Example
//!
//! ```rust
//! use reverie_metadata::{build_metadata, id3};
//!
//! // ID3v2.3 header declaring a 15-byte body, then one UTF-8 TIT2 frame
//! let mut tag = b"ID3\x03\x00\x00\x00\x00\x00\x0f".to_vec();
//! tag.extend_from_slice(b"TIT2\x00\x00\x00\x05\x00\x00\x03Song");
//!
//! let frames = id3::decode(&tag);
//! assert_eq!(frames.len(), 1);
//!
//! let metadata = build_metadata(&frames);
//! assert_eq!(metadata.title.as_deref(), Some("Song"));
//! ```
//!
//! # Example: Scanning
//!
//! ```rust,no_run
//! use reverie_metadata::LibraryScanner;
//! use std::path::PathBuf;
//! # async fn example() -> reverie_metadata::Result<()> {
//! let scanner = LibraryScanner::new();
//! let report = scanner.scan(&[PathBuf::from("/music")], None).await?;
//! for track in &report.tracks {
//!     println!("{}", track.display_title());
//! }
//! # Ok(())
//! # }
//! ```

mod error;
pub mod id3;
mod metadata;
mod scanner;
mod track;

pub use error::{MetadataError, Result};
pub use id3::{FrameValue, TagFrame, TextEncoding};
pub use metadata::{build_metadata, AlbumArt, TrackMetadata};
pub use scanner::{LibraryScanner, ScanConfig, ScanProgress, ScanReport, ScanStats};
pub use track::Track;
