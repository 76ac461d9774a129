//! ID3v2 tag decoding
//!
//! Turns the tag region at the start of an audio file into an ordered list of
//! [`TagFrame`]s. Decoding is a pure function of the input buffer and never
//! fails: a damaged frame ends the walk and the frames read before it are
//! returned.
//!
//! Layout handled here:
//!
//! ```text
//! tag header (10 bytes)
//!   "ID3" | major | revision | flags | synchsafe body size (4)
//! [extended header]
//! frame*
//!   id (4 ASCII) | content size (4, big-endian) | flags (2) | content
//! padding (0x00 …)
//! ```

mod encoding;
mod synchsafe;

pub use encoding::TextEncoding;
pub use synchsafe::{decode_synchsafe, encode_synchsafe, MAX_SYNCHSAFE};

use serde::{Deserialize, Serialize};
use synchsafe::read_synchsafe;

/// Size of the tag header at offset 0
pub const HEADER_SIZE: usize = 10;

/// Size of every frame header
pub const FRAME_HEADER_SIZE: usize = 10;

/// Frames whose text is prefixed by a three-letter language code
const LANGUAGE_FRAMES: [&str; 4] = ["USLT", "SYLT", "COMM", "USER"];

/// Frames carrying a binary payload after the encoding byte
const BINARY_FRAMES: [&str; 1] = ["APIC"];

const FLAG_EXTENDED_HEADER: u8 = 0x40;

/// Decoded content of a frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameValue {
    /// Text decoded with the frame's encoding
    Text(String),

    /// Raw bytes (embedded pictures and frames without a text layout)
    Binary(Vec<u8>),
}

impl FrameValue {
    /// Text content, if this is a text frame
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Binary(_) => None,
        }
    }

    /// Raw content, if this is a binary frame
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Text(_) => None,
            Self::Binary(bytes) => Some(bytes),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.is_empty(),
            Self::Binary(bytes) => bytes.is_empty(),
        }
    }
}

/// One frame read from a tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagFrame {
    /// Four-character frame identifier (e.g. `TIT2`)
    pub id: String,

    /// Decoded payload
    pub value: FrameValue,

    /// Encoding byte of the frame, when it has one
    pub encoding: Option<TextEncoding>,

    /// Language code for comment and lyrics frames
    pub language: Option<String>,

    /// Bytes the frame occupies in the buffer, header included
    pub size_in_buffer: usize,
}

/// Fixed header at the start of a tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagHeader {
    /// Major version (3 for ID3v2.3, 4 for ID3v2.4)
    pub major_version: u8,

    /// Revision number
    pub revision: u8,

    /// Header flags
    pub flags: u8,

    /// Size of everything after the header, in bytes
    pub body_size: u32,
}

impl TagHeader {
    /// Parse the header at the start of `buffer`
    ///
    /// Returns `None` when the buffer is too short, lacks the `ID3`
    /// identifier, or uses a version other than 2.3 / 2.4.
    pub fn parse(buffer: &[u8]) -> Option<Self> {
        let header = buffer.get(..HEADER_SIZE)?;
        if &header[..3] != b"ID3" {
            return None;
        }

        let major_version = header[3];
        if !matches!(major_version, 3 | 4) {
            return None;
        }

        Some(Self {
            major_version,
            revision: header[4],
            flags: header[5],
            body_size: read_synchsafe([header[6], header[7], header[8], header[9]]),
        })
    }

    /// Offset one past the last byte of the tag
    pub fn tag_end(&self) -> usize {
        HEADER_SIZE + self.body_size as usize
    }

    pub fn has_extended_header(&self) -> bool {
        self.flags & FLAG_EXTENDED_HEADER != 0
    }

    fn frame_size(&self, raw: [u8; 4]) -> usize {
        // ID3v2.4 stores frame sizes synchsafe; v2.3 uses a plain integer
        if self.major_version == 4 {
            read_synchsafe(raw) as usize
        } else {
            u32::from_be_bytes(raw) as usize
        }
    }

    fn extended_header_len(&self, tag: &[u8]) -> Option<usize> {
        let raw = tag.get(HEADER_SIZE..HEADER_SIZE + 4)?;
        let raw = [raw[0], raw[1], raw[2], raw[3]];

        if self.major_version == 4 {
            Some(read_synchsafe(raw) as usize)
        } else {
            Some(u32::from_be_bytes(raw) as usize + 4)
        }
    }
}

/// Outcome of reading one frame
enum FrameRead {
    Frame(TagFrame),
    Padding,
    Malformed(&'static str),
}

/// Decode every frame in the tag at the start of `buffer`
///
/// Stops at padding, at the declared end of the tag, at the end of the
/// buffer, or at the first malformed frame, returning what was read.
pub fn decode(buffer: &[u8]) -> Vec<TagFrame> {
    let Some(header) = TagHeader::parse(buffer) else {
        return Vec::new();
    };

    let tag = &buffer[..header.tag_end().min(buffer.len())];
    let mut offset = HEADER_SIZE;

    if header.has_extended_header() {
        match header.extended_header_len(tag) {
            Some(len) => offset += len,
            None => return Vec::new(),
        }
    }

    let mut frames = Vec::new();
    while offset < tag.len() {
        match read_frame(&header, tag, offset) {
            FrameRead::Frame(frame) => {
                offset += frame.size_in_buffer;
                frames.push(frame);
            }
            FrameRead::Padding => break,
            FrameRead::Malformed(reason) => {
                tracing::debug!(offset, reason, "Stopping tag decode");
                break;
            }
        }
    }

    frames
}

fn read_frame(header: &TagHeader, tag: &[u8], offset: usize) -> FrameRead {
    if tag[offset] == 0 {
        return FrameRead::Padding;
    }

    let Some(frame_header) = tag.get(offset..offset + FRAME_HEADER_SIZE) else {
        return FrameRead::Malformed("truncated frame header");
    };

    let id_bytes = &frame_header[..4];
    if !id_bytes
        .iter()
        .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
    {
        return FrameRead::Malformed("invalid frame identifier");
    }
    let id: String = id_bytes.iter().map(|&b| char::from(b)).collect();

    let size = header.frame_size([
        frame_header[4],
        frame_header[5],
        frame_header[6],
        frame_header[7],
    ]);

    let content_start = offset + FRAME_HEADER_SIZE;
    let Some(content) = content_start
        .checked_add(size)
        .and_then(|content_end| tag.get(content_start..content_end))
    else {
        return FrameRead::Malformed("frame runs past end of tag");
    };

    let (value, encoding, language) = decode_content(&id, content);

    FrameRead::Frame(TagFrame {
        id,
        value,
        encoding,
        language,
        size_in_buffer: FRAME_HEADER_SIZE + size,
    })
}

fn decode_content(
    id: &str,
    content: &[u8],
) -> (FrameValue, Option<TextEncoding>, Option<String>) {
    let textual = id.starts_with('T') || LANGUAGE_FRAMES.contains(&id);
    let binary = BINARY_FRAMES.contains(&id);

    if !textual && !binary {
        return (FrameValue::Binary(content.to_vec()), None, None);
    }

    let Some((&encoding_byte, body)) = content.split_first() else {
        let empty = if binary {
            FrameValue::Binary(Vec::new())
        } else {
            FrameValue::Text(String::new())
        };
        return (empty, None, None);
    };

    let Some(encoding) = TextEncoding::from_byte(encoding_byte) else {
        tracing::debug!(id, encoding_byte, "Unknown text encoding, keeping raw frame");
        return (FrameValue::Binary(content.to_vec()), None, None);
    };

    if binary {
        return (FrameValue::Binary(body.to_vec()), Some(encoding), None);
    }

    if LANGUAGE_FRAMES.contains(&id) && body.len() >= 3 {
        let (code, rest) = body.split_at(3);
        return (
            FrameValue::Text(decode_described(encoding, rest)),
            Some(encoding),
            Some(TextEncoding::Latin1.decode(code)),
        );
    }

    (FrameValue::Text(encoding.decode(body)), Some(encoding), None)
}

/// Decode a `<description> NUL <text>` body as `"description\0text"`
///
/// Both strings are decoded on their own so each may carry its own BOM.
fn decode_described(encoding: TextEncoding, body: &[u8]) -> String {
    match encoding.find_terminator(body) {
        Some((description_len, terminator_len)) => {
            let description = encoding.decode(&body[..description_len]);
            let text = encoding.decode(&body[description_len + terminator_len..]);
            format!("{description}\0{text}")
        }
        None => encoding.decode(body),
    }
}
