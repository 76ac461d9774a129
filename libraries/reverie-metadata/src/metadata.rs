//! Track metadata built from decoded tag frames

use crate::id3::{FrameValue, TagFrame, TextEncoding};
use serde::{Deserialize, Serialize};

/// Embedded cover art from an `APIC` frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumArt {
    /// MIME type (e.g. "image/jpeg"), absent if the frame layout was unreadable
    pub mime_type: Option<String>,

    /// ID3 picture type (3 = front cover)
    pub picture_type: Option<u8>,

    /// Picture description
    pub description: Option<String>,

    /// Image bytes
    pub data: Vec<u8>,
}

impl AlbumArt {
    /// Split an `APIC` payload (everything after the encoding byte)
    ///
    /// Layout: MIME type (Latin-1, NUL-terminated), picture type byte,
    /// description (frame encoding, terminated), image data. When the layout
    /// does not fit, the whole payload is kept as image data.
    pub fn from_payload(encoding: Option<TextEncoding>, payload: &[u8]) -> Self {
        Self::parse(encoding.unwrap_or(TextEncoding::Latin1), payload).unwrap_or_else(|| Self {
            mime_type: None,
            picture_type: None,
            description: None,
            data: payload.to_vec(),
        })
    }

    fn parse(encoding: TextEncoding, payload: &[u8]) -> Option<Self> {
        let (mime_len, _) = TextEncoding::Latin1.find_terminator(payload)?;
        let mime_type = TextEncoding::Latin1.decode(&payload[..mime_len]);

        let rest = &payload[mime_len + 1..];
        let (&picture_type, rest) = rest.split_first()?;

        let (description_len, terminator_len) = encoding.find_terminator(rest)?;
        let description = encoding.decode(&rest[..description_len]);
        let data = rest[description_len + terminator_len..].to_vec();

        Some(Self {
            mime_type: non_empty(mime_type),
            picture_type: Some(picture_type),
            description: non_empty(description),
            data,
        })
    }
}

/// Metadata extracted from a track's tag
///
/// Every field is optional: files routinely carry only a subset of frames.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackMetadata {
    /// Track title
    pub title: Option<String>,

    /// Artist name
    pub artist: Option<String>,

    /// Album artist
    pub album_artist: Option<String>,

    /// Album name
    pub album: Option<String>,

    /// Genre
    pub genre: Option<String>,

    /// Release year
    pub year: Option<u32>,

    /// Publisher / label
    pub publisher: Option<String>,

    /// Position of the track on its disc
    pub track_number: Option<u32>,

    /// Number of tracks on the disc
    pub track_total: Option<u32>,

    /// Disc number within a set
    pub disc_number: Option<u32>,

    /// Number of discs in the set
    pub disc_total: Option<u32>,

    /// Free-form comment
    pub comment: Option<String>,

    /// Embedded cover art
    pub album_art: Option<AlbumArt>,
}

impl TrackMetadata {
    /// Create empty metadata
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if no field is set
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Metadata field a frame populates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Artist,
    AlbumArtist,
    Album,
    Genre,
    Year,
    Publisher,
    TrackPosition,
    DiscPosition,
    Comment,
    AlbumArt,
}

/// Frame identifier → metadata field
const FIELD_TABLE: [(&str, Field); 12] = [
    ("TIT2", Field::Title),
    ("TPE1", Field::Artist),
    ("TPE2", Field::AlbumArtist),
    ("TALB", Field::Album),
    ("TCON", Field::Genre),
    ("TYER", Field::Year),
    ("TDRC", Field::Year),
    ("TPUB", Field::Publisher),
    ("TRCK", Field::TrackPosition),
    ("TPOS", Field::DiscPosition),
    ("COMM", Field::Comment),
    ("APIC", Field::AlbumArt),
];

fn field_for(id: &str) -> Option<Field> {
    FIELD_TABLE
        .iter()
        .find(|(frame_id, _)| *frame_id == id)
        .map(|&(_, field)| field)
}

/// Fold decoded frames into track metadata
///
/// Frames without a table entry are ignored. When a frame id repeats, the
/// last occurrence wins.
pub fn build_metadata(frames: &[TagFrame]) -> TrackMetadata {
    let mut metadata = TrackMetadata::new();

    for frame in frames {
        let Some(field) = field_for(&frame.id) else {
            continue;
        };

        match (field, &frame.value) {
            (Field::AlbumArt, FrameValue::Binary(bytes)) => {
                metadata.album_art = Some(AlbumArt::from_payload(frame.encoding, bytes));
            }
            (field, FrameValue::Text(text)) => apply_text(&mut metadata, field, text),
            _ => {}
        }
    }

    metadata
}

fn apply_text(metadata: &mut TrackMetadata, field: Field, text: &str) {
    let value = || non_empty(text.trim().to_string());

    match field {
        Field::Title => metadata.title = value(),
        Field::Artist => metadata.artist = value(),
        Field::AlbumArtist => metadata.album_artist = value(),
        Field::Album => metadata.album = value(),
        Field::Genre => metadata.genre = value(),
        Field::Publisher => metadata.publisher = value(),
        Field::Year => metadata.year = parse_year(text),
        Field::TrackPosition => {
            (metadata.track_number, metadata.track_total) = parse_position(text);
        }
        Field::DiscPosition => {
            (metadata.disc_number, metadata.disc_total) = parse_position(text);
        }
        Field::Comment => {
            // "<description>\0<text>"
            let body = text.split_once('\0').map_or(text, |(_, body)| body);
            metadata.comment = non_empty(body.trim().to_string());
        }
        Field::AlbumArt => {}
    }
}

/// Leading four digits of a year or timestamp ("2019" or "2019-05-01")
fn parse_year(text: &str) -> Option<u32> {
    let text = text.trim();
    let digits = text.bytes().take_while(u8::is_ascii_digit).count();
    if digits < 4 {
        return None;
    }
    text[..4].parse().ok()
}

/// "3/12" → (Some(3), Some(12)); "3" → (Some(3), None)
fn parse_position(text: &str) -> (Option<u32>, Option<u32>) {
    let parse = |part: &str| -> Option<u32> { part.trim().parse().ok() };

    match text.split_once('/') {
        Some((number, total)) => (parse(number), parse(total)),
        None => (parse(text), None),
    }
}

fn non_empty(text: String) -> Option<String> {
    (!text.is_empty()).then_some(text)
}
