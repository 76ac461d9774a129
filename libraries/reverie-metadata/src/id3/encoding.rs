//! Text encodings used by ID3v2 text frames

use serde::{Deserialize, Serialize};

/// Encoding selected by the first content byte of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextEncoding {
    /// `0`: ISO-8859-1
    Latin1,

    /// `1`: UTF-16 with byte order mark
    Utf16,

    /// `2`: UTF-16 big-endian without BOM
    Utf16Be,

    /// `3`: UTF-8
    Utf8,
}

impl TextEncoding {
    /// Map an encoding byte to its encoding
    ///
    /// Returns `None` for bytes outside `0..=3`.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Latin1),
            1 => Some(Self::Utf16),
            2 => Some(Self::Utf16Be),
            3 => Some(Self::Utf8),
            _ => None,
        }
    }

    /// Encoding byte as stored in a frame
    pub fn as_byte(self) -> u8 {
        match self {
            Self::Latin1 => 0,
            Self::Utf16 => 1,
            Self::Utf16Be => 2,
            Self::Utf8 => 3,
        }
    }

    /// Width of a string terminator in this encoding
    pub fn terminator_len(self) -> usize {
        match self {
            Self::Latin1 | Self::Utf8 => 1,
            Self::Utf16 | Self::Utf16Be => 2,
        }
    }

    /// Decode `bytes` into a string
    ///
    /// Invalid sequences are replaced with U+FFFD rather than rejected. A
    /// leading BOM is consumed and trailing NUL terminators are trimmed.
    pub fn decode(self, bytes: &[u8]) -> String {
        let text = match self {
            Self::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
            Self::Utf8 => {
                let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
                String::from_utf8_lossy(bytes).into_owned()
            }
            Self::Utf16 => match bytes {
                [0xFE, 0xFF, rest @ ..] => decode_utf16(rest, u16::from_be_bytes),
                [0xFF, 0xFE, rest @ ..] => decode_utf16(rest, u16::from_le_bytes),
                _ => decode_utf16(bytes, u16::from_le_bytes),
            },
            Self::Utf16Be => decode_utf16(bytes, u16::from_be_bytes),
        };

        trim_terminators(text)
    }

    /// Find the end of the first terminated string in `bytes`
    ///
    /// Returns `(string_len, terminator_len)` so callers can split structured
    /// frames such as `COMM` and `APIC`. `None` when no terminator exists.
    pub(crate) fn find_terminator(self, bytes: &[u8]) -> Option<(usize, usize)> {
        match self.terminator_len() {
            1 => bytes.iter().position(|&b| b == 0).map(|pos| (pos, 1)),
            _ => bytes
                .chunks_exact(2)
                .position(|pair| pair == [0, 0])
                .map(|unit| (unit * 2, 2)),
        }
    }
}

fn decode_utf16(bytes: &[u8], read_unit: fn([u8; 2]) -> u16) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| read_unit([pair[0], pair[1]]))
        .collect();

    String::from_utf16_lossy(&units)
}

fn trim_terminators(mut text: String) -> String {
    let trimmed_len = text.trim_end_matches('\0').len();
    text.truncate(trimmed_len);
    text
}
