//! Synchsafe integers
//!
//! A synchsafe integer stores 28 significant bits in four bytes, seven bits
//! per byte with the top bit always clear, so the encoded value can never
//! contain a `0xFF` that an MPEG decoder would mistake for a frame sync.

/// Largest value representable as a synchsafe integer (2^28 - 1)
pub const MAX_SYNCHSAFE: u32 = (1 << 28) - 1;

const LOW_SEVEN: u32 = 0b0111_1111;

/// Unpack a big-endian synchsafe integer
///
/// The top bit of each byte is ignored.
pub fn decode_synchsafe(raw: u32) -> u32 {
    let b1 = raw & LOW_SEVEN;
    let b2 = (raw >> 8) & LOW_SEVEN;
    let b3 = (raw >> 16) & LOW_SEVEN;
    let b4 = (raw >> 24) & LOW_SEVEN;

    b1 | (b2 << 7) | (b3 << 14) | (b4 << 21)
}

/// Pack a value into a big-endian synchsafe integer
///
/// Bits above [`MAX_SYNCHSAFE`] are discarded.
pub fn encode_synchsafe(value: u32) -> u32 {
    let value = value & MAX_SYNCHSAFE;

    (value & LOW_SEVEN)
        | (((value >> 7) & LOW_SEVEN) << 8)
        | (((value >> 14) & LOW_SEVEN) << 16)
        | (((value >> 21) & LOW_SEVEN) << 24)
}

/// Read a synchsafe integer from four big-endian bytes
pub(crate) fn read_synchsafe(bytes: [u8; 4]) -> u32 {
    decode_synchsafe(u32::from_be_bytes(bytes))
}
