pub const PREAMBLE: u8 = 0xD3;

pub const LENGTH_LEN: usize = 2;
pub const CRC_LEN: usize = 3;

/// Bits of the length field defined by the public framing; the upper six
/// are reserved. Frames here are read using the full 16 bits.
pub const LENGTH_MASK: u16 = 0x03FF;

pub const MESSAGE_ID_RANGE: std::ops::Range<usize> = 0..2;
pub const MESSAGE_ID_SHIFT: u32 = 4;
