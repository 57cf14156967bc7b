//! RTCM3 framing helpers.
//!
//! Only the length field and the message number are read; the payload and
//! the trailing 24-bit CRC are carried through unchecked.

pub mod layout;
pub mod parser;

pub use parser::{frame_length, message_id, reserved_bits_clear};
