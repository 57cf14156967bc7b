//! UBX binary protocol decoding.
//!
//! Frames reach this module already checksum-verified by the demultiplexer.
//! The registry resolves (class, message) pairs to typed messages, the
//! parser unpacks fixed little-endian layouts into physical units, and the
//! decoder is the only code that writes `NavigationState`.
//!
//! Offsets and scale factors live in `layout`; bounds-checked payload access
//! lives in `reader`. Decoding never indexes past the payload.

pub mod checksum;
pub mod decoder;
pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;
pub mod registry;

pub use checksum::{ChecksumCalc, build_frame, checksum, frame_checksum, verify};
pub use decoder::{DecodeOutcome, decode, decode_frame};
pub use error::UbxError;
pub use parser::{PosLlh, RelPosNed, UniqueId, parse_posllh, parse_relposned, parse_uniqid};
pub use registry::{Lookup, UbxClass, UbxMessage, lookup};

/// SEC-UNIQID poll request (empty payload).
pub const UNIQID_POLL: [u8; 8] = [0xB5, 0x62, 0x27, 0x03, 0x00, 0x00, 0x2A, 0xA5];
