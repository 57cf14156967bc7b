//! Protocol decoding modules.
//!
//! Each binary protocol follows a layered structure:
//! - `layout`: byte offsets, sync bytes and scale factors (source of truth)
//! - `reader`: safe byte access and protocol conventions
//! - `parser`: domain-level decoding (no direct byte indexing)
//! - `error`: explicit, actionable errors
//!
//! Parsers are pure and contain no I/O; the demultiplexer reads frames from
//! a `ByteSource` and hands complete, verified frames to these modules.

pub mod nmea;
pub mod rtcm3;
pub mod ubx;
