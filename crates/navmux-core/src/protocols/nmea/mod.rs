//! NMEA-0183 helpers.
//!
//! Incoming NMEA and AIS lines are framed by the demultiplexer and never
//! interpreted beyond their sentence tag. This module formats the outbound
//! heading sentences (HDT, THS).

pub mod sentence;

pub use sentence::{DEFAULT_TALKER, ThsMode, checksum, hdt, sentence_tag, ths};
