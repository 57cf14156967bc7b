//! navmux core library: demultiplexing and decoding of a mixed GNSS stream.
//!
//! A u-blox receiver interleaves four protocols on one serial line: UBX
//! binary frames, NMEA-0183 and AIS sentences, and RTCM3 corrections. This
//! crate splits that stream into frames by leading sync byte, verifies UBX
//! checksums, decodes the UBX navigation messages that carry heading,
//! position and device identity, and keeps the latest values in a
//! [`NavigationState`] with dirty flags for consumers.
//!
//! Layering: `source` (byte I/O) → `demux` (framing) → `protocols::ubx`
//! (registry, layout/reader/parser, decoder) → `state`. A [`Session`] wires
//! these together, applies the error policy and produces a
//! [`SessionSummary`]. NMEA and AIS lines are framed, not interpreted;
//! RTCM3 frames expose only their length and message number.
//!
//! Invariants:
//! - Only checksum-valid UBX frames reach the decoder or the capture sink.
//! - A decode either fully succeeds or leaves the state untouched.
//! - Dirty flags are set by the decoder and cleared only by consumers.
//!
//! # Examples
//! ```
//! use std::io::Cursor;
//!
//! use navmux_core::{NavigationState, Session, StreamSource};
//!
//! let bytes = b"$GPGGA,1*00\r\n".to_vec();
//! let mut source = StreamSource::new(Cursor::new(bytes));
//! let mut session = Session::new(NavigationState::new());
//! session.run(&mut source)?;
//! assert_eq!(session.summary().frames.nmea, 1);
//! # Ok::<(), navmux_core::PipelineError>(())
//! ```

pub mod demux;
pub mod discovery;
mod pipeline;
mod protocols;
pub mod roles;
pub mod sink;
mod source;
mod state;

pub use protocols::{nmea, rtcm3, ubx};

pub use demux::{DemuxError, Demultiplexer, FrameKind, ProtocolFrame};
pub use discovery::{DiscoveryError, Identification};
pub use pipeline::{
    DEFAULT_GENERATED_AT, DecodedCounts, ErrorCounts, FrameCounts, InputInfo, PipelineError,
    SUMMARY_VERSION, Session, SessionSummary, StepEvent, ToolInfo, replay_file,
};
pub use roles::{DeviceRole, RoleTable, RoleTableError};
pub use sink::{CaptureFile, FrameSink, SinkError};
pub use source::{ByteSource, SourceError, StreamSource};
#[cfg(feature = "serial")]
pub use source::{DEFAULT_BAUD_RATE, SerialSource};
pub use state::{NavigationSnapshot, NavigationState, SharedNavigationState, StateStore};
