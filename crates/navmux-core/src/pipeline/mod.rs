//! Decoding session.
//!
//! A [`Session`] drives the demultiplexer over a [`ByteSource`], applies the
//! error policy, archives valid UBX frames, and hands them to the decoder.
//! Recoverable problems are counted and logged; only the end of the stream,
//! a transport failure, or a sink failure stop the loop.
//!
//! The same session type backs live acquisition, capture replay and device
//! identification.

mod summary;

pub use summary::{
    DEFAULT_GENERATED_AT, DecodedCounts, ErrorCounts, FrameCounts, InputInfo, SUMMARY_VERSION,
    SessionSummary, ToolInfo,
};

use std::path::Path;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::demux::{DemuxError, Demultiplexer, FrameKind, ProtocolFrame, TextLine, UbxFrame};
use crate::protocols::nmea;
use crate::protocols::ubx::{DecodeOutcome, UbxError, decode_frame};
use crate::sink::{FrameSink, SinkError};
use crate::source::{ByteSource, SourceError, StreamSource};
use crate::state::{NavigationState, StateStore};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),
}

/// What one `step` produced.
#[derive(Debug, Clone, PartialEq)]
pub enum StepEvent {
    /// A UBX frame was decoded (or recognized as unhandled).
    Decoded(DecodeOutcome),
    /// An NMEA or AIS line, passed through uninterpreted.
    Sentence { kind: FrameKind, line: TextLine },
    Rtcm3 { message_id: Option<u16>, length: u16 },
    Unrecognized(u8),
    /// The frame was discarded under the error policy.
    Dropped,
}

pub struct Session<St> {
    demux: Demultiplexer,
    state: St,
    sink: Option<Box<dyn FrameSink>>,
    summary: SessionSummary,
}

impl<St: StateStore> Session<St> {
    pub fn new(state: St) -> Self {
        Self {
            demux: Demultiplexer::default(),
            state,
            sink: None,
            summary: SessionSummary::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.demux = Demultiplexer::new(timeout);
        self
    }

    /// Archive every checksum-valid UBX frame to `sink` before decoding it.
    pub fn with_sink(mut self, sink: impl FrameSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn state(&self) -> &St {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut St {
        &mut self.state
    }

    pub fn into_state(self) -> St {
        self.state
    }

    /// Process exactly one frame.
    ///
    /// Returns `Ok(None)` at end of stream.
    ///
    /// # Errors
    /// Transport and sink failures; everything else is absorbed.
    pub fn step<S: ByteSource + ?Sized>(
        &mut self,
        source: &mut S,
    ) -> Result<Option<StepEvent>, PipelineError> {
        let frame = match self.demux.next_frame(source) {
            Ok(Some(frame)) => frame,
            Ok(None) => return Ok(None),
            Err(DemuxError::Source(err)) => return Err(err.into()),
            Err(err) => {
                self.summary.record_demux_error(&err);
                match err {
                    DemuxError::SyncMismatch { .. } => debug!(error = %err, "frame dropped"),
                    _ => warn!(error = %err, "frame dropped"),
                }
                return Ok(Some(StepEvent::Dropped));
            }
        };

        self.summary.record_frame(frame.kind());
        let event = match frame {
            ProtocolFrame::Ubx(frame) => self.handle_ubx(frame)?,
            ProtocolFrame::Nmea(line) => text_event(FrameKind::Nmea, line),
            ProtocolFrame::Ais(line) => text_event(FrameKind::Ais, line),
            ProtocolFrame::Rtcm3(frame) => {
                trace!(message_id = ?frame.message_id, length = frame.length, "RTCM3 frame");
                self.summary.record_rtcm3(frame.message_id);
                StepEvent::Rtcm3 {
                    message_id: frame.message_id,
                    length: frame.length,
                }
            }
            ProtocolFrame::Unrecognized(byte) => {
                trace!(byte, "unrecognized leading byte");
                StepEvent::Unrecognized(byte)
            }
        };
        Ok(Some(event))
    }

    /// Step until the stream ends.
    pub fn run<S: ByteSource + ?Sized>(&mut self, source: &mut S) -> Result<(), PipelineError> {
        self.run_until(source, |_| false).map(|_| ())
    }

    /// Step until `stop` accepts an event or the stream ends.
    ///
    /// Returns the accepted event, or `None` if the stream ended first.
    pub fn run_until<S: ByteSource + ?Sized>(
        &mut self,
        source: &mut S,
        mut stop: impl FnMut(&StepEvent) -> bool,
    ) -> Result<Option<StepEvent>, PipelineError> {
        while let Some(event) = self.step(source)? {
            if stop(&event) {
                return Ok(Some(event));
            }
        }
        debug!(
            ubx = self.summary.frames.ubx,
            dropped = self.summary.dropped(),
            "end of stream"
        );
        Ok(None)
    }

    /// Counters so far plus the current navigation record.
    pub fn summary(&mut self) -> SessionSummary {
        let mut summary = self.summary.clone();
        summary.navigation = self.state.with_state(|state| state.snapshot());
        summary.generated_at = summary::now_rfc3339();
        summary
    }

    fn handle_ubx(&mut self, frame: UbxFrame) -> Result<StepEvent, PipelineError> {
        if let Some(sink) = self.sink.as_mut() {
            sink.archive(&frame.to_wire_bytes())?;
        }

        match self.state.with_state(|state| decode_frame(&frame, state)) {
            Ok(outcome) => {
                self.summary.record_decode(&outcome);
                trace!(?outcome, "UBX frame decoded");
                Ok(StepEvent::Decoded(outcome))
            }
            Err(err) => {
                self.summary.record_decode_error(&err);
                match err {
                    UbxError::MalformedPayload { .. } => warn!(error = %err, "UBX frame dropped"),
                    _ => debug!(error = %err, "UBX frame dropped"),
                }
                Ok(StepEvent::Dropped)
            }
        }
    }
}

fn text_event(kind: FrameKind, line: TextLine) -> StepEvent {
    trace!(?kind, tag = ?nmea::sentence_tag(&line.text), "sentence");
    StepEvent::Sentence { kind, line }
}

/// Decode a recorded byte stream from disk.
///
/// # Examples
/// ```no_run
/// use std::path::Path;
///
/// use navmux_core::replay_file;
///
/// let summary = replay_file(Path::new("capture.ubx"))?;
/// println!("headings: {}", summary.decoded.nav_relposned);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn replay_file(path: &Path) -> Result<SessionSummary, PipelineError> {
    let bytes = path.metadata()?.len();
    let mut source = StreamSource::open(path)?;
    info!(path = %path.display(), bytes, "replaying capture");

    let mut session = Session::new(NavigationState::new());
    session.run(&mut source)?;

    let mut summary = session.summary();
    summary.input = Some(InputInfo {
        path: path.display().to_string(),
        bytes,
    });
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocols::ubx::{self, layout};
    use std::io::Cursor;

    fn relposned(heading: i32) -> Vec<u8> {
        let mut payload = vec![0u8; layout::RELPOSNED_LEN];
        payload[layout::RELPOSNED_HEADING_RANGE].copy_from_slice(&heading.to_le_bytes());
        ubx::build_frame(layout::CLASS_NAV, layout::MSG_NAV_RELPOSNED, &payload).unwrap()
    }

    fn source(bytes: Vec<u8>) -> StreamSource<Cursor<Vec<u8>>> {
        StreamSource::new(Cursor::new(bytes))
    }

    #[test]
    fn decodes_heading_with_sink_attached() {
        let frame = relposned(9_000_000);
        let mut session = Session::new(NavigationState::new()).with_sink(Vec::<Vec<u8>>::new());
        let mut src = source(frame.clone());

        let event = session.step(&mut src).unwrap().unwrap();
        assert!(matches!(
            event,
            StepEvent::Decoded(DecodeOutcome::Heading { heading_deg, .. }) if (heading_deg - 90.0).abs() < 1e-9
        ));
        assert!(session.state().new_heading());
        assert!(session.step(&mut src).unwrap().is_none());
    }

    #[test]
    fn recoverable_errors_are_counted_not_returned() {
        let mut bytes = relposned(1);
        bytes[10] ^= 0xff;
        bytes.extend_from_slice(&[0xb5, 0x00]);
        bytes.push(0x7f);

        let mut session = Session::new(NavigationState::new());
        session.run(&mut source(bytes)).unwrap();

        let summary = session.summary();
        assert_eq!(summary.errors.checksum_mismatches, 1);
        assert_eq!(summary.errors.sync_mismatches, 1);
        assert_eq!(summary.frames.unrecognized_bytes, 1);
        assert_eq!(summary.frames.ubx, 0);
        assert!(!summary.navigation.new_heading);
    }

    #[test]
    fn unknown_class_is_dropped() {
        let frame = ubx::build_frame(0x99, 0x01, &[]).unwrap();
        let mut session = Session::new(NavigationState::new());
        let event = session.step(&mut source(frame)).unwrap().unwrap();
        assert_eq!(event, StepEvent::Dropped);
        assert_eq!(session.summary().errors.unknown_classes, 1);
    }

    #[test]
    fn run_until_stops_on_accepted_event() {
        let mut bytes = b"$GPGGA,1*00\r\n".to_vec();
        bytes.extend(relposned(100));
        bytes.extend(relposned(200));

        let mut session = Session::new(NavigationState::new());
        let mut src = source(bytes);
        let event = session
            .run_until(&mut src, |event| matches!(event, StepEvent::Decoded(_)))
            .unwrap();
        assert!(matches!(event, Some(StepEvent::Decoded(_))));
        assert_eq!(session.summary().frames.nmea, 1);
        assert_eq!(session.summary().decoded.nav_relposned, 1);
    }

    struct FailingSink;

    impl FrameSink for FailingSink {
        fn archive(&mut self, _frame: &[u8]) -> Result<(), SinkError> {
            Err(SinkError::Io {
                path: "capture.ubx".into(),
                source: std::io::Error::other("disk full"),
            })
        }
    }

    #[test]
    fn sink_failure_stops_before_decode() {
        let mut session = Session::new(NavigationState::new()).with_sink(FailingSink);
        let err = session.step(&mut source(relposned(5))).unwrap_err();
        assert!(matches!(err, PipelineError::Sink(_)));
        assert!(!session.state().new_heading());
    }
}
