//! Stream demultiplexer.
//!
//! Classifies each frame by its leading byte and reads exactly one complete
//! frame per call:
//!
//! | leading byte | protocol | framing                                  |
//! |--------------|----------|------------------------------------------|
//! | `0xB5 0x62`  | UBX      | class, message, u16 LE length, checksum  |
//! | `$`          | NMEA     | read to end of line                      |
//! | `!`          | AIS      | read to end of line                      |
//! | `0xD3`       | RTCM3    | u16 BE length, payload, 24-bit CRC       |
//!
//! Any other byte is reported on its own. The demultiplexer never scans
//! forward to resynchronize: a short read or bad sync discards the partial
//! frame and the next call starts from the next unread byte.

mod error;
mod frame;

pub use error::{DemuxError, FrameStage};
pub use frame::{FrameKind, ProtocolFrame, Rtcm3Frame, TextLine, UbxFrame};

use std::time::Duration;

use tracing::debug;

use crate::protocols::rtcm3;
use crate::protocols::ubx::{self, layout};
use crate::source::ByteSource;

pub const NMEA_SYNC: u8 = b'$';
pub const AIS_SYNC: u8 = b'!';

/// Default per-read timeout, matching the receiver's serial configuration.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(2);

/// Read one frame from `source` with a one-off demultiplexer.
pub fn next_frame<S: ByteSource + ?Sized>(
    source: &mut S,
    timeout: Duration,
) -> Result<Option<ProtocolFrame>, DemuxError> {
    Demultiplexer::new(timeout).next_frame(source)
}

#[derive(Debug, Clone, Copy)]
pub struct Demultiplexer {
    timeout: Duration,
}

impl Default for Demultiplexer {
    fn default() -> Self {
        Self::new(DEFAULT_READ_TIMEOUT)
    }
}

impl Demultiplexer {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Read the next frame.
    ///
    /// Returns `Ok(None)` when the leading-byte read comes back empty; the
    /// caller must stop reading at that point.
    ///
    /// # Errors
    /// `Truncated`, `SyncMismatch` and `ChecksumMismatch` discard the frame
    /// and are recoverable; `Source` is a transport failure.
    pub fn next_frame<S: ByteSource + ?Sized>(
        &self,
        source: &mut S,
    ) -> Result<Option<ProtocolFrame>, DemuxError> {
        let lead = source.read(1, self.timeout)?;
        let Some(&lead) = lead.first() else {
            return Ok(None);
        };

        let frame = match lead {
            layout::SYNC_CHAR_1 => ProtocolFrame::Ubx(self.read_ubx(source)?),
            NMEA_SYNC => ProtocolFrame::Nmea(self.read_text(source, lead)?),
            AIS_SYNC => ProtocolFrame::Ais(self.read_text(source, lead)?),
            rtcm3::layout::PREAMBLE => ProtocolFrame::Rtcm3(self.read_rtcm3(source)?),
            other => ProtocolFrame::Unrecognized(other),
        };
        Ok(Some(frame))
    }

    fn read_ubx<S: ByteSource + ?Sized>(&self, source: &mut S) -> Result<UbxFrame, DemuxError> {
        let sync = self.read_exact(source, 1, FrameStage::UbxSync)?;
        if sync[0] != layout::SYNC_CHAR_2 {
            return Err(DemuxError::SyncMismatch { found: sync[0] });
        }

        let header = self.read_exact(source, 4, FrameStage::UbxHeader)?;
        let (class, message) = (header[0], header[1]);
        let len = u16::from_le_bytes([header[2], header[3]]);

        let payload = self.read_exact(source, usize::from(len), FrameStage::UbxPayload)?;
        let trailer = self.read_exact(source, layout::CHECKSUM_LEN, FrameStage::UbxChecksum)?;
        let expected = (trailer[0], trailer[1]);

        let mut calc = ubx::ChecksumCalc::new();
        calc.update(&header);
        calc.update(&payload);
        let computed = calc.result();
        if computed != expected {
            return Err(DemuxError::ChecksumMismatch {
                class,
                message,
                expected,
                computed,
            });
        }

        Ok(UbxFrame {
            class,
            message,
            payload,
            ck_a: expected.0,
            ck_b: expected.1,
        })
    }

    fn read_text<S: ByteSource + ?Sized>(
        &self,
        source: &mut S,
        sync: u8,
    ) -> Result<TextLine, DemuxError> {
        let rest = source.read_line(self.timeout)?;
        if rest.is_empty() {
            return Err(DemuxError::Truncated {
                stage: FrameStage::Line,
                needed: 1,
                got: 0,
            });
        }
        Ok(TextLine::from_bytes(sync, &rest))
    }

    fn read_rtcm3<S: ByteSource + ?Sized>(
        &self,
        source: &mut S,
    ) -> Result<Rtcm3Frame, DemuxError> {
        let len_bytes = self.read_exact(source, rtcm3::layout::LENGTH_LEN, FrameStage::RtcmLength)?;
        let length = rtcm3::frame_length([len_bytes[0], len_bytes[1]]);
        if !rtcm3::reserved_bits_clear(length) {
            debug!(length, "RTCM3 length has reserved bits set");
        }

        let payload = self.read_exact(source, usize::from(length), FrameStage::RtcmPayload)?;
        let crc = self.read_exact(source, rtcm3::layout::CRC_LEN, FrameStage::RtcmCrc)?;

        Ok(Rtcm3Frame {
            length,
            message_id: rtcm3::message_id(&payload),
            payload,
            crc: [crc[0], crc[1], crc[2]],
        })
    }

    fn read_exact<S: ByteSource + ?Sized>(
        &self,
        source: &mut S,
        needed: usize,
        stage: FrameStage,
    ) -> Result<Vec<u8>, DemuxError> {
        if needed == 0 {
            return Ok(Vec::new());
        }
        let bytes = source.read(needed, self.timeout)?;
        if bytes.len() < needed {
            return Err(DemuxError::Truncated {
                stage,
                needed,
                got: bytes.len(),
            });
        }
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StreamSource;
    use std::io::Cursor;

    fn source(bytes: &[u8]) -> StreamSource<Cursor<Vec<u8>>> {
        StreamSource::new(Cursor::new(bytes.to_vec()))
    }

    fn next(bytes: &[u8]) -> Result<Option<ProtocolFrame>, DemuxError> {
        Demultiplexer::default().next_frame(&mut source(bytes))
    }

    #[test]
    fn default_timeout_matches_receiver_configuration() {
        assert_eq!(Demultiplexer::default().timeout(), DEFAULT_READ_TIMEOUT);
        let short = Duration::from_millis(50);
        assert_eq!(Demultiplexer::new(short).timeout(), short);
    }

    #[test]
    fn empty_source_is_end_of_stream() {
        assert!(next(&[]).unwrap().is_none());
    }

    #[test]
    fn classifies_by_leading_byte() {
        assert_eq!(next(b"$GPGGA,1*00\r\n").unwrap().unwrap().kind(), FrameKind::Nmea);
        assert_eq!(next(b"!AIVDM,1*00\r\n").unwrap().unwrap().kind(), FrameKind::Ais);
        assert_eq!(
            next(&ubx::UNIQID_POLL).unwrap().unwrap().kind(),
            FrameKind::Ubx
        );
        assert_eq!(
            next(&[0xd3, 0x00, 0x02, 0x43, 0x50, 1, 2, 3]).unwrap().unwrap().kind(),
            FrameKind::Rtcm3
        );
        assert_eq!(
            next(&[0x7f, 0xb5]).unwrap().unwrap(),
            ProtocolFrame::Unrecognized(0x7f)
        );
    }

    #[test]
    fn ubx_leading_byte_alone_is_truncated() {
        let err = next(&[0xb5]).unwrap_err();
        assert!(matches!(
            err,
            DemuxError::Truncated {
                stage: FrameStage::UbxSync,
                ..
            }
        ));
    }

    #[test]
    fn bad_second_sync_is_reported_without_scanning() {
        let mut src = source(&[0xb5, 0x24, b'G', b'\n']);
        let demux = Demultiplexer::default();
        assert!(matches!(
            demux.next_frame(&mut src),
            Err(DemuxError::SyncMismatch { found: 0x24 })
        ));
        // The mismatched byte was consumed; the next read starts after it.
        assert_eq!(
            demux.next_frame(&mut src).unwrap(),
            Some(ProtocolFrame::Unrecognized(b'G'))
        );
    }

    #[test]
    fn ubx_frame_fields_are_preserved() {
        let frame = ubx::build_frame(0x05, 0x01, &[0x04, 0x05]).unwrap();
        let Some(ProtocolFrame::Ubx(parsed)) = next(&frame).unwrap() else {
            panic!("expected UBX frame");
        };
        assert_eq!(parsed.class, 0x05);
        assert_eq!(parsed.message, 0x01);
        assert_eq!(parsed.payload, vec![0x04, 0x05]);
        assert_eq!((parsed.ck_a, parsed.ck_b), (0x11, 0x38));
        assert_eq!(parsed.to_wire_bytes(), frame);
    }

    #[test]
    fn corrupted_payload_is_checksum_mismatch() {
        let mut frame = ubx::build_frame(0x05, 0x01, &[0x04, 0x05]).unwrap();
        frame[6] ^= 0x01;
        let err = next(&frame).unwrap_err();
        assert!(matches!(
            err,
            DemuxError::ChecksumMismatch {
                class: 0x05,
                message: 0x01,
                expected: (0x11, 0x38),
                ..
            }
        ));
        assert!(err.is_recoverable());
    }

    #[test]
    fn short_payload_is_truncated() {
        let bytes = [0xb5, 0x62, 0x01, 0x3c, 0x0a, 0x00, 1, 2, 3, 4];
        let err = next(&bytes).unwrap_err();
        assert!(matches!(
            err,
            DemuxError::Truncated {
                stage: FrameStage::UbxPayload,
                needed: 10,
                got: 4,
            }
        ));
    }

    #[test]
    fn text_lines_keep_sync_and_delimiter() {
        let Some(ProtocolFrame::Nmea(line)) = next(b"$GPHDT,12.3,T*1A\r\n$GP").unwrap() else {
            panic!("expected NMEA line");
        };
        assert_eq!(line.text, "$GPHDT,12.3,T*1A\r\n");
    }

    #[test]
    fn lone_sentence_start_is_truncated() {
        assert!(matches!(
            next(b"!"),
            Err(DemuxError::Truncated {
                stage: FrameStage::Line,
                ..
            })
        ));
    }

    #[test]
    fn rtcm3_frame_reports_message_id_and_crc() {
        let bytes = [0xd3, 0x00, 0x03, 0x3e, 0xd0, 0x11, 0xaa, 0xbb, 0xcc];
        let Some(ProtocolFrame::Rtcm3(frame)) = next(&bytes).unwrap() else {
            panic!("expected RTCM3 frame");
        };
        assert_eq!(frame.length, 3);
        assert_eq!(frame.payload, vec![0x3e, 0xd0, 0x11]);
        assert_eq!(frame.message_id, Some(1005));
        assert_eq!(frame.crc, [0xaa, 0xbb, 0xcc]);
    }

    #[test]
    fn rtcm3_missing_crc_is_truncated() {
        let bytes = [0xd3, 0x00, 0x02, 0x3e, 0xd0, 0xaa];
        assert!(matches!(
            next(&bytes),
            Err(DemuxError::Truncated {
                stage: FrameStage::RtcmCrc,
                needed: 3,
                got: 1,
            })
        ));
    }

    #[test]
    fn rtcm3_empty_payload_has_no_message_id() {
        let bytes = [0xd3, 0x00, 0x00, 0x01, 0x02, 0x03];
        let Some(ProtocolFrame::Rtcm3(frame)) = next(&bytes).unwrap() else {
            panic!("expected RTCM3 frame");
        };
        assert_eq!(frame.message_id, None);
    }
}
