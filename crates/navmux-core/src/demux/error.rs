use thiserror::Error;

use crate::source::SourceError;

/// Part of a frame being read when the source came up short.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStage {
    UbxSync,
    UbxHeader,
    UbxPayload,
    UbxChecksum,
    Line,
    RtcmLength,
    RtcmPayload,
    RtcmCrc,
}

impl FrameStage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UbxSync => "UBX sync",
            Self::UbxHeader => "UBX header",
            Self::UbxPayload => "UBX payload",
            Self::UbxChecksum => "UBX checksum",
            Self::Line => "text line",
            Self::RtcmLength => "RTCM3 length",
            Self::RtcmPayload => "RTCM3 payload",
            Self::RtcmCrc => "RTCM3 CRC",
        }
    }
}

impl std::fmt::Display for FrameStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conditions raised while reconstructing one frame.
///
/// Everything except `Source` discards the partial frame and leaves the
/// stream positioned at the next unread byte.
#[derive(Debug, Error)]
pub enum DemuxError {
    #[error("frame truncated in {stage}: need {needed} bytes, got {got}")]
    Truncated {
        stage: FrameStage,
        needed: usize,
        got: usize,
    },
    #[error("UBX second sync byte mismatch: 0x{found:02x}")]
    SyncMismatch { found: u8 },
    #[error(
        "UBX checksum mismatch for class 0x{class:02x} message 0x{message:02x}: \
         expected {expected:02x?}, computed {computed:02x?}"
    )]
    ChecksumMismatch {
        class: u8,
        message: u8,
        expected: (u8, u8),
        computed: (u8, u8),
    },
    #[error("source error: {0}")]
    Source(#[from] SourceError),
}

impl DemuxError {
    /// Whether the session can keep reading after this error.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Source(_))
    }
}
