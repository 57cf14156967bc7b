use std::collections::BTreeMap;

use serde::Serialize;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::demux::{DemuxError, FrameKind};
use crate::protocols::ubx::{DecodeOutcome, UbxError};
use crate::state::NavigationSnapshot;

/// Current summary schema version.
pub const SUMMARY_VERSION: u32 = 1;
/// Timestamp used when the clock cannot be formatted.
pub const DEFAULT_GENERATED_AT: &str = "1970-01-01T00:00:00Z";

/// Serializable account of one decoding session.
///
/// # Examples
/// ```
/// use navmux_core::SessionSummary;
///
/// let summary = SessionSummary::default();
/// assert_eq!(summary.frames.ubx, 0);
/// assert!(summary.rtcm3_messages.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    /// Summary schema version (not the binary version).
    pub summary_version: u32,
    pub tool: ToolInfo,
    /// RFC3339 timestamp of when the summary was produced.
    pub generated_at: String,
    /// Input metadata, when the session replayed a file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<InputInfo>,
    pub frames: FrameCounts,
    pub errors: ErrorCounts,
    pub decoded: DecodedCounts,
    /// RTCM3 message numbers seen, with occurrence counts.
    pub rtcm3_messages: BTreeMap<u16, u64>,
    /// Navigation record at the end of the session.
    pub navigation: NavigationSnapshot,
}

impl Default for SessionSummary {
    fn default() -> Self {
        Self {
            summary_version: SUMMARY_VERSION,
            tool: ToolInfo::current(),
            generated_at: DEFAULT_GENERATED_AT.to_string(),
            input: None,
            frames: FrameCounts::default(),
            errors: ErrorCounts::default(),
            decoded: DecodedCounts::default(),
            rtcm3_messages: BTreeMap::new(),
            navigation: NavigationSnapshot::default(),
        }
    }
}

/// Library identification embedded in summaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
}

impl ToolInfo {
    pub fn current() -> Self {
        Self {
            name: "navmux".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputInfo {
    pub path: String,
    pub bytes: u64,
}

/// Complete frames taken off the stream, per protocol.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FrameCounts {
    pub ubx: u64,
    pub nmea: u64,
    pub ais: u64,
    pub rtcm3: u64,
    /// Leading bytes that matched no protocol.
    pub unrecognized_bytes: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ErrorCounts {
    pub truncated: u64,
    pub sync_mismatches: u64,
    pub checksum_mismatches: u64,
    pub unknown_classes: u64,
    pub unknown_messages: u64,
    pub malformed_payloads: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DecodedCounts {
    pub nav_relposned: u64,
    pub nav_posllh: u64,
    pub sec_uniqid: u64,
    /// Known (class, message) pairs without a field decoder.
    pub unhandled: u64,
}

impl SessionSummary {
    pub(crate) fn record_frame(&mut self, kind: FrameKind) {
        let counter = match kind {
            FrameKind::Ubx => &mut self.frames.ubx,
            FrameKind::Nmea => &mut self.frames.nmea,
            FrameKind::Ais => &mut self.frames.ais,
            FrameKind::Rtcm3 => &mut self.frames.rtcm3,
            FrameKind::Unrecognized => &mut self.frames.unrecognized_bytes,
        };
        *counter += 1;
    }

    pub(crate) fn record_rtcm3(&mut self, message_id: Option<u16>) {
        if let Some(id) = message_id {
            *self.rtcm3_messages.entry(id).or_default() += 1;
        }
    }

    pub(crate) fn record_demux_error(&mut self, err: &DemuxError) {
        match err {
            DemuxError::Truncated { .. } => self.errors.truncated += 1,
            DemuxError::SyncMismatch { .. } => self.errors.sync_mismatches += 1,
            DemuxError::ChecksumMismatch { .. } => self.errors.checksum_mismatches += 1,
            DemuxError::Source(_) => {}
        }
    }

    pub(crate) fn record_decode(&mut self, outcome: &DecodeOutcome) {
        let counter = match outcome {
            DecodeOutcome::Heading { .. } => &mut self.decoded.nav_relposned,
            DecodeOutcome::Position { .. } => &mut self.decoded.nav_posllh,
            DecodeOutcome::UniqueId(_) => &mut self.decoded.sec_uniqid,
            DecodeOutcome::Unhandled { .. } => &mut self.decoded.unhandled,
        };
        *counter += 1;
    }

    pub(crate) fn record_decode_error(&mut self, err: &UbxError) {
        match err {
            UbxError::UnrecognizedClass { .. } => self.errors.unknown_classes += 1,
            UbxError::UnrecognizedMessage { .. } => self.errors.unknown_messages += 1,
            UbxError::MalformedPayload { .. } => self.errors.malformed_payloads += 1,
            UbxError::PayloadTooLong { .. } => {}
        }
    }

    /// Frames dropped for any reason, including undecodable UBX messages.
    pub fn dropped(&self) -> u64 {
        let ErrorCounts {
            truncated,
            sync_mismatches,
            checksum_mismatches,
            unknown_classes,
            unknown_messages,
            malformed_payloads,
        } = self.errors;
        truncated
            + sync_mismatches
            + checksum_mismatches
            + unknown_classes
            + unknown_messages
            + malformed_payloads
    }
}

pub(crate) fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| DEFAULT_GENERATED_AT.to_string())
}
