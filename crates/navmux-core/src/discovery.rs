//! Receiver discovery.
//!
//! u-blox receivers enumerate as USB serial ports with a fixed VID/PID. Each
//! candidate is polled for SEC-UNIQID and the answer is mapped through the
//! [`RoleTable`] to find the port carrying a given role.

use std::time::Duration;

use thiserror::Error;
use tracing::debug;
#[cfg(feature = "serial")]
use tracing::{info, warn};

use crate::pipeline::{PipelineError, Session, StepEvent};
use crate::protocols::ubx::{DecodeOutcome, UniqueId};
use crate::roles::DeviceRole;
use crate::source::{ByteSource, SourceError};
use crate::state::NavigationState;

#[cfg(feature = "serial")]
use crate::protocols::ubx::UNIQID_POLL;
#[cfg(feature = "serial")]
use crate::roles::RoleTable;
#[cfg(feature = "serial")]
use crate::source::SerialSource;

pub const UBLOX_VID: u16 = 0x1546;
pub const UBLOX_PID: u16 = 0x01A9;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// A serial port that looks like a u-blox receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidatePort {
    pub name: String,
    pub serial_number: Option<String>,
    pub product: Option<String>,
}

/// Result of polling one port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identification {
    pub port: String,
    pub unique_id: Option<UniqueId>,
    pub role: Option<DeviceRole>,
}

pub fn is_ublox(vid: u16, pid: u16) -> bool {
    vid == UBLOX_VID && pid == UBLOX_PID
}

/// Frames read while waiting for the SEC-UNIQID answer before giving up.
pub const DEFAULT_POLL_FRAME_BUDGET: usize = 200;

/// Run a session over `source` until it yields a SEC-UNIQID.
///
/// Everything else on the stream goes through the normal decode path.
/// Returns `None` when the stream ends first or `max_frames` events pass
/// without an answer; a chatty port that never replies cannot hold the
/// caller forever.
pub fn read_unique_id<S: ByteSource + ?Sized>(
    source: &mut S,
    timeout: Duration,
    max_frames: usize,
) -> Result<Option<UniqueId>, PipelineError> {
    let mut session = Session::new(NavigationState::new()).with_timeout(timeout);
    let mut seen = 0usize;
    let event = session.run_until(source, |event| {
        seen += 1;
        matches!(event, StepEvent::Decoded(DecodeOutcome::UniqueId(_))) || seen >= max_frames
    })?;
    Ok(match event {
        Some(StepEvent::Decoded(DecodeOutcome::UniqueId(id))) => Some(id),
        Some(_) => {
            debug!(max_frames, "no SEC-UNIQID within frame budget");
            None
        }
        None => None,
    })
}

#[cfg(feature = "serial")]
pub fn list_candidate_ports() -> Result<Vec<CandidatePort>, DiscoveryError> {
    use serialport::SerialPortType;

    let ports = serialport::available_ports().map_err(|err| SourceError::Serial {
        context: "enumerate ports",
        message: err.to_string(),
    })?;
    Ok(ports
        .into_iter()
        .filter_map(|port| match port.port_type {
            SerialPortType::UsbPort(usb) if is_ublox(usb.vid, usb.pid) => Some(CandidatePort {
                name: port.port_name,
                serial_number: usb.serial_number,
                product: usb.product,
            }),
            _ => None,
        })
        .collect())
}

/// Open `port`, send the SEC-UNIQID poll and wait for the answer.
#[cfg(feature = "serial")]
pub fn identify(
    port: &str,
    baud_rate: u32,
    timeout: Duration,
    roles: &RoleTable,
) -> Result<Identification, DiscoveryError> {
    let mut source = SerialSource::open(port, baud_rate, timeout)?;
    source.write_all(&UNIQID_POLL)?;
    debug!(port, "SEC-UNIQID poll sent");

    let unique_id = read_unique_id(&mut source, timeout, DEFAULT_POLL_FRAME_BUDGET)?;
    let role = unique_id.and_then(|id| roles.role_of(&id));
    Ok(Identification {
        port: port.to_string(),
        unique_id,
        role,
    })
}

/// Poll every candidate port and return the first whose id maps to `role`.
///
/// A port that fails to open or answer is logged and skipped.
#[cfg(feature = "serial")]
pub fn find_port_for_role(
    role: DeviceRole,
    roles: &RoleTable,
    baud_rate: u32,
    timeout: Duration,
) -> Result<Option<Identification>, DiscoveryError> {
    for candidate in list_candidate_ports()? {
        match identify(&candidate.name, baud_rate, timeout, roles) {
            Ok(found) if found.role == Some(role) => {
                info!(
                    port = %found.port,
                    unique_id = ?found.unique_id.map(|id| id.to_hex()),
                    %role,
                    "receiver verified"
                );
                return Ok(Some(found));
            }
            Ok(other) => debug!(port = %other.port, role = ?other.role, "role does not match"),
            Err(err) => warn!(port = %candidate.name, error = %err, "port skipped"),
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocols::ubx::{self, layout};
    use crate::source::StreamSource;
    use std::io::Cursor;

    fn uniqid_frame(id: [u8; 5]) -> Vec<u8> {
        let mut payload = vec![0x01, 0, 0, 0];
        payload.extend_from_slice(&id);
        ubx::build_frame(layout::CLASS_SEC, layout::MSG_SEC_UNIQID, &payload).unwrap()
    }

    #[test]
    fn matches_ublox_usb_ids_only() {
        assert!(is_ublox(0x1546, 0x01a9));
        assert!(!is_ublox(0x1546, 0x01a8));
        assert!(!is_ublox(0x0403, 0x01a9));
    }

    #[test]
    fn reads_id_past_interleaved_traffic() {
        let mut bytes = b"$GNRMC,1*00\r\n".to_vec();
        bytes.extend_from_slice(&[0xd3, 0x00, 0x02, 0x3e, 0xd0, 0, 0, 0]);
        bytes.extend(uniqid_frame([0xde, 0xad, 0xbe, 0xef, 0x01]));
        bytes.extend(uniqid_frame([0x00; 5]));

        let mut source = StreamSource::new(Cursor::new(bytes));
        let id = read_unique_id(&mut source, Duration::from_millis(10), DEFAULT_POLL_FRAME_BUDGET).unwrap();
        assert_eq!(id.map(|id| id.to_hex()), Some("deadbeef01".to_string()));
    }

    #[test]
    fn stream_without_id_yields_none() {
        let mut source = StreamSource::new(Cursor::new(b"$GNRMC,1*00\r\n".to_vec()));
        assert_eq!(
            read_unique_id(&mut source, Duration::from_millis(10), DEFAULT_POLL_FRAME_BUDGET).unwrap(),
            None
        );
    }

    #[test]
    fn gives_up_after_frame_budget() {
        let mut bytes = b"$GNRMC,1*00\r\n".repeat(3);
        bytes.extend(uniqid_frame([0xde, 0xad, 0xbe, 0xef, 0x01]));

        let mut source = StreamSource::new(Cursor::new(bytes.clone()));
        assert_eq!(read_unique_id(&mut source, Duration::from_millis(10), 3).unwrap(), None);

        let mut source = StreamSource::new(Cursor::new(bytes));
        let id = read_unique_id(&mut source, Duration::from_millis(10), 4).unwrap();
        assert_eq!(id.map(|id| id.to_hex()), Some("deadbeef01".to_string()));
    }
}
