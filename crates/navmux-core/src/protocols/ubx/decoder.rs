use super::error::UbxError;
use super::parser::{UniqueId, parse_posllh, parse_relposned, parse_uniqid};
use super::registry::{Lookup, UbxClass, UbxMessage, lookup};
use crate::demux::UbxFrame;
use crate::state::NavigationState;

/// What a successful decode did to the navigation state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DecodeOutcome {
    Heading {
        heading_deg: f64,
        itow: u32,
        valid: bool,
    },
    Position { itow: u32 },
    UniqueId(UniqueId),
    /// Recognized but not field-decoded; state untouched.
    Unhandled {
        class: UbxClass,
        name: Option<&'static str>,
    },
}

impl DecodeOutcome {
    pub fn message(&self) -> Option<UbxMessage> {
        match self {
            Self::Heading { .. } => Some(UbxMessage::NavRelPosNed),
            Self::Position { .. } => Some(UbxMessage::NavPosLlh),
            Self::UniqueId(_) => Some(UbxMessage::SecUniqId),
            Self::Unhandled { .. } => None,
        }
    }
}

/// Decode one checksum-valid UBX message into `state`.
///
/// The payload is fully decoded before anything is written, so an error
/// leaves `state` exactly as it was.
///
/// # Errors
/// `UnrecognizedClass`/`UnrecognizedMessage` for pairs without a definition
/// and `MalformedPayload` when a decodable message is too short.
pub fn decode(
    class: u8,
    message: u8,
    payload: &[u8],
    state: &mut NavigationState,
) -> Result<DecodeOutcome, UbxError> {
    match lookup(class, message)? {
        Lookup::Decodable(UbxMessage::NavRelPosNed) => {
            let relpos = parse_relposned(payload)?;
            state.apply_relposned(relpos);
            Ok(DecodeOutcome::Heading {
                heading_deg: relpos.heading_deg,
                itow: relpos.itow,
                valid: relpos.heading_valid,
            })
        }
        Lookup::Decodable(UbxMessage::NavPosLlh) => {
            let pos = parse_posllh(payload)?;
            state.apply_posllh(pos);
            Ok(DecodeOutcome::Position { itow: pos.itow })
        }
        Lookup::Decodable(UbxMessage::SecUniqId) => {
            let id = parse_uniqid(payload)?;
            state.apply_unique_id(id);
            Ok(DecodeOutcome::UniqueId(id))
        }
        Lookup::Unhandled { class, name } => Ok(DecodeOutcome::Unhandled { class, name }),
    }
}

pub fn decode_frame(frame: &UbxFrame, state: &mut NavigationState) -> Result<DecodeOutcome, UbxError> {
    decode(frame.class, frame.message, &frame.payload, state)
}
