//! Static UBX class and message tables.
//!
//! Only NAV and SEC carry message tables; every other known class is
//! accepted as valid but unhandled.

use super::error::UbxError;
use super::layout;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UbxClass {
    Nav,
    Rxm,
    Inf,
    Ack,
    Cfg,
    Upd,
    Mon,
    Aid,
    Tim,
    Esf,
    Mga,
    Log,
    Sec,
    Hnr,
}

impl UbxClass {
    pub const fn from_byte(class: u8) -> Option<Self> {
        let class = match class {
            layout::CLASS_NAV => Self::Nav,
            0x02 => Self::Rxm,
            0x04 => Self::Inf,
            0x05 => Self::Ack,
            0x06 => Self::Cfg,
            0x09 => Self::Upd,
            0x0A => Self::Mon,
            0x0B => Self::Aid,
            0x0D => Self::Tim,
            0x10 => Self::Esf,
            0x13 => Self::Mga,
            0x21 => Self::Log,
            layout::CLASS_SEC => Self::Sec,
            0x28 => Self::Hnr,
            _ => return None,
        };
        Some(class)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Nav => "NAV",
            Self::Rxm => "RXM",
            Self::Inf => "INF",
            Self::Ack => "ACK",
            Self::Cfg => "CFG",
            Self::Upd => "UPD",
            Self::Mon => "MON",
            Self::Aid => "AID",
            Self::Tim => "TIM",
            Self::Esf => "ESF",
            Self::Mga => "MGA",
            Self::Log => "LOG",
            Self::Sec => "SEC",
            Self::Hnr => "HNR",
        }
    }

    fn message_table(self) -> Option<&'static [(u8, &'static str)]> {
        match self {
            Self::Nav => Some(NAV_MESSAGES),
            Self::Sec => Some(SEC_MESSAGES),
            _ => None,
        }
    }
}

const NAV_MESSAGES: &[(u8, &str)] = &[
    (0x01, "POSECEF"),
    (layout::MSG_NAV_POSLLH, "POSLLH"),
    (0x03, "STATUS"),
    (0x04, "DOP"),
    (0x05, "ATT"),
    (0x06, "SOL"),
    (0x07, "PVT"),
    (0x09, "ODO"),
    (0x10, "RESETODO"),
    (0x11, "VELECEF"),
    (0x12, "VELNED"),
    (0x13, "HPPOSECEF"),
    (0x14, "HPPOSLLH"),
    (0x20, "TIMEGPS"),
    (0x21, "TIMEUTC"),
    (0x22, "CLOCK"),
    (0x23, "TIMEGLO"),
    (0x24, "TIMEBDS"),
    (0x25, "TIMEGAL"),
    (0x26, "TIMELS"),
    (0x27, "TIMEQZSS"),
    (0x30, "SVINFO"),
    (0x31, "DGPS"),
    (0x32, "SBAS"),
    (0x34, "ORB"),
    (0x35, "SAT"),
    (0x36, "COV"),
    (0x39, "GEOFENCE"),
    (0x3B, "SVIN"),
    (layout::MSG_NAV_RELPOSNED, "RELPOSNED"),
    (0x42, "SLAS"),
    (0x43, "SIG"),
    (0x60, "AOPSTATUS"),
    (0x61, "EOE"),
];

const SEC_MESSAGES: &[(u8, &str)] = &[
    (0x01, "SIGN"),
    (layout::MSG_SEC_UNIQID, "UNIQID"),
    (0x09, "SIG"),
    (0x10, "SIGLOG"),
];

/// Messages with a field decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UbxMessage {
    NavRelPosNed,
    NavPosLlh,
    SecUniqId,
}

impl UbxMessage {
    pub const fn name(self) -> &'static str {
        match self {
            Self::NavRelPosNed => "NAV-RELPOSNED",
            Self::NavPosLlh => "NAV-POSLLH",
            Self::SecUniqId => "SEC-UNIQID",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Decodable(UbxMessage),
    /// Known class, message valid but not decoded here.
    Unhandled {
        class: UbxClass,
        name: Option<&'static str>,
    },
}

/// Resolve a (class, message) pair.
///
/// # Errors
/// `UnrecognizedClass` when the class byte is unknown, `UnrecognizedMessage`
/// when a class with a message table does not list the message byte.
pub fn lookup(class: u8, message: u8) -> Result<Lookup, UbxError> {
    let ubx_class = UbxClass::from_byte(class).ok_or(UbxError::UnrecognizedClass { class })?;

    match (ubx_class, message) {
        (UbxClass::Nav, layout::MSG_NAV_RELPOSNED) => {
            return Ok(Lookup::Decodable(UbxMessage::NavRelPosNed));
        }
        (UbxClass::Nav, layout::MSG_NAV_POSLLH) => {
            return Ok(Lookup::Decodable(UbxMessage::NavPosLlh));
        }
        (UbxClass::Sec, layout::MSG_SEC_UNIQID) => {
            return Ok(Lookup::Decodable(UbxMessage::SecUniqId));
        }
        _ => {}
    }

    let Some(table) = ubx_class.message_table() else {
        return Ok(Lookup::Unhandled {
            class: ubx_class,
            name: None,
        });
    };
    table
        .iter()
        .find(|(id, _)| *id == message)
        .map(|(_, name)| Lookup::Unhandled {
            class: ubx_class,
            name: Some(*name),
        })
        .ok_or(UbxError::UnrecognizedMessage {
            class: ubx_class.name(),
            message,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodable_messages_resolve() {
        assert_eq!(
            lookup(0x01, 0x3c).unwrap(),
            Lookup::Decodable(UbxMessage::NavRelPosNed)
        );
        assert_eq!(
            lookup(0x01, 0x02).unwrap(),
            Lookup::Decodable(UbxMessage::NavPosLlh)
        );
        assert_eq!(
            lookup(0x27, 0x03).unwrap(),
            Lookup::Decodable(UbxMessage::SecUniqId)
        );
    }

    #[test]
    fn known_nav_message_is_unhandled() {
        assert_eq!(
            lookup(0x01, 0x07).unwrap(),
            Lookup::Unhandled {
                class: UbxClass::Nav,
                name: Some("PVT"),
            }
        );
    }

    #[test]
    fn unknown_nav_message_has_no_definition() {
        let err = lookup(0x01, 0xee).unwrap_err();
        assert_eq!(
            err,
            UbxError::UnrecognizedMessage {
                class: "NAV",
                message: 0xee,
            }
        );
        assert!(err.to_string().contains("no message definition"));
    }

    #[test]
    fn unknown_class_has_no_definition() {
        let err = lookup(0x99, 0x01).unwrap_err();
        assert_eq!(err, UbxError::UnrecognizedClass { class: 0x99 });
    }

    #[test]
    fn other_known_class_is_unhandled_without_name() {
        assert_eq!(
            lookup(0x0a, 0x04).unwrap(),
            Lookup::Unhandled {
                class: UbxClass::Mon,
                name: None,
            }
        );
        assert_eq!(UbxClass::from_byte(0x05).map(UbxClass::name), Some("ACK"));
    }
}
