use serde::Serialize;

use crate::protocols::ubx::layout;

/// One complete frame taken off the byte stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolFrame {
    Ubx(UbxFrame),
    Nmea(TextLine),
    Ais(TextLine),
    Rtcm3(Rtcm3Frame),
    Unrecognized(u8),
}

impl ProtocolFrame {
    pub fn kind(&self) -> FrameKind {
        match self {
            Self::Ubx(_) => FrameKind::Ubx,
            Self::Nmea(_) => FrameKind::Nmea,
            Self::Ais(_) => FrameKind::Ais,
            Self::Rtcm3(_) => FrameKind::Rtcm3,
            Self::Unrecognized(_) => FrameKind::Unrecognized,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameKind {
    Ubx,
    Nmea,
    Ais,
    Rtcm3,
    Unrecognized,
}

/// Checksum-verified UBX frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UbxFrame {
    pub class: u8,
    pub message: u8,
    pub payload: Vec<u8>,
    pub ck_a: u8,
    pub ck_b: u8,
}

impl UbxFrame {
    pub fn payload_len(&self) -> u16 {
        self.payload.len() as u16
    }

    /// The exact archival span: sync bytes, header, payload, checksum.
    pub fn to_wire_bytes(&self) -> Vec<u8> {
        let mut bytes =
            Vec::with_capacity(layout::HEADER_LEN + self.payload.len() + layout::CHECKSUM_LEN);
        bytes.extend_from_slice(&[
            layout::SYNC_CHAR_1,
            layout::SYNC_CHAR_2,
            self.class,
            self.message,
        ]);
        bytes.extend_from_slice(&self.payload_len().to_le_bytes());
        bytes.extend_from_slice(&self.payload);
        bytes.extend_from_slice(&[self.ck_a, self.ck_b]);
        bytes
    }
}

/// NMEA or AIS sentence, sync character included, content uninterpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLine {
    pub text: String,
}

impl TextLine {
    pub(crate) fn from_bytes(sync: u8, rest: &[u8]) -> Self {
        let mut text = String::with_capacity(rest.len() + 1);
        text.push(char::from(sync));
        text.push_str(&String::from_utf8_lossy(rest));
        Self { text }
    }

    /// Sentence without its trailing line delimiter.
    pub fn trimmed(&self) -> &str {
        self.text.trim_end_matches(['\r', '\n'])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rtcm3Frame {
    /// Length field as read (all 16 bits).
    pub length: u16,
    pub payload: Vec<u8>,
    pub message_id: Option<u16>,
    /// Trailing CRC-24, not validated.
    pub crc: [u8; 3],
}
