use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use super::error::UbxError;
use super::layout;
use super::reader::UbxReader;

/// NAV-RELPOSNED fields used for heading output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelPosNed {
    /// Heading of the relative position vector, degrees.
    pub heading_deg: f64,
    /// GPS time of week, milliseconds.
    pub itow: u32,
    /// Receiver reports the heading as valid.
    pub heading_valid: bool,
}

/// NAV-POSLLH geodetic position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PosLlh {
    pub itow: u32,
    pub lon_deg: f64,
    pub lat_deg: f64,
    /// Height above ellipsoid, metres.
    pub height_m: f64,
    /// Height above mean sea level, metres.
    pub height_msl_m: f64,
    pub h_acc_m: f64,
    pub v_acc_m: f64,
}

/// Five-byte chip identifier from SEC-UNIQID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UniqueId(pub [u8; layout::UNIQUE_ID_LEN]);

impl UniqueId {
    /// Lowercase hex key used by the device-role table.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl fmt::Display for UniqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for UniqueId {
    type Err = UbxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || UbxError::MalformedPayload {
            message: "SEC-UNIQID",
            needed: layout::UNIQUE_ID_LEN * 2,
            actual: s.len(),
        };
        if s.len() != layout::UNIQUE_ID_LEN * 2 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(malformed());
        }
        let mut id = [0u8; layout::UNIQUE_ID_LEN];
        for (i, byte) in id.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).map_err(|_| malformed())?;
        }
        Ok(Self(id))
    }
}

impl Serialize for UniqueId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Decode NAV-RELPOSNED (version 1 layout).
pub fn parse_relposned(payload: &[u8]) -> Result<RelPosNed, UbxError> {
    let reader = UbxReader::new(payload, "NAV-RELPOSNED");
    reader.require_len(layout::RELPOSNED_LEN)?;

    let itow = reader.read_u32_le(layout::RELPOSNED_ITOW_RANGE)?;
    let heading = reader.read_i32_le(layout::RELPOSNED_HEADING_RANGE)?;
    let flags = reader.read_u32_le(layout::RELPOSNED_FLAGS_RANGE)?;

    Ok(RelPosNed {
        heading_deg: f64::from(heading) * layout::RELPOSNED_HEADING_SCALE,
        itow,
        heading_valid: flags & layout::RELPOSNED_HEADING_VALID != 0,
    })
}

pub fn parse_posllh(payload: &[u8]) -> Result<PosLlh, UbxError> {
    let reader = UbxReader::new(payload, "NAV-POSLLH");
    reader.require_len(layout::POSLLH_LEN)?;

    let itow = reader.read_u32_le(layout::POSLLH_ITOW_RANGE)?;
    let lon = reader.read_i32_le(layout::POSLLH_LON_RANGE)?;
    let lat = reader.read_i32_le(layout::POSLLH_LAT_RANGE)?;
    let height = reader.read_i32_le(layout::POSLLH_HEIGHT_RANGE)?;
    let height_msl = reader.read_i32_le(layout::POSLLH_HMSL_RANGE)?;
    let h_acc = reader.read_u32_le(layout::POSLLH_HACC_RANGE)?;
    let v_acc = reader.read_u32_le(layout::POSLLH_VACC_RANGE)?;

    Ok(PosLlh {
        itow,
        lon_deg: f64::from(lon) * layout::POSLLH_DEGREE_SCALE,
        lat_deg: f64::from(lat) * layout::POSLLH_DEGREE_SCALE,
        height_m: f64::from(height) * layout::MILLIMETRE_SCALE,
        height_msl_m: f64::from(height_msl) * layout::MILLIMETRE_SCALE,
        h_acc_m: f64::from(h_acc) * layout::MILLIMETRE_SCALE,
        v_acc_m: f64::from(v_acc) * layout::MILLIMETRE_SCALE,
    })
}

pub fn parse_uniqid(payload: &[u8]) -> Result<UniqueId, UbxError> {
    let reader = UbxReader::new(payload, "SEC-UNIQID");
    reader.require_len(layout::UNIQID_LEN)?;

    let _version = reader.read_u8(layout::UNIQID_VERSION_OFFSET)?;
    let id = reader.read_array(layout::UNIQID_ID_RANGE)?;
    Ok(UniqueId(id))
}
