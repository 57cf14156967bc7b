pub const SYNC_CHAR_1: u8 = 0xB5;
pub const SYNC_CHAR_2: u8 = 0x62;

pub const HEADER_LEN: usize = 6;
pub const CHECKSUM_LEN: usize = 2;

pub const CLASS_NAV: u8 = 0x01;
pub const CLASS_SEC: u8 = 0x27;

pub const MSG_NAV_POSLLH: u8 = 0x02;
pub const MSG_NAV_RELPOSNED: u8 = 0x3C;
pub const MSG_SEC_UNIQID: u8 = 0x03;

pub const RELPOSNED_LEN: usize = 64;
pub const RELPOSNED_ITOW_RANGE: std::ops::Range<usize> = 4..8;
pub const RELPOSNED_HEADING_RANGE: std::ops::Range<usize> = 24..28;
pub const RELPOSNED_HEADING_SCALE: f64 = 1e-5;
pub const RELPOSNED_FLAGS_RANGE: std::ops::Range<usize> = 60..64;
/// `relPosHeadingValid`
pub const RELPOSNED_HEADING_VALID: u32 = 1 << 8;

pub const POSLLH_LEN: usize = 28;
pub const POSLLH_ITOW_RANGE: std::ops::Range<usize> = 0..4;
pub const POSLLH_LON_RANGE: std::ops::Range<usize> = 4..8;
pub const POSLLH_LAT_RANGE: std::ops::Range<usize> = 8..12;
pub const POSLLH_HEIGHT_RANGE: std::ops::Range<usize> = 12..16;
pub const POSLLH_HMSL_RANGE: std::ops::Range<usize> = 16..20;
pub const POSLLH_HACC_RANGE: std::ops::Range<usize> = 20..24;
pub const POSLLH_VACC_RANGE: std::ops::Range<usize> = 24..28;
pub const POSLLH_DEGREE_SCALE: f64 = 1e-7;
pub const MILLIMETRE_SCALE: f64 = 1e-3;

pub const UNIQID_LEN: usize = 9;
pub const UNIQID_VERSION_OFFSET: usize = 0;
pub const UNIQID_ID_RANGE: std::ops::Range<usize> = 4..9;
pub const UNIQUE_ID_LEN: usize = 5;
