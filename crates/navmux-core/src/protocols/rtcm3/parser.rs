use super::layout;

/// Read the big-endian length field.
pub fn frame_length(bytes: [u8; layout::LENGTH_LEN]) -> u16 {
    u16::from_be_bytes(bytes)
}

/// Whether the reserved bits of a length field are clear.
pub fn reserved_bits_clear(length: u16) -> bool {
    length & !layout::LENGTH_MASK == 0
}

/// Message number carried in the top 12 bits of the first two payload bytes.
///
/// Returns `None` for payloads shorter than two bytes.
///
/// # Examples
/// ```
/// use navmux_core::rtcm3::message_id;
///
/// // 1005 = 0x3ED, followed by 4 bits of the next field.
/// assert_eq!(message_id(&[0x3e, 0xd0, 0x00]), Some(1005));
/// assert_eq!(message_id(&[0x3e]), None);
/// ```
pub fn message_id(payload: &[u8]) -> Option<u16> {
    let bytes = payload.get(layout::MESSAGE_ID_RANGE)?;
    Some(u16::from_be_bytes([bytes[0], bytes[1]]) >> layout::MESSAGE_ID_SHIFT)
}
