//! UBX checksum (8-bit Fletcher over class, message, length and payload).

use super::error::UbxError;
use super::layout;

/// Streaming checksum calculator.
///
/// Feed it class, message, both length bytes and the payload, in wire order.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChecksumCalc {
    ck_a: u8,
    ck_b: u8,
}

impl ChecksumCalc {
    pub const fn new() -> Self {
        Self { ck_a: 0, ck_b: 0 }
    }

    pub fn update(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.update_byte(*byte);
        }
    }

    pub fn update_byte(&mut self, byte: u8) {
        self.ck_a = self.ck_a.wrapping_add(byte);
        self.ck_b = self.ck_b.wrapping_add(self.ck_a);
    }

    pub const fn result(self) -> (u8, u8) {
        (self.ck_a, self.ck_b)
    }
}

/// Checksum of an arbitrary byte run.
///
/// # Examples
/// ```
/// use navmux_core::ubx::checksum;
///
/// // SEC-UNIQID poll: class 0x27, message 0x03, empty payload.
/// assert_eq!(checksum(&[0x27, 0x03, 0x00, 0x00]), (0x2a, 0xa5));
/// ```
pub fn checksum(bytes: &[u8]) -> (u8, u8) {
    let mut calc = ChecksumCalc::new();
    calc.update(bytes);
    calc.result()
}

pub fn verify(bytes: &[u8], ck_a: u8, ck_b: u8) -> bool {
    checksum(bytes) == (ck_a, ck_b)
}

/// Checksum of a frame body without materializing the header bytes.
///
/// The length bytes are derived from `payload.len()` truncated to `u16`;
/// callers building frames go through [`build_frame`], which rejects
/// oversized payloads.
pub fn frame_checksum(class: u8, message: u8, payload: &[u8]) -> (u8, u8) {
    let len = payload.len() as u16;
    let mut calc = ChecksumCalc::new();
    calc.update(&[class, message]);
    calc.update(&len.to_le_bytes());
    calc.update(payload);
    calc.result()
}

/// Assemble a complete UBX wire frame, sync bytes through checksum.
///
/// # Errors
/// Returns `UbxError::PayloadTooLong` when the payload does not fit the
/// 16-bit length field.
pub fn build_frame(class: u8, message: u8, payload: &[u8]) -> Result<Vec<u8>, UbxError> {
    let len = u16::try_from(payload.len()).map_err(|_| UbxError::PayloadTooLong {
        len: payload.len(),
    })?;
    let mut frame = Vec::with_capacity(layout::HEADER_LEN + payload.len() + layout::CHECKSUM_LEN);
    frame.extend_from_slice(&[layout::SYNC_CHAR_1, layout::SYNC_CHAR_2, class, message]);
    frame.extend_from_slice(&len.to_le_bytes());
    frame.extend_from_slice(payload);
    let (ck_a, ck_b) = checksum(&frame[2..]);
    frame.extend_from_slice(&[ck_a, ck_b]);
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // UBX-ACK-ACK: class 0x05, id 0x01, length 2, payload [0x04, 0x05]
    const ACK_ACK: [u8; 10] = [0xb5, 0x62, 0x05, 0x01, 0x02, 0x00, 0x04, 0x05, 0x11, 0x38];

    #[test]
    fn ack_ack_checksum_matches_wire() {
        assert_eq!(checksum(&ACK_ACK[2..8]), (0x11, 0x38));
        assert!(verify(&ACK_ACK[2..8], 0x11, 0x38));
    }

    #[test]
    fn uniqid_poll_frame_verifies() {
        let poll = [0xb5, 0x62, 0x27, 0x03, 0x00, 0x00, 0x2a, 0xa5];
        assert!(verify(&poll[2..6], poll[6], poll[7]));
        assert_eq!(build_frame(0x27, 0x03, &[]).unwrap(), poll);
    }

    #[test]
    fn streaming_matches_single_shot() {
        let mut calc = ChecksumCalc::new();
        calc.update(&ACK_ACK[2..4]);
        calc.update(&ACK_ACK[4..6]);
        for byte in &ACK_ACK[6..8] {
            calc.update_byte(*byte);
        }
        assert_eq!(calc.result(), checksum(&ACK_ACK[2..8]));
    }

    #[test]
    fn frame_checksum_covers_length_bytes() {
        assert_eq!(frame_checksum(0x05, 0x01, &[0x04, 0x05]), (0x11, 0x38));
    }

    #[test]
    fn corrupted_checksum_is_rejected() {
        assert!(!verify(&ACK_ACK[2..8], 0x11, 0x39));
        assert!(!verify(&ACK_ACK[2..8], 0x12, 0x38));
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let payload = vec![0u8; usize::from(u16::MAX) + 1];
        assert!(matches!(
            build_frame(0x01, 0x02, &payload),
            Err(UbxError::PayloadTooLong { .. })
        ));
    }

    #[test]
    fn transposed_bytes_change_checksum() {
        let a = [0x01, 0x02, 0x03, 0x04];
        let b = [0x01, 0x03, 0x02, 0x04];
        assert_ne!(checksum(&a), checksum(&b));
    }

    proptest! {
        #[test]
        fn computed_checksum_always_verifies(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
            let (ck_a, ck_b) = checksum(&bytes);
            prop_assert!(verify(&bytes, ck_a, ck_b));
        }

        #[test]
        fn single_bit_flip_changes_checksum(
            bytes in proptest::collection::vec(any::<u8>(), 1..256),
            index in any::<prop::sample::Index>(),
            bit in 0u8..8,
        ) {
            let mut flipped = bytes.clone();
            let i = index.index(flipped.len());
            flipped[i] ^= 1 << bit;
            prop_assert_ne!(checksum(&bytes), checksum(&flipped));
        }
    }
}
