use thiserror::Error;

/// Errors returned by UBX registry lookups and field decoding.
///
/// # Examples
/// ```
/// use navmux_core::ubx::UbxError;
///
/// let err = UbxError::UnrecognizedClass { class: 0x99 };
/// assert!(err.to_string().contains("no class definition"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UbxError {
    #[error("no class definition for 0x{class:02x}")]
    UnrecognizedClass { class: u8 },
    #[error("no message definition for class {class} message 0x{message:02x}")]
    UnrecognizedMessage { class: &'static str, message: u8 },
    #[error("malformed {message} payload: need {needed} bytes, got {actual}")]
    MalformedPayload {
        message: &'static str,
        needed: usize,
        actual: usize,
    },
    #[error("payload of {len} bytes does not fit a UBX length field")]
    PayloadTooLong { len: usize },
}
