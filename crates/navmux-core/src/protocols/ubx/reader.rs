use super::error::UbxError;

/// Bounds-checked little-endian access to a UBX payload.
///
/// Every read reports `MalformedPayload` tagged with the message name
/// instead of indexing past the end of the payload.
pub struct UbxReader<'a> {
    payload: &'a [u8],
    message: &'static str,
}

impl<'a> UbxReader<'a> {
    pub fn new(payload: &'a [u8], message: &'static str) -> Self {
        Self { payload, message }
    }

    pub fn require_len(&self, needed: usize) -> Result<(), UbxError> {
        if self.payload.len() < needed {
            return Err(self.too_short(needed));
        }
        Ok(())
    }

    pub fn read_u8(&self, offset: usize) -> Result<u8, UbxError> {
        self.payload
            .get(offset)
            .copied()
            .ok_or_else(|| self.too_short(offset + 1))
    }

    pub fn read_u32_le(&self, range: std::ops::Range<usize>) -> Result<u32, UbxError> {
        Ok(u32::from_le_bytes(self.read_array(range)?))
    }

    pub fn read_i32_le(&self, range: std::ops::Range<usize>) -> Result<i32, UbxError> {
        Ok(i32::from_le_bytes(self.read_array(range)?))
    }

    pub fn read_slice(&self, range: std::ops::Range<usize>) -> Result<&'a [u8], UbxError> {
        self.payload
            .get(range.clone())
            .ok_or_else(|| self.too_short(range.end))
    }

    pub fn read_array<const N: usize>(
        &self,
        range: std::ops::Range<usize>,
    ) -> Result<[u8; N], UbxError> {
        let bytes = self.read_slice(range)?;
        bytes.try_into().map_err(|_| UbxError::MalformedPayload {
            message: self.message,
            needed: N,
            actual: bytes.len(),
        })
    }

    fn too_short(&self, needed: usize) -> UbxError {
        UbxError::MalformedPayload {
            message: self.message,
            needed,
            actual: self.payload.len(),
        }
    }
}
