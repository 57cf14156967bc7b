//! Byte sources feeding the demultiplexer.
//!
//! A source yields raw bytes with a per-call timeout. Short reads, including
//! empty ones, mean the timeout elapsed or the stream ended; they are not
//! errors. Only genuine transport failures surface as `SourceError`.

#[cfg(feature = "serial")]
mod serial;
mod stream;

#[cfg(feature = "serial")]
pub use serial::{DEFAULT_BAUD_RATE, SerialSource};
pub use stream::StreamSource;

use std::io::{BufRead, ErrorKind};
use std::time::Duration;

use thiserror::Error;

pub trait ByteSource {
    /// Read up to `max` bytes, blocking at most `timeout`.
    fn read(&mut self, max: usize, timeout: Duration) -> Result<Vec<u8>, SourceError>;

    /// Read through the next `\n` (inclusive). A result without a trailing
    /// delimiter means the stream ended or timed out mid-line.
    fn read_line(&mut self, timeout: Duration) -> Result<Vec<u8>, SourceError>;
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn read(&mut self, max: usize, timeout: Duration) -> Result<Vec<u8>, SourceError> {
        (**self).read(max, timeout)
    }

    fn read_line(&mut self, timeout: Duration) -> Result<Vec<u8>, SourceError> {
        (**self).read_line(timeout)
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serial port error ({context}): {message}")]
    Serial {
        context: &'static str,
        message: String,
    },
}

/// Fill up to `max` bytes, stopping early on EOF or timeout.
pub(crate) fn read_up_to<R: BufRead>(reader: &mut R, max: usize) -> Result<Vec<u8>, SourceError> {
    let mut buf = vec![0u8; max];
    let mut filled = 0;
    while filled < max {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) if is_timeout(&err) => break,
            Err(err) => return Err(err.into()),
        }
    }
    buf.truncate(filled);
    Ok(buf)
}

/// Read through `\n`, keeping whatever arrived before EOF or timeout.
pub(crate) fn read_line_until<R: BufRead>(reader: &mut R) -> Result<Vec<u8>, SourceError> {
    let mut line = Vec::new();
    loop {
        match reader.read_until(b'\n', &mut line) {
            Ok(_) => return Ok(line),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) if is_timeout(&err) => return Ok(line),
            Err(err) => return Err(err.into()),
        }
    }
}

fn is_timeout(err: &std::io::Error) -> bool {
    matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock)
}

#[cfg(test)]
mod tests {
    use super::{read_line_until, read_up_to};
    use std::io::{BufReader, Cursor, ErrorKind, Read};

    struct TimesOut {
        data: Cursor<Vec<u8>>,
    }

    impl Read for TimesOut {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            match self.data.read(buf)? {
                0 => Err(ErrorKind::TimedOut.into()),
                n => Ok(n),
            }
        }
    }

    #[test]
    fn short_read_at_eof() {
        let mut reader = Cursor::new(vec![1, 2, 3]);
        assert_eq!(read_up_to(&mut reader, 5).unwrap(), vec![1, 2, 3]);
        assert!(read_up_to(&mut reader, 1).unwrap().is_empty());
    }

    #[test]
    fn timeout_is_a_short_read() {
        let mut reader = BufReader::new(TimesOut {
            data: Cursor::new(vec![9, 8]),
        });
        assert_eq!(read_up_to(&mut reader, 4).unwrap(), vec![9, 8]);
    }

    #[test]
    fn line_keeps_delimiter_and_partial_tail() {
        let mut reader = BufReader::new(TimesOut {
            data: Cursor::new(b"GPGGA,1\r\nGPR".to_vec()),
        });
        assert_eq!(read_line_until(&mut reader).unwrap(), b"GPGGA,1\r\n");
        assert_eq!(read_line_until(&mut reader).unwrap(), b"GPR");
        assert!(read_line_until(&mut reader).unwrap().is_empty());
    }
}
