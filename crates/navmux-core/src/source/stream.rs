use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::time::Duration;

use super::{ByteSource, SourceError, read_line_until, read_up_to};

/// `ByteSource` over any reader: capture files, pipes, in-memory buffers.
///
/// The timeout argument is ignored; blocking behavior is whatever the
/// underlying reader does.
pub struct StreamSource<R> {
    reader: BufReader<R>,
}

impl<R: Read> StreamSource<R> {
    pub fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
        }
    }

    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }
}

impl StreamSource<File> {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let file = File::open(path)?;
        Ok(Self::new(file))
    }
}

impl<R: Read> ByteSource for StreamSource<R> {
    fn read(&mut self, max: usize, _timeout: Duration) -> Result<Vec<u8>, SourceError> {
        read_up_to(&mut self.reader, max)
    }

    fn read_line(&mut self, _timeout: Duration) -> Result<Vec<u8>, SourceError> {
        read_line_until(&mut self.reader)
    }
}
