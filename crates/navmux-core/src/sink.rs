//! Raw UBX archival.
//!
//! Every checksum-valid UBX frame is handed to a [`FrameSink`] before it is
//! decoded. [`CaptureFile`] appends the exact wire span to a `.ubx` file that
//! can later be replayed through a `StreamSource`.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use time::OffsetDateTime;
use time::macros::format_description;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("capture file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not format capture timestamp: {0}")]
    Timestamp(#[from] time::error::Format),
}

/// Destination for raw frame bytes.
pub trait FrameSink {
    fn archive(&mut self, frame: &[u8]) -> Result<(), SinkError>;
}

impl<T: FrameSink + ?Sized> FrameSink for Box<T> {
    fn archive(&mut self, frame: &[u8]) -> Result<(), SinkError> {
        (**self).archive(frame)
    }
}

/// In-memory sink; each archived frame is kept as its own buffer.
impl FrameSink for Vec<Vec<u8>> {
    fn archive(&mut self, frame: &[u8]) -> Result<(), SinkError> {
        self.push(frame.to_vec());
        Ok(())
    }
}

/// Append-only capture file.
#[derive(Debug)]
pub struct CaptureFile {
    path: PathBuf,
    writer: BufWriter<File>,
    frames: u64,
}

impl CaptureFile {
    /// Open `path` for appending, creating it if needed.
    pub fn append(path: impl Into<PathBuf>) -> Result<Self, SinkError> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| SinkError::Io {
                path: path.clone(),
                source,
            })?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            frames: 0,
        })
    }

    /// Create a timestamped capture (`ubx-YYYYMMDDTHHMMSSZ.ubx`) in `dir`.
    pub fn create_in(dir: &Path) -> Result<Self, SinkError> {
        let name = default_file_name(OffsetDateTime::now_utc())?;
        Self::append(dir.join(name))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn flush(&mut self) -> Result<(), SinkError> {
        self.writer.flush().map_err(|source| self.io_error(source))
    }

    fn io_error(&self, source: std::io::Error) -> SinkError {
        SinkError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl FrameSink for CaptureFile {
    fn archive(&mut self, frame: &[u8]) -> Result<(), SinkError> {
        self.writer
            .write_all(frame)
            .map_err(|source| self.io_error(source))?;
        self.frames += 1;
        Ok(())
    }
}

impl Drop for CaptureFile {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}

pub fn default_file_name(at: OffsetDateTime) -> Result<String, SinkError> {
    let stamp = at.format(format_description!(
        "[year][month][day]T[hour][minute][second]Z"
    ))?;
    Ok(format!("ubx-{stamp}.ubx"))
}
