use std::io::{BufReader, Write};
use std::time::Duration;

use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};

use super::{ByteSource, SourceError, read_line_until, read_up_to};

pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// `ByteSource` over a serial port opened 8N1 without flow control.
pub struct SerialSource {
    name: String,
    reader: BufReader<Box<dyn SerialPort>>,
    timeout: Duration,
}

impl SerialSource {
    /// Open `path` and drop anything already buffered on the input side.
    pub fn open(path: &str, baud_rate: u32, timeout: Duration) -> Result<Self, SourceError> {
        let port = serialport::new(path, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(timeout)
            .open()
            .map_err(|e| serial_error("open", e))?;
        port.clear(ClearBuffer::Input)
            .map_err(|e| serial_error("clear input", e))?;
        Ok(Self {
            name: path.to_string(),
            reader: BufReader::new(port),
            timeout,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn write_all(&mut self, bytes: &[u8]) -> Result<(), SourceError> {
        let port = self.reader.get_mut();
        port.write_all(bytes)?;
        port.flush()?;
        Ok(())
    }

    fn apply_timeout(&mut self, timeout: Duration) -> Result<(), SourceError> {
        if timeout != self.timeout {
            self.reader
                .get_mut()
                .set_timeout(timeout)
                .map_err(|e| serial_error("set timeout", e))?;
            self.timeout = timeout;
        }
        Ok(())
    }
}

impl ByteSource for SerialSource {
    fn read(&mut self, max: usize, timeout: Duration) -> Result<Vec<u8>, SourceError> {
        self.apply_timeout(timeout)?;
        read_up_to(&mut self.reader, max)
    }

    fn read_line(&mut self, timeout: Duration) -> Result<Vec<u8>, SourceError> {
        self.apply_timeout(timeout)?;
        read_line_until(&mut self.reader)
    }
}

fn serial_error(context: &'static str, err: serialport::Error) -> SourceError {
    SourceError::Serial {
        context,
        message: err.to_string(),
    }
}
