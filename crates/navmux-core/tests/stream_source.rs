use std::io::{self, Read};
use std::time::Duration;

use navmux_core::{ByteSource, SourceError, StreamSource};

const TIMEOUT: Duration = Duration::from_millis(1);

#[test]
fn file_source_reads_back_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bytes.bin");
    std::fs::write(&path, b"\xb5\x62$GP\r\nrest").unwrap();

    let mut source = StreamSource::open(&path).unwrap();
    assert_eq!(source.read(2, TIMEOUT).unwrap(), vec![0xb5, 0x62]);
    assert_eq!(source.read_line(TIMEOUT).unwrap(), b"$GP\r\n".to_vec());
    assert_eq!(source.read(10, TIMEOUT).unwrap(), b"rest".to_vec());
    assert!(source.read(1, TIMEOUT).unwrap().is_empty());
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = match StreamSource::open(&dir.path().join("absent.ubx")) {
        Ok(_) => panic!("expected missing file to be rejected"),
        Err(err) => err,
    };
    assert!(matches!(err, SourceError::Io(_)));
}

struct Broken;

impl Read for Broken {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"))
    }
}

#[test]
fn transport_failure_is_reported() {
    let mut source = StreamSource::new(Broken);
    assert!(matches!(source.read(1, TIMEOUT), Err(SourceError::Io(_))));
}
