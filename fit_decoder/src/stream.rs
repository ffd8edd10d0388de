//! Positional, CRC-accumulating reader. Grounded in
//! `fittie/utils/datastream.py::DataStream`, minus the path/file/streamable
//! source dispatch (callers already hand us `impl Read`).

use std::io::Read;

use crate::crc;
use crate::error::DecodeError;

pub struct ByteStream<R: Read> {
    inner: R,
    position: u64,
    should_calculate_crc: bool,
    calculated_crc: u16,
}

impl<R: Read> ByteStream<R> {
    pub fn new(inner: R, should_calculate_crc: bool) -> Self {
        ByteStream {
            inner,
            position: 0,
            should_calculate_crc,
            calculated_crc: 0,
        }
    }

    pub fn tell(&self) -> u64 {
        self.position
    }

    pub fn calculated_crc(&self) -> u16 {
        self.calculated_crc
    }

    pub fn reset_crc(&mut self) {
        self.calculated_crc = 0;
    }

    pub fn read(&mut self, size: usize) -> Result<Vec<u8>, DecodeError> {
        let mut buf = vec![0u8; size];
        self.inner.read_exact(&mut buf).map_err(|source| {
            if source.kind() == std::io::ErrorKind::UnexpectedEof {
                DecodeError::UnexpectedEof {
                    offset: self.position,
                    needed: size,
                }
            } else {
                DecodeError::Io {
                    offset: self.position,
                    source,
                }
            }
        })?;

        if self.should_calculate_crc {
            for &byte in &buf {
                self.calculated_crc = crc::apply(self.calculated_crc, byte);
            }
        }
        self.position += size as u64;
        Ok(buf)
    }

    /// Reads one byte and reports a clean EOF as `Ok(None)` rather than an
    /// error, so the chained-file loop can tell "no more data" apart from
    /// "truncated header".
    pub fn try_read_byte(&mut self) -> Result<Option<u8>, DecodeError> {
        let mut buf = [0u8; 1];
        match self.inner.read(&mut buf) {
            Ok(0) => Ok(None),
            Ok(_) => {
                if self.should_calculate_crc {
                    self.calculated_crc = crc::apply(self.calculated_crc, buf[0]);
                }
                self.position += 1;
                Ok(Some(buf[0]))
            }
            Err(source) => Err(DecodeError::Io {
                offset: self.position,
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_advances_position_and_accumulates_crc() {
        let data = vec![1u8, 2, 3, 4];
        let mut stream = ByteStream::new(&data[..], true);
        let first = stream.read(2).unwrap();
        assert_eq!(first, vec![1, 2]);
        assert_eq!(stream.tell(), 2);
        let second = stream.read(2).unwrap();
        assert_eq!(second, vec![3, 4]);
        assert_eq!(stream.calculated_crc(), crc::compute(&data, 0));
    }

    #[test]
    fn read_past_end_is_unexpected_eof() {
        let data = vec![1u8];
        let mut stream = ByteStream::new(&data[..], false);
        let err = stream.read(4).unwrap_err();
        matches!(err, DecodeError::UnexpectedEof { needed: 4, .. });
    }

    #[test]
    fn try_read_byte_reports_clean_eof() {
        let data: Vec<u8> = vec![];
        let mut stream = ByteStream::new(&data[..], false);
        assert_eq!(stream.try_read_byte().unwrap(), None);
    }
}
