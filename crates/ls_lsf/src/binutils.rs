//! Primitive reads shared by the segment decoders.

use std::io::{self, Read, Seek, SeekFrom};

use byteorder::{ByteOrder, ReadBytesExt};
use ls_resource::Matrix;
use uuid::Uuid;

/// A bounded, seekable view over `len` bytes of an inner stream, starting at its current position
///
/// Positions reported and accepted by [`Seek`] are relative to the start of the window.
/// Reads past the end of the window return end-of-file.
#[derive(Debug)]
pub struct SubStream<R> {
    inner: R,
    start: u64,
    len: u64,
    pos: u64,
}

impl<R: Read + Seek> SubStream<R> {
    pub fn new(mut inner: R, len: u64) -> io::Result<Self> {
        let start = inner.stream_position()?;
        Ok(SubStream {
            inner,
            start,
            len,
            pos: 0,
        })
    }

    /// Size of the window in bytes
    pub fn len(&self) -> u64 {
        self.len
    }
}

impl<R: Read + Seek> Read for SubStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pos >= self.len {
            return Ok(0);
        }

        let max = buf.len().min((self.len - self.pos) as usize);
        let n = self.inner.read(&mut buf[..max])?;
        self.pos += n as u64;
        Ok(n)
    }
}

impl<R: Read + Seek> Seek for SubStream<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(n) => Some(n),
            SeekFrom::Current(d) => self.pos.checked_add_signed(d),
            SeekFrom::End(d) => self.len.checked_add_signed(d),
        }
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid seek to a negative or overflowing position",
            )
        })?;

        self.inner.seek(SeekFrom::Start(self.start + target))?;
        self.pos = target;
        Ok(target)
    }
}

/// Length of `n` up to the first NUL byte
fn clen(n: &[u8]) -> usize {
    n.iter().position(|b| *b == 0).unwrap_or(n.len())
}

/// Extends [`Read`] with the composite reads used by resource files
pub trait LsReadExt: Read {
    /// Read exactly `length` bytes and return them up to the first NUL byte
    fn read_cstring(&mut self, length: usize) -> io::Result<String> {
        let buf = self.read_bytes(length)?;
        Ok(String::from_utf8_lossy(&buf[..clen(&buf)]).into_owned())
    }

    /// Read exactly `length` bytes as a string, keeping any NUL bytes
    fn read_raw_string(&mut self, length: usize) -> io::Result<String> {
        let buf = self.read_bytes(length)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Read exactly `length` bytes
    ///
    /// The buffer grows with the data actually read, so a corrupt length cannot force a large
    /// allocation up front.
    fn read_bytes(&mut self, length: usize) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        Read::take(&mut *self, length as u64).read_to_end(&mut buf)?;
        if buf.len() != length {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("expected {length} bytes, found {}", buf.len()),
            ));
        }
        Ok(buf)
    }

    /// Read `count` sequential 32-bit signed integers
    fn read_i32_vec<B: ByteOrder>(&mut self, count: usize) -> io::Result<Vec<i32>> {
        let mut values = vec![0i32; count];
        self.read_i32_into::<B>(&mut values)?;
        Ok(values)
    }

    /// Read `count` sequential 32-bit floats
    fn read_f32_vec<B: ByteOrder>(&mut self, count: usize) -> io::Result<Vec<f32>> {
        let mut values = vec![0f32; count];
        self.read_f32_into::<B>(&mut values)?;
        Ok(values)
    }

    /// Read a float matrix stored column by column into a row-major [`Matrix`]
    fn read_matrix<B: ByteOrder>(&mut self, rows: usize, cols: usize) -> io::Result<Matrix> {
        let mut matrix = Matrix::zeroed(rows, cols);
        for col in 0..cols {
            for row in 0..rows {
                matrix.set(row, col, self.read_f32::<B>()?);
            }
        }
        Ok(matrix)
    }

    /// Read a GUID in its in-memory layout
    ///
    /// The first three groups are stored little-endian, the last two as plain bytes.
    fn read_guid(&mut self) -> io::Result<Uuid> {
        let mut bytes = [0u8; 16];
        self.read_exact(&mut bytes)?;
        bytes[0..4].reverse();
        bytes[4..6].reverse();
        bytes[6..8].reverse();
        Ok(Uuid::from_bytes(bytes))
    }
}

impl<R: Read + ?Sized> LsReadExt for R {}
