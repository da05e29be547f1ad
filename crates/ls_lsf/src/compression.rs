//! Segment decompression handling.

use std::io::{self, Cursor, Read, Seek};

use flate2::read::ZlibDecoder;
use tracing::{debug, instrument};

use crate::binutils::SubStream;
use crate::error::{Error, Result};
use crate::types::{Segment, SegmentSize};

/// Identifies the method used to compress the segments of an LSF file
///
/// Stored in the low nibble of the header's compression flags.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum CompressionMethod {
    /// Stores the data as it is
    #[default]
    None = 0,

    /// Compress the data using Zlib
    Zlib = 1,

    /// Compress the data using LZ4, as raw blocks or frames depending on the file version
    Lz4 = 2,
}

impl CompressionMethod {
    /// Extract the method from the low nibble of `flags`
    pub fn from_flags(flags: u8) -> Result<Self> {
        match flags & 0x0F {
            0 => Ok(CompressionMethod::None),
            1 => Ok(CompressionMethod::Zlib),
            2 => Ok(CompressionMethod::Lz4),
            _ => Err(Error::UnsupportedCompression { flags }),
        }
    }
}

/// Compression level recorded by the writer
///
/// Stored in the high nibble of the compression flags; it has no effect on decoding.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum CompressionLevel {
    Fast = 0x10,
    Default = 0x20,
    Max = 0x40,
}

impl CompressionLevel {
    /// Extract the level from the high nibble of `flags`
    pub fn from_flags(flags: u8) -> Option<Self> {
        match flags & 0xF0 {
            0x10 => Some(CompressionLevel::Fast),
            0x20 => Some(CompressionLevel::Default),
            0x40 => Some(CompressionLevel::Max),
            _ => None,
        }
    }
}

/// A readable, seekable view of one segment's decompressed bytes
pub(crate) enum SegmentReader<'a, R: Read + Seek> {
    Raw(SubStream<&'a mut R>),
    Decompressed(Cursor<Vec<u8>>),
}

impl<'a, R: Read + Seek> SegmentReader<'a, R> {
    /// Open the segment starting at the reader's current position.
    ///
    /// Uncompressed segments are read in place through a bounded window. Compressed segments
    /// are inflated into memory, never past `size.uncompressed` bytes. `chunked` selects the
    /// LZ4 frame format over a single raw LZ4 block.
    #[instrument(skip(reader), err)]
    pub fn new(
        reader: &'a mut R,
        segment: Segment,
        size: SegmentSize,
        method: CompressionMethod,
        chunked: bool,
    ) -> Result<Self> {
        let on_disk = size.on_disk as u64;
        let uncompressed = size.uncompressed as usize;
        let corrupt = |source: io::Error| Error::Decompression { segment, source };

        Ok(match method {
            CompressionMethod::None => SegmentReader::Raw(SubStream::new(reader, on_disk)?),
            CompressionMethod::Zlib => {
                let mut buf = Vec::with_capacity(uncompressed);
                ZlibDecoder::new(reader.take(on_disk))
                    .take(uncompressed as u64)
                    .read_to_end(&mut buf)
                    .map_err(corrupt)?;
                debug!(%segment, inflated = buf.len(), "inflated zlib segment");
                SegmentReader::Decompressed(Cursor::new(buf))
            }
            CompressionMethod::Lz4 if chunked => {
                let mut buf = Vec::with_capacity(uncompressed);
                lz4_flex::frame::FrameDecoder::new(reader.take(on_disk))
                    .take(uncompressed as u64)
                    .read_to_end(&mut buf)
                    .map_err(corrupt)?;
                debug!(%segment, inflated = buf.len(), "decoded lz4 frame segment");
                SegmentReader::Decompressed(Cursor::new(buf))
            }
            CompressionMethod::Lz4 => {
                let mut src = Vec::with_capacity(on_disk as usize);
                reader.take(on_disk).read_to_end(&mut src)?;
                let buf = lz4_flex::block::decompress(&src, uncompressed)
                    .map_err(|e| corrupt(io::Error::new(io::ErrorKind::InvalidData, e)))?;
                debug!(%segment, inflated = buf.len(), "decoded lz4 block segment");
                SegmentReader::Decompressed(Cursor::new(buf))
            }
        })
    }

    /// A reader for a segment that holds no data
    pub fn empty() -> Self {
        SegmentReader::Decompressed(Cursor::new(Vec::new()))
    }

    /// Number of decompressed bytes available
    pub fn len(&self) -> u64 {
        match self {
            SegmentReader::Raw(r) => r.len(),
            SegmentReader::Decompressed(r) => r.get_ref().len() as u64,
        }
    }
}

impl<R: Read + Seek> Read for SegmentReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            SegmentReader::Raw(r) => r.read(buf),
            SegmentReader::Decompressed(r) => r.read(buf),
        }
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        match self {
            SegmentReader::Raw(r) => r.read_exact(buf),
            SegmentReader::Decompressed(r) => r.read_exact(buf),
        }
    }
}

impl<R: Read + Seek> Seek for SegmentReader<'_, R> {
    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        match self {
            SegmentReader::Raw(r) => r.seek(pos),
            SegmentReader::Decompressed(r) => r.seek(pos),
        }
    }
}
