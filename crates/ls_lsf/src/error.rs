//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

use crate::types::Segment;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent warpper for [`std::io::Error`]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// Transparent warpper for [`binrw::Error`]
    #[error(transparent)]
    BinRWError(#[from] binrw::Error),

    /// Transparent warpper for [`ls_resource::error::Error`]
    #[error(transparent)]
    #[diagnostic(transparent)]
    Resource(#[from] ls_resource::error::Error),

    /// file does not start with a recognized signature
    #[error("invalid lsf signature at offset {offset}: expected {expected:?}, got {got:?}")]
    InvalidSignature {
        offset: u64,
        expected: &'static [[u8; 4]],
        got: [u8; 4],
    },

    /// file version is outside of the supported range
    #[error("lsf version {version} is not supported (supported {min}..={max})")]
    UnsupportedVersion { version: u32, min: u32, max: u32 },

    /// compression flags name an unknown method
    #[error("no decompressor found for compression flags {flags:#04x}")]
    UnsupportedCompression { flags: u8 },

    /// a segment failed to decompress
    #[error("unable to decompress the {segment} segment")]
    #[diagnostic(help("the file is most likely truncated or corrupt"))]
    Decompression {
        segment: Segment,
        #[source]
        source: std::io::Error,
    },

    /// a segment declares more data than the reader accepts
    #[error("{segment} segment declares {size} bytes, above the limit of {limit}")]
    SegmentTooLarge {
        segment: Segment,
        size: u32,
        limit: u32,
    },

    /// a name reference points outside of the name dictionary
    #[error("invalid name reference (bucket {bucket}, offset {offset})")]
    InvalidName { bucket: usize, offset: usize },

    /// a node references a parent that has not been decoded before it
    #[error("node {node} references invalid parent {parent}")]
    InvalidParent { node: usize, parent: i32 },

    /// an attribute chain references an attribute outside of the table
    #[error("node {node} references invalid attribute {attribute}")]
    InvalidAttribute { node: usize, attribute: i32 },

    /// an attribute chain loops back on itself
    #[error("attribute chain of node {node} revisits attribute {attribute}")]
    AttributeChainCycle { node: usize, attribute: usize },

    /// the value stream was asked to move backwards
    #[error("attribute value at offset {offset} lies before the current position {position}")]
    #[diagnostic(help("value data is expected in attribute order; the file is corrupt"))]
    BackwardSeek { offset: u64, position: u64 },

    /// an attribute value lies outside of the value segment
    #[error("attribute value at offset {offset} with length {length} exceeds the value segment of {size} bytes")]
    ValueOutOfBounds { offset: u64, length: u64, size: u64 },

    /// a length prefix inside a value is negative
    #[error("negative length {length} at offset {offset}")]
    NegativeLength { offset: u64, length: i32 },

    /// localized string arguments are nested deeper than the reader accepts
    #[error("localized string arguments at offset {offset} are nested deeper than {limit}")]
    NestingTooDeep { offset: u64, limit: usize },
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
