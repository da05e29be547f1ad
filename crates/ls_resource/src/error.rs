//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

use crate::types::DataType;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// on-disk type id does not name a known data type
    #[error("unknown attribute data type id {0}")]
    UnknownDataType(u32),

    /// textual type name does not name a known data type
    #[error("unknown attribute data type name {0:?}")]
    UnknownDataTypeName(String),

    /// text could not be converted to the requested numeric type
    #[error("invalid {data_type} value {text:?}")]
    #[diagnostic(help("integers accept decimal or 0x/0o/0b prefixed values"))]
    InvalidNumber { data_type: DataType, text: String },

    /// text is not a recognized boolean spelling
    #[error("invalid bool value {0:?}")]
    #[diagnostic(help("expected one of 1, t, T, TRUE, true, True, 0, f, F, FALSE, false, False"))]
    InvalidBool(String),

    /// wrong number of components for a vector or matrix
    #[error("{data_type} expects {expected} components, got {got}")]
    VectorArity {
        data_type: DataType,
        expected: usize,
        got: usize,
    },

    /// matrix cells do not match its dimensions
    #[error("{rows}x{cols} matrix cannot hold {got} values")]
    MatrixShape { rows: usize, cols: usize, got: usize },

    /// Transparent warpper for [`base64::DecodeError`]
    #[error(transparent)]
    InvalidBase64(#[from] base64::DecodeError),

    /// Transparent warpper for [`uuid::Error`]
    #[error(transparent)]
    InvalidUuid(#[from] uuid::Error),

    /// the data type has no textual form that can be parsed
    #[error("cannot parse a value of type {0} from text")]
    UnsupportedParse(DataType),
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
