//! Typed attribute payloads and their textual form.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use derive_more::From;
use uuid::Uuid;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::DataType;

/// A localized string: a translation handle with an optional inline fallback value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TranslatedString {
    pub version: u16,
    pub value: String,
    pub handle: String,
}

/// A localized string whose text is parameterized by named arguments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TranslatedFsString {
    pub version: u16,
    pub value: String,
    pub handle: String,
    pub arguments: Vec<TranslatedFsStringArgument>,
}

/// One named argument of a [`TranslatedFsString`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TranslatedFsStringArgument {
    pub key: String,
    pub string: TranslatedFsString,
    pub value: String,
}

/// A row-major float matrix
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawMatrix"))]
pub struct Matrix {
    rows: usize,
    cols: usize,
    values: Vec<f32>,
}

/// Unchecked serialized form of a [`Matrix`]
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawMatrix {
    rows: usize,
    cols: usize,
    values: Vec<f32>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawMatrix> for Matrix {
    type Error = Error;

    fn try_from(raw: RawMatrix) -> Result<Matrix> {
        let got = raw.values.len();
        Matrix::new(raw.rows, raw.cols, raw.values).ok_or(Error::MatrixShape {
            rows: raw.rows,
            cols: raw.cols,
            got,
        })
    }
}

impl Matrix {
    /// Create a matrix from row-major values, returning `None` when the count does not match
    pub fn new(rows: usize, cols: usize, values: Vec<f32>) -> Option<Matrix> {
        (rows.checked_mul(cols) == Some(values.len())).then_some(Matrix { rows, cols, values })
    }

    /// Create a zeroed matrix
    pub fn zeroed(rows: usize, cols: usize) -> Matrix {
        Matrix {
            rows,
            cols,
            values: vec![0.0; rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// The cell at `row`, `col`
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.values.get(row * self.cols + col).copied()
    }

    /// Set the cell at `row`, `col`; out of range writes are ignored
    pub fn set(&mut self, row: usize, col: usize, value: f32) {
        if row < self.rows && col < self.cols {
            if let Some(cell) = self.values.get_mut(row * self.cols + col) {
                *cell = value;
            }
        }
    }

    /// A single row as a slice
    pub fn row(&self, row: usize) -> Option<&[f32]> {
        if row >= self.rows {
            return None;
        }
        self.values.get(row * self.cols..(row + 1) * self.cols)
    }

    /// All cells in row-major order
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }
}

/// The decoded payload of an attribute
///
/// The variant is determined by the attribute's [`DataType`]; several data types share a
/// payload shape (every string flavour is a [`AttributeValue::String`], both 64-bit signed
/// types are [`AttributeValue::Long`]).
#[derive(Debug, Clone, PartialEq, From)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AttributeValue {
    None,
    Byte(u8),
    Short(i16),
    UShort(u16),
    Int(i32),
    UInt(u32),
    Float(f32),
    Double(f64),
    IVec(Vec<i32>),
    Vec(Vec<f32>),
    Mat(Matrix),
    Bool(bool),
    String(String),
    ULongLong(u64),
    ScratchBuffer(Vec<u8>),
    Long(i64),
    Int8(i8),
    TranslatedString(TranslatedString),
    TranslatedFSString(TranslatedFsString),
    Uuid(Uuid),
}

impl AttributeValue {
    /// Render the value in its textual form
    pub fn render(&self) -> String {
        self.to_string()
    }

    /// Parse the textual form of a value of type `data_type`
    pub fn parse(data_type: DataType, text: &str) -> Result<AttributeValue> {
        let text = if data_type.is_numeric() && text.trim().is_empty() {
            "0"
        } else {
            text
        };

        Ok(match data_type {
            DataType::None => AttributeValue::None,
            DataType::Byte => AttributeValue::Byte(parse_int(data_type, text)?),
            DataType::Short => AttributeValue::Short(parse_int(data_type, text)?),
            DataType::UShort => AttributeValue::UShort(parse_int(data_type, text)?),
            DataType::Int => AttributeValue::Int(parse_int(data_type, text)?),
            DataType::UInt => AttributeValue::UInt(parse_int(data_type, text)?),
            DataType::ULongLong => AttributeValue::ULongLong(parse_int(data_type, text)?),
            DataType::Long | DataType::Int64 => AttributeValue::Long(parse_int(data_type, text)?),
            DataType::Int8 => AttributeValue::Int8(parse_int(data_type, text)?),
            DataType::Float => AttributeValue::Float(parse_float(data_type, text)?),
            DataType::Double => AttributeValue::Double(parse_float(data_type, text)?),
            DataType::IVec2 | DataType::IVec3 | DataType::IVec4 => {
                let parts = split_components(data_type, text)?;
                AttributeValue::IVec(
                    parts
                        .into_iter()
                        .map(|p| parse_int(data_type, p))
                        .collect::<Result<_>>()?,
                )
            }
            DataType::Vec2 | DataType::Vec3 | DataType::Vec4 => {
                let parts = split_components(data_type, text)?;
                AttributeValue::Vec(
                    parts
                        .into_iter()
                        .map(|p| parse_float(data_type, p))
                        .collect::<Result<_>>()?,
                )
            }
            DataType::Mat2
            | DataType::Mat3
            | DataType::Mat3x4
            | DataType::Mat4x3
            | DataType::Mat4 => {
                let (rows, cols) = shape(data_type)?;
                let values = split_components(data_type, text)?
                    .into_iter()
                    .map(|p| parse_float(data_type, p))
                    .collect::<Result<Vec<f32>>>()?;
                AttributeValue::Mat(Matrix { rows, cols, values })
            }
            DataType::Bool => AttributeValue::Bool(parse_bool(text)?),
            DataType::String
            | DataType::Path
            | DataType::FixedString
            | DataType::LSString
            | DataType::WString
            | DataType::LSWString => AttributeValue::String(text.to_owned()),
            DataType::ScratchBuffer => AttributeValue::ScratchBuffer(STANDARD.decode(text.trim())?),
            DataType::Uuid => AttributeValue::Uuid(Uuid::parse_str(text.trim())?),
            DataType::TranslatedString => AttributeValue::TranslatedString(TranslatedString {
                value: text.to_owned(),
                ..Default::default()
            }),
            DataType::TranslatedFSString => {
                AttributeValue::TranslatedFSString(TranslatedFsString {
                    value: text.to_owned(),
                    ..Default::default()
                })
            }
        })
    }

    /// Whether this payload shape is valid for `data_type`
    pub fn matches(&self, data_type: DataType) -> bool {
        match self {
            AttributeValue::None => data_type == DataType::None,
            AttributeValue::Byte(_) => data_type == DataType::Byte,
            AttributeValue::Short(_) => data_type == DataType::Short,
            AttributeValue::UShort(_) => data_type == DataType::UShort,
            AttributeValue::Int(_) => data_type == DataType::Int,
            AttributeValue::UInt(_) => data_type == DataType::UInt,
            AttributeValue::Float(_) => data_type == DataType::Float,
            AttributeValue::Double(_) => data_type == DataType::Double,
            AttributeValue::IVec(v) => {
                data_type.is_int_vector() && data_type.columns() == Some(v.len())
            }
            AttributeValue::Vec(v) => {
                data_type.is_float_vector() && data_type.columns() == Some(v.len())
            }
            AttributeValue::Mat(m) => {
                data_type.rows() == Some(m.rows) && data_type.columns() == Some(m.cols)
            }
            AttributeValue::Bool(_) => data_type == DataType::Bool,
            AttributeValue::String(_) => data_type.is_string(),
            AttributeValue::ULongLong(_) => data_type == DataType::ULongLong,
            AttributeValue::ScratchBuffer(_) => data_type == DataType::ScratchBuffer,
            AttributeValue::Long(_) => matches!(data_type, DataType::Long | DataType::Int64),
            AttributeValue::Int8(_) => data_type == DataType::Int8,
            AttributeValue::TranslatedString(_) => data_type == DataType::TranslatedString,
            AttributeValue::TranslatedFSString(_) => data_type == DataType::TranslatedFSString,
            AttributeValue::Uuid(_) => data_type == DataType::Uuid,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::None => Ok(()),
            AttributeValue::Byte(v) => write!(f, "{v}"),
            AttributeValue::Short(v) => write!(f, "{v}"),
            AttributeValue::UShort(v) => write!(f, "{v}"),
            AttributeValue::Int(v) => write!(f, "{v}"),
            AttributeValue::UInt(v) => write!(f, "{v}"),
            AttributeValue::Float(v) => write!(f, "{v}"),
            AttributeValue::Double(v) => write!(f, "{v}"),
            AttributeValue::IVec(v) => write_joined(f, v),
            AttributeValue::Vec(v) => write_joined(f, v),
            AttributeValue::Mat(m) => write_joined(f, &m.values),
            AttributeValue::Bool(true) => f.write_str("True"),
            AttributeValue::Bool(false) => f.write_str("False"),
            AttributeValue::String(v) => f.write_str(v),
            AttributeValue::ULongLong(v) => write!(f, "{v}"),
            AttributeValue::ScratchBuffer(v) => f.write_str(&STANDARD.encode(v)),
            AttributeValue::Long(v) => write!(f, "{v}"),
            AttributeValue::Int8(v) => write!(f, "{v}"),
            AttributeValue::TranslatedString(v) => f.write_str(&v.value),
            AttributeValue::TranslatedFSString(v) => f.write_str(&v.value),
            AttributeValue::Uuid(v) => write!(f, "{}", v.hyphenated()),
        }
    }
}

fn write_joined<T: fmt::Display>(f: &mut fmt::Formatter<'_>, values: &[T]) -> fmt::Result {
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{v}")?;
    }
    Ok(())
}

fn shape(data_type: DataType) -> Result<(usize, usize)> {
    data_type
        .rows()
        .zip(data_type.columns())
        .ok_or(Error::UnsupportedParse(data_type))
}

fn split_components(data_type: DataType, text: &str) -> Result<Vec<&str>> {
    let (rows, cols) = shape(data_type)?;
    let parts: Vec<&str> = text.split_whitespace().collect();
    if parts.len() != rows * cols {
        return Err(Error::VectorArity {
            data_type,
            expected: rows * cols,
            got: parts.len(),
        });
    }
    Ok(parts)
}

fn parse_int<T: TryFrom<i128>>(data_type: DataType, text: &str) -> Result<T> {
    let invalid = || Error::InvalidNumber {
        data_type,
        text: text.to_owned(),
    };

    let trimmed = text.trim();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let (radix, digits) = match digits.get(..2) {
        Some("0x") | Some("0X") => (16, &digits[2..]),
        Some("0o") | Some("0O") => (8, &digits[2..]),
        Some("0b") | Some("0B") => (2, &digits[2..]),
        _ => (10, digits),
    };
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return Err(invalid());
    }

    let magnitude = i128::from_str_radix(digits, radix).map_err(|_| invalid())?;
    let value = if negative { -magnitude } else { magnitude };
    T::try_from(value).map_err(|_| invalid())
}

fn parse_float<T: std::str::FromStr>(data_type: DataType, text: &str) -> Result<T> {
    text.trim().parse::<T>().map_err(|_| Error::InvalidNumber {
        data_type,
        text: text.to_owned(),
    })
}

fn parse_bool(text: &str) -> Result<bool> {
    match text.trim() {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        other => Err(Error::InvalidBool(other.to_owned())),
    }
}
