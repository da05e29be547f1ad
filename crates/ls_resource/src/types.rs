//! The closed set of attribute value shapes.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Identifies how an attribute value is encoded
///
/// The discriminants are the ids stored in the low 6 bits of an attribute descriptor.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u32)]
pub enum DataType {
    /// A null value
    #[default]
    None = 0,
    Byte = 1,
    Short = 2,
    UShort = 3,
    Int = 4,
    UInt = 5,
    Float = 6,
    Double = 7,
    IVec2 = 8,
    IVec3 = 9,
    IVec4 = 10,
    Vec2 = 11,
    Vec3 = 12,
    Vec4 = 13,
    Mat2 = 14,
    Mat3 = 15,
    Mat3x4 = 16,
    Mat4x3 = 17,
    Mat4 = 18,
    Bool = 19,
    String = 20,
    Path = 21,
    FixedString = 22,
    LSString = 23,
    ULongLong = 24,
    ScratchBuffer = 25,
    /// Older 64-bit signed integer, kept distinct from [`DataType::Int64`] for round-tripping
    Long = 26,
    Int8 = 27,
    TranslatedString = 28,
    WString = 29,
    LSWString = 30,
    Uuid = 31,
    Int64 = 32,
    TranslatedFSString = 33,
}

impl DataType {
    /// Every known data type, in on-disk id order
    pub const ALL: [DataType; 34] = [
        DataType::None,
        DataType::Byte,
        DataType::Short,
        DataType::UShort,
        DataType::Int,
        DataType::UInt,
        DataType::Float,
        DataType::Double,
        DataType::IVec2,
        DataType::IVec3,
        DataType::IVec4,
        DataType::Vec2,
        DataType::Vec3,
        DataType::Vec4,
        DataType::Mat2,
        DataType::Mat3,
        DataType::Mat3x4,
        DataType::Mat4x3,
        DataType::Mat4,
        DataType::Bool,
        DataType::String,
        DataType::Path,
        DataType::FixedString,
        DataType::LSString,
        DataType::ULongLong,
        DataType::ScratchBuffer,
        DataType::Long,
        DataType::Int8,
        DataType::TranslatedString,
        DataType::WString,
        DataType::LSWString,
        DataType::Uuid,
        DataType::Int64,
        DataType::TranslatedFSString,
    ];

    /// Canonical textual name, as used by the text serialization of resources
    pub const fn name(self) -> &'static str {
        match self {
            DataType::None => "None",
            DataType::Byte => "uint8",
            DataType::Short => "int16",
            DataType::UShort => "uint16",
            DataType::Int => "int32",
            DataType::UInt => "uint32",
            DataType::Float => "float",
            DataType::Double => "double",
            DataType::IVec2 => "ivec2",
            DataType::IVec3 => "ivec3",
            DataType::IVec4 => "ivec4",
            DataType::Vec2 => "fvec2",
            DataType::Vec3 => "fvec3",
            DataType::Vec4 => "fvec4",
            DataType::Mat2 => "mat2x2",
            DataType::Mat3 => "mat3x3",
            DataType::Mat3x4 => "mat3x4",
            DataType::Mat4x3 => "mat4x3",
            DataType::Mat4 => "mat4x4",
            DataType::Bool => "bool",
            DataType::String => "string",
            DataType::Path => "path",
            DataType::FixedString => "FixedString",
            DataType::LSString => "LSString",
            DataType::ULongLong => "uint64",
            DataType::ScratchBuffer => "ScratchBuffer",
            DataType::Long => "old_int64",
            DataType::Int8 => "int8",
            DataType::TranslatedString => "TranslatedString",
            DataType::WString => "WString",
            DataType::LSWString => "LSWString",
            DataType::Uuid => "guid",
            DataType::Int64 => "int64",
            DataType::TranslatedFSString => "TranslatedFSString",
        }
    }

    /// Look up a data type by its canonical textual name
    pub fn from_name(name: &str) -> Result<DataType> {
        DataType::ALL
            .into_iter()
            .find(|dt| dt.name() == name)
            .ok_or_else(|| Error::UnknownDataTypeName(name.to_owned()))
    }

    /// Number of rows for vector (always 1) and matrix types
    pub const fn rows(self) -> Option<usize> {
        match self {
            DataType::IVec2
            | DataType::IVec3
            | DataType::IVec4
            | DataType::Vec2
            | DataType::Vec3
            | DataType::Vec4 => Some(1),
            DataType::Mat2 => Some(2),
            DataType::Mat3 | DataType::Mat3x4 => Some(3),
            DataType::Mat4x3 | DataType::Mat4 => Some(4),
            _ => None,
        }
    }

    /// Number of columns for vector and matrix types
    pub const fn columns(self) -> Option<usize> {
        match self {
            DataType::IVec2 | DataType::Vec2 | DataType::Mat2 => Some(2),
            DataType::IVec3 | DataType::Vec3 | DataType::Mat3 | DataType::Mat4x3 => Some(3),
            DataType::IVec4 | DataType::Vec4 | DataType::Mat3x4 | DataType::Mat4 => Some(4),
            _ => None,
        }
    }

    /// Whether values of this type are plain numbers
    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            DataType::Byte
                | DataType::Short
                | DataType::UShort
                | DataType::Int
                | DataType::UInt
                | DataType::Float
                | DataType::Double
                | DataType::ULongLong
                | DataType::Long
                | DataType::Int64
                | DataType::Int8
        )
    }

    /// Whether this type is one of the integer vectors
    pub const fn is_int_vector(self) -> bool {
        matches!(self, DataType::IVec2 | DataType::IVec3 | DataType::IVec4)
    }

    /// Whether this type is one of the float vectors
    pub const fn is_float_vector(self) -> bool {
        matches!(self, DataType::Vec2 | DataType::Vec3 | DataType::Vec4)
    }

    /// Whether this type is one of the float matrices
    pub const fn is_matrix(self) -> bool {
        matches!(
            self,
            DataType::Mat2 | DataType::Mat3 | DataType::Mat3x4 | DataType::Mat4x3 | DataType::Mat4
        )
    }

    /// Whether this type is stored as a plain string payload
    pub const fn is_string(self) -> bool {
        matches!(
            self,
            DataType::String
                | DataType::Path
                | DataType::FixedString
                | DataType::LSString
                | DataType::WString
                | DataType::LSWString
        )
    }

    /// Size of the encoded value when it does not depend on the payload
    pub const fn fixed_size(self) -> Option<usize> {
        match self {
            DataType::None => Some(0),
            DataType::Byte | DataType::Int8 | DataType::Bool => Some(1),
            DataType::Short | DataType::UShort => Some(2),
            DataType::Int | DataType::UInt | DataType::Float => Some(4),
            DataType::Double | DataType::ULongLong | DataType::Long | DataType::Int64 => Some(8),
            DataType::IVec2 | DataType::Vec2 => Some(8),
            DataType::IVec3 | DataType::Vec3 => Some(12),
            DataType::IVec4 | DataType::Vec4 => Some(16),
            DataType::Mat2 => Some(16),
            DataType::Mat3 => Some(36),
            DataType::Mat3x4 | DataType::Mat4x3 => Some(48),
            DataType::Mat4 => Some(64),
            DataType::Uuid => Some(16),
            _ => None,
        }
    }
}

impl TryFrom<u32> for DataType {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        DataType::ALL
            .get(value as usize)
            .copied()
            .ok_or(Error::UnknownDataType(value))
    }
}

impl From<DataType> for u32 {
    fn from(value: DataType) -> Self {
        value as u32
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
