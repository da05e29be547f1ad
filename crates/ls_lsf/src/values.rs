//! Attribute value decoding.

use std::io::{Read, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};
use ls_resource::{
    AttributeValue, DataType, TranslatedFsString, TranslatedFsStringArgument, TranslatedString,
};
use tracing::trace;

use crate::binutils::LsReadExt;
use crate::error::{Error, Result};
use crate::types::{FileVersion, LEGACY_TRANSLATED_STRING_ENGINE};

/// Deepest accepted nesting of localized string arguments
pub const MAX_ARGUMENT_DEPTH: usize = 64;

/// Read an `i32` length prefix, rejecting negative values
fn read_length<R: Read + Seek>(reader: &mut R) -> Result<usize> {
    let offset = reader.stream_position()?;
    let length = reader.read_i32::<LittleEndian>()?;
    usize::try_from(length).map_err(|_| Error::NegativeLength { offset, length })
}

/// Decodes attribute payloads from the value segment
///
/// The layout of localized strings depends on the file version and, for one early build, on
/// the engine version, so both are captured from the header.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ValueDecoder {
    version: FileVersion,
    engine_version: u32,
}

impl ValueDecoder {
    pub fn new(version: FileVersion, engine_version: u32) -> Self {
        ValueDecoder {
            version,
            engine_version,
        }
    }

    /// Whether localized strings start with a 16-bit version rather than an inline value
    fn has_versioned_strings(&self) -> bool {
        self.version >= FileVersion::Bg3 || self.engine_version == LEGACY_TRANSLATED_STRING_ENGINE
    }

    /// Decode one value of `data_type` at the current position.
    ///
    /// `length` is the size recorded in the attribute descriptor; only the string types and
    /// scratch buffers depend on it.
    pub fn read_value<R: Read + Seek>(
        &self,
        reader: &mut R,
        data_type: DataType,
        length: usize,
    ) -> Result<AttributeValue> {
        type LE = LittleEndian;

        let value = match data_type {
            DataType::None => AttributeValue::None,
            DataType::Byte => AttributeValue::Byte(reader.read_u8()?),
            DataType::Short => AttributeValue::Short(reader.read_i16::<LE>()?),
            DataType::UShort => AttributeValue::UShort(reader.read_u16::<LE>()?),
            DataType::Int => AttributeValue::Int(reader.read_i32::<LE>()?),
            DataType::UInt => AttributeValue::UInt(reader.read_u32::<LE>()?),
            DataType::Float => AttributeValue::Float(reader.read_f32::<LE>()?),
            DataType::Double => AttributeValue::Double(reader.read_f64::<LE>()?),
            DataType::IVec2 => AttributeValue::IVec(reader.read_i32_vec::<LE>(2)?),
            DataType::IVec3 => AttributeValue::IVec(reader.read_i32_vec::<LE>(3)?),
            DataType::IVec4 => AttributeValue::IVec(reader.read_i32_vec::<LE>(4)?),
            DataType::Vec2 => AttributeValue::Vec(reader.read_f32_vec::<LE>(2)?),
            DataType::Vec3 => AttributeValue::Vec(reader.read_f32_vec::<LE>(3)?),
            DataType::Vec4 => AttributeValue::Vec(reader.read_f32_vec::<LE>(4)?),
            DataType::Mat2 => AttributeValue::Mat(reader.read_matrix::<LE>(2, 2)?),
            DataType::Mat3 => AttributeValue::Mat(reader.read_matrix::<LE>(3, 3)?),
            DataType::Mat3x4 => AttributeValue::Mat(reader.read_matrix::<LE>(3, 4)?),
            DataType::Mat4x3 => AttributeValue::Mat(reader.read_matrix::<LE>(4, 3)?),
            DataType::Mat4 => AttributeValue::Mat(reader.read_matrix::<LE>(4, 4)?),
            DataType::Bool => AttributeValue::Bool(reader.read_u8()? != 0),
            DataType::String
            | DataType::Path
            | DataType::FixedString
            | DataType::LSString
            | DataType::WString
            | DataType::LSWString => AttributeValue::String(reader.read_cstring(length)?),
            DataType::ULongLong => AttributeValue::ULongLong(reader.read_u64::<LE>()?),
            DataType::ScratchBuffer => AttributeValue::ScratchBuffer(reader.read_bytes(length)?),
            DataType::Long | DataType::Int64 => AttributeValue::Long(reader.read_i64::<LE>()?),
            DataType::Int8 => AttributeValue::Int8(reader.read_i8()?),
            DataType::TranslatedString => {
                AttributeValue::TranslatedString(self.read_translated_string(reader)?)
            }
            DataType::TranslatedFSString => {
                AttributeValue::TranslatedFSString(self.read_translated_fs_string(reader)?)
            }
            DataType::Uuid => AttributeValue::Uuid(reader.read_guid()?),
        };

        Ok(value)
    }

    /// Decode a [`TranslatedString`]
    ///
    /// Versioned files store a u16 version followed directly by the handle. Some writers put an
    /// inline value there instead: its u16 length takes the place of the version and is followed
    /// by a zero u16. A zero probe therefore means the first field was a length; anything else
    /// belongs to the handle length and is read again.
    pub fn read_translated_string<R: Read + Seek>(&self, reader: &mut R) -> Result<TranslatedString> {
        let mut string = TranslatedString::default();

        if self.has_versioned_strings() {
            string.version = reader.read_u16::<LittleEndian>()?;
            let probe = reader.read_u16::<LittleEndian>()?;
            if probe == 0 {
                string.value = reader.read_cstring(string.version as usize)?;
                string.version = 0;
            } else {
                reader.seek(SeekFrom::Current(-2))?;
            }
        } else {
            let length = read_length(reader)?;
            string.value = reader.read_raw_string(length)?;
        }

        let length = read_length(reader)?;
        string.handle = reader.read_cstring(length)?;

        trace!(
            version = string.version,
            value = %string.value,
            handle = %string.handle,
            "read translated string"
        );

        Ok(string)
    }

    /// Decode a [`TranslatedFsString`] and its arguments
    pub fn read_translated_fs_string<R: Read + Seek>(
        &self,
        reader: &mut R,
    ) -> Result<TranslatedFsString> {
        self.read_fs_string_nested(reader, 0)
    }

    fn read_fs_string_nested<R: Read + Seek>(
        &self,
        reader: &mut R,
        depth: usize,
    ) -> Result<TranslatedFsString> {
        if depth > MAX_ARGUMENT_DEPTH {
            return Err(Error::NestingTooDeep {
                offset: reader.stream_position()?,
                limit: MAX_ARGUMENT_DEPTH,
            });
        }

        let mut string = TranslatedFsString::default();

        if self.version >= FileVersion::Bg3 {
            string.version = reader.read_u16::<LittleEndian>()?;
        } else {
            let length = read_length(reader)?;
            string.value = reader.read_cstring(length)?;
        }

        let length = read_length(reader)?;
        string.handle = reader.read_cstring(length)?;

        let count = read_length(reader)?;
        string.arguments = Vec::with_capacity(count.min(16));
        for _ in 0..count {
            let length = read_length(reader)?;
            let key = reader.read_cstring(length)?;
            let nested = self.read_fs_string_nested(reader, depth + 1)?;
            let length = read_length(reader)?;
            let value = reader.read_cstring(length)?;

            string.arguments.push(TranslatedFsStringArgument {
                key,
                string: nested,
                value,
            });
        }

        trace!(
            depth,
            handle = %string.handle,
            arguments = string.arguments.len(),
            "read translated fs string"
        );

        Ok(string)
    }
}
