//! Base types for structure of LSF file.

use std::io::{Read, Seek};

use binrw::BinRead;
use derive_more::Display;
use tracing::{debug, instrument};

use crate::compression::{CompressionLevel, CompressionMethod};
use crate::error::{Error, Result};

/// Signature of every current LSF file ("LSOF")
pub const SIGNATURE: [u8; 4] = *b"LSOF";

/// Signature used by some legacy LSF writers ("LSFM")
pub const LEGACY_SIGNATURE: [u8; 4] = *b"LSFM";

/// All signatures accepted by the header parser
pub const SIGNATURES: &[[u8; 4]] = &[SIGNATURE, LEGACY_SIGNATURE];

/// Engine version written by an early build that already used the newer localized string layout
pub const LEGACY_TRANSLATED_STRING_ENGINE: u32 = 0x4000_001D;

/// Reports whether `bytes` begins with a recognized LSF signature
pub fn is_supported_signature(bytes: &[u8]) -> bool {
    bytes
        .get(..4)
        .is_some_and(|prefix| SIGNATURES.iter().any(|s| s == prefix))
}

/// The four segments of an LSF file, in file order
#[derive(Debug, Display, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    #[display("names")]
    Names,
    #[display("nodes")]
    Nodes,
    #[display("attributes")]
    Attributes,
    #[display("values")]
    Values,
}

/// Revisions of the LSF layout
#[derive(Debug, Display, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u32)]
pub enum FileVersion {
    /// Initial version of the LSF format
    #[display("1")]
    Initial = 1,

    /// Added chunked (frame) compression for the node, attribute and value segments
    #[display("2")]
    ChunkedCompress = 2,

    /// Added the extended node and attribute descriptors
    #[display("3")]
    ExtendedNodes = 3,

    /// Baldur's Gate 3; changes the localized string layout
    #[display("4")]
    Bg3 = 4,
}

impl FileVersion {
    pub const MIN: FileVersion = FileVersion::Initial;
    pub const MAX: FileVersion = FileVersion::Bg3;
}

impl TryFrom<u32> for FileVersion {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            1 => Ok(FileVersion::Initial),
            2 => Ok(FileVersion::ChunkedCompress),
            3 => Ok(FileVersion::ExtendedNodes),
            4 => Ok(FileVersion::Bg3),
            version => Err(Error::UnsupportedVersion {
                version,
                min: FileVersion::MIN as u32,
                max: FileVersion::MAX as u32,
            }),
        }
    }
}

/// Sizes of one segment
#[derive(BinRead, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[br(little)]
pub struct SegmentSize {
    /// Size of the segment once decompressed
    pub uncompressed: u32,

    /// Size of the segment in the file
    pub on_disk: u32,
}

impl SegmentSize {
    /// Whether the segment holds no data at all
    pub fn is_empty(&self) -> bool {
        self.uncompressed == 0 && self.on_disk == 0
    }
}

/// Header fields following the signature
#[derive(BinRead, Debug, Copy, Clone, PartialEq)]
#[br(little)]
struct RawHeader {
    version: u32,
    engine_version: u32,
    names: SegmentSize,
    nodes: SegmentSize,
    attributes: SegmentSize,
    values: SegmentSize,
    compression_flags: u8,
    unknown2: u8,
    unknown3: u16,
    extended: u32,
}

/// LSF file header
///
/// All data is stored in little endian format
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LsfHeader {
    /// One of [`SIGNATURES`]
    pub signature: [u8; 4],

    pub version: FileVersion,

    /// Packed engine version, see [`ls_resource::Metadata::from_engine_version`]
    pub engine_version: u32,

    /// Interned name dictionary
    pub names: SegmentSize,

    /// Node descriptor table
    pub nodes: SegmentSize,

    /// Attribute descriptor table
    pub attributes: SegmentSize,

    /// Raw attribute values
    pub values: SegmentSize,

    /// Compression method (low nibble) and level (high nibble) shared by every segment
    pub compression_flags: u8,

    /// Possibly unused, always 0
    pub unknown2: u8,
    pub unknown3: u16,

    /// Extended node/attribute format indicator, 0 for V2, 0/1 for V3
    pub extended: u32,
}

impl LsfHeader {
    /// Size of the header on disk
    pub const SIZE: u64 = 52;

    /// Read and validate the header.
    ///
    /// Reading stops right after the signature when it is not recognized. When the file is not
    /// compressed the on-disk segment sizes are replaced by the uncompressed sizes, as writers
    /// leave them unreliable in that case.
    #[instrument(skip(reader), err)]
    pub fn read<R: Read + Seek>(reader: &mut R) -> Result<LsfHeader> {
        let offset = reader.stream_position()?;

        let mut signature = [0u8; 4];
        reader.read_exact(&mut signature)?;
        if !SIGNATURES.contains(&signature) {
            return Err(Error::InvalidSignature {
                offset,
                expected: SIGNATURES,
                got: signature,
            });
        }

        let raw = RawHeader::read(reader)?;
        let version = FileVersion::try_from(raw.version)?;
        let method = CompressionMethod::from_flags(raw.compression_flags)?;

        let mut header = LsfHeader {
            signature,
            version,
            engine_version: raw.engine_version,
            names: raw.names,
            nodes: raw.nodes,
            attributes: raw.attributes,
            values: raw.values,
            compression_flags: raw.compression_flags,
            unknown2: raw.unknown2,
            unknown3: raw.unknown3,
            extended: raw.extended,
        };

        if method == CompressionMethod::None {
            for segment in [
                &mut header.names,
                &mut header.nodes,
                &mut header.attributes,
                &mut header.values,
            ] {
                segment.on_disk = segment.uncompressed;
            }
        }

        debug!(
            version = %header.version,
            engine_version = format_args!("{:#010x}", header.engine_version),
            compression = ?method,
            extended = header.extended,
            "read lsf header"
        );

        Ok(header)
    }

    /// Compression method used by every segment
    pub fn compression_method(&self) -> Result<CompressionMethod> {
        CompressionMethod::from_flags(self.compression_flags)
    }

    /// Compression level the writer used, when it is one of the known levels
    pub fn compression_level(&self) -> Option<CompressionLevel> {
        CompressionLevel::from_flags(self.compression_flags)
    }

    /// Whether the node and attribute tables use the extended descriptors
    pub fn has_extended_nodes(&self) -> bool {
        self.version >= FileVersion::ExtendedNodes && self.extended == 1
    }

    /// Whether the node, attribute and value segments use chunked compression
    pub fn is_chunked(&self) -> bool {
        self.version >= FileVersion::ChunkedCompress
    }

    /// Sizes of `segment`
    pub fn segment(&self, segment: Segment) -> SegmentSize {
        match segment {
            Segment::Names => self.names,
            Segment::Nodes => self.nodes,
            Segment::Attributes => self.attributes,
            Segment::Values => self.values,
        }
    }
}

/// Splits a packed name reference into (bucket, offset in chain)
pub(crate) fn split_name_ref(name: u32) -> (usize, usize) {
    ((name >> 16) as usize, (name & 0xFFFF) as usize)
}

/// Node descriptor used before [`FileVersion::ExtendedNodes`]
#[derive(BinRead, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[br(little)]
pub struct CompactNodeEntry {
    /// 16-bit MSB: bucket in the name dictionary, 16-bit LSB: offset in the bucket's chain
    pub name: u32,

    /// Index of the first attribute of this node (-1: node has no attributes)
    pub first_attribute_index: i32,

    /// Index of the parent node (-1: this node is a root region)
    pub parent_index: i32,
}

/// Node descriptor used by extended files
#[derive(BinRead, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[br(little)]
pub struct ExtendedNodeEntry {
    /// 16-bit MSB: bucket in the name dictionary, 16-bit LSB: offset in the bucket's chain
    pub name: u32,

    /// Index of the parent node (-1: this node is a root region)
    pub parent_index: i32,

    /// Index of the next sibling of this node (-1: this is the last node)
    pub next_sibling_index: i32,

    /// Index of the first attribute of this node (-1: node has no attributes)
    pub first_attribute_index: i32,
}

/// Attribute descriptor used before [`FileVersion::ExtendedNodes`]
#[derive(BinRead, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[br(little)]
pub struct CompactAttributeEntry {
    /// 16-bit MSB: bucket in the name dictionary, 16-bit LSB: offset in the bucket's chain
    pub name: u32,

    /// 6-bit LSB: data type id, 26-bit MSB: length of the value
    pub type_and_length: u32,

    /// Node this attribute belongs to
    pub node_index: i32,
}

/// Attribute descriptor used by extended files
#[derive(BinRead, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[br(little)]
pub struct ExtendedAttributeEntry {
    /// 16-bit MSB: bucket in the name dictionary, 16-bit LSB: offset in the bucket's chain
    pub name: u32,

    /// 6-bit LSB: data type id, 26-bit MSB: length of the value
    pub type_and_length: u32,

    /// Index of the next attribute of the same node (-1: this is the last attribute)
    pub next_attribute_index: i32,

    /// Absolute position of the value inside the value segment
    pub offset: u32,
}

/// Splits a packed type and length into (type id, length)
pub(crate) fn split_type_and_length(type_and_length: u32) -> (u32, u32) {
    (type_and_length & 0x3F, type_and_length >> 6)
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use binrw::BinRead;
    use pretty_assertions::assert_eq;

    use crate::compression::{CompressionLevel, CompressionMethod};
    use crate::error::{Error, Result};
    use crate::types::{
        is_supported_signature, split_name_ref, split_type_and_length, CompactAttributeEntry,
        ExtendedNodeEntry, FileVersion, LsfHeader, SegmentSize,
    };

    #[rustfmt::skip]
    fn header_bytes(signature: &[u8; 4], version: u8, flags: u8, extended: u8) -> Vec<u8> {
        let mut bytes = signature.to_vec();
        bytes.extend_from_slice(&[
            version, 0x00, 0x00, 0x00,
            0x1D, 0x00, 0x00, 0x40,
            0x10, 0x00, 0x00, 0x00, 0x08, 0x00, 0x00, 0x00,
            0x20, 0x00, 0x00, 0x00, 0x09, 0x00, 0x00, 0x00,
            0x30, 0x00, 0x00, 0x00, 0x0A, 0x00, 0x00, 0x00,
            0x40, 0x00, 0x00, 0x00, 0x0B, 0x00, 0x00, 0x00,
            flags, 0x00, 0x00, 0x00,
            extended, 0x00, 0x00, 0x00,
        ]);
        bytes
    }

    #[test]
    fn read_compressed_header() -> Result<()> {
        let mut input = Cursor::new(header_bytes(b"LSOF", 4, 0x22, 1));

        let header = LsfHeader::read(&mut input)?;
        assert_eq!(input.position(), LsfHeader::SIZE);
        assert_eq!(header.version, FileVersion::Bg3);
        assert_eq!(header.engine_version, 0x4000_001D);
        assert_eq!(
            header.names,
            SegmentSize {
                uncompressed: 0x10,
                on_disk: 0x08
            }
        );
        assert_eq!(header.values.on_disk, 0x0B);
        assert_eq!(header.compression_method()?, CompressionMethod::Lz4);
        assert_eq!(header.compression_level(), Some(CompressionLevel::Default));
        assert!(header.has_extended_nodes());
        assert!(header.is_chunked());

        Ok(())
    }

    #[test]
    fn uncompressed_header_uses_uncompressed_sizes() -> Result<()> {
        let mut input = Cursor::new(header_bytes(b"LSOF", 2, 0x00, 0));

        let header = LsfHeader::read(&mut input)?;
        assert_eq!(header.compression_method()?, CompressionMethod::None);
        assert_eq!(header.compression_level(), None);
        assert_eq!(header.names.on_disk, 0x10);
        assert_eq!(header.nodes.on_disk, 0x20);
        assert_eq!(header.attributes.on_disk, 0x30);
        assert_eq!(header.values.on_disk, 0x40);

        Ok(())
    }

    #[test]
    fn extended_flag_needs_version_three() -> Result<()> {
        let header = LsfHeader::read(&mut Cursor::new(header_bytes(b"LSOF", 2, 0x00, 1)))?;
        assert!(!header.has_extended_nodes());

        let header = LsfHeader::read(&mut Cursor::new(header_bytes(b"LSOF", 3, 0x00, 0)))?;
        assert!(!header.has_extended_nodes());

        let header = LsfHeader::read(&mut Cursor::new(header_bytes(b"LSFM", 3, 0x00, 1)))?;
        assert!(header.has_extended_nodes());

        Ok(())
    }

    #[test]
    fn read_invalid_signature() {
        let mut input = Cursor::new(header_bytes(b"LSOX", 4, 0x00, 0));

        let result = LsfHeader::read(&mut input);
        assert!(matches!(
            result,
            Err(Error::InvalidSignature {
                offset: 0,
                got: [b'L', b'S', b'O', b'X'],
                ..
            })
        ));
        assert_eq!(input.position(), 4);
    }

    #[test]
    fn read_unsupported_version() {
        for version in [0, 5] {
            let mut input = Cursor::new(header_bytes(b"LSOF", version, 0x00, 0));
            assert!(matches!(
                LsfHeader::read(&mut input),
                Err(Error::UnsupportedVersion { min: 1, max: 4, .. })
            ));
        }
    }

    #[test]
    fn read_unknown_compression() {
        let mut input = Cursor::new(header_bytes(b"LSOF", 4, 0x23, 0));
        assert!(matches!(
            LsfHeader::read(&mut input),
            Err(Error::UnsupportedCompression { flags: 0x23 })
        ));
    }

    #[test]
    fn unknown_compression_on_a_built_header() -> Result<()> {
        let mut header = LsfHeader::read(&mut Cursor::new(header_bytes(b"LSOF", 4, 0x22, 0)))?;
        header.compression_flags = 0x2F;
        assert!(matches!(
            header.compression_method(),
            Err(Error::UnsupportedCompression { flags: 0x2F })
        ));

        Ok(())
    }

    #[test]
    fn truncated_header_is_an_error() {
        let mut bytes = header_bytes(b"LSOF", 4, 0x00, 0);
        bytes.truncate(20);
        assert!(LsfHeader::read(&mut Cursor::new(bytes)).is_err());
    }

    #[test]
    fn signature_sniffing() {
        assert!(is_supported_signature(b"LSOF\x04\x00"));
        assert!(is_supported_signature(b"LSFM"));
        assert!(!is_supported_signature(b"LSO"));
        assert!(!is_supported_signature(b"\x00\x00\x00\x40"));
    }

    #[test]
    fn read_descriptors() -> Result<()> {
        #[rustfmt::skip]
        let mut input = Cursor::new(vec![
            0x02, 0x00, 0x01, 0x00,
            0xFF, 0xFF, 0xFF, 0xFF,
            0x05, 0x00, 0x00, 0x00,
            0x07, 0x00, 0x00, 0x00,
        ]);

        let node = ExtendedNodeEntry::read(&mut input)?;
        assert_eq!(split_name_ref(node.name), (1, 2));
        assert_eq!(node.parent_index, -1);
        assert_eq!(node.next_sibling_index, 5);
        assert_eq!(node.first_attribute_index, 7);

        #[rustfmt::skip]
        let mut input = Cursor::new(vec![
            0x00, 0x00, 0x03, 0x00,
            0x54, 0x01, 0x00, 0x00,
            0x02, 0x00, 0x00, 0x00,
        ]);

        let attribute = CompactAttributeEntry::read(&mut input)?;
        assert_eq!(split_name_ref(attribute.name), (3, 0));
        // 0x154 = (5 << 6) | 20
        assert_eq!(split_type_and_length(attribute.type_and_length), (20, 5));
        assert_eq!(attribute.node_index, 2);

        Ok(())
    }
}
