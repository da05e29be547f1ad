//! Types for reading LSF files
//!

use std::collections::HashSet;
use std::io::{Read, Seek, SeekFrom};

use bon::Builder;
use ls_resource::{DataType, Metadata, Node, NodeAttribute, NodeId, Resource};
use tracing::{debug, instrument, trace, Dispatch};

use crate::compression::SegmentReader;
use crate::error::{Error, Result};
use crate::names::NameDictionary;
use crate::tables::{read_attributes, read_nodes, AttributeInfo, NodeInfo};
use crate::types::{LsfHeader, Segment};
use crate::values::ValueDecoder;

/// Largest declared segment size accepted by default (512 MiB)
pub const DEFAULT_MAX_SEGMENT_SIZE: u32 = 512 * 1024 * 1024;

/// Options for how an LSF file should be read
#[derive(Debug, Clone, Builder)]
pub struct ReadOptions {
    /// Subscriber receiving the spans and events of this read. Nothing is logged when unset,
    /// whatever subscriber the application installed.
    pub dispatch: Option<Dispatch>,

    /// Largest segment, compressed or not, the reader will allocate for
    #[builder(default = DEFAULT_MAX_SEGMENT_SIZE)]
    pub max_segment_size: u32,
}

impl Default for ReadOptions {
    fn default() -> Self {
        ReadOptions::builder().build()
    }
}

/// LSF file reader
///
/// ```no_run
/// use std::fs::File;
/// use std::io::BufReader;
///
/// fn list_regions(path: &str) -> ls_lsf::error::Result<()> {
///     let mut lsf = ls_lsf::LsfReader::new(BufReader::new(File::open(path)?));
///     let resource = lsf.read()?;
///
///     for region in resource.regions() {
///         println!("{}: {} children", region.name, region.child_count());
///     }
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct LsfReader<R> {
    reader: R,
    options: ReadOptions,
}

impl<R: Read + Seek> LsfReader<R> {
    /// Create a reader with the default options
    pub fn new(reader: R) -> LsfReader<R> {
        LsfReader::with_options(reader, ReadOptions::default())
    }

    pub fn with_options(reader: R, options: ReadOptions) -> LsfReader<R> {
        LsfReader { reader, options }
    }

    pub fn options(&self) -> &ReadOptions {
        &self.options
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Decode the file starting at the current position of the inner reader.
    ///
    /// Nothing is returned for a file that fails to decode; there is no partial tree.
    pub fn read(&mut self) -> Result<Resource> {
        let dispatch = self.dispatch();
        tracing::dispatcher::with_default(&dispatch, || self.read_resource())
    }

    /// Decode only the header, leaving the inner reader right after it
    pub fn read_header(&mut self) -> Result<LsfHeader> {
        let dispatch = self.dispatch();
        tracing::dispatcher::with_default(&dispatch, || LsfHeader::read(&mut self.reader))
    }

    /// Sink for this read; nothing is logged unless one was given
    fn dispatch(&self) -> Dispatch {
        self.options.dispatch.clone().unwrap_or_else(Dispatch::none)
    }

    #[instrument(skip(self), err)]
    fn read_resource(&mut self) -> Result<Resource> {
        let header = LsfHeader::read(&mut self.reader)?;
        self.check_segment_sizes(&header)?;

        let chunked = header.is_chunked();
        let extended = header.has_extended_nodes();

        let names = self.decode_segment(&header, Segment::Names, false, |segment| {
            if segment.len() == 0 {
                return Ok(NameDictionary::default());
            }
            NameDictionary::read(segment)
        })?;
        let nodes = self.decode_segment(&header, Segment::Nodes, chunked, |segment| {
            read_nodes(segment, extended)
        })?;
        let attributes = self.decode_segment(&header, Segment::Attributes, chunked, |segment| {
            read_attributes(segment, extended)
        })?;

        debug!(
            buckets = names.len(),
            nodes = nodes.len(),
            attributes = attributes.len(),
            "decoded tables"
        );

        let tree = TreeBuilder {
            names: &names,
            nodes: &nodes,
            attributes: &attributes,
            decoder: ValueDecoder::new(header.version, header.engine_version),
        };
        let metadata = Metadata::from_engine_version(header.engine_version);

        self.decode_segment(&header, Segment::Values, chunked, |segment| {
            tree.build(segment, metadata)
        })
    }

    fn check_segment_sizes(&self, header: &LsfHeader) -> Result<()> {
        let limit = self.options.max_segment_size;
        for segment in [
            Segment::Names,
            Segment::Nodes,
            Segment::Attributes,
            Segment::Values,
        ] {
            let sizes = header.segment(segment);
            let size = sizes.uncompressed.max(sizes.on_disk);
            if size > limit {
                return Err(Error::SegmentTooLarge {
                    segment,
                    size,
                    limit,
                });
            }
        }
        Ok(())
    }

    /// Decode one segment and leave the inner reader at the start of the next one.
    ///
    /// Decompressors may stop short of, or read past, the declared on-disk size, so the position
    /// is realigned to the declared end afterwards.
    fn decode_segment<T, F>(
        &mut self,
        header: &LsfHeader,
        segment: Segment,
        chunked: bool,
        decode: F,
    ) -> Result<T>
    where
        F: FnOnce(&mut SegmentReader<'_, R>) -> Result<T>,
    {
        let size = header.segment(segment);
        let start = self.reader.stream_position()?;

        let value = if size.uncompressed == 0 {
            decode(&mut SegmentReader::empty())?
        } else {
            let mut reader = SegmentReader::new(
                &mut self.reader,
                segment,
                size,
                header.compression_method()?,
                chunked,
            )?;
            decode(&mut reader)?
        };

        let expected = start + size.on_disk as u64;
        let position = self.reader.stream_position()?;
        if position != expected {
            debug!(%segment, position, expected, "realigning to the end of the segment");
            self.reader.seek(SeekFrom::Start(expected))?;
        }

        Ok(value)
    }
}

/// Decode a resource from `reader` with the default options
pub fn read<R: Read + Seek>(reader: R) -> Result<Resource> {
    LsfReader::new(reader).read()
}

/// Assembles the node tree from the decoded tables and the value segment
struct TreeBuilder<'a> {
    names: &'a NameDictionary,
    nodes: &'a [NodeInfo],
    attributes: &'a [AttributeInfo],
    decoder: ValueDecoder,
}

impl TreeBuilder<'_> {
    /// Build every node in table order.
    ///
    /// Parents always precede their children in the table, so a node's parent already exists
    /// in the resource when the node is pushed and node ids equal table indices.
    #[instrument(skip_all, err)]
    fn build<R: Read + Seek>(&self, values: &mut R, metadata: Metadata) -> Result<Resource> {
        let values_len = values.seek(SeekFrom::End(0))?;
        values.seek(SeekFrom::Start(0))?;

        let mut resource = Resource::new(metadata);
        for (index, info) in self.nodes.iter().enumerate() {
            let parent = match info.parent_index {
                -1 => None,
                parent if parent >= 0 && (parent as usize) < index => {
                    Some(NodeId::from(parent as usize))
                }
                parent => {
                    return Err(Error::InvalidParent {
                        node: index,
                        parent,
                    })
                }
            };

            let mut node = Node::new(self.names.resolve(info.name)?);
            node.attributes = self.read_attribute_chain(values, values_len, index, info)?;

            trace!(
                index,
                name = %node.name,
                parent = info.parent_index,
                attributes = node.attributes.len(),
                "read node"
            );
            resource.push_node(node, parent);
        }

        debug!(
            regions = resource.region_ids().len(),
            nodes = resource.total_node_count(),
            "assembled resource"
        );

        Ok(resource)
    }

    fn read_attribute_chain<R: Read + Seek>(
        &self,
        values: &mut R,
        values_len: u64,
        node: usize,
        info: &NodeInfo,
    ) -> Result<Vec<NodeAttribute>> {
        let mut chain = Vec::new();
        let mut visited = HashSet::new();

        let mut next = info.first_attribute_index;
        while next != -1 {
            let (index, attribute) = usize::try_from(next)
                .ok()
                .and_then(|i| self.attributes.get(i).map(|a| (i, a)))
                .ok_or(Error::InvalidAttribute {
                    node,
                    attribute: next,
                })?;

            if !visited.insert(index) {
                return Err(Error::AttributeChainCycle {
                    node,
                    attribute: index,
                });
            }

            chain.push(self.read_attribute(values, values_len, attribute)?);
            next = attribute.next_attribute_index;
        }

        Ok(chain)
    }

    fn read_attribute<R: Read + Seek>(
        &self,
        values: &mut R,
        values_len: u64,
        attribute: &AttributeInfo,
    ) -> Result<NodeAttribute> {
        let name = self.names.resolve(attribute.name)?;
        let data_type = DataType::try_from(attribute.type_id)?;

        let offset = attribute.data_offset;
        let length = attribute.length as u64;
        if offset + length > values_len {
            return Err(Error::ValueOutOfBounds {
                offset,
                length,
                size: values_len,
            });
        }

        let position = values.stream_position()?;
        if position != offset {
            if offset < position {
                return Err(Error::BackwardSeek { offset, position });
            }
            values.seek(SeekFrom::Start(offset))?;
        }

        let value = self
            .decoder
            .read_value(values, data_type, attribute.length as usize)?;

        trace!(
            member = %name,
            data_type = %data_type,
            offset,
            length,
            value = %value,
            "read attribute"
        );

        Ok(NodeAttribute::new(name, data_type, value))
    }
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use ls_resource::{AttributeValue, DataType, Metadata};
    use pretty_assertions::assert_eq;

    use crate::error::{Error, Result};
    use crate::names::NameDictionary;
    use crate::read::{ReadOptions, TreeBuilder, DEFAULT_MAX_SEGMENT_SIZE};
    use crate::tables::{AttributeInfo, NodeInfo};
    use crate::types::FileVersion;
    use crate::values::ValueDecoder;

    fn names() -> Result<NameDictionary> {
        #[rustfmt::skip]
        let bytes = vec![
            0x01, 0x00, 0x00, 0x00,
            0x04, 0x00,
            0x04, 0x00, b'r', b'o', b'o', b't',
            0x05, 0x00, b'c', b'h', b'i', b'l', b'd',
            0x02, 0x00, b'i', b'd',
            0x04, 0x00, b'n', b'a', b'm', b'e',
        ];
        NameDictionary::read(&mut Cursor::new(bytes))
    }

    fn node(name: u32, parent_index: i32, first_attribute_index: i32) -> NodeInfo {
        NodeInfo {
            name,
            parent_index,
            next_sibling_index: -1,
            first_attribute_index,
        }
    }

    fn attribute(name: u32, data_type: DataType, length: u32, next: i32, offset: u64) -> AttributeInfo {
        AttributeInfo {
            name,
            type_id: data_type.into(),
            length,
            next_attribute_index: next,
            data_offset: offset,
        }
    }

    fn build(nodes: &[NodeInfo], attributes: &[AttributeInfo], values: &[u8]) -> Result<ls_resource::Resource> {
        let names = names()?;
        let tree = TreeBuilder {
            names: &names,
            nodes,
            attributes,
            decoder: ValueDecoder::new(FileVersion::Bg3, 0),
        };
        tree.build(&mut Cursor::new(values.to_vec()), Metadata::default())
    }

    #[test]
    fn default_options() {
        let options = ReadOptions::default();
        assert!(options.dispatch.is_none());
        assert_eq!(options.max_segment_size, DEFAULT_MAX_SEGMENT_SIZE);

        let options = ReadOptions::builder().max_segment_size(16).build();
        assert_eq!(options.max_segment_size, 16);
    }

    #[test]
    fn one_root_two_children() -> Result<()> {
        let nodes = [node(0, -1, -1), node(1, 0, 0), node(1, 0, -1)];
        #[rustfmt::skip]
        let values = [
            0x2A, 0x00, 0x00, 0x00,
            b'f', b'o', b'o', 0x00,
        ];
        let attributes = [
            attribute(2, DataType::Int, 4, 1, 0),
            attribute(3, DataType::FixedString, 4, -1, 4),
        ];

        let resource = build(&nodes, &attributes, &values)?;
        assert_eq!(resource.region_ids().len(), 1);

        let root = resource.region("root").expect("root region");
        assert_eq!(root.region_name.as_deref(), Some("root"));
        assert_eq!(root.child_count(), 2);

        let children: Vec<_> = resource.children(root).collect();
        assert_eq!(children[0].attributes.len(), 2);
        assert_eq!(children[0].attributes[0].value, AttributeValue::Int(42));
        assert_eq!(
            children[0].attribute("name").map(|a| &a.value),
            Some(&AttributeValue::String("foo".to_owned()))
        );
        assert!(children[1].attributes.is_empty());
        assert!(children.iter().all(|c| c.region_name.is_none()));

        Ok(())
    }

    #[test]
    fn parent_must_precede_child() {
        let nodes = [node(0, -1, -1), node(1, 1, -1)];
        assert!(matches!(
            build(&nodes, &[], &[]),
            Err(Error::InvalidParent { node: 1, parent: 1 })
        ));

        let nodes = [node(0, -2, -1)];
        assert!(matches!(
            build(&nodes, &[], &[]),
            Err(Error::InvalidParent { node: 0, parent: -2 })
        ));
    }

    #[test]
    fn dangling_references() {
        let nodes = [node(0, -1, 3)];
        assert!(matches!(
            build(&nodes, &[], &[]),
            Err(Error::InvalidAttribute { node: 0, attribute: 3 })
        ));

        let nodes = [node(9, -1, -1)];
        assert!(matches!(
            build(&nodes, &[], &[]),
            Err(Error::InvalidName { bucket: 0, offset: 9 })
        ));
    }

    #[test]
    fn attribute_cycle() {
        let nodes = [node(0, -1, 0)];
        let attributes = [
            attribute(2, DataType::Byte, 1, 1, 0),
            attribute(2, DataType::Byte, 1, 0, 1),
        ];
        assert!(matches!(
            build(&nodes, &attributes, &[0x01, 0x02]),
            Err(Error::AttributeChainCycle { node: 0, attribute: 0 })
        ));
    }

    #[test]
    fn values_are_read_forward_only() -> Result<()> {
        let nodes = [node(0, -1, 0)];

        // gaps are skipped
        let attributes = [
            attribute(2, DataType::Byte, 1, 1, 0),
            attribute(2, DataType::Byte, 1, -1, 3),
        ];
        let resource = build(&nodes, &attributes, &[0x01, 0xEE, 0xEE, 0x02])?;
        let root = resource.region("root").expect("root region");
        assert_eq!(root.attributes[1].value, AttributeValue::Byte(2));

        let attributes = [
            attribute(2, DataType::Byte, 1, 1, 1),
            attribute(2, DataType::Byte, 1, -1, 0),
        ];
        assert!(matches!(
            build(&nodes, &attributes, &[0x01, 0x02]),
            Err(Error::BackwardSeek { offset: 0, position: 2 })
        ));

        Ok(())
    }

    #[test]
    fn value_outside_of_segment() {
        let nodes = [node(0, -1, 0)];
        let attributes = [attribute(2, DataType::Int, 4, -1, 2)];
        assert!(matches!(
            build(&nodes, &attributes, &[0x00; 4]),
            Err(Error::ValueOutOfBounds {
                offset: 2,
                length: 4,
                size: 4
            })
        ));
    }

    #[test]
    fn unknown_type_id() {
        let nodes = [node(0, -1, 0)];
        let attributes = [AttributeInfo {
            name: 2,
            type_id: 40,
            length: 0,
            next_attribute_index: -1,
            data_offset: 0,
        }];
        assert!(matches!(
            build(&nodes, &attributes, &[]),
            Err(Error::Resource(ls_resource::error::Error::UnknownDataType(40)))
        ));
    }
}
