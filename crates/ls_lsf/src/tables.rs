//! Node and attribute descriptor tables.
//!
//! Both tables are flat arrays of fixed-size entries that run until the end of their segment.
//! Files written before [`FileVersion::ExtendedNodes`](crate::FileVersion::ExtendedNodes) (and
//! later files without the extended flag) use the compact descriptors, which leave the attribute
//! chain links and value offsets implicit. They are rebuilt here so that both layouts decode to
//! the same [`NodeInfo`] and [`AttributeInfo`].

use std::collections::HashMap;
use std::io::{Read, Seek};

use binrw::{BinRead, BinResult};
use tracing::{instrument, trace};

use crate::error::Result;
use crate::types::{
    split_type_and_length, CompactAttributeEntry, CompactNodeEntry, ExtendedAttributeEntry,
    ExtendedNodeEntry,
};

/// A decoded node descriptor
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct NodeInfo {
    /// Packed reference into the name dictionary
    pub name: u32,

    /// Index of the parent node, -1 for regions
    pub parent_index: i32,

    /// Index of the next sibling, -1 when absent or when the layout does not store it
    pub next_sibling_index: i32,

    /// Index of the first attribute, -1 when the node has none
    pub first_attribute_index: i32,
}

impl From<CompactNodeEntry> for NodeInfo {
    fn from(entry: CompactNodeEntry) -> Self {
        NodeInfo {
            name: entry.name,
            parent_index: entry.parent_index,
            next_sibling_index: -1,
            first_attribute_index: entry.first_attribute_index,
        }
    }
}

impl From<ExtendedNodeEntry> for NodeInfo {
    fn from(entry: ExtendedNodeEntry) -> Self {
        NodeInfo {
            name: entry.name,
            parent_index: entry.parent_index,
            next_sibling_index: entry.next_sibling_index,
            first_attribute_index: entry.first_attribute_index,
        }
    }
}

/// A decoded attribute descriptor
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AttributeInfo {
    /// Packed reference into the name dictionary
    pub name: u32,

    /// On-disk data type id
    pub type_id: u32,

    /// Length of the encoded value in bytes
    pub length: u32,

    /// Index of the next attribute of the same node, -1 for the last one
    pub next_attribute_index: i32,

    /// Position of the value inside the value segment
    pub data_offset: u64,
}

/// Read entries until the table runs out.
///
/// End-of-file is the only terminator, so a trailing partial entry is dropped. Any other error
/// is returned.
fn read_entries<T, R>(reader: &mut R) -> BinResult<Vec<T>>
where
    T: for<'a> BinRead<Args<'a> = ()> + binrw::meta::ReadEndian,
    R: Read + Seek,
{
    let mut entries = Vec::new();
    loop {
        match T::read(reader) {
            Ok(entry) => entries.push(entry),
            Err(e) if e.is_eof() => return Ok(entries),
            Err(e) => return Err(e),
        }
    }
}

/// Read the node table
#[instrument(skip(reader), err)]
pub fn read_nodes<R: Read + Seek>(reader: &mut R, extended: bool) -> Result<Vec<NodeInfo>> {
    let nodes: Vec<NodeInfo> = if extended {
        read_entries::<ExtendedNodeEntry, _>(reader)?
            .into_iter()
            .map(NodeInfo::from)
            .collect()
    } else {
        read_entries::<CompactNodeEntry, _>(reader)?
            .into_iter()
            .map(NodeInfo::from)
            .collect()
    };

    for (index, node) in nodes.iter().enumerate() {
        trace!(
            index,
            name = format_args!("{:#010x}", node.name),
            parent = node.parent_index,
            first_attribute = node.first_attribute_index,
            "read node"
        );
    }

    Ok(nodes)
}

/// Read the attribute table
#[instrument(skip(reader), err)]
pub fn read_attributes<R: Read + Seek>(
    reader: &mut R,
    extended: bool,
) -> Result<Vec<AttributeInfo>> {
    let attributes = if extended {
        read_entries::<ExtendedAttributeEntry, _>(reader)?
            .into_iter()
            .map(|entry| {
                let (type_id, length) = split_type_and_length(entry.type_and_length);
                AttributeInfo {
                    name: entry.name,
                    type_id,
                    length,
                    next_attribute_index: entry.next_attribute_index,
                    data_offset: entry.offset as u64,
                }
            })
            .collect()
    } else {
        link_compact_attributes(&read_entries::<CompactAttributeEntry, _>(reader)?)
    };

    for (index, attribute) in attributes.iter().enumerate() {
        trace!(
            index,
            name = format_args!("{:#010x}", attribute.name),
            type_id = attribute.type_id,
            length = attribute.length,
            next = attribute.next_attribute_index,
            offset = attribute.data_offset,
            "read attribute"
        );
    }

    Ok(attributes)
}

/// Rebuild the chain links and value offsets the compact layout leaves out.
///
/// Values are stored back to back in table order, so each offset is the sum of every earlier
/// length. Attributes of a node are chained in table order.
pub(crate) fn link_compact_attributes(entries: &[CompactAttributeEntry]) -> Vec<AttributeInfo> {
    let mut attributes = Vec::with_capacity(entries.len());
    let mut last_of_node: HashMap<i32, usize> = HashMap::new();
    let mut data_offset = 0u64;

    for (index, entry) in entries.iter().enumerate() {
        let (type_id, length) = split_type_and_length(entry.type_and_length);

        if let Some(previous) = last_of_node.insert(entry.node_index, index) {
            let previous: &mut AttributeInfo = &mut attributes[previous];
            previous.next_attribute_index = index as i32;
        }

        attributes.push(AttributeInfo {
            name: entry.name,
            type_id,
            length,
            next_attribute_index: -1,
            data_offset,
        });
        data_offset += length as u64;
    }

    attributes
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use pretty_assertions::assert_eq;

    use crate::error::Result;
    use crate::tables::{link_compact_attributes, read_attributes, read_nodes, AttributeInfo};
    use crate::types::CompactAttributeEntry;

    fn compact(node_index: i32, type_id: u32, length: u32) -> CompactAttributeEntry {
        CompactAttributeEntry {
            name: 0,
            type_and_length: (length << 6) | type_id,
            node_index,
        }
    }

    /// Indices visited by following the chain from `first`
    fn chain(attributes: &[AttributeInfo], first: i32) -> Vec<usize> {
        let mut visited = Vec::new();
        let mut next = first;
        while next != -1 {
            visited.push(next as usize);
            next = attributes[next as usize].next_attribute_index;
        }
        visited
    }

    #[test]
    fn compact_nodes_drop_trailing_partial_entry() -> Result<()> {
        #[rustfmt::skip]
        let mut input = Cursor::new(vec![
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF,
            0x01, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x00,
            0x02, 0x00, 0x00, 0x00, 0xFF, 0xFF,
        ]);

        let nodes = read_nodes(&mut input, false)?;
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].parent_index, -1);
        assert_eq!(nodes[0].first_attribute_index, 0);
        assert_eq!(nodes[1].name, 1);
        assert_eq!(nodes[1].parent_index, 0);
        assert_eq!(nodes[1].first_attribute_index, -1);
        assert_eq!(nodes[1].next_sibling_index, -1);

        Ok(())
    }

    #[test]
    fn extended_nodes() -> Result<()> {
        #[rustfmt::skip]
        let mut input = Cursor::new(vec![
            0x00, 0x00, 0x01, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x00,
            0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF,
        ]);

        let nodes = read_nodes(&mut input, true)?;
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].name, 0x0001_0000);
        assert_eq!(nodes[0].first_attribute_index, 0);
        assert_eq!(nodes[1].parent_index, 0);
        assert_eq!(nodes[1].next_sibling_index, 2);
        assert_eq!(nodes[1].first_attribute_index, -1);

        Ok(())
    }

    #[test]
    fn empty_table() -> Result<()> {
        assert!(read_nodes(&mut Cursor::new(Vec::new()), true)?.is_empty());
        assert!(read_attributes(&mut Cursor::new(Vec::new()), false)?.is_empty());
        Ok(())
    }

    #[test]
    fn compact_chains_follow_table_order() {
        let entries = [
            compact(0, 4, 4),
            compact(1, 20, 6),
            compact(0, 19, 1),
            compact(2, 6, 4),
            compact(1, 1, 1),
            compact(0, 5, 4),
        ];

        let attributes = link_compact_attributes(&entries);
        assert_eq!(chain(&attributes, 0), [0, 2, 5]);
        assert_eq!(chain(&attributes, 1), [1, 4]);
        assert_eq!(chain(&attributes, 3), [3]);

        for node in 0..3 {
            let expected: Vec<usize> = entries
                .iter()
                .enumerate()
                .filter(|(_, e)| e.node_index == node)
                .map(|(i, _)| i)
                .collect();
            assert_eq!(chain(&attributes, expected[0] as i32), expected);
        }
    }

    #[test]
    fn compact_offsets_are_prefix_sums() {
        let entries = [
            compact(0, 4, 4),
            compact(1, 20, 6),
            compact(0, 19, 1),
            compact(2, 6, 4),
            compact(1, 0, 0),
            compact(0, 5, 4),
        ];

        let offsets: Vec<u64> = link_compact_attributes(&entries)
            .iter()
            .map(|a| a.data_offset)
            .collect();
        assert_eq!(offsets, [0, 4, 10, 11, 15, 15]);
    }

    #[test]
    fn compact_attributes() -> Result<()> {
        #[rustfmt::skip]
        let mut input = Cursor::new(vec![
            0x00, 0x00, 0x00, 0x00, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x01, 0x00, 0x00, 0x00, 0x54, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x02, 0x00,
        ]);

        let attributes = read_attributes(&mut input, false)?;
        assert_eq!(
            attributes,
            [
                AttributeInfo {
                    name: 0,
                    type_id: 4,
                    length: 4,
                    next_attribute_index: 1,
                    data_offset: 0,
                },
                AttributeInfo {
                    name: 1,
                    type_id: 20,
                    length: 5,
                    next_attribute_index: -1,
                    data_offset: 4,
                },
            ]
        );

        Ok(())
    }

    #[test]
    fn extended_attributes() -> Result<()> {
        #[rustfmt::skip]
        let mut input = Cursor::new(vec![
            0x00, 0x00, 0x00, 0x00, 0x54, 0x01, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0x10, 0x00, 0x00, 0x00,
        ]);

        let attributes = read_attributes(&mut input, true)?;
        assert_eq!(attributes.len(), 1);
        assert_eq!(attributes[0].type_id, 20);
        assert_eq!(attributes[0].length, 5);
        assert_eq!(attributes[0].next_attribute_index, -1);
        assert_eq!(attributes[0].data_offset, 0x10);

        Ok(())
    }
}
