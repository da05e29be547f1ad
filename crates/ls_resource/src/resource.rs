//! The decoded node tree.

use std::sync::Arc;

use derive_more::{Display, From, Into};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::types::DataType;
use crate::value::AttributeValue;

/// Engine version the resource was written with
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Metadata {
    pub major: u32,
    pub minor: u32,
    pub revision: u32,
    pub build: u32,
}

impl Metadata {
    /// Split a packed engine version into its components
    ///
    /// | Bits   | Component |
    /// |--------|-----------|
    /// | 28..32 | major     |
    /// | 24..28 | minor     |
    /// | 16..24 | revision  |
    /// | 0..16  | build     |
    pub const fn from_engine_version(version: u32) -> Metadata {
        Metadata {
            major: (version & 0xF000_0000) >> 28,
            minor: (version & 0x0F00_0000) >> 24,
            revision: (version & 0x00FF_0000) >> 16,
            build: version & 0x0000_FFFF,
        }
    }
}

/// Index of a node inside its [`Resource`]
#[derive(Debug, Display, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, From, Into)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeId(usize);

impl NodeId {
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A single typed, named value on a node
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeAttribute {
    pub name: Arc<str>,
    pub data_type: DataType,
    pub value: AttributeValue,
}

impl NodeAttribute {
    pub fn new(name: Arc<str>, data_type: DataType, value: AttributeValue) -> Self {
        NodeAttribute {
            name,
            data_type,
            value,
        }
    }
}

/// A named tree element
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Node {
    pub name: Arc<str>,
    /// Attributes in chain order
    pub attributes: Vec<NodeAttribute>,
    /// Children in decode order
    pub children: Vec<NodeId>,
    /// Back-reference to the parent, `None` for regions
    pub parent: Option<NodeId>,
    /// Set only on root nodes
    pub region_name: Option<Arc<str>>,
}

impl Node {
    pub fn new(name: Arc<str>) -> Self {
        Node {
            name,
            attributes: Vec::new(),
            children: Vec::new(),
            parent: None,
            region_name: None,
        }
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Whether this node is a root region
    pub fn is_region(&self) -> bool {
        self.parent.is_none()
    }

    /// Find the first attribute with the given name
    pub fn attribute(&self, name: &str) -> Option<&NodeAttribute> {
        self.attributes.iter().find(|a| &*a.name == name)
    }
}

/// A decoded resource: metadata plus a forest of regions
///
/// Nodes live in a flat arena indexed by [`NodeId`]; parent and child links are ids into it.
///
/// ```
/// use ls_resource::{Metadata, Node, Resource};
///
/// let mut resource = Resource::new(Metadata::default());
/// let root = resource.push_node(Node::new("Config".into()), None);
/// resource.push_node(Node::new("Entry".into()), Some(root));
///
/// let region = resource.region("Config").unwrap();
/// assert_eq!(region.child_count(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Resource {
    pub metadata: Metadata,
    nodes: Vec<Node>,
    regions: Vec<NodeId>,
}

impl Resource {
    pub fn new(metadata: Metadata) -> Self {
        Resource {
            metadata,
            ..Default::default()
        }
    }

    /// Append a node, linking it under `parent` or registering it as a region.
    ///
    /// The caller guarantees `parent` was returned by an earlier call.
    pub fn push_node(&mut self, mut node: Node, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        node.parent = parent;
        match parent.and_then(|p| self.nodes.get_mut(p.0)) {
            Some(p) => {
                node.region_name = None;
                p.children.push(id);
            }
            None => {
                node.parent = None;
                node.region_name = Some(node.name.clone());
                self.regions.push(id);
            }
        }
        self.nodes.push(node);
        id
    }

    /// Look up a node by id
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Ids of the root regions in decode order
    pub fn region_ids(&self) -> &[NodeId] {
        &self.regions
    }

    /// Root regions in decode order
    pub fn regions(&self) -> impl Iterator<Item = &Node> + '_ {
        self.regions.iter().filter_map(|id| self.node(*id))
    }

    /// Find a root region by name
    pub fn region(&self, name: &str) -> Option<&Node> {
        self.regions().find(|n| &*n.name == name)
    }

    /// Children of `node` in decode order
    pub fn children<'a>(&'a self, node: &'a Node) -> impl Iterator<Item = &'a Node> + 'a {
        node.children.iter().filter_map(|id| self.node(*id))
    }

    /// Parent of `node`, if it is not a region
    pub fn parent(&self, node: &Node) -> Option<&Node> {
        node.parent.and_then(|id| self.node(id))
    }

    /// Total number of nodes across every region
    pub fn total_node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Every node in decode order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }
}
