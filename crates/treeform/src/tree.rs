mod resolve;

pub use resolve::{Lookup, Resolved};

use std::collections::VecDeque;

use crate::path::AttrPath;
use crate::schema::{Catalog, FieldDecl, RecordSchema, SchemaId};
use crate::value::FieldValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// One instantiated record.
///
/// `fields` holds one value per declared field, in declaration order.
/// `parent` is a plain handle back to the node holding this one; ownership
/// runs the other way, through the parent's field values.
#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) schema: SchemaId,
    pub(crate) path: AttrPath,
    pub(crate) parent: Option<NodeId>,
    pub(crate) fields: Vec<FieldValue>,
}

/// A loaded node tree.
///
/// All nodes live in one arena owned by the tree. The tree is only built by
/// [`load`](crate::parse::load) and is immutable afterwards.
#[derive(Debug, Clone)]
pub struct Tree<'c> {
    catalog: &'c Catalog,
    nodes: Vec<Node>,
    root: NodeId,
}

impl<'c> Tree<'c> {
    pub(crate) fn from_parts(catalog: &'c Catalog, nodes: Vec<Node>, root: NodeId) -> Self {
        Self {
            catalog,
            nodes,
            root,
        }
    }

    pub fn catalog(&self) -> &'c Catalog {
        self.catalog
    }

    pub fn root(&self) -> NodeRef<'_> {
        self.node(self.root)
    }

    /// Get a node by id. Panics on an id from another tree.
    pub fn node(&self, id: NodeId) -> NodeRef<'_> {
        assert!(id.0 < self.nodes.len(), "node {id:?} is not in this tree");
        NodeRef { tree: self, id }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Visit every node once, breadth first from the root. Children are
    /// discovered in field declaration order, sequence elements in index
    /// order.
    pub fn breadth_first(&self) -> BreadthFirst<'_> {
        BreadthFirst {
            tree: self,
            queue: VecDeque::from([self.root]),
        }
    }

    pub(crate) fn raw(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn nodes_equal(&self, id1: NodeId, other: &Tree<'_>, id2: NodeId) -> bool {
        let node1 = self.raw(id1);
        let node2 = other.raw(id2);
        node1.schema == node2.schema
            && node1.path == node2.path
            && node1.fields.len() == node2.fields.len()
            && node1
                .fields
                .iter()
                .zip(&node2.fields)
                .all(|(v1, v2)| self.values_equal(v1, other, v2))
    }

    fn values_equal(&self, value1: &FieldValue, other: &Tree<'_>, value2: &FieldValue) -> bool {
        match (value1, value2) {
            (FieldValue::Node(id1), FieldValue::Node(id2)) => self.nodes_equal(*id1, other, *id2),
            (FieldValue::Sequence(items1), FieldValue::Sequence(items2)) => {
                items1.len() == items2.len()
                    && items1
                        .iter()
                        .zip(items2)
                        .all(|(v1, v2)| self.values_equal(v1, other, v2))
            }
            (FieldValue::Node(_), _) | (_, FieldValue::Node(_)) => false,
            (FieldValue::Sequence(_), _) | (_, FieldValue::Sequence(_)) => false,
            (v1, v2) => v1 == v2,
        }
    }
}

impl PartialEq for Tree<'_> {
    /// Structural equality: same schemas, paths and values, regardless of
    /// where nodes sit in the arena.
    fn eq(&self, other: &Self) -> bool {
        self.nodes_equal(self.root, other, other.root)
    }
}

/// Borrowed view of one node in a [`Tree`].
#[derive(Clone, Copy)]
pub struct NodeRef<'t> {
    tree: &'t Tree<'t>,
    id: NodeId,
}

impl<'t> NodeRef<'t> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tree(&self) -> &'t Tree<'t> {
        self.tree
    }

    fn raw(&self) -> &'t Node {
        self.tree.raw(self.id)
    }

    pub fn schema_id(&self) -> SchemaId {
        self.raw().schema
    }

    pub fn schema(&self) -> &'t RecordSchema {
        self.tree.catalog.record(self.raw().schema)
    }

    /// Attribute path of this node, e.g. `root.services.0`.
    pub fn path(&self) -> &'t AttrPath {
        &self.raw().path
    }

    pub fn parent(&self) -> Option<NodeRef<'t>> {
        self.raw().parent.map(|id| self.tree.node(id))
    }

    /// Top-level node, found by following parent handles.
    pub fn root(&self) -> NodeRef<'t> {
        let mut current = *self;
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current
    }

    /// This node's parent, its parent, and so on up to the root.
    pub fn ancestors(self) -> impl Iterator<Item = NodeRef<'t>> + 't {
        let tree = self.tree;
        core::iter::successors(self.raw().parent, move |id| tree.raw(*id).parent)
            .map(move |id| tree.node(id))
    }

    pub fn field(&self, name: &str) -> Option<&'t FieldValue> {
        let index = self.schema().field_index(name)?;
        Some(&self.raw().fields[index])
    }

    pub(crate) fn value_at(&self, index: usize) -> &'t FieldValue {
        &self.raw().fields[index]
    }

    /// Declared fields paired with their values, in declaration order.
    pub fn fields(self) -> impl Iterator<Item = (&'t FieldDecl, &'t FieldValue)> + 't {
        self.schema().fields().iter().zip(self.raw().fields.iter())
    }

    /// Nodes held by this node's fields, in discovery order.
    pub fn children(&self) -> Vec<NodeRef<'t>> {
        let mut ids = Vec::new();
        for value in &self.raw().fields {
            value.collect_nodes(&mut ids);
        }
        ids.into_iter().map(|id| self.tree.node(id)).collect()
    }

    /// Follow a field value to the node it holds.
    pub fn follow(&self, value: &FieldValue) -> Option<NodeRef<'t>> {
        value.as_node().map(|id| self.tree.node(id))
    }
}

impl core::fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("schema", &self.schema().name())
            .field("path", &format_args!("{}", self.path()))
            .finish()
    }
}

impl PartialEq for NodeRef<'_> {
    /// Identity: the same node of the same tree.
    fn eq(&self, other: &Self) -> bool {
        core::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for NodeRef<'_> {}

pub struct BreadthFirst<'t> {
    tree: &'t Tree<'t>,
    queue: VecDeque<NodeId>,
}

impl<'t> Iterator for BreadthFirst<'t> {
    type Item = NodeRef<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.queue.pop_front()?;
        let node = self.tree.node(id);
        for value in &self.tree.raw(id).fields {
            let mut ids = Vec::new();
            value.collect_nodes(&mut ids);
            self.queue.extend(ids);
        }
        Some(node)
    }
}
