//! Dotted-path lookup over a loaded tree.
//!
//! Paths are relative to the node the lookup starts from:
//!
//! ```text
//! Trunk { branch: Branch { leaf: Leaf { x }, leaves: [Leaf { x }] } }
//!
//! branch.leaf.x       x of the single leaf
//! branch.leaves.3.x   x of the fourth element of leaves
//! branch.leaves.*.x   x of every element of leaves
//! ```

use crate::path::{AttrPath, PathError, PathSegment};
use crate::value::FieldValue;

use super::{NodeRef, Tree};

/// Where a field name is looked up when the current node does not declare it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Lookup {
    /// Only on the current node.
    #[default]
    Exact,
    /// On the current node, then on each ancestor in turn.
    Ancestors,
}

/// Result of a path lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved<'t> {
    Node(NodeRef<'t>),
    Value(&'t FieldValue),
    /// The path ran through an absent field.
    Absent,
    /// One result per sequence element, for each wildcard segment.
    Many(Vec<Resolved<'t>>),
}

impl<'t> Resolved<'t> {
    fn from_value(tree: &'t Tree<'t>, value: &'t FieldValue) -> Self {
        match value {
            FieldValue::Absent => Resolved::Absent,
            FieldValue::Node(id) => Resolved::Node(tree.node(*id)),
            value => Resolved::Value(value),
        }
    }

    pub fn as_node(&self) -> Option<NodeRef<'t>> {
        match self {
            Resolved::Node(node) => Some(*node),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<&'t FieldValue> {
        match self {
            Resolved::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Resolved::Absent)
    }

    /// Flatten nested wildcard results into a single list, in order.
    pub fn flatten(self) -> Vec<Resolved<'t>> {
        match self {
            Resolved::Many(items) => items.into_iter().flat_map(Resolved::flatten).collect(),
            other => vec![other],
        }
    }
}

impl<'c> Tree<'c> {
    /// Resolve a path relative to the root node.
    pub fn resolve(&self, path: &str, lookup: Lookup) -> Result<Resolved<'_>, PathError> {
        self.root().resolve(path, lookup)
    }
}

impl<'t> NodeRef<'t> {
    /// Resolve a dotted path relative to this node.
    ///
    /// With [`Lookup::Ancestors`], a field name this node does not declare
    /// is looked up on the nearest ancestor that declares it.
    pub fn resolve(&self, path: &str, lookup: Lookup) -> Result<Resolved<'t>, PathError> {
        let path: AttrPath = path.parse()?;
        self.resolve_path(&path, lookup)
    }

    pub fn resolve_path(&self, path: &AttrPath, lookup: Lookup) -> Result<Resolved<'t>, PathError> {
        let tree = self.tree();
        resolve_segments(tree, Resolved::Node(*self), self.path().clone(), path.segments(), lookup)
    }
}

fn resolve_segments<'t>(
    tree: &'t Tree<'t>,
    current: Resolved<'t>,
    at: AttrPath,
    segments: &[PathSegment],
    lookup: Lookup,
) -> Result<Resolved<'t>, PathError> {
    let Some((segment, rest)) = segments.split_first() else {
        return Ok(current);
    };

    match current {
        Resolved::Absent => Ok(Resolved::Absent),
        Resolved::Many(items) => items
            .into_iter()
            .map(|item| resolve_segments(tree, item, at.clone(), segments, lookup))
            .collect::<Result<Vec<_>, _>>()
            .map(Resolved::Many),
        Resolved::Node(node) => {
            let PathSegment::Field(name) = segment else {
                return Err(PathError::NotASequence {
                    at,
                    segment: segment.clone(),
                });
            };
            let (owner, value) =
                lookup_field(node, name, lookup).ok_or_else(|| PathError::UnknownField {
                    at: at.clone(),
                    field: name.clone(),
                })?;
            let next_at = owner.path().child(name.as_str());
            resolve_segments(tree, Resolved::from_value(tree, value), next_at, rest, lookup)
        }
        Resolved::Value(FieldValue::Sequence(items)) => match segment {
            PathSegment::Wildcard => items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    resolve_segments(tree, Resolved::from_value(tree, item), at.index(i), rest, lookup)
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Resolved::Many),
            PathSegment::Index(index) => {
                let item = items.get(*index).ok_or_else(|| PathError::IndexOutOfRange {
                    at: at.clone(),
                    index: *index,
                    len: items.len(),
                })?;
                resolve_segments(
                    tree,
                    Resolved::from_value(tree, item),
                    at.index(*index),
                    rest,
                    lookup,
                )
            }
            PathSegment::Field(_) => Err(PathError::NotARecord {
                at,
                segment: segment.clone(),
            }),
        },
        Resolved::Value(_) => Err(PathError::NotARecord {
            at,
            segment: segment.clone(),
        }),
    }
}

/// Find the node declaring `name`: `node` itself, or with
/// [`Lookup::Ancestors`] the nearest ancestor.
fn lookup_field<'t>(
    node: NodeRef<'t>,
    name: &str,
    lookup: Lookup,
) -> Option<(NodeRef<'t>, &'t FieldValue)> {
    if let Some(value) = node.field(name) {
        return Some((node, value));
    }
    match lookup {
        Lookup::Exact => None,
        Lookup::Ancestors => node
            .ancestors()
            .find_map(|ancestor| ancestor.field(name).map(|value| (ancestor, value))),
    }
}
