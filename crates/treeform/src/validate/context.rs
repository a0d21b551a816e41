use std::any::Any;

use crate::path::{AttrPath, PathError};
use crate::schema::{Catalog, FieldDecl};
use crate::tree::{Lookup, NodeRef, Resolved};
use crate::value::FieldValue;

/// What a validator knows about the field it is checking.
///
/// Every validator receives the same context; it reads what it needs and
/// ignores the rest.
#[derive(Debug, Clone)]
pub struct FieldContext<'t> {
    node: NodeRef<'t>,
    field: &'t FieldDecl,
    field_path: AttrPath,
    extra: Option<&'t dyn Any>,
}

impl<'t> FieldContext<'t> {
    pub(crate) fn new(
        node: NodeRef<'t>,
        field: &'t FieldDecl,
        extra: Option<&'t dyn Any>,
    ) -> Self {
        Self {
            node,
            field,
            field_path: node.path().child(field.name()),
            extra,
        }
    }

    /// The node declaring the field.
    pub fn node(&self) -> NodeRef<'t> {
        self.node
    }

    /// Path of the node declaring the field, e.g. `root.services.0`.
    pub fn node_path(&self) -> &'t AttrPath {
        self.node.path()
    }

    pub fn field(&self) -> &'t FieldDecl {
        self.field
    }

    pub fn field_name(&self) -> &'t str {
        self.field.name()
    }

    /// Path of the field itself, e.g. `root.services.0.name`. Errors returned
    /// by the validator are reported under this path.
    pub fn field_path(&self) -> &AttrPath {
        &self.field_path
    }

    /// The node holding [`node`](Self::node), if any.
    pub fn parent(&self) -> Option<NodeRef<'t>> {
        self.node.parent()
    }

    /// The top-level node of the tree.
    pub fn root(&self) -> NodeRef<'t> {
        self.node.root()
    }

    /// Another field of the same node.
    pub fn sibling(&self, name: &str) -> Option<&'t FieldValue> {
        self.node.field(name)
    }

    /// Resolve a dotted path relative to the node declaring the field.
    pub fn resolve(&self, path: &str, lookup: Lookup) -> Result<Resolved<'t>, PathError> {
        self.node.resolve(path, lookup)
    }

    /// Caller data passed to [`Tree::validate_with`], if it is a `T`.
    ///
    /// [`Tree::validate_with`]: crate::Tree::validate_with
    pub fn extra<T: Any>(&self) -> Option<&'t T> {
        self.extra?.downcast_ref()
    }

    pub fn catalog(&self) -> &'t Catalog {
        self.node.tree().catalog()
    }
}
