#![doc = include_str!("../README.md")]

/// Engine configuration.
pub mod config;

/// Dotted attribute paths and their resolution errors.
pub mod path;

/// Record and enum descriptors owned by a [`Catalog`].
pub mod schema;

/// Typed field values held by nodes.
pub mod value;

/// The arena-owned node tree produced by loading.
pub mod tree;

/// Type-directed parsing from untyped documents.
pub mod parse;

/// Conversion from node trees back to untyped documents.
pub mod dump;

/// Per-record validator registration.
pub mod registry;

/// Two-tier validation traversal.
pub mod validate;

/// Ready-made validators for common field rules.
pub mod validators;

pub use config::{AbsentFields, Coercion, Config, UnknownFields};
pub use parse::{ParseError, ParseErrorKind, load};
pub use path::{AttrPath, PathError, PathSegment};
pub use registry::{FieldError, RegistryError, Tier, Validator, ValidatorFn, ValidatorResult};
pub use schema::{Catalog, EnumId, FieldDecl, RecordSchema, ScalarType, SchemaError, SchemaId, TypeExpr};
pub use tree::{Lookup, NodeId, NodeRef, Resolved, Tree};
pub use validate::{ErrorReport, FieldContext, InternalFailure, Validation};
pub use value::{EnumValue, FieldValue, Scalar};
