#![doc = include_str!("../README.md")]

/// Untyped document values.
pub mod value;

/// Field name grammar shared by schemas and attribute paths.
pub mod identifier;

mod doc_macro;

pub use identifier::{FieldName, FieldNameError};
pub use value::{Map, Value, ValueKind};
