//! Schema descriptors.
//!
//! Every record and enum type lives in a [`Catalog`] and is addressed by a
//! [`SchemaId`] or [`EnumId`]. A record is a fixed, ordered list of
//! [`FieldDecl`]s. Descriptors are immutable once declared; only the
//! validator table attached to each record grows, through
//! [`Catalog::register`].
//!
//! Type expressions can only reference ids that already exist, so a record
//! type cannot contain itself.

use ahash::AHashMap;
use treeform_document::{FieldName, FieldNameError, Value, ValueKind};

use crate::config::Config;
use crate::parse::{self, ParseError};
use crate::registry::ValidatorTable;
use crate::tree::Tree;
use crate::value::Scalar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SchemaId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnumId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Bool,
    Integer,
    Float,
    Text,
}

impl ScalarType {
    pub fn value_kind(&self) -> ValueKind {
        match self {
            ScalarType::Bool => ValueKind::Bool,
            ScalarType::Integer => ValueKind::Integer,
            ScalarType::Float => ValueKind::Float,
            ScalarType::Text => ValueKind::Text,
        }
    }
}

impl core::fmt::Display for ScalarType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.value_kind())
    }
}

/// Declared type of a field.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    /// Always parses to an absent value.
    Absent,
    Scalar(ScalarType),
    Enum(EnumId),
    Record(SchemaId),
    /// Alternatives tried in declaration order; the first one producing a
    /// present value wins.
    Variant(Vec<TypeExpr>),
    Sequence(Box<TypeExpr>),
}

impl TypeExpr {
    pub const BOOL: TypeExpr = TypeExpr::Scalar(ScalarType::Bool);
    pub const INTEGER: TypeExpr = TypeExpr::Scalar(ScalarType::Integer);
    pub const FLOAT: TypeExpr = TypeExpr::Scalar(ScalarType::Float);
    pub const TEXT: TypeExpr = TypeExpr::Scalar(ScalarType::Text);

    /// `inner` or absent.
    pub fn optional(inner: TypeExpr) -> Self {
        TypeExpr::Variant(vec![inner, TypeExpr::Absent])
    }

    pub fn sequence(element: TypeExpr) -> Self {
        TypeExpr::Sequence(Box::new(element))
    }

    pub fn variant(alternatives: impl IntoIterator<Item = TypeExpr>) -> Self {
        TypeExpr::Variant(alternatives.into_iter().collect())
    }

    pub fn record(id: SchemaId) -> Self {
        TypeExpr::Record(id)
    }

    pub fn enumeration(id: EnumId) -> Self {
        TypeExpr::Enum(id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: FieldName,
    pub ty: TypeExpr,
}

impl FieldDecl {
    pub fn name(&self) -> &str {
        self.name.as_str()
    }
}

#[derive(Debug, Clone)]
pub struct RecordSchema {
    name: String,
    fields: Vec<FieldDecl>,
    pub(crate) validators: ValidatorTable,
}

impl RecordSchema {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDecl] {
        &self.fields
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name() == name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.field_index(name).map(|i| &self.fields[i])
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field_index(name).is_some()
    }

    pub fn validators(&self) -> &ValidatorTable {
        &self.validators
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumMember {
    pub label: String,
    pub value: Scalar,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    name: String,
    members: Vec<EnumMember>,
}

impl EnumType {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &[EnumMember] {
        &self.members
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("record `{0}` is already declared")]
    DuplicateRecord(String),

    #[error("enum `{0}` is already declared")]
    DuplicateEnum(String),

    #[error("invalid field name `{field}` on `{record}`: {source}")]
    InvalidFieldName {
        record: String,
        field: String,
        #[source]
        source: FieldNameError,
    },

    #[error("field `{field}` is declared twice on `{record}`")]
    DuplicateField { record: String, field: String },

    #[error("field `{field}` on `{record}` references undeclared record #{id}")]
    UnknownRecord {
        record: String,
        field: String,
        id: usize,
    },

    #[error("field `{field}` on `{record}` references undeclared enum #{id}")]
    UnknownEnum {
        record: String,
        field: String,
        id: usize,
    },

    #[error("field `{field}` on `{record}` has a variant without alternatives")]
    EmptyVariant { record: String, field: String },

    #[error("enum `{0}` has no members")]
    EmptyEnum(String),

    #[error("enum `{name}` declares `{member}` twice")]
    DuplicateEnumMember { name: String, member: String },
}

/// Owner of every declared record and enum type together with their
/// validator tables.
///
/// Declare types and register validators during start-up, then share the
/// catalog immutably; loading and validation only read it.
#[derive(Debug, Default)]
pub struct Catalog {
    records: Vec<RecordSchema>,
    enums: Vec<EnumType>,
    record_names: AHashMap<String, SchemaId>,
    enum_names: AHashMap<String, EnumId>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a record type with its fields in order.
    pub fn declare_record<'a>(
        &mut self,
        name: impl Into<String>,
        fields: impl IntoIterator<Item = (&'a str, TypeExpr)>,
    ) -> Result<SchemaId, SchemaError> {
        let name = name.into();
        if self.record_names.contains_key(&name) {
            return Err(SchemaError::DuplicateRecord(name));
        }

        let mut decls: Vec<FieldDecl> = Vec::new();
        for (field, ty) in fields {
            let field_name: FieldName =
                field
                    .parse()
                    .map_err(|source| SchemaError::InvalidFieldName {
                        record: name.clone(),
                        field: field.to_string(),
                        source,
                    })?;
            if decls.iter().any(|d| d.name == field_name) {
                return Err(SchemaError::DuplicateField {
                    record: name,
                    field: field.to_string(),
                });
            }
            self.check_type(&name, field, &ty)?;
            decls.push(FieldDecl {
                name: field_name,
                ty,
            });
        }

        let id = SchemaId(self.records.len());
        self.records.push(RecordSchema {
            name: name.clone(),
            validators: ValidatorTable::with_fields(decls.len()),
            fields: decls,
        });
        self.record_names.insert(name, id);
        Ok(id)
    }

    /// Declare an enumerated type from `(label, underlying value)` pairs.
    pub fn declare_enum<'a, S: Into<Scalar>>(
        &mut self,
        name: impl Into<String>,
        members: impl IntoIterator<Item = (&'a str, S)>,
    ) -> Result<EnumId, SchemaError> {
        let name = name.into();
        if self.enum_names.contains_key(&name) {
            return Err(SchemaError::DuplicateEnum(name));
        }
        let mut declared: Vec<EnumMember> = Vec::new();
        for (label, value) in members {
            let value = value.into();
            if declared
                .iter()
                .any(|m| m.label == label || m.value == value)
            {
                return Err(SchemaError::DuplicateEnumMember {
                    name,
                    member: label.to_string(),
                });
            }
            declared.push(EnumMember {
                label: label.to_string(),
                value,
            });
        }
        if declared.is_empty() {
            return Err(SchemaError::EmptyEnum(name));
        }

        let id = EnumId(self.enums.len());
        self.enums.push(EnumType {
            name: name.clone(),
            members: declared,
        });
        self.enum_names.insert(name, id);
        Ok(id)
    }

    fn check_type(&self, record: &str, field: &str, ty: &TypeExpr) -> Result<(), SchemaError> {
        match ty {
            TypeExpr::Absent | TypeExpr::Scalar(_) => Ok(()),
            TypeExpr::Enum(id) if id.0 >= self.enums.len() => Err(SchemaError::UnknownEnum {
                record: record.to_string(),
                field: field.to_string(),
                id: id.0,
            }),
            TypeExpr::Enum(_) => Ok(()),
            TypeExpr::Record(id) if id.0 >= self.records.len() => {
                Err(SchemaError::UnknownRecord {
                    record: record.to_string(),
                    field: field.to_string(),
                    id: id.0,
                })
            }
            TypeExpr::Record(_) => Ok(()),
            TypeExpr::Variant(alternatives) if alternatives.is_empty() => {
                Err(SchemaError::EmptyVariant {
                    record: record.to_string(),
                    field: field.to_string(),
                })
            }
            TypeExpr::Variant(alternatives) => alternatives
                .iter()
                .try_for_each(|alt| self.check_type(record, field, alt)),
            TypeExpr::Sequence(element) => self.check_type(record, field, element),
        }
    }

    /// Get a record descriptor. Panics on an id from another catalog.
    pub fn record(&self, id: SchemaId) -> &RecordSchema {
        &self.records[id.0]
    }

    pub fn get_record(&self, id: SchemaId) -> Option<&RecordSchema> {
        self.records.get(id.0)
    }

    pub(crate) fn record_mut(&mut self, id: SchemaId) -> Option<&mut RecordSchema> {
        self.records.get_mut(id.0)
    }

    /// Get an enum descriptor. Panics on an id from another catalog.
    pub fn enum_type(&self, id: EnumId) -> &EnumType {
        &self.enums[id.0]
    }

    pub fn lookup(&self, name: &str) -> Option<SchemaId> {
        self.record_names.get(name).copied()
    }

    pub fn lookup_enum(&self, name: &str) -> Option<EnumId> {
        self.enum_names.get(name).copied()
    }

    pub fn records(&self) -> impl Iterator<Item = (SchemaId, &RecordSchema)> {
        self.records
            .iter()
            .enumerate()
            .map(|(i, record)| (SchemaId(i), record))
    }

    /// Human-readable name of a type expression, used in diagnostics.
    pub fn type_name(&self, ty: &TypeExpr) -> String {
        match ty {
            TypeExpr::Absent => "none".to_string(),
            TypeExpr::Scalar(scalar) => scalar.to_string(),
            TypeExpr::Enum(id) => self.enum_type(*id).name().to_string(),
            TypeExpr::Record(id) => self.record(*id).name().to_string(),
            TypeExpr::Variant(alternatives) => match alternatives.as_slice() {
                [inner, TypeExpr::Absent] => format!("optional<{}>", self.type_name(inner)),
                _ => {
                    let names: Vec<String> =
                        alternatives.iter().map(|alt| self.type_name(alt)).collect();
                    format!("variant<{}>", names.join(" | "))
                }
            },
            TypeExpr::Sequence(element) => format!("sequence<{}>", self.type_name(element)),
        }
    }

    /// Parse `raw` as a `schema` record. See [`parse::load`].
    pub fn load<'c>(
        &'c self,
        schema: SchemaId,
        raw: &Value,
        config: &Config,
    ) -> Result<Tree<'c>, ParseError> {
        parse::load(self, schema, raw, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declare_and_lookup() {
        let mut catalog = Catalog::new();
        let attrs = catalog
            .declare_record("ServiceAttributes", [("token", TypeExpr::optional(TypeExpr::TEXT))])
            .unwrap();
        let inputs = catalog
            .declare_record(
                "Inputs",
                [
                    ("name", TypeExpr::TEXT),
                    ("attributes", TypeExpr::optional(TypeExpr::record(attrs))),
                ],
            )
            .unwrap();
        assert_eq!(catalog.lookup("Inputs"), Some(inputs));
        assert_eq!(catalog.lookup("Missing"), None);
        assert!(catalog.get_record(inputs).is_some());
        assert!(catalog.get_record(SchemaId(5)).is_none());
        let record = catalog.record(inputs);
        assert_eq!(record.name(), "Inputs");
        assert_eq!(record.field_index("attributes"), Some(1));
        assert!(!record.has_field("token"));
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let mut catalog = Catalog::new();
        assert_eq!(
            catalog.declare_record("A", [("x", TypeExpr::TEXT), ("x", TypeExpr::INTEGER)]),
            Err(SchemaError::DuplicateField {
                record: "A".to_string(),
                field: "x".to_string(),
            })
        );
        assert_eq!(catalog.lookup("A"), None);
    }

    #[test]
    fn test_invalid_field_name_rejected() {
        let mut catalog = Catalog::new();
        let err = catalog.declare_record("A", [("0", TypeExpr::TEXT)]).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidFieldName { field, .. } if field == "0"));
    }

    #[test]
    fn test_dangling_reference_rejected() {
        let mut catalog = Catalog::new();
        assert_eq!(
            catalog.declare_record("A", [("b", TypeExpr::sequence(TypeExpr::record(SchemaId(7))))]),
            Err(SchemaError::UnknownRecord {
                record: "A".to_string(),
                field: "b".to_string(),
                id: 7,
            })
        );
    }

    #[test]
    fn test_empty_variant_rejected() {
        let mut catalog = Catalog::new();
        assert_eq!(
            catalog.declare_record("A", [("b", TypeExpr::variant([]))]),
            Err(SchemaError::EmptyVariant {
                record: "A".to_string(),
                field: "b".to_string(),
            })
        );
    }

    #[test]
    fn test_enum_members_must_be_distinct() {
        let mut catalog = Catalog::new();
        assert_eq!(
            catalog.declare_enum("Status", [("Up", "up"), ("Down", "up")]),
            Err(SchemaError::DuplicateEnumMember {
                name: "Status".to_string(),
                member: "Down".to_string(),
            })
        );
        let no_members: [(&str, &str); 0] = [];
        assert_eq!(
            catalog.declare_enum("Empty", no_members),
            Err(SchemaError::EmptyEnum("Empty".to_string()))
        );
    }

    #[test]
    fn test_type_name() {
        let mut catalog = Catalog::new();
        let status = catalog.declare_enum("Status", [("Up", 1), ("Down", 0)]).unwrap();
        let port = catalog.declare_record("Port", [("number", TypeExpr::INTEGER)]).unwrap();
        assert_eq!(catalog.lookup_enum("Status"), Some(status));
        assert_eq!(catalog.lookup_enum("Port"), None);
        assert_eq!(
            catalog.type_name(&TypeExpr::optional(TypeExpr::TEXT)),
            "optional<text>"
        );
        assert_eq!(
            catalog.type_name(&TypeExpr::sequence(TypeExpr::record(port))),
            "sequence<Port>"
        );
        assert_eq!(
            catalog.type_name(&TypeExpr::variant([
                TypeExpr::INTEGER,
                TypeExpr::enumeration(status)
            ])),
            "variant<integer | Status>"
        );
    }
}
