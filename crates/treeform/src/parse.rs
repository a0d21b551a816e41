//! Type-directed parsing.
//!
//! [`load`] walks a record's declared fields in order, parses each raw value
//! against its declared [`TypeExpr`] and builds the node in one step once
//! every field is ready. Children are therefore built before their parent;
//! their parent handles are filled in right after the parent is pushed.

use num_bigint::BigInt;
use num_traits::{FromPrimitive, ToPrimitive};
use treeform_document::{Value, ValueKind};

use crate::config::{Coercion, Config, UnknownFields};
use crate::path::AttrPath;
use crate::schema::{Catalog, EnumId, ScalarType, SchemaId, TypeExpr};
use crate::tree::{Node, NodeId, Tree};
use crate::value::{EnumValue, FieldValue, Scalar};

// ============================================================================
// Errors
// ============================================================================

/// A raw value could not be parsed as its declared type.
///
/// Errors raised below a record are wrapped once per enclosing record or
/// sequence, so the outermost error names the top-level path and
/// [`ParseError::innermost`] names the value that actually failed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("failed to parse {path} as {expected}: {kind}")]
pub struct ParseError {
    pub path: AttrPath,
    /// Name of the declared type.
    pub expected: String,
    /// The offending raw value.
    pub raw: Option<Value>,
    pub kind: ParseErrorKind,
}

impl ParseError {
    /// The error at the bottom of the [`ParseErrorKind::Nested`] chain.
    pub fn innermost(&self) -> &ParseError {
        let mut current = self;
        while let ParseErrorKind::Nested(inner) = &current.kind {
            current = inner;
        }
        current
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseErrorKind {
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: ValueKind,
        actual: ValueKind,
    },

    #[error("invalid {expected} text: {text:?}")]
    InvalidText { expected: ScalarType, text: String },

    #[error("value out of range: {0}")]
    OutOfRange(String),

    #[error("unknown value for enum {enum_name}: {value}")]
    UnknownEnumValue { enum_name: String, value: String },

    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("record #{0} is not declared in this catalog")]
    UnknownSchema(usize),

    /// Every alternative either failed or produced nothing, and at least one
    /// failed.
    #[error("no variant matched ({} alternatives failed)", .attempts.len())]
    NoMatchingVariant { attempts: Vec<ParseError> },

    #[error("{0}")]
    Nested(Box<ParseError>),
}

// ============================================================================
// Loading
// ============================================================================

/// Parse `raw` as a `schema` record into a new tree rooted at
/// [`Config::root_name`].
///
/// Declared fields missing from `raw`, or set to null, are absent. Keys that
/// are not declared fields are ignored unless [`UnknownFields::Deny`] is set.
pub fn load<'c>(
    catalog: &'c Catalog,
    schema: SchemaId,
    raw: &Value,
    config: &Config,
) -> Result<Tree<'c>, ParseError> {
    let root_path = AttrPath::root(config.root_name.as_str());
    if catalog.get_record(schema).is_none() {
        return Err(ParseError {
            path: root_path,
            expected: format!("record #{}", schema.0),
            raw: Some(raw.clone()),
            kind: ParseErrorKind::UnknownSchema(schema.0),
        });
    }
    let mut loader = Loader {
        catalog,
        config,
        nodes: Vec::new(),
    };
    let root = loader
        .load_record(schema, raw, root_path)
        .inspect_err(|err| tracing::debug!(path = %err.innermost().path, "load failed: {err}"))?;
    tracing::debug!(nodes = loader.nodes.len(), "loaded tree");
    Ok(Tree::from_parts(catalog, loader.nodes, root))
}

struct Loader<'c, 'a> {
    catalog: &'c Catalog,
    config: &'a Config,
    nodes: Vec<Node>,
}

impl Loader<'_, '_> {
    fn load_record(
        &mut self,
        schema: SchemaId,
        raw: &Value,
        path: AttrPath,
    ) -> Result<NodeId, ParseError> {
        let catalog = self.catalog;
        let record = catalog.record(schema);
        let fail = |path: &AttrPath, kind| ParseError {
            path: path.clone(),
            expected: record.name().to_string(),
            raw: Some(raw.clone()),
            kind,
        };

        let Value::Map(map) = raw else {
            return Err(fail(
                &path,
                ParseErrorKind::TypeMismatch {
                    expected: ValueKind::Map,
                    actual: raw.kind(),
                },
            ));
        };
        if self.config.unknown_fields == UnknownFields::Deny
            && let Some(key) = map.keys().find(|key| !record.has_field(key.as_str()))
        {
            return Err(fail(&path, ParseErrorKind::UnknownField(key.clone())));
        }

        let mut fields = Vec::with_capacity(record.fields().len());
        for decl in record.fields() {
            let field_path = path.child(decl.name());
            let value = self
                .parse_value(map.get(decl.name()), &decl.ty, &field_path)
                .map_err(|e| fail(&path, ParseErrorKind::Nested(Box::new(e))))?;
            fields.push(value);
        }

        let mut children = Vec::new();
        for value in &fields {
            value.collect_nodes(&mut children);
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            schema,
            path,
            parent: None,
            fields,
        });
        for child in children {
            self.nodes[child.0].parent = Some(id);
        }
        Ok(id)
    }

    fn parse_value(
        &mut self,
        raw: Option<&Value>,
        ty: &TypeExpr,
        path: &AttrPath,
    ) -> Result<FieldValue, ParseError> {
        let raw = match raw {
            None | Some(Value::Null) => return Ok(FieldValue::Absent),
            Some(raw) => raw,
        };
        let catalog = self.catalog;
        let fail = |kind: ParseErrorKind| ParseError {
            path: path.clone(),
            expected: catalog.type_name(ty),
            raw: Some(raw.clone()),
            kind,
        };

        match ty {
            TypeExpr::Absent => Ok(FieldValue::Absent),
            TypeExpr::Record(schema) => self
                .load_record(*schema, raw, path.clone())
                .map(FieldValue::Node),
            TypeExpr::Scalar(scalar) => coerce(raw, *scalar, self.config.coercion)
                .map(FieldValue::Scalar)
                .map_err(fail),
            TypeExpr::Enum(id) => self
                .parse_enum(*id, raw)
                .map(FieldValue::Enum)
                .map_err(fail),
            TypeExpr::Variant(alternatives) => self
                .parse_variant(alternatives, raw, path)
                .map_err(|attempts| fail(ParseErrorKind::NoMatchingVariant { attempts })),
            TypeExpr::Sequence(element) => {
                let Value::Array(items) = raw else {
                    return Err(fail(ParseErrorKind::TypeMismatch {
                        expected: ValueKind::Array,
                        actual: raw.kind(),
                    }));
                };
                let mut parsed = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    let item = self
                        .parse_value(Some(item), element, &path.index(index))
                        .map_err(|e| fail(ParseErrorKind::Nested(Box::new(e))))?;
                    parsed.push(item);
                }
                Ok(FieldValue::Sequence(parsed))
            }
        }
    }

    /// First alternative with a present value wins. Nodes built by a failed
    /// alternative are discarded.
    fn parse_variant(
        &mut self,
        alternatives: &[TypeExpr],
        raw: &Value,
        path: &AttrPath,
    ) -> Result<FieldValue, Vec<ParseError>> {
        let mut attempts = Vec::new();
        for alternative in alternatives {
            let mark = self.nodes.len();
            match self.parse_value(Some(raw), alternative, path) {
                Ok(FieldValue::Absent) => {}
                Ok(value) => return Ok(value),
                Err(e) => {
                    self.nodes.truncate(mark);
                    attempts.push(e);
                }
            }
        }
        if attempts.is_empty() {
            Ok(FieldValue::Absent)
        } else {
            Err(attempts)
        }
    }

    /// Match by underlying value first, then by label.
    fn parse_enum(&self, id: EnumId, raw: &Value) -> Result<EnumValue, ParseErrorKind> {
        let enum_type = self.catalog.enum_type(id);
        let coercion = self.config.coercion;
        let member = enum_type
            .members()
            .iter()
            .find(|m| coerce(raw, m.value.scalar_type(), coercion).is_ok_and(|v| v == m.value))
            .or_else(|| {
                let label = raw.as_str()?;
                enum_type.members().iter().find(|m| m.label == label)
            })
            .ok_or_else(|| ParseErrorKind::UnknownEnumValue {
                enum_name: enum_type.name().to_string(),
                value: raw.to_string(),
            })?;
        Ok(EnumValue {
            ty: id,
            label: member.label.clone(),
            value: member.value.clone(),
        })
    }
}

// ============================================================================
// Scalar coercion
// ============================================================================

/// Convert a raw scalar into `ty`.
///
/// Exact kinds and integer to float widening always succeed. Under
/// [`Coercion::Loose`], text is parsed into numbers and booleans
/// (`"true"`/`"false"`), numbers and booleans are rendered into text, and
/// floats without a fractional part become integers.
pub(crate) fn coerce(raw: &Value, ty: ScalarType, coercion: Coercion) -> Result<Scalar, ParseErrorKind> {
    let mismatch = || ParseErrorKind::TypeMismatch {
        expected: ty.value_kind(),
        actual: raw.kind(),
    };
    let invalid_text = |text: &str| ParseErrorKind::InvalidText {
        expected: ty,
        text: text.to_string(),
    };

    match (ty, raw) {
        (ScalarType::Bool, Value::Bool(b)) => Ok(Scalar::Bool(*b)),
        (ScalarType::Integer, Value::Integer(i)) => Ok(Scalar::Integer(i.clone())),
        (ScalarType::Float, Value::Float(f)) => Ok(Scalar::Float(*f)),
        (ScalarType::Text, Value::Text(s)) => Ok(Scalar::Text(s.clone())),
        (ScalarType::Float, Value::Integer(i)) => i
            .to_f64()
            .filter(|f| f.is_finite())
            .map(Scalar::Float)
            .ok_or_else(|| ParseErrorKind::OutOfRange(format!("{i} does not fit a float"))),
        _ if coercion == Coercion::Strict => Err(mismatch()),

        (ScalarType::Bool, Value::Text(s)) => match s.trim() {
            "true" => Ok(Scalar::Bool(true)),
            "false" => Ok(Scalar::Bool(false)),
            _ => Err(invalid_text(s)),
        },
        (ScalarType::Integer, Value::Text(s)) => s
            .trim()
            .parse::<BigInt>()
            .map(Scalar::Integer)
            .map_err(|_| invalid_text(s)),
        (ScalarType::Integer, Value::Float(f)) if f.fract() == 0.0 => BigInt::from_f64(*f)
            .map(Scalar::Integer)
            .ok_or_else(|| ParseErrorKind::OutOfRange(format!("{f:?} is not an integer"))),
        (ScalarType::Integer, Value::Float(f)) => Err(ParseErrorKind::OutOfRange(format!(
            "{f:?} is not an integer"
        ))),
        (ScalarType::Float, Value::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map(Scalar::Float)
            .map_err(|_| invalid_text(s)),
        (ScalarType::Text, Value::Bool(_) | Value::Integer(_) | Value::Float(_)) => {
            Ok(Scalar::Text(raw.to_string()))
        }
        _ => Err(mismatch()),
    }
}
