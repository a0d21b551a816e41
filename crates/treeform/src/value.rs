use num_bigint::BigInt;
use num_traits::ToPrimitive;
use treeform_document::Value;

use crate::schema::{EnumId, ScalarType};
use crate::tree::NodeId;

/// A parsed scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Integer(BigInt),
    Float(f64),
    Text(String),
}

impl Scalar {
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            Scalar::Bool(_) => ScalarType::Bool,
            Scalar::Integer(_) => ScalarType::Integer,
            Scalar::Float(_) => ScalarType::Float,
            Scalar::Text(_) => ScalarType::Text,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Scalar::Bool(b) => Value::Bool(*b),
            Scalar::Integer(i) => Value::Integer(i.clone()),
            Scalar::Float(f) => Value::Float(*f),
            Scalar::Text(s) => Value::Text(s.clone()),
        }
    }

    /// Numeric view used by range checks.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Integer(i) => i.to_f64(),
            Scalar::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl core::fmt::Display for Scalar {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Integer(i) => write!(f, "{i}"),
            Scalar::Float(x) => write!(f, "{x:?}"),
            Scalar::Text(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl From<i32> for Scalar {
    fn from(n: i32) -> Self {
        Scalar::Integer(BigInt::from(n))
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Integer(BigInt::from(n))
    }
}

impl From<BigInt> for Scalar {
    fn from(n: BigInt) -> Self {
        Scalar::Integer(n)
    }
}

impl From<f64> for Scalar {
    fn from(n: f64) -> Self {
        Scalar::Float(n)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Text(s)
    }
}

/// One member of an enumerated type, as held by a node.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumValue {
    pub ty: EnumId,
    pub label: String,
    /// The underlying scalar; this is what dumping emits.
    pub value: Scalar,
}

/// The value of one declared field on a node.
///
/// `Node` holds an arena handle owned by the same tree; the node it points to
/// belongs to the field holding it.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldValue {
    #[default]
    Absent,
    Scalar(Scalar),
    Enum(EnumValue),
    Node(NodeId),
    Sequence(Vec<FieldValue>),
}

impl FieldValue {
    pub fn is_absent(&self) -> bool {
        matches!(self, FieldValue::Absent)
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            FieldValue::Scalar(s) => Some(s),
            FieldValue::Enum(e) => Some(&e.value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self.as_scalar()? {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.as_scalar()? {
            Scalar::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<&BigInt> {
        match self.as_scalar()? {
            Scalar::Integer(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_integer().and_then(ToPrimitive::to_i64)
    }

    pub fn as_float(&self) -> Option<f64> {
        match self.as_scalar()? {
            Scalar::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumValue> {
        match self {
            FieldValue::Enum(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            FieldValue::Node(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Push every node handle held by this value, in element order.
    pub(crate) fn collect_nodes(&self, out: &mut Vec<NodeId>) {
        match self {
            FieldValue::Node(id) => out.push(*id),
            FieldValue::Sequence(items) => {
                for item in items {
                    item.collect_nodes(out);
                }
            }
            FieldValue::Absent | FieldValue::Scalar(_) | FieldValue::Enum(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_reads_as_its_scalar() {
        let value = FieldValue::Enum(EnumValue {
            ty: EnumId(0),
            label: "Active".to_string(),
            value: Scalar::from("active"),
        });
        assert_eq!(value.as_str(), Some("active"));
        assert_eq!(value.as_enum().map(|e| e.label.as_str()), Some("Active"));
    }

    #[test]
    fn test_collect_nodes_descends_sequences() {
        let value = FieldValue::Sequence(vec![
            FieldValue::Node(NodeId(3)),
            FieldValue::Absent,
            FieldValue::Sequence(vec![FieldValue::Node(NodeId(1))]),
        ]);
        let mut out = Vec::new();
        value.collect_nodes(&mut out);
        assert_eq!(out, vec![NodeId(3), NodeId(1)]);
    }

    #[test]
    fn test_scalar_to_value() {
        assert_eq!(Scalar::from(5).to_value(), Value::from(5));
        assert_eq!(Scalar::from("x").to_value(), Value::from("x"));
        assert_eq!(Scalar::from(2).as_f64(), Some(2.0));
        assert_eq!(Scalar::from(true).as_f64(), None);
    }
}
