use treeform_document::FieldName;

/// How strictly raw scalars are converted into declared scalar types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Coercion {
    /// Text is parsed into numbers and booleans, numbers and booleans are
    /// rendered into text, and integral floats become integers.
    #[default]
    Loose,
    /// Only exact kinds are accepted, plus integer to float widening.
    Strict,
}

/// What loading does with raw keys that are not declared fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum UnknownFields {
    #[default]
    Ignore,
    Deny,
}

/// How dumping renders absent fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AbsentFields {
    /// Absent fields are written as `null`.
    #[default]
    Null,
    /// Absent fields are left out of the map.
    Omit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// First segment of every attribute path.
    pub root_name: FieldName,
    pub coercion: Coercion,
    pub unknown_fields: UnknownFields,
    pub absent_fields: AbsentFields,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root_name: FieldName::new_unchecked("root"),
            coercion: Coercion::default(),
            unknown_fields: UnknownFields::default(),
            absent_fields: AbsentFields::default(),
        }
    }
}

impl Config {
    /// Strict coercion, unknown keys rejected.
    pub fn strict() -> Self {
        Self {
            coercion: Coercion::Strict,
            unknown_fields: UnknownFields::Deny,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use treeform_document::{FieldNameError, doc};

    use super::*;
    use crate::{Catalog, FieldError, TypeExpr, Validator};

    #[test]
    fn test_root_name_rejects_unaddressable_names() {
        assert_eq!(
            "req.v1".parse::<FieldName>(),
            Err(FieldNameError::InvalidChar {
                at: 3,
                invalid_char: '.',
            })
        );
        assert_eq!("".parse::<FieldName>(), Err(FieldNameError::Empty));
        assert!("0".parse::<FieldName>().is_err());
        assert_eq!(Config::default().root_name, FieldName::new_unchecked("root"));
    }

    #[test]
    fn test_report_keys_under_custom_root_can_be_looked_up() {
        let mut catalog = Catalog::new();
        let record = catalog
            .declare_record("Request", [("name", TypeExpr::TEXT)])
            .unwrap();
        catalog
            .register(
                record,
                "name",
                Validator::new("reject", |_, ctx| {
                    Ok(Some(FieldError::new(ctx.field_name(), "rejected")))
                }),
            )
            .unwrap();
        let config = Config {
            root_name: "req_v1".parse().unwrap(),
            ..Config::default()
        };
        let tree = catalog
            .load(record, &doc!({ "name": "x" }), &config)
            .unwrap();
        let validation = tree.validate();
        let key = validation.errors.paths().next().unwrap().to_string();
        assert_eq!(key, "req_v1.name");
        assert!(validation.errors.get(&key).is_some());
    }
}
