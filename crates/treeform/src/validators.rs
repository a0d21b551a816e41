//! Ready-made validators.
//!
//! All of them pass on absent values except [`required`]. Applied to a value
//! of the wrong shape they fail with an error, which validation records as an
//! internal failure rather than a data error.

use anyhow::bail;
use regex::Regex;

use crate::registry::{FieldError, Tier, Validator};
use crate::validate::FieldContext;
use crate::value::{FieldValue, Scalar};

/// The field must be present.
pub fn required() -> Validator {
    Validator::new("required", |value, ctx| {
        Ok(value
            .is_absent()
            .then(|| FieldError::new(ctx.field_name(), format!("{} is required", ctx.field_name()))))
    })
}

/// Text length in characters, or sequence length, is at most `max`.
pub fn max_length(max: usize) -> Validator {
    Validator::new(format!("max_length({max})"), move |value, ctx| {
        let Some(len) = length(value, ctx)? else {
            return Ok(None);
        };
        Ok((len > max).then(|| {
            FieldError::new(
                ctx.field_name(),
                format!("{} length {len} exceeds maximum {max}", ctx.field_name()),
            )
        }))
    })
}

/// Text length in characters, or sequence length, is at least `min`.
pub fn min_length(min: usize) -> Validator {
    Validator::new(format!("min_length({min})"), move |value, ctx| {
        let Some(len) = length(value, ctx)? else {
            return Ok(None);
        };
        Ok((len < min).then(|| {
            FieldError::new(
                ctx.field_name(),
                format!("{} length {len} is below minimum {min}", ctx.field_name()),
            )
        }))
    })
}

/// Text matches `pattern` somewhere. Anchor the pattern to match the whole
/// value.
pub fn pattern(pattern: &str) -> Result<Validator, regex::Error> {
    let regex = Regex::new(pattern)?;
    Ok(Validator::new(format!("pattern({pattern})"), move |value, ctx| {
        let text = match value {
            FieldValue::Absent => return Ok(None),
            value => match value.as_str() {
                Some(text) => text,
                None => bail!("{} is not text", ctx.field_path()),
            },
        };
        Ok((!regex.is_match(text)).then(|| {
            FieldError::new(
                ctx.field_name(),
                format!("{} does not match {}", ctx.field_name(), regex.as_str()),
            )
        }))
    }))
}

/// The scalar (or enum underlying value) is one of `allowed`.
pub fn one_of<S: Into<Scalar>>(allowed: impl IntoIterator<Item = S>) -> Validator {
    let allowed: Vec<Scalar> = allowed.into_iter().map(Into::into).collect();
    let listed = allowed
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    Validator::new("one_of", move |value, ctx| {
        let scalar = match value {
            FieldValue::Absent => return Ok(None),
            value => match value.as_scalar() {
                Some(scalar) => scalar,
                None => bail!("{} is not a scalar", ctx.field_path()),
            },
        };
        Ok((!allowed.contains(scalar)).then(|| {
            FieldError::new(
                ctx.field_name(),
                format!("{} must be one of {listed}", ctx.field_name()),
            )
        }))
    })
}

/// The number lies within `min..=max`.
pub fn range(min: f64, max: f64) -> Validator {
    Validator::new(format!("range({min}, {max})"), move |value, ctx| {
        let number = match value {
            FieldValue::Absent => return Ok(None),
            value => match value.as_scalar().and_then(Scalar::as_f64) {
                Some(number) => number,
                None => bail!("{} is not a number", ctx.field_path()),
            },
        };
        Ok((!(min..=max).contains(&number)).then(|| {
            FieldError::new(
                ctx.field_name(),
                format!("{} must be between {min} and {max}", ctx.field_name()),
            )
        }))
    })
}

/// Turn `validator` off while keeping its registration slot: same name and
/// tier, always passes.
pub fn skip(validator: Validator) -> Validator {
    let passing = Validator::new(validator.name().to_string(), |_, _| Ok(None));
    match validator.tier() {
        Tier::Critical => passing.critical(),
        Tier::Normal => passing,
    }
}

fn length(value: &FieldValue, ctx: &FieldContext<'_>) -> anyhow::Result<Option<usize>> {
    match value {
        FieldValue::Absent => Ok(None),
        FieldValue::Sequence(items) => Ok(Some(items.len())),
        value => match value.as_str() {
            Some(text) => Ok(Some(text.chars().count())),
            None => bail!("{} has no length", ctx.field_path()),
        },
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use treeform_document::doc;

    use super::*;
    use crate::{Catalog, Config, SchemaId, TypeExpr};

    fn catalog() -> (Catalog, SchemaId) {
        let mut catalog = Catalog::new();
        let id = catalog
            .declare_record(
                "Profile",
                [
                    ("handle", TypeExpr::optional(TypeExpr::TEXT)),
                    ("tags", TypeExpr::sequence(TypeExpr::TEXT)),
                    ("age", TypeExpr::optional(TypeExpr::INTEGER)),
                    ("plan", TypeExpr::optional(TypeExpr::TEXT)),
                ],
            )
            .unwrap();
        (catalog, id)
    }

    fn messages(catalog: &Catalog, id: SchemaId, raw: treeform_document::Value) -> Vec<String> {
        let tree = catalog.load(id, &raw, &Config::default()).unwrap();
        let validation = tree.validate();
        assert!(validation.internal_failures.is_empty());
        validation
            .errors
            .into_errors()
            .into_iter()
            .map(|e| e.message)
            .collect()
    }

    #[test]
    fn test_required() {
        let (mut catalog, id) = catalog();
        catalog.register(id, "handle", required()).unwrap();
        assert_eq!(messages(&catalog, id, doc!({})), vec!["handle is required"]);
        assert!(messages(&catalog, id, doc!({ "handle": "x" })).is_empty());
    }

    #[test]
    fn test_lengths_count_chars_and_elements() {
        let (mut catalog, id) = catalog();
        catalog.register(id, "handle", max_length(3)).unwrap();
        catalog.register(id, "tags", min_length(2)).unwrap();
        assert!(messages(&catalog, id, doc!({ "handle": "äöü", "tags": ["a", "b"] })).is_empty());
        assert_eq!(
            messages(&catalog, id, doc!({ "handle": "abcd", "tags": ["a"] })),
            vec![
                "handle length 4 exceeds maximum 3",
                "tags length 1 is below minimum 2",
            ]
        );
        assert!(messages(&catalog, id, doc!({})).is_empty());
    }

    #[test]
    fn test_pattern() {
        let (mut catalog, id) = catalog();
        catalog
            .register(id, "handle", pattern("^[a-z]+$").unwrap())
            .unwrap();
        assert!(messages(&catalog, id, doc!({ "handle": "abc" })).is_empty());
        assert_eq!(
            messages(&catalog, id, doc!({ "handle": "Abc" })),
            vec!["handle does not match ^[a-z]+$"]
        );
        assert!(pattern("(").is_err());
    }

    #[test]
    fn test_one_of_and_range() {
        let (mut catalog, id) = catalog();
        catalog
            .register(id, "plan", one_of(["free", "pro"]))
            .unwrap();
        catalog.register(id, "age", range(0.0, 150.0)).unwrap();
        assert!(messages(&catalog, id, doc!({ "plan": "pro", "age": 40 })).is_empty());
        assert_eq!(
            messages(&catalog, id, doc!({ "plan": "team", "age": 200 })),
            vec![
                "age must be between 0 and 150",
                "plan must be one of \"free\", \"pro\"",
            ]
        );
    }

    #[test]
    fn test_skip_keeps_name_and_tier() {
        let (mut catalog, id) = catalog();
        let skipped = skip(required().critical());
        assert_eq!(skipped.name(), "required");
        assert_eq!(skipped.tier(), Tier::Critical);
        catalog.register(id, "handle", skipped).unwrap();
        catalog.register(id, "handle", skip(max_length(0))).unwrap();
        assert!(messages(&catalog, id, doc!({})).is_empty());
        assert!(messages(&catalog, id, doc!({ "handle": "abc" })).is_empty());
    }

    #[test]
    fn test_wrong_shape_is_an_internal_failure() {
        let (mut catalog, id) = catalog();
        catalog.register(id, "age", max_length(2)).unwrap();
        let tree = catalog
            .load(id, &doc!({ "age": 10 }), &Config::default())
            .unwrap();
        let validation = tree.validate();
        assert!(validation.errors.is_empty());
        assert_eq!(validation.internal_failures.len(), 1);
        assert_eq!(
            validation.internal_failures[0].cause.to_string(),
            "root.age has no length"
        );
    }
}
