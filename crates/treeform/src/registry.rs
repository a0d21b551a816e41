//! Validator registration.
//!
//! Validators are stored on the record descriptor, one ordered list per
//! `(field, tier)`. Register everything while setting up the [`Catalog`];
//! validation only reads the tables.

use std::sync::Arc;

use crate::schema::{Catalog, SchemaId};
use crate::validate::FieldContext;
use crate::value::FieldValue;

/// Error value returned by a validator. The engine never looks inside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldError {
    pub attribute: String,
    pub message: String,
}

impl FieldError {
    pub fn new(attribute: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            message: message.into(),
        }
    }
}

impl core::fmt::Display for FieldError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.attribute, self.message)
    }
}

/// `Ok(None)` passes, `Ok(Some(_))` is a data error, `Err(_)` means the
/// validator itself failed.
pub type ValidatorResult = anyhow::Result<Option<FieldError>>;

/// A validator callable.
///
/// Closures taking `(&FieldValue, &FieldContext)` implement this trait.
pub trait ValidatorFn: Send + Sync {
    fn call(&self, value: &FieldValue, ctx: &FieldContext<'_>) -> ValidatorResult;
}

impl<F> ValidatorFn for F
where
    F: Fn(&FieldValue, &FieldContext<'_>) -> ValidatorResult + Send + Sync,
{
    fn call(&self, value: &FieldValue, ctx: &FieldContext<'_>) -> ValidatorResult {
        self(value, ctx)
    }
}

type Predicate = dyn Fn(&FieldValue, &FieldContext<'_>) -> bool + Send + Sync;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// Any error stops validation before the normal pass.
    Critical,
    Normal,
}

impl core::fmt::Display for Tier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Tier::Critical => write!(f, "critical"),
            Tier::Normal => write!(f, "normal"),
        }
    }
}

/// One registered rule: a named callable, its tier, and an optional
/// predicate deciding whether it runs for a given field.
#[derive(Clone)]
pub struct Validator {
    name: String,
    func: Arc<dyn ValidatorFn>,
    tier: Tier,
    when: Option<Arc<Predicate>>,
}

impl Validator {
    /// A normal validator from a closure.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&FieldValue, &FieldContext<'_>) -> ValidatorResult + Send + Sync + 'static,
    {
        Self::with_impl(name, func)
    }

    /// A normal validator from any [`ValidatorFn`] implementation.
    pub fn with_impl(name: impl Into<String>, func: impl ValidatorFn + 'static) -> Self {
        Self {
            name: name.into(),
            func: Arc::new(func),
            tier: Tier::Normal,
            when: None,
        }
    }

    /// Move this validator to the critical tier.
    pub fn critical(mut self) -> Self {
        self.tier = Tier::Critical;
        self
    }

    /// Only run when `predicate` holds for the field being validated.
    pub fn when<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&FieldValue, &FieldContext<'_>) -> bool + Send + Sync + 'static,
    {
        self.when = Some(Arc::new(predicate));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn has_predicate(&self) -> bool {
        self.when.is_some()
    }

    pub(crate) fn applies(&self, value: &FieldValue, ctx: &FieldContext<'_>) -> bool {
        self.when.as_ref().is_none_or(|when| when(value, ctx))
    }

    pub(crate) fn call(&self, value: &FieldValue, ctx: &FieldContext<'_>) -> ValidatorResult {
        self.func.call(value, ctx)
    }
}

impl core::fmt::Debug for Validator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Validator")
            .field("name", &self.name)
            .field("tier", &self.tier)
            .field("when", &self.when.is_some())
            .finish_non_exhaustive()
    }
}

/// Validators of one record type, indexed by declared field position.
#[derive(Debug, Clone, Default)]
pub struct ValidatorTable {
    critical: Vec<Vec<Validator>>,
    normal: Vec<Vec<Validator>>,
}

impl ValidatorTable {
    pub(crate) fn with_fields(count: usize) -> Self {
        Self {
            critical: vec![Vec::new(); count],
            normal: vec![Vec::new(); count],
        }
    }

    /// Validators of one field and tier, in registration order.
    pub fn entries(&self, tier: Tier, field_index: usize) -> &[Validator] {
        let lists = match tier {
            Tier::Critical => &self.critical,
            Tier::Normal => &self.normal,
        };
        lists
            .get(field_index)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Whether any field has a validator of `tier`.
    pub fn has_tier(&self, tier: Tier) -> bool {
        let lists = match tier {
            Tier::Critical => &self.critical,
            Tier::Normal => &self.normal,
        };
        lists.iter().any(|list| !list.is_empty())
    }

    pub fn len(&self) -> usize {
        self.critical
            .iter()
            .chain(&self.normal)
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&mut self, field_index: usize, validator: Validator) {
        let lists = match validator.tier {
            Tier::Critical => &mut self.critical,
            Tier::Normal => &mut self.normal,
        };
        lists[field_index].push(validator);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("record #{0} is not declared in this catalog")]
    UnknownSchema(usize),

    #[error("`{schema}` has no field named `{field}`")]
    UnknownField { schema: String, field: String },
}

impl Catalog {
    /// Attach `validator` to `field` of the `schema` record.
    ///
    /// `field` must be one of the record's declared fields; otherwise nothing
    /// is registered.
    pub fn register(
        &mut self,
        schema: SchemaId,
        field: &str,
        validator: Validator,
    ) -> Result<(), RegistryError> {
        let record = self
            .record_mut(schema)
            .ok_or(RegistryError::UnknownSchema(schema.0))?;
        let index = record
            .field_index(field)
            .ok_or_else(|| RegistryError::UnknownField {
                schema: record.name().to_string(),
                field: field.to_string(),
            })?;
        tracing::debug!(
            schema = record.name(),
            field,
            validator = validator.name(),
            tier = %validator.tier(),
            "registered validator"
        );
        record.validators.push(index, validator);
        Ok(())
    }

    /// Register several validators on one field. Either all of them are
    /// registered or, on error, none.
    pub fn register_all(
        &mut self,
        schema: SchemaId,
        field: &str,
        validators: impl IntoIterator<Item = Validator>,
    ) -> Result<(), RegistryError> {
        let record = self
            .record_mut(schema)
            .ok_or(RegistryError::UnknownSchema(schema.0))?;
        if !record.has_field(field) {
            return Err(RegistryError::UnknownField {
                schema: record.name().to_string(),
                field: field.to_string(),
            });
        }
        for validator in validators {
            self.register(schema, field, validator)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TypeExpr;

    fn catalog() -> (Catalog, SchemaId) {
        let mut catalog = Catalog::new();
        let id = catalog
            .declare_record("Inputs", [("name", TypeExpr::TEXT), ("count", TypeExpr::INTEGER)])
            .unwrap();
        (catalog, id)
    }

    fn pass(name: &str) -> Validator {
        Validator::new(name, |_, _| Ok(None))
    }

    #[test]
    fn test_register_keeps_order_per_tier() {
        let (mut catalog, id) = catalog();
        catalog.register(id, "name", pass("a")).unwrap();
        catalog.register(id, "name", pass("b").critical()).unwrap();
        catalog.register(id, "name", pass("c")).unwrap();
        catalog.register(id, "count", pass("d").critical()).unwrap();

        let table = catalog.record(id).validators();
        let names = |tier, index| -> Vec<String> {
            table
                .entries(tier, index)
                .iter()
                .map(|v| v.name().to_string())
                .collect()
        };
        assert_eq!(names(Tier::Normal, 0), vec!["a", "c"]);
        assert_eq!(names(Tier::Critical, 0), vec!["b"]);
        assert_eq!(names(Tier::Critical, 1), vec!["d"]);
        assert!(names(Tier::Normal, 1).is_empty());
        assert_eq!(table.len(), 4);
        assert!(table.has_tier(Tier::Critical));
    }

    #[test]
    fn test_register_unknown_field() {
        let (mut catalog, id) = catalog();
        assert_eq!(
            catalog.register(id, "title", pass("a")),
            Err(RegistryError::UnknownField {
                schema: "Inputs".to_string(),
                field: "title".to_string(),
            })
        );
        assert!(catalog.record(id).validators().is_empty());
    }

    #[test]
    fn test_register_unknown_schema() {
        let (mut catalog, _) = catalog();
        assert_eq!(
            catalog.register(SchemaId(9), "name", pass("a")),
            Err(RegistryError::UnknownSchema(9))
        );
    }

    #[test]
    fn test_register_all_is_all_or_nothing() {
        let (mut catalog, id) = catalog();
        assert!(
            catalog
                .register_all(id, "missing", [pass("a"), pass("b")])
                .is_err()
        );
        assert!(catalog.record(id).validators().is_empty());

        catalog
            .register_all(id, "count", [pass("a"), pass("b").critical()])
            .unwrap();
        assert_eq!(catalog.record(id).validators().len(), 2);
    }

    #[test]
    fn test_validator_debug_hides_callable() {
        let validator = pass("x").critical().when(|value, _| !value.is_absent());
        assert!(validator.has_predicate());
        assert_eq!(
            format!("{validator:?}"),
            "Validator { name: \"x\", tier: Critical, when: true, .. }"
        );
    }
}
