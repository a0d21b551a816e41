use indexmap::IndexMap;
use thisisplural::Plural;

use crate::path::AttrPath;
use crate::registry::{FieldError, Tier};

/// Error values keyed by the dotted path of the field that produced them.
///
/// Paths keep the order in which they first reported an error.
#[derive(Debug, Clone, Default, PartialEq, Plural)]
#[plural(len, is_empty, iter, into_iter, into_iter_ref)]
pub struct ErrorReport(IndexMap<AttrPath, Vec<FieldError>>);

impl ErrorReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: AttrPath, error: FieldError) {
        self.0.entry(path).or_default().push(error);
    }

    /// Append every error of `other`, keeping existing entries first.
    pub fn merge(&mut self, other: ErrorReport) {
        for (path, errors) in other.0 {
            self.0.entry(path).or_default().extend(errors);
        }
    }

    /// Errors reported for a dotted path such as `"root.b.c"`.
    pub fn get(&self, path: &str) -> Option<&[FieldError]> {
        let path: AttrPath = path.parse().ok()?;
        self.get_path(&path)
    }

    pub fn get_path(&self, path: &AttrPath) -> Option<&[FieldError]> {
        self.0.get(path).map(Vec::as_slice)
    }

    pub fn paths(&self) -> impl Iterator<Item = &AttrPath> {
        self.0.keys()
    }

    /// Total number of error values across all paths.
    pub fn error_count(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    /// Every error value, in report order.
    pub fn into_errors(self) -> Vec<FieldError> {
        self.0.into_values().flatten().collect()
    }
}

/// A validator that returned `Err` or panicked instead of returning a
/// result.
#[derive(Debug, thiserror::Error)]
#[error("{tier} validator `{validator}` failed at {path}: {cause:#}")]
pub struct InternalFailure {
    pub path: AttrPath,
    pub validator: String,
    pub tier: Tier,
    pub cause: anyhow::Error,
}

/// Outcome of [`validate`](super::validate).
///
/// Data errors and validator failures are kept apart: `errors` only holds
/// values returned by validators.
#[derive(Debug, Default)]
pub struct Validation {
    pub errors: ErrorReport,
    pub internal_failures: Vec<InternalFailure>,
    /// A critical validator reported an error, so the normal pass did not
    /// run.
    pub short_circuited: bool,
}

impl Validation {
    /// No errors and no validator failures.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty() && self.internal_failures.is_empty()
    }

    pub fn into_parts(self) -> (ErrorReport, Vec<InternalFailure>) {
        (self.errors, self.internal_failures)
    }

    /// Flatten into a single error list. Validator failures, if any, are
    /// summarised in one trailing `Exceptions` entry.
    pub fn into_field_errors(self) -> Vec<FieldError> {
        let mut errors = self.errors.into_errors();
        if !self.internal_failures.is_empty() {
            let separator = format!("\n{}\n", "-".repeat(50));
            let message = self
                .internal_failures
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(&separator);
            errors.push(FieldError::new("Exceptions", message));
        }
        errors
    }
}
