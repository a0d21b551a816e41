//! Two-tier validation.
//!
//! Both passes visit the tree breadth first from the root. The critical pass
//! runs only critical validators and stops at the first error value it
//! sees; that error becomes the whole report and the normal pass is skipped.
//! Otherwise the normal pass runs every normal validator and collects every
//! error value.
//!
//! A validator that returns `Err` or panics never stops either pass. The
//! failure is recorded in [`Validation::internal_failures`] and the next
//! validator runs.

mod context;
mod report;

pub use context::FieldContext;
pub use report::{ErrorReport, InternalFailure, Validation};

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, error, warn};

use crate::registry::{FieldError, Tier, Validator};
use crate::tree::{NodeRef, Tree};
use crate::value::FieldValue;

impl Tree<'_> {
    /// Run the critical pass, then, if it found nothing, the normal pass.
    pub fn validate(&self) -> Validation {
        validate(self)
    }

    /// Like [`validate`](Self::validate), with `extra` readable by every
    /// validator through [`FieldContext::extra`].
    pub fn validate_with(&self, extra: &dyn Any) -> Validation {
        validate_with(self, extra)
    }
}

pub fn validate(tree: &Tree<'_>) -> Validation {
    run(tree, None)
}

pub fn validate_with(tree: &Tree<'_>, extra: &dyn Any) -> Validation {
    run(tree, Some(extra))
}

fn run<'t>(tree: &'t Tree<'_>, extra: Option<&'t dyn Any>) -> Validation {
    let mut validation = Validation::default();

    for node in tree.breadth_first() {
        let errors = run_node(node, Tier::Critical, extra, &mut validation.internal_failures);
        if !errors.is_empty() {
            debug!(path = %node.path(), "critical validation failed, skipping normal pass");
            validation.errors = errors;
            validation.short_circuited = true;
            return validation;
        }
    }

    for node in tree.breadth_first() {
        let errors = run_node(node, Tier::Normal, extra, &mut validation.internal_failures);
        validation.errors.merge(errors);
    }
    validation
}

/// Run the `tier` validators of every field of `node`, in field declaration
/// order and then registration order. The critical tier returns at the
/// first error value. A validator that fails is recorded and the next one
/// runs, in both tiers, so a later critical validator of the same node can
/// still end the pass.
fn run_node<'t>(
    node: NodeRef<'t>,
    tier: Tier,
    extra: Option<&'t dyn Any>,
    failures: &mut Vec<InternalFailure>,
) -> ErrorReport {
    let mut report = ErrorReport::new();
    let schema = node.schema();
    let table = schema.validators();
    if !table.has_tier(tier) {
        return report;
    }

    for (index, decl) in schema.fields().iter().enumerate() {
        let validators = table.entries(tier, index);
        if validators.is_empty() {
            continue;
        }
        let value = node.value_at(index);
        let ctx = FieldContext::new(node, decl, extra);

        for validator in validators {
            let path = ctx.field_path();
            debug!(%path, validator = validator.name(), %tier, "validating field");
            match invoke(validator, value, &ctx) {
                Ok(Outcome::Skipped) => {
                    debug!(%path, validator = validator.name(), "predicate false, skipped");
                }
                Ok(Outcome::Passed) => {
                    debug!(%path, validator = validator.name(), "validation ok");
                }
                Ok(Outcome::Failed(field_error)) => {
                    warn!(%path, validator = validator.name(), error = %field_error, "validation error");
                    report.push(path.clone(), field_error);
                    if tier == Tier::Critical {
                        return report;
                    }
                }
                Err(cause) => {
                    error!(%path, validator = validator.name(), "validator failed: {cause:#}");
                    failures.push(InternalFailure {
                        path: path.clone(),
                        validator: validator.name().to_string(),
                        tier,
                        cause,
                    });
                }
            }
        }
    }
    report
}

enum Outcome {
    Skipped,
    Passed,
    Failed(FieldError),
}

/// Evaluate the predicate and call the validator, turning a panic in either
/// into an error.
fn invoke(
    validator: &Validator,
    value: &FieldValue,
    ctx: &FieldContext<'_>,
) -> anyhow::Result<Outcome> {
    let run = || -> anyhow::Result<Outcome> {
        if !validator.applies(value, ctx) {
            return Ok(Outcome::Skipped);
        }
        Ok(match validator.call(value, ctx)? {
            None => Outcome::Passed,
            Some(field_error) => Outcome::Failed(field_error),
        })
    };
    panic::catch_unwind(AssertUnwindSafe(run)).unwrap_or_else(|payload| {
        Err(anyhow::anyhow!(
            "validator panicked: {}",
            panic_message(payload.as_ref())
        ))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
