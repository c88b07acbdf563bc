//! Record validation.
//!
//! Validations are declared once per model into an immutable
//! [`ModelValidations`], which evaluates `if`/`unless` gates and runs each
//! [`Validator`] against a record. Failures are appended to the record's
//! [`Errors`](crate::record::Errors); only configuration and storage faults
//! come back as `Err`.

mod condition;
mod model;
mod uniqueness;

use std::fmt;

pub use condition::{Condition, Gate};
pub use model::{ModelValidations, ModelValidationsBuilder};
pub use uniqueness::{AttributeNames, UniquenessOptions, UniquenessValidator, DEFAULT_MESSAGE};

use crate::error::Error;
use crate::query::Repository;
use crate::record::Record;
use crate::value::Value;

/// A reusable rule that inspects one attribute of a record.
pub trait Validator: fmt::Debug + Send + Sync {
    /// Validate `value`, the current value of `attribute` on `record`.
    ///
    /// Violations are reported by appending to `record.errors_mut()`.
    fn validate_attribute(
        &self,
        record: &mut dyn Record,
        attribute: &str,
        value: &Value,
        repository: &dyn Repository,
    ) -> Result<(), Error>;
}
