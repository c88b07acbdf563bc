//! `if` / `unless` gates.

use std::fmt;
use std::sync::Arc;

use crate::error::Error;
use crate::record::Record;

type PredicateFn = dyn Fn(&dyn Record) -> Result<bool, Error> + Send + Sync;

/// A boolean condition evaluated against a record before a validator runs.
#[derive(Clone)]
pub enum Condition {
    /// Truthiness of an attribute on the record.
    Attribute(String),
    /// Arbitrary predicate over the record.
    Predicate(Arc<PredicateFn>),
}

impl Condition {
    /// Condition on the truthiness of an attribute.
    pub fn attribute(name: impl Into<String>) -> Self {
        Condition::Attribute(name.into())
    }

    /// Condition computed by a closure.
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&dyn Record) -> Result<bool, Error> + Send + Sync + 'static,
    {
        Condition::Predicate(Arc::new(f))
    }

    /// Evaluate the condition.
    ///
    /// An attribute condition on an undeclared attribute fails with
    /// [`Error::UnknownAttribute`].
    pub fn evaluate(&self, record: &dyn Record) -> Result<bool, Error> {
        match self {
            Condition::Attribute(name) => Ok(record.attribute(name)?.is_truthy()),
            Condition::Predicate(f) => f(record),
        }
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Attribute(name) => f.debug_tuple("Attribute").field(name).finish(),
            Condition::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// The pair of gates attached to a declared validation.
#[derive(Debug, Clone, Default)]
pub struct Gate {
    /// Run only when this condition holds.
    pub only_if: Option<Condition>,
    /// Skip when this condition holds.
    pub unless: Option<Condition>,
}

impl Gate {
    /// Whether the validation should run for this record.
    pub fn allows(&self, record: &dyn Record) -> Result<bool, Error> {
        if let Some(cond) = &self.only_if {
            if !cond.evaluate(record)? {
                return Ok(false);
            }
        }
        if let Some(cond) = &self.unless {
            if cond.evaluate(record)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Whether neither gate is set.
    pub fn is_open(&self) -> bool {
        self.only_if.is_none() && self.unless.is_none()
    }
}
