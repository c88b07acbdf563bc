//! Per-model validation configuration.

use std::sync::Arc;

use tracing::{debug, trace};

use super::condition::Gate;
use super::uniqueness::{AttributeNames, UniquenessOptions, UniquenessValidator};
use super::Validator;
use crate::catalog::ModelDef;
use crate::error::Error;
use crate::query::Repository;
use crate::record::{Document, Record, RecordId};
use crate::storage::StorageEngine;

/// One declared validation: which attributes, which rule, under which gates.
#[derive(Debug, Clone)]
struct Rule {
    attributes: AttributeNames,
    validator: Arc<dyn Validator>,
    gate: Gate,
}

/// The validations declared for one model.
///
/// Built once when the model is defined and then shared read-only; running
/// validations never changes it.
#[derive(Debug, Clone)]
pub struct ModelValidations {
    model: Arc<ModelDef>,
    rules: Vec<Rule>,
}

impl ModelValidations {
    /// Start declaring validations for a model.
    pub fn builder(model: Arc<ModelDef>) -> ModelValidationsBuilder {
        ModelValidationsBuilder {
            model,
            rules: Vec::new(),
        }
    }

    /// The model these validations belong to.
    pub fn model(&self) -> &Arc<ModelDef> {
        &self.model
    }

    /// Number of declared validations.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether nothing has been declared.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run every validation against a record.
    ///
    /// Clears the record's errors first, then for each declaration evaluates
    /// its gates and, if they allow it, validates each attribute's current
    /// value. Returns whether the record ended up without errors.
    pub fn validate(
        &self,
        record: &mut dyn Record,
        repository: &dyn Repository,
    ) -> Result<bool, Error> {
        if record.model().name != self.model.name {
            return Err(Error::InvalidOptions(format!(
                "validations for model '{}' applied to a '{}' record",
                self.model.name,
                record.model().name
            )));
        }

        record.errors_mut().clear();

        for rule in &self.rules {
            if !rule.gate.allows(&*record)? {
                trace!(
                    model = %self.model.name,
                    attributes = ?rule.attributes,
                    "validation gated off"
                );
                continue;
            }
            for attribute in rule.attributes.iter() {
                let value = record.attribute(attribute)?;
                rule.validator
                    .validate_attribute(record, attribute, &value, repository)?;
            }
        }

        let valid = record.errors().is_empty();
        debug!(
            model = %self.model.name,
            valid,
            errors = record.errors().len(),
            "record validated"
        );
        Ok(valid)
    }

    /// Validate and, if valid, save the record.
    ///
    /// Returns `Ok(None)` when validation failed; the record's errors say why.
    /// The check and the write are not atomic.
    pub fn save(
        &self,
        document: &mut Document,
        engine: &StorageEngine,
    ) -> Result<Option<RecordId>, Error> {
        if !self.validate(document, engine)? {
            return Ok(None);
        }
        engine.save(document).map(Some)
    }
}

/// Builder for [`ModelValidations`].
#[derive(Debug)]
pub struct ModelValidationsBuilder {
    model: Arc<ModelDef>,
    rules: Vec<Rule>,
}

impl ModelValidationsBuilder {
    /// Declare that `attributes` must be unique.
    ///
    /// Each listed attribute is checked independently with the same options.
    pub fn validates_uniqueness_of(
        self,
        attributes: impl Into<AttributeNames>,
        options: UniquenessOptions,
    ) -> Result<Self, Error> {
        let validator = UniquenessValidator::new(&options)?;
        let gate = Gate {
            only_if: options.only_if,
            unless: options.unless,
        };
        Ok(self.validates_with(attributes, Arc::new(validator), gate))
    }

    /// Declare an arbitrary validator over `attributes`.
    pub fn validates_with(
        mut self,
        attributes: impl Into<AttributeNames>,
        validator: Arc<dyn Validator>,
        gate: Gate,
    ) -> Self {
        self.rules.push(Rule {
            attributes: attributes.into(),
            validator,
            gate,
        });
        self
    }

    /// Finish declaring.
    pub fn build(self) -> ModelValidations {
        ModelValidations {
            model: self.model,
            rules: self.rules,
        }
    }
}
