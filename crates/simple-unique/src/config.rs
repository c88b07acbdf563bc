//! Declarative validation configuration.
//!
//! Uniqueness declarations can be written as JSON instead of code:
//!
//! ```json
//! {
//!   "models": {
//!     "Widget": [
//!       { "attribute": "name", "scope": "category", "message": "is a repeat" },
//!       { "attribute": ["serial", "sku"], "if": "tracked" }
//!     ]
//!   }
//! }
//! ```
//!
//! `if` and `unless` name attributes whose truthiness gates the check.
//! Closure gates can only be declared from code.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::ModelDef;
use crate::error::Error;
use crate::validation::{AttributeNames, Condition, ModelValidations, UniquenessOptions};

fn default_true() -> bool {
    true
}

/// One attribute name or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NameList {
    /// A single attribute name.
    One(String),
    /// Several attribute names.
    Many(Vec<String>),
}

impl From<NameList> for AttributeNames {
    fn from(list: NameList) -> Self {
        match list {
            NameList::One(name) => AttributeNames::from(name),
            NameList::Many(names) => AttributeNames::from(names),
        }
    }
}

/// A uniqueness declaration as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UniquenessDecl {
    /// Attribute(s) that must be unique.
    pub attribute: NameList,

    /// Scope attribute(s).
    #[serde(default)]
    pub scope: Option<NameList>,

    /// Custom error message.
    #[serde(default)]
    pub message: Option<String>,

    /// Skip nil values.
    #[serde(default = "default_true")]
    pub allow_nil: bool,

    /// Skip blank values.
    #[serde(default = "default_true")]
    pub allow_blank: bool,

    /// Case-sensitive matching. Must be `true`.
    #[serde(default = "default_true")]
    pub case_sensitive: bool,

    /// Attribute that must be truthy for the check to run.
    #[serde(default, rename = "if")]
    pub only_if: Option<String>,

    /// Attribute that, when truthy, skips the check.
    #[serde(default)]
    pub unless: Option<String>,
}

impl UniquenessDecl {
    /// Convert into code-level options.
    pub fn to_options(&self) -> UniquenessOptions {
        let mut options = UniquenessOptions::new()
            .allow_nil(self.allow_nil)
            .allow_blank(self.allow_blank)
            .case_sensitive(self.case_sensitive);
        if let Some(scope) = &self.scope {
            options = options.scope(scope.clone());
        }
        if let Some(message) = &self.message {
            options = options.message(message.clone());
        }
        if let Some(attr) = &self.only_if {
            options = options.only_if(Condition::attribute(attr.clone()));
        }
        if let Some(attr) = &self.unless {
            options = options.unless(Condition::attribute(attr.clone()));
        }
        options
    }
}

/// Uniqueness declarations for a set of models.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidationConfig {
    /// Declarations keyed by model name.
    #[serde(default)]
    pub models: BTreeMap<String, Vec<UniquenessDecl>>,
}

impl ValidationConfig {
    /// Parse configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json(&text)?;
        debug!(
            path = %path.display(),
            models = config.models.len(),
            "validation config loaded"
        );
        Ok(config)
    }

    /// Declarations for a model, empty if it has none.
    pub fn declarations(&self, model: &str) -> &[UniquenessDecl] {
        self.models.get(model).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Build the validations for one model.
    ///
    /// Fails with [`Error::InvalidOptions`] when a declaration cannot be
    /// honored (`case_sensitive: false`).
    pub fn validations_for(&self, model: Arc<ModelDef>) -> Result<ModelValidations, Error> {
        let decls = self.declarations(&model.name);
        let mut builder = ModelValidations::builder(model);
        for decl in decls {
            builder = builder.validates_uniqueness_of(decl.attribute.clone(), decl.to_options())?;
        }
        Ok(builder.build())
    }
}
