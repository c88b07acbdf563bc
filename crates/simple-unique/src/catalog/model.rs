//! Model definitions.

use super::attribute::AttributeDef;
use crate::error::Error;

/// A model definition: the record type a validation is declared on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDef {
    /// Model name, also used as the storage namespace.
    pub name: String,
    /// Attribute definitions.
    pub attributes: Vec<AttributeDef>,
}

impl ModelDef {
    /// Create a new model definition without attributes.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
        }
    }

    /// Add an attribute to the model.
    pub fn with_attribute(mut self, attribute: AttributeDef) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Add multiple attributes.
    pub fn with_attributes(mut self, attributes: impl IntoIterator<Item = AttributeDef>) -> Self {
        self.attributes.extend(attributes);
        self
    }

    /// Get an attribute by name.
    pub fn get_attribute(&self, name: &str) -> Option<&AttributeDef> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Check if the model declares an attribute.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.get_attribute(name).is_some()
    }

    /// Get an attribute by name, failing with [`Error::UnknownAttribute`].
    pub fn require_attribute(&self, name: &str) -> Result<&AttributeDef, Error> {
        self.get_attribute(name)
            .ok_or_else(|| Error::unknown_attribute(&self.name, name))
    }
}
