//! Core error types.

use thiserror::Error;

use crate::catalog::AttributeType;

/// Errors raised while declaring, running, or storing validations.
///
/// A uniqueness conflict is *not* an error: it is reported by appending a
/// message to the record's [`Errors`](crate::record::Errors). Everything here
/// is either a configuration fault in the model declaration or a failure from
/// the datastore, and is propagated to the caller unchanged.
#[derive(Debug, Error)]
pub enum Error {
    /// Storage layer error.
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    /// Malformed declarative configuration.
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),

    /// Failure reading a configuration file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Key decoding error.
    #[error("invalid key format")]
    InvalidKey,

    /// The attribute is not declared on the model.
    #[error("unknown attribute '{attribute}' on model '{model}'")]
    UnknownAttribute {
        /// Model name.
        model: String,
        /// Attribute that was looked up.
        attribute: String,
    },

    /// A value of the wrong kind was assigned to an attribute.
    #[error("attribute '{attribute}' on model '{model}' expects {expected}, got {found}")]
    TypeMismatch {
        /// Model name.
        model: String,
        /// Attribute being assigned.
        attribute: String,
        /// Declared attribute type.
        expected: AttributeType,
        /// Kind of the rejected value.
        found: &'static str,
    },

    /// A validation declaration that cannot be honored.
    #[error("invalid validation options: {0}")]
    InvalidOptions(String),
}

impl Error {
    /// Build an [`Error::UnknownAttribute`].
    pub fn unknown_attribute(model: impl Into<String>, attribute: impl Into<String>) -> Self {
        Error::UnknownAttribute {
            model: model.into(),
            attribute: attribute.into(),
        }
    }

    /// Whether this error comes from a faulty model or validation declaration
    /// rather than from the datastore.
    pub fn is_configuration_fault(&self) -> bool {
        matches!(
            self,
            Error::Config(_)
                | Error::UnknownAttribute { .. }
                | Error::TypeMismatch { .. }
                | Error::InvalidOptions(_)
        )
    }
}
