//! Model catalog.
//!
//! A [`ModelDef`] declares which attributes a model has and what kind of value
//! each one holds. Queries and records consult it so that a misspelled scope
//! or attribute name is caught as a configuration fault instead of silently
//! matching nothing.

mod attribute;
mod model;

pub use attribute::{AttributeDef, AttributeType};
pub use model::ModelDef;
