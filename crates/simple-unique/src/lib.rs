//! simple-unique - uniqueness validation for records in a key/value store.
//!
//! Declares that an attribute's value must be unique across the records of
//! a model, optionally scoped by other attributes, and reports conflicts as
//! validation errors on the record.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use simple_unique::{
//!     AttributeDef, Document, ModelDef, ModelValidations, Record, StorageConfig,
//!     StorageEngine, UniquenessOptions,
//! };
//!
//! # fn main() -> Result<(), simple_unique::Error> {
//! let person = Arc::new(
//!     ModelDef::new("Person")
//!         .with_attribute(AttributeDef::string("user_name"))
//!         .with_attribute(AttributeDef::string("account_id")),
//! );
//! let validations = ModelValidations::builder(Arc::clone(&person))
//!     .validates_uniqueness_of("user_name", UniquenessOptions::new().scope("account_id"))?
//!     .build();
//!
//! let engine = StorageEngine::open(StorageConfig::new("./people"))?;
//! let mut bob = Document::new(person)
//!     .with("user_name", "bob")?
//!     .with("account_id", "acme")?;
//! if validations.save(&mut bob, &engine)?.is_none() {
//!     println!("{:?}", bob.errors().full_messages());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The check is not atomic with the save; see
//! [`validation::UniquenessValidator`] for the race this leaves open and
//! [`reconcile::DuplicateScanner`] for finding its results.

pub mod catalog;
pub mod config;
pub mod error;
pub mod query;
pub mod reconcile;
pub mod record;
pub mod storage;
pub mod validation;
pub mod value;

pub use catalog::{AttributeDef, AttributeType, ModelDef};
pub use config::{NameList, UniquenessDecl, ValidationConfig};
pub use error::Error;
pub use query::{Filter, Query, QueryBuilder, Repository};
pub use reconcile::{DuplicateGroup, DuplicateScanner};
pub use record::{Document, Errors, Record, RecordId};
pub use storage::{StorageConfig, StorageEngine};
pub use validation::{
    AttributeNames, Condition, Gate, ModelValidations, ModelValidationsBuilder, UniquenessOptions,
    UniquenessValidator, Validator, DEFAULT_MESSAGE,
};
pub use value::Value;
