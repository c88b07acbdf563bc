//! Storage layer.
//!
//! A sled-backed record store that implements [`Repository`](crate::query::Repository)
//! so uniqueness checks can run against it.

mod config;
mod engine;
mod record;

pub mod key;

pub use config::StorageConfig;
pub use engine::StorageEngine;
pub use key::RecordKey;
pub use record::StoredRecord;
