//! Out-of-band duplicate detection.
//!
//! Uniqueness validation cannot stop two concurrent writers from inserting
//! the same value. [`DuplicateScanner`] finds the records that got through so
//! the application can decide what to do with them. It only reports; it
//! never modifies or deletes records.

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::catalog::ModelDef;
use crate::error::Error;
use crate::record::RecordId;
use crate::storage::StorageEngine;
use crate::validation::AttributeNames;
use crate::value::Value;

/// Records that share an attribute value within the same scope.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateGroup {
    /// The shared attribute value.
    pub value: Value,
    /// The shared scope values, in scope order.
    pub scope: Vec<(String, Value)>,
    /// Ids of the records holding the value, in id order.
    pub ids: Vec<RecordId>,
}

/// Scans stored records for uniqueness violations.
pub struct DuplicateScanner<'a> {
    engine: &'a StorageEngine,
}

impl<'a> DuplicateScanner<'a> {
    /// Create a scanner over a store.
    pub fn new(engine: &'a StorageEngine) -> Self {
        Self { engine }
    }

    /// Find groups of two or more records of `model` holding the same
    /// `attribute` value and the same value for every scope attribute.
    ///
    /// Records whose value is nil or blank are ignored, matching the default
    /// uniqueness options. Groups are returned in order of first appearance.
    pub fn scan(
        &self,
        model: &ModelDef,
        attribute: &str,
        scope: impl Into<AttributeNames>,
    ) -> Result<Vec<DuplicateGroup>, Error> {
        let scope = scope.into();
        model.require_attribute(attribute)?;
        for scope_attr in scope.iter() {
            model.require_attribute(scope_attr)?;
        }

        let mut order: Vec<String> = Vec::new();
        let mut groups: BTreeMap<String, DuplicateGroup> = BTreeMap::new();
        let mut scanned = 0usize;

        for result in self.engine.scan_model(&model.name) {
            let (id, attributes) = result?;
            scanned += 1;

            let read = |name: &str| attributes.get(name).cloned().unwrap_or(Value::Null);
            let value = read(attribute);
            if value.is_blank() {
                continue;
            }

            let scope_values: Vec<(String, Value)> = scope
                .iter()
                .map(|name| (name.to_string(), read(name)))
                .collect();

            let mut key = value.group_key();
            for (_, v) in &scope_values {
                key.push('\0');
                key.push_str(&v.group_key());
            }

            let group = groups.entry(key.clone()).or_insert_with(|| {
                order.push(key);
                DuplicateGroup {
                    value,
                    scope: scope_values,
                    ids: Vec::new(),
                }
            });
            group.ids.push(id);
        }

        let duplicates: Vec<DuplicateGroup> = order
            .into_iter()
            .filter_map(|key| groups.remove(&key))
            .filter(|group| group.ids.len() > 1)
            .collect();

        if duplicates.is_empty() {
            info!(model = %model.name, attribute, scanned, "no duplicates found");
        } else {
            warn!(
                model = %model.name,
                attribute,
                scanned,
                groups = duplicates.len(),
                "duplicate values found"
            );
        }

        Ok(duplicates)
    }
}
