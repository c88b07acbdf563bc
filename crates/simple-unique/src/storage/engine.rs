//! Storage engine implementation.

use std::collections::BTreeMap;
use std::sync::Arc;

use sled::{Db, IVec, Tree};
use tracing::{info, trace};

use super::{RecordKey, StorageConfig, StoredRecord};
use crate::catalog::ModelDef;
use crate::error::Error;
use crate::query::{Query, Repository};
use crate::record::{Document, Record, RecordId, RECORD_ID_SIZE};
use crate::value::Value;

/// Tree name for record data.
const RECORDS_TREE: &str = "records";

/// Record store wrapping sled.
///
/// Saves overwrite in place; there is no versioning and no transaction
/// spanning a uniqueness check and the following save.
pub struct StorageEngine {
    /// The underlying sled database.
    db: Db,

    /// Tree for record data (`model\0id -> StoredRecord`).
    records: Tree,
}

impl StorageEngine {
    /// Open or create a storage engine with the given configuration.
    pub fn open(config: StorageConfig) -> Result<Self, Error> {
        let db = config.to_sled_config().open()?;
        let records = db.open_tree(RECORDS_TREE)?;

        info!(
            path = %config.path.display(),
            temporary = config.temporary,
            recovered = db.was_recovered(),
            "record store opened"
        );

        Ok(Self { db, records })
    }

    /// Persist a record.
    ///
    /// A record without an id is assigned a fresh one; a record that already
    /// has an id is overwritten. No validation is performed here.
    pub fn save(&self, document: &mut Document) -> Result<RecordId, Error> {
        let id = match document.id() {
            Some(id) => id,
            None => Self::generate_id(),
        };
        let key = RecordKey::new(&document.model().name, id);
        let stored = StoredRecord::from_attributes(document.attributes())?;

        self.records.insert(key.encode(), stored.to_bytes()?)?;
        document.set_id(id);

        trace!(model = %key.model, id = %id, "record saved");
        Ok(id)
    }

    /// Load a record by id.
    pub fn find(&self, model: &Arc<ModelDef>, id: RecordId) -> Result<Option<Document>, Error> {
        let key = RecordKey::new(&model.name, id);
        match self.records.get(key.encode())? {
            Some(bytes) => {
                let attributes = StoredRecord::from_bytes(&bytes)?.attributes()?;
                Ok(Some(Document::from_stored(
                    Arc::clone(model),
                    id,
                    attributes,
                )))
            }
            None => Ok(None),
        }
    }

    /// Delete a record. Returns whether it existed.
    pub fn destroy(&self, model: &str, id: RecordId) -> Result<bool, Error> {
        let key = RecordKey::new(model, id);
        Ok(self.records.remove(key.encode())?.is_some())
    }

    /// Scan every record of a model.
    ///
    /// Yields `(id, attributes)` pairs in id order.
    pub fn scan_model(
        &self,
        model: &str,
    ) -> impl Iterator<Item = Result<(RecordId, BTreeMap<String, Value>), Error>> + '_ {
        let model = model.to_string();
        self.records
            .scan_prefix(RecordKey::model_prefix(&model))
            .filter_map(move |entry| Self::decode_entry(&model, entry).transpose())
    }

    /// Number of stored records of a model.
    pub fn count(&self, model: &str) -> Result<usize, Error> {
        let prefix = RecordKey::model_prefix(model);
        let mut count = 0;
        for key in self.records.scan_prefix(&prefix).keys() {
            if Self::decode_key(model, &key?)?.is_some() {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Decode a key found under `model`'s prefix.
    ///
    /// A model whose name continues past a NUL byte shares the prefix; its
    /// keys decode to another model name and yield `None`.
    fn decode_key(model: &str, key: &[u8]) -> Result<Option<RecordId>, Error> {
        let key = RecordKey::decode(key).ok_or(Error::InvalidKey)?;
        Ok((key.model == model).then_some(key.id))
    }

    fn decode_entry(
        model: &str,
        entry: sled::Result<(IVec, IVec)>,
    ) -> Result<Option<(RecordId, BTreeMap<String, Value>)>, Error> {
        let (key, value) = entry?;
        match Self::decode_key(model, &key)? {
            Some(id) => {
                let attributes = StoredRecord::from_bytes(&value)?.attributes()?;
                Ok(Some((id, attributes)))
            }
            None => Ok(None),
        }
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<(), Error> {
        self.db.flush()?;
        Ok(())
    }

    /// Generate a new record id (UUID v4 layout).
    pub fn generate_id() -> RecordId {
        use std::sync::atomic::{AtomicU64, Ordering};
        use std::time::{SystemTime, UNIX_EPOCH};

        // Counter to ensure uniqueness even with same timestamp
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        let counter = COUNTER.fetch_add(1, Ordering::SeqCst);

        let mut id = [0u8; RECORD_ID_SIZE];
        id[..8].copy_from_slice(&now.to_le_bytes());
        id[8..].copy_from_slice(&counter.to_le_bytes());

        id[6] = (id[6] & 0x0f) | 0x40;
        id[8] = (id[8] & 0x3f) | 0x80;

        RecordId::from_bytes(id)
    }
}

impl Repository for StorageEngine {
    fn first(&self, query: &Query) -> Result<Option<RecordId>, Error> {
        let mut scanned = 0usize;
        for result in self.scan_model(query.model()) {
            let (id, attributes) = result?;
            scanned += 1;
            if query.accepts(id, |attr| attributes.get(attr)) {
                trace!(model = query.model(), scanned, id = %id, "query matched");
                return Ok(Some(id));
            }
        }
        trace!(model = query.model(), scanned, "query matched nothing");
        Ok(None)
    }
}
