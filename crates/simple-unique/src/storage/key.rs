//! Record key encoding.

use std::fmt;

use crate::record::{RecordId, RECORD_ID_SIZE};

/// Separator between the model name and the record id.
const SEPARATOR: u8 = 0;

/// Key of a stored record.
///
/// Key format: `[model name][0x00][record id (16 bytes)]`
///
/// All records of one model share the `model\0` prefix. A model whose name
/// itself contains a NUL can share that prefix too, so scans decode each key
/// and compare the model name.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    /// Model name.
    pub model: String,
    /// Record identifier.
    pub id: RecordId,
}

impl RecordKey {
    /// Create a new record key.
    pub fn new(model: impl Into<String>, id: RecordId) -> Self {
        Self {
            model: model.into(),
            id,
        }
    }

    /// Encode the key to bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Self::model_prefix(&self.model);
        buf.extend_from_slice(self.id.as_bytes());
        buf
    }

    /// Decode a key from bytes.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < RECORD_ID_SIZE + 1 {
            return None;
        }
        let split = bytes.len() - RECORD_ID_SIZE;
        let (head, id) = bytes.split_at(split);
        let (model, sep) = head.split_at(head.len() - 1);
        if sep != [SEPARATOR] {
            return None;
        }
        let model = std::str::from_utf8(model).ok()?;
        Some(Self {
            model: model.to_string(),
            id: RecordId::from_slice(id)?,
        })
    }

    /// Prefix shared by every record of a model.
    pub fn model_prefix(model: &str) -> Vec<u8> {
        let mut prefix = Vec::with_capacity(model.len() + 1 + RECORD_ID_SIZE);
        prefix.extend_from_slice(model.as_bytes());
        prefix.push(SEPARATOR);
        prefix
    }
}

impl fmt::Debug for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordKey")
            .field("model", &self.model)
            .field("id", &self.id.to_string())
            .finish()
    }
}
