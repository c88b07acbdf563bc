//! Stored record envelope.

use std::collections::BTreeMap;

use rkyv::{Archive, Deserialize, Serialize};

use crate::error::Error;
use crate::value::Value;

/// A record as written to the `records` tree.
///
/// `data` holds the JSON-encoded attribute map; the envelope itself is
/// encoded with rkyv.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Serialized attribute map.
    pub data: Vec<u8>,

    /// Write timestamp in microseconds since Unix epoch.
    pub written_at: u64,
}

impl StoredRecord {
    /// Encode an attribute map into a new envelope stamped with the current time.
    ///
    /// NaN and infinite floats have no JSON form and are refused rather than
    /// written as `null`.
    pub fn from_attributes(attributes: &BTreeMap<String, Value>) -> Result<Self, Error> {
        if let Some((name, _)) = attributes.iter().find(|(_, v)| !v.is_storable()) {
            return Err(Error::Serialization(format!(
                "attribute '{}' holds a non-finite float",
                name
            )));
        }
        let data =
            serde_json::to_vec(attributes).map_err(|e| Error::Serialization(e.to_string()))?;
        Ok(Self {
            data,
            written_at: current_timestamp(),
        })
    }

    /// Decode the attribute map.
    pub fn attributes(&self) -> Result<BTreeMap<String, Value>, Error> {
        serde_json::from_slice(&self.data).map_err(|e| Error::Deserialization(e.to_string()))
    }

    /// Serialize the envelope to bytes using rkyv.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map(|v| v.to_vec())
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize an envelope from bytes using rkyv.
    ///
    /// sled hands out buffers with no alignment guarantee, so the bytes are
    /// copied into an aligned buffer before validation.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let mut aligned = rkyv::util::AlignedVec::<16>::with_capacity(bytes.len());
        aligned.extend_from_slice(bytes);
        rkyv::from_bytes::<Self, rkyv::rancor::Error>(&aligned)
            .map_err(|e| Error::Deserialization(e.to_string()))
    }
}

/// Current timestamp in microseconds since Unix epoch.
pub(crate) fn current_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}
