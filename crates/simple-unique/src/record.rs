//! Records and their validation errors.
//!
//! [`Record`] is the interface validators read from: attribute values, the
//! persisted identity, and the error sink. [`Document`] is the map-backed
//! implementation the storage engine loads and saves.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::catalog::ModelDef;
use crate::error::Error;
use crate::value::Value;

/// Size of a record identifier in bytes.
pub const RECORD_ID_SIZE: usize = 16;

/// Identity assigned to a record when it is first saved.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId([u8; RECORD_ID_SIZE]);

impl RecordId {
    /// Wrap raw id bytes.
    pub fn from_bytes(bytes: [u8; RECORD_ID_SIZE]) -> Self {
        Self(bytes)
    }

    /// Decode an id from a byte slice of exactly [`RECORD_ID_SIZE`] bytes.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let bytes: [u8; RECORD_ID_SIZE] = bytes.try_into().ok()?;
        Some(Self(bytes))
    }

    /// Parse the lowercase hex form produced by `Display`.
    pub fn from_hex(s: &str) -> Result<Self, Error> {
        let bytes = hex::decode(s).map_err(|e| Error::Deserialization(e.to_string()))?;
        Self::from_slice(&bytes)
            .ok_or_else(|| Error::Deserialization(format!("invalid record id: {}", s)))
    }

    /// Raw id bytes.
    pub fn as_bytes(&self) -> &[u8; RECORD_ID_SIZE] {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", self)
    }
}

/// Validation messages keyed by attribute name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Errors {
    messages: BTreeMap<String, Vec<String>>,
}

impl Errors {
    /// Create an empty error collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message for an attribute.
    pub fn add(&mut self, attribute: impl Into<String>, message: impl Into<String>) {
        self.messages
            .entry(attribute.into())
            .or_default()
            .push(message.into());
    }

    /// Messages recorded for an attribute, empty if there are none.
    pub fn get(&self, attribute: &str) -> &[String] {
        self.messages
            .get(attribute)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether any attribute has messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Total number of messages.
    pub fn len(&self) -> usize {
        self.messages.values().map(Vec::len).sum()
    }

    /// Remove all messages.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Iterate over `(attribute, messages)` pairs in attribute order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.messages
            .iter()
            .map(|(attr, msgs)| (attr.as_str(), msgs.as_slice()))
    }

    /// Render every message as `"attribute message"`.
    pub fn full_messages(&self) -> Vec<String> {
        self.iter()
            .flat_map(|(attr, msgs)| msgs.iter().map(move |m| format!("{} {}", attr, m)))
            .collect()
    }
}

/// A record that validators can inspect.
pub trait Record {
    /// The model this record belongs to.
    fn model(&self) -> &ModelDef;

    /// Identity of the record, `None` until it has been saved.
    fn id(&self) -> Option<RecordId>;

    /// Read an attribute value. Declared but unset attributes read as `Null`.
    ///
    /// Fails with [`Error::UnknownAttribute`] for names the model does not
    /// declare.
    fn attribute(&self, name: &str) -> Result<Value, Error>;

    /// Validation errors gathered so far.
    fn errors(&self) -> &Errors;

    /// Mutable access to the error sink.
    fn errors_mut(&mut self) -> &mut Errors;

    /// Whether the record has been saved.
    fn is_persisted(&self) -> bool {
        self.id().is_some()
    }
}

/// A record backed by an attribute map.
#[derive(Debug, Clone)]
pub struct Document {
    model: Arc<ModelDef>,
    id: Option<RecordId>,
    attributes: BTreeMap<String, Value>,
    errors: Errors,
}

impl Document {
    /// Create a new, unsaved record of the given model.
    pub fn new(model: Arc<ModelDef>) -> Self {
        Self {
            model,
            id: None,
            attributes: BTreeMap::new(),
            errors: Errors::new(),
        }
    }

    /// Rebuild a saved record from stored attributes.
    pub(crate) fn from_stored(
        model: Arc<ModelDef>,
        id: RecordId,
        attributes: BTreeMap<String, Value>,
    ) -> Self {
        Self {
            model,
            id: Some(id),
            attributes,
            errors: Errors::new(),
        }
    }

    /// Set an attribute, builder style.
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Result<Self, Error> {
        self.set(name, value)?;
        Ok(self)
    }

    /// Set an attribute.
    ///
    /// The attribute must be declared on the model and accept the value's kind.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), Error> {
        let value = value.into();
        let def = self.model.require_attribute(name)?;
        if !def.attribute_type.accepts(&value) {
            return Err(Error::TypeMismatch {
                model: self.model.name.clone(),
                attribute: name.to_string(),
                expected: def.attribute_type,
                found: value.kind(),
            });
        }
        if value.is_null() {
            self.attributes.remove(name);
        } else {
            self.attributes.insert(name.to_string(), value);
        }
        Ok(())
    }

    /// Shared handle to the model definition.
    pub fn model_def(&self) -> &Arc<ModelDef> {
        &self.model
    }

    /// The explicitly set attributes.
    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    pub(crate) fn set_id(&mut self, id: RecordId) {
        self.id = Some(id);
    }
}

impl Record for Document {
    fn model(&self) -> &ModelDef {
        &self.model
    }

    fn id(&self) -> Option<RecordId> {
        self.id
    }

    fn attribute(&self, name: &str) -> Result<Value, Error> {
        self.model.require_attribute(name)?;
        Ok(self.attributes.get(name).cloned().unwrap_or(Value::Null))
    }

    fn errors(&self) -> &Errors {
        &self.errors
    }

    fn errors_mut(&mut self) -> &mut Errors {
        &mut self.errors
    }
}
