//! Attribute definitions for models.

use std::fmt;

use crate::value::Value;

/// Kind of value an attribute holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeType {
    /// Boolean value.
    Bool,
    /// 64-bit signed integer.
    Int,
    /// 64-bit floating point.
    Float,
    /// UTF-8 string.
    String,
}

impl AttributeType {
    /// Check whether a value may be stored in an attribute of this type.
    ///
    /// `Null` is accepted by every type; an `Int` is accepted by `Float`.
    /// NaN and infinite floats are never accepted since they cannot be stored.
    pub fn accepts(&self, value: &Value) -> bool {
        value.is_storable()
            && matches!(
                (self, value),
                (_, Value::Null)
                    | (AttributeType::Bool, Value::Bool(_))
                    | (AttributeType::Int, Value::Int(_))
                    | (AttributeType::Float, Value::Float(_))
                    | (AttributeType::Float, Value::Int(_))
                    | (AttributeType::String, Value::String(_))
            )
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AttributeType::Bool => "bool",
            AttributeType::Int => "int",
            AttributeType::Float => "float",
            AttributeType::String => "string",
        };
        f.write_str(name)
    }
}

/// A named, typed attribute on a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDef {
    /// Attribute name.
    pub name: String,
    /// Attribute type.
    pub attribute_type: AttributeType,
}

impl AttributeDef {
    /// Create a new attribute definition.
    pub fn new(name: impl Into<String>, attribute_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attribute_type,
        }
    }

    /// Create a string attribute.
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, AttributeType::String)
    }

    /// Create a boolean attribute.
    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, AttributeType::Bool)
    }

    /// Create an integer attribute.
    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, AttributeType::Int)
    }

    /// Create a float attribute.
    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, AttributeType::Float)
    }
}
