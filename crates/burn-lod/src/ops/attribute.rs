use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// A typed operator attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Attribute {
    /// Integer attribute.
    Int(i64),
    /// Float attribute.
    Float(f32),
    /// String attribute.
    String(String),
    /// List of integers attribute.
    Ints(Vec<i64>),
}

impl Attribute {
    fn kind(&self) -> &'static str {
        match self {
            Attribute::Int(_) => "int",
            Attribute::Float(_) => "float",
            Attribute::String(_) => "string",
            Attribute::Ints(_) => "ints",
        }
    }
}

/// The attributes of an operator, by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes {
    values: HashMap<String, Attribute>,
}

impl Attributes {
    /// Sets an attribute, returning its previous value.
    pub fn insert<S: Into<String>>(&mut self, name: S, value: Attribute) -> Option<Attribute> {
        self.values.insert(name.into(), value)
    }

    /// Returns an attribute.
    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.values.get(name)
    }

    /// Whether the attribute is set.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no attribute is set.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns an integer attribute, or `default` when it isn't set.
    pub fn int_or(&self, name: &str, default: i64) -> Result<i64, ValidationError> {
        match self.values.get(name) {
            None => Ok(default),
            Some(Attribute::Int(value)) => Ok(*value),
            Some(other) => Err(ValidationError::InvalidAttribute {
                name: name.to_string(),
                reason: format!("expected an int, got {}", other.kind()),
            }),
        }
    }
}
