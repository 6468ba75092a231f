use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use super::{Attribute, Attributes};
use burn_core::config::{config_to_json, Config, ConfigError};

/// Suffix appended to a variable name to get the name of its gradient.
pub const GRAD_SUFFIX: &str = "@GRAD";

/// Returns the name of the gradient of a variable.
pub fn grad_var_name(name: &str) -> String {
    format!("{name}{GRAD_SUFFIX}")
}

/// Describes an operator instance in a graph: its type, the variables bound to its input and
/// output slots and its attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpDesc {
    /// The operator type, used to find its kernel.
    pub op_type: String,
    /// Variable names bound to each input slot.
    #[serde(default)]
    pub inputs: HashMap<String, Vec<String>>,
    /// Variable names bound to each output slot.
    #[serde(default)]
    pub outputs: HashMap<String, Vec<String>>,
    /// The attributes.
    #[serde(default)]
    pub attrs: Attributes,
}

impl OpDesc {
    /// Creates a description without any slot or attribute.
    pub fn new<S: Into<String>>(op_type: S) -> Self {
        Self {
            op_type: op_type.into(),
            ..Default::default()
        }
    }

    /// Binds variables to an input slot.
    pub fn with_input<S, I, V>(mut self, slot: S, vars: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.inputs
            .insert(slot.into(), vars.into_iter().map(Into::into).collect());
        self
    }

    /// Binds variables to an output slot.
    pub fn with_output<S, I, V>(mut self, slot: S, vars: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.outputs
            .insert(slot.into(), vars.into_iter().map(Into::into).collect());
        self
    }

    /// Sets an attribute.
    pub fn with_attr<S: Into<String>>(mut self, name: S, value: Attribute) -> Self {
        self.attrs.insert(name, value);
        self
    }

    /// Variables bound to an input slot, empty when the slot isn't bound.
    pub fn input(&self, slot: &str) -> &[String] {
        self.inputs.get(slot).map(Vec::as_slice).unwrap_or_default()
    }

    /// Variables bound to an output slot, empty when the slot isn't bound.
    pub fn output(&self, slot: &str) -> &[String] {
        self.outputs.get(slot).map(Vec::as_slice).unwrap_or_default()
    }

    /// Converts the description to a JSON string.
    pub fn to_json(&self) -> String {
        config_to_json(self)
    }

    /// Loads a description from a JSON string.
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        Self::load_binary(content.as_bytes())
    }
}

impl Config for OpDesc {}
