use alloc::string::ToString;
use alloc::vec::Vec;

use super::{Attribute, Attributes, OpDesc};
use crate::ValidationError;

/// An input or output slot of an operator.
#[derive(new, Debug, Clone, PartialEq)]
pub struct SlotSchema {
    /// The slot name.
    pub name: &'static str,
    /// What the slot holds.
    pub comment: &'static str,
    /// Whether several variables can be bound to the slot.
    pub duplicable: bool,
}

/// An attribute of an operator.
#[derive(new, Debug, Clone, PartialEq)]
pub struct AttrSchema {
    /// The attribute name.
    pub name: &'static str,
    /// What the attribute controls.
    pub comment: &'static str,
    /// The value used when the attribute isn't set.
    pub default: Attribute,
}

/// The declaration of an operator: its slots and its attributes.
///
/// Descriptions are checked against the schema when an [operator](super::Operator) is created.
#[derive(Debug, Clone, PartialEq)]
pub struct OpSchema {
    /// The operator type.
    pub op_type: &'static str,
    /// What the operator does.
    pub comment: &'static str,
    /// The input slots.
    pub inputs: Vec<SlotSchema>,
    /// The output slots.
    pub outputs: Vec<SlotSchema>,
    /// The attributes.
    pub attrs: Vec<AttrSchema>,
}

impl OpSchema {
    /// Creates a schema without any slot or attribute.
    pub fn new(op_type: &'static str, comment: &'static str) -> Self {
        Self {
            op_type,
            comment,
            inputs: Vec::new(),
            outputs: Vec::new(),
            attrs: Vec::new(),
        }
    }

    /// Declares an input slot.
    pub fn input(mut self, name: &'static str, comment: &'static str, duplicable: bool) -> Self {
        self.inputs.push(SlotSchema::new(name, comment, duplicable));
        self
    }

    /// Declares an output slot.
    pub fn output(mut self, name: &'static str, comment: &'static str, duplicable: bool) -> Self {
        self.outputs.push(SlotSchema::new(name, comment, duplicable));
        self
    }

    /// Declares an attribute.
    pub fn attr(mut self, name: &'static str, comment: &'static str, default: Attribute) -> Self {
        self.attrs.push(AttrSchema::new(name, comment, default));
        self
    }

    /// Checks that a description binds every declared slot.
    pub fn validate(&self, desc: &OpDesc) -> Result<(), ValidationError> {
        if desc.op_type != self.op_type {
            return Err(ValidationError::UnexpectedOpType {
                expected: self.op_type.to_string(),
                actual: desc.op_type.clone(),
            });
        }

        for slot in self.inputs.iter() {
            let vars = desc.input(slot.name);
            if vars.is_empty() {
                return Err(ValidationError::MissingInput {
                    op_type: self.op_type.to_string(),
                    name: slot.name.to_string(),
                });
            }
            slot.check_arity(vars.len())?;
        }

        for slot in self.outputs.iter() {
            let vars = desc.output(slot.name);
            if vars.is_empty() {
                return Err(ValidationError::MissingOutput {
                    op_type: self.op_type.to_string(),
                    name: slot.name.to_string(),
                });
            }
            slot.check_arity(vars.len())?;
        }

        Ok(())
    }

    /// Returns the attributes with the defaults of the missing ones.
    pub fn with_defaults(&self, attrs: &Attributes) -> Attributes {
        let mut attrs = attrs.clone();

        for attr in self.attrs.iter() {
            if !attrs.contains(attr.name) {
                attrs.insert(attr.name, attr.default.clone());
            }
        }

        attrs
    }
}

impl SlotSchema {
    fn check_arity(&self, count: usize) -> Result<(), ValidationError> {
        if !self.duplicable && count > 1 {
            return Err(ValidationError::NotDuplicable {
                name: self.name.to_string(),
                count,
            });
        }

        Ok(())
    }
}
