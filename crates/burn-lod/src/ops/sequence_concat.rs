use alloc::string::{String, ToString};
use alloc::vec::Vec;

use super::{
    grad_var_name, Attribute, Attributes, OpDesc, OpKernel, OpSchema, Scope, ShapeMap,
};
use crate::kernel::{sequence_concat, sequence_concat_backward};
use crate::{
    concat_shape, Element, LodTensor, OpError, SequenceConcatConfig, Shape, ValidationError,
    AXIS_ATTR, LEVEL_ATTR,
};

/// Type of the sequence concatenation operator.
pub const SEQUENCE_CONCAT: &str = "sequence_concat";
/// Type of the gradient operator of the sequence concatenation.
pub const SEQUENCE_CONCAT_GRAD: &str = "sequence_concat_grad";

const X: &str = "X";
const OUT: &str = "Out";
const X_GRAD: &str = "X@GRAD";
const OUT_GRAD: &str = "Out@GRAD";

/// Concatenates LoD tensors, keeping their sequences aligned.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequenceConcat;

/// Splits the gradient of a sequence concatenation back to its inputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequenceConcatGrad;

impl SequenceConcat {
    /// Builds the description of the gradient operator of a forward sequence concatenation.
    ///
    /// The gradient operator reads the forward inputs and the gradient of the output, and writes
    /// one gradient per forward input.
    pub fn grad_desc(forward: &OpDesc) -> OpDesc {
        let out_grads = forward.output(OUT).iter().map(|name| grad_var_name(name));
        let x_grads = forward.input(X).iter().map(|name| grad_var_name(name));

        OpDesc {
            attrs: forward.attrs.clone(),
            ..OpDesc::new(SEQUENCE_CONCAT_GRAD)
        }
        .with_input(X, forward.input(X).iter().cloned())
        .with_input(OUT_GRAD, out_grads)
        .with_output(X_GRAD, x_grads)
    }
}

fn attrs(schema: OpSchema) -> OpSchema {
    schema
        .attr(
            AXIS_ATTR,
            "The axis along which the inputs will be joined. If axis is 0, the inputs will be \
             joined with the LoD index.",
            Attribute::Int(0),
        )
        .attr(
            LEVEL_ATTR,
            "The LoD level at which the inputs will be joined. If level is 0, the inputs will be \
             joined at the nested sequence level, if level is 1 at the sequence level.",
            Attribute::Int(0),
        )
}

fn check_attributes(attrs: &Attributes) -> Result<(), ValidationError> {
    SequenceConcatConfig::from_attributes(attrs).map(|_| ())
}

fn input_shapes(names: &[String], shapes: &ShapeMap) -> Result<Vec<Shape>, ValidationError> {
    names
        .iter()
        .map(|name| {
            shapes
                .get(name)
                .cloned()
                .ok_or_else(|| ValidationError::MissingVariable(name.clone()))
        })
        .collect()
}

fn input_tensors<'a, E: Element>(
    names: &[String],
    scope: &'a Scope<E>,
) -> Result<Vec<&'a LodTensor<E>>, ValidationError> {
    names.iter().map(|name| scope.get(name)).collect()
}

fn first_output<'a>(desc: &'a OpDesc, slot: &str) -> Result<&'a String, ValidationError> {
    desc.output(slot)
        .first()
        .ok_or_else(|| ValidationError::MissingOutput {
            op_type: desc.op_type.clone(),
            name: slot.to_string(),
        })
}

fn first_input<'a>(desc: &'a OpDesc, slot: &str) -> Result<&'a String, ValidationError> {
    desc.input(slot)
        .first()
        .ok_or_else(|| ValidationError::MissingInput {
            op_type: desc.op_type.clone(),
            name: slot.to_string(),
        })
}

fn grad_outputs<'a>(desc: &'a OpDesc, inputs: usize) -> Result<&'a [String], ValidationError> {
    let outputs = desc.output(X_GRAD);

    if outputs.len() != inputs {
        return Err(ValidationError::ArityMismatch {
            name: X_GRAD.to_string(),
            expected: inputs,
            actual: outputs.len(),
        });
    }

    Ok(outputs)
}

impl<E: Element> OpKernel<E> for SequenceConcat {
    fn schema(&self) -> OpSchema {
        let schema = OpSchema::new(
            SEQUENCE_CONCAT,
            "Concatenates LoD tensors along an axis. The LoD of the output is built by joining \
             the sequences of the inputs at the given level.",
        )
        .input(X, "The LoD tensors to concatenate.", true)
        .output(OUT, "The concatenated LoD tensor.", false);

        attrs(schema)
    }

    fn check_attributes(&self, attrs: &Attributes) -> Result<(), ValidationError> {
        check_attributes(attrs)
    }

    fn infer_shape(&self, desc: &OpDesc, shapes: &ShapeMap) -> Result<ShapeMap, OpError> {
        let config = SequenceConcatConfig::from_attributes(&desc.attrs)?;
        let inputs = input_shapes(desc.input(X), shapes)?;
        let shape = concat_shape(&inputs, config.axis)?;

        let mut outputs = ShapeMap::new();
        outputs.insert(first_output(desc, OUT)?.clone(), shape);

        Ok(outputs)
    }

    fn compute(&self, desc: &OpDesc, scope: &mut Scope<E>) -> Result<(), OpError> {
        let config = SequenceConcatConfig::from_attributes(&desc.attrs)?;
        let name = first_output(desc, OUT)?.clone();

        let output = {
            let inputs = input_tensors(desc.input(X), scope)?;
            sequence_concat(&inputs, &config)?
        };

        scope.insert(name, output);

        Ok(())
    }
}

impl<E: Element> OpKernel<E> for SequenceConcatGrad {
    fn schema(&self) -> OpSchema {
        let schema = OpSchema::new(
            SEQUENCE_CONCAT_GRAD,
            "Splits the gradient of a sequence concatenation into the gradients of its inputs.",
        )
        .input(X, "The inputs of the forward concatenation.", true)
        .input(OUT_GRAD, "The gradient of the concatenated output.", false)
        .output(X_GRAD, "The gradients of the inputs.", true);

        attrs(schema)
    }

    fn check_attributes(&self, attrs: &Attributes) -> Result<(), ValidationError> {
        check_attributes(attrs)
    }

    fn infer_shape(&self, desc: &OpDesc, shapes: &ShapeMap) -> Result<ShapeMap, OpError> {
        SequenceConcatConfig::from_attributes(&desc.attrs)?;

        let inputs = input_shapes(desc.input(X), shapes)?;
        let outputs = grad_outputs(desc, inputs.len())?;

        Ok(outputs.iter().cloned().zip(inputs).collect())
    }

    fn compute(&self, desc: &OpDesc, scope: &mut Scope<E>) -> Result<(), OpError> {
        let config = SequenceConcatConfig::from_attributes(&desc.attrs)?;
        let names = grad_outputs(desc, desc.input(X).len())?;

        let grads = {
            let inputs = input_tensors(desc.input(X), scope)?;
            let grad = scope.get(first_input(desc, OUT_GRAD)?)?;
            sequence_concat_backward(&inputs, grad, &config)?
        };

        for (name, grad) in names.iter().zip(grads) {
            scope.insert(name.clone(), grad);
        }

        Ok(())
    }
}
