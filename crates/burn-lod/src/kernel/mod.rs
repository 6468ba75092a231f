mod concat;
mod scatter;

pub use concat::*;
pub use scatter::*;

use alloc::borrow::Cow;
use alloc::format;
use alloc::vec::Vec;

use crate::{
    Element, Lod, LodMerger, LodTensor, MergedLod, OpError, SequenceConcatConfig, Shape,
    ValidationError,
};

/// Concatenates sequences, joining them along `config.axis` at `config.level`.
///
/// The returned tensor carries the merged LoD, which is what the
/// [backward pass](sequence_concat_backward) expects on the output gradient.
pub fn sequence_concat<E: Element>(
    inputs: &[&LodTensor<E>],
    config: &SequenceConcatConfig,
) -> Result<LodTensor<E>, OpError> {
    let merged = merge(inputs, config)?;
    let sources: Vec<Cow<'_, [E]>> = inputs.iter().map(|input| input.as_contiguous()).collect();
    let sources: Vec<&[E]> = sources.iter().map(|source| source.as_ref()).collect();

    let values = ConcatExecutor::execute(&merged.plan, &sources)?;

    LodTensor::from_vec(values, merged.shape, merged.lod)
}

/// Scatters the gradient of the concatenated output back to each input.
///
/// The copy plan is recomputed from the forward inputs. Each returned gradient has the shape and
/// the LoD of its input.
pub fn sequence_concat_backward<E: Element>(
    inputs: &[&LodTensor<E>],
    grad: &LodTensor<E>,
    config: &SequenceConcatConfig,
) -> Result<Vec<LodTensor<E>>, OpError> {
    let merged = merge(inputs, config)?;

    if grad.shape() != merged.shape {
        return Err(ValidationError::PlanMismatch(format!(
            "the output gradient has shape {:?}, expected {:?}",
            grad.shape().dims,
            merged.shape.dims
        ))
        .into());
    }

    if !grad.lod.is_empty() && grad.lod != merged.lod {
        return Err(ValidationError::PlanMismatch(format!(
            "the output gradient has LoD {}, expected {}",
            grad.lod, merged.lod
        ))
        .into());
    }

    let values = GradScatterExecutor::execute(&merged.plan, &grad.as_contiguous())?;

    values
        .into_iter()
        .zip(inputs)
        .map(|(values, input)| LodTensor::from_vec(values, input.shape(), input.lod.clone()))
        .collect()
}

fn merge<E: Element>(
    inputs: &[&LodTensor<E>],
    config: &SequenceConcatConfig,
) -> Result<MergedLod, ValidationError> {
    let lods: Vec<&Lod> = inputs.iter().map(|input| &input.lod).collect();
    let shapes: Vec<Shape> = inputs.iter().map(|input| input.shape()).collect();

    LodMerger::merge(&lods, &shapes, config)
}

/// Allocates a buffer filled with the default element value, reporting allocation failures.
fn zeroed<E: Element>(num_elements: usize) -> Result<Vec<E>, OpError> {
    let mut buffer = Vec::new();
    buffer.try_reserve_exact(num_elements)?;
    buffer.resize(num_elements, E::default());

    Ok(buffer)
}
