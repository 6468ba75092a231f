use alloc::format;
use alloc::vec::Vec;
use core::ops::Range;

use super::zeroed;
use crate::plan::split_disjoint;
use crate::{CopyPlan, CopySpan, Element, OpError, ValidationError};

/// Copies the inputs into the output buffer following a [copy plan](CopyPlan).
///
/// Every output element is written exactly once. Spans are written concurrently since they never
/// overlap.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConcatExecutor;

impl ConcatExecutor {
    /// Returns the row-major values of the output.
    ///
    /// `sources` are the row-major values of the inputs, in the order used to build the plan.
    pub fn execute<E: Element>(plan: &CopyPlan, sources: &[&[E]]) -> Result<Vec<E>, OpError> {
        plan.validate()?;

        if sources.len() != plan.num_inputs() {
            return Err(ValidationError::PlanMismatch(format!(
                "got {} inputs, expected {}",
                sources.len(),
                plan.num_inputs()
            ))
            .into());
        }

        for (input, source) in sources.iter().enumerate() {
            if source.len() != plan.input_elements(input) {
                return Err(ValidationError::PlanMismatch(format!(
                    "input {input} has {} elements, expected {}",
                    source.len(),
                    plan.input_elements(input)
                ))
                .into());
            }
        }

        let mut output = zeroed::<E>(plan.output_elements())?;
        let mut spans: Vec<(Range<usize>, CopySpan)> = plan
            .spans()
            .map(|span| (span.destination.clone(), span))
            .collect();
        spans.sort_by_key(|(range, _)| range.start);

        log::trace!(
            "Concatenating {} inputs into {} elements with {} spans",
            sources.len(),
            output.len(),
            spans.len()
        );

        let parts = split_disjoint(output.as_mut_slice(), spans)?;

        run_par!(|| {
            iter_par!(parts).for_each(|(destination, span)| {
                destination.copy_from_slice(&sources[span.input][span.source]);
            })
        });

        Ok(output)
    }
}
