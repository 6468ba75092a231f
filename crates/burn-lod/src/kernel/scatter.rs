use alloc::format;
use alloc::vec::Vec;
use core::ops::Range;

use super::zeroed;
use crate::plan::split_disjoint;
use crate::{CopyPlan, CopySpan, Element, OpError, ValidationError};

/// Scatters the output gradient back to the inputs following the forward [copy plan](CopyPlan).
///
/// The plan is an exact partition of the output, so each gradient element is copied to a single
/// input and nothing has to be accumulated.
#[derive(Debug, Clone, Copy, Default)]
pub struct GradScatterExecutor;

impl GradScatterExecutor {
    /// Returns the row-major gradient of every input.
    pub fn execute<E: Element>(plan: &CopyPlan, grad: &[E]) -> Result<Vec<Vec<E>>, OpError> {
        plan.validate()?;

        if grad.len() != plan.output_elements() {
            return Err(ValidationError::PlanMismatch(format!(
                "the output gradient has {} elements, expected {}",
                grad.len(),
                plan.output_elements()
            ))
            .into());
        }

        let mut grads = (0..plan.num_inputs())
            .map(|input| zeroed::<E>(plan.input_elements(input)))
            .collect::<Result<Vec<_>, _>>()?;

        let mut spans: Vec<Vec<(Range<usize>, CopySpan)>> = alloc::vec![Vec::new(); grads.len()];
        for span in plan.spans() {
            let input = span.input;
            spans[input].push((span.source.clone(), span));
        }

        log::trace!(
            "Scattering {} gradient elements into {} inputs",
            grad.len(),
            grads.len()
        );

        let mut parts = Vec::new();
        for (buffer, mut spans) in grads.iter_mut().zip(spans) {
            spans.sort_by_key(|(range, _)| range.start);
            parts.extend(split_disjoint(buffer.as_mut_slice(), spans)?);
        }

        run_par!(|| {
            iter_par!(parts).for_each(|(destination, span)| {
                destination.copy_from_slice(&grad[span.destination]);
            })
        });

        Ok(grads)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CopyEntry, PlanLayout, Shape};
    use alloc::vec;
    use rstest::rstest;

    #[test]
    fn should_scatter_rows_back_to_inputs() {
        let shapes = [Shape::new([2, 2]), Shape::new([1, 2])];
        let output = Shape::new([3, 2]);
        let plan = CopyPlan::new(
            vec![
                CopyEntry::new(0, 0..1, 0..1),
                CopyEntry::new(1, 0..1, 1..2),
                CopyEntry::new(0, 1..2, 2..3),
            ],
            PlanLayout::new(&shapes, 0),
            &shapes,
            &output,
        );
        let grad = [1.0, 2.0, 5.0, 6.0, 3.0, 4.0];

        let grads = GradScatterExecutor::execute(&plan, &grad).unwrap();

        assert_eq!(grads, vec![vec![1.0, 2.0, 3.0, 4.0], vec![5.0, 6.0]]);
    }

    #[test]
    fn should_scatter_features_back_to_inputs() {
        let shapes = [Shape::new([2, 1]), Shape::new([2, 2])];
        let output = Shape::new([2, 3]);
        let plan = CopyPlan::new(
            vec![CopyEntry::new(0, 0..2, 0..2), CopyEntry::new(1, 0..2, 0..2)],
            PlanLayout::new(&shapes, 1),
            &shapes,
            &output,
        );
        let grad = [1, 10, 11, 2, 20, 21];

        let grads = GradScatterExecutor::execute(&plan, &grad).unwrap();

        assert_eq!(grads, vec![vec![1, 2], vec![10, 11, 20, 21]]);
    }

    #[test]
    fn should_reject_gradient_not_matching_plan() {
        let shapes = [Shape::new([2, 2])];
        let plan = CopyPlan::new(
            vec![CopyEntry::new(0, 0..2, 0..2)],
            PlanLayout::new(&shapes, 0),
            &shapes,
            &shapes[0],
        );

        let error = GradScatterExecutor::execute(&plan, &[0.0f32; 3]).unwrap_err();

        assert!(error.is_validation());
    }

    #[rstest]
    #[case::rows_past_output(CopyEntry::new(0, 0..2, 1..3))]
    #[case::unknown_input(CopyEntry::new(1, 0..2, 0..2))]
    fn should_reject_entry_out_of_bounds(#[case] entry: CopyEntry) {
        let shapes = [Shape::new([2, 2])];
        let layout = PlanLayout::new(&shapes, 0);
        let plan = CopyPlan::new(vec![entry], layout, &shapes, &shapes[0]);

        let error = GradScatterExecutor::execute(&plan, &[0.0f32; 4]).unwrap_err();

        assert!(matches!(error, OpError::Validation(ValidationError::PlanMismatch(_))));
    }
}
