use alloc::format;
use alloc::string::ToString;
use alloc::vec;
use alloc::vec::Vec;

use crate::{
    concat_shape, CopyEntry, CopyPlan, Lod, PlanLayout, RowShape, SequenceConcatConfig, Shape,
    ValidationError, MAX_LOD_LEVELS,
};

/// The output of the LoD merge: the LoD and shape of the output and the plan to fill it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedLod {
    /// LoD of the output.
    pub lod: Lod,
    /// Shape of the output.
    pub shape: Shape,
    /// How the inputs are copied into the output.
    pub plan: CopyPlan,
}

/// Computes the LoD of concatenated sequences along with the copy plan producing their data.
///
/// When joining along a feature axis (`axis != 0`) every input must have the same LoD, which is
/// kept as is. When joining along time steps (`axis == 0`) segment `s` of the output at the join
/// level is segment `s` of the first input, followed by segment `s` of the second input and so on.
/// For example, joining at level 0:
///
/// ```text
/// x0:  {{0,2,4}, {0,1,2,3,4}}
/// x1:  {{0,3,5}, {0,1,2,3,5}}
/// out: {{0,5,9}, {0,1,2,3,4,5,6,7,9}}
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct LodMerger;

impl LodMerger {
    /// Merges the LoDs of tensors with the given shapes.
    ///
    /// Nothing is computed if any of the inputs is invalid.
    pub fn merge(
        lods: &[&Lod],
        shapes: &[Shape],
        config: &SequenceConcatConfig,
    ) -> Result<MergedLod, ValidationError> {
        if lods.len() != shapes.len() {
            return Err(ValidationError::PlanMismatch(format!(
                "got {} LoDs for {} shapes",
                lods.len(),
                shapes.len()
            )));
        }

        let shape = concat_shape(shapes, config.axis)?;
        let level = config.level.index();
        let num_levels = lods[0].num_levels();

        if num_levels == 0 {
            return Err(ValidationError::InvalidLod(
                "the inputs should be sequences or nested sequences, got a LoD without levels"
                    .to_string(),
            ));
        }

        for (index, lod) in lods.iter().enumerate().skip(1) {
            if lod.num_levels() != num_levels {
                return Err(ValidationError::LevelMismatch {
                    index,
                    expected: num_levels,
                    actual: lod.num_levels(),
                });
            }
        }

        if level >= num_levels {
            return Err(ValidationError::LevelOutOfRange { level, num_levels });
        }

        for (lod, shape) in lods.iter().zip(shapes) {
            lod.validate_rows(shape.rows())?;
        }

        let layout = PlanLayout::new(shapes, config.axis);
        let (lod, entries) = match config.axis {
            0 => Self::merge_time_steps(lods, level)?,
            _ => Self::merge_features(lods, level)?,
        };
        let plan = CopyPlan::new(entries, layout, shapes, &shape);

        log::debug!(
            "Merged {} sequences into LoD {lod} with {} copy entries",
            lods.len(),
            plan.entries().len()
        );

        Ok(MergedLod { lod, shape, plan })
    }

    fn merge_features(
        lods: &[&Lod],
        level: usize,
    ) -> Result<(Lod, Vec<CopyEntry>), ValidationError> {
        let lod = lods[0];

        for (index, other) in lods.iter().enumerate().skip(1) {
            if *other != lod {
                return Err(ValidationError::LodMismatch {
                    index,
                    reason: format!(
                        "inputs joined along a non-zero axis should have the same LoD, \
                         expected {lod} got {other}"
                    ),
                });
            }
        }

        let mut entries = Vec::with_capacity(lod.num_segments(level) * lods.len());

        for segment in lod.level(level).windows(2) {
            for input in 0..lods.len() {
                let rows = segment[0]..segment[1];
                if !rows.is_empty() {
                    entries.push(CopyEntry::new(input, rows.clone(), rows));
                }
            }
        }

        Ok((lod.clone(), entries))
    }

    fn merge_time_steps(
        lods: &[&Lod],
        level: usize,
    ) -> Result<(Lod, Vec<CopyEntry>), ValidationError> {
        let num_levels = lods[0].num_levels();
        let num_segments = lods[0].num_segments(level);

        for (index, lod) in lods.iter().enumerate().skip(1) {
            if lod.num_segments(level) != num_segments {
                return Err(ValidationError::SegmentCountMismatch {
                    index,
                    level,
                    expected: num_segments,
                    actual: lod.num_segments(level),
                });
            }
        }

        let joins: Vec<&[usize]> = lods.iter().map(|lod| lod.level(level)).collect();
        let joined: Vec<usize> = (0..=num_segments)
            .map(|segment| joins.iter().map(|join| join[segment]).sum())
            .collect();

        let mut levels: Vec<Vec<usize>> = Vec::with_capacity(num_levels);

        for coarse in 0..level {
            levels.push(Self::merge_coarse_level(lods, coarse, &joins, &joined)?);
        }

        levels.push(joined.clone());

        for fine in level + 1..num_levels {
            levels.push(Self::merge_fine_level(lods, fine, &joins));
        }

        let mut entries = Vec::with_capacity(num_segments * lods.len());
        let mut row = 0;

        for segment in 0..num_segments {
            for (input, join) in joins.iter().enumerate() {
                let source = join[segment]..join[segment + 1];
                let destination = row..row + source.len();
                row = destination.end;

                if !source.is_empty() {
                    entries.push(CopyEntry::new(input, source, destination));
                }
            }
        }

        debug_assert!(levels.len() <= MAX_LOD_LEVELS);

        Ok((Lod::from_levels(levels)?, entries))
    }

    /// Offsets of a level coarser than the join level.
    ///
    /// Each coarse offset must delimit the same join segment in every input; the output offset is
    /// then the joined offset of that segment.
    fn merge_coarse_level(
        lods: &[&Lod],
        coarse: usize,
        joins: &[&[usize]],
        joined: &[usize],
    ) -> Result<Vec<usize>, ValidationError> {
        let num_offsets = lods[0].level(coarse).len();

        for (index, lod) in lods.iter().enumerate().skip(1) {
            if lod.level(coarse).len() != num_offsets {
                return Err(ValidationError::SegmentCountMismatch {
                    index,
                    level: coarse,
                    expected: num_offsets.saturating_sub(1),
                    actual: lod.num_segments(coarse),
                });
            }
        }

        let mut offsets = Vec::with_capacity(num_offsets);

        for position in 0..num_offsets {
            // Empty segments make an offset appear several times, any matching index is valid.
            let candidates: Vec<(usize, usize)> = lods
                .iter()
                .zip(joins)
                .map(|(lod, join)| {
                    let offset = lod.level(coarse)[position];
                    let first = join.partition_point(|value| *value < offset);
                    let last = join.partition_point(|value| *value <= offset);
                    (first, last)
                })
                .collect();
            let segment = candidates
                .iter()
                .map(|(first, _)| *first)
                .max()
                .unwrap_or_default();

            if let Some(index) = candidates
                .iter()
                .position(|(first, last)| segment < *first || segment >= *last)
            {
                return Err(ValidationError::LodMismatch {
                    index,
                    reason: format!(
                        "offset {position} of level {coarse} doesn't delimit the same \
                         segments as in the other inputs"
                    ),
                });
            }

            offsets.push(joined[segment]);
        }

        Ok(offsets)
    }

    /// Offsets of a level finer than the join level.
    ///
    /// Within each output segment, the finer offsets of every input are shifted by the number of
    /// rows already written and appended in input order.
    fn merge_fine_level(lods: &[&Lod], fine: usize, joins: &[&[usize]]) -> Vec<usize> {
        let num_segments = joins[0].len().saturating_sub(1);
        let mut offsets = vec![0];
        let mut row = 0;

        for segment in 0..num_segments {
            let last_segment = segment + 1 == num_segments;

            for (lod, join) in lods.iter().zip(joins) {
                let level = lod.level(fine);
                let start = join[segment];
                let end = join[segment + 1];
                // Empty finer sequences on a boundary belong to the following segment, except
                // for the trailing ones.
                let first = level.partition_point(|value| *value < start);
                let last = match last_segment {
                    true => level.len() - 1,
                    false => level.partition_point(|value| *value < end),
                };

                offsets.extend(
                    level[first + 1..=last]
                        .iter()
                        .map(|offset| row + offset - start),
                );
                row += end - start;
            }
        }

        offsets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JoinLevel;

    fn lod(levels: &[&[usize]]) -> Lod {
        Lod::from_levels(levels.iter().copied()).unwrap()
    }

    #[test]
    fn should_keep_lod_when_joining_features() {
        let x0 = lod(&[&[0, 2, 4], &[0, 1, 2, 3, 4]]);
        let x1 = x0.clone();
        let config = SequenceConcatConfig::new()
            .with_axis(1)
            .with_level(JoinLevel::Inner);

        let merged = LodMerger::merge(
            &[&x0, &x1],
            &[Shape::new([4, 3, 4]), Shape::new([4, 4, 4])],
            &config,
        )
        .unwrap();

        assert_eq!(merged.lod, x0);
        assert_eq!(merged.shape, Shape::new([4, 7, 4]));
        // One entry per segment and per input.
        assert_eq!(merged.plan.entries().len(), 8);
        merged.plan.check_partition().unwrap();
    }

    #[test]
    fn should_interleave_inner_sequences_when_joining_outer_level() {
        let x0 = lod(&[&[0, 2, 4], &[0, 1, 2, 3, 4]]);
        let x1 = lod(&[&[0, 3, 5], &[0, 1, 2, 3, 5]]);

        let merged = LodMerger::merge(
            &[&x0, &x1],
            &[Shape::new([4, 3, 4]), Shape::new([5, 3, 4])],
            &SequenceConcatConfig::new(),
        )
        .unwrap();

        assert_eq!(merged.lod, lod(&[&[0, 5, 9], &[0, 1, 2, 3, 4, 5, 6, 7, 9]]));
        assert_eq!(
            merged.plan.entries(),
            &[
                CopyEntry::new(0, 0..2, 0..2),
                CopyEntry::new(1, 0..3, 2..5),
                CopyEntry::new(0, 2..4, 5..7),
                CopyEntry::new(1, 3..5, 7..9),
            ]
        );
    }

    #[test]
    fn should_sum_offsets_when_joining_inner_level() {
        let x0 = lod(&[&[0, 2, 4], &[0, 1, 2, 3, 4]]);
        let x1 = lod(&[&[0, 3, 5], &[0, 1, 3, 4, 5]]);
        let config = SequenceConcatConfig::new().with_level(JoinLevel::Inner);

        let merged = LodMerger::merge(
            &[&x0, &x1],
            &[Shape::new([4, 3, 4]), Shape::new([5, 3, 4])],
            &config,
        )
        .unwrap();

        assert_eq!(merged.lod, lod(&[&[0, 5, 9], &[0, 2, 5, 7, 9]]));
        assert_eq!(merged.plan.entries().len(), 8);
        merged.plan.check_partition().unwrap();
    }

    #[test]
    fn should_join_single_level_sequences() {
        let x0 = lod(&[&[0, 2, 3]]);
        let x1 = lod(&[&[0, 1, 4]]);

        let merged = LodMerger::merge(
            &[&x0, &x1],
            &[Shape::new([3, 2]), Shape::new([4, 2])],
            &SequenceConcatConfig::new(),
        )
        .unwrap();

        assert_eq!(merged.lod, lod(&[&[0, 3, 7]]));
        assert_eq!(merged.shape, Shape::new([7, 2]));
    }

    #[test]
    fn should_keep_empty_inner_sequences() {
        let x0 = lod(&[&[0, 1, 2], &[0, 0, 1, 2, 2]]);
        let x1 = lod(&[&[0, 2, 3], &[0, 2, 2, 3]]);

        let merged = LodMerger::merge(
            &[&x0, &x1],
            &[Shape::new([2, 1]), Shape::new([3, 1])],
            &SequenceConcatConfig::new(),
        )
        .unwrap();

        // Segment 0: x0 {0,0,1} then x1 {0,2}; segment 1: x0 {1,2,2} then x1 {2,2,3}.
        assert_eq!(merged.lod, lod(&[&[0, 3, 5], &[0, 0, 1, 3, 4, 4, 4, 5]]));
        merged.lod.validate_rows(5).unwrap();
        merged.plan.check_partition().unwrap();
    }

    #[test]
    fn should_reject_different_lods_when_joining_features() {
        let x0 = lod(&[&[0, 2, 4]]);
        let x1 = lod(&[&[0, 1, 4]]);

        let error = LodMerger::merge(
            &[&x0, &x1],
            &[Shape::new([4, 3]), Shape::new([4, 2])],
            &SequenceConcatConfig::new().with_axis(1),
        )
        .unwrap_err();

        assert!(matches!(error, ValidationError::LodMismatch { index: 1, .. }));
    }

    #[test]
    fn should_reject_level_not_present_in_inputs() {
        let x0 = lod(&[&[0, 2, 4]]);

        let error = LodMerger::merge(
            &[&x0],
            &[Shape::new([4, 3])],
            &SequenceConcatConfig::new().with_level(JoinLevel::Inner),
        )
        .unwrap_err();

        assert_eq!(
            error,
            ValidationError::LevelOutOfRange {
                level: 1,
                num_levels: 1
            }
        );
    }

    #[test]
    fn should_reject_different_number_of_levels() {
        let x0 = lod(&[&[0, 2, 4]]);
        let x1 = lod(&[&[0, 4], &[0, 2, 4]]);

        let error = LodMerger::merge(
            &[&x0, &x1],
            &[Shape::new([4, 3]), Shape::new([4, 3])],
            &SequenceConcatConfig::new(),
        )
        .unwrap_err();

        assert!(matches!(error, ValidationError::LevelMismatch { index: 1, .. }));
    }

    #[test]
    fn should_reject_different_number_of_segments() {
        let x0 = lod(&[&[0, 2, 4]]);
        let x1 = lod(&[&[0, 1, 2, 4]]);

        let error = LodMerger::merge(
            &[&x0, &x1],
            &[Shape::new([4, 3]), Shape::new([4, 3])],
            &SequenceConcatConfig::new(),
        )
        .unwrap_err();

        assert!(matches!(
            error,
            ValidationError::SegmentCountMismatch { index: 1, .. }
        ));
    }

    #[test]
    fn should_reject_misaligned_outer_boundaries() {
        // The outer boundary closes after one inner sequence in x0 but after two in x1.
        let x0 = lod(&[&[0, 1, 4], &[0, 1, 2, 4]]);
        let x1 = lod(&[&[0, 2, 4], &[0, 1, 2, 4]]);

        let error = LodMerger::merge(
            &[&x0, &x1],
            &[Shape::new([4, 3]), Shape::new([4, 3])],
            &SequenceConcatConfig::new().with_level(JoinLevel::Inner),
        )
        .unwrap_err();

        assert!(matches!(error, ValidationError::LodMismatch { .. }));
    }

    #[test]
    fn should_reject_lod_not_matching_rows() {
        let x0 = lod(&[&[0, 2, 5]]);

        let error = LodMerger::merge(&[&x0], &[Shape::new([4, 3])], &SequenceConcatConfig::new())
            .unwrap_err();

        assert!(matches!(error, ValidationError::InvalidLod(_)));
    }

    #[test]
    fn should_reject_dense_inputs() {
        let x0 = Lod::empty();

        let error = LodMerger::merge(&[&x0], &[Shape::new([4, 3])], &SequenceConcatConfig::new())
            .unwrap_err();

        assert!(matches!(error, ValidationError::InvalidLod(_)));
    }
}
