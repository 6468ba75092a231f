use alloc::format;
use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Maximum number of levels a LoD can have: a sequence or a nested sequence.
pub const MAX_LOD_LEVELS: usize = 2;

/// Level of details of a tensor: the boundaries of its variable-length (nested) sequences.
///
/// Level 0 is the outermost level. Every level is a non-decreasing list of offsets into the first
/// dimension of the tensor, starting at 0 and ending at the number of rows. The offsets of a level
/// are a subset of the offsets of the next finer level.
///
/// ```text
/// rows:     0 1 2 3 4
/// level 0:  0       3   5
/// level 1:  0 1 2   3   5
/// ```
///
/// All levels are stored in a single offsets buffer, `starts[k]..starts[k + 1]` being the range
/// of level `k`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "Vec<Vec<usize>>", try_from = "Vec<Vec<usize>>")]
pub struct Lod {
    offsets: Vec<usize>,
    starts: [usize; MAX_LOD_LEVELS + 1],
    num_levels: usize,
}

impl Default for Lod {
    fn default() -> Self {
        Self::empty()
    }
}

impl Lod {
    /// A LoD without any level, attached to plain dense tensors.
    pub fn empty() -> Self {
        Self {
            offsets: Vec::new(),
            starts: [0; MAX_LOD_LEVELS + 1],
            num_levels: 0,
        }
    }

    /// Creates a LoD from its levels, outermost first.
    ///
    /// Checks that every level starts at 0 and is non-decreasing. Checks that depend on the
    /// tensor, like the last offset matching its number of rows, are done by
    /// [validate_rows](Self::validate_rows).
    pub fn from_levels<I, L>(levels: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = L>,
        L: AsRef<[usize]>,
    {
        let mut lod = Self::empty();

        for level in levels {
            let level = level.as_ref();

            if lod.num_levels == MAX_LOD_LEVELS {
                return Err(ValidationError::InvalidLod(format!(
                    "at most {MAX_LOD_LEVELS} levels are supported"
                )));
            }

            match level.first() {
                Some(0) => {}
                Some(first) => {
                    return Err(ValidationError::InvalidLod(format!(
                        "level {} should start at 0, got {first}",
                        lod.num_levels
                    )));
                }
                None => {
                    return Err(ValidationError::InvalidLod(format!(
                        "level {} should have at least one offset",
                        lod.num_levels
                    )));
                }
            }

            if let Some(position) = level.windows(2).position(|pair| pair[0] > pair[1]) {
                return Err(ValidationError::InvalidLod(format!(
                    "level {} should be non-decreasing, got {} before {}",
                    lod.num_levels,
                    level[position],
                    level[position + 1]
                )));
            }

            lod.offsets.extend_from_slice(level);
            lod.num_levels += 1;
            lod.starts[lod.num_levels] = lod.offsets.len();
        }

        // Unused levels are empty ranges at the end of the buffer.
        for start in lod.starts.iter_mut().skip(lod.num_levels + 1) {
            *start = lod.offsets.len();
        }

        Ok(lod)
    }

    /// Number of levels.
    pub fn num_levels(&self) -> usize {
        self.num_levels
    }

    /// Whether the LoD has no level at all.
    pub fn is_empty(&self) -> bool {
        self.num_levels == 0
    }

    /// The offsets of the given level, or an empty slice if the level doesn't exist.
    pub fn level(&self, level: usize) -> &[usize] {
        if level >= self.num_levels {
            return &[];
        }

        &self.offsets[self.starts[level]..self.starts[level + 1]]
    }

    /// Number of segments delimited by the offsets of the given level.
    pub fn num_segments(&self, level: usize) -> usize {
        self.level(level).len().saturating_sub(1)
    }

    /// Iterates over the levels, outermost first.
    pub fn levels(&self) -> impl Iterator<Item = &[usize]> {
        (0..self.num_levels).map(|level| self.level(level))
    }

    /// Returns the levels as nested vectors, outermost first.
    pub fn to_levels(&self) -> Vec<Vec<usize>> {
        self.levels().map(|level| level.to_vec()).collect()
    }

    /// Checks that the LoD describes a tensor with the given number of rows.
    ///
    /// Every level must end at `rows` and every offset of a level must also be an offset of the
    /// next finer level.
    pub fn validate_rows(&self, rows: usize) -> Result<(), ValidationError> {
        for (index, level) in self.levels().enumerate() {
            let last = level.last().copied().unwrap_or_default();

            if last != rows {
                return Err(ValidationError::InvalidLod(format!(
                    "level {index} should end at the number of rows {rows}, got {last}"
                )));
            }
        }

        for index in 1..self.num_levels {
            let coarse = self.level(index - 1);
            let fine = self.level(index);

            if let Some(offset) = coarse
                .iter()
                .find(|offset| fine.binary_search(*offset).is_err())
            {
                return Err(ValidationError::InvalidLod(format!(
                    "offset {offset} of level {} isn't a boundary of level {index}",
                    index - 1
                )));
            }
        }

        Ok(())
    }
}

impl From<Lod> for Vec<Vec<usize>> {
    fn from(lod: Lod) -> Self {
        lod.to_levels()
    }
}

impl TryFrom<Vec<Vec<usize>>> for Lod {
    type Error = ValidationError;

    fn try_from(levels: Vec<Vec<usize>>) -> Result<Self, Self::Error> {
        Lod::from_levels(levels)
    }
}

impl core::fmt::Display for Lod {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("{")?;
        for (index, level) in self.levels().enumerate() {
            if index > 0 {
                f.write_str(",")?;
            }
            f.write_str("{")?;
            for (position, offset) in level.iter().enumerate() {
                if position > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{offset}")?;
            }
            f.write_str("}")?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use alloc::vec;

    #[test]
    fn should_store_levels_in_order() {
        let lod = Lod::from_levels([vec![0, 2, 4], vec![0, 1, 2, 3, 4]]).unwrap();

        assert_eq!(lod.num_levels(), 2);
        assert_eq!(lod.level(0), &[0, 2, 4]);
        assert_eq!(lod.level(1), &[0, 1, 2, 3, 4]);
        assert_eq!(lod.num_segments(0), 2);
        assert_eq!(lod.num_segments(1), 4);
        assert_eq!(lod.level(2), &[] as &[usize]);
    }

    #[test]
    fn equal_levels_should_give_equal_lods() {
        let lhs = Lod::from_levels([vec![0, 3, 5]]).unwrap();
        let rhs = Lod::from_levels([[0, 3, 5]]).unwrap();

        assert_eq!(lhs, rhs);
        assert_ne!(lhs, Lod::empty());
    }

    #[test]
    fn should_reject_more_than_two_levels() {
        let result = Lod::from_levels([vec![0, 1], vec![0, 1], vec![0, 1]]);

        assert!(matches!(result, Err(ValidationError::InvalidLod(_))));
    }

    #[test]
    fn should_reject_level_not_starting_at_zero() {
        let result = Lod::from_levels([vec![1, 2]]);

        assert!(matches!(result, Err(ValidationError::InvalidLod(_))));
    }

    #[test]
    fn should_reject_decreasing_level() {
        let result = Lod::from_levels([vec![0, 3, 2]]);

        assert!(matches!(result, Err(ValidationError::InvalidLod(_))));
    }

    #[test]
    fn should_validate_rows_and_nesting() {
        let lod = Lod::from_levels([vec![0, 3, 5], vec![0, 1, 2, 3, 5]]).unwrap();

        assert!(lod.validate_rows(5).is_ok());
        assert!(lod.validate_rows(4).is_err());
    }

    #[test]
    fn should_reject_levels_not_nested() {
        let lod = Lod::from_levels([vec![0, 2, 5], vec![0, 1, 3, 5]]).unwrap();

        assert!(matches!(lod.validate_rows(5), Err(ValidationError::InvalidLod(_))));
    }

    #[test]
    fn should_display_nested_levels() {
        let lod = Lod::from_levels([vec![0, 5, 9], vec![0, 2, 5, 7, 9]]).unwrap();

        assert_eq!(lod.to_string(), "{{0,5,9},{0,2,5,7,9}}");
    }

    #[test]
    fn should_serialize_as_nested_levels() {
        let lod = Lod::from_levels([vec![0, 2, 4], vec![0, 1, 2, 3, 4]]).unwrap();

        let json = serde_json::to_string(&lod).unwrap();
        let restored: Lod = serde_json::from_str(&json).unwrap();

        assert_eq!(json, "[[0,2,4],[0,1,2,3,4]]");
        assert_eq!(restored, lod);
    }

    #[test]
    fn should_reject_invalid_serialized_levels() {
        let result: Result<Lod, _> = serde_json::from_str("[[1,2]]");

        assert!(result.is_err());
    }
}
