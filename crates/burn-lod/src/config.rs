use alloc::format;
use alloc::string::ToString;
use burn_core as burn;

use burn::config::Config;
use serde::{Deserialize, Serialize};

use crate::ops::Attributes;
use crate::ValidationError;

/// Name of the attribute holding the concatenation axis.
pub const AXIS_ATTR: &str = "axis";
/// Name of the attribute holding the join level.
pub const LEVEL_ATTR: &str = "level";

/// The LoD level at which the inputs are joined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinLevel {
    /// Join at the nested sequence level (level 0).
    #[default]
    Outer,
    /// Join at the sequence level (level 1).
    Inner,
}

impl JoinLevel {
    /// The LoD level index.
    pub fn index(&self) -> usize {
        match self {
            JoinLevel::Outer => 0,
            JoinLevel::Inner => 1,
        }
    }
}

impl TryFrom<i64> for JoinLevel {
    type Error = ValidationError;

    fn try_from(level: i64) -> Result<Self, Self::Error> {
        match level {
            0 => Ok(JoinLevel::Outer),
            1 => Ok(JoinLevel::Inner),
            _ => Err(ValidationError::InvalidAttribute {
                name: LEVEL_ATTR.to_string(),
                reason: format!(
                    "the sequence_concat operator only accepts a sequence or a nested sequence \
                     as its input, level should be 0 or 1, got {level}"
                ),
            }),
        }
    }
}

/// Configuration of the [sequence concatenation](crate::kernel::sequence_concat).
#[derive(Config, Debug, PartialEq, Eq)]
pub struct SequenceConcatConfig {
    /// The axis along which the inputs are joined. When it is 0, the inputs are joined along
    /// time steps and the LoD of the output is recomputed.
    #[config(default = 0)]
    pub axis: usize,
    /// The level at which the inputs are joined.
    #[config(default = "JoinLevel::Outer")]
    pub level: JoinLevel,
}

impl SequenceConcatConfig {
    /// Builds the configuration from operator attributes, using the defaults for missing ones.
    ///
    /// The level is checked first, so an out of domain level is always reported as such.
    pub fn from_attributes(attrs: &Attributes) -> Result<Self, ValidationError> {
        let level = JoinLevel::try_from(attrs.int_or(LEVEL_ATTR, 0)?)?;
        let axis = attrs.int_or(AXIS_ATTR, 0)?;
        let axis = usize::try_from(axis).map_err(|_| ValidationError::InvalidAttribute {
            name: AXIS_ATTR.to_string(),
            reason: format!("axis should be non-negative, got {axis}"),
        })?;

        Ok(Self::new().with_axis(axis).with_level(level))
    }
}
