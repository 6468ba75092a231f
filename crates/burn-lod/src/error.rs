use alloc::string::String;
use alloc::vec::Vec;
use thiserror::Error;

/// A precondition violated by the operator inputs, outputs or attributes.
///
/// Validation always happens before any buffer is touched, so an error never leaves a
/// partially written output behind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required input of the operator is missing or empty.
    #[error("Input `{name}` of operator `{op_type}` should not be null")]
    MissingInput {
        /// The operator type.
        op_type: String,
        /// The input slot name.
        name: String,
    },
    /// A required output of the operator is missing or empty.
    #[error("Output `{name}` of operator `{op_type}` should not be null")]
    MissingOutput {
        /// The operator type.
        op_type: String,
        /// The output slot name.
        name: String,
    },
    /// A slot that isn't duplicable received more than one variable.
    #[error("Slot `{name}` isn't duplicable but received {count} variables")]
    NotDuplicable {
        /// The slot name.
        name: String,
        /// The number of variables bound to the slot.
        count: usize,
    },
    /// Two slots that must be bound to the same number of variables are not.
    #[error("Slot `{name}` has {actual} variables, expected {expected}")]
    ArityMismatch {
        /// The slot name.
        name: String,
        /// The expected number of variables.
        expected: usize,
        /// The actual number of variables.
        actual: usize,
    },
    /// The operator description doesn't describe the expected operator.
    #[error("Expected an operator of type `{expected}`, got `{actual}`")]
    UnexpectedOpType {
        /// The expected operator type.
        expected: String,
        /// The actual operator type.
        actual: String,
    },
    /// A variable referenced by the operator isn't present.
    #[error("Variable `{0}` is not present in the scope")]
    MissingVariable(String),
    /// An attribute has the wrong type or is outside of its domain.
    #[error("Invalid attribute `{name}`: {reason}")]
    InvalidAttribute {
        /// The attribute name.
        name: String,
        /// Why the attribute was rejected.
        reason: String,
    },
    /// No input tensor was provided.
    #[error("At least one input tensor is required")]
    EmptyInputs,
    /// The concatenation axis doesn't exist for the input rank.
    #[error("Axis {axis} is out of bounds for tensors of rank {rank}")]
    AxisOutOfBounds {
        /// The requested axis.
        axis: usize,
        /// The rank of the inputs.
        rank: usize,
    },
    /// An input doesn't have the same rank as the first input.
    #[error("Input {index} has rank {actual}, expected {expected}")]
    RankMismatch {
        /// The input index.
        index: usize,
        /// The rank of the first input.
        expected: usize,
        /// The rank of the input.
        actual: usize,
    },
    /// An input differs from the first input on a dimension other than the concatenation axis.
    #[error(
        "Input {index} has extent {actual} at dimension {dim}, expected {expected}. \
         Except for the concatenation axis, all dimensions of the inputs should be the same"
    )]
    ExtentMismatch {
        /// The input index.
        index: usize,
        /// The mismatching dimension.
        dim: usize,
        /// The extent of the first input.
        expected: usize,
        /// The extent of the input.
        actual: usize,
    },
    /// A tensor buffer doesn't hold the number of elements its shape requires.
    #[error("Tensor has {actual} elements but its shape requires {expected}")]
    ElementCount {
        /// Number of elements required by the shape.
        expected: usize,
        /// Number of elements provided.
        actual: usize,
    },
    /// A shape has more elements than a buffer can address.
    #[error("Shape {dims:?} has more elements than a tensor buffer can address")]
    ShapeOverflow {
        /// The dimensions of the shape.
        dims: Vec<usize>,
    },
    /// A LoD breaks one of its structural invariants.
    #[error("Invalid LoD: {0}")]
    InvalidLod(String),
    /// An input doesn't have the same number of LoD levels as the first input.
    #[error("Input {index} has {actual} LoD levels, expected {expected}")]
    LevelMismatch {
        /// The input index.
        index: usize,
        /// The number of levels of the first input.
        expected: usize,
        /// The number of levels of the input.
        actual: usize,
    },
    /// The join level doesn't exist in the inputs.
    #[error("Level {level} is out of range for inputs with {num_levels} LoD levels")]
    LevelOutOfRange {
        /// The requested join level.
        level: usize,
        /// The number of levels of the inputs.
        num_levels: usize,
    },
    /// The LoD of an input is incompatible with the LoD of the first input.
    #[error("LoD of input {index} doesn't match the first input: {reason}")]
    LodMismatch {
        /// The input index.
        index: usize,
        /// Why the LoDs are incompatible.
        reason: String,
    },
    /// An input doesn't have the same number of segments at the join level.
    #[error("Input {index} has {actual} segments at level {level}, expected {expected}")]
    SegmentCountMismatch {
        /// The input index.
        index: usize,
        /// The join level.
        level: usize,
        /// The number of segments of the first input.
        expected: usize,
        /// The number of segments of the input.
        actual: usize,
    },
    /// The buffers handed to an executor don't match its copy plan.
    #[error("Copy plan doesn't match the provided buffers: {0}")]
    PlanMismatch(String),
    /// No kernel is registered for the requested operator, device and data type.
    #[error("No kernel registered for {0}")]
    KernelNotFound(String),
}

/// An error returned by the sequence concatenation operators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OpError {
    /// The operator was used with invalid inputs, outputs or attributes.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// A buffer couldn't be allocated.
    #[error("An error happened while allocating a tensor buffer\nCaused by:\n  {reason}")]
    Resource {
        /// The reason of the error.
        reason: String,
    },
}

impl OpError {
    /// Whether the error reflects malformed inputs rather than an allocation failure.
    pub fn is_validation(&self) -> bool {
        matches!(self, OpError::Validation(_))
    }
}

impl From<ndarray::ShapeError> for OpError {
    fn from(error: ndarray::ShapeError) -> Self {
        OpError::Resource {
            reason: alloc::format!("{error}"),
        }
    }
}

impl From<alloc::collections::TryReserveError> for OpError {
    fn from(error: alloc::collections::TryReserveError) -> Self {
        OpError::Resource {
            reason: alloc::format!("{error}"),
        }
    }
}
