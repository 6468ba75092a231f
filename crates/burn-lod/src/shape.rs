use burn_tensor::Shape;

use crate::ValidationError;

/// Row accessors of a [shape](Shape) whose first dimension is indexed by a LoD.
pub trait RowShape {
    /// Returns the extent of the first dimension, the one indexed by a LoD.
    fn rows(&self) -> usize;

    /// Number of elements in a single row, i.e. the product of every dimension but the first.
    fn row_width(&self) -> usize;
}

impl RowShape for Shape {
    fn rows(&self) -> usize {
        self.dims.first().copied().unwrap_or(0)
    }

    fn row_width(&self) -> usize {
        self.dims.iter().skip(1).product()
    }
}

/// Returns the number of elements of a shape, failing when it doesn't fit in a `usize`.
///
/// Like `ndarray`, the product of the non-zero dimensions must fit, so that every partial
/// product of the dimensions fits as well.
pub fn checked_num_elements(shape: &Shape) -> Result<usize, ValidationError> {
    let overflow = || ValidationError::ShapeOverflow {
        dims: shape.dims.clone(),
    };
    let product = shape
        .dims
        .iter()
        .filter(|dim| **dim != 0)
        .try_fold(1usize, |acc, dim| acc.checked_mul(*dim))
        .ok_or_else(overflow)?;

    if shape.dims.contains(&0) {
        Ok(0)
    } else {
        Ok(product)
    }
}

/// Computes the shape resulting from the concatenation of tensors along `axis`.
///
/// Every shape must have the same rank and the same extents except at `axis`. The output is the
/// first shape with its `axis` extent replaced by the sum of all extents at `axis`.
pub fn concat_shape(shapes: &[Shape], axis: usize) -> Result<Shape, ValidationError> {
    let first = shapes.first().ok_or(ValidationError::EmptyInputs)?;
    let rank = first.num_dims();

    if axis >= rank {
        return Err(ValidationError::AxisOutOfBounds { axis, rank });
    }

    let mut output = first.clone();

    for (index, shape) in shapes.iter().enumerate().skip(1) {
        if shape.num_dims() != rank {
            return Err(ValidationError::RankMismatch {
                index,
                expected: rank,
                actual: shape.num_dims(),
            });
        }

        for (dim, (expected, actual)) in first.dims.iter().zip(shape.dims.iter()).enumerate() {
            if dim != axis && expected != actual {
                return Err(ValidationError::ExtentMismatch {
                    index,
                    dim,
                    expected: *expected,
                    actual: *actual,
                });
            }
        }

        output.dims[axis] = output.dims[axis]
            .checked_add(shape.dims[axis])
            .ok_or_else(|| ValidationError::ShapeOverflow {
                dims: output.dims.clone(),
            })?;
    }

    for shape in shapes.iter().chain(core::iter::once(&output)) {
        checked_num_elements(shape)?;
    }

    Ok(output)
}
