use alloc::borrow::Cow;
use alloc::vec::Vec;
use ndarray::{ArcArray, IxDyn};

use crate::{checked_num_elements, Element, Lod, OpError, Shape, ValidationError};

/// A dense row-major tensor along with the LoD describing the sequences of its first dimension.
#[derive(new, Debug, Clone)]
pub struct LodTensor<E> {
    /// The dense data.
    pub array: ArcArray<E, IxDyn>,
    /// The sequence boundaries over the first dimension.
    pub lod: Lod,
}

impl<E: Element> LodTensor<E> {
    /// Creates a tensor from row-major values.
    pub fn from_vec<S: Into<Shape>>(values: Vec<E>, shape: S, lod: Lod) -> Result<Self, OpError> {
        let shape = shape.into();
        let num_elements = checked_num_elements(&shape)?;

        if values.len() != num_elements {
            return Err(ValidationError::ElementCount {
                expected: num_elements,
                actual: values.len(),
            }
            .into());
        }

        let array = ArcArray::from_shape_vec(IxDyn(&shape.dims), values)?;

        Ok(Self { array, lod })
    }

    /// Creates a tensor filled with the default value of the element type.
    pub fn zeros<S: Into<Shape>>(shape: S, lod: Lod) -> Result<Self, OpError> {
        let shape = shape.into();
        checked_num_elements(&shape)?;
        let array = ArcArray::from_elem(IxDyn(&shape.dims), E::default());

        Ok(Self { array, lod })
    }

    /// Returns a tensor with the same data and the given LoD.
    pub fn with_lod(self, lod: Lod) -> Self {
        Self {
            array: self.array,
            lod,
        }
    }

    /// The dense shape of the tensor.
    pub fn shape(&self) -> Shape {
        Shape::from(self.array.shape().to_vec())
    }

    /// Number of rows, the extent of the dimension indexed by the LoD.
    pub fn rows(&self) -> usize {
        self.array.shape().first().copied().unwrap_or(0)
    }

    /// Returns the values in row-major order.
    pub fn to_vec(&self) -> Vec<E> {
        self.array.iter().copied().collect()
    }

    /// Row-major view of the values, only copying when the array isn't in standard layout.
    pub fn as_contiguous(&self) -> Cow<'_, [E]> {
        match self.array.as_slice() {
            Some(values) => Cow::Borrowed(values),
            None => Cow::Owned(self.to_vec()),
        }
    }
}
