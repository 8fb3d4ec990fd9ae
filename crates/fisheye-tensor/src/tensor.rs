use thiserror::Error;

/// An error type for tensor operations.
#[derive(Error, Debug, PartialEq)]
pub enum TensorError {
    /// Tensor shape does not match the provided data.
    #[error("Shape mismatch: expected {expected} elements for shape, but got {actual} elements in data")]
    InvalidShape {
        /// Expected number of elements based on shape
        expected: usize,
        /// Actual number of elements in the data
        actual: usize,
    },
}

impl TensorError {
    /// Creates an InvalidShape error with clear context.
    pub fn invalid_shape(expected: usize, actual: usize) -> Self {
        Self::InvalidShape { expected, actual }
    }
}

/// Computes the strides for a row-major (C-contiguous) tensor layout.
///
/// # Examples
///
/// ```rust
/// use fisheye_tensor::get_strides_from_shape;
///
/// assert_eq!(get_strides_from_shape([2, 3]), [3, 1]);
/// assert_eq!(get_strides_from_shape([2, 3, 4]), [12, 4, 1]);
/// ```
pub fn get_strides_from_shape<const N: usize>(shape: [usize; N]) -> [usize; N] {
    let mut strides: [usize; N] = [0; N];
    let mut stride = 1;
    for i in (0..shape.len()).rev() {
        strides[i] = stride;
        stride *= shape[i];
    }
    strides
}

/// A multi-dimensional array with owned, contiguous row-major data.
///
/// # Type Parameters
///
/// * `T` - The element type stored in the tensor
/// * `N` - The number of dimensions
#[derive(Clone, Debug, PartialEq)]
pub struct Tensor<T, const N: usize> {
    data: Vec<T>,
    /// The shape of the tensor.
    pub shape: [usize; N],
    /// The strides of the tensor data in memory.
    pub strides: [usize; N],
}

impl<T, const N: usize> Tensor<T, N> {
    /// Create a new tensor taking ownership of `data`.
    ///
    /// # Errors
    ///
    /// If the number of elements in `data` does not match the shape.
    pub fn from_shape_vec(shape: [usize; N], data: Vec<T>) -> Result<Self, TensorError> {
        let numel = shape.iter().product::<usize>();
        if numel != data.len() {
            return Err(TensorError::invalid_shape(numel, data.len()));
        }
        let strides = get_strides_from_shape(shape);
        Ok(Self {
            data,
            shape,
            strides,
        })
    }

    /// Returns the tensor data as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Returns the tensor data as a mutable slice.
    #[inline]
    pub fn as_slice_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Number of elements in the tensor.
    pub fn numel(&self) -> usize {
        self.data.len()
    }

    /// Linear offset of `index`, or `None` when any coordinate is out of bounds.
    pub fn get_iter_offset(&self, index: [usize; N]) -> Option<usize> {
        let mut offset = 0;
        for ((&idx, &dim_size), &stride) in index.iter().zip(&self.shape).zip(&self.strides) {
            if idx >= dim_size {
                return None;
            }
            offset += idx * stride;
        }
        Some(offset)
    }

    /// Linear offset of `index` without bounds checks.
    pub fn get_iter_offset_unchecked(&self, index: [usize; N]) -> usize {
        index
            .iter()
            .zip(&self.strides)
            .map(|(&idx, &stride)| idx * stride)
            .sum()
    }

    /// Get a reference to the element at `index`.
    pub fn get(&self, index: [usize; N]) -> Option<&T> {
        self.get_iter_offset(index).map(|offset| &self.data[offset])
    }

    /// Get a reference to the element at `index`.
    ///
    /// # Panics
    ///
    /// If the computed offset lies outside the buffer.
    pub fn get_unchecked(&self, index: [usize; N]) -> &T {
        &self.data[self.get_iter_offset_unchecked(index)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_shape_vec() -> Result<(), TensorError> {
        let t = Tensor::<u8, 2>::from_shape_vec([2, 2], vec![1, 2, 3, 4])?;
        assert_eq!(t.shape, [2, 2]);
        assert_eq!(t.strides, [2, 1]);
        assert_eq!(t.as_slice(), &[1, 2, 3, 4]);
        Ok(())
    }

    #[test]
    fn from_shape_vec_wrong_len() {
        let res = Tensor::<u8, 2>::from_shape_vec([2, 3], vec![1, 2, 3]);
        assert_eq!(res, Err(TensorError::invalid_shape(6, 3)));
    }

    #[test]
    fn get_and_bounds() -> Result<(), TensorError> {
        let t = Tensor::<i32, 3>::from_shape_vec([2, 1, 3], (0..6).collect())?;
        assert_eq!(t.get([1, 0, 2]), Some(&5));
        assert_eq!(t.get([2, 0, 0]), None);
        assert_eq!(*t.get_unchecked([0, 0, 1]), 1);
        Ok(())
    }
}
