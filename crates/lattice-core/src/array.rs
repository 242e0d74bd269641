//! The dense four-dimensional array container.
//!
//! [`DenseArray<T>`] owns one contiguous buffer of `width * height * depth *
//! channels` values of type `T`. Images, volumes, multi-channel tensor fields
//! and matrices are all dense arrays:
//!
//! - a 2D grayscale image is `W x H x 1 x 1`
//! - an RGB volume is `W x H x D x 3`
//! - a matrix with `m` rows and `n` columns is `n x m x 1 x 1`
//!
//! # Memory Layout
//!
//! Planar, x-fastest (see [`Shape`]):
//!
//! ```text
//! [c0: z0 y0 x0 x1 .. | z0 y1 x0 .. | .. ] [c1: ...] ...
//! ```
//!
//! # Invariants
//!
//! - `data.len() == shape.len()`
//! - the buffer is empty if and only if the shape is [`Shape::EMPTY`]
//!
//! # Ownership
//!
//! An array exclusively owns its buffer. [`Clone`] deep-copies it;
//! [`DenseArray::like`] copies the geometry only. Operations that change the
//! shape build a new buffer and swap it in.
//!
//! # Usage
//!
//! ```rust
//! use lattice_core::DenseArray;
//!
//! let mut img = DenseArray::<f32>::new(64, 48, 1, 3);
//! img.set(10, 20, 0, 1, 0.5);
//! assert_eq!(img.at(10, 20, 0, 1), 0.5);
//! assert_eq!(img.len(), 64 * 48 * 3);
//! ```

use crate::{Axis, Error, Result, Scalar, Shape};
#[cfg(debug_assertions)]
use tracing::warn;

/// Owned dense array of up to four dimensions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DenseArray<T: Scalar> {
    data: Vec<T>,
    shape: Shape,
}

impl<T: Scalar> DenseArray<T> {
    /// Creates an empty array (all extents zero, no buffer).
    #[inline]
    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            shape: Shape::EMPTY,
        }
    }

    /// Creates an array of the given extents filled with zeros.
    ///
    /// Any zero extent yields the empty array.
    ///
    /// # Panics
    ///
    /// Panics if the buffer cannot be allocated.
    pub fn new(width: usize, height: usize, depth: usize, channels: usize) -> Self {
        Self::filled(width, height, depth, channels, T::zero())
    }

    /// Creates an array of the given extents filled with `value`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use lattice_core::DenseArray;
    ///
    /// let ones = DenseArray::filled(4, 4, 1, 1, 1u8);
    /// assert!(ones.data().iter().all(|&v| v == 1));
    /// ```
    pub fn filled(width: usize, height: usize, depth: usize, channels: usize, value: T) -> Self {
        Self::with_shape(Shape::new(width, height, depth, channels), value)
    }

    /// Creates an array of `shape` filled with `value`.
    pub fn with_shape(shape: Shape, value: T) -> Self {
        Self {
            data: vec![value; shape.len()],
            shape,
        }
    }

    /// Creates an array from an existing buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if `data.len()` differs from the
    /// product of the extents.
    pub fn from_vec(
        width: usize,
        height: usize,
        depth: usize,
        channels: usize,
        data: Vec<T>,
    ) -> Result<Self> {
        let shape = Shape::new(width, height, depth, channels);
        if data.len() != shape.len() {
            return Err(Error::shape_mismatch(
                "from_vec",
                shape,
                Shape::new(data.len(), 1, 1, 1),
            ));
        }
        Ok(Self { data, shape })
    }

    /// Creates an array whose value at `(x, y, z, c)` is `f(x, y, z, c)`.
    pub fn from_fn<F>(width: usize, height: usize, depth: usize, channels: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize, usize, usize) -> T,
    {
        let shape = Shape::new(width, height, depth, channels);
        let mut data = Vec::with_capacity(shape.len());
        for c in 0..shape.channels {
            for z in 0..shape.depth {
                for y in 0..shape.height {
                    for x in 0..shape.width {
                        data.push(f(x, y, z, c));
                    }
                }
            }
        }
        Self { data, shape }
    }

    /// Creates a zero-filled array with the geometry of `other`.
    ///
    /// The element type may differ; no value is copied.
    pub fn like<U: Scalar>(other: &DenseArray<U>) -> Self {
        Self::with_shape(other.shape(), T::zero())
    }

    /// Creates a column vector (`1 x n`) from values.
    pub fn column(values: &[T]) -> Self {
        Self {
            data: values.to_vec(),
            shape: Shape::new(1, values.len(), 1, 1),
        }
    }

    /// Creates a matrix with `rows` rows from row-major values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if `values.len()` is not `rows * cols`.
    pub fn from_rows(cols: usize, rows: usize, values: &[T]) -> Result<Self> {
        Self::from_vec(cols, rows, 1, 1, values.to_vec())
    }

    // ------------------------------------------------------------------
    // Shape
    // ------------------------------------------------------------------

    /// Returns the extents.
    #[inline]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Extent along x.
    #[inline]
    pub fn width(&self) -> usize {
        self.shape.width
    }

    /// Extent along y.
    #[inline]
    pub fn height(&self) -> usize {
        self.shape.height
    }

    /// Extent along z.
    #[inline]
    pub fn depth(&self) -> usize {
        self.shape.depth
    }

    /// Number of channels.
    #[inline]
    pub fn channels(&self) -> usize {
        self.shape.channels
    }

    /// Total number of values.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the array holds no value.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns an [`Error::EmptyInstance`] for `op` if the array is empty.
    #[inline]
    pub fn ensure_not_empty(&self, op: &'static str) -> Result<()> {
        if self.is_empty() {
            Err(Error::empty_instance(op))
        } else {
            Ok(())
        }
    }

    // ------------------------------------------------------------------
    // Raw buffer
    // ------------------------------------------------------------------

    /// Returns the raw buffer.
    #[inline]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Returns the raw buffer mutably.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Returns a pointer to the first value (null-equivalent dangling
    /// pointer for an empty array).
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.data.as_ptr()
    }

    /// Consumes the array and returns its buffer.
    #[inline]
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Values of channel `c`, in x-fastest order.
    ///
    /// # Panics
    ///
    /// Panics if `c >= channels()`.
    #[inline]
    pub fn channel(&self, c: usize) -> &[T] {
        let n = self.shape.plane_len();
        &self.data[c * n..(c + 1) * n]
    }

    /// Mutable values of channel `c`.
    ///
    /// # Panics
    ///
    /// Panics if `c >= channels()`.
    #[inline]
    pub fn channel_mut(&mut self, c: usize) -> &mut [T] {
        let n = self.shape.plane_len();
        &mut self.data[c * n..(c + 1) * n]
    }

    // ------------------------------------------------------------------
    // Element access
    // ------------------------------------------------------------------

    /// Buffer offset of `(x, y, z, c)`.
    ///
    /// Unchecked in release builds. Debug builds log a warning for an
    /// out-of-range coordinate and still return the computed offset.
    #[inline]
    pub fn offset(&self, x: usize, y: usize, z: usize, c: usize) -> usize {
        #[cfg(debug_assertions)]
        if !self.shape.contains(x, y, z, c) {
            warn!(x, y, z, c, shape = %self.shape, "offset: coordinate out of range");
        }
        self.shape.offset(x, y, z, c)
    }

    /// Value at `(x, y, z, c)`.
    ///
    /// # Panics
    ///
    /// Panics if the offset falls outside the buffer.
    #[inline]
    pub fn at(&self, x: usize, y: usize, z: usize, c: usize) -> T {
        self.data[self.offset(x, y, z, c)]
    }

    /// Mutable reference to the value at `(x, y, z, c)`.
    #[inline]
    pub fn at_mut(&mut self, x: usize, y: usize, z: usize, c: usize) -> &mut T {
        let off = self.offset(x, y, z, c);
        &mut self.data[off]
    }

    /// Sets the value at `(x, y, z, c)`.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, z: usize, c: usize, value: T) {
        *self.at_mut(x, y, z, c) = value;
    }

    /// Value at `(x, y, z, c)`, or `None` outside the array.
    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize, c: usize) -> Option<T> {
        if self.shape.contains(x, y, z, c) {
            Some(self.data[self.shape.offset(x, y, z, c)])
        } else {
            None
        }
    }

    /// Value at a signed coordinate, clamped to the nearest valid sample
    /// (Neumann boundary).
    ///
    /// # Panics
    ///
    /// Panics on an empty array.
    #[inline]
    pub fn at_clamped(&self, x: isize, y: isize, z: isize, c: usize) -> T {
        let s = &self.shape;
        let cx = x.clamp(0, s.width as isize - 1) as usize;
        let cy = y.clamp(0, s.height as isize - 1) as usize;
        let cz = z.clamp(0, s.depth as isize - 1) as usize;
        self.data[s.offset(cx, cy, cz, c)]
    }

    /// Value at a signed coordinate, or `outside` if it lies outside the
    /// spatial extents.
    #[inline]
    pub fn at_or(&self, x: isize, y: isize, z: isize, c: usize, outside: T) -> T {
        let s = &self.shape;
        if x < 0
            || y < 0
            || z < 0
            || x as usize >= s.width
            || y as usize >= s.height
            || z as usize >= s.depth
        {
            outside
        } else {
            self.data[s.offset(x as usize, y as usize, z as usize, c)]
        }
    }

    /// Values of all channels at `(x, y, z)`.
    pub fn vector_at(&self, x: usize, y: usize, z: usize) -> Vec<T> {
        (0..self.channels()).map(|c| self.at(x, y, z, c)).collect()
    }

    /// Iterates over `(x, y, z, c, value)` in buffer order.
    pub fn indexed_iter(&self) -> impl Iterator<Item = (usize, usize, usize, usize, T)> + '_ {
        let s = self.shape;
        self.data.iter().enumerate().map(move |(i, &v)| {
            let x = i % s.width;
            let r = i / s.width;
            let y = r % s.height;
            let r = r / s.height;
            let z = r % s.depth;
            let c = r / s.depth;
            (x, y, z, c, v)
        })
    }

    // ------------------------------------------------------------------
    // Fill
    // ------------------------------------------------------------------

    /// Sets every value to `value`.
    pub fn fill(&mut self, value: T) -> &mut Self {
        self.data.fill(value);
        self
    }

    /// Fills the buffer by repeating `pattern` cyclically in buffer order.
    ///
    /// An empty pattern leaves the array untouched.
    ///
    /// # Example
    ///
    /// ```rust
    /// use lattice_core::DenseArray;
    ///
    /// let mut m = DenseArray::<i32>::new(2, 2, 1, 1);
    /// m.fill_pattern(&[1, 2, 3]);
    /// assert_eq!(m.data(), &[1, 2, 3, 1]);
    /// ```
    pub fn fill_pattern(&mut self, pattern: &[T]) -> &mut Self {
        if !pattern.is_empty() {
            for (dst, &src) in self.data.iter_mut().zip(pattern.iter().cycle()) {
                *dst = src;
            }
        }
        self
    }

    // ------------------------------------------------------------------
    // Conversion
    // ------------------------------------------------------------------

    /// Converts every value to `U`, keeping the shape.
    ///
    /// Same-type casts are element-for-element deep copies.
    pub fn cast<U: Scalar>(&self) -> DenseArray<U> {
        DenseArray {
            data: self.data.iter().map(|&v| v.cast::<U>()).collect(),
            shape: self.shape,
        }
    }

    /// Returns a copy of all values converted to `f64`.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        self.data.iter().map(|v| v.to_f64()).collect()
    }

    /// Reinterprets the buffer with new extents of the same total length.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if the lengths differ.
    pub fn reshape(self, shape: Shape) -> Result<Self> {
        if shape.len() != self.data.len() {
            return Err(Error::shape_mismatch("reshape", self.shape, shape));
        }
        Ok(Self {
            data: self.data,
            shape,
        })
    }

    // ------------------------------------------------------------------
    // Geometry
    // ------------------------------------------------------------------

    /// Returns a copy mirrored along `axis`.
    pub fn mirrored(&self, axis: Axis) -> Self {
        let s = self.shape;
        Self::from_fn(s.width, s.height, s.depth, s.channels, |x, y, z, c| match axis {
            Axis::X => self.at(s.width - 1 - x, y, z, c),
            Axis::Y => self.at(x, s.height - 1 - y, z, c),
            Axis::Z => self.at(x, y, s.depth - 1 - z, c),
            Axis::C => self.at(x, y, z, s.channels - 1 - c),
        })
    }

    /// Mirrors the array along `axis` in place.
    pub fn mirror(&mut self, axis: Axis) -> &mut Self {
        *self = self.mirrored(axis);
        self
    }

    /// Returns channel `c` as a single-channel array.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `c` is out of range.
    pub fn channel_array(&self, c: usize) -> Result<Self> {
        if c >= self.channels() {
            return Err(Error::invalid_argument(
                "channel_array",
                format!("channel {} out of range 0..{}", c, self.channels()),
            ));
        }
        Ok(Self {
            data: self.channel(c).to_vec(),
            shape: self.shape.with_channels(1),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_invariant() {
        let a = DenseArray::<u8>::new(3, 4, 5, 2);
        assert_eq!(a.len(), 3 * 4 * 5 * 2);
        assert_eq!(a.data().len(), a.shape().len());

        let e = DenseArray::<u8>::new(3, 0, 5, 2);
        assert!(e.is_empty());
        assert_eq!(e.shape(), Shape::EMPTY);
        assert!(e.data().is_empty());
    }

    #[test]
    fn test_from_vec_length_check() {
        assert!(DenseArray::from_vec(2, 2, 1, 1, vec![1.0f32; 4]).is_ok());
        let err = DenseArray::from_vec(2, 2, 1, 1, vec![1.0f32; 5]).unwrap_err();
        assert!(err.is_argument_error());
    }

    #[test]
    fn test_accessors() {
        let mut a = DenseArray::<i32>::new(4, 3, 2, 2);
        a.set(3, 2, 1, 1, 7);
        assert_eq!(a.at(3, 2, 1, 1), 7);
        assert_eq!(a.data()[a.len() - 1], 7);
        assert_eq!(a.get(4, 0, 0, 0), None);
        assert_eq!(a.get(3, 2, 1, 1), Some(7));
    }

    #[test]
    fn test_clamped_and_outside_reads() {
        let a = DenseArray::from_fn(3, 3, 1, 1, |x, y, _, _| (x + 10 * y) as f32);
        assert_eq!(a.at_clamped(-5, 1, 0, 0), 10.0);
        assert_eq!(a.at_clamped(9, 9, 3, 0), 22.0);
        assert_eq!(a.at_or(-1, 0, 0, 0, -1.0), -1.0);
        assert_eq!(a.at_or(1, 1, 0, 0, -1.0), 11.0);
    }

    #[test]
    fn test_clone_is_deep() {
        let a = DenseArray::filled(2, 2, 1, 1, 1.0f64);
        let mut b = a.clone();
        b.set(0, 0, 0, 0, 5.0);
        assert_eq!(a.at(0, 0, 0, 0), 1.0);
    }

    #[test]
    fn test_like_copies_geometry_only() {
        let a = DenseArray::filled(3, 2, 1, 4, 9u16);
        let b = DenseArray::<f32>::like(&a);
        assert_eq!(b.shape(), a.shape());
        assert!(b.data().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_fill_pattern() {
        let mut a = DenseArray::<u8>::new(5, 1, 1, 1);
        a.fill_pattern(&[1, 2]);
        assert_eq!(a.data(), &[1, 2, 1, 2, 1]);
        a.fill_pattern(&[]);
        assert_eq!(a.data(), &[1, 2, 1, 2, 1]);
    }

    #[test]
    fn test_cast_same_type_copies() {
        let a = DenseArray::from_fn(4, 4, 1, 2, |x, y, _, c| (x * y + c) as i16 - 3);
        let b: DenseArray<i16> = a.cast();
        assert_eq!(a, b);
    }

    #[test]
    fn test_cast_widen_then_narrow() {
        let a = DenseArray::from_fn(8, 8, 1, 1, |x, y, _, _| (x * 8 + y) as u8);
        let wide: DenseArray<f64> = a.cast();
        let back: DenseArray<u8> = wide.cast();
        assert_eq!(a, back);
    }

    #[test]
    fn test_mirror() {
        let a = DenseArray::from_rows(3, 1, &[1, 2, 3]).unwrap();
        assert_eq!(a.mirrored(Axis::X).data(), &[3, 2, 1]);
        let mut b = DenseArray::from_rows(1, 3, &[1, 2, 3]).unwrap();
        b.mirror(Axis::Y);
        assert_eq!(b.data(), &[3, 2, 1]);
    }

    #[test]
    fn test_indexed_iter_matches_offsets() {
        let a = DenseArray::from_fn(3, 2, 2, 2, |x, y, z, c| (x + 3 * y + 6 * z + 12 * c) as u32);
        for (x, y, z, c, v) in a.indexed_iter() {
            assert_eq!(a.at(x, y, z, c), v);
            assert_eq!(a.shape().offset(x, y, z, c), v as usize);
        }
    }

    #[test]
    fn test_channel_array() {
        let a = DenseArray::from_fn(2, 2, 1, 3, |_, _, _, c| c as u8);
        let g = a.channel_array(1).unwrap();
        assert_eq!(g.channels(), 1);
        assert!(g.data().iter().all(|&v| v == 1));
        assert!(a.channel_array(3).is_err());
    }

    #[test]
    fn test_empty_instance_guard() {
        let e = DenseArray::<f32>::empty();
        assert!(e.ensure_not_empty("op").unwrap_err().is_instance_error());
    }
}
