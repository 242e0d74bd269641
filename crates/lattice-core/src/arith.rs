//! Elementwise arithmetic, math functions and statistics.
//!
//! # Pairwise Operations
//!
//! [`add`](DenseArray::add), [`sub`](DenseArray::sub), [`mul`](DenseArray::mul),
//! [`div`](DenseArray::div), [`min_with`](DenseArray::min_with) and
//! [`max_with`](DenseArray::max_with) combine two arrays of possibly
//! different element types. The result type follows the promotion table in
//! [`crate::promote`]. Both operands must have the same shape.
//!
//! Combining arrays of different lengths is only possible through the
//! explicitly named [`zip_prefix`](DenseArray::zip_prefix) family, which
//! works on the common prefix of the two buffers and carries the rest of the
//! left operand over unchanged.
//!
//! # In-Place Math
//!
//! Unary functions are evaluated in `f64` and converted back with the
//! element type's [`Scalar::from_f64`] semantics:
//!
//! ```rust
//! use lattice_core::DenseArray;
//!
//! let mut a = DenseArray::from_rows(3, 1, &[1u8, 4, 9]).unwrap();
//! a.sqrt();
//! assert_eq!(a.data(), &[1, 2, 3]);
//! a *= 10;
//! assert_eq!(a.data(), &[10, 20, 30]);
//! ```

use std::ops::{AddAssign, DivAssign, MulAssign, SubAssign};

use tracing::warn;

use crate::{DenseArray, Error, Promote, Promoted, Result, Scalar};

/// Relative range below which [`DenseArray::normalize`] treats values as constant.
const FLAT_RANGE: f64 = 1e-12;

impl<T: Scalar> DenseArray<T> {
    // ------------------------------------------------------------------
    // Unary math
    // ------------------------------------------------------------------

    /// Applies `f` to every value in place.
    pub fn map_in_place<F: Fn(T) -> T>(&mut self, f: F) -> &mut Self {
        for v in self.data_mut() {
            *v = f(*v);
        }
        self
    }

    /// Returns a new array holding `f(v)` for every value.
    pub fn map<U: Scalar, F: Fn(T) -> U>(&self, f: F) -> DenseArray<U> {
        let mut out = DenseArray::<U>::like(self);
        for (dst, &src) in out.data_mut().iter_mut().zip(self.data()) {
            *dst = f(src);
        }
        out
    }

    fn apply_f64(&mut self, f: impl Fn(f64) -> f64) -> &mut Self {
        self.map_in_place(|v| T::from_f64(f(v.to_f64())))
    }

    /// Squares every value.
    pub fn sqr(&mut self) -> &mut Self {
        self.apply_f64(|v| v * v)
    }

    /// Square root of every value.
    pub fn sqrt(&mut self) -> &mut Self {
        self.apply_f64(f64::sqrt)
    }

    /// Absolute value of every value.
    pub fn abs(&mut self) -> &mut Self {
        self.apply_f64(f64::abs)
    }

    /// Exponential of every value.
    pub fn exp(&mut self) -> &mut Self {
        self.apply_f64(f64::exp)
    }

    /// Natural logarithm of every value.
    pub fn ln(&mut self) -> &mut Self {
        self.apply_f64(f64::ln)
    }

    /// Raises every value to the power `p`.
    pub fn pow(&mut self, p: f64) -> &mut Self {
        self.apply_f64(|v| v.powf(p))
    }

    /// Sine of every value.
    pub fn sin(&mut self) -> &mut Self {
        self.apply_f64(f64::sin)
    }

    /// Cosine of every value.
    pub fn cos(&mut self) -> &mut Self {
        self.apply_f64(f64::cos)
    }

    /// Clamps every value into `[lo, hi]`.
    pub fn clamp_values(&mut self, lo: T, hi: T) -> &mut Self {
        self.map_in_place(|v| {
            if v < lo {
                lo
            } else if v > hi {
                hi
            } else {
                v
            }
        })
    }

    // ------------------------------------------------------------------
    // Pairwise
    // ------------------------------------------------------------------

    fn zip_with<U, F>(&self, other: &DenseArray<U>, op: &'static str, f: F) -> Result<DenseArray<Promoted<T, U>>>
    where
        U: Scalar,
        T: Promote<U>,
        F: Fn(f64, f64) -> f64,
    {
        if self.shape() != other.shape() {
            return Err(Error::shape_mismatch(op, self.shape(), other.shape()));
        }
        self.ensure_not_empty(op)?;
        let s = self.shape();
        let data = self
            .data()
            .iter()
            .zip(other.data())
            .map(|(&a, &b)| Promoted::<T, U>::from_f64(f(a.to_f64(), b.to_f64())))
            .collect();
        DenseArray::from_vec(s.width, s.height, s.depth, s.channels, data)
    }

    /// Elementwise sum.
    ///
    /// # Errors
    ///
    /// - [`Error::ShapeMismatch`] if the shapes differ
    /// - [`Error::EmptyInstance`] if both operands are empty
    pub fn add<U: Scalar>(&self, other: &DenseArray<U>) -> Result<DenseArray<Promoted<T, U>>>
    where
        T: Promote<U>,
    {
        self.zip_with(other, "add", |a, b| a + b)
    }

    /// Elementwise difference.
    pub fn sub<U: Scalar>(&self, other: &DenseArray<U>) -> Result<DenseArray<Promoted<T, U>>>
    where
        T: Promote<U>,
    {
        self.zip_with(other, "sub", |a, b| a - b)
    }

    /// Elementwise product.
    pub fn mul<U: Scalar>(&self, other: &DenseArray<U>) -> Result<DenseArray<Promoted<T, U>>>
    where
        T: Promote<U>,
    {
        self.zip_with(other, "mul", |a, b| a * b)
    }

    /// Elementwise quotient. Integer division by zero saturates, `0 / 0`
    /// gives zero.
    pub fn div<U: Scalar>(&self, other: &DenseArray<U>) -> Result<DenseArray<Promoted<T, U>>>
    where
        T: Promote<U>,
    {
        self.zip_with(other, "div", |a, b| a / b)
    }

    /// Elementwise minimum.
    pub fn min_with<U: Scalar>(&self, other: &DenseArray<U>) -> Result<DenseArray<Promoted<T, U>>>
    where
        T: Promote<U>,
    {
        self.zip_with(other, "min_with", f64::min)
    }

    /// Elementwise maximum.
    pub fn max_with<U: Scalar>(&self, other: &DenseArray<U>) -> Result<DenseArray<Promoted<T, U>>>
    where
        T: Promote<U>,
    {
        self.zip_with(other, "max_with", f64::max)
    }

    /// Combines the common prefix of both buffers with `f`; the result has
    /// the shape of `self` and values past the prefix are copied from `self`.
    ///
    /// This is the legacy behaviour of elementwise operators on arrays of
    /// different extents, kept under an explicit name.
    ///
    /// # Example
    ///
    /// ```rust
    /// use lattice_core::DenseArray;
    ///
    /// let a = DenseArray::from_rows(4, 1, &[1u8, 2, 3, 4]).unwrap();
    /// let b = DenseArray::from_rows(2, 1, &[10i8, 20]).unwrap();
    /// let c = a.add_prefix(&b).unwrap();
    /// assert_eq!(c.data(), &[11i16, 22, 3, 4]);
    /// ```
    pub fn zip_prefix<U, F>(&self, other: &DenseArray<U>, f: F) -> Result<DenseArray<Promoted<T, U>>>
    where
        U: Scalar,
        T: Promote<U>,
        F: Fn(f64, f64) -> f64,
    {
        self.ensure_not_empty("zip_prefix")?;
        let n = other.len();
        let s = self.shape();
        let data = self
            .data()
            .iter()
            .enumerate()
            .map(|(i, &a)| {
                let v = if i < n {
                    f(a.to_f64(), other.data()[i].to_f64())
                } else {
                    a.to_f64()
                };
                Promoted::<T, U>::from_f64(v)
            })
            .collect();
        DenseArray::from_vec(s.width, s.height, s.depth, s.channels, data)
    }

    /// [`zip_prefix`](Self::zip_prefix) with addition.
    pub fn add_prefix<U: Scalar>(&self, other: &DenseArray<U>) -> Result<DenseArray<Promoted<T, U>>>
    where
        T: Promote<U>,
    {
        self.zip_prefix(other, |a, b| a + b)
    }

    // ------------------------------------------------------------------
    // Statistics
    // ------------------------------------------------------------------

    /// Smallest and largest value.
    ///
    /// NaN values are skipped unless every value is NaN.
    pub fn min_max(&self) -> Result<(T, T)> {
        self.ensure_not_empty("min_max")?;
        let data = self.data();
        let mut lo = data[0];
        let mut hi = data[0];
        for &v in &data[1..] {
            if v < lo || lo.to_f64().is_nan() {
                lo = v;
            }
            if v > hi || hi.to_f64().is_nan() {
                hi = v;
            }
        }
        Ok((lo, hi))
    }

    /// Sum of all values, accumulated in `f64`. Zero for an empty array.
    pub fn sum(&self) -> f64 {
        self.data().iter().map(|v| v.to_f64()).sum()
    }

    /// Arithmetic mean.
    pub fn mean(&self) -> Result<f64> {
        self.ensure_not_empty("mean")?;
        Ok(self.sum() / self.len() as f64)
    }

    /// Population variance.
    pub fn variance(&self) -> Result<f64> {
        let m = self.mean()?;
        let ss: f64 = self
            .data()
            .iter()
            .map(|v| {
                let d = v.to_f64() - m;
                d * d
            })
            .sum();
        Ok(ss / self.len() as f64)
    }

    /// Euclidean (L2) norm of all values.
    pub fn magnitude(&self) -> f64 {
        self.data()
            .iter()
            .map(|v| {
                let f = v.to_f64();
                f * f
            })
            .sum::<f64>()
            .sqrt()
    }

    /// Linearly rescales all values into `[a, b]`.
    ///
    /// A constant array is set to `a`. Arrays whose range is within
    /// round-off of their magnitude (`range <= 1e-12 * max(|lo|, |hi|, 1)`)
    /// count as constant.
    pub fn normalize(&mut self, a: T, b: T) -> Result<&mut Self> {
        let (lo, hi) = self.min_max()?;
        let (lo, hi) = (lo.to_f64(), hi.to_f64());
        let (a, b) = (a.to_f64(), b.to_f64());
        let range = hi - lo;
        if range <= FLAT_RANGE * lo.abs().max(hi.abs()).max(1.0) {
            warn!(value = lo, "normalize: constant array, set to lower bound");
            self.fill(T::from_f64(a));
        } else {
            self.apply_f64(|v| a + (v - lo) * (b - a) / range);
        }
        Ok(self)
    }
}

macro_rules! scalar_assign {
    ($($tr:ident :: $method:ident => $op:tt),* $(,)?) => {
        $(
            impl<T: Scalar> $tr<T> for DenseArray<T> {
                fn $method(&mut self, rhs: T) {
                    let r = rhs.to_f64();
                    self.apply_f64(|v| v $op r);
                }
            }
        )*
    };
}

scalar_assign!(
    AddAssign::add_assign => +,
    SubAssign::sub_assign => -,
    MulAssign::mul_assign => *,
    DivAssign::div_assign => /,
);
