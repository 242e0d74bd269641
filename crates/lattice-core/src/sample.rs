//! Interpolated reads at fractional coordinates.
//!
//! Reads go through a [`Sampler`], a borrowed view obtained with
//! [`DenseArray::sampler`]. Building the view fails with
//! [`Error::EmptyInstance`](crate::Error::EmptyInstance) on an empty array, so
//! the readers themselves never see one.
//!
//! Every reader first clamps the query coordinate into the valid range
//! `[0, extent - 1]` of each interpolated axis, then samples with Neumann
//! (clamp-to-edge) neighbours. The clamping is part of the reader and does not
//! depend on the boundary policy of the operator calling it.
//!
//! - [`Sampler::nearest_at`] - nearest sample
//! - [`Sampler::linear_at_x`], [`linear_at_xy`](Sampler::linear_at_xy),
//!   [`linear_at_xyz`](Sampler::linear_at_xyz) - (bi/tri)linear
//! - [`Sampler::cubic_at_x`], [`cubic_at_xy`](Sampler::cubic_at_xy),
//!   [`cubic_at_xyz`](Sampler::cubic_at_xyz) - Catmull-Rom cubic
//!
//! # Example
//!
//! ```rust
//! use lattice_core::DenseArray;
//!
//! let ramp = DenseArray::from_fn(4, 1, 1, 1, |x, _, _, _| x as f32);
//! let s = ramp.sampler()?;
//! assert_eq!(s.linear_at_x(1.25, 0, 0, 0), 1.25);
//! assert_eq!(s.linear_at_x(-3.0, 0, 0, 0), 0.0);
//! assert_eq!(s.linear_at_x(10.0, 0, 0, 0), 3.0);
//!
//! assert!(DenseArray::<f32>::empty().sampler().is_err());
//! # Ok::<(), lattice_core::Error>(())
//! ```

use crate::{DenseArray, Result, Scalar};

/// Clamps `v` into `[0, n - 1]`.
#[inline]
fn clamp_coord(v: f64, n: usize) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, (n - 1) as f64)
    }
}

/// Splits a clamped coordinate into its integer cell and fraction.
#[inline]
fn split(v: f64, n: usize) -> (usize, f64) {
    let v = clamp_coord(v, n);
    let i = v.floor() as usize;
    (i, v - i as f64)
}

/// Catmull-Rom interpolation between `p1` and `p2`.
#[inline]
fn catmull_rom(p0: f64, p1: f64, p2: f64, p3: f64, t: f64) -> f64 {
    let t2 = t * t;
    let t3 = t2 * t;
    p1 + 0.5
        * (t * (p2 - p0)
            + t2 * (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3)
            + t3 * (-p0 + 3.0 * p1 - 3.0 * p2 + p3))
}

/// Interpolating view of a non-empty array.
#[derive(Debug, Clone, Copy)]
pub struct Sampler<'a, T: Scalar> {
    array: &'a DenseArray<T>,
}

impl<T: Scalar> DenseArray<T> {
    /// Interpolating view of this array.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyInstance`](crate::Error::EmptyInstance) for an empty array.
    pub fn sampler(&self) -> Result<Sampler<'_, T>> {
        self.ensure_not_empty("sampler")?;
        Ok(Sampler { array: self })
    }
}

impl<'a, T: Scalar> Sampler<'a, T> {
    /// The sampled array.
    pub fn array(&self) -> &'a DenseArray<T> {
        self.array
    }

    fn width(&self) -> usize {
        self.array.width()
    }

    fn height(&self) -> usize {
        self.array.height()
    }

    fn depth(&self) -> usize {
        self.array.depth()
    }

    #[inline]
    fn raw(&self, x: usize, y: usize, z: usize, c: usize) -> f64 {
        self.array.data()[self.array.shape().offset(x, y, z, c)].to_f64()
    }

    /// Value of the sample nearest to `(fx, fy, fz)`.
    pub fn nearest_at(&self, fx: f64, fy: f64, fz: f64, c: usize) -> T {
        let x = (clamp_coord(fx, self.width()) + 0.5).floor() as usize;
        let y = (clamp_coord(fy, self.height()) + 0.5).floor() as usize;
        let z = (clamp_coord(fz, self.depth()) + 0.5).floor() as usize;
        self.array.at(
            x.min(self.width() - 1),
            y.min(self.height() - 1),
            z.min(self.depth() - 1),
            c,
        )
    }

    /// Linear interpolation along x.
    pub fn linear_at_x(&self, fx: f64, y: usize, z: usize, c: usize) -> f64 {
        let (x0, dx) = split(fx, self.width());
        let x1 = (x0 + 1).min(self.width() - 1);
        let a = self.raw(x0, y, z, c);
        let b = self.raw(x1, y, z, c);
        a + dx * (b - a)
    }

    /// Bilinear interpolation in the xy plane.
    pub fn linear_at_xy(&self, fx: f64, fy: f64, z: usize, c: usize) -> f64 {
        let (x0, dx) = split(fx, self.width());
        let (y0, dy) = split(fy, self.height());
        let x1 = (x0 + 1).min(self.width() - 1);
        let y1 = (y0 + 1).min(self.height() - 1);
        let icc = self.raw(x0, y0, z, c);
        let inc = self.raw(x1, y0, z, c);
        let icn = self.raw(x0, y1, z, c);
        let inn = self.raw(x1, y1, z, c);
        icc + dx * (inc - icc + dy * (icc + inn - icn - inc)) + dy * (icn - icc)
    }

    /// Trilinear interpolation.
    pub fn linear_at_xyz(&self, fx: f64, fy: f64, fz: f64, c: usize) -> f64 {
        let (z0, dz) = split(fz, self.depth());
        let z1 = (z0 + 1).min(self.depth() - 1);
        let a = self.linear_at_xy(fx, fy, z0, c);
        if dz == 0.0 {
            return a;
        }
        let b = self.linear_at_xy(fx, fy, z1, c);
        a + dz * (b - a)
    }

    /// Catmull-Rom cubic interpolation along x.
    pub fn cubic_at_x(&self, fx: f64, y: usize, z: usize, c: usize) -> f64 {
        let w = self.width() as isize;
        let (x, dx) = split(fx, self.width());
        let x = x as isize;
        let at = |i: isize| self.raw(i.clamp(0, w - 1) as usize, y, z, c);
        catmull_rom(at(x - 1), at(x), at(x + 1), at(x + 2), dx)
    }

    /// Bicubic (Catmull-Rom) interpolation in the xy plane.
    pub fn cubic_at_xy(&self, fx: f64, fy: f64, z: usize, c: usize) -> f64 {
        let w = self.width() as isize;
        let h = self.height() as isize;
        let (x, dx) = split(fx, self.width());
        let (y, dy) = split(fy, self.height());
        let (x, y) = (x as isize, y as isize);
        let row = |j: isize| {
            let yy = j.clamp(0, h - 1) as usize;
            let at = |i: isize| self.raw(i.clamp(0, w - 1) as usize, yy, z, c);
            catmull_rom(at(x - 1), at(x), at(x + 1), at(x + 2), dx)
        };
        catmull_rom(row(y - 1), row(y), row(y + 1), row(y + 2), dy)
    }

    /// Tricubic (Catmull-Rom) interpolation.
    pub fn cubic_at_xyz(&self, fx: f64, fy: f64, fz: f64, c: usize) -> f64 {
        let d = self.depth() as isize;
        let (z, dz) = split(fz, self.depth());
        let z = z as isize;
        let slice = |k: isize| self.cubic_at_xy(fx, fy, k.clamp(0, d - 1) as usize, c);
        catmull_rom(slice(z - 1), slice(z), slice(z + 1), slice(z + 2), dz)
    }
}
