//! Rolling neighbourhood windows.
//!
//! A [`Window`] holds the `NX x NY x NZ` samples around a pixel. The pixel
//! sits at index `(N - 1) / 2` along each axis, so the offsets covered are:
//!
//! | N | offsets      |
//! |---|--------------|
//! | 2 | `0, 1`       |
//! | 3 | `-1, 0, 1`   |
//! | 4 | `-1, 0, 1, 2`|
//! | 5 | `-2 ..= 2`   |
//!
//! [`StencilScan`] visits every pixel of one channel in raster order and
//! yields the window for each. Along a row the window is shifted by one
//! column and only the new column is fetched, so every sample is read once
//! per row and window position rather than once per kernel tap. Neighbours
//! outside the array take the value of the nearest sample (Neumann boundary).
//!
//! # Example
//!
//! ```rust
//! use lattice_core::DenseArray;
//! use lattice_ops::stencil::{StencilScan, Window3};
//!
//! let img = DenseArray::from_fn(4, 4, 1, 1, |x, y, _, _| (x + 4 * y) as f32);
//! for (x, y, _, w) in StencilScan::<_, 3, 3, 1>::new(&img, 0) {
//!     let w: Window3 = w;
//!     assert_eq!(w.cc(), (x + 4 * y) as f64);
//! }
//! ```

use lattice_core::{DenseArray, Scalar};

/// Fixed-size neighbourhood of `f64` samples, indexed `[z][y][x]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window<const NX: usize, const NY: usize, const NZ: usize> {
    v: [[[f64; NX]; NY]; NZ],
}

/// 2x2 window.
pub type Window2 = Window<2, 2, 1>;
/// 3x3 window.
pub type Window3 = Window<3, 3, 1>;
/// 4x4 window.
pub type Window4 = Window<4, 4, 1>;
/// 5x5 window.
pub type Window5 = Window<5, 5, 1>;
/// 2x2x2 window.
pub type Window2x2x2 = Window<2, 2, 2>;
/// 3x3x3 window.
pub type Window3x3x3 = Window<3, 3, 3>;

impl<const NX: usize, const NY: usize, const NZ: usize> Default for Window<NX, NY, NZ> {
    fn default() -> Self {
        Self {
            v: [[[0.0; NX]; NY]; NZ],
        }
    }
}

impl<const NX: usize, const NY: usize, const NZ: usize> Window<NX, NY, NZ> {
    /// Index of the centre along x.
    pub const OX: usize = (NX - 1) / 2;
    /// Index of the centre along y.
    pub const OY: usize = (NY - 1) / 2;
    /// Index of the centre along z.
    pub const OZ: usize = (NZ - 1) / 2;

    /// Sample at offset `(dx, dy, dz)` from the centre.
    ///
    /// # Panics
    ///
    /// Panics if the offset lies outside the window.
    #[inline]
    pub fn at(&self, dx: isize, dy: isize, dz: isize) -> f64 {
        self.v[(dz + Self::OZ as isize) as usize][(dy + Self::OY as isize) as usize]
            [(dx + Self::OX as isize) as usize]
    }

    /// Samples in x-fastest order.
    #[inline]
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.v.iter().flatten().flatten().copied()
    }

    /// Dot product with `weights` laid out x-fastest, then y, then z.
    #[inline]
    pub fn dot(&self, weights: &[f64]) -> f64 {
        self.values().zip(weights).map(|(a, &b)| a * b).sum()
    }

    /// Sum of squared samples.
    #[inline]
    pub fn sum_sq(&self) -> f64 {
        self.values().map(|a| a * a).sum()
    }

    fn load<T: Scalar>(&mut self, img: &DenseArray<T>, x: usize, y: usize, z: usize, c: usize) {
        for k in 0..NZ {
            let sz = z as isize + k as isize - Self::OZ as isize;
            for j in 0..NY {
                let sy = y as isize + j as isize - Self::OY as isize;
                for i in 0..NX {
                    let sx = x as isize + i as isize - Self::OX as isize;
                    self.v[k][j][i] = img.at_clamped(sx, sy, sz, c).to_f64();
                }
            }
        }
    }

    fn shift<T: Scalar>(&mut self, img: &DenseArray<T>, x: usize, y: usize, z: usize, c: usize) {
        let sx = x as isize + (NX - 1) as isize - Self::OX as isize;
        for k in 0..NZ {
            let sz = z as isize + k as isize - Self::OZ as isize;
            for j in 0..NY {
                let sy = y as isize + j as isize - Self::OY as isize;
                let row = &mut self.v[k][j];
                row.copy_within(1.., 0);
                row[NX - 1] = img.at_clamped(sx, sy, sz, c).to_f64();
            }
        }
    }
}

impl Window3 {
    /// `(x - 1, y - 1)`
    #[inline]
    pub fn pp(&self) -> f64 {
        self.v[0][0][0]
    }
    /// `(x, y - 1)`
    #[inline]
    pub fn cp(&self) -> f64 {
        self.v[0][0][1]
    }
    /// `(x + 1, y - 1)`
    #[inline]
    pub fn np(&self) -> f64 {
        self.v[0][0][2]
    }
    /// `(x - 1, y)`
    #[inline]
    pub fn pc(&self) -> f64 {
        self.v[0][1][0]
    }
    /// `(x, y)`
    #[inline]
    pub fn cc(&self) -> f64 {
        self.v[0][1][1]
    }
    /// `(x + 1, y)`
    #[inline]
    pub fn nc(&self) -> f64 {
        self.v[0][1][2]
    }
    /// `(x - 1, y + 1)`
    #[inline]
    pub fn pn(&self) -> f64 {
        self.v[0][2][0]
    }
    /// `(x, y + 1)`
    #[inline]
    pub fn cn(&self) -> f64 {
        self.v[0][2][1]
    }
    /// `(x + 1, y + 1)`
    #[inline]
    pub fn nn(&self) -> f64 {
        self.v[0][2][2]
    }
}

impl Window3x3x3 {
    /// `(x, y, z)`
    #[inline]
    pub fn ccc(&self) -> f64 {
        self.v[1][1][1]
    }
    /// `(x - 1, y, z)`
    #[inline]
    pub fn pcc(&self) -> f64 {
        self.v[1][1][0]
    }
    /// `(x + 1, y, z)`
    #[inline]
    pub fn ncc(&self) -> f64 {
        self.v[1][1][2]
    }
    /// `(x, y - 1, z)`
    #[inline]
    pub fn cpc(&self) -> f64 {
        self.v[1][0][1]
    }
    /// `(x, y + 1, z)`
    #[inline]
    pub fn cnc(&self) -> f64 {
        self.v[1][2][1]
    }
    /// `(x, y, z - 1)`
    #[inline]
    pub fn ccp(&self) -> f64 {
        self.v[0][1][1]
    }
    /// `(x, y, z + 1)`
    #[inline]
    pub fn ccn(&self) -> f64 {
        self.v[2][1][1]
    }
}

/// Raster-order scan of one channel yielding `(x, y, z, window)`.
#[derive(Debug, Clone)]
pub struct StencilScan<'a, T: Scalar, const NX: usize, const NY: usize, const NZ: usize> {
    img: &'a DenseArray<T>,
    c: usize,
    x: usize,
    y: usize,
    z: usize,
    window: Window<NX, NY, NZ>,
}

impl<'a, T: Scalar, const NX: usize, const NY: usize, const NZ: usize> StencilScan<'a, T, NX, NY, NZ> {
    /// Starts a scan of channel `c`. An empty array or an out-of-range
    /// channel yields nothing.
    pub fn new(img: &'a DenseArray<T>, c: usize) -> Self {
        let z = if img.is_empty() || c >= img.channels() {
            img.depth()
        } else {
            0
        };
        Self {
            img,
            c,
            x: 0,
            y: 0,
            z,
            window: Window::default(),
        }
    }
}

impl<T: Scalar, const NX: usize, const NY: usize, const NZ: usize> Iterator
    for StencilScan<'_, T, NX, NY, NZ>
{
    type Item = (usize, usize, usize, Window<NX, NY, NZ>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.z >= self.img.depth() {
            return None;
        }
        let (x, y, z) = (self.x, self.y, self.z);
        if x == 0 {
            self.window.load(self.img, x, y, z, self.c);
        } else {
            self.window.shift(self.img, x, y, z, self.c);
        }

        self.x += 1;
        if self.x == self.img.width() {
            self.x = 0;
            self.y += 1;
            if self.y == self.img.height() {
                self.y = 0;
                self.z += 1;
            }
        }
        Some((x, y, z, self.window))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let s = self.img.shape();
        let done = self.x + s.width * (self.y + s.height * self.z);
        let n = s.plane_len().saturating_sub(done);
        (n, Some(n))
    }
}

impl<T: Scalar, const NX: usize, const NY: usize, const NZ: usize> ExactSizeIterator
    for StencilScan<'_, T, NX, NY, NZ>
{
}
