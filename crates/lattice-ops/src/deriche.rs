//! Recursive Gaussian filtering (Deriche).
//!
//! Approximates convolution with a Gaussian of standard deviation `sigma`, or
//! with its first or second derivative, along one axis. Each line is filtered
//! by a causal pass followed by an anti-causal pass whose output is added to
//! the first, giving a zero-phase result at a cost independent of `sigma`.
//!
//! # Coefficients
//!
//! With `alpha = 1.695 / sigma`, `b1 = -2 e^-alpha` and `b2 = e^-2alpha`:
//!
//! ```text
//! forward:  y+[n] = a0 x[n]   + a1 x[n-1] - b1 y+[n-1] - b2 y+[n-2]
//! backward: y-[n] = a2 x[n+1] + a3 x[n+2] - b1 y-[n+1] - b2 y-[n+2]
//! out[n]  = y+[n] + y-[n]
//! ```
//!
//! `a0..a3` depend on the derivative order and are normalised so that a
//! constant is preserved (order 0), a unit ramp has slope 1 (order 1) and
//! `x^2 / 2` has second derivative 1 (order 2).
//!
//! # Boundary
//!
//! With [`Boundary::Neumann`] the recursions start as if the line extended
//! indefinitely with its first (forward) or last (backward) value. With
//! [`Boundary::Zero`] they start from zero.
//!
//! # Example
//!
//! ```rust
//! use lattice_core::{Axis, DenseArray};
//! use lattice_ops::correlate::Boundary;
//! use lattice_ops::deriche::{blur, deriche};
//!
//! let ramp = DenseArray::from_fn(64, 1, 1, 1, |x, _, _, _| x as f32);
//! let dx = deriche(&ramp, 3.0, 1, Axis::X, Boundary::Neumann)?;
//! assert!((dx.at(32, 0, 0, 0) - 1.0).abs() < 1e-3);
//!
//! let same = blur(&ramp, 0.0, Boundary::Neumann)?;
//! assert_eq!(same, ramp);
//! # Ok::<(), lattice_core::Error>(())
//! ```

use lattice_core::{Axis, DenseArray, Error, Result, Scalar, Shape, ToFloat};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::correlate::Boundary;
use crate::parallel::for_each_plane;

/// Smallest `sigma` used by the filter; below it order 0 is the identity.
pub const MIN_SIGMA: f64 = 0.1;

/// Deriche filter settings shared by the blur entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DericheConfig {
    /// Boundary policy.
    pub boundary: Boundary,
}

/// Recursion coefficients for one `(sigma, order)` pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DericheCoefficients {
    /// Weight of `x[n]` in the forward pass.
    pub a0: f64,
    /// Weight of `x[n-1]` in the forward pass.
    pub a1: f64,
    /// Weight of `x[n+1]` in the backward pass.
    pub a2: f64,
    /// Weight of `x[n+2]` in the backward pass.
    pub a3: f64,
    /// First feedback coefficient.
    pub b1: f64,
    /// Second feedback coefficient.
    pub b2: f64,
    /// Steady-state forward gain, used to seed Neumann boundaries.
    pub coefp: f64,
    /// Steady-state backward gain.
    pub coefn: f64,
}

impl DericheCoefficients {
    /// Computes the coefficients. `sigma` is raised to [`MIN_SIGMA`] and
    /// orders above 2 are treated as 2; use the filter functions for
    /// validated input.
    pub fn new(sigma: f64, order: u32) -> Self {
        let sigma = sigma.max(MIN_SIGMA);
        let alpha = 1.695 / sigma;
        let ema = (-alpha).exp();
        let ema2 = (-2.0 * alpha).exp();
        let b1 = -2.0 * ema;
        let b2 = ema2;
        let (a0, a1, a2, a3) = match order {
            0 => {
                let k = (1.0 - ema) * (1.0 - ema) / (1.0 + 2.0 * alpha * ema - ema2);
                (k, k * (alpha - 1.0) * ema, k * (alpha + 1.0) * ema, -k * ema2)
            }
            1 => {
                let k = -(1.0 - ema).powi(3) / (2.0 * (ema + 1.0) * ema);
                let a1 = k * ema;
                (0.0, a1, -a1, 0.0)
            }
            _ => {
                let ea = ema;
                let k = -(ema2 - 1.0) / (2.0 * alpha * ema);
                let kn = 2.0 * (-1.0 + 3.0 * ea - 3.0 * ea * ea + ea * ea * ea)
                    / (3.0 * ea + 1.0 + 3.0 * ea * ea + ea * ea * ea);
                (
                    kn,
                    -kn * (1.0 + k * alpha) * ema,
                    kn * (1.0 - k * alpha) * ema,
                    -kn * ema2,
                )
            }
        };
        let gain = 1.0 + b1 + b2;
        Self {
            a0,
            a1,
            a2,
            a3,
            b1,
            b2,
            coefp: (a0 + a1) / gain,
            coefn: (a2 + a3) / gain,
        }
    }

    /// Filters `n` samples of `buf` starting at `base`, `stride` apart.
    ///
    /// `scratch` receives the forward pass and is resized as needed.
    fn apply(
        &self,
        buf: &mut [f64],
        base: usize,
        stride: usize,
        n: usize,
        boundary: Boundary,
        scratch: &mut Vec<f64>,
    ) {
        scratch.clear();
        scratch.resize(n, 0.0);
        let at = |i: usize| base + i * stride;

        let (mut xp, mut yp, mut yb) = (0.0, 0.0, 0.0);
        if boundary == Boundary::Neumann {
            xp = buf[at(0)];
            yp = self.coefp * xp;
            yb = yp;
        }
        for m in 0..n {
            let xc = buf[at(m)];
            let yc = self.a0 * xc + self.a1 * xp - self.b1 * yp - self.b2 * yb;
            scratch[m] = yc;
            xp = xc;
            yb = yp;
            yp = yc;
        }

        let (mut xn, mut xa, mut yn, mut ya) = (0.0, 0.0, 0.0, 0.0);
        if boundary == Boundary::Neumann {
            xn = buf[at(n - 1)];
            xa = xn;
            yn = self.coefn * xn;
            ya = yn;
        }
        for m in (0..n).rev() {
            let xc = buf[at(m)];
            let yc = self.a2 * xn + self.a3 * xa - self.b1 * yn - self.b2 * ya;
            xa = xn;
            xn = xc;
            ya = yn;
            yn = yc;
            buf[at(m)] = scratch[m] + yc;
        }
    }
}

fn validate(sigma: f64, order: u32) -> Result<()> {
    if !(sigma >= 0.0) || !sigma.is_finite() {
        return Err(Error::invalid_argument(
            "deriche",
            format!("sigma must be finite and >= 0, got {sigma}"),
        ));
    }
    if order > 2 {
        return Err(Error::invalid_argument(
            "deriche",
            format!("derivative order must be 0, 1 or 2, got {order}"),
        ));
    }
    Ok(())
}

/// Filters every line of the planar buffer `buf` along `axis` in place.
fn filter_buffer(
    buf: &mut [f64],
    shape: Shape,
    sigma: f64,
    order: u32,
    axis: Axis,
    boundary: Boundary,
) {
    if order == 0 && sigma < MIN_SIGMA {
        return;
    }
    let coefs = DericheCoefficients::new(sigma, order);
    let run = |buf: &mut [f64], dims: [usize; 4]| {
        let a = axis.index();
        let n = dims[a];
        let stride: usize = dims[..a].iter().product();
        let outer: usize = dims[a + 1..].iter().product();
        let mut scratch = Vec::with_capacity(n);
        for o in 0..outer {
            for s in 0..stride {
                coefs.apply(buf, o * stride * n + s, stride, n, boundary, &mut scratch);
            }
        }
    };
    match axis {
        Axis::C => run(buf, shape.dims()),
        _ => {
            let mut dims = shape.dims();
            dims[3] = 1;
            for_each_plane(buf, shape.plane_len(), |_, plane| run(plane, dims));
        }
    }
}

/// Filters `img` along `axis` and returns the floating-point result.
///
/// `order` selects smoothing (0), first derivative (1) or second
/// derivative (2). With `order == 0` and `sigma < 0.1` the values are
/// returned unchanged.
///
/// # Errors
///
/// - [`Error::EmptyInstance`] if `img` is empty
/// - [`Error::InvalidArgument`] if `sigma < 0` or `order > 2`
pub fn deriche<T: ToFloat>(
    img: &DenseArray<T>,
    sigma: f64,
    order: u32,
    axis: Axis,
    boundary: Boundary,
) -> Result<DenseArray<T::Float>> {
    let mut out: DenseArray<T::Float> = img.cast();
    deriche_in_place(&mut out, sigma, order, axis, boundary)?;
    Ok(out)
}

/// In-place version of [`deriche`]. Values are computed in `f64` and
/// converted back to `T`.
pub fn deriche_in_place<T: Scalar>(
    img: &mut DenseArray<T>,
    sigma: f64,
    order: u32,
    axis: Axis,
    boundary: Boundary,
) -> Result<()> {
    img.ensure_not_empty("deriche")?;
    validate(sigma, order)?;
    trace!(shape = %img.shape(), sigma, order, %axis, ?boundary, "deriche");
    if order == 0 && sigma < MIN_SIGMA {
        return Ok(());
    }
    let mut buf = img.to_f64_vec();
    filter_buffer(&mut buf, img.shape(), sigma, order, axis, boundary);
    for (dst, v) in img.data_mut().iter_mut().zip(buf) {
        *dst = T::from_f64(v);
    }
    Ok(())
}

/// Gaussian blur along every spatial axis of extent greater than one.
///
/// # Errors
///
/// Same as [`deriche`].
pub fn blur<T: ToFloat>(
    img: &DenseArray<T>,
    sigma: f64,
    boundary: Boundary,
) -> Result<DenseArray<T::Float>> {
    blur_xyz(img, sigma, sigma, sigma, boundary)
}

/// Gaussian blur with a separate `sigma` per spatial axis.
pub fn blur_xyz<T: ToFloat>(
    img: &DenseArray<T>,
    sigma_x: f64,
    sigma_y: f64,
    sigma_z: f64,
    boundary: Boundary,
) -> Result<DenseArray<T::Float>> {
    img.ensure_not_empty("blur")?;
    for s in [sigma_x, sigma_y, sigma_z] {
        validate(s, 0)?;
    }
    trace!(shape = %img.shape(), sigma_x, sigma_y, sigma_z, "blur");
    let shape = img.shape();
    let mut buf = img.to_f64_vec();
    for (axis, sigma) in Axis::SPATIAL.into_iter().zip([sigma_x, sigma_y, sigma_z]) {
        if shape.extent(axis) > 1 {
            filter_buffer(&mut buf, shape, sigma, 0, axis, boundary);
        }
    }
    let mut out = DenseArray::<T::Float>::like(img);
    for (dst, v) in out.data_mut().iter_mut().zip(buf) {
        *dst = <T::Float as Scalar>::from_f64(v);
    }
    Ok(out)
}

/// First derivatives along every spatial axis of extent greater than one.
///
/// Returns `[d/dx, d/dy]` for an image and `[d/dx, d/dy, d/dz]` for a volume.
pub fn gradient_xyz<T: ToFloat>(
    img: &DenseArray<T>,
    sigma: f64,
    boundary: Boundary,
) -> Result<Vec<DenseArray<T::Float>>> {
    img.ensure_not_empty("gradient_xyz")?;
    validate(sigma, 1)?;
    Axis::SPATIAL
        .into_iter()
        .filter(|&axis| img.shape().extent(axis) > 1)
        .map(|axis| deriche(img, sigma, 1, axis, boundary))
        .collect()
}
