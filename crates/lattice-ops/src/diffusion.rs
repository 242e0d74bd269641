//! Edge-preserving anisotropic smoothing by line integral convolution.
//!
//! Rather than time-stepping a diffusion PDE, the smoother averages each
//! pixel along short curves traced through a tensor field (see
//! [`tensor`](crate::tensor)). For every direction `theta` of a regular
//! angular sampling, the field `W = G * theta` gives a local step. Curves
//! follow `W` for a length proportional to `|W|`, so they run long along
//! edges and stop almost immediately across them.
//!
//! # Algorithm
//!
//! For each angle and each pixel `p`:
//!
//! 1. `n = max(1e-5, |G(p) theta|)`, step `dl * W / n`,
//!    `fsigma = n * sqrt(2 * amplitude)`, curve length `gauss_prec * fsigma`
//! 2. walk the curve from `p` in steps of `dl`, flipping each new step that
//!    points against the previous one
//! 3. accumulate `exp(-l^2 / (2 fsigma^2)) * I(curve(l))` and the weights
//!
//! The pixel gets `sum / weight`, or its own value if nothing was
//! accumulated, averaged over all angles and clamped to the input range.
//!
//! # Example
//!
//! ```rust
//! use lattice_core::DenseArray;
//! use lattice_ops::diffusion::{blur_anisotropic, DiffusionParams};
//!
//! let img = DenseArray::from_fn(16, 16, 1, 1, |x, _, _, _| if x < 8 { 0u8 } else { 200 });
//! let params = DiffusionParams { amplitude: 10.0, ..Default::default() };
//! let out = blur_anisotropic(&img, &params)?;
//! assert_eq!(out.shape(), img.shape());
//! # Ok::<(), lattice_core::Error>(())
//! ```

use glam::{DVec2, DVec3};
use lattice_core::{DenseArray, Error, Result, Sampler, Scalar};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::parallel::for_each_plane;
use crate::tensor::{diffusion_tensors, ensure_tensor_field, TensorScheme};

/// How curves sample the direction field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    /// Nearest pixel; image samples are also nearest.
    #[default]
    Nearest,
    /// Bilinear (trilinear in 3D).
    Linear,
    /// Second-order Runge-Kutta: the step is read at the midpoint of a
    /// half step.
    RungeKutta2,
}

/// Parameters of [`blur_anisotropic`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffusionParams {
    /// Overall smoothing strength (>= 0).
    pub amplitude: f64,
    /// Contour preservation (>= 0).
    pub sharpness: f64,
    /// Smoothing anisotropy, in `[0, 1]`.
    pub anisotropy: f64,
    /// Pre-blur of the image before computing structure tensors.
    pub alpha: f64,
    /// Blur of the structure tensor field.
    pub sigma: f64,
    /// Spatial integration step (> 0).
    pub dl: f64,
    /// Angular step in degrees (> 0).
    pub da: f64,
    /// Curve length in units of the local Gaussian scale (> 0).
    pub gauss_prec: f64,
    /// Direction field sampling.
    pub interpolation: Interpolation,
    /// Uniform weights along curves instead of Gaussian ones.
    pub fast_approx: bool,
    /// Offsets the first angle by half the remainder of `360 / da`.
    pub phase_shift: bool,
    /// Gradient scheme for the structure tensors.
    pub tensor_scheme: TensorScheme,
}

impl Default for DiffusionParams {
    fn default() -> Self {
        Self {
            amplitude: 60.0,
            sharpness: 0.7,
            anisotropy: 0.6,
            alpha: 0.6,
            sigma: 1.1,
            dl: 0.8,
            da: 30.0,
            gauss_prec: 2.0,
            interpolation: Interpolation::Nearest,
            fast_approx: false,
            phase_shift: true,
            tensor_scheme: TensorScheme::ForwardBackward,
        }
    }
}

impl DiffusionParams {
    /// Checks parameter ranges.
    pub fn validate(&self) -> Result<()> {
        let bad = |reason: String| Err(Error::invalid_argument("blur_anisotropic", reason));
        if !(self.amplitude >= 0.0) {
            return bad(format!("amplitude must be >= 0, got {}", self.amplitude));
        }
        if !(self.sharpness >= 0.0) {
            return bad(format!("sharpness must be >= 0, got {}", self.sharpness));
        }
        if !(0.0..=1.0).contains(&self.anisotropy) {
            return bad(format!("anisotropy must be in [0, 1], got {}", self.anisotropy));
        }
        if !(self.alpha >= 0.0) || !(self.sigma >= 0.0) {
            return bad(format!("alpha and sigma must be >= 0, got {} and {}", self.alpha, self.sigma));
        }
        for (name, v) in [("dl", self.dl), ("da", self.da), ("gauss_prec", self.gauss_prec)] {
            if !(v > 0.0) || !v.is_finite() {
                return bad(format!("{name} must be > 0, got {v}"));
            }
        }
        Ok(())
    }
}

/// Smooths `img` along the structures it contains.
///
/// Computes the tensor field with
/// [`diffusion_tensors`](crate::tensor::diffusion_tensors) and applies
/// [`blur_anisotropic_with`]. An `amplitude` of zero returns a copy.
///
/// # Errors
///
/// - [`Error::EmptyInstance`] if `img` is empty
/// - [`Error::InvalidArgument`] if a parameter is out of range
pub fn blur_anisotropic<T: Scalar>(img: &DenseArray<T>, params: &DiffusionParams) -> Result<DenseArray<T>> {
    img.ensure_not_empty("blur_anisotropic")?;
    params.validate()?;
    let tensors = diffusion_tensors(
        img,
        params.sharpness,
        params.anisotropy,
        params.alpha,
        params.sigma,
        params.tensor_scheme,
    )?;
    blur_anisotropic_with(img, &tensors, params)
}

/// Smooths `img` along curves of a caller-supplied tensor field.
///
/// `tensors` must have the spatial shape of `img` and 3 (2D) or 6 (3D)
/// channels. Only `amplitude`, `dl`, `da`, `gauss_prec`, `interpolation`,
/// `fast_approx` and `phase_shift` are used.
///
/// # Errors
///
/// - [`Error::EmptyInstance`] if `img` is empty
/// - [`Error::InvalidArgument`] if a parameter is out of range
/// - [`Error::ShapeMismatch`] if the tensor field does not fit `img`
pub fn blur_anisotropic_with<T: Scalar>(
    img: &DenseArray<T>,
    tensors: &DenseArray<f64>,
    params: &DiffusionParams,
) -> Result<DenseArray<T>> {
    img.ensure_not_empty("blur_anisotropic")?;
    params.validate()?;
    let shape = img.shape();
    ensure_tensor_field(shape, tensors, "blur_anisotropic")?;
    trace!(%shape, amplitude = params.amplitude, da = params.da, dl = params.dl, "blur_anisotropic");

    if params.amplitude == 0.0 {
        return Ok(img.clone());
    }
    let (lo, hi) = img.min_max()?;
    let (lo, hi) = (lo.to_f64(), hi.to_f64());
    let src = img.cast::<f64>();
    let mut acc = DenseArray::<f64>::like(img);

    let angles = if shape.is_3d() {
        sphere_directions(params)
    } else {
        circle_directions(params)
    };
    debug!(angles = angles.len(), "blur_anisotropic: angular samples");

    let plane = shape.plane_len();
    let mut steps = DenseArray::<f64>::new(shape.width, shape.height, shape.depth, 4);
    for &dir in &angles {
        step_field(tensors, dir, params, &mut steps);
        let integrator = Integrator { src: src.sampler()?, steps: steps.sampler()?, params };
        for_each_plane(acc.data_mut(), plane, |c, out| {
            for z in 0..shape.depth {
                for y in 0..shape.height {
                    for x in 0..shape.width {
                        out[shape.offset(x, y, z, 0)] += integrator.pixel(x, y, z, c);
                    }
                }
            }
        });
    }

    let n = angles.len().max(1) as f64;
    let mut out = DenseArray::<T>::like(img);
    for (dst, &v) in out.data_mut().iter_mut().zip(acc.data()) {
        *dst = T::from_f64((v / n).clamp(lo, hi));
    }
    Ok(out)
}

/// Unit directions sampling the circle every `da` degrees.
fn circle_directions(params: &DiffusionParams) -> Vec<DVec3> {
    let start = if params.phase_shift { (360.0 % params.da) / 2.0 } else { 0.0 };
    let mut dirs = Vec::new();
    let mut theta = start;
    while theta < 360.0 {
        let (s, c) = theta.to_radians().sin_cos();
        dirs.push(DVec3::new(c, s, 0.0));
        theta += params.da;
    }
    dirs
}

/// Directions sampling the sphere: latitude every `da` degrees, longitude
/// every `da / cos(latitude)` degrees.
fn sphere_directions(params: &DiffusionParams) -> Vec<DVec3> {
    let start = if params.phase_shift { (180.0 % params.da) / 2.0 } else { 0.0 };
    let mut dirs = Vec::new();
    let mut phi = -90.0 + start;
    while phi <= 90.0 {
        let (sp, cp) = phi.to_radians().sin_cos();
        let step = if cp * 360.0 > params.da { params.da / cp } else { 360.0 };
        let mut theta: f64 = 0.0;
        while theta < 360.0 {
            let (st, ct) = theta.to_radians().sin_cos();
            dirs.push(DVec3::new(ct * cp, st * cp, sp));
            theta += step;
        }
        phi += params.da;
    }
    dirs
}

/// Fills `steps` with the per-pixel step `(dx, dy, dz)` and Gaussian scale
/// for direction `dir`.
fn step_field(tensors: &DenseArray<f64>, dir: DVec3, params: &DiffusionParams, steps: &mut DenseArray<f64>) {
    let shape = steps.shape();
    let plane = shape.plane_len();
    let t = tensors.data();
    let sqrt2amp = (2.0 * params.amplitude).sqrt();
    let data = steps.data_mut();
    for i in 0..plane {
        let w = if shape.is_3d() {
            let g = |k: usize| t[i + k * plane];
            DVec3::new(
                g(0) * dir.x + g(1) * dir.y + g(2) * dir.z,
                g(1) * dir.x + g(3) * dir.y + g(4) * dir.z,
                g(2) * dir.x + g(4) * dir.y + g(5) * dir.z,
            )
        } else {
            let (a, b, c) = (t[i], t[i + plane], t[i + 2 * plane]);
            DVec3::new(a * dir.x + b * dir.y, b * dir.x + c * dir.y, 0.0)
        };
        let n = w.length().max(1e-5);
        let step = w * (params.dl / n);
        data[i] = step.x;
        data[i + plane] = step.y;
        data[i + 2 * plane] = step.z;
        data[i + 3 * plane] = n * sqrt2amp;
    }
}

/// Traces curves through one step field.
struct Integrator<'a> {
    src: Sampler<'a, f64>,
    steps: Sampler<'a, f64>,
    params: &'a DiffusionParams,
}

impl Integrator<'_> {
    fn inside(&self, p: DVec3) -> bool {
        let s = self.src.array().shape();
        p.x >= 0.0
            && p.y >= 0.0
            && p.z >= 0.0
            && p.x <= (s.width - 1) as f64
            && p.y <= (s.height - 1) as f64
            && p.z <= (s.depth - 1) as f64
    }

    fn step_nearest(&self, p: DVec3) -> DVec3 {
        let s = self.steps;
        DVec3::new(
            s.nearest_at(p.x, p.y, p.z, 0),
            s.nearest_at(p.x, p.y, p.z, 1),
            s.nearest_at(p.x, p.y, p.z, 2),
        )
    }

    fn step_linear(&self, p: DVec3) -> DVec3 {
        let s = self.steps;
        if s.array().depth() > 1 {
            DVec3::new(
                s.linear_at_xyz(p.x, p.y, p.z, 0),
                s.linear_at_xyz(p.x, p.y, p.z, 1),
                s.linear_at_xyz(p.x, p.y, p.z, 2),
            )
        } else {
            let v = DVec2::new(s.linear_at_xy(p.x, p.y, 0, 0), s.linear_at_xy(p.x, p.y, 0, 1));
            v.extend(0.0)
        }
    }

    fn sample(&self, p: DVec3, c: usize) -> f64 {
        match self.params.interpolation {
            Interpolation::Nearest => self.src.nearest_at(p.x, p.y, p.z, c),
            _ if self.src.array().depth() > 1 => self.src.linear_at_xyz(p.x, p.y, p.z, c),
            _ => self.src.linear_at_xy(p.x, p.y, 0, c),
        }
    }

    /// Gaussian-weighted average of channel `c` along the curve from `(x, y, z)`.
    fn pixel(&self, x: usize, y: usize, z: usize, c: usize) -> f64 {
        let fsigma = self.steps.array().at(x, y, z, 3);
        let length = self.params.gauss_prec * fsigma;
        let fsigma2 = 2.0 * fsigma * fsigma;
        let dl = self.params.dl;

        let mut p = DVec3::new(x as f64, y as f64, z as f64);
        let mut prev = self.step_nearest(p);
        let (mut sum, mut weight) = (0.0, 0.0);
        let mut l = 0.0;
        while l < length && self.inside(p) {
            let mut d = match self.params.interpolation {
                Interpolation::Nearest => self.step_nearest(p),
                Interpolation::Linear => self.step_linear(p),
                Interpolation::RungeKutta2 => {
                    let half = self.step_linear(p) * 0.5;
                    self.step_linear(p + half)
                }
            };
            if d.dot(prev) < 0.0 {
                d = -d;
            }
            let w = if self.params.fast_approx {
                1.0
            } else {
                (-l * l / fsigma2).exp()
            };
            sum += w * self.sample(p, c);
            weight += w;
            p += d;
            prev = d;
            l += dl;
        }
        if weight > 0.0 {
            sum / weight
        } else {
            self.src.array().at(x, y, z, c)
        }
    }
}
