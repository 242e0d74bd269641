//! Structure and diffusion tensor fields.
//!
//! A tensor field is a `DenseArray<f64>` with the spatial shape of its
//! image and one channel per unique entry of a symmetric matrix:
//!
//! | image | channels | layout                         |
//! |-------|----------|--------------------------------|
//! | 2D    | 3        | `xx, xy, yy`                   |
//! | 3D    | 6        | `xx, xy, xz, yy, yz, zz`       |
//!
//! [`structure_tensors`] accumulates gradient outer products over all image
//! channels. [`diffusion_tensors`] turns a regularised structure tensor
//! field into the field that steers
//! [`blur_anisotropic_with`](crate::diffusion::blur_anisotropic_with):
//! large along edges, small across them.

use glam::{DVec2, DVec3};
use lattice_core::{DenseArray, Error, Result, Scalar, Shape};
use lattice_math::{symmetric_eigen_2x2, symmetric_eigen_3x3};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::correlate::Boundary;
use crate::deriche::blur;
use crate::stencil::{StencilScan, Window3, Window3x3x3};

/// Finite-difference scheme for gradients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TensorScheme {
    /// Centred differences `(I[x+1] - I[x-1]) / 2`.
    Centered,
    /// Averages forward and backward difference products, which keeps
    /// one-pixel-wide structures visible.
    #[default]
    ForwardBackward,
}

/// Number of tensor channels for an image of this shape.
pub fn tensor_channels(shape: Shape) -> usize {
    if shape.is_3d() { 6 } else { 3 }
}

/// Checks that `tensors` is a valid tensor field for an image of `shape`.
pub fn ensure_tensor_field(shape: Shape, tensors: &DenseArray<f64>, op: &'static str) -> Result<()> {
    let expected = shape.with_channels(tensor_channels(shape));
    if tensors.shape() != expected {
        return Err(Error::shape_mismatch(op, expected, tensors.shape()));
    }
    Ok(())
}

/// Computes the structure tensor of every pixel, summed over channels.
///
/// # Errors
///
/// [`Error::EmptyInstance`] if `img` is empty.
///
/// # Example
///
/// ```rust
/// use lattice_core::DenseArray;
/// use lattice_ops::tensor::{structure_tensors, TensorScheme};
///
/// let img = DenseArray::from_fn(8, 8, 1, 1, |x, _, _, _| 2.0 * x as f32);
/// let t = structure_tensors(&img, TensorScheme::Centered)?;
/// assert_eq!(t.channels(), 3);
/// assert_eq!(t.at(4, 4, 0, 0), 4.0); // xx
/// assert_eq!(t.at(4, 4, 0, 2), 0.0); // yy
/// # Ok::<(), lattice_core::Error>(())
/// ```
pub fn structure_tensors<T: Scalar>(img: &DenseArray<T>, scheme: TensorScheme) -> Result<DenseArray<f64>> {
    img.ensure_not_empty("structure_tensors")?;
    let shape = img.shape();
    trace!(%shape, ?scheme, "structure_tensors");

    let mut out = DenseArray::with_shape(shape.with_channels(tensor_channels(shape)), 0.0f64);
    let plane = shape.plane_len();
    let data = out.data_mut();

    for c in 0..shape.channels {
        if shape.is_3d() {
            for (x, y, z, w) in StencilScan::<_, 3, 3, 3>::new(img, c) {
                let t = tensor_3d(&w, scheme);
                let i = shape.offset(x, y, z, 0);
                for (k, v) in t.into_iter().enumerate() {
                    data[i + k * plane] += v;
                }
            }
        } else {
            for (x, y, z, w) in StencilScan::<_, 3, 3, 1>::new(img, c) {
                let t = tensor_2d(&w, scheme);
                let i = shape.offset(x, y, z, 0);
                for (k, v) in t.into_iter().enumerate() {
                    data[i + k * plane] += v;
                }
            }
        }
    }
    Ok(out)
}

fn tensor_2d(w: &Window3, scheme: TensorScheme) -> [f64; 3] {
    match scheme {
        TensorScheme::Centered => {
            let ix = 0.5 * (w.nc() - w.pc());
            let iy = 0.5 * (w.cn() - w.cp());
            [ix * ix, ix * iy, iy * iy]
        }
        TensorScheme::ForwardBackward => {
            let (ixf, ixb) = (w.nc() - w.cc(), w.cc() - w.pc());
            let (iyf, iyb) = (w.cn() - w.cc(), w.cc() - w.cp());
            [
                0.5 * (ixf * ixf + ixb * ixb),
                0.25 * (ixf + ixb) * (iyf + iyb),
                0.5 * (iyf * iyf + iyb * iyb),
            ]
        }
    }
}

fn tensor_3d(w: &Window3x3x3, scheme: TensorScheme) -> [f64; 6] {
    match scheme {
        TensorScheme::Centered => {
            let ix = 0.5 * (w.ncc() - w.pcc());
            let iy = 0.5 * (w.cnc() - w.cpc());
            let iz = 0.5 * (w.ccn() - w.ccp());
            [ix * ix, ix * iy, ix * iz, iy * iy, iy * iz, iz * iz]
        }
        TensorScheme::ForwardBackward => {
            let (ixf, ixb) = (w.ncc() - w.ccc(), w.ccc() - w.pcc());
            let (iyf, iyb) = (w.cnc() - w.ccc(), w.ccc() - w.cpc());
            let (izf, izb) = (w.ccn() - w.ccc(), w.ccc() - w.ccp());
            [
                0.5 * (ixf * ixf + ixb * ixb),
                0.25 * (ixf + ixb) * (iyf + iyb),
                0.25 * (ixf + ixb) * (izf + izb),
                0.5 * (iyf * iyf + iyb * iyb),
                0.25 * (iyf + iyb) * (izf + izb),
                0.5 * (izf * izf + izb * izb),
            ]
        }
    }
}

/// Builds the diffusion tensor field that steers anisotropic smoothing.
///
/// 1. Blurs `img` by `alpha` and rescales it to `[0, 255]`.
/// 2. Computes [`structure_tensors`] and blurs them by `sigma`.
/// 3. Replaces each tensor's eigenvalues: with `s = 1 + sum(lambda)`,
///    directions along the structure get `s^(-sharpness/2)` and the
///    gradient direction gets `s^(-p2)` with
///    `p2 = (sharpness/2) / (1 - anisotropy)`.
/// 4. Divides the field by its largest along-structure diffusivity.
///
/// `anisotropy = 0` gives isotropic tensors; values close to 1 stop
/// diffusion across edges almost entirely.
///
/// # Errors
///
/// - [`Error::EmptyInstance`] if `img` is empty
/// - [`Error::InvalidArgument`] for negative `sharpness`, `alpha` or
///   `sigma`, or `anisotropy` outside `[0, 1]`
pub fn diffusion_tensors<T: Scalar>(
    img: &DenseArray<T>,
    sharpness: f64,
    anisotropy: f64,
    alpha: f64,
    sigma: f64,
    scheme: TensorScheme,
) -> Result<DenseArray<f64>> {
    img.ensure_not_empty("diffusion_tensors")?;
    if !(sharpness >= 0.0) {
        return Err(Error::invalid_argument(
            "diffusion_tensors",
            format!("sharpness must be >= 0, got {sharpness}"),
        ));
    }
    if !(0.0..=1.0).contains(&anisotropy) {
        return Err(Error::invalid_argument(
            "diffusion_tensors",
            format!("anisotropy must be in [0, 1], got {anisotropy}"),
        ));
    }
    trace!(shape = %img.shape(), sharpness, anisotropy, alpha, sigma, "diffusion_tensors");

    let mut pre = blur(&img.cast::<f64>(), alpha, Boundary::Neumann)?;
    pre.normalize(0.0, 255.0)?;
    let mut field = blur(&structure_tensors(&pre, scheme)?, sigma, Boundary::Neumann)?;

    let p1 = 0.5 * sharpness;
    let p2 = p1 / (1e-7 + 1.0 - anisotropy);
    let shape = img.shape();
    let plane = shape.plane_len();
    let data = field.data_mut();
    let mut nmax = 0.0f64;

    if shape.is_3d() {
        for i in 0..plane {
            let t: [f64; 6] = std::array::from_fn(|k| data[i + k * plane]);
            let (l, v) = symmetric_eigen_3x3(t);
            let s = 1.0 + l.iter().map(|x| x.max(0.0)).sum::<f64>();
            let (n1, n2) = (s.powf(-p1), s.powf(-p2));
            nmax = nmax.max(n1);
            let (a, b, g) = (v[1], v[2], v[0]);
            let m = |p: fn(DVec3) -> f64| n1 * (p(a) + p(b)) + n2 * p(g);
            let d = [
                m(|u| u.x * u.x),
                m(|u| u.x * u.y),
                m(|u| u.x * u.z),
                m(|u| u.y * u.y),
                m(|u| u.y * u.z),
                m(|u| u.z * u.z),
            ];
            for (k, val) in d.into_iter().enumerate() {
                data[i + k * plane] = val;
            }
        }
    } else {
        for i in 0..plane {
            let (l, v) = symmetric_eigen_2x2(data[i], data[i + plane], data[i + 2 * plane]);
            let s = 1.0 + l[0].max(0.0) + l[1].max(0.0);
            let (n1, n2) = (s.powf(-p1), s.powf(-p2));
            nmax = nmax.max(n1);
            let (g, e): (DVec2, DVec2) = (v[0], v[1]);
            data[i] = n1 * e.x * e.x + n2 * g.x * g.x;
            data[i + plane] = n1 * e.x * e.y + n2 * g.x * g.y;
            data[i + 2 * plane] = n1 * e.y * e.y + n2 * g.y * g.y;
        }
    }

    debug!(nmax, "diffusion_tensors: normalising");
    if nmax > 0.0 {
        field.map_in_place(|v| v / nmax);
    }
    Ok(field)
}
