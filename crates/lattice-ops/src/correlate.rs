//! Correlation and convolution with a small kernel.
//!
//! ```text
//! correlate(p) = sum_d I(p + d) * K(d)
//! convolve(p)  = sum_d I(p - d) * K(d)
//! ```
//!
//! The kernel origin is at index `(n - 1) / 2` along each axis, so a 3-tap
//! kernel covers offsets `-1..=1` and a 4-tap kernel `-1..=2`. Convolution
//! is correlation with the kernel mirrored along x, y and z.
//!
//! Every channel of the image is filtered with the same single-channel
//! kernel. The result has the image's shape and the floating-point
//! accumulation type of the two element types ([`Accum`]).
//!
//! # Paths
//!
//! - **Stencil path**: Neumann boundary with a square 2D kernel of 2 to 5
//!   taps, or a cubic 3D kernel of 2 or 3 taps. Uses the rolling windows of
//!   [`crate::stencil`].
//! - **Generic path**: everything else. Each row is split into an interior
//!   span, where the whole kernel footprint is inside the image and no bounds
//!   check is made, and border pixels handled with the boundary policy.
//!
//! Both paths give the same values for the same boundary.
//!
//! # Normalised Mode
//!
//! With [`CorrelateOptions::normalized`], each value is divided by
//! `sqrt(sum K^2 * sum I^2)` over the kernel footprint. A zero denominator
//! gives 0.
//!
//! # Example
//!
//! ```rust
//! use lattice_core::DenseArray;
//! use lattice_ops::correlate::{correlate, Boundary, CorrelateOptions};
//! use lattice_ops::kernel::box_kernel;
//!
//! let img = DenseArray::filled(4, 4, 1, 1, 1u8);
//! let opts = CorrelateOptions { boundary: Boundary::Zero, ..Default::default() };
//! let out = correlate(&img, &box_kernel(3), opts)?;
//! assert!((out.at(0, 0, 0, 0) - 4.0 / 9.0).abs() < 1e-6);
//! # Ok::<(), lattice_core::Error>(())
//! ```

use lattice_core::{Accum, Axis, DenseArray, Error, Promote, Result, Scalar};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::parallel::for_each_plane;
use crate::stencil::StencilScan;

/// Value of samples outside the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Boundary {
    /// Outside samples are zero (Dirichlet).
    Zero,
    /// Outside samples repeat the nearest edge sample.
    #[default]
    Neumann,
}

/// Options for [`correlate`] and [`convolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelateOptions {
    /// Boundary policy.
    pub boundary: Boundary,
    /// Divide by the local L2 norms of kernel and image.
    pub normalized: bool,
}

fn check_kernel<K: Scalar>(kernel: &DenseArray<K>) -> Result<()> {
    if kernel.is_empty() {
        return Err(Error::invalid_kernel("kernel is empty"));
    }
    if kernel.channels() != 1 {
        return Err(Error::invalid_kernel(format!(
            "kernel must have one channel, got {}",
            kernel.channels()
        )));
    }
    Ok(())
}

/// Correlates every channel of `img` with `kernel`.
///
/// # Errors
///
/// - [`Error::EmptyInstance`] if `img` is empty
/// - [`Error::InvalidKernel`] if `kernel` is empty or has several channels
pub fn correlate<T, K>(
    img: &DenseArray<T>,
    kernel: &DenseArray<K>,
    opts: CorrelateOptions,
) -> Result<DenseArray<Accum<T, K>>>
where
    T: Promote<K>,
    K: Scalar,
{
    img.ensure_not_empty("correlate")?;
    check_kernel(kernel)?;
    trace!(
        shape = %img.shape(),
        kernel = %kernel.shape(),
        boundary = ?opts.boundary,
        normalized = opts.normalized,
        "correlate"
    );
    let k: Vec<f64> = kernel.to_f64_vec();
    let ks = kernel.shape();
    let ksq: f64 = k.iter().map(|v| v * v).sum();

    let stencil = opts.boundary == Boundary::Neumann && ks.width == ks.height && {
        let n = ks.width;
        (ks.depth == 1 && (2..=5).contains(&n)) || (ks.depth == n && (2..=3).contains(&n))
    };
    debug!(
        path = if stencil { "stencil" } else { "generic" },
        "correlate path"
    );

    let mut out = DenseArray::<Accum<T, K>>::like(img);
    let plane = img.shape().plane_len();
    for_each_plane(out.data_mut(), plane, |c, dst| {
        if stencil {
            correlate_stencil(img, c, &k, ks.width, ks.depth, ksq, opts.normalized, dst);
        } else {
            correlate_generic(img, c, &k, ks, ksq, opts, dst);
        }
    });
    Ok(out)
}

/// Convolves every channel of `img` with `kernel`.
///
/// Equivalent to [`correlate`] with the kernel mirrored along x, y and z.
///
/// # Errors
///
/// Same as [`correlate`].
pub fn convolve<T, K>(
    img: &DenseArray<T>,
    kernel: &DenseArray<K>,
    opts: CorrelateOptions,
) -> Result<DenseArray<Accum<T, K>>>
where
    T: Promote<K>,
    K: Scalar,
{
    check_kernel(kernel)?;
    let mut flipped = kernel.mirrored(Axis::X);
    flipped.mirror(Axis::Y).mirror(Axis::Z);
    correlate(img, &flipped, opts)
}

#[inline]
fn dst_set<A: Scalar>(dst: &mut [A], i: usize, v: f64) {
    dst[i] = A::from_f64(v);
}

#[inline]
fn finish(sum: f64, ksq: f64, norm_sq: f64, normalized: bool) -> f64 {
    if normalized {
        let d = ksq * norm_sq;
        if d > 0.0 { sum / d.sqrt() } else { 0.0 }
    } else {
        sum
    }
}

#[allow(clippy::too_many_arguments)]
fn correlate_stencil<T: Scalar, A: Scalar>(
    img: &DenseArray<T>,
    c: usize,
    k: &[f64],
    n: usize,
    depth: usize,
    ksq: f64,
    normalized: bool,
    dst: &mut [A],
) {
    macro_rules! scan {
        ($nx:literal, $ny:literal, $nz:literal) => {
            for (i, (_, _, _, w)) in StencilScan::<T, $nx, $ny, $nz>::new(img, c).enumerate() {
                let norm = if normalized { w.sum_sq() } else { 0.0 };
                dst_set(dst, i, finish(w.dot(k), ksq, norm, normalized));
            }
        };
    }
    match (n, depth) {
        (2, 1) => scan!(2, 2, 1),
        (3, 1) => scan!(3, 3, 1),
        (4, 1) => scan!(4, 4, 1),
        (5, 1) => scan!(5, 5, 1),
        (2, 2) => scan!(2, 2, 2),
        _ => scan!(3, 3, 3),
    }
}

fn correlate_generic<T: Scalar, A: Scalar>(
    img: &DenseArray<T>,
    c: usize,
    k: &[f64],
    ks: lattice_core::Shape,
    ksq: f64,
    opts: CorrelateOptions,
    dst: &mut [A],
) {
    let s = img.shape();
    let (kw, kh, kd) = (ks.width, ks.height, ks.depth);
    // Kernel origin.
    let (mx, my, mz) = ((kw - 1) / 2, (kh - 1) / 2, (kd - 1) / 2);
    let src = img.channel(c);

    // Pixels whose whole footprint lies inside: [lo, hi) along each axis.
    let span = |m: usize, kn: usize, n: usize| -> (usize, usize) {
        let lo = m;
        let hi = (n + m + 1).saturating_sub(kn);
        (lo, hi.max(lo))
    };
    let (x0, x1) = span(mx, kw, s.width);
    let (y0, y1) = span(my, kh, s.height);
    let (z0, z1) = span(mz, kd, s.depth);

    for z in 0..s.depth {
        for y in 0..s.height {
            let row_inside = (y0..y1).contains(&y) && (z0..z1).contains(&z);
            for x in 0..s.width {
                let i = x + s.width * (y + s.height * z);
                let (sum, norm) = if row_inside && (x0..x1).contains(&x) {
                    interior(src, s.width, s.height, k, (kw, kh, kd), (x - mx, y - my, z - mz))
                } else {
                    border(img, c, k, (kw, kh, kd), (mx, my, mz), (x, y, z), opts.boundary)
                };
                dst_set(dst, i, finish(sum, ksq, norm, opts.normalized));
            }
        }
    }
}

/// Footprint fully inside: direct indexing from the footprint corner.
#[inline]
fn interior(
    src: &[impl Scalar],
    w: usize,
    h: usize,
    k: &[f64],
    (kw, kh, kd): (usize, usize, usize),
    (sx, sy, sz): (usize, usize, usize),
) -> (f64, f64) {
    let mut sum = 0.0;
    let mut norm = 0.0;
    let mut ki = 0;
    for dz in 0..kd {
        for dy in 0..kh {
            let base = sx + w * (sy + dy + h * (sz + dz));
            for v in &src[base..base + kw] {
                let v = v.to_f64();
                sum += v * k[ki];
                norm += v * v;
                ki += 1;
            }
        }
    }
    (sum, norm)
}

/// Footprint crossing the border: bounds-checked reads.
#[inline]
fn border<T: Scalar>(
    img: &DenseArray<T>,
    c: usize,
    k: &[f64],
    (kw, kh, kd): (usize, usize, usize),
    (mx, my, mz): (usize, usize, usize),
    (x, y, z): (usize, usize, usize),
    boundary: Boundary,
) -> (f64, f64) {
    let mut sum = 0.0;
    let mut norm = 0.0;
    let mut ki = 0;
    for dz in 0..kd {
        let sz = (z + dz) as isize - mz as isize;
        for dy in 0..kh {
            let sy = (y + dy) as isize - my as isize;
            for dx in 0..kw {
                let sx = (x + dx) as isize - mx as isize;
                let v = match boundary {
                    Boundary::Neumann => img.at_clamped(sx, sy, sz, c),
                    Boundary::Zero => img.at_or(sx, sy, sz, c, T::zero()),
                }
                .to_f64();
                sum += v * k[ki];
                norm += v * v;
                ki += 1;
            }
        }
    }
    (sum, norm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{box_kernel, laplacian_kernel};
    use approx::assert_abs_diff_eq;

    fn noise(w: usize, h: usize, d: usize, c: usize) -> DenseArray<f32> {
        let mut state = 0x2545_f491u32;
        DenseArray::from_fn(w, h, d, c, |_, _, _, _| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state % 256) as f32 / 255.0
        })
    }

    fn asymmetric(n: usize, d: usize) -> DenseArray<f64> {
        DenseArray::from_fn(n, n, d, 1, |x, y, z, _| (1 + x + 2 * y + 5 * z) as f64 * 0.1)
    }

    fn assert_close(a: &DenseArray<f64>, b: &DenseArray<f64>) {
        assert_eq!(a.shape(), b.shape());
        for (u, v) in a.data().iter().zip(b.data()) {
            assert_abs_diff_eq!(u, v, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_box_zero_boundary() {
        let img = DenseArray::filled(4, 4, 1, 1, 1.0f64);
        let opts = CorrelateOptions {
            boundary: Boundary::Zero,
            normalized: false,
        };
        let k = DenseArray::filled(3, 3, 1, 1, 1.0f64 / 9.0);
        let out = correlate(&img, &k, opts).unwrap();
        assert_abs_diff_eq!(out.at(0, 0, 0, 0), 4.0 / 9.0, epsilon = 1e-12);
        assert_abs_diff_eq!(out.at(1, 0, 0, 0), 6.0 / 9.0, epsilon = 1e-12);
        assert_abs_diff_eq!(out.at(1, 1, 0, 0), 1.0, epsilon = 1e-12);

        let out = correlate(&img, &box_kernel(3), opts).unwrap();
        assert_abs_diff_eq!(out.at(0, 0, 0, 0), 4.0 / 9.0, epsilon = 1e-6);
    }

    #[test]
    fn test_stencil_matches_generic() {
        let img = noise(9, 7, 1, 2).cast::<f64>();
        let neumann = CorrelateOptions::default();
        for n in 2..=5 {
            let k = asymmetric(n, 1);
            let fast = correlate(&img, &k, neumann).unwrap();
            let mut slow = DenseArray::<f64>::like(&img);
            for c in 0..img.channels() {
                correlate_generic(&img, c, k.data(), k.shape(), 0.0, neumann, slow.channel_mut(c));
            }
            assert_close(&fast, &slow);
        }
    }

    #[test]
    fn test_stencil_matches_generic_3d() {
        let img = noise(5, 4, 6, 1).cast::<f64>();
        let neumann = CorrelateOptions::default();
        for n in 2..=3 {
            let k = asymmetric(n, n);
            let fast = correlate(&img, &k, neumann).unwrap();
            let mut slow = DenseArray::<f64>::like(&img);
            correlate_generic(&img, 0, k.data(), k.shape(), 0.0, neumann, slow.channel_mut(0));
            assert_close(&fast, &slow);
        }
    }

    #[test]
    fn test_convolve_is_flipped_correlate() {
        let img = noise(6, 6, 1, 1).cast::<f64>();
        let k = asymmetric(3, 1);
        let mut flipped = k.mirrored(Axis::X);
        flipped.mirror(Axis::Y);
        for boundary in [Boundary::Zero, Boundary::Neumann] {
            let opts = CorrelateOptions { boundary, normalized: false };
            assert_close(
                &convolve(&img, &k, opts).unwrap(),
                &correlate(&img, &flipped, opts).unwrap(),
            );
        }
    }

    #[test]
    fn test_impulse_response() {
        let mut img = DenseArray::<f64>::new(5, 5, 1, 1);
        img.set(2, 2, 0, 0, 1.0);
        let k = asymmetric(3, 1);
        let opts = CorrelateOptions { boundary: Boundary::Zero, normalized: false };
        let corr = correlate(&img, &k, opts).unwrap();
        let conv = convolve(&img, &k, opts).unwrap();
        // Correlation reads I(p + d): the impulse appears mirrored.
        assert_abs_diff_eq!(corr.at(1, 1, 0, 0), k.at(2, 2, 0, 0));
        assert_abs_diff_eq!(conv.at(1, 1, 0, 0), k.at(0, 0, 0, 0));
    }

    #[test]
    fn test_normalized() {
        let img = DenseArray::filled(5, 5, 1, 1, 2.0f32);
        let k = box_kernel(3);
        let opts = CorrelateOptions { boundary: Boundary::Neumann, normalized: true };
        let out = correlate(&img, &k, opts).unwrap();
        // Constant image and kernel are parallel: cosine similarity 1.
        assert!(out.data().iter().all(|&v| (v - 1.0).abs() < 1e-6));

        let zero = DenseArray::<f32>::new(4, 4, 1, 1);
        let out = correlate(&zero, &k, opts).unwrap();
        assert!(out.data().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_output_type_promotes() {
        let img = DenseArray::filled(4, 4, 1, 1, 10u8);
        let out = correlate(&img, &laplacian_kernel(), CorrelateOptions::default()).unwrap();
        let _: &DenseArray<f32> = &out;
        assert!(out.data().iter().all(|&v| v == 0.0));

        let img = DenseArray::filled(4, 4, 1, 1, 10i32);
        let k = DenseArray::filled(1, 1, 1, 1, 0.5f32);
        let out: DenseArray<f64> = correlate(&img, &k, CorrelateOptions::default()).unwrap();
        assert_eq!(out.at(0, 0, 0, 0), 5.0);
    }

    #[test]
    fn test_large_kernel_generic() {
        let img = DenseArray::filled(8, 8, 1, 1, 1.0f32);
        let k = box_kernel(7);
        let out = correlate(&img, &k, CorrelateOptions::default()).unwrap();
        assert!(out.data().iter().all(|&v| (v - 1.0).abs() < 1e-5));
    }

    #[test]
    fn test_invalid_inputs() {
        let img = DenseArray::filled(4, 4, 1, 1, 1.0f32);
        let empty = DenseArray::<f32>::empty();
        let opts = CorrelateOptions::default();
        assert!(correlate(&img, &empty, opts).unwrap_err().is_argument_error());
        let multi = DenseArray::filled(3, 3, 1, 2, 1.0f32);
        assert!(matches!(
            convolve(&img, &multi, opts).unwrap_err(),
            Error::InvalidKernel { .. }
        ));
        assert!(correlate(&empty, &box_kernel(3), opts).unwrap_err().is_instance_error());
    }
}
