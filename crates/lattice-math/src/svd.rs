//! Singular value decomposition.
//!
//! `M = U * diag(S) * V^T` for an `m x n` matrix `M`, with `U` of size
//! `m x n` and `V` of size `n x n`, both with orthonormal columns.
//!
//! # Algorithm
//!
//! Householder reduction to bidiagonal form, accumulation of the left and
//! right transforms, then diagonalisation of the bidiagonal matrix by
//! implicitly shifted QR sweeps (Golub-Kahan). Each singular value gets at
//! most [`MAX_ITERATIONS`] sweeps; a value that has not converged by then is
//! kept as is and a warning is logged.
//!
//! [`svd_in_place`] is the allocation-free core working on caller-provided
//! slices, used directly for the per-pixel 3x3 tensors of the diffusion
//! filter. [`svd`] is the [`DenseArray`] front end.
//!
//! # Usage
//!
//! ```rust
//! use lattice_core::DenseArray;
//! use lattice_math::{svd, matmul, diagonal, transpose};
//!
//! let m = DenseArray::from_rows(2, 2, &[3.0, 0.0, 4.0, 5.0])?;
//! let d = svd(&m, true)?;
//! assert!(d.s[0] >= d.s[1]);
//! let us = matmul(&d.u, &diagonal(&d.s))?;
//! let back = matmul(&us, &transpose(&d.v))?;
//! for (a, b) in back.data().iter().zip(m.data()) {
//!     assert!((a - b).abs() < 1e-12);
//! }
//! # Ok::<(), lattice_core::Error>(())
//! ```

use lattice_core::{DenseArray, Result};
use tracing::{trace, warn};

use crate::matrix::ensure_matrix;
use crate::sort::{permute_columns, sort_with_permutation};

/// Maximum QR sweeps per singular value.
pub const MAX_ITERATIONS: usize = 40;

/// Result of [`svd`].
#[derive(Debug, Clone, PartialEq)]
pub struct Svd {
    /// Left singular vectors, one per column (`m x n`).
    pub u: DenseArray<f64>,
    /// Singular values, non-negative.
    pub s: Vec<f64>,
    /// Right singular vectors, one per column (`n x n`).
    pub v: DenseArray<f64>,
    /// `false` if some singular value did not converge.
    pub converged: bool,
}

/// `|a|` with the sign of `b`.
#[inline]
fn with_sign(a: f64, b: f64) -> f64 {
    if b >= 0.0 { a.abs() } else { -a.abs() }
}

/// Decomposes the row-major `m x n` matrix held in `a`.
///
/// On return `a` holds `U` (row-major, `m x n`), `w` the `n` singular values
/// and `v` the row-major `n x n` matrix `V`. `rv1` is scratch space of
/// length `n`. Singular values are not sorted.
///
/// Returns `false` if some value needed more than `max_iterations` sweeps.
///
/// # Panics
///
/// Panics if a slice is shorter than the sizes above.
pub fn svd_in_place(
    a: &mut [f64],
    m: usize,
    n: usize,
    w: &mut [f64],
    v: &mut [f64],
    rv1: &mut [f64],
    max_iterations: usize,
) -> bool {
    let mut g = 0.0f64;
    let mut scale = 0.0f64;
    let mut anorm = 0.0f64;
    let mut l = 0usize;

    // Householder reduction to bidiagonal form.
    for i in 0..n {
        l = i + 1;
        rv1[i] = scale * g;
        g = 0.0;
        scale = 0.0;
        let mut s = 0.0;
        if i < m {
            for k in i..m {
                scale += a[k * n + i].abs();
            }
            if scale != 0.0 {
                for k in i..m {
                    a[k * n + i] /= scale;
                    s += a[k * n + i] * a[k * n + i];
                }
                let f = a[i * n + i];
                g = -with_sign(s.sqrt(), f);
                let h = f * g - s;
                a[i * n + i] = f - g;
                for j in l..n {
                    let mut s = 0.0;
                    for k in i..m {
                        s += a[k * n + i] * a[k * n + j];
                    }
                    let f = s / h;
                    for k in i..m {
                        a[k * n + j] += f * a[k * n + i];
                    }
                }
                for k in i..m {
                    a[k * n + i] *= scale;
                }
            }
        }
        w[i] = scale * g;
        g = 0.0;
        scale = 0.0;
        s = 0.0;
        if i < m && i + 1 != n {
            for k in l..n {
                scale += a[i * n + k].abs();
            }
            if scale != 0.0 {
                for k in l..n {
                    a[i * n + k] /= scale;
                    s += a[i * n + k] * a[i * n + k];
                }
                let f = a[i * n + l];
                g = -with_sign(s.sqrt(), f);
                let h = f * g - s;
                a[i * n + l] = f - g;
                for k in l..n {
                    rv1[k] = a[i * n + k] / h;
                }
                for j in l..m {
                    let mut s = 0.0;
                    for k in l..n {
                        s += a[j * n + k] * a[i * n + k];
                    }
                    for k in l..n {
                        a[j * n + k] += s * rv1[k];
                    }
                }
                for k in l..n {
                    a[i * n + k] *= scale;
                }
            }
        }
        anorm = anorm.max(w[i].abs() + rv1[i].abs());
    }

    // Right-hand transforms.
    for i in (0..n).rev() {
        if i + 1 < n {
            if g != 0.0 {
                for j in l..n {
                    v[j * n + i] = (a[i * n + j] / a[i * n + l]) / g;
                }
                for j in l..n {
                    let mut s = 0.0;
                    for k in l..n {
                        s += a[i * n + k] * v[k * n + j];
                    }
                    for k in l..n {
                        v[k * n + j] += s * v[k * n + i];
                    }
                }
            }
            for j in l..n {
                v[i * n + j] = 0.0;
                v[j * n + i] = 0.0;
            }
        }
        v[i * n + i] = 1.0;
        g = rv1[i];
        l = i;
    }

    // Left-hand transforms.
    for i in (0..m.min(n)).rev() {
        let l = i + 1;
        let mut g = w[i];
        for j in l..n {
            a[i * n + j] = 0.0;
        }
        if g != 0.0 {
            g = 1.0 / g;
            for j in l..n {
                let mut s = 0.0;
                for k in l..m {
                    s += a[k * n + i] * a[k * n + j];
                }
                let f = (s / a[i * n + i]) * g;
                for k in i..m {
                    a[k * n + j] += f * a[k * n + i];
                }
            }
            for j in i..m {
                a[j * n + i] *= g;
            }
        } else {
            for j in i..m {
                a[j * n + i] = 0.0;
            }
        }
        a[i * n + i] += 1.0;
    }

    // Diagonalisation of the bidiagonal form.
    let mut converged = true;
    for k in (0..n).rev() {
        let mut its = 0;
        loop {
            let mut split = true;
            let mut l = k;
            loop {
                if l == 0 || rv1[l].abs() + anorm == anorm {
                    split = false;
                    break;
                }
                if w[l - 1].abs() + anorm == anorm {
                    break;
                }
                l -= 1;
            }
            if split {
                // w[l - 1] is negligible: cancel rv1[l].
                let nm = l - 1;
                let mut c = 0.0;
                let mut s = 1.0;
                for i in l..=k {
                    let f = s * rv1[i];
                    rv1[i] *= c;
                    if f.abs() + anorm == anorm {
                        break;
                    }
                    let g = w[i];
                    let h = f.hypot(g);
                    w[i] = h;
                    let h = 1.0 / h;
                    c = g * h;
                    s = -f * h;
                    for j in 0..m {
                        let y = a[j * n + nm];
                        let z = a[j * n + i];
                        a[j * n + nm] = y * c + z * s;
                        a[j * n + i] = z * c - y * s;
                    }
                }
            }

            let z = w[k];
            if l == k {
                if z < 0.0 {
                    w[k] = -z;
                    for j in 0..n {
                        v[j * n + k] = -v[j * n + k];
                    }
                }
                break;
            }
            if its >= max_iterations {
                converged = false;
                break;
            }
            its += 1;

            // Shift from the bottom 2x2 minor.
            let nm = k - 1;
            let mut x = w[l];
            let y = w[nm];
            let g = rv1[nm];
            let h = rv1[k];
            let mut f = ((y - z) * (y + z) + (g - h) * (g + h)) / (2.0 * h * y);
            let g = f.hypot(1.0);
            f = ((x - z) * (x + z) + h * ((y / (f + with_sign(g, f))) - h)) / x;

            // Next QR transformation.
            let mut c = 1.0;
            let mut s = 1.0;
            for j in l..=nm {
                let i = j + 1;
                let mut g = rv1[i];
                let mut y = w[i];
                let mut h = s * g;
                g *= c;
                let mut z = f.hypot(h);
                rv1[j] = z;
                let zr = z.max(f64::MIN_POSITIVE);
                c = f / zr;
                s = h / zr;
                f = x * c + g * s;
                g = g * c - x * s;
                h = y * s;
                y *= c;
                for jj in 0..n {
                    let xv = v[jj * n + j];
                    let zv = v[jj * n + i];
                    v[jj * n + j] = xv * c + zv * s;
                    v[jj * n + i] = zv * c - xv * s;
                }
                z = f.hypot(h);
                w[j] = z;
                if z != 0.0 {
                    let zr = 1.0 / z;
                    c = f * zr;
                    s = h * zr;
                }
                f = c * g + s * y;
                x = c * y - s * g;
                for jj in 0..m {
                    let ya = a[jj * n + j];
                    let za = a[jj * n + i];
                    a[jj * n + j] = ya * c + za * s;
                    a[jj * n + i] = za * c - ya * s;
                }
            }
            rv1[l] = 0.0;
            rv1[k] = f;
            w[k] = x;
        }
    }
    converged
}

/// Singular value decomposition of a matrix.
///
/// With `sort`, singular values are in non-increasing order and the columns
/// of `U` and `V` are permuted accordingly.
///
/// # Errors
///
/// - [`lattice_core::Error::EmptyInstance`] for an empty matrix
/// - [`lattice_core::Error::InvalidArgument`] for a volume or multi-channel array
pub fn svd(matrix: &DenseArray<f64>, sort: bool) -> Result<Svd> {
    ensure_matrix(matrix, "svd")?;
    let (m, n) = (matrix.height(), matrix.width());
    trace!(rows = m, cols = n, sort, "svd");

    let mut a = matrix.data().to_vec();
    let mut w = vec![0.0; n];
    let mut v = vec![0.0; n * n];
    let mut rv1 = vec![0.0; n];
    let converged = svd_in_place(&mut a, m, n, &mut w, &mut v, &mut rv1, MAX_ITERATIONS);
    if !converged {
        warn!(rows = m, cols = n, "svd: no convergence after {MAX_ITERATIONS} iterations");
    }

    let mut u = DenseArray::from_vec(n, m, 1, 1, a)?;
    let mut v = DenseArray::from_vec(n, n, 1, 1, v)?;
    if sort {
        let perm = sort_with_permutation(&mut w, false);
        u = permute_columns(&u, &perm);
        v = permute_columns(&v, &perm);
    }
    Ok(Svd {
        u,
        s: w,
        v,
        converged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{diagonal, matmul, transpose};
    use approx::assert_abs_diff_eq;

    fn reconstruct(d: &Svd) -> DenseArray<f64> {
        let us = matmul(&d.u, &diagonal(&d.s)).unwrap();
        matmul(&us, &transpose(&d.v)).unwrap()
    }

    fn assert_orthonormal_columns(q: &DenseArray<f64>) {
        let qtq = matmul(&transpose(q), q).unwrap();
        for (x, y, _, _, v) in qtq.indexed_iter() {
            let expected = if x == y { 1.0 } else { 0.0 };
            assert_abs_diff_eq!(v, expected, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_svd_diagonal() {
        let m = diagonal(&[1.0, 3.0, 2.0]);
        let d = svd(&m, true).unwrap();
        assert!(d.converged);
        assert_abs_diff_eq!(d.s[0], 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(d.s[1], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(d.s[2], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_svd_reconstructs_tall_matrix() {
        let m = DenseArray::from_rows(
            3,
            4,
            &[2.0, -1.0, 0.5, 1.0, 3.0, -2.0, 0.0, 1.5, 4.0, -3.0, 0.25, 1.0],
        )
        .unwrap();
        let d = svd(&m, true).unwrap();
        assert_eq!((d.u.width(), d.u.height()), (3, 4));
        for w in d.s.windows(2) {
            assert!(w[0] >= w[1]);
        }
        assert!(d.s.iter().all(|&s| s >= 0.0));
        for (a, b) in reconstruct(&d).data().iter().zip(m.data()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-10);
        }
        assert_orthonormal_columns(&d.u);
        assert_orthonormal_columns(&d.v);
    }

    #[test]
    fn test_svd_rank_deficient() {
        let m = DenseArray::from_rows(2, 2, &[1.0, 2.0, 2.0, 4.0]).unwrap();
        let d = svd(&m, true).unwrap();
        assert_abs_diff_eq!(d.s[0], 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(d.s[1], 0.0, epsilon = 1e-12);
        for (a, b) in reconstruct(&d).data().iter().zip(m.data()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_svd_zero_matrix() {
        let d = svd(&DenseArray::new(3, 3, 1, 1), false).unwrap();
        assert!(d.converged);
        assert!(d.s.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_svd_rejects_empty() {
        assert!(svd(&DenseArray::empty(), false).unwrap_err().is_instance_error());
    }
}
