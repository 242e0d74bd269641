//! Symmetric eigendecomposition.
//!
//! For a symmetric matrix `A`, finds eigenvalues `l0 >= l1 >= ...` and unit
//! eigenvectors, one per column of [`SymmetricEigen::vectors`].
//!
//! 1x1 and 2x2 matrices use closed forms. Larger matrices go through the SVD:
//! singular values are the absolute eigenvalues, and the sign of each is
//! recovered from the dot product of the matching left and right singular
//! vectors. When those vectors are not clearly (anti-)parallel, which happens
//! for eigenvalues of equal magnitude and opposite sign, the decomposition is
//! redone on `A + shift * I` with a shift making the matrix positive definite.
//!
//! The input is read as given; symmetry is not checked.

use glam::{DVec2, DVec3};
use lattice_core::{DenseArray, Result};
use tracing::{trace, warn};

use crate::matrix::ensure_square;
use crate::sort::sort_with_permutation_into;
use crate::svd::{svd_in_place, MAX_ITERATIONS};

/// Eigenvalues and eigenvectors of a symmetric matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct SymmetricEigen {
    /// Eigenvalues in non-increasing order.
    pub values: Vec<f64>,
    /// Unit eigenvectors; column `k` belongs to `values[k]`.
    pub vectors: DenseArray<f64>,
}

impl SymmetricEigen {
    /// Eigenvector `k` as a vector.
    pub fn vector(&self, k: usize) -> Vec<f64> {
        (0..self.vectors.height())
            .map(|y| self.vectors.at(k, y, 0, 0))
            .collect()
    }
}

/// Closed-form decomposition of `[[a, b], [b, c]]`.
///
/// Returns eigenvalues in non-increasing order and orthonormal eigenvectors.
///
/// # Example
///
/// ```rust
/// use lattice_math::symmetric_eigen_2x2;
///
/// let (l, v) = symmetric_eigen_2x2(2.0, 0.0, 5.0);
/// assert_eq!(l, [5.0, 2.0]);
/// assert!((v[0].y.abs() - 1.0).abs() < 1e-12);
/// ```
pub fn symmetric_eigen_2x2(a: f64, b: f64, c: f64) -> ([f64; 2], [DVec2; 2]) {
    let e = a + c;
    // Half the eigenvalue gap, written so it cannot cancel below zero.
    let f2 = 0.5 * (a - c).hypot(2.0 * b);
    let l1 = 0.5 * e + f2;
    let l2 = 0.5 * e - f2;
    // Solve with the row of `A - l1 I` that stays well conditioned when b ~ 0.
    let v1 = if a >= c {
        DVec2::new(l1 - c, b)
    } else {
        DVec2::new(b, l1 - a)
    };
    let v1 = v1.try_normalize().unwrap_or(DVec2::X);
    ([l1, l2], [v1, v1.perp()])
}

/// Decomposition of a symmetric 3x3 tensor without heap allocation.
///
/// `t` holds the upper triangle `[xx, xy, xz, yy, yz, zz]`.
pub fn symmetric_eigen_3x3(t: [f64; 6]) -> ([f64; 3], [DVec3; 3]) {
    let src = [t[0], t[1], t[2], t[1], t[3], t[4], t[2], t[4], t[5]];
    let mut values = [0.0; 3];
    let mut vectors = [0.0; 9];
    let scratch = Scratch {
        a: &mut [0.0; 9],
        v: &mut [0.0; 9],
        rv1: &mut [0.0; 3],
        perm: &mut [0; 3],
    };
    if !eigen_core(&src, 3, &mut values, &mut vectors, scratch) {
        warn!("symmetric_eigen_3x3: no convergence after {MAX_ITERATIONS} iterations");
    }
    let col = |k: usize| DVec3::new(vectors[k], vectors[3 + k], vectors[6 + k]);
    (values, [col(0), col(1), col(2)])
}

/// Eigendecomposition of a square symmetric matrix.
///
/// # Errors
///
/// - [`lattice_core::Error::EmptyInstance`] for an empty matrix
/// - [`lattice_core::Error::InvalidArgument`] for a non-square matrix
///
/// # Example
///
/// ```rust
/// use lattice_core::DenseArray;
/// use lattice_math::symmetric_eigen;
///
/// let m = DenseArray::from_rows(2, 2, &[1.0, 2.0, 2.0, 1.0])?;
/// let e = symmetric_eigen(&m)?;
/// assert!((e.values[0] - 3.0).abs() < 1e-12);
/// assert!((e.values[1] + 1.0).abs() < 1e-12);
/// # Ok::<(), lattice_core::Error>(())
/// ```
pub fn symmetric_eigen(m: &DenseArray<f64>) -> Result<SymmetricEigen> {
    let n = ensure_square(m, "symmetric_eigen")?;
    trace!(n, "symmetric_eigen");
    let d = m.data();
    let (values, vectors) = match n {
        1 => (vec![d[0]], vec![1.0]),
        2 => {
            let ([l1, l2], [v1, v2]) = symmetric_eigen_2x2(d[0], 0.5 * (d[1] + d[2]), d[3]);
            (vec![l1, l2], vec![v1.x, v2.x, v1.y, v2.y])
        }
        _ => {
            let mut values = vec![0.0; n];
            let mut vectors = vec![0.0; n * n];
            let scratch = Scratch {
                a: &mut vec![0.0; n * n],
                v: &mut vec![0.0; n * n],
                rv1: &mut vec![0.0; n],
                perm: &mut vec![0; n],
            };
            if !eigen_core(d, n, &mut values, &mut vectors, scratch) {
                warn!(n, "symmetric_eigen: no convergence after {MAX_ITERATIONS} iterations");
            }
            (values, vectors)
        }
    };
    Ok(SymmetricEigen {
        values,
        vectors: DenseArray::from_vec(n, n, 1, 1, vectors)?,
    })
}

struct Scratch<'a> {
    a: &'a mut [f64],
    v: &'a mut [f64],
    rv1: &'a mut [f64],
    perm: &'a mut [usize],
}

/// SVD-based decomposition of the row-major `n x n` matrix `src`.
///
/// Writes sorted eigenvalues to `values` and the matching eigenvectors to
/// the columns of the row-major `vectors`.
fn eigen_core(
    src: &[f64],
    n: usize,
    values: &mut [f64],
    vectors: &mut [f64],
    s: Scratch<'_>,
) -> bool {
    let maxabs = src.iter().fold(1.0f64, |acc, v| acc.max(v.abs()));
    let load = |a: &mut [f64], shift: f64| {
        for (i, (dst, &v)) in a.iter_mut().zip(src).enumerate() {
            *dst = v / maxabs + if i % (n + 1) == 0 { shift } else { 0.0 };
        }
    };

    load(s.a, 0.0);
    let mut converged = svd_in_place(s.a, n, n, values, s.v, s.rv1, MAX_ITERATIONS);

    let mut ambiguous = false;
    let mut largest = 0.0f64;
    for p in 0..n {
        largest = largest.max(values[p]);
        let dot: f64 = (0..n).map(|y| s.a[y * n + p] * s.v[y * n + p]).sum();
        if dot.abs() < 0.9 {
            ambiguous = true;
        }
        if dot < 0.0 {
            values[p] = -values[p];
        }
    }
    if ambiguous {
        let shift = 2.0 * largest + 1.0;
        load(s.a, shift);
        converged &= svd_in_place(s.a, n, n, values, s.v, s.rv1, MAX_ITERATIONS);
        for v in values.iter_mut() {
            *v -= shift;
        }
    }
    for v in values.iter_mut() {
        *v *= maxabs;
    }

    for (i, p) in s.perm.iter_mut().enumerate() {
        *p = i;
    }
    sort_with_permutation_into(values, s.perm, false);
    for y in 0..n {
        for k in 0..n {
            vectors[y * n + k] = s.a[y * n + s.perm[k]];
        }
    }
    converged
}
