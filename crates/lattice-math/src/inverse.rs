//! Matrix inversion.
//!
//! 2x2 and 3x3 matrices are inverted in closed form (adjugate over
//! determinant). Larger matrices go through the SVD:
//! `inv(M) = V * diag(1 / S) * U^T`.
//!
//! A singular matrix is not an error: the result is the zero matrix of the
//! same size and a warning is logged. For the SVD path a matrix counts as
//! singular when its smallest singular value is below
//! `n * f64::EPSILON * max(S)`.

use lattice_core::{DenseArray, Result};
use tracing::{trace, warn};

use crate::matrix::ensure_square;
use crate::svd::svd;

/// Inverse of a square matrix.
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
/// use lattice_math::inverse;
///
/// let m = DenseArray::from_rows(2, 2, &[2.0, 0.0, 0.0, 2.0])?;
/// assert_eq!(inverse(&m)?.data(), &[0.5, 0.0, 0.0, 0.5]);
///
/// let singular = DenseArray::from_rows(2, 2, &[1.0, 2.0, 2.0, 4.0])?;
/// assert!(inverse(&singular)?.data().iter().all(|&v| v == 0.0));
/// # Ok::<(), lattice_core::Error>(())
/// ```
pub fn inverse(m: &DenseArray<f64>) -> Result<DenseArray<f64>> {
    let n = ensure_square(m, "inverse")?;
    trace!(n, "inverse");
    let d = m.data();
    let inv = match n {
        1 => {
            if d[0] == 0.0 {
                None
            } else {
                Some(vec![1.0 / d[0]])
            }
        }
        2 => {
            let det = d[0] * d[3] - d[1] * d[2];
            if det == 0.0 {
                None
            } else {
                let r = 1.0 / det;
                Some(vec![d[3] * r, -d[1] * r, -d[2] * r, d[0] * r])
            }
        }
        3 => inverse_3x3(d),
        _ => inverse_svd(m)?,
    };
    match inv {
        Some(data) => DenseArray::from_vec(n, n, 1, 1, data),
        None => {
            warn!(n, "inverse: matrix is singular, returning zero matrix");
            Ok(DenseArray::new(n, n, 1, 1))
        }
    }
}

fn inverse_3x3(m: &[f64]) -> Option<Vec<f64>> {
    let (a, b, c) = (m[0], m[1], m[2]);
    let (d, e, f) = (m[3], m[4], m[5]);
    let (g, h, i) = (m[6], m[7], m[8]);
    let det = a * (e * i - f * h) - b * (d * i - f * g) + c * (d * h - e * g);
    if det == 0.0 {
        return None;
    }
    let r = 1.0 / det;
    Some(vec![
        (e * i - f * h) * r,
        (c * h - b * i) * r,
        (b * f - c * e) * r,
        (f * g - d * i) * r,
        (a * i - c * g) * r,
        (c * d - a * f) * r,
        (d * h - e * g) * r,
        (b * g - a * h) * r,
        (a * e - b * d) * r,
    ])
}

fn inverse_svd(m: &DenseArray<f64>) -> Result<Option<Vec<f64>>> {
    let n = m.width();
    let d = svd(m, false)?;
    let smax = d.s.iter().fold(0.0f64, |acc, &s| acc.max(s));
    let tol = n as f64 * f64::EPSILON * smax;
    if smax == 0.0 || d.s.iter().any(|&s| s <= tol) {
        return Ok(None);
    }
    let (u, v) = (d.u.data(), d.v.data());
    let mut out = vec![0.0; n * n];
    for i in 0..n {
        for j in 0..n {
            out[i * n + j] = (0..n).map(|k| v[i * n + k] * u[j * n + k] / d.s[k]).sum();
        }
    }
    Ok(Some(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{identity, matmul};
    use approx::assert_abs_diff_eq;

    fn assert_identity(m: &DenseArray<f64>, eps: f64) {
        for (x, y, _, _, v) in m.indexed_iter() {
            assert_abs_diff_eq!(v, if x == y { 1.0 } else { 0.0 }, epsilon = eps);
        }
    }

    #[test]
    fn test_inverse_2x2() {
        let m = DenseArray::from_rows(2, 2, &[4.0, 7.0, 2.0, 6.0]).unwrap();
        let inv = inverse(&m).unwrap();
        assert_abs_diff_eq!(inv.at(0, 0, 0, 0), 0.6, epsilon = 1e-12);
        assert_abs_diff_eq!(inv.at(1, 0, 0, 0), -0.7, epsilon = 1e-12);
        assert_identity(&matmul(&m, &inv).unwrap(), 1e-12);
    }

    #[test]
    fn test_inverse_3x3() {
        let m = DenseArray::from_rows(3, 3, &[1.0, 2.0, 3.0, 0.0, 1.0, 4.0, 5.0, 6.0, 0.0]).unwrap();
        let inv = inverse(&m).unwrap();
        assert_identity(&matmul(&m, &inv).unwrap(), 1e-10);
    }

    #[test]
    fn test_inverse_general() {
        let m = DenseArray::from_fn(5, 5, 1, 1, |x, y, _, _| {
            if x == y { 4.0 } else { 1.0 / (1.0 + x as f64 + y as f64) }
        });
        let inv = inverse(&m).unwrap();
        assert_identity(&matmul(&m, &inv).unwrap(), 1e-10);
        assert_identity(&matmul(&inv, &m).unwrap(), 1e-10);
    }

    #[test]
    fn test_singular_gives_zero() {
        let m = DenseArray::from_rows(3, 3, &[1.0, 2.0, 3.0, 2.0, 4.0, 6.0, 1.0, 1.0, 1.0]).unwrap();
        assert!(inverse(&m).unwrap().data().iter().all(|&v| v == 0.0));

        let mut big = identity(4);
        big.set(3, 3, 0, 0, 0.0);
        let inv = inverse(&big).unwrap();
        assert_eq!(inv.shape(), big.shape());
        assert!(inv.data().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_rejects_non_square() {
        let m = DenseArray::<f64>::new(2, 3, 1, 1);
        assert!(inverse(&m).unwrap_err().is_argument_error());
    }
}
