//! Matrix helpers on [`DenseArray<f64>`].
//!
//! # Convention
//!
//! A matrix with `rows` rows and `cols` columns is a `cols x rows x 1 x 1`
//! array, so the element in row `i` and column `j` is `m.at(j, i, 0, 0)` and
//! the buffer is in row-major order:
//!
//! ```text
//! | m00 m01 m02 |        data = [m00, m01, m02,
//! | m10 m11 m12 |   ->           m10, m11, m12]
//! ```
//!
//! # Usage
//!
//! ```rust
//! use lattice_math::{identity, matmul, transpose};
//! use lattice_core::DenseArray;
//!
//! let a = DenseArray::from_rows(3, 2, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0])?;
//! let ata = matmul(&transpose(&a), &a)?;
//! assert_eq!((ata.width(), ata.height()), (3, 3));
//! assert_eq!(matmul(&identity(2), &a)?, a);
//! # Ok::<(), lattice_core::Error>(())
//! ```

use lattice_core::{DenseArray, Error, Result};

/// Number of rows of a matrix.
#[inline]
pub fn rows(m: &DenseArray<f64>) -> usize {
    m.height()
}

/// Number of columns of a matrix.
#[inline]
pub fn cols(m: &DenseArray<f64>) -> usize {
    m.width()
}

/// Fails unless `m` is a non-empty square 2D single-channel matrix.
pub(crate) fn ensure_square(m: &DenseArray<f64>, op: &'static str) -> Result<usize> {
    ensure_matrix(m, op)?;
    if m.width() != m.height() {
        return Err(Error::invalid_argument(
            op,
            format!("matrix must be square, got {} rows x {} cols", m.height(), m.width()),
        ));
    }
    Ok(m.width())
}

/// Fails unless `m` is a non-empty 2D single-channel array.
pub(crate) fn ensure_matrix(m: &DenseArray<f64>, op: &'static str) -> Result<()> {
    m.ensure_not_empty(op)?;
    if m.depth() != 1 || m.channels() != 1 {
        return Err(Error::invalid_argument(
            op,
            format!("expected a 2D single-channel matrix, got {}", m.shape()),
        ));
    }
    Ok(())
}

/// `n x n` identity matrix. Empty for `n == 0`.
pub fn identity(n: usize) -> DenseArray<f64> {
    DenseArray::from_fn(n, n, 1, 1, |x, y, _, _| if x == y { 1.0 } else { 0.0 })
}

/// Square matrix with `values` on its diagonal.
pub fn diagonal(values: &[f64]) -> DenseArray<f64> {
    let n = values.len();
    DenseArray::from_fn(n, n, 1, 1, |x, y, _, _| if x == y { values[x] } else { 0.0 })
}

/// Transpose of a matrix.
pub fn transpose(m: &DenseArray<f64>) -> DenseArray<f64> {
    DenseArray::from_fn(m.height(), m.width(), 1, 1, |x, y, _, _| m.at(y, x, 0, 0))
}

/// Matrix product `a * b`.
///
/// # Errors
///
/// - [`Error::EmptyInstance`] if either operand is empty
/// - [`Error::InvalidArgument`] if the inner dimensions disagree
pub fn matmul(a: &DenseArray<f64>, b: &DenseArray<f64>) -> Result<DenseArray<f64>> {
    ensure_matrix(a, "matmul")?;
    ensure_matrix(b, "matmul")?;
    if a.width() != b.height() {
        return Err(Error::invalid_argument(
            "matmul",
            format!(
                "inner dimensions differ: {}x{} * {}x{}",
                a.height(),
                a.width(),
                b.height(),
                b.width()
            ),
        ));
    }
    let (n, inner, p) = (a.height(), a.width(), b.width());
    let (ad, bd) = (a.data(), b.data());
    let mut out = DenseArray::new(p, n, 1, 1);
    let od = out.data_mut();
    for i in 0..n {
        for k in 0..inner {
            let aik = ad[i * inner + k];
            if aik == 0.0 {
                continue;
            }
            for j in 0..p {
                od[i * p + j] += aik * bd[k * p + j];
            }
        }
    }
    Ok(out)
}

/// Determinant of a square matrix.
///
/// Closed form up to 3x3; larger matrices use Gaussian elimination with
/// partial pivoting.
pub fn determinant(m: &DenseArray<f64>) -> Result<f64> {
    let n = ensure_square(m, "determinant")?;
    let d = m.data();
    Ok(match n {
        1 => d[0],
        2 => d[0] * d[3] - d[1] * d[2],
        3 => {
            d[0] * (d[4] * d[8] - d[5] * d[7]) - d[1] * (d[3] * d[8] - d[5] * d[6])
                + d[2] * (d[3] * d[7] - d[4] * d[6])
        }
        _ => {
            let mut a = d.to_vec();
            let mut det = 1.0;
            for col in 0..n {
                let pivot = (col..n)
                    .max_by(|&i, &j| a[i * n + col].abs().total_cmp(&a[j * n + col].abs()))
                    .unwrap_or(col);
                if a[pivot * n + col] == 0.0 {
                    return Ok(0.0);
                }
                if pivot != col {
                    for k in 0..n {
                        a.swap(pivot * n + k, col * n + k);
                    }
                    det = -det;
                }
                let p = a[col * n + col];
                det *= p;
                for row in col + 1..n {
                    let f = a[row * n + col] / p;
                    if f != 0.0 {
                        for k in col..n {
                            a[row * n + k] -= f * a[col * n + k];
                        }
                    }
                }
            }
            det
        }
    })
}
