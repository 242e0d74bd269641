//! # lattice-math
//!
//! Dense linear algebra on [`lattice_core::DenseArray`] matrices.
//!
//! - [`inverse`] - Closed-form 2x2/3x3, SVD-based for larger matrices
//! - [`svd`] - Singular value decomposition with optional sorting
//! - [`symmetric_eigen`] - Eigendecomposition of symmetric matrices
//! - [`sort_with_permutation`] - Quicksort returning the applied permutation
//! - Matrix helpers: [`identity`], [`diagonal`], [`transpose`], [`matmul`], [`determinant`]
//!
//! # Design
//!
//! Matrices are single-channel 2D arrays with `width` columns and `height`
//! rows, stored row-major. All kernels compute in `f64`; cast other element
//! types with [`DenseArray::cast`](lattice_core::DenseArray::cast) first.
//!
//! Degenerate inputs are not errors. A singular matrix inverts to the zero
//! matrix and an SVD that does not converge returns its last iterate, both
//! with a `tracing` warning.
//!
//! # Usage
//!
//! ```rust
//! use lattice_core::DenseArray;
//! use lattice_math::{inverse, matmul};
//!
//! let m = DenseArray::from_rows(2, 2, &[2.0, 1.0, 1.0, 3.0])?;
//! let p = matmul(&m, &inverse(&m)?)?;
//! assert!((p.at(0, 0, 0, 0) - 1.0).abs() < 1e-12);
//! # Ok::<(), lattice_core::Error>(())
//! ```
//!
//! # Dependencies
//!
//! - [`glam`] - Small fixed-size vectors for the per-pixel closed forms
//! - `lattice-core` - Array container and errors
//!
//! # Used By
//!
//! - `lattice-ops` - Diagonalisation of diffusion tensors

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod eigen;
mod inverse;
mod matrix;
mod sort;
mod svd;

pub use eigen::*;
pub use inverse::*;
pub use matrix::{cols, determinant, diagonal, identity, matmul, rows, transpose};
pub use sort::*;
pub use svd::*;

/// Re-export glam types for direct use
pub mod glam {
    pub use ::glam::{DVec2, DVec3};
}
