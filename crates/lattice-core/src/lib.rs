//! # lattice-core
//!
//! Dense four-dimensional numeric arrays.
//!
//! This crate provides the container every other lattice crate works on:
//!
//! - [`DenseArray`] - Owned `(width, height, depth, channels)` buffer in planar order
//! - [`Shape`], [`Axis`] - Extents and axis naming
//! - [`Scalar`], [`ScalarKind`] - Supported element types
//! - [`Promote`], [`promote`] - Type promotion for binary operations
//! - [`ResizePolicy`] - Content policies for shape changes
//! - [`Error`], [`Result`] - The error hierarchy shared by the workspace
//!
//! ## Design
//!
//! Images, volumes, multi-channel tensor fields and matrices are all the same
//! type. A 2D grayscale image is `W x H x 1 x 1`, an RGB volume `W x H x D x 3`,
//! a 3-channel structure tensor field `W x H x 1 x 3` and an `m x n` matrix
//! `n x m x 1 x 1`. An array with any zero extent is *empty*; operations that
//! need data fail on it with [`Error::EmptyInstance`].
//!
//! ```rust
//! use lattice_core::prelude::*;
//!
//! let a = DenseArray::filled(8, 8, 1, 1, 2u8);
//! let b = DenseArray::filled(8, 8, 1, 1, 0.25f32);
//! let c = a.mul(&b)?;
//! assert_eq!(c.at(3, 3, 0, 0), 0.5f32);
//! # Ok::<(), lattice_core::Error>(())
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//! lattice-core (this crate)
//!    ^
//!    +-- lattice-math (inverse, SVD, eigen, sort)
//!    +-- lattice-ops  (stencils, correlation, Deriche, diffusion)
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod arith;
pub mod array;
pub mod error;
pub mod promote;
pub mod resize;
pub mod sample;
pub mod scalar;
pub mod shape;

pub use array::DenseArray;
pub use error::{Error, Result};
pub use promote::{float_kind, promote, Accum, Promote, Promoted, ToFloat};
pub use resize::ResizePolicy;
pub use sample::Sampler;
pub use scalar::{Scalar, ScalarKind};
pub use shape::{Axis, Shape};

/// Re-exported so that downstream crates name the same `f16` type.
pub use half::f16;

/// Prelude module for convenient imports.
///
/// # Usage
///
/// ```
/// use lattice_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::array::DenseArray;
    pub use crate::error::{Error, Result};
    pub use crate::promote::{Accum, Promote, Promoted, ToFloat};
    pub use crate::resize::ResizePolicy;
    pub use crate::sample::Sampler;
    pub use crate::scalar::{Scalar, ScalarKind};
    pub use crate::shape::{Axis, Shape};
}
