//! # lattice-ops
//!
//! Neighbourhood operators on [`DenseArray`](lattice_core::DenseArray)s.
//!
//! # Modules
//!
//! - [`stencil`] - Rolling 2x2 to 5x5 and 2x2x2/3x3x3 windows
//! - [`correlate`] - Correlation and convolution with a scalar kernel
//! - [`kernel`] - Box, Gaussian and Laplacian kernels
//! - [`deriche`] - Recursive Gaussian smoothing and derivatives
//! - [`tensor`] - Structure and diffusion tensor fields
//! - [`diffusion`] - Edge-preserving anisotropic smoothing
//! - [`config`] - YAML-loadable parameter bundle
//!
//! # Example
//!
//! ```rust
//! use lattice_core::DenseArray;
//! use lattice_ops::prelude::*;
//!
//! let img = DenseArray::filled(4, 4, 1, 1, 1.0f32);
//! let opts = CorrelateOptions { boundary: Boundary::Zero, ..Default::default() };
//! let out = correlate(&img, &box_kernel(3), opts)?;
//! assert!((out.at(0, 0, 0, 0) - 4.0 / 9.0).abs() < 1e-6);
//!
//! let smooth = blur(&img, 2.0, Boundary::Neumann)?;
//! assert!((smooth.at(2, 2, 0, 0) - 1.0).abs() < 1e-5);
//! # Ok::<(), lattice_core::Error>(())
//! ```
//!
//! # Features
//!
//! - `parallel` - Process channel planes on the rayon thread pool. Results
//!   are identical to the sequential build.
//!
//! # Dependencies
//!
//! - `lattice-core` - Arrays and errors
//! - `lattice-math` - Closed-form eigen decompositions for tensor fields
//! - [`glam`] - Curve integration vectors
//! - [`serde`], [`serde_yaml`] - Configuration
//! - [`tracing`] - Diagnostics

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod correlate;
pub mod deriche;
pub mod diffusion;
pub mod kernel;
pub mod parallel;
pub mod stencil;
pub mod tensor;

pub use config::ProcessingConfig;
pub use correlate::{convolve, correlate, Boundary, CorrelateOptions};
pub use deriche::{blur, blur_xyz, deriche, deriche_in_place, gradient_xyz, DericheConfig};
pub use diffusion::{blur_anisotropic, blur_anisotropic_with, DiffusionParams, Interpolation};
pub use tensor::{diffusion_tensors, structure_tensors, TensorScheme};

/// Common imports.
pub mod prelude {
    pub use crate::config::ProcessingConfig;
    pub use crate::correlate::{convolve, correlate, Boundary, CorrelateOptions};
    pub use crate::deriche::{blur, blur_xyz, deriche, gradient_xyz};
    pub use crate::diffusion::{blur_anisotropic, DiffusionParams, Interpolation};
    pub use crate::kernel::{box_kernel, gaussian_kernel, laplacian_kernel};
    pub use crate::tensor::{diffusion_tensors, structure_tensors, TensorScheme};
}
