//! Error types for lattice operations.
//!
//! One error hierarchy is shared by every crate of the workspace, so that a
//! caller sitting at the I/O or CLI boundary only has to handle one type.
//!
//! # Overview
//!
//! The [`Error`] enum covers three families of failure:
//! - **Instance errors** - an operation was invoked on an empty array
//! - **Argument errors** - an invalid parameter (negative sigma, wrong kernel
//!   rank, shape mismatch, out-of-range enum value)
//! - **I/O errors** - reserved for the file layer built on top of this crate
//!
//! Numerically degenerate but legal inputs (singular matrices, zero norms,
//! non-converging SVD) are *not* errors: the kernels return a well-defined
//! degenerate result and emit a `tracing::warn!` advisory instead.
//!
//! # Usage
//!
//! ```rust
//! use lattice_core::{DenseArray, Error, Result};
//!
//! fn first_value(img: &DenseArray<f32>) -> Result<f32> {
//!     if img.is_empty() {
//!         return Err(Error::empty_instance("first_value"));
//!     }
//!     Ok(img.data()[0])
//! }
//!
//! let empty = DenseArray::<f32>::empty();
//! assert!(first_value(&empty).unwrap_err().is_instance_error());
//! ```

use crate::Shape;
use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in array, filter and linear algebra operations.
///
/// # Categories
///
/// - **Instance errors**: [`EmptyInstance`](Error::EmptyInstance)
/// - **Argument errors**: [`InvalidArgument`](Error::InvalidArgument),
///   [`ShapeMismatch`](Error::ShapeMismatch), [`InvalidKernel`](Error::InvalidKernel)
/// - **I/O errors**: [`Io`](Error::Io)
#[derive(Debug, Error)]
pub enum Error {
    /// The operation requires a non-empty array.
    #[error("{op}: instance is empty")]
    EmptyInstance {
        /// Name of the operation that was attempted
        op: &'static str,
    },

    /// A parameter value is outside its valid domain.
    ///
    /// # Example
    ///
    /// ```rust
    /// use lattice_core::Error;
    ///
    /// let err = Error::invalid_argument("deriche", "sigma must be >= 0, got -1");
    /// assert!(err.to_string().contains("sigma"));
    /// ```
    #[error("{op}: invalid argument: {reason}")]
    InvalidArgument {
        /// Name of the operation
        op: &'static str,
        /// Why the argument was rejected
        reason: String,
    },

    /// Two arrays (or an array and a buffer) have incompatible extents.
    #[error("{op}: shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch {
        /// Name of the operation
        op: &'static str,
        /// Shape the operation expected
        expected: Shape,
        /// Shape that was supplied
        got: Shape,
    },

    /// A correlation kernel is empty or has more than one channel.
    #[error("invalid kernel: {reason}")]
    InvalidKernel {
        /// Why the kernel was rejected
        reason: String,
    },

    /// I/O error during file operations.
    ///
    /// Not produced by the computational core; kept so that readers and
    /// writers built on top of it share the same hierarchy.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Creates an [`Error::EmptyInstance`] error.
    #[inline]
    pub fn empty_instance(op: &'static str) -> Self {
        Self::EmptyInstance { op }
    }

    /// Creates an [`Error::InvalidArgument`] error.
    #[inline]
    pub fn invalid_argument(op: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            op,
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::ShapeMismatch`] error.
    #[inline]
    pub fn shape_mismatch(op: &'static str, expected: Shape, got: Shape) -> Self {
        Self::ShapeMismatch { op, expected, got }
    }

    /// Creates an [`Error::InvalidKernel`] error.
    #[inline]
    pub fn invalid_kernel(reason: impl Into<String>) -> Self {
        Self::InvalidKernel {
            reason: reason.into(),
        }
    }

    /// Returns `true` if this error reports an empty instance.
    #[inline]
    pub fn is_instance_error(&self) -> bool {
        matches!(self, Self::EmptyInstance { .. })
    }

    /// Returns `true` if this error reports an invalid argument of any kind.
    #[inline]
    pub fn is_argument_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument { .. } | Self::ShapeMismatch { .. } | Self::InvalidKernel { .. }
        )
    }

    /// Returns `true` if this is an I/O error.
    #[inline]
    pub fn is_io_error(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}
