//! Element types storable in a [`DenseArray`](crate::DenseArray).
//!
//! # Types
//!
//! - [`Scalar`] - Trait implemented by every supported element type
//! - [`ScalarKind`] - Runtime tag naming an element type
//!
//! Supported element types are the signed and unsigned integers from 8 to
//! 64 bits, [`half::f16`], [`f32`] and [`f64`].
//!
//! # Conversions
//!
//! Every conversion goes through an `f64` hub with Rust `as` semantics:
//! floats truncate toward zero when narrowed to integers, out-of-range values
//! saturate at the type bounds and NaN maps to zero. 64-bit integers beyond
//! 2^53 lose precision through the hub.
//!
//! ```
//! use lattice_core::Scalar;
//!
//! let v: u8 = Scalar::from_f64(300.7);
//! assert_eq!(v, 255);
//! let w: i16 = 3.9f32.cast();
//! assert_eq!(w, 3);
//! ```

use half::f16;
use std::fmt;

/// Runtime tag for a [`Scalar`] element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// Unsigned 8-bit integer.
    U8,
    /// Signed 8-bit integer.
    I8,
    /// Unsigned 16-bit integer.
    U16,
    /// Signed 16-bit integer.
    I16,
    /// Unsigned 32-bit integer.
    U32,
    /// Signed 32-bit integer.
    I32,
    /// Unsigned 64-bit integer.
    U64,
    /// Signed 64-bit integer.
    I64,
    /// IEEE 754 half precision float.
    F16,
    /// IEEE 754 single precision float.
    F32,
    /// IEEE 754 double precision float.
    F64,
}

impl ScalarKind {
    /// All kinds, narrowest integer first.
    pub const ALL: [ScalarKind; 11] = [
        Self::U8,
        Self::I8,
        Self::U16,
        Self::I16,
        Self::U32,
        Self::I32,
        Self::U64,
        Self::I64,
        Self::F16,
        Self::F32,
        Self::F64,
    ];

    /// Number of bits per element.
    #[inline]
    pub const fn bits(self) -> u32 {
        match self {
            Self::U8 | Self::I8 => 8,
            Self::U16 | Self::I16 | Self::F16 => 16,
            Self::U32 | Self::I32 | Self::F32 => 32,
            Self::U64 | Self::I64 | Self::F64 => 64,
        }
    }

    /// Whether this is a floating-point kind.
    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::F16 | Self::F32 | Self::F64)
    }

    /// Whether this is a signed kind (floats are signed).
    #[inline]
    pub const fn is_signed(self) -> bool {
        !matches!(self, Self::U8 | Self::U16 | Self::U32 | Self::U64)
    }

    /// Rust type name of the kind.
    pub const fn name(self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::I8 => "i8",
            Self::U16 => "u16",
            Self::I16 => "i16",
            Self::U32 => "u32",
            Self::I32 => "i32",
            Self::U64 => "u64",
            Self::I64 => "i64",
            Self::F16 => "f16",
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Trait for array element types.
///
/// # Required Methods
///
/// - [`to_f64`](Scalar::to_f64) - Widen to `f64` (exact for every type up to 32 bits)
/// - [`from_f64`](Scalar::from_f64) - Narrow from `f64` with `as` semantics
///
/// # Constants
///
/// - [`KIND`](Scalar::KIND) - Runtime tag of the type
/// - [`MIN`](Scalar::MIN) / [`MAX`](Scalar::MAX) - Representable range as `f64`
pub trait Scalar: Copy + Default + PartialOrd + fmt::Debug + Send + Sync + 'static {
    /// Runtime tag of this type.
    const KIND: ScalarKind;

    /// Smallest representable value.
    const MIN: f64;

    /// Largest representable value.
    const MAX: f64;

    /// Converts to `f64`.
    fn to_f64(self) -> f64;

    /// Converts from `f64` (truncating, saturating, NaN to zero for integers).
    fn from_f64(v: f64) -> Self;

    /// Zero value.
    #[inline]
    fn zero() -> Self {
        Self::from_f64(0.0)
    }

    /// One value.
    #[inline]
    fn one() -> Self {
        Self::from_f64(1.0)
    }

    /// Converts this value into another scalar type.
    #[inline]
    fn cast<U: Scalar>(self) -> U {
        U::from_f64(self.to_f64())
    }
}

macro_rules! impl_scalar_primitive {
    ($($t:ty => $kind:ident),* $(,)?) => {
        $(
            impl Scalar for $t {
                const KIND: ScalarKind = ScalarKind::$kind;
                const MIN: f64 = <$t>::MIN as f64;
                const MAX: f64 = <$t>::MAX as f64;

                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }

                #[inline]
                fn from_f64(v: f64) -> Self {
                    v as $t
                }
            }
        )*
    };
}

impl_scalar_primitive!(
    u8 => U8,
    i8 => I8,
    u16 => U16,
    i16 => I16,
    u32 => U32,
    i32 => I32,
    u64 => U64,
    i64 => I64,
    f32 => F32,
    f64 => F64,
);

impl Scalar for f16 {
    const KIND: ScalarKind = ScalarKind::F16;
    const MIN: f64 = -65504.0;
    const MAX: f64 = 65504.0;

    #[inline]
    fn to_f64(self) -> f64 {
        f16::to_f64(self)
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        f16::from_f64(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_narrowing_saturates() {
        assert_eq!(u8::from_f64(-3.0), 0);
        assert_eq!(u8::from_f64(1e9), 255);
        assert_eq!(i8::from_f64(-1e9), -128);
        assert_eq!(u16::from_f64(f64::NAN), 0);
    }

    #[test]
    fn test_float_to_int_truncates() {
        assert_eq!(i32::from_f64(-2.7), -2);
        assert_eq!(u32::from_f64(2.7), 2);
    }

    #[test]
    fn test_half_roundtrip() {
        let h = f16::from_f64(0.5);
        assert_eq!(h.to_f64(), 0.5);
        let back: f32 = h.cast();
        assert_eq!(back, 0.5);
    }

    #[test]
    fn test_kind_metadata() {
        assert!(ScalarKind::F16.is_float());
        assert!(!ScalarKind::U32.is_float());
        assert!(ScalarKind::I8.is_signed());
        assert!(!ScalarKind::U64.is_signed());
        assert_eq!(ScalarKind::I16.bits(), 16);
        assert_eq!(<f64 as Scalar>::KIND.to_string(), "f64");
    }
}
