//! Numeric type promotion for binary operations.
//!
//! Binary operations between arrays of different element types produce the
//! "largest" of the two types, chosen so that the combined value cannot
//! overflow the result where that is possible:
//!
//! - identical types stay as they are;
//! - mixing signed and unsigned integers widens to the next signed type that
//!   holds both ranges (`u8 + i8 -> i16`, `u32 + i32 -> i64`);
//! - integers of up to 16 bits combined with `f32` stay `f32`, 32 and 64-bit
//!   integers combined with any float go to `f64`;
//! - `f16` absorbs 8-bit integers, `f32 + f64 -> f64`.
//!
//! The table is written out once and generates both
//! the compile-time mapping ([`Promote`]) and the runtime lookup
//! ([`promote`]), so the two cannot drift apart.
//!
//! # Example
//!
//! ```
//! use lattice_core::{promote, Promoted, Scalar, ScalarKind};
//!
//! assert_eq!(promote(ScalarKind::U8, ScalarKind::I8), ScalarKind::I16);
//! assert_eq!(<Promoted<u8, f32> as Scalar>::KIND, ScalarKind::F32);
//! assert_eq!(<Promoted<i32, f32> as Scalar>::KIND, ScalarKind::F64);
//! ```

use crate::{Scalar, ScalarKind};
use half::f16;

/// Compile-time promotion of `Self` combined with `Rhs`.
pub trait Promote<Rhs: Scalar = Self>: Scalar {
    /// Element type of the combined result.
    type Output: Scalar + ToFloat;
}

/// Element type produced by combining `A` and `B`.
pub type Promoted<A, B> = <A as Promote<B>>::Output;

/// Floating-point type used to accumulate values of `Self`.
///
/// Equivalent to promoting `Self` with `f32`.
pub trait ToFloat: Scalar {
    /// Accumulation type.
    type Float: Scalar + ToFloat;
}

/// Floating-point accumulation type for combining `A` and `B`.
pub type Accum<A, B> = <Promoted<A, B> as ToFloat>::Float;

macro_rules! promotion_table {
    (
        same: [$($s:ty),* $(,)?];
        mixed: [$($a:ty, $b:ty => $o:ty;)*]
    ) => {
        $(
            impl Promote<$s> for $s {
                type Output = $s;
            }
        )*
        $(
            impl Promote<$b> for $a {
                type Output = $o;
            }
            impl Promote<$a> for $b {
                type Output = $o;
            }
        )*

        fn lookup(a: ScalarKind, b: ScalarKind) -> ScalarKind {
            if a == b {
                return a;
            }
            $(
                if (a == <$a as Scalar>::KIND && b == <$b as Scalar>::KIND)
                    || (a == <$b as Scalar>::KIND && b == <$a as Scalar>::KIND)
                {
                    return <$o as Scalar>::KIND;
                }
            )*
            ScalarKind::F64
        }
    };
}

promotion_table! {
    same: [u8, i8, u16, i16, u32, i32, u64, i64, f16, f32, f64];
    mixed: [
        u8, i8 => i16;
        u8, u16 => u16;
        u8, i16 => i16;
        u8, u32 => u32;
        u8, i32 => i32;
        u8, u64 => u64;
        u8, i64 => i64;
        u8, f16 => f16;
        u8, f32 => f32;
        u8, f64 => f64;
        i8, u16 => i32;
        i8, i16 => i16;
        i8, u32 => i64;
        i8, i32 => i32;
        i8, u64 => i64;
        i8, i64 => i64;
        i8, f16 => f16;
        i8, f32 => f32;
        i8, f64 => f64;
        u16, i16 => i32;
        u16, u32 => u32;
        u16, i32 => i32;
        u16, u64 => u64;
        u16, i64 => i64;
        u16, f16 => f32;
        u16, f32 => f32;
        u16, f64 => f64;
        i16, u32 => i64;
        i16, i32 => i32;
        i16, u64 => i64;
        i16, i64 => i64;
        i16, f16 => f32;
        i16, f32 => f32;
        i16, f64 => f64;
        u32, i32 => i64;
        u32, u64 => u64;
        u32, i64 => i64;
        u32, f16 => f64;
        u32, f32 => f64;
        u32, f64 => f64;
        i32, u64 => i64;
        i32, i64 => i64;
        i32, f16 => f64;
        i32, f32 => f64;
        i32, f64 => f64;
        u64, i64 => i64;
        u64, f16 => f64;
        u64, f32 => f64;
        u64, f64 => f64;
        i64, f16 => f64;
        i64, f32 => f64;
        i64, f64 => f64;
        f16, f32 => f32;
        f16, f64 => f64;
        f32, f64 => f64;
    ]
}

macro_rules! float_accumulators {
    ($($t:ty => $f:ty),* $(,)?) => {
        $(
            impl ToFloat for $t {
                type Float = $f;
            }
        )*
    };
}

float_accumulators!(
    u8 => f32,
    i8 => f32,
    u16 => f32,
    i16 => f32,
    u32 => f64,
    i32 => f64,
    u64 => f64,
    i64 => f64,
    f16 => f32,
    f32 => f32,
    f64 => f64,
);

/// Returns the element kind produced by combining `a` and `b`.
///
/// Symmetric: `promote(a, b) == promote(b, a)`.
#[inline]
pub fn promote(a: ScalarKind, b: ScalarKind) -> ScalarKind {
    lookup(a, b)
}

/// Returns the floating-point kind used to accumulate values of `kind`.
#[inline]
pub fn float_kind(kind: ScalarKind) -> ScalarKind {
    promote(kind, ScalarKind::F32)
}
