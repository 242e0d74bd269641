//! Shape changes with a content policy.
//!
//! [`DenseArray::resize`] changes the four extents of an array and fills the
//! new buffer according to a [`ResizePolicy`]. The new buffer is built
//! completely before it replaces the old one, so a failing resize leaves the
//! array untouched.
//!
//! | Policy      | New content                                                 |
//! |-------------|-------------------------------------------------------------|
//! | `ZeroPad`   | overlap copied at the origin, zeros elsewhere               |
//! | `Nearest`   | nearest source sample, `src = floor(dst * old / new)`       |
//! | `Tile`      | source repeated periodically, `src = dst mod old`           |
//! | `Linear`    | separable linear, corners aligned                           |
//! | `Grid`      | source values scattered on a regular grid, zeros in between |
//! | `Cubic`     | separable Catmull-Rom, corners aligned                      |
//!
//! Interpolating policies work axis by axis (x, y, z, then c), converting
//! through `f64` and back with [`Scalar::from_f64`].

use crate::{DenseArray, Error, Result, Scalar, Shape};
use tracing::debug;

/// How the content of a resized array is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResizePolicy {
    /// Keep the overlapping region, zero the rest.
    ZeroPad,
    /// Nearest-neighbour sampling.
    #[default]
    Nearest,
    /// Periodic repetition of the source.
    Tile,
    /// Linear interpolation.
    Linear,
    /// Scatter source samples on a grid.
    Grid,
    /// Cubic interpolation.
    Cubic,
}

/// Maps destination index `i` of `dst` onto a source coordinate among `src`
/// samples, with the first and last samples of both aligned.
#[inline]
fn aligned(i: usize, src: usize, dst: usize) -> f64 {
    if dst <= 1 || src <= 1 {
        0.0
    } else {
        i as f64 * (src - 1) as f64 / (dst - 1) as f64
    }
}

/// Catmull-Rom weights for fraction `t`, in `[p0, p1, p2, p3]` order.
#[inline]
fn cubic_weights(t: f64) -> [f64; 4] {
    let t2 = t * t;
    let t3 = t2 * t;
    [
        0.5 * (-t + 2.0 * t2 - t3),
        0.5 * (2.0 - 5.0 * t2 + 3.0 * t3),
        0.5 * (t + 4.0 * t2 - 3.0 * t3),
        0.5 * (-t2 + t3),
    ]
}

/// Resamples the planar buffer `src` with extents `dims` along `axis` to
/// `len` samples.
fn resample_axis(src: &[f64], dims: [usize; 4], axis: usize, len: usize, cubic: bool) -> Vec<f64> {
    let n = dims[axis];
    let mut out_dims = dims;
    out_dims[axis] = len;

    let stride: usize = dims[..axis].iter().product();
    let out_stride: usize = out_dims[..axis].iter().product();
    let outer: usize = dims[axis + 1..].iter().product();

    let mut out = vec![0.0; out_stride * len * outer];
    for o in 0..outer {
        for s in 0..stride {
            let base = o * stride * n + s;
            let out_base = o * out_stride * len + s;
            let at = |i: isize| src[base + i.clamp(0, n as isize - 1) as usize * stride];
            for i in 0..len {
                let f = aligned(i, n, len);
                let i0 = f.floor() as isize;
                let t = f - i0 as f64;
                let v = if cubic {
                    let w = cubic_weights(t);
                    w[0] * at(i0 - 1) + w[1] * at(i0) + w[2] * at(i0 + 1) + w[3] * at(i0 + 2)
                } else {
                    let a = at(i0);
                    if t == 0.0 { a } else { a + t * (at(i0 + 1) - a) }
                };
                out[out_base + i * out_stride] = v;
            }
        }
    }
    out
}

impl<T: Scalar> DenseArray<T> {
    /// Returns a resized copy of the array.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyInstance`] when resampling an empty array with any
    ///   policy other than [`ResizePolicy::ZeroPad`]
    pub fn get_resize(
        &self,
        width: usize,
        height: usize,
        depth: usize,
        channels: usize,
        policy: ResizePolicy,
    ) -> Result<Self> {
        let to = Shape::new(width, height, depth, channels);
        let from = self.shape();
        if to == from {
            return Ok(self.clone());
        }
        if to.is_empty() {
            return Ok(Self::empty());
        }
        if from.is_empty() {
            return match policy {
                ResizePolicy::ZeroPad => Ok(Self::with_shape(to, T::zero())),
                _ => Err(Error::empty_instance("resize")),
            };
        }
        debug!(from = %from, to = %to, ?policy, "resize");

        Ok(match policy {
            ResizePolicy::ZeroPad => {
                let mut out = Self::with_shape(to, T::zero());
                for c in 0..from.channels.min(to.channels) {
                    for z in 0..from.depth.min(to.depth) {
                        for y in 0..from.height.min(to.height) {
                            let w = from.width.min(to.width);
                            let s = from.offset(0, y, z, c);
                            let d = to.offset(0, y, z, c);
                            out.data_mut()[d..d + w].copy_from_slice(&self.data()[s..s + w]);
                        }
                    }
                }
                out
            }
            ResizePolicy::Nearest => Self::from_fn(width, height, depth, channels, |x, y, z, c| {
                self.at(
                    x * from.width / to.width,
                    y * from.height / to.height,
                    z * from.depth / to.depth,
                    c * from.channels / to.channels,
                )
            }),
            ResizePolicy::Tile => Self::from_fn(width, height, depth, channels, |x, y, z, c| {
                self.at(
                    x % from.width,
                    y % from.height,
                    z % from.depth,
                    c % from.channels,
                )
            }),
            ResizePolicy::Grid => {
                let mut out = Self::with_shape(to, T::zero());
                for (x, y, z, c, v) in self.indexed_iter() {
                    let (dx, dy, dz, dc) = (
                        x * to.width / from.width,
                        y * to.height / from.height,
                        z * to.depth / from.depth,
                        c * to.channels / from.channels,
                    );
                    if to.contains(dx, dy, dz, dc) {
                        out.set(dx, dy, dz, dc, v);
                    }
                }
                out
            }
            ResizePolicy::Linear | ResizePolicy::Cubic => {
                let cubic = policy == ResizePolicy::Cubic;
                let mut dims = from.dims();
                let mut buf = self.to_f64_vec();
                for (axis, &len) in to.dims().iter().enumerate() {
                    if dims[axis] != len {
                        buf = resample_axis(&buf, dims, axis, len, cubic);
                        dims[axis] = len;
                    }
                }
                let data = buf.into_iter().map(T::from_f64).collect();
                Self::from_vec(width, height, depth, channels, data)?
            }
        })
    }

    /// Resizes the array in place.
    ///
    /// See [`get_resize`](Self::get_resize).
    pub fn resize(
        &mut self,
        width: usize,
        height: usize,
        depth: usize,
        channels: usize,
        policy: ResizePolicy,
    ) -> Result<&mut Self> {
        *self = self.get_resize(width, height, depth, channels, policy)?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_zero_pad_keeps_overlap() {
        let a = DenseArray::from_rows(2, 2, &[1u8, 2, 3, 4]).unwrap();
        let b = a.get_resize(3, 3, 1, 1, ResizePolicy::ZeroPad).unwrap();
        assert_eq!(b.data(), &[1, 2, 0, 3, 4, 0, 0, 0, 0]);
        let c = b.get_resize(1, 2, 1, 1, ResizePolicy::ZeroPad).unwrap();
        assert_eq!(c.data(), &[1, 3]);
    }

    #[test]
    fn test_nearest_upscale() {
        let a = DenseArray::from_rows(2, 1, &[5i32, 9]).unwrap();
        let b = a.get_resize(4, 1, 1, 1, ResizePolicy::Nearest).unwrap();
        assert_eq!(b.data(), &[5, 5, 9, 9]);
    }

    #[test]
    fn test_tile() {
        let a = DenseArray::from_rows(2, 1, &[1u16, 2]).unwrap();
        let b = a.get_resize(5, 2, 1, 1, ResizePolicy::Tile).unwrap();
        assert_eq!(b.data(), &[1, 2, 1, 2, 1, 1, 2, 1, 2, 1]);
    }

    #[test]
    fn test_linear_aligns_corners() {
        let a = DenseArray::from_rows(2, 1, &[0.0f64, 3.0]).unwrap();
        let b = a.get_resize(4, 1, 1, 1, ResizePolicy::Linear).unwrap();
        for (i, &v) in b.data().iter().enumerate() {
            assert_abs_diff_eq!(v, i as f64, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_cubic_preserves_linear_ramp() {
        let a = DenseArray::from_fn(5, 1, 1, 1, |x, _, _, _| 2.0 * x as f64);
        let b = a.get_resize(9, 1, 1, 1, ResizePolicy::Cubic).unwrap();
        assert_abs_diff_eq!(b.at(0, 0, 0, 0), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(b.at(8, 0, 0, 0), 8.0, epsilon = 1e-12);
        assert_abs_diff_eq!(b.at(4, 0, 0, 0), 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_grid_scatter() {
        let a = DenseArray::from_rows(2, 1, &[7u8, 8]).unwrap();
        let b = a.get_resize(4, 1, 1, 1, ResizePolicy::Grid).unwrap();
        assert_eq!(b.data(), &[7, 0, 8, 0]);
    }

    #[test]
    fn test_resize_channels_and_empty() {
        let mut a = DenseArray::filled(2, 2, 1, 1, 1.0f32);
        a.resize(2, 2, 1, 3, ResizePolicy::Nearest).unwrap();
        assert_eq!(a.channels(), 3);
        assert!(a.data().iter().all(|&v| v == 1.0));

        a.resize(0, 2, 1, 1, ResizePolicy::Linear).unwrap();
        assert!(a.is_empty());

        let err = a.get_resize(2, 2, 1, 1, ResizePolicy::Linear).unwrap_err();
        assert!(err.is_instance_error());
        assert_eq!(
            a.get_resize(2, 2, 1, 1, ResizePolicy::ZeroPad).unwrap().len(),
            4
        );
    }
}
