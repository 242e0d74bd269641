//! Channel-plane execution.
//!
//! Channels of a planar array are contiguous and independent, so filters
//! that work per channel hand each plane of the destination buffer to a
//! closure. With the `parallel` feature the planes are processed on the
//! rayon thread pool; without it they run in order on the calling thread.
//! Each plane is written by exactly one closure call, so both builds give
//! identical results.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Calls `f(c, plane)` for every channel plane of `dst`.
///
/// `plane_len` is the number of values per channel. Does nothing when
/// `plane_len` is zero.
pub fn for_each_plane<A, F>(dst: &mut [A], plane_len: usize, f: F)
where
    A: Send,
    F: Fn(usize, &mut [A]) + Send + Sync,
{
    if plane_len == 0 {
        return;
    }

    #[cfg(feature = "parallel")]
    dst.par_chunks_mut(plane_len)
        .enumerate()
        .for_each(|(c, plane)| f(c, plane));

    #[cfg(not(feature = "parallel"))]
    dst.chunks_mut(plane_len)
        .enumerate()
        .for_each(|(c, plane)| f(c, plane));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_plane_visited_once() {
        let mut buf = vec![0u32; 12];
        for_each_plane(&mut buf, 4, |c, plane| {
            for v in plane.iter_mut() {
                *v += c as u32 + 1;
            }
        });
        assert_eq!(buf, [1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3]);
    }

    #[test]
    fn test_zero_plane_len() {
        let mut buf: Vec<f32> = Vec::new();
        for_each_plane(&mut buf, 0, |_, _| unreachable!());
    }
}
