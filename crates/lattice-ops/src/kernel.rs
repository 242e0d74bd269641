//! Ready-made correlation kernels.
//!
//! Kernels are single-channel `f32` arrays usable with
//! [`correlate`](crate::correlate::correlate) and
//! [`convolve`](crate::correlate::convolve).
//!
//! - [`box_kernel`] - Uniform average
//! - [`gaussian_kernel`] - Normalised sampled Gaussian
//! - [`laplacian_kernel`] - 4-neighbour Laplacian

use lattice_core::DenseArray;

/// `n x n` averaging kernel with weights `1 / n^2`.
///
/// # Example
///
/// ```rust
/// use lattice_ops::kernel::box_kernel;
///
/// let k = box_kernel(3);
/// assert_eq!(k.width(), 3);
/// assert!((k.sum() - 1.0).abs() < 1e-6);
/// ```
pub fn box_kernel(n: usize) -> DenseArray<f32> {
    let weight = 1.0 / (n * n) as f32;
    DenseArray::filled(n, n, 1, 1, weight)
}

/// `n x n` Gaussian kernel of standard deviation `sigma`, normalised to sum 1.
///
/// The peak sits at index `(n - 1) / 2`, the kernel origin used by
/// correlation, so even sizes are slightly off-centre.
pub fn gaussian_kernel(n: usize, sigma: f32) -> DenseArray<f32> {
    let o = ((n.max(1) - 1) / 2) as f32;
    let sigma2 = 2.0 * sigma * sigma;
    let mut k = DenseArray::from_fn(n, n, 1, 1, |x, y, _, _| {
        let dx = x as f32 - o;
        let dy = y as f32 - o;
        if sigma2 > 0.0 {
            (-(dx * dx + dy * dy) / sigma2).exp()
        } else if dx == 0.0 && dy == 0.0 {
            1.0
        } else {
            0.0
        }
    });
    let sum = k.sum() as f32;
    if sum > 0.0 {
        k.map_in_place(|w| w / sum);
    }
    k
}

/// 3x3 Laplacian kernel `[0 1 0; 1 -4 1; 0 1 0]`.
pub fn laplacian_kernel() -> DenseArray<f32> {
    let mut k = DenseArray::new(3, 3, 1, 1);
    k.data_mut()
        .copy_from_slice(&[0.0, 1.0, 0.0, 1.0, -4.0, 1.0, 0.0, 1.0, 0.0]);
    k
}
