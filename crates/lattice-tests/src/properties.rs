//! Algebraic properties checked across crates on pseudo-random inputs.

use approx::assert_abs_diff_eq;
use lattice_core::{f16, Axis, DenseArray, Shape};
use lattice_math::{matmul, permute_columns, sort_with_permutation, svd, symmetric_eigen, transpose};
use lattice_ops::kernel::gaussian_kernel;
use lattice_ops::prelude::*;

use crate::fixtures::{random_array, random_symmetric};

fn assert_arrays_close(a: &DenseArray<f64>, b: &DenseArray<f64>, eps: f64) {
    assert_eq!(a.shape(), b.shape());
    for (x, y) in a.data().iter().zip(b.data()) {
        assert_abs_diff_eq!(*x, *y, epsilon = eps);
    }
}

#[test]
fn test_buffer_length_matches_shape() {
    let a = DenseArray::<u16>::new(5, 4, 3, 2);
    assert_eq!(a.len(), 5 * 4 * 3 * 2);
    assert_eq!(a.data().len(), a.shape().len());

    let e = DenseArray::<f32>::empty();
    assert!(e.is_empty());
    assert_eq!(e.shape(), Shape::EMPTY);
    assert!(e.data().is_empty());

    assert!(DenseArray::from_vec(2, 2, 1, 1, vec![1u8; 5]).is_err());
}

#[test]
fn test_cast_round_trip() {
    let a = DenseArray::from_fn(7, 5, 1, 2, |x, y, _, c| (x * 31 + y * 7 + c) as u8);
    assert_eq!(a.cast::<u8>(), a);
    assert_eq!(a.cast::<f32>().cast::<u8>(), a);
    assert_eq!(a.cast::<i64>().cast::<u8>(), a);
    assert_eq!(a.cast::<f16>().cast::<u8>(), a);

    let b = DenseArray::from_fn(9, 1, 1, 1, |x, _, _, _| x as i16 * -1000);
    assert_eq!(b.cast::<f64>().cast::<i16>(), b);
}

#[test]
fn test_convolution_is_flipped_correlation() {
    let cases = [
        (random_array(9, 7, 1, 2, 1), random_array(3, 3, 1, 1, 2)),
        (random_array(9, 7, 1, 1, 3), random_array(5, 4, 1, 1, 4)),
        (random_array(12, 10, 1, 1, 5), random_array(7, 6, 1, 1, 6)),
        (random_array(6, 6, 5, 1, 7), random_array(3, 3, 3, 1, 8)),
        (random_array(6, 5, 4, 1, 9), random_array(4, 2, 3, 1, 10)),
    ];
    for (img, k) in &cases {
        let flipped = k.mirrored(Axis::X).mirrored(Axis::Y).mirrored(Axis::Z);
        for boundary in [Boundary::Zero, Boundary::Neumann] {
            for normalized in [false, true] {
                let opts = CorrelateOptions { boundary, normalized };
                let conv = convolve(img, k, opts).unwrap();
                let corr = correlate(img, &flipped, opts).unwrap();
                assert_arrays_close(&conv, &corr, 1e-12);
            }
        }
    }
}

#[test]
fn test_zero_sigma_blur_is_identity() {
    let img = random_array(11, 8, 3, 2, 11);
    assert_eq!(blur(&img, 0.0, Boundary::Neumann).unwrap(), img);
    assert_eq!(blur(&img, 0.0, Boundary::Zero).unwrap(), img);
}

#[test]
fn test_blur_is_linear() {
    let (a, b) = (2.5, -0.75);
    let i1 = random_array(20, 16, 1, 1, 12);
    let i2 = random_array(20, 16, 1, 1, 13);
    let mix = DenseArray::from_fn(20, 16, 1, 1, |x, y, _, _| a * i1.at(x, y, 0, 0) + b * i2.at(x, y, 0, 0));

    for boundary in [Boundary::Zero, Boundary::Neumann] {
        let lhs = blur(&mix, 2.0, boundary).unwrap();
        let (b1, b2) = (blur(&i1, 2.0, boundary).unwrap(), blur(&i2, 2.0, boundary).unwrap());
        let rhs = DenseArray::from_fn(20, 16, 1, 1, |x, y, _, _| a * b1.at(x, y, 0, 0) + b * b2.at(x, y, 0, 0));
        assert_arrays_close(&lhs, &rhs, 1e-10);
    }
}

#[test]
fn test_recursive_blur_close_to_kernel_blur() {
    let img = DenseArray::from_fn(40, 40, 1, 1, |x, y, _, _| (0.3 * x as f64).sin() + (0.2 * y as f64).cos());
    let recursive = blur(&img, 1.5, Boundary::Neumann).unwrap();
    let kernel = gaussian_kernel(11, 1.5);
    let direct = correlate(&img, &kernel, CorrelateOptions::default()).unwrap();
    for y in 8..32 {
        for x in 8..32 {
            assert_abs_diff_eq!(recursive.at(x, y, 0, 0), direct.at(x, y, 0, 0), epsilon = 0.05);
        }
    }
}

#[test]
fn test_svd_reconstructs() {
    for (cols, rows, seed) in [(4, 4, 20), (4, 6, 21), (7, 7, 22)] {
        let m = random_array(cols, rows, 1, 1, seed);
        let d = svd(&m, true).unwrap();
        assert!(d.converged);
        assert!(d.s.windows(2).all(|w| w[0] >= w[1]));

        let us = DenseArray::from_fn(cols, rows, 1, 1, |x, y, _, _| d.u.at(x, y, 0, 0) * d.s[x]);
        let back = matmul(&us, &transpose(&d.v)).unwrap();
        assert_arrays_close(&back, &m, 1e-10);

        for q in [&d.u, &d.v] {
            let qtq = matmul(&transpose(q), q).unwrap();
            assert_arrays_close(&qtq, &lattice_math::identity(cols), 1e-10);
        }
    }
}

#[test]
fn test_eigen_ordering_and_orthonormality() {
    for (n, seed) in [(3, 30), (5, 31), (8, 32)] {
        let m = random_symmetric(n, seed);
        let e = symmetric_eigen(&m).unwrap();
        assert!(e.values.windows(2).all(|w| w[0] >= w[1]));

        let vtv = matmul(&transpose(&e.vectors), &e.vectors).unwrap();
        assert_arrays_close(&vtv, &lattice_math::identity(n), 1e-9);

        for k in 0..n {
            let v = e.vector(k);
            for (i, vi) in v.iter().enumerate() {
                let mv: f64 = (0..n).map(|j| m.at(j, i, 0, 0) * v[j]).sum();
                assert_abs_diff_eq!(mv, e.values[k] * vi, epsilon = 1e-9);
            }
        }
    }
}

#[test]
fn test_sort_permutation_reorders_companion() {
    let mut values = random_array(12, 1, 1, 1, 40).into_vec();
    let original = values.clone();
    let perm = sort_with_permutation(&mut values, false);
    for (k, &p) in perm.iter().enumerate() {
        assert_eq!(values[k], original[p]);
    }

    let m = DenseArray::from_rows(12, 1, &original).unwrap();
    let reordered = permute_columns(&m, &perm);
    assert_eq!(reordered.data(), values.as_slice());
}
