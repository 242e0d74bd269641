//! Benchmarks for lattice kernels.
//!
//! Run with: `cargo bench -p lattice-bench` (add `--features parallel` for
//! the rayon build).

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use lattice_core::{Axis, DenseArray};
use lattice_math::{inverse, svd, symmetric_eigen, symmetric_eigen_3x3};
use lattice_ops::kernel::{box_kernel, gaussian_kernel};
use lattice_ops::prelude::*;

fn test_image(size: usize, channels: usize) -> DenseArray<f32> {
    DenseArray::from_fn(size, size, 1, channels, |x, y, _, c| {
        ((x * 13 + y * 7 + c * 29) % 255) as f32 / 255.0
    })
}

fn test_matrix(n: usize) -> DenseArray<f64> {
    DenseArray::from_fn(n, n, 1, 1, |x, y, _, _| {
        let v = ((x * 31 + y * 17) % 23) as f64 / 23.0;
        if x == y { v + n as f64 } else { v }
    })
}

/// Stencil path (3x3, 5x5) against the generic path (7x7).
fn bench_correlate(c: &mut Criterion) {
    let mut group = c.benchmark_group("correlate");
    let img = test_image(512, 3);
    group.throughput(Throughput::Elements(img.len() as u64));

    for (name, kernel) in [
        ("box3", box_kernel(3)),
        ("gauss5", gaussian_kernel(5, 1.0)),
        ("gauss7", gaussian_kernel(7, 1.5)),
    ] {
        for boundary in [Boundary::Neumann, Boundary::Zero] {
            let opts = CorrelateOptions { boundary, ..Default::default() };
            let id = BenchmarkId::new(name, format!("{boundary:?}"));
            group.bench_with_input(id, &kernel, |b, k| {
                b.iter(|| correlate(black_box(&img), k, opts))
            });
        }
    }

    group.finish();
}

/// Recursive filtering cost should not depend on sigma.
fn bench_deriche(c: &mut Criterion) {
    let mut group = c.benchmark_group("deriche");
    let img = test_image(1024, 1);
    group.throughput(Throughput::Elements(img.len() as u64));

    for sigma in [1.0, 5.0, 25.0] {
        group.bench_with_input(BenchmarkId::new("blur", sigma), &sigma, |b, &s| {
            b.iter(|| blur(black_box(&img), s, Boundary::Neumann))
        });
    }
    group.bench_function("gradient_x", |b| {
        b.iter(|| deriche(black_box(&img), 2.0, 1, Axis::X, Boundary::Neumann))
    });

    group.finish();
}

fn bench_linalg(c: &mut Criterion) {
    let mut group = c.benchmark_group("linalg");

    for n in [3usize, 8, 32] {
        let m = test_matrix(n);
        group.bench_with_input(BenchmarkId::new("svd", n), &m, |b, m| b.iter(|| svd(black_box(m), true)));
        group.bench_with_input(BenchmarkId::new("inverse", n), &m, |b, m| b.iter(|| inverse(black_box(m))));
        let sym = DenseArray::from_fn(n, n, 1, 1, |x, y, _, _| m.at(x, y, 0, 0) + m.at(y, x, 0, 0));
        group.bench_with_input(BenchmarkId::new("eigen", n), &sym, |b, m| {
            b.iter(|| symmetric_eigen(black_box(m)))
        });
    }
    group.bench_function("eigen_3x3_closed", |b| {
        b.iter(|| symmetric_eigen_3x3(black_box([4.0, 1.0, 0.5, 3.0, 0.25, 2.0])))
    });

    group.finish();
}

fn bench_diffusion(c: &mut Criterion) {
    let mut group = c.benchmark_group("diffusion");
    group.sample_size(10);
    let img = test_image(128, 3);

    group.bench_function("tensors", |b| {
        b.iter(|| diffusion_tensors(black_box(&img), 0.7, 0.6, 0.6, 1.1, TensorScheme::ForwardBackward))
    });
    for interpolation in [Interpolation::Nearest, Interpolation::Linear, Interpolation::RungeKutta2] {
        let params = DiffusionParams { amplitude: 20.0, interpolation, ..Default::default() };
        group.bench_with_input(
            BenchmarkId::new("blur_anisotropic", format!("{interpolation:?}")),
            &params,
            |b, p| b.iter(|| blur_anisotropic(black_box(&img), p)),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_correlate, bench_deriche, bench_linalg, bench_diffusion);
criterion_main!(benches);
