//! Benchmarks for NURBS evaluation and splitting.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use knotwork::nurbs::{evaluate_basis_derivatives, ControlPointPolygon, KnotVector, NurbsCurve};
use knotwork::Point3;

fn helix(count: usize, degree: usize) -> NurbsCurve<f64> {
    let points = (0..count).map(|i| {
        let angle = i as f64 * 0.5;
        Point3::new(angle.cos(), angle.sin(), i as f64 * 0.1)
    });
    NurbsCurve::create_from_points(points, degree).unwrap()
}

fn rational_helix(count: usize, degree: usize) -> NurbsCurve<f64> {
    let polygon = ControlPointPolygon::from_weighted((0..count).map(|i| {
        let angle = i as f64 * 0.5;
        let weight = if i % 2 == 0 { 1.0 } else { 0.7 };
        (Point3::new(angle.cos(), angle.sin(), i as f64 * 0.1), weight)
    }))
    .unwrap();
    let knots = KnotVector::clamped_uniform(count, degree).unwrap();
    NurbsCurve::new(knots, polygon, degree).unwrap()
}

fn bench_point_at(c: &mut Criterion) {
    let mut group = c.benchmark_group("nurbs_point_at");

    for degree in [2, 3, 5] {
        let curve = helix(64, degree);
        group.bench_with_input(BenchmarkId::new("single", degree), &curve, |b, curve| {
            b.iter(|| curve.point_at(black_box(0.37)))
        });
    }

    let curve = rational_helix(64, 3);
    for count in [100, 1000] {
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("batch", count), &count, |b, &count| {
            b.iter(|| {
                for i in 0..count {
                    let t = i as f64 / count as f64;
                    let _ = curve.point_at(black_box(t));
                }
            })
        });
    }

    group.finish();
}

fn bench_derivative_at(c: &mut Criterion) {
    let mut group = c.benchmark_group("nurbs_derivative_at");

    let curve = rational_helix(64, 3);
    for order in [1, 2, 3] {
        group.bench_with_input(BenchmarkId::new("order", order), &order, |b, &order| {
            b.iter(|| curve.derivative_at(black_box(0.37), order))
        });
    }

    group.bench_function("frame_at", |b| b.iter(|| curve.frame_at(black_box(0.37))));

    group.finish();
}

fn bench_basis(c: &mut Criterion) {
    let mut group = c.benchmark_group("basis_derivatives");

    for degree in [2, 3, 5] {
        let knots = KnotVector::<f64>::clamped_uniform(64, degree).unwrap();
        group.bench_with_input(BenchmarkId::new("degree", degree), &knots, |b, knots| {
            b.iter(|| evaluate_basis_derivatives(knots, degree, black_box(0.37), 2))
        });
    }

    group.finish();
}

fn bench_split(c: &mut Criterion) {
    let mut group = c.benchmark_group("nurbs_split");

    for count in [16, 64, 256] {
        let curve = rational_helix(count, 3);
        group.bench_with_input(BenchmarkId::new("points", count), &curve, |b, curve| {
            b.iter(|| curve.split(black_box(0.37)))
        });
    }

    group.finish();
}

fn bench_to_polyline(c: &mut Criterion) {
    let mut group = c.benchmark_group("nurbs_to_polyline");

    let curve = rational_helix(32, 3);
    for tolerance in [0.01, 0.001, 0.0001] {
        group.bench_with_input(
            BenchmarkId::new("tolerance", tolerance),
            &tolerance,
            |b, &tolerance| b.iter(|| curve.to_polyline(black_box(tolerance))),
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_point_at,
    bench_derivative_at,
    bench_basis,
    bench_split,
    bench_to_polyline
);
criterion_main!(benches);
