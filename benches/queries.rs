//! Benchmarks for massing generation and the exterior queries.

use bevy::math::Vec3;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use urban_massing::massing::{generate_massing, BuildingKind, BuildingParams, BuildingRng, Cube, Massing, NoInterior};

fn lot() -> Cube {
    Cube::from_bounds(0.0, 30.0, 0.0, 24.0, 0.0, 60.0)
}

fn massings(kind: BuildingKind, count: u32) -> Vec<Massing> {
    let params = BuildingParams::default();
    (0..count)
        .filter_map(|s| {
            let mut rng = BuildingRng::from_seeds(s, 1);
            generate_massing(kind, lot(), &params, &mut rng, &mut NoInterior).ok()
        })
        .collect()
}

/// Deterministic sample points spread over and around the lot.
fn sample_points(n: usize) -> Vec<Vec3> {
    (0..n)
        .map(|i| {
            let f = i as f32;
            Vec3::new((f * 1.7) % 34.0 - 2.0, (f * 2.3) % 28.0 - 2.0, (f * 0.9) % 64.0)
        })
        .collect()
}

fn bench_generate(c: &mut Criterion) {
    let params = BuildingParams::default();
    c.bench_function("generate_office_100", |b| {
        b.iter(|| {
            for s in 0..100 {
                let mut rng = BuildingRng::from_seeds(s, 1);
                black_box(generate_massing(BuildingKind::Office, lot(), &params, &mut rng, &mut NoInterior).ok());
            }
        })
    });
    c.bench_function("generate_house_100", |b| {
        b.iter(|| {
            for s in 0..100 {
                let mut rng = BuildingRng::from_seeds(s, 1);
                black_box(generate_massing(BuildingKind::House, lot(), &params, &mut rng, &mut NoInterior).ok());
            }
        })
    });
}

fn bench_resolve(c: &mut Criterion) {
    let ms = massings(BuildingKind::Office, 50);
    let pts = sample_points(1000);
    c.bench_function("resolve_50x1000", |b| {
        b.iter(|| {
            for m in &ms {
                for p in &pts {
                    black_box(m.resolve(*p, *p + Vec3::Z, 0.5, false));
                }
            }
        })
    });
}

fn bench_trace(c: &mut Criterion) {
    let ms = massings(BuildingKind::Office, 50);
    let pts = sample_points(1000);
    let eye = Vec3::new(-50.0, -40.0, 80.0);
    c.bench_function("trace_50x1000", |b| {
        b.iter(|| {
            for m in &ms {
                for p in &pts {
                    black_box(m.trace(eye, *p, false));
                }
            }
        })
    });
    c.bench_function("trace_occlusion_50x1000", |b| {
        b.iter(|| {
            for m in &ms {
                for p in &pts {
                    black_box(m.trace(eye, *p, true));
                }
            }
        })
    });
}

fn bench_contains(c: &mut Criterion) {
    let ms = massings(BuildingKind::Office, 50);
    let pts = sample_points(1000);
    c.bench_function("contains_50x1000", |b| {
        b.iter(|| {
            for m in &ms {
                for p in &pts {
                    black_box(m.contains(*p, 0.3));
                }
            }
        })
    });
}

fn bench_overlaps(c: &mut Criterion) {
    let ms = massings(BuildingKind::Office, 50);
    c.bench_function("overlaps_50x50", |b| {
        b.iter(|| {
            for a in &ms {
                for other in &ms {
                    black_box(a.overlaps(other, 0.1, 1.0));
                }
            }
        })
    });
}

criterion_group!(
    benches,
    bench_generate,
    bench_resolve,
    bench_trace,
    bench_contains,
    bench_overlaps
);
criterion_main!(benches);
