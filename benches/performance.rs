// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Performance benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dynmesh::csg::{csg_difference_with, find_intersections};
use dynmesh::{CsgConfig, DynamicMesh, Primitive};
use nalgebra::Point3;

fn sphere(center: Point3<f64>, segments: u32) -> DynamicMesh {
    let mesh = Primitive::sphere_at(center, 1.0, segments).to_mesh();
    DynamicMesh::from_mesh(&mesh).unwrap()
}

fn bench_topology(c: &mut Criterion) {
    let mut group = c.benchmark_group("topology");

    for segments in [16u32, 32, 64] {
        let mesh = Primitive::sphere(1.0, segments).to_mesh();
        group.bench_with_input(BenchmarkId::new("from_mesh", segments), &mesh, |b, mesh| {
            b.iter(|| DynamicMesh::from_mesh(black_box(mesh)).unwrap());
        });

        let dynamic = DynamicMesh::from_mesh(&mesh).unwrap();
        group.bench_with_input(BenchmarkId::new("edges", segments), &dynamic, |b, mesh| {
            b.iter(|| black_box(mesh).edges());
        });
        group.bench_with_input(
            BenchmarkId::new("represents_volume", segments),
            &dynamic,
            |b, mesh| {
                b.iter(|| black_box(mesh).represents_volume());
            },
        );
    }

    group.finish();
}

fn bench_intersections(c: &mut Criterion) {
    let mut group = c.benchmark_group("intersections");

    for parallel in [false, true] {
        let config = CsgConfig::default().with_parallel(parallel);
        let a = sphere(Point3::origin(), 32);
        let b = sphere(Point3::new(0.6, 0.1, 0.05), 32);
        group.bench_with_input(
            BenchmarkId::new("spheres_32", if parallel { "parallel" } else { "sequential" }),
            &config,
            |bench, config| {
                bench.iter(|| {
                    let (mut a, mut b) = (a.clone(), b.clone());
                    find_intersections(&mut a, &mut b, black_box(config)).unwrap()
                });
            },
        );
    }

    group.finish();
}

fn bench_difference(c: &mut Criterion) {
    let mut group = c.benchmark_group("difference");
    group.sample_size(20);

    let config = CsgConfig::default();
    let a = DynamicMesh::from_mesh(
        &Primitive::cuboid(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0)).to_mesh(),
    )
    .unwrap();
    let b = DynamicMesh::from_mesh(
        &Primitive::cuboid(Point3::new(0.5, 0.5, 0.5), Point3::new(1.5, 1.5, 1.5)).to_mesh(),
    )
    .unwrap();

    group.bench_function("cube_corner", |bench| {
        bench.iter(|| csg_difference_with(a.clone(), b.clone(), black_box(&config)).unwrap());
    });

    group.finish();
}

criterion_group!(benches, bench_topology, bench_intersections, bench_difference);
criterion_main!(benches);
