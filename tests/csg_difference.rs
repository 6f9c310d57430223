// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! End-to-end tests of the boolean difference pipeline

use approx::assert_relative_eq;
use dynmesh::csg::{
    classify_faces, csg_difference_report, find_intersections, snap_loops, triangulate_faces,
    winding_number, FaceType,
};
use dynmesh::{csg_difference, ConflictPolicy, CsgConfig, DynamicMesh, Primitive};
use nalgebra::Point3;

fn cuboid(min: [f64; 3], max: [f64; 3]) -> DynamicMesh {
    let mesh = Primitive::cuboid(Point3::from(min), Point3::from(max)).to_mesh();
    DynamicMesh::from_mesh(&mesh).unwrap()
}

fn area(mesh: &DynamicMesh) -> f64 {
    mesh.polys()
        .into_iter()
        .map(|p| mesh.triangle(p).unwrap().area())
        .sum()
}

fn volume(mesh: &DynamicMesh) -> f64 {
    mesh.to_mesh().signed_volume()
}

#[test]
fn test_disjoint_operands() {
    let result = csg_difference(cuboid([0.0; 3], [1.0; 3]), cuboid([5.0; 3], [6.0; 3])).unwrap();
    assert_eq!(result.poly_count(), 12);
    assert!(result.represents_volume());
    assert_relative_eq!(volume(&result), 1.0, epsilon = 1e-12);
}

#[test]
fn test_identical_operands_cancel() {
    let result = csg_difference(cuboid([0.0; 3], [1.0; 3]), cuboid([0.0; 3], [1.0; 3])).unwrap();
    assert_eq!(result.poly_count(), 0);
}

#[test]
fn test_corner_overlap() {
    let config = CsgConfig::default();
    let (result, report) =
        csg_difference_report(cuboid([0.0; 3], [1.0; 3]), cuboid([0.5; 3], [1.5; 3]), &config)
            .unwrap();

    assert_eq!(report.conflicts, 0);
    assert_eq!(report.result_polys, result.poly_count());
    assert_eq!(result.euler_poincare(), 2);
    assert!(result.represents_volume());
    assert_relative_eq!(volume(&result), 0.875, epsilon = 1e-6);

    // Seven of the eight octants remain
    let bbox = result.bounding_box();
    assert_relative_eq!(bbox.min.x, 0.0);
    assert_relative_eq!(bbox.max.z, 1.0, epsilon = 1e-9);
}

#[test]
fn test_blind_pocket() {
    // The subtrahend enters through the +x face and stops halfway
    let a = cuboid([0.0; 3], [2.0; 3]);
    let b = cuboid([1.0, 0.4, 0.6], [3.0, 1.3, 1.5]);
    let result = csg_difference(a, b).unwrap();

    assert!(result.is_triangular());
    assert_eq!(result.euler_poincare(), 2);
    assert!(result.represents_volume());
    assert_relative_eq!(volume(&result), 8.0 - 0.81, epsilon = 1e-6);

    let inside_pocket = Point3::new(1.8, 0.85, 1.05);
    let solid = Point3::new(0.5, 0.5, 0.5);
    assert!(winding_number(&result, &inside_pocket).abs() < 0.5);
    assert!(winding_number(&result, &solid) > 0.5);
}

#[test]
fn test_sequential_and_parallel_agree() {
    let run = |parallel: bool| {
        let config = CsgConfig::default().with_parallel(parallel);
        csg_difference_report(cuboid([0.0; 3], [1.0; 3]), cuboid([0.5; 3], [1.5; 3]), &config)
            .unwrap()
    };
    let (seq, seq_report) = run(false);
    let (par, par_report) = run(true);

    assert_eq!(seq_report, par_report);
    assert_eq!(seq.points(), par.points());
    assert_eq!(seq.polys(), par.polys());
}

#[test]
fn test_cutting_preserves_area_and_snaps_exactly() {
    let config = CsgConfig::default();
    let mut a = cuboid([0.0; 3], [1.0; 3]);
    // Bulges through the +x face only, with no vertex on the cutting plane
    let sphere = Primitive::sphere_at(Point3::new(1.05, 0.5, 0.5), 0.4, 12).to_mesh();
    let mut b = DynamicMesh::from_mesh(&sphere).unwrap();
    let (area_a, area_b) = (area(&a), area(&b));

    let (loop_a, loop_b) = find_intersections(&mut a, &mut b, &config).unwrap();
    assert!(!loop_a.is_empty());
    snap_loops(&mut a, &mut b, &loop_a, &loop_b).unwrap();

    for (&(_, ea), &(_, eb)) in loop_a.iter().zip(&loop_b) {
        assert_eq!(a.point(ea.a).unwrap(), b.point(eb.a).unwrap());
        assert_eq!(a.point(ea.b).unwrap(), b.point(eb.b).unwrap());
    }

    triangulate_faces(&mut a, &loop_a, config.tolerance).unwrap();
    triangulate_faces(&mut b, &loop_b, config.tolerance).unwrap();
    assert!(a.is_triangular() && b.is_triangular());
    assert_relative_eq!(area(&a), area_a, epsilon = 1e-6);
    assert_relative_eq!(area(&b), area_b, epsilon = 1e-4);
    for (_, edge) in &loop_a {
        assert!(a.is_valid_edge(*edge) || a.is_valid_edge(edge.inverse()));
    }
}

#[test]
fn test_classification_is_idempotent() {
    let config = CsgConfig::default().with_conflict_policy(ConflictPolicy::FirstWins);
    let mut a = cuboid([0.0; 3], [1.0; 3]);
    let mut b = cuboid([0.5; 3], [1.5; 3]);
    let (loop_a, loop_b) = find_intersections(&mut a, &mut b, &config).unwrap();
    snap_loops(&mut a, &mut b, &loop_a, &loop_b).unwrap();
    triangulate_faces(&mut a, &loop_a, config.tolerance).unwrap();
    triangulate_faces(&mut b, &loop_b, config.tolerance).unwrap();

    let first = classify_faces(&b, &a, &loop_b, &loop_a, &config).unwrap();
    let second = classify_faces(&b, &a, &loop_b, &loop_a, &config).unwrap();
    assert_eq!(first, second);

    let outside = first.faces_of(&a, FaceType::Outside);
    let inside = first.faces_of(&a, FaceType::Inside);
    assert!(!outside.is_empty() && !inside.is_empty());
    assert_eq!(outside.len() + inside.len(), a.poly_count());

    // Three quarter faces of A lie inside B
    let inside_area: f64 = inside.iter().map(|&p| a.triangle(p).unwrap().area()).sum();
    assert_relative_eq!(inside_area, 0.75, epsilon = 1e-6);
}
