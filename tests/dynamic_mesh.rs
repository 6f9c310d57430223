// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Topology store invariants under editing

use approx::assert_relative_eq;
use dynmesh::{DynamicMesh, Mesh, PolyId, Primitive, VertexId};
use nalgebra::{Matrix4, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn unit_cube() -> DynamicMesh {
    DynamicMesh::from_mesh(&Primitive::cube(Vector3::new(1.0, 1.0, 1.0), false).to_mesh()).unwrap()
}

/// Every live poly has distinct live vertices and is listed at each of them
fn assert_consistent(mesh: &DynamicMesh) {
    for poly in mesh.polys() {
        let verts = mesh.poly_vertices(poly).unwrap();
        assert!(verts.len() >= 3, "{} has {} vertices", poly, verts.len());
        for (i, v) in verts.iter().enumerate() {
            assert!(mesh.is_valid_vertex(*v));
            assert!(!verts[i + 1..].contains(v), "{} repeats {}", poly, v);
            assert!(mesh.polys_at(*v).unwrap().contains(&poly));
        }
    }
    for vert in mesh.verts() {
        for poly in mesh.polys_at(vert).unwrap() {
            assert!(mesh.poly_vertices(poly).unwrap().contains(&vert));
        }
    }
}

#[test]
fn test_mesh_roundtrip_preserves_solid() {
    let sphere = Primitive::sphere(2.0, 16).to_mesh();
    let dynamic = DynamicMesh::from_mesh(&sphere).unwrap();
    assert_eq!(dynamic.euler_poincare(), 2);

    let back: Mesh = dynamic.to_mesh();
    assert_eq!(back.triangle_count(), sphere.triangle_count());
    assert_relative_eq!(back.signed_volume(), sphere.signed_volume(), epsilon = 1e-12);
}

#[test]
fn test_splitting_every_edge_keeps_a_closed_solid() {
    let mut mesh = unit_cube();
    for edge in mesh.edges() {
        let mid = mesh.segment(edge).unwrap().midpoint();
        let v = mesh.add_vertex(mid);
        let created = mesh.split(edge, v).unwrap();
        assert_eq!(created.len(), 2);
    }

    assert_eq!(mesh.vertex_count(), 8 + 18);
    assert_eq!(mesh.poly_count(), 12 + 2 * 18);
    assert_eq!(mesh.euler_poincare(), 2);
    assert!(mesh.represents_volume());
    assert_relative_eq!(mesh.to_mesh().signed_volume(), 1.0, epsilon = 1e-12);
    assert_consistent(&mesh);
}

#[test]
fn test_random_moves_keep_topology() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut mesh = DynamicMesh::from_mesh(&Primitive::sphere(1.0, 12).to_mesh()).unwrap();
    let edges = mesh.edges();

    for _ in 0..200 {
        let verts = mesh.verts();
        let v = verts[rng.gen_range(0..verts.len())];
        let p = mesh.point(v).unwrap();
        let jitter = Vector3::new(
            rng.gen_range(-0.01..0.01),
            rng.gen_range(-0.01..0.01),
            rng.gen_range(-0.01..0.01),
        );
        mesh.move_vertex(v, p + jitter).unwrap();
    }

    assert_eq!(mesh.edges(), edges);
    assert_eq!(mesh.euler_poincare(), 2);
    assert!(mesh.represents_volume());
}

#[test]
fn test_random_edge_collapses_stay_consistent() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut mesh = DynamicMesh::from_mesh(&Primitive::sphere(1.0, 16).to_mesh()).unwrap();

    for _ in 0..40 {
        let edges = mesh.edges();
        if edges.is_empty() {
            break;
        }
        let edge = edges[rng.gen_range(0..edges.len())];
        let before = mesh.vertex_count();

        let survivor = mesh.merge_verts(&[edge.a, edge.b]).unwrap();
        assert_eq!(survivor, edge.a.min(edge.b));
        assert_eq!(mesh.vertex_count(), before - 1);
        assert!(!mesh.is_valid_vertex(edge.a.max(edge.b)));
        assert_consistent(&mesh);
    }
}

#[test]
fn test_removed_slots_are_recycled() {
    let mut mesh = unit_cube();
    let poly = PolyId::new(3);
    mesh.remove_poly(poly).unwrap();
    assert!(!mesh.is_valid_poly(poly));

    let verts: Vec<VertexId> = mesh.verts().into_iter().take(3).collect();
    let reused = mesh.add_poly(&verts, 9).unwrap();
    assert_eq!(reused, poly);
    assert_eq!(mesh.value(reused).unwrap(), 9);
    assert_eq!(mesh.poly_id_count(), 12);
}

#[test]
fn test_separate_and_extract_surfaces() {
    let a = unit_cube();
    let mut shifted = Primitive::cube(Vector3::new(1.0, 1.0, 1.0), false).to_mesh();
    shifted.transform(&Matrix4::new_translation(&Vector3::new(3.0, 0.0, 0.0)));
    let b = DynamicMesh::from_mesh(&shifted).unwrap();

    let both = DynamicMesh::merge_meshes(&[a, b]).unwrap();
    let surfaces = both.separate_surfaces();
    assert_eq!(surfaces.len(), 2);

    let second = both.extract(&surfaces[1]).unwrap();
    assert_eq!(second.poly_count(), 12);
    assert_eq!(second.vertex_count(), 8);
    assert!(second.represents_volume());
    assert_relative_eq!(second.bounding_box().min.x, 3.0);
}
