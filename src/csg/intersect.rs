// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Intersection curve extraction between two triangle meshes

use super::EdgeLoop;
use crate::config::CsgConfig;
use crate::dynamic_mesh::{DynamicMesh, EdgeId, PolyId, VertexId};
use crate::error::{CsgResult, MeshResult};
use crate::geometry::{clip_segment_to_triangle, BoundingBox, Projection, Segment3, Triangle3};
use nalgebra::{Point2, Point3};
use rayon::prelude::*;
use tracing::debug;

/// Slack used when clipping to a face, so segments on its edges survive
const CLIP_SLACK: f64 = 1e-9;

/// Where the boundary of `tri2` crosses the plane of `tri1`, clipped to `tri1`
///
/// Vertices of `tri2` closer than `tolerance` to the plane count as lying on
/// it. Coplanar pairs yield nothing.
pub fn compatible_edges(tri1: &Triangle3, tri2: &Triangle3, tolerance: f64) -> Vec<Segment3> {
    let Some(proj) = Projection::from_triangle(tri1) else {
        return Vec::new();
    };
    let local = tri2.points().map(|p| proj.project(&p));

    let mut touching = [false; 3];
    let mut crossing: [Option<f64>; 3] = [None; 3];
    for n in 0..3 {
        let (v1, v2) = (local[n], local[(n + 1) % 3]);
        if v1.y.abs() < tolerance {
            touching[n] = true;
            continue;
        }
        if (v1.y <= 0.0) == (v2.y <= 0.0) {
            continue;
        }
        crossing[n] = Some(-v1.y / (v2.y - v1.y));
    }
    if touching.iter().all(|&t| t) {
        return Vec::new();
    }

    let mut points: Vec<Point3<f64>> = Vec::with_capacity(3);
    for n in 0..3 {
        let next = (n + 1) % 3;
        if touching[n] {
            points.push(local[n]);
        }
        if let Some(t) = crossing[n] {
            if !touching[next] {
                points.push(local[n] + (local[next] - local[n]) * t);
            }
        }
    }

    let candidates: Vec<(Point3<f64>, Point3<f64>)> = match points.len() {
        2 => vec![(points[0], points[1])],
        3 => (0..3).map(|n| (points[n], points[(n + 1) % 3])).collect(),
        _ => Vec::new(),
    };

    let face = tri1.points().map(|p| proj.to_2d(&p));
    let mut out = Vec::new();
    for (start, end) in candidates {
        let (start, end) = (Point2::new(start.x, start.z), Point2::new(end.x, end.z));
        if (end - start).norm() < tolerance {
            continue;
        }
        if let Some((c0, c1)) = clip_segment_to_triangle(&start, &end, &face, CLIP_SLACK) {
            if (c1 - c0).norm() >= tolerance {
                out.push(Segment3::new(proj.from_2d(&c0), proj.from_2d(&c1)));
            }
        }
    }
    out
}

/// Intersection segments of one pair of faces, duplicates removed
fn face_pair_segments(tri1: &Triangle3, tri2: &Triangle3, tolerance: f64) -> Vec<Segment3> {
    let mut out: Vec<Segment3> = Vec::new();
    let found = compatible_edges(tri1, tri2, tolerance)
        .into_iter()
        .chain(compatible_edges(tri2, tri1, tolerance));

    for seg in found {
        let duplicate = out.iter().any(|other| {
            let same = (seg.from - other.from).norm() < tolerance
                && (seg.to - other.to).norm() < tolerance;
            let swapped = (seg.from - other.to).norm() < tolerance
                && (seg.to - other.from).norm() < tolerance;
            same || swapped
        });
        if !duplicate {
            out.push(seg);
        }
    }
    out
}

/// Existing vertex within `tolerance` of `point`, or a new one
fn find_or_add_vertex(mesh: &mut DynamicMesh, point: Point3<f64>, tolerance: f64) -> VertexId {
    match mesh.closest_vertex_to(&point) {
        Some(vert) if (mesh.position(vert) - point).norm() <= tolerance => vert,
        _ => mesh.add_vertex(point),
    }
}

/// Edge between the endpoints of `segment`; `None` if both snap to one vertex
fn add_edge(mesh: &mut DynamicMesh, segment: &Segment3, tolerance: f64) -> Option<EdgeId> {
    let v1 = find_or_add_vertex(mesh, segment.from, tolerance);
    let v2 = find_or_add_vertex(mesh, segment.to, tolerance);
    (v1 != v2).then(|| EdgeId::new(v1, v2))
}

fn face_triangles(mesh: &DynamicMesh) -> MeshResult<Vec<(PolyId, Triangle3, BoundingBox)>> {
    mesh.polys()
        .into_iter()
        .map(|poly| {
            let tri = mesh.triangle(poly)?;
            Ok((poly, tri, tri.bounding_box()))
        })
        .collect()
}

/// Intersection curve of `a` and `b` as two parallel edge loops
///
/// Segment endpoints are inserted into both meshes (or matched to existing
/// vertices within tolerance). The faces themselves are left untouched.
pub fn find_intersections(
    a: &mut DynamicMesh,
    b: &mut DynamicMesh,
    config: &CsgConfig,
) -> CsgResult<(EdgeLoop, EdgeLoop)> {
    let tolerance = config.tolerance;
    let faces_a = face_triangles(a)?;
    let faces_b = face_triangles(b)?;

    let pair_segments = |(face_a, tri_a, box_a): &(PolyId, Triangle3, BoundingBox)| {
        faces_b
            .iter()
            .filter(|(_, _, box_b)| box_a.intersects(box_b, tolerance))
            .filter_map(|(face_b, tri_b, _)| {
                let segments = face_pair_segments(tri_a, tri_b, tolerance);
                (!segments.is_empty()).then_some((*face_a, *face_b, segments))
            })
            .collect::<Vec<_>>()
    };

    let found: Vec<Vec<(PolyId, PolyId, Vec<Segment3>)>> = if config.parallel {
        faces_a.par_iter().map(pair_segments).collect()
    } else {
        faces_a.iter().map(pair_segments).collect()
    };

    let mut loop_a = EdgeLoop::new();
    let mut loop_b = EdgeLoop::new();
    for (face_a, face_b, segments) in found.into_iter().flatten() {
        for segment in segments {
            let (Some(edge_a), Some(edge_b)) =
                (add_edge(a, &segment, tolerance), add_edge(b, &segment, tolerance))
            else {
                debug!(%face_a, %face_b, "skipping segment collapsed onto one vertex");
                continue;
            };
            loop_a.push((face_a, edge_a));
            loop_b.push((face_b, edge_b));
        }
    }

    debug!(
        faces_a = faces_a.len(),
        faces_b = faces_b.len(),
        edges = loop_a.len(),
        "extracted intersection edges"
    );
    Ok((loop_a, loop_b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ground() -> Triangle3 {
        Triangle3::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(0.0, 4.0, 0.0),
        )
    }

    #[test]
    fn test_crossing_triangle() {
        // Vertical triangle piercing the ground along x = 1
        let wall = Triangle3::new(
            Point3::new(1.0, -1.0, -1.0),
            Point3::new(1.0, 2.0, -1.0),
            Point3::new(1.0, 0.5, 2.0),
        );
        let segments = compatible_edges(&ground(), &wall, 1e-6);
        assert_eq!(segments.len(), 1);

        let seg = segments[0];
        for p in [seg.from, seg.to] {
            assert_relative_eq!(p.x, 1.0, epsilon = 1e-9);
            assert_relative_eq!(p.z, 0.0, epsilon = 1e-9);
        }
        // Clipped to the ground at y = 0, reaching the wall's own edge on the other side
        let (lo, hi) = if seg.from.y < seg.to.y {
            (seg.from.y, seg.to.y)
        } else {
            (seg.to.y, seg.from.y)
        };
        assert_relative_eq!(lo, 0.0, epsilon = 1e-9);
        assert!(hi > 1.0 && hi < 2.0);
    }

    #[test]
    fn test_separated_and_coplanar_triangles() {
        let above = Triangle3::new(
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(0.0, 1.0, 2.0),
        );
        assert!(compatible_edges(&ground(), &above, 1e-6).is_empty());

        let coplanar = Triangle3::new(
            Point3::new(0.5, 0.5, 0.0),
            Point3::new(1.5, 0.5, 0.0),
            Point3::new(0.5, 1.5, 0.0),
        );
        assert!(compatible_edges(&ground(), &coplanar, 1e-6).is_empty());
    }

    #[test]
    fn test_touching_edge_is_reported() {
        // Shares the ground's edge along the x axis and rises above it
        let flap = Triangle3::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 3.0),
            Point3::new(4.0, 0.0, 0.0),
        );
        let segments = face_pair_segments(&ground(), &flap, 1e-6);
        assert_eq!(segments.len(), 1);
        assert_relative_eq!(segments[0].length(), 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_add_edge_reuses_close_vertices() {
        let mut mesh = DynamicMesh::new();
        let v = mesh.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let seg = Segment3::new(Point3::new(1e-7, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0));
        let edge = add_edge(&mut mesh, &seg, 1e-5).unwrap();
        assert_eq!(edge.a, v);
        assert_eq!(mesh.vertex_count(), 2);

        let tiny = Segment3::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1e-6, 0.0, 0.0));
        assert!(add_edge(&mut mesh, &tiny, 1e-5).is_none());
    }
}
