// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Closed, welded primitive meshes

use super::{Mesh, Triangle, Vertex};
use nalgebra::{Point3, Vector3};
use std::f64::consts::PI;

/// Geometric primitives
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    Cuboid { min: Point3<f64>, max: Point3<f64> },
    Sphere { center: Point3<f64>, r: f64, segments: u32 },
}

impl Primitive {
    pub fn cube(size: Vector3<f64>, center: bool) -> Self {
        let min = if center {
            Point3::from(-size / 2.0)
        } else {
            Point3::origin()
        };
        Self::Cuboid {
            min,
            max: min + size,
        }
    }

    pub fn cuboid(min: Point3<f64>, max: Point3<f64>) -> Self {
        Self::Cuboid { min, max }
    }

    pub fn sphere(r: f64, segments: u32) -> Self {
        let segments = if segments > 0 { segments.max(3) } else { 32 };
        Self::Sphere {
            center: Point3::origin(),
            r,
            segments,
        }
    }

    pub fn sphere_at(center: Point3<f64>, r: f64, segments: u32) -> Self {
        match Self::sphere(r, segments) {
            Self::Sphere { r, segments, .. } => Self::Sphere { center, r, segments },
            other => other,
        }
    }

    pub fn to_mesh(&self) -> Mesh {
        let mut mesh = match self {
            Self::Cuboid { min, max } => generate_cuboid_mesh(*min, *max),
            Self::Sphere {
                center,
                r,
                segments,
            } => generate_sphere_mesh(*center, *r, *segments),
        };
        mesh.recompute_normals();
        mesh
    }
}

fn generate_cuboid_mesh(min: Point3<f64>, max: Point3<f64>) -> Mesh {
    let mut mesh = Mesh::with_capacity(8, 12);

    let corners = [
        Point3::new(min.x, min.y, min.z),
        Point3::new(max.x, min.y, min.z),
        Point3::new(max.x, max.y, min.z),
        Point3::new(min.x, max.y, min.z),
        Point3::new(min.x, min.y, max.z),
        Point3::new(max.x, min.y, max.z),
        Point3::new(max.x, max.y, max.z),
        Point3::new(min.x, max.y, max.z),
    ];
    for corner in corners {
        mesh.add_vertex(Vertex::at(corner));
    }

    // Two triangles per side, wound counter-clockwise seen from outside
    let faces = [
        [4, 5, 6],
        [4, 6, 7], // z+
        [1, 0, 3],
        [1, 3, 2], // z-
        [5, 1, 2],
        [5, 2, 6], // x+
        [0, 4, 7],
        [0, 7, 3], // x-
        [7, 6, 2],
        [7, 2, 3], // y+
        [0, 1, 5],
        [0, 5, 4], // y-
    ];
    for indices in faces {
        mesh.add_triangle(Triangle::new(indices));
    }

    mesh
}

/// UV sphere with single pole vertices and no seam duplicates
fn generate_sphere_mesh(center: Point3<f64>, radius: f64, segments: u32) -> Mesh {
    let slices = segments as usize;
    let rings = (segments as usize / 2).max(2);
    let mut mesh = Mesh::with_capacity(2 + (rings - 1) * slices, 2 * slices * (rings - 1));

    let top = mesh.add_vertex(Vertex::at(center + Vector3::new(0.0, 0.0, radius)));

    let mut ring_start = Vec::with_capacity(rings - 1);
    for i in 1..rings {
        let phi = PI * i as f64 / rings as f64;
        ring_start.push(mesh.vertex_count());
        for j in 0..slices {
            let theta = 2.0 * PI * j as f64 / slices as f64;
            let offset = Vector3::new(
                radius * phi.sin() * theta.cos(),
                radius * phi.sin() * theta.sin(),
                radius * phi.cos(),
            );
            mesh.add_vertex(Vertex::at(center + offset));
        }
    }

    let bottom = mesh.add_vertex(Vertex::at(center - Vector3::new(0.0, 0.0, radius)));
    let at = |ring: usize, j: usize| ring_start[ring] + j % slices;

    for j in 0..slices {
        mesh.add_triangle(Triangle::new([top, at(0, j), at(0, j + 1)]));
    }
    for ring in 0..rings - 2 {
        for j in 0..slices {
            let (a, b) = (at(ring, j), at(ring, j + 1));
            let (c, d) = (at(ring + 1, j), at(ring + 1, j + 1));
            mesh.add_triangle(Triangle::new([a, c, d]));
            mesh.add_triangle(Triangle::new([a, d, b]));
        }
    }
    let last = rings - 2;
    for j in 0..slices {
        mesh.add_triangle(Triangle::new([bottom, at(last, j + 1), at(last, j)]));
    }

    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cube_shares_corners() {
        let mesh = Primitive::cube(Vector3::new(1.0, 1.0, 1.0), false).to_mesh();
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.triangle_count(), 12);
        assert_relative_eq!(mesh.signed_volume(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_centered_cube() {
        let mesh = Primitive::cube(Vector3::new(2.0, 2.0, 2.0), true).to_mesh();
        let bbox = mesh.bounding_box();
        assert_eq!(bbox.min, Point3::new(-1.0, -1.0, -1.0));
        assert_eq!(bbox.max, Point3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_sphere_is_outward_and_closed() {
        let mesh = Primitive::sphere(2.0, 16).to_mesh();
        assert_eq!(mesh.vertex_count(), 2 + 7 * 16);
        let volume = mesh.signed_volume();
        let expected = 4.0 / 3.0 * PI * 8.0;
        assert!(volume > 0.0);
        assert!((volume - expected).abs() / expected < 0.15);
    }
}
