// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry analytics and statistics

use super::Mesh;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Geometry statistics and analytics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeometryStats {
    /// Enclosed volume (absolute value of the signed volume)
    pub volume: f64,
    /// Total surface area in square units
    pub surface_area: f64,
    /// Bounding box [min_x, min_y, min_z, max_x, max_y, max_z]
    pub bbox: [f64; 6],
    /// Average vertex position [x, y, z]
    pub centroid: [f64; 3],
    pub vertex_count: usize,
    pub triangle_count: usize,
    /// V - E + F over referenced vertices
    pub euler_characteristic: i64,
    /// Every undirected edge is shared by exactly two triangles
    pub is_watertight: bool,
}

impl GeometryStats {
    /// Create empty stats
    pub fn empty() -> Self {
        Self {
            volume: 0.0,
            surface_area: 0.0,
            bbox: [0.0; 6],
            centroid: [0.0; 3],
            vertex_count: 0,
            triangle_count: 0,
            euler_characteristic: 0,
            is_watertight: false,
        }
    }
}

/// Analyze mesh geometry and compute statistics
pub fn analyze(mesh: &Mesh) -> GeometryStats {
    let vertex_count = mesh.vertices.len();
    let triangle_count = mesh.triangles.len();

    if vertex_count == 0 || triangle_count == 0 {
        return GeometryStats::empty();
    }

    let bbox = mesh.bounding_box();
    let edge_counts = count_edges(mesh);

    GeometryStats {
        volume: mesh.signed_volume().abs(),
        surface_area: mesh.surface_area(),
        bbox: [
            bbox.min.x, bbox.min.y, bbox.min.z, bbox.max.x, bbox.max.y, bbox.max.z,
        ],
        centroid: calculate_centroid(mesh),
        vertex_count,
        triangle_count,
        euler_characteristic: euler_characteristic(mesh, edge_counts.len()),
        is_watertight: edge_counts.values().all(|&count| count == 2),
    }
}

fn count_edges(mesh: &Mesh) -> AHashMap<(usize, usize), usize> {
    let mut edge_count: AHashMap<(usize, usize), usize> = AHashMap::new();
    for triangle in &mesh.triangles {
        for i in 0..3 {
            let a = triangle.indices[i];
            let b = triangle.indices[(i + 1) % 3];
            *edge_count.entry((a.min(b), a.max(b))).or_insert(0) += 1;
        }
    }
    edge_count
}

fn euler_characteristic(mesh: &Mesh, edge_count: usize) -> i64 {
    let mut referenced = vec![false; mesh.vertices.len()];
    for triangle in &mesh.triangles {
        for &index in &triangle.indices {
            referenced[index] = true;
        }
    }
    let vertices = referenced.iter().filter(|&&r| r).count();
    vertices as i64 - edge_count as i64 + mesh.triangles.len() as i64
}

fn calculate_centroid(mesh: &Mesh) -> [f64; 3] {
    let sum = mesh
        .vertices
        .iter()
        .fold(nalgebra::Vector3::zeros(), |acc, v| acc + v.position.coords);
    let c = sum / mesh.vertices.len() as f64;
    [c.x, c.y, c.z]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    #[test]
    fn test_cube_stats() {
        let mesh = Primitive::cube(Vector3::new(10.0, 10.0, 10.0), true).to_mesh();
        let stats = analyze(&mesh);

        assert_relative_eq!(stats.volume, 1000.0, epsilon = 1e-9);
        assert_relative_eq!(stats.surface_area, 600.0, epsilon = 1e-9);
        assert_eq!(stats.vertex_count, 8);
        assert_eq!(stats.triangle_count, 12);
        assert_eq!(stats.euler_characteristic, 2);
        assert!(stats.is_watertight);
        assert_relative_eq!(stats.centroid[0], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_open_mesh_is_not_watertight() {
        let mut mesh = Primitive::cube(Vector3::new(1.0, 1.0, 1.0), false).to_mesh();
        mesh.triangles.pop();
        let stats = analyze(&mesh);
        assert!(!stats.is_watertight);
        assert_eq!(stats.euler_characteristic, 1);
    }

    #[test]
    fn test_empty_mesh() {
        let stats = analyze(&Mesh::new());
        assert_eq!(stats.triangle_count, 0);
        assert!(!stats.is_watertight);
    }
}
