// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mesh representation and utilities

use super::{BoundingBox, Triangle3};
use nalgebra::{Matrix4, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Vertex with position and normal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Point3<f64>,
    pub normal: Vector3<f64>,
}

impl Vertex {
    pub fn new(position: Point3<f64>, normal: Vector3<f64>) -> Self {
        Self { position, normal }
    }

    pub fn at(position: Point3<f64>) -> Self {
        Self::new(position, Vector3::zeros())
    }

    pub fn transform(&mut self, matrix: &Matrix4<f64>) {
        self.position = matrix.transform_point(&self.position);
        // Normals use the inverse transpose
        let normal_matrix = matrix
            .try_inverse()
            .map(|m| m.transpose())
            .unwrap_or(*matrix);
        self.normal = normal_matrix
            .transform_vector(&self.normal)
            .try_normalize(0.0)
            .unwrap_or_else(Vector3::zeros);
    }
}

/// Triangle defined by three vertex indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triangle {
    pub indices: [usize; 3],
}

impl Triangle {
    pub fn new(indices: [usize; 3]) -> Self {
        Self { indices }
    }

    pub fn is_degenerate(&self) -> bool {
        let [a, b, c] = self.indices;
        a == b || b == c || c == a
    }
}

/// Indexed triangular mesh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            triangles: Vec::new(),
        }
    }

    pub fn with_capacity(vertex_count: usize, triangle_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            triangles: Vec::with_capacity(triangle_count),
        }
    }

    /// Build a mesh from positions and index triples; normals are recomputed
    pub fn from_parts(positions: &[Point3<f64>], triangles: &[[usize; 3]]) -> Self {
        let mut mesh = Self::with_capacity(positions.len(), triangles.len());
        for position in positions {
            mesh.add_vertex(Vertex::at(*position));
        }
        for indices in triangles {
            mesh.add_triangle(Triangle::new(*indices));
        }
        mesh.recompute_normals();
        mesh
    }

    /// Add a vertex and return its index
    pub fn add_vertex(&mut self, vertex: Vertex) -> usize {
        let index = self.vertices.len();
        self.vertices.push(vertex);
        index
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Get vertex count
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get triangle count
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn positions(&self) -> Vec<Point3<f64>> {
        self.vertices.iter().map(|v| v.position).collect()
    }

    /// Geometry of the triangle at `index`
    pub fn triangle_geometry(&self, index: usize) -> Triangle3 {
        let [a, b, c] = self.triangles[index].indices;
        Triangle3::new(
            self.vertices[a].position,
            self.vertices[b].position,
            self.vertices[c].position,
        )
    }

    /// Transform all vertices by a matrix
    pub fn transform(&mut self, matrix: &Matrix4<f64>) {
        for vertex in &mut self.vertices {
            vertex.transform(matrix);
        }
    }

    /// Compute bounding box
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_vertices(&self.vertices)
    }

    /// Merge with another mesh (simple concatenation without CSG)
    pub fn merge(&mut self, other: &Mesh) {
        let offset = self.vertices.len();
        self.vertices.extend_from_slice(&other.vertices);

        for triangle in &other.triangles {
            self.triangles.push(Triangle::new([
                triangle.indices[0] + offset,
                triangle.indices[1] + offset,
                triangle.indices[2] + offset,
            ]));
        }
    }

    /// Weld vertices that are within epsilon distance of each other
    ///
    /// Triangles that collapse are dropped. Returns the number of vertices
    /// removed.
    pub fn weld_vertices(&mut self, epsilon: f64) -> usize {
        if self.vertices.is_empty() {
            return 0;
        }

        let original_count = self.vertices.len();
        let mut new_vertices: Vec<Vertex> = Vec::new();
        let mut new_indices: Vec<usize> = vec![0; original_count];

        for (i, vertex) in self.vertices.iter().enumerate() {
            let found = new_vertices
                .iter()
                .position(|v| (v.position - vertex.position).norm() <= epsilon);

            new_indices[i] = match found {
                Some(j) => j,
                None => {
                    new_vertices.push(*vertex);
                    new_vertices.len() - 1
                }
            };
        }

        for triangle in &mut self.triangles {
            for index in &mut triangle.indices {
                *index = new_indices[*index];
            }
        }
        self.triangles.retain(|t| !t.is_degenerate());
        self.vertices = new_vertices;

        original_count - self.vertices.len()
    }

    /// Reverse the winding of every triangle
    pub fn flip(&mut self) {
        for triangle in &mut self.triangles {
            triangle.indices.swap(1, 2);
        }
        for vertex in &mut self.vertices {
            vertex.normal = -vertex.normal;
        }
    }

    /// Signed volume enclosed by the surface (sum of origin tetrahedra)
    pub fn signed_volume(&self) -> f64 {
        (0..self.triangles.len())
            .map(|i| {
                let t = self.triangle_geometry(i);
                t.a.coords.dot(&t.b.coords.cross(&t.c.coords)) / 6.0
            })
            .sum()
    }

    pub fn surface_area(&self) -> f64 {
        (0..self.triangles.len())
            .map(|i| self.triangle_geometry(i).area())
            .sum()
    }

    /// Recompute vertex normals from triangle geometry
    /// Face normals are accumulated area-weighted at shared vertices
    pub fn recompute_normals(&mut self) {
        if self.vertices.is_empty() {
            return;
        }

        let mut normal_sums: Vec<Vector3<f64>> = vec![Vector3::zeros(); self.vertices.len()];

        for triangle in &self.triangles {
            let v0 = self.vertices[triangle.indices[0]].position;
            let v1 = self.vertices[triangle.indices[1]].position;
            let v2 = self.vertices[triangle.indices[2]].position;

            // Cross product length is twice the area, so this is already weighted
            let face_normal = (v1 - v0).cross(&(v2 - v0));
            for &idx in &triangle.indices {
                normal_sums[idx] += face_normal;
            }
        }

        for (vertex, sum) in self.vertices.iter_mut().zip(normal_sums) {
            vertex.normal = sum
                .try_normalize(1e-12)
                .unwrap_or_else(|| Vector3::new(0.0, 0.0, 1.0));
        }
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}
