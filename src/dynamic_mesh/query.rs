// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometric queries over the store: shapes, distances, proximity

use super::{DynamicMesh, EdgeId, PolyId, Simplex, VertexId};
use crate::error::{MeshError, MeshResult};
use crate::geometry::{BoundingBox, Projection, Shape, Triangle3};
use nalgebra::Point3;

impl DynamicMesh {
    /// Geometry of a simplex
    pub fn shape(&self, simplex: &Simplex) -> MeshResult<Shape> {
        Ok(match simplex {
            Simplex::Vertex(v) => Shape::Point(self.point(*v)?),
            Simplex::Edge(e) => Shape::Segment(self.segment(*e)?),
            Simplex::Face([a, b, c]) => {
                Shape::Triangle(Triangle3::new(self.point(*a)?, self.point(*b)?, self.point(*c)?))
            }
        })
    }

    pub fn distance(&self, a: &Simplex, b: &Simplex) -> MeshResult<f64> {
        Ok(self.shape(a)?.distance_to_shape(&self.shape(b)?))
    }

    /// Bounding box of the whole mesh
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.points())
    }

    pub fn poly_bounding_box(&self, poly: PolyId) -> MeshResult<BoundingBox> {
        self.check_poly(poly)?;
        let points: Vec<Point3<f64>> = self
            .poly_verts(poly)
            .iter()
            .map(|&v| self.position(v))
            .collect();
        Ok(BoundingBox::from_points(&points))
    }

    pub fn edge_bounding_box(&self, edge: EdgeId) -> MeshResult<BoundingBox> {
        Ok(self.segment(edge)?.bounding_box())
    }

    /// Frame around `edge` with `x` pointing toward the third vertex of `poly`
    pub fn edge_projection(&self, edge: EdgeId, poly: PolyId) -> MeshResult<Projection> {
        let third = self.other_vertex(poly, edge)?;
        Projection::from_edge(
            &self.position(edge.a),
            &self.position(edge.b),
            &self.position(third),
        )
        .ok_or_else(|| {
            MeshError::InvalidArgument(format!("poly {} is degenerate along {}", poly, edge))
        })
    }

    /// Whether two simplices share at least one vertex
    pub fn coincident(&self, a: &Simplex, b: &Simplex) -> bool {
        a.coincident(b)
    }

    /// Polygons sharing at least one vertex with `poly`, excluding itself
    pub fn coincident_polys(&self, poly: PolyId) -> MeshResult<Vec<PolyId>> {
        self.check_poly(poly)?;
        let mut out: Vec<PolyId> = self
            .poly_verts(poly)
            .iter()
            .flat_map(|v| self.adjacency[v.index()].iter().copied())
            .filter(|&p| p != poly)
            .collect();
        out.sort_unstable();
        out.dedup();
        Ok(out)
    }

    /// Vertex closest to `simplex`, skipping vertices of `exclude`
    ///
    /// Linear scan; `None` when no candidate remains.
    pub fn closest_vertex(
        &self,
        simplex: &Simplex,
        exclude: Option<&Simplex>,
    ) -> MeshResult<Option<VertexId>> {
        let shape = self.shape(simplex)?;
        let mut best: Option<(f64, VertexId)> = None;
        for vert in self.verts() {
            if exclude.is_some_and(|ex| ex.contains(vert)) {
                continue;
            }
            let dist = shape.distance_to_point(&self.position(vert));
            if best.map_or(true, |(d, _)| dist < d) {
                best = Some((dist, vert));
            }
        }
        Ok(best.map(|(_, v)| v))
    }

    /// Vertex closest to an arbitrary point
    pub fn closest_vertex_to(&self, point: &Point3<f64>) -> Option<VertexId> {
        self.verts().into_iter().min_by(|&a, &b| {
            let da = (self.position(a) - point).norm_squared();
            let db = (self.position(b) - point).norm_squared();
            da.total_cmp(&db)
        })
    }

    /// Edge closest to `simplex`, skipping edges that touch `exclude`
    pub fn closest_edge(
        &self,
        simplex: &Simplex,
        exclude: Option<&Simplex>,
    ) -> MeshResult<Option<EdgeId>> {
        let shape = self.shape(simplex)?;
        let mut best: Option<(f64, EdgeId)> = None;
        for edge in self.edges() {
            if exclude.is_some_and(|ex| ex.coincident(&Simplex::Edge(edge))) {
                continue;
            }
            let dist = shape.distance_to_segment(&self.segment(edge)?);
            if best.map_or(true, |(d, _)| dist < d) {
                best = Some((dist, edge));
            }
        }
        Ok(best.map(|(_, e)| e))
    }

    /// Vertices within `tolerance` of `simplex` that are not part of it
    pub fn nearby_verts(&self, simplex: &Simplex, tolerance: f64) -> MeshResult<Vec<VertexId>> {
        let shape = self.shape(simplex)?;
        Ok(self
            .verts()
            .into_iter()
            .filter(|&v| !simplex.contains(v))
            .filter(|&v| shape.distance_to_point(&self.position(v)) < tolerance)
            .collect())
    }

    /// Edges within `tolerance` of `simplex` sharing no vertex with it
    pub fn nearby_edges(&self, simplex: &Simplex, tolerance: f64) -> MeshResult<Vec<EdgeId>> {
        let shape = self.shape(simplex)?;
        let mut out = Vec::new();
        for edge in self.edges() {
            if simplex.coincident(&Simplex::Edge(edge)) {
                continue;
            }
            if shape.distance_to_segment(&self.segment(edge)?) < tolerance {
                out.push(edge);
            }
        }
        Ok(out)
    }

    /// Vertices and edges close to `simplex`, each paired with it
    ///
    /// Pairs are ordered with the larger simplex first.
    pub fn nearby_pairs(
        &self,
        simplex: &Simplex,
        tolerance: f64,
    ) -> MeshResult<Vec<(Simplex, Simplex)>> {
        let verts = self.nearby_verts(simplex, tolerance)?;
        let edges = self.nearby_edges(simplex, tolerance)?;
        Ok(verts
            .into_iter()
            .map(Simplex::from)
            .chain(edges.into_iter().map(Simplex::from))
            .map(|other| super::make_simplex_pair(*simplex, other))
            .collect())
    }

    /// Closest point on the surface to `point`
    pub fn closest_point(&self, point: &Point3<f64>) -> Option<Point3<f64>> {
        let mut best: Option<(f64, Point3<f64>)> = None;
        for poly in self.polys() {
            let verts = self.poly_verts(poly);
            for i in 1..verts.len() - 1 {
                let tri = Triangle3::new(
                    self.position(verts[0]),
                    self.position(verts[i]),
                    self.position(verts[i + 1]),
                );
                let candidate = tri.closest_point(point);
                let dist = (candidate - point).norm_squared();
                if best.map_or(true, |(d, _)| dist < d) {
                    best = Some((dist, candidate));
                }
            }
        }
        best.map(|(_, p)| p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn strip() -> DynamicMesh {
        // Two triangles sharing the edge 1-2 plus a loose vertex above them
        let mut mesh = DynamicMesh::new();
        let v0 = mesh.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let v1 = mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let v2 = mesh.add_vertex(Point3::new(0.0, 1.0, 0.0));
        let v3 = mesh.add_vertex(Point3::new(1.0, 1.0, 0.0));
        mesh.add_vertex(Point3::new(0.3, 0.2, 0.001));
        mesh.add_triangle(v0, v1, v2, 0).unwrap();
        mesh.add_triangle(v2, v1, v3, 0).unwrap();
        mesh
    }

    #[test]
    fn test_closest_vertex_respects_exclusion() {
        let mesh = strip();
        let v0 = Simplex::Vertex(VertexId::new(0));
        assert_eq!(
            mesh.closest_vertex(&v0, Some(&v0)).unwrap(),
            Some(VertexId::new(4))
        );
        assert_eq!(mesh.closest_vertex(&v0, None).unwrap(), Some(VertexId::new(0)));

        let empty = DynamicMesh::new();
        assert_eq!(empty.closest_vertex_to(&Point3::origin()), None);
    }

    #[test]
    fn test_closest_edge() {
        let mesh = strip();
        let probe = Simplex::Vertex(VertexId::new(4));
        let edge = mesh.closest_edge(&probe, None).unwrap().unwrap();
        assert_eq!(edge, EdgeId::new(VertexId::new(0), VertexId::new(1)).ordered());
    }

    #[test]
    fn test_nearby_pairs_skip_coincident() {
        let mesh = strip();
        let face = Simplex::Face([VertexId::new(0), VertexId::new(1), VertexId::new(2)]);
        let verts = mesh.nearby_verts(&face, 0.01).unwrap();
        assert_eq!(verts, vec![VertexId::new(4)]);

        // Every edge of the strip shares a vertex with the face
        assert!(mesh.nearby_edges(&face, 0.01).unwrap().is_empty());

        let pairs = mesh.nearby_pairs(&face, 0.01).unwrap();
        assert_eq!(pairs, vec![(face, Simplex::Vertex(VertexId::new(4)))]);
    }

    #[test]
    fn test_closest_point_on_surface() {
        let mesh = strip();
        let p = mesh.closest_point(&Point3::new(0.5, 0.5, 3.0)).unwrap();
        assert_relative_eq!(p, Point3::new(0.5, 0.5, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_edge_projection_points_to_third_vertex() {
        let mesh = strip();
        let edge = EdgeId::new(VertexId::new(1), VertexId::new(2));
        let proj = mesh.edge_projection(edge, PolyId::new(0)).unwrap();
        let local = proj.project(&mesh.point(VertexId::new(0)).unwrap());
        assert!(local.x > 0.0);
        assert_relative_eq!(local.z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_coincident_polys() {
        let mesh = strip();
        assert_eq!(
            mesh.coincident_polys(PolyId::new(0)).unwrap(),
            vec![PolyId::new(1)]
        );
    }
}
