// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Edit operations: merging, splitting, moving, extraction

use super::{DynamicMesh, EdgeId, PolyId, Simplex, VertexId};
use crate::error::{MeshError, MeshResult};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Counts of the merges performed by [`DynamicMesh::weld_nearby`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeldStats {
    pub initial_pairs: usize,
    pub vertex_vertex: usize,
    pub edge_vertex: usize,
    pub edge_edge: usize,
}

impl DynamicMesh {
    /// Relocate a vertex; surrounding geometry is not re-validated
    pub fn move_vertex(&mut self, vertex: VertexId, pos: Point3<f64>) -> MeshResult<()> {
        match self.verts.get_mut(vertex.index()) {
            Some(Some(p)) => {
                *p = pos;
                Ok(())
            }
            _ => Err(MeshError::InvalidHandle(format!("vertex {}", vertex))),
        }
    }

    /// Merge `verts` into one vertex placed at their average position
    pub fn merge_verts(&mut self, verts: &[VertexId]) -> MeshResult<VertexId> {
        if verts.is_empty() {
            return Err(MeshError::InvalidArgument("nothing to merge".into()));
        }
        let mut sum = nalgebra::Vector3::zeros();
        for &vert in verts {
            sum += self.point(vert)?.coords;
        }
        let target = Point3::from(sum / verts.len() as f64);
        self.merge_verts_at(verts, target)
    }

    /// Merge `verts` into one vertex placed at `target`
    ///
    /// The vertex with the smallest id survives and every polygon is
    /// re-pointed to it. Polygons left with a repeated vertex are removed.
    pub fn merge_verts_at(
        &mut self,
        verts: &[VertexId],
        target: Point3<f64>,
    ) -> MeshResult<VertexId> {
        let mut unique: Vec<VertexId> = verts.to_vec();
        unique.sort_unstable();
        unique.dedup();
        for &vert in &unique {
            self.check_vertex(vert)?;
        }
        let Some((&survivor, merged)) = unique.split_first() else {
            return Err(MeshError::InvalidArgument("nothing to merge".into()));
        };

        self.move_vertex(survivor, target)?;
        if merged.is_empty() {
            return Ok(survivor);
        }

        let mut affected: Vec<PolyId> = merged
            .iter()
            .flat_map(|v| self.adjacency[v.index()].iter().copied())
            .collect();
        affected.sort_unstable();
        affected.dedup();

        for poly in affected {
            self.detach(poly);
            let Some(Some(p)) = self.polys.get_mut(poly.index()) else {
                continue;
            };
            for vert in p.verts.iter_mut() {
                if merged.contains(vert) {
                    *vert = survivor;
                }
            }
            p.verts.dedup();
            while p.verts.len() > 1 && p.verts.first() == p.verts.last() {
                p.verts.pop();
            }
            let mut sorted = p.verts.clone();
            sorted.sort_unstable();
            sorted.dedup();

            if p.verts.len() < 3 || sorted.len() != p.verts.len() {
                debug!(%poly, "dropping polygon collapsed by merge");
                self.polys[poly.index()] = None;
                self.free_polys.push(poly.index());
                self.num_polys -= 1;
            } else {
                self.attach(poly);
            }
        }

        for &vert in merged {
            self.verts[vert.index()] = None;
            self.adjacency[vert.index()].clear();
            self.free_verts.push(vert.index());
            self.num_verts -= 1;
        }
        Ok(survivor)
    }

    /// Insert `vertex` into `edge`, splitting every polygon along it
    ///
    /// A triangle `[a, b, c]` with edge `a -> b` becomes `[a, v, c]` and
    /// `[v, b, c]`; larger polygons just gain the vertex. Returns the
    /// polygons created.
    pub fn split(&mut self, edge: EdgeId, vertex: VertexId) -> MeshResult<Vec<PolyId>> {
        self.check_edge(edge)?;
        self.check_vertex(vertex)?;
        if edge.contains(vertex) {
            return Err(MeshError::InvalidArgument(format!(
                "cannot split {} at its own endpoint {}",
                edge, vertex
            )));
        }

        let mut created = Vec::new();
        for poly in self.edge_polys(edge) {
            let Some(index) = self
                .poly_edge_index(poly, edge)
                .or_else(|| self.poly_edge_index(poly, edge.inverse()))
            else {
                continue;
            };
            let verts = self.poly_verts(poly).to_vec();
            if verts.contains(&vertex) {
                return Err(MeshError::InvalidArgument(format!(
                    "poly {} already uses {}",
                    poly, vertex
                )));
            }
            let value = self.value(poly)?;
            let n = verts.len();
            let (from, to) = (verts[index], verts[(index + 1) % n]);

            self.detach(poly);
            if n == 3 {
                let third = verts[(index + 2) % 3];
                if let Some(Some(p)) = self.polys.get_mut(poly.index()) {
                    p.verts = vec![from, vertex, third];
                }
                self.attach(poly);
                created.push(self.add_poly(&[vertex, to, third], value)?);
            } else {
                if let Some(Some(p)) = self.polys.get_mut(poly.index()) {
                    p.verts.insert(index + 1, vertex);
                }
                self.attach(poly);
            }
        }
        Ok(created)
    }

    /// Fan-triangulate a polygon with more than three vertices
    ///
    /// The first triangle keeps the polygon's id; all inherit its value.
    pub fn triangulate(&mut self, poly: PolyId) -> MeshResult<Vec<PolyId>> {
        let verts = self.poly_vertices(poly)?;
        if verts.len() == 3 {
            return Ok(vec![poly]);
        }
        let value = self.value(poly)?;

        self.detach(poly);
        if let Some(Some(p)) = self.polys.get_mut(poly.index()) {
            p.verts = vec![verts[0], verts[1], verts[2]];
        }
        self.attach(poly);

        let mut out = vec![poly];
        for i in 2..verts.len() - 1 {
            out.push(self.add_poly(&[verts[0], verts[i], verts[i + 1]], value)?);
        }
        Ok(out)
    }

    /// Sorted unique vertices used by `polys`
    pub fn verts_of(&self, polys: &[PolyId]) -> Vec<VertexId> {
        let mut out: Vec<VertexId> = polys
            .iter()
            .flat_map(|&p| self.poly_verts(p).iter().copied())
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Sorted unique undirected edges of `polys`
    pub fn edges_of(&self, polys: &[PolyId]) -> Vec<EdgeId> {
        let mut out: Vec<EdgeId> = polys
            .iter()
            .flat_map(|&p| self.poly_edges(p))
            .map(|e| e.ordered())
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Live polygons not in `polys`
    pub fn inverse_polys(&self, polys: &[PolyId]) -> Vec<PolyId> {
        let skip: BTreeSet<PolyId> = polys.iter().copied().collect();
        self.polys().into_iter().filter(|p| !skip.contains(p)).collect()
    }

    /// Live vertices not in `verts`
    pub fn inverse_verts(&self, verts: &[VertexId]) -> Vec<VertexId> {
        let skip: BTreeSet<VertexId> = verts.iter().copied().collect();
        self.verts().into_iter().filter(|v| !skip.contains(v)).collect()
    }

    /// Copy of `polys` and the vertices they use, with compacted ids
    pub fn extract(&self, polys: &[PolyId]) -> MeshResult<DynamicMesh> {
        for &poly in polys {
            self.check_poly(poly)?;
        }
        let mut out = DynamicMesh::new();
        let mut remap = vec![None; self.verts.len()];
        for vert in self.verts_of(polys) {
            remap[vert.index()] = Some(out.add_vertex(self.position(vert)));
        }
        for &poly in polys {
            let verts = self
                .poly_verts(poly)
                .iter()
                .map(|v| {
                    remap[v.index()]
                        .ok_or_else(|| MeshError::InvalidHandle(format!("vertex {}", v)))
                })
                .collect::<MeshResult<Vec<_>>>()?;
            out.add_poly(&verts, self.value(poly)?)?;
        }
        Ok(out)
    }

    /// Concatenation of several meshes; vertices are not welded
    pub fn merge_meshes(meshes: &[DynamicMesh]) -> MeshResult<DynamicMesh> {
        let mut out = DynamicMesh::new();
        for mesh in meshes {
            let mut remap = vec![None; mesh.verts.len()];
            for vert in mesh.verts() {
                remap[vert.index()] = Some(out.add_vertex(mesh.position(vert)));
            }
            for poly in mesh.polys() {
                let verts: Vec<VertexId> = mesh
                    .poly_verts(poly)
                    .iter()
                    .filter_map(|v| remap[v.index()])
                    .collect();
                out.add_poly(&verts, mesh.value(poly)?)?;
            }
        }
        Ok(out)
    }

    /// Repeatedly merge vertices and edges closer than `tolerance`
    ///
    /// Vertex pairs are merged, a vertex close to an edge is merged into a
    /// new vertex splitting that edge, and two close edges are both split
    /// at their closest points which are then merged. Stops after
    /// `max_steps` merges.
    pub fn weld_nearby(&mut self, tolerance: f64, max_steps: usize) -> MeshResult<WeldStats> {
        let mut pending: BTreeSet<(Simplex, Simplex)> = BTreeSet::new();
        for vert in self.verts() {
            pending.extend(self.nearby_pairs(&Simplex::Vertex(vert), tolerance)?);
        }
        for edge in self.edges() {
            pending.extend(self.nearby_pairs(&Simplex::Edge(edge), tolerance)?);
        }

        let mut stats = WeldStats {
            initial_pairs: pending.len(),
            ..WeldStats::default()
        };
        let mut steps = 0;

        while let Some((first, second)) = pending.pop_first() {
            if steps >= max_steps {
                break;
            }
            if !self.is_live_simplex(&first)
                || !self.is_live_simplex(&second)
                || first.coincident(&second)
                || self.distance(&first, &second)? >= tolerance
            {
                continue;
            }

            match (first, second) {
                (Simplex::Vertex(a), Simplex::Vertex(b)) => {
                    let vert = self.merge_verts(&[a, b])?;
                    pending.extend(self.nearby_pairs(&Simplex::Vertex(vert), tolerance)?);
                    stats.vertex_vertex += 1;
                }
                (Simplex::Edge(edge), Simplex::Vertex(vert)) => {
                    let target = self.segment(edge)?.closest_point(&self.position(vert));
                    let on_edge = self.vertex_on_edge(edge, target, tolerance)?;
                    let vert = self.merge_verts(&[on_edge, vert])?;
                    self.queue_around(&mut pending, vert, edge, tolerance)?;
                    stats.edge_vertex += 1;
                }
                (Simplex::Edge(edge1), Simplex::Edge(edge2)) => {
                    let (p1, p2) = self.segment(edge1)?.closest_points(&self.segment(edge2)?);
                    let vert1 = self.vertex_on_edge(edge1, p1, tolerance)?;
                    let vert2 = self.vertex_on_edge(edge2, p2, tolerance)?;
                    let vert = self.merge_verts(&[vert1, vert2])?;
                    self.queue_around(&mut pending, vert, edge1, tolerance)?;
                    self.queue_around(&mut pending, vert, edge2, tolerance)?;
                    stats.edge_edge += 1;
                }
                _ => continue,
            }
            steps += 1;
        }

        debug!(
            vertex_vertex = stats.vertex_vertex,
            edge_vertex = stats.edge_vertex,
            edge_edge = stats.edge_edge,
            initial = stats.initial_pairs,
            "welded nearby elements"
        );
        Ok(stats)
    }

    fn is_live_simplex(&self, simplex: &Simplex) -> bool {
        match simplex {
            Simplex::Edge(edge) => self.is_valid_edge(*edge) && !self.edge_polys(*edge).is_empty(),
            other => self.is_valid_simplex(other),
        }
    }

    /// Vertex at `point` on `edge`: an endpoint when close, else a new split vertex
    fn vertex_on_edge(
        &mut self,
        edge: EdgeId,
        point: Point3<f64>,
        tolerance: f64,
    ) -> MeshResult<VertexId> {
        if (self.position(edge.a) - point).norm() < tolerance {
            return Ok(edge.a);
        }
        if (self.position(edge.b) - point).norm() < tolerance {
            return Ok(edge.b);
        }
        let vert = self.add_vertex(point);
        self.split(edge, vert)?;
        Ok(vert)
    }

    fn queue_around(
        &self,
        pending: &mut BTreeSet<(Simplex, Simplex)>,
        vert: VertexId,
        edge: EdgeId,
        tolerance: f64,
    ) -> MeshResult<()> {
        pending.extend(self.nearby_pairs(&Simplex::Vertex(vert), tolerance)?);
        for half in [EdgeId::new(edge.a, vert), EdgeId::new(vert, edge.b)] {
            if self.is_live_simplex(&Simplex::Edge(half)) {
                pending.extend(self.nearby_pairs(&Simplex::Edge(half), tolerance)?);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn cube() -> DynamicMesh {
        DynamicMesh::from_mesh(&Primitive::cube(Vector3::new(1.0, 1.0, 1.0), false).to_mesh())
            .unwrap()
    }

    #[test]
    fn test_split_keeps_euler_and_volume() {
        let mut mesh = cube();
        let edge = mesh.edges()[0];
        let mid = mesh.segment(edge).unwrap().midpoint();
        let vert = mesh.add_vertex(mid);

        let created = mesh.split(edge, vert).unwrap();
        assert_eq!(created.len(), 2);
        assert_eq!(mesh.poly_count(), 14);
        assert_eq!(mesh.euler_poincare(), 2);
        assert!(mesh.polys_at_edge(edge).unwrap().is_empty());
        assert_relative_eq!(mesh.to_mesh().signed_volume(), 1.0, epsilon = 1e-12);
        assert!(mesh.is_closed_orientable_surface(&mesh.polys()));
    }

    #[test]
    fn test_split_rejects_endpoint() {
        let mut mesh = cube();
        let edge = mesh.edges()[0];
        assert!(mesh.split(edge, edge.a).is_err());
    }

    #[test]
    fn test_merge_drops_collapsed_polys() {
        let mut mesh = cube();
        let edge = mesh.edges()[0];
        let shared = mesh.polys_at_edge(edge).unwrap();
        let survivor = mesh.merge_verts(&[edge.a, edge.b]).unwrap();

        assert_eq!(survivor, edge.a.min(edge.b));
        assert_eq!(mesh.vertex_count(), 7);
        assert_eq!(mesh.poly_count(), 12 - shared.len());
        for poly in shared {
            assert!(!mesh.is_valid_poly(poly));
        }
        for poly in mesh.polys() {
            let verts = mesh.poly_vertices(poly).unwrap();
            assert_eq!(verts.len(), 3);
            assert!(verts.iter().all(|&v| mesh.is_valid_vertex(v)));
        }
        assert_eq!(mesh.euler_poincare(), 2);
    }

    #[test]
    fn test_merge_at_target() {
        let mut mesh = DynamicMesh::new();
        let a = mesh.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let b = mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let target = Point3::new(5.0, 5.0, 5.0);
        let v = mesh.merge_verts_at(&[b, a, b], target).unwrap();
        assert_eq!(v, a);
        assert_eq!(mesh.point(v).unwrap(), target);
        assert!(!mesh.is_valid_vertex(b));
        assert!(mesh.merge_verts(&[]).is_err());
    }

    #[test]
    fn test_triangulate_quad() {
        let mut mesh = DynamicMesh::new();
        let verts: Vec<VertexId> = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]
            .iter()
            .map(|&(x, y)| mesh.add_vertex(Point3::new(x, y, 0.0)))
            .collect();
        let quad = mesh.add_poly(&verts, 4).unwrap();
        assert!(!mesh.is_triangular());

        let tris = mesh.triangulate(quad).unwrap();
        assert_eq!(tris.len(), 2);
        assert_eq!(tris[0], quad);
        assert!(mesh.is_triangular());
        let area: f64 = tris.iter().map(|&t| mesh.triangle(t).unwrap().area()).sum();
        assert_relative_eq!(area, 1.0, epsilon = 1e-12);
        assert!(tris.iter().all(|&t| mesh.value(t).unwrap() == 4));
    }

    #[test]
    fn test_extract_and_inverse() {
        let mesh = cube();
        let polys = mesh.polys();
        let (left, _) = polys.split_at(4);
        let part = mesh.extract(left).unwrap();
        assert_eq!(part.poly_count(), 4);
        assert_eq!(part.vertex_count(), mesh.verts_of(left).len());

        let rest = mesh.inverse_polys(left);
        assert_eq!(rest.len(), 8);
        assert!(rest.iter().all(|p| !left.contains(p)));
        assert!(mesh.inverse_verts(&mesh.verts()).is_empty());
    }

    #[test]
    fn test_merge_meshes() {
        let a = cube();
        let merged = DynamicMesh::merge_meshes(&[a.clone(), a]).unwrap();
        assert_eq!(merged.vertex_count(), 16);
        assert_eq!(merged.poly_count(), 24);
        assert_eq!(merged.separate_surfaces().len(), 2);
    }

    #[test]
    fn test_weld_nearby_merges_close_vertices() {
        let mut mesh = DynamicMesh::new();
        let a = mesh.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let b = mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let c = mesh.add_vertex(Point3::new(0.0, 1.0, 0.0));
        let d = mesh.add_vertex(Point3::new(1.0, 0.0, 1e-4));
        let e = mesh.add_vertex(Point3::new(1.0, 1.0, 0.0));
        mesh.add_triangle(a, b, c, 0).unwrap();
        mesh.add_triangle(c, d, e, 0).unwrap();

        let stats = mesh.weld_nearby(1e-3, 100).unwrap();
        assert_eq!(stats.vertex_vertex, 1);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.edges().len(), 5);
        assert_eq!(mesh.polys_at_edge(EdgeId::new(b, c)).unwrap().len(), 2);
    }
    /// Triangle in the ground plane with a corner at the origin
    fn ground_triangle(mesh: &mut DynamicMesh) -> (VertexId, VertexId) {
        let a = mesh.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let b = mesh.add_vertex(Point3::new(2.0, 0.0, 0.0));
        let c = mesh.add_vertex(Point3::new(0.0, 2.0, 0.0));
        mesh.add_triangle(a, b, c, 0).unwrap();
        (a, b)
    }

    #[test]
    fn test_weld_nearby_splits_edge_at_close_vertex() {
        let mut mesh = DynamicMesh::new();
        let (a, b) = ground_triangle(&mut mesh);
        let d = mesh.add_vertex(Point3::new(1.0, 0.0, 1e-4));
        let e = mesh.add_vertex(Point3::new(1.0, -1.0, 1.0));
        let f = mesh.add_vertex(Point3::new(1.5, -1.0, 1.0));
        mesh.add_triangle(d, e, f, 0).unwrap();

        let stats = mesh.weld_nearby(1e-3, 100).unwrap();
        assert_eq!(stats.edge_vertex, 1);
        assert_eq!(stats.vertex_vertex, 0);
        assert_eq!(stats.edge_edge, 0);
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.poly_count(), 3);

        // The ground triangle is split through d
        assert_eq!(mesh.polys_at(d).unwrap().len(), 3);
        assert!(mesh.polys_at_edge(EdgeId::new(a, b)).unwrap().is_empty());
        let p = mesh.point(d).unwrap();
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(p.y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(p.z, 5e-5, epsilon = 1e-12);
    }

    #[test]
    fn test_weld_nearby_joins_skew_edges() {
        let mut mesh = DynamicMesh::new();
        let (a, b) = ground_triangle(&mut mesh);
        // d-e passes 1e-4 above a-b, crossing it at x = 1
        let d = mesh.add_vertex(Point3::new(1.0, -1.0, 1e-4));
        let e = mesh.add_vertex(Point3::new(1.0, 0.5, 1e-4));
        let f = mesh.add_vertex(Point3::new(1.0, 0.0, 1.0));
        mesh.add_triangle(d, e, f, 0).unwrap();

        let stats = mesh.weld_nearby(1e-3, 100).unwrap();
        assert_eq!(stats.edge_edge, 1);
        assert_eq!(stats.vertex_vertex, 0);
        assert_eq!(stats.edge_vertex, 0);
        assert_eq!(mesh.vertex_count(), 7);
        assert_eq!(mesh.poly_count(), 4);

        // One new vertex now joins both triangles
        let joined: Vec<VertexId> = mesh
            .verts()
            .into_iter()
            .filter(|&v| mesh.polys_at(v).unwrap().len() == 4)
            .collect();
        assert_eq!(joined.len(), 1);
        let p = mesh.point(joined[0]).unwrap();
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(p.y, 0.0, epsilon = 1e-12);
        assert!(mesh.polys_at_edge(EdgeId::new(a, b)).unwrap().is_empty());
        assert!(mesh.polys_at_edge(EdgeId::new(d, e)).unwrap().is_empty());
    }
}
