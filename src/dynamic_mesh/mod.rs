// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mutable polygon mesh with stable vertex and polygon handles
//!
//! Vertices and polygons live in slot arenas. Removing an entity frees its
//! slot for reuse, so a handle is only meaningful while the entity is live.
//! Adjacency (vertex to incident polygons) is maintained incrementally;
//! everything else is derived on demand and returned as a snapshot.

mod edit;
mod ids;
mod query;
mod topology;

pub use ids::{make_simplex_pair, EdgeId, PolyId, Simplex, VertexId};
pub use edit::WeldStats;

use crate::error::{MeshError, MeshResult};
use crate::geometry::{Mesh, Segment3, Triangle, Triangle3, Vertex};
use nalgebra::Point3;

#[derive(Debug, Clone, PartialEq)]
struct Poly {
    verts: Vec<VertexId>,
    value: i32,
}

#[derive(Debug, Clone, Default)]
pub struct DynamicMesh {
    verts: Vec<Option<Point3<f64>>>,
    polys: Vec<Option<Poly>>,
    adjacency: Vec<Vec<PolyId>>,
    free_verts: Vec<usize>,
    free_polys: Vec<usize>,
    num_verts: usize,
    num_polys: usize,
}

impl DynamicMesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from positions and triangles; every triangle gets `value`
    pub fn from_triangles(
        positions: &[Point3<f64>],
        triangles: &[[usize; 3]],
        value: i32,
    ) -> MeshResult<Self> {
        let mut mesh = Self::new();
        let ids: Vec<VertexId> = positions.iter().map(|p| mesh.add_vertex(*p)).collect();
        for tri in triangles {
            let verts = tri
                .iter()
                .map(|&i| {
                    ids.get(i).copied().ok_or_else(|| {
                        MeshError::InvalidArgument(format!("triangle index {} out of range", i))
                    })
                })
                .collect::<MeshResult<Vec<_>>>()?;
            mesh.add_poly(&verts, value)?;
        }
        Ok(mesh)
    }

    /// Convert a plain indexed mesh; vertex `i` becomes `VertexId(i)`
    pub fn from_mesh(mesh: &Mesh) -> MeshResult<Self> {
        let triangles: Vec<[usize; 3]> = mesh.triangles.iter().map(|t| t.indices).collect();
        Self::from_triangles(&mesh.positions(), &triangles, 0)
    }

    /// Convert after welding positions closer than `tolerance`
    pub fn from_mesh_welded(mesh: &Mesh, tolerance: f64) -> MeshResult<Self> {
        let mut welded = mesh.clone();
        welded.weld_vertices(tolerance);
        Self::from_mesh(&welded)
    }

    /// Plain indexed mesh with live vertices compacted in id order
    ///
    /// Polygons with more than three vertices are fan-triangulated.
    pub fn to_mesh(&self) -> Mesh {
        let mut mesh = Mesh::with_capacity(self.num_verts, self.num_polys);
        let mut remap = vec![usize::MAX; self.verts.len()];
        for vert in self.verts() {
            remap[vert.index()] = mesh.add_vertex(Vertex::at(self.position(vert)));
        }
        for poly in self.polys() {
            let verts = self.poly_verts(poly);
            for i in 1..verts.len().saturating_sub(1) {
                mesh.add_triangle(Triangle::new([
                    remap[verts[0].index()],
                    remap[verts[i].index()],
                    remap[verts[i + 1].index()],
                ]));
            }
        }
        mesh.recompute_normals();
        mesh
    }

    pub fn is_valid_vertex(&self, vertex: VertexId) -> bool {
        matches!(self.verts.get(vertex.index()), Some(Some(_)))
    }

    pub fn is_valid_poly(&self, poly: PolyId) -> bool {
        matches!(self.polys.get(poly.index()), Some(Some(_)))
    }

    pub fn is_valid_edge(&self, edge: EdgeId) -> bool {
        edge.is_valid() && self.is_valid_vertex(edge.a) && self.is_valid_vertex(edge.b)
    }

    pub fn is_valid_simplex(&self, simplex: &Simplex) -> bool {
        match simplex {
            Simplex::Edge(e) => self.is_valid_edge(*e),
            other => other.vertices().iter().all(|&v| self.is_valid_vertex(v)),
        }
    }

    pub(crate) fn check_vertex(&self, vertex: VertexId) -> MeshResult<()> {
        if self.is_valid_vertex(vertex) {
            Ok(())
        } else {
            Err(MeshError::InvalidHandle(format!("vertex {}", vertex)))
        }
    }

    pub(crate) fn check_poly(&self, poly: PolyId) -> MeshResult<()> {
        if self.is_valid_poly(poly) {
            Ok(())
        } else {
            Err(MeshError::InvalidHandle(format!("poly {}", poly)))
        }
    }

    pub(crate) fn check_edge(&self, edge: EdgeId) -> MeshResult<()> {
        if !edge.is_valid() {
            return Err(MeshError::InvalidArgument(format!("degenerate edge {}", edge)));
        }
        self.check_vertex(edge.a)?;
        self.check_vertex(edge.b)
    }

    /// Insert a vertex, reusing a freed slot if there is one
    pub fn add_vertex(&mut self, pos: Point3<f64>) -> VertexId {
        self.num_verts += 1;
        match self.free_verts.pop() {
            Some(index) => {
                self.verts[index] = Some(pos);
                VertexId::new(index)
            }
            None => {
                self.verts.push(Some(pos));
                self.adjacency.push(Vec::new());
                VertexId::new(self.verts.len() - 1)
            }
        }
    }

    /// Insert a polygon of at least three distinct live vertices
    pub fn add_poly(&mut self, verts: &[VertexId], value: i32) -> MeshResult<PolyId> {
        if verts.len() < 3 {
            return Err(MeshError::InvalidArgument(format!(
                "polygon needs at least 3 vertices, got {}",
                verts.len()
            )));
        }
        for (i, &vert) in verts.iter().enumerate() {
            self.check_vertex(vert)?;
            if verts[..i].contains(&vert) {
                return Err(MeshError::InvalidArgument(format!(
                    "polygon uses vertex {} twice",
                    vert
                )));
            }
        }

        let poly = Poly {
            verts: verts.to_vec(),
            value,
        };
        let id = match self.free_polys.pop() {
            Some(index) => {
                self.polys[index] = Some(poly);
                PolyId::new(index)
            }
            None => {
                self.polys.push(Some(poly));
                PolyId::new(self.polys.len() - 1)
            }
        };
        self.num_polys += 1;
        self.attach(id);
        Ok(id)
    }

    pub fn add_triangle(
        &mut self,
        v0: VertexId,
        v1: VertexId,
        v2: VertexId,
        value: i32,
    ) -> MeshResult<PolyId> {
        self.add_poly(&[v0, v1, v2], value)
    }

    /// Remove a vertex together with every polygon that uses it
    pub fn remove_vertex(&mut self, vertex: VertexId) -> MeshResult<()> {
        self.check_vertex(vertex)?;
        for poly in self.adjacency[vertex.index()].clone() {
            self.remove_poly(poly)?;
        }
        self.verts[vertex.index()] = None;
        self.adjacency[vertex.index()].clear();
        self.free_verts.push(vertex.index());
        self.num_verts -= 1;
        Ok(())
    }

    /// Remove a polygon; its vertices stay
    pub fn remove_poly(&mut self, poly: PolyId) -> MeshResult<()> {
        self.check_poly(poly)?;
        self.detach(poly);
        self.polys[poly.index()] = None;
        self.free_polys.push(poly.index());
        self.num_polys -= 1;
        Ok(())
    }

    fn attach(&mut self, poly: PolyId) {
        if let Some(Some(p)) = self.polys.get(poly.index()) {
            for vert in &p.verts {
                let list = &mut self.adjacency[vert.index()];
                if !list.contains(&poly) {
                    list.push(poly);
                }
            }
        }
    }

    fn detach(&mut self, poly: PolyId) {
        if let Some(Some(p)) = self.polys.get(poly.index()) {
            for vert in &p.verts {
                self.adjacency[vert.index()].retain(|&other| other != poly);
            }
        }
    }

    /// Snapshot of live vertices in id order
    pub fn verts(&self) -> Vec<VertexId> {
        self.verts
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| VertexId::new(i))
            .collect()
    }

    /// Snapshot of live polygons in id order
    pub fn polys(&self) -> Vec<PolyId> {
        self.polys
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| PolyId::new(i))
            .collect()
    }

    /// Every undirected edge once, in canonical (ordered) form
    pub fn edges(&self) -> Vec<EdgeId> {
        let mut out: Vec<EdgeId> = self
            .polys()
            .into_iter()
            .flat_map(|p| self.poly_edges(p))
            .map(|e| e.ordered())
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    pub fn point(&self, vertex: VertexId) -> MeshResult<Point3<f64>> {
        self.verts
            .get(vertex.index())
            .copied()
            .flatten()
            .ok_or_else(|| MeshError::InvalidHandle(format!("vertex {}", vertex)))
    }

    /// Position of a vertex already known to be live
    pub(crate) fn position(&self, vertex: VertexId) -> Point3<f64> {
        self.verts[vertex.index()].unwrap_or_else(Point3::origin)
    }

    pub fn points(&self) -> Vec<Point3<f64>> {
        self.verts.iter().flatten().copied().collect()
    }

    pub fn vertex_count(&self) -> usize {
        self.num_verts
    }

    pub fn poly_count(&self) -> usize {
        self.num_polys
    }

    /// Upper bound (exclusive) of vertex slot indices
    pub fn vertex_id_count(&self) -> usize {
        self.verts.len()
    }

    /// Upper bound (exclusive) of polygon slot indices
    pub fn poly_id_count(&self) -> usize {
        self.polys.len()
    }

    /// Number of polygons using `vertex`
    pub fn poly_count_at(&self, vertex: VertexId) -> MeshResult<usize> {
        self.check_vertex(vertex)?;
        Ok(self.adjacency[vertex.index()].len())
    }

    /// Number of vertices of `poly`
    pub fn vertex_count_of(&self, poly: PolyId) -> MeshResult<usize> {
        Ok(self.poly_ref(poly)?.verts.len())
    }

    fn poly_ref(&self, poly: PolyId) -> MeshResult<&Poly> {
        self.polys
            .get(poly.index())
            .and_then(|slot| slot.as_ref())
            .ok_or_else(|| MeshError::InvalidHandle(format!("poly {}", poly)))
    }

    pub fn value(&self, poly: PolyId) -> MeshResult<i32> {
        Ok(self.poly_ref(poly)?.value)
    }

    pub fn set_value(&mut self, poly: PolyId, value: i32) -> MeshResult<()> {
        match self.polys.get_mut(poly.index()) {
            Some(Some(p)) => {
                p.value = value;
                Ok(())
            }
            _ => Err(MeshError::InvalidHandle(format!("poly {}", poly))),
        }
    }

    /// Vertices of `poly` in winding order
    pub fn poly_vertices(&self, poly: PolyId) -> MeshResult<Vec<VertexId>> {
        Ok(self.poly_ref(poly)?.verts.clone())
    }

    pub(crate) fn poly_verts(&self, poly: PolyId) -> &[VertexId] {
        match self.polys.get(poly.index()) {
            Some(Some(p)) => &p.verts,
            _ => &[],
        }
    }

    /// Directed boundary edges of `poly` in winding order
    pub fn poly_edges(&self, poly: PolyId) -> Vec<EdgeId> {
        let verts = self.poly_verts(poly);
        let n = verts.len();
        (0..n)
            .map(|i| EdgeId::new(verts[i], verts[(i + 1) % n]))
            .collect()
    }

    /// Edge `index` of `poly`, starting at its `index`-th vertex
    pub fn poly_edge(&self, poly: PolyId, index: usize) -> MeshResult<EdgeId> {
        let verts = &self.poly_ref(poly)?.verts;
        if index >= verts.len() {
            return Err(MeshError::InvalidArgument(format!(
                "poly {} has no edge {}",
                poly, index
            )));
        }
        Ok(EdgeId::new(verts[index], verts[(index + 1) % verts.len()]))
    }

    /// Position of the directed edge within `poly`, if it is one of its edges
    pub fn poly_edge_index(&self, poly: PolyId, edge: EdgeId) -> Option<usize> {
        self.poly_edges(poly).iter().position(|e| *e == edge)
    }

    /// Vertex of a triangle that is not an endpoint of `edge`
    pub fn other_vertex(&self, poly: PolyId, edge: EdgeId) -> MeshResult<VertexId> {
        let verts = &self.poly_ref(poly)?.verts;
        if !(verts.contains(&edge.a) && verts.contains(&edge.b)) {
            return Err(MeshError::InvalidArgument(format!(
                "edge {} is not part of poly {}",
                edge, poly
            )));
        }
        verts
            .iter()
            .copied()
            .find(|v| !edge.contains(*v))
            .ok_or_else(|| MeshError::InvalidArgument(format!("poly {} is degenerate", poly)))
    }

    /// Polygons using `vertex`
    pub fn polys_at(&self, vertex: VertexId) -> MeshResult<Vec<PolyId>> {
        self.check_vertex(vertex)?;
        Ok(self.adjacency[vertex.index()].clone())
    }

    /// Polygons having `edge` (in either direction) as a boundary edge
    pub fn polys_at_edge(&self, edge: EdgeId) -> MeshResult<Vec<PolyId>> {
        self.check_edge(edge)?;
        Ok(self.edge_polys(edge))
    }

    pub(crate) fn edge_polys(&self, edge: EdgeId) -> Vec<PolyId> {
        let Some(list) = self.adjacency.get(edge.a.index()) else {
            return Vec::new();
        };
        list.iter()
            .copied()
            .filter(|&p| {
                self.poly_edges(p)
                    .iter()
                    .any(|e| *e == edge || *e == edge.inverse())
            })
            .collect()
    }

    /// Outgoing directed edges of `vertex`
    pub fn edges_at(&self, vertex: VertexId) -> MeshResult<Vec<EdgeId>> {
        self.check_vertex(vertex)?;
        let mut out: Vec<EdgeId> = self.adjacency[vertex.index()]
            .iter()
            .flat_map(|&p| self.poly_edges(p))
            .filter(|e| e.a == vertex)
            .collect();
        out.sort_unstable();
        out.dedup();
        Ok(out)
    }

    pub fn segment(&self, edge: EdgeId) -> MeshResult<Segment3> {
        Ok(Segment3::new(self.point(edge.a)?, self.point(edge.b)?))
    }

    /// Geometry of a triangular polygon
    pub fn triangle(&self, poly: PolyId) -> MeshResult<Triangle3> {
        let verts = &self.poly_ref(poly)?.verts;
        if verts.len() != 3 {
            return Err(MeshError::InvalidArgument(format!(
                "poly {} has {} vertices",
                poly,
                verts.len()
            )));
        }
        Ok(Triangle3::new(
            self.position(verts[0]),
            self.position(verts[1]),
            self.position(verts[2]),
        ))
    }
}

impl TryFrom<&Mesh> for DynamicMesh {
    type Error = MeshError;

    fn try_from(mesh: &Mesh) -> MeshResult<Self> {
        DynamicMesh::from_mesh(mesh)
    }
}

impl From<&DynamicMesh> for Mesh {
    fn from(mesh: &DynamicMesh) -> Self {
        mesh.to_mesh()
    }
}
