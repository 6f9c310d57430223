// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mesh boolean difference on [`DynamicMesh`] surfaces
//!
//! The pipeline runs in five stages:
//! 1. intersection curve extraction ([`find_intersections`])
//! 2. snapping of the curve vertices to identical positions in both meshes
//! 3. re-triangulation of every cut face ([`triangulate_faces`])
//! 4. classification of both meshes against each other ([`classify_faces`])
//! 5. assembly of the outside of A with the inverted inside of B

mod classify;
mod intersect;
mod retriangulate;

pub use classify::{classify_faces, flood_fill, winding_number, Classification};
pub use intersect::{compatible_edges, find_intersections};
pub use retriangulate::{
    find_best_bridge, find_simple_polygons, triangulate_faces, triangulate_simple_polygon,
    EdgeGraph,
};

use crate::config::CsgConfig;
use crate::dynamic_mesh::{DynamicMesh, EdgeId, PolyId, VertexId};
use crate::error::{CsgResult, MeshError};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Position of a face relative to the other operand's solid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaceType {
    #[default]
    Unclassified,
    Inside,
    Outside,
    /// Coincident with a reference face of the same orientation
    Shared,
    /// Coincident with a reference face of opposite orientation
    SharedOpposite,
}

/// Intersection edges of one mesh with the face each one was found on
pub type EdgeLoop = Vec<(PolyId, EdgeId)>;

/// Number of faces per [`FaceType`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceTypeCounts {
    pub unclassified: usize,
    pub inside: usize,
    pub outside: usize,
    pub shared: usize,
    pub shared_opposite: usize,
}

impl FaceTypeCounts {
    pub fn from_classification(mesh: &DynamicMesh, classification: &Classification) -> Self {
        let mut counts = Self::default();
        for poly in mesh.polys() {
            match classification.label(poly) {
                FaceType::Unclassified => counts.unclassified += 1,
                FaceType::Inside => counts.inside += 1,
                FaceType::Outside => counts.outside += 1,
                FaceType::Shared => counts.shared += 1,
                FaceType::SharedOpposite => counts.shared_opposite += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.unclassified + self.inside + self.outside + self.shared + self.shared_opposite
    }
}

/// Statistics gathered while computing a difference
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CsgReport {
    pub intersection_edges: usize,
    pub retriangulated_a: usize,
    pub retriangulated_b: usize,
    pub classified_a: FaceTypeCounts,
    pub classified_b: FaceTypeCounts,
    pub conflicts: usize,
    pub fallback_components: usize,
    pub result_polys: usize,
}

/// Move corresponding curve vertices of `a` and `b` to one shared position
///
/// Each pair is moved to its average first; B's copies are then overwritten
/// with A's final positions so the two meshes agree bit for bit even where
/// one vertex takes part in several pairs.
pub fn snap_loops(
    a: &mut DynamicMesh,
    b: &mut DynamicMesh,
    loop_a: &EdgeLoop,
    loop_b: &EdgeLoop,
) -> CsgResult<()> {
    if loop_a.len() != loop_b.len() {
        return Err(MeshError::InvalidArgument(format!(
            "edge loops differ in length: {} vs {}",
            loop_a.len(),
            loop_b.len()
        ))
        .into());
    }

    let pairs: Vec<(VertexId, VertexId)> = loop_a
        .iter()
        .zip(loop_b)
        .flat_map(|(&(_, ea), &(_, eb))| [(ea.a, eb.a), (ea.b, eb.b)])
        .collect();

    for &(va, vb) in &pairs {
        let pa = a.point(va)?;
        let pb = b.point(vb)?;
        let mid = nalgebra::center(&pa, &pb);
        a.move_vertex(va, mid)?;
        b.move_vertex(vb, mid)?;
    }
    for &(va, vb) in &pairs {
        b.move_vertex(vb, a.point(va)?)?;
    }
    Ok(())
}

fn triangulate_all(mesh: &mut DynamicMesh) -> CsgResult<usize> {
    let mut count = 0;
    for poly in mesh.polys() {
        if mesh.vertex_count_of(poly)? > 3 {
            mesh.triangulate(poly)?;
            count += 1;
        }
    }
    Ok(count)
}

fn position_key(p: &nalgebra::Point3<f64>) -> [u64; 3] {
    // -0.0 and 0.0 must weld
    [p.x + 0.0, p.y + 0.0, p.z + 0.0].map(f64::to_bits)
}

/// Outside faces of `a` plus the inverted inside faces of `b`
///
/// Faces of `a` that `b` only touches from outside (`SharedOpposite`) stay
/// part of the boundary and are kept as well. Vertices at bit-identical positions are welded, so the two parts share
/// the snapped curve vertices.
fn assemble_difference(
    a: &DynamicMesh,
    labels_a: &Classification,
    b: &DynamicMesh,
    labels_b: &Classification,
) -> CsgResult<DynamicMesh> {
    let mut out = DynamicMesh::new();
    let mut welded: AHashMap<[u64; 3], VertexId> = AHashMap::new();
    let mut degenerate = 0usize;

    let parts: [(&DynamicMesh, &Classification, &[FaceType], bool); 2] = [
        (a, labels_a, &[FaceType::Outside, FaceType::SharedOpposite], false),
        (b, labels_b, &[FaceType::Inside], true),
    ];
    for (mesh, labels, keep, reverse) in parts {
        let polys = keep.iter().flat_map(|&kind| labels.faces_of(mesh, kind));
        for poly in polys {
            let mut verts = Vec::with_capacity(3);
            for &v in mesh.poly_verts(poly) {
                let pos = mesh.position(v);
                let id = *welded
                    .entry(position_key(&pos))
                    .or_insert_with(|| out.add_vertex(pos));
                verts.push(id);
            }
            if reverse {
                verts.reverse();
            }

            let distinct = (0..verts.len()).all(|i| !verts[i + 1..].contains(&verts[i]));
            if !distinct {
                degenerate += 1;
                continue;
            }
            out.add_poly(&verts, mesh.value(poly)?)?;
        }
    }

    if degenerate > 0 {
        debug!(degenerate, "dropped collapsed faces during assembly");
    }
    Ok(out)
}

/// `a - b` with the default configuration
pub fn csg_difference(a: DynamicMesh, b: DynamicMesh) -> CsgResult<DynamicMesh> {
    csg_difference_with(a, b, &CsgConfig::default())
}

/// `a - b`
///
/// Both operands are consumed; they are cut and re-triangulated along the
/// intersection curve while the result is computed.
pub fn csg_difference_with(
    a: DynamicMesh,
    b: DynamicMesh,
    config: &CsgConfig,
) -> CsgResult<DynamicMesh> {
    csg_difference_report(a, b, config).map(|(mesh, _)| mesh)
}

/// `a - b` together with statistics about each pipeline stage
pub fn csg_difference_report(
    mut a: DynamicMesh,
    mut b: DynamicMesh,
    config: &CsgConfig,
) -> CsgResult<(DynamicMesh, CsgReport)> {
    config
        .validate()
        .map_err(|e| MeshError::InvalidArgument(e.to_string()))?;

    let fanned = triangulate_all(&mut a)? + triangulate_all(&mut b)?;
    if fanned > 0 {
        debug!(polys = fanned, "fan triangulated non-triangular input");
    }

    let (loop_a, loop_b) = find_intersections(&mut a, &mut b, config)?;
    snap_loops(&mut a, &mut b, &loop_a, &loop_b)?;

    let mut report = CsgReport {
        intersection_edges: loop_a.len(),
        ..CsgReport::default()
    };
    if !loop_a.is_empty() {
        report.retriangulated_a = triangulate_faces(&mut a, &loop_a, config.tolerance)?;
        report.retriangulated_b = triangulate_faces(&mut b, &loop_b, config.tolerance)?;
    }
    debug!(
        edges = report.intersection_edges,
        faces_a = report.retriangulated_a,
        faces_b = report.retriangulated_b,
        "cut both operands along the intersection curve"
    );

    let labels_a = classify_faces(&b, &a, &loop_b, &loop_a, config)?;
    let labels_b = classify_faces(&a, &b, &loop_a, &loop_b, config)?;
    report.classified_a = FaceTypeCounts::from_classification(&a, &labels_a);
    report.classified_b = FaceTypeCounts::from_classification(&b, &labels_b);
    report.conflicts = labels_a.conflicts + labels_b.conflicts;
    report.fallback_components = labels_a.fallback_components + labels_b.fallback_components;

    let result = assemble_difference(&a, &labels_a, &b, &labels_b)?;
    report.result_polys = result.poly_count();
    if report.result_polys > 0 && !result.represents_volume() {
        warn!(
            polys = report.result_polys,
            euler = result.euler_poincare(),
            "difference is not a closed surface"
        );
    }

    info!(
        edges = report.intersection_edges,
        conflicts = report.conflicts,
        polys = report.result_polys,
        "computed mesh difference"
    );
    Ok((result, report))
}
