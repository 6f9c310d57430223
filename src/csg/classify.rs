// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Face classification against a reference mesh
//!
//! Faces next to the intersection curve are classified from the local
//! arrangement of the four half-faces around each curve edge. The labels
//! are then flooded across each surface without crossing the curve. Surface
//! components the curve never touches fall back to a winding-number test.

use super::{EdgeLoop, FaceType};
use crate::config::{ConflictPolicy, CsgConfig};
use crate::dynamic_mesh::{DynamicMesh, EdgeId, PolyId};
use crate::error::{CsgError, CsgResult, MeshError};
use crate::geometry::{angle_between_vectors, signed_angle, Projection, EPSILON};
use nalgebra::{Point3, Vector2, Vector3};
use std::collections::BTreeSet;
use std::f64::consts::{PI, TAU};
use tracing::{debug, warn};

/// Per-face labels of one mesh relative to another
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    labels: Vec<FaceType>,
    /// Local votes that disagreed with an earlier vote
    pub conflicts: usize,
    /// Surface components labelled by the winding-number fallback
    pub fallback_components: usize,
}

impl Classification {
    pub fn label(&self, poly: PolyId) -> FaceType {
        self.labels.get(poly.index()).copied().unwrap_or_default()
    }

    /// Labels indexed by polygon slot
    pub fn labels(&self) -> &[FaceType] {
        &self.labels
    }

    /// Live polygons of `mesh` carrying `kind`
    pub fn faces_of(&self, mesh: &DynamicMesh, kind: FaceType) -> Vec<PolyId> {
        mesh.polys()
            .into_iter()
            .filter(|&p| self.label(p) == kind)
            .collect()
    }
}

/// Propagate labels from `seeds` to unclassified neighbours
///
/// Neighbours are polygons sharing an edge; edges in `limits` (canonical
/// form) are never crossed.
pub fn flood_fill(
    mesh: &DynamicMesh,
    seeds: Vec<PolyId>,
    limits: &BTreeSet<EdgeId>,
    mut labels: Vec<FaceType>,
) -> Vec<FaceType> {
    if labels.len() < mesh.poly_id_count() {
        labels.resize(mesh.poly_id_count(), FaceType::Unclassified);
    }
    let mut stack = seeds;
    while let Some(face) = stack.pop() {
        let value = labels[face.index()];
        for edge in mesh.poly_edges(face) {
            if limits.contains(&edge.ordered()) {
                continue;
            }
            for next in mesh.polys_at_edge(edge).unwrap_or_default() {
                if labels[next.index()] == FaceType::Unclassified {
                    labels[next.index()] = value;
                    stack.push(next);
                }
            }
        }
    }
    labels
}

/// Signed angle from a face's wing to the bisector of wing and normal
///
/// Positive when the outward normal lies counter-clockwise of the wing.
fn wing_direction(wing: &Vector2<f64>, normal: &Vector2<f64>) -> Option<f64> {
    let bisector = (wing + normal).try_normalize(1e-12)?;
    Some(signed_angle(wing, &bisector))
}

/// Kind of a face lying on top of a reference face
fn coincident_kind(normal: &Vector3<f64>, reference_normal: &Vector3<f64>) -> FaceType {
    if normal.dot(reference_normal) > 0.0 {
        FaceType::Shared
    } else {
        FaceType::SharedOpposite
    }
}

/// Labels for the two classified faces around one curve edge
///
/// Returns `None` when the neighbourhood is too degenerate to measure.
fn local_votes(
    reference: &DynamicMesh,
    classified: &DynamicMesh,
    edges: (EdgeId, EdgeId),
    faces1: &[PolyId],
    faces2: &[PolyId],
    tolerance: f64,
) -> CsgResult<Option<[(PolyId, FaceType); 2]>> {
    let (edge1, edge2) = edges;
    let proj: Projection = reference.edge_projection(edge1, faces1[0])?;

    let wing = |mesh: &DynamicMesh, face: PolyId, edge: EdgeId| -> CsgResult<Option<Vector2<f64>>> {
        let other = mesh.other_vertex(face, edge)?;
        Ok(proj.to_2d(&mesh.position(other)).coords.try_normalize(1e-12))
    };
    let normal = |mesh: &DynamicMesh, face: PolyId| -> CsgResult<Vector3<f64>> {
        Ok(mesh.triangle(face)?.normal())
    };

    let (Some(w1a), Some(w1b)) = (wing(reference, faces1[0], edge1)?, wing(reference, faces1[1], edge1)?)
    else {
        return Ok(None);
    };
    let n1a = normal(reference, faces1[0])?;
    let n1b = normal(reference, faces1[1])?;
    let Some(dir) = proj
        .vector_to_2d(&n1a)
        .try_normalize(1e-12)
        .and_then(|n| wing_direction(&w1a, &n))
    else {
        return Ok(None);
    };

    // Sweep from the first wing toward the reference solid's interior
    let interior_ccw = dir < 0.0;
    let sweep = |v: &Vector2<f64>| -> f64 {
        let angle = if interior_ccw {
            angle_between_vectors(&w1a, v)
        } else {
            angle_between_vectors(v, &w1a)
        };
        if angle > TAU - tolerance {
            0.0
        } else {
            angle
        }
    };
    let wedge = sweep(&w1b);
    if wedge < tolerance || wedge > TAU - tolerance {
        return Ok(None);
    }

    let mut votes = [(faces2[0], FaceType::Unclassified); 2];
    for (vote, &face) in votes.iter_mut().zip(faces2) {
        let Some(w2) = wing(classified, face, edge2)? else {
            return Ok(None);
        };
        let alpha = sweep(&w2);
        let n2 = normal(classified, face)?;

        let value = if alpha < tolerance {
            coincident_kind(&n2, &n1a)
        } else if (alpha - wedge).abs() < tolerance {
            coincident_kind(&n2, &n1b)
        } else if alpha < wedge {
            FaceType::Inside
        } else {
            FaceType::Outside
        };
        *vote = (face, value);
    }
    Ok(Some(votes))
}

/// Solid angle of `mesh` seen from `point`, normalised to winding number
pub fn winding_number(mesh: &DynamicMesh, point: &Point3<f64>) -> f64 {
    let mut total = 0.0;
    for poly in mesh.polys() {
        let verts = mesh.poly_verts(poly);
        for i in 1..verts.len().saturating_sub(1) {
            let a = mesh.position(verts[0]) - point;
            let b = mesh.position(verts[i]) - point;
            let c = mesh.position(verts[i + 1]) - point;
            let (la, lb, lc) = (a.norm(), b.norm(), c.norm());
            let numerator = a.dot(&b.cross(&c));
            let denominator = la * lb * lc + a.dot(&b) * lc + b.dot(&c) * la + c.dot(&a) * lb;
            total += 2.0 * numerator.atan2(denominator);
        }
    }
    total / (4.0 * PI)
}

/// Label one face by probing just below and above its centroid
fn classify_by_winding(
    reference: &DynamicMesh,
    classified: &DynamicMesh,
    face: PolyId,
    tolerance: f64,
) -> CsgResult<FaceType> {
    let tri = classified.triangle(face)?;
    let normal = tri.normal();
    let centroid = tri.centroid();
    let offset = (tolerance * 10.0).max(EPSILON);

    let below = winding_number(reference, &(centroid - normal * offset)) > 0.5;
    let above = winding_number(reference, &(centroid + normal * offset)) > 0.5;
    Ok(match (below, above) {
        (true, true) => FaceType::Inside,
        (false, false) => FaceType::Outside,
        (true, false) => FaceType::Shared,
        (false, true) => FaceType::SharedOpposite,
    })
}

/// Classify every face of `classified` relative to the solid bounded by `reference`
///
/// `reference_loop` and `classified_loop` are the parallel edge loops of the
/// two meshes, after snapping and re-triangulation.
pub fn classify_faces(
    reference: &DynamicMesh,
    classified: &DynamicMesh,
    reference_loop: &EdgeLoop,
    classified_loop: &EdgeLoop,
    config: &CsgConfig,
) -> CsgResult<Classification> {
    if reference_loop.len() != classified_loop.len() {
        return Err(MeshError::InvalidArgument(format!(
            "edge loops differ in length: {} vs {}",
            reference_loop.len(),
            classified_loop.len()
        ))
        .into());
    }

    let tolerance = config.tolerance;
    let mut labels = vec![FaceType::Unclassified; classified.poly_id_count()];
    let mut seeds = Vec::new();
    let mut conflicts = 0;

    for (&(_, edge1), &(_, edge2)) in reference_loop.iter().zip(classified_loop) {
        let faces1 = reference.polys_at_edge(edge1)?;
        let faces2 = classified.polys_at_edge(edge2)?;
        if faces1.len() != 2 || faces2.len() != 2 {
            debug!(
                %edge1,
                %edge2,
                reference_faces = faces1.len(),
                classified_faces = faces2.len(),
                "skipping non-manifold curve edge"
            );
            continue;
        }

        let Some(votes) = local_votes(
            reference,
            classified,
            (edge1, edge2),
            &faces1,
            &faces2,
            tolerance,
        )?
        else {
            debug!(%edge1, "skipping degenerate curve edge");
            continue;
        };

        for (face, value) in votes {
            let previous = labels[face.index()];
            if previous != FaceType::Unclassified && previous != value {
                conflicts += 1;
                warn!(
                    %face,
                    ?previous,
                    proposed = ?value,
                    policy = ?config.conflict_policy,
                    "conflicting face classification"
                );
                match config.conflict_policy {
                    ConflictPolicy::FirstWins => continue,
                    ConflictPolicy::LastWins => {}
                    ConflictPolicy::Reject => {
                        return Err(CsgError::ClassificationAmbiguous {
                            face,
                            previous,
                            proposed: value,
                        })
                    }
                }
            }
            labels[face.index()] = value;
            seeds.push(face);
        }
    }

    let limits: BTreeSet<EdgeId> = classified_loop.iter().map(|(_, e)| e.ordered()).collect();
    labels = flood_fill(classified, seeds, &limits, labels);

    let mut fallback_components = 0;
    for poly in classified.polys() {
        if labels[poly.index()] != FaceType::Unclassified {
            continue;
        }
        labels[poly.index()] = classify_by_winding(reference, classified, poly, tolerance)?;
        labels = flood_fill(classified, vec![poly], &limits, labels);
        fallback_components += 1;
    }

    debug!(
        faces = classified.poly_count(),
        conflicts,
        fallback_components,
        "classified faces"
    );
    Ok(Classification {
        labels,
        conflicts,
        fallback_components,
    })
}
