// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Re-triangulation of faces cut by an intersection curve
//!
//! Each cut face is flattened into its own plane. Its boundary, split at
//! every intersection vertex lying on it, and the cutting edges inside it
//! form a planar graph. That graph is bridged until connected, traced into
//! simple polygons and ear-clipped.

use super::EdgeLoop;
use crate::dynamic_mesh::{DynamicMesh, EdgeId, PolyId, VertexId};
use crate::error::{CsgError, CsgResult};
use crate::geometry::{angle_between, point_triangle_distance_2d, Projection, Segment3, EPSILON};
use nalgebra::Point2;
use std::collections::{BTreeMap, BTreeSet};
use std::f64::consts::PI;
use tracing::{debug, trace};

/// Outgoing edges per vertex of a face's planar graph
pub type EdgeGraph = BTreeMap<VertexId, Vec<EdgeId>>;

#[derive(Debug, Default)]
struct FaceEdgeInfo {
    edges: Vec<EdgeId>,
    /// Intersection vertices on the face boundary, with the edge index they split
    border_verts: BTreeMap<VertexId, usize>,
}

type FaceEdgeMap = BTreeMap<PolyId, FaceEdgeInfo>;

fn triangulation_failed(mesh: &DynamicMesh, face: PolyId, reason: impl Into<String>) -> CsgError {
    CsgError::TriangulationFailed {
        face,
        reason: reason.into(),
        positions: mesh
            .poly_vertices(face)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|v| mesh.point(v).ok())
            .collect(),
    }
}

/// Index of the edge of `face` that `vert` lies on, if any
fn find_closest_edge(
    mesh: &DynamicMesh,
    face: PolyId,
    vert: VertexId,
    tolerance: f64,
) -> Option<usize> {
    if mesh.poly_verts(face).contains(&vert) {
        return None;
    }
    let point = mesh.position(vert);
    let (index, dist) = mesh
        .poly_edges(face)
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let seg = Segment3::new(mesh.position(e.a), mesh.position(e.b));
            (i, seg.distance_to_point(&point))
        })
        .min_by(|x, y| x.1.total_cmp(&y.1))?;
    (dist < tolerance).then_some(index)
}

/// Register `vert` as a boundary split of `face` and of the face across that edge
fn update_border_vert(
    mesh: &DynamicMesh,
    map: &mut FaceEdgeMap,
    face: PolyId,
    vert: VertexId,
    tolerance: f64,
) -> CsgResult<()> {
    let Some(index) = find_closest_edge(mesh, face, vert, tolerance) else {
        return Ok(());
    };
    map.entry(face).or_default().border_verts.insert(vert, index);

    let edge = mesh.poly_edge(face, index)?;
    for other in mesh.polys_at_edge(edge)? {
        if other == face {
            continue;
        }
        let other_index = mesh
            .poly_edge_index(other, edge.inverse())
            .or_else(|| mesh.poly_edge_index(other, edge));
        if let Some(other_index) = other_index {
            map.entry(other).or_default().border_verts.insert(vert, other_index);
        }
    }
    Ok(())
}

/// Drop repeated edges, treating an edge and its inverse as equal
fn make_edges_unique(edges: &[EdgeId]) -> Vec<EdgeId> {
    let mut seen = BTreeSet::new();
    edges
        .iter()
        .copied()
        .filter(|e| seen.insert(e.ordered()))
        .collect()
}

/// Split vertices ordered by distance from `edge.a`
fn sort_edge_verts(mesh: &DynamicMesh, edge: EdgeId, splits: &[VertexId]) -> Vec<VertexId> {
    let origin = mesh.position(edge.a);
    let mut keyed: Vec<(f64, VertexId)> = splits
        .iter()
        .map(|&v| ((mesh.position(v) - origin).norm_squared(), v))
        .collect();
    keyed.sort_by(|x, y| x.0.total_cmp(&y.0).then(x.1.cmp(&y.1)));
    keyed.into_iter().map(|(_, v)| v).collect()
}

fn flat(mesh: &DynamicMesh, proj: &Projection, vert: VertexId) -> Point2<f64> {
    proj.to_2d(&mesh.position(vert))
}

fn angle_at(
    mesh: &DynamicMesh,
    proj: &Projection,
    prev: VertexId,
    cur: VertexId,
    next: VertexId,
) -> f64 {
    angle_between(&flat(mesh, proj, prev), &flat(mesh, proj, cur), &flat(mesh, proj, next))
}

fn compute_angles(mesh: &DynamicMesh, proj: &Projection, verts: &[VertexId]) -> Vec<f64> {
    let count = verts.len();
    (0..count)
        .map(|n| {
            let prev = verts[(n + count - 1) % count];
            let next = verts[(n + 1) % count];
            angle_at(mesh, proj, prev, verts[n], next)
        })
        .collect()
}

fn edge_segment(mesh: &DynamicMesh, edge: EdgeId) -> Segment3 {
    Segment3::new(mesh.position(edge.a), mesh.position(edge.b))
}

/// Smallest distance from `bridge` to any graph edge not touching its ends
fn bridge_clearance(mesh: &DynamicMesh, graph: &EdgeGraph, bridge: EdgeId) -> f64 {
    let seg = edge_segment(mesh, bridge);
    graph
        .values()
        .flatten()
        .filter(|e| !e.has_shared_ends(&bridge))
        .map(|e| seg.distance_to_segment(&edge_segment(mesh, *e)))
        .fold(f64::INFINITY, f64::min)
}

fn reachable(graph: &EdgeGraph) -> BTreeSet<VertexId> {
    let mut visited = BTreeSet::new();
    let Some(&first) = graph.keys().next() else {
        return visited;
    };
    let mut stack = vec![first];
    while let Some(vert) = stack.pop() {
        if !visited.insert(vert) {
            continue;
        }
        for edge in graph.get(&vert).into_iter().flatten() {
            stack.push(if edge.a == vert { edge.b } else { edge.a });
        }
    }
    visited
}

/// Undirected neighbours of every vertex in the graph
fn neighbours(graph: &EdgeGraph) -> BTreeMap<VertexId, BTreeSet<VertexId>> {
    let mut out: BTreeMap<VertexId, BTreeSet<VertexId>> = BTreeMap::new();
    for edge in graph.values().flatten() {
        out.entry(edge.a).or_default().insert(edge.b);
        out.entry(edge.b).or_default().insert(edge.a);
    }
    out
}

/// Bridge from a `visited` vertex to an unvisited one keeping the most
/// clearance from existing edges
///
/// Greedy: the first pair (in vertex order) with the largest clearance wins.
/// Returns the bridge and its clearance.
pub fn find_best_bridge(
    mesh: &DynamicMesh,
    graph: &EdgeGraph,
    visited: &BTreeSet<VertexId>,
) -> Option<(EdgeId, f64)> {
    let mut best: Option<(EdgeId, f64)> = None;
    for &from in graph.keys().filter(|v| visited.contains(v)) {
        for &to in graph.keys().filter(|v| !visited.contains(v)) {
            let bridge = EdgeId::new(from, to);
            let clearance = bridge_clearance(mesh, graph, bridge);
            if clearance > best.map_or(0.0, |(_, d)| d) {
                best = Some((bridge, clearance));
            }
        }
    }
    best
}

fn insert_both_ways(graph: &mut EdgeGraph, edge: EdgeId) {
    graph.entry(edge.a).or_default().push(edge);
    graph.entry(edge.b).or_default().push(edge.inverse());
}

/// Connect the graph and link dangling vertices
fn add_bridges(mesh: &DynamicMesh, face: PolyId, graph: &mut EdgeGraph) -> CsgResult<()> {
    loop {
        let visited = reachable(graph);
        if visited.len() == graph.len() {
            break;
        }
        let Some((bridge, clearance)) = find_best_bridge(mesh, graph, &visited) else {
            return Err(triangulation_failed(mesh, face, "no bridge between components"));
        };
        if clearance < EPSILON {
            return Err(triangulation_failed(
                mesh,
                face,
                format!("bridge {} too close to existing edges", bridge),
            ));
        }
        trace!(%face, %bridge, clearance, "adding bridge");
        insert_both_ways(graph, bridge);
    }

    loop {
        let links = neighbours(graph);
        let Some((&dangling, linked)) = links.iter().find(|(_, n)| n.len() == 1) else {
            break;
        };
        let best = graph
            .keys()
            .filter(|&&v| v != dangling && !linked.contains(&v))
            .map(|&v| {
                let bridge = EdgeId::new(dangling, v);
                (bridge, bridge_clearance(mesh, graph, bridge))
            })
            .fold(None, |best: Option<(EdgeId, f64)>, (bridge, clearance)| {
                match best {
                    Some((_, d)) if d >= clearance => best,
                    _ => Some((bridge, clearance)),
                }
            });
        match best {
            Some((bridge, clearance)) if clearance >= EPSILON => {
                trace!(%face, %bridge, clearance, "linking dangling vertex");
                insert_both_ways(graph, bridge);
            }
            _ => {
                return Err(triangulation_failed(
                    mesh,
                    face,
                    format!("cannot link dangling vertex {}", dangling),
                ))
            }
        }
    }
    Ok(())
}

/// Decompose a face's boundary and inside edges into closed simple polygons
///
/// `boundary` edges are directed along the face winding, `inside` edges are
/// used in both directions. The walk always takes the sharpest left turn,
/// so every polygon comes out with the face's winding.
pub fn find_simple_polygons(
    mesh: &DynamicMesh,
    face: PolyId,
    boundary: &[EdgeId],
    inside: &[EdgeId],
    proj: &Projection,
) -> CsgResult<Vec<Vec<EdgeId>>> {
    let mut graph = EdgeGraph::new();
    for &edge in boundary {
        graph.entry(edge.a).or_default().push(edge);
    }
    for &edge in inside {
        insert_both_ways(&mut graph, edge);
    }
    add_bridges(mesh, face, &mut graph)?;

    let total: usize = graph.values().map(Vec::len).sum();
    let mut out = Vec::new();

    while let Some(mut entry) = graph.first_entry() {
        let Some(start) = entry.get_mut().pop() else {
            entry.remove();
            continue;
        };
        if entry.get().is_empty() {
            entry.remove();
        }

        let mut polygon = vec![start];
        loop {
            let last = polygon[polygon.len() - 1];
            let current = last.b;
            let Some(candidates) = graph.get_mut(&current) else {
                if current == start.a {
                    break;
                }
                return Err(triangulation_failed(
                    mesh,
                    face,
                    format!("polygon from {} ends at {}", start, current),
                ));
            };

            let mut best: Option<(f64, usize)> = None;
            for (i, edge) in candidates.iter().enumerate() {
                if edge.b == last.a {
                    continue;
                }
                let angle = angle_at(mesh, proj, last.a, current, edge.b);
                if best.map_or(true, |(a, _)| angle < a) {
                    best = Some((angle, i));
                }
            }

            if current == start.a && last.a != start.b {
                let closing = angle_at(mesh, proj, last.a, current, start.b);
                if best.map_or(true, |(a, _)| closing < a) {
                    break;
                }
            }

            let Some((_, index)) = best else {
                return Err(triangulation_failed(
                    mesh,
                    face,
                    format!("no way forward from {}", current),
                ));
            };
            let edge = candidates.swap_remove(index);
            if candidates.is_empty() {
                graph.remove(&current);
            }
            polygon.push(edge);

            if polygon.len() > total + 1 {
                return Err(triangulation_failed(mesh, face, "polygon does not close"));
            }
        }
        out.push(polygon);
    }

    Ok(out)
}

/// Ear-clip a closed polygon given as a chain of edges
///
/// At every step the sharpest convex vertex whose ear holds no other
/// polygon vertex is cut off. Triangles keep the polygon's winding.
pub fn triangulate_simple_polygon(
    mesh: &DynamicMesh,
    face: PolyId,
    edges: &[EdgeId],
    proj: &Projection,
) -> CsgResult<Vec<[VertexId; 3]>> {
    let count = edges.len();
    if count < 3 {
        return Err(triangulation_failed(
            mesh,
            face,
            format!("polygon with {} edges", count),
        ));
    }
    for (i, edge) in edges.iter().enumerate() {
        if edge.b != edges[(i + 1) % count].a {
            return Err(triangulation_failed(mesh, face, "edges do not form a chain"));
        }
    }

    let mut verts: Vec<VertexId> = edges.iter().map(|e| e.a).collect();
    let expected = PI * (count as f64 - 2.0);
    let angle_sum: f64 = compute_angles(mesh, proj, &verts).iter().sum();
    if (angle_sum - expected).abs() > 0.01 {
        verts.reverse();
        let reversed_sum: f64 = compute_angles(mesh, proj, &verts).iter().sum();
        if (reversed_sum - expected).abs() > 0.01 {
            return Err(triangulation_failed(mesh, face, "polygon is not simple"));
        }
    }

    let mut out = Vec::with_capacity(count - 2);
    while out.len() + 2 < count {
        let angles = compute_angles(mesh, proj, &verts);
        let n = verts.len();

        let mut best: Option<(usize, [VertexId; 3])> = None;
        let mut best_angle = PI - EPSILON;
        for i in 0..n {
            if angles[i] > best_angle {
                continue;
            }
            let prev = verts[(i + n - 1) % n];
            let cur = verts[i];
            let next = verts[(i + 1) % n];
            let ear = [
                flat(mesh, proj, prev),
                flat(mesh, proj, cur),
                flat(mesh, proj, next),
            ];

            let clearance = verts
                .iter()
                .filter(|v| ![prev, cur, next].contains(v))
                .map(|&v| point_triangle_distance_2d(&flat(mesh, proj, v), &ear))
                .fold(f64::INFINITY, f64::min);

            if clearance > EPSILON {
                best = Some((i, [prev, cur, next]));
                best_angle = angles[i];
            }
        }

        let Some((index, ear)) = best else {
            return Err(triangulation_failed(mesh, face, "no valid ear"));
        };
        out.push(ear);
        verts.remove(index);
    }
    Ok(out)
}

fn triangulate_face(
    mesh: &DynamicMesh,
    face: PolyId,
    boundary: &[EdgeId],
    inside: &[EdgeId],
) -> CsgResult<Vec<[VertexId; 3]>> {
    let proj = Projection::from_triangle(&mesh.triangle(face)?)
        .ok_or_else(|| triangulation_failed(mesh, face, "degenerate face"))?;

    let mut out = Vec::new();
    for polygon in find_simple_polygons(mesh, face, boundary, inside, &proj)? {
        out.extend(triangulate_simple_polygon(mesh, face, &polygon, &proj)?);
    }
    Ok(out)
}

/// Replace every face touched by `edge_loop` with triangles that contain
/// the loop's edges
///
/// Faces that only have a loop vertex on one of their edges are split too.
/// New triangles inherit the value of the face they replace. Returns the
/// number of faces replaced.
pub fn triangulate_faces(
    mesh: &mut DynamicMesh,
    edge_loop: &EdgeLoop,
    tolerance: f64,
) -> CsgResult<usize> {
    let mut map = FaceEdgeMap::new();
    for &(face, edge) in edge_loop {
        mesh.check_poly(face)?;
        map.entry(face).or_default().edges.push(edge);
        update_border_vert(mesh, &mut map, face, edge.a, tolerance)?;
        update_border_vert(mesh, &mut map, face, edge.b, tolerance)?;
    }

    let mut removed = Vec::with_capacity(map.len());
    let mut created: Vec<([VertexId; 3], i32)> = Vec::new();

    for (&face, info) in &map {
        let face_edges = mesh.poly_edges(face);
        if face_edges.len() != 3 {
            return Err(triangulation_failed(mesh, face, "face is not a triangle"));
        }

        let mut edge_verts: [Vec<VertexId>; 3] = Default::default();
        for (&vert, &index) in &info.border_verts {
            edge_verts[index].push(vert);
        }

        let mut boundary = Vec::new();
        for (edge, splits) in face_edges.iter().zip(&edge_verts) {
            if splits.is_empty() {
                boundary.push(*edge);
                continue;
            }
            let splits = sort_edge_verts(mesh, *edge, splits);
            let mut prev = edge.a;
            for &split in &splits {
                boundary.push(EdgeId::new(prev, split));
                prev = split;
            }
            boundary.push(EdgeId::new(prev, edge.b));
        }

        for (verts, edge) in edge_verts.iter_mut().zip(&face_edges) {
            verts.extend([edge.a, edge.b]);
        }
        let inside: Vec<EdgeId> = make_edges_unique(&info.edges)
            .into_iter()
            .filter(|e| {
                !edge_verts
                    .iter()
                    .any(|verts| verts.contains(&e.a) && verts.contains(&e.b))
            })
            .map(|e| e.ordered())
            .collect();

        let triangles = triangulate_face(mesh, face, &boundary, &inside)?;
        trace!(
            %face,
            boundary = boundary.len(),
            inside = inside.len(),
            triangles = triangles.len(),
            "retriangulated face"
        );
        let value = mesh.value(face)?;
        removed.push(face);
        created.extend(triangles.into_iter().map(|t| (t, value)));
    }

    for &face in &removed {
        mesh.remove_poly(face)?;
    }
    for (tri, value) in created {
        mesh.add_poly(&tri, value)?;
    }

    debug!(faces = removed.len(), "retriangulated cut faces");
    Ok(removed.len())
}
