// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Topological predicates and connected components

use super::{DynamicMesh, EdgeId, PolyId};
use ahash::{AHashMap, AHashSet};

impl DynamicMesh {
    /// Every live polygon is a triangle
    pub fn is_triangular(&self) -> bool {
        self.polys().into_iter().all(|p| self.poly_verts(p).len() == 3)
    }

    /// `V - E + F` over the live vertices, edges and polygons
    pub fn euler_poincare(&self) -> i64 {
        self.vertex_count() as i64 - self.edges().len() as i64 + self.poly_count() as i64
    }

    /// Each directed edge of `polys` is used once and its inverse once
    pub fn is_closed_orientable_surface(&self, polys: &[PolyId]) -> bool {
        if polys.is_empty() {
            return false;
        }
        let mut directed: AHashMap<EdgeId, usize> = AHashMap::new();
        for &poly in polys {
            if !self.is_valid_poly(poly) {
                return false;
            }
            for edge in self.poly_edges(poly) {
                *directed.entry(edge).or_insert(0) += 1;
            }
        }
        directed
            .iter()
            .all(|(edge, &count)| count == 1 && directed.get(&edge.inverse()) == Some(&1))
    }

    /// Every connected surface of the mesh is closed and orientable
    pub fn represents_volume(&self) -> bool {
        let surfaces = self.separate_surfaces();
        !surfaces.is_empty()
            && surfaces
                .iter()
                .all(|surface| self.is_closed_orientable_surface(surface))
    }

    /// Polygons reachable from `poly` across shared edges, sorted
    pub fn select_surface(&self, poly: PolyId) -> Vec<PolyId> {
        if !self.is_valid_poly(poly) {
            return Vec::new();
        }
        let mut visited: AHashSet<PolyId> = AHashSet::new();
        let mut stack = vec![poly];
        visited.insert(poly);

        while let Some(current) = stack.pop() {
            for edge in self.poly_edges(current) {
                for next in self.edge_polys(edge) {
                    if visited.insert(next) {
                        stack.push(next);
                    }
                }
            }
        }

        let mut out: Vec<PolyId> = visited.into_iter().collect();
        out.sort_unstable();
        out
    }

    /// Edge-connected components, ordered by their smallest polygon id
    pub fn separate_surfaces(&self) -> Vec<Vec<PolyId>> {
        let mut assigned: AHashSet<PolyId> = AHashSet::new();
        let mut out = Vec::new();
        for poly in self.polys() {
            if assigned.contains(&poly) {
                continue;
            }
            let surface = self.select_surface(poly);
            assigned.extend(surface.iter().copied());
            out.push(surface);
        }
        out
    }
}
