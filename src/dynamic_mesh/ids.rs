// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Vertex, polygon and edge handles

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Handle of a vertex slot; recycled after removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VertexId(usize);

/// Handle of a polygon slot; recycled after removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PolyId(usize);

impl VertexId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl PolyId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl fmt::Display for PolyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// Directed pair of vertices
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeId {
    pub a: VertexId,
    pub b: VertexId,
}

impl EdgeId {
    pub fn new(a: VertexId, b: VertexId) -> Self {
        Self { a, b }
    }

    /// Endpoints must differ
    pub fn is_valid(&self) -> bool {
        self.a != self.b
    }

    pub fn inverse(&self) -> Self {
        Self::new(self.b, self.a)
    }

    /// Canonical form with the smaller id first
    pub fn ordered(&self) -> Self {
        if self.a < self.b {
            *self
        } else {
            self.inverse()
        }
    }

    pub fn has_shared_ends(&self, other: &EdgeId) -> bool {
        self.a == other.a || self.a == other.b || self.b == other.a || self.b == other.b
    }

    pub fn contains(&self, vertex: VertexId) -> bool {
        self.a == vertex || self.b == vertex
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e({}, {})", self.a.0, self.b.0)
    }
}

/// Vertex, edge or triangular face of a mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Simplex {
    Vertex(VertexId),
    Edge(EdgeId),
    Face([VertexId; 3]),
}

impl Simplex {
    /// Number of vertices: 1, 2 or 3
    pub fn size(&self) -> usize {
        match self {
            Simplex::Vertex(_) => 1,
            Simplex::Edge(_) => 2,
            Simplex::Face(_) => 3,
        }
    }

    pub fn vertices(&self) -> Vec<VertexId> {
        match self {
            Simplex::Vertex(v) => vec![*v],
            Simplex::Edge(e) => vec![e.a, e.b],
            Simplex::Face(f) => f.to_vec(),
        }
    }

    pub fn contains(&self, vertex: VertexId) -> bool {
        match self {
            Simplex::Vertex(v) => *v == vertex,
            Simplex::Edge(e) => e.contains(vertex),
            Simplex::Face(f) => f.contains(&vertex),
        }
    }

    /// Two simplices are coincident when they share at least one vertex
    pub fn coincident(&self, other: &Simplex) -> bool {
        self.vertices().into_iter().any(|v| other.contains(v))
    }

    pub fn as_vertex(&self) -> Option<VertexId> {
        match self {
            Simplex::Vertex(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_edge(&self) -> Option<EdgeId> {
        match self {
            Simplex::Edge(e) => Some(*e),
            _ => None,
        }
    }

    pub fn as_face(&self) -> Option<[VertexId; 3]> {
        match self {
            Simplex::Face(f) => Some(*f),
            _ => None,
        }
    }
}

/// Order by dimension first, then by vertex ids
impl Ord for Simplex {
    fn cmp(&self, other: &Self) -> Ordering {
        self.size()
            .cmp(&other.size())
            .then_with(|| self.vertices().cmp(&other.vertices()))
    }
}

impl PartialOrd for Simplex {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<VertexId> for Simplex {
    fn from(vertex: VertexId) -> Self {
        Simplex::Vertex(vertex)
    }
}

impl From<EdgeId> for Simplex {
    fn from(edge: EdgeId) -> Self {
        Simplex::Edge(edge)
    }
}

impl From<[VertexId; 3]> for Simplex {
    fn from(face: [VertexId; 3]) -> Self {
        Simplex::Face(face)
    }
}

impl fmt::Display for Simplex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Simplex::Vertex(v) => write!(f, "v{}", v.0),
            Simplex::Edge(e) => write!(f, "{}", e),
            Simplex::Face([a, b, c]) => write!(f, "f({}, {}, {})", a.0, b.0, c.0),
        }
    }
}

/// Pair with the larger simplex first
pub fn make_simplex_pair(a: Simplex, b: Simplex) -> (Simplex, Simplex) {
    if a < b {
        (b, a)
    } else {
        (a, b)
    }
}
