// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Error types for mesh editing and boolean operations

use crate::csg::FaceType;
use crate::dynamic_mesh::PolyId;
use nalgebra::Point3;
use thiserror::Error;

/// Errors raised by the topology store and edit operations
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MeshError {
    /// An id that does not refer to a live vertex or polygon
    #[error("invalid handle: {0}")]
    InvalidHandle(String),

    /// Arguments that violate an operation's preconditions
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Errors raised by the boolean pipeline
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CsgError {
    #[error(transparent)]
    Mesh(#[from] MeshError),

    /// Re-triangulation of a cut face could not find a valid ear or loop
    #[error("triangulation of face {face} failed: {reason}")]
    TriangulationFailed {
        face: PolyId,
        reason: String,
        positions: Vec<Point3<f64>>,
    },

    /// Two local classifications of the same face disagree and the
    /// configured policy rejects the conflict
    #[error("classification of face {face} is ambiguous: {previous:?} vs {proposed:?}")]
    ClassificationAmbiguous {
        face: PolyId,
        previous: FaceType,
        proposed: FaceType,
    },
}

pub type MeshResult<T> = std::result::Result<T, MeshError>;
pub type CsgResult<T> = std::result::Result<T, CsgError>;
