// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! dynmesh
//!
//! An indexed, mutable polygon mesh with stable vertex and polygon ids,
//! adjacency queries and welding, plus a boolean difference pipeline that
//! cuts two surfaces along their intersection curve and reassembles the
//! result.

pub mod cli;
pub mod config;
pub mod csg;
pub mod dynamic_mesh;
pub mod error;
pub mod geometry;
pub mod io;

pub use config::{ConflictPolicy, CsgConfig};
pub use csg::{csg_difference, csg_difference_report, csg_difference_with, CsgReport, FaceType};
pub use dynamic_mesh::{DynamicMesh, EdgeId, PolyId, Simplex, VertexId, WeldStats};
pub use error::{CsgError, MeshError};
pub use geometry::{analyze, Mesh, Primitive, DEFAULT_TOLERANCE, EPSILON};
pub use io::{export_stl, import_stl};
