// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry module - plain meshes, primitives and the math used by the
//! topology store and boolean pipeline

mod analytics;
mod bbox;
mod mesh;
mod planar;
mod primitives;
mod projection;
mod segment;
mod shape;
mod triangle;

pub use analytics::{analyze, GeometryStats};
pub use bbox::BoundingBox;
pub use mesh::{Mesh, Triangle, Vertex};
pub use planar::{
    angle_between, angle_between_vectors, clip_segment_to_triangle, cross2,
    point_segment_distance_2d, point_triangle_distance_2d, signed_angle, signed_area,
};
pub use primitives::Primitive;
pub use projection::Projection;
pub use segment::Segment3;
pub use shape::Shape;
pub use triangle::Triangle3;

/// Default comparison epsilon for geometric predicates
pub const EPSILON: f64 = 1e-6;

/// Default tolerance of the boolean pipeline
pub const DEFAULT_TOLERANCE: f64 = 1e-5;
