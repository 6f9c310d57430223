// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Local orthonormal frames used to flatten faces and edge neighbourhoods
//!
//! Local coordinates are `(x, y, z)` where `x` and `z` span the reference
//! plane and `y` is the height above it. `to_2d` drops the height.

use super::Triangle3;
use nalgebra::{Point2, Point3, Vector2, Vector3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    origin: Point3<f64>,
    ex: Vector3<f64>,
    ey: Vector3<f64>,
    ez: Vector3<f64>,
}

impl Projection {
    /// Frame in the plane of `tri`; `y` is the height along the triangle
    /// normal and the triangle's winding is counter-clockwise in 2D
    pub fn from_triangle(tri: &Triangle3) -> Option<Self> {
        let ey = tri.cross().try_normalize(1e-300)?;
        let ex = (tri.b - tri.a).try_normalize(1e-300)?;
        let ez = ey.cross(&ex);
        Some(Self {
            origin: tri.a,
            ex,
            ey,
            ez,
        })
    }

    /// Frame around the edge `a -> b`; `y` follows the edge, `x` points
    /// toward `third` and `x`/`z` span the plane orthogonal to the edge
    pub fn from_edge(a: &Point3<f64>, b: &Point3<f64>, third: &Point3<f64>) -> Option<Self> {
        let ey = (b - a).try_normalize(1e-300)?;
        let to_third = third - a;
        let ex = (to_third - ey * to_third.dot(&ey)).try_normalize(1e-300)?;
        let ez = ex.cross(&ey);
        Some(Self {
            origin: *a,
            ex,
            ey,
            ez,
        })
    }

    pub fn project(&self, p: &Point3<f64>) -> Point3<f64> {
        let d = p - self.origin;
        Point3::new(d.dot(&self.ex), d.dot(&self.ey), d.dot(&self.ez))
    }

    pub fn project_vector(&self, v: &Vector3<f64>) -> Vector3<f64> {
        Vector3::new(v.dot(&self.ex), v.dot(&self.ey), v.dot(&self.ez))
    }

    pub fn unproject(&self, local: &Point3<f64>) -> Point3<f64> {
        self.origin + self.ex * local.x + self.ey * local.y + self.ez * local.z
    }

    pub fn height(&self, p: &Point3<f64>) -> f64 {
        (p - self.origin).dot(&self.ey)
    }

    pub fn to_2d(&self, p: &Point3<f64>) -> Point2<f64> {
        let d = p - self.origin;
        Point2::new(d.dot(&self.ex), d.dot(&self.ez))
    }

    pub fn vector_to_2d(&self, v: &Vector3<f64>) -> Vector2<f64> {
        Vector2::new(v.dot(&self.ex), v.dot(&self.ez))
    }

    /// Point in the reference plane with the given 2D coordinates
    pub fn from_2d(&self, p: &Point2<f64>) -> Point3<f64> {
        self.origin + self.ex * p.x + self.ez * p.y
    }
}
