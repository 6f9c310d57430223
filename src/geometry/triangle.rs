// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! 3D triangles and their distance queries

use super::{BoundingBox, Segment3};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Triangle given by its three corner positions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Triangle3 {
    pub a: Point3<f64>,
    pub b: Point3<f64>,
    pub c: Point3<f64>,
}

impl Triangle3 {
    pub fn new(a: Point3<f64>, b: Point3<f64>, c: Point3<f64>) -> Self {
        Self { a, b, c }
    }

    pub fn points(&self) -> [Point3<f64>; 3] {
        [self.a, self.b, self.c]
    }

    pub fn edges(&self) -> [Segment3; 3] {
        [
            Segment3::new(self.a, self.b),
            Segment3::new(self.b, self.c),
            Segment3::new(self.c, self.a),
        ]
    }

    /// Non-normalized normal; its length is twice the area
    pub fn cross(&self) -> Vector3<f64> {
        (self.b - self.a).cross(&(self.c - self.a))
    }

    /// Unit normal, zero for degenerate triangles
    pub fn normal(&self) -> Vector3<f64> {
        self.cross().try_normalize(0.0).unwrap_or_else(Vector3::zeros)
    }

    pub fn area(&self) -> f64 {
        self.cross().norm() * 0.5
    }

    pub fn centroid(&self) -> Point3<f64> {
        Point3::from((self.a.coords + self.b.coords + self.c.coords) / 3.0)
    }

    pub fn reversed(&self) -> Self {
        Self::new(self.a, self.c, self.b)
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.points())
    }

    /// Closest point on the triangle, computed by Voronoi region tests
    pub fn closest_point(&self, p: &Point3<f64>) -> Point3<f64> {
        let (a, b, c) = (self.a, self.b, self.c);
        let ab = b - a;
        let ac = c - a;
        let ap = p - a;

        let d1 = ab.dot(&ap);
        let d2 = ac.dot(&ap);
        if d1 <= 0.0 && d2 <= 0.0 {
            return a;
        }

        let bp = p - b;
        let d3 = ab.dot(&bp);
        let d4 = ac.dot(&bp);
        if d3 >= 0.0 && d4 <= d3 {
            return b;
        }

        let vc = d1 * d4 - d3 * d2;
        if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
            let v = d1 / (d1 - d3);
            return a + ab * v;
        }

        let cp = p - c;
        let d5 = ab.dot(&cp);
        let d6 = ac.dot(&cp);
        if d6 >= 0.0 && d5 <= d6 {
            return c;
        }

        let vb = d5 * d2 - d1 * d6;
        if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
            let w = d2 / (d2 - d6);
            return a + ac * w;
        }

        let va = d3 * d6 - d5 * d4;
        if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
            let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
            return b + (c - b) * w;
        }

        let denom = va + vb + vc;
        if denom == 0.0 {
            // Degenerate triangle: fall back to the closest edge point
            return self
                .edges()
                .iter()
                .map(|e| e.closest_point(p))
                .min_by(|x, y| (x - p).norm_squared().total_cmp(&(y - p).norm_squared()))
                .unwrap_or(a);
        }
        let v = vb / denom;
        let w = vc / denom;
        a + ab * v + ac * w
    }

    pub fn distance_to_point(&self, p: &Point3<f64>) -> f64 {
        (self.closest_point(p) - p).norm()
    }

    /// Segment crossing test (Möller-Trumbore without culling)
    pub fn intersects_segment(&self, segment: &Segment3) -> bool {
        let dir = segment.direction();
        let e1 = self.b - self.a;
        let e2 = self.c - self.a;
        let h = dir.cross(&e2);
        let det = e1.dot(&h);
        if det.abs() < 1e-14 {
            return false;
        }
        let inv = 1.0 / det;
        let s = segment.from - self.a;
        let u = inv * s.dot(&h);
        if !(0.0..=1.0).contains(&u) {
            return false;
        }
        let q = s.cross(&e1);
        let v = inv * dir.dot(&q);
        if v < 0.0 || u + v > 1.0 {
            return false;
        }
        let t = inv * e2.dot(&q);
        (0.0..=1.0).contains(&t)
    }

    pub fn distance_to_segment(&self, segment: &Segment3) -> f64 {
        if self.intersects_segment(segment) {
            return 0.0;
        }
        let mut dist = self
            .distance_to_point(&segment.from)
            .min(self.distance_to_point(&segment.to));
        for edge in self.edges() {
            dist = dist.min(edge.distance_to_segment(segment));
        }
        dist
    }

    pub fn distance_to_triangle(&self, other: &Triangle3) -> f64 {
        let mut dist = f64::INFINITY;
        for edge in other.edges() {
            dist = dist.min(self.distance_to_segment(&edge));
        }
        for edge in self.edges() {
            dist = dist.min(other.distance_to_segment(&edge));
        }
        dist
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit() -> Triangle3 {
        Triangle3::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        )
    }

    #[test]
    fn test_normal_and_area() {
        let tri = unit();
        assert_relative_eq!(tri.normal(), Vector3::new(0.0, 0.0, 1.0));
        assert_relative_eq!(tri.area(), 0.5);
        assert_relative_eq!(tri.reversed().normal(), Vector3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn test_closest_point_regions() {
        let tri = unit();
        assert_relative_eq!(tri.distance_to_point(&Point3::new(0.25, 0.25, 2.0)), 2.0);
        assert_relative_eq!(tri.distance_to_point(&Point3::new(-1.0, -1.0, 0.0)), 2f64.sqrt());
        assert_relative_eq!(tri.distance_to_point(&Point3::new(0.5, -1.0, 0.0)), 1.0);
        assert_relative_eq!(tri.distance_to_point(&Point3::new(1.0, 1.0, 0.0)), 0.5f64.sqrt());
    }

    #[test]
    fn test_segment_distance() {
        let tri = unit();
        let crossing = Segment3::new(Point3::new(0.2, 0.2, -1.0), Point3::new(0.2, 0.2, 1.0));
        assert_eq!(tri.distance_to_segment(&crossing), 0.0);

        let above = Segment3::new(Point3::new(0.0, 0.0, 3.0), Point3::new(1.0, 1.0, 3.0));
        assert_relative_eq!(tri.distance_to_segment(&above), 3.0);
    }
}
