// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! 3D line segments

use super::BoundingBox;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Segment between two points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment3 {
    pub from: Point3<f64>,
    pub to: Point3<f64>,
}

impl Segment3 {
    pub fn new(from: Point3<f64>, to: Point3<f64>) -> Self {
        Self { from, to }
    }

    pub fn direction(&self) -> Vector3<f64> {
        self.to - self.from
    }

    pub fn length(&self) -> f64 {
        self.direction().norm()
    }

    pub fn midpoint(&self) -> Point3<f64> {
        Point3::from((self.from.coords + self.to.coords) * 0.5)
    }

    pub fn reversed(&self) -> Self {
        Self::new(self.to, self.from)
    }

    pub fn at(&self, t: f64) -> Point3<f64> {
        self.from + self.direction() * t
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&[self.from, self.to])
    }

    /// Closest point of the segment to `point`
    pub fn closest_point(&self, point: &Point3<f64>) -> Point3<f64> {
        let dir = self.direction();
        let len_sq = dir.norm_squared();
        if len_sq == 0.0 {
            return self.from;
        }
        let t = ((point - self.from).dot(&dir) / len_sq).clamp(0.0, 1.0);
        self.at(t)
    }

    pub fn distance_to_point(&self, point: &Point3<f64>) -> f64 {
        (self.closest_point(point) - point).norm()
    }

    /// Closest pair of points between two segments
    ///
    /// Returns `(on_self, on_other)`. Parallel and degenerate segments are
    /// handled by clamping the parameters to the segment ranges.
    pub fn closest_points(&self, other: &Segment3) -> (Point3<f64>, Point3<f64>) {
        let d1 = self.direction();
        let d2 = other.direction();
        let r = self.from - other.from;
        let a = d1.norm_squared();
        let e = d2.norm_squared();
        let f = d2.dot(&r);

        let (s, t) = if a == 0.0 && e == 0.0 {
            (0.0, 0.0)
        } else if a == 0.0 {
            (0.0, (f / e).clamp(0.0, 1.0))
        } else {
            let c = d1.dot(&r);
            if e == 0.0 {
                ((-c / a).clamp(0.0, 1.0), 0.0)
            } else {
                let b = d1.dot(&d2);
                let denom = a * e - b * b;
                let mut s = if denom > 0.0 {
                    ((b * f - c * e) / denom).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let mut t = (b * s + f) / e;
                if t < 0.0 {
                    t = 0.0;
                    s = (-c / a).clamp(0.0, 1.0);
                } else if t > 1.0 {
                    t = 1.0;
                    s = ((b - c) / a).clamp(0.0, 1.0);
                }
                (s, t)
            }
        };

        (self.at(s), other.at(t))
    }

    pub fn distance_to_segment(&self, other: &Segment3) -> f64 {
        let (p, q) = self.closest_points(other);
        (p - q).norm()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_point_distance() {
        let seg = Segment3::new(Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0));
        assert_relative_eq!(seg.distance_to_point(&Point3::new(1.0, 1.0, 0.0)), 1.0);
        assert_relative_eq!(seg.distance_to_point(&Point3::new(3.0, 0.0, 0.0)), 1.0);
        assert_relative_eq!(seg.distance_to_point(&Point3::new(-1.0, 0.0, 0.0)), 1.0);
    }

    #[test]
    fn test_skew_segments() {
        let a = Segment3::new(Point3::new(-1.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0));
        let b = Segment3::new(Point3::new(0.0, -1.0, 2.0), Point3::new(0.0, 1.0, 2.0));
        assert_relative_eq!(a.distance_to_segment(&b), 2.0);
    }

    #[test]
    fn test_parallel_segments() {
        let a = Segment3::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0));
        let b = Segment3::new(Point3::new(3.0, 1.0, 0.0), Point3::new(4.0, 1.0, 0.0));
        assert_relative_eq!(a.distance_to_segment(&b), (4.0f64 + 1.0).sqrt());
    }

    #[test]
    fn test_crossing_segments() {
        let a = Segment3::new(Point3::new(-1.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0));
        let b = Segment3::new(Point3::new(0.0, -1.0, 0.0), Point3::new(0.0, 1.0, 0.0));
        assert!(a.distance_to_segment(&b) < 1e-12);
    }
}
