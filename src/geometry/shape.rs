// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry of a vertex, edge or face, so distance queries can be written
//! once against any of them

use super::{Segment3, Triangle3};
use nalgebra::Point3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Point(Point3<f64>),
    Segment(Segment3),
    Triangle(Triangle3),
}

impl Shape {
    pub fn distance_to_point(&self, point: &Point3<f64>) -> f64 {
        match self {
            Shape::Point(p) => (p - point).norm(),
            Shape::Segment(s) => s.distance_to_point(point),
            Shape::Triangle(t) => t.distance_to_point(point),
        }
    }

    pub fn distance_to_segment(&self, segment: &Segment3) -> f64 {
        match self {
            Shape::Point(p) => segment.distance_to_point(p),
            Shape::Segment(s) => s.distance_to_segment(segment),
            Shape::Triangle(t) => t.distance_to_segment(segment),
        }
    }

    pub fn distance_to_shape(&self, other: &Shape) -> f64 {
        match other {
            Shape::Point(p) => self.distance_to_point(p),
            Shape::Segment(s) => self.distance_to_segment(s),
            Shape::Triangle(t) => match self {
                Shape::Point(p) => t.distance_to_point(p),
                Shape::Segment(s) => t.distance_to_segment(s),
                Shape::Triangle(own) => own.distance_to_triangle(t),
            },
        }
    }
}

impl From<Point3<f64>> for Shape {
    fn from(point: Point3<f64>) -> Self {
        Shape::Point(point)
    }
}

impl From<Segment3> for Shape {
    fn from(segment: Segment3) -> Self {
        Shape::Segment(segment)
    }
}

impl From<Triangle3> for Shape {
    fn from(triangle: Triangle3) -> Self {
        Shape::Triangle(triangle)
    }
}
