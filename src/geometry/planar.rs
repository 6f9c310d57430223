// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! 2D helpers for work inside a projected face

use nalgebra::{Point2, Vector2};
use std::f64::consts::{PI, TAU};

pub fn cross2(a: &Vector2<f64>, b: &Vector2<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Counter-clockwise angle from `from` to `to`, in `[0, 2π)`
pub fn angle_between_vectors(from: &Vector2<f64>, to: &Vector2<f64>) -> f64 {
    let angle = cross2(from, to).atan2(from.dot(to));
    if angle < 0.0 {
        angle + TAU
    } else {
        angle
    }
}

/// Angle from `from` to `to` mapped into `(-π, π]`
pub fn signed_angle(from: &Vector2<f64>, to: &Vector2<f64>) -> f64 {
    let angle = angle_between_vectors(from, to);
    if angle > PI {
        angle - TAU
    } else {
        angle
    }
}

/// Interior angle at `cur` on the left-hand side of the path
/// `prev -> cur -> next`, in `[0, 2π)`
///
/// For a counter-clockwise polygon this is the usual interior angle.
pub fn angle_between(prev: &Point2<f64>, cur: &Point2<f64>, next: &Point2<f64>) -> f64 {
    let to_next = (next - cur).try_normalize(0.0).unwrap_or_else(Vector2::zeros);
    let to_prev = (prev - cur).try_normalize(0.0).unwrap_or_else(Vector2::zeros);
    angle_between_vectors(&to_next, &to_prev)
}

/// Signed area, positive for counter-clockwise polygons
pub fn signed_area(points: &[Point2<f64>]) -> f64 {
    let n = points.len();
    let mut sum = 0.0;
    for i in 0..n {
        let p = points[i];
        let q = points[(i + 1) % n];
        sum += p.x * q.y - q.x * p.y;
    }
    sum * 0.5
}

pub fn point_segment_distance_2d(p: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>) -> f64 {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq == 0.0 {
        return (p - a).norm();
    }
    let t = ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    (p - (a + ab * t)).norm()
}

/// Distance from `p` to the filled triangle, zero inside
pub fn point_triangle_distance_2d(p: &Point2<f64>, tri: &[Point2<f64>; 3]) -> f64 {
    let orientation = signed_area(tri).signum();
    let inside = (0..3).all(|i| {
        let a = tri[i];
        let b = tri[(i + 1) % 3];
        cross2(&(b - a), &(p - a)) * orientation >= 0.0
    });
    if inside && orientation != 0.0 {
        return 0.0;
    }
    (0..3)
        .map(|i| point_segment_distance_2d(p, &tri[i], &tri[(i + 1) % 3]))
        .fold(f64::INFINITY, f64::min)
}

/// Part of the segment `p0 -> p1` lying inside `tri`
///
/// Points up to `slack` outside an edge still count when deciding whether the
/// segment meets the triangle, but the returned endpoints never leave it.
/// Returns `None` when nothing of the segment is inside.
pub fn clip_segment_to_triangle(
    p0: &Point2<f64>,
    p1: &Point2<f64>,
    tri: &[Point2<f64>; 3],
    slack: f64,
) -> Option<(Point2<f64>, Point2<f64>)> {
    let orientation = signed_area(tri).signum();
    if orientation == 0.0 {
        return None;
    }

    let d = p1 - p0;
    let (mut t0, mut t1) = (0.0f64, 1.0f64);
    let (mut loose0, mut loose1) = (0.0f64, 1.0f64);

    for i in 0..3 {
        let a = tri[i];
        let edge = tri[(i + 1) % 3] - a;
        let len = edge.norm();
        if len == 0.0 {
            continue;
        }
        // Signed distance to the edge line is f0 + t * fd, inside when >= 0
        let f0 = cross2(&edge, &(p0 - a)) * orientation / len;
        let fd = cross2(&edge, &d) * orientation / len;

        if fd == 0.0 {
            if f0 + slack < 0.0 {
                return None;
            }
            continue;
        }
        let (t, loose) = (-f0 / fd, -(f0 + slack) / fd);
        if fd > 0.0 {
            t0 = t0.max(t);
            loose0 = loose0.max(loose);
        } else {
            t1 = t1.min(t);
            loose1 = loose1.min(loose);
        }
        if loose0 > loose1 {
            return None;
        }
    }

    if t0 > t1 {
        // Grazes a corner within the slack
        let t = (0.5 * (t0 + t1)).clamp(0.0, 1.0);
        let p = p0 + d * t;
        return Some((p, p));
    }
    Some((p0 + d * t0, p0 + d * t1))
}
