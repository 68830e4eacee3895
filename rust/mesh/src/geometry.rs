// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometric helpers for polygon loops in 3D.
//!
//! All functions work on point loops as stored in a patch face: the loop is
//! implicitly closed and may be convex or concave.

use nalgebra::{Point3, Vector3};

/// Computes the area-weighted polygon normal using Newell's method.
///
/// The returned vector is not normalized: its length is twice the polygon
/// area and its direction follows the right-hand rule of the loop winding.
pub fn newell_normal(points: &[Point3<f64>]) -> Vector3<f64> {
    let mut normal = Vector3::zeros();
    let n = points.len();

    for i in 0..n {
        let curr = &points[i];
        let next = &points[(i + 1) % n];

        normal.x += (curr.y - next.y) * (curr.z + next.z);
        normal.y += (curr.z - next.z) * (curr.x + next.x);
        normal.z += (curr.x - next.x) * (curr.y + next.y);
    }

    normal
}

/// Returns the unit normal of a loop, or `None` for a collapsed loop.
pub fn unit_normal(points: &[Point3<f64>]) -> Option<Vector3<f64>> {
    let normal = newell_normal(points);
    let len = normal.norm();
    if len < 1e-300 || !len.is_finite() {
        return None;
    }
    Some(normal / len)
}

/// Computes the (unsigned) area of a polygon loop.
pub fn polygon_area(points: &[Point3<f64>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    newell_normal(points).norm() * 0.5
}

/// Computes the vertex-average centroid of a loop.
pub fn centroid(points: &[Point3<f64>]) -> Point3<f64> {
    if points.is_empty() {
        return Point3::origin();
    }
    let mut sum = Vector3::zeros();
    for p in points {
        sum += p.coords;
    }
    Point3::from(sum / points.len() as f64)
}

/// Largest distance of any loop point from the plane through `origin` with
/// unit normal `normal`.
pub fn max_plane_deviation(
    points: &[Point3<f64>],
    origin: &Point3<f64>,
    normal: &Vector3<f64>,
) -> f64 {
    points
        .iter()
        .map(|p| (p - origin).dot(normal).abs())
        .fold(0.0, f64::max)
}

/// Parameter of the orthogonal projection of `p` onto the line `a → b`.
///
/// `0` at `a`, `1` at `b`. A zero-length segment yields `0`.
pub fn segment_parameter(a: &Point3<f64>, b: &Point3<f64>, p: &Point3<f64>) -> f64 {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq <= 0.0 {
        return 0.0;
    }
    (p - a).dot(&ab) / len_sq
}

/// Axis-aligned bounding box in 3D.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl BoundingBox {
    /// Creates an empty (inverted) box suitable for expansion.
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Creates the bounding box of a set of points.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3<f64>>) -> Self {
        let mut bb = Self::empty();
        for p in points {
            bb.include(p);
        }
        bb
    }

    /// Expands the box to include a point.
    pub fn include(&mut self, p: &Point3<f64>) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }

    /// Grows the box by `margin` in every direction.
    pub fn expanded(&self, margin: f64) -> Self {
        let m = Vector3::repeat(margin);
        Self {
            min: self.min - m,
            max: self.max + m,
        }
    }

    /// Tests if two boxes overlap (touching counts as overlap).
    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Length of the box diagonal, `0` for an empty box.
    pub fn diagonal(&self) -> f64 {
        if self.min.x > self.max.x {
            return 0.0;
        }
        (self.max - self.min).norm()
    }
}
