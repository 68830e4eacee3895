// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Working plane shared by a source/target face pair.

use nalgebra::{Point2, Point3, Vector3};

/// An orthonormal 2D frame embedded in 3D.
#[derive(Debug, Clone, Copy)]
pub struct WorkingPlane {
    pub origin: Point3<f64>,
    pub normal: Vector3<f64>,
    pub u_axis: Vector3<f64>,
    pub v_axis: Vector3<f64>,
}

impl WorkingPlane {
    /// Builds a right-handed frame (`u × v = normal`) through `origin`.
    ///
    /// `normal` must be a unit vector.
    pub fn new(origin: Point3<f64>, normal: Vector3<f64>) -> Self {
        // Axis least parallel to the normal gives the most stable cross product
        let reference = if normal.x.abs() <= normal.y.abs() && normal.x.abs() <= normal.z.abs() {
            Vector3::x()
        } else if normal.y.abs() <= normal.z.abs() {
            Vector3::y()
        } else {
            Vector3::z()
        };

        let u_axis = reference.cross(&normal).normalize();
        let v_axis = normal.cross(&u_axis);

        Self {
            origin,
            normal,
            u_axis,
            v_axis,
        }
    }

    /// Projects a point orthogonally into plane coordinates.
    #[inline]
    pub fn project(&self, p: &Point3<f64>) -> Point2<f64> {
        let v = p - self.origin;
        Point2::new(v.dot(&self.u_axis), v.dot(&self.v_axis))
    }

    /// Maps plane coordinates back to the 3D point on the plane.
    #[inline]
    pub fn lift(&self, q: &Point2<f64>) -> Point3<f64> {
        self.origin + self.u_axis * q.x + self.v_axis * q.y
    }

    /// Projects a loop of points.
    pub fn project_all(&self, points: &[Point3<f64>]) -> Vec<Point2<f64>> {
        points.iter().map(|p| self.project(p)).collect()
    }
}
