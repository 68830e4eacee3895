// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Orientation and consistency pass.
//!
//! Runs once after assembly. Every face is measured in the plane of its
//! source face, where the clipper produced it counter-clockwise. Faces that
//! lost their area, turned over or started crossing themselves through
//! point merging are removed and recorded. Surviving faces are then wound
//! to the configured convention, orphan points are dropped and every table
//! is renumbered.

use nalgebra::{Point2, Point3, Vector3};
use patchx_mesh::{geometry, PatchSurface};
use rustc_hash::FxHashSet;

use crate::assemble::Assembled;
use crate::diagnostics::{RemovalReason, RemovedFace};
use crate::plane::WorkingPlane;
use crate::polygon;

/// Measurement of one face loop in its source plane.
struct FaceCheck {
    area: f64,
    threshold: f64,
    self_intersecting: bool,
}

fn check_face(points: &[Point3<f64>], loop_: &[usize], normal: Vector3<f64>, tol: f64) -> FaceCheck {
    let coords: Vec<Point3<f64>> = loop_.iter().map(|&i| points[i]).collect();
    let plane = WorkingPlane::new(geometry::centroid(&coords), normal);
    let flat: Vec<Point2<f64>> = plane.project_all(&coords);

    FaceCheck {
        area: polygon::signed_area(&flat),
        threshold: 0.5 * tol * polygon::perimeter(&flat),
        self_intersecting: polygon::is_self_intersecting(&flat),
    }
}

/// Removes invalid faces, orients the rest and compacts the mesh.
pub(crate) fn finalize<S, T>(
    mut mesh: Assembled,
    src: &S,
    tgt: &T,
    tolerance: f64,
    orient_to_source: bool,
) -> Assembled
where
    S: PatchSurface + ?Sized,
    T: PatchSurface + ?Sized,
{
    let n_faces = mesh.faces.len();
    let mut face_map: Vec<Option<usize>> = vec![None; n_faces];
    let mut kept_faces: Vec<Vec<usize>> = Vec::with_capacity(n_faces);

    for (f, face) in mesh.faces.iter().enumerate() {
        let src_face = mesh.src.face_of_face[f];
        let tgt_face = mesh.tgt.face_of_face[f];

        // A source face without a normal has no orientation to check against
        let (reason, area) = match geometry::unit_normal(&src.face_points(src_face)) {
            None => (Some(RemovalReason::Collapsed), 0.0),
            Some(src_normal) => {
                let check = check_face(&mesh.points, face, src_normal, tolerance);
                let reason = if check.area.abs() <= check.threshold {
                    Some(RemovalReason::Collapsed)
                } else if check.area < 0.0 {
                    Some(RemovalReason::Inverted)
                } else if check.self_intersecting {
                    Some(RemovalReason::SelfIntersecting)
                } else {
                    None
                };
                (reason, check.area)
            }
        };

        if let Some(reason) = reason {
            tracing::debug!(src_face, tgt_face, ?reason, area, "Removing face");
            mesh.diagnostics.removed_faces.push(RemovedFace {
                src_face,
                tgt_face,
                reason,
                area,
            });
            continue;
        }

        let mut face = face.clone();
        if !orient_to_source {
            let coords: Vec<Point3<f64>> = face.iter().map(|&i| mesh.points[i]).collect();
            let normal = geometry::newell_normal(&coords);
            if normal.dot(&tgt.face_area_normal(tgt_face)) < 0.0 {
                face[1..].reverse();
            }
        }

        face_map[f] = Some(kept_faces.len());
        kept_faces.push(face);
    }

    // Drop points no surviving face references
    let mut used = vec![false; mesh.points.len()];
    for face in &kept_faces {
        for &i in face {
            used[i] = true;
        }
    }
    let mut point_map: Vec<Option<usize>> = vec![None; mesh.points.len()];
    let mut points = Vec::with_capacity(mesh.points.len());
    for (i, p) in mesh.points.iter().enumerate() {
        if used[i] {
            point_map[i] = Some(points.len());
            points.push(*p);
        }
    }

    let faces: Vec<Vec<usize>> = kept_faces
        .into_iter()
        .map(|face| face.iter().filter_map(|&i| point_map[i]).collect())
        .collect();

    mesh.src.renumber(&point_map, &face_map);
    mesh.tgt.renumber(&point_map, &face_map);

    Assembled {
        points,
        faces,
        ..mesh
    }
}

/// Unique undirected edges of a set of face loops, in first-seen order.
pub(crate) fn derive_edges(faces: &[Vec<usize>]) -> Vec<[usize; 2]> {
    let mut seen = FxHashSet::default();
    let mut edges = Vec::new();
    for face in faces {
        for (k, &a) in face.iter().enumerate() {
            let b = face[(k + 1) % face.len()];
            if seen.insert((a.min(b), a.max(b))) {
                edges.push([a, b]);
            }
        }
    }
    edges
}
