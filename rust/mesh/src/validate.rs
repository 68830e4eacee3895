// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Structural validation of surface patches.
//!
//! Checks referential integrity (all indices in range) and that the
//! face → edge and edge → face adjacency describe the same manifold surface.
//! The shape of individual face loops is not checked here: a loop with fewer
//! than three points or a repeated point is still consistent topology, and
//! the intersection engine skips pairs involving such a face.

use crate::error::{Error, Result};
use crate::surface::PatchSurface;

/// Validates a patch, returning the first inconsistency found.
pub fn validate<S: PatchSurface + ?Sized>(patch: &S) -> Result<()> {
    let n_points = patch.n_points();
    let n_edges = patch.n_edges();
    let n_faces = patch.n_faces();

    for pi in 0..n_points {
        let p = patch.point(pi);
        if !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()) {
            return Err(Error::NonFinitePoint { point: pi });
        }
    }

    for ei in 0..n_edges {
        let [a, b] = patch.edge(ei);
        for p in [a, b] {
            if p >= n_points {
                return Err(Error::EdgePointOutOfRange {
                    edge: ei,
                    point: p,
                    n_points,
                });
            }
        }

        let faces = patch.edge_faces(ei);
        if faces.len() > 2 {
            return Err(Error::NonManifoldEdge {
                edge: ei,
                faces: faces.len(),
            });
        }
        for &fi in faces {
            if fi >= n_faces || !patch.face_edges(fi).contains(&ei) {
                return Err(Error::EdgeFaceMismatch { edge: ei, face: fi });
            }
        }
    }

    for fi in 0..n_faces {
        let face = patch.face(fi);
        let n = face.len();
        if let Some(&p) = face.iter().find(|&&p| p >= n_points) {
            return Err(Error::PointOutOfRange {
                face: fi,
                point: p,
                n_points,
            });
        }

        let slots = patch.face_edges(fi);
        if slots.len() != n {
            return Err(Error::FaceEdgeMismatch {
                face: fi,
                slot: slots.len().min(n),
            });
        }
        for (k, &ei) in slots.iter().enumerate() {
            if ei >= n_edges {
                return Err(Error::EdgeOutOfRange {
                    face: fi,
                    edge: ei,
                    n_edges,
                });
            }
            let [a, b] = patch.edge(ei);
            let (p, q) = (face[k], face[(k + 1) % n]);
            if !((a == p && b == q) || (a == q && b == p)) {
                return Err(Error::FaceEdgeMismatch { face: fi, slot: k });
            }
            if !patch.edge_faces(ei).contains(&fi) {
                return Err(Error::EdgeFaceMismatch { edge: ei, face: fi });
            }
        }
    }

    Ok(())
}
