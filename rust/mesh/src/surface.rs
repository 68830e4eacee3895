// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Surface patch access and the owned [`SurfaceMesh`] implementation.
//!
//! A patch exposes its points, edges and faces by index together with the
//! face → edge and edge → face adjacency. Edge slot `k` of a face joins loop
//! points `k` and `k + 1` (wrapping), which is what lets the intersection
//! engine tag clipped points with the original edge they lie on.

use nalgebra::{Point3, Vector3};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::{Error, Result};
use crate::geometry;

/// Read access to an indexed polygonal surface with adjacency.
///
/// Implementors must be internally consistent (see [`crate::validate`]);
/// the intersection engine validates patches before using them.
pub trait PatchSurface: Sync {
    /// Number of points.
    fn n_points(&self) -> usize;

    /// Coordinates of a point.
    fn point(&self, index: usize) -> Point3<f64>;

    /// Number of edges.
    fn n_edges(&self) -> usize;

    /// The two point indices of an edge, in the edge's traversal direction.
    fn edge(&self, index: usize) -> [usize; 2];

    /// Number of faces.
    fn n_faces(&self) -> usize;

    /// Point loop of a face.
    fn face(&self, index: usize) -> &[usize];

    /// Edges of a face; slot `k` joins loop points `k` and `k + 1`.
    fn face_edges(&self, index: usize) -> &[usize];

    /// Faces incident to an edge.
    fn edge_faces(&self, index: usize) -> &[usize];

    /// Coordinates of a face's point loop.
    fn face_points(&self, index: usize) -> Vec<Point3<f64>> {
        self.face(index).iter().map(|&p| self.point(p)).collect()
    }

    /// Area-weighted face normal (length is twice the face area).
    fn face_area_normal(&self, index: usize) -> Vector3<f64> {
        geometry::newell_normal(&self.face_points(index))
    }

    /// Face area.
    fn face_area(&self, index: usize) -> f64 {
        self.face_area_normal(index).norm() * 0.5
    }

    /// Vertex-average face centroid.
    fn face_centroid(&self, index: usize) -> Point3<f64> {
        geometry::centroid(&self.face_points(index))
    }

    /// Length of an edge.
    fn edge_length(&self, index: usize) -> f64 {
        let [a, b] = self.edge(index);
        (self.point(b) - self.point(a)).norm()
    }

    /// Shortest edge length of the patch, `None` for a patch without edges.
    fn min_edge_length(&self) -> Option<f64> {
        (0..self.n_edges())
            .map(|e| self.edge_length(e))
            .filter(|l| *l > 0.0)
            .reduce(f64::min)
    }

    /// Sum of all face areas.
    fn total_area(&self) -> f64 {
        (0..self.n_faces()).map(|f| self.face_area(f)).sum()
    }
}

/// Owned indexed surface patch.
///
/// # Example
///
/// ```
/// use patchx_mesh::{PatchSurface, SurfaceMesh};
///
/// // Two triangles sharing the diagonal of a unit square
/// let mesh = SurfaceMesh::from_coords(
///     &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
///     vec![vec![0, 1, 2], vec![0, 2, 3]],
/// )
/// .unwrap();
///
/// assert_eq!(mesh.n_edges(), 5);
/// let diagonal = mesh.face_edges(0)[2];
/// assert_eq!(mesh.edge_faces(diagonal), &[0, 1]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PatchSnapshot", into = "PatchSnapshot")]
pub struct SurfaceMesh {
    points: Vec<Point3<f64>>,
    edges: Vec<[usize; 2]>,
    faces: Vec<Vec<usize>>,
    face_edges: Vec<Vec<usize>>,
    edge_faces: Vec<SmallVec<[usize; 2]>>,
}

impl SurfaceMesh {
    /// Builds a patch from points and face loops, deriving edges and
    /// adjacency.
    ///
    /// Edges are numbered in first-seen order while walking the faces and
    /// take the direction in which they are first traversed.
    pub fn from_faces(points: Vec<Point3<f64>>, faces: Vec<Vec<usize>>) -> Result<Self> {
        let n_points = points.len();
        for (fi, face) in faces.iter().enumerate() {
            if let Some(&p) = face.iter().find(|&&p| p >= n_points) {
                return Err(Error::PointOutOfRange {
                    face: fi,
                    point: p,
                    n_points,
                });
            }
        }

        let mut edge_lookup: FxHashMap<(usize, usize), usize> = FxHashMap::default();
        let mut edges: Vec<[usize; 2]> = Vec::new();
        let mut edge_faces: Vec<SmallVec<[usize; 2]>> = Vec::new();
        let mut face_edges = Vec::with_capacity(faces.len());

        for (fi, face) in faces.iter().enumerate() {
            let n = face.len();
            let mut slots = Vec::with_capacity(n);
            for k in 0..n {
                let a = face[k];
                let b = face[(k + 1) % n];
                let key = (a.min(b), a.max(b));
                let ei = *edge_lookup.entry(key).or_insert_with(|| {
                    edges.push([a, b]);
                    edge_faces.push(SmallVec::new());
                    edges.len() - 1
                });
                if !edge_faces[ei].contains(&fi) {
                    edge_faces[ei].push(fi);
                }
                slots.push(ei);
            }
            face_edges.push(slots);
        }

        let mesh = Self {
            points,
            edges,
            faces,
            face_edges,
            edge_faces,
        };
        crate::validate::validate(&mesh)?;
        Ok(mesh)
    }

    /// Builds a patch from coordinate triples and face loops.
    pub fn from_coords(coords: &[[f64; 3]], faces: Vec<Vec<usize>>) -> Result<Self> {
        let points = coords
            .iter()
            .map(|c| Point3::new(c[0], c[1], c[2]))
            .collect();
        Self::from_faces(points, faces)
    }

    /// Builds a patch from fully specified topology, checking consistency.
    pub fn from_parts(
        points: Vec<Point3<f64>>,
        edges: Vec<[usize; 2]>,
        faces: Vec<Vec<usize>>,
        face_edges: Vec<Vec<usize>>,
        edge_faces: Vec<Vec<usize>>,
    ) -> Result<Self> {
        let mesh = Self {
            points,
            edges,
            faces,
            face_edges,
            edge_faces: edge_faces.into_iter().map(SmallVec::from_vec).collect(),
        };
        crate::validate::validate(&mesh)?;
        Ok(mesh)
    }

    /// All point coordinates.
    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    /// All edges.
    pub fn edges(&self) -> &[[usize; 2]] {
        &self.edges
    }

    /// All face loops.
    pub fn faces(&self) -> &[Vec<usize>] {
        &self.faces
    }

    /// Returns a copy of the patch with every face loop reversed.
    ///
    /// Edge numbering and edge direction are preserved; only the face slots
    /// are re-ordered to keep slot `k` joining loop points `k` and `k + 1`.
    pub fn flipped(&self) -> Self {
        let mut flipped = self.clone();
        for (face, slots) in flipped.faces.iter_mut().zip(flipped.face_edges.iter_mut()) {
            // [p0, p1, .., pn-1] -> [p0, pn-1, .., p1]
            if let Some(tail) = face.get_mut(1..) {
                tail.reverse();
            }
            // edge (p0,p1) ... (pn-1,p0) -> (p0,pn-1), (pn-1,pn-2), .., (p1,p0)
            slots.reverse();
        }
        flipped
    }
}

impl PatchSurface for SurfaceMesh {
    fn n_points(&self) -> usize {
        self.points.len()
    }

    fn point(&self, index: usize) -> Point3<f64> {
        self.points[index]
    }

    fn n_edges(&self) -> usize {
        self.edges.len()
    }

    fn edge(&self, index: usize) -> [usize; 2] {
        self.edges[index]
    }

    fn n_faces(&self) -> usize {
        self.faces.len()
    }

    fn face(&self, index: usize) -> &[usize] {
        &self.faces[index]
    }

    fn face_edges(&self, index: usize) -> &[usize] {
        &self.face_edges[index]
    }

    fn edge_faces(&self, index: usize) -> &[usize] {
        &self.edge_faces[index]
    }
}

/// Portable form of a patch: points and face loops only.
///
/// Adjacency is rebuilt on load, so a snapshot can never carry inconsistent
/// edge tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchSnapshot {
    pub points: Vec<[f64; 3]>,
    pub faces: Vec<Vec<usize>>,
}

impl From<SurfaceMesh> for PatchSnapshot {
    fn from(mesh: SurfaceMesh) -> Self {
        Self {
            points: mesh.points.iter().map(|p| [p.x, p.y, p.z]).collect(),
            faces: mesh.faces,
        }
    }
}

impl TryFrom<PatchSnapshot> for SurfaceMesh {
    type Error = Error;

    fn try_from(snapshot: PatchSnapshot) -> Result<Self> {
        SurfaceMesh::from_coords(&snapshot.points, snapshot.faces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn two_triangles() -> SurfaceMesh {
        SurfaceMesh::from_coords(
            &[
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
            vec![vec![0, 1, 2], vec![0, 2, 3]],
        )
        .unwrap()
    }

    #[test]
    fn from_faces_shares_edges() {
        let mesh = two_triangles();
        assert_eq!(mesh.n_points(), 4);
        assert_eq!(mesh.n_edges(), 5);
        assert_eq!(mesh.n_faces(), 2);

        // Diagonal (2,0) is edge slot 2 of face 0 and slot 0 of face 1
        let diagonal = mesh.face_edges(0)[2];
        assert_eq!(mesh.face_edges(1)[0], diagonal);
        assert_eq!(mesh.edge(diagonal), [2, 0]);
        assert_eq!(mesh.edge_faces(diagonal), &[0, 1]);
    }

    #[test]
    fn short_face_keeps_its_slots() {
        let mesh = SurfaceMesh::from_coords(&[[0.0; 3], [1.0, 0.0, 0.0]], vec![vec![0, 1]])
            .unwrap();
        assert_eq!(mesh.n_edges(), 1);
        assert_eq!(mesh.face_edges(0), &[0, 0]);
        assert_eq!(mesh.edge_faces(0), &[0]);
    }

    #[test]
    fn rejects_out_of_range_point() {
        let err = SurfaceMesh::from_coords(
            &[[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            vec![vec![0, 1, 7]],
        )
        .unwrap_err();
        assert!(matches!(err, Error::PointOutOfRange { point: 7, .. }));
    }

    #[test]
    fn rejects_non_manifold_edge() {
        // Three triangles hinged on edge (0,1)
        let err = SurfaceMesh::from_coords(
            &[
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.5, 1.0, 0.0],
                [0.5, -1.0, 0.0],
                [0.5, 0.0, 1.0],
            ],
            vec![vec![0, 1, 2], vec![1, 0, 3], vec![0, 1, 4]],
        )
        .unwrap_err();
        assert!(matches!(err, Error::NonManifoldEdge { faces: 3, .. }));
    }

    #[test]
    fn derived_quantities() {
        let mesh = two_triangles();
        assert_relative_eq!(mesh.face_area(0), 0.5);
        assert_relative_eq!(mesh.total_area(), 1.0);
        assert_relative_eq!(mesh.min_edge_length().unwrap(), 1.0);
        assert_relative_eq!(mesh.face_area_normal(1).z, 1.0);
    }

    #[test]
    fn flipped_keeps_slot_convention() {
        let mesh = two_triangles().flipped();
        crate::validate::validate(&mesh).unwrap();
        assert_eq!(mesh.face(0), &[0, 2, 1]);
        assert!(mesh.face_area_normal(0).z < 0.0);
    }

    #[test]
    fn json_snapshot_rebuilds_adjacency() {
        let mesh = two_triangles();
        let json = serde_json::to_string(&mesh).unwrap();
        assert!(!json.contains("edge_faces"));

        let back: SurfaceMesh = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mesh);
    }

    #[test]
    fn json_snapshot_rejects_bad_faces() {
        let json = r#"{"points": [[0,0,0],[1,0,0]], "faces": [[0,1,5]]}"#;
        assert!(serde_json::from_str::<SurfaceMesh>(json).is_err());
    }
}
