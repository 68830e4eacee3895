// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! JSON serialization for intersection results.
//!
//! The snapshot holds the mesh and every correspondence table, which is all
//! a field-transfer consumer needs. Diagnostics are not part of it; a
//! restored result reports empty diagnostics.

use nalgebra::Point3;
use patchx_mesh::geometry;
use serde::{Deserialize, Serialize};

use crate::correspondence::Correspondence;
use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::intersection::PatchIntersection;
use crate::orient;

/// Serializable representation of a [`PatchIntersection`].
#[derive(Debug, Serialize, Deserialize)]
pub struct IntersectionSnapshot {
    pub tolerance: f64,
    pub orient_to_source: bool,
    pub points: Vec<[f64; 3]>,
    pub faces: Vec<Vec<usize>>,
    pub source: Correspondence,
    pub target: Correspondence,
}

impl PatchIntersection {
    /// Serializes the intersection to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.to_snapshot())
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Restores an intersection from [`to_json`](Self::to_json) output.
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: IntersectionSnapshot =
            serde_json::from_str(json).map_err(|e| Error::Serialization(e.to_string()))?;
        Self::from_snapshot(snapshot)
    }

    pub fn to_snapshot(&self) -> IntersectionSnapshot {
        IntersectionSnapshot {
            tolerance: self.tolerance,
            orient_to_source: self.orient_to_source,
            points: self.points.iter().map(|p| [p.x, p.y, p.z]).collect(),
            faces: self.faces.clone(),
            source: self.src.clone(),
            target: self.tgt.clone(),
        }
    }

    /// Rebuilds an intersection, checking that every table agrees with the
    /// point and face counts.
    pub fn from_snapshot(snapshot: IntersectionSnapshot) -> Result<Self> {
        let n_points = snapshot.points.len();
        let n_faces = snapshot.faces.len();

        if let Some(face) = snapshot
            .faces
            .iter()
            .position(|face| face.len() < 3 || face.iter().any(|&i| i >= n_points))
        {
            return Err(Error::Serialization(format!(
                "face {} is not a loop over {} points",
                face, n_points
            )));
        }
        for (name, side) in [("source", &snapshot.source), ("target", &snapshot.target)] {
            check_tables(name, side, n_points, n_faces)?;
        }

        let points: Vec<Point3<f64>> = snapshot.points.into_iter().map(Point3::from).collect();
        let face_areas = snapshot
            .faces
            .iter()
            .map(|face| {
                let coords: Vec<Point3<f64>> = face.iter().map(|&i| points[i]).collect();
                geometry::polygon_area(&coords)
            })
            .collect();

        Ok(Self {
            edges: orient::derive_edges(&snapshot.faces),
            points,
            faces: snapshot.faces,
            face_areas,
            src: snapshot.source,
            tgt: snapshot.target,
            tolerance: snapshot.tolerance,
            orient_to_source: snapshot.orient_to_source,
            diagnostics: Diagnostics::default(),
        })
    }
}

fn check_tables(name: &str, side: &Correspondence, n_points: usize, n_faces: usize) -> Result<()> {
    let bad = |what: &str| -> Result<()> {
        Err(Error::Serialization(format!(
            "{} {} table is inconsistent",
            name, what
        )))
    };

    if side.point_of_point.len() != n_points
        || side.edge_of_point.len() != n_points
        || side.face_of_point.len() != n_points
    {
        return bad("per-point");
    }
    if side.face_of_face.len() != n_faces {
        return bad("per-face");
    }
    if side.point_points.iter().flatten().any(|&i| i >= n_points)
        || side.edge_points.iter().flatten().any(|&i| i >= n_points)
    {
        return bad("point");
    }
    if side.face_faces.iter().flatten().any(|&f| f >= n_faces)
        || side.face_of_face.iter().any(|&f| f >= side.face_faces.len())
    {
        return bad("face");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IntersectionConfig;
    use patchx_mesh::SurfaceMesh;

    fn square(x0: f64) -> SurfaceMesh {
        SurfaceMesh::from_coords(
            &[[x0, 0.0, 0.0], [x0 + 1.0, 0.0, 0.0], [x0 + 1.0, 1.0, 0.0], [x0, 1.0, 0.0]],
            vec![vec![0, 1, 2, 3]],
        )
        .unwrap()
    }

    #[test]
    fn json_restores_mesh_and_tables() {
        let result = PatchIntersection::new(
            &square(0.0),
            &square(0.5),
            &[(0, 0)],
            &IntersectionConfig::default(),
        )
        .unwrap();

        let restored = PatchIntersection::from_json(&result.to_json().unwrap()).unwrap();
        assert_eq!(restored.points(), result.points());
        assert_eq!(restored.faces(), result.faces());
        assert_eq!(restored.edges(), result.edges());
        assert_eq!(restored.src_edge_points(), result.src_edge_points());
        assert_eq!(restored.point_tgt_points(), result.point_tgt_points());
        assert_eq!(restored.face_src_faces(), result.face_src_faces());
        assert!((restored.total_area() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn dangling_indices_are_rejected() {
        let result =
            PatchIntersection::new(&square(0.0), &square(0.0), &[(0, 0)], &IntersectionConfig::default())
                .unwrap();
        let mut snapshot = result.to_snapshot();
        snapshot.faces[0][1] = 99;
        assert!(matches!(
            PatchIntersection::from_snapshot(snapshot),
            Err(Error::Serialization(_))
        ));

        let mut snapshot = result.to_snapshot();
        snapshot.target.point_of_point.pop();
        assert!(matches!(
            PatchIntersection::from_snapshot(snapshot),
            Err(Error::Serialization(_))
        ));
    }
}
