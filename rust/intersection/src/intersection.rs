// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The finished intersection of two patches.

use std::time::Instant;

use nalgebra::Point3;
use patchx_mesh::{geometry, PatchSurface};
use rayon::prelude::*;
use rustc_hash::FxHashSet;

use crate::assemble::Assembler;
use crate::clip::Clipper;
use crate::config::IntersectionConfig;
use crate::correspondence::Correspondence;
use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::orient;
use crate::report::IntersectionReport;
use crate::Side;

/// Intersection mesh of a source and a target patch with full
/// correspondence in both directions.
///
/// Built once by [`PatchIntersection::new`] and immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchIntersection {
    pub(crate) points: Vec<Point3<f64>>,
    pub(crate) faces: Vec<Vec<usize>>,
    pub(crate) edges: Vec<[usize; 2]>,
    pub(crate) face_areas: Vec<f64>,
    pub(crate) src: Correspondence,
    pub(crate) tgt: Correspondence,
    pub(crate) tolerance: f64,
    pub(crate) orient_to_source: bool,
    pub(crate) diagnostics: Diagnostics,
}

impl PatchIntersection {
    /// Intersects `src` with `tgt` over the candidate face pairs.
    ///
    /// Fails only on malformed input: an invalid patch, a candidate naming
    /// a face that does not exist, or a configuration that does not resolve
    /// to a usable tolerance. Face pairs that cannot be clipped are skipped
    /// and listed in [`diagnostics`](Self::diagnostics).
    ///
    /// Candidates listed more than once are clipped once. Numbering follows
    /// the candidate order, so identical inputs always give identical
    /// results regardless of thread scheduling.
    pub fn new<S, T>(
        src: &S,
        tgt: &T,
        candidates: &[(usize, usize)],
        config: &IntersectionConfig,
    ) -> Result<Self>
    where
        S: PatchSurface + ?Sized,
        T: PatchSurface + ?Sized,
    {
        let start = Instant::now();

        config.validate()?;
        patchx_mesh::validate(src).map_err(|source| Error::Input {
            side: Side::Source,
            source,
        })?;
        patchx_mesh::validate(tgt).map_err(|source| Error::Input {
            side: Side::Target,
            source,
        })?;

        let (n_src, n_tgt) = (src.n_faces(), tgt.n_faces());
        for (index, &(src_face, tgt_face)) in candidates.iter().enumerate() {
            if src_face >= n_src || tgt_face >= n_tgt {
                return Err(Error::InvalidCandidate {
                    index,
                    src_face,
                    tgt_face,
                    n_src,
                    n_tgt,
                });
            }
        }

        let tolerance = config.tolerance.resolve(src, tgt)?;

        let mut seen = FxHashSet::default();
        let pairs: Vec<(usize, usize)> = candidates
            .iter()
            .copied()
            .filter(|pair| seen.insert(*pair))
            .collect();

        tracing::debug!(
            pairs = pairs.len(),
            duplicates = candidates.len() - pairs.len(),
            tolerance,
            "Clipping face pairs"
        );

        let clipper = Clipper::new(tolerance, config);
        let results: Vec<_> = pairs
            .par_iter()
            .map(|&(s, t)| clipper.clip(src, s, tgt, t))
            .collect();

        let mut assembler = Assembler::new(src, tgt, tolerance, config.ambiguity_factor);
        {
            let diagnostics = assembler.diagnostics_mut();
            diagnostics.candidate_pairs = candidates.len();
            diagnostics.duplicate_pairs = candidates.len() - pairs.len();
        }
        for (&(s, t), result) in pairs.iter().zip(results) {
            assembler.add_pair(s, t, result);
        }

        let mesh = orient::finalize(
            assembler.finish(),
            src,
            tgt,
            tolerance,
            config.orient_to_source,
        );
        let edges = orient::derive_edges(&mesh.faces);
        let face_areas = mesh
            .faces
            .iter()
            .map(|face| {
                let coords: Vec<Point3<f64>> = face.iter().map(|&i| mesh.points[i]).collect();
                geometry::polygon_area(&coords)
            })
            .collect();

        tracing::info!(
            points = mesh.points.len(),
            edges = edges.len(),
            faces = mesh.faces.len(),
            skipped = mesh.diagnostics.skipped_pairs(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Patch intersection complete"
        );

        Ok(Self {
            points: mesh.points,
            faces: mesh.faces,
            edges,
            face_areas,
            src: mesh.src,
            tgt: mesh.tgt,
            tolerance,
            orient_to_source: config.orient_to_source,
            diagnostics: mesh.diagnostics,
        })
    }

    /// Intersection point coordinates.
    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    /// Intersection face loops.
    pub fn faces(&self) -> &[Vec<usize>] {
        &self.faces
    }

    /// Unique undirected intersection edges, in first-seen face order.
    pub fn edges(&self) -> &[[usize; 2]] {
        &self.edges
    }

    /// Area of one intersection face.
    pub fn face_area(&self, face: usize) -> f64 {
        self.face_areas[face]
    }

    /// Areas of all intersection faces.
    pub fn face_areas(&self) -> &[f64] {
        &self.face_areas
    }

    /// Sum of all intersection face areas.
    pub fn total_area(&self) -> f64 {
        self.face_areas.iter().sum()
    }

    /// Resolved absolute merge tolerance.
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Winding convention of the faces.
    pub fn orient_to_source(&self) -> bool {
        self.orient_to_source
    }

    /// Skipped pairs, merge ambiguities, tag conflicts and removed faces.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Correspondence with the given side.
    pub fn correspondence(&self, side: Side) -> &Correspondence {
        match side {
            Side::Source => &self.src,
            Side::Target => &self.tgt,
        }
    }

    // Forward tables

    /// For each source point, the intersection point at its position.
    pub fn src_point_points(&self) -> &[Option<usize>] {
        self.src.point_points()
    }

    /// For each target point, the intersection point at its position.
    pub fn tgt_point_points(&self) -> &[Option<usize>] {
        self.tgt.point_points()
    }

    /// For each source edge, the intersection points on its interior,
    /// ordered along the edge.
    pub fn src_edge_points(&self) -> &[Vec<usize>] {
        self.src.edge_points()
    }

    /// For each target edge, the intersection points on its interior,
    /// ordered along the edge.
    pub fn tgt_edge_points(&self) -> &[Vec<usize>] {
        self.tgt.edge_points()
    }

    /// For each source face, the intersection faces cut from it.
    pub fn src_face_faces(&self) -> &[Vec<usize>] {
        self.src.face_faces()
    }

    /// For each target face, the intersection faces cut from it.
    pub fn tgt_face_faces(&self) -> &[Vec<usize>] {
        self.tgt.face_faces()
    }

    // Inverse tables

    /// For each intersection point, the source point it coincides with.
    pub fn point_src_points(&self) -> &[Option<usize>] {
        self.src.point_of_point()
    }

    /// For each intersection point, the target point it coincides with.
    pub fn point_tgt_points(&self) -> &[Option<usize>] {
        self.tgt.point_of_point()
    }

    /// For each intersection point, the source edge whose interior it lies on.
    pub fn point_src_edges(&self) -> &[Option<usize>] {
        self.src.edge_of_point()
    }

    /// For each intersection point, the target edge whose interior it lies on.
    pub fn point_tgt_edges(&self) -> &[Option<usize>] {
        self.tgt.edge_of_point()
    }

    /// For each intersection point, a source face containing it.
    pub fn point_src_faces(&self) -> &[Option<usize>] {
        self.src.face_of_point()
    }

    /// For each intersection point, a target face containing it.
    pub fn point_tgt_faces(&self) -> &[Option<usize>] {
        self.tgt.face_of_point()
    }

    /// For each intersection face, the source face it was cut from.
    pub fn face_src_faces(&self) -> &[usize] {
        self.src.face_of_face()
    }

    /// For each intersection face, the target face it was cut from.
    pub fn face_tgt_faces(&self) -> &[usize] {
        self.tgt.face_of_face()
    }

    /// Summary statistics against the patches this was built from.
    pub fn report<S, T>(&self, src: &S, tgt: &T) -> IntersectionReport
    where
        S: PatchSurface + ?Sized,
        T: PatchSurface + ?Sized,
    {
        IntersectionReport::new(self, src, tgt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Tolerance;
    use patchx_mesh::SurfaceMesh;

    fn square(x0: f64) -> SurfaceMesh {
        SurfaceMesh::from_coords(
            &[[x0, 0.0, 0.0], [x0 + 1.0, 0.0, 0.0], [x0 + 1.0, 1.0, 0.0], [x0, 1.0, 0.0]],
            vec![vec![0, 1, 2, 3]],
        )
        .unwrap()
    }

    fn run(candidates: &[(usize, usize)]) -> Result<PatchIntersection> {
        PatchIntersection::new(
            &square(0.0),
            &square(0.25),
            candidates,
            &IntersectionConfig::default(),
        )
    }

    #[test]
    fn out_of_range_candidate_is_rejected() {
        let err = run(&[(0, 0), (0, 1)]).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidCandidate {
                index: 1,
                tgt_face: 1,
                ..
            }
        ));
    }

    /// A triangle whose loop names a point that does not exist.
    struct DanglingTriangle;

    impl PatchSurface for DanglingTriangle {
        fn n_points(&self) -> usize {
            3
        }
        fn point(&self, index: usize) -> Point3<f64> {
            [Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)][index]
        }
        fn n_edges(&self) -> usize {
            3
        }
        fn edge(&self, index: usize) -> [usize; 2] {
            [[0, 1], [1, 2], [2, 0]][index]
        }
        fn n_faces(&self) -> usize {
            1
        }
        fn face(&self, _: usize) -> &[usize] {
            &[0, 1, 7]
        }
        fn face_edges(&self, _: usize) -> &[usize] {
            &[0, 1, 2]
        }
        fn edge_faces(&self, _: usize) -> &[usize] {
            &[0]
        }
    }

    #[test]
    fn invalid_patch_is_rejected_with_its_side() {
        let err = PatchIntersection::new(
            &square(0.0),
            &DanglingTriangle,
            &[],
            &IntersectionConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::Input {
                side: Side::Target,
                source: patchx_mesh::Error::PointOutOfRange { point: 7, .. },
            }
        ));
    }

    #[test]
    fn non_positive_tolerance_is_rejected() {
        let config = IntersectionConfig::default().with_tolerance(Tolerance::Absolute(0.0));
        let err = PatchIntersection::new(&square(0.0), &square(0.0), &[(0, 0)], &config)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTolerance(_)));
    }

    #[test]
    fn duplicate_candidates_are_clipped_once() {
        let result = run(&[(0, 0), (0, 0), (0, 0)]).unwrap();
        assert_eq!(result.faces().len(), 1);
        assert_eq!(result.diagnostics().candidate_pairs, 3);
        assert_eq!(result.diagnostics().duplicate_pairs, 2);
        assert_eq!(result.diagnostics().clipped_pairs, 1);
        assert!((result.total_area() - 0.75).abs() < 1e-9);
    }

    #[test]
    fn no_candidates_gives_empty_mesh() {
        let result = run(&[]).unwrap();
        assert!(result.points().is_empty());
        assert!(result.faces().is_empty());
        assert!(result.edges().is_empty());
        assert_eq!(result.src_point_points(), &[None, None, None, None]);
        assert_eq!(result.src_face_faces(), &[Vec::<usize>::new()]);
    }

    #[test]
    fn tables_are_mutually_inverse() {
        let result = run(&[(0, 0)]).unwrap();
        for (p, entry) in result.src_point_points().iter().enumerate() {
            if let Some(i) = entry {
                assert_eq!(result.point_src_points()[*i], Some(p));
            }
        }
        for (e, list) in result.tgt_edge_points().iter().enumerate() {
            for &i in list {
                assert_eq!(result.point_tgt_edges()[i], Some(e));
            }
        }
        for (f, list) in result.src_face_faces().iter().enumerate() {
            for &i in list {
                assert_eq!(result.face_src_faces()[i], f);
            }
        }
        assert_eq!(result.edges().len(), 4);
    }
}
