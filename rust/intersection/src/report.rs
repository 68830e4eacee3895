// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Summary statistics of an intersection.

use std::fmt;

use patchx_mesh::PatchSurface;
use serde::Serialize;

use crate::correspondence::Correspondence;
use crate::intersection::PatchIntersection;

/// Coverage fractions below `1 - COVERAGE_SLACK` count as partial.
pub const COVERAGE_SLACK: f64 = 1e-6;

/// Entity counts of one mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MeshCounts {
    pub points: usize,
    pub edges: usize,
    pub faces: usize,
}

impl MeshCounts {
    fn of<P: PatchSurface + ?Sized>(patch: &P) -> Self {
        Self {
            points: patch.n_points(),
            edges: patch.n_edges(),
            faces: patch.n_faces(),
        }
    }
}

/// How much of one input patch the intersection covers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Coverage {
    /// Faces with no intersection face at all.
    pub unmatched_faces: usize,
    /// Faces covered only in part.
    pub partial_faces: usize,
    /// Intersection area over patch area.
    pub area_fraction: f64,
}

impl Coverage {
    fn of<P: PatchSurface + ?Sized>(patch: &P, side: &Correspondence, areas: &[f64]) -> Self {
        let mut unmatched_faces = 0;
        let mut partial_faces = 0;
        let mut covered = 0.0;

        for (f, children) in side.face_faces().iter().enumerate() {
            if children.is_empty() {
                unmatched_faces += 1;
                continue;
            }
            let area: f64 = children.iter().map(|&i| areas[i]).sum();
            covered += area;
            let face_area = patch.face_area(f);
            if face_area > 0.0 && area / face_area < 1.0 - COVERAGE_SLACK {
                partial_faces += 1;
            }
        }

        let total = patch.total_area();
        Self {
            unmatched_faces,
            partial_faces,
            area_fraction: if total > 0.0 { covered / total } else { 0.0 },
        }
    }
}

/// Structured summary of one intersection computation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntersectionReport {
    pub source: MeshCounts,
    pub target: MeshCounts,
    pub intersection: MeshCounts,
    pub candidate_pairs: usize,
    pub duplicate_pairs: usize,
    pub clipped_pairs: usize,
    pub disjoint_pairs: usize,
    pub degenerate_pairs: usize,
    pub skipped_pairs: usize,
    pub degenerate_fragments: usize,
    pub ambiguities: usize,
    pub tag_conflicts: usize,
    pub removed_faces: usize,
    pub total_area: f64,
    pub tolerance: f64,
    pub source_coverage: Coverage,
    pub target_coverage: Coverage,
}

impl IntersectionReport {
    pub fn new<S, T>(result: &PatchIntersection, src: &S, tgt: &T) -> Self
    where
        S: PatchSurface + ?Sized,
        T: PatchSurface + ?Sized,
    {
        let d = result.diagnostics();
        Self {
            source: MeshCounts::of(src),
            target: MeshCounts::of(tgt),
            intersection: MeshCounts {
                points: result.points().len(),
                edges: result.edges().len(),
                faces: result.faces().len(),
            },
            candidate_pairs: d.candidate_pairs,
            duplicate_pairs: d.duplicate_pairs,
            clipped_pairs: d.clipped_pairs,
            disjoint_pairs: d.disjoint_pairs,
            degenerate_pairs: d.degenerate_pairs,
            skipped_pairs: d.skipped_pairs(),
            degenerate_fragments: d.degenerate_fragments,
            ambiguities: d.ambiguities.len(),
            tag_conflicts: d.tag_conflicts.len(),
            removed_faces: d.removed_faces.len(),
            total_area: result.total_area(),
            tolerance: result.tolerance(),
            source_coverage: Coverage::of(src, &result.src, result.face_areas()),
            target_coverage: Coverage::of(tgt, &result.tgt, result.face_areas()),
        }
    }

    /// Emits the summary through `tracing`: one info line, plus a warning
    /// when pairs were skipped or faces removed.
    pub fn log(&self) {
        tracing::info!(
            points = self.intersection.points,
            edges = self.intersection.edges,
            faces = self.intersection.faces,
            clipped = self.clipped_pairs,
            disjoint = self.disjoint_pairs,
            total_area = self.total_area,
            source_coverage = self.source_coverage.area_fraction,
            target_coverage = self.target_coverage.area_fraction,
            "Intersection summary"
        );
        if self.skipped_pairs > 0 || self.removed_faces > 0 {
            tracing::warn!(
                skipped = self.skipped_pairs,
                removed = self.removed_faces,
                ambiguities = self.ambiguities,
                "Intersection incomplete"
            );
        }
    }

    /// Serializes the report to a JSON string.
    pub fn to_json(&self) -> crate::Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| crate::Error::Serialization(e.to_string()))
    }
}

impl fmt::Display for IntersectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let row = |f: &mut fmt::Formatter<'_>, name: &str, c: &MeshCounts| {
            writeln!(
                f,
                "  {:<13} {:>9} {:>9} {:>9}",
                name, c.points, c.edges, c.faces
            )
        };

        writeln!(f, "Patch intersection")?;
        writeln!(f, "  {:<13} {:>9} {:>9} {:>9}", "", "points", "edges", "faces")?;
        row(f, "source", &self.source)?;
        row(f, "target", &self.target)?;
        row(f, "intersection", &self.intersection)?;
        writeln!(
            f,
            "  pairs: {} candidates ({} duplicate), {} clipped, {} disjoint, {} degenerate, {} skipped",
            self.candidate_pairs,
            self.duplicate_pairs,
            self.clipped_pairs,
            self.disjoint_pairs,
            self.degenerate_pairs,
            self.skipped_pairs
        )?;
        writeln!(
            f,
            "  merging: tolerance {:e}, {} ambiguous, {} tag conflicts, {} faces removed",
            self.tolerance, self.ambiguities, self.tag_conflicts, self.removed_faces
        )?;
        writeln!(f, "  area: {:.6}", self.total_area)?;
        for (name, c) in [("source", &self.source_coverage), ("target", &self.target_coverage)] {
            writeln!(
                f,
                "  {} coverage: {:.2}% ({} unmatched, {} partial faces)",
                name,
                c.area_fraction * 100.0,
                c.unmatched_faces,
                c.partial_faces
            )?;
        }
        Ok(())
    }
}
