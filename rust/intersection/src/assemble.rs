// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Topology assembly: merges per-pair clip results into one mesh.
//!
//! Clip results are consumed strictly in candidate order. Each polygon
//! vertex is resolved to an intersection point by identity first (the same
//! original source or target point) and by distance second, through a
//! spatial hash. Tags only ever become more specific: a point tagged with
//! an original edge and later seen at an original point is promoted and
//! leaves the edge's running list.

use nalgebra::Point3;
use patchx_mesh::{geometry, PatchSurface};

use crate::clip::{ClipPolygon, ClipVertex, Locus, PairOverlap};
use crate::correspondence::Correspondence;
use crate::diagnostics::{Diagnostics, SkippedPair, TagConflict, TagKind, ToleranceAmbiguity};
use crate::error::GeometryError;
use crate::spatial::PointIndex;
use crate::Side;

/// Raw intersection mesh before the consistency pass.
#[derive(Debug)]
pub(crate) struct Assembled {
    pub points: Vec<Point3<f64>>,
    pub faces: Vec<Vec<usize>>,
    pub src: Correspondence,
    pub tgt: Correspondence,
    pub diagnostics: Diagnostics,
}

pub(crate) struct Assembler<'a, S: ?Sized, T: ?Sized> {
    src_patch: &'a S,
    tgt_patch: &'a T,
    tolerance: f64,
    ambiguity_factor: f64,
    index: PointIndex,
    points: Vec<Point3<f64>>,
    faces: Vec<Vec<usize>>,
    src: Correspondence,
    tgt: Correspondence,
    diagnostics: Diagnostics,
}

impl<'a, S, T> Assembler<'a, S, T>
where
    S: PatchSurface + ?Sized,
    T: PatchSurface + ?Sized,
{
    pub fn new(src_patch: &'a S, tgt_patch: &'a T, tolerance: f64, ambiguity_factor: f64) -> Self {
        Self {
            src_patch,
            tgt_patch,
            tolerance,
            ambiguity_factor,
            index: PointIndex::new(tolerance * ambiguity_factor),
            points: Vec::new(),
            faces: Vec::new(),
            src: Correspondence::new(src_patch.n_points(), src_patch.n_edges(), src_patch.n_faces()),
            tgt: Correspondence::new(tgt_patch.n_points(), tgt_patch.n_edges(), tgt_patch.n_faces()),
            diagnostics: Diagnostics::default(),
        }
    }

    pub fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    /// Merges the clip result of one candidate pair.
    pub fn add_pair(
        &mut self,
        src_face: usize,
        tgt_face: usize,
        result: Result<PairOverlap, GeometryError>,
    ) {
        match result {
            Err(error) => {
                tracing::debug!(src_face, tgt_face, %error, "Skipping face pair");
                self.diagnostics.skipped.push(SkippedPair {
                    src_face,
                    tgt_face,
                    error,
                });
            }
            Ok(PairOverlap::Disjoint) => self.diagnostics.disjoint_pairs += 1,
            Ok(PairOverlap::Overlap {
                polygons,
                degenerate,
            }) => {
                self.diagnostics.degenerate_fragments += degenerate;
                let mut added = 0;
                for polygon in &polygons {
                    if self.add_face(src_face, tgt_face, polygon) {
                        added += 1;
                    } else {
                        self.diagnostics.degenerate_fragments += 1;
                    }
                }
                if added > 0 {
                    self.diagnostics.clipped_pairs += 1;
                } else {
                    self.diagnostics.degenerate_pairs += 1;
                }
            }
        }
    }

    /// Adds one overlap polygon as a face. Returns `false` when the loop
    /// collapses after point merging.
    fn add_face(&mut self, src_face: usize, tgt_face: usize, polygon: &ClipPolygon) -> bool {
        let mut face: Vec<usize> = Vec::with_capacity(polygon.len());
        for vertex in polygon {
            let point = self.resolve_point(vertex);
            self.attach(point, vertex, src_face, tgt_face);
            if face.last() != Some(&point) {
                face.push(point);
            }
        }
        while face.len() > 1 && face.first() == face.last() {
            face.pop();
        }

        // A loop that visits a point twice is pinched into two lobes
        let mut sorted = face.clone();
        sorted.sort_unstable();
        sorted.dedup();
        if face.len() < 3 || sorted.len() != face.len() {
            tracing::debug!(src_face, tgt_face, points = face.len(), "Dropping collapsed fragment");
            return false;
        }

        let id = self.faces.len();
        self.faces.push(face);
        self.src.push_face(id, src_face);
        self.tgt.push_face(id, tgt_face);
        true
    }

    /// Finds or creates the intersection point for a clip vertex.
    fn resolve_point(&mut self, vertex: &ClipVertex) -> usize {
        if let Locus::Point(p) = vertex.src {
            if let Some(i) = self.src.point_points[p] {
                return i;
            }
        }
        if let Locus::Point(p) = vertex.tgt {
            if let Some(i) = self.tgt.point_points[p] {
                return i;
            }
        }

        let tol = self.tolerance;
        let position = vertex.position;
        if let Some((i, distance)) =
            self.index
                .nearest(&self.points, &position, tol * self.ambiguity_factor)
        {
            let merged = distance <= tol;
            if distance > tol / self.ambiguity_factor {
                self.diagnostics.ambiguities.push(ToleranceAmbiguity {
                    position: position.coords.into(),
                    neighbour: self.points[i].coords.into(),
                    distance,
                    merged,
                });
            }
            if merged {
                return i;
            }
        }

        let i = self.points.len();
        self.points.push(position);
        self.index.insert(i, &position);
        self.src.push_point();
        self.tgt.push_point();
        i
    }

    fn attach(&mut self, point: usize, vertex: &ClipVertex, src_face: usize, tgt_face: usize) {
        let src_snap = attach_side(
            Side::Source,
            self.src_patch,
            &mut self.src,
            &self.points,
            &mut self.diagnostics.tag_conflicts,
            point,
            vertex.src,
            src_face,
        );
        attach_side(
            Side::Target,
            self.tgt_patch,
            &mut self.tgt,
            &self.points,
            &mut self.diagnostics.tag_conflicts,
            point,
            vertex.tgt,
            tgt_face,
        );

        // Points sit on the source surface, so only a new source point
        // identity moves them
        if let Some(exact) = src_snap {
            let current = self.points[point];
            if current != exact {
                self.index.relocate(point, &current, &exact);
                self.points[point] = exact;
            }
        }
    }

    pub fn finish(self) -> Assembled {
        Assembled {
            points: self.points,
            faces: self.faces,
            src: self.src,
            tgt: self.tgt,
            diagnostics: self.diagnostics,
        }
    }
}

/// Applies one side's locus to an intersection point. Returns the original
/// point's coordinates when the point newly gained a point identity.
#[allow(clippy::too_many_arguments)]
fn attach_side<P: PatchSurface + ?Sized>(
    side: Side,
    patch: &P,
    corr: &mut Correspondence,
    points: &[Point3<f64>],
    conflicts: &mut Vec<TagConflict>,
    point: usize,
    locus: Locus,
    face: usize,
) -> Option<Point3<f64>> {
    if corr.face_of_point[point].is_none() {
        corr.face_of_point[point] = Some(face);
    }

    let conflict = |kind, kept, dropped| TagConflict {
        side,
        kind,
        position: points[point].coords.into(),
        kept,
        dropped,
    };

    match locus {
        Locus::Face => None,
        Locus::Point(p) => match corr.point_of_point[point] {
            Some(q) if q == p => None,
            Some(q) => {
                conflicts.push(conflict(TagKind::Point, Some(q), p));
                None
            }
            None => {
                if corr.point_points[p].is_some_and(|other| other != point) {
                    conflicts.push(conflict(TagKind::Point, None, p));
                    return None;
                }
                corr.point_points[p] = Some(point);
                corr.point_of_point[point] = Some(p);
                if let Some(e) = corr.edge_of_point[point].take() {
                    corr.edge_points[e].retain(|&i| i != point);
                }
                Some(patch.point(p))
            }
        },
        Locus::Edge(e) => {
            if corr.point_of_point[point].is_some() {
                return None;
            }
            match corr.edge_of_point[point] {
                Some(k) if k == e => {}
                Some(k) => conflicts.push(conflict(TagKind::Edge, Some(k), e)),
                None => {
                    corr.edge_of_point[point] = Some(e);
                    insert_along_edge(patch, e, &mut corr.edge_points[e], points, point);
                }
            }
            None
        }
    }
}

/// Inserts `point` into an edge's running list, keeping it ordered by the
/// parameter along the edge's own direction.
fn insert_along_edge<P: PatchSurface + ?Sized>(
    patch: &P,
    edge: usize,
    list: &mut Vec<usize>,
    points: &[Point3<f64>],
    point: usize,
) {
    let [a, b] = patch.edge(edge);
    let (a, b) = (patch.point(a), patch.point(b));
    let param = |i: usize| geometry::segment_parameter(&a, &b, &points[i]);

    let t = param(point);
    let at = list.partition_point(|&i| param(i) < t);
    list.insert(at, point);
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchx_mesh::SurfaceMesh;
    use smallvec::smallvec;

    fn strip() -> SurfaceMesh {
        // Two unit squares side by side; edge 1 is the shared edge x = 1
        SurfaceMesh::from_coords(
            &[
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
                [2.0, 0.0, 0.0],
                [2.0, 1.0, 0.0],
            ],
            vec![vec![0, 1, 2, 3], vec![1, 4, 5, 2]],
        )
        .unwrap()
    }

    fn v(x: f64, y: f64, src: Locus, tgt: Locus) -> ClipVertex {
        ClipVertex {
            position: Point3::new(x, y, 0.0),
            src,
            tgt,
        }
    }

    #[test]
    fn shared_points_are_merged_by_identity() {
        let mesh = strip();
        let mut asm = Assembler::new(&mesh, &mesh, 1e-9, 3.0);
        let shared = mesh.face_edges(0)[1];

        asm.add_pair(
            0,
            0,
            Ok(PairOverlap::Overlap {
                polygons: vec![smallvec![
                    v(0.0, 0.0, Locus::Point(0), Locus::Point(0)),
                    v(1.0, 0.0, Locus::Point(1), Locus::Point(1)),
                    v(1.0, 0.5, Locus::Edge(shared), Locus::Face),
                    v(1.0, 1.0, Locus::Point(2), Locus::Point(2)),
                    v(0.0, 1.0, Locus::Point(3), Locus::Point(3)),
                ]],
                degenerate: 0,
            }),
        );
        asm.add_pair(
            1,
            1,
            Ok(PairOverlap::Overlap {
                polygons: vec![smallvec![
                    v(1.0, 0.0, Locus::Point(1), Locus::Point(1)),
                    v(2.0, 0.0, Locus::Point(4), Locus::Point(4)),
                    v(2.0, 1.0, Locus::Point(5), Locus::Point(5)),
                    v(1.0, 1.0, Locus::Point(2), Locus::Point(2)),
                    v(1.0, 0.5, Locus::Edge(shared), Locus::Face),
                ]],
                degenerate: 0,
            }),
        );

        let out = asm.finish();
        assert_eq!(out.points.len(), 7);
        assert_eq!(out.faces.len(), 2);
        // The mid-edge point was created third and reused by the second pair
        assert_eq!(out.src.edge_points[shared], vec![2]);
        assert_eq!(out.src.edge_of_point[2], Some(shared));
        assert_eq!(out.faces[1], vec![1, 5, 6, 3, 2]);
        assert_eq!(out.diagnostics.clipped_pairs, 2);
        assert!(out.diagnostics.is_clean());
    }

    #[test]
    fn edge_points_are_ordered_along_the_edge() {
        let mesh = strip();
        let mut asm = Assembler::new(&mesh, &mesh, 1e-9, 3.0);
        let bottom = mesh.face_edges(0)[0];

        for x in [0.75, 0.25, 0.5] {
            let p = asm.resolve_point(&v(x, 0.0, Locus::Edge(bottom), Locus::Face));
            asm.attach(p, &v(x, 0.0, Locus::Edge(bottom), Locus::Face), 0, 0);
        }

        let out = asm.finish();
        let xs: Vec<f64> = out.src.edge_points[bottom]
            .iter()
            .map(|&i| out.points[i].x)
            .collect();
        assert_eq!(xs, vec![0.25, 0.5, 0.75]);
    }

    #[test]
    fn promotion_to_point_leaves_edge_list() {
        let mesh = strip();
        let mut asm = Assembler::new(&mesh, &mesh, 1e-6, 3.0);
        let bottom = mesh.face_edges(0)[0];

        let near = v(1.0 - 5e-7, 0.0, Locus::Edge(bottom), Locus::Face);
        let p = asm.resolve_point(&near);
        asm.attach(p, &near, 0, 0);
        let exact = v(1.0, 0.0, Locus::Point(1), Locus::Point(1));
        assert_eq!(asm.resolve_point(&exact), p);
        asm.attach(p, &exact, 0, 0);

        let out = asm.finish();
        assert!(out.src.edge_points[bottom].is_empty());
        assert_eq!(out.src.point_points[1], Some(p));
        assert_eq!(out.src.edge_of_point[p], None);
        assert_eq!(out.points[p], Point3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn near_tolerance_merge_is_reported() {
        let mesh = strip();
        let mut asm = Assembler::new(&mesh, &mesh, 1e-3, 3.0);

        let a = asm.resolve_point(&v(0.5, 0.5, Locus::Face, Locus::Face));
        let b = asm.resolve_point(&v(0.5008, 0.5, Locus::Face, Locus::Face));
        let c = asm.resolve_point(&v(0.5025, 0.5, Locus::Face, Locus::Face));
        assert_eq!(a, b);
        assert_ne!(a, c);

        let out = asm.finish();
        assert_eq!(out.diagnostics.ambiguities.len(), 2);
        assert!(out.diagnostics.ambiguities[0].merged);
        assert!(!out.diagnostics.ambiguities[1].merged);
    }

    #[test]
    fn pair_outcomes_are_counted() {
        let mesh = strip();
        let mut asm = Assembler::new(&mesh, &mesh, 1e-9, 3.0);
        asm.add_pair(0, 1, Ok(PairOverlap::Disjoint));
        asm.add_pair(
            1,
            0,
            Err(GeometryError::Misaligned {
                angle_deg: 90.0,
                limit_deg: 45.0,
            }),
        );
        asm.add_pair(
            0,
            0,
            Ok(PairOverlap::Overlap {
                polygons: vec![smallvec![
                    v(0.0, 0.0, Locus::Point(0), Locus::Point(0)),
                    v(1.0, 0.0, Locus::Point(1), Locus::Point(1)),
                    v(0.0, 0.0, Locus::Point(0), Locus::Point(0)),
                ]],
                degenerate: 1,
            }),
        );

        let out = asm.finish();
        assert!(out.faces.is_empty());
        assert_eq!(out.diagnostics.disjoint_pairs, 1);
        assert_eq!(out.diagnostics.skipped_pairs(), 1);
        assert_eq!(out.diagnostics.degenerate_pairs, 1);
        assert_eq!(out.diagnostics.degenerate_fragments, 2);
    }
}
