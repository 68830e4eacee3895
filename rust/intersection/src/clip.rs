// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometric clipper for one source/target face pair.
//!
//! Both faces are projected onto a shared working plane whose normal bisects
//! the two face normals. The source face is then clipped against every edge
//! half-plane of the target face (Sutherland–Hodgman). Non-convex faces are
//! first split into triangles so that every clip polygon is convex.
//!
//! Every vertex of an overlap polygon is located against the *original*
//! face loops, giving it a point, edge or face-interior identity on each
//! side. Its coordinates are snapped accordingly and always lie on the
//! source surface.

use nalgebra::{Point2, Point3, Vector3};
use patchx_mesh::{geometry, PatchSurface};
use smallvec::SmallVec;

use crate::config::IntersectionConfig;
use crate::error::GeometryError;
use crate::plane::WorkingPlane;
use crate::polygon;
use crate::Side;

/// Where a clipped vertex lies relative to one original face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Locus {
    /// Strictly inside the face.
    Face,
    /// On the interior of an original edge.
    Edge(usize),
    /// At an original point.
    Point(usize),
}

impl Locus {
    /// Specificity used when merging tags: point > edge > face.
    pub fn rank(&self) -> u8 {
        match self {
            Locus::Face => 0,
            Locus::Edge(_) => 1,
            Locus::Point(_) => 2,
        }
    }
}

/// A vertex of an overlap polygon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipVertex {
    pub position: Point3<f64>,
    pub src: Locus,
    pub tgt: Locus,
}

/// Overlap polygon, counter-clockwise about the source face normal.
pub type ClipPolygon = SmallVec<[ClipVertex; 8]>;

/// Result of clipping one face pair.
#[derive(Debug, Clone, PartialEq)]
pub enum PairOverlap {
    /// No area in common (including faces that only touch).
    Disjoint,
    /// One or more overlap polygons, plus the number of fragments that were
    /// discarded as zero-area slivers.
    Overlap {
        polygons: Vec<ClipPolygon>,
        degenerate: usize,
    },
}

/// A face loop prepared for clipping.
struct FaceLoop<'a> {
    indices: &'a [usize],
    edges: &'a [usize],
    points: Vec<Point3<f64>>,
    normal: Vector3<f64>,
    centroid: Point3<f64>,
}

enum Location {
    Vertex(usize),
    Edge(usize, f64),
    Interior,
}

/// Clips face pairs with a fixed tolerance.
#[derive(Debug, Clone, Copy)]
pub struct Clipper {
    tolerance: f64,
    max_non_planarity: f64,
    max_normal_angle_deg: f64,
}

impl Clipper {
    /// Creates a clipper for an absolute merge `tolerance`.
    pub fn new(tolerance: f64, config: &IntersectionConfig) -> Self {
        Self {
            tolerance,
            max_non_planarity: config.max_non_planarity,
            max_normal_angle_deg: config.max_normal_angle_deg,
        }
    }

    /// The absolute merge tolerance.
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Clips source face `src_face` against target face `tgt_face`.
    pub fn clip<S, T>(
        &self,
        src: &S,
        src_face: usize,
        tgt: &T,
        tgt_face: usize,
    ) -> Result<PairOverlap, GeometryError>
    where
        S: PatchSurface + ?Sized,
        T: PatchSurface + ?Sized,
    {
        let tol = self.tolerance;
        let s = self.prepare(Side::Source, src, src_face)?;
        let t = self.prepare(Side::Target, tgt, tgt_face)?;

        let dot = s.normal.dot(&t.normal);
        let angle_deg = dot.abs().min(1.0).acos().to_degrees();
        if angle_deg > self.max_normal_angle_deg {
            return Err(GeometryError::Misaligned {
                angle_deg,
                limit_deg: self.max_normal_angle_deg,
            });
        }

        // Coupled patches usually face each other; bisect with the target
        // normal flipped in that case
        let t_normal = if dot < 0.0 { -t.normal } else { t.normal };
        let plane = WorkingPlane::new(s.centroid, (s.normal + t_normal).normalize());

        let s2 = plane.project_all(&s.points);
        let t2 = plane.project_all(&t.points);

        if !boxes_overlap(&s2, &t2, tol) {
            return Ok(PairOverlap::Disjoint);
        }

        let eps = tol * tol;
        let s_pieces = polygon::convex_pieces(&counter_clockwise(&s2), eps)
            .map_err(|reason| GeometryError::Decomposition {
                side: Side::Source,
                reason,
            })?;
        let t_pieces = polygon::convex_pieces(&counter_clockwise(&t2), eps)
            .map_err(|reason| GeometryError::Decomposition {
                side: Side::Target,
                reason,
            })?;

        let mut polygons = Vec::new();
        let mut degenerate = 0;

        for sp in &s_pieces {
            for tp in &t_pieces {
                let mut result = sp.clone();
                let n = tp.len();
                for i in 0..n {
                    result = polygon::clip_half_plane(&result, &tp[i], &tp[(i + 1) % n], tol);
                    if result.is_empty() {
                        break;
                    }
                }

                let kept = polygon::dedup_indices(&result, tol);
                if kept.len() < 3 {
                    // Empty, a touching point or a shared edge segment
                    continue;
                }

                let overlap: Vec<Point2<f64>> = kept.iter().map(|&i| result[i]).collect();
                let area = polygon::signed_area(&overlap);
                if area <= 0.5 * tol * polygon::perimeter(&overlap) {
                    degenerate += 1;
                    continue;
                }

                polygons.push(self.locate_polygon(&overlap, &plane, &s, &s2, &t, &t2));
            }
        }

        if polygons.is_empty() && degenerate == 0 {
            Ok(PairOverlap::Disjoint)
        } else {
            Ok(PairOverlap::Overlap {
                polygons,
                degenerate,
            })
        }
    }

    fn prepare<'a, P>(
        &self,
        side: Side,
        patch: &'a P,
        face: usize,
    ) -> Result<FaceLoop<'a>, GeometryError>
    where
        P: PatchSurface + ?Sized,
    {
        let indices = patch.face(face);
        if indices.len() < 3 {
            return Err(GeometryError::TooFewPoints {
                side,
                points: indices.len(),
            });
        }

        let points = patch.face_points(face);
        let area_normal = geometry::newell_normal(&points);
        let area = area_normal.norm() * 0.5;
        let perimeter: f64 = (0..points.len())
            .map(|i| (points[(i + 1) % points.len()] - points[i]).norm())
            .sum();
        let doubles_back = indices
            .iter()
            .enumerate()
            .any(|(k, p)| indices[..k].contains(p));
        if doubles_back || !(area > 0.5 * self.tolerance * perimeter) {
            return Err(GeometryError::Collapsed { side, area });
        }

        let normal = area_normal / (2.0 * area);
        let centroid = geometry::centroid(&points);
        let deviation = geometry::max_plane_deviation(&points, &centroid, &normal);
        let limit = (self.max_non_planarity * area.sqrt()).max(self.tolerance);
        if deviation > limit {
            return Err(GeometryError::NonPlanar {
                side,
                deviation,
                limit,
            });
        }

        Ok(FaceLoop {
            indices,
            edges: patch.face_edges(face),
            points,
            normal,
            centroid,
        })
    }

    fn locate_polygon(
        &self,
        overlap: &[Point2<f64>],
        plane: &WorkingPlane,
        s: &FaceLoop<'_>,
        s2: &[Point2<f64>],
        t: &FaceLoop<'_>,
        t2: &[Point2<f64>],
    ) -> ClipPolygon {
        overlap
            .iter()
            .map(|q| {
                let (src, position) = match self.locate(q, s2) {
                    Location::Vertex(k) => (Locus::Point(s.indices[k]), s.points[k]),
                    Location::Edge(k, param) => {
                        let a = s.points[k];
                        let b = s.points[(k + 1) % s.points.len()];
                        (Locus::Edge(s.edges[k]), a + (b - a) * param)
                    }
                    Location::Interior => {
                        let lifted = plane.lift(q);
                        let offset = (lifted - s.centroid).dot(&s.normal);
                        (Locus::Face, lifted - s.normal * offset)
                    }
                };
                let tgt = match self.locate(q, t2) {
                    Location::Vertex(k) => Locus::Point(t.indices[k]),
                    Location::Edge(k, _) => Locus::Edge(t.edges[k]),
                    Location::Interior => Locus::Face,
                };
                ClipVertex { position, src, tgt }
            })
            .collect()
    }

    /// Locates a plane point against a projected face loop.
    fn locate(&self, q: &Point2<f64>, face: &[Point2<f64>]) -> Location {
        let tol = self.tolerance;

        let nearest_vertex = face
            .iter()
            .enumerate()
            .map(|(k, p)| (k, (p - q).norm()))
            .filter(|(_, d)| *d <= tol)
            .min_by(|a, b| a.1.total_cmp(&b.1));
        if let Some((k, _)) = nearest_vertex {
            return Location::Vertex(k);
        }

        let n = face.len();
        let nearest_edge = (0..n)
            .map(|k| {
                let (d, param) = polygon::segment_distance(&face[k], &face[(k + 1) % n], q);
                (k, d, param)
            })
            .filter(|(_, d, param)| *d <= tol && *param > 0.0 && *param < 1.0)
            .min_by(|a, b| a.1.total_cmp(&b.1));
        if let Some((k, _, param)) = nearest_edge {
            return Location::Edge(k, param);
        }

        Location::Interior
    }
}

fn counter_clockwise(points: &[Point2<f64>]) -> Vec<Point2<f64>> {
    if polygon::signed_area(points) < 0.0 {
        points.iter().rev().cloned().collect()
    } else {
        points.to_vec()
    }
}

fn boxes_overlap(a: &[Point2<f64>], b: &[Point2<f64>], tol: f64) -> bool {
    let bounds = |pts: &[Point2<f64>]| {
        pts.iter().fold(
            (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            |(x0, y0, x1, y1), p| (x0.min(p.x), y0.min(p.y), x1.max(p.x), y1.max(p.y)),
        )
    };
    let (ax0, ay0, ax1, ay1) = bounds(a);
    let (bx0, by0, bx1, by1) = bounds(b);
    ax0 <= bx1 + tol && bx0 <= ax1 + tol && ay0 <= by1 + tol && by0 <= ay1 + tol
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use patchx_mesh::SurfaceMesh;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64, z: f64) -> SurfaceMesh {
        SurfaceMesh::from_coords(
            &[[x0, y0, z], [x1, y0, z], [x1, y1, z], [x0, y1, z]],
            vec![vec![0, 1, 2, 3]],
        )
        .unwrap()
    }

    fn clipper() -> Clipper {
        Clipper::new(1e-9, &IntersectionConfig::default())
    }

    fn area(polygon: &ClipPolygon) -> f64 {
        let pts: Vec<Point3<f64>> = polygon.iter().map(|v| v.position).collect();
        geometry::polygon_area(&pts)
    }

    fn single(overlap: PairOverlap) -> ClipPolygon {
        match overlap {
            PairOverlap::Overlap {
                mut polygons,
                degenerate: 0,
            } if polygons.len() == 1 => polygons.remove(0),
            other => panic!("expected one overlap polygon, got {:?}", other),
        }
    }

    #[test]
    fn identical_squares_keep_both_identities() {
        let a = rect(0.0, 0.0, 1.0, 1.0, 0.0);
        let polygon = single(clipper().clip(&a, 0, &a, 0).unwrap());
        assert_eq!(polygon.len(), 4);
        assert_relative_eq!(area(&polygon), 1.0, epsilon = 1e-12);
        for v in &polygon {
            assert!(matches!(v.src, Locus::Point(_)));
            assert_eq!(v.src, v.tgt);
        }
    }

    #[test]
    fn half_overlap_tags_edges_and_vertices() {
        let src = rect(-0.5, 0.0, 1.5, 1.0, 0.0);
        let tgt = rect(0.0, 0.0, 1.0, 1.0, 0.0);
        let polygon = single(clipper().clip(&src, 0, &tgt, 0).unwrap());
        assert_relative_eq!(area(&polygon), 1.0, epsilon = 1e-12);

        let on_src_edge = polygon
            .iter()
            .filter(|v| matches!(v.src, Locus::Edge(_)))
            .count();
        let at_tgt_point = polygon
            .iter()
            .filter(|v| matches!(v.tgt, Locus::Point(_)))
            .count();
        assert_eq!(on_src_edge, 4);
        assert_eq!(at_tgt_point, 4);
    }

    #[test]
    fn contained_target_face() {
        let src = rect(0.0, 0.0, 4.0, 4.0, 0.0);
        let tgt = rect(1.0, 1.0, 2.0, 2.0, 0.0);
        let polygon = single(clipper().clip(&src, 0, &tgt, 0).unwrap());
        assert_relative_eq!(area(&polygon), 1.0, epsilon = 1e-12);
        assert!(polygon.iter().all(|v| v.src == Locus::Face));
        assert!(polygon.iter().all(|v| matches!(v.tgt, Locus::Point(_))));
    }

    #[test]
    fn touching_faces_are_disjoint() {
        let a = rect(0.0, 0.0, 1.0, 1.0, 0.0);
        let b = rect(1.0, 0.0, 2.0, 1.0, 0.0);
        assert_eq!(clipper().clip(&a, 0, &b, 0).unwrap(), PairOverlap::Disjoint);

        let far = rect(5.0, 5.0, 6.0, 6.0, 0.0);
        assert_eq!(clipper().clip(&a, 0, &far, 0).unwrap(), PairOverlap::Disjoint);
    }

    #[test]
    fn opposed_target_projects_onto_source() {
        let src = rect(0.0, 0.0, 1.0, 1.0, 0.0);
        // Target faces -z and sits slightly above the source
        let tgt = rect(0.5, 0.0, 1.5, 1.0, 0.01).flipped();
        let polygon = single(clipper().clip(&src, 0, &tgt, 0).unwrap());
        assert_relative_eq!(area(&polygon), 0.5, epsilon = 1e-12);
        assert!(polygon.iter().all(|v| v.position.z.abs() < 1e-12));

        // Counter-clockwise about the source normal
        let pts: Vec<Point3<f64>> = polygon.iter().map(|v| v.position).collect();
        assert!(geometry::newell_normal(&pts).z > 0.0);
    }

    #[test]
    fn perpendicular_faces_are_misaligned() {
        let src = rect(0.0, 0.0, 1.0, 1.0, 0.0);
        let wall = SurfaceMesh::from_coords(
            &[[0.0, 0.5, 0.0], [1.0, 0.5, 0.0], [1.0, 0.5, 1.0], [0.0, 0.5, 1.0]],
            vec![vec![0, 1, 2, 3]],
        )
        .unwrap();
        let err = clipper().clip(&src, 0, &wall, 0).unwrap_err();
        assert!(matches!(err, GeometryError::Misaligned { .. }));
    }

    #[test]
    fn warped_face_is_non_planar() {
        let src = rect(0.0, 0.0, 1.0, 1.0, 0.0);
        let warped = SurfaceMesh::from_coords(
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.2], [1.0, 1.0, 0.0], [0.0, 1.0, 0.2]],
            vec![vec![0, 1, 2, 3]],
        )
        .unwrap();
        let err = clipper().clip(&src, 0, &warped, 0).unwrap_err();
        assert!(matches!(
            err,
            GeometryError::NonPlanar {
                side: Side::Target,
                ..
            }
        ));
    }

    #[test]
    fn collapsed_face_is_rejected() {
        let sliver = SurfaceMesh::from_coords(
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]],
            vec![vec![0, 1, 2]],
        )
        .unwrap();
        let square = rect(0.0, 0.0, 1.0, 1.0, 0.0);
        let err = clipper().clip(&sliver, 0, &square, 0).unwrap_err();
        assert!(matches!(
            err,
            GeometryError::Collapsed {
                side: Side::Source,
                ..
            }
        ));
    }

    #[test]
    fn short_face_is_rejected() {
        let square = rect(0.0, 0.0, 1.0, 1.0, 0.0);
        let segment =
            SurfaceMesh::from_coords(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]], vec![vec![0, 1]])
                .unwrap();
        let err = clipper().clip(&square, 0, &segment, 0).unwrap_err();
        assert_eq!(
            err,
            GeometryError::TooFewPoints {
                side: Side::Target,
                points: 2
            }
        );
    }

    #[test]
    fn loop_visiting_a_point_twice_is_collapsed() {
        // Square loop with a spike back to vertex 2; the area alone looks fine
        let spiked = SurfaceMesh::from_coords(
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
            vec![vec![0, 1, 2, 3, 2]],
        )
        .unwrap();
        let square = rect(0.0, 0.0, 1.0, 1.0, 0.0);
        let err = clipper().clip(&spiked, 0, &square, 0).unwrap_err();
        assert!(matches!(
            err,
            GeometryError::Collapsed {
                side: Side::Source,
                ..
            }
        ));
    }

    #[test]
    fn concave_source_is_decomposed() {
        // L-shaped source of area 3 over a 2x2 target
        let l_shape = SurfaceMesh::from_coords(
            &[
                [0.0, 0.0, 0.0],
                [2.0, 0.0, 0.0],
                [2.0, 1.0, 0.0],
                [1.0, 1.0, 0.0],
                [1.0, 2.0, 0.0],
                [0.0, 2.0, 0.0],
            ],
            vec![vec![0, 1, 2, 3, 4, 5]],
        )
        .unwrap();
        let square = rect(0.0, 0.0, 2.0, 2.0, 0.0);
        match clipper().clip(&l_shape, 0, &square, 0).unwrap() {
            PairOverlap::Overlap { polygons, .. } => {
                let total: f64 = polygons.iter().map(area).sum();
                assert_relative_eq!(total, 3.0, epsilon = 1e-9);
            }
            PairOverlap::Disjoint => panic!("expected overlap"),
        }
    }
}
