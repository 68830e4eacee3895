// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 2D polygon predicates and half-plane clipping.
//!
//! Loops are implicitly closed. "Inside" of a counter-clockwise loop is to
//! the left of each edge.

use nalgebra::{Point2, Vector2};

/// Signed area of a loop. Positive = counter-clockwise.
pub fn signed_area(contour: &[Point2<f64>]) -> f64 {
    if contour.len() < 3 {
        return 0.0;
    }

    let mut area = 0.0;
    let n = contour.len();

    for i in 0..n {
        let j = (i + 1) % n;
        area += contour[i].x * contour[j].y;
        area -= contour[j].x * contour[i].y;
    }

    area * 0.5
}

/// Perimeter of a closed loop.
pub fn perimeter(contour: &[Point2<f64>]) -> f64 {
    let n = contour.len();
    (0..n)
        .map(|i| (contour[(i + 1) % n] - contour[i]).norm())
        .sum()
}

/// 2D cross product `a × b`.
#[inline]
pub fn cross(a: &Vector2<f64>, b: &Vector2<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Checks that a counter-clockwise loop is convex.
///
/// Turns shorter than `eps` (as a cross product) count as straight.
pub fn is_convex_ccw(points: &[Point2<f64>], eps: f64) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    (0..n).all(|i| {
        let p0 = &points[i];
        let p1 = &points[(i + 1) % n];
        let p2 = &points[(i + 2) % n];
        cross(&(p1 - p0), &(p2 - p1)) >= -eps
    })
}

/// Distance from `p` to the segment `a → b` and the parameter of the
/// closest point, clamped to `[0, 1]`.
pub fn segment_distance(a: &Point2<f64>, b: &Point2<f64>, p: &Point2<f64>) -> (f64, f64) {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq <= 0.0 {
        return ((p - a).norm(), 0.0);
    }
    let t = ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    ((a + ab * t - p).norm(), t)
}

/// Clips a polygon against the half-plane left of the directed line
/// `a → b` (one Sutherland–Hodgman stage).
///
/// Points within `tol` outside the line are treated as inside, so a vertex
/// lying on a shared boundary survives in both neighbouring faces.
pub fn clip_half_plane(
    polygon: &[Point2<f64>],
    a: &Point2<f64>,
    b: &Point2<f64>,
    tol: f64,
) -> Vec<Point2<f64>> {
    let dir = b - a;
    let len = dir.norm();
    if polygon.is_empty() || len <= 0.0 {
        return polygon.to_vec();
    }
    let dist = |p: &Point2<f64>| cross(&dir, &(p - a)) / len;

    let n = polygon.len();
    let mut out = Vec::with_capacity(n + 2);

    for i in 0..n {
        let curr = &polygon[i];
        let next = &polygon[(i + 1) % n];
        let dc = dist(curr);
        let dn = dist(next);
        let curr_in = dc >= -tol;
        let next_in = dn >= -tol;

        if curr_in {
            out.push(*curr);
        }
        // Crossing from one side to the other, measured against the exact
        // line; skip when both ends sit within tolerance of it
        if curr_in != next_in {
            let t = dc / (dc - dn);
            if t.is_finite() && t > 0.0 && t < 1.0 {
                out.push(curr + (next - curr) * t);
            }
        }
    }

    out
}

/// Removes consecutive vertices closer than `tol`, including the wrap-around
/// pair. Returns the indices (into `points`) of the vertices kept.
pub fn dedup_indices(points: &[Point2<f64>], tol: f64) -> Vec<usize> {
    let mut kept: Vec<usize> = Vec::with_capacity(points.len());
    for (i, p) in points.iter().enumerate() {
        if let Some(&last) = kept.last() {
            if (p - points[last]).norm() <= tol {
                continue;
            }
        }
        kept.push(i);
    }
    while kept.len() > 1 {
        let first = points[kept[0]];
        let last = points[kept[kept.len() - 1]];
        if (first - last).norm() <= tol {
            kept.pop();
        } else {
            break;
        }
    }
    kept
}

/// Proper or touching intersection test for segments `p1 → p2` and
/// `q1 → q2`.
pub fn segments_intersect(
    p1: &Point2<f64>,
    p2: &Point2<f64>,
    q1: &Point2<f64>,
    q2: &Point2<f64>,
) -> bool {
    let d1 = cross(&(q2 - q1), &(p1 - q1));
    let d2 = cross(&(q2 - q1), &(p2 - q1));
    let d3 = cross(&(p2 - p1), &(q1 - p1));
    let d4 = cross(&(p2 - p1), &(q2 - p1));

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    let on_segment = |a: &Point2<f64>, b: &Point2<f64>, p: &Point2<f64>| {
        p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
    };

    (d1 == 0.0 && on_segment(q1, q2, p1))
        || (d2 == 0.0 && on_segment(q1, q2, p2))
        || (d3 == 0.0 && on_segment(p1, p2, q1))
        || (d4 == 0.0 && on_segment(p1, p2, q2))
}

/// Checks a loop for crossing edges. Adjacent edges are not compared.
pub fn is_self_intersecting(contour: &[Point2<f64>]) -> bool {
    let n = contour.len();
    if n < 4 {
        return false;
    }
    for i in 0..n {
        let a1 = &contour[i];
        let a2 = &contour[(i + 1) % n];
        for j in (i + 2)..n {
            // Edge n-1 is adjacent to edge 0
            if i == 0 && j == n - 1 {
                continue;
            }
            let b1 = &contour[j];
            let b2 = &contour[(j + 1) % n];
            if segments_intersect(a1, a2, b1, b2) {
                return true;
            }
        }
    }
    false
}

/// Splits a counter-clockwise loop into convex counter-clockwise pieces.
///
/// Convex loops are returned unchanged; anything else is triangulated.
pub fn convex_pieces(contour: &[Point2<f64>], eps: f64) -> Result<Vec<Vec<Point2<f64>>>, String> {
    if is_convex_ccw(contour, eps) {
        return Ok(vec![contour.to_vec()]);
    }

    let mut vertices = Vec::with_capacity(contour.len() * 2);
    for p in contour {
        vertices.push(p.x);
        vertices.push(p.y);
    }

    let indices = earcutr::earcut(&vertices, &[], 2).map_err(|e| format!("{:?}", e))?;
    if indices.is_empty() {
        return Err("no triangles produced".to_string());
    }

    Ok(indices
        .chunks_exact(3)
        .map(|tri| {
            let mut piece: Vec<Point2<f64>> = tri.iter().map(|&i| contour[i]).collect();
            if signed_area(&piece) < 0.0 {
                piece.reverse();
            }
            piece
        })
        .collect())
}
