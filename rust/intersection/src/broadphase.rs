// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bounding-box candidate search for callers without their own.
//!
//! Face pairs are candidates when their axis-aligned boxes, grown by a
//! margin, overlap. Coupled patches are usually separated by a small gap
//! in the normal direction, so the margin should be at least that gap.

use patchx_mesh::{BoundingBox, PatchSurface};
use rayon::prelude::*;

fn face_boxes<P: PatchSurface + ?Sized>(patch: &P, margin: f64) -> Vec<BoundingBox> {
    (0..patch.n_faces())
        .into_par_iter()
        .map(|f| BoundingBox::from_points(&patch.face_points(f)).expanded(margin))
        .collect()
}

/// Source/target face pairs whose bounding boxes overlap.
///
/// Pairs are sorted by source face, then target face.
pub fn candidate_pairs<S, T>(src: &S, tgt: &T, margin: f64) -> Vec<(usize, usize)>
where
    S: PatchSurface + ?Sized,
    T: PatchSurface + ?Sized,
{
    let src_boxes = face_boxes(src, margin);
    let tgt_boxes = face_boxes(tgt, margin);

    // Targets sorted by lower x bound; a source box only needs the prefix
    // that starts before it ends
    let mut order: Vec<usize> = (0..tgt_boxes.len()).collect();
    order.sort_by(|&a, &b| {
        tgt_boxes[a]
            .min
            .x
            .total_cmp(&tgt_boxes[b].min.x)
            .then(a.cmp(&b))
    });

    let pairs: Vec<(usize, usize)> = src_boxes
        .par_iter()
        .enumerate()
        .flat_map_iter(|(s, sb)| {
            let end = order.partition_point(|&t| tgt_boxes[t].min.x <= sb.max.x);
            let mut hits: Vec<usize> = order[..end]
                .iter()
                .copied()
                .filter(|&t| sb.overlaps(&tgt_boxes[t]))
                .collect();
            hits.sort_unstable();
            hits.into_iter().map(move |t| (s, t))
        })
        .collect();

    tracing::debug!(
        src_faces = src_boxes.len(),
        tgt_faces = tgt_boxes.len(),
        pairs = pairs.len(),
        "Bounding-box candidates"
    );
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchx_mesh::SurfaceMesh;

    fn grid(n: usize, offset: [f64; 3]) -> SurfaceMesh {
        let mut coords = Vec::new();
        for j in 0..=n {
            for i in 0..=n {
                coords.push([i as f64 + offset[0], j as f64 + offset[1], offset[2]]);
            }
        }
        let mut faces = Vec::new();
        for j in 0..n {
            for i in 0..n {
                let p = j * (n + 1) + i;
                faces.push(vec![p, p + 1, p + n + 2, p + n + 1]);
            }
        }
        SurfaceMesh::from_coords(&coords, faces).unwrap()
    }

    #[test]
    fn shifted_grids_pair_with_four_neighbours() {
        let src = grid(2, [0.0, 0.0, 0.0]);
        let tgt = grid(2, [0.5, 0.5, 0.0]);
        let pairs = candidate_pairs(&src, &tgt, 1e-6);

        // Source face 0 spans [0,1]^2 and meets only target face 0
        assert_eq!(pairs.iter().filter(|p| p.0 == 0).count(), 1);
        // Source face 3 spans [1,2]^2 and meets all four target faces
        assert_eq!(
            pairs.iter().filter(|p| p.0 == 3).map(|p| p.1).collect::<Vec<_>>(),
            vec![0, 1, 2, 3]
        );
        let mut sorted = pairs.clone();
        sorted.sort();
        assert_eq!(pairs, sorted);
    }

    #[test]
    fn margin_bridges_normal_gap() {
        let src = grid(1, [0.0, 0.0, 0.0]);
        let tgt = grid(1, [0.0, 0.0, 0.01]);
        assert!(candidate_pairs(&src, &tgt, 1e-3).is_empty());
        assert_eq!(candidate_pairs(&src, &tgt, 0.01), vec![(0, 0)]);
    }
}
