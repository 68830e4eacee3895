// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Correspondence between the intersection mesh and one original patch.
//!
//! The same structure is kept once for the source and once for the target
//! patch. Forward tables are indexed by original entity, inverse tables by
//! intersection entity; `None` means "no corresponding entity".

use serde::{Deserialize, Serialize};

/// Bidirectional entity mapping for one side of an intersection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Correspondence {
    /// Original point → intersection point at the same location.
    pub(crate) point_points: Vec<Option<usize>>,
    /// Original edge → intersection points on its interior, ordered along
    /// the edge.
    pub(crate) edge_points: Vec<Vec<usize>>,
    /// Original face → intersection faces clipped from it.
    pub(crate) face_faces: Vec<Vec<usize>>,
    /// Intersection point → original point.
    pub(crate) point_of_point: Vec<Option<usize>>,
    /// Intersection point → original edge whose interior it lies on.
    pub(crate) edge_of_point: Vec<Option<usize>>,
    /// Intersection point → original face it was projected from.
    pub(crate) face_of_point: Vec<Option<usize>>,
    /// Intersection face → original face.
    pub(crate) face_of_face: Vec<usize>,
}

impl Correspondence {
    pub(crate) fn new(n_points: usize, n_edges: usize, n_faces: usize) -> Self {
        Self {
            point_points: vec![None; n_points],
            edge_points: vec![Vec::new(); n_edges],
            face_faces: vec![Vec::new(); n_faces],
            point_of_point: Vec::new(),
            edge_of_point: Vec::new(),
            face_of_point: Vec::new(),
            face_of_face: Vec::new(),
        }
    }

    /// Extends the per-point tables for a newly created intersection point.
    pub(crate) fn push_point(&mut self) {
        self.point_of_point.push(None);
        self.edge_of_point.push(None);
        self.face_of_point.push(None);
    }

    /// Registers intersection face `face` as clipped from original `origin`.
    pub(crate) fn push_face(&mut self, face: usize, origin: usize) {
        self.face_of_face.push(origin);
        self.face_faces[origin].push(face);
    }

    /// Drops removed points and faces and renumbers the survivors.
    ///
    /// Both maps are monotone (old order is preserved), so ordered lists
    /// stay ordered.
    pub(crate) fn renumber(&mut self, point_map: &[Option<usize>], face_map: &[Option<usize>]) {
        for entry in &mut self.point_points {
            *entry = entry.and_then(|i| point_map[i]);
        }
        for list in &mut self.edge_points {
            *list = list.iter().filter_map(|&i| point_map[i]).collect();
        }
        for list in &mut self.face_faces {
            *list = list.iter().filter_map(|&f| face_map[f]).collect();
        }

        let keep_point = |i: &usize| point_map[*i].is_some();
        self.point_of_point = retain_indexed(&self.point_of_point, keep_point);
        self.edge_of_point = retain_indexed(&self.edge_of_point, keep_point);
        self.face_of_point = retain_indexed(&self.face_of_point, keep_point);
        self.face_of_face = retain_indexed(&self.face_of_face, |f| face_map[*f].is_some());
    }

    /// Original point → intersection point.
    pub fn point_points(&self) -> &[Option<usize>] {
        &self.point_points
    }

    /// Original edge → ordered intersection points on its interior.
    pub fn edge_points(&self) -> &[Vec<usize>] {
        &self.edge_points
    }

    /// Original face → intersection faces.
    pub fn face_faces(&self) -> &[Vec<usize>] {
        &self.face_faces
    }

    /// Intersection point → original point.
    pub fn point_of_point(&self) -> &[Option<usize>] {
        &self.point_of_point
    }

    /// Intersection point → original edge.
    pub fn edge_of_point(&self) -> &[Option<usize>] {
        &self.edge_of_point
    }

    /// Intersection point → original face.
    pub fn face_of_point(&self) -> &[Option<usize>] {
        &self.face_of_point
    }

    /// Intersection face → original face.
    pub fn face_of_face(&self) -> &[usize] {
        &self.face_of_face
    }
}

fn retain_indexed<V: Copy>(values: &[V], keep: impl Fn(&usize) -> bool) -> Vec<V> {
    values
        .iter()
        .enumerate()
        .filter(|(i, _)| keep(i))
        .map(|(_, v)| *v)
        .collect()
}
