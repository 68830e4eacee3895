// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Record of everything an intersection computation dropped or doubted.
//!
//! Nothing here affects the intersection mesh; it only explains it.
//! Positions are stored as coordinates rather than point indices so the
//! records stay meaningful after the final renumbering.

use serde::Serialize;

use crate::error::GeometryError;
use crate::Side;

/// A candidate pair that could not be clipped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedPair {
    pub src_face: usize,
    pub tgt_face: usize,
    pub error: GeometryError,
}

/// A point merge decided close to the tolerance threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToleranceAmbiguity {
    /// The point being registered.
    pub position: [f64; 3],
    /// The existing intersection point it was compared against.
    pub neighbour: [f64; 3],
    pub distance: f64,
    /// Whether the two were merged.
    pub merged: bool,
}

/// The kind of original entity two tags disagreed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TagKind {
    Point,
    Edge,
}

/// An original entity could not be attached to an intersection point.
///
/// Either the point already carries a different entity of the same kind
/// (the first-registered tag is kept), or the original point is already
/// owned by another intersection point (`kept` is then `None`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagConflict {
    pub side: Side,
    pub kind: TagKind,
    pub position: [f64; 3],
    pub kept: Option<usize>,
    pub dropped: usize,
}

/// Why an assembled face was removed by the consistency pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalReason {
    /// Zero signed area after point merging.
    Collapsed,
    /// Winding opposite to its source face after point merging.
    Inverted,
    /// Two non-adjacent edges cross.
    SelfIntersecting,
}

/// A face removed by the consistency pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemovedFace {
    pub src_face: usize,
    pub tgt_face: usize,
    pub reason: RemovalReason,
    /// Signed area about the source face normal.
    pub area: f64,
}

/// Per-computation diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    /// Candidate pairs supplied by the caller.
    pub candidate_pairs: usize,
    /// Candidate pairs listed more than once (processed once).
    pub duplicate_pairs: usize,
    /// Pairs that contributed at least one face.
    pub clipped_pairs: usize,
    /// Pairs without common area.
    pub disjoint_pairs: usize,
    /// Pairs that overlapped only in zero-area slivers.
    pub degenerate_pairs: usize,
    /// Overlap fragments discarded as slivers or collapsed by merging.
    pub degenerate_fragments: usize,
    pub skipped: Vec<SkippedPair>,
    pub ambiguities: Vec<ToleranceAmbiguity>,
    pub tag_conflicts: Vec<TagConflict>,
    pub removed_faces: Vec<RemovedFace>,
}

impl Diagnostics {
    /// Number of pairs skipped with a geometry error.
    pub fn skipped_pairs(&self) -> usize {
        self.skipped.len()
    }

    /// `true` when nothing was skipped, doubted or removed.
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
            && self.ambiguities.is_empty()
            && self.tag_conflicts.is_empty()
            && self.removed_faces.is_empty()
    }
}
