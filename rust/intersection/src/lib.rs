// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # patchx-intersection
//!
//! Geometric intersection of two non-matching surface patches.
//!
//! Given a *source* and a *target* patch covering (roughly) the same
//! surface, the engine builds a third mesh whose faces are the pairwise
//! overlaps of source and target faces. Every intersection point, edge and
//! face keeps track of where it came from on both sides, which is what
//! conservative field transfer between the two patches needs.
//!
//! ## Pipeline
//!
//! 1. **Clip**: each candidate face pair is projected onto a shared plane
//!    and clipped in parallel ([`clip`]).
//! 2. **Assemble**: results are merged, in candidate order, into one point
//!    space with tolerance-based deduplication ([`spatial`]).
//! 3. **Finalize**: invalid faces are removed, winding is normalized and
//!    orphan points are dropped.
//!
//! ```
//! use patchx_intersection::{intersect, IntersectionConfig};
//! use patchx_mesh::SurfaceMesh;
//!
//! let square = |x0: f64| {
//!     SurfaceMesh::from_coords(
//!         &[[x0, 0.0, 0.0], [x0 + 1.0, 0.0, 0.0], [x0 + 1.0, 1.0, 0.0], [x0, 1.0, 0.0]],
//!         vec![vec![0, 1, 2, 3]],
//!     )
//!     .unwrap()
//! };
//!
//! let result = intersect(&square(0.0), &square(0.5), &[(0, 0)], &IntersectionConfig::default())
//!     .unwrap();
//!
//! assert_eq!(result.faces().len(), 1);
//! assert!((result.face_area(0) - 0.5).abs() < 1e-9);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

mod assemble;
pub mod broadphase;
pub mod cache;
pub mod clip;
pub mod config;
pub mod correspondence;
pub mod diagnostics;
pub mod error;
pub mod intersection;
mod orient;
pub mod plane;
pub mod polygon;
pub mod report;
pub mod serialization;
pub mod spatial;

pub use broadphase::candidate_pairs;
pub use cache::IntersectionCache;
pub use clip::{Clipper, Locus, PairOverlap};
pub use config::{IntersectionConfig, Tolerance};
pub use correspondence::Correspondence;
pub use diagnostics::{Diagnostics, RemovalReason};
pub use error::{Error, GeometryError, Result};
pub use intersection::PatchIntersection;
pub use report::IntersectionReport;

/// One of the two input patches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Source,
    Target,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Source => write!(f, "source"),
            Side::Target => write!(f, "target"),
        }
    }
}

/// Intersects `src` with `tgt` over the given candidate face pairs.
///
/// Shorthand for [`PatchIntersection::new`].
pub fn intersect<S, T>(
    src: &S,
    tgt: &T,
    candidates: &[(usize, usize)],
    config: &IntersectionConfig,
) -> Result<PatchIntersection>
where
    S: patchx_mesh::PatchSurface + ?Sized,
    T: patchx_mesh::PatchSurface + ?Sized,
{
    PatchIntersection::new(src, tgt, candidates, config)
}
