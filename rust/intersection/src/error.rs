// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for patch intersection.
//!
//! [`Error`] aborts a whole computation and is only raised for malformed
//! input. Per-pair clipping failures are [`GeometryError`]s: they are
//! recorded in the diagnostics and the pair is skipped.

use serde::Serialize;

use crate::Side;

/// Result type alias for intersection operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal errors: the inputs cannot be intersected at all.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// One of the input patches is structurally invalid.
    #[error("invalid {side} patch: {source}")]
    Input {
        side: Side,
        #[source]
        source: patchx_mesh::Error,
    },

    /// A candidate pair references a face that does not exist.
    #[error("candidate {index} ({src_face}, {tgt_face}) is out of range for {n_src} source and {n_tgt} target faces")]
    InvalidCandidate {
        index: usize,
        src_face: usize,
        tgt_face: usize,
        n_src: usize,
        n_tgt: usize,
    },

    /// The configured tolerance does not resolve to a positive distance.
    #[error("merge tolerance must be finite and positive, got {0}")]
    InvalidTolerance(f64),

    /// A configuration parameter is out of its valid range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Recoverable failure to clip one source/target face pair.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeometryError {
    /// The face loop has fewer than three points.
    #[error("{side} face has only {points} points")]
    TooFewPoints { side: Side, points: usize },

    /// The face has (numerically) zero area, or its loop visits a point twice.
    #[error("{side} face is collapsed (area {area:e})")]
    Collapsed { side: Side, area: f64 },

    /// The face deviates from its own plane by more than the allowed amount.
    #[error("{side} face is non-planar (deviation {deviation:e} exceeds {limit:e})")]
    NonPlanar {
        side: Side,
        deviation: f64,
        limit: f64,
    },

    /// The two faces are too far from parallel to share a working plane.
    #[error("faces are misaligned by {angle_deg:.2} degrees (limit {limit_deg:.2})")]
    Misaligned { angle_deg: f64, limit_deg: f64 },

    /// A non-convex face could not be decomposed into triangles.
    #[error("{side} face could not be triangulated: {reason}")]
    Decomposition { side: Side, reason: String },
}
