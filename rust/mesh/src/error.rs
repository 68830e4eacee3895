// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for surface patch construction and validation.
//!
//! Every variant describes broken references or adjacency, i.e. an input
//! that is not a valid indexed surface. These errors are fatal for an
//! intersection computation: no partial result is produced from such a patch.

/// Result type alias for patch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised for malformed surface patches.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// A face references a point index that does not exist.
    #[error("face {face} references point {point}, but the patch has {n_points} points")]
    PointOutOfRange {
        face: usize,
        point: usize,
        n_points: usize,
    },

    /// An edge references a point index that does not exist.
    #[error("edge {edge} references point {point}, but the patch has {n_points} points")]
    EdgePointOutOfRange {
        edge: usize,
        point: usize,
        n_points: usize,
    },

    /// A face's edge list does not match its point loop.
    #[error("face {face} edge slot {slot} does not join its loop points")]
    FaceEdgeMismatch { face: usize, slot: usize },

    /// A face references an edge index that does not exist.
    #[error("face {face} references edge {edge}, but the patch has {n_edges} edges")]
    EdgeOutOfRange {
        face: usize,
        edge: usize,
        n_edges: usize,
    },

    /// The edge-to-face adjacency disagrees with the face-to-edge adjacency.
    #[error("edge {edge} face list is inconsistent with face {face}")]
    EdgeFaceMismatch { edge: usize, face: usize },

    /// An edge is shared by more than two faces.
    #[error("edge {edge} is shared by {faces} faces")]
    NonManifoldEdge { edge: usize, faces: usize },

    /// A point coordinate is not finite.
    #[error("point {point} has a non-finite coordinate")]
    NonFinitePoint { point: usize },
}
