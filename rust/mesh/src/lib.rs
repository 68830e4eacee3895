// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # patchx-mesh
//!
//! Indexed polygonal surface patches for patch intersection.
//!
//! A patch is a set of planar-ish polygonal faces over a shared point list,
//! with explicit edges and bidirectional face/edge adjacency. The
//! intersection engine only ever sees patches through the [`PatchSurface`]
//! trait, so callers can expose their own mesh storage without copying;
//! [`SurfaceMesh`] is the owned implementation used by tests and tools.
//!
//! ```
//! use patchx_mesh::{PatchSurface, SurfaceMesh};
//!
//! let square = SurfaceMesh::from_coords(
//!     &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
//!     vec![vec![0, 1, 2, 3]],
//! )
//! .unwrap();
//!
//! assert_eq!(square.n_edges(), 4);
//! assert!((square.face_area(0) - 1.0).abs() < 1e-12);
//! ```

pub mod error;
pub mod geometry;
pub mod surface;
pub mod validate;

pub use error::{Error, Result};
pub use geometry::BoundingBox;
pub use surface::{PatchSurface, SurfaceMesh};
pub use validate::validate;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point3, Vector3};
