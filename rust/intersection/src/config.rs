// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Intersection configuration.
//!
//! The merge tolerance is the only parameter that changes topology: two
//! points closer than it are the same point. It is either given as an
//! absolute distance or as a fraction of the shortest edge found in either
//! patch.

use patchx_mesh::PatchSurface;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default relative merge tolerance (fraction of the shortest edge).
pub const DEFAULT_RELATIVE_TOLERANCE: f64 = 1e-5;

/// How the absolute point-merge distance is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Tolerance {
    /// A fixed distance in model units.
    Absolute(f64),
    /// A fraction of the shortest edge length over both patches.
    Relative(f64),
}

impl Default for Tolerance {
    fn default() -> Self {
        Tolerance::Relative(DEFAULT_RELATIVE_TOLERANCE)
    }
}

impl Tolerance {
    /// Resolves the tolerance to an absolute distance for a pair of patches.
    ///
    /// Patches without any edges have no feature size; a relative tolerance
    /// is then taken relative to a unit length.
    pub fn resolve<S, T>(&self, src: &S, tgt: &T) -> Result<f64>
    where
        S: PatchSurface + ?Sized,
        T: PatchSurface + ?Sized,
    {
        let value = match *self {
            Tolerance::Absolute(d) => d,
            Tolerance::Relative(f) => {
                let feature = match (src.min_edge_length(), tgt.min_edge_length()) {
                    (Some(a), Some(b)) => a.min(b),
                    (Some(a), None) | (None, Some(a)) => a,
                    (None, None) => 1.0,
                };
                f * feature
            }
        };

        if value.is_finite() && value > 0.0 {
            Ok(value)
        } else {
            Err(Error::InvalidTolerance(value))
        }
    }
}

/// Parameters of one intersection computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntersectionConfig {
    /// Orient intersection faces like their source face (`true`) or like
    /// their target face (`false`).
    pub orient_to_source: bool,
    /// Point merge distance.
    pub tolerance: Tolerance,
    /// Allowed deviation of a face from its own plane, as a fraction of the
    /// square root of its area.
    pub max_non_planarity: f64,
    /// Largest angle between a source and a target face normal (degrees)
    /// for which the pair is still clipped.
    pub max_normal_angle_deg: f64,
    /// Merge candidates closer than `tolerance * ambiguity_factor` but
    /// farther than `tolerance / ambiguity_factor` are reported as ambiguous.
    pub ambiguity_factor: f64,
}

impl Default for IntersectionConfig {
    fn default() -> Self {
        Self {
            orient_to_source: true,
            tolerance: Tolerance::default(),
            max_non_planarity: 1e-3,
            max_normal_angle_deg: 45.0,
            ambiguity_factor: 3.0,
        }
    }
}

impl IntersectionConfig {
    /// Sets the winding convention.
    pub fn with_orient_to_source(mut self, orient_to_source: bool) -> Self {
        self.orient_to_source = orient_to_source;
        self
    }

    /// Sets the merge tolerance.
    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the largest accepted angle between paired face normals.
    pub fn with_max_normal_angle(mut self, degrees: f64) -> Self {
        self.max_normal_angle_deg = degrees;
        self
    }

    /// Checks the parameters that do not depend on the patches.
    pub fn validate(&self) -> Result<()> {
        if !(self.max_non_planarity.is_finite() && self.max_non_planarity >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "max_non_planarity must be non-negative, got {}",
                self.max_non_planarity
            )));
        }
        if !(self.max_normal_angle_deg > 0.0 && self.max_normal_angle_deg < 90.0) {
            return Err(Error::InvalidConfig(format!(
                "max_normal_angle_deg must lie in (0, 90), got {}",
                self.max_normal_angle_deg
            )));
        }
        if !(self.ambiguity_factor.is_finite() && self.ambiguity_factor >= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "ambiguity_factor must be at least 1, got {}",
                self.ambiguity_factor
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use patchx_mesh::SurfaceMesh;

    fn square(size: f64) -> SurfaceMesh {
        SurfaceMesh::from_coords(
            &[
                [0.0, 0.0, 0.0],
                [size, 0.0, 0.0],
                [size, size, 0.0],
                [0.0, size, 0.0],
            ],
            vec![vec![0, 1, 2, 3]],
        )
        .unwrap()
    }

    #[test]
    fn relative_tolerance_scales_with_shortest_edge() {
        let tol = Tolerance::Relative(1e-3)
            .resolve(&square(2.0), &square(0.5))
            .unwrap();
        assert_relative_eq!(tol, 0.5e-3);
    }

    #[test]
    fn absolute_tolerance_ignores_patches() {
        let tol = Tolerance::Absolute(0.25)
            .resolve(&square(2.0), &square(0.5))
            .unwrap();
        assert_relative_eq!(tol, 0.25);
    }

    #[test]
    fn rejects_non_positive_tolerance() {
        assert!(matches!(
            Tolerance::Absolute(0.0).resolve(&square(1.0), &square(1.0)),
            Err(Error::InvalidTolerance(_))
        ));
        assert!(Tolerance::Relative(f64::NAN)
            .resolve(&square(1.0), &square(1.0))
            .is_err());
    }

    #[test]
    fn validates_angle_limit() {
        let config = IntersectionConfig::default().with_max_normal_angle(95.0);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
        assert!(IntersectionConfig::default().validate().is_ok());
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: IntersectionConfig =
            serde_json::from_str(r#"{"orient_to_source": false, "tolerance": {"kind": "absolute", "value": 1e-6}}"#)
                .unwrap();
        assert!(!config.orient_to_source);
        assert_eq!(config.tolerance, Tolerance::Absolute(1e-6));
        assert_relative_eq!(config.ambiguity_factor, 3.0);
    }
}
