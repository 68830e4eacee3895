// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Driver configuration loaded from environment variables.

use patchx_intersection::{IntersectionConfig, Tolerance};

/// Driver configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Intersection parameters.
    pub intersection: IntersectionConfig,
    /// Bounding-box margin for the candidate search.
    pub margin: f64,
    /// Number of worker threads for parallel clipping.
    pub worker_threads: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// - `PATCHX_TOLERANCE`: absolute merge tolerance (overrides the relative one)
    /// - `PATCHX_RELATIVE_TOLERANCE`: merge tolerance as a fraction of the
    ///   shortest edge
    /// - `PATCHX_ORIENT_TO_SOURCE`: `true`/`false`
    /// - `PATCHX_MAX_NORMAL_ANGLE`: degrees
    /// - `PATCHX_MARGIN`: candidate search margin
    /// - `WORKER_THREADS`: rayon pool size
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = IntersectionConfig::default();
        let parsed = |key: &str| lookup(key).and_then(|v| v.trim().parse::<f64>().ok());

        let tolerance = match (parsed("PATCHX_TOLERANCE"), parsed("PATCHX_RELATIVE_TOLERANCE")) {
            (Some(d), _) => Tolerance::Absolute(d),
            (None, Some(f)) => Tolerance::Relative(f),
            (None, None) => defaults.tolerance,
        };

        let intersection = IntersectionConfig {
            orient_to_source: lookup("PATCHX_ORIENT_TO_SOURCE")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.orient_to_source),
            tolerance,
            max_normal_angle_deg: parsed("PATCHX_MAX_NORMAL_ANGLE")
                .unwrap_or(defaults.max_normal_angle_deg),
            ..defaults
        };

        Self {
            intersection,
            margin: parsed("PATCHX_MARGIN").unwrap_or(1e-6),
            worker_threads: lookup("WORKER_THREADS")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or_else(num_cpus::get),
        }
    }
}
