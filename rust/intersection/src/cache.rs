// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory cache of intersection results.
//!
//! Results are immutable, so the cache never updates an entry: any change
//! to the inputs produces a different fingerprint and a fresh computation.
//! Entries are shared through `Arc` and can be handed to other threads.
//!
//! Entries are identified by a 64-bit fingerprint only; the inputs are not
//! stored or compared. Two different problems with colliding fingerprints
//! would share one result. The cache holds at most `capacity` entries and
//! evicts the oldest one when full.

use std::hash::Hasher;
use std::sync::Arc;

use patchx_mesh::PatchSurface;
use rustc_hash::{FxHashMap, FxHasher};

use crate::config::{IntersectionConfig, Tolerance};
use crate::error::Result;
use crate::intersection::PatchIntersection;

#[derive(Debug)]
struct CacheEntry {
    version: u64,
    result: Arc<PatchIntersection>,
}

/// Entry limit of [`IntersectionCache::new`].
pub const DEFAULT_CAPACITY: usize = 64;

/// Cache of intersections keyed by a fingerprint of all inputs.
#[derive(Debug)]
pub struct IntersectionCache {
    entries: FxHashMap<u64, CacheEntry>,
    capacity: usize,
    version: u64,
    hits: u64,
    misses: u64,
}

impl Default for IntersectionCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl IntersectionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache holding at most `capacity` results (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: FxHashMap::default(),
            capacity: capacity.max(1),
            version: 0,
            hits: 0,
            misses: 0,
        }
    }

    /// Fingerprint of one intersection problem.
    pub fn fingerprint<S, T>(
        src: &S,
        tgt: &T,
        candidates: &[(usize, usize)],
        config: &IntersectionConfig,
    ) -> u64
    where
        S: PatchSurface + ?Sized,
        T: PatchSurface + ?Sized,
    {
        let mut hasher = FxHasher::default();
        hash_patch(&mut hasher, src);
        hash_patch(&mut hasher, tgt);

        hasher.write_usize(candidates.len());
        for &(s, t) in candidates {
            hasher.write_usize(s);
            hasher.write_usize(t);
        }

        hasher.write_u8(config.orient_to_source as u8);
        match config.tolerance {
            Tolerance::Absolute(d) => {
                hasher.write_u8(0);
                hasher.write_u64(d.to_bits());
            }
            Tolerance::Relative(f) => {
                hasher.write_u8(1);
                hasher.write_u64(f.to_bits());
            }
        }
        hasher.write_u64(config.max_non_planarity.to_bits());
        hasher.write_u64(config.max_normal_angle_deg.to_bits());
        hasher.write_u64(config.ambiguity_factor.to_bits());
        hasher.finish()
    }

    /// Returns the cached intersection for these inputs, computing and
    /// storing it on a miss. Errors are not cached.
    pub fn get_or_compute<S, T>(
        &mut self,
        src: &S,
        tgt: &T,
        candidates: &[(usize, usize)],
        config: &IntersectionConfig,
    ) -> Result<Arc<PatchIntersection>>
    where
        S: PatchSurface + ?Sized,
        T: PatchSurface + ?Sized,
    {
        let key = Self::fingerprint(src, tgt, candidates, config);
        if let Some(entry) = self.entries.get(&key) {
            self.hits += 1;
            tracing::debug!(key, version = entry.version, "Intersection cache hit");
            return Ok(Arc::clone(&entry.result));
        }

        self.misses += 1;
        let result = Arc::new(PatchIntersection::new(src, tgt, candidates, config)?);
        if self.entries.len() >= self.capacity {
            self.evict_oldest();
        }
        self.version += 1;
        self.entries.insert(
            key,
            CacheEntry {
                version: self.version,
                result: Arc::clone(&result),
            },
        );
        tracing::debug!(key, version = self.version, "Cached intersection");
        Ok(result)
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.version)
            .map(|(&key, _)| key);
        if let Some(key) = oldest {
            self.entries.remove(&key);
            tracing::debug!(key, "Evicted intersection");
        }
    }

    /// Version stamp of the entry for `key`, if cached.
    pub fn version_of(&self, key: u64) -> Option<u64> {
        self.entries.get(&key).map(|e| e.version)
    }

    /// Drops every entry.
    pub fn invalidate(&mut self) {
        self.entries.clear();
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

fn hash_patch<P: PatchSurface + ?Sized>(hasher: &mut FxHasher, patch: &P) {
    hasher.write_usize(patch.n_points());
    for i in 0..patch.n_points() {
        let p = patch.point(i);
        hasher.write_u64(p.x.to_bits());
        hasher.write_u64(p.y.to_bits());
        hasher.write_u64(p.z.to_bits());
    }
    hasher.write_usize(patch.n_faces());
    for f in 0..patch.n_faces() {
        let face = patch.face(f);
        hasher.write_usize(face.len());
        for &i in face {
            hasher.write_usize(i);
        }
    }
}
