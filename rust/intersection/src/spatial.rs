// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Spatial hash for tolerance-based intersection point lookup.
//!
//! Space is divided into cubic cells of side `cell_size`; a query inspects
//! the 3x3x3 block of cells around the query point, so any point within
//! `cell_size` of it is found without comparing against all points.

use nalgebra::Point3;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Grid of point indices. Coordinates live with the caller.
#[derive(Debug)]
pub struct PointIndex {
    cell_size: f64,
    grid: FxHashMap<(i64, i64, i64), SmallVec<[usize; 4]>>,
}

impl PointIndex {
    /// Creates an empty index. Queries must use a radius `<= cell_size`.
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size,
            grid: FxHashMap::default(),
        }
    }

    /// Registers point `index` at `p`.
    pub fn insert(&mut self, index: usize, p: &Point3<f64>) {
        let cell = self.cell_coords(p);
        self.grid.entry(cell).or_default().push(index);
    }

    /// Moves point `index` from `from` to `to`.
    pub fn relocate(&mut self, index: usize, from: &Point3<f64>, to: &Point3<f64>) {
        let old = self.cell_coords(from);
        let new = self.cell_coords(to);
        if old == new {
            return;
        }
        if let Some(indices) = self.grid.get_mut(&old) {
            indices.retain(|i| *i != index);
            if indices.is_empty() {
                self.grid.remove(&old);
            }
        }
        self.grid.entry(new).or_default().push(index);
    }

    /// All registered points within `radius` of `p`, sorted by distance and
    /// then by index.
    pub fn within(&self, points: &[Point3<f64>], p: &Point3<f64>, radius: f64) -> Vec<(usize, f64)> {
        let (cx, cy, cz) = self.cell_coords(p);
        let mut found = Vec::new();

        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    if let Some(indices) = self.grid.get(&(cx + dx, cy + dy, cz + dz)) {
                        for &i in indices {
                            let d = (points[i] - p).norm();
                            if d <= radius {
                                found.push((i, d));
                            }
                        }
                    }
                }
            }
        }

        found.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        found
    }

    /// Nearest registered point within `radius`, ties going to the lower
    /// index.
    pub fn nearest(&self, points: &[Point3<f64>], p: &Point3<f64>, radius: f64) -> Option<(usize, f64)> {
        self.within(points, p, radius).into_iter().next()
    }

    fn cell_coords(&self, p: &Point3<f64>) -> (i64, i64, i64) {
        (
            (p.x / self.cell_size).floor() as i64,
            (p.y / self.cell_size).floor() as i64,
            (p.z / self.cell_size).floor() as i64,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indexed(points: &[Point3<f64>], cell: f64) -> PointIndex {
        let mut index = PointIndex::new(cell);
        for (i, p) in points.iter().enumerate() {
            index.insert(i, p);
        }
        index
    }

    #[test]
    fn finds_nearest_within_radius() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 10.0, 10.0),
            Point3::new(0.004, 0.0, 0.0),
        ];
        let index = indexed(&points, 0.01);

        let (i, d) = index.nearest(&points, &Point3::new(0.003, 0.0, 0.0), 0.01).unwrap();
        assert_eq!(i, 2);
        assert!((d - 0.001).abs() < 1e-12);

        assert!(index.nearest(&points, &Point3::new(1.0, 0.0, 0.0), 0.01).is_none());
    }

    #[test]
    fn finds_across_cell_boundaries() {
        let points = vec![Point3::new(0.0099, 0.0, 0.0)];
        let index = indexed(&points, 0.01);
        // Query sits in the neighbouring cell
        let hit = index.nearest(&points, &Point3::new(0.0101, 0.0, -0.0001), 0.001);
        assert_eq!(hit.map(|h| h.0), Some(0));
    }

    #[test]
    fn relocated_point_is_found_at_new_position() {
        let mut points = vec![Point3::new(0.05, 0.0, 0.0)];
        let mut index = indexed(&points, 0.1);

        let to = Point3::new(0.35, 0.0, 0.0);
        index.relocate(0, &points[0], &to);
        points[0] = to;

        assert!(index.nearest(&points, &Point3::new(0.0, 0.0, 0.0), 0.1).is_none());
        assert_eq!(index.nearest(&points, &Point3::new(0.3, 0.0, 0.0), 0.1).map(|h| h.0), Some(0));
    }

    #[test]
    fn ties_go_to_lower_index() {
        let points = vec![Point3::new(1.0, 0.0, 0.0), Point3::new(-1.0, 0.0, 0.0)];
        let index = indexed(&points, 2.0);
        let hits = index.within(&points, &Point3::origin(), 1.5);
        assert_eq!(hits.iter().map(|h| h.0).collect::<Vec<_>>(), vec![0, 1]);
    }
}
