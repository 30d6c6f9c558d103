//! Grid cells and the occupancy index used for snapping and stacking.

use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Side length of one grid cell in world units.
pub const CELL_SIZE: f64 = 150.0;

/// Round half towards positive infinity, matching how browsers round
/// coordinates so saved layouts land in the same cells.
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// A discrete grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellKey {
    pub x: i64,
    pub y: i64,
}

impl CellKey {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// The cell nearest to a world position.
    pub fn nearest(point: Point) -> Self {
        Self {
            x: round_half_up(point.x / CELL_SIZE),
            y: round_half_up(point.y / CELL_SIZE),
        }
    }

    /// The cell that contains a world position.
    pub fn containing(point: Point) -> Self {
        Self {
            x: (point.x / CELL_SIZE).floor() as i64,
            y: (point.y / CELL_SIZE).floor() as i64,
        }
    }

    /// World position of the cell's origin corner.
    pub fn origin(self) -> Point {
        Point::new(self.x as f64 * CELL_SIZE, self.y as f64 * CELL_SIZE)
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.x, self.y)
    }
}

/// Snap a world point to the origin of its nearest cell.
pub fn snap_to_grid(point: Point) -> Point {
    CellKey::nearest(point).origin()
}

/// Occupancy counts for snapped cards, keyed by cell.
///
/// Every snapped card contributes exactly one count to the cell it sits in.
/// Callers must `vacate` the old cell before a card leaves it and `occupy`
/// the new one once it lands.
#[derive(Debug, Clone, Default)]
pub struct GridIndex {
    counts: HashMap<CellKey, u32>,
}

impl GridIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a card landing in `key`.
    /// Returns true if the cell was already occupied, i.e. it is now stacked.
    pub fn occupy(&mut self, key: CellKey) -> bool {
        let count = self.counts.entry(key).or_insert(0);
        let was_occupied = *count >= 1;
        *count += 1;
        was_occupied
    }

    /// Record a card leaving `key`. Never goes below zero.
    pub fn vacate(&mut self, key: CellKey) {
        if let Some(count) = self.counts.get_mut(&key) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.counts.remove(&key);
            }
        }
    }

    /// Number of snapped cards in a cell.
    pub fn count(&self, key: CellKey) -> u32 {
        self.counts.get(&key).copied().unwrap_or(0)
    }

    /// Whether two or more cards share the cell.
    pub fn is_stacked(&self, key: CellKey) -> bool {
        self.count(key) >= 2
    }

    /// Forget all occupancy.
    pub fn clear(&mut self) {
        self.counts.clear();
    }

    /// Total number of snapped cards recorded.
    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    /// Iterate over occupied cells and their counts.
    pub fn cells(&self) -> impl Iterator<Item = (CellKey, u32)> + '_ {
        self.counts.iter().map(|(key, count)| (*key, *count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_key_display() {
        assert_eq!(CellKey::new(3, -2).to_string(), "3.-2");
    }

    #[test]
    fn test_nearest_cell_rounds() {
        assert_eq!(CellKey::nearest(Point::new(74.0, 76.0)), CellKey::new(0, 1));
        assert_eq!(CellKey::nearest(Point::new(-74.0, -76.0)), CellKey::new(0, -1));
        // Exact half cells round up, like the browser does.
        assert_eq!(CellKey::nearest(Point::new(75.0, -75.0)), CellKey::new(1, 0));
    }

    #[test]
    fn test_containing_cell_floors() {
        assert_eq!(CellKey::containing(Point::new(149.0, 151.0)), CellKey::new(0, 1));
        assert_eq!(CellKey::containing(Point::new(-1.0, 0.0)), CellKey::new(-1, 0));
    }

    #[test]
    fn test_snap_to_grid() {
        assert_eq!(snap_to_grid(Point::new(160.0, 290.0)), Point::new(150.0, 300.0));
    }

    #[test]
    fn test_occupy_reports_stacking() {
        let mut grid = GridIndex::new();
        let key = CellKey::new(1, 1);
        assert!(!grid.occupy(key));
        assert!(!grid.is_stacked(key));
        assert!(grid.occupy(key));
        assert!(grid.is_stacked(key));
        assert_eq!(grid.count(key), 2);
    }

    #[test]
    fn test_vacate_never_negative() {
        let mut grid = GridIndex::new();
        let key = CellKey::new(0, 0);
        grid.vacate(key);
        assert_eq!(grid.count(key), 0);

        grid.occupy(key);
        grid.vacate(key);
        grid.vacate(key);
        assert_eq!(grid.count(key), 0);
        assert_eq!(grid.total(), 0);
    }

    #[test]
    fn test_clear() {
        let mut grid = GridIndex::new();
        grid.occupy(CellKey::new(0, 0));
        grid.occupy(CellKey::new(4, 2));
        assert_eq!(grid.total(), 2);
        grid.clear();
        assert_eq!(grid.total(), 0);
        assert_eq!(grid.cells().count(), 0);
    }
}
