//! # voxel_grid
//!
//! Sparse occupancy store for a unit-cube build lattice, plus the coordinate
//! pipeline that maps between *world* space (where hand positions are
//! sampled), *build-local* space (world rotated by the inverse of the current
//! build orientation — the frame the grid is defined in) and integer *grid*
//! cells.
//!
//! The store is deliberately small and bounded: membership, insert and delete
//! are O(1) amortized, and the vertical extent used for color-gradient
//! normalisation is recomputed by full rescan on removal, which is fine
//! because `capacity` is a small fixed constant (1000 by default).

pub mod space;

use std::collections::HashSet;

// ════════════════════════════════════════════════════════════════════════════
// GridCell
// ════════════════════════════════════════════════════════════════════════════

/// Integer (x, y, z) address of a unit-cube slot in the build lattice.
///
/// At most one occupied record exists per cell; cells are never mutated in
/// place — they are created by a successful add and destroyed by a successful
/// remove (or a full reset).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GridCell {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl GridCell {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        GridCell { x, y, z }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// YRange — inclusive vertical extent of occupied cells
// ════════════════════════════════════════════════════════════════════════════

/// Inclusive vertical bounds of the occupied cells.
///
/// An empty store reports [`YRange::EMPTY`], a defined zero-range sentinel —
/// never an unbounded or invalid range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct YRange {
    pub min: i32,
    pub max: i32,
}

impl YRange {
    /// Sentinel returned while no cell is occupied.
    pub const EMPTY: YRange = YRange { min: 0, max: 0 };

    pub fn span(&self) -> i32 {
        self.max - self.min
    }

    /// True when all occupied cells sit at a single height (or none do).
    pub fn is_degenerate(&self) -> bool {
        self.max <= self.min
    }
}

// ════════════════════════════════════════════════════════════════════════════
// OccupancyStore
// ════════════════════════════════════════════════════════════════════════════

/// Sparse set of occupied grid cells with a fixed admission capacity.
///
/// Capacity is the sole admission-control mechanism: once full, [`add`]
/// silently refuses (boolean return, no error, no eviction).
///
/// [`add`]: OccupancyStore::add
#[derive(Debug)]
pub struct OccupancyStore {
    cells:    HashSet<GridCell>,
    capacity: usize,
    min_y:    i32,
    max_y:    i32,
}

impl OccupancyStore {
    pub fn new(capacity: usize) -> Self {
        OccupancyStore {
            cells: HashSet::with_capacity(capacity),
            capacity,
            min_y: 0,
            max_y: 0,
        }
    }

    /// Insert a cell. Returns false — with no state change — when the store
    /// is at capacity or the cell is already occupied.
    pub fn add(&mut self, cell: GridCell) -> bool {
        if self.cells.len() >= self.capacity || self.cells.contains(&cell) {
            return false;
        }
        if self.cells.is_empty() {
            self.min_y = cell.y;
            self.max_y = cell.y;
        } else {
            self.min_y = self.min_y.min(cell.y);
            self.max_y = self.max_y.max(cell.y);
        }
        self.cells.insert(cell);
        true
    }

    /// Pure membership query.
    pub fn has(&self, cell: GridCell) -> bool {
        self.cells.contains(&cell)
    }

    /// Delete a cell. Returns false when it was absent.
    ///
    /// The vertical extent is recomputed by a full rescan of the survivors;
    /// O(n), but n is bounded by the (small) capacity.
    pub fn remove(&mut self, cell: GridCell) -> bool {
        if !self.cells.remove(&cell) {
            return false;
        }
        self.rescan_extent();
        true
    }

    /// Empty the store and reset the extent to the sentinel.
    pub fn clear(&mut self) {
        self.cells.clear();
        self.min_y = 0;
        self.max_y = 0;
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.cells.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Inclusive vertical bounds, or [`YRange::EMPTY`] when the store is empty.
    pub fn y_range(&self) -> YRange {
        if self.cells.is_empty() {
            YRange::EMPTY
        } else {
            YRange { min: self.min_y, max: self.max_y }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &GridCell> {
        self.cells.iter()
    }

    fn rescan_extent(&mut self) {
        let mut it = self.cells.iter();
        match it.next() {
            None => {
                self.min_y = 0;
                self.max_y = 0;
            }
            Some(first) => {
                let mut lo = first.y;
                let mut hi = first.y;
                for c in it {
                    lo = lo.min(c.y);
                    hi = hi.max(c.y);
                }
                self.min_y = lo;
                self.max_y = hi;
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_then_has() {
        let mut s = OccupancyStore::new(10);
        assert!(s.add(GridCell::new(1, 2, 3)));
        assert!(s.has(GridCell::new(1, 2, 3)));
        assert!(!s.has(GridCell::new(3, 2, 1)));
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn duplicate_add_refused() {
        let mut s = OccupancyStore::new(10);
        assert!(s.add(GridCell::new(0, 0, 0)));
        assert!(!s.add(GridCell::new(0, 0, 0)));
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn capacity_bound_holds() {
        // Scenario C: fill to capacity, add refuses, remove+add succeeds again.
        let mut s = OccupancyStore::new(5);
        for i in 0..5 {
            assert!(s.add(GridCell::new(i, 0, 0)));
        }
        assert!(s.is_full());
        assert!(!s.add(GridCell::new(99, 0, 0)));
        assert_eq!(s.len(), 5);
        assert!(s.remove(GridCell::new(0, 0, 0)));
        assert!(s.add(GridCell::new(99, 0, 0)));
        assert_eq!(s.len(), 5);
    }

    #[test]
    fn remove_absent_is_noop() {
        let mut s = OccupancyStore::new(5);
        s.add(GridCell::new(0, 0, 0));
        assert!(!s.remove(GridCell::new(1, 1, 1)));
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn extent_follows_adds_and_removes() {
        // Scenario A.
        let mut s = OccupancyStore::new(1000);
        assert!(s.add(GridCell::new(0, 0, 0)));
        assert_eq!(s.len(), 1);
        assert_eq!(s.y_range(), YRange { min: 0, max: 0 });

        assert!(s.add(GridCell::new(0, 1, 0)));
        assert_eq!(s.len(), 2);
        assert_eq!(s.y_range(), YRange { min: 0, max: 1 });

        assert!(s.remove(GridCell::new(0, 0, 0)));
        assert_eq!(s.len(), 1);
        assert_eq!(s.y_range(), YRange { min: 1, max: 1 });
    }

    #[test]
    fn extent_rescan_matches_true_bounds() {
        let mut s = OccupancyStore::new(100);
        let heights = [3, -2, 7, 0, 7, -2, 5];
        for (i, &y) in heights.iter().enumerate() {
            s.add(GridCell::new(i as i32, y, 0));
        }
        assert_eq!(s.y_range(), YRange { min: -2, max: 7 });

        s.remove(GridCell::new(2, 7, 0)); // one of the two y=7 cells
        assert_eq!(s.y_range(), YRange { min: -2, max: 7 });
        s.remove(GridCell::new(4, 7, 0)); // the other
        assert_eq!(s.y_range(), YRange { min: -2, max: 5 });
    }

    #[test]
    fn empty_store_reports_sentinel() {
        let mut s = OccupancyStore::new(10);
        assert_eq!(s.y_range(), YRange::EMPTY);
        s.add(GridCell::new(0, 9, 0));
        s.remove(GridCell::new(0, 9, 0));
        assert_eq!(s.y_range(), YRange::EMPTY);
        assert!(s.y_range().is_degenerate());
    }

    #[test]
    fn clear_resets_everything() {
        let mut s = OccupancyStore::new(10);
        s.add(GridCell::new(1, 4, 2));
        s.add(GridCell::new(2, -3, 1));
        s.clear();
        assert!(s.is_empty());
        assert_eq!(s.y_range(), YRange::EMPTY);
        assert!(s.add(GridCell::new(1, 4, 2)));
    }
}
