//! # voxel_scene
//!
//! The GPU-facing side of the build: a fixed-capacity, densely-packed array of
//! (cell, translation, color) records kept in 1:1 correspondence with the
//! occupancy store, plus the palette catalog that drives the height-based
//! color gradient.
//!
//! The consistency protocol is append + swap-and-pop: removal overwrites the
//! removed slot with the last live record and shrinks the live count, so the
//! range `[0, len)` never contains a hole. An explicit cell → slot index map
//! keeps removal O(1) instead of an array search.

pub mod palette;

use std::collections::HashMap;

use cgmath::Vector3;
use voxel_grid::space::GridSpace;
use voxel_grid::{GridCell, YRange};

use crate::palette::Palette;

// ════════════════════════════════════════════════════════════════════════════
// InstanceRecord
// ════════════════════════════════════════════════════════════════════════════

/// One live slot of the render buffer.
///
/// The translation is derived deterministically from the cell; the slot index
/// is *not* stable across removals (swap-and-pop moves the last record down).
#[derive(Clone, Copy, Debug)]
pub struct InstanceRecord {
    pub cell:        GridCell,
    pub translation: Vector3<f32>,
    pub color:       u32,
}

// ════════════════════════════════════════════════════════════════════════════
// InstanceBuffer
// ════════════════════════════════════════════════════════════════════════════

/// Dense mirror of the occupancy store.
///
/// Invariants, load-bearing for the rest of the system:
/// * `len() ≤ capacity` always;
/// * the live range `[0, len)` is dense — no holes;
/// * every added-and-not-removed cell has exactly one record, and `slots`
///   maps it to that record's current index.
#[derive(Debug)]
pub struct InstanceBuffer {
    records:  Vec<InstanceRecord>,
    slots:    HashMap<GridCell, usize>,
    capacity: usize,
    grid:     GridSpace,
}

impl InstanceBuffer {
    pub fn new(capacity: usize, cell_size: f32) -> Self {
        InstanceBuffer {
            records: Vec::with_capacity(capacity),
            slots: HashMap::with_capacity(capacity),
            capacity,
            grid: GridSpace::new(cell_size),
        }
    }

    /// Append a record for `cell` at index `len()` and recolor.
    ///
    /// Returns false — with no state change — when the buffer is at capacity
    /// or the cell already has a record.
    pub fn add(&mut self, cell: GridCell, y_range: YRange, palette: &Palette) -> bool {
        if self.records.len() >= self.capacity || self.slots.contains_key(&cell) {
            return false;
        }
        self.slots.insert(cell, self.records.len());
        self.records.push(InstanceRecord {
            cell,
            translation: self.grid.center(cell),
            color: palette.color_at(cell.y, y_range),
        });
        self.recolor(y_range, palette);
        true
    }

    /// Remove the record for `cell` by swap-and-pop, then recolor.
    ///
    /// Returns false when the cell has no record.
    pub fn remove(&mut self, cell: GridCell, y_range: YRange, palette: &Palette) -> bool {
        let slot = match self.slots.remove(&cell) {
            Some(s) => s,
            None => return false,
        };
        let last = self.records.len() - 1;
        if slot != last {
            self.records[slot] = self.records[last];
            self.slots.insert(self.records[slot].cell, slot);
        }
        self.records.pop();
        self.recolor(y_range, palette);
        true
    }

    /// Recompute every live record's color from the palette's bottom/top
    /// endpoints, normalised over the given vertical extent.
    pub fn recolor(&mut self, y_range: YRange, palette: &Palette) {
        for rec in &mut self.records {
            rec.color = palette.color_at(rec.cell.y, y_range);
        }
    }

    /// Drop all records and reset the live count; capacity is untouched.
    pub fn clear(&mut self) {
        self.records.clear();
        self.slots.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The dense live range `[0, len)`.
    pub fn records(&self) -> &[InstanceRecord] {
        &self.records
    }

    /// Current slot index of a cell's record, if it has one.
    pub fn slot_of(&self, cell: GridCell) -> Option<usize> {
        self.slots.get(&cell).copied()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
