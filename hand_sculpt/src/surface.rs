//! The presentation-surface contract.
//!
//! The controller owns the logical build (occupancy store, build frame, hand
//! states) but no rendering state; everything visual goes through this trait.
//! The software visualizer implements it for the minifb window, and the
//! controller tests implement it with a recording double.

use cgmath::Vector3;
use voxel_grid::{GridCell, YRange};

/// Everything the controller is allowed to ask of the render side.
///
/// `add_record`/`remove_record` keep the surface's dense instance buffer in
/// step with the occupancy store; the `extent` argument is the store's
/// vertical range *after* the mutation, so the recolor pass that each
/// structural change triggers normalises against current bounds.
pub trait PresentationSurface {
    fn add_record(&mut self, cell: GridCell, extent: YRange) -> bool;
    fn remove_record(&mut self, cell: GridCell, extent: YRange) -> bool;

    /// Full recolor pass without a structural change (palette swap).
    fn recolor(&mut self, extent: YRange);

    /// Select a palette from the catalog by index.
    fn set_palette(&mut self, index: usize);

    /// Target orientation for the orbit animation, radians.
    fn set_rotation_target(&mut self, yaw: f32, pitch: f32);

    /// Ghost preview cursor; `position` is the build-local cell center.
    fn set_preview(&mut self, visible: bool, position: Vector3<f32>);

    /// Switch the preview material to/from the erase warning color.
    fn set_erase_visual(&mut self, erasing: bool);

    /// Drop all records (engine reset).
    fn clear(&mut self);

    fn resize(&mut self, width: usize, height: usize);

    /// Release render resources; the surface may not be used afterwards.
    fn dispose(&mut self);
}
