//! Coordinate pipeline — world ↔ build-local ↔ grid.
//!
//! Three frames are in play:
//!
//! * **world** — camera-relative space, where hand positions arrive;
//! * **build-local** — world rotated by the inverse of the current build
//!   orientation; the grid is defined in this frame, so placement is correct
//!   at any rotation;
//! * **grid** — integer cell indices, pitch [`GridSpace::cell_size`].

use cgmath::{Quaternion, Rad, Rotation, Rotation3, Vector3};

use crate::GridCell;

/// Pitch is clamped to ±60° so an orbit drag can never flip the build over.
pub const PITCH_LIMIT: f32 = std::f32::consts::PI / 3.0;

// ════════════════════════════════════════════════════════════════════════════
// Pure interpolation helpers
// ════════════════════════════════════════════════════════════════════════════

/// Frame-rate-independent exponential blend factor: `1 − e^(−rate·dt)`.
///
/// Used both for cursor smoothing and for the approach-to-target rotation, so
/// the visual lag is a function of wall time rather than of frame count.
pub fn smoothing_alpha(rate: f32, dt: f32) -> f32 {
    1.0 - (-rate * dt).exp()
}

/// Proportional approach-to-target. Not a physical spring — just a fixed
/// fraction of the remaining distance per unit time, expressed dt-independently
/// so it is testable without a render loop.
pub fn approach(current: f32, target: f32, rate: f32, dt: f32) -> f32 {
    current + (target - current) * smoothing_alpha(rate, dt)
}

// ════════════════════════════════════════════════════════════════════════════
// GridSpace — build-local ↔ grid
// ════════════════════════════════════════════════════════════════════════════

/// Maps build-local positions to integer cells and back.
#[derive(Clone, Copy, Debug)]
pub struct GridSpace {
    pub cell_size: f32,
}

impl GridSpace {
    pub fn new(cell_size: f32) -> Self {
        GridSpace { cell_size }
    }

    /// Round a build-local position to the nearest cell index on each axis.
    pub fn snap(&self, p: Vector3<f32>) -> GridCell {
        GridCell {
            x: (p.x / self.cell_size).round() as i32,
            y: (p.y / self.cell_size).round() as i32,
            z: (p.z / self.cell_size).round() as i32,
        }
    }

    /// Build-local center of a cell.
    pub fn center(&self, cell: GridCell) -> Vector3<f32> {
        Vector3::new(
            cell.x as f32 * self.cell_size,
            cell.y as f32 * self.cell_size,
            cell.z as f32 * self.cell_size,
        )
    }
}

// ════════════════════════════════════════════════════════════════════════════
// BuildFrame — the orbit orientation
// ════════════════════════════════════════════════════════════════════════════

/// Current and target yaw/pitch of the build, in radians.
///
/// The orientation is applied uniformly to every placed cell and the preview
/// cursor (but not to the ground reference). Gestures mutate the *target*;
/// [`advance`] eases the current angles toward it each frame.
///
/// [`advance`]: BuildFrame::advance
#[derive(Clone, Copy, Debug)]
pub struct BuildFrame {
    pub yaw:          f32,
    pub pitch:        f32,
    pub yaw_target:   f32,
    pub pitch_target: f32,
}

impl Default for BuildFrame {
    fn default() -> Self {
        BuildFrame { yaw: 0.0, pitch: 0.0, yaw_target: 0.0, pitch_target: 0.0 }
    }
}

impl BuildFrame {
    /// Orientation quaternion: yaw about Y, then pitch about X.
    pub fn orientation(&self) -> Quaternion<f32> {
        Quaternion::from_angle_y(Rad(self.yaw)) * Quaternion::from_angle_x(Rad(self.pitch))
    }

    /// World → build-local: apply the inverse of the current orientation.
    pub fn world_to_local(&self, p: Vector3<f32>) -> Vector3<f32> {
        self.orientation().invert().rotate_vector(p)
    }

    /// Build-local → world.
    pub fn local_to_world(&self, p: Vector3<f32>) -> Vector3<f32> {
        self.orientation().rotate_vector(p)
    }

    /// Nudge the target angles by an orbit delta; pitch is clamped to ±60°.
    pub fn turn(&mut self, dyaw: f32, dpitch: f32) {
        self.yaw_target += dyaw;
        self.pitch_target = (self.pitch_target + dpitch).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Ease the current angles toward their targets.
    pub fn advance(&mut self, rate: f32, dt: f32) {
        self.yaw = approach(self.yaw, self.yaw_target, rate, dt);
        self.pitch = approach(self.pitch, self.pitch_target, rate, dt);
    }

    pub fn reset(&mut self) {
        *self = BuildFrame::default();
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
