//! Depth estimation from the hand-scale proxy, plus cursor smoothing.
//!
//! The tracker's native depth channel encodes finger depth relative to the
//! wrist, not hand distance from the sensor, so it is unusable for placement.
//! Depth is instead estimated from **apparent hand scale**: the image-plane
//! wrist↔middle-finger-base distance, which grows as the hand approaches the
//! sensor and shrinks as it recedes. The estimate is relative to a reference
//! scale captured at gesture start, so z = 0 always means "where the pinch
//! began".
//!
//! This is an inherently heuristic, lossy substitute for true depth sensing;
//! it lives behind [`DepthEstimator`] so a real depth source can replace it
//! without touching the rest of the pipeline.

use cgmath::Vector3;
use voxel_grid::space::smoothing_alpha;

/// Weight of the newest scale sample in the exponential smoothing.
pub const SCALE_BLEND: f32 = 0.3;

/// World units of depth per unit of normalized scale change.
pub const DEPTH_SENSITIVITY: f32 = 12.0;

// ════════════════════════════════════════════════════════════════════════════
// DepthEstimator
// ════════════════════════════════════════════════════════════════════════════

/// A replaceable depth strategy for the drawing hand.
///
/// `None` in means landmark data was unavailable this frame; `None` out means
/// the caller should fall back to the raw, un-depth-corrected position —
/// never a crash, never a dropped frame.
pub trait DepthEstimator {
    /// Feed a scale sample while no gesture is active, to keep the smoothing
    /// warm between gestures.
    fn observe(&mut self, scale: Option<f32>);

    /// Gesture START: capture the current smoothed scale as the reference.
    /// The emitted depth at this instant is 0.
    fn begin(&mut self, scale: Option<f32>);

    /// Gesture ACTIVE: estimated depth for this frame's scale sample.
    fn estimate(&mut self, scale: Option<f32>) -> Option<f32>;

    /// Gesture END: drop the reference (smoothing state persists).
    fn end(&mut self);
}

// ════════════════════════════════════════════════════════════════════════════
// HandScaleDepth
// ════════════════════════════════════════════════════════════════════════════

/// The hand-scale proxy estimator.
#[derive(Clone, Copy, Debug)]
pub struct HandScaleDepth {
    smoothed:    Option<f32>,
    reference:   Option<f32>,
    sensitivity: f32,
}

impl HandScaleDepth {
    pub fn new(sensitivity: f32) -> Self {
        HandScaleDepth { smoothed: None, reference: None, sensitivity }
    }

    fn blend(&mut self, scale: Option<f32>) {
        if let Some(s) = scale {
            self.smoothed = Some(match self.smoothed {
                Some(prev) => prev + (s - prev) * SCALE_BLEND,
                None => s,
            });
        }
    }
}

impl Default for HandScaleDepth {
    fn default() -> Self {
        HandScaleDepth::new(DEPTH_SENSITIVITY)
    }
}

impl DepthEstimator for HandScaleDepth {
    fn observe(&mut self, scale: Option<f32>) {
        self.blend(scale);
    }

    fn begin(&mut self, scale: Option<f32>) {
        self.blend(scale);
        self.reference = self.smoothed;
    }

    fn estimate(&mut self, scale: Option<f32>) -> Option<f32> {
        scale?;
        self.blend(scale);
        let reference = self.reference?;
        if reference <= f32::EPSILON {
            return None;
        }
        let smoothed = self.smoothed?;
        let normalized_delta = (smoothed - reference) / reference;
        Some(normalized_delta * self.sensitivity)
    }

    fn end(&mut self) {
        self.reference = None;
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SmoothedPoint — frame-rate-independent cursor smoothing
// ════════════════════════════════════════════════════════════════════════════

/// Exponentially smoothed 3D target with `alpha = 1 − e^(−rate·dt)`, so the
/// cursor lags less at high frame rates and more at low ones instead of using
/// a fixed per-frame blend ratio.
#[derive(Clone, Copy, Debug)]
pub struct SmoothedPoint {
    value: Option<Vector3<f32>>,
    rate:  f32,
}

impl SmoothedPoint {
    pub fn new(rate: f32) -> Self {
        SmoothedPoint { value: None, rate }
    }

    /// Blend toward `target` and return the smoothed position. The first
    /// sample snaps directly to the target.
    pub fn sample(&mut self, target: Vector3<f32>, dt: f32) -> Vector3<f32> {
        let next = match self.value {
            Some(prev) => prev + (target - prev) * smoothing_alpha(self.rate, dt),
            None => target,
        };
        self.value = Some(next);
        next
    }

    pub fn reset(&mut self) {
        self.value = None;
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
