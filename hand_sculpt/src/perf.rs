//! Frame-rate guard — the backpressure valve against runaway instance counts.
//!
//! Placement is the only capacity-increasing operation, so it is the only one
//! this guard blocks: erase and rotation stay fully functional so the user
//! can always recover a struggling session.

/// Weight of the newest instantaneous fps sample in the smoothed estimate.
const FPS_BLEND: f32 = 0.1;

/// Tracks a smoothed frames-per-second estimate and how long it has stayed
/// below the configured threshold.
#[derive(Clone, Copy, Debug)]
pub struct FrameRateMonitor {
    threshold: f32,
    grace:     f32,
    fps:       f32,
    low_for:   f32,
}

impl FrameRateMonitor {
    pub fn new(threshold_fps: f32, grace_secs: f32) -> Self {
        FrameRateMonitor {
            threshold: threshold_fps,
            grace: grace_secs,
            fps: 60.0,
            low_for: 0.0,
        }
    }

    /// Record one frame of `dt` seconds.
    pub fn record(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        let instant = 1.0 / dt;
        self.fps += (instant - self.fps) * FPS_BLEND;
        if self.fps < self.threshold {
            self.low_for += dt;
        } else {
            self.low_for = 0.0;
        }
    }

    /// True once the low-frame-rate condition has persisted for the grace
    /// period. Clears itself as soon as performance recovers.
    pub fn blocked(&self) -> bool {
        self.low_for >= self.grace
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }

    pub fn reset(&mut self) {
        self.fps = 60.0;
        self.low_for = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn healthy_frame_rate_never_blocks() {
        let mut m = FrameRateMonitor::new(24.0, 2.0);
        for _ in 0..600 {
            m.record(1.0 / 60.0);
        }
        assert!(!m.blocked());
    }

    #[test]
    fn sustained_low_fps_blocks_after_grace() {
        let mut m = FrameRateMonitor::new(24.0, 2.0);
        for _ in 0..10 {
            m.record(0.1); // 10 fps — pull the smoothed estimate down
        }
        assert!(!m.blocked(), "grace period not yet elapsed");
        for _ in 0..30 {
            m.record(0.1); // 3 more seconds at 10 fps
        }
        assert!(m.blocked());
    }

    #[test]
    fn brief_dip_does_not_block() {
        let mut m = FrameRateMonitor::new(24.0, 2.0);
        for _ in 0..8 {
            m.record(0.1);
        }
        for _ in 0..300 {
            m.record(1.0 / 60.0);
        }
        assert!(!m.blocked());
    }

    #[test]
    fn recovery_unblocks() {
        let mut m = FrameRateMonitor::new(24.0, 1.0);
        for _ in 0..40 {
            m.record(0.1);
        }
        assert!(m.blocked());
        for _ in 0..120 {
            m.record(1.0 / 60.0);
        }
        assert!(!m.blocked());
    }

    #[test]
    fn reset_clears_the_condition() {
        let mut m = FrameRateMonitor::new(24.0, 1.0);
        for _ in 0..40 {
            m.record(0.1);
        }
        assert!(m.blocked());
        m.reset();
        assert!(!m.blocked());
    }

    #[test]
    fn zero_dt_is_ignored() {
        let mut m = FrameRateMonitor::new(24.0, 1.0);
        m.record(0.0);
        m.record(-1.0);
        assert!(!m.blocked());
    }
}
