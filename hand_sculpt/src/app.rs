//! Application wiring and the main frame loop.
//!
//! `run()` owns the single-threaded frame driver: poll window input, poll the
//! gesture feed, hand every event to the [`SculptController`], then render.
//! All engine mutation happens on this thread in that order, so no frame can
//! observe a half-applied gesture.

use std::sync::mpsc;
use std::time::Instant;

use thiserror::Error;

use crate::controller::SculptController;
use crate::gesture::{GestureFeed, SimGestureFeed, SimInput};
use crate::surface::PresentationSurface;
use crate::visualizer::SoftwareVisualizer;

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

/// Tunable parameters for the full application.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Grid pitch, world units per cell.
    pub cell_size:         f32,
    /// Hard cap on placed cells.
    pub max_cells:         usize,
    /// Minimum cursor travel (build-local units) between spawns in one drag.
    pub min_spacing:       f32,
    /// Cursor smoothing rate for `alpha = 1 − e^(−rate·dt)`.
    pub smoothing_rate:    f32,
    /// World units of depth per unit of normalized hand-scale change.
    pub depth_sensitivity: f32,
    /// Orbit easing rate toward the target orientation.
    pub rotation_rate:     f32,
    /// Smoothed fps below this long enough trips the placement guard.
    pub low_fps_threshold: f32,
    /// Seconds of sustained low fps before the guard trips.
    pub low_fps_grace:     f32,
    /// Starting palette index into the catalog.
    pub palette:           usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            cell_size:         0.45,
            max_cells:         1000,
            min_spacing:       0.4,
            smoothing_rate:    18.0,
            depth_sensitivity: 12.0,
            rotation_rate:     10.0,
            low_fps_threshold: 24.0,
            low_fps_grace:     3.0,
            palette:           0,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Errors
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum SculptError {
    #[error("window error: {0}")]
    Window(#[from] minifb::Error),

    #[cfg(feature = "leap")]
    #[error("hand tracker error: {0}")]
    Tracker(String),
}

// ════════════════════════════════════════════════════════════════════════════
// run() — the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Cap on a single frame's dt so a window drag or debugger pause does not
/// register as seconds of low frame rate.
const MAX_DT: f32 = 0.25;

/// Run the full application.
///
/// Creates the visualizer window, the gesture feed (simulation by default,
/// hardware with `--features leap`), and drives the event/render loop at
/// ~60 fps until the window closes or Q is pressed.
pub fn run(cfg: AppConfig) -> Result<(), SculptError> {
    // ── Sim gesture channel (window input → feed) ─────────────────────────
    let (sim_tx, sim_rx) = mpsc::channel::<SimInput>();
    let mut sim = SimGestureFeed::new(sim_rx);

    #[cfg(feature = "leap")]
    let mut tracker_feed = crate::leap::LeapGestureFeed::connect()?;

    // ── Visualizer (owns the window and the sim input sender) ─────────────
    let mut vis = SoftwareVisualizer::new(sim_tx, &cfg)?;

    // ── Controller ────────────────────────────────────────────────────────
    let mut ctl = SculptController::new(&cfg);

    let start = Instant::now();
    let mut last = Instant::now();

    while vis.is_open() {
        if !vis.poll_input() {
            break;
        }

        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f32().min(MAX_DT);
        last = now;
        let timestamp = start.elapsed().as_secs_f64();

        // The keyboard feed always runs; with hardware tracking enabled its
        // virtual hands are replaced by real ones, but R/Q keep working.
        let frame = {
            #[cfg(feature = "leap")]
            {
                let mut f = sim.poll(timestamp);
                f.events = tracker_feed.poll(timestamp).events;
                f
            }
            #[cfg(not(feature = "leap"))]
            sim.poll(timestamp)
        };

        if frame.quit {
            vis.dispose();
            return Ok(());
        }
        if frame.reset {
            ctl.reset(&mut vis);
        }

        ctl.begin_frame();
        for ev in &frame.events {
            ctl.handle_event(ev, dt, &mut vis);
        }
        ctl.end_frame(&mut vis);
        ctl.advance(dt);

        let status = format!(
            "{}  -  cells {}/{}  fps {:.0}{}",
            ctl.status,
            ctl.cell_count(),
            ctl.store().capacity(),
            ctl.fps(),
            if ctl.placement_blocked() { "  (paused)" } else { "" },
        );
        vis.render(&status, dt);
    }

    vis.dispose();
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let cfg = AppConfig::default();
        assert!(cfg.cell_size > 0.0);
        assert!(cfg.max_cells > 0);
        assert!(cfg.min_spacing < cfg.cell_size * 2.0);
        assert!(cfg.low_fps_threshold > 0.0);
        assert!(cfg.low_fps_grace > 0.0);
    }

    #[test]
    fn window_error_formats_with_context() {
        let e = SculptError::from(minifb::Error::WindowCreate(String::new()));
        assert!(e.to_string().contains("window error"));
    }
}
