//! The gesture arbiter — the single writer of the build.
//!
//! One [`HandState`] exists per currently-tracked hand index; it is created
//! when the index first appears in tracker output and destroyed the first
//! frame the index is not observed (the "disappeared mid-gesture" case is a
//! state transition here, not a special case). The controller owns the
//! occupancy store and the build frame; everything visual is delegated to the
//! [`PresentationSurface`].

use std::collections::HashMap;

use cgmath::{InnerSpace, Vector3};
use log::{debug, info, warn};

use voxel_grid::space::{BuildFrame, GridSpace};
use voxel_grid::{GridCell, OccupancyStore};
use voxel_scene::palette::{next_palette, PALETTES};

use crate::app::AppConfig;
use crate::depth::{DepthEstimator, HandScaleDepth, SmoothedPoint};
use crate::gesture::{GestureEvent, GestureKind, GesturePhase, Handedness};
use crate::perf::FrameRateMonitor;
use crate::surface::PresentationSurface;

/// Radians of yaw per full-screen-width horizontal drag.
const ORBIT_YAW_GAIN: f32 = 4.0;
/// Radians of pitch per full-screen-height vertical drag.
const ORBIT_PITCH_GAIN: f32 = 3.0;

// ════════════════════════════════════════════════════════════════════════════
// HandState
// ════════════════════════════════════════════════════════════════════════════

/// Interaction state for one tracked hand index.
#[derive(Debug)]
struct HandState {
    drawing:     bool,
    rotating:    bool,
    fisting:     bool,
    /// Previous normalized screen sample, for orbit deltas.
    last_screen: [f32; 2],
    /// Build-local position of the most recent placement/erase in this drag.
    last_spawn:  Option<Vector3<f32>>,
    depth:       HandScaleDepth,
    cursor:      SmoothedPoint,
    /// Observed in the current frame; swept by `end_frame` otherwise.
    seen:        bool,
}

impl HandState {
    fn new(depth_sensitivity: f32, smoothing_rate: f32) -> Self {
        HandState {
            drawing:     false,
            rotating:    false,
            fisting:     false,
            last_screen: [0.5, 0.5],
            last_spawn:  None,
            depth:       HandScaleDepth::new(depth_sensitivity),
            cursor:      SmoothedPoint::new(smoothing_rate),
            seen:        true,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SculptController
// ════════════════════════════════════════════════════════════════════════════

pub struct SculptController {
    // ── spatial state ────────────────────────────────────────────────────
    store: OccupancyStore,
    grid:  GridSpace,
    frame: BuildFrame,

    // ── interaction state ────────────────────────────────────────────────
    hands:   HashMap<usize, HandState>,
    palette: usize,
    monitor: FrameRateMonitor,

    // ── tuning (from AppConfig) ──────────────────────────────────────────
    min_spacing:       f32,
    rotation_rate:     f32,
    smoothing_rate:    f32,
    depth_sensitivity: f32,

    // ── status message ───────────────────────────────────────────────────
    pub status: String,
}

impl SculptController {
    pub fn new(cfg: &AppConfig) -> Self {
        SculptController {
            store:             OccupancyStore::new(cfg.max_cells),
            grid:              GridSpace::new(cfg.cell_size),
            frame:             BuildFrame::default(),
            hands:             HashMap::new(),
            palette:           cfg.palette % PALETTES.len(),
            monitor:           FrameRateMonitor::new(cfg.low_fps_threshold, cfg.low_fps_grace),
            min_spacing:       cfg.min_spacing,
            rotation_rate:     cfg.rotation_rate,
            smoothing_rate:    cfg.smoothing_rate,
            depth_sensitivity: cfg.depth_sensitivity,
            status:            format!("Ready — palette: {}", PALETTES[cfg.palette % PALETTES.len()].name),
        }
    }

    // ── per-frame bracketing ─────────────────────────────────────────────

    /// Mark every known hand unobserved; events seen this frame re-mark them.
    pub fn begin_frame(&mut self) {
        for h in self.hands.values_mut() {
            h.seen = false;
        }
    }

    /// Sweep hands that produced no event this frame: an unobserved hand gets
    /// an implicit END for every role it held, and its state is dropped.
    pub fn end_frame(&mut self, surface: &mut dyn PresentationSurface) {
        let gone: Vec<usize> = self
            .hands
            .iter()
            .filter(|(_, h)| !h.seen)
            .map(|(&i, _)| i)
            .collect();
        for i in gone {
            if let Some(h) = self.hands.remove(&i) {
                if h.drawing {
                    debug!("hand {} vanished mid-draw", i);
                    surface.set_preview(false, Vector3::new(0.0, 0.0, 0.0));
                }
            }
        }
        surface.set_erase_visual(self.erase_mode());
    }

    /// Record the frame time and ease the build toward its target rotation.
    pub fn advance(&mut self, dt: f32) {
        self.monitor.record(dt);
        self.frame.advance(self.rotation_rate, dt);
    }

    // ── process one GestureEvent ─────────────────────────────────────────

    pub fn handle_event(
        &mut self,
        ev: &GestureEvent,
        dt: f32,
        surface: &mut dyn PresentationSurface,
    ) {
        let mut hs = self
            .hands
            .remove(&ev.hand)
            .unwrap_or_else(|| HandState::new(self.depth_sensitivity, self.smoothing_rate));
        hs.seen = true;

        match (ev.kind, ev.handedness) {
            (GestureKind::Pinch, Handedness::Right) => {
                self.drive_draw(&mut hs, ev, dt, surface);
            }
            (GestureKind::Pinch, Handedness::Left) => {
                self.drive_orbit(&mut hs, ev, surface);
            }
            (GestureKind::Fist, Handedness::Left) => {
                hs.fisting = !matches!(ev.phase, GesturePhase::Ended);
            }
            // A right-hand fist has no assigned role.
            (GestureKind::Fist, Handedness::Right) => {}
            (GestureKind::PinkyPinch, _) => {
                if ev.phase == GesturePhase::Started {
                    self.cycle_palette(surface);
                }
            }
        }

        self.hands.insert(ev.hand, hs);
        surface.set_erase_visual(self.erase_mode());
    }

    // ── drawing / erasing (right-hand pinch) ─────────────────────────────

    fn drive_draw(
        &mut self,
        hs: &mut HandState,
        ev: &GestureEvent,
        dt: f32,
        surface: &mut dyn PresentationSurface,
    ) {
        // A hand can reappear mid-pinch; an ACTIVE with no drawing flag is a
        // fresh gesture from our point of view.
        let starting = ev.phase == GesturePhase::Started || !hs.drawing;

        if ev.phase == GesturePhase::Ended {
            hs.drawing = false;
            hs.last_spawn = None;
            hs.depth.end();
            hs.cursor.reset();
            surface.set_preview(false, Vector3::new(0.0, 0.0, 0.0));
            return;
        }

        let z = if starting {
            hs.drawing = true;
            hs.last_spawn = None;
            hs.cursor.reset();
            hs.depth.begin(ev.scale);
            // Depth is defined relative to the gesture start.
            ev.scale.map(|_| 0.0)
        } else {
            hs.depth.estimate(ev.scale)
        };

        // Missing landmark data degrades to the raw position, never a skip.
        let world = match z {
            Some(z) => Vector3::new(ev.position.x, ev.position.y, z),
            None => ev.position,
        };
        let smoothed = hs.cursor.sample(world, dt);
        let local = self.frame.world_to_local(smoothed);
        let cell = self.grid.snap(local);
        surface.set_preview(true, self.grid.center(cell));

        let far_enough = hs
            .last_spawn
            .map_or(true, |p| (local - p).magnitude() >= self.min_spacing);
        if far_enough {
            self.act(cell, surface);
            hs.last_spawn = Some(local);
        }
    }

    /// Place or erase at `cell`, depending on the momentary erase mode.
    fn act(&mut self, cell: GridCell, surface: &mut dyn PresentationSurface) {
        if self.erase_mode() {
            if self.store.remove(cell) {
                surface.remove_record(cell, self.store.y_range());
                info!("erased ({}, {}, {})", cell.x, cell.y, cell.z);
                self.status = format!(
                    "erase ({}, {}, {})  cells={}",
                    cell.x, cell.y, cell.z, self.store.len()
                );
            }
        } else {
            if self.monitor.blocked() && !self.store.is_empty() {
                warn!("placement paused: {:.0} fps sustained below threshold", self.monitor.fps());
                self.status = "placement paused — frame rate too low".to_string();
                return;
            }
            if self.store.add(cell) {
                surface.add_record(cell, self.store.y_range());
                info!("placed ({}, {}, {})", cell.x, cell.y, cell.z);
                self.status = format!(
                    "place ({}, {}, {})  cells={}/{}",
                    cell.x, cell.y, cell.z, self.store.len(), self.store.capacity()
                );
            }
        }
    }

    // ── orbit (left-hand pinch) ──────────────────────────────────────────

    fn drive_orbit(
        &mut self,
        hs: &mut HandState,
        ev: &GestureEvent,
        surface: &mut dyn PresentationSurface,
    ) {
        match ev.phase {
            GesturePhase::Started => {
                hs.rotating = true;
                hs.last_screen = ev.screen;
            }
            GesturePhase::Active => {
                if !hs.rotating {
                    hs.rotating = true;
                    hs.last_screen = ev.screen;
                    return;
                }
                let dx = ev.screen[0] - hs.last_screen[0];
                let dy = ev.screen[1] - hs.last_screen[1];
                // Horizontal drag → yaw; vertical drag → pitch, inverted so
                // pulling down tilts the build toward the viewer.
                self.frame.turn(dx * ORBIT_YAW_GAIN, -dy * ORBIT_PITCH_GAIN);
                hs.last_screen = ev.screen;
                surface.set_rotation_target(self.frame.yaw_target, self.frame.pitch_target);
                self.status = format!(
                    "orbit  yaw={:.2}  pitch={:.2}",
                    self.frame.yaw_target, self.frame.pitch_target
                );
            }
            // No inertia: the target simply stops moving.
            GesturePhase::Ended => hs.rotating = false,
        }
    }

    // ── palette cycling (pinky pinch, either hand) ───────────────────────

    fn cycle_palette(&mut self, surface: &mut dyn PresentationSurface) {
        self.palette = next_palette(self.palette);
        surface.set_palette(self.palette);
        surface.recolor(self.store.y_range());
        info!("palette -> {}", PALETTES[self.palette].name);
        self.status = format!("palette: {}", PALETTES[self.palette].name);
    }

    // ── reset ────────────────────────────────────────────────────────────

    /// Clear the build and all interaction state atomically: no per-hand flag
    /// survives a reset, even mid-gesture.
    pub fn reset(&mut self, surface: &mut dyn PresentationSurface) {
        self.store.clear();
        self.hands.clear();
        self.frame.reset();
        self.monitor.reset();
        surface.clear();
        surface.set_rotation_target(0.0, 0.0);
        surface.set_preview(false, Vector3::new(0.0, 0.0, 0.0));
        surface.set_erase_visual(false);
        info!("build reset");
        self.status = "reset".to_string();
    }

    // ── accessors ────────────────────────────────────────────────────────

    /// True while any tracked hand holds a fist.
    pub fn erase_mode(&self) -> bool {
        self.hands.values().any(|h| h.fisting)
    }

    pub fn cell_count(&self) -> usize {
        self.store.len()
    }

    pub fn store(&self) -> &OccupancyStore {
        &self.store
    }

    pub fn build_frame(&self) -> &BuildFrame {
        &self.frame
    }

    pub fn palette(&self) -> usize {
        self.palette
    }

    pub fn placement_blocked(&self) -> bool {
        self.monitor.blocked()
    }

    pub fn fps(&self) -> f32 {
        self.monitor.fps()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use voxel_grid::YRange;
    use voxel_scene::InstanceBuffer;

    const DT: f32 = 0.1;

    /// Presentation-surface double: a real instance buffer plus flags.
    struct TestSurface {
        buffer:          InstanceBuffer,
        palette:         usize,
        preview_visible: bool,
        erase_visual:    bool,
        rotation_target: (f32, f32),
        recolors:        usize,
        cleared:         usize,
    }

    impl TestSurface {
        fn new() -> Self {
            TestSurface {
                buffer:          InstanceBuffer::new(1000, 0.45),
                palette:         0,
                preview_visible: false,
                erase_visual:    false,
                rotation_target: (0.0, 0.0),
                recolors:        0,
                cleared:         0,
            }
        }

        fn cells(&self) -> HashSet<GridCell> {
            self.buffer.records().iter().map(|r| r.cell).collect()
        }
    }

    impl PresentationSurface for TestSurface {
        fn add_record(&mut self, cell: GridCell, extent: YRange) -> bool {
            self.buffer.add(cell, extent, &PALETTES[self.palette])
        }
        fn remove_record(&mut self, cell: GridCell, extent: YRange) -> bool {
            self.buffer.remove(cell, extent, &PALETTES[self.palette])
        }
        fn recolor(&mut self, extent: YRange) {
            self.recolors += 1;
            let p = &PALETTES[self.palette];
            self.buffer.recolor(extent, p);
        }
        fn set_palette(&mut self, index: usize) {
            self.palette = index;
        }
        fn set_rotation_target(&mut self, yaw: f32, pitch: f32) {
            self.rotation_target = (yaw, pitch);
        }
        fn set_preview(&mut self, visible: bool, _position: Vector3<f32>) {
            self.preview_visible = visible;
        }
        fn set_erase_visual(&mut self, erasing: bool) {
            self.erase_visual = erasing;
        }
        fn clear(&mut self) {
            self.cleared += 1;
            self.buffer.clear();
        }
        fn resize(&mut self, _width: usize, _height: usize) {}
        fn dispose(&mut self) {}
    }

    fn ctrl() -> SculptController {
        SculptController::new(&AppConfig::default())
    }

    fn ev(
        kind: GestureKind,
        phase: GesturePhase,
        hand: usize,
        handedness: Handedness,
        pos: (f32, f32, f32),
        screen: [f32; 2],
    ) -> GestureEvent {
        GestureEvent {
            kind,
            phase,
            hand,
            handedness,
            position: Vector3::new(pos.0, pos.1, pos.2),
            screen,
            scale: Some(0.2),
        }
    }

    fn draw(phase: GesturePhase, pos: (f32, f32, f32)) -> GestureEvent {
        ev(GestureKind::Pinch, phase, 0, Handedness::Right, pos, [0.5, 0.5])
    }

    fn orbit(phase: GesturePhase, screen: [f32; 2]) -> GestureEvent {
        ev(GestureKind::Pinch, phase, 1, Handedness::Left, (0.0, 0.0, 0.0), screen)
    }

    fn fist(phase: GesturePhase) -> GestureEvent {
        ev(GestureKind::Fist, phase, 1, Handedness::Left, (0.0, 0.0, 0.0), [0.5, 0.5])
    }

    #[test]
    fn pinch_started_places_immediately() {
        let mut c = ctrl();
        let mut s = TestSurface::new();
        c.handle_event(&draw(GesturePhase::Started, (0.0, 0.0, 0.0)), DT, &mut s);
        assert_eq!(c.cell_count(), 1);
        assert!(c.store().has(GridCell::new(0, 0, 0)));
        assert_eq!(s.buffer.len(), 1);
        assert!(s.preview_visible);
    }

    #[test]
    fn drag_respects_min_spacing() {
        let mut c = ctrl();
        let mut s = TestSurface::new();
        c.handle_event(&draw(GesturePhase::Started, (0.0, 0.0, 0.0)), DT, &mut s);

        // Jittering in place never fires twice.
        for _ in 0..10 {
            c.handle_event(&draw(GesturePhase::Active, (0.02, 0.01, 0.0)), DT, &mut s);
        }
        assert_eq!(c.cell_count(), 1);

        // A real move to the next cell fires exactly once more.
        for _ in 0..20 {
            c.handle_event(&draw(GesturePhase::Active, (0.45, 0.0, 0.0)), DT, &mut s);
        }
        assert_eq!(c.cell_count(), 2);
        assert!(c.store().has(GridCell::new(1, 0, 0)));
    }

    #[test]
    fn pinch_ended_hides_preview() {
        let mut c = ctrl();
        let mut s = TestSurface::new();
        c.handle_event(&draw(GesturePhase::Started, (0.0, 0.0, 0.0)), DT, &mut s);
        c.handle_event(&draw(GesturePhase::Ended, (0.0, 0.0, 0.0)), DT, &mut s);
        assert!(!s.preview_visible);
        assert_eq!(c.cell_count(), 1); // the placed cell stays
    }

    #[test]
    fn fist_reroutes_pinch_to_erase() {
        let mut c = ctrl();
        let mut s = TestSurface::new();
        c.handle_event(&draw(GesturePhase::Started, (0.0, 0.0, 0.0)), DT, &mut s);
        c.handle_event(&draw(GesturePhase::Ended, (0.0, 0.0, 0.0)), DT, &mut s);
        assert_eq!(c.cell_count(), 1);

        c.handle_event(&fist(GesturePhase::Started), DT, &mut s);
        assert!(s.erase_visual);
        c.handle_event(&draw(GesturePhase::Started, (0.0, 0.0, 0.0)), DT, &mut s);
        assert_eq!(c.cell_count(), 0);
        assert_eq!(s.buffer.len(), 0);

        c.handle_event(&fist(GesturePhase::Ended), DT, &mut s);
        assert!(!s.erase_visual);
    }

    #[test]
    fn erase_of_empty_cell_is_noop() {
        let mut c = ctrl();
        let mut s = TestSurface::new();
        c.handle_event(&fist(GesturePhase::Started), DT, &mut s);
        c.handle_event(&draw(GesturePhase::Started, (3.0, 3.0, 0.0)), DT, &mut s);
        assert_eq!(c.cell_count(), 0);
        assert_eq!(s.buffer.len(), 0);
    }

    #[test]
    fn orbit_maps_deltas_to_yaw_and_inverted_pitch() {
        let mut c = ctrl();
        let mut s = TestSurface::new();
        c.handle_event(&orbit(GesturePhase::Started, [0.5, 0.5]), DT, &mut s);
        c.handle_event(&orbit(GesturePhase::Active, [0.6, 0.6]), DT, &mut s);
        let f = c.build_frame();
        assert!(f.yaw_target > 0.0, "rightward drag yaws positive");
        assert!(f.pitch_target < 0.0, "downward drag pitches negative (inverted)");
        assert_eq!(s.rotation_target, (f.yaw_target, f.pitch_target));
    }

    #[test]
    fn orbit_pitch_is_clamped() {
        let mut c = ctrl();
        let mut s = TestSurface::new();
        c.handle_event(&orbit(GesturePhase::Started, [0.5, 0.5]), DT, &mut s);
        for _ in 0..50 {
            c.handle_event(&orbit(GesturePhase::Started, [0.5, 0.0]), DT, &mut s);
            c.handle_event(&orbit(GesturePhase::Active, [0.5, 1.0]), DT, &mut s);
        }
        let limit = voxel_grid::space::PITCH_LIMIT;
        assert!(c.build_frame().pitch_target >= -limit - 1e-5);
        assert!(c.build_frame().pitch_target <= limit + 1e-5);
    }

    #[test]
    fn pinky_pinch_cycles_palette_on_started_only() {
        let mut c = ctrl();
        let mut s = TestSurface::new();
        let pk = |phase| ev(GestureKind::PinkyPinch, phase, 0, Handedness::Right,
                            (0.0, 0.0, 0.0), [0.5, 0.5]);
        c.handle_event(&pk(GesturePhase::Started), DT, &mut s);
        assert_eq!(c.palette(), 1);
        assert_eq!(s.palette, 1);
        assert_eq!(s.recolors, 1);

        c.handle_event(&pk(GesturePhase::Active), DT, &mut s);
        assert_eq!(c.palette(), 1);

        for _ in 0..PALETTES.len() - 1 {
            c.handle_event(&pk(GesturePhase::Started), DT, &mut s);
        }
        assert_eq!(c.palette(), 0, "cycling wraps modulo catalog size");
    }

    #[test]
    fn unobserved_hand_gets_implicit_end() {
        let mut c = ctrl();
        let mut s = TestSurface::new();
        c.begin_frame();
        c.handle_event(&draw(GesturePhase::Started, (0.0, 0.0, 0.0)), DT, &mut s);
        c.end_frame(&mut s);
        assert!(s.preview_visible);

        // Next frame: the hand is gone, no ENDED event arrives.
        c.begin_frame();
        c.end_frame(&mut s);
        assert!(!s.preview_visible);
        assert!(!c.erase_mode());

        // A fresh pinch afterwards behaves like a brand-new gesture.
        c.begin_frame();
        c.handle_event(&draw(GesturePhase::Active, (0.9, 0.0, 0.0)), DT, &mut s);
        c.end_frame(&mut s);
        assert_eq!(c.cell_count(), 2);
    }

    #[test]
    fn vanished_fist_releases_erase_mode() {
        let mut c = ctrl();
        let mut s = TestSurface::new();
        c.begin_frame();
        c.handle_event(&fist(GesturePhase::Started), DT, &mut s);
        c.end_frame(&mut s);
        assert!(s.erase_visual);

        c.begin_frame();
        c.end_frame(&mut s);
        assert!(!s.erase_visual);
        assert!(!c.erase_mode());
    }

    #[test]
    fn guard_blocks_placement_but_not_erase() {
        let mut c = ctrl();
        let mut s = TestSurface::new();
        c.handle_event(&draw(GesturePhase::Started, (0.0, 0.0, 0.0)), DT, &mut s);
        c.handle_event(&draw(GesturePhase::Ended, (0.0, 0.0, 0.0)), DT, &mut s);

        for _ in 0..60 {
            c.advance(0.2); // 5 fps, 12 seconds
        }
        assert!(c.placement_blocked());

        c.handle_event(&draw(GesturePhase::Started, (0.9, 0.0, 0.0)), DT, &mut s);
        assert_eq!(c.cell_count(), 1, "placement must be refused");
        c.handle_event(&draw(GesturePhase::Ended, (0.9, 0.0, 0.0)), DT, &mut s);

        c.handle_event(&fist(GesturePhase::Started), DT, &mut s);
        c.handle_event(&draw(GesturePhase::Started, (0.0, 0.0, 0.0)), DT, &mut s);
        assert_eq!(c.cell_count(), 0, "erase stays functional under the guard");
    }

    #[test]
    fn guard_spares_an_empty_build() {
        let mut c = ctrl();
        let mut s = TestSurface::new();
        for _ in 0..60 {
            c.advance(0.2);
        }
        assert!(c.placement_blocked());
        c.handle_event(&draw(GesturePhase::Started, (0.0, 0.0, 0.0)), DT, &mut s);
        assert_eq!(c.cell_count(), 1, "an empty build may always take its first cell");
    }

    #[test]
    fn reset_leaves_no_dangling_state() {
        let mut c = ctrl();
        let mut s = TestSurface::new();
        c.handle_event(&draw(GesturePhase::Started, (0.0, 0.0, 0.0)), DT, &mut s);
        c.handle_event(&fist(GesturePhase::Started), DT, &mut s);
        c.handle_event(&orbit(GesturePhase::Started, [0.5, 0.5]), DT, &mut s);
        c.handle_event(&orbit(GesturePhase::Active, [0.9, 0.2]), DT, &mut s);

        c.reset(&mut s);
        assert_eq!(c.cell_count(), 0);
        assert_eq!(s.buffer.len(), 0);
        assert_eq!(s.cleared, 1);
        assert!(!c.erase_mode());
        assert!(!s.erase_visual);
        assert!(!s.preview_visible);
        assert_eq!(s.rotation_target, (0.0, 0.0));
        assert_eq!(c.build_frame().yaw_target, 0.0);
        assert!(!c.placement_blocked());
    }

    #[test]
    fn store_and_buffer_stay_bijective() {
        let mut c = ctrl();
        let mut s = TestSurface::new();

        // Scatter placements.
        for (x, y) in [(0.0, 0.0), (0.9, 0.0), (-0.9, 0.45), (0.0, 0.9), (0.45, -0.45)] {
            c.handle_event(&draw(GesturePhase::Started, (x, y, 0.0)), DT, &mut s);
            c.handle_event(&draw(GesturePhase::Ended, (x, y, 0.0)), DT, &mut s);
        }
        // Erase a couple.
        c.handle_event(&fist(GesturePhase::Started), DT, &mut s);
        for (x, y) in [(0.9, 0.0), (0.0, 0.9)] {
            c.handle_event(&draw(GesturePhase::Started, (x, y, 0.0)), DT, &mut s);
            c.handle_event(&draw(GesturePhase::Ended, (x, y, 0.0)), DT, &mut s);
        }
        c.handle_event(&fist(GesturePhase::Ended), DT, &mut s);
        // And place again.
        c.handle_event(&draw(GesturePhase::Started, (0.9, 0.0, 0.0)), DT, &mut s);

        assert_eq!(c.cell_count(), s.buffer.len());
        let from_store: HashSet<GridCell> = c.store().iter().copied().collect();
        assert_eq!(from_store, s.cells());
        for (i, rec) in s.buffer.records().iter().enumerate() {
            assert_eq!(s.buffer.slot_of(rec.cell), Some(i), "index map must stay dense");
        }
    }

    #[test]
    fn placement_is_correct_under_rotation() {
        let mut c = ctrl();
        let mut s = TestSurface::new();

        // Drag the build to yaw = π/2 and let the easing converge.
        let dx = std::f32::consts::FRAC_PI_2 / ORBIT_YAW_GAIN;
        c.handle_event(&orbit(GesturePhase::Started, [0.5, 0.5]), DT, &mut s);
        c.handle_event(&orbit(GesturePhase::Active, [0.5 + dx, 0.5]), DT, &mut s);
        for _ in 0..600 {
            c.advance(1.0 / 60.0);
        }

        // A pinch at world (0.45, 0, 0) lands one cell along local +z.
        c.handle_event(&draw(GesturePhase::Started, (0.45, 0.0, 0.0)), DT, &mut s);
        assert!(c.store().has(GridCell::new(0, 0, 1)), "cells: {:?}", s.cells());
    }

    #[test]
    fn depth_gesture_places_at_estimated_z() {
        let mut c = ctrl();
        let mut s = TestSurface::new();
        let mut e = draw(GesturePhase::Started, (0.0, 0.0, 5.0));
        e.scale = Some(0.2);
        c.handle_event(&e, DT, &mut s);
        // Raw z = 5.0 is ignored: depth starts at 0 relative to gesture start.
        assert!(c.store().has(GridCell::new(0, 0, 0)));

        // Hand moves toward the sensor: scale grows, cell moves along +z.
        let mut e = draw(GesturePhase::Active, (0.0, 0.0, 5.0));
        e.scale = Some(0.3);
        for _ in 0..40 {
            c.handle_event(&e, DT, &mut s);
        }
        let placed: Vec<GridCell> = c.store().iter().copied().collect();
        assert!(placed.iter().any(|cl| cl.z > 1), "cells: {:?}", placed);
    }

    #[test]
    fn missing_scale_falls_back_to_raw_position() {
        let mut c = ctrl();
        let mut s = TestSurface::new();
        let mut e = draw(GesturePhase::Started, (0.0, 0.0, 0.9));
        e.scale = None;
        c.handle_event(&e, DT, &mut s);
        // Raw position used unmodified: z = 0.9 snaps to cell z = 2.
        assert!(c.store().has(GridCell::new(0, 0, 2)));
    }
}
