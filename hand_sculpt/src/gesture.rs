//! Gesture events and the hand-tracking collaborator contracts.
//!
//! The public interface is [`GestureEvent`]: a typed gesture with a lifecycle
//! phase, produced either by a real hand tracker run through the classifier or
//! by the keyboard/mouse simulator. Consumers don't need to know which.

use std::collections::HashMap;
use std::sync::mpsc::Receiver;

use cgmath::{InnerSpace, Vector3};

// ════════════════════════════════════════════════════════════════════════════
// Landmark layout
// ════════════════════════════════════════════════════════════════════════════

/// Number of landmarks per tracked hand; the order is fixed and indexable.
pub const LANDMARK_COUNT: usize = 21;

pub const WRIST:      usize = 0;
pub const THUMB_TIP:  usize = 4;
pub const INDEX_TIP:  usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_TIP: usize = 12;
pub const RING_TIP:   usize = 16;
pub const PINKY_TIP:  usize = 20;

/// Horizontal extent of the world region a full sensor sweep covers.
pub const VIEW_SPAN: f32 = 7.0;

// ════════════════════════════════════════════════════════════════════════════
// Event model
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Handedness {
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureKind {
    /// Thumb–index pinch. Right hand draws/erases, left hand orbits.
    Pinch,
    /// Closed fist — momentary erase mode while held (left hand).
    Fist,
    /// Thumb–pinky pinch — cycles the palette on start (either hand).
    PinkyPinch,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GesturePhase {
    Started,
    Active,
    Ended,
}

/// One classified gesture observation for one hand, one frame.
#[derive(Clone, Copy, Debug)]
pub struct GestureEvent {
    pub kind:       GestureKind,
    pub phase:      GesturePhase,
    /// Tracker-reported hand index; per-hand state is keyed on this.
    pub hand:       usize,
    pub handedness: Handedness,
    /// World-space position of the gesture point (depth channel is raw and
    /// unreliable — the controller substitutes an estimated depth).
    pub position:   Vector3<f32>,
    /// Normalized screen position, 0–1 on each axis.
    pub screen:     [f32; 2],
    /// Hand-scale depth proxy sample (2D wrist↔middle-MCP distance);
    /// None when landmark data was unavailable this frame.
    pub scale:      Option<f32>,
}

// ════════════════════════════════════════════════════════════════════════════
// Collaborator contracts
// ════════════════════════════════════════════════════════════════════════════

/// One tracked hand for one frame: ordered normalized landmarks plus the
/// handedness label.
#[derive(Clone, Debug)]
pub struct HandFrame {
    pub landmarks:  Vec<Vector3<f32>>,
    pub handedness: Handedness,
}

/// A hand-pose tracker. May report fewer or more hands frame to frame, or
/// None when no detection ran.
pub trait HandTracker {
    fn detect(&mut self, timestamp: f64) -> Option<Vec<HandFrame>>;
}

/// Turns landmark frames into phased [`GestureEvent`]s.
pub trait GestureClassifier {
    fn classify(&mut self, hands: &[HandFrame], timestamp: f64) -> Vec<GestureEvent>;
}

/// A complete event source for the frame driver: sim or tracker+classifier.
pub trait GestureFeed {
    fn poll(&mut self, timestamp: f64) -> FeedFrame;
}

/// Everything a feed produced for one frame.
#[derive(Clone, Debug, Default)]
pub struct FeedFrame {
    pub events: Vec<GestureEvent>,
    pub reset:  bool,
    pub quit:   bool,
}

/// The hand-scale depth proxy: image-plane distance from the wrist to the
/// middle-finger base. Shrinks as the hand recedes from the sensor.
pub fn hand_scale(frame: &HandFrame) -> Option<f32> {
    if frame.landmarks.len() < LANDMARK_COUNT {
        return None;
    }
    let w = frame.landmarks[WRIST];
    let m = frame.landmarks[MIDDLE_MCP];
    let dx = w.x - m.x;
    let dy = w.y - m.y;
    Some((dx * dx + dy * dy).sqrt())
}

/// Map a normalized sensor point (x right→left mirrored, y top-down) to a
/// camera-relative world position. The raw z rides along unchanged.
pub fn sensor_to_world(p: Vector3<f32>) -> Vector3<f32> {
    Vector3::new(
        (0.5 - p.x) * VIEW_SPAN,
        (0.5 - p.y) * VIEW_SPAN * 0.75,
        p.z,
    )
}

// ════════════════════════════════════════════════════════════════════════════
// PinchClassifier — reference classifier over landmark frames
// ════════════════════════════════════════════════════════════════════════════

/// Distance thresholds, in normalized landmark units, with hysteresis so a
/// gesture that has started does not flicker at the boundary.
const PINCH_ON:   f32 = 0.05;
const PINCH_OFF:  f32 = 0.07;
const PINKY_ON:   f32 = 0.06;
const PINKY_OFF:  f32 = 0.08;
const FIST_CURL:  f32 = 0.18;
const FIST_OPEN:  f32 = 0.22;

#[derive(Clone, Copy, Debug, Default)]
struct ActiveKinds {
    pinch: bool,
    fist:  bool,
    pinky: bool,
}

/// Landmark-geometry classifier: thumb–index pinch, curled-fingers fist,
/// thumb–pinky pinch. Keeps per-hand on/off state for phase lifecycles;
/// state for a hand index that stops being reported is simply dropped — the
/// controller treats the disappearance as an implicit end.
#[derive(Default)]
pub struct PinchClassifier {
    active: HashMap<usize, ActiveKinds>,
}

impl PinchClassifier {
    pub fn new() -> Self {
        PinchClassifier::default()
    }

    fn phase(was: bool, now: bool) -> Option<GesturePhase> {
        match (was, now) {
            (false, true) => Some(GesturePhase::Started),
            (true, true)  => Some(GesturePhase::Active),
            (true, false) => Some(GesturePhase::Ended),
            (false, false) => None,
        }
    }
}

impl GestureClassifier for PinchClassifier {
    fn classify(&mut self, hands: &[HandFrame], _timestamp: f64) -> Vec<GestureEvent> {
        let mut events = Vec::new();
        let mut next: HashMap<usize, ActiveKinds> = HashMap::new();

        for (i, hand) in hands.iter().enumerate() {
            if hand.landmarks.len() < LANDMARK_COUNT {
                // Incomplete landmark data: no events, never a failure.
                continue;
            }
            let was = self.active.get(&i).copied().unwrap_or_default();
            let lm = &hand.landmarks;

            let pinch_d = (lm[THUMB_TIP] - lm[INDEX_TIP]).magnitude();
            let pinky_d = (lm[THUMB_TIP] - lm[PINKY_TIP]).magnitude();
            let curl = [INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP]
                .iter()
                .map(|&t| (lm[t] - lm[WRIST]).magnitude())
                .fold(0.0f32, f32::max);

            let pinch = if was.pinch { pinch_d < PINCH_OFF } else { pinch_d < PINCH_ON };
            let fist = if was.fist { curl < FIST_OPEN } else { curl < FIST_CURL };
            // A full pinch also brings the pinky near the thumb on some hands;
            // the index pinch takes priority.
            let pinky = !pinch
                && if was.pinky { pinky_d < PINKY_OFF } else { pinky_d < PINKY_ON };

            let now = ActiveKinds { pinch, fist, pinky };
            next.insert(i, now);

            let midpoint = (lm[THUMB_TIP] + lm[INDEX_TIP]) / 2.0;
            let base = GestureEvent {
                kind:       GestureKind::Pinch,
                phase:      GesturePhase::Active,
                hand:       i,
                handedness: hand.handedness,
                position:   sensor_to_world(midpoint),
                screen:     [midpoint.x, midpoint.y],
                scale:      hand_scale(hand),
            };

            if let Some(phase) = Self::phase(was.pinch, pinch) {
                events.push(GestureEvent { kind: GestureKind::Pinch, phase, ..base });
            }
            if let Some(phase) = Self::phase(was.fist, fist) {
                events.push(GestureEvent { kind: GestureKind::Fist, phase, ..base });
            }
            if let Some(phase) = Self::phase(was.pinky, pinky) {
                events.push(GestureEvent { kind: GestureKind::PinkyPinch, phase, ..base });
            }
        }

        self.active = next;
        events
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SimGestureFeed — keyboard/mouse simulation (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Raw input event from the simulation window.
#[derive(Clone, Copy, Debug)]
pub enum SimInput {
    /// Normalized mouse position, 0–1 on each axis.
    MouseMove(f32, f32),
    KeyDown(SimKey),
    KeyUp(SimKey),
}

/// Simulated key codes (mapped from minifb keys / mouse buttons).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimKey {
    Draw,      // Z or left mouse button  — right-hand pinch
    Orbit,     // X or right mouse button — left-hand pinch
    Fist,      // C — left-hand fist (erase mode while held)
    Pinky,     // V — pinky pinch (palette cycle)
    ScaleUp,   // W — virtual hand toward the sensor
    ScaleDown, // S — virtual hand away from the sensor
    Reset,     // R
    Quit,      // Q
}

/// Gesture feed driven by [`SimInput`] events from the visualizer's window.
///
/// A virtual right hand follows the mouse and a virtual hand scale follows
/// W/S, so the whole depth pipeline is exercised without hardware. This
/// decouples the window event loop from gesture logic.
pub struct SimGestureFeed {
    rx:          Receiver<SimInput>,
    mouse:       [f32; 2],
    scale:       f32,
    draw_held:   bool,
    orbit_held:  bool,
    fist_held:   bool,
    pinky_held:  bool,
    prev_draw:   bool,
    prev_orbit:  bool,
    prev_fist:   bool,
    prev_pinky:  bool,
}

/// How far one W/S input nudges the virtual hand scale.
const SCALE_STEP: f32 = 0.004;

impl SimGestureFeed {
    pub fn new(rx: Receiver<SimInput>) -> Self {
        SimGestureFeed {
            rx,
            mouse: [0.5, 0.5],
            scale: 0.2,
            draw_held: false,
            orbit_held: false,
            fist_held: false,
            pinky_held: false,
            prev_draw: false,
            prev_orbit: false,
            prev_fist: false,
            prev_pinky: false,
        }
    }

    fn push_role(
        events: &mut Vec<GestureEvent>,
        prev: &mut bool,
        held: bool,
        ev: impl Fn(GesturePhase) -> GestureEvent,
    ) {
        match (*prev, held) {
            (false, true) => events.push(ev(GesturePhase::Started)),
            (true, true)  => events.push(ev(GesturePhase::Active)),
            (true, false) => events.push(ev(GesturePhase::Ended)),
            (false, false) => {}
        }
        *prev = held;
    }
}

impl GestureFeed for SimGestureFeed {
    fn poll(&mut self, _timestamp: f64) -> FeedFrame {
        let mut frame = FeedFrame::default();

        for input in self.rx.try_iter() {
            match input {
                SimInput::MouseMove(x, y) => self.mouse = [x, y],
                SimInput::KeyDown(SimKey::Draw) => self.draw_held = true,
                SimInput::KeyUp(SimKey::Draw) => self.draw_held = false,
                SimInput::KeyDown(SimKey::Orbit) => self.orbit_held = true,
                SimInput::KeyUp(SimKey::Orbit) => self.orbit_held = false,
                SimInput::KeyDown(SimKey::Fist) => self.fist_held = true,
                SimInput::KeyUp(SimKey::Fist) => self.fist_held = false,
                SimInput::KeyDown(SimKey::Pinky) => self.pinky_held = true,
                SimInput::KeyUp(SimKey::Pinky) => self.pinky_held = false,
                SimInput::KeyDown(SimKey::ScaleUp) => {
                    self.scale = (self.scale + SCALE_STEP).min(0.6);
                }
                SimInput::KeyDown(SimKey::ScaleDown) => {
                    self.scale = (self.scale - SCALE_STEP).max(0.05);
                }
                SimInput::KeyUp(SimKey::ScaleUp) | SimInput::KeyUp(SimKey::ScaleDown) => {}
                SimInput::KeyDown(SimKey::Reset) => frame.reset = true,
                SimInput::KeyDown(SimKey::Quit) => frame.quit = true,
                SimInput::KeyUp(SimKey::Reset) | SimInput::KeyUp(SimKey::Quit) => {}
            }
        }

        // Hand 0 = virtual right hand (draw tool, palette), hand 1 = virtual
        // left hand (orbit, fist).
        let mouse = self.mouse;
        let scale = self.scale;
        let mk = move |kind, phase, hand, handedness| GestureEvent {
            kind,
            phase,
            hand,
            handedness,
            position: sensor_to_world(Vector3::new(mouse[0], mouse[1], 0.0)),
            screen: mouse,
            scale: Some(scale),
        };

        let draw = self.draw_held;
        Self::push_role(&mut frame.events, &mut self.prev_draw, draw, |p| {
            mk(GestureKind::Pinch, p, 0, Handedness::Right)
        });
        let pinky = self.pinky_held;
        Self::push_role(&mut frame.events, &mut self.prev_pinky, pinky, |p| {
            mk(GestureKind::PinkyPinch, p, 0, Handedness::Right)
        });
        let orbit = self.orbit_held;
        Self::push_role(&mut frame.events, &mut self.prev_orbit, orbit, |p| {
            mk(GestureKind::Pinch, p, 1, Handedness::Left)
        });
        let fist = self.fist_held;
        Self::push_role(&mut frame.events, &mut self.prev_fist, fist, |p| {
            mk(GestureKind::Fist, p, 1, Handedness::Left)
        });

        frame
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
