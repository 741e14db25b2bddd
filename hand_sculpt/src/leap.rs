//! LeapMotion hand tracking (`--features leap`).
//!
//! Adapts LeapC tracking frames to the 21-landmark [`HandFrame`] layout and
//! runs them through the [`PinchClassifier`], so the controller sees exactly
//! the same events as in simulation mode.

use cgmath::Vector3;
use log::warn;

use crate::app::SculptError;
use crate::gesture::{
    FeedFrame, GestureClassifier, GestureFeed, HandFrame, HandTracker, Handedness,
    PinchClassifier,
};

// Interaction volume above the sensor, in millimeters. Positions are
// normalized into 0–1 against this box before classification.
const SPAN_X_MM: f32 = 400.0;
const Y_MIN_MM:  f32 = 80.0;
const SPAN_Y_MM: f32 = 420.0;

// ════════════════════════════════════════════════════════════════════════════
// LeapHandTracker
// ════════════════════════════════════════════════════════════════════════════

/// Hand tracker backed by a live LeapC connection.
pub struct LeapHandTracker {
    connection: leaprs::Connection,
}

impl LeapHandTracker {
    pub fn connect() -> Result<Self, SculptError> {
        let mut connection = leaprs::Connection::create(leaprs::ConnectionConfig::default())
            .map_err(|e| SculptError::Tracker(format!("{:?}", e)))?;
        connection
            .open()
            .map_err(|e| SculptError::Tracker(format!("{:?}", e)))?;
        Ok(LeapHandTracker { connection })
    }
}

impl HandTracker for LeapHandTracker {
    fn detect(&mut self, _timestamp: f64) -> Option<Vec<HandFrame>> {
        // Short timeout: at worst one tracking frame behind the renderer.
        let msg = match self.connection.poll(5) {
            Ok(m) => m,
            Err(e) => {
                warn!("leap poll failed: {:?}", e);
                return None;
            }
        };
        if let leaprs::Event::Tracking(tracking) = msg.event() {
            Some(tracking.hands().map(hand_frame).collect())
        } else {
            None
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LeapGestureFeed — tracker + classifier, one event source
// ════════════════════════════════════════════════════════════════════════════

pub struct LeapGestureFeed {
    tracker:    LeapHandTracker,
    classifier: PinchClassifier,
}

impl LeapGestureFeed {
    pub fn connect() -> Result<Self, SculptError> {
        Ok(LeapGestureFeed {
            tracker:    LeapHandTracker::connect()?,
            classifier: PinchClassifier::new(),
        })
    }
}

impl GestureFeed for LeapGestureFeed {
    fn poll(&mut self, timestamp: f64) -> FeedFrame {
        let mut frame = FeedFrame::default();
        if let Some(hands) = self.tracker.detect(timestamp) {
            frame.events = self.classifier.classify(&hands, timestamp);
        }
        frame
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Landmark adaptation
// ════════════════════════════════════════════════════════════════════════════

/// Flatten one LeapC hand into the fixed landmark order: wrist, then four
/// joints per digit (MCP, PIP, DIP, tip), thumb through pinky.
fn hand_frame(hand: leaprs::Hand) -> HandFrame {
    let mut landmarks = Vec::with_capacity(21);
    let wrist = hand.arm().next_joint();
    landmarks.push(normalize(wrist.x, wrist.y, wrist.z));
    for digit in hand.digits() {
        for joint in [
            digit.proximal().prev_joint(),
            digit.proximal().next_joint(),
            digit.intermediate().next_joint(),
            digit.distal().next_joint(),
        ] {
            landmarks.push(normalize(joint.x, joint.y, joint.z));
        }
    }
    let handedness = match hand.hand_type() {
        leaprs::HandType::Left => Handedness::Left,
        leaprs::HandType::Right => Handedness::Right,
    };
    HandFrame { landmarks, handedness }
}

/// Millimeter sensor coordinates → the normalized box the classifier expects
/// (x left-to-right, y top-down, z toward the viewer).
fn normalize(x: f32, y: f32, z: f32) -> Vector3<f32> {
    Vector3::new(
        (0.5 + x / SPAN_X_MM).clamp(0.0, 1.0),
        (1.0 - (y - Y_MIN_MM) / SPAN_Y_MM).clamp(0.0, 1.0),
        (-z / SPAN_X_MM).clamp(-1.0, 1.0),
    )
}
