//! # hand_sculpt
//!
//! Gesture-controlled voxel sculpting: pinch in the air to place cubes on a
//! snapped 3D grid, orbit the build with the other hand, and recolor it with
//! height-mapped palettes — rendered in a software-projected minifb window.
//!
//! ## Gesture → Action mapping
//!
//! | Gesture | Hand | Action |
//! |---|---|---|
//! | Thumb–index pinch | Right | Place cubes along the drag path (erase while fist held) |
//! | Thumb–index pinch | Left | Orbit: drag to yaw/pitch the build |
//! | Closed fist (held) | Left | Erase mode — the drawing pinch removes cubes |
//! | Thumb–pinky pinch | Either | Cycle the color palette |
//!
//! Depth is estimated from apparent hand scale: move the hand toward the
//! sensor and the cursor moves toward the viewer. A hand that leaves the
//! tracking volume mid-gesture gets an implicit gesture end.
//!
//! ## Feature flags
//!
//! * (default) — **Simulation mode**: mouse and keyboard drive all gestures.
//! * `leap` — **Hardware mode**: polls a real LeapMotion controller via LeapC.
//!
//! ### Simulation controls
//!
//! | Input | Gesture |
//! |---|---|
//! | Mouse | Virtual right-hand position |
//! | `Z` / left mouse (hold) | Draw pinch |
//! | `X` / right mouse (hold) | Orbit pinch |
//! | `C` (hold) | Fist / erase mode |
//! | `V` | Pinky pinch / palette cycle |
//! | `W` / `S` (hold) | Virtual hand toward / away from the sensor (depth) |
//! | `R` | Reset the build |
//! | `Q` | Quit |

pub mod gesture;
pub mod depth;
pub mod perf;
pub mod surface;
pub mod controller;
pub mod visualizer;
pub mod app;

#[cfg(feature = "leap")]
pub mod leap;
