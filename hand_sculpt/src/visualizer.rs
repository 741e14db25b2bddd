//! Software-rendered visualizer using `minifb`.
//!
//! A perspective projection of the build: every placed cube is rotated by the
//! current build orientation, projected, and painted far-to-near; the ground
//! reference grid stays unrotated so the user keeps a fixed horizon. The ghost
//! preview cube rides on top, switching to a warning color in erase mode.
//!
//! The window doubles as the simulation input device: keyboard and mouse
//! state is translated to [`SimInput`] events and sent to the gesture feed.

use std::sync::mpsc::Sender;

use cgmath::{Rotation, Vector3};
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

use voxel_grid::space::BuildFrame;
use voxel_grid::{GridCell, YRange};
use voxel_scene::palette::PALETTES;
use voxel_scene::InstanceBuffer;

use crate::app::AppConfig;
use crate::gesture::{SimInput, SimKey};
use crate::surface::PresentationSurface;

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W: usize = 960;
pub const WIN_H: usize = 720;

const BG_COLOR:      u32 = 0xFF14141E;
const STATUS_BG:     u32 = 0xFF0F2440;
const GROUND_COLOR:  u32 = 0xFF2A2A3C;
const PREVIEW_COLOR: u32 = 0xFFE8E8F0;
const ERASE_COLOR:   u32 = 0xFFFF4444;
const TEXT_COLOR:    u32 = 0xFFEEEEEE;
const LEGEND_COLOR:  u32 = 0xFF888888;

/// Camera distance from the build origin along +z (view space).
const CAM_DIST: f32 = 9.0;
/// Ground plane height, world units.
const GROUND_Y: f32 = -2.25;
/// Half-width of the ground grid, in cells.
const GROUND_CELLS: i32 = 7;

// ════════════════════════════════════════════════════════════════════════════
// Projection helpers (pure, testable)
// ════════════════════════════════════════════════════════════════════════════

/// Perspective-project a rotated point; None when behind the near plane.
fn project(v: Vector3<f32>, w: usize, h: usize) -> Option<(f32, f32, f32)> {
    let z_view = v.z + CAM_DIST;
    if z_view < 0.5 {
        return None;
    }
    let f = h as f32 * 0.9;
    let sx = w as f32 / 2.0 + f * v.x / z_view;
    let sy = h as f32 / 2.0 - f * v.y / z_view;
    Some((sx, sy, z_view))
}

/// Scale the RGB channels of an ARGB color; alpha is preserved.
fn darken(color: u32, k: f32) -> u32 {
    let k = k.clamp(0.0, 1.0);
    let ch = |c: u32| ((c as f32 * k) as u32).min(255);
    (color & 0xFF00_0000)
        | (ch((color >> 16) & 0xFF) << 16)
        | (ch((color >> 8) & 0xFF) << 8)
        | ch(color & 0xFF)
}

// ════════════════════════════════════════════════════════════════════════════
// SoftwareVisualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct SoftwareVisualizer {
    window:  Window,
    buf:     Vec<u32>,
    width:   usize,
    height:  usize,
    sim_tx:  Sender<SimInput>,

    // ── mirrored render state ────────────────────────────────────────────
    buffer:          InstanceBuffer,
    palette:         usize,
    frame:           BuildFrame,
    rotation_rate:   f32,
    cell_size:       f32,
    preview_visible: bool,
    preview_pos:     Vector3<f32>,
    erasing:         bool,
    disposed:        bool,

    // ── input edge detection ─────────────────────────────────────────────
    prev_lmb: bool,
    prev_rmb: bool,
}

impl SoftwareVisualizer {
    pub fn new(sim_tx: Sender<SimInput>, cfg: &AppConfig) -> Result<Self, minifb::Error> {
        let mut window = Window::new(
            "Hand Sculpt — gesture voxel sculptor",
            WIN_W,
            WIN_H,
            WindowOptions { resize: false, ..WindowOptions::default() },
        )?;
        window.limit_update_rate(Some(std::time::Duration::from_millis(16))); // ~60fps

        Ok(SoftwareVisualizer {
            window,
            buf: vec![BG_COLOR; WIN_W * WIN_H],
            width: WIN_W,
            height: WIN_H,
            sim_tx,
            buffer: InstanceBuffer::new(cfg.max_cells, cfg.cell_size),
            palette: cfg.palette % PALETTES.len(),
            frame: BuildFrame::default(),
            rotation_rate: cfg.rotation_rate,
            cell_size: cfg.cell_size,
            preview_visible: false,
            preview_pos: Vector3::new(0.0, 0.0, 0.0),
            erasing: false,
            disposed: false,
            prev_lmb: false,
            prev_rmb: false,
        })
    }

    pub fn is_open(&self) -> bool {
        !self.disposed && self.window.is_open()
    }

    // ── input ────────────────────────────────────────────────────────────

    /// Poll window input and translate to SimInput events.
    /// Returns false when the window should close.
    pub fn poll_input(&mut self) -> bool {
        if !self.is_open() {
            return false;
        }

        if let Some((mx, my)) = self.window.get_mouse_pos(MouseMode::Clamp) {
            let _ = self.sim_tx.send(SimInput::MouseMove(
                mx / self.width as f32,
                my / self.height as f32,
            ));
        }

        // Mouse buttons: left = draw pinch, right = orbit pinch.
        let lmb = self.window.get_mouse_down(MouseButton::Left);
        if lmb != self.prev_lmb {
            let ev = if lmb { SimInput::KeyDown(SimKey::Draw) } else { SimInput::KeyUp(SimKey::Draw) };
            let _ = self.sim_tx.send(ev);
            self.prev_lmb = lmb;
        }
        let rmb = self.window.get_mouse_down(MouseButton::Right);
        if rmb != self.prev_rmb {
            let ev = if rmb { SimInput::KeyDown(SimKey::Orbit) } else { SimInput::KeyUp(SimKey::Orbit) };
            let _ = self.sim_tx.send(ev);
            self.prev_rmb = rmb;
        }

        // Held gesture keys.
        for (key, sim) in [
            (Key::Z, SimKey::Draw),
            (Key::X, SimKey::Orbit),
            (Key::C, SimKey::Fist),
            (Key::V, SimKey::Pinky),
        ] {
            if self.window.is_key_pressed(key, KeyRepeat::No) {
                let _ = self.sim_tx.send(SimInput::KeyDown(sim));
            }
            if self.window.is_key_released(key) {
                let _ = self.sim_tx.send(SimInput::KeyUp(sim));
            }
        }

        // Depth nudge keys repeat while held.
        if self.window.is_key_down(Key::W) {
            let _ = self.sim_tx.send(SimInput::KeyDown(SimKey::ScaleUp));
        }
        if self.window.is_key_down(Key::S) {
            let _ = self.sim_tx.send(SimInput::KeyDown(SimKey::ScaleDown));
        }

        if self.window.is_key_pressed(Key::R, KeyRepeat::No) {
            let _ = self.sim_tx.send(SimInput::KeyDown(SimKey::Reset));
        }
        if self.window.is_key_pressed(Key::Q, KeyRepeat::No)
            || self.window.is_key_pressed(Key::Escape, KeyRepeat::No)
        {
            let _ = self.sim_tx.send(SimInput::KeyDown(SimKey::Quit));
        }

        true
    }

    // ── rendering ────────────────────────────────────────────────────────

    /// Render one frame. `dt` drives the approach-to-target orbit easing.
    pub fn render(&mut self, status: &str, dt: f32) {
        if self.disposed {
            return;
        }
        self.frame.advance(self.rotation_rate, dt);
        self.buf.fill(BG_COLOR);

        self.draw_ground();
        self.draw_cubes();
        if self.preview_visible {
            self.draw_preview();
        }

        // ── Status bar ────────────────────────────────────────────────────
        let status_y = self.height - 36;
        self.fill_rect(0, status_y, self.width, self.height - status_y, STATUS_BG);
        self.draw_label(status, 10, status_y + 8, TEXT_COLOR);
        self.draw_label(
            "mouse=hand  lmb/z=pinch  rmb/x=orbit  c=fist erase  v=palette  w/s=depth  r=reset  q=quit",
            10,
            self.height - 14,
            LEGEND_COLOR,
        );

        self.window
            .update_with_buffer(&self.buf, self.width, self.height)
            .ok();
    }

    /// Ground reference grid — deliberately *not* rotated with the build.
    fn draw_ground(&mut self) {
        let s = self.cell_size;
        let ext = GROUND_CELLS as f32 * s;
        for i in -GROUND_CELLS..=GROUND_CELLS {
            let a = Vector3::new(i as f32 * s, GROUND_Y, -ext);
            let b = Vector3::new(i as f32 * s, GROUND_Y, ext);
            self.draw_segment(a, b, GROUND_COLOR);
            let a = Vector3::new(-ext, GROUND_Y, i as f32 * s);
            let b = Vector3::new(ext, GROUND_Y, i as f32 * s);
            self.draw_segment(a, b, GROUND_COLOR);
        }
    }

    fn draw_cubes(&mut self) {
        let q = self.frame.orientation();
        let edge = PALETTES[self.palette].edge;

        // Painter's order: far to near.
        let mut items: Vec<(f32, f32, f32, f32, u32)> = Vec::with_capacity(self.buffer.len());
        for rec in self.buffer.records() {
            let v = q.rotate_vector(rec.translation);
            if let Some((sx, sy, z)) = project(v, self.width, self.height) {
                let size = self.height as f32 * 0.9 * self.cell_size / z;
                // Cheap depth cue: cubes dim as they recede.
                let shade = (CAM_DIST / z).clamp(0.55, 1.0);
                items.push((z, sx, sy, size, darken(rec.color, shade)));
            }
        }
        items.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        for (_, sx, sy, size, color) in items {
            let half = size / 2.0;
            let x0 = (sx - half).max(0.0) as usize;
            let y0 = (sy - half).max(0.0) as usize;
            let w = size as usize + 1;
            let h = size as usize + 1;
            self.fill_rect(x0, y0, w, h, color);
            self.draw_border(x0, y0, w, h, edge);
        }
    }

    fn draw_preview(&mut self) {
        let q = self.frame.orientation();
        let v = q.rotate_vector(self.preview_pos);
        if let Some((sx, sy, z)) = project(v, self.width, self.height) {
            let size = self.height as f32 * 0.9 * self.cell_size / z;
            let half = size / 2.0;
            let color = if self.erasing { ERASE_COLOR } else { PREVIEW_COLOR };
            let x0 = (sx - half).max(0.0) as usize;
            let y0 = (sy - half).max(0.0) as usize;
            self.draw_border(x0, y0, size as usize + 1, size as usize + 1, color);
        }
    }

    fn draw_segment(&mut self, a: Vector3<f32>, b: Vector3<f32>, color: u32) {
        let (pa, pb) = match (
            project(a, self.width, self.height),
            project(b, self.width, self.height),
        ) {
            (Some(pa), Some(pb)) => (pa, pb),
            _ => return,
        };
        self.draw_line(pa.0, pa.1, pb.0, pb.1, color);
    }

    // ── primitive drawing helpers ────────────────────────────────────────

    fn draw_line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, color: u32) {
        let dx = x1 - x0;
        let dy = y1 - y0;
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0);
        for i in 0..=steps as usize {
            let t = i as f32 / steps;
            let x = x0 + dx * t;
            let y = y0 + dy * t;
            if x >= 0.0 && y >= 0.0 {
                self.set_pixel(x as usize, y as usize, color);
            }
        }
    }

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y + h).min(self.height) {
            for col in x..(x + w).min(self.width) {
                self.buf[row * self.width + col] = color;
            }
        }
    }

    fn draw_border(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        if w == 0 || h == 0 {
            return;
        }
        for col in x..(x + w).min(self.width) {
            if y < self.height {
                self.buf[y * self.width + col] = color;
            }
            if y + h - 1 < self.height {
                self.buf[(y + h - 1) * self.width + col] = color;
            }
        }
        for row in y..(y + h).min(self.height) {
            if x < self.width {
                self.buf[row * self.width + x] = color;
            }
            if x + w - 1 < self.width {
                self.buf[row * self.width + x + w - 1] = color;
            }
        }
    }

    fn set_pixel(&mut self, x: usize, y: usize, color: u32) {
        if x < self.width && y < self.height {
            self.buf[y * self.width + x] = color;
        }
    }

    /// Minimal bitmap font — 3×5 characters for the status/legend lines.
    fn draw_label(&mut self, text: &str, x: usize, y: usize, color: u32) {
        let mut cx = x;
        for ch in text.chars() {
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) != 0 {
                        self.set_pixel(cx + col, y + row, color);
                    }
                }
            }
            cx += 4; // 3 wide + 1 gap
            if cx + 4 > self.width {
                break;
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// PresentationSurface implementation
// ════════════════════════════════════════════════════════════════════════════

impl PresentationSurface for SoftwareVisualizer {
    fn add_record(&mut self, cell: GridCell, extent: YRange) -> bool {
        self.buffer.add(cell, extent, &PALETTES[self.palette])
    }

    fn remove_record(&mut self, cell: GridCell, extent: YRange) -> bool {
        self.buffer.remove(cell, extent, &PALETTES[self.palette])
    }

    fn recolor(&mut self, extent: YRange) {
        let p = &PALETTES[self.palette];
        self.buffer.recolor(extent, p);
    }

    fn set_palette(&mut self, index: usize) {
        self.palette = index % PALETTES.len();
    }

    fn set_rotation_target(&mut self, yaw: f32, pitch: f32) {
        self.frame.yaw_target = yaw;
        self.frame.pitch_target = pitch;
    }

    fn set_preview(&mut self, visible: bool, position: Vector3<f32>) {
        self.preview_visible = visible;
        self.preview_pos = position;
    }

    fn set_erase_visual(&mut self, erasing: bool) {
        self.erasing = erasing;
    }

    fn clear(&mut self) {
        self.buffer.clear();
        self.preview_visible = false;
        self.erasing = false;
        self.frame.reset();
    }

    fn resize(&mut self, width: usize, height: usize) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.buf = vec![BG_COLOR; self.width * self.height];
    }

    fn dispose(&mut self) {
        self.buffer.clear();
        self.disposed = true;
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 5] {
    match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'a' | 'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'b' | 'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'c' | 'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'd' | 'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'e' | 'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'f' | 'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'g' | 'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'h' | 'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'i' | 'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'j' | 'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'k' | 'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'l' | 'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'm' | 'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'n' | 'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'o' | 'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'p' | 'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'q' | 'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'r' | 'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        's' | 'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        't' | 'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' | 'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' | 'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'w' | 'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'x' | 'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' | 'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'z' | 'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '(' => [0b001, 0b010, 0b010, 0b010, 0b001],
        ')' => [0b100, 0b010, 0b010, 0b010, 0b100],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_centers_the_origin() {
        let (sx, sy, z) = project(Vector3::new(0.0, 0.0, 0.0), 960, 720).unwrap();
        assert!((sx - 480.0).abs() < 1e-3);
        assert!((sy - 360.0).abs() < 1e-3);
        assert!((z - CAM_DIST).abs() < 1e-5);
    }

    #[test]
    fn project_rejects_points_behind_camera() {
        assert!(project(Vector3::new(0.0, 0.0, -CAM_DIST), 960, 720).is_none());
    }

    #[test]
    fn project_up_is_screen_up() {
        let (_, sy, _) = project(Vector3::new(0.0, 1.0, 0.0), 960, 720).unwrap();
        assert!(sy < 360.0, "positive world y must move up the screen");
    }

    #[test]
    fn nearer_points_project_larger_offsets() {
        let (far_x, _, _) = project(Vector3::new(1.0, 0.0, 2.0), 960, 720).unwrap();
        let (near_x, _, _) = project(Vector3::new(1.0, 0.0, -2.0), 960, 720).unwrap();
        assert!((near_x - 480.0) > (far_x - 480.0));
    }

    #[test]
    fn darken_scales_channels_and_keeps_alpha() {
        assert_eq!(darken(0xFFFFFFFF, 0.5), 0xFF7F7F7F);
        assert_eq!(darken(0xFF804020, 1.0), 0xFF804020);
        assert_eq!(darken(0xFF804020, 0.0), 0xFF000000);
    }

    #[test]
    fn glyphs_cover_the_hud_charset() {
        let fallback = char_glyph('~');
        for ch in "abcdefghijklmnopqrstuvwxyz0123456789 ()=.,:-/".chars() {
            assert_ne!(char_glyph(ch), fallback, "missing glyph for {:?}", ch);
        }
    }
}
