//! Color themes for the build.
//!
//! Each palette is a pair of HSL endpoints: cells at the bottom of the
//! occupied extent take the `bottom` color, cells at the top take `top`, and
//! everything between is a linear HSL interpolation. Palettes are data — they
//! are selected by index and swapped, never mutated.

use voxel_grid::YRange;

// ════════════════════════════════════════════════════════════════════════════
// Hsl
// ════════════════════════════════════════════════════════════════════════════

/// Hue (degrees), saturation and lightness (0–1).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hsl {
    pub h: f32,
    pub s: f32,
    pub l: f32,
}

impl Hsl {
    pub const fn new(h: f32, s: f32, l: f32) -> Self {
        Hsl { h, s, l }
    }
}

/// Linear interpolation between two HSL colors; hue along the shorter arc.
pub fn lerp_hsl(a: Hsl, b: Hsl, t: f32) -> Hsl {
    let t = t.clamp(0.0, 1.0);
    let mut dh = (b.h - a.h) % 360.0;
    if dh > 180.0 {
        dh -= 360.0;
    } else if dh < -180.0 {
        dh += 360.0;
    }
    Hsl {
        h: (a.h + dh * t).rem_euclid(360.0),
        s: a.s + (b.s - a.s) * t,
        l: a.l + (b.l - a.l) * t,
    }
}

/// Convert HSL → packed ARGB (0xAARRGGBB, A = 0xFF).
pub fn hsl_to_argb(c: Hsl) -> u32 {
    let h = c.h.rem_euclid(360.0);
    let s = c.s.clamp(0.0, 1.0);
    let l = c.l.clamp(0.0, 1.0);

    let chroma = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = h / 60.0;
    let x = chroma * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r1, g1, b1) = match hp as u32 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };
    let m = l - chroma / 2.0;
    let ri = ((r1 + m) * 255.0).round() as u32;
    let gi = ((g1 + m) * 255.0).round() as u32;
    let bi = ((b1 + m) * 255.0).round() as u32;
    0xFF00_0000 | (ri << 16) | (gi << 8) | bi
}

// ════════════════════════════════════════════════════════════════════════════
// Palette
// ════════════════════════════════════════════════════════════════════════════

/// A named color theme: gradient endpoints plus material parameters for the
/// presentation layer (roughness/metalness are carried as data; the software
/// renderer only uses them for shading weights).
#[derive(Clone, Copy, Debug)]
pub struct Palette {
    pub name:      &'static str,
    pub bottom:    Hsl,
    pub top:       Hsl,
    pub roughness: f32,
    pub metalness: f32,
    pub edge:      u32,
}

impl Palette {
    /// Gradient color for a cell at height `y`, normalised over `extent`.
    /// A degenerate extent (single occupied height, or empty) resolves to the
    /// gradient midpoint rather than a division by zero.
    pub fn color_at(&self, y: i32, extent: YRange) -> u32 {
        let t = if extent.is_degenerate() {
            0.5
        } else {
            (y - extent.min) as f32 / extent.span() as f32
        };
        hsl_to_argb(lerp_hsl(self.bottom, self.top, t))
    }
}

/// The fixed palette catalog; cycling advances modulo this length.
pub static PALETTES: &[Palette] = &[
    Palette {
        name:      "aurora",
        bottom:    Hsl::new(190.0, 0.85, 0.45),
        top:       Hsl::new(300.0, 0.75, 0.65),
        roughness: 0.35,
        metalness: 0.10,
        edge:      0xFF10_2030,
    },
    Palette {
        name:      "magma",
        bottom:    Hsl::new(10.0, 0.90, 0.35),
        top:       Hsl::new(50.0, 0.95, 0.60),
        roughness: 0.55,
        metalness: 0.05,
        edge:      0xFF30_1008,
    },
    Palette {
        name:      "moss",
        bottom:    Hsl::new(95.0, 0.55, 0.30),
        top:       Hsl::new(140.0, 0.60, 0.62),
        roughness: 0.80,
        metalness: 0.00,
        edge:      0xFF0E_2012,
    },
    Palette {
        name:      "chrome",
        bottom:    Hsl::new(210.0, 0.15, 0.40),
        top:       Hsl::new(210.0, 0.10, 0.85),
        roughness: 0.15,
        metalness: 0.90,
        edge:      0xFF18_1C22,
    },
];

/// Advance a palette index by one, wrapping at the catalog end.
pub fn next_palette(index: usize) -> usize {
    (index + 1) % PALETTES.len()
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
