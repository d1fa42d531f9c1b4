//! Color parsing, blending and the highlight palette.

use ratatui::style::Color;
use std::collections::HashMap;

/// RGB color (0-255 per channel)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn to_color(self) -> Color {
        Color::Rgb(self.r, self.g, self.b)
    }
}

/// HSL color (h: 0-360, s: 0-1, l: 0-1)
#[derive(Debug, Clone, Copy)]
pub struct Hsl {
    pub h: f32,
    pub s: f32,
    pub l: f32,
}

/// Highlight colors cycled with `C`
pub const DEFAULT_PALETTE: &[&str] = &["#007bff", "#ff9800", "#2ecc71", "#e91e63", "#9c27b0"];

/// Outline color of the flashing highlight
pub const FLASH_HEX: &str = "#ff0000";

/// Overlay opacity for normal and selected highlights
pub const NORMAL_ALPHA: f32 = 0.3;
pub const ACTIVE_ALPHA: f32 = 0.6;

/// Parse hex color string (e.g., "#007bff" or "007bff")
pub fn parse_hex(s: &str) -> Result<Rgb, String> {
    let s = s.trim().trim_start_matches('#');
    if s.len() != 6 {
        return Err(format!(
            "invalid hex color: expected 6 characters, got {}",
            s.len()
        ));
    }

    let channel = |range: std::ops::Range<usize>, name: &str| {
        u8::from_str_radix(&s[range], 16)
            .map_err(|_| format!("invalid hex color: bad {} component in '{}'", name, s))
    };

    Ok(Rgb {
        r: channel(0..2, "red")?,
        g: channel(2..4, "green")?,
        b: channel(4..6, "blue")?,
    })
}

pub fn rgb_to_hsl(rgb: Rgb) -> Hsl {
    let r = rgb.r as f32 / 255.0;
    let g = rgb.g as f32 / 255.0;
    let b = rgb.b as f32 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    if (max - min).abs() < f32::EPSILON {
        return Hsl { h: 0.0, s: 0.0, l };
    }

    let d = max - min;
    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };

    let h = if (max - r).abs() < f32::EPSILON {
        let mut h = (g - b) / d;
        if g < b {
            h += 6.0;
        }
        h
    } else if (max - g).abs() < f32::EPSILON {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };

    Hsl {
        h: (h * 60.0).rem_euclid(360.0),
        s: s.clamp(0.0, 1.0),
        l: l.clamp(0.0, 1.0),
    }
}

pub fn hsl_to_rgb(hsl: Hsl) -> Rgb {
    let h = hsl.h.rem_euclid(360.0);
    let s = hsl.s.clamp(0.0, 1.0);
    let l = hsl.l.clamp(0.0, 1.0);

    if s.abs() < f32::EPSILON {
        let v = (l * 255.0).round() as u8;
        return Rgb { r: v, g: v, b: v };
    }

    let q = if l < 0.5 {
        l * (1.0 + s)
    } else {
        l + s - l * s
    };
    let p = 2.0 * l - q;

    fn hue_to_rgb(p: f32, q: f32, mut t: f32) -> f32 {
        t = t.rem_euclid(1.0);
        if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 1.0 / 2.0 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        }
    }

    let h_norm = h / 360.0;
    Rgb {
        r: (hue_to_rgb(p, q, h_norm + 1.0 / 3.0) * 255.0).round() as u8,
        g: (hue_to_rgb(p, q, h_norm) * 255.0).round() as u8,
        b: (hue_to_rgb(p, q, h_norm - 1.0 / 3.0) * 255.0).round() as u8,
    }
}

/// Convert ratatui Color to Rgb. Returns None for ANSI colors.
pub fn color_to_rgb(color: Color) -> Option<Rgb> {
    match color {
        Color::Rgb(r, g, b) => Some(Rgb { r, g, b }),
        _ => None,
    }
}

/// Best-effort RGB value of ANSI colors, for blending on terminals
/// themed with the default palette
fn approximate_rgb(color: Color) -> Rgb {
    let (r, g, b) = match color {
        Color::Rgb(r, g, b) => (r, g, b),
        Color::Black => (0, 0, 0),
        Color::Red => (205, 49, 49),
        Color::Green => (13, 188, 121),
        Color::Yellow => (229, 229, 16),
        Color::Blue => (36, 114, 200),
        Color::Magenta => (188, 63, 188),
        Color::Cyan => (17, 168, 205),
        Color::Gray => (204, 204, 204),
        Color::DarkGray => (102, 102, 102),
        Color::LightRed => (241, 76, 76),
        Color::LightGreen => (35, 209, 139),
        Color::LightYellow => (245, 245, 67),
        Color::LightBlue => (59, 142, 234),
        Color::LightMagenta => (214, 112, 214),
        Color::LightCyan => (41, 184, 219),
        _ => (255, 255, 255),
    };
    Rgb { r, g, b }
}

/// Blend `fg` over `bg` with opacity `alpha` (0.0 = bg, 1.0 = fg)
pub fn blend(bg: Color, fg: Color, alpha: f32) -> Color {
    let bg = approximate_rgb(bg);
    let fg = approximate_rgb(fg);
    let a = alpha.clamp(0.0, 1.0);
    let mix = |b: u8, f: u8| -> u8 { (b as f32 * (1.0 - a) + f as f32 * a).round() as u8 };
    Color::Rgb(mix(bg.r, fg.r), mix(bg.g, fg.g), mix(bg.b, fg.b))
}

/// Pulse between `base` and a lighter variant; `t` is the phase in 0..1
pub fn pulse(base: Color, t: f32) -> Color {
    let rgb = approximate_rgb(base);
    let mut hsl = rgb_to_hsl(rgb);
    let wave = (t.rem_euclid(1.0) * std::f32::consts::TAU).sin() * 0.5 + 0.5;
    hsl.l = (hsl.l + 0.25 * wave).min(0.95);
    hsl_to_rgb(hsl).to_color()
}

/// Shade of a page cell: `ink` is 0 for blank paper and 255 for solid ink
pub fn ink_shade(paper: Color, ink_color: Color, ink: u8) -> Color {
    blend(paper, ink_color, ink as f32 / 255.0)
}

/// Parse ANSI color name to ratatui Color
pub fn parse_ansi_name(name: &str) -> Option<Color> {
    match name.to_lowercase().replace('-', "_").as_str() {
        "default" | "reset" | "transparent" => Some(Color::Reset),
        "black" => Some(Color::Black),
        "red" => Some(Color::Red),
        "green" => Some(Color::Green),
        "yellow" => Some(Color::Yellow),
        "blue" => Some(Color::Blue),
        "magenta" => Some(Color::Magenta),
        "cyan" => Some(Color::Cyan),
        "gray" | "grey" => Some(Color::Gray),
        "dark_gray" | "dark_grey" | "darkgray" | "darkgrey" => Some(Color::DarkGray),
        "light_red" | "lightred" => Some(Color::LightRed),
        "light_green" | "lightgreen" => Some(Color::LightGreen),
        "light_yellow" | "lightyellow" => Some(Color::LightYellow),
        "light_blue" | "lightblue" => Some(Color::LightBlue),
        "light_magenta" | "lightmagenta" => Some(Color::LightMagenta),
        "light_cyan" | "lightcyan" => Some(Color::LightCyan),
        "white" => Some(Color::White),
        _ => None,
    }
}

/// Resolve a color string: def reference, hex, or ANSI name
pub fn resolve_color(value: &str, defs: &HashMap<String, String>) -> Option<Color> {
    let value = value.trim();

    if let Some(hex) = defs.get(value) {
        return parse_hex(hex).ok().map(Rgb::to_color);
    }

    if value.starts_with('#') {
        return parse_hex(value).ok().map(Rgb::to_color);
    }

    parse_ansi_name(value)
}

/// Cyclable list of highlight colors
#[derive(Debug, Clone)]
pub struct Palette {
    colors: Vec<Color>,
    current: usize,
}

impl Palette {
    /// Build from color strings, skipping entries that do not parse.
    /// `initial` is selected when present, otherwise prepended.
    pub fn new(entries: &[String], initial: Option<&str>) -> Self {
        let defs = HashMap::new();
        let mut colors: Vec<Color> = entries
            .iter()
            .filter_map(|e| resolve_color(e, &defs))
            .collect();
        if colors.is_empty() {
            colors = DEFAULT_PALETTE
                .iter()
                .filter_map(|hex| parse_hex(hex).ok().map(Rgb::to_color))
                .collect();
        }

        let mut current = 0;
        if let Some(initial) = initial.and_then(|v| resolve_color(v, &defs)) {
            match colors.iter().position(|&c| c == initial) {
                Some(pos) => current = pos,
                None => colors.insert(0, initial),
            }
        }
        Self { colors, current }
    }

    pub fn current(&self) -> Color {
        self.colors[self.current]
    }

    pub fn cycle(&mut self) -> Color {
        self.current = (self.current + 1) % self.colors.len();
        self.current()
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::new(&[], None)
    }
}
