//! CSS-style color strings as stored by the web editor.

use serde::Serialize;

/// 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Components in the 0.0..=1.0 range used by PDF color operators.
    pub fn to_unit(self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }
}

/// Outcome of parsing a color attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedColor {
    Solid(Rgb),
    /// `transparent` or an alpha of zero
    Transparent,
    Invalid,
}

/// Parse `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb(r, g, b)` or a handful of
/// named colors.
pub fn parse_color(input: &str) -> ParsedColor {
    let s = input.trim().to_ascii_lowercase();

    if s == "transparent" {
        return ParsedColor::Transparent;
    }

    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex(hex);
    }

    if let Some(inner) = s.strip_prefix("rgb(").and_then(|r| r.strip_suffix(')')) {
        let parts: Vec<Option<u8>> = inner.split(',').map(|p| p.trim().parse().ok()).collect();
        return match parts.as_slice() {
            [Some(r), Some(g), Some(b)] => ParsedColor::Solid(Rgb::new(*r, *g, *b)),
            _ => ParsedColor::Invalid,
        };
    }

    match s.as_str() {
        "black" => ParsedColor::Solid(Rgb::BLACK),
        "white" => ParsedColor::Solid(Rgb::WHITE),
        "red" => ParsedColor::Solid(Rgb::new(255, 0, 0)),
        "green" => ParsedColor::Solid(Rgb::new(0, 128, 0)),
        "blue" => ParsedColor::Solid(Rgb::new(0, 0, 255)),
        "gray" | "grey" => ParsedColor::Solid(Rgb::new(128, 128, 128)),
        "yellow" => ParsedColor::Solid(Rgb::new(255, 255, 0)),
        _ => ParsedColor::Invalid,
    }
}

fn parse_hex(hex: &str) -> ParsedColor {
    let byte = |s: &str| u8::from_str_radix(s, 16).ok();
    let nibble = |c: char| c.to_digit(16).map(|d| (d * 17) as u8);

    match hex.len() {
        3 => {
            let mut chars = hex.chars();
            match (
                chars.next().and_then(nibble),
                chars.next().and_then(nibble),
                chars.next().and_then(nibble),
            ) {
                (Some(r), Some(g), Some(b)) => ParsedColor::Solid(Rgb::new(r, g, b)),
                _ => ParsedColor::Invalid,
            }
        }
        6 | 8 => {
            if !hex.is_ascii() {
                return ParsedColor::Invalid;
            }
            match (byte(&hex[0..2]), byte(&hex[2..4]), byte(&hex[4..6])) {
                (Some(r), Some(g), Some(b)) => {
                    if hex.len() == 8 && byte(&hex[6..8]) == Some(0) {
                        ParsedColor::Transparent
                    } else {
                        ParsedColor::Solid(Rgb::new(r, g, b))
                    }
                }
                _ => ParsedColor::Invalid,
            }
        }
        _ => ParsedColor::Invalid,
    }
}
