use thiserror::Error;

use crate::host::Disposition;

pub type Rgba = [u8; 4];

pub const TRANSPARENT: Rgba = [0, 0, 0, 0];
pub const LIME: Rgba = [0, 255, 0, 255];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorParseError {
    #[error("color string is empty")]
    Empty,
    #[error("invalid hex color `{0}`")]
    InvalidHex(String),
    #[error("invalid component `{component}` in color `{input}`")]
    InvalidComponent { input: String, component: String },
    #[error("expected {expected} components in `{input}`")]
    ComponentCount { input: String, expected: &'static str },
    #[error("unrecognized color `{0}`")]
    Unrecognized(String),
    #[error("gradient `{0}` needs at least two color stops")]
    GradientStops(String),
}

/// Parses the CSS-style color strings stored in radar settings.
pub fn parse_color(input: &str) -> Result<Rgba, ColorParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ColorParseError::Empty);
    }
    let lower = trimmed.to_ascii_lowercase();

    if let Some(hex) = lower.strip_prefix('#') {
        return parse_hex(hex).ok_or_else(|| ColorParseError::InvalidHex(trimmed.to_string()));
    }
    if let Some(body) = function_body(&lower, "rgba").or_else(|| function_body(&lower, "rgb")) {
        return parse_rgb_function(trimmed, body);
    }
    named_color(&lower).ok_or_else(|| ColorParseError::Unrecognized(trimmed.to_string()))
}

fn function_body<'a>(input: &'a str, name: &str) -> Option<&'a str> {
    input
        .strip_prefix(name)?
        .trim_start()
        .strip_prefix('(')?
        .strip_suffix(')')
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    if !hex.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return None;
    }
    let nibble = |index: usize| u8::from_str_radix(&hex[index..index + 1], 16).ok();
    let byte = |index: usize| u8::from_str_radix(&hex[index..index + 2], 16).ok();
    match hex.len() {
        3 => Some([nibble(0)? * 17, nibble(1)? * 17, nibble(2)? * 17, 255]),
        4 => Some([
            nibble(0)? * 17,
            nibble(1)? * 17,
            nibble(2)? * 17,
            nibble(3)? * 17,
        ]),
        6 => Some([byte(0)?, byte(2)?, byte(4)?, 255]),
        8 => Some([byte(0)?, byte(2)?, byte(4)?, byte(6)?]),
        _ => None,
    }
}

fn parse_rgb_function(input: &str, body: &str) -> Result<Rgba, ColorParseError> {
    let parts: Vec<&str> = body.split(',').map(str::trim).collect();
    if parts.len() != 3 && parts.len() != 4 {
        return Err(ColorParseError::ComponentCount {
            input: input.to_string(),
            expected: "3 or 4",
        });
    }

    let invalid = |component: &str| ColorParseError::InvalidComponent {
        input: input.to_string(),
        component: component.to_string(),
    };
    let mut rgba = [0, 0, 0, 255];
    for (slot, part) in rgba.iter_mut().zip(parts.iter()).take(3) {
        let value = part.parse::<f32>().map_err(|_| invalid(part))?;
        if !value.is_finite() {
            return Err(invalid(part));
        }
        *slot = value.round().clamp(0.0, 255.0) as u8;
    }
    if let Some(alpha_part) = parts.get(3) {
        let alpha = alpha_part.parse::<f64>().map_err(|_| invalid(alpha_part))?;
        if !alpha.is_finite() {
            return Err(invalid(alpha_part));
        }
        rgba[3] = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
    }
    Ok(rgba)
}

fn named_color(name: &str) -> Option<Rgba> {
    match name {
        "lime" => Some(LIME),
        "green" => Some([0, 128, 0, 255]),
        "red" => Some([255, 0, 0, 255]),
        "yellow" => Some([255, 255, 0, 255]),
        "white" => Some([255, 255, 255, 255]),
        "black" => Some([0, 0, 0, 255]),
        "transparent" => Some(TRANSPARENT),
        _ => None,
    }
}

/// Fill painted behind the radar surface inside the circular HUD mask.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackgroundStyle {
    Solid(Rgba),
    RadialGradient { inner: Rgba, outer: Rgba },
}

impl BackgroundStyle {
    /// Accepts a plain color or `radial-gradient(<shape>, <inner>, ..., <outer>)`.
    pub fn parse(input: &str) -> Result<Self, ColorParseError> {
        let trimmed = input.trim();
        let lower = trimmed.to_ascii_lowercase();
        let Some(body) = function_body(&lower, "radial-gradient") else {
            return parse_color(trimmed).map(Self::Solid);
        };

        let stops: Vec<Rgba> = split_top_level(body)
            .into_iter()
            .filter_map(|part| parse_color(strip_stop_position(part)).ok())
            .collect();
        match (stops.first(), stops.last()) {
            (Some(inner), Some(outer)) if stops.len() >= 2 => Ok(Self::RadialGradient {
                inner: *inner,
                outer: *outer,
            }),
            _ => Err(ColorParseError::GradientStops(trimmed.to_string())),
        }
    }

    /// Color at normalized gradient position `t` (0 at center, 1 at the
    /// gradient's farthest corner).
    pub fn sample(&self, t: f32) -> Rgba {
        match *self {
            Self::Solid(color) => color,
            Self::RadialGradient { inner, outer } => lerp_rgba(inner, outer, t),
        }
    }
}

fn split_top_level(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    for (index, ch) in body.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(body[start..index].trim());
                start = index + 1;
            }
            _ => {}
        }
    }
    parts.push(body[start..].trim());
    parts
}

fn strip_stop_position(stop: &str) -> &str {
    match stop.rsplit_once(' ') {
        Some((color, position)) if position.ends_with('%') || position.ends_with("px") => {
            color.trim()
        }
        _ => stop,
    }
}

fn lerp_rgba(from: Rgba, to: Rgba, t: f32) -> Rgba {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let mut out = [0u8; 4];
    for (index, channel) in out.iter_mut().enumerate() {
        let a = from[index] as f32;
        let b = to[index] as f32;
        *channel = (a + (b - a) * t).round() as u8;
    }
    out
}

/// Blip colors keyed by disposition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub friendly: Rgba,
    pub neutral: Rgba,
    pub hostile: Rgba,
}

impl Palette {
    pub fn color_for(&self, disposition: Disposition) -> Rgba {
        match disposition {
            Disposition::Friendly => self.friendly,
            Disposition::Hostile => self.hostile,
            Disposition::Neutral | Disposition::Unclassified => self.neutral,
        }
    }
}
