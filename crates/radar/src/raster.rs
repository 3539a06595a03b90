use crate::color::{Rgba, TRANSPARENT};

const GLYPH_WIDTH: i32 = 3;
const GLYPH_HEIGHT: i32 = 5;
pub(crate) const TEXT_SCALE: i32 = 2;
const GLYPH_ADVANCE: i32 = (GLYPH_WIDTH + 1) * TEXT_SCALE;

/// Owned RGBA8 drawing surface.
#[derive(Debug, Clone)]
pub struct Surface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize * 4;
        Self {
            width,
            height,
            pixels: vec![0; len],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn frame(&self) -> &[u8] {
        &self.pixels
    }

    pub fn frame_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    pub fn clear(&mut self, color: Rgba) {
        for chunk in self.pixels.chunks_exact_mut(4) {
            chunk.copy_from_slice(&color);
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let mut rgba = [0u8; 4];
        rgba.copy_from_slice(&self.pixels[offset..offset + 4]);
        Some(rgba)
    }
}

/// Source-over composition of straight-alpha colors.
pub fn blend_over(dst: Rgba, src: Rgba) -> Rgba {
    match src[3] {
        255 => return src,
        0 => return dst,
        _ => {}
    }
    let src_a = src[3] as f32 / 255.0;
    let dst_a = dst[3] as f32 / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    if out_a <= 0.0 {
        return TRANSPARENT;
    }

    let mut out = [0u8; 4];
    for channel in 0..3 {
        let value =
            (src[channel] as f32 * src_a + dst[channel] as f32 * dst_a * (1.0 - src_a)) / out_a;
        out[channel] = value.round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    out
}

pub(crate) fn blend_pixel(frame: &mut [u8], width: u32, x: i32, y: i32, color: Rgba) {
    if x < 0 || y < 0 || x >= width as i32 {
        return;
    }
    let Some(pixel_offset) = (y as usize)
        .checked_mul(width as usize)
        .and_then(|row| row.checked_add(x as usize))
    else {
        return;
    };
    let Some(byte_offset) = pixel_offset.checked_mul(4) else {
        return;
    };
    let Some(end) = byte_offset.checked_add(4) else {
        return;
    };
    if end > frame.len() {
        return;
    }

    let mut dst = [0u8; 4];
    dst.copy_from_slice(&frame[byte_offset..end]);
    frame[byte_offset..end].copy_from_slice(&blend_over(dst, color));
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn fill_rect(
    frame: &mut [u8],
    width: u32,
    height: u32,
    x: i32,
    y: i32,
    rect_width: i32,
    rect_height: i32,
    color: Rgba,
) {
    let start_x = x.max(0);
    let start_y = y.max(0);
    let end_x = x.saturating_add(rect_width).min(width as i32);
    let end_y = y.saturating_add(rect_height).min(height as i32);
    if end_x <= start_x || end_y <= start_y {
        return;
    }

    for py in start_y..end_y {
        for px in start_x..end_x {
            blend_pixel(frame, width, px, py, color);
        }
    }
}

/// Fills every pixel whose center lies within `radius` of `(cx, cy)`.
pub(crate) fn fill_circle(
    frame: &mut [u8],
    width: u32,
    height: u32,
    center: (f32, f32),
    radius: f32,
    color: Rgba,
) {
    if !(radius.is_finite() && center.0.is_finite() && center.1.is_finite()) || radius < 0.0 {
        return;
    }
    let radius_sq = radius * radius;
    for_each_pixel_near(width, height, center, radius, |px, py, dist_sq| {
        if dist_sq <= radius_sq {
            blend_pixel(frame, width, px, py, color);
        }
    });
}

/// Strokes a ring of `line_width` pixels centered on `radius`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn stroke_circle(
    frame: &mut [u8],
    width: u32,
    height: u32,
    center: (f32, f32),
    radius: f32,
    line_width: f32,
    color: Rgba,
) {
    if !(radius.is_finite() && center.0.is_finite() && center.1.is_finite()) || radius < 0.0 {
        return;
    }
    let half_width = (line_width * 0.5).max(0.5);
    let outer = radius + half_width;
    for_each_pixel_near(width, height, center, outer, |px, py, dist_sq| {
        if (dist_sq.sqrt() - radius).abs() <= half_width {
            blend_pixel(frame, width, px, py, color);
        }
    });
}

fn for_each_pixel_near(
    width: u32,
    height: u32,
    center: (f32, f32),
    reach: f32,
    mut visit: impl FnMut(i32, i32, f32),
) {
    let min_x = ((center.0 - reach).floor() as i32).max(0);
    let min_y = ((center.1 - reach).floor() as i32).max(0);
    let max_x = ((center.0 + reach).ceil() as i32).min(width as i32 - 1);
    let max_y = ((center.1 + reach).ceil() as i32).min(height as i32 - 1);
    for py in min_y..=max_y {
        for px in min_x..=max_x {
            let dx = px as f32 + 0.5 - center.0;
            let dy = py as f32 + 0.5 - center.1;
            visit(px, py, dx * dx + dy * dy);
        }
    }
}

pub(crate) fn text_width(text: &str) -> i32 {
    let count = text.chars().count() as i32;
    if count == 0 {
        0
    } else {
        count * GLYPH_ADVANCE - TEXT_SCALE
    }
}

/// Draws `text` horizontally centered on `center_x` with its bottom row
/// resting on `baseline_y`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn draw_text_centered(
    frame: &mut [u8],
    width: u32,
    height: u32,
    center_x: f32,
    baseline_y: f32,
    text: &str,
    color: Rgba,
) {
    let mut x = (center_x - text_width(text) as f32 * 0.5).round() as i32;
    let y = baseline_y.round() as i32 - GLYPH_HEIGHT * TEXT_SCALE;
    for ch in text.chars() {
        draw_glyph(frame, width, height, x, y, glyph_for(ch), color);
        x += GLYPH_ADVANCE;
    }
}

fn draw_glyph(frame: &mut [u8], width: u32, height: u32, x: i32, y: i32, glyph: Glyph, color: Rgba) {
    for (row_index, row_bits) in glyph.rows.iter().enumerate() {
        for col in 0..GLYPH_WIDTH {
            if (row_bits & (1 << (GLYPH_WIDTH - 1 - col))) == 0 {
                continue;
            }
            fill_rect(
                frame,
                width,
                height,
                x + col * TEXT_SCALE,
                y + row_index as i32 * TEXT_SCALE,
                TEXT_SCALE,
                TEXT_SCALE,
                color,
            );
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Glyph {
    rows: [u8; GLYPH_HEIGHT as usize],
}

const BLANK_GLYPH: Glyph = Glyph { rows: [0; 5] };

// Ring labels only ever carry rounded distances.
fn glyph_for(ch: char) -> Glyph {
    let rows = match ch {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b010, 0b010, 0b010],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        _ => return BLANK_GLYPH,
    };
    Glyph { rows }
}
