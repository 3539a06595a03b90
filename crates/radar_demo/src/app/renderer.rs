use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use radar::{Disposition, EntitySource, Radar};
use winit::window::Window;

use super::scene::DemoScene;

const CLEAR_COLOR: [u8; 4] = [18, 22, 28, 255];
const GRID_COLOR: [u8; 4] = [40, 48, 58, 255];
const OBSERVER_OUTLINE_COLOR: [u8; 4] = [255, 255, 255, 255];
const TOKEN_HALF_SIZE_PX: i32 = 18;

pub(crate) struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    width: u32,
    height: u32,
}

impl Renderer {
    pub(crate) fn new(window: Arc<Window>) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            width: size.width,
            height: size.height,
        })
    }

    pub(crate) fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.width = width;
        self.height = height;
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    pub(crate) fn draw(&mut self, scene: &DemoScene, radar: &Radar) -> Result<(), Error> {
        if self.width == 0 || self.height == 0 {
            return Ok(());
        }
        let (width, height) = (self.width, self.height);
        let frame = self.pixels.frame_mut();
        for chunk in frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&CLEAR_COLOR);
        }

        draw_grid(frame, width, height, scene.cell_px());

        let observer_id = scene.observer_id();
        for entity in scene.entities() {
            let cx = entity.position.x.round() as i32;
            let cy = entity.position.y.round() as i32;
            draw_square(
                frame,
                width,
                height,
                cx,
                cy,
                TOKEN_HALF_SIZE_PX,
                token_color(entity.disposition),
            );
            if entity.id == observer_id {
                draw_square_outline(
                    frame,
                    width,
                    height,
                    cx,
                    cy,
                    TOKEN_HALF_SIZE_PX + 4,
                    OBSERVER_OUTLINE_COLOR,
                );
            }
        }

        radar.composite(frame, width, height);
        self.pixels.render()
    }
}

fn token_color(disposition: Disposition) -> [u8; 4] {
    match disposition {
        Disposition::Friendly => [70, 150, 230, 255],
        Disposition::Neutral => [200, 190, 120, 255],
        Disposition::Hostile => [200, 70, 60, 255],
        Disposition::Unclassified => [140, 140, 140, 255],
    }
}

fn draw_grid(frame: &mut [u8], width: u32, height: u32, cell_px: f32) {
    if cell_px < 1.0 {
        return;
    }
    let step = cell_px.round() as usize;
    for x in (0..width as usize).step_by(step) {
        for y in 0..height as usize {
            write_pixel(frame, width, x as i32, y as i32, GRID_COLOR);
        }
    }
    for y in (0..height as usize).step_by(step) {
        for x in 0..width as usize {
            write_pixel(frame, width, x as i32, y as i32, GRID_COLOR);
        }
    }
}

fn draw_square(
    frame: &mut [u8],
    width: u32,
    height: u32,
    cx: i32,
    cy: i32,
    half_size: i32,
    color: [u8; 4],
) {
    for y in (cy - half_size)..=(cy + half_size) {
        for x in (cx - half_size)..=(cx + half_size) {
            if x < 0 || y < 0 || x >= width as i32 || y >= height as i32 {
                continue;
            }
            write_pixel(frame, width, x, y, color);
        }
    }
}

fn draw_square_outline(
    frame: &mut [u8],
    width: u32,
    height: u32,
    cx: i32,
    cy: i32,
    half_size: i32,
    color: [u8; 4],
) {
    let (left, right) = (cx - half_size, cx + half_size);
    let (top, bottom) = (cy - half_size, cy + half_size);
    for x in left..=right {
        if x >= 0 && x < width as i32 {
            write_pixel(frame, width, x, top, color);
            write_pixel(frame, width, x, bottom, color);
        }
    }
    for y in top..=bottom {
        if y >= 0 && y < height as i32 {
            write_pixel(frame, width, left, y, color);
            write_pixel(frame, width, right, y, color);
        }
    }
}

fn write_pixel(frame: &mut [u8], width: u32, x: i32, y: i32, color: [u8; 4]) {
    if x < 0 || y < 0 || x >= width as i32 {
        return;
    }
    let offset = (y as usize * width as usize + x as usize) * 4;
    if let Some(pixel) = frame.get_mut(offset..offset + 4) {
        pixel.copy_from_slice(&color);
    }
}
