use std::f32::consts::SQRT_2;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::color::BackgroundStyle;
use crate::config::RadarConfig;
use crate::geometry::Vec2;
use crate::raster::{blend_pixel, Surface};

/// Persisted overlay anchor in window pixels. `left` wins over `right`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HudPosition {
    pub top: f32,
    pub left: Option<f32>,
    pub right: Option<f32>,
}

impl Default for HudPosition {
    fn default() -> Self {
        Self {
            top: 10.0,
            left: None,
            right: Some(10.0),
        }
    }
}

impl HudPosition {
    /// Top-left corner of an overlay of `size_px` inside a window of
    /// `window_width`.
    pub fn resolve(&self, size_px: u32, window_width: u32) -> Vec2 {
        let x = match (self.left, self.right) {
            (Some(left), _) => left,
            (None, Some(right)) => window_width as f32 - size_px as f32 - right,
            (None, None) => 0.0,
        };
        Vec2::new(x, self.top)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HudState {
    Absent,
    Created,
    Destroyed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragState {
    Idle,
    /// `offset` is the pointer position relative to the overlay's top-left;
    /// `start` is where the overlay sat when the drag began.
    Dragging { offset: Vec2, start: HudPosition },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HudSignal {
    OpenSettings,
}

#[derive(Debug)]
struct Overlay {
    surface: Surface,
    background: BackgroundStyle,
    position: HudPosition,
    drag: DragState,
}

impl Overlay {
    fn size_px(&self) -> u32 {
        self.surface.width()
    }

    fn contains(&self, pointer: Vec2, window_width: u32) -> bool {
        let origin = self.position.resolve(self.size_px(), window_width);
        let radius = self.size_px() as f32 * 0.5;
        let dx = pointer.x - (origin.x + radius);
        let dy = pointer.y - (origin.y + radius);
        dx * dx + dy * dy <= radius * radius
    }
}

#[derive(Debug)]
pub struct HudManager {
    overlay: Option<Overlay>,
    state: HudState,
    visible: bool,
    window_width: u32,
    generation: u64,
}

impl HudManager {
    pub fn new(window_width: u32) -> Self {
        Self {
            overlay: None,
            state: HudState::Absent,
            visible: true,
            window_width,
            generation: 0,
        }
    }

    pub fn state(&self) -> HudState {
        self.state
    }

    pub fn is_created(&self) -> bool {
        self.overlay.is_some()
    }

    pub fn overlay_count(&self) -> usize {
        usize::from(self.overlay.is_some())
    }

    /// Bumped on every creation, so callers can tell a fresh surface apart.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn surface(&self) -> Option<&Surface> {
        self.overlay.as_ref().map(|overlay| &overlay.surface)
    }

    pub fn surface_mut(&mut self) -> Option<&mut Surface> {
        self.overlay.as_mut().map(|overlay| &mut overlay.surface)
    }

    pub fn position(&self) -> Option<HudPosition> {
        self.overlay.as_ref().map(|overlay| overlay.position)
    }

    pub fn drag_state(&self) -> DragState {
        self.overlay
            .as_ref()
            .map_or(DragState::Idle, |overlay| overlay.drag)
    }

    pub fn set_window_width(&mut self, window_width: u32) {
        self.window_width = window_width;
    }

    pub fn create(&mut self, config: &RadarConfig, position: HudPosition) {
        self.destroy();
        let size = config.size_px;
        self.overlay = Some(Overlay {
            surface: Surface::new(size, size),
            background: config.background,
            position,
            drag: DragState::Idle,
        });
        self.state = HudState::Created;
        self.generation = self.generation.saturating_add(1);
        info!(
            size_px = size,
            top = position.top,
            left = ?position.left,
            right = ?position.right,
            generation = self.generation,
            "radar_hud_created"
        );
    }

    pub fn destroy(&mut self) {
        if self.overlay.take().is_some() {
            self.state = HudState::Destroyed;
            info!(generation = self.generation, "radar_hud_destroyed");
        }
    }

    pub fn resize(&mut self, config: &RadarConfig, position: HudPosition) {
        self.destroy();
        self.create(config, position);
    }

    pub fn toggle_visibility(&mut self) -> bool {
        self.visible = !self.visible;
        if !self.visible {
            self.cancel_drag();
        }
        info!(visible = self.visible, "radar_hud_visibility_toggled");
        self.visible
    }

    /// Starts a drag when the pointer lands inside the visible overlay.
    pub fn pointer_down(&mut self, pointer: Vec2) -> bool {
        let window_width = self.window_width;
        let visible = self.visible;
        let Some(overlay) = self.overlay.as_mut() else {
            return false;
        };
        if !visible || !overlay.contains(pointer, window_width) {
            return false;
        }
        let origin = overlay.position.resolve(overlay.size_px(), window_width);
        let offset = Vec2::new(pointer.x - origin.x, pointer.y - origin.y);
        overlay.drag = DragState::Dragging {
            offset,
            start: overlay.position,
        };
        debug!(offset_x = offset.x, offset_y = offset.y, "radar_drag_started");
        true
    }

    pub fn pointer_moved(&mut self, pointer: Vec2) -> bool {
        let Some(overlay) = self.overlay.as_mut() else {
            return false;
        };
        let DragState::Dragging { offset, .. } = overlay.drag else {
            return false;
        };
        overlay.position = HudPosition {
            top: pointer.y - offset.y,
            left: Some(pointer.x - offset.x),
            right: None,
        };
        true
    }

    /// Ends the gesture; returns the position to persist when one was active.
    pub fn pointer_up(&mut self) -> Option<HudPosition> {
        let overlay = self.overlay.as_mut()?;
        if overlay.drag == DragState::Idle {
            return None;
        }
        overlay.drag = DragState::Idle;
        debug!(
            top = overlay.position.top,
            left = ?overlay.position.left,
            "radar_drag_finished"
        );
        Some(overlay.position)
    }

    /// Drops an unfinished drag, putting the overlay back where it started.
    fn cancel_drag(&mut self) {
        let Some(overlay) = self.overlay.as_mut() else {
            return;
        };
        if let DragState::Dragging { start, .. } = overlay.drag {
            overlay.position = start;
            overlay.drag = DragState::Idle;
            debug!("radar_drag_cancelled");
        }
    }

    /// The pointer leaving the window ends the gesture like a release.
    pub fn pointer_left_window(&mut self) -> Option<HudPosition> {
        self.pointer_up()
    }

    pub fn double_click(&mut self, pointer: Vec2) -> Option<HudSignal> {
        let overlay = self.overlay.as_ref()?;
        (self.visible && overlay.contains(pointer, self.window_width))
            .then_some(HudSignal::OpenSettings)
    }

    /// Paints the overlay into a window frame: circular mask, background,
    /// then the radar surface on top.
    pub fn composite(&self, frame: &mut [u8], width: u32, height: u32) {
        if !self.visible || width == 0 || height == 0 {
            return;
        }
        let Some(overlay) = self.overlay.as_ref() else {
            return;
        };

        let size = overlay.size_px();
        let radius = size as f32 * 0.5;
        let gradient_extent = radius * SQRT_2;
        let origin = overlay.position.resolve(size, width);
        let origin_x = origin.x.round() as i32;
        let origin_y = origin.y.round() as i32;

        for sy in 0..size {
            let window_y = origin_y + sy as i32;
            if window_y < 0 || window_y >= height as i32 {
                continue;
            }
            for sx in 0..size {
                let window_x = origin_x + sx as i32;
                if window_x < 0 || window_x >= width as i32 {
                    continue;
                }
                let dx = sx as f32 + 0.5 - radius;
                let dy = sy as f32 + 0.5 - radius;
                let dist = (dx * dx + dy * dy).sqrt();
                if dist > radius {
                    continue;
                }
                let background = overlay.background.sample(dist / gradient_extent);
                blend_pixel(frame, width, window_x, window_y, background);
                if let Some(radar_pixel) = overlay.surface.pixel(sx, sy) {
                    blend_pixel(frame, width, window_x, window_y, radar_pixel);
                }
            }
        }
    }
}
