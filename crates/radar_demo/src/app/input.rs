use std::time::{Duration, Instant};

use radar::Vec2;
use winit::event::ElementState;
use winit::keyboard::{KeyCode, PhysicalKey};

const DOUBLE_CLICK_SLOP_PX: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DemoAction {
    Quit,
    CycleObserver,
    ToggleRadar,
    IncreaseRange,
    DecreaseRange,
    GrowRadar,
    ShrinkRadar,
    ToggleSensorRange,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum PointerPress {
    Single(Vec2),
    Double(Vec2),
}

/// Turns raw window events into press edges. Holding a key never repeats
/// its action.
#[derive(Debug)]
pub(crate) struct InputCollector {
    held: Vec<KeyCode>,
    pressed: Vec<DemoAction>,
    control_down: bool,
    cursor_position_px: Option<Vec2>,
    last_left_press: Option<(Instant, Vec2)>,
    double_click_window: Duration,
}

impl InputCollector {
    pub(crate) fn new(double_click_window: Duration) -> Self {
        Self {
            held: Vec::new(),
            pressed: Vec::new(),
            control_down: false,
            cursor_position_px: None,
            last_left_press: None,
            double_click_window,
        }
    }

    pub(crate) fn set_control_down(&mut self, control_down: bool) {
        self.control_down = control_down;
    }

    pub(crate) fn handle_key(&mut self, key: PhysicalKey, state: ElementState) {
        let PhysicalKey::Code(code) = key else {
            return;
        };
        match state {
            ElementState::Pressed => {
                if self.held.contains(&code) {
                    return;
                }
                self.held.push(code);
                if let Some(action) = action_for_key(code, self.control_down) {
                    self.pressed.push(action);
                }
            }
            ElementState::Released => self.held.retain(|held| *held != code),
        }
    }

    pub(crate) fn take_actions(&mut self) -> Vec<DemoAction> {
        std::mem::take(&mut self.pressed)
    }

    pub(crate) fn set_cursor_position_px(&mut self, x: f32, y: f32) -> Vec2 {
        let position = Vec2::new(x, y);
        self.cursor_position_px = Some(position);
        position
    }

    pub(crate) fn clear_cursor_position(&mut self) {
        self.cursor_position_px = None;
    }

    /// Classifies a left press at the current cursor position.
    pub(crate) fn left_press(&mut self, now: Instant) -> Option<PointerPress> {
        let position = self.cursor_position_px?;
        let is_double = self.last_left_press.is_some_and(|(at, previous)| {
            now.saturating_duration_since(at) <= self.double_click_window
                && (position.x - previous.x).abs() <= DOUBLE_CLICK_SLOP_PX
                && (position.y - previous.y).abs() <= DOUBLE_CLICK_SLOP_PX
        });
        if is_double {
            self.last_left_press = None;
            Some(PointerPress::Double(position))
        } else {
            self.last_left_press = Some((now, position));
            Some(PointerPress::Single(position))
        }
    }
}

fn action_for_key(code: KeyCode, control_down: bool) -> Option<DemoAction> {
    match code {
        KeyCode::Escape => Some(DemoAction::Quit),
        KeyCode::Tab => Some(DemoAction::CycleObserver),
        KeyCode::KeyR if control_down => Some(DemoAction::ToggleRadar),
        KeyCode::Equal | KeyCode::NumpadAdd => Some(DemoAction::IncreaseRange),
        KeyCode::Minus | KeyCode::NumpadSubtract => Some(DemoAction::DecreaseRange),
        KeyCode::BracketRight => Some(DemoAction::GrowRadar),
        KeyCode::BracketLeft => Some(DemoAction::ShrinkRadar),
        KeyCode::KeyS if !control_down => Some(DemoAction::ToggleSensorRange),
        _ => None,
    }
}
