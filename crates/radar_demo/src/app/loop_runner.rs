use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use pixels::Error as PixelsError;
use radar::config::{MAX_DISTANCE_MAX, MAX_DISTANCE_MIN, RADAR_SIZE_MAX_PX, RADAR_SIZE_MIN_PX};
use radar::{Radar, RadarConfig, RadarTrigger, SettingKey};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;

use super::bootstrap::AppWiring;
use super::input::{DemoAction, InputCollector, PointerPress};
use super::renderer::Renderer;
use super::scene::DemoScene;

const RANGE_STEP: f32 = 5.0;
const SIZE_STEP_PX: u32 = 25;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

pub(crate) fn run(app: AppWiring) -> ExitCode {
    if let Err(err) = run_app(app) {
        error!(error = %err, "startup_failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run_app(app: AppWiring) -> Result<(), AppError> {
    let AppWiring {
        config,
        settings_path,
        mut radar,
        mut scene,
    } = app;

    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let mut renderer = Renderer::new(Arc::clone(&window)).map_err(AppError::CreateRenderer)?;
    let mut input = InputCollector::new(config.double_click_window);

    let start = Instant::now();
    radar.set_window_width(window.inner_size().width);
    radar.notify(RadarTrigger::SceneLoaded, start);
    scene.advance(start);
    let mut next_turn_at = start + config.turn_interval;

    info!(
        window_width = config.window_width,
        window_height = config.window_height,
        turn_interval_ms = config.turn_interval.as_millis() as u64,
        move_interval_ms = config.move_interval.as_millis() as u64,
        "loop_config"
    );

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    radar.set_window_width(new_size.width);
                    if let Err(error) = renderer.resize(new_size.width, new_size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                    window.request_redraw();
                }
                WindowEvent::ScaleFactorChanged { .. } => {
                    let size = window.inner_size();
                    radar.set_window_width(size.width);
                    if let Err(error) = renderer.resize(size.width, size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::ModifiersChanged(modifiers) => {
                    input.set_control_down(modifiers.state().control_key());
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    input.handle_key(event.physical_key, event.state);
                    let now = Instant::now();
                    for action in input.take_actions() {
                        if action == DemoAction::Quit {
                            info!(reason = "escape_key", "shutdown_requested");
                            window_target.exit();
                            return;
                        }
                        apply_action(action, now, &mut radar, &mut scene);
                    }
                    window.request_redraw();
                }
                WindowEvent::CursorMoved { position, .. } => {
                    let pointer =
                        input.set_cursor_position_px(position.x as f32, position.y as f32);
                    if radar.pointer_moved(pointer) {
                        window.request_redraw();
                    }
                }
                WindowEvent::CursorLeft { .. } => {
                    input.clear_cursor_position();
                    if let Some(position) = radar.pointer_left_window() {
                        info!(top = position.top, left = ?position.left, "radar_position_saved");
                    }
                }
                WindowEvent::MouseInput {
                    state,
                    button: MouseButton::Left,
                    ..
                } => match state {
                    ElementState::Pressed => match input.left_press(Instant::now()) {
                        Some(PointerPress::Double(pointer)) => {
                            if radar.double_click(pointer).is_some() {
                                info!(
                                    settings_path = %settings_path.display(),
                                    "radar_settings_requested"
                                );
                            }
                        }
                        Some(PointerPress::Single(pointer)) => {
                            radar.pointer_down(pointer);
                        }
                        None => {}
                    },
                    ElementState::Released => {
                        if let Some(position) = radar.pointer_up() {
                            info!(top = position.top, left = ?position.left, "radar_position_saved");
                        }
                    }
                },
                WindowEvent::RedrawRequested => {
                    if let Err(error) = renderer.draw(&scene, &radar) {
                        warn!(error = %error, "renderer_draw_failed");
                        window_target.exit();
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                let now = Instant::now();
                let mut scene_changed = false;

                for trigger in scene.advance(now) {
                    radar.notify(trigger, now);
                    scene_changed = true;
                }
                if now >= next_turn_at {
                    for trigger in scene.advance_turn() {
                        radar.notify(trigger, now);
                    }
                    next_turn_at = now + config.turn_interval;
                    scene_changed = true;
                }

                if let Some(report) = radar.tick(now, &scene) {
                    debug!(
                        blips = report.blips.len(),
                        rings = report.rings.len(),
                        skipped = report.skipped.total(),
                        "radar_frame_ready"
                    );
                    scene_changed = true;
                }
                if scene_changed {
                    window.request_redraw();
                }

                let wake_at = [radar.next_deadline(), scene.next_move_at(), Some(next_turn_at)]
                    .into_iter()
                    .flatten()
                    .min()
                    .unwrap_or(next_turn_at);
                window_target.set_control_flow(ControlFlow::WaitUntil(wake_at));
            }
            Event::LoopExiting => {
                radar.destroy_hud();
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

fn apply_action(action: DemoAction, now: Instant, radar: &mut Radar, scene: &mut DemoScene) {
    let config = RadarConfig::read(radar.settings());
    let (key, value) = match action {
        DemoAction::Quit => return,
        DemoAction::CycleObserver => {
            let trigger = scene.cycle_observer();
            radar.notify(trigger, now);
            return;
        }
        DemoAction::ToggleRadar => {
            radar.toggle_visibility();
            return;
        }
        DemoAction::IncreaseRange => (
            SettingKey::MaxDistance,
            json!((config.max_distance + RANGE_STEP).min(MAX_DISTANCE_MAX)),
        ),
        DemoAction::DecreaseRange => (
            SettingKey::MaxDistance,
            json!((config.max_distance - RANGE_STEP).max(MAX_DISTANCE_MIN)),
        ),
        DemoAction::GrowRadar => (
            SettingKey::RadarSize,
            json!((config.size_px + SIZE_STEP_PX).min(RADAR_SIZE_MAX_PX)),
        ),
        DemoAction::ShrinkRadar => (
            SettingKey::RadarSize,
            json!(config.size_px.saturating_sub(SIZE_STEP_PX).max(RADAR_SIZE_MIN_PX)),
        ),
        DemoAction::ToggleSensorRange => (
            SettingKey::UseSensorRange,
            json!(!config.use_sensor_range),
        ),
    };

    info!(key = key.name(), value = %value, "setting_adjusted");
    if let Err(error) = radar.settings_mut().set(key, value) {
        warn!(key = key.name(), error = %error, "settings_write_failed");
    }
}
