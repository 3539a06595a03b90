use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::color::{parse_color, BackgroundStyle, Palette, Rgba};
use crate::hud::HudPosition;
use crate::settings::{SettingKey, SettingsError, SettingsStore};

pub const RADAR_SIZE_MIN_PX: u32 = 50;
pub const RADAR_SIZE_MAX_PX: u32 = 300;
pub const BLIP_SIZE_MIN_PX: f32 = 2.0;
pub const BLIP_SIZE_MAX_PX: f32 = 10.0;
pub const MAX_DISTANCE_MIN: f32 = 5.0;
pub const MAX_DISTANCE_MAX: f32 = 100.0;
pub const DEFAULT_RING_COUNT: u32 = 4;
const MAX_RING_COUNT: usize = 64;

/// Where range rings sit between the center and the maximum distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RingPolicy {
    /// `n` evenly spaced rings, the last one at the maximum distance.
    FixedCount(u32),
    /// A ring every `step` units up to and including the maximum distance.
    FixedStep(f32),
}

impl RingPolicy {
    pub fn ring_distances(&self, max_distance: f32) -> Vec<f32> {
        if !(max_distance.is_finite() && max_distance > 0.0) {
            return Vec::new();
        }
        match *self {
            RingPolicy::FixedCount(count) => (1..=count.min(MAX_RING_COUNT as u32))
                .map(|index| index as f32 * max_distance / count as f32)
                .collect(),
            RingPolicy::FixedStep(step) if step.is_finite() && step > 0.0 => {
                // Steps too fine for the ring cap widen so the rings still reach the edge.
                let step = step.max(max_distance / MAX_RING_COUNT as f32);
                (1..=MAX_RING_COUNT)
                    .map(|index| index as f32 * step)
                    .take_while(|distance| *distance <= max_distance * (1.0 + f32::EPSILON))
                    .collect()
            }
            RingPolicy::FixedStep(_) => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadarOptions {
    pub debounce: Duration,
    pub readiness_poll: Duration,
}

impl Default for RadarOptions {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(100),
            readiness_poll: Duration::from_millis(100),
        }
    }
}

/// Settings snapshot taken at the start of a render pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RadarConfig {
    pub palette: Palette,
    pub self_color: Rgba,
    pub background: BackgroundStyle,
    pub size_px: u32,
    pub blip_size_px: f32,
    pub max_distance: f32,
    pub show_range_rings: bool,
    pub ring_color: Rgba,
    pub ring_policy: RingPolicy,
    pub use_sensor_range: bool,
}

impl Default for RadarConfig {
    fn default() -> Self {
        Self {
            palette: Palette {
                friendly: [0, 255, 0, 255],
                neutral: [255, 255, 0, 255],
                hostile: [255, 0, 0, 255],
            },
            self_color: [0, 255, 0, 255],
            background: BackgroundStyle::RadialGradient {
                inner: [0, 255, 0, 38],
                outer: [0, 0, 0, 230],
            },
            size_px: 150,
            blip_size_px: 4.0,
            max_distance: 30.0,
            show_range_rings: true,
            ring_color: [0, 255, 0, 51],
            ring_policy: RingPolicy::FixedCount(DEFAULT_RING_COUNT),
            use_sensor_range: false,
        }
    }
}

impl RadarConfig {
    /// Decodes every key independently; anything missing or invalid keeps
    /// its default so one bad value never blocks a frame.
    pub fn read(store: &dyn SettingsStore) -> Self {
        let defaults = Self::default();
        Self {
            palette: Palette {
                friendly: read_setting(
                    store,
                    SettingKey::FriendlyColor,
                    decode_color,
                    defaults.palette.friendly,
                ),
                neutral: read_setting(
                    store,
                    SettingKey::NeutralColor,
                    decode_color,
                    defaults.palette.neutral,
                ),
                hostile: read_setting(
                    store,
                    SettingKey::HostileColor,
                    decode_color,
                    defaults.palette.hostile,
                ),
            },
            self_color: read_setting(
                store,
                SettingKey::SelfColor,
                decode_color,
                defaults.self_color,
            ),
            background: read_setting(
                store,
                SettingKey::BackgroundGradient,
                decode_background,
                defaults.background,
            ),
            size_px: read_setting(
                store,
                SettingKey::RadarSize,
                |value| {
                    decode_number(value).map(|size| {
                        clamp_logged(
                            SettingKey::RadarSize,
                            size.round(),
                            RADAR_SIZE_MIN_PX as f32,
                            RADAR_SIZE_MAX_PX as f32,
                        ) as u32
                    })
                },
                defaults.size_px,
            ),
            blip_size_px: read_setting(
                store,
                SettingKey::BlipSize,
                |value| {
                    decode_number(value).map(|size| {
                        clamp_logged(SettingKey::BlipSize, size, BLIP_SIZE_MIN_PX, BLIP_SIZE_MAX_PX)
                    })
                },
                defaults.blip_size_px,
            ),
            max_distance: read_setting(
                store,
                SettingKey::MaxDistance,
                |value| {
                    decode_number(value).map(|distance| {
                        clamp_logged(
                            SettingKey::MaxDistance,
                            distance,
                            MAX_DISTANCE_MIN,
                            MAX_DISTANCE_MAX,
                        )
                    })
                },
                defaults.max_distance,
            ),
            show_range_rings: read_setting(
                store,
                SettingKey::ShowRangeRings,
                decode_flag,
                defaults.show_range_rings,
            ),
            ring_color: read_setting(
                store,
                SettingKey::RangeRingColor,
                decode_color,
                defaults.ring_color,
            ),
            ring_policy: read_setting(
                store,
                SettingKey::RangeRingStep,
                decode_ring_policy,
                defaults.ring_policy,
            ),
            use_sensor_range: read_setting(
                store,
                SettingKey::UseSensorRange,
                decode_flag,
                defaults.use_sensor_range,
            ),
        }
    }

    pub fn display_radius(&self) -> f32 {
        self.size_px as f32 * 0.5
    }
}

pub fn read_position(store: &dyn SettingsStore) -> HudPosition {
    read_setting(
        store,
        SettingKey::Position,
        |value| {
            serde_path_to_error::deserialize::<_, HudPosition>(value.clone()).map_err(|error| {
                let path = error.path().to_string();
                format!("{path}: {}", error.into_inner())
            })
        },
        HudPosition::default(),
    )
}

pub fn write_position(
    store: &mut dyn SettingsStore,
    position: &HudPosition,
) -> Result<(), SettingsError> {
    let value = serde_json::to_value(position).map_err(SettingsError::Encode)?;
    store.set(SettingKey::Position, value)
}

fn read_setting<T>(
    store: &dyn SettingsStore,
    key: SettingKey,
    decode: impl Fn(&Value) -> Result<T, String>,
    fallback: T,
) -> T {
    let Some(value) = store.get(key) else {
        return fallback;
    };
    match decode(&value) {
        Ok(decoded) => decoded,
        Err(reason) => {
            warn!(
                key = key.name(),
                value = %value,
                reason = reason.as_str(),
                "settings_value_invalid"
            );
            fallback
        }
    }
}

fn decode_color(value: &Value) -> Result<Rgba, String> {
    let text = value.as_str().ok_or("expected a color string")?;
    parse_color(text).map_err(|error| error.to_string())
}

fn decode_background(value: &Value) -> Result<BackgroundStyle, String> {
    let text = value.as_str().ok_or("expected a background string")?;
    BackgroundStyle::parse(text).map_err(|error| error.to_string())
}

// Form submissions store numbers as strings.
fn decode_number(value: &Value) -> Result<f32, String> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|number| number.is_finite())
    .ok_or("expected a finite number")?;
    Ok(number as f32)
}

// Checkbox submissions arrive as "on" or are missing entirely.
fn decode_flag(value: &Value) -> Result<bool, String> {
    match value {
        Value::Bool(flag) => Ok(*flag),
        Value::String(text) => match text.trim() {
            "on" | "true" => Ok(true),
            "off" | "false" | "" => Ok(false),
            other => Err(format!("expected a boolean, got `{other}`")),
        },
        Value::Null => Ok(false),
        _ => Err("expected a boolean".to_string()),
    }
}

fn decode_ring_policy(value: &Value) -> Result<RingPolicy, String> {
    let step = decode_number(value)?;
    if step < 0.0 {
        return Err(format!("ring step must not be negative, got {step}"));
    }
    if step == 0.0 {
        Ok(RingPolicy::FixedCount(DEFAULT_RING_COUNT))
    } else {
        Ok(RingPolicy::FixedStep(step))
    }
}

fn clamp_logged(key: SettingKey, value: f32, min: f32, max: f32) -> f32 {
    let clamped = value.clamp(min, max);
    if clamped != value {
        debug!(key = key.name(), value, clamped, "settings_value_clamped");
    }
    clamped
}
