use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SettingKey {
    HostileColor,
    NeutralColor,
    FriendlyColor,
    SelfColor,
    BackgroundGradient,
    RadarSize,
    BlipSize,
    MaxDistance,
    ShowRangeRings,
    RangeRingColor,
    RangeRingStep,
    UseSensorRange,
    Position,
}

/// What the radar must do after a setting changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingEffect {
    Rerender,
    Recreate,
    None,
}

impl SettingKey {
    pub const ALL: [SettingKey; 13] = [
        SettingKey::HostileColor,
        SettingKey::NeutralColor,
        SettingKey::FriendlyColor,
        SettingKey::SelfColor,
        SettingKey::BackgroundGradient,
        SettingKey::RadarSize,
        SettingKey::BlipSize,
        SettingKey::MaxDistance,
        SettingKey::ShowRangeRings,
        SettingKey::RangeRingColor,
        SettingKey::RangeRingStep,
        SettingKey::UseSensorRange,
        SettingKey::Position,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            SettingKey::HostileColor => "hostileColor",
            SettingKey::NeutralColor => "neutralColor",
            SettingKey::FriendlyColor => "friendlyColor",
            SettingKey::SelfColor => "selfColor",
            SettingKey::BackgroundGradient => "backgroundGradient",
            SettingKey::RadarSize => "radarSize",
            SettingKey::BlipSize => "blipSize",
            SettingKey::MaxDistance => "maxDistance",
            SettingKey::ShowRangeRings => "showRangeRings",
            SettingKey::RangeRingColor => "rangeRingColor",
            SettingKey::RangeRingStep => "rangeRingStep",
            SettingKey::UseSensorRange => "useSensorRange",
            SettingKey::Position => "position",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            SettingKey::HostileColor => "Hostile Blip Color",
            SettingKey::NeutralColor => "Neutral Blip Color",
            SettingKey::FriendlyColor => "Friendly Blip Color",
            SettingKey::SelfColor => "Self Dot Color",
            SettingKey::BackgroundGradient => "Radar Background Gradient",
            SettingKey::RadarSize => "Radar Size (pixels)",
            SettingKey::BlipSize => "Blip Size (pixels)",
            SettingKey::MaxDistance => "Max Radar Distance (grid units)",
            SettingKey::ShowRangeRings => "Show Range Rings",
            SettingKey::RangeRingColor => "Range Ring Color",
            SettingKey::RangeRingStep => "Range Ring Step (0 = four even rings)",
            SettingKey::UseSensorRange => "Use Sensor Range",
            SettingKey::Position => "Radar Position",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.name() == name)
    }

    pub fn default_value(self) -> Value {
        match self {
            SettingKey::HostileColor => json!("#ff0000"),
            SettingKey::NeutralColor => json!("#ffff00"),
            SettingKey::FriendlyColor => json!("#00ff00"),
            SettingKey::SelfColor => json!("#00ff00"),
            SettingKey::BackgroundGradient => json!(
                "radial-gradient(circle at center, rgba(0,255,0,0.15), rgba(0,0,0,0.9))"
            ),
            SettingKey::RadarSize => json!(150),
            SettingKey::BlipSize => json!(4),
            SettingKey::MaxDistance => json!(30),
            SettingKey::ShowRangeRings => json!(true),
            SettingKey::RangeRingColor => json!("rgba(0,255,0,0.2)"),
            SettingKey::RangeRingStep => json!(0),
            SettingKey::UseSensorRange => json!(false),
            SettingKey::Position => json!({ "top": 10.0, "left": null, "right": 10.0 }),
        }
    }

    pub const fn effect(self) -> SettingEffect {
        match self {
            SettingKey::RadarSize | SettingKey::BackgroundGradient => SettingEffect::Recreate,
            SettingKey::Position => SettingEffect::None,
            _ => SettingEffect::Rerender,
        }
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse settings file {path} at `{location}`: {source}")]
    Parse {
        path: PathBuf,
        location: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode settings: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to write settings file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Settings accessor consumed by the radar.
pub trait SettingsStore {
    fn get(&self, key: SettingKey) -> Option<Value>;
    fn set(&mut self, key: SettingKey, value: Value) -> Result<(), SettingsError>;
    fn take_changes(&mut self) -> Vec<SettingKey>;
}

/// JSON-object settings, optionally persisted to a file on every write.
#[derive(Debug, Default)]
pub struct JsonSettingsStore {
    path: Option<PathBuf>,
    values: BTreeMap<String, Value>,
    changes: Vec<SettingKey>,
}

impl JsonSettingsStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Opens `path`, starting empty when the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let path = path.into();
        let values = if path.exists() {
            let raw = fs::read_to_string(&path).map_err(|source| SettingsError::Read {
                path: path.clone(),
                source,
            })?;
            parse_settings_json(&path, &raw)?
        } else {
            BTreeMap::new()
        };

        let unknown: Vec<&str> = values
            .keys()
            .map(String::as_str)
            .filter(|name| SettingKey::from_name(name).is_none())
            .collect();
        info!(
            path = %path.display(),
            stored = values.len(),
            unknown = ?unknown,
            "settings_loaded"
        );

        Ok(Self {
            path: Some(path),
            values,
            changes: Vec::new(),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn persist(&self) -> Result<(), SettingsError> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };
        let text = serde_json::to_string_pretty(&self.values).map_err(SettingsError::Encode)?;
        write_text_atomic(path, &text).map_err(|source| SettingsError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl SettingsStore for JsonSettingsStore {
    fn get(&self, key: SettingKey) -> Option<Value> {
        self.values.get(key.name()).cloned()
    }

    fn set(&mut self, key: SettingKey, value: Value) -> Result<(), SettingsError> {
        if self.values.get(key.name()) == Some(&value) {
            return Ok(());
        }
        debug!(key = key.name(), value = %value, "setting_changed");
        self.values.insert(key.name().to_string(), value);
        if !self.changes.contains(&key) {
            self.changes.push(key);
        }
        self.persist()
    }

    fn take_changes(&mut self) -> Vec<SettingKey> {
        std::mem::take(&mut self.changes)
    }
}

fn parse_settings_json(path: &Path, raw: &str) -> Result<BTreeMap<String, Value>, SettingsError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, BTreeMap<String, Value>>(&mut deserializer).map_err(
        |error| {
            let location = error.path().to_string();
            SettingsError::Parse {
                path: path.to_path_buf(),
                location,
                source: error.into_inner(),
            }
        },
    )
}

fn write_text_atomic(path: &Path, text: &str) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, text)?;
    if let Err(error) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(error);
    }
    Ok(())
}
