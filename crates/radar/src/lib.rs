pub mod color;
pub mod config;
pub mod distance;
pub mod geometry;
pub mod host;
pub mod hud;
mod radar;
mod raster;
pub mod render;
pub mod scheduler;
pub mod settings;

pub use color::{parse_color, BackgroundStyle, ColorParseError, Palette, Rgba};
pub use config::{read_position, write_position, RadarConfig, RadarOptions, RingPolicy};
pub use distance::{
    DiagonalRule, DistanceOracle, DistanceResolver, EuclideanDistance, GridDistance, MeasureError,
    ObserverSensorRange, RangeStrategy, StrategyError,
};
pub use geometry::{project, Projection, ScreenPoint, Vec2, MARGIN_PX};
pub use host::{Disposition, EntityId, EntitySource, Observer, RadarTrigger, SceneEntity};
pub use hud::{DragState, HudManager, HudPosition, HudSignal, HudState};
pub use radar::Radar;
pub use raster::{blend_over, Surface};
pub use render::{RenderPipeline, RenderReport, RenderedBlip, RenderedRing, SkipCounts};
pub use scheduler::{Timer, UpdateScheduler};
pub use settings::{JsonSettingsStore, SettingEffect, SettingKey, SettingsError, SettingsStore};
