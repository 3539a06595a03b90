use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::{read_position, write_position, RadarConfig, RadarOptions};
use crate::distance::{DistanceOracle, DistanceResolver, RangeStrategy};
use crate::geometry::Vec2;
use crate::host::{EntitySource, RadarTrigger};
use crate::hud::{HudManager, HudPosition, HudSignal};
use crate::render::{RenderPipeline, RenderReport};
use crate::scheduler::UpdateScheduler;
use crate::settings::{SettingEffect, SettingsStore};

pub struct Radar {
    settings: Box<dyn SettingsStore>,
    resolver: DistanceResolver,
    scheduler: UpdateScheduler,
    hud: HudManager,
    pipeline: RenderPipeline,
    config: RadarConfig,
}

impl Radar {
    pub fn new(
        settings: Box<dyn SettingsStore>,
        oracle: Box<dyn DistanceOracle>,
        options: RadarOptions,
    ) -> Self {
        let config = RadarConfig::read(settings.as_ref());
        Self {
            settings,
            resolver: DistanceResolver::new(oracle),
            scheduler: UpdateScheduler::new(options),
            hud: HudManager::new(0),
            pipeline: RenderPipeline::new(),
            config,
        }
    }

    pub fn with_range_strategy(mut self, strategy: Box<dyn RangeStrategy>) -> Self {
        self.resolver.set_strategy(Some(strategy));
        self
    }

    pub fn set_range_strategy(&mut self, strategy: Option<Box<dyn RangeStrategy>>) {
        self.resolver.set_strategy(strategy);
    }

    pub fn config(&self) -> &RadarConfig {
        &self.config
    }

    pub fn hud(&self) -> &HudManager {
        &self.hud
    }

    pub fn settings(&self) -> &dyn SettingsStore {
        self.settings.as_ref()
    }

    pub fn settings_mut(&mut self) -> &mut dyn SettingsStore {
        self.settings.as_mut()
    }

    pub fn set_window_width(&mut self, window_width: u32) {
        self.hud.set_window_width(window_width);
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    pub fn create_hud(&mut self) {
        self.config = RadarConfig::read(self.settings.as_ref());
        let position = read_position(self.settings.as_ref());
        self.hud.create(&self.config, position);
    }

    pub fn destroy_hud(&mut self) {
        self.hud.destroy();
    }

    pub fn toggle_visibility(&mut self) -> bool {
        self.hud.toggle_visibility()
    }

    /// Every host trigger schedules a debounced redraw. A freshly loaded
    /// scene also gets a freshly built overlay.
    pub fn notify(&mut self, trigger: RadarTrigger, now: Instant) {
        debug!(trigger = ?trigger, "radar_trigger");
        if trigger == RadarTrigger::SceneLoaded {
            self.create_hud();
        }
        self.scheduler.request_update(now);
    }

    pub fn request_update(&mut self, now: Instant) {
        self.scheduler.request_update(now);
    }

    /// Applies pending settings changes, then renders if the scheduler says
    /// a pass is due and both the overlay and the scene are ready.
    pub fn tick(&mut self, now: Instant, scene: &dyn EntitySource) -> Option<RenderReport> {
        self.apply_setting_changes(now);
        let ready = self.hud.is_created() && scene.is_ready();
        if !self.scheduler.poll(now, ready) {
            return None;
        }
        self.render_frame(scene)
    }

    pub fn render_now(&mut self, scene: &dyn EntitySource) -> Option<RenderReport> {
        if !self.hud.is_created() || !scene.is_ready() {
            debug!(
                hud_created = self.hud.is_created(),
                scene_ready = scene.is_ready(),
                "radar_not_ready"
            );
            return None;
        }
        self.render_frame(scene)
    }

    pub fn pointer_down(&mut self, pointer: Vec2) -> bool {
        self.hud.pointer_down(pointer)
    }

    pub fn pointer_moved(&mut self, pointer: Vec2) -> bool {
        self.hud.pointer_moved(pointer)
    }

    pub fn pointer_up(&mut self) -> Option<HudPosition> {
        let position = self.hud.pointer_up()?;
        self.persist_position(&position);
        Some(position)
    }

    pub fn pointer_left_window(&mut self) -> Option<HudPosition> {
        let position = self.hud.pointer_left_window()?;
        self.persist_position(&position);
        Some(position)
    }

    pub fn double_click(&mut self, pointer: Vec2) -> Option<HudSignal> {
        let signal = self.hud.double_click(pointer)?;
        info!(signal = ?signal, "radar_hud_signal");
        Some(signal)
    }

    pub fn composite(&self, frame: &mut [u8], width: u32, height: u32) {
        self.hud.composite(frame, width, height);
    }

    fn render_frame(&mut self, scene: &dyn EntitySource) -> Option<RenderReport> {
        self.config = RadarConfig::read(self.settings.as_ref());
        if self
            .hud
            .surface()
            .is_some_and(|surface| surface.width() != self.config.size_px)
        {
            let position = self.hud.position().unwrap_or_default();
            self.hud.resize(&self.config, position);
        }

        let observer = scene.observer();
        let surface = self.hud.surface_mut()?;
        Some(self.pipeline.render(
            surface,
            observer.as_ref(),
            scene.entities(),
            &self.config,
            &self.resolver,
        ))
    }

    fn apply_setting_changes(&mut self, now: Instant) {
        let changes = self.settings.take_changes();
        if changes.is_empty() {
            return;
        }

        let recreate = changes
            .iter()
            .any(|key| key.effect() == SettingEffect::Recreate);
        let rerender = recreate
            || changes
                .iter()
                .any(|key| key.effect() == SettingEffect::Rerender);
        let names: Vec<&str> = changes.iter().map(|key| key.name()).collect();
        info!(keys = ?names, recreate, rerender, "radar_settings_applied");

        if recreate && self.hud.is_created() {
            self.config = RadarConfig::read(self.settings.as_ref());
            let position = self
                .hud
                .position()
                .unwrap_or_else(|| read_position(self.settings.as_ref()));
            self.hud.resize(&self.config, position);
        }
        if rerender {
            self.scheduler.request_immediate(now);
        }
    }

    fn persist_position(&mut self, position: &HudPosition) {
        if let Err(error) = write_position(self.settings.as_mut(), position) {
            warn!(error = %error, "radar_position_persist_failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::distance::{EuclideanDistance, ObserverSensorRange};
    use crate::host::{Disposition, EntityId, Observer, SceneEntity};
    use crate::hud::HudState;
    use crate::settings::{JsonSettingsStore, SettingKey};

    struct FakeScene {
        ready: bool,
        observer: Option<Observer>,
        entities: Vec<SceneEntity>,
    }

    impl EntitySource for FakeScene {
        fn is_ready(&self) -> bool {
            self.ready
        }

        fn observer(&self) -> Option<Observer> {
            self.observer
        }

        fn entities(&self) -> &[SceneEntity] {
            &self.entities
        }
    }

    fn scene() -> FakeScene {
        let observer = Observer {
            id: EntityId(1),
            position: Vec2::new(0.0, 0.0),
            sensor_range: Some(60.0),
        };
        FakeScene {
            ready: true,
            observer: Some(observer),
            entities: vec![
                SceneEntity {
                    id: EntityId(1),
                    position: observer.position,
                    visible: true,
                    disposition: Disposition::Friendly,
                },
                SceneEntity {
                    id: EntityId(2),
                    position: Vec2::new(10.0, 0.0),
                    visible: true,
                    disposition: Disposition::Hostile,
                },
                SceneEntity {
                    id: EntityId(3),
                    position: Vec2::new(0.0, 45.0),
                    visible: true,
                    disposition: Disposition::Neutral,
                },
            ],
        }
    }

    fn radar() -> Radar {
        let mut radar = Radar::new(
            Box::new(JsonSettingsStore::in_memory()),
            Box::new(EuclideanDistance {
                pixels_per_unit: 1.0,
            }),
            RadarOptions::default(),
        );
        radar.set_window_width(800);
        radar
    }

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn triggers_coalesce_into_one_render() {
        let start = Instant::now();
        let scene = scene();
        let mut radar = radar();
        radar.create_hud();

        radar.notify(RadarTrigger::EntityMoved, start);
        radar.notify(RadarTrigger::EntityMoved, start + ms(30));
        radar.notify(RadarTrigger::TurnAdvanced, start + ms(60));

        assert!(radar.tick(start + ms(100), &scene).is_none());
        let report = radar.tick(start + ms(160), &scene).expect("render due");
        assert_eq!(report.blips.len(), 1);
        assert_eq!(report.blips[0].id, EntityId(2));
        assert!(radar.tick(start + ms(400), &scene).is_none());
    }

    #[test]
    fn waits_for_scene_readiness() {
        let start = Instant::now();
        let mut scene = scene();
        scene.ready = false;
        let mut radar = radar();
        radar.create_hud();
        radar.request_update(start);

        assert!(radar.tick(start + ms(100), &scene).is_none());
        assert_eq!(radar.next_deadline(), Some(start + ms(200)));
        scene.ready = true;
        assert!(radar.tick(start + ms(200), &scene).is_some());
    }

    #[test]
    fn missing_hud_counts_as_not_ready() {
        let start = Instant::now();
        let scene = scene();
        let mut radar = radar();
        radar.request_update(start);
        assert!(radar.tick(start + ms(100), &scene).is_none());
        assert!(radar.render_now(&scene).is_none());

        radar.create_hud();
        assert!(radar.tick(start + ms(200), &scene).is_some());
    }

    #[test]
    fn size_change_recreates_hud_and_renders_immediately() {
        let start = Instant::now();
        let scene = scene();
        let mut radar = radar();
        radar.create_hud();
        let generation = radar.hud().generation();

        radar
            .settings_mut()
            .set(SettingKey::RadarSize, json!(220))
            .expect("set size");
        let report = radar.tick(start, &scene).expect("immediate render");

        let surface = radar.hud().surface().expect("surface");
        assert_eq!(surface.width(), 220);
        assert_eq!(radar.hud().generation(), generation + 1);
        assert_eq!(radar.hud().overlay_count(), 1);
        assert_eq!(report.blips.len(), 1);
    }

    #[test]
    fn color_change_rerenders_without_recreating() {
        let start = Instant::now();
        let scene = scene();
        let mut radar = radar();
        radar.create_hud();
        let generation = radar.hud().generation();

        radar
            .settings_mut()
            .set(SettingKey::HostileColor, json!("#0000ff"))
            .expect("set color");
        let report = radar.tick(start, &scene).expect("immediate render");

        assert_eq!(report.blips[0].color, [0, 0, 255, 255]);
        assert_eq!(radar.hud().generation(), generation);
    }

    #[test]
    fn drag_end_persists_position_without_rerender() {
        let start = Instant::now();
        let scene = scene();
        let mut radar = radar();
        radar.create_hud();

        assert!(radar.pointer_down(Vec2::new(715.0, 85.0)));
        radar.pointer_moved(Vec2::new(300.0, 200.0));
        let position = radar.pointer_up().expect("drag ended");

        let expected = HudPosition {
            top: 125.0,
            left: Some(225.0),
            right: None,
        };
        assert_eq!(position, expected);
        assert_eq!(read_position(radar.settings()), expected);
        assert!(radar.tick(start, &scene).is_none());

        radar.destroy_hud();
        radar.create_hud();
        assert_eq!(radar.hud().position(), Some(expected));
    }

    #[test]
    fn leaving_window_mid_drag_persists() {
        let mut radar = radar();
        radar.create_hud();
        radar.pointer_down(Vec2::new(715.0, 85.0));
        radar.pointer_moved(Vec2::new(705.0, 95.0));
        let position = radar.pointer_left_window().expect("drag ended");
        assert_eq!(read_position(radar.settings()), position);
        assert_eq!(radar.pointer_up(), None);
    }

    #[test]
    fn hiding_mid_drag_keeps_stored_position() {
        let mut radar = radar();
        radar.create_hud();
        assert!(radar.pointer_down(Vec2::new(715.0, 85.0)));
        radar.pointer_moved(Vec2::new(300.0, 200.0));

        assert!(!radar.toggle_visibility());
        assert_eq!(radar.pointer_up(), None);
        assert_eq!(read_position(radar.settings()), HudPosition::default());
        assert_eq!(radar.hud().position(), Some(HudPosition::default()));
    }

    #[test]
    fn scene_load_rebuilds_hud() {
        let start = Instant::now();
        let scene = scene();
        let mut radar = radar();
        radar.create_hud();
        radar.destroy_hud();
        assert_eq!(radar.hud().state(), HudState::Destroyed);

        radar.notify(RadarTrigger::SceneLoaded, start);
        assert_eq!(radar.hud().state(), HudState::Created);
        assert!(radar.tick(start + ms(100), &scene).is_some());
    }

    #[test]
    fn sensor_strategy_follows_setting() {
        let scene = scene();
        let mut radar = radar().with_range_strategy(Box::new(ObserverSensorRange));
        radar.create_hud();

        let report = radar.render_now(&scene).expect("render");
        assert_eq!(report.max_distance, 30.0);
        assert_eq!(report.blips.len(), 1);

        radar
            .settings_mut()
            .set(SettingKey::UseSensorRange, json!("on"))
            .expect("set flag");
        let report = radar.render_now(&scene).expect("render");
        assert_eq!(report.max_distance, 60.0);
        assert_eq!(report.blips.len(), 2);
    }

    #[test]
    fn double_click_raises_settings_signal() {
        let mut radar = radar();
        radar.create_hud();
        assert_eq!(
            radar.double_click(Vec2::new(715.0, 85.0)),
            Some(HudSignal::OpenSettings)
        );
        assert_eq!(radar.double_click(Vec2::new(10.0, 500.0)), None);
    }

    #[test]
    fn hidden_radar_still_renders_but_composites_nothing() {
        let scene = scene();
        let mut radar = radar();
        radar.create_hud();
        assert!(!radar.toggle_visibility());
        assert!(radar.render_now(&scene).is_some());

        let mut frame = vec![0u8; 800 * 200 * 4];
        radar.composite(&mut frame, 800, 200);
        assert!(frame.iter().all(|byte| *byte == 0));
    }
}
