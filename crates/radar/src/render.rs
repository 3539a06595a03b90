use tracing::{debug, trace};

use crate::color::{Rgba, LIME, TRANSPARENT};
use crate::config::RadarConfig;
use crate::distance::DistanceResolver;
use crate::geometry::{project, scaled_radius, Projection, ScreenPoint};
use crate::host::{EntityId, Observer, SceneEntity};
use crate::raster::{draw_text_centered, fill_circle, fill_rect, stroke_circle, Surface};

const RIM_INSET_PX: f32 = 1.0;
const RIM_WIDTH_PX: f32 = 1.5;
const RING_WIDTH_PX: f32 = 1.0;
const RING_LABEL_GAP_PX: f32 = 5.0;
const CROSSHAIR_COLOR: Rgba = [0, 255, 0, 51];
const MIN_SELF_MARKER_PX: f32 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderedBlip {
    pub id: EntityId,
    pub point: ScreenPoint,
    pub color: Rgba,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedRing {
    pub distance: f32,
    pub radius: f32,
    pub label: String,
}

/// Entities left off the radar this pass, by reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipCounts {
    pub hidden: usize,
    pub unmeasured: usize,
    pub out_of_range: usize,
    pub unprojectable: usize,
}

impl SkipCounts {
    pub fn total(&self) -> usize {
        self.hidden + self.unmeasured + self.out_of_range + self.unprojectable
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderReport {
    pub observer: Option<EntityId>,
    pub max_distance: f32,
    pub rings: Vec<RenderedRing>,
    pub blips: Vec<RenderedBlip>,
    pub skipped: SkipCounts,
}

#[derive(Debug, Default)]
pub struct RenderPipeline {
    passes: u64,
}

impl RenderPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn passes(&self) -> u64 {
        self.passes
    }

    pub fn render(
        &mut self,
        surface: &mut Surface,
        observer: Option<&Observer>,
        entities: &[SceneEntity],
        config: &RadarConfig,
        resolver: &DistanceResolver,
    ) -> RenderReport {
        self.passes = self.passes.saturating_add(1);
        surface.clear(TRANSPARENT);

        let mut report = RenderReport::default();
        let Some(observer) = observer.filter(|observer| observer.position.is_finite()) else {
            trace!(pass = self.passes, "radar_render_blank");
            return report;
        };
        report.observer = Some(observer.id);

        let width = surface.width();
        let height = surface.height();
        let radius = width.min(height) as f32 * 0.5;
        let center = (radius, radius);
        let max_distance =
            resolver.effective_max_distance(observer, config.max_distance, config.use_sensor_range);
        report.max_distance = max_distance;
        let frame = surface.frame_mut();

        stroke_circle(
            frame,
            width,
            height,
            center,
            (radius - RIM_INSET_PX).max(0.0),
            RIM_WIDTH_PX,
            LIME,
        );

        let axis = radius as i32;
        fill_rect(frame, width, height, axis, 0, 1, height as i32, CROSSHAIR_COLOR);
        fill_rect(frame, width, height, 0, axis, width as i32, 1, CROSSHAIR_COLOR);

        if config.show_range_rings {
            for distance in config.ring_policy.ring_distances(max_distance) {
                let ring_radius = scaled_radius(distance, max_distance, radius);
                let label = format!("{}", distance.round() as i64);
                stroke_circle(
                    frame,
                    width,
                    height,
                    center,
                    ring_radius,
                    RING_WIDTH_PX,
                    config.ring_color,
                );
                draw_text_centered(
                    frame,
                    width,
                    height,
                    radius,
                    radius - ring_radius - RING_LABEL_GAP_PX,
                    &label,
                    config.ring_color,
                );
                report.rings.push(RenderedRing {
                    distance,
                    radius: ring_radius,
                    label,
                });
            }
        }

        fill_circle(
            frame,
            width,
            height,
            center,
            MIN_SELF_MARKER_PX.max(config.blip_size_px * 0.75),
            config.self_color,
        );

        for entity in entities {
            if !entity.visible {
                report.skipped.hidden += 1;
                continue;
            }
            if entity.id == observer.id {
                continue;
            }
            if !entity.position.is_finite() {
                report.skipped.unprojectable += 1;
                continue;
            }
            let Some(distance) = resolver.resolve(observer, entity) else {
                report.skipped.unmeasured += 1;
                continue;
            };

            match project(
                observer.position,
                entity.position,
                distance,
                max_distance,
                radius,
            ) {
                Projection::Blip(point) => {
                    let color = config.palette.color_for(entity.disposition);
                    fill_circle(
                        frame,
                        width,
                        height,
                        (point.x, point.y),
                        config.blip_size_px,
                        color,
                    );
                    report.blips.push(RenderedBlip {
                        id: entity.id,
                        point,
                        color,
                    });
                }
                Projection::OutOfRange => report.skipped.out_of_range += 1,
                Projection::Unprojectable => report.skipped.unprojectable += 1,
            }
        }

        debug!(
            pass = self.passes,
            observer = observer.id.0,
            max_distance,
            blips = report.blips.len(),
            skipped = report.skipped.total(),
            "radar_rendered"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RingPolicy;
    use crate::distance::{DistanceOracle, EuclideanDistance, MeasureError, ObserverSensorRange};
    use crate::geometry::Vec2;
    use crate::host::Disposition;

    const HOSTILE: Rgba = [255, 0, 0, 255];
    const NEUTRAL: Rgba = [255, 255, 0, 255];

    struct FailsAtX(f32);

    impl DistanceOracle for FailsAtX {
        fn measure(&self, from: Vec2, to: Vec2) -> Result<f32, MeasureError> {
            if to.x == self.0 {
                return Err(MeasureError::Unavailable("ray crosses a wall".to_string()));
            }
            EuclideanDistance {
                pixels_per_unit: 1.0,
            }
            .measure(from, to)
        }
    }

    fn euclidean() -> DistanceResolver {
        DistanceResolver::new(Box::new(EuclideanDistance {
            pixels_per_unit: 1.0,
        }))
    }

    fn observer_at(x: f32, y: f32) -> Observer {
        Observer {
            id: EntityId(1),
            position: Vec2::new(x, y),
            sensor_range: None,
        }
    }

    fn entity(id: u64, x: f32, y: f32, disposition: Disposition) -> SceneEntity {
        SceneEntity {
            id: EntityId(id),
            position: Vec2::new(x, y),
            visible: true,
            disposition,
        }
    }

    fn small_config() -> RadarConfig {
        RadarConfig {
            size_px: 50,
            max_distance: 20.0,
            ..RadarConfig::default()
        }
    }

    #[test]
    fn hostile_blip_lands_on_projected_pixel() {
        let config = small_config();
        let mut surface = Surface::new(50, 50);
        let observer = observer_at(0.0, 0.0);
        let entities = [entity(2, 10.0, 0.0, Disposition::Hostile)];

        let report = RenderPipeline::new().render(
            &mut surface,
            Some(&observer),
            &entities,
            &config,
            &euclidean(),
        );

        assert_eq!(report.blips.len(), 1);
        let blip = report.blips[0];
        assert!((blip.point.x - 35.0).abs() < 0.0001);
        assert!((blip.point.y - 25.0).abs() < 0.0001);
        assert_eq!(blip.color, HOSTILE);
        assert_eq!(surface.pixel(35, 25), Some(HOSTILE));
    }

    #[test]
    fn unclassified_entities_use_neutral_color() {
        let mut surface = Surface::new(50, 50);
        let observer = observer_at(0.0, 0.0);
        let entities = [entity(2, 0.0, 5.0, Disposition::Unclassified)];

        let report = RenderPipeline::new().render(
            &mut surface,
            Some(&observer),
            &entities,
            &small_config(),
            &euclidean(),
        );

        assert_eq!(report.blips[0].color, NEUTRAL);
    }

    #[test]
    fn failed_measurement_skips_only_that_entity() {
        let resolver = DistanceResolver::new(Box::new(FailsAtX(-7.0)));
        let mut surface = Surface::new(50, 50);
        let observer = observer_at(0.0, 0.0);
        let entities = [
            entity(2, 3.0, 0.0, Disposition::Friendly),
            entity(3, -7.0, 2.0, Disposition::Hostile),
            entity(4, 0.0, -9.0, Disposition::Neutral),
        ];

        let report = RenderPipeline::new().render(
            &mut surface,
            Some(&observer),
            &entities,
            &small_config(),
            &resolver,
        );

        let ids: Vec<EntityId> = report.blips.iter().map(|blip| blip.id).collect();
        assert_eq!(ids, vec![EntityId(2), EntityId(4)]);
        assert_eq!(report.skipped.unmeasured, 1);
    }

    #[test]
    fn repeated_render_produces_identical_frames() {
        let config = small_config();
        let observer = observer_at(40.0, 40.0);
        let entities = [
            entity(2, 45.0, 38.0, Disposition::Hostile),
            entity(3, 30.0, 52.0, Disposition::Friendly),
        ];
        let resolver = euclidean();
        let mut pipeline = RenderPipeline::new();
        let mut surface = Surface::new(50, 50);

        let first_report =
            pipeline.render(&mut surface, Some(&observer), &entities, &config, &resolver);
        let first_frame = surface.frame().to_vec();
        let second_report =
            pipeline.render(&mut surface, Some(&observer), &entities, &config, &resolver);

        assert_eq!(first_report, second_report);
        assert_eq!(surface.frame(), first_frame.as_slice());
        assert_eq!(pipeline.passes(), 2);
    }

    #[test]
    fn missing_observer_leaves_blank_frame() {
        let mut surface = Surface::new(50, 50);
        surface.clear(HOSTILE);
        let entities = [entity(2, 1.0, 1.0, Disposition::Hostile)];

        let report =
            RenderPipeline::new().render(&mut surface, None, &entities, &small_config(), &euclidean());

        assert!(surface.frame().iter().all(|byte| *byte == 0));
        assert_eq!(report, RenderReport::default());
    }

    #[test]
    fn observer_with_non_finite_position_leaves_blank_frame() {
        let mut surface = Surface::new(50, 50);
        let observer = observer_at(f32::NAN, 0.0);
        let report =
            RenderPipeline::new().render(&mut surface, Some(&observer), &[], &small_config(), &euclidean());
        assert!(surface.frame().iter().all(|byte| *byte == 0));
        assert_eq!(report.observer, None);
    }

    #[test]
    fn hidden_observer_and_far_entities_are_filtered() {
        let mut surface = Surface::new(50, 50);
        let observer = observer_at(0.0, 0.0);
        let mut hidden = entity(3, 2.0, 2.0, Disposition::Hostile);
        hidden.visible = false;
        let entities = [
            entity(1, 0.0, 0.0, Disposition::Friendly),
            hidden,
            entity(4, 25.0, 0.0, Disposition::Hostile),
            entity(5, f32::INFINITY, 0.0, Disposition::Hostile),
            entity(6, 0.0, 20.0, Disposition::Hostile),
        ];

        let report = RenderPipeline::new().render(
            &mut surface,
            Some(&observer),
            &entities,
            &small_config(),
            &euclidean(),
        );

        let ids: Vec<EntityId> = report.blips.iter().map(|blip| blip.id).collect();
        assert_eq!(ids, vec![EntityId(6)]);
        assert_eq!(
            report.skipped,
            SkipCounts {
                hidden: 1,
                unmeasured: 0,
                out_of_range: 1,
                unprojectable: 1,
            }
        );
    }

    #[test]
    fn fixed_count_rings_are_labeled_and_monotone() {
        let config = RadarConfig {
            max_distance: 30.0,
            ..RadarConfig::default()
        };
        let mut surface = Surface::new(150, 150);
        let observer = observer_at(0.0, 0.0);

        let report =
            RenderPipeline::new().render(&mut surface, Some(&observer), &[], &config, &euclidean());

        let labels: Vec<&str> = report.rings.iter().map(|ring| ring.label.as_str()).collect();
        assert_eq!(labels, vec!["8", "15", "23", "30"]);
        assert!(report
            .rings
            .windows(2)
            .all(|pair| pair[0].radius < pair[1].radius));
        assert!((report.rings[3].radius - 70.0).abs() < 0.0001);
    }

    #[test]
    fn fixed_step_rings_follow_step() {
        let config = RadarConfig {
            max_distance: 30.0,
            ring_policy: RingPolicy::FixedStep(10.0),
            ..RadarConfig::default()
        };
        let mut surface = Surface::new(150, 150);
        let report = RenderPipeline::new().render(
            &mut surface,
            Some(&observer_at(0.0, 0.0)),
            &[],
            &config,
            &euclidean(),
        );
        let labels: Vec<&str> = report.rings.iter().map(|ring| ring.label.as_str()).collect();
        assert_eq!(labels, vec!["10", "20", "30"]);
    }

    #[test]
    fn disabled_rings_draw_none() {
        let config = RadarConfig {
            show_range_rings: false,
            ..small_config()
        };
        let mut surface = Surface::new(50, 50);
        let report = RenderPipeline::new().render(
            &mut surface,
            Some(&observer_at(0.0, 0.0)),
            &[],
            &config,
            &euclidean(),
        );
        assert!(report.rings.is_empty());
    }

    #[test]
    fn observer_marker_and_rim_are_painted() {
        let config = small_config();
        let mut surface = Surface::new(50, 50);
        RenderPipeline::new().render(
            &mut surface,
            Some(&observer_at(0.0, 0.0)),
            &[],
            &config,
            &euclidean(),
        );

        assert_eq!(surface.pixel(25, 25), Some(config.self_color));
        assert_eq!(surface.pixel(25, 1), Some(LIME));
        assert_eq!(surface.pixel(0, 0), Some(TRANSPARENT));
    }

    #[test]
    fn sensor_range_widens_max_distance_when_enabled() {
        let resolver = euclidean().with_strategy(Box::new(ObserverSensorRange));
        let config = RadarConfig {
            use_sensor_range: true,
            ..small_config()
        };
        let mut observer = observer_at(0.0, 0.0);
        observer.sensor_range = Some(40.0);
        let entities = [entity(2, 30.0, 0.0, Disposition::Hostile)];
        let mut surface = Surface::new(50, 50);

        let report =
            RenderPipeline::new().render(&mut surface, Some(&observer), &entities, &config, &resolver);

        assert_eq!(report.max_distance, 40.0);
        assert_eq!(report.blips.len(), 1);
    }
}
