/// Inset between the outermost projectable distance and the radar rim.
pub const MARGIN_PX: f32 = 5.0;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Pixel position inside the radar surface, origin at its top-left corner.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    Blip(ScreenPoint),
    OutOfRange,
    Unprojectable,
}

pub fn usable_radius(display_radius: f32) -> f32 {
    (display_radius - MARGIN_PX).max(0.0)
}

/// Screen radius of a world distance on a radar of `display_radius`.
pub fn scaled_radius(distance: f32, max_distance: f32, display_radius: f32) -> f32 {
    (distance.max(0.0) / max_distance) * usable_radius(display_radius)
}

/// Maps `target` into polar radar coordinates centered on `observer`.
pub fn project(
    observer: Vec2,
    target: Vec2,
    distance: f32,
    max_distance: f32,
    display_radius: f32,
) -> Projection {
    if !observer.is_finite()
        || !target.is_finite()
        || !distance.is_finite()
        || !max_distance.is_finite()
        || max_distance <= 0.0
        || !display_radius.is_finite()
    {
        return Projection::Unprojectable;
    }
    if distance > max_distance {
        return Projection::OutOfRange;
    }

    let dx = target.x - observer.x;
    let dy = target.y - observer.y;
    let angle = dy.atan2(dx);
    let scaled = scaled_radius(distance, max_distance, display_radius);

    Projection::Blip(ScreenPoint {
        x: display_radius + scaled * angle.cos(),
        y: display_radius + scaled * angle.sin(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blip(projection: Projection) -> ScreenPoint {
        match projection {
            Projection::Blip(point) => point,
            other => panic!("expected blip, got {other:?}"),
        }
    }

    #[test]
    fn half_range_entity_lands_halfway_to_usable_rim() {
        let point = blip(project(
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            10.0,
            20.0,
            25.0,
        ));
        assert!((point.x - (25.0 + 0.5 * (25.0 - MARGIN_PX))).abs() < 0.0001);
        assert!((point.y - 25.0).abs() < 0.0001);
    }

    #[test]
    fn larger_display_scales_with_same_formula() {
        let point = blip(project(
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            10.0,
            20.0,
            50.0,
        ));
        assert!((point.x - 72.5).abs() < 0.0001);
        assert!((point.y - 50.0).abs() < 0.0001);
    }

    #[test]
    fn bearing_follows_world_delta_in_screen_axes() {
        let point = blip(project(
            Vec2::new(100.0, 100.0),
            Vec2::new(100.0, 140.0),
            20.0,
            20.0,
            75.0,
        ));
        assert!((point.x - 75.0).abs() < 0.0001);
        assert!((point.y - (75.0 + 70.0)).abs() < 0.0001);
    }

    #[test]
    fn range_boundary_is_inclusive() {
        let observer = Vec2::new(0.0, 0.0);
        let target = Vec2::new(0.0, -30.0);
        assert!(matches!(
            project(observer, target, 30.0, 30.0, 75.0),
            Projection::Blip(_)
        ));
        assert_eq!(
            project(observer, target, 30.0 + 0.001, 30.0, 75.0),
            Projection::OutOfRange
        );
    }

    #[test]
    fn zero_distance_renders_at_center() {
        let point = blip(project(
            Vec2::new(5.0, 5.0),
            Vec2::new(5.0, 5.0),
            0.0,
            30.0,
            75.0,
        ));
        assert_eq!(point, ScreenPoint { x: 75.0, y: 75.0 });
    }

    #[test]
    fn non_finite_inputs_are_unprojectable() {
        let observer = Vec2::new(0.0, 0.0);
        assert_eq!(
            project(observer, Vec2::new(f32::NAN, 0.0), 1.0, 30.0, 75.0),
            Projection::Unprojectable
        );
        assert_eq!(
            project(observer, Vec2::new(0.0, f32::INFINITY), 1.0, 30.0, 75.0),
            Projection::Unprojectable
        );
        assert_eq!(
            project(observer, Vec2::new(1.0, 0.0), f32::NAN, 30.0, 75.0),
            Projection::Unprojectable
        );
    }

    #[test]
    fn non_positive_max_distance_is_unprojectable() {
        let observer = Vec2::new(0.0, 0.0);
        let target = Vec2::new(1.0, 0.0);
        assert_eq!(
            project(observer, target, 1.0, 0.0, 75.0),
            Projection::Unprojectable
        );
        assert_eq!(
            project(observer, target, 1.0, -5.0, 75.0),
            Projection::Unprojectable
        );
    }

    #[test]
    fn projected_points_never_leave_usable_disc() {
        let observer = Vec2::new(-40.0, 12.0);
        let max_distance = 30.0;
        let display_radius = 75.0;
        let limit = display_radius - MARGIN_PX + 0.001;

        for step in 0..72 {
            let angle = step as f32 * std::f32::consts::TAU / 72.0;
            for reach in [0.0, 1.0, 7.5, 15.0, 29.99, 30.0, 30.5, 500.0] {
                let target = Vec2::new(
                    observer.x + reach * angle.cos(),
                    observer.y + reach * angle.sin(),
                );
                match project(observer, target, reach, max_distance, display_radius) {
                    Projection::Blip(point) => {
                        let dx = point.x - display_radius;
                        let dy = point.y - display_radius;
                        assert!((dx * dx + dy * dy).sqrt() <= limit);
                        assert!(reach <= max_distance);
                    }
                    Projection::OutOfRange => assert!(reach > max_distance),
                    Projection::Unprojectable => panic!("finite inputs must project"),
                }
            }
        }
    }

    #[test]
    fn display_smaller_than_margin_collapses_to_center() {
        assert_eq!(usable_radius(3.0), 0.0);
        let point = blip(project(
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 1.0),
            10.0,
            20.0,
            3.0,
        ));
        assert_eq!(point, ScreenPoint { x: 3.0, y: 3.0 });
    }
}
