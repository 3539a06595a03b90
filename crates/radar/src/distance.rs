use thiserror::Error;
use tracing::warn;

use crate::geometry::Vec2;
use crate::host::{Observer, SceneEntity};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MeasureError {
    #[error("distance between {from:?} and {to:?} is not measurable")]
    NonFinite { from: Vec2, to: Vec2 },
    #[error("distance measurement unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StrategyError {
    #[error("observer has no range data")]
    MissingRange,
    #[error("range lookup failed: {0}")]
    Lookup(String),
}

/// Host-provided distance measurement between two scene positions.
pub trait DistanceOracle {
    fn measure(&self, from: Vec2, to: Vec2) -> Result<f32, MeasureError>;
}

/// Substitutes a context-specific maximum range for the configured one.
pub trait RangeStrategy {
    fn applies(&self, observer: &Observer) -> bool;
    fn max_range(&self, observer: &Observer) -> Result<f32, StrategyError>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EuclideanDistance {
    pub pixels_per_unit: f32,
}

impl DistanceOracle for EuclideanDistance {
    fn measure(&self, from: Vec2, to: Vec2) -> Result<f32, MeasureError> {
        if !from.is_finite() || !to.is_finite() || self.pixels_per_unit <= 0.0 {
            return Err(MeasureError::NonFinite { from, to });
        }
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        Ok((dx * dx + dy * dy).sqrt() / self.pixels_per_unit)
    }
}

/// How diagonal steps count when measuring in grid spaces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DiagonalRule {
    /// Every diagonal step costs one space.
    #[default]
    Equidistant,
    /// Diagonal steps alternate between one and two spaces.
    Alternating,
    /// Straight-line distance snapped to whole cells.
    Exact,
}

/// Square-grid distance measured in whole grid spaces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridDistance {
    pub cell_size_px: f32,
    pub units_per_cell: f32,
    pub diagonals: DiagonalRule,
}

impl GridDistance {
    fn cell_of(&self, point: Vec2) -> (f64, f64) {
        let cell = f64::from(self.cell_size_px);
        (
            (f64::from(point.x) / cell).floor(),
            (f64::from(point.y) / cell).floor(),
        )
    }
}

impl DistanceOracle for GridDistance {
    fn measure(&self, from: Vec2, to: Vec2) -> Result<f32, MeasureError> {
        if !from.is_finite() || !to.is_finite() {
            return Err(MeasureError::NonFinite { from, to });
        }
        if !(self.cell_size_px > 0.0 && self.units_per_cell.is_finite()) {
            return Err(MeasureError::Unavailable(format!(
                "invalid grid cell size {}",
                self.cell_size_px
            )));
        }

        // Cell math stays in f64 so distant points cannot overflow.
        let (from_col, from_row) = self.cell_of(from);
        let (to_col, to_row) = self.cell_of(to);
        let dx = (to_col - from_col).abs();
        let dy = (to_row - from_row).abs();
        let diagonal = dx.min(dy);
        let straight = dx.max(dy) - diagonal;

        let spaces = match self.diagonals {
            DiagonalRule::Equidistant => diagonal + straight,
            DiagonalRule::Alternating => diagonal + (diagonal / 2.0).floor() + straight,
            DiagonalRule::Exact => dx.hypot(dy).round(),
        };
        let distance = spaces * f64::from(self.units_per_cell);
        if !distance.is_finite() || distance > f64::from(f32::MAX) {
            return Err(MeasureError::Unavailable(format!(
                "grid distance of {spaces} spaces is out of range"
            )));
        }
        Ok(distance as f32)
    }
}

/// Uses the observer's own sensor range whenever it reports one.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObserverSensorRange;

impl RangeStrategy for ObserverSensorRange {
    fn applies(&self, observer: &Observer) -> bool {
        observer.sensor_range.is_some()
    }

    fn max_range(&self, observer: &Observer) -> Result<f32, StrategyError> {
        observer.sensor_range.ok_or(StrategyError::MissingRange)
    }
}

pub struct DistanceResolver {
    oracle: Box<dyn DistanceOracle>,
    strategy: Option<Box<dyn RangeStrategy>>,
}

impl DistanceResolver {
    pub fn new(oracle: Box<dyn DistanceOracle>) -> Self {
        Self {
            oracle,
            strategy: None,
        }
    }

    pub fn with_strategy(mut self, strategy: Box<dyn RangeStrategy>) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn set_strategy(&mut self, strategy: Option<Box<dyn RangeStrategy>>) {
        self.strategy = strategy;
    }

    /// Distance from the observer to `entity`, or `None` when the entity
    /// must be skipped for this pass.
    pub fn resolve(&self, observer: &Observer, entity: &SceneEntity) -> Option<f32> {
        match self.oracle.measure(observer.position, entity.position) {
            Ok(distance) if distance.is_finite() => Some(distance),
            Ok(distance) => {
                warn!(
                    entity = entity.id.0,
                    distance = %distance,
                    "distance_measure_non_finite"
                );
                None
            }
            Err(error) => {
                warn!(entity = entity.id.0, error = %error, "distance_measure_failed");
                None
            }
        }
    }

    pub fn effective_max_distance(
        &self,
        observer: &Observer,
        configured: f32,
        strategy_enabled: bool,
    ) -> f32 {
        if !strategy_enabled {
            return configured;
        }
        let Some(strategy) = self.strategy.as_deref() else {
            return configured;
        };
        if !strategy.applies(observer) {
            return configured;
        }

        match strategy.max_range(observer) {
            Ok(range) if range.is_finite() && range > 0.0 => range,
            Ok(range) => {
                warn!(
                    observer = observer.id.0,
                    range = %range,
                    fallback = configured,
                    "range_strategy_invalid"
                );
                configured
            }
            Err(error) => {
                warn!(
                    observer = observer.id.0,
                    error = %error,
                    fallback = configured,
                    "range_strategy_failed"
                );
                configured
            }
        }
    }
}
