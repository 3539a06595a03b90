use crate::geometry::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Disposition {
    Friendly,
    Neutral,
    Hostile,
    #[default]
    Unclassified,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observer {
    pub id: EntityId,
    pub position: Vec2,
    /// Detection range in grid units, consulted only by range strategies.
    pub sensor_range: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneEntity {
    pub id: EntityId,
    pub position: Vec2,
    pub visible: bool,
    pub disposition: Disposition,
}

pub trait EntitySource {
    /// False while the scene is still loading its entity collection.
    fn is_ready(&self) -> bool;
    fn observer(&self) -> Option<Observer>;
    fn entities(&self) -> &[SceneEntity];
}

/// Host events that invalidate the current radar frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadarTrigger {
    EntityMoved,
    EntityAdded,
    EntityRemoved,
    SelectionChanged,
    TurnAdvanced,
    SceneLoaded,
}
