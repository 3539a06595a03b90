use std::f32::consts::TAU;
use std::time::{Duration, Instant};

use radar::{Disposition, EntityId, EntitySource, Observer, RadarTrigger, SceneEntity, Vec2};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy)]
struct Token {
    id: EntityId,
    orbit_center: Vec2,
    orbit_radius_cells: f32,
    angle: f32,
    step_radians: f32,
    disposition: Disposition,
    sensor_range: Option<f32>,
    present: bool,
}

/// Tokens hopping cell to cell around fixed orbits, one hop at a time.
#[derive(Debug)]
pub(crate) struct DemoScene {
    tokens: Vec<Token>,
    entities: Vec<SceneEntity>,
    cell_px: f32,
    observer_index: usize,
    next_mover: usize,
    move_interval: Duration,
    next_move_at: Option<Instant>,
    turn: u32,
}

impl DemoScene {
    pub(crate) fn new(cell_px: f32, move_interval: Duration) -> Self {
        let token = |id, center: (f32, f32), radius, angle, step, disposition, sensor_range| Token {
            id: EntityId(id),
            orbit_center: Vec2::new(center.0 * cell_px, center.1 * cell_px),
            orbit_radius_cells: radius,
            angle,
            step_radians: step,
            disposition,
            sensor_range,
            present: true,
        };
        let tokens = vec![
            token(1, (4.0, 3.5), 1.0, 0.0, TAU / 8.0, Disposition::Friendly, Some(45.0)),
            token(2, (6.0, 3.0), 2.0, 1.0, TAU / 12.0, Disposition::Hostile, None),
            token(3, (3.0, 4.0), 3.0, 2.5, -TAU / 16.0, Disposition::Hostile, None),
            token(4, (7.0, 4.0), 1.5, 4.0, TAU / 10.0, Disposition::Neutral, Some(20.0)),
            token(5, (5.0, 2.0), 4.0, 5.0, TAU / 20.0, Disposition::Unclassified, None),
            token(6, (9.0, 5.0), 2.5, 0.5, -TAU / 12.0, Disposition::Friendly, None),
            token(7, (2.0, 2.0), 1.0, 3.0, TAU / 6.0, Disposition::Hostile, None),
        ];

        let mut scene = Self {
            tokens,
            entities: Vec::new(),
            cell_px,
            observer_index: 0,
            next_mover: 0,
            move_interval,
            next_move_at: None,
            turn: 0,
        };
        scene.rebuild_entities();
        scene
    }

    pub(crate) fn token_count(&self) -> usize {
        self.tokens.len()
    }

    pub(crate) fn cell_px(&self) -> f32 {
        self.cell_px
    }

    pub(crate) fn observer_id(&self) -> EntityId {
        self.tokens[self.observer_index].id
    }

    pub(crate) fn next_move_at(&self) -> Option<Instant> {
        self.next_move_at
    }

    /// Hops every token whose move came due; one trigger per hop.
    pub(crate) fn advance(&mut self, now: Instant) -> Vec<RadarTrigger> {
        let Some(due) = self.next_move_at else {
            self.next_move_at = Some(now + self.move_interval);
            return Vec::new();
        };
        if now < due {
            return Vec::new();
        }

        let mut triggers = Vec::new();
        let mut next = due;
        while next <= now && triggers.len() < self.tokens.len() {
            self.hop_next_token();
            triggers.push(RadarTrigger::EntityMoved);
            next += self.move_interval;
        }
        // After a long stall, resume from now instead of replaying the backlog.
        if next <= now {
            next = now + self.move_interval;
        }
        self.next_move_at = Some(next);
        self.rebuild_entities();
        triggers
    }

    pub(crate) fn cycle_observer(&mut self) -> RadarTrigger {
        for offset in 1..=self.tokens.len() {
            let candidate = (self.observer_index + offset) % self.tokens.len();
            if self.tokens[candidate].present {
                self.observer_index = candidate;
                break;
            }
        }
        info!(observer = self.observer_id().0, "observer_selected");
        RadarTrigger::SelectionChanged
    }

    /// Starts the next combat turn. The last token drops out on odd turns and
    /// rejoins on even ones, so turns also exercise add and remove triggers.
    pub(crate) fn advance_turn(&mut self) -> Vec<RadarTrigger> {
        self.turn = self.turn.saturating_add(1);
        let mut triggers = vec![RadarTrigger::TurnAdvanced];

        let reinforcement = self.tokens.len() - 1;
        if reinforcement != self.observer_index {
            let present = self.turn % 2 == 0;
            if self.tokens[reinforcement].present != present {
                self.tokens[reinforcement].present = present;
                triggers.push(if present {
                    RadarTrigger::EntityAdded
                } else {
                    RadarTrigger::EntityRemoved
                });
            }
        }

        self.rebuild_entities();
        info!(turn = self.turn, "turn_advanced");
        triggers
    }

    fn hop_next_token(&mut self) {
        let token = &mut self.tokens[self.next_mover];
        token.angle = (token.angle + token.step_radians).rem_euclid(TAU);
        debug!(token = token.id.0, angle = token.angle, "token_moved");
        self.next_mover = (self.next_mover + 1) % self.tokens.len();
    }

    fn position_of(&self, token: &Token) -> Vec2 {
        let reach = token.orbit_radius_cells * self.cell_px;
        let raw = Vec2::new(
            token.orbit_center.x + reach * token.angle.cos(),
            token.orbit_center.y + reach * token.angle.sin(),
        );
        snap_to_cell_center(raw, self.cell_px)
    }

    fn rebuild_entities(&mut self) {
        let entities: Vec<SceneEntity> = self
            .tokens
            .iter()
            .filter(|token| token.present)
            .map(|token| SceneEntity {
                id: token.id,
                position: self.position_of(token),
                visible: true,
                disposition: token.disposition,
            })
            .collect();
        self.entities = entities;
    }
}

impl EntitySource for DemoScene {
    fn is_ready(&self) -> bool {
        !self.tokens.is_empty()
    }

    fn observer(&self) -> Option<Observer> {
        let token = self.tokens.get(self.observer_index)?;
        token.present.then(|| Observer {
            id: token.id,
            position: self.position_of(token),
            sensor_range: token.sensor_range,
        })
    }

    fn entities(&self) -> &[SceneEntity] {
        &self.entities
    }
}

fn snap_to_cell_center(point: Vec2, cell_px: f32) -> Vec2 {
    Vec2::new(
        (point.x / cell_px).floor() * cell_px + cell_px * 0.5,
        (point.y / cell_px).floor() * cell_px + cell_px * 0.5,
    )
}
