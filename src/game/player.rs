//! Authoritative state of one fighter

use uuid::Uuid;

use crate::net::protocol::{Direction, RosterEntry};

use super::combat::{AttackOutcome, CombatSystem, MAX_HEALTH};
use super::physics::{Movement, PhysicsSystem, Position, VerticalState, JUMP_STRENGTH};
use super::roster::Slot;
use super::snapshot::is_significant_change;

/// One combatant occupying a roster slot
#[derive(Debug, Clone)]
pub struct Player {
    pub id: Uuid,
    pub slot: Slot,
    pub position: Position,
    /// Position clients last heard about
    pub last_broadcast_position: Position,
    pub health: u8,
    pub vertical: VerticalState,
    pub movement: Movement,
}

impl Player {
    /// Spawn a fresh fighter at its slot's start line
    pub fn new(id: Uuid, slot: Slot) -> Self {
        let spawn = slot.spawn();
        Self {
            id,
            slot,
            position: spawn,
            last_broadcast_position: spawn,
            health: MAX_HEALTH,
            vertical: VerticalState::Grounded,
            movement: Movement::Idle,
        }
    }

    pub fn velocity_y(&self) -> i32 {
        self.vertical.velocity_y()
    }

    pub fn is_grounded(&self) -> bool {
        self.vertical == VerticalState::Grounded
    }

    pub fn is_moving(&self) -> bool {
        matches!(self.movement, Movement::Moving(_))
    }

    pub fn movement_direction(&self) -> Option<Direction> {
        match self.movement {
            Movement::Idle => None,
            Movement::Moving(direction) => Some(direction),
        }
    }

    /// Walk in `direction` until stopped; the latest direction wins
    pub fn start_moving(&mut self, direction: Direction) {
        self.movement = Movement::Moving(direction);
    }

    pub fn stop_moving(&mut self) {
        self.movement = Movement::Idle;
    }

    /// Leave the ground. Ignored while airborne; returns whether the jump started.
    pub fn jump(&mut self) -> bool {
        if !self.is_grounded() {
            return false;
        }
        self.vertical = VerticalState::Airborne {
            velocity_y: -JUMP_STRENGTH,
        };
        true
    }

    /// Land one attack on `target`
    pub fn attack(&self, target: &mut Player) -> AttackOutcome {
        let outcome = CombatSystem::apply_damage(target.health);
        target.health = outcome.target_health;
        outcome
    }

    /// Back to the slot's spawn state; the broadcast baseline is untouched
    pub fn reset(&mut self) {
        self.position = self.slot.spawn();
        self.health = MAX_HEALTH;
        self.vertical = VerticalState::Grounded;
        self.movement = Movement::Idle;
    }

    /// Advance one simulation step: walk first, then fall
    pub fn tick(&mut self) {
        self.position.x = PhysicsSystem::step_horizontal(self.position.x, self.movement);
        let (y, vertical) = PhysicsSystem::step_vertical(self.position.y, self.vertical);
        self.position.y = y;
        self.vertical = vertical;
    }

    /// Moved far enough from what clients last saw
    pub fn has_significant_change(&self) -> bool {
        is_significant_change(&self.position, &self.last_broadcast_position)
    }

    pub fn mark_broadcast(&mut self) {
        self.last_broadcast_position = self.position;
    }

    pub fn roster_entry(&self) -> RosterEntry {
        RosterEntry {
            id: self.id,
            position: self.position,
            health: self.health,
        }
    }
}
