//! Fighter physics: horizontal walking, gravity and landing

use serde::Serialize;

use crate::net::protocol::Direction;

/// Y coordinate of the ground line (screen coordinates, y grows downward)
pub const GROUND_Y: i32 = 318;
/// Horizontal units walked per tick
pub const MOVE_SPEED: i32 = 5;
/// Vertical speed gained per airborne tick
pub const GRAVITY: i32 = 5;
/// Upward impulse applied by a jump
pub const JUMP_STRENGTH: i32 = 20;
/// Width of the visible arena
pub const ARENA_WIDTH: i32 = 600;
/// Half of a fighter's drawn width
pub const PLAYER_HALF_WIDTH: i32 = 50;

/// Integer arena coordinate, serialized as `[x, y]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "(i32, i32)")]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: &Position) -> f64 {
        let dx = f64::from(self.x - other.x);
        let dy = f64::from(self.y - other.y);
        (dx * dx + dy * dy).sqrt()
    }
}

impl From<Position> for (i32, i32) {
    fn from(p: Position) -> Self {
        (p.x, p.y)
    }
}

/// Vertical state of a fighter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalState {
    /// Standing on the ground line, no vertical speed
    Grounded,
    /// In the air; negative velocity moves up
    Airborne { velocity_y: i32 },
}

impl VerticalState {
    pub fn velocity_y(&self) -> i32 {
        match self {
            VerticalState::Grounded => 0,
            VerticalState::Airborne { velocity_y } => *velocity_y,
        }
    }
}

/// Horizontal state of a fighter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    Idle,
    Moving(Direction),
}

/// Physics system for advancing fighters one tick
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Walk one tick in `movement`, staying inside the arena
    pub fn step_horizontal(x: i32, movement: Movement) -> i32 {
        let dx = match movement {
            Movement::Idle => return x,
            Movement::Moving(Direction::Left) => -MOVE_SPEED,
            Movement::Moving(Direction::Right) => MOVE_SPEED,
        };
        (x + dx).clamp(PLAYER_HALF_WIDTH, ARENA_WIDTH - PLAYER_HALF_WIDTH)
    }

    /// Integrate one tick of vertical motion.
    /// Returns (new_y, new_state)
    pub fn step_vertical(y: i32, vertical: VerticalState) -> (i32, VerticalState) {
        let velocity_y = match vertical {
            VerticalState::Grounded => return (y.min(GROUND_Y), VerticalState::Grounded),
            VerticalState::Airborne { velocity_y } => velocity_y,
        };

        let new_y = y.saturating_add(velocity_y);
        if new_y >= GROUND_Y {
            // Landed (or passed through the ground line)
            return (GROUND_Y, VerticalState::Grounded);
        }

        (
            new_y,
            VerticalState::Airborne {
                velocity_y: velocity_y.saturating_add(GRAVITY),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_does_not_move() {
        assert_eq!(PhysicsSystem::step_horizontal(100, Movement::Idle), 100);
    }

    #[test]
    fn test_walk_both_directions() {
        assert_eq!(
            PhysicsSystem::step_horizontal(100, Movement::Moving(Direction::Right)),
            100 + MOVE_SPEED
        );
        assert_eq!(
            PhysicsSystem::step_horizontal(100, Movement::Moving(Direction::Left)),
            100 - MOVE_SPEED
        );
    }

    #[test]
    fn test_walk_clamped_to_arena() {
        assert_eq!(
            PhysicsSystem::step_horizontal(PLAYER_HALF_WIDTH, Movement::Moving(Direction::Left)),
            PLAYER_HALF_WIDTH
        );
        let right_edge = ARENA_WIDTH - PLAYER_HALF_WIDTH;
        assert_eq!(
            PhysicsSystem::step_horizontal(right_edge - 1, Movement::Moving(Direction::Right)),
            right_edge
        );
    }

    #[test]
    fn test_grounded_stays_put() {
        assert_eq!(
            PhysicsSystem::step_vertical(GROUND_Y, VerticalState::Grounded),
            (GROUND_Y, VerticalState::Grounded)
        );
    }

    #[test]
    fn test_airborne_accelerates_downward() {
        let (y, state) = PhysicsSystem::step_vertical(
            GROUND_Y,
            VerticalState::Airborne {
                velocity_y: -JUMP_STRENGTH,
            },
        );
        assert_eq!(y, GROUND_Y - JUMP_STRENGTH);
        assert_eq!(state.velocity_y(), -JUMP_STRENGTH + GRAVITY);
    }

    #[test]
    fn test_landing_clamps_to_ground() {
        let (y, state) =
            PhysicsSystem::step_vertical(GROUND_Y - 3, VerticalState::Airborne { velocity_y: 40 });
        assert_eq!(y, GROUND_Y);
        assert_eq!(state, VerticalState::Grounded);
    }

    #[test]
    fn test_distance() {
        let a = Position::new(0, 0);
        let b = Position::new(3, 4);
        assert_eq!(a.distance_to(&b), 5.0);
    }

    #[test]
    fn test_position_serializes_as_pair() {
        let json = serde_json::to_string(&Position::new(100, 318)).unwrap();
        assert_eq!(json, "[100,318]");
    }
}
