//! Snapshot building and delta suppression

use crate::net::protocol::ServerMsg;

use super::physics::Position;
use super::player::Player;
use super::roster::Roster;

/// Movement at or below this distance is not worth a broadcast
pub const SIGNIFICANCE_THRESHOLD: f64 = 1.0;

/// Whether `current` has drifted far enough from `baseline` to report
pub fn is_significant_change(current: &Position, baseline: &Position) -> bool {
    current.distance_to(baseline) > SIGNIFICANCE_THRESHOLD
}

/// Builds outbound state messages
pub struct SnapshotBuilder;

impl SnapshotBuilder {
    /// Full roster snapshot
    pub fn roster(roster: &Roster, queue_len: usize) -> ServerMsg {
        ServerMsg::Initialize {
            players: roster.entries(),
            queue_len,
        }
    }

    /// Position delta for one fighter
    pub fn position_update(player: &Player) -> ServerMsg {
        ServerMsg::UpdatePosition {
            slot: player.slot.index(),
            id: player.id,
            position: player.position,
        }
    }
}
