//! Match state and authoritative tick loop

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::matchmaking::{QueuedPlayer, WaitingQueue};
use crate::net::codec::encode;
use crate::net::connections::{ClientHandle, ConnectionId, ConnectionTable};
use crate::net::protocol::{ClientMsg, CommandResponse, ServerMsg};
use crate::util::time::{tick_duration, unix_millis};

use super::roster::{Roster, Slot};
use super::snapshot::SnapshotBuilder;

/// Where a new connection ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    Slot(Slot),
    /// 1-based place in the waiting queue
    Queued(usize),
}

/// Command rejected against the current match state
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Player not found")]
    PlayerNotFound,

    #[error("Target not found")]
    TargetNotFound,

    #[error("You're not an active player")]
    NotActivePlayer,
}

/// Everything shared between connection workers and the tick loop.
/// Always accessed through one mutex; no method blocks or awaits.
pub struct MatchState {
    pub roster: Roster,
    pub queue: WaitingQueue,
    pub connections: ConnectionTable,
    pub tick: u64,
    tick_rate: u32,
}

impl MatchState {
    pub fn new(tick_rate: u32) -> Self {
        Self {
            roster: Roster::new(),
            queue: WaitingQueue::new(),
            connections: ConnectionTable::new(),
            tick: 0,
            tick_rate,
        }
    }

    /// Register a new connection, seat it, and announce the roster to everyone
    pub fn connect(&mut self, handle: ClientHandle) -> Assignment {
        let id = handle.id;
        let addr = handle.addr;
        self.connections.insert(handle);

        let welcome = ServerMsg::Welcome {
            id,
            server_time: unix_millis(),
            tick_rate: self.tick_rate,
        };
        if let Ok(line) = encode(&welcome) {
            self.connections.send_to(&id, &line);
        }

        let assignment = match self.roster.first_empty() {
            Some(slot) => {
                self.roster.place(slot, id);
                info!(
                    conn_id = %id,
                    ?addr,
                    slot = slot.index(),
                    fighters = self.roster.occupied(),
                    online = self.connections.len(),
                    "Player took slot"
                );
                Assignment::Slot(slot)
            }
            None => {
                let place = self.queue.enqueue(QueuedPlayer::new(id));
                info!(conn_id = %id, ?addr, place, "Both slots taken, player queued");
                Assignment::Queued(place)
            }
        };

        self.announce_roster();
        assignment
    }

    /// Connection closed or errored
    pub fn disconnect(&mut self, id: ConnectionId) {
        if !self.connections.contains(&id) {
            debug!(conn_id = %id, "Connection already evicted");
            return;
        }
        self.evict_all(vec![id]);
    }

    /// Apply one decoded command from `id` and produce its acknowledgement
    pub fn handle_command(&mut self, id: ConnectionId, cmd: ClientMsg) -> CommandResponse {
        let action = cmd.action();
        match self.apply_command(id, cmd) {
            Ok(response) => response,
            Err(e) => {
                debug!(conn_id = %id, action, error = %e, "Command rejected");
                CommandResponse::error(e.to_string())
            }
        }
    }

    fn apply_command(
        &mut self,
        id: ConnectionId,
        cmd: ClientMsg,
    ) -> Result<CommandResponse, CommandError> {
        match cmd {
            ClientMsg::StartMoving { direction } => {
                let player = self
                    .roster
                    .player_mut(&id)
                    .ok_or(CommandError::PlayerNotFound)?;
                if player.movement_direction() == Some(direction) {
                    debug!(conn_id = %id, %direction, "Already moving");
                }
                player.start_moving(direction);
                Ok(CommandResponse::success(format!("Started moving {}", direction))
                    .with_action("start_moving"))
            }
            ClientMsg::StopMoving { direction } => {
                let player = self
                    .roster
                    .player_mut(&id)
                    .ok_or(CommandError::PlayerNotFound)?;
                if !player.is_moving() {
                    debug!(conn_id = %id, "Already stopped");
                }
                player.stop_moving();
                Ok(CommandResponse::success(format!("Stopped moving {}", direction))
                    .with_action("stop_moving"))
            }
            ClientMsg::Jump => {
                let player = self
                    .roster
                    .player_mut(&id)
                    .ok_or(CommandError::PlayerNotFound)?;
                if !player.jump() {
                    debug!(
                        conn_id = %id,
                        velocity_y = player.velocity_y(),
                        "Jump ignored while airborne"
                    );
                }
                Ok(CommandResponse::success("Jumped"))
            }
            ClientMsg::Attack { kind } => self.attack(id, kind),
            ClientMsg::Restart => {
                if self.roster.slot_of(&id).is_none() {
                    return Err(CommandError::NotActivePlayer);
                }
                self.roster.reset_all();
                info!(conn_id = %id, "Match restarted");
                self.announce_roster();
                Ok(CommandResponse::success("Game restarting"))
            }
        }
    }

    fn attack(&mut self, id: ConnectionId, kind: String) -> Result<CommandResponse, CommandError> {
        let slot = self
            .roster
            .slot_of(&id)
            .ok_or(CommandError::PlayerNotFound)?;
        let (target, outcome) = self
            .roster
            .attack_from(slot)
            .ok_or(CommandError::TargetNotFound)?;

        debug!(conn_id = %id, %target, kind = %kind, health = outcome.target_health, "Attack landed");
        self.broadcast(&ServerMsg::Attacked {
            attacker: id,
            target,
            kind,
            target_health: outcome.target_health,
        });

        if outcome.defeated {
            self.handle_victory(id, target);
        }

        Ok(CommandResponse::success(format!("Attacked player {}", target))
            .with_target_health(outcome.target_health))
    }

    /// Announce the result; with players waiting, the loser yields its slot
    /// to the head of the queue and goes to the back.
    fn handle_victory(&mut self, winner: Uuid, loser: Uuid) {
        info!(%winner, %loser, "Player wins");
        self.broadcast(&ServerMsg::MatchOver { winner, loser });

        // The broadcast may have evicted either fighter
        let (Some(winner_slot), Some(loser_slot)) =
            (self.roster.slot_of(&winner), self.roster.slot_of(&loser))
        else {
            return;
        };

        if self.queue.is_empty() {
            info!("No players waiting, fighters can restart the match");
            return;
        }

        self.roster.vacate(loser_slot);
        self.queue.enqueue(QueuedPlayer::new(loser));
        let Some(next) = self.queue.pop_front() else {
            return;
        };
        self.roster.place(loser_slot, next.id);
        if let Some(champion) = self.roster.get_mut(winner_slot) {
            champion.reset();
        }
        info!(
            promoted = %next.id,
            slot = loser_slot.index(),
            waited_ms = next.wait_time().as_millis() as u64,
            "Challenger promoted"
        );
        self.announce_roster();
    }

    /// One simulation step: integrate every fighter, then flush significant moves
    pub fn run_tick(&mut self) {
        self.tick += 1;

        for player in self.roster.players_mut() {
            player.tick();
        }

        for slot in Slot::ALL {
            let (id, position, update) = match self.roster.get(slot) {
                Some(player) if player.has_significant_change() => (
                    player.id,
                    player.position,
                    SnapshotBuilder::position_update(player),
                ),
                _ => continue,
            };

            if !self.broadcast(&update) {
                // Evictions re-announced the roster; baseline handled there
                continue;
            }

            if let Some(player) = self.roster.get_mut(slot).filter(|p| p.id == id) {
                player.last_broadcast_position = position;
            }
        }
    }

    /// Send to every connection, evicting any that fail.
    /// Returns true if every transport accepted the message.
    fn broadcast(&mut self, msg: &ServerMsg) -> bool {
        if self.connections.is_empty() {
            return true;
        }

        let line = match encode(msg) {
            Ok(line) => line,
            Err(e) => {
                error!(error = %e, "Failed to encode broadcast");
                return false;
            }
        };

        let failed = self.connections.broadcast(&line);
        let delivered = failed.is_empty();
        self.evict_all(failed);
        delivered
    }

    fn announce_roster(&mut self) {
        let snapshot = SnapshotBuilder::roster(&self.roster, self.queue.len());
        self.broadcast(&snapshot);
        self.roster.mark_all_broadcast();
    }

    /// Evict each connection, promoting from the queue and telling the
    /// survivors. Failures while telling them are evicted in turn.
    fn evict_all(&mut self, mut pending: Vec<ConnectionId>) {
        while let Some(id) = pending.pop() {
            let Some(left) = self.remove_connection(id) else {
                continue;
            };

            let snapshot = SnapshotBuilder::roster(&self.roster, self.queue.len());
            for msg in [left, snapshot] {
                match encode(&msg) {
                    Ok(line) => pending.extend(self.connections.broadcast(&line)),
                    Err(e) => error!(error = %e, "Failed to encode eviction notice"),
                }
            }
            self.roster.mark_all_broadcast();
        }
    }

    /// Drop a connection from the table, queue and roster.
    /// Returns the departure notice, or None if it was already gone.
    fn remove_connection(&mut self, id: ConnectionId) -> Option<ServerMsg> {
        let had_connection = self.connections.remove(&id).is_some();

        if self.queue.remove(&id).is_some() {
            info!(conn_id = %id, "Queued player left");
            return Some(ServerMsg::PlayerLeft { id, slot: None });
        }

        let Some(slot) = self.roster.slot_of(&id) else {
            return had_connection.then_some(ServerMsg::PlayerLeft { id, slot: None });
        };

        self.roster.vacate(slot);
        match self.queue.pop_front() {
            Some(next) => {
                self.roster.place(slot, next.id);
                info!(
                    conn_id = %id,
                    promoted = %next.id,
                    slot = slot.index(),
                    waited_ms = next.wait_time().as_millis() as u64,
                    "Player evicted, queued player promoted"
                );
            }
            None => {
                info!(conn_id = %id, slot = slot.index(), "Player evicted, slot now empty");
            }
        }

        Some(ServerMsg::PlayerLeft {
            id,
            slot: Some(slot.index()),
        })
    }
}

/// Drives the fixed-rate simulation for the lifetime of the process
pub struct GameMatch {
    state: Arc<Mutex<MatchState>>,
    tick_rate: u32,
}

impl GameMatch {
    pub fn new(state: Arc<Mutex<MatchState>>, tick_rate: u32) -> Self {
        Self { state, tick_rate }
    }

    /// Run the authoritative tick loop
    pub async fn run(self) {
        let tick_duration = tick_duration(self.tick_rate);
        let mut tick_interval = interval(tick_duration);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(tick_rate = self.tick_rate, "Simulation loop started");

        loop {
            tick_interval.tick().await;

            let started = Instant::now();
            let tick = {
                let mut state = self.state.lock();
                state.run_tick();
                state.tick
            };

            let elapsed = started.elapsed();
            if elapsed > tick_duration {
                warn!(tick, elapsed_us = elapsed.as_micros() as u64, "Tick overran its budget");
            }
        }
    }
}
