//! Waiting queue for connections that arrive while both slots are taken

use std::collections::VecDeque;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Player waiting for a slot; has no physics until promoted
#[derive(Debug, Clone)]
pub struct QueuedPlayer {
    pub id: Uuid,
    pub queued_at: Instant,
}

impl QueuedPlayer {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            queued_at: Instant::now(),
        }
    }

    /// How long this player has been waiting
    pub fn wait_time(&self) -> Duration {
        self.queued_at.elapsed()
    }
}

/// Strict first-come FIFO queue
#[derive(Debug, Default)]
pub struct WaitingQueue {
    queue: VecDeque<QueuedPlayer>,
}

impl WaitingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a player to the back. Returns its 1-based place in line.
    pub fn enqueue(&mut self, player: QueuedPlayer) -> usize {
        // Remove if already in queue (rejoin)
        self.queue.retain(|p| p.id != player.id);
        self.queue.push_back(player);
        self.queue.len()
    }

    /// Take the head of the queue
    pub fn pop_front(&mut self) -> Option<QueuedPlayer> {
        self.queue.pop_front()
    }

    /// Remove a player from anywhere in the queue
    pub fn remove(&mut self, id: &Uuid) -> Option<QueuedPlayer> {
        let pos = self.queue.iter().position(|p| &p.id == id)?;
        self.queue.remove(pos)
    }

    /// Get queue length
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Check if queue is empty
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
