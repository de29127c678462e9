//! Connection table: connection identity -> outbound transport handle

use std::collections::HashMap;
use std::net::SocketAddr;

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::debug;
use uuid::Uuid;

/// Lines a connection may have pending before it counts as stalled.
/// Roughly four seconds of two-fighter updates at 30 tps.
pub const OUTBOUND_QUEUE_CAPACITY: usize = 256;

/// Identity of one accepted connection; doubles as the player id
pub type ConnectionId = Uuid;

/// Outbound side of a connection. Lines pushed here are written by the
/// connection's writer task. A closed or full channel means the transport is dead.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    pub id: ConnectionId,
    pub addr: Option<SocketAddr>,
    tx: mpsc::Sender<String>,
}

impl ClientHandle {
    pub fn new(id: ConnectionId, addr: Option<SocketAddr>, tx: mpsc::Sender<String>) -> Self {
        Self { id, addr, tx }
    }

    /// Queue a line for delivery without waiting. Returns false if the
    /// transport is gone or the peer has stopped reading.
    pub fn send_line(&self, line: &str) -> bool {
        match self.tx.try_send(line.to_owned()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                debug!(conn_id = %self.id, "Outbound queue full, peer stalled");
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }
}

/// All live connections
#[derive(Debug, Default)]
pub struct ConnectionTable {
    clients: HashMap<ConnectionId, ClientHandle>,
}

impl ConnectionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, handle: ClientHandle) {
        self.clients.insert(handle.id, handle);
    }

    pub fn remove(&mut self, id: &ConnectionId) -> Option<ClientHandle> {
        self.clients.remove(id)
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.clients.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Send to one connection; false if unknown or dead
    pub fn send_to(&self, id: &ConnectionId, line: &str) -> bool {
        self.clients
            .get(id)
            .map(|client| client.send_line(line))
            .unwrap_or(false)
    }

    /// Send to every connection. Returns the ids whose delivery failed;
    /// a failure never stops delivery to the rest.
    pub fn broadcast(&self, line: &str) -> Vec<ConnectionId> {
        self.clients
            .values()
            .filter(|client| !client.send_line(line))
            .map(|client| client.id)
            .collect()
    }
}
