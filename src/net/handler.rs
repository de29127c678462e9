//! Per-connection session worker

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::game::MatchState;
use crate::net::codec::{decode_command, encode};
use crate::net::connections::{ClientHandle, ConnectionId, OUTBOUND_QUEUE_CAPACITY};
use crate::net::protocol::CommandResponse;

/// How long queued outbound lines may take to flush after the peer hangs up
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// A single write blocked longer than this means the peer stopped reading
const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Longest accepted command line, excluding the newline
pub const MAX_LINE_BYTES: usize = 4096;

/// Evicts the connection from the match when dropped, on every exit path
struct ConnectionGuard {
    id: ConnectionId,
    game: Arc<Mutex<MatchState>>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.game.lock().disconnect(self.id);
    }
}

/// Handle an accepted TCP connection until it closes
pub async fn handle_connection(stream: TcpStream, addr: SocketAddr, state: AppState) {
    let id = Uuid::new_v4();
    info!(conn_id = %id, %addr, "New connection");

    if let Err(e) = stream.set_nodelay(true) {
        debug!(conn_id = %id, error = %e, "Failed to set TCP_NODELAY");
    }

    let (read_half, write_half) = stream.into_split();
    run_session(id, Some(addr), BufReader::new(read_half), write_half, state).await;

    info!(conn_id = %id, "Connection closed");
}

/// Run a session over any line-oriented transport
pub async fn run_session<R, W>(
    id: ConnectionId,
    addr: Option<SocketAddr>,
    reader: R,
    writer: W,
    state: AppState,
) where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<String>(OUTBOUND_QUEUE_CAPACITY);
    let mut writer_handle = tokio::spawn(write_loop(id, writer, rx));

    let guard = ConnectionGuard {
        id,
        game: state.game.clone(),
    };
    // The connection table owns the only sender; eviction closes the writer
    let assignment = state.game.lock().connect(ClientHandle::new(id, addr, tx));
    debug!(conn_id = %id, ?assignment, "Connection seated");

    let writer_finished = tokio::select! {
        result = read_loop(id, reader, &state) => {
            match result {
                Ok(()) => info!(conn_id = %id, "Client closed the stream"),
                Err(e) => warn!(conn_id = %id, error = %e, "Read failed"),
            }
            false
        }
        _ = &mut writer_handle => {
            debug!(conn_id = %id, "Writer stopped, ending session");
            true
        }
    };

    // Evict before waiting on the writer so the slot frees up immediately
    drop(guard);

    if !writer_finished
        && tokio::time::timeout(WRITER_DRAIN_TIMEOUT, &mut writer_handle)
            .await
            .is_err()
    {
        writer_handle.abort();
    }
}

/// Decode commands line by line and acknowledge each one to this connection only
async fn read_loop<R>(
    id: ConnectionId,
    mut reader: R,
    state: &AppState,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let limit = (MAX_LINE_BYTES + 1) as u64;
        if (&mut reader).take(limit).read_until(b'\n', &mut buf).await? == 0 {
            return Ok(());
        }

        let response = if buf.len() > MAX_LINE_BYTES && buf.last() != Some(&b'\n') {
            warn!(conn_id = %id, limit = MAX_LINE_BYTES, "Rejected oversized command");
            skip_line(&mut reader).await?;
            CommandResponse::error("Message too long")
        } else {
            match std::str::from_utf8(&buf) {
                Ok(text) if text.trim().is_empty() => continue,
                Ok(text) => match decode_command(text) {
                    Ok(cmd) => state.game.lock().handle_command(id, cmd),
                    Err(e) => {
                        warn!(conn_id = %id, error = %e, "Rejected command");
                        CommandResponse::error(e.to_string())
                    }
                },
                Err(_) => {
                    warn!(conn_id = %id, "Rejected non UTF-8 command");
                    CommandResponse::error("Message is not valid UTF-8")
                }
            }
        };

        let line = match encode(&response) {
            Ok(line) => line,
            Err(e) => {
                error!(conn_id = %id, error = %e, "Failed to encode response");
                continue;
            }
        };

        debug!(conn_id = %id, success = response.is_success(), "Command handled");
        // Fails once evicted or stalled
        if !state.game.lock().connections.send_to(&id, &line) {
            return Ok(());
        }
    }
}

/// Discard input up to and including the next newline
async fn skip_line<R>(reader: &mut R) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(());
        }
        match available.iter().position(|&b| b == b'\n') {
            Some(end) => {
                reader.consume(end + 1);
                return Ok(());
            }
            None => {
                let len = available.len();
                reader.consume(len);
            }
        }
    }
}

/// Write queued lines to the transport until the queue closes or a write fails
async fn write_loop<W>(id: ConnectionId, mut writer: W, mut rx: mpsc::Receiver<String>)
where
    W: AsyncWrite + Unpin,
{
    while let Some(mut line) = rx.recv().await {
        line.push('\n');
        match tokio::time::timeout(WRITE_TIMEOUT, writer.write_all(line.as_bytes())).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                debug!(conn_id = %id, error = %e, "Send failed");
                return;
            }
            Err(_) => {
                warn!(conn_id = %id, "Peer stopped reading, dropping connection");
                return;
            }
        }
    }
    let _ = writer.shutdown().await;
}
