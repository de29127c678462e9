//! TCP accept loop

use std::time::Duration;

use tokio::net::TcpListener;
use tracing::{error, info};

use crate::app::AppState;
use crate::net::handler::handle_connection;

/// Back-off after a failed accept, e.g. when the process is out of descriptors
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Accept connections forever, one session task per client
pub async fn serve(listener: TcpListener, state: AppState) -> anyhow::Result<()> {
    info!(addr = %listener.local_addr()?, "Accepting connections");

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                tokio::spawn(handle_connection(stream, addr, state.clone()));
            }
            Err(e) => {
                error!(error = %e, "Failed to accept connection");
                tokio::time::sleep(ACCEPT_BACKOFF).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use serde_json::Value;
    use std::net::SocketAddr;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
    use tokio::net::tcp::OwnedReadHalf;
    use tokio::net::TcpStream;

    const READ_TIMEOUT: Duration = Duration::from_secs(3);

    struct TestPeer {
        lines: Lines<BufReader<OwnedReadHalf>>,
        writer: tokio::net::tcp::OwnedWriteHalf,
    }

    impl TestPeer {
        async fn connect(addr: SocketAddr) -> Self {
            let stream = TcpStream::connect(addr).await.unwrap();
            let (read_half, writer) = stream.into_split();
            Self {
                lines: BufReader::new(read_half).lines(),
                writer,
            }
        }

        async fn send(&mut self, line: &str) {
            self.writer.write_all(line.as_bytes()).await.unwrap();
            self.writer.write_all(b"\n").await.unwrap();
        }

        async fn next(&mut self) -> Value {
            let line = tokio::time::timeout(READ_TIMEOUT, self.lines.next_line())
                .await
                .expect("timed out waiting for a message")
                .unwrap()
                .expect("connection closed");
            serde_json::from_str(&line).unwrap()
        }

        /// Skip messages until one matches
        async fn next_where(&mut self, pred: impl Fn(&Value) -> bool) -> Value {
            loop {
                let msg = self.next().await;
                if pred(&msg) {
                    return msg;
                }
            }
        }
    }

    async fn start_server(with_ticks: bool) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = AppState::new(Config::default());
        if with_ticks {
            tokio::spawn(state.game_match().run());
        }
        tokio::spawn(serve(listener, state));
        addr
    }

    #[tokio::test]
    async fn test_lone_client_gets_first_slot() {
        let addr = start_server(false).await;
        let mut peer = TestPeer::connect(addr).await;

        let welcome = peer.next().await;
        assert_eq!(welcome["action"], "welcome");
        assert_eq!(welcome["tick_rate"], 30);

        let init = peer.next().await;
        assert_eq!(init["action"], "initialize");
        assert_eq!(init["players"][0]["id"], welcome["id"]);
        assert_eq!(init["players"][0]["position"], serde_json::json!([100, 318]));
        assert_eq!(init["players"][0]["health"], 100);
        assert!(init["players"][1].is_null());
    }

    #[tokio::test]
    async fn test_malformed_command_gets_error_reply() {
        let addr = start_server(false).await;
        let mut peer = TestPeer::connect(addr).await;
        peer.next_where(|m| m["action"] == "initialize").await;

        peer.send("{broken").await;
        let reply = peer.next_where(|m| m.get("status").is_some()).await;
        assert_eq!(reply["status"], "error");

        peer.send(r#"{"action":"jump"}"#).await;
        let reply = peer.next_where(|m| m.get("status").is_some()).await;
        assert_eq!(reply["status"], "success");
        assert_eq!(reply["message"], "Jumped");
    }

    #[tokio::test]
    async fn test_opponent_sees_jump_and_departure() {
        let addr = start_server(true).await;

        let mut first = TestPeer::connect(addr).await;
        let first_id = first.next().await["id"].clone();
        first.next_where(|m| m["action"] == "initialize").await;

        let mut second = TestPeer::connect(addr).await;
        second.next_where(|m| m["action"] == "welcome").await;
        let init = second
            .next_where(|m| m["action"] == "initialize" && !m["players"][1].is_null())
            .await;
        assert_eq!(init["players"][0]["id"], first_id);
        assert_eq!(init["players"][1]["position"], serde_json::json!([500, 318]));

        first.send(r#"{"action":"jump"}"#).await;

        let airborne = second
            .next_where(|m| m["action"] == "update_position" && m["id"] == first_id)
            .await;
        assert!(airborne["position"][1].as_i64().unwrap() < 318);
        second
            .next_where(|m| {
                m["action"] == "update_position"
                    && m["id"] == first_id
                    && m["position"][1] == 318
            })
            .await;

        drop(first);
        let left = second.next_where(|m| m["action"] == "player_left").await;
        assert_eq!(left["id"], first_id);
        assert_eq!(left["slot"], 0);
        let init = second.next_where(|m| m["action"] == "initialize").await;
        assert!(init["players"][0].is_null());
    }
}
