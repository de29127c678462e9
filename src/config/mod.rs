//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;

use crate::util::time::{MAX_SIMULATION_TPS, SIMULATION_TPS};

/// Port the game has always listened on
pub const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:9999";

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Simulation ticks per second
    pub tick_rate: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // PORT wins over SERVER_ADDR
        let server_addr = match lookup("PORT") {
            Some(port) => format!("0.0.0.0:{}", port),
            None => lookup("SERVER_ADDR").unwrap_or_else(|| DEFAULT_SERVER_ADDR.to_string()),
        };

        let tick_rate = match lookup("TICK_RATE") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|tps| (1..=MAX_SIMULATION_TPS).contains(tps))
                .ok_or(ConfigError::InvalidTickRate(raw))?,
            None => SIMULATION_TPS,
        };

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress(server_addr.clone()))?,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            tick_rate,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: SocketAddr::from(([0, 0, 0, 0], 9999)),
            log_level: "info".to_string(),
            tick_rate: SIMULATION_TPS,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid server address format: {0}")]
    InvalidAddress(String),

    #[error("Invalid tick rate: {0:?}")]
    InvalidTickRate(String),
}
