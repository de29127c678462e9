//! Time utilities for the simulation loop

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Default simulation rate
pub const SIMULATION_TPS: u32 = 30; // 30 ticks per second

/// Upper bound accepted from configuration
pub const MAX_SIMULATION_TPS: u32 = 240;

/// Get current Unix timestamp in milliseconds
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

/// Wall-clock length of one tick at the given rate
pub fn tick_duration(ticks_per_second: u32) -> Duration {
    Duration::from_micros(1_000_000 / u64::from(ticks_per_second.max(1)))
}
