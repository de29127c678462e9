//! Application state shared across connection workers and the tick loop

use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::Config;
use crate::game::{GameMatch, MatchState};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Roster, waiting queue and connection table behind one lock
    pub game: Arc<Mutex<MatchState>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let game = Arc::new(Mutex::new(MatchState::new(config.tick_rate)));
        Self {
            config: Arc::new(config),
            game,
        }
    }

    /// Tick driver bound to this state
    pub fn game_match(&self) -> GameMatch {
        GameMatch::new(self.game.clone(), self.config.tick_rate)
    }
}
