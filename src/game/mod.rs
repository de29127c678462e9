//! Game simulation modules

pub mod combat;
pub mod r#match;
pub mod physics;
pub mod player;
pub mod roster;
pub mod snapshot;

pub use r#match::{GameMatch, MatchState};
