//! First-come waiting line for the two fighter slots

pub mod queue;

pub use queue::{QueuedPlayer, WaitingQueue};
