//! TCP transport: line codec, connection table and session workers

pub mod codec;
pub mod connections;
pub mod handler;
pub mod listener;
pub mod protocol;

pub use listener::serve;
