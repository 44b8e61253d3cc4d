//! HTTP API server for jarvis
//!
//! Exposes the chat endpoint backed by the provider gateway and the
//! sessions/messages persistence API backed by SQLite.

pub mod db;
pub mod handlers;
pub mod server;
pub mod state;

pub use server::{router, run_server};
pub use state::AppState;
