//! Shared state for the HTTP handlers

use jarvis_providers::ProviderGateway;
use sqlx::SqlitePool;
use std::sync::Arc;

/// Application state passed to every handler. The gateway is built once
/// at startup and injected here rather than living in module globals.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub gateway: Arc<ProviderGateway>,
}

impl AppState {
    pub fn new(pool: SqlitePool, gateway: Arc<ProviderGateway>) -> Self {
        Self { pool, gateway }
    }
}
