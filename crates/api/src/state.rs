use std::sync::Arc;

use coldwatch_core::capability::CapabilityCatalog;
use coldwatch_core::registry::WidgetRegistry;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: coldwatch_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Immutable widget catalog, loaded once at startup.
    pub registry: Arc<WidgetRegistry>,
    /// Sensor-type to capability mapping, loaded once at startup.
    pub capabilities: Arc<CapabilityCatalog>,
}
