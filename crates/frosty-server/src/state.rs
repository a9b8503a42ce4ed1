use std::sync::Arc;

use frosty_core::{config::Config, query::AuditSchema, warehouse::Warehouse};

/// Shared application state injected into every Axum handler via
/// [`axum::extract::State`].
///
/// Holds the warehouse session explicitly: it is opened once in `main`,
/// reused by every render pass, and dropped at process exit.
pub struct AppState {
    pub warehouse: Arc<dyn Warehouse>,

    /// Fully qualified audit table names the query builder targets.
    pub schema: AuditSchema,

    /// Parsed configuration, loaded once at startup from environment variables.
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(warehouse: Arc<dyn Warehouse>, schema: AuditSchema, config: Config) -> Self {
        Self {
            warehouse,
            schema,
            config: Arc::new(config),
        }
    }
}
