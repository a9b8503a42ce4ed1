//! Rows of the account-usage audit tables.
//!
//! The tables are owned by the warehouse; these types exist so a local
//! mirror can be loaded and so tests can build fixtures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of `LOGIN_HISTORY`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginEvent {
    pub user_name: String,
    pub event_timestamp: DateTime<Utc>,
    pub reported_client_type: Option<String>,
}

/// One row of `QUERY_HISTORY`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryEvent {
    pub query_id: String,
    pub user_name: String,
    pub database_name: Option<String>,
    pub schema_name: Option<String>,
    pub warehouse_name: Option<String>,
    pub role_name: Option<String>,
    pub query_type: String,
    pub start_time: DateTime<Utc>,
}
