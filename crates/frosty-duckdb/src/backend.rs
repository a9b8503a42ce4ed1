use std::{path::Path, sync::Arc};

use anyhow::{anyhow, bail, Context, Result};
use duckdb::Connection;
use tokio::sync::Mutex;
use tracing::info;

use frosty_core::{
    audit::{LoginEvent, QueryEvent},
    config::is_identifier,
    query::{AuditSchema, SqlParam},
};

use crate::schema::init_sql;

/// A DuckDB-backed warehouse holding a mirror of the account-usage tables.
///
/// The connection is the process-wide warehouse session: opened once in
/// `main`, then shared by every render pass. It is wrapped in
/// `Arc<Mutex<_>>` so statements from concurrent requests run one at a time.
///
/// Memory and thread limits are enforced by [`init_sql`] at open time.
pub struct DuckDbWarehouse {
    pub(crate) conn: Arc<Mutex<Connection>>,
    schema: String,
}

impl DuckDbWarehouse {
    /// Open (or create) the mirror at `path`.
    ///
    /// `memory_limit` is a DuckDB size string such as `"1GB"` or `"512MB"`.
    /// The audit tables are created under `schema` if they do not exist yet.
    pub fn open(path: &str, memory_limit: &str, schema: &str) -> Result<Self> {
        check_schema(schema)?;
        let conn = Connection::open(path)?;
        conn.execute_batch(&init_sql(memory_limit, schema))?;
        info!(
            "DuckDB warehouse opened at {} with memory_limit={}, schema={}",
            path, memory_limit, schema
        );
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            schema: schema.to_string(),
        })
    }

    /// Open an **in-memory** mirror under the default `account_usage` schema.
    ///
    /// Intended for tests; data is discarded when the struct is dropped.
    pub fn open_in_memory() -> Result<Self> {
        let schema = "account_usage";
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(&init_sql("1GB", schema))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            schema: schema.to_string(),
        })
    }

    /// Table names the query builder should target for this mirror.
    pub fn audit_schema(&self) -> AuditSchema {
        AuditSchema::new(&self.schema)
    }

    /// Load login events into the mirror in a single transaction.
    ///
    /// Returns immediately (no-op) if `events` is empty.
    pub async fn insert_login_events(&self, events: &[LoginEvent]) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }

        let sql = format!(
            "INSERT INTO {}.LOGIN_HISTORY \
             (EVENT_TIMESTAMP, USER_NAME, REPORTED_CLIENT_TYPE) \
             VALUES (?1, ?2, ?3)",
            self.schema
        );

        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        for event in events {
            tx.execute(
                &sql,
                duckdb::params![
                    SqlParam::timestamp_text(&event.event_timestamp),
                    event.user_name,
                    event.reported_client_type,
                ],
            )?;
        }
        tx.commit()?;
        info!("Loaded {} login events into mirror", events.len());
        Ok(())
    }

    /// Load query events into the mirror in a single transaction.
    pub async fn insert_query_events(&self, events: &[QueryEvent]) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }

        let sql = format!(
            "INSERT INTO {}.QUERY_HISTORY \
             (QUERY_ID, QUERY_TYPE, USER_NAME, ROLE_NAME, WAREHOUSE_NAME, \
              DATABASE_NAME, SCHEMA_NAME, START_TIME) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            self.schema
        );

        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        for event in events {
            tx.execute(
                &sql,
                duckdb::params![
                    event.query_id,
                    event.query_type,
                    event.user_name,
                    event.role_name,
                    event.warehouse_name,
                    event.database_name,
                    event.schema_name,
                    SqlParam::timestamp_text(&event.start_time),
                ],
            )?;
        }
        tx.commit()?;
        info!("Loaded {} query events into mirror", events.len());
        Ok(())
    }

    /// Replace the mirrored `LOGIN_HISTORY` with the rows of a CSV export.
    ///
    /// The file needs a header row naming `EVENT_TIMESTAMP`, `USER_NAME` and
    /// `REPORTED_CLIENT_TYPE`; other columns are ignored. Delete and insert run
    /// in one transaction, so a bad file leaves the previous mirror intact.
    /// Returns the number of rows loaded.
    pub async fn load_login_csv(&self, path: &Path) -> Result<usize> {
        let sql = format!(
            "INSERT INTO {}.LOGIN_HISTORY (EVENT_TIMESTAMP, USER_NAME, REPORTED_CLIENT_TYPE) \
             SELECT CAST(EVENT_TIMESTAMP AS TIMESTAMP), CAST(USER_NAME AS VARCHAR), \
                    CAST(REPORTED_CLIENT_TYPE AS VARCHAR) \
             FROM {}",
            self.schema,
            csv_source(path)?
        );
        self.replace_table("LOGIN_HISTORY", &sql, path).await
    }

    /// Replace the mirrored `QUERY_HISTORY` with the rows of a CSV export.
    ///
    /// Required header columns: `QUERY_ID`, `QUERY_TYPE`, `USER_NAME`,
    /// `ROLE_NAME`, `WAREHOUSE_NAME`, `DATABASE_NAME`, `SCHEMA_NAME`,
    /// `START_TIME`.
    pub async fn load_query_csv(&self, path: &Path) -> Result<usize> {
        let sql = format!(
            "INSERT INTO {}.QUERY_HISTORY \
             (QUERY_ID, QUERY_TYPE, USER_NAME, ROLE_NAME, WAREHOUSE_NAME, \
              DATABASE_NAME, SCHEMA_NAME, START_TIME) \
             SELECT CAST(QUERY_ID AS VARCHAR), CAST(QUERY_TYPE AS VARCHAR), \
                    CAST(USER_NAME AS VARCHAR), CAST(ROLE_NAME AS VARCHAR), \
                    CAST(WAREHOUSE_NAME AS VARCHAR), CAST(DATABASE_NAME AS VARCHAR), \
                    CAST(SCHEMA_NAME AS VARCHAR), CAST(START_TIME AS TIMESTAMP) \
             FROM {}",
            self.schema,
            csv_source(path)?
        );
        self.replace_table("QUERY_HISTORY", &sql, path).await
    }

    async fn replace_table(&self, table: &str, insert_sql: &str, path: &Path) -> Result<usize> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        tx.execute(
            &format!("DELETE FROM {}.{table}", self.schema),
            duckdb::params![],
        )?;
        let loaded = tx
            .execute(insert_sql, duckdb::params![])
            .with_context(|| format!("loading {} into {table}", path.display()))?;
        tx.commit()?;
        info!(table, rows = loaded, source = %path.display(), "Mirror table refreshed");
        Ok(loaded)
    }

    /// Execute `SELECT 1` as a lightweight liveness check.
    pub async fn ping(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute_batch("SELECT 1")?;
        Ok(())
    }

    /// Acquire the DuckDB connection lock for direct queries.
    ///
    /// Intended for integration tests that need to verify stored data.
    pub async fn conn_for_test(&self) -> tokio::sync::MutexGuard<'_, Connection> {
        self.conn.lock().await
    }
}

/// `read_csv_auto` over `path`. Table functions take no bound parameters,
/// so the path is inlined as a quoted literal.
fn csv_source(path: &Path) -> Result<String> {
    let path = path
        .to_str()
        .ok_or_else(|| anyhow!("CSV path is not valid UTF-8: {}", path.display()))?;
    Ok(format!(
        "read_csv_auto({}, header = true)",
        SqlParam::Text(path.to_string()).to_literal()
    ))
}

/// The mirror creates the schema itself, so it must be a single identifier.
fn check_schema(schema: &str) -> Result<()> {
    if !is_identifier(schema) || schema.contains('.') {
        bail!("DuckDB audit schema must be a single identifier, got {schema:?}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotted_schema_is_rejected() {
        assert!(check_schema("account_usage").is_ok());
        assert!(check_schema("SNOWFLAKE.ACCOUNT_USAGE").is_err());
        assert!(check_schema("x;y").is_err());
    }

    #[test]
    fn csv_source_quotes_path() {
        let src = csv_source(Path::new("/tmp/o'brien.csv")).expect("utf8 path");
        assert_eq!(src, "read_csv_auto('/tmp/o''brien.csv', header = true)");
    }

    #[tokio::test]
    async fn open_in_memory_is_pingable() {
        let db = DuckDbWarehouse::open_in_memory().expect("in-memory DuckDB");
        db.ping().await.expect("ping");
        assert_eq!(
            db.audit_schema().login_history,
            "account_usage.LOGIN_HISTORY"
        );
    }
}
