/// DuckDB initialization SQL for the audit-log mirror.
///
/// Executed once at open time via `Connection::execute_batch`. Every
/// statement uses `IF NOT EXISTS`, so opening an already-populated mirror is
/// a no-op and an empty file still yields a queryable (empty) dashboard.
///
/// The tables carry the account-usage columns the reports read, named with
/// the warehouse's upper-case identifiers. `QUERY_ID` is the only
/// extra column, kept so a mirrored row can be traced back to its source.
///
/// `schema` must be a single undotted identifier; the backend checks this
/// before calling.
pub fn init_sql(memory_limit: &str, schema: &str) -> String {
    format!(
        r#"SET memory_limit = '{memory_limit}';
SET threads = 2;

CREATE SCHEMA IF NOT EXISTS {schema};

-- ===========================================
-- LOGIN_HISTORY
-- ===========================================
CREATE TABLE IF NOT EXISTS {schema}.LOGIN_HISTORY (
    EVENT_TIMESTAMP         TIMESTAMP NOT NULL,
    USER_NAME               VARCHAR NOT NULL,
    REPORTED_CLIENT_TYPE    VARCHAR
);

CREATE INDEX IF NOT EXISTS idx_login_history_ts
    ON {schema}.LOGIN_HISTORY(EVENT_TIMESTAMP);

-- ===========================================
-- QUERY_HISTORY
-- ===========================================
CREATE TABLE IF NOT EXISTS {schema}.QUERY_HISTORY (
    QUERY_ID                VARCHAR,
    QUERY_TYPE              VARCHAR NOT NULL,
    USER_NAME               VARCHAR NOT NULL,
    ROLE_NAME               VARCHAR,
    WAREHOUSE_NAME          VARCHAR,
    DATABASE_NAME           VARCHAR,
    SCHEMA_NAME             VARCHAR,
    START_TIME              TIMESTAMP NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_query_history_start
    ON {schema}.QUERY_HISTORY(START_TIME);
"#
    )
}
