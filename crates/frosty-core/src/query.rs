//! Query builder: one parameterized aggregation statement per report.
//!
//! Every statement filters on the half-open analysis window and the
//! excluded-user list. Values never reach the SQL text; they are bound as
//! positional `?N` parameters. [`QuerySpec::preview`] inlines them as quoted
//! literals for logging and for operators auditing what the dashboard runs.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{controls::Controls, report::ReportKind, window::TimeWindow};

/// Operation-type prefixes counted as DDL.
pub const DDL_PREFIXES: &[&str] = &["CREATE", "ALTER", "DROP", "DESCRIBE"];

/// Prefixes for the per-user modification breakdown (no DESCRIBE).
pub const DDL_MODIFICATION_PREFIXES: &[&str] = &["CREATE", "ALTER", "DROP"];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Fully qualified names of the two audit tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditSchema {
    pub login_history: String,
    pub query_history: String,
}

impl AuditSchema {
    /// `schema` must already be validated with [`crate::config::is_identifier`].
    pub fn new(schema: &str) -> Self {
        Self {
            login_history: format!("{schema}.LOGIN_HISTORY"),
            query_history: format!("{schema}.QUERY_HISTORY"),
        }
    }
}

impl Default for AuditSchema {
    fn default() -> Self {
        Self::new("account_usage")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum SqlParam {
    Text(String),
    Int(i64),
    Timestamp(DateTime<Utc>),
}

impl SqlParam {
    /// Timestamps are bound as `YYYY-MM-DD HH:MM:SS.ffffff` text; the
    /// warehouse casts them against the timestamp column.
    pub fn timestamp_text(ts: &DateTime<Utc>) -> String {
        ts.format(TIMESTAMP_FORMAT).to_string()
    }

    /// SQL literal form, with single quotes doubled.
    pub fn to_literal(&self) -> String {
        match self {
            SqlParam::Text(s) => format!("'{}'", s.replace('\'', "''")),
            SqlParam::Int(n) => n.to_string(),
            SqlParam::Timestamp(ts) => format!("'{}'", Self::timestamp_text(ts)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Text,
    Integer,
    Float,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: String,
    pub ty: ColumnType,
}

fn col(name: &str, ty: ColumnType) -> Column {
    Column {
        name: name.to_string(),
        ty,
    }
}

/// One composed statement, alive for a single render pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuerySpec {
    pub kind: ReportKind,
    pub window: TimeWindow,
    pub sql: String,
    pub params: Vec<SqlParam>,
    pub columns: Vec<Column>,
    /// Row cap requested from the warehouse. `None` for trend reports.
    pub limit: Option<u32>,
}

impl QuerySpec {
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// The statement with every `?N` replaced by its literal value.
    pub fn preview(&self) -> String {
        let mut out = String::with_capacity(self.sql.len() + 64);
        let mut chars = self.sql.chars().peekable();
        while let Some(c) = chars.next() {
            if c != '?' {
                out.push(c);
                continue;
            }
            let mut digits = String::new();
            while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
                digits.push(d);
                chars.next();
            }
            let param = digits
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|idx| self.params.get(idx));
            match param {
                Some(p) => out.push_str(&p.to_literal()),
                None => {
                    out.push('?');
                    out.push_str(&digits);
                }
            }
        }
        out
    }
}

/// Accumulates bound values and hands out their `?N` placeholders.
#[derive(Debug, Default)]
struct Params {
    values: Vec<SqlParam>,
}

impl Params {
    fn push(&mut self, value: SqlParam) -> String {
        self.values.push(value);
        format!("?{}", self.values.len())
    }

    fn window(&mut self, column: &str, window: &TimeWindow) -> String {
        let start = self.push(SqlParam::Timestamp(window.start));
        let end = self.push(SqlParam::Timestamp(window.end));
        format!("{column} >= {start}\n  AND {column} < {end}")
    }

    /// `USER_NAME not in (...)`. An empty list binds a single empty string
    /// so the predicate stays valid and excludes nobody.
    fn excluded_users(&mut self, users: &[String]) -> String {
        let placeholders: Vec<String> = if users.is_empty() {
            vec![self.push(SqlParam::Text(String::new()))]
        } else {
            users
                .iter()
                .map(|u| self.push(SqlParam::Text(u.clone())))
                .collect()
        };
        format!("USER_NAME not in ({})", placeholders.join(","))
    }

    /// Case-insensitive prefix match against `prefixes`.
    fn query_type_prefixes(&mut self, prefixes: &[&str]) -> String {
        let clauses: Vec<String> = prefixes
            .iter()
            .map(|p| format!("QUERY_TYPE ILIKE {}", self.push(SqlParam::Text(format!("{p}%")))))
            .collect();
        format!("({})", clauses.join(" OR "))
    }

    fn limit(&mut self, top_n: u32) -> String {
        self.push(SqlParam::Int(i64::from(top_n)))
    }
}

/// Compose the statement for `kind` from the current controls.
///
/// `window` is computed once per render pass by the caller so every report
/// in the pass shares the same bounds.
pub fn build_query(
    kind: ReportKind,
    controls: &Controls,
    window: &TimeWindow,
    schema: &AuditSchema,
) -> QuerySpec {
    let users = controls.excluded_users.as_slice();
    let top_n = controls.top_n;
    match kind {
        ReportKind::TopUsersByLogins => top_users_by_logins(window, users, top_n, schema),
        ReportKind::TopUsersByAvgLogins => {
            top_users_by_avg_logins(window, users, top_n, controls.window_days, schema)
        }
        ReportKind::RecentLogins => recent_logins(window, users, top_n, schema),
        ReportKind::QueryExecutionTrend => query_execution_trend(window, users, schema),
        ReportKind::TopUsersByQueries => top_users_by_queries(window, users, top_n, schema),
        ReportKind::TopQueryPatterns => top_query_patterns(window, users, top_n, schema),
        ReportKind::DdlOperationTrend => ddl_operation_trend(window, users, schema),
        ReportKind::TopDdlOperations => top_ddl_operations(window, users, top_n, schema),
        ReportKind::DdlOperationsByUser => ddl_operations_by_user(window, users, top_n, schema),
    }
}

/// All three statements for the controls' mode, in execution order.
pub fn build_mode_queries(
    controls: &Controls,
    window: &TimeWindow,
    schema: &AuditSchema,
) -> Vec<QuerySpec> {
    controls
        .mode
        .reports()
        .into_iter()
        .map(|kind| build_query(kind, controls, window, schema))
        .collect()
}

fn top_users_by_logins(
    window: &TimeWindow,
    users: &[String],
    top_n: u32,
    schema: &AuditSchema,
) -> QuerySpec {
    let mut p = Params::default();
    let time_filter = p.window("EVENT_TIMESTAMP", window);
    let user_filter = p.excluded_users(users);
    let limit = p.limit(top_n);
    let sql = format!(
        r#"SELECT
    USER_NAME AS "USER",
    COUNT(*) AS "LOGIN_COUNT"
FROM {table}
WHERE {time_filter}
  AND {user_filter}
GROUP BY USER_NAME
ORDER BY COUNT(*) DESC, USER_NAME
LIMIT {limit}"#,
        table = schema.login_history,
    );
    QuerySpec {
        kind: ReportKind::TopUsersByLogins,
        window: *window,
        sql,
        params: p.values,
        columns: vec![
            col("USER", ColumnType::Text),
            col("LOGIN_COUNT", ColumnType::Integer),
        ],
        limit: Some(top_n),
    }
}

fn top_users_by_avg_logins(
    window: &TimeWindow,
    users: &[String],
    top_n: u32,
    window_days: u32,
    schema: &AuditSchema,
) -> QuerySpec {
    let mut p = Params::default();
    let days = p.push(SqlParam::Int(i64::from(window_days.max(1))));
    let time_filter = p.window("EVENT_TIMESTAMP", window);
    let user_filter = p.excluded_users(users);
    let limit = p.limit(top_n);
    let sql = format!(
        r#"SELECT
    USER_NAME AS "USER",
    CAST(COUNT(*) AS DOUBLE) / CAST({days} AS DOUBLE) AS "AVG_LOGIN_COUNT"
FROM {table}
WHERE {time_filter}
  AND {user_filter}
GROUP BY USER_NAME
ORDER BY COUNT(*) DESC, USER_NAME
LIMIT {limit}"#,
        table = schema.login_history,
    );
    QuerySpec {
        kind: ReportKind::TopUsersByAvgLogins,
        window: *window,
        sql,
        params: p.values,
        columns: vec![
            col("USER", ColumnType::Text),
            col("AVG_LOGIN_COUNT", ColumnType::Float),
        ],
        limit: Some(top_n),
    }
}

fn recent_logins(
    window: &TimeWindow,
    users: &[String],
    top_n: u32,
    schema: &AuditSchema,
) -> QuerySpec {
    let mut p = Params::default();
    let time_filter = p.window("EVENT_TIMESTAMP", window);
    let user_filter = p.excluded_users(users);
    let limit = p.limit(top_n);
    let sql = format!(
        r#"SELECT
    USER_NAME AS "USER",
    CAST(EVENT_TIMESTAMP AS VARCHAR) AS "LOGIN_TIME",
    REPORTED_CLIENT_TYPE AS "CLIENT_TYPE"
FROM {table}
WHERE {time_filter}
  AND {user_filter}
ORDER BY EVENT_TIMESTAMP DESC, USER_NAME
LIMIT {limit}"#,
        table = schema.login_history,
    );
    QuerySpec {
        kind: ReportKind::RecentLogins,
        window: *window,
        sql,
        params: p.values,
        columns: vec![
            col("USER", ColumnType::Text),
            col("LOGIN_TIME", ColumnType::Text),
            col("CLIENT_TYPE", ColumnType::Text),
        ],
        limit: Some(top_n),
    }
}

fn query_execution_trend(window: &TimeWindow, users: &[String], schema: &AuditSchema) -> QuerySpec {
    let mut p = Params::default();
    let time_filter = p.window("START_TIME", window);
    let user_filter = p.excluded_users(users);
    let sql = format!(
        r#"SELECT
    CAST(CAST(DATE_TRUNC('day', START_TIME) AS DATE) AS VARCHAR) AS "DAY",
    COUNT(*) AS "QUERY_COUNT"
FROM {table}
WHERE {time_filter}
  AND {user_filter}
GROUP BY 1
ORDER BY 1"#,
        table = schema.query_history,
    );
    QuerySpec {
        kind: ReportKind::QueryExecutionTrend,
        window: *window,
        sql,
        params: p.values,
        columns: vec![
            col("DAY", ColumnType::Text),
            col("QUERY_COUNT", ColumnType::Integer),
        ],
        limit: None,
    }
}

fn top_users_by_queries(
    window: &TimeWindow,
    users: &[String],
    top_n: u32,
    schema: &AuditSchema,
) -> QuerySpec {
    let mut p = Params::default();
    let time_filter = p.window("START_TIME", window);
    let user_filter = p.excluded_users(users);
    let limit = p.limit(top_n);
    let sql = format!(
        r#"SELECT
    USER_NAME AS "USER",
    COUNT(*) AS "QUERY_COUNT"
FROM {table}
WHERE {time_filter}
  AND {user_filter}
GROUP BY USER_NAME
ORDER BY COUNT(*) DESC, USER_NAME
LIMIT {limit}"#,
        table = schema.query_history,
    );
    QuerySpec {
        kind: ReportKind::TopUsersByQueries,
        window: *window,
        sql,
        params: p.values,
        columns: vec![
            col("USER", ColumnType::Text),
            col("QUERY_COUNT", ColumnType::Integer),
        ],
        limit: Some(top_n),
    }
}

fn top_query_patterns(
    window: &TimeWindow,
    users: &[String],
    top_n: u32,
    schema: &AuditSchema,
) -> QuerySpec {
    let mut p = Params::default();
    let time_filter = p.window("START_TIME", window);
    let user_filter = p.excluded_users(users);
    let limit = p.limit(top_n);
    let sql = format!(
        r#"SELECT
    USER_NAME,
    DATABASE_NAME,
    SCHEMA_NAME,
    WAREHOUSE_NAME,
    ROLE_NAME,
    COUNT(*) AS "TOTAL_COUNT"
FROM {table}
WHERE {time_filter}
  AND {user_filter}
GROUP BY
    USER_NAME,
    DATABASE_NAME,
    SCHEMA_NAME,
    WAREHOUSE_NAME,
    ROLE_NAME
ORDER BY COUNT(*) DESC, USER_NAME, DATABASE_NAME, SCHEMA_NAME, WAREHOUSE_NAME, ROLE_NAME
LIMIT {limit}"#,
        table = schema.query_history,
    );
    QuerySpec {
        kind: ReportKind::TopQueryPatterns,
        window: *window,
        sql,
        params: p.values,
        columns: vec![
            col("USER_NAME", ColumnType::Text),
            col("DATABASE_NAME", ColumnType::Text),
            col("SCHEMA_NAME", ColumnType::Text),
            col("WAREHOUSE_NAME", ColumnType::Text),
            col("ROLE_NAME", ColumnType::Text),
            col("TOTAL_COUNT", ColumnType::Integer),
        ],
        limit: Some(top_n),
    }
}

fn ddl_operation_trend(window: &TimeWindow, users: &[String], schema: &AuditSchema) -> QuerySpec {
    let mut p = Params::default();
    let time_filter = p.window("START_TIME", window);
    let ddl_filter = p.query_type_prefixes(DDL_PREFIXES);
    let user_filter = p.excluded_users(users);
    let sql = format!(
        r#"SELECT
    CAST(CAST(DATE_TRUNC('day', START_TIME) AS DATE) AS VARCHAR) AS "DAY",
    QUERY_TYPE,
    COUNT(*) AS "OPERATION_COUNT"
FROM {table}
WHERE {time_filter}
  AND {ddl_filter}
  AND {user_filter}
GROUP BY 1, 2
ORDER BY 1, 2"#,
        table = schema.query_history,
    );
    QuerySpec {
        kind: ReportKind::DdlOperationTrend,
        window: *window,
        sql,
        params: p.values,
        columns: vec![
            col("DAY", ColumnType::Text),
            col("QUERY_TYPE", ColumnType::Text),
            col("OPERATION_COUNT", ColumnType::Integer),
        ],
        limit: None,
    }
}

fn top_ddl_operations(
    window: &TimeWindow,
    users: &[String],
    top_n: u32,
    schema: &AuditSchema,
) -> QuerySpec {
    let mut p = Params::default();
    let time_filter = p.window("START_TIME", window);
    let ddl_filter = p.query_type_prefixes(DDL_PREFIXES);
    let user_filter = p.excluded_users(users);
    let limit = p.limit(top_n);
    let sql = format!(
        r#"SELECT
    DATABASE_NAME,
    SCHEMA_NAME,
    QUERY_TYPE,
    COUNT(*) AS "OPERATION_COUNT"
FROM {table}
WHERE {time_filter}
  AND {ddl_filter}
  AND {user_filter}
GROUP BY
    DATABASE_NAME,
    SCHEMA_NAME,
    QUERY_TYPE
ORDER BY COUNT(*) DESC, DATABASE_NAME, SCHEMA_NAME, QUERY_TYPE
LIMIT {limit}"#,
        table = schema.query_history,
    );
    QuerySpec {
        kind: ReportKind::TopDdlOperations,
        window: *window,
        sql,
        params: p.values,
        columns: vec![
            col("DATABASE_NAME", ColumnType::Text),
            col("SCHEMA_NAME", ColumnType::Text),
            col("QUERY_TYPE", ColumnType::Text),
            col("OPERATION_COUNT", ColumnType::Integer),
        ],
        limit: Some(top_n),
    }
}

fn ddl_operations_by_user(
    window: &TimeWindow,
    users: &[String],
    top_n: u32,
    schema: &AuditSchema,
) -> QuerySpec {
    let mut p = Params::default();
    let time_filter = p.window("START_TIME", window);
    let ddl_filter = p.query_type_prefixes(DDL_MODIFICATION_PREFIXES);
    let user_filter = p.excluded_users(users);
    let limit = p.limit(top_n);
    let sql = format!(
        r#"SELECT
    USER_NAME,
    QUERY_TYPE,
    COUNT(*) AS "OPERATION_COUNT"
FROM {table}
WHERE {time_filter}
  AND {ddl_filter}
  AND {user_filter}
GROUP BY
    USER_NAME,
    QUERY_TYPE
ORDER BY COUNT(*) DESC, USER_NAME, QUERY_TYPE
LIMIT {limit}"#,
        table = schema.query_history,
    );
    QuerySpec {
        kind: ReportKind::DdlOperationsByUser,
        window: *window,
        sql,
        params: p.values,
        columns: vec![
            col("USER_NAME", ColumnType::Text),
            col("QUERY_TYPE", ColumnType::Text),
            col("OPERATION_COUNT", ColumnType::Integer),
        ],
        limit: Some(top_n),
    }
}
