use crate::error::CoreError;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// DuckDB file holding the mirrored account-usage tables.
    pub warehouse_path: String,
    /// Schema that qualifies `LOGIN_HISTORY` and `QUERY_HISTORY`.
    pub audit_schema: String,
    pub duckdb_memory_limit: String,
    pub logo_path: String,
    pub cors_origins: Vec<String>,
    /// CSV export of `LOGIN_HISTORY` loaded into the mirror at startup.
    pub mirror_logins_csv: Option<String>,
    /// CSV export of `QUERY_HISTORY` loaded into the mirror at startup.
    pub mirror_queries_csv: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, CoreError> {
        let audit_schema =
            std::env::var("FROSTY_AUDIT_SCHEMA").unwrap_or_else(|_| "account_usage".to_string());
        if !is_identifier(&audit_schema) {
            return Err(CoreError::Config(format!(
                "FROSTY_AUDIT_SCHEMA must be a plain identifier, got {audit_schema:?}"
            )));
        }

        Ok(Self {
            port: std::env::var("FROSTY_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|e| CoreError::Config(format!("invalid port: {e}")))?,
            warehouse_path: std::env::var("FROSTY_WAREHOUSE_PATH")
                .unwrap_or_else(|_| "./data/audit.db".to_string()),
            audit_schema,
            duckdb_memory_limit: std::env::var("FROSTY_DUCKDB_MEMORY")
                .unwrap_or_else(|_| "1GB".to_string()),
            logo_path: std::env::var("FROSTY_LOGO_PATH").unwrap_or_else(|_| "logo.png".to_string()),
            cors_origins: std::env::var("FROSTY_CORS_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            mirror_logins_csv: non_empty_var("FROSTY_MIRROR_LOGINS"),
            mirror_queries_csv: non_empty_var("FROSTY_MIRROR_QUERIES"),
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// The schema name is spliced into SQL text, so only `[A-Za-z0-9_.]` is allowed.
pub fn is_identifier(raw: &str) -> bool {
    !raw.is_empty()
        && raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
        && !raw.starts_with('.')
        && !raw.ends_with('.')
}
