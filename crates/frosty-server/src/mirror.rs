use std::path::Path;

use anyhow::{bail, Result};
use tracing::info;

use frosty_duckdb::DuckDbWarehouse;

/// CSV exports to load into the mirror, one per audit table.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MirrorSources {
    pub logins: Option<String>,
    pub queries: Option<String>,
}

impl MirrorSources {
    /// Parse the arguments after `frosty load`:
    /// `--logins <file>` and/or `--queries <file>`.
    pub fn from_args(args: &[String]) -> Result<Self> {
        let mut sources = Self::default();
        let mut iter = args.iter();
        while let Some(flag) = iter.next() {
            let slot = match flag.as_str() {
                "--logins" => &mut sources.logins,
                "--queries" => &mut sources.queries,
                other => bail!("unknown argument {other:?}; expected --logins or --queries"),
            };
            match iter.next() {
                Some(path) => *slot = Some(path.clone()),
                None => bail!("{flag} needs a file path"),
            }
        }
        if sources.is_empty() {
            bail!("usage: frosty load [--logins <file>] [--queries <file>]");
        }
        Ok(sources)
    }

    pub fn is_empty(&self) -> bool {
        self.logins.is_none() && self.queries.is_none()
    }

    /// Replace each named mirror table with the rows of its CSV export.
    pub async fn load_into(&self, warehouse: &DuckDbWarehouse) -> Result<()> {
        if let Some(path) = &self.logins {
            let rows = warehouse.load_login_csv(Path::new(path)).await?;
            info!(rows, source = %path, "Login history mirrored");
        }
        if let Some(path) = &self.queries {
            let rows = warehouse.load_query_csv(Path::new(path)).await?;
            info!(rows, source = %path, "Query history mirrored");
        }
        Ok(())
    }
}
