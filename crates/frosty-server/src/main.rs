use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use frosty_core::warehouse::Warehouse;
use frosty_duckdb::DuckDbWarehouse;
use frosty_server::{mirror::MirrorSources, state::AppState};

/// `frosty health` - liveness probe for container health checks.
///
/// Calls `GET http://localhost:$FROSTY_PORT/health`.
/// Exits 0 if the server responds with HTTP 200, exits 1 otherwise.
fn run_health_check() -> ! {
    let port = std::env::var("FROSTY_PORT").unwrap_or_else(|_| "3000".to_string());
    let url = format!("http://localhost:{}/health", port);
    match ureq::get(&url).call() {
        Ok(resp) if resp.status() == 200 => std::process::exit(0),
        _ => std::process::exit(1),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.as_str());
    if command == Some("health") {
        run_health_check();
    }

    // Structured JSON logging. Level controlled via RUST_LOG.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("frosty=info".parse()?),
        )
        .json()
        .init();

    let cfg = frosty_core::config::Config::from_env()?;

    if let Some(parent) = std::path::Path::new(&cfg.warehouse_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // The warehouse session lives for the whole process and is shared by
    // every render pass.
    let warehouse = DuckDbWarehouse::open(
        &cfg.warehouse_path,
        &cfg.duckdb_memory_limit,
        &cfg.audit_schema,
    )?;

    // `frosty load --logins <file> --queries <file>` refreshes the mirror and
    // exits. DuckDB allows one writer per file, so run it while the server is
    // stopped, or set FROSTY_MIRROR_LOGINS / FROSTY_MIRROR_QUERIES instead.
    if command == Some("load") {
        MirrorSources::from_args(&args[2..])?
            .load_into(&warehouse)
            .await?;
        return Ok(());
    }

    let startup_sources = MirrorSources {
        logins: cfg.mirror_logins_csv.clone(),
        queries: cfg.mirror_queries_csv.clone(),
    };
    if !startup_sources.is_empty() {
        startup_sources.load_into(&warehouse).await?;
    }

    let schema = warehouse.audit_schema();

    if !std::path::Path::new(&cfg.logo_path).exists() {
        info!(logo_path = %cfg.logo_path, "Logo not found; sidebar shows a text notice");
    }

    let warehouse: Arc<dyn Warehouse> = Arc::new(warehouse);
    let state = Arc::new(AppState::new(warehouse, schema, cfg.clone()));

    let addr = format!("0.0.0.0:{}", cfg.port);
    let app = frosty_server::app::build_app(Arc::clone(&state));

    info!(port = cfg.port, "FrostyTracking listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    Ok(())
}
