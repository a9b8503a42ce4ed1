use std::sync::Arc;

use axum::{http::HeaderValue, routing::get, Router};
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{routes, state::AppState};

/// Construct the Axum [`Router`] with all routes and middleware attached.
///
/// Middleware is applied in outer-to-inner order:
///
/// 1. `TraceLayer` - structured request/response logging via `tracing`.
/// 2. `CorsLayer` - any origin unless `FROSTY_CORS_ORIGINS` lists some.
/// 3. `CompressionLayer` - gzip for the page and the JSON payloads.
pub fn build_app(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/", get(routes::dashboard::index))
        .route("/health", get(routes::health::health))
        .route("/logo", get(routes::logo::get_logo))
        .route("/api/dashboard", get(routes::dashboard::get_dashboard))
        .route("/api/reports/{kind}", get(routes::reports::get_report))
        .route("/api/reports/{kind}/sql", get(routes::reports::get_report_sql))
        .route(
            "/api/reports/{kind}/export",
            get(routes::reports::export_report),
        )
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if allowed.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(allowed))
    }
}
