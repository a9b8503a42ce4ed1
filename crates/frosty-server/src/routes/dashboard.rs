use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::{Html, IntoResponse},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use frosty_core::{controls::Controls, report::Mode, window::TimeWindow};

use crate::{error::AppError, render::render_dashboard, state::AppState};

const INDEX_HTML: &str = include_str!("../../assets/index.html");

/// Sidebar values as they arrive on the query string.
#[derive(Debug, Default, Deserialize)]
pub struct ControlsQuery {
    pub mode: Option<String>,
    pub days: Option<i64>,
    pub exclude: Option<String>,
    pub top_n: Option<i64>,
}

impl ControlsQuery {
    pub fn to_controls(&self, mode: Mode) -> Controls {
        Controls::new(mode, self.days, self.exclude.as_deref(), self.top_n)
    }
}

/// `GET /` - the single-page dashboard.
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// `GET /api/dashboard` - one full render pass for the selected mode.
#[tracing::instrument(skip(state))]
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ControlsQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(query) = query?;
    let mode = Mode::parse(query.mode.as_deref())?;
    let controls = query.to_controls(mode);
    let window = TimeWindow::last_days(controls.window_days);

    let dashboard = render_dashboard(state.warehouse.as_ref(), &state.schema, &controls, &window)
        .await
        .map_err(AppError::Internal)?;

    Ok(Json(json!({ "data": dashboard })))
}
