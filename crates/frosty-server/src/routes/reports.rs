use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use frosty_core::{
    query::build_query, report::ReportKind, result::ResultSet, window::TimeWindow,
};

use crate::{
    error::AppError, render::render_report, routes::dashboard::ControlsQuery, state::AppState,
};

/// `GET /api/reports/:kind` - a single panel, rendered on its own.
#[tracing::instrument(skip(state))]
pub async fn get_report(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    query: Result<Query<ControlsQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(query) = query?;
    let kind = ReportKind::parse(&kind)?;
    let controls = query.to_controls(kind.mode());
    let window = TimeWindow::last_days(controls.window_days);

    let panel = render_report(
        state.warehouse.as_ref(),
        &state.schema,
        kind,
        &controls,
        &window,
    )
    .await
    .map_err(AppError::Internal)?;

    Ok(Json(json!({ "data": panel, "window": window })))
}

/// `GET /api/reports/:kind/sql` - the statement the report would run.
///
/// Returns the parameterized text, the bound values, and a preview with
/// the values inlined. Nothing is executed.
#[tracing::instrument(skip(state))]
pub async fn get_report_sql(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    query: Result<Query<ControlsQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(query) = query?;
    let kind = ReportKind::parse(&kind)?;
    let controls = query.to_controls(kind.mode());
    let window = TimeWindow::last_days(controls.window_days);
    let spec = build_query(kind, &controls, &window, &state.schema);

    Ok(Json(json!({
        "data": {
            "report": kind,
            "sql": spec.sql,
            "params": spec.params,
            "preview": spec.preview(),
            "limit": spec.limit,
        }
    })))
}

/// `GET /api/reports/:kind/export` - the report's rows as a CSV download.
#[tracing::instrument(skip(state))]
pub async fn export_report(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    query: Result<Query<ControlsQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(query) = query?;
    let kind = ReportKind::parse(&kind)?;
    let controls = query.to_controls(kind.mode());
    let window = TimeWindow::last_days(controls.window_days);
    let spec = build_query(kind, &controls, &window, &state.schema);

    let rows = state
        .warehouse
        .execute(&spec)
        .await
        .map_err(AppError::Internal)?;

    let csv_bytes = build_csv(&rows).map_err(AppError::Internal)?;
    let filename = format!("{}-last-{}-days.csv", kind.as_str(), controls.window_days);
    build_csv_response(&filename, csv_bytes)
}

/// Sanitize a CSV field value against formula injection.
///
/// Spreadsheet apps interpret values that begin with `=`, `+`, `-`, `@`,
/// TAB, or CR as formulas. Prepending a single quote makes them literal.
fn sanitize_csv_field(val: &str) -> std::borrow::Cow<'_, str> {
    if val.starts_with(['=', '+', '-', '@', '\t', '\r']) {
        std::borrow::Cow::Owned(format!("'{val}"))
    } else {
        std::borrow::Cow::Borrowed(val)
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn build_csv(rows: &ResultSet) -> anyhow::Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::with_capacity(rows.len().saturating_mul(64)));

    wtr.write_record(&rows.columns)
        .map_err(|e| anyhow::anyhow!("csv write_record failed: {e}"))?;

    for row in &rows.rows {
        let record: Vec<String> = row
            .iter()
            .map(|cell| {
                let text = cell_text(cell);
                match cell {
                    // Numbers may legitimately start with '-'.
                    Value::Number(_) => text,
                    _ => sanitize_csv_field(&text).into_owned(),
                }
            })
            .collect();
        wtr.write_record(&record)
            .map_err(|e| anyhow::anyhow!("csv write_record failed: {e}"))?;
    }

    wtr.into_inner()
        .map_err(|e| anyhow::anyhow!("csv flush failed: {e}"))
}

fn build_csv_response(filename: &str, csv_bytes: Vec<u8>) -> Result<Response, AppError> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/csv; charset=utf-8")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .body(axum::body::Body::from(csv_bytes))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("response build failed: {e}")))
}
