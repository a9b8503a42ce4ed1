//! Report renderer: runs each report's statement and shapes the rows into
//! display panels laid out for the selected mode.

use std::collections::HashMap;

use anyhow::{anyhow, Result};
use serde::Serialize;
use tracing::info;

use frosty_core::{
    controls::Controls,
    query::{build_query, AuditSchema},
    report::{Display, Mode, ReportKind},
    result::ResultSet,
    warehouse::Warehouse,
    window::TimeWindow,
};

/// One chart or table on the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct Panel {
    pub report: ReportKind,
    pub title: String,
    pub display: Display,
    pub result: ResultSet,
}

/// Everything one render pass produced.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub render_id: String,
    pub mode: Mode,
    pub header: String,
    pub window: TimeWindow,
    pub controls: Controls,
    /// Rows of panels; two panels in a row sit side by side.
    pub rows: Vec<Vec<Panel>>,
}

/// Execute a single report and wrap its rows in a panel.
pub async fn render_report(
    warehouse: &dyn Warehouse,
    schema: &AuditSchema,
    kind: ReportKind,
    controls: &Controls,
    window: &TimeWindow,
) -> Result<Panel> {
    let spec = build_query(kind, controls, window, schema);
    tracing::debug!(report = kind.as_str(), sql = %spec.preview(), "running report");
    let result = warehouse.execute(&spec).await?;
    Ok(Panel {
        report: kind,
        title: kind.title(controls.top_n, controls.window_days),
        display: kind.display(),
        result,
    })
}

/// Full render pass for `controls.mode`.
///
/// Reports run one after another against the shared session. The first
/// failure aborts the pass; nothing is retried.
#[tracing::instrument(skip_all, fields(mode = controls.mode.as_str(), render_id = tracing::field::Empty))]
pub async fn render_dashboard(
    warehouse: &dyn Warehouse,
    schema: &AuditSchema,
    controls: &Controls,
    window: &TimeWindow,
) -> Result<Dashboard> {
    let render_id = uuid::Uuid::new_v4().to_string();
    tracing::Span::current().record("render_id", render_id.as_str());

    let mut panels: HashMap<ReportKind, Panel> = HashMap::new();
    for kind in controls.mode.reports() {
        let panel = render_report(warehouse, schema, kind, controls, window).await?;
        panels.insert(kind, panel);
    }

    let rows = controls
        .mode
        .layout()
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|kind| {
                    panels
                        .remove(&kind)
                        .ok_or_else(|| anyhow!("report {} missing from pass", kind.as_str()))
                })
                .collect::<Result<Vec<Panel>>>()
        })
        .collect::<Result<Vec<Vec<Panel>>>>()?;

    info!(
        window_days = controls.window_days,
        top_n = controls.top_n,
        excluded = controls.excluded_users.as_slice().len(),
        "Dashboard rendered"
    );

    Ok(Dashboard {
        render_id,
        mode: controls.mode,
        header: controls.mode.header(),
        window: *window,
        controls: controls.clone(),
        rows,
    })
}
