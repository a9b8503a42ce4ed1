//! Dashboard modes, report kinds, and how each report is displayed.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Login,
    Query,
    Ddl,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Login, Mode::Query, Mode::Ddl];

    /// Accepts the wire names (`login`, `query`, `ddl`) as well as the
    /// selector labels shown in the sidebar (`Login Tracking`, ...).
    pub fn parse(raw: Option<&str>) -> Result<Self, CoreError> {
        let Some(raw) = raw.map(str::trim) else {
            return Ok(Self::default());
        };
        match raw.to_ascii_lowercase().as_str() {
            "" | "login" | "login tracking" => Ok(Self::Login),
            "query" | "query tracking" => Ok(Self::Query),
            "ddl" | "ddl tracking" => Ok(Self::Ddl),
            _ => Err(CoreError::UnknownMode(raw.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Login => "login",
            Mode::Query => "query",
            Mode::Ddl => "ddl",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Mode::Login => "Login Tracking",
            Mode::Query => "Query Tracking",
            Mode::Ddl => "DDL Tracking",
        }
    }

    pub fn header(&self) -> String {
        format!("Frosty Tracking - {}", self.label())
    }

    /// The three reports evaluated for this mode, in execution order.
    pub fn reports(&self) -> [ReportKind; 3] {
        match self {
            Mode::Login => [
                ReportKind::TopUsersByLogins,
                ReportKind::TopUsersByAvgLogins,
                ReportKind::RecentLogins,
            ],
            Mode::Query => [
                ReportKind::QueryExecutionTrend,
                ReportKind::TopUsersByQueries,
                ReportKind::TopQueryPatterns,
            ],
            Mode::Ddl => [
                ReportKind::DdlOperationTrend,
                ReportKind::TopDdlOperations,
                ReportKind::DdlOperationsByUser,
            ],
        }
    }

    /// Panel rows for this mode. A row holding two reports renders them
    /// side by side; a single-report row spans the full width.
    pub fn layout(&self) -> Vec<Vec<ReportKind>> {
        match self {
            Mode::Login => vec![
                vec![ReportKind::TopUsersByLogins, ReportKind::TopUsersByAvgLogins],
                vec![ReportKind::RecentLogins],
            ],
            Mode::Query => vec![
                vec![ReportKind::QueryExecutionTrend, ReportKind::TopUsersByQueries],
                vec![ReportKind::TopQueryPatterns],
            ],
            Mode::Ddl => vec![
                vec![ReportKind::DdlOperationTrend],
                vec![ReportKind::TopDdlOperations, ReportKind::DdlOperationsByUser],
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    TopUsersByLogins,
    TopUsersByAvgLogins,
    RecentLogins,
    QueryExecutionTrend,
    TopUsersByQueries,
    TopQueryPatterns,
    DdlOperationTrend,
    TopDdlOperations,
    DdlOperationsByUser,
}

impl ReportKind {
    pub const ALL: [ReportKind; 9] = [
        ReportKind::TopUsersByLogins,
        ReportKind::TopUsersByAvgLogins,
        ReportKind::RecentLogins,
        ReportKind::QueryExecutionTrend,
        ReportKind::TopUsersByQueries,
        ReportKind::TopQueryPatterns,
        ReportKind::DdlOperationTrend,
        ReportKind::TopDdlOperations,
        ReportKind::DdlOperationsByUser,
    ];

    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == raw.trim())
            .ok_or_else(|| CoreError::UnknownReport(raw.to_string()))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::TopUsersByLogins => "top_users_by_logins",
            ReportKind::TopUsersByAvgLogins => "top_users_by_avg_logins",
            ReportKind::RecentLogins => "recent_logins",
            ReportKind::QueryExecutionTrend => "query_execution_trend",
            ReportKind::TopUsersByQueries => "top_users_by_queries",
            ReportKind::TopQueryPatterns => "top_query_patterns",
            ReportKind::DdlOperationTrend => "ddl_operation_trend",
            ReportKind::TopDdlOperations => "top_ddl_operations",
            ReportKind::DdlOperationsByUser => "ddl_operations_by_user",
        }
    }

    pub fn mode(&self) -> Mode {
        match self {
            ReportKind::TopUsersByLogins
            | ReportKind::TopUsersByAvgLogins
            | ReportKind::RecentLogins => Mode::Login,
            ReportKind::QueryExecutionTrend
            | ReportKind::TopUsersByQueries
            | ReportKind::TopQueryPatterns => Mode::Query,
            ReportKind::DdlOperationTrend
            | ReportKind::TopDdlOperations
            | ReportKind::DdlOperationsByUser => Mode::Ddl,
        }
    }

    /// Trend reports are ordered by day ascending and are never row-capped.
    pub fn is_trend(&self) -> bool {
        matches!(
            self,
            ReportKind::QueryExecutionTrend | ReportKind::DdlOperationTrend
        )
    }

    pub fn title(&self, top_n: u32, window_days: u32) -> String {
        match self {
            ReportKind::TopUsersByLogins => {
                format!("Top {top_n} Users Accessing the UI in the last {window_days} days")
            }
            ReportKind::TopUsersByAvgLogins => {
                format!("Average Login Count per User in the last {window_days} days")
            }
            ReportKind::RecentLogins => format!("Last {top_n} logins"),
            ReportKind::QueryExecutionTrend => "Query Execution Trends".to_string(),
            ReportKind::TopUsersByQueries => {
                format!("Top {top_n} Active Users by Query Execution")
            }
            ReportKind::TopQueryPatterns => format!("Top {top_n} Common Query Patterns"),
            ReportKind::DdlOperationTrend => "DDL Operation Trends".to_string(),
            ReportKind::TopDdlOperations => format!("Top {top_n} DDL Operations"),
            ReportKind::DdlOperationsByUser => format!("Top {top_n} DDL Operations by User"),
        }
    }

    pub fn display(&self) -> Display {
        match self {
            ReportKind::TopUsersByLogins => Display::Pie {
                names: "USER".to_string(),
                values: "LOGIN_COUNT".to_string(),
                show_legend: false,
            },
            ReportKind::TopUsersByAvgLogins => Display::Bar {
                x: "USER".to_string(),
                y: "AVG_LOGIN_COUNT".to_string(),
            },
            ReportKind::QueryExecutionTrend => Display::Line {
                x: "DAY".to_string(),
                y: "QUERY_COUNT".to_string(),
                color: None,
            },
            ReportKind::DdlOperationTrend => Display::Line {
                x: "DAY".to_string(),
                y: "OPERATION_COUNT".to_string(),
                color: Some("QUERY_TYPE".to_string()),
            },
            ReportKind::RecentLogins
            | ReportKind::TopUsersByQueries
            | ReportKind::TopQueryPatterns
            | ReportKind::TopDdlOperations
            | ReportKind::DdlOperationsByUser => Display::Table { index_column: 0 },
        }
    }
}

/// Display primitive a panel is drawn with. Column references name columns
/// of the panel's result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Display {
    Pie {
        names: String,
        values: String,
        show_legend: bool,
    },
    Bar {
        x: String,
        y: String,
    },
    /// `color` splits the series by a secondary category column.
    Line {
        x: String,
        y: String,
        color: Option<String>,
    },
    /// Indexed table; `index_column` becomes the row label.
    Table { index_column: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parse_accepts_wire_names_and_labels() {
        assert_eq!(Mode::parse(None).unwrap(), Mode::Login);
        assert_eq!(Mode::parse(Some("")).unwrap(), Mode::Login);
        assert_eq!(Mode::parse(Some("query")).unwrap(), Mode::Query);
        assert_eq!(Mode::parse(Some("DDL Tracking")).unwrap(), Mode::Ddl);
        assert!(Mode::parse(Some("billing")).is_err());
    }

    #[test]
    fn every_mode_has_three_reports_of_its_own() {
        for mode in Mode::ALL {
            let reports = mode.reports();
            assert_eq!(reports.len(), 3);
            assert!(reports.iter().all(|r| r.mode() == mode));
        }
    }

    #[test]
    fn layout_covers_each_report_exactly_once() {
        for mode in Mode::ALL {
            let mut laid_out: Vec<ReportKind> = mode.layout().into_iter().flatten().collect();
            let mut expected = mode.reports().to_vec();
            laid_out.sort_by_key(|r| r.as_str());
            expected.sort_by_key(|r| r.as_str());
            assert_eq!(laid_out, expected);
            assert!(mode.layout().iter().all(|row| (1..=2).contains(&row.len())));
        }
    }

    #[test]
    fn report_kind_parse_round_trips_slugs() {
        for kind in ReportKind::ALL {
            assert_eq!(ReportKind::parse(kind.as_str()).unwrap(), kind);
        }
        assert!(ReportKind::parse("top_tables").is_err());
    }

    #[test]
    fn titles_follow_controls() {
        assert_eq!(
            ReportKind::TopUsersByLogins.title(10, 7),
            "Top 10 Users Accessing the UI in the last 7 days"
        );
        assert_eq!(ReportKind::RecentLogins.title(25, 7), "Last 25 logins");
        assert_eq!(Mode::Ddl.header(), "Frosty Tracking - DDL Tracking");
    }

    #[test]
    fn only_trend_reports_draw_lines() {
        for kind in ReportKind::ALL {
            let is_line = matches!(kind.display(), Display::Line { .. });
            assert_eq!(is_line, kind.is_trend(), "{kind:?}");
        }
    }
}
