//! Sidebar inputs for a render pass.

use serde::{Deserialize, Serialize};

use crate::report::Mode;

pub const MIN_WINDOW_DAYS: u32 = 1;
pub const MAX_WINDOW_DAYS: u32 = 90;
pub const DEFAULT_WINDOW_DAYS: u32 = 7;

pub const MIN_TOP_N: u32 = 1;
pub const MAX_TOP_N: u32 = 100;
pub const DEFAULT_TOP_N: u32 = 10;

/// The four values collected by the control panel. Out-of-range numbers are
/// clamped rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Controls {
    pub mode: Mode,
    pub window_days: u32,
    pub excluded_users: ExcludedUsers,
    pub top_n: u32,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            window_days: DEFAULT_WINDOW_DAYS,
            excluded_users: ExcludedUsers::default(),
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl Controls {
    pub fn new(
        mode: Mode,
        window_days: Option<i64>,
        excluded_users: Option<&str>,
        top_n: Option<i64>,
    ) -> Self {
        Self {
            mode,
            window_days: clamp(window_days, DEFAULT_WINDOW_DAYS, MIN_WINDOW_DAYS, MAX_WINDOW_DAYS),
            excluded_users: ExcludedUsers::parse(excluded_users.unwrap_or("")),
            top_n: clamp(top_n, DEFAULT_TOP_N, MIN_TOP_N, MAX_TOP_N),
        }
    }
}

fn clamp(raw: Option<i64>, default: u32, min: u32, max: u32) -> u32 {
    match raw {
        None => default,
        Some(v) => v.clamp(i64::from(min), i64::from(max)) as u32,
    }
}

/// Users filtered out of every report.
///
/// Parsed from the free-text filter: names are comma separated and may be
/// wrapped in single or double quotes (`'admin','appuser'`). Text that does
/// not follow that shape is kept as literal names, never rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExcludedUsers(Vec<String>);

impl ExcludedUsers {
    pub fn parse(raw: &str) -> Self {
        let users = raw
            .split(',')
            .map(|token| strip_quotes(token.trim()).trim())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
        Self(users)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for ExcludedUsers {
    fn from(users: Vec<String>) -> Self {
        Self(users)
    }
}

fn strip_quotes(token: &str) -> &str {
    for quote in ['\'', '"'] {
        if token.len() >= 2 && token.starts_with(quote) && token.ends_with(quote) {
            return &token[1..token.len() - 1];
        }
    }
    token
}
