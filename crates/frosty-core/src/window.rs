use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Half-open analysis window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Window of `days` days ending at `now`. `days` is at least 1 so the
    /// window is never empty.
    pub fn ending_at(now: DateTime<Utc>, days: u32) -> Self {
        let days = days.max(1);
        Self {
            start: now - Duration::days(i64::from(days)),
            end: now,
        }
    }

    /// Window ending at the current wall-clock time.
    pub fn last_days(days: u32) -> Self {
        Self::ending_at(Utc::now(), days)
    }

    #[cfg(test)]
    fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts < self.end
    }
}
