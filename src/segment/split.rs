//! Segment split policies
//!
//! A split policy decides whether the open segment is still valid for a
//! given "now". Calendar policies compare calendar fields of the segment
//! start against now (not elapsed duration), so a segment opened one minute
//! before midnight expires at midnight.

use std::fmt;

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Rule governing how long a segment stays open before rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogSplit {
    /// Never rotate; one segment holds everything
    None,
    /// Rotate when the calendar day changes
    Day,
    /// Rotate when the calendar month changes
    Month,
    /// Rotate when the calendar year changes
    Year,
    /// Rotate a fixed number of milliseconds after the segment start
    Interval(u64),
}

impl Default for LogSplit {
    fn default() -> Self {
        Self::None
    }
}

impl fmt::Display for LogSplit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Day => write!(f, "day"),
            Self::Month => write!(f, "month"),
            Self::Year => write!(f, "year"),
            Self::Interval(ms) => write!(f, "every {}ms", ms),
        }
    }
}

impl LogSplit {
    /// Whether a segment started at `start` may still accept a write
    /// stamped `now`. Pure and deterministic.
    pub fn is_valid(&self, start: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self {
            Self::None => true,
            Self::Day => {
                now.day() == start.day()
                    && now.month() == start.month()
                    && now.year() == start.year()
            }
            Self::Month => now.month() == start.month() && now.year() == start.year(),
            Self::Year => now.year() == start.year(),
            Self::Interval(ms) => now <= start + Duration::milliseconds(*ms as i64),
        }
    }
}
