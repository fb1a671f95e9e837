//! Market query file
//!
//! Which leagues to track and how far ahead to look for fixtures.

use crate::exchange::TimeRange;
use chrono::{DateTime, TimeDelta, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Length of the fixture window when no end is given
pub const DEFAULT_WINDOW_DAYS: i64 = 7;

/// Errors reading a query file
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Failed to read query file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid query file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Fixture window of {days} days is out of range")]
    WindowOutOfRange { days: i64 },
}

/// Leagues and fixture window to track
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketQuery {
    /// Competition ids to query
    #[serde(rename = "leagueids")]
    pub league_ids: Vec<String>,
    /// Days from now until the window opens
    #[serde(default, rename = "mindays")]
    pub min_days: i64,
    /// Days from now until the window closes
    #[serde(default, rename = "maxdays")]
    pub max_days: i64,
    /// Reserved for odds filtering, not applied
    #[serde(default, rename = "minodds")]
    pub min_odds: Decimal,
    /// Reserved for odds filtering, not applied
    #[serde(default, rename = "maxodds")]
    pub max_odds: Decimal,
}

impl MarketQuery {
    /// Read a query from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, QueryError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Fixture start-time window relative to `now`.
    ///
    /// Opens at `now`, or `min_days` later when set. Closes a week after it
    /// opens unless `max_days` sets the end explicitly.
    pub fn window(&self, now: DateTime<Utc>) -> Result<TimeRange, QueryError> {
        let from = if self.min_days > 0 {
            add_days(now, self.min_days)?
        } else {
            now
        };

        let to = if self.max_days > 0 {
            add_days(now, self.max_days)?
        } else {
            add_days(from, DEFAULT_WINDOW_DAYS)?
        };

        Ok(TimeRange { from, to })
    }
}

fn add_days(at: DateTime<Utc>, days: i64) -> Result<DateTime<Utc>, QueryError> {
    TimeDelta::try_days(days)
        .and_then(|delta| at.checked_add_signed(delta))
        .ok_or(QueryError::WindowOutOfRange { days })
}
