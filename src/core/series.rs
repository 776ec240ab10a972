//! Time series abstractions and core types

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub date: DateTime<Utc>,
    pub value: f64,
}

impl HistoryPoint {
    pub fn new(date: DateTime<Utc>, value: f64) -> Self {
        Self { date, value }
    }
}

/// Inclusive range of calendar days requested from a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Source of market or macroeconomic series.
///
/// The latest value and the history may come from different endpoints and are
/// not required to agree with each other.
#[async_trait]
pub trait SeriesProvider: Send + Sync {
    async fn fetch_latest(&self, symbol: &str) -> Result<f64>;

    /// Daily observations within `window`, in ascending date order with
    /// missing values removed.
    async fn fetch_history(&self, symbol: &str, window: HistoryWindow)
    -> Result<Vec<HistoryPoint>>;
}
