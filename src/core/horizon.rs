//! Lookback horizons used by the change calculator

use crate::core::series::HistoryWindow;
use anyhow::{Result, bail};
use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Horizon {
    OneDay,
    ThreeDays,
    OneWeek,
    OneMonth,
    OneYear,
    FiveYears,
    YearToDate,
}

impl Display for Horizon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Horizon::OneDay => "1D",
                Horizon::ThreeDays => "3D",
                Horizon::OneWeek => "1W",
                Horizon::OneMonth => "1M",
                Horizon::OneYear => "1Y",
                Horizon::FiveYears => "5Y",
                Horizon::YearToDate => "YTD",
            }
        )
    }
}

impl FromStr for Horizon {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "1D" => Ok(Horizon::OneDay),
            "3D" => Ok(Horizon::ThreeDays),
            "1W" => Ok(Horizon::OneWeek),
            "1M" => Ok(Horizon::OneMonth),
            "1Y" => Ok(Horizon::OneYear),
            "5Y" => Ok(Horizon::FiveYears),
            "YTD" => Ok(Horizon::YearToDate),
            _ => Err(anyhow::anyhow!("Invalid horizon: {}", s)),
        }
    }
}

impl Horizon {
    /// Number of calendar days to look back from `reference`.
    ///
    /// Fixed horizons ignore the reference date. `YearToDate` counts the whole
    /// days elapsed since January 1 of the reference year, so it is 0 on
    /// January 1 itself.
    pub fn lookback_days(&self, reference: NaiveDate) -> i64 {
        match self {
            Horizon::OneDay => 1,
            Horizon::ThreeDays => 3,
            Horizon::OneWeek => 7,
            Horizon::OneMonth => 30,
            Horizon::OneYear => 365,
            Horizon::FiveYears => 365 * 5,
            Horizon::YearToDate => i64::from(reference.ordinal0()),
        }
    }

    /// Key of the absolute change field in the dashboard payload, e.g. `change1W`.
    pub fn change_key(&self) -> String {
        format!("change{self}")
    }

    /// Key of the percent change field in the dashboard payload, e.g. `change1WPercent`.
    pub fn percent_key(&self) -> String {
        format!("change{self}Percent")
    }
}

/// Extra days fetched before the longest lookback so that a horizon landing on
/// a weekend or holiday still has an earlier observation.
const HISTORY_MARGIN_DAYS: u64 = 60;

/// Ordered set of unique horizons evaluated for every instrument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HorizonTable {
    horizons: Vec<Horizon>,
}

impl HorizonTable {
    pub fn new(horizons: Vec<Horizon>) -> Result<Self> {
        for (i, horizon) in horizons.iter().enumerate() {
            if horizons[..i].contains(horizon) {
                bail!("Duplicate horizon in table: {}", horizon);
            }
        }
        Ok(Self { horizons })
    }

    /// The dashboard horizons: 1D, 3D, 1W, 1M, 1Y, 5Y and YTD.
    pub fn standard() -> Self {
        Self {
            horizons: vec![
                Horizon::OneDay,
                Horizon::ThreeDays,
                Horizon::OneWeek,
                Horizon::OneMonth,
                Horizon::OneYear,
                Horizon::FiveYears,
                Horizon::YearToDate,
            ],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Horizon> {
        self.horizons.iter()
    }

    pub fn len(&self) -> usize {
        self.horizons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.horizons.is_empty()
    }

    /// Days of history needed to evaluate every horizon at `reference`.
    pub fn history_window(&self, reference: NaiveDate) -> HistoryWindow {
        let longest = self
            .horizons
            .iter()
            .map(|h| h.lookback_days(reference).max(0).unsigned_abs())
            .max()
            .unwrap_or(0);
        let start = reference
            .checked_sub_days(Days::new(longest + HISTORY_MARGIN_DAYS))
            .unwrap_or(NaiveDate::MIN);
        HistoryWindow {
            start,
            end: reference,
        }
    }
}

impl Default for HorizonTable {
    fn default() -> Self {
        Self::standard()
    }
}
