//! Trailing change calculation over a table of lookback horizons.
//!
//! The calculator is a pure function: the reference instant is always passed
//! in, so repeated calls with the same inputs produce identical output.

use crate::core::horizon::{Horizon, HorizonTable};
use crate::core::series::HistoryPoint;
use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::borrow::Cow;
use tracing::debug;

/// Absolute and percent change against a single historical value.
///
/// `None` means there was no comparable value for the horizon.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Change {
    pub absolute: Option<f64>,
    pub percent: Option<f64>,
}

impl Change {
    /// Change from `past` to `latest`, rounded to two decimals.
    ///
    /// A zero `past` still has an absolute change but no percent change.
    pub fn between(latest: f64, past: f64) -> Self {
        if !latest.is_finite() || !past.is_finite() {
            return Self::default();
        }
        let delta = latest - past;
        let percent = if past != 0.0 {
            Some(round2(delta / past * 100.0))
        } else {
            None
        };
        Self {
            absolute: Some(round2(delta)),
            percent,
        }
    }
}

/// Changes for every horizon of a [`HorizonTable`], in table order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChangeSet {
    entries: Vec<(Horizon, Change)>,
}

impl ChangeSet {
    pub fn get(&self, horizon: Horizon) -> Option<&Change> {
        self.entries
            .iter()
            .find(|(h, _)| *h == horizon)
            .map(|(_, change)| change)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Horizon, Change)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// Flattened into the dashboard payload as `change1D`, `change1DPercent`, ...
impl Serialize for ChangeSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len() * 2))?;
        for (horizon, change) in &self.entries {
            map.serialize_entry(&horizon.change_key(), &change.absolute)?;
            map.serialize_entry(&horizon.percent_key(), &change.percent)?;
        }
        map.end()
    }
}

/// Computes the change of `latest` against `history` for each horizon.
///
/// For every horizon the comparison value is the most recent point whose
/// calendar day (UTC) is on or before `reference - lookback days`. Gaps such as
/// weekends and holidays fall back to the prior observation. History is
/// expected in ascending date order; unsorted input is sorted on a copy.
pub fn compute_changes(
    latest: f64,
    history: &[HistoryPoint],
    reference: DateTime<Utc>,
    horizons: &HorizonTable,
) -> ChangeSet {
    let history = sorted(history);
    let reference_date = reference.date_naive();

    let entries = horizons
        .iter()
        .map(|horizon| {
            let lookback = horizon.lookback_days(reference_date);
            let change = u64::try_from(lookback)
                .ok()
                .and_then(|days| reference_date.checked_sub_days(Days::new(days)))
                .and_then(|target| value_on_or_before(&history, target))
                .map_or_else(Change::default, |past| Change::between(latest, past));
            (*horizon, change)
        })
        .collect();

    ChangeSet { entries }
}

fn sorted(history: &[HistoryPoint]) -> Cow<'_, [HistoryPoint]> {
    if history.is_sorted_by_key(|p| p.date) {
        return Cow::Borrowed(history);
    }
    debug!(points = history.len(), "History out of order, sorting");
    let mut owned = history.to_vec();
    owned.sort_by_key(|p| p.date);
    Cow::Owned(owned)
}

fn value_on_or_before(history: &[HistoryPoint], target: NaiveDate) -> Option<f64> {
    history
        .iter()
        .rev()
        .find(|p| p.date.date_naive() <= target)
        .map(|p| p.value)
        .filter(|v| v.is_finite())
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
