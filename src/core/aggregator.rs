//! Fans out series fetches per instrument and assembles dashboard rows.
use crate::core::change::compute_changes;
use crate::core::horizon::HorizonTable;
use crate::core::instrument::{
    BatchReport, DataSource, Instrument, InstrumentFailure, InstrumentQuote,
};
use crate::core::series::SeriesProvider;
use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::{debug, instrument, warn};

/// Providers available to the aggregator, one per data source.
pub struct SeriesProviders<'a> {
    pub yahoo: &'a (dyn SeriesProvider + Send + Sync),
    /// FRED requires an API key, so it may be absent.
    pub fred: Option<&'a (dyn SeriesProvider + Send + Sync)>,
}

impl<'a> SeriesProviders<'a> {
    fn for_source(&self, source: DataSource) -> Result<&'a (dyn SeriesProvider + Send + Sync)> {
        match source {
            DataSource::Yahoo => Ok(self.yahoo),
            DataSource::Fred => self
                .fred
                .ok_or_else(|| anyhow!("No provider configured for {}", source)),
        }
    }
}

pub struct QuoteAggregator<'a> {
    providers: SeriesProviders<'a>,
    horizons: &'a HorizonTable,
}

impl<'a> QuoteAggregator<'a> {
    pub fn new(providers: SeriesProviders<'a>, horizons: &'a HorizonTable) -> Self {
        Self {
            providers,
            horizons,
        }
    }

    /// Fetches every instrument concurrently and computes changes relative to
    /// `reference`. Quotes keep the order of `instruments`.
    pub async fn aggregate(
        &self,
        instruments: &[Instrument],
        reference: DateTime<Utc>,
        update_callback: &(dyn Fn() + Send + Sync),
    ) -> BatchReport {
        let futures = instruments.iter().map(|instrument| async move {
            let result = self.fetch_quote(instrument, reference).await;
            update_callback();
            (instrument, result)
        });

        let mut report = BatchReport::default();
        for (instrument, result) in join_all(futures).await {
            match result {
                Ok(quote) => report.quotes.push(quote),
                Err(e) => {
                    warn!(symbol = %instrument.symbol, error = %e, "Instrument fetch failed");
                    report.failures.push(InstrumentFailure {
                        name: instrument.name.clone(),
                        symbol: instrument.symbol.clone(),
                        error: format!("{e:#}"),
                    });
                }
            }
        }
        debug!(
            quotes = report.quotes.len(),
            failures = report.failures.len(),
            "Aggregation complete"
        );
        report
    }

    #[instrument(skip(self, instrument), fields(symbol = %instrument.symbol))]
    async fn fetch_quote(
        &self,
        instrument: &Instrument,
        reference: DateTime<Utc>,
    ) -> Result<InstrumentQuote> {
        let provider = self.providers.for_source(instrument.source)?;
        let window = self.horizons.history_window(reference.date_naive());
        let (latest, history) = tokio::try_join!(
            provider.fetch_latest(&instrument.symbol),
            provider.fetch_history(&instrument.symbol, window)
        )?;
        debug!(latest, points = history.len(), "Fetched series");

        Ok(InstrumentQuote {
            name: instrument.name.clone(),
            value: latest,
            asset_class: instrument.asset_class,
            spot_price: instrument.spot_price,
            changes: compute_changes(latest, &history, reference, self.horizons),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::horizon::Horizon;
    use crate::core::instrument::AssetClass;
    use crate::core::series::{HistoryPoint, HistoryWindow};
    use async_trait::async_trait;
    use chrono::{Duration, NaiveDate, TimeZone};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockSeriesProvider {
        series: HashMap<String, (f64, Vec<HistoryPoint>)>,
        windows: Mutex<Vec<HistoryWindow>>,
    }

    #[async_trait]
    impl SeriesProvider for MockSeriesProvider {
        async fn fetch_latest(&self, symbol: &str) -> Result<f64> {
            self.series
                .get(symbol)
                .map(|(latest, _)| *latest)
                .ok_or_else(|| anyhow!("Unknown symbol: {}", symbol))
        }

        async fn fetch_history(
            &self,
            symbol: &str,
            window: HistoryWindow,
        ) -> Result<Vec<HistoryPoint>> {
            self.windows.lock().unwrap().push(window);
            self.series
                .get(symbol)
                .map(|(_, history)| history.clone())
                .ok_or_else(|| anyhow!("Unknown symbol: {}", symbol))
        }
    }

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn instrument(name: &str, symbol: &str, source: DataSource) -> Instrument {
        Instrument {
            name: name.to_string(),
            symbol: symbol.to_string(),
            source,
            asset_class: AssetClass::Metals,
            spot_price: true,
        }
    }

    fn provider_with(symbol: &str, latest: f64, past: f64) -> MockSeriesProvider {
        MockSeriesProvider {
            series: HashMap::from([(
                symbol.to_string(),
                (
                    latest,
                    vec![HistoryPoint::new(reference() - Duration::days(40), past)],
                ),
            )]),
            windows: Mutex::new(Vec::new()),
        }
    }

    #[tokio::test]
    async fn test_aggregate_builds_quotes() {
        let yahoo = provider_with("GC=F", 110.0, 100.0);
        let horizons = HorizonTable::standard();
        let aggregator = QuoteAggregator::new(
            SeriesProviders {
                yahoo: &yahoo,
                fred: None,
            },
            &horizons,
        );

        let report = aggregator
            .aggregate(
                &[instrument("Gold", "GC=F", DataSource::Yahoo)],
                reference(),
                &|| (),
            )
            .await;

        assert!(report.failures.is_empty());
        assert_eq!(report.quotes.len(), 1);
        let quote = &report.quotes[0];
        assert_eq!(quote.name, "Gold");
        assert_eq!(quote.value, 110.0);
        assert!(quote.spot_price);
        let one_month = quote.changes.get(Horizon::OneMonth).unwrap();
        assert_eq!(one_month.absolute, Some(10.0));
        assert_eq!(one_month.percent, Some(10.0));

        // The requested window follows the reference, not the wall clock
        let windows = yahoo.windows.lock().unwrap();
        assert_eq!(
            *windows,
            vec![HistoryWindow {
                start: NaiveDate::from_ymd_opt(2019, 4, 18).unwrap(),
                end: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
            }]
        );
    }

    #[tokio::test]
    async fn test_failed_instrument_does_not_abort_batch() {
        let yahoo = provider_with("GC=F", 110.0, 100.0);
        let horizons = HorizonTable::standard();
        let aggregator = QuoteAggregator::new(
            SeriesProviders {
                yahoo: &yahoo,
                fred: None,
            },
            &horizons,
        );
        let calls = AtomicUsize::new(0);

        let report = aggregator
            .aggregate(
                &[
                    instrument("Silver", "SI=F", DataSource::Yahoo),
                    instrument("Gold", "GC=F", DataSource::Yahoo),
                    instrument("US 10Y", "DGS10", DataSource::Fred),
                ],
                reference(),
                &|| {
                    calls.fetch_add(1, Ordering::SeqCst);
                },
            )
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(report.quotes.len(), 1);
        assert_eq!(report.quotes[0].name, "Gold");
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.failures[0].symbol, "SI=F");
        assert_eq!(report.failures[0].error, "Unknown symbol: SI=F");
        assert_eq!(report.failures[1].error, "No provider configured for FRED");
    }

    #[tokio::test]
    async fn test_sources_are_routed_to_their_provider() {
        let yahoo = provider_with("GC=F", 110.0, 100.0);
        let fred = provider_with("DGS10", 4.5, 4.0);
        let horizons = HorizonTable::standard();
        let aggregator = QuoteAggregator::new(
            SeriesProviders {
                yahoo: &yahoo,
                fred: Some(&fred),
            },
            &horizons,
        );

        let report = aggregator
            .aggregate(
                &[
                    instrument("US 10Y", "DGS10", DataSource::Fred),
                    instrument("Gold", "GC=F", DataSource::Yahoo),
                ],
                reference(),
                &|| (),
            )
            .await;

        assert!(report.failures.is_empty());
        let names: Vec<&str> = report.quotes.iter().map(|q| q.name.as_str()).collect();
        assert_eq!(names, vec!["US 10Y", "Gold"]);
        let one_month = report.quotes[0].changes.get(Horizon::OneMonth).unwrap();
        assert_eq!(one_month.absolute, Some(0.5));
        assert_eq!(one_month.percent, Some(12.5));
    }
}
