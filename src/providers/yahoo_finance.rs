use crate::core::series::{HistoryPoint, HistoryWindow, SeriesProvider};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{Days, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Deserialize;
use tracing::{debug, instrument};

pub struct YahooFinanceProvider {
    base_url: String,
}

impl YahooFinanceProvider {
    pub fn new(base_url: &str) -> Self {
        YahooFinanceProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_chart(&self, symbol: &str, params: &[(&str, String)]) -> Result<ChartItem> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        debug!("Requesting chart data from {} ({:?})", url, params);

        let client = reqwest::Client::builder()
            .user_agent("macrodash/1.0")
            .build()?;
        let response = client
            .get(&url)
            .query(&[("interval", "1d")])
            .query(params)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for symbol: {} URL: {}", e, symbol, url))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for symbol: {}",
                response.status(),
                symbol
            ));
        }

        let text = response.text().await?;
        let data: YahooChartResponse = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse JSON response for {symbol}"))?;

        data.chart
            .result
            .and_then(|items| items.into_iter().next())
            .ok_or_else(|| anyhow!("No chart data found for symbol: {}", symbol))
    }
}

/// Midnight UTC of `date` as a Unix timestamp.
fn day_start(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

#[derive(Deserialize, Debug)]
struct YahooChartResponse {
    chart: ChartResult,
}

#[derive(Deserialize, Debug)]
struct ChartResult {
    result: Option<Vec<ChartItem>>,
}

#[derive(Deserialize, Debug)]
struct ChartItem {
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: Option<Indicators>,
}

#[derive(Deserialize, Debug)]
struct ChartMeta {
    #[serde(alias = "regularMarketPrice")]
    regular_market_price: f64,
}

#[derive(Deserialize, Debug)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Deserialize, Debug)]
struct Quote {
    close: Option<Vec<Option<f64>>>,
}

impl ChartItem {
    /// Daily closes paired with their timestamps. Bars without a close are skipped.
    fn history(&self) -> Vec<HistoryPoint> {
        let (Some(timestamps), Some(closes)) = (
            self.timestamp.as_ref(),
            self.indicators
                .as_ref()
                .and_then(|inds| inds.quote.first())
                .and_then(|q| q.close.as_ref()),
        ) else {
            return Vec::new();
        };

        timestamps
            .iter()
            .zip(closes)
            .filter_map(|(ts, close)| {
                let date = Utc.timestamp_opt(*ts, 0).single()?;
                close.map(|value| HistoryPoint::new(date, value))
            })
            .collect()
    }
}

#[async_trait]
impl SeriesProvider for YahooFinanceProvider {
    #[instrument(name = "YahooLatestFetch", skip(self), fields(symbol = %symbol))]
    async fn fetch_latest(&self, symbol: &str) -> Result<f64> {
        let item = self
            .fetch_chart(symbol, &[("range", "1d".to_string())])
            .await?;
        Ok(item.meta.regular_market_price)
    }

    #[instrument(name = "YahooHistoryFetch", skip(self), fields(symbol = %symbol))]
    async fn fetch_history(
        &self,
        symbol: &str,
        window: HistoryWindow,
    ) -> Result<Vec<HistoryPoint>> {
        // period2 is exclusive, so stop at the start of the day after `end`
        let end = window
            .end
            .checked_add_days(Days::new(1))
            .unwrap_or(window.end);
        let params = [
            ("period1", day_start(window.start).to_string()),
            ("period2", day_start(end).to_string()),
        ];
        let item = self.fetch_chart(symbol, &params).await?;
        let mut history = item.history();
        history.sort_by_key(|p| p.date);
        debug!(points = history.len(), "Parsed Yahoo history");
        Ok(history)
    }
}
