use crate::core::series::{HistoryPoint, HistoryWindow, SeriesProvider};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, instrument};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Client for the FRED series observations API.
pub struct FredProvider {
    base_url: String,
    api_key: String,
}

impl FredProvider {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        FredProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    async fn fetch_observations(
        &self,
        series_id: &str,
        params: &[(&str, String)],
    ) -> Result<Vec<Observation>> {
        let url = format!("{}/fred/series/observations", self.base_url);
        // Keep the API key out of the logs
        debug!("Requesting observations from {} for {} ({:?})", url, series_id, params);

        let client = reqwest::Client::builder()
            .user_agent("macrodash/1.0")
            .build()?;
        let response = client
            .get(&url)
            .query(&[
                ("series_id", series_id),
                ("api_key", self.api_key.as_str()),
                ("file_type", "json"),
            ])
            .query(params)
            .send()
            .await
            .with_context(|| format!("Failed to send request for series: {series_id}"))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for series: {}",
                response.status(),
                series_id
            ));
        }

        let text = response
            .text()
            .await
            .with_context(|| format!("Failed to get response text for series: {series_id}"))?;
        let data: FredObservationsResponse = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse FRED response for series: {series_id}"))?;

        Ok(data.observations)
    }
}

#[derive(Debug, Deserialize)]
struct FredObservationsResponse {
    observations: Vec<Observation>,
}

#[derive(Debug, Deserialize)]
struct Observation {
    date: String,
    value: String,
}

impl Observation {
    /// FRED reports missing observations as ".".
    fn to_point(&self) -> Option<HistoryPoint> {
        let value = self.value.trim().parse::<f64>().ok()?;
        let date = NaiveDate::parse_from_str(&self.date, DATE_FORMAT)
            .ok()?
            .and_hms_opt(0, 0, 0)?
            .and_utc();
        Some(HistoryPoint::new(date, value))
    }
}

#[async_trait]
impl SeriesProvider for FredProvider {
    #[instrument(name = "FredLatestFetch", skip(self), fields(series = %symbol))]
    async fn fetch_latest(&self, symbol: &str) -> Result<f64> {
        let params = [("sort_order", "desc".to_string()), ("limit", "10".to_string())];
        let observations = self.fetch_observations(symbol, &params).await?;

        observations
            .iter()
            .find_map(Observation::to_point)
            .map(|p| p.value)
            .ok_or_else(|| anyhow!("No observations found for series: {}", symbol))
    }

    #[instrument(name = "FredHistoryFetch", skip(self), fields(series = %symbol))]
    async fn fetch_history(
        &self,
        symbol: &str,
        window: HistoryWindow,
    ) -> Result<Vec<HistoryPoint>> {
        let params = [
            ("observation_start", window.start.format(DATE_FORMAT).to_string()),
            ("observation_end", window.end.format(DATE_FORMAT).to_string()),
        ];
        let observations = self.fetch_observations(symbol, &params).await?;

        let mut history: Vec<HistoryPoint> =
            observations.iter().filter_map(Observation::to_point).collect();
        history.sort_by_key(|p| p.date);
        debug!(
            points = history.len(),
            skipped = observations.len() - history.len(),
            "Parsed FRED history"
        );
        Ok(history)
    }
}
