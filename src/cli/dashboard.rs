use super::ui;
use crate::core::aggregator::{QuoteAggregator, SeriesProviders};
use crate::core::config::AppConfig;
use crate::core::{
    AssetGroup, BatchReport, DataSource, HorizonTable, Instrument, InstrumentQuote, SeriesProvider,
};
use crate::providers::fred::FredProvider;
use crate::providers::yahoo_finance::YahooFinanceProvider;
use anyhow::Result;
use chrono::{DateTime, Utc};
use comfy_table::Cell;
use std::collections::BTreeMap;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

pub async fn run(
    config: &AppConfig,
    group: Option<AssetGroup>,
    format: OutputFormat,
) -> Result<()> {
    let instruments = select_instruments(&config.instruments, group);
    if instruments.is_empty() {
        println!("No instruments configured to display.");
        return Ok(());
    }

    let horizons = HorizonTable::standard();
    let reference = Utc::now();
    let fred_api_key = config.providers.fred_api_key();
    let fred_api_key = fred_api_key.as_deref();

    let report = match format {
        OutputFormat::Table => {
            let pb = ui::new_progress_bar(instruments.len() as u64);
            let pb_clone = pb.clone();
            let report = refresh(
                config,
                fred_api_key,
                &instruments,
                &horizons,
                reference,
                &move || pb_clone.inc(1),
            )
            .await;
            pb.finish_and_clear();
            report
        }
        OutputFormat::Json => {
            refresh(
                config,
                fred_api_key,
                &instruments,
                &horizons,
                reference,
                &|| (),
            )
            .await
        }
    };

    match format {
        OutputFormat::Table => println!("{}", render_tables(&report, &horizons)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}

/// Instruments in configuration order, optionally restricted to one group.
pub fn select_instruments(instruments: &[Instrument], group: Option<AssetGroup>) -> Vec<Instrument> {
    instruments
        .iter()
        .filter(|i| group.is_none_or(|g| i.asset_class.group() == g))
        .cloned()
        .collect()
}

/// Fetches `instruments` from the configured providers and computes their changes.
///
/// FRED instruments fail individually when `fred_api_key` is `None`.
pub async fn refresh(
    config: &AppConfig,
    fred_api_key: Option<&str>,
    instruments: &[Instrument],
    horizons: &HorizonTable,
    reference: DateTime<Utc>,
    update_callback: &(dyn Fn() + Send + Sync),
) -> BatchReport {
    let yahoo = YahooFinanceProvider::new(config.providers.yahoo_base_url());
    let fred = fred_api_key.map(|key| FredProvider::new(config.providers.fred_base_url(), key));

    if fred.is_none() && instruments.iter().any(|i| i.source == DataSource::Fred) {
        warn!("FRED API key not configured, FRED series will be unavailable");
    }
    debug!(instruments = instruments.len(), %reference, "Refreshing dashboard");

    let providers = SeriesProviders {
        yahoo: &yahoo,
        fred: fred
            .as_ref()
            .map(|p| p as &(dyn SeriesProvider + Send + Sync)),
    };
    QuoteAggregator::new(providers, horizons)
        .aggregate(instruments, reference, update_callback)
        .await
}

/// Renders one table per asset group followed by any failed instruments.
pub fn render_tables(report: &BatchReport, horizons: &HorizonTable) -> String {
    let mut groups: BTreeMap<AssetGroup, Vec<&InstrumentQuote>> = BTreeMap::new();
    for quote in &report.quotes {
        groups
            .entry(quote.asset_class.group())
            .or_default()
            .push(quote);
    }

    let mut sections = Vec::new();
    for (group, quotes) in &groups {
        let mut table = ui::new_styled_table();
        let mut header = vec![ui::header_cell("Name"), ui::header_cell("Value")];
        header.extend(horizons.iter().map(|h| ui::header_cell(&h.to_string())));
        table.set_header(header);

        for quote in quotes {
            let mut row = vec![Cell::new(&quote.name), ui::value_cell(quote.value)];
            for horizon in horizons.iter() {
                row.push(match quote.changes.get(*horizon) {
                    Some(change) => ui::change_cell(change),
                    None => ui::na_cell(),
                });
            }
            table.add_row(row);
        }

        sections.push(format!(
            "{}\n\n{table}",
            ui::style_text(&group.to_string(), ui::StyleType::Title)
        ));
    }

    if !report.failures.is_empty() {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Name"),
            ui::header_cell("Symbol"),
            ui::header_cell("Error"),
        ]);
        for failure in &report.failures {
            table.add_row(vec![
                Cell::new(&failure.name),
                Cell::new(&failure.symbol).fg(comfy_table::Color::DarkGrey),
                Cell::new(ui::style_text(&failure.error, ui::StyleType::Error)),
            ]);
        }
        sections.push(format!(
            "{}\n\n{table}",
            ui::style_text("Unavailable", ui::StyleType::Title)
        ));
    }

    if sections.is_empty() {
        return ui::style_text("No data available.", ui::StyleType::Subtle);
    }
    sections.join("\n\n")
}
