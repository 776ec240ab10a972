//! Instruments tracked by the dashboard and the payload rows built for them.

use crate::core::change::ChangeSet;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Yahoo,
    Fred,
}

impl Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSource::Yahoo => write!(f, "Yahoo Finance"),
            DataSource::Fred => write!(f, "FRED"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetClass {
    Metals,
    Energy,
    Agriculture,
    Currency,
    Indices,
    #[serde(rename = "Real Estate")]
    RealEstate,
    Bond,
    Rates,
    Inflation,
    Crypto,
}

impl AssetClass {
    pub fn group(&self) -> AssetGroup {
        match self {
            AssetClass::Metals | AssetClass::Energy | AssetClass::Agriculture => {
                AssetGroup::Commodities
            }
            AssetClass::Indices | AssetClass::RealEstate => AssetGroup::Markets,
            AssetClass::Bond | AssetClass::Rates | AssetClass::Inflation => AssetGroup::Bonds,
            AssetClass::Currency => AssetGroup::Currency,
            AssetClass::Crypto => AssetGroup::Crypto,
        }
    }
}

/// Dashboard section an asset class is displayed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, clap::ValueEnum)]
pub enum AssetGroup {
    Commodities,
    Currency,
    Markets,
    Bonds,
    Crypto,
}

impl Display for AssetGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                AssetGroup::Commodities => "Commodities",
                AssetGroup::Currency => "Currency",
                AssetGroup::Markets => "Markets",
                AssetGroup::Bonds => "Bonds & Rates",
                AssetGroup::Crypto => "Crypto",
            }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub name: String,
    pub symbol: String,
    pub source: DataSource,
    #[serde(rename = "type")]
    pub asset_class: AssetClass,
    /// Directly traded price, as opposed to a derived series such as a yield.
    #[serde(default)]
    pub spot_price: bool,
}

/// One dashboard row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentQuote {
    pub name: String,
    pub value: f64,
    #[serde(rename = "type")]
    pub asset_class: AssetClass,
    pub spot_price: bool,
    #[serde(flatten)]
    pub changes: ChangeSet,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstrumentFailure {
    pub name: String,
    pub symbol: String,
    pub error: String,
}

/// Result of a dashboard refresh. Failed instruments do not prevent the
/// others from being reported.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub quotes: Vec<InstrumentQuote>,
    pub failures: Vec<InstrumentFailure>,
}
