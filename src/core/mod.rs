//! Core business logic abstractions

pub mod aggregator;
pub mod change;
pub mod config;
pub mod horizon;
pub mod instrument;
pub mod log;
pub mod series;

// Re-export main types for cleaner imports
pub use change::{Change, ChangeSet, compute_changes};
pub use horizon::{Horizon, HorizonTable};
pub use instrument::{AssetClass, AssetGroup, BatchReport, DataSource, Instrument, InstrumentQuote};
pub use series::{HistoryPoint, HistoryWindow, SeriesProvider};
