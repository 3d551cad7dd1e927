//! Parsers for external model outputs.

pub mod scout;
pub mod timeseries;

pub use scout::{StockRecord, TechnologyStockParser};
pub use timeseries::{PeakLoadRecord, TimeseriesFile, parse_file_url, peak_from_timeseries};
