//! Behind-the-meter infrastructure costs for electrification progression.
//!
//! Estimates the electrical panel capacity of building stock models, assigns
//! technology adoptions (EVs, PV, heat pumps, heat pump water heaters) from
//! external forecasts, and prices the panel upgrades the added load requires.

#[cfg(feature = "api")]
pub mod api;
pub mod config;
pub mod data;
pub mod error;
pub mod io;
/// Capacity, adoption, and upgrade cost model.
pub mod model;
pub mod parsing;
pub mod sampling;
#[cfg(feature = "tui")]
pub mod tui;
pub mod types;

pub use error::{BicepError, Result};
