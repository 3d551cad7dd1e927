//! Distributions and sampling used throughout the model.
//!
//! Distributions are a mix of kernel density estimates from empirical data
//! and parameterized distributions based on rules of thumb and common
//! industry values from the literature.

pub mod distribution;

use std::str::FromStr;

use rand::rngs::StdRng;
use rand::seq::index;

use crate::data::{PanelCapacity, StockMeta};
use crate::error::{BicepError, Result};
use crate::types::Sector;

pub use distribution::{Distribution, Frechet, GaussianKde, LogNormal, Normal, histogram};

/// PV size to building peak load ratios from NREL/TP-6A20-64793,
/// "Nationwide Analysis of U.S. Commercial Building Solar Photovoltaic (PV)
/// Breakeven Conditions".
pub const NREL_PV_SIZE_RATIOS: [f64; 15] = [
    0.16139, 0.17360, 0.19603, 0.19938, 0.26415, 0.30769, 0.38235, 0.38346, 0.54924, 0.75204,
    1.13462, 1.13978, 1.36842, 1.38415, 1.95833,
];

/// Panel utilization (peak load / panel rating) from empirical panel data.
pub fn panel_utilization(panel_data: &[PanelCapacity]) -> GaussianKde {
    let ratios: Vec<f64> = panel_data
        .iter()
        .filter(|p| p.panel_size > 0.0)
        .map(|p| p.utilized / p.panel_size)
        .collect();
    GaussianKde::fit(&ratios)
}

/// PV system size relative to building peak load.
pub fn pv_sizing() -> GaussianKde {
    GaussianKde::fit(&NREL_PV_SIZE_RATIOS)
}

/// Share of parking spaces equipped for EV charging.
pub fn ev_spots() -> Result<Normal> {
    Normal::new(0.25, 0.1)
}

/// Parking spaces per thousand square feet (ITE Transportation Planning
/// Handbook, 3rd edition).
pub fn parking_spots() -> Result<Normal> {
    Normal::new(3.8, 0.5)
}

/// EVs per residential housing unit.
pub fn residential_ev() -> Result<Normal> {
    Normal::new(1.5, 0.5)
}

/// Family of the panel upgrade cost distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostDistributionKind {
    LogNormal,
    Frechet,
}

impl FromStr for CostDistributionKind {
    type Err = BicepError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "lognormal" => Ok(Self::LogNormal),
            "frechet" => Ok(Self::Frechet),
            other => Err(BicepError::InvalidDistribution(format!(
                "distribution choices are (\"lognormal\", \"frechet\"), got \"{other}\""
            ))),
        }
    }
}

/// Cost to upgrade the panel of one building.
///
/// Empirical data is limited and costs vary widely with local electric code,
/// building characteristics, and the utility. Both families have a long
/// right tail.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanelUpgradeCost {
    LogNormal(LogNormal),
    Frechet(Frechet),
}

impl PanelUpgradeCost {
    pub fn new(sector: Sector, kind: CostDistributionKind) -> Result<Self> {
        Ok(match (sector, kind) {
            (Sector::Residential, CostDistributionKind::LogNormal) => {
                Self::LogNormal(LogNormal::new(1.2, 3000.0, 0.0)?)
            }
            (Sector::Residential, CostDistributionKind::Frechet) => {
                Self::Frechet(Frechet::new(1.5, 1500.0, 1000.0)?)
            }
            (Sector::Commercial, CostDistributionKind::LogNormal) => {
                Self::LogNormal(LogNormal::new(1.2, 30_000.0, 10_000.0)?)
            }
            (Sector::Commercial, CostDistributionKind::Frechet) => {
                Self::Frechet(Frechet::new(1.5, 15_000.0, 10_000.0)?)
            }
        })
    }
}

impl Distribution for PanelUpgradeCost {
    fn draw(&self, rng: &mut StdRng) -> f64 {
        match self {
            Self::LogNormal(d) => d.draw(rng),
            Self::Frechet(d) => d.draw(rng),
        }
    }
}

/// Random sample of `(building_id, sector)` pairs from the stock.
///
/// `sector` restricts the sample to one sector; `n` larger than the
/// candidate set returns the whole set in random order.
pub fn sample_stock(
    stock: &[StockMeta],
    n: usize,
    sector: Option<Sector>,
    rng: &mut StdRng,
) -> Vec<(u64, Sector)> {
    let candidates: Vec<&StockMeta> = stock
        .iter()
        .filter(|b| sector.is_none_or(|s| b.sector() == s))
        .collect();
    let amount = n.min(candidates.len());
    index::sample(rng, candidates.len(), amount)
        .into_iter()
        .map(|i| (candidates[i].building_id, candidates[i].sector()))
        .collect()
}
