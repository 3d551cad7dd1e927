//! Input tables and their local CSV mirror.

pub mod mirror;
pub mod paths;
pub mod tables;

use std::collections::HashMap;

use log::info;

use crate::config::UpgradeIds;
use crate::error::Result;
use crate::model::load_diff::calc_building_peak_loads;

pub use mirror::LocalMirror;
pub use paths::DataPaths;
pub use tables::{
    AdoptionForecast, LoadDiff, PanelCapacity, PeakLoad, StateCostFactor, StockMeta, TechMapping,
    TechnologyRow,
};

/// All tables needed for one model run.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub stock: Vec<StockMeta>,
    pub peak_loads: Vec<PeakLoad>,
    pub load_diffs: Vec<LoadDiff>,
    pub technologies: Vec<TechnologyRow>,
    pub tech_mapping: Vec<TechMapping>,
    pub forecasts: Vec<AdoptionForecast>,
    pub cost_factors: Vec<StateCostFactor>,
    pub panel_capacity: Vec<PanelCapacity>,
}

impl Dataset {
    /// Loads every table below `paths`.
    ///
    /// Stock metadata, peak loads, technologies, and reference inputs are
    /// required. Load differences are derived from the peak loads when no
    /// mirror exists. Adoption forecasts come from `adoption_forecasts.csv`
    /// or the per-scenario `adoption_forecasts_<scenario>.csv` files.
    pub fn load(paths: &DataPaths, upgrades: &UpgradeIds) -> Result<Self> {
        let mirror = LocalMirror::new(paths);

        let stock: Vec<StockMeta> = mirror.require_table(mirror::STOCK_META)?;
        let peak_loads: Vec<PeakLoad> = mirror.require_table(mirror::PEAK_LOAD)?;
        let technologies = mirror.require_table(mirror::TECHNOLOGIES)?;
        let tech_mapping = mirror.require_table(mirror::TECH_MAPPING)?;

        let mut load_diffs: Vec<LoadDiff> = mirror.load_table(mirror::LOAD_DIFF)?;
        if load_diffs.is_empty() {
            info!("Deriving peak load differences from {} peak loads", peak_loads.len());
            load_diffs = calc_building_peak_loads(&peak_loads, upgrades);
        }

        let mut forecasts: Vec<AdoptionForecast> = mirror.load_table(mirror::ADOPTION_FORECASTS)?;
        if forecasts.is_empty() {
            for scenario in crate::types::Scenario::ALL {
                let name = format!("{}_{scenario}", mirror::ADOPTION_FORECASTS);
                forecasts.extend(mirror.load_table::<AdoptionForecast>(&name)?);
            }
        }

        let cost_factors = mirror::read_csv(&required(paths.cost_factor_file())?)?;
        let panel_capacity = mirror::read_csv(&required(paths.panel_capacity_file())?)?;

        info!(
            "Loaded dataset: {} buildings, {} forecasts, {} cost factors",
            stock.len(),
            forecasts.len(),
            cost_factors.len()
        );

        Ok(Self {
            stock,
            peak_loads,
            load_diffs,
            technologies,
            tech_mapping,
            forecasts,
            cost_factors,
            panel_capacity,
        })
    }

    /// Location factors keyed by state.
    pub fn state_cost_factors(&self) -> HashMap<&str, f64> {
        self.cost_factors
            .iter()
            .map(|f| (f.state.as_str(), f.factor))
            .collect()
    }
}

fn required(path: std::path::PathBuf) -> Result<std::path::PathBuf> {
    if path.exists() {
        Ok(path)
    } else {
        Err(crate::error::BicepError::MissingFile(path))
    }
}
