//! Weighted cost aggregation and the end-to-end model run.

use std::collections::BTreeMap;
use std::fmt;

use log::info;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;

use crate::config::ModelConfig;
use crate::data::Dataset;
use crate::error::Result;
use crate::model::{BuildingRecord, CapacityEstimate, TechnologyAdoption, upgrades};
use crate::types::{AggregationLevel, Sector, Technology};

/// Key of the single region reported at the national level.
pub const NATIONAL: &str = "national";

/// Which per-building cost is aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CostBasis {
    /// Equivalent annual cost over the upgrade lifespan.
    EquivalentAnnual,
    /// Up-front cost in base year dollars.
    BaseYear,
    /// Escalated cost in the upgrade year, discounted to the base year.
    PresentValue,
}

impl CostBasis {
    pub fn from_config(config: &ModelConfig) -> Self {
        if config.costs.annualized {
            Self::EquivalentAnnual
        } else if config.rates_differ() {
            Self::PresentValue
        } else {
            Self::BaseYear
        }
    }

    pub fn cost(self, building: &BuildingRecord) -> Option<f64> {
        match self {
            Self::EquivalentAnnual => building.equiv_annual_cost,
            Self::BaseYear => building.upgrade_costs,
            Self::PresentValue => building.pv_upgrade_cost,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::EquivalentAnnual => "equivalent annual cost",
            Self::BaseYear => "base year cost",
            Self::PresentValue => "present value",
        }
    }
}

/// Aggregate upgrade costs of one model run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostReport {
    pub scenario: String,
    pub cost_basis: CostBasis,
    pub buildings_modeled: usize,
    /// Building models needing a panel upgrade.
    pub upgrades_required: usize,
    /// Real buildings needing a panel upgrade (sum of weights).
    pub weighted_upgrades: f64,
    /// Weighted adopting buildings per technology.
    pub adopters: BTreeMap<String, f64>,
    /// Weighted cost per state, or one `"national"` entry.
    pub state_costs: BTreeMap<String, f64>,
    pub total_cost: f64,
    pub residential_cost: f64,
    pub commercial_cost: f64,
}

impl CostReport {
    /// Sets `weighted_cost` on every building and sums the results.
    pub fn from_buildings(
        buildings: &mut [BuildingRecord],
        basis: CostBasis,
        level: AggregationLevel,
        scenario: &str,
    ) -> Self {
        let mut state_costs: BTreeMap<String, f64> = BTreeMap::new();
        let mut adopters: BTreeMap<String, f64> = BTreeMap::new();
        let mut residential_cost = 0.0;
        let mut commercial_cost = 0.0;
        let mut upgrades_required = 0;
        let mut weighted_upgrades = 0.0;

        for b in buildings.iter_mut() {
            b.weighted_cost = basis.cost(b).unwrap_or(0.0) * b.weight;

            let region = match level {
                AggregationLevel::State => b.state.as_str(),
                AggregationLevel::National => NATIONAL,
            };
            *state_costs.entry(region.to_string()).or_default() += b.weighted_cost;

            match b.sector {
                Sector::Residential => residential_cost += b.weighted_cost,
                Sector::Commercial => commercial_cost += b.weighted_cost,
            }
            if b.upgrade_required {
                upgrades_required += 1;
                weighted_upgrades += b.weight;
            }
            for tech in [
                Technology::Ev,
                Technology::Pv,
                Technology::HeatPump,
                Technology::HeatPumpWaterHeater,
            ] {
                let entry = adopters.entry(tech.as_str().to_string()).or_default();
                if b.adopted(tech) {
                    *entry += b.weight;
                }
            }
        }

        Self {
            scenario: scenario.to_string(),
            cost_basis: basis,
            buildings_modeled: buildings.len(),
            upgrades_required,
            weighted_upgrades,
            adopters,
            total_cost: state_costs.values().sum(),
            state_costs,
            residential_cost,
            commercial_cost,
        }
    }
}

impl fmt::Display for CostReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Upgrade Cost Report ---")?;
        writeln!(f, "Scenario:              {}", self.scenario)?;
        writeln!(f, "Cost basis:            {}", self.cost_basis.label())?;
        writeln!(f, "Buildings modeled:     {}", self.buildings_modeled)?;
        writeln!(
            f,
            "Upgrades required:     {} ({:.1} weighted)",
            self.upgrades_required, self.weighted_upgrades
        )?;
        for (tech, weighted) in &self.adopters {
            writeln!(f, "Adopters {:<13} {:.1}", format!("{tech}:"), weighted)?;
        }
        for (state, cost) in &self.state_costs {
            writeln!(f, "Cost {:<17} ${:.2}", format!("{state}:"), cost)?;
        }
        writeln!(f, "Residential cost:      ${:.2}", self.residential_cost)?;
        writeln!(f, "Commercial cost:       ${:.2}", self.commercial_cost)?;
        write!(f, "Total cost:            ${:.2}", self.total_cost)
    }
}

/// Per-building results and the aggregate report of one run.
#[derive(Debug, Clone)]
pub struct ModelRun {
    pub seed: u64,
    pub buildings: Vec<BuildingRecord>,
    pub report: CostReport,
}

/// Runs capacity estimation, adoption, upgrade pricing, and aggregation.
pub struct UpgradeEstimator<'a> {
    config: &'a ModelConfig,
    dataset: &'a Dataset,
}

impl<'a> UpgradeEstimator<'a> {
    pub fn new(config: &'a ModelConfig, dataset: &'a Dataset) -> Self {
        Self { config, dataset }
    }

    /// One model run with all draws taken from `seed`.
    pub fn run(&self, seed: u64) -> Result<ModelRun> {
        let mut rng = StdRng::seed_from_u64(seed);
        let level = self.config.aggregation_level()?;
        let adoption = TechnologyAdoption::new(self.config, self.dataset)?;

        let mut buildings = CapacityEstimate::new(self.config, self.dataset).calculate_capacity(&mut rng)?;
        adoption.calculate_adoptions(&mut buildings, &mut rng)?;

        let required = upgrades::required_upgrades(&mut buildings);
        info!("{required} of {} buildings require a panel upgrade", buildings.len());
        upgrades::upgrade_costs(
            &mut buildings,
            self.config,
            &self.dataset.state_cost_factors(),
            &mut rng,
        )?;

        let report = CostReport::from_buildings(
            &mut buildings,
            CostBasis::from_config(self.config),
            level,
            adoption.scenario().as_str(),
        );
        Ok(ModelRun {
            seed,
            buildings,
            report,
        })
    }
}
