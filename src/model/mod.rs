//! Capacity, adoption, and upgrade cost model.
//!
//! A run estimates the electrical capacity of every modeled building,
//! assigns technology adoptions from the forecasts, finds the buildings
//! whose added load exceeds their spare panel capacity, and prices the
//! upgrades. [`UpgradeEstimator::run`] chains the stages.

pub mod adoption;
pub mod aggregate;
pub mod capacity;
pub mod ensemble;
pub mod finance;
pub mod load_diff;
pub mod upgrades;

use serde::Serialize;

use crate::types::{Sector, Technology};

pub use adoption::{Projection, TechnologyAdoption};
pub use aggregate::{CostBasis, CostReport, ModelRun, UpgradeEstimator};
pub use capacity::CapacityEstimate;
pub use ensemble::{Ensemble, EnsembleSummary, run_ensemble};

/// Model state of one x-stock building.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildingRecord {
    pub building_id: u64,
    pub sector: Sector,
    pub state: String,
    pub weight: f64,
    /// Position of the building's metadata in `Dataset::stock`.
    #[serde(skip)]
    pub meta_index: usize,

    pub peak_kw: f64,
    pub service_voltage: f64,
    pub panel_utilization: f64,
    pub panel_amp: f64,
    pub utilized_capacity_amp: f64,
    pub spare_capacity_amp: f64,

    pub represented_vehicles: f64,
    pub ev_req_capacity_amp: f64,
    pub pv_size_kw: f64,
    pub pv_req_capacity_amp: f64,
    pub hp_req_capacity_amp: f64,
    pub hpwh_req_capacity_amp: f64,

    pub ev_adopted: bool,
    pub pv_adopted: bool,
    pub hp_adopted: bool,
    pub hpwh_adopted: bool,

    pub net_capacity_diff_amp: f64,
    pub required_add_capacity_amp: f64,
    pub upgrade_required: bool,

    pub upgrade_costs_base: Option<f64>,
    pub location_factor: f64,
    pub upgrade_costs: Option<f64>,
    pub equiv_annual_cost: Option<f64>,
    pub upgrade_year: Option<i32>,
    pub fv_upgrade_cost: Option<f64>,
    pub pv_upgrade_cost: Option<f64>,
    pub weighted_cost: f64,
}

impl BuildingRecord {
    /// A building with capacity fields zeroed and nothing adopted.
    pub fn new(building_id: u64, sector: Sector, state: &str, weight: f64, meta_index: usize) -> Self {
        Self {
            building_id,
            sector,
            state: state.to_string(),
            weight,
            meta_index,
            peak_kw: 0.0,
            service_voltage: 0.0,
            panel_utilization: 0.0,
            panel_amp: 0.0,
            utilized_capacity_amp: 0.0,
            spare_capacity_amp: 0.0,
            represented_vehicles: 0.0,
            ev_req_capacity_amp: 0.0,
            pv_size_kw: 0.0,
            pv_req_capacity_amp: 0.0,
            hp_req_capacity_amp: 0.0,
            hpwh_req_capacity_amp: 0.0,
            ev_adopted: false,
            pv_adopted: false,
            hp_adopted: false,
            hpwh_adopted: false,
            net_capacity_diff_amp: 0.0,
            required_add_capacity_amp: 0.0,
            upgrade_required: false,
            upgrade_costs_base: None,
            location_factor: 1.0,
            upgrade_costs: None,
            equiv_annual_cost: None,
            upgrade_year: None,
            fv_upgrade_cost: None,
            pv_upgrade_cost: None,
            weighted_cost: 0.0,
        }
    }

    pub fn adopted(&self, tech: Technology) -> bool {
        match tech {
            Technology::Ev => self.ev_adopted,
            Technology::Pv => self.pv_adopted,
            Technology::HeatPump => self.hp_adopted,
            Technology::HeatPumpWaterHeater => self.hpwh_adopted,
        }
    }

    pub fn set_adopted(&mut self, tech: Technology, adopted: bool) {
        match tech {
            Technology::Ev => self.ev_adopted = adopted,
            Technology::Pv => self.pv_adopted = adopted,
            Technology::HeatPump => self.hp_adopted = adopted,
            Technology::HeatPumpWaterHeater => self.hpwh_adopted = adopted,
        }
    }

    /// Capacity the technology would add to the panel (A).
    pub fn required_amp(&self, tech: Technology) -> f64 {
        match tech {
            Technology::Ev => self.ev_req_capacity_amp,
            Technology::Pv => self.pv_req_capacity_amp,
            Technology::HeatPump => self.hp_req_capacity_amp,
            Technology::HeatPumpWaterHeater => self.hpwh_req_capacity_amp,
        }
    }

    /// Quantity the adoption forecast of `tech` counts per building.
    pub fn projected_quantity(&self, tech: Technology) -> f64 {
        match tech {
            Technology::Ev => self.represented_vehicles,
            Technology::Pv => self.pv_size_kw,
            Technology::HeatPump | Technology::HeatPumpWaterHeater => 1.0,
        }
    }
}
