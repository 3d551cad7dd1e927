//! Row types for the tabular inputs, one per database table mirror.

use serde::{Deserialize, Serialize};

use crate::types::Sector;

/// Baseline metadata for one x-stock building model (`stock_meta`).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StockMeta {
    pub building_id: u64,
    pub residential: u8,
    pub state: String,
    /// Number of real buildings represented by this model.
    pub weight: f64,
    #[serde(default)]
    pub heating_fuel: String,
    #[serde(default)]
    pub hvac_heat_type: String,
    #[serde(default)]
    pub water_heating_fuel: String,
    #[serde(default)]
    pub water_heating_type: String,
    #[serde(default)]
    pub building_type: String,
    #[serde(default)]
    pub sqft: f64,
    /// Dwelling units; absent for commercial buildings.
    #[serde(default)]
    pub total_units: Option<u32>,
}

impl StockMeta {
    pub fn sector(&self) -> Sector {
        Sector::from_flag(self.residential)
    }

    /// Looks up a metadata column by the name used in the tech mapping table.
    pub fn attribute(&self, column: &str) -> Option<&str> {
        match column {
            "heating_fuel" => Some(&self.heating_fuel),
            "hvac_heat_type" => Some(&self.hvac_heat_type),
            "water_heating_fuel" => Some(&self.water_heating_fuel),
            "water_heating_type" => Some(&self.water_heating_type),
            "building_type" => Some(&self.building_type),
            "state" => Some(&self.state),
            _ => None,
        }
    }

    /// Dwelling units, with single units for commercial and single-family.
    pub fn units(&self) -> u32 {
        self.total_units.unwrap_or(1).max(1)
    }
}

/// Peak interval electricity consumption of one building model (`peak_load`).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PeakLoad {
    pub building_id: u64,
    pub upgrade: u32,
    pub residential: u8,
    pub state: String,
    pub release: String,
    /// Energy of the peak interval (kWh).
    pub max_elec_consumption_kwh: f64,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub file_path: String,
}

/// Peak load change between an upgrade and the baseline (`load_diff`).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoadDiff {
    pub building_id: u64,
    pub state: String,
    pub release: String,
    pub residential: u8,
    pub upgrade: u32,
    pub peak_diff_kwh: f64,
}

/// Technology catalog entry (`technologies`).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TechnologyRow {
    pub tech_id: u32,
    pub tech_name: String,
    #[serde(default)]
    pub end_use: String,
}

/// Mapping from Scout technologies to x-stock metadata values
/// (`scout_xstock_tech_mapping`).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TechMapping {
    pub tech_id: u32,
    pub xstock_fuel: String,
    pub xstock_type: String,
    /// Stock metadata column holding the fuel.
    pub fuel_col: String,
    /// Stock metadata column holding the equipment type.
    pub type_col: String,
}

/// Projected stock of one technology in one year (`adoption_forecasts`).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AdoptionForecast {
    pub tech_name: String,
    #[serde(default)]
    pub sector: Option<String>,
    pub year: i32,
    pub scenario: String,
    pub stock_projection: f64,
}

/// Regional construction cost multiplier (`cost_factor`).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StateCostFactor {
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "Factor")]
    pub factor: f64,
}

/// Empirical panel rating and utilized capacity sample (`panel_capacity`).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PanelCapacity {
    pub utilized: f64,
    #[serde(rename = "panel size")]
    pub panel_size: f64,
}
