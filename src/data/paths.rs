//! Directory layout of the input data.

use std::fs;
use std::path::PathBuf;

use crate::error::{BicepError, Result};

pub const SCOUT_BAU_FILE: &str = "Scout_ref_scenario.json";
pub const SCOUT_HIGH_FILE: &str = "Scout_high_scenario.json";
pub const EV_PROJECTIONS_FILE: &str = "TEMPO_LDV_EV_county_stock_projections.csv";
pub const PV_PROJECTIONS_FILE: &str = "distpvcap_stscen2023_mid_case_utf8.csv";
pub const HIERARCHY_FILE: &str = "hierarchy.csv";
pub const TECHNOLOGY_MAP_FILE: &str = "technology_map.csv";
pub const SCOUT_STOCK_FILE: &str = "scout_technology_stock.csv";
pub const COST_FACTOR_FILE: &str = "cost_factor.csv";
pub const PANEL_CAPACITY_FILE: &str = "panel_capacity.csv";

/// Paths below one data root.
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub root: PathBuf,
}

impl DataPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Raw model outputs (Scout, TEMPO, dGen).
    pub fn raw_inputs(&self) -> PathBuf {
        self.root.join("raw_inputs")
    }

    /// Parsed tables mirroring the database.
    pub fn parsed_inputs(&self) -> PathBuf {
        self.root.join("parsed_inputs")
    }

    /// Static reference data required by every run.
    pub fn required_input(&self) -> PathBuf {
        self.root.join("required_input")
    }

    pub fn raw_input_path(&self, filename: &str) -> PathBuf {
        self.raw_inputs().join(filename)
    }

    pub fn parsed_output_path(&self, filename: &str) -> PathBuf {
        self.parsed_inputs().join(filename)
    }

    pub fn cost_factor_file(&self) -> PathBuf {
        self.required_input().join(COST_FACTOR_FILE)
    }

    pub fn panel_capacity_file(&self) -> PathBuf {
        self.required_input().join(PANEL_CAPACITY_FILE)
    }

    /// Creates the input directories if they do not exist.
    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [self.raw_inputs(), self.parsed_inputs(), self.required_input()] {
            fs::create_dir_all(&dir).map_err(|e| BicepError::io(&dir, e))?;
        }
        Ok(())
    }

    /// Required reference files that are missing.
    pub fn validate_required_files(&self) -> Vec<PathBuf> {
        missing([self.cost_factor_file(), self.panel_capacity_file()])
    }

    /// Raw data files that are missing.
    pub fn validate_data_files(&self) -> Vec<PathBuf> {
        missing(
            [
                SCOUT_BAU_FILE,
                SCOUT_HIGH_FILE,
                EV_PROJECTIONS_FILE,
                PV_PROJECTIONS_FILE,
                HIERARCHY_FILE,
            ]
            .map(|f| self.raw_input_path(f)),
        )
    }
}

fn missing<I: IntoIterator<Item = PathBuf>>(paths: I) -> Vec<PathBuf> {
    paths.into_iter().filter(|p| !p.exists()).collect()
}
