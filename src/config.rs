//! TOML-based model configuration and preset definitions.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BicepError, Result};
use crate::types::{AggregationLevel, Scenario};

/// Top-level model configuration parsed from TOML.
///
/// All fields have defaults matching the business-as-usual run. Load from
/// TOML with [`ModelConfig::from_toml_file`] or use [`ModelConfig::bau`]
/// for the built-in default.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    /// Scenario, horizon, and sampling parameters.
    #[serde(default)]
    pub model: ModelSection,
    /// Service voltages and panel sizing rules.
    #[serde(default)]
    pub electrical: ElectricalConfig,
    /// Upgrade cost distribution and financial parameters.
    #[serde(default)]
    pub costs: CostConfig,
    /// x-stock upgrade ids used as technology load differences.
    #[serde(default)]
    pub upgrades: UpgradeIds,
    /// Input data location.
    #[serde(default)]
    pub data: DataConfig,
}

/// Scenario, horizon, and sampling parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelSection {
    /// Adoption scenario: `"bau"` or `"high"`.
    pub scenario: String,
    /// First year of the forecast horizon.
    pub base_year: i32,
    /// Last year of the forecast horizon.
    pub end_year: i32,
    /// Relative tolerance for iterative adoption.
    pub epsilon: f64,
    /// Master random seed.
    pub seed: u64,
    /// Number of Monte Carlo iterations.
    pub iterations: usize,
    /// Cost aggregation level: `"state"` or `"national"`.
    pub aggregation_level: String,
    /// Models a random sample of this many stock buildings instead of the
    /// whole stock; weights are scaled up to the stock size.
    pub sample_size: Option<usize>,
}

impl Default for ModelSection {
    fn default() -> Self {
        Self {
            scenario: "bau".to_string(),
            base_year: 2020,
            end_year: 2050,
            epsilon: 0.0001,
            seed: 42,
            iterations: 1,
            aggregation_level: "state".to_string(),
            sample_size: None,
        }
    }
}

/// Service voltages and panel sizing rules.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ElectricalConfig {
    /// Residential service voltage (V).
    pub residential_voltage: f64,
    /// Light commercial service voltage (V).
    pub commercial_voltage: f64,
    /// Medium voltage service for large commercial buildings (V).
    pub medium_voltage: f64,
    /// Largest light commercial service before moving to medium voltage (A).
    pub max_light_comm_amp: f64,
    /// Rating of one level 2 EV charger circuit at residential voltage (A).
    pub ev_charger_amp: f64,
    /// Multiplier applied to measured peak demand (NEC 220.87).
    pub panel_safety_factor: f64,
    /// Length of one timeseries interval (minutes).
    pub interval_minutes: f64,
    /// Lower bound on sampled panel utilization.
    pub min_utilization: f64,
    /// Upper bound on sampled panel utilization.
    pub max_utilization: f64,
}

impl Default for ElectricalConfig {
    fn default() -> Self {
        Self {
            residential_voltage: 240.0,
            commercial_voltage: 480.0,
            medium_voltage: 12470.0,
            max_light_comm_amp: 1000.0,
            ev_charger_amp: 50.0,
            panel_safety_factor: 1.25,
            interval_minutes: 15.0,
            min_utilization: 0.2,
            max_utilization: 1.0,
        }
    }
}

/// Upgrade cost distribution and financial parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CostConfig {
    /// Nominal inflation rate used for future values.
    pub nominal_inflation_rate: f64,
    /// Discount rate back to base-year dollars.
    pub discount_rate: f64,
    /// Report equivalent annual costs instead of lump sums.
    pub annualized: bool,
    /// Upgrade lifespan used for annualization (years).
    pub upgrade_lifespan: u32,
    /// Cost distribution family: `"lognormal"` or `"frechet"`.
    pub distribution: String,
    /// Largest accepted residential upgrade cost draw ($).
    pub residential_max_cost: f64,
    /// Largest accepted commercial upgrade cost draw ($).
    pub commercial_max_cost: f64,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            nominal_inflation_rate: 0.02,
            discount_rate: 0.02,
            annualized: true,
            upgrade_lifespan: 25,
            distribution: "lognormal".to_string(),
            residential_max_cost: 35_000.0,
            commercial_max_cost: 350_000.0,
        }
    }
}

/// x-stock upgrade ids whose peak loads represent adopted technologies.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpgradeIds {
    pub residential_heat_pump: Option<u32>,
    pub residential_hpwh: Option<u32>,
    pub commercial_heat_pump: Option<u32>,
    pub commercial_hpwh: Option<u32>,
}

impl Default for UpgradeIds {
    fn default() -> Self {
        Self {
            residential_heat_pump: Some(4),
            residential_hpwh: Some(6),
            commercial_heat_pump: Some(3),
            commercial_hpwh: None,
        }
    }
}

impl UpgradeIds {
    /// All configured `(upgrade, residential)` pairs.
    pub fn pairs(&self) -> Vec<(u32, bool)> {
        let mut pairs = Vec::new();
        let candidates = [
            (self.residential_heat_pump, true),
            (self.residential_hpwh, true),
            (self.commercial_heat_pump, false),
            (self.commercial_hpwh, false),
        ];
        for (upgrade, residential) in candidates {
            if let Some(u) = upgrade {
                if !pairs.contains(&(u, residential)) {
                    pairs.push((u, residential));
                }
            }
        }
        pairs
    }
}

/// Input data location.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    /// Data root holding `raw_inputs/`, `parsed_inputs/`, `required_input/`.
    pub root: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("data"),
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"model.base_year"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

impl From<ConfigError> for BicepError {
    fn from(e: ConfigError) -> Self {
        BicepError::Config(e.to_string())
    }
}

impl ModelConfig {
    /// Returns the business-as-usual preset.
    pub fn bau() -> Self {
        Self {
            model: ModelSection::default(),
            electrical: ElectricalConfig::default(),
            costs: CostConfig::default(),
            upgrades: UpgradeIds::default(),
            data: DataConfig::default(),
        }
    }

    /// Returns the high electrification preset.
    pub fn high() -> Self {
        Self {
            model: ModelSection {
                scenario: "high".to_string(),
                ..ModelSection::default()
            },
            ..Self::bau()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["bau", "high"];

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> std::result::Result<Self, ConfigError> {
        match name {
            "bau" => Ok(Self::bau()),
            "high" => Ok(Self::high()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> std::result::Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> std::result::Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Parsed adoption scenario.
    pub fn scenario(&self) -> Result<Scenario> {
        self.model.scenario.parse()
    }

    /// Parsed aggregation level.
    pub fn aggregation_level(&self) -> Result<AggregationLevel> {
        self.model.aggregation_level.parse()
    }

    /// Whether costs must be escalated and discounted per upgrade year.
    pub fn rates_differ(&self) -> bool {
        self.costs.discount_rate != self.costs.nominal_inflation_rate
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let mut push = |field: &str, message: String| {
            errors.push(ConfigError {
                field: field.to_string(),
                message,
            });
        };

        let m = &self.model;
        if m.scenario.parse::<Scenario>().is_err() {
            push(
                "model.scenario",
                format!("must be \"bau\" or \"high\", got \"{}\"", m.scenario),
            );
        }
        if m.base_year >= m.end_year {
            push("model.base_year", "must be < model.end_year".into());
        }
        if !(m.epsilon > 0.0 && m.epsilon < 1.0) {
            push("model.epsilon", "must be in (0, 1)".into());
        }
        if m.iterations == 0 {
            push("model.iterations", "must be > 0".into());
        }
        if m.sample_size == Some(0) {
            push("model.sample_size", "must be > 0 when set".into());
        }
        if m.aggregation_level.parse::<AggregationLevel>().is_err() {
            push(
                "model.aggregation_level",
                format!(
                    "must be \"state\" or \"national\", got \"{}\"",
                    m.aggregation_level
                ),
            );
        }

        let e = &self.electrical;
        for (field, value) in [
            ("electrical.residential_voltage", e.residential_voltage),
            ("electrical.commercial_voltage", e.commercial_voltage),
            ("electrical.medium_voltage", e.medium_voltage),
            ("electrical.max_light_comm_amp", e.max_light_comm_amp),
            ("electrical.ev_charger_amp", e.ev_charger_amp),
            ("electrical.interval_minutes", e.interval_minutes),
        ] {
            if value <= 0.0 {
                push(field, "must be > 0".into());
            }
        }
        if e.panel_safety_factor < 1.0 {
            push("electrical.panel_safety_factor", "must be >= 1.0".into());
        }
        if !(e.min_utilization > 0.0
            && e.min_utilization <= e.max_utilization
            && e.max_utilization <= 1.0)
        {
            push(
                "electrical.min_utilization",
                "must satisfy 0 < min_utilization <= max_utilization <= 1".into(),
            );
        }

        let c = &self.costs;
        if c.nominal_inflation_rate <= -1.0 {
            push("costs.nominal_inflation_rate", "must be > -1".into());
        }
        if c.discount_rate <= -1.0 {
            push("costs.discount_rate", "must be > -1".into());
        }
        if c.upgrade_lifespan == 0 {
            push("costs.upgrade_lifespan", "must be > 0".into());
        }
        if c.distribution != "lognormal" && c.distribution != "frechet" {
            push(
                "costs.distribution",
                format!(
                    "must be \"lognormal\" or \"frechet\", got \"{}\"",
                    c.distribution
                ),
            );
        }
        if c.residential_max_cost <= 0.0 {
            push("costs.residential_max_cost", "must be > 0".into());
        }
        if c.commercial_max_cost <= 0.0 {
            push("costs.commercial_max_cost", "must be > 0".into());
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bau_preset_valid() {
        let cfg = ModelConfig::bau();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "bau should be valid: {errors:?}");
    }

    #[test]
    fn all_presets_are_valid() {
        for name in ModelConfig::PRESETS {
            let cfg = ModelConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let errors = cfg.as_ref().map(|c| c.validate()).unwrap_or_default();
            assert!(errors.is_empty(), "preset \"{name}\" should be valid: {errors:?}");
        }
    }

    #[test]
    fn from_preset_unknown() {
        let err = ModelConfig::from_preset("medium");
        assert!(err.is_err());
        let e = err.unwrap_err();
        assert!(e.message.contains("unknown preset"));
    }

    #[test]
    fn high_preset_changes_only_scenario() {
        let high = ModelConfig::high();
        assert_eq!(high.scenario().ok(), Some(Scenario::High));
        assert_eq!(high.model.end_year, ModelConfig::bau().model.end_year);
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[model]
scenario = "high"
base_year = 2024
end_year = 2040
seed = 7
iterations = 5

[electrical]
residential_voltage = 240.0
panel_safety_factor = 1.25

[costs]
nominal_inflation_rate = 0.03
discount_rate = 0.05
annualized = false
distribution = "frechet"

[upgrades]
residential_heat_pump = 4
commercial_hpwh = 5

[data]
root = "data/sample"
"#;
        let cfg = ModelConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.model.iterations), Some(5));
        assert_eq!(cfg.as_ref().map(|c| &*c.costs.distribution), Some("frechet"));
        assert_eq!(cfg.as_ref().map(ModelConfig::rates_differ), Some(true));
        assert_eq!(
            cfg.as_ref().and_then(|c| c.upgrades.commercial_hpwh),
            Some(5)
        );
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[model]
scenario = "bau"
bogus_field = true
"#;
        assert!(ModelConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = r#"
[model]
seed = 99
"#;
        let cfg = ModelConfig::from_toml_str(toml).ok();
        assert_eq!(cfg.as_ref().map(|c| c.model.seed), Some(99));
        assert_eq!(cfg.as_ref().map(|c| c.model.base_year), Some(2020));
        assert_eq!(
            cfg.as_ref().map(|c| c.electrical.medium_voltage),
            Some(12470.0)
        );
    }

    #[test]
    fn validation_catches_bad_scenario() {
        let mut cfg = ModelConfig::bau();
        cfg.model.scenario = "medium".to_string();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "model.scenario"));
    }

    #[test]
    fn validation_catches_inverted_horizon() {
        let mut cfg = ModelConfig::bau();
        cfg.model.base_year = 2050;
        cfg.model.end_year = 2020;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "model.base_year"));
    }

    #[test]
    fn validation_catches_empty_sample() {
        let mut cfg = ModelConfig::bau();
        cfg.model.sample_size = Some(0);
        assert!(cfg.validate().iter().any(|e| e.field == "model.sample_size"));
        cfg.model.sample_size = Some(10);
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn validation_catches_bad_distribution() {
        let mut cfg = ModelConfig::bau();
        cfg.costs.distribution = "weibull".to_string();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "costs.distribution"));
    }

    #[test]
    fn validation_catches_utilization_bounds() {
        let mut cfg = ModelConfig::bau();
        cfg.electrical.min_utilization = 0.9;
        cfg.electrical.max_utilization = 0.5;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "electrical.min_utilization"));
    }

    #[test]
    fn upgrade_pairs_skip_unset_ids() {
        let pairs = UpgradeIds::default().pairs();
        assert_eq!(pairs, vec![(4, true), (6, true), (3, false)]);
    }
}
