//! Technology stock projections from nested Scout JSON outputs.
//!
//! Each technology in the map is read from the high or stated (BAU)
//! scenario file, walked down to per-state, per-building-type, per-end-use,
//! per-fuel yearly stock values, converted to equipment units, and summed
//! over new and existing buildings.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::data::AdoptionForecast;
use crate::error::{BicepError, Result};
use crate::types::{Scenario, Sector};

/// Columns the technology map must provide.
pub const REQUIRED_MAP_COLUMNS: [&str; 6] = [
    "Technology",
    "WHICH_SCENARIO_HELPER",
    "BICEP Technology",
    "BICEP Sector",
    "BICEP End-Use",
    "BICEP Fuel",
];

/// Column order of the aggregated output.
pub const OUTPUT_COLUMNS: [&str; 9] = [
    "year",
    "stock",
    "sector",
    "fuel",
    "end_use",
    "technology",
    "state",
    "metric",
    "scenario",
];

/// Projection years kept from the JSON.
pub const YEARS: std::ops::RangeInclusive<i32> = 2024..=2050;

const BASE_UNIT: &str = "units equipment";
const MARKETS_PATH: [&str; 2] = ["Markets and Savings (by Category)", "Max adoption potential"];

/// One row of the Scout technology map.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TechMapRow {
    #[serde(rename = "Technology")]
    pub technology: String,
    #[serde(rename = "WHICH_SCENARIO_HELPER")]
    pub scenario_helper: String,
    #[serde(rename = "BICEP Technology")]
    pub bicep_technology: String,
    /// `resid` or `comm`.
    #[serde(rename = "BICEP Sector")]
    pub bicep_sector: String,
    #[serde(rename = "BICEP End-Use")]
    pub bicep_end_use: String,
    #[serde(rename = "BICEP Fuel")]
    pub bicep_fuel: String,
}

/// Stock of one technology for one state, fuel, end use, and year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRecord {
    pub year: i32,
    pub stock: f64,
    pub sector: String,
    pub fuel: String,
    pub end_use: String,
    pub technology: String,
    pub state: String,
    pub metric: String,
    pub scenario: String,
}

/// Factors converting Scout stock units to equipment units.
#[derive(Debug, Clone)]
pub struct UnitRegistry {
    factors: HashMap<String, f64>,
    unknown: BTreeSet<String>,
}

impl Default for UnitRegistry {
    fn default() -> Self {
        // Scout reports every stock measure 1:1 with equipment until
        // per-unit conversions are published.
        let factors = [
            BASE_UNIT,
            "TBtu",
            "MMBtu",
            "TBtu heating served",
            "TBtu cooling served",
            "units building",
        ]
        .into_iter()
        .map(|u| (u.to_string(), 1.0))
        .collect();
        Self {
            factors,
            unknown: BTreeSet::new(),
        }
    }
}

impl UnitRegistry {
    /// Converts `value` in `unit` to equipment units. Unknown units pass
    /// through unchanged and are remembered.
    pub fn convert(&mut self, value: f64, unit: &str) -> f64 {
        if unit == BASE_UNIT {
            return value;
        }
        match self.factors.get(unit) {
            Some(factor) => value * factor,
            None => {
                if self.unknown.insert(unit.to_string()) {
                    warn!("Unknown unit '{unit}' - using value as-is");
                }
                value
            }
        }
    }

    pub fn unknown_units(&self) -> &BTreeSet<String> {
        &self.unknown
    }
}

/// Unit in parentheses of a stock key, e.g. `Measure Stock (units equipment)`.
pub fn extract_unit(key: &str) -> Option<&str> {
    let start = key.find('(')?;
    let end = start + key[start..].find(')')?;
    Some(key[start + 1..end].trim())
}

pub fn map_fuel_type(fuel: &str) -> String {
    match fuel {
        "Electric" => "electricity".to_string(),
        "Natural Gas" => "gas".to_string(),
        "Propane" | "Distillate/Other" => "refined liquids".to_string(),
        "Biomass" => "biomass".to_string(),
        other => other.to_lowercase(),
    }
}

pub fn map_end_use(end_use: &str) -> String {
    match end_use {
        "Heating (Equip.)" => "heating".to_string(),
        "Cooling (Equip.)" => "cooling".to_string(),
        "Water Heating" => "hot water".to_string(),
        "Computers and Electronics" => "electronics".to_string(),
        other => other.to_lowercase(),
    }
}

/// Full state name for a two-letter code; unknown codes are returned as is.
pub fn map_state_code(code: &str) -> &str {
    match code {
        "AL" => "Alabama",
        "AZ" => "Arizona",
        "AR" => "Arkansas",
        "CA" => "California",
        "CO" => "Colorado",
        "CT" => "Connecticut",
        "DE" => "Delaware",
        "DC" => "District of Columbia",
        "FL" => "Florida",
        "GA" => "Georgia",
        "ID" => "Idaho",
        "IL" => "Illinois",
        "IN" => "Indiana",
        "IA" => "Iowa",
        "KS" => "Kansas",
        "KY" => "Kentucky",
        "LA" => "Louisiana",
        "ME" => "Maine",
        "MD" => "Maryland",
        "MA" => "Massachusetts",
        "MI" => "Michigan",
        "MN" => "Minnesota",
        "MS" => "Mississippi",
        "MO" => "Missouri",
        "MT" => "Montana",
        "NE" => "Nebraska",
        "NV" => "Nevada",
        "NH" => "New Hampshire",
        "NJ" => "New Jersey",
        "NM" => "New Mexico",
        "NY" => "New York",
        "NC" => "North Carolina",
        "ND" => "North Dakota",
        "OH" => "Ohio",
        "OK" => "Oklahoma",
        "OR" => "Oregon",
        "PA" => "Pennsylvania",
        "RI" => "Rhode Island",
        "SC" => "South Carolina",
        "SD" => "South Dakota",
        "TN" => "Tennessee",
        "TX" => "Texas",
        "UT" => "Utah",
        "VT" => "Vermont",
        "VA" => "Virginia",
        "WA" => "Washington",
        "WV" => "West Virginia",
        "WI" => "Wisconsin",
        "WY" => "Wyoming",
        other => other,
    }
}

/// Building type keys of a Scout sector.
pub fn building_types(sector: &str) -> Result<[&'static str; 2]> {
    match sector {
        "resid" => Ok(["Residential (New)", "Residential (Existing)"]),
        "comm" => Ok(["Commercial (New)", "Commercial (Existing)"]),
        other => Err(BicepError::Parse(format!("unknown sector: {other}"))),
    }
}

/// Model sector of a Scout sector name.
pub fn scout_sector(sector: &str) -> Result<Sector> {
    match sector {
        "resid" => Ok(Sector::Residential),
        "comm" => Ok(Sector::Commercial),
        other => Err(BicepError::Parse(format!("unknown sector: {other}"))),
    }
}

fn navigate<'v>(value: &'v Value, path: &[&str]) -> Option<&'v Value> {
    path.iter().try_fold(value, |current, key| current.as_object()?.get(*key))
}

fn stock_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Stock value found in the JSON, before unit conversion.
struct PendingStock {
    year: i32,
    stock: f64,
    unit: String,
    state: String,
    fuel: String,
    end_use: String,
}

pub struct TechnologyStockParser {
    high: Value,
    stated: Value,
    mapping: Vec<TechMapRow>,
    units: UnitRegistry,
}

impl TechnologyStockParser {
    /// Loads both scenario files and the technology map.
    pub fn new(high_json: &Path, stated_json: &Path, tech_map: &Path) -> Result<Self> {
        let high = load_json(high_json)?;
        let stated = load_json(stated_json)?;
        let file = File::open(tech_map).map_err(|e| BicepError::io(tech_map, e))?;
        let mapping = load_tech_mapping(file)?;
        Ok(Self::from_parts(high, stated, mapping))
    }

    pub fn from_parts(high: Value, stated: Value, mapping: Vec<TechMapRow>) -> Self {
        Self {
            high,
            stated,
            mapping,
            units: UnitRegistry::default(),
        }
    }

    pub fn unknown_units(&self) -> &BTreeSet<String> {
        self.units.unknown_units()
    }

    /// Scenario and JSON subtree to read a technology from.
    ///
    /// Shared technologies come from the high scenario, falling back to the
    /// stated scenario when the high file lacks them.
    pub fn scenario_source(&self, tech: &str, helper: &str) -> Result<(Scenario, &Value)> {
        let missing = |which: &str| BicepError::Parse(format!("technology '{tech}' not found in {which}"));
        match helper {
            "Only in BAU Scenario" => self
                .stated
                .get(tech)
                .map(|v| (Scenario::Bau, v))
                .ok_or_else(|| missing("stated scenario")),
            "Only in High Scenario" => self
                .high
                .get(tech)
                .map(|v| (Scenario::High, v))
                .ok_or_else(|| missing("high scenario")),
            "Shared" => match (self.high.get(tech), self.stated.get(tech)) {
                (Some(v), _) => Ok((Scenario::High, v)),
                (None, Some(v)) => Ok((Scenario::Bau, v)),
                (None, None) => Err(missing("either scenario")),
            },
            other => Err(BicepError::Parse(format!("unknown scenario helper: {other}"))),
        }
    }

    /// Per-building-type stock rows of one mapped technology.
    pub fn extract_technology_stock(&mut self, row: &TechMapRow) -> Result<Vec<StockRecord>> {
        let (scenario, data) = self.scenario_source(&row.technology, &row.scenario_helper)?;
        let types = building_types(&row.bicep_sector)?;

        let Some(markets) = navigate(data, &MARKETS_PATH).and_then(Value::as_object) else {
            warn!("No market data found for technology: {}", row.technology);
            return Ok(Vec::new());
        };
        let stock_keys: Vec<&String> = markets.keys().filter(|k| k.starts_with("Measure Stock")).collect();
        if stock_keys.is_empty() {
            warn!("No measure stock data found for technology: {}", row.technology);
            return Ok(Vec::new());
        }

        let mut pending = Vec::new();
        for key in stock_keys {
            let unit = extract_unit(key).unwrap_or(BASE_UNIT).to_string();
            let Some(states) = markets.get(key).and_then(Value::as_object) else {
                continue;
            };
            for (state, by_type) in states {
                for building_type in types {
                    let Some(end_uses) = by_type.get(building_type).and_then(Value::as_object) else {
                        continue;
                    };
                    for (end_use, fuels) in end_uses {
                        let Some(fuels) = fuels.as_object() else {
                            continue;
                        };
                        for (fuel, years) in fuels {
                            let Some(years) = years.as_object() else {
                                continue;
                            };
                            for (year, value) in years {
                                let (Ok(year), Some(stock)) = (year.parse::<i32>(), stock_value(value)) else {
                                    warn!("Error processing {} data: bad entry {year}", row.technology);
                                    continue;
                                };
                                if YEARS.contains(&year) {
                                    pending.push(PendingStock {
                                        year,
                                        stock,
                                        unit: unit.clone(),
                                        state: map_state_code(state).to_string(),
                                        fuel: map_fuel_type(fuel),
                                        end_use: map_end_use(end_use),
                                    });
                                }
                            }
                        }
                    }
                }
            }
        }

        let records = pending
            .into_iter()
            .map(|p| StockRecord {
                year: p.year,
                stock: self.units.convert(p.stock, &p.unit),
                sector: row.bicep_sector.clone(),
                fuel: p.fuel,
                end_use: p.end_use,
                technology: row.bicep_technology.clone(),
                state: p.state,
                metric: "stock".to_string(),
                scenario: scenario.to_string(),
            })
            .collect();
        Ok(records)
    }

    /// Parses every mapped technology and sums over building types.
    ///
    /// A technology that fails to parse is logged and skipped.
    pub fn parse_all_technologies(&mut self) -> Vec<StockRecord> {
        let mapping = self.mapping.clone();
        let mut all = Vec::new();
        for row in &mapping {
            match self.extract_technology_stock(row) {
                Ok(records) => {
                    info!("Processed {}: {} records", row.technology, records.len());
                    all.extend(records);
                }
                Err(e) => warn!("Error processing technology '{}': {e}", row.technology),
            }
        }
        if !self.units.unknown_units().is_empty() {
            warn!(
                "Unknown units encountered: {:?}; values were used as-is",
                self.units.unknown_units()
            );
        }
        aggregate(all)
    }
}

fn load_json(path: &Path) -> Result<Value> {
    let file = File::open(path).map_err(|e| BicepError::io(path, e))?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// Reads the technology map, checking the required columns first.
pub fn load_tech_mapping<R: Read>(reader: R) -> Result<Vec<TechMapRow>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();
    if let Some(column) = REQUIRED_MAP_COLUMNS
        .iter()
        .find(|c| !headers.iter().any(|h| h == **c))
    {
        return Err(BicepError::MissingColumn {
            table: "technology map".to_string(),
            column: column.to_string(),
        });
    }
    let mut rows = Vec::new();
    for row in rdr.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

/// Sums stock over rows sharing every column but the stock.
pub fn aggregate(records: Vec<StockRecord>) -> Vec<StockRecord> {
    let mut grouped: BTreeMap<(i32, String, String, String, String, String, String, String), f64> =
        BTreeMap::new();
    for r in records {
        *grouped
            .entry((r.year, r.sector, r.fuel, r.end_use, r.technology, r.state, r.metric, r.scenario))
            .or_default() += r.stock;
    }
    grouped
        .into_iter()
        .map(
            |((year, sector, fuel, end_use, technology, state, metric, scenario), stock)| StockRecord {
                year,
                stock,
                sector,
                fuel,
                end_use,
                technology,
                state,
                metric,
                scenario,
            },
        )
        .collect()
}

/// Checks metric, scenario, and sector values of parsed output.
///
/// Problems are logged; empty output is invalid.
pub fn validate_output_format(records: &[StockRecord]) -> bool {
    if records.is_empty() {
        warn!("No stock records to validate");
        return false;
    }
    if records.iter().any(|r| r.metric != "stock") {
        warn!("Metric column should only contain 'stock'");
        return false;
    }
    let bad_scenarios: BTreeSet<&str> = records
        .iter()
        .map(|r| r.scenario.as_str())
        .filter(|s| s.parse::<Scenario>().is_err())
        .collect();
    if !bad_scenarios.is_empty() {
        warn!("Invalid scenario values: {bad_scenarios:?}");
        return false;
    }
    let bad_sectors: BTreeSet<&str> = records
        .iter()
        .map(|r| r.sector.as_str())
        .filter(|s| scout_sector(s).is_err())
        .collect();
    if !bad_sectors.is_empty() {
        warn!("Invalid sector values: {bad_sectors:?}");
        return false;
    }
    true
}

/// National stock per technology, sector, year, and scenario, as rows of
/// the `adoption_forecasts` table.
pub fn to_adoption_forecasts(records: &[StockRecord]) -> Result<Vec<AdoptionForecast>> {
    let mut grouped: BTreeMap<(String, Sector, i32, String), f64> = BTreeMap::new();
    for r in records {
        let sector = scout_sector(&r.sector)?;
        *grouped
            .entry((r.technology.clone(), sector, r.year, r.scenario.clone()))
            .or_default() += r.stock;
    }
    Ok(grouped
        .into_iter()
        .map(|((tech_name, sector, year, scenario), stock)| AdoptionForecast {
            tech_name,
            sector: Some(sector.as_str().to_string()),
            year,
            scenario,
            stock_projection: stock,
        })
        .collect())
}

/// Technologies with no `bau` forecast in `base_year`.
///
/// Scout reports from 2024 on and shared technologies are read from the
/// high scenario only, so such technologies cannot seed a model run.
pub fn missing_base_year(forecasts: &[AdoptionForecast], base_year: i32) -> Vec<String> {
    let techs: BTreeSet<&str> = forecasts.iter().map(|f| f.tech_name.as_str()).collect();
    techs
        .into_iter()
        .filter(|tech| {
            !forecasts.iter().any(|f| {
                f.tech_name == *tech && f.year == base_year && f.scenario == Scenario::Bau.as_str()
            })
        })
        .map(str::to_string)
        .collect()
}
