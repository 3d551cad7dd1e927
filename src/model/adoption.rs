//! Technology adoption matched to specific buildings.
//!
//! Forecasts come from external models: building technologies (heat pumps,
//! heat pump water heaters) from Scout, electric vehicles from TEMPO, and
//! PV capacity from dGen/ReEDS.

use std::collections::HashSet;

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::seq::{SliceRandom, index};

use crate::config::ModelConfig;
use crate::data::{Dataset, TechMapping};
use crate::error::{BicepError, Result};
use crate::model::BuildingRecord;
use crate::types::{EndUse, Scenario, Sector, Technology};

/// Base and end year stock of one technology.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub base: f64,
    pub end: f64,
}

impl Projection {
    /// Stock added between the base and end year.
    pub fn growth(&self) -> f64 {
        self.end - self.base
    }

    /// Share of the base year stock replaced by the end year, in `[0, 1]`.
    ///
    /// `None` when the technology has no base year stock.
    pub fn converted_fraction(&self) -> Option<f64> {
        if self.base == 0.0 {
            return None;
        }
        Some((1.0 - self.end / self.base).clamp(0.0, 1.0))
    }
}

pub struct TechnologyAdoption<'a> {
    config: &'a ModelConfig,
    dataset: &'a Dataset,
    scenario: Scenario,
}

impl<'a> TechnologyAdoption<'a> {
    /// # Errors
    ///
    /// Returns `UnknownScenario` unless the configured scenario is `bau` or
    /// `high`.
    pub fn new(config: &'a ModelConfig, dataset: &'a Dataset) -> Result<Self> {
        Ok(Self {
            config,
            dataset,
            scenario: config.scenario()?,
        })
    }

    pub fn scenario(&self) -> Scenario {
        self.scenario
    }

    /// Runs EV, PV, heat pump, and heat pump water heater adoption in order.
    pub fn calculate_adoptions(&self, buildings: &mut [BuildingRecord], rng: &mut StdRng) -> Result<()> {
        info!("Calculating adoption rate for EV");
        self.iterative_adoption(buildings, Technology::Ev, rng)?;
        info!("Calculating adoption rate for PV");
        self.iterative_adoption(buildings, Technology::Pv, rng)?;
        info!("Calculating adoption rate for HPs");
        self.building_adoption(buildings, EndUse::Heating.as_str(), rng)?;
        info!("Calculating adoption rate for HPWHs");
        self.building_adoption(buildings, EndUse::WaterHeating.as_str(), rng)?;
        Ok(())
    }

    /// Base and end year projections of `tech`, optionally for one sector.
    ///
    /// The base year is always read from the `bau` scenario. A sector with
    /// no forecasts of its own falls back to the rows without a sector.
    ///
    /// # Errors
    ///
    /// Returns `UnknownTechnology` if `tech` is not in the technology table
    /// and `MissingProjection` if forecasts exist but lack the base or end
    /// year.
    pub fn tech_projections(&self, tech: &str, sector: Option<Sector>) -> Result<Option<Projection>> {
        if !self.dataset.technologies.iter().any(|t| t.tech_name == tech) {
            let known: Vec<&str> = self
                .dataset
                .technologies
                .iter()
                .map(|t| t.tech_name.as_str())
                .collect();
            return Err(BicepError::UnknownTechnology {
                name: tech.to_string(),
                known: known.join(", "),
            });
        }

        let tech_rows = self.dataset.forecasts.iter().filter(|f| f.tech_name == tech);
        let rows: Vec<_> = match sector {
            None => tech_rows.collect(),
            Some(s) => {
                let specific: Vec<_> = tech_rows
                    .clone()
                    .filter(|f| f.sector.as_deref() == Some(s.as_str()))
                    .collect();
                if specific.is_empty() {
                    tech_rows.filter(|f| f.sector.is_none()).collect()
                } else {
                    specific
                }
            }
        };
        if rows.is_empty() {
            return Ok(None);
        }

        let base_year = self.config.model.base_year;
        let end_year = self.config.model.end_year;
        let find = |year: i32, scenario: Scenario| {
            rows.iter()
                .find(|f| f.year == year && f.scenario == scenario.as_str())
                .map(|f| f.stock_projection)
                .ok_or_else(|| BicepError::MissingProjection {
                    tech: tech.to_string(),
                    scenario: scenario.to_string(),
                    year,
                })
        };

        Ok(Some(Projection {
            base: find(base_year, Scenario::Bau)?,
            end: find(end_year, self.scenario)?,
        }))
    }

    /// Marks randomly ordered buildings as adopters of `tech` until their
    /// weighted quantity covers the forecast growth.
    ///
    /// Returns the number of adopting building models.
    pub fn iterative_adoption(
        &self,
        buildings: &mut [BuildingRecord],
        tech: Technology,
        rng: &mut StdRng,
    ) -> Result<usize> {
        for b in buildings.iter_mut() {
            b.set_adopted(tech, false);
        }

        let Some(projection) = self.tech_projections(tech.as_str(), None)? else {
            warn!("No adoption forecast for {tech}; no buildings adopt");
            return Ok(0);
        };
        let mut growth = projection.growth();
        if tech == Technology::Pv {
            // MW to kW
            growth *= 1000.0;
        }
        if growth <= 0.0 {
            debug!("{tech} growth is {growth}; no buildings adopt");
            return Ok(0);
        }

        let eps = growth * self.config.model.epsilon;
        let mut order: Vec<usize> = (0..buildings.len()).collect();
        order.shuffle(rng);

        let mut estimate = 0.0;
        let mut adopters = 0;
        for i in order {
            if growth - estimate < eps {
                break;
            }
            let b = &mut buildings[i];
            b.set_adopted(tech, true);
            estimate += b.weight * b.projected_quantity(tech);
            adopters += 1;
        }
        if growth - estimate >= eps {
            warn!(
                "Stock exhausted before {tech} growth was met: {estimate:.1} of {growth:.1} assigned"
            );
        }

        debug!("{adopters} building models adopted {tech}");
        Ok(adopters)
    }

    /// Converts buildings with the technologies of `end_use` to the matching
    /// heat pump technology, by the share of base year stock the forecast
    /// replaces.
    ///
    /// Returns the number of modeled buildings that converted.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEndUse` unless `end_use` is `"heating"` or
    /// `"water heating"`.
    pub fn building_adoption(
        &self,
        buildings: &mut [BuildingRecord],
        end_use: &str,
        rng: &mut StdRng,
    ) -> Result<usize> {
        let end_use: EndUse = end_use.parse()?;
        let adopted_tech = end_use.technology();
        for b in buildings.iter_mut() {
            b.set_adopted(adopted_tech, false);
        }

        let techs: Vec<_> = self
            .dataset
            .technologies
            .iter()
            .filter(|t| t.end_use == end_use.as_str())
            .collect();
        let mapping: Vec<&TechMapping> = self
            .dataset
            .tech_mapping
            .iter()
            .filter(|m| techs.iter().any(|t| t.tech_id == m.tech_id))
            .collect();
        let Some(first) = mapping.first() else {
            warn!("No x-stock mapping for {} technologies", end_use.as_str());
            return Ok(0);
        };
        let fuel_col = first.fuel_col.as_str();
        let type_col = first.type_col.as_str();

        let mut adopters = 0;
        for tech in techs {
            let fuels: HashSet<&str> = mapping
                .iter()
                .filter(|m| m.tech_id == tech.tech_id)
                .map(|m| m.xstock_fuel.as_str())
                .collect();
            let types: HashSet<&str> = mapping
                .iter()
                .filter(|m| m.tech_id == tech.tech_id)
                .map(|m| m.xstock_type.as_str())
                .collect();

            for sector in Sector::ALL {
                let Some(fraction) = self
                    .tech_projections(&tech.tech_name, Some(sector))?
                    .and_then(|p| p.converted_fraction())
                else {
                    continue;
                };

                // the share applies to the whole stock with the technology;
                // only the modeled buildings among the picks convert
                let candidates: Vec<u64> = self
                    .dataset
                    .stock
                    .iter()
                    .filter(|m| m.sector() == sector)
                    .filter(|m| {
                        m.attribute(fuel_col).is_some_and(|v| fuels.contains(v))
                            && m.attribute(type_col).is_some_and(|v| types.contains(v))
                    })
                    .map(|m| m.building_id)
                    .collect();

                let amount = ((fraction * candidates.len() as f64).round() as usize).min(candidates.len());
                let picked: HashSet<u64> = index::sample(rng, candidates.len(), amount)
                    .into_iter()
                    .map(|i| candidates[i])
                    .collect();

                let mut converted = 0;
                for b in buildings
                    .iter_mut()
                    .filter(|b| b.sector == sector && picked.contains(&b.building_id))
                {
                    if !b.adopted(adopted_tech) {
                        b.set_adopted(adopted_tech, true);
                        converted += 1;
                    }
                }
                debug!(
                    "{} {sector}: {amount} of {} stock buildings converted, {converted} newly modeled",
                    tech.tech_name,
                    candidates.len()
                );
                adopters += converted;
            }
        }
        Ok(adopters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{AdoptionForecast, StockMeta, TechnologyRow};
    use rand::SeedableRng;

    fn tech(id: u32, name: &str, end_use: &str) -> TechnologyRow {
        TechnologyRow {
            tech_id: id,
            tech_name: name.to_string(),
            end_use: end_use.to_string(),
        }
    }

    fn forecast(name: &str, sector: Option<&str>, year: i32, scenario: &str, stock: f64) -> AdoptionForecast {
        AdoptionForecast {
            tech_name: name.to_string(),
            sector: sector.map(str::to_string),
            year,
            scenario: scenario.to_string(),
            stock_projection: stock,
        }
    }

    fn meta(id: u64, residential: u8, fuel: &str) -> StockMeta {
        StockMeta {
            building_id: id,
            residential,
            state: "CO".to_string(),
            weight: 10.0,
            heating_fuel: fuel.to_string(),
            hvac_heat_type: "Ducted Heating".to_string(),
            water_heating_fuel: fuel.to_string(),
            water_heating_type: format!("{fuel} Standard"),
            building_type: String::new(),
            sqft: 1000.0,
            total_units: Some(1),
        }
    }

    fn dataset() -> Dataset {
        let stock: Vec<StockMeta> = (0..20)
            .map(|i| meta(i, 1, if i < 10 { "Natural Gas" } else { "Electricity" }))
            .collect();
        Dataset {
            stock,
            technologies: vec![
                tech(1, "ev", ""),
                tech(2, "pv", ""),
                tech(10, "gas furnace", "heating"),
            ],
            tech_mapping: vec![TechMapping {
                tech_id: 10,
                xstock_fuel: "Natural Gas".to_string(),
                xstock_type: "Ducted Heating".to_string(),
                fuel_col: "heating_fuel".to_string(),
                type_col: "hvac_heat_type".to_string(),
            }],
            forecasts: vec![
                forecast("ev", None, 2020, "bau", 0.0),
                forecast("ev", None, 2050, "bau", 50.0),
                forecast("ev", None, 2050, "high", 100.0),
                forecast("pv", None, 2020, "bau", 0.5),
                forecast("pv", None, 2050, "high", 0.4),
                forecast("gas furnace", Some("residential"), 2020, "bau", 1000.0),
                forecast("gas furnace", Some("residential"), 2050, "high", 600.0),
            ],
            ..Dataset::default()
        }
    }

    fn buildings(data: &Dataset) -> Vec<BuildingRecord> {
        data.stock
            .iter()
            .enumerate()
            .map(|(i, m)| {
                let mut b = BuildingRecord::new(m.building_id, m.sector(), &m.state, m.weight, i);
                b.represented_vehicles = 1.0;
                b.pv_size_kw = 5.0;
                b
            })
            .collect()
    }

    fn high() -> ModelConfig {
        ModelConfig::high()
    }

    #[test]
    fn projections_use_bau_base_and_scenario_end() {
        let config = high();
        let data = dataset();
        let adoption = TechnologyAdoption::new(&config, &data).expect("scenario");
        let p = adoption.tech_projections("ev", None).expect("known").expect("present");
        assert_eq!(p, Projection { base: 0.0, end: 100.0 });
        assert_eq!(p.growth(), 100.0);
    }

    #[test]
    fn unknown_technology_is_an_error() {
        let config = high();
        let data = dataset();
        let adoption = TechnologyAdoption::new(&config, &data).expect("scenario");
        let result = adoption.tech_projections("fuel cell", None);
        assert!(matches!(result, Err(BicepError::UnknownTechnology { .. })));
    }

    #[test]
    fn missing_end_year_is_an_error() {
        let mut config = high();
        config.model.end_year = 2040;
        let data = dataset();
        let adoption = TechnologyAdoption::new(&config, &data).expect("scenario");
        let result = adoption.tech_projections("ev", None);
        assert!(matches!(result, Err(BicepError::MissingProjection { year: 2040, .. })));
    }

    #[test]
    fn sector_without_forecasts_has_no_projection() {
        let config = high();
        let data = dataset();
        let adoption = TechnologyAdoption::new(&config, &data).expect("scenario");
        let p = adoption
            .tech_projections("gas furnace", Some(Sector::Commercial))
            .expect("known");
        assert_eq!(p, None);
    }

    #[test]
    fn unknown_scenario_rejected() {
        let mut config = high();
        config.model.scenario = "low".to_string();
        let data = dataset();
        assert!(matches!(
            TechnologyAdoption::new(&config, &data),
            Err(BicepError::UnknownScenario(_))
        ));
    }

    #[test]
    fn iterative_adoption_covers_growth() {
        let config = high();
        let data = dataset();
        let adoption = TechnologyAdoption::new(&config, &data).expect("scenario");
        let mut stock = buildings(&data);
        let mut rng = StdRng::seed_from_u64(4);

        // growth 100 vehicles, each building represents 10
        let adopters = adoption
            .iterative_adoption(&mut stock, Technology::Ev, &mut rng)
            .expect("adoption");
        assert_eq!(adopters, 10);
        let assigned: f64 = stock
            .iter()
            .filter(|b| b.ev_adopted)
            .map(|b| b.weight * b.represented_vehicles)
            .sum();
        assert!((assigned - 100.0).abs() < 1e-9);
    }

    #[test]
    fn negative_growth_adopts_nobody() {
        let config = high();
        let data = dataset();
        let adoption = TechnologyAdoption::new(&config, &data).expect("scenario");
        let mut stock = buildings(&data);
        let mut rng = StdRng::seed_from_u64(4);
        let adopters = adoption
            .iterative_adoption(&mut stock, Technology::Pv, &mut rng)
            .expect("adoption");
        assert_eq!(adopters, 0);
        assert!(stock.iter().all(|b| !b.pv_adopted));
    }

    #[test]
    fn exhausted_stock_adopts_everyone() {
        let config = high();
        let mut data = dataset();
        data.forecasts.push(forecast("ev", None, 2050, "high", 1.0e6));
        data.forecasts.retain(|f| !(f.tech_name == "ev" && f.stock_projection == 100.0));
        let adoption = TechnologyAdoption::new(&config, &data).expect("scenario");
        let mut stock = buildings(&data);
        let mut rng = StdRng::seed_from_u64(4);
        let adopters = adoption
            .iterative_adoption(&mut stock, Technology::Ev, &mut rng)
            .expect("adoption");
        assert_eq!(adopters, stock.len());
    }

    #[test]
    fn building_adoption_converts_matching_share() {
        let config = high();
        let data = dataset();
        let adoption = TechnologyAdoption::new(&config, &data).expect("scenario");
        let mut stock = buildings(&data);
        let mut rng = StdRng::seed_from_u64(4);

        // 40 % of the 10 gas heated homes convert
        let converted = adoption
            .building_adoption(&mut stock, "heating", &mut rng)
            .expect("adoption");
        assert_eq!(converted, 4);
        assert_eq!(stock.iter().filter(|b| b.hp_adopted).count(), 4);
        assert!(stock.iter().filter(|b| b.hp_adopted).all(|b| b.building_id < 10));
    }

    #[test]
    fn blank_sector_forecast_applies_to_each_sector() {
        let config = high();
        let mut data = dataset();
        data.technologies.push(tech(11, "oil boiler", "heating"));
        data.forecasts.push(forecast("oil boiler", None, 2020, "bau", 200.0));
        data.forecasts.push(forecast("oil boiler", None, 2050, "high", 50.0));
        let adoption = TechnologyAdoption::new(&config, &data).expect("scenario");

        let p = adoption
            .tech_projections("oil boiler", Some(Sector::Residential))
            .expect("known");
        assert_eq!(p, Some(Projection { base: 200.0, end: 50.0 }));

        // sector rows win over blank ones
        data.forecasts.push(forecast("gas furnace", None, 2020, "bau", 1.0));
        data.forecasts.push(forecast("gas furnace", None, 2050, "high", 1.0));
        let adoption = TechnologyAdoption::new(&config, &data).expect("scenario");
        let p = adoption
            .tech_projections("gas furnace", Some(Sector::Residential))
            .expect("known");
        assert_eq!(p, Some(Projection { base: 1000.0, end: 600.0 }));
    }

    #[test]
    fn overlapping_mappings_count_each_building_once() {
        let config = high();
        let mut data = dataset();
        data.technologies.push(tech(12, "gas boiler", "heating"));
        data.tech_mapping.push(TechMapping {
            tech_id: 12,
            xstock_fuel: "Natural Gas".to_string(),
            xstock_type: "Ducted Heating".to_string(),
            fuel_col: "heating_fuel".to_string(),
            type_col: "hvac_heat_type".to_string(),
        });
        // every gas boiler is replaced
        data.forecasts.push(forecast("gas boiler", Some("residential"), 2020, "bau", 100.0));
        data.forecasts.push(forecast("gas boiler", Some("residential"), 2050, "high", 0.0));
        let adoption = TechnologyAdoption::new(&config, &data).expect("scenario");
        let mut stock = buildings(&data);
        let mut rng = StdRng::seed_from_u64(8);

        let converted = adoption
            .building_adoption(&mut stock, "heating", &mut rng)
            .expect("adoption");
        assert_eq!(converted, 10);
        assert_eq!(stock.iter().filter(|b| b.hp_adopted).count(), 10);
    }

    #[test]
    fn converted_share_is_drawn_from_whole_stock() {
        let config = high();
        let data = dataset();
        let adoption = TechnologyAdoption::new(&config, &data).expect("scenario");

        // model two of the ten gas heated homes; 4 of 10 stock homes convert,
        // so the modeled pair converts 0, 1, or 2 times depending on the draw
        let mut counts = HashSet::new();
        for seed in 0..60 {
            let mut stock: Vec<BuildingRecord> = buildings(&data).into_iter().take(2).collect();
            let mut rng = StdRng::seed_from_u64(seed);
            let converted = adoption
                .building_adoption(&mut stock, "heating", &mut rng)
                .expect("adoption");
            assert!(converted <= 2);
            assert_eq!(stock.iter().filter(|b| b.hp_adopted).count(), converted);
            counts.insert(converted);
        }
        assert!(counts.contains(&0) || counts.contains(&2), "counts {counts:?}");
    }

    #[test]
    fn building_adoption_rejects_unknown_end_use() {
        let config = high();
        let data = dataset();
        let adoption = TechnologyAdoption::new(&config, &data).expect("scenario");
        let mut stock = buildings(&data);
        let mut rng = StdRng::seed_from_u64(4);
        let result = adoption.building_adoption(&mut stock, "cooling", &mut rng);
        assert!(matches!(result, Err(BicepError::UnknownEndUse(_))));
    }

    #[test]
    fn converted_fraction_is_clamped() {
        assert_eq!(Projection { base: 10.0, end: 20.0 }.converted_fraction(), Some(0.0));
        assert_eq!(Projection { base: 10.0, end: -5.0 }.converted_fraction(), Some(1.0));
        assert_eq!(Projection { base: 0.0, end: 5.0 }.converted_fraction(), None);
    }
}
