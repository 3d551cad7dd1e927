//! Electrical capacity of the existing stock.

use std::collections::{HashMap, HashSet};

use log::{debug, info, warn};
use rand::rngs::StdRng;

use crate::config::ModelConfig;
use crate::data::{Dataset, StockMeta};
use crate::error::Result;
use crate::model::BuildingRecord;
use crate::model::load_diff::BASELINE_UPGRADE;
use crate::sampling::{self, Distribution};
use crate::types::Sector;

/// Standard residential service ratings (A).
pub const RESIDENTIAL_PANEL_SIZES: [f64; 11] = [
    60.0, 100.0, 125.0, 150.0, 200.0, 225.0, 300.0, 320.0, 400.0, 600.0, 800.0,
];

/// Standard commercial service ratings (A).
pub const COMMERCIAL_PANEL_SIZES: [f64; 13] = [
    100.0, 200.0, 225.0, 400.0, 600.0, 800.0, 1000.0, 1200.0, 1600.0, 2000.0, 2500.0, 3000.0,
    4000.0,
];

/// PV system size to peak load ratio bounds.
const PV_RATIO_BOUNDS: (f64, f64) = (0.1, 1.25);

/// Smallest standard panel rating that carries `required_amp`.
///
/// Requirements beyond the largest standard size round up to the next
/// 100 A.
pub fn panel_rating(required_amp: f64, sector: Sector) -> f64 {
    let sizes: &[f64] = match sector {
        Sector::Residential => &RESIDENTIAL_PANEL_SIZES,
        Sector::Commercial => &COMMERCIAL_PANEL_SIZES,
    };
    sizes
        .iter()
        .copied()
        .find(|size| *size >= required_amp)
        .unwrap_or_else(|| (required_amp / 100.0).ceil() * 100.0)
}

/// Estimates service voltage, panel rating, spare capacity, and the
/// capacity each technology would require, per building.
pub struct CapacityEstimate<'a> {
    config: &'a ModelConfig,
    dataset: &'a Dataset,
}

impl<'a> CapacityEstimate<'a> {
    pub fn new(config: &'a ModelConfig, dataset: &'a Dataset) -> Self {
        Self { config, dataset }
    }

    /// Builds one record per stock building with a baseline peak load.
    ///
    /// With `model.sample_size` set, only a random sample of the stock is
    /// modeled and its weights are scaled by stock size over sample size.
    /// Draw order is fixed (stock sample, utilization, PV ratio, residential
    /// EVs, parking, EV share) so that a seed reproduces the same stock.
    pub fn calculate_capacity(&self, rng: &mut StdRng) -> Result<Vec<BuildingRecord>> {
        info!("Calculating building capacity");
        let elec = &self.config.electrical;

        let baseline: HashMap<(u64, u8), f64> = self
            .dataset
            .peak_loads
            .iter()
            .filter(|p| p.upgrade == BASELINE_UPGRADE)
            .map(|p| ((p.building_id, p.residential), p.max_elec_consumption_kwh))
            .collect();
        let diffs: HashMap<(u64, u8, u32), f64> = self
            .dataset
            .load_diffs
            .iter()
            .map(|d| ((d.building_id, d.residential, d.upgrade), d.peak_diff_kwh))
            .collect();

        let stock = &self.dataset.stock;
        let (sampled, weight_scale) = match self.config.model.sample_size {
            Some(size) if size < stock.len() => {
                let picks: HashSet<(u64, Sector)> = sampling::sample_stock(stock, size, None, rng)
                    .into_iter()
                    .collect();
                info!("Modeling a sample of {} of {} stock buildings", picks.len(), stock.len());
                (Some(picks), stock.len() as f64 / size as f64)
            }
            _ => (None, 1.0),
        };
        let in_sample = |b: &StockMeta| {
            sampled
                .as_ref()
                .is_none_or(|picks| picks.contains(&(b.building_id, b.sector())))
        };

        let candidates = stock.iter().filter(|b| in_sample(b)).count();
        let modeled: Vec<(usize, f64)> = stock
            .iter()
            .enumerate()
            .filter(|(_, b)| in_sample(b))
            .filter_map(|(i, b)| baseline.get(&(b.building_id, b.residential)).map(|kwh| (i, *kwh)))
            .collect();
        let skipped = candidates - modeled.len();
        if skipped > 0 {
            warn!("{skipped} buildings have no baseline peak load and are not modeled");
        }
        if modeled.is_empty() {
            return Ok(Vec::new());
        }

        let n = modeled.len();
        let n_residential = modeled
            .iter()
            .filter(|(i, _)| self.dataset.stock[*i].sector() == Sector::Residential)
            .count();
        let n_commercial = n - n_residential;

        let utilization = sampling::panel_utilization(&self.dataset.panel_capacity).constrained_samples(
            rng,
            n,
            Some(elec.min_utilization),
            Some(elec.max_utilization),
        )?;
        let pv_ratio = sampling::pv_sizing().constrained_samples(
            rng,
            n,
            Some(PV_RATIO_BOUNDS.0),
            Some(PV_RATIO_BOUNDS.1),
        )?;
        let ev_per_unit = sampling::residential_ev()?.constrained_samples(rng, n_residential, Some(0.0), None)?;
        let parking = sampling::parking_spots()?.constrained_samples(rng, n_commercial, Some(0.0), None)?;
        let ev_share = sampling::ev_spots()?.constrained_samples(rng, n_commercial, Some(0.0), Some(1.0))?;

        let mut ev_per_unit = ev_per_unit.into_iter();
        let mut commercial_ev = parking.into_iter().zip(ev_share);

        let mut buildings = Vec::with_capacity(n);
        for (k, (index, peak_kwh)) in modeled.into_iter().enumerate() {
            let meta = &self.dataset.stock[index];
            let sector = meta.sector();
            let mut b = BuildingRecord::new(
                meta.building_id,
                sector,
                &meta.state,
                meta.weight * weight_scale,
                index,
            );

            b.peak_kw = peak_kwh * 60.0 / elec.interval_minutes;
            b.panel_utilization = utilization[k];

            let residential_amp = b.peak_kw * 1000.0 / elec.residential_voltage;
            let (voltage, peak_amp) = match sector {
                Sector::Residential => (elec.residential_voltage, residential_amp),
                Sector::Commercial => {
                    let light_amp = b.peak_kw * 1000.0 / elec.commercial_voltage;
                    if light_amp / b.panel_utilization > elec.max_light_comm_amp {
                        (elec.medium_voltage, b.peak_kw * 1000.0 / elec.medium_voltage)
                    } else {
                        (elec.commercial_voltage, light_amp)
                    }
                }
            };
            b.service_voltage = voltage;
            b.panel_amp = panel_rating(peak_amp / b.panel_utilization, sector);
            b.utilized_capacity_amp = peak_amp * elec.panel_safety_factor;
            b.spare_capacity_amp = b.panel_amp - b.utilized_capacity_amp;

            let spots = match sector {
                Sector::Residential => {
                    let per_unit = ev_per_unit.next().unwrap_or(0.0);
                    (f64::from(meta.units()) * per_unit).round()
                }
                Sector::Commercial => {
                    let (spaces, share) = commercial_ev.next().unwrap_or((0.0, 0.0));
                    (meta.sqft / 1000.0 * spaces * share).round()
                }
            };
            b.represented_vehicles = spots;
            b.ev_req_capacity_amp = spots * elec.ev_charger_amp * elec.residential_voltage / voltage;

            b.pv_size_kw = b.peak_kw * pv_ratio[k];
            b.pv_req_capacity_amp = self.amps(b.pv_size_kw, voltage);

            let (hp_upgrade, hpwh_upgrade) = match sector {
                Sector::Residential => (
                    self.config.upgrades.residential_heat_pump,
                    self.config.upgrades.residential_hpwh,
                ),
                Sector::Commercial => (
                    self.config.upgrades.commercial_heat_pump,
                    self.config.upgrades.commercial_hpwh,
                ),
            };
            let added_kw = |upgrade: Option<u32>| {
                upgrade
                    .and_then(|u| diffs.get(&(meta.building_id, meta.residential, u)))
                    .map_or(0.0, |kwh| kwh.max(0.0) * 60.0 / elec.interval_minutes)
            };
            b.hp_req_capacity_amp = self.amps(added_kw(hp_upgrade), voltage);
            b.hpwh_req_capacity_amp = self.amps(added_kw(hpwh_upgrade), voltage);

            buildings.push(b);
        }

        debug!(
            "Capacity estimated for {} buildings ({} residential, {} commercial)",
            buildings.len(),
            n_residential,
            n_commercial
        );
        Ok(buildings)
    }

    /// Panel capacity (A) needed for `kw` at `voltage`, with the safety factor.
    fn amps(&self, kw: f64, voltage: f64) -> f64 {
        kw * 1000.0 / voltage * self.config.electrical.panel_safety_factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{LoadDiff, PanelCapacity, PeakLoad, StockMeta};
    use rand::SeedableRng;

    fn meta(id: u64, residential: u8, sqft: f64, units: Option<u32>) -> StockMeta {
        StockMeta {
            building_id: id,
            residential,
            state: "CO".to_string(),
            weight: 100.0,
            heating_fuel: "Natural Gas".to_string(),
            hvac_heat_type: "Ducted Heating".to_string(),
            water_heating_fuel: "Natural Gas".to_string(),
            water_heating_type: "Natural Gas Standard".to_string(),
            building_type: String::new(),
            sqft,
            total_units: units,
        }
    }

    fn peak(id: u64, residential: u8, upgrade: u32, kwh: f64) -> PeakLoad {
        PeakLoad {
            building_id: id,
            upgrade,
            residential,
            state: "CO".to_string(),
            release: "r".to_string(),
            max_elec_consumption_kwh: kwh,
            timestamp: String::new(),
            file_path: String::new(),
        }
    }

    /// Panel data with a single ratio pins every utilization draw to 0.5.
    fn dataset() -> Dataset {
        Dataset {
            stock: vec![
                meta(1, 1, 1800.0, Some(1)),
                meta(2, 0, 20_000.0, None),
                meta(3, 1, 900.0, Some(1)),
                meta(4, 0, 400_000.0, None),
            ],
            peak_loads: vec![peak(1, 1, 0, 1.5), peak(2, 0, 0, 20.0), peak(4, 0, 0, 500.0)],
            load_diffs: vec![LoadDiff {
                building_id: 1,
                state: "CO".to_string(),
                release: "r".to_string(),
                residential: 1,
                upgrade: 4,
                peak_diff_kwh: 0.6,
            }],
            panel_capacity: vec![PanelCapacity {
                utilized: 50.0,
                panel_size: 100.0,
            }],
            ..Dataset::default()
        }
    }

    #[test]
    fn panel_rating_uses_standard_sizes() {
        assert_eq!(panel_rating(55.0, Sector::Residential), 60.0);
        assert_eq!(panel_rating(201.0, Sector::Residential), 225.0);
        assert_eq!(panel_rating(850.0, Sector::Residential), 900.0);
        assert_eq!(panel_rating(10.0, Sector::Commercial), 100.0);
        assert_eq!(panel_rating(4001.0, Sector::Commercial), 4100.0);
    }

    #[test]
    fn stock_sample_scales_weights() {
        let mut config = ModelConfig::default();
        config.model.sample_size = Some(2);
        let data = dataset();
        let mut rng = StdRng::seed_from_u64(6);
        let buildings = CapacityEstimate::new(&config, &data)
            .calculate_capacity(&mut rng)
            .expect("capacity");

        // building 3 has no baseline, so a sample holding it models one building
        assert!((1..=2).contains(&buildings.len()));
        assert!(buildings.iter().all(|b| b.weight == 200.0));
    }

    #[test]
    fn buildings_without_baseline_are_skipped() {
        let config = ModelConfig::default();
        let data = dataset();
        let mut rng = StdRng::seed_from_u64(1);
        let buildings = CapacityEstimate::new(&config, &data)
            .calculate_capacity(&mut rng)
            .expect("capacity");
        let ids: Vec<u64> = buildings.iter().map(|b| b.building_id).collect();
        assert_eq!(ids, vec![1, 2, 4]);
    }

    #[test]
    fn residential_capacity_follows_peak_and_utilization() {
        let config = ModelConfig::default();
        let data = dataset();
        let mut rng = StdRng::seed_from_u64(1);
        let buildings = CapacityEstimate::new(&config, &data)
            .calculate_capacity(&mut rng)
            .expect("capacity");
        let b = &buildings[0];

        // 1.5 kWh in 15 minutes is a 6 kW peak, 25 A at 240 V
        assert!((b.peak_kw - 6.0).abs() < 1e-9);
        assert_eq!(b.service_voltage, 240.0);
        assert!((b.panel_utilization - 0.5).abs() < 1e-12);
        assert_eq!(b.panel_amp, 60.0);
        assert!((b.utilized_capacity_amp - 31.25).abs() < 1e-9);
        assert!((b.spare_capacity_amp - 28.75).abs() < 1e-9);
        // 0.6 kWh added is 2.4 kW, 10 A at 240 V, 12.5 A with safety factor
        assert!((b.hp_req_capacity_amp - 12.5).abs() < 1e-9);
        assert_eq!(b.hpwh_req_capacity_amp, 0.0);
        assert!(b.pv_size_kw >= 0.6 - 1e-9 && b.pv_size_kw <= 7.5 + 1e-9);
    }

    #[test]
    fn large_commercial_moves_to_medium_voltage() {
        let config = ModelConfig::default();
        let data = dataset();
        let mut rng = StdRng::seed_from_u64(1);
        let buildings = CapacityEstimate::new(&config, &data)
            .calculate_capacity(&mut rng)
            .expect("capacity");

        // 80 kW at 480 V needs about 333 A at 50 % utilization
        assert_eq!(buildings[1].service_voltage, 480.0);
        assert_eq!(buildings[1].panel_amp, 400.0);
        // 2 MW at 480 V would need over 8000 A
        assert_eq!(buildings[2].service_voltage, 12_470.0);
        assert_eq!(buildings[2].panel_amp, 400.0);
    }

    #[test]
    fn ev_capacity_scales_to_service_voltage() {
        let config = ModelConfig::default();
        let data = dataset();
        let mut rng = StdRng::seed_from_u64(5);
        let buildings = CapacityEstimate::new(&config, &data)
            .calculate_capacity(&mut rng)
            .expect("capacity");
        for b in &buildings {
            let expected = b.represented_vehicles * 50.0 * 240.0 / b.service_voltage;
            assert!((b.ev_req_capacity_amp - expected).abs() < 1e-9);
            assert!(b.represented_vehicles >= 0.0);
        }
    }

    #[test]
    fn same_seed_same_capacity() {
        let config = ModelConfig::default();
        let data = dataset();
        let estimate = CapacityEstimate::new(&config, &data);
        let a = estimate.calculate_capacity(&mut StdRng::seed_from_u64(9)).expect("capacity");
        let b = estimate.calculate_capacity(&mut StdRng::seed_from_u64(9)).expect("capacity");
        assert_eq!(a, b);
    }
}
