//! Required panel upgrades and their costs.

use std::collections::HashMap;

use log::{debug, info, warn};
use rand::Rng;
use rand::rngs::StdRng;

use crate::config::ModelConfig;
use crate::error::Result;
use crate::model::BuildingRecord;
use crate::model::finance;
use crate::sampling::{CostDistributionKind, Distribution, PanelUpgradeCost};
use crate::types::{Sector, Technology};

const TECHNOLOGIES: [Technology; 4] = [
    Technology::Ev,
    Technology::Pv,
    Technology::HeatPump,
    Technology::HeatPumpWaterHeater,
];

/// Flags buildings whose adopted technologies need more than the spare
/// panel capacity. Returns the number of required upgrades.
pub fn required_upgrades(buildings: &mut [BuildingRecord]) -> usize {
    info!("Calculating required upgrades");
    let mut required = 0;
    for b in buildings.iter_mut() {
        b.net_capacity_diff_amp = TECHNOLOGIES
            .iter()
            .filter(|t| b.adopted(**t))
            .map(|t| b.required_amp(*t))
            .sum();
        b.required_add_capacity_amp = b.net_capacity_diff_amp - b.spare_capacity_amp;
        b.upgrade_required = b.required_add_capacity_amp > 0.0;
        if b.upgrade_required {
            required += 1;
        }
    }
    required
}

/// Prices every required upgrade.
///
/// Base costs are drawn per sector and assigned in building order, scaled
/// by the state location factor, and annualized over the upgrade lifespan.
/// When the discount and inflation rates differ, each upgrade also gets a
/// random year in the horizon with its escalated and discounted cost.
pub fn upgrade_costs(
    buildings: &mut [BuildingRecord],
    config: &ModelConfig,
    location_factors: &HashMap<&str, f64>,
    rng: &mut StdRng,
) -> Result<()> {
    info!("Calculating upgrade costs");
    let costs = &config.costs;
    let kind: CostDistributionKind = costs.distribution.parse()?;

    let count = |sector: Sector| {
        buildings
            .iter()
            .filter(|b| b.upgrade_required && b.sector == sector)
            .count()
    };
    let residential = PanelUpgradeCost::new(Sector::Residential, kind)?.constrained_samples(
        rng,
        count(Sector::Residential),
        Some(0.0),
        Some(costs.residential_max_cost),
    )?;
    let commercial = PanelUpgradeCost::new(Sector::Commercial, kind)?.constrained_samples(
        rng,
        count(Sector::Commercial),
        Some(0.0),
        Some(costs.commercial_max_cost),
    )?;
    let mut residential = residential.into_iter();
    let mut commercial = commercial.into_iter();

    let mut unmapped = 0;
    for b in buildings.iter_mut() {
        b.location_factor = match location_factors.get(b.state.as_str()) {
            Some(f) => *f,
            None => {
                unmapped += 1;
                1.0
            }
        };
        b.upgrade_costs_base = None;
        b.upgrade_costs = None;
        b.equiv_annual_cost = None;
        b.upgrade_year = None;
        b.fv_upgrade_cost = None;
        b.pv_upgrade_cost = None;
        if !b.upgrade_required {
            continue;
        }
        let base = match b.sector {
            Sector::Residential => residential.next(),
            Sector::Commercial => commercial.next(),
        };
        b.upgrade_costs_base = base;
        b.upgrade_costs = base.map(|c| c * b.location_factor);
        b.equiv_annual_cost = b
            .upgrade_costs
            .map(|c| finance::equivalent_annual_cost(c, costs.discount_rate, costs.upgrade_lifespan));
    }
    if unmapped > 0 {
        warn!("There are {unmapped} buildings whose state has no location factor; using 1.0");
    }

    if config.rates_differ() {
        let base_year = config.model.base_year;
        let end_year = config.model.end_year;
        for b in buildings.iter_mut().filter(|b| b.upgrade_required) {
            let year = rng.random_range(base_year..=end_year);
            // periods elapsed since the base year, never negative
            let years = f64::from(year - base_year);
            b.upgrade_year = Some(year);
            b.fv_upgrade_cost = b
                .upgrade_costs
                .map(|c| finance::fv(costs.nominal_inflation_rate, years, 0.0, -c));
            b.pv_upgrade_cost = b
                .fv_upgrade_cost
                .map(|fv| finance::pv(costs.discount_rate, years, 0.0, -fv));
        }
    }

    debug!("Priced upgrades with {} cost distributions", costs.distribution);
    Ok(())
}
