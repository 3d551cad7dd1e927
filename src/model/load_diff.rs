//! Peak load differences between x-stock upgrades and the baseline.

use std::collections::HashMap;

use log::info;

use crate::config::UpgradeIds;
use crate::data::{LoadDiff, PeakLoad};

/// Baseline upgrade id in the x-stock releases.
pub const BASELINE_UPGRADE: u32 = 0;

/// Joins baseline and `upgrade` peaks of one sector and returns their
/// difference per building.
///
/// Rows are matched on building id, state, release, and sector; buildings
/// without both peaks are dropped.
pub fn building_peak_load_diff(peaks: &[PeakLoad], upgrade: u32, residential: bool) -> Vec<LoadDiff> {
    let flag = u8::from(residential);
    info!("Calculating peak load differences for upgrade {upgrade}, residential={flag}");

    let baseline: HashMap<(u64, &str, &str), f64> = peaks
        .iter()
        .filter(|p| p.upgrade == BASELINE_UPGRADE && p.residential == flag)
        .map(|p| {
            (
                (p.building_id, p.state.as_str(), p.release.as_str()),
                p.max_elec_consumption_kwh,
            )
        })
        .collect();

    peaks
        .iter()
        .filter(|p| p.upgrade == upgrade && p.residential == flag)
        .filter_map(|p| {
            let base = baseline.get(&(p.building_id, p.state.as_str(), p.release.as_str()))?;
            Some(LoadDiff {
                building_id: p.building_id,
                state: p.state.clone(),
                release: p.release.clone(),
                residential: flag,
                upgrade,
                peak_diff_kwh: p.max_elec_consumption_kwh - base,
            })
        })
        .collect()
}

/// Peak load differences for every configured technology upgrade.
pub fn calc_building_peak_loads(peaks: &[PeakLoad], upgrades: &UpgradeIds) -> Vec<LoadDiff> {
    upgrades
        .pairs()
        .into_iter()
        .flat_map(|(upgrade, residential)| building_peak_load_diff(peaks, upgrade, residential))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peak(building_id: u64, upgrade: u32, residential: u8, kwh: f64) -> PeakLoad {
        PeakLoad {
            building_id,
            upgrade,
            residential,
            state: "CO".to_string(),
            release: "2022/resstock_amy2018_release_1.1/".to_string(),
            max_elec_consumption_kwh: kwh,
            timestamp: String::new(),
            file_path: String::new(),
        }
    }

    #[test]
    fn difference_is_upgrade_minus_baseline() {
        let peaks = vec![peak(1, 0, 1, 2.0), peak(1, 4, 1, 3.5), peak(2, 0, 1, 1.0)];
        let diffs = building_peak_load_diff(&peaks, 4, true);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].building_id, 1);
        assert!((diffs[0].peak_diff_kwh - 1.5).abs() < 1e-12);
    }

    #[test]
    fn sectors_are_not_mixed() {
        let peaks = vec![peak(1, 0, 1, 2.0), peak(1, 3, 0, 9.0)];
        assert!(building_peak_load_diff(&peaks, 3, false).is_empty());
    }

    #[test]
    fn configured_upgrades_are_all_computed() {
        let peaks = vec![
            peak(1, 0, 1, 2.0),
            peak(1, 4, 1, 3.0),
            peak(1, 6, 1, 2.5),
            peak(9, 0, 0, 20.0),
            peak(9, 3, 0, 18.0),
        ];
        let diffs = calc_building_peak_loads(&peaks, &UpgradeIds::default());
        assert_eq!(diffs.len(), 3);
        let commercial = diffs.iter().find(|d| d.residential == 0);
        assert_eq!(commercial.map(|d| d.peak_diff_kwh), Some(-2.0));
    }
}
