//! Peak interval load of one x-stock building timeseries.
//!
//! NEC 220.87 allows the existing load of a service to be taken as the
//! actual maximum demand over a year, the highest 15-minute interval.

use std::io::Read;

use log::debug;
use serde::Serialize;

use crate::data::PeakLoad;
use crate::error::{BicepError, Result};

/// Electricity consumption column of the x-stock timeseries (kWh per interval).
pub const LOAD_COLUMN: &str = "out.electricity.total.energy_consumption";
pub const TIMESTAMP_COLUMN: &str = "timestamp";

/// Building model identity encoded in an OEDI timeseries URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeseriesFile {
    pub building_id: u64,
    pub upgrade: u32,
    /// Path below the bucket host.
    pub file_path: String,
    /// Release folder, e.g. `2022/resstock_amy2018_release_1.1/`.
    pub release: String,
    pub residential: bool,
}

/// Parses a URL like
/// `https://oedi-data-lake.s3.amazonaws.com/nrel-pds-building-stock/end-use-load-profiles-for-us-building-stock/2022/resstock_amy2018_release_1.1/timeseries_individual_buildings/by_state/upgrade=0/state=CO/100-0.parquet`.
pub fn parse_file_url(url: &str) -> Result<TimeseriesFile> {
    let bad = |what: &str| BicepError::Parse(format!("{what} not found in timeseries url \"{url}\""));

    let name = url.rsplit('/').next().unwrap_or_default();
    let stem = name.split('.').next().unwrap_or_default();
    let (id, upgrade) = stem.split_once('-').ok_or_else(|| bad("building id"))?;
    let building_id = id.parse().map_err(|_| bad("building id"))?;
    let upgrade = upgrade.parse().map_err(|_| bad("upgrade"))?;

    let (_, file_path) = url.split_once(".com/").ok_or_else(|| bad("file path"))?;
    let before = file_path
        .split("timeseries_individual")
        .next()
        .unwrap_or_default();
    let (_, release) = before
        .split_once("us-building-stock/")
        .ok_or_else(|| bad("release"))?;

    Ok(TimeseriesFile {
        building_id,
        upgrade,
        file_path: file_path.to_string(),
        release: release.to_string(),
        residential: release.contains("resstock"),
    })
}

/// Peak interval of one timeseries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakLoadRecord {
    pub max_elec_consumption_kwh: f64,
    pub timestamp: String,
}

impl PeakLoadRecord {
    /// Row of the `peak_load` table for this building model.
    pub fn into_peak_load(self, file: &TimeseriesFile, state: &str) -> PeakLoad {
        PeakLoad {
            building_id: file.building_id,
            upgrade: file.upgrade,
            residential: u8::from(file.residential),
            state: state.to_string(),
            release: file.release.clone(),
            max_elec_consumption_kwh: self.max_elec_consumption_kwh,
            timestamp: self.timestamp,
            file_path: file.file_path.clone(),
        }
    }
}

/// Finds the interval with the largest electricity consumption in a CSV
/// timeseries. Ties keep the first interval.
pub fn peak_from_timeseries<R: Read>(reader: R) -> Result<PeakLoadRecord> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| BicepError::MissingColumn {
                table: "timeseries".to_string(),
                column: name.to_string(),
            })
    };
    let load_idx = column(LOAD_COLUMN)?;
    let time_idx = column(TIMESTAMP_COLUMN)?;

    let mut peak: Option<PeakLoadRecord> = None;
    let mut rows = 0;
    for record in rdr.records() {
        let record = record?;
        rows += 1;
        let Some(load) = record.get(load_idx).and_then(|v| v.trim().parse::<f64>().ok()) else {
            continue;
        };
        if peak.as_ref().is_none_or(|p| load > p.max_elec_consumption_kwh) {
            peak = Some(PeakLoadRecord {
                max_elec_consumption_kwh: load,
                timestamp: record.get(time_idx).unwrap_or_default().to_string(),
            });
        }
    }
    debug!("Scanned {rows} timeseries intervals");
    peak.ok_or_else(|| BicepError::Parse("timeseries has no numeric load values".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://oedi-data-lake.s3.amazonaws.com/nrel-pds-building-stock/\
                       end-use-load-profiles-for-us-building-stock/2022/resstock_amy2018_release_1.1/\
                       timeseries_individual_buildings/by_state/upgrade=4/state=CO/100-4.parquet";

    #[test]
    fn url_fields_are_extracted() {
        let file = parse_file_url(URL).expect("valid url");
        assert_eq!(file.building_id, 100);
        assert_eq!(file.upgrade, 4);
        assert_eq!(file.release, "2022/resstock_amy2018_release_1.1/");
        assert!(file.residential);
        assert!(file.file_path.starts_with("nrel-pds-building-stock/"));
    }

    #[test]
    fn comstock_url_is_commercial() {
        let url = URL.replace("resstock_amy2018_release_1.1", "comstock_amy2018_release_2");
        let file = parse_file_url(&url).expect("valid url");
        assert!(!file.residential);
    }

    #[test]
    fn malformed_url_is_an_error() {
        assert!(parse_file_url("https://example.org/file.parquet").is_err());
    }

    #[test]
    fn peak_is_maximum_interval() {
        let data = "timestamp,out.electricity.total.energy_consumption,out.natural_gas.total.energy_consumption\n\
                    2018-01-01 00:15:00,0.8,1.0\n\
                    2018-01-01 00:30:00,1.7,0.0\n\
                    2018-01-01 00:45:00,,0.0\n\
                    2018-01-01 01:00:00,1.7,0.0\n\
                    2018-01-01 01:15:00,0.4,0.0\n";
        let peak = peak_from_timeseries(data.as_bytes()).expect("peak");
        assert_eq!(peak.max_elec_consumption_kwh, 1.7);
        assert_eq!(peak.timestamp, "2018-01-01 00:30:00");

        let file = parse_file_url(URL).expect("valid url");
        let row = peak.into_peak_load(&file, "CO");
        assert_eq!(row.residential, 1);
        assert_eq!(row.upgrade, 4);
        assert_eq!(row.state, "CO");
    }

    #[test]
    fn missing_load_column_is_an_error() {
        let data = "timestamp,load\n2018-01-01 00:15:00,1.0\n";
        assert!(matches!(
            peak_from_timeseries(data.as_bytes()),
            Err(BicepError::MissingColumn { .. })
        ));
    }
}
