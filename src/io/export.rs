//! CSV export of per-building results and state costs.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::model::BuildingRecord;
use crate::parsing::StockRecord;
use crate::parsing::scout::OUTPUT_COLUMNS;

/// Column header of the per-building export.
const BUILDINGS_HEADER: &str = "building_id,sector,state,weight,peak_kw,service_voltage,\
                                panel_utilization,panel_amp,utilized_capacity_amp,spare_capacity_amp,\
                                represented_vehicles,ev_req_capacity_amp,pv_size_kw,pv_req_capacity_amp,\
                                hp_req_capacity_amp,hpwh_req_capacity_amp,ev_adopted,pv_adopted,\
                                hp_adopted,hpwh_adopted,net_capacity_diff_amp,required_add_capacity_amp,\
                                upgrade_required,upgrade_costs_base,location_factor,upgrade_costs,\
                                equiv_annual_cost,upgrade_year,fv_upgrade_cost,pv_upgrade_cost,weighted_cost";

const STATES_HEADER: &str = "state,weighted_cost";

fn opt(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_default()
}

fn flag(value: bool) -> &'static str {
    if value { "1" } else { "0" }
}

/// Exports per-building results to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn write_buildings_csv(buildings: &[BuildingRecord], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_buildings(buildings, io::BufWriter::new(file))
}

/// Writes per-building results as CSV to any writer.
///
/// Adoption and upgrade flags are written as 1/0; costs of buildings
/// without an upgrade are left empty.
pub fn write_buildings(buildings: &[BuildingRecord], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(BUILDINGS_HEADER.split(',').map(str::trim))?;

    for b in buildings {
        wtr.write_record(&[
            b.building_id.to_string(),
            b.sector.to_string(),
            b.state.clone(),
            format!("{:.4}", b.weight),
            format!("{:.4}", b.peak_kw),
            format!("{:.0}", b.service_voltage),
            format!("{:.4}", b.panel_utilization),
            format!("{:.0}", b.panel_amp),
            format!("{:.4}", b.utilized_capacity_amp),
            format!("{:.4}", b.spare_capacity_amp),
            format!("{:.0}", b.represented_vehicles),
            format!("{:.4}", b.ev_req_capacity_amp),
            format!("{:.4}", b.pv_size_kw),
            format!("{:.4}", b.pv_req_capacity_amp),
            format!("{:.4}", b.hp_req_capacity_amp),
            format!("{:.4}", b.hpwh_req_capacity_amp),
            flag(b.ev_adopted).to_string(),
            flag(b.pv_adopted).to_string(),
            flag(b.hp_adopted).to_string(),
            flag(b.hpwh_adopted).to_string(),
            format!("{:.4}", b.net_capacity_diff_amp),
            format!("{:.4}", b.required_add_capacity_amp),
            flag(b.upgrade_required).to_string(),
            opt(b.upgrade_costs_base),
            format!("{:.4}", b.location_factor),
            opt(b.upgrade_costs),
            opt(b.equiv_annual_cost),
            b.upgrade_year.map(|y| y.to_string()).unwrap_or_default(),
            opt(b.fv_upgrade_cost),
            opt(b.pv_upgrade_cost),
            format!("{:.2}", b.weighted_cost),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports weighted costs per state to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn write_state_costs_csv(state_costs: &BTreeMap<String, f64>, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_state_costs(state_costs, io::BufWriter::new(file))
}

/// Writes `state,weighted_cost` rows sorted by state.
pub fn write_state_costs(state_costs: &BTreeMap<String, f64>, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(STATES_HEADER.split(','))?;
    for (state, cost) in state_costs {
        wtr.write_record(&[state.clone(), format!("{cost:.2}")])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes aggregated Scout stock rows in the parser's column order.
///
/// The header is written even when there are no records.
pub fn write_stock_records(records: &[StockRecord], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(OUTPUT_COLUMNS)?;
    for r in records {
        wtr.serialize(r).map_err(io::Error::other)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::mirror::read_csv;
    use crate::types::Sector;

    fn building(id: u64, upgrade: bool) -> BuildingRecord {
        let mut b = BuildingRecord::new(id, Sector::Residential, "CO", 12.0, 0);
        b.peak_kw = 6.0;
        b.panel_amp = 100.0;
        b.upgrade_required = upgrade;
        if upgrade {
            b.upgrade_costs_base = Some(2500.0);
            b.upgrade_costs = Some(2750.0);
            b.equiv_annual_cost = Some(140.86);
            b.weighted_cost = 1690.32;
        }
        b
    }

    fn lines(buf: Vec<u8>) -> Vec<String> {
        String::from_utf8(buf)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn buildings_header_and_rows() {
        let mut buf = Vec::new();
        write_buildings(&[building(1, true), building(2, false)], &mut buf).ok();
        let text = lines(buf.clone());
        assert_eq!(text.len(), 3);
        assert!(text[0].starts_with("building_id,sector,state,weight,peak_kw"));
        assert!(text[0].ends_with("pv_upgrade_cost,weighted_cost"));

        let mut rdr = csv::Reader::from_reader(buf.as_slice());
        let headers = rdr.headers().cloned().ok();
        assert_eq!(headers.as_ref().map(csv::StringRecord::len), Some(31));
        let rows: Vec<csv::StringRecord> = rdr.records().filter_map(|r| r.ok()).collect();
        assert_eq!(&rows[0][1], "residential");
        assert_eq!(&rows[0][22], "1");
        assert_eq!(&rows[0][25], "2750.00");
        // no upgrade: costs empty
        assert_eq!(&rows[1][25], "");
    }

    #[test]
    fn state_costs_sorted_by_state() {
        let costs = BTreeMap::from([("TX".to_string(), 10.0), ("CO".to_string(), 2.5)]);
        let mut buf = Vec::new();
        write_state_costs(&costs, &mut buf).ok();
        assert_eq!(lines(buf), vec!["state,weighted_cost", "CO,2.50", "TX,10.00"]);
    }

    #[test]
    fn deterministic_output() {
        let stock: Vec<BuildingRecord> = (0..5).map(|i| building(i, i % 2 == 0)).collect();
        let mut buf1 = Vec::new();
        let mut buf2 = Vec::new();
        write_buildings(&stock, &mut buf1).ok();
        write_buildings(&stock, &mut buf2).ok();
        assert_eq!(buf1, buf2);
    }

    #[test]
    fn stock_records_use_output_column_order() {
        let record = StockRecord {
            year: 2030,
            stock: 4.0,
            sector: "resid".to_string(),
            fuel: "gas".to_string(),
            end_use: "heating".to_string(),
            technology: "furnace".to_string(),
            state: "Colorado".to_string(),
            metric: "stock".to_string(),
            scenario: "bau".to_string(),
        };
        let mut buf = Vec::new();
        write_stock_records(&[record], &mut buf).ok();
        let lines = lines(buf);
        assert_eq!(lines[0], OUTPUT_COLUMNS.join(","));
        assert_eq!(lines[1], "2030,4.0,resid,gas,heating,furnace,Colorado,stock,bau");
    }

    #[test]
    fn empty_stock_records_keep_header() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("stock.csv");
        let file = File::create(&path).expect("create");
        write_stock_records(&[], file).expect("write");

        let text = std::fs::read_to_string(&path).expect("read back");
        assert_eq!(text.trim_end(), OUTPUT_COLUMNS.join(","));
        let rows: Vec<StockRecord> = read_csv(&path).expect("parse");
        assert!(rows.is_empty());
    }
}
