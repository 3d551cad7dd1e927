//! Local CSV mirror of the database tables.
//!
//! Runs without database connectivity by reading and writing one CSV per
//! table under `parsed_inputs/`.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{BicepError, Result};

use super::paths::DataPaths;

pub const STOCK_META: &str = "stock_meta";
pub const PEAK_LOAD: &str = "peak_load";
pub const LOAD_DIFF: &str = "load_diff";
pub const TECHNOLOGIES: &str = "technologies";
pub const TECH_MAPPING: &str = "scout_xstock_tech_mapping";
pub const ADOPTION_FORECASTS: &str = "adoption_forecasts";

/// Table mirror rooted at a `parsed_inputs/` directory.
#[derive(Debug, Clone)]
pub struct LocalMirror {
    dir: PathBuf,
}

impl LocalMirror {
    pub fn new(paths: &DataPaths) -> Self {
        Self {
            dir: paths.parsed_inputs(),
        }
    }

    pub fn table_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.csv"))
    }

    /// Writes `rows` to `<name>.csv`, replacing any previous contents.
    pub fn save_table<T: Serialize>(&self, name: &str, rows: &[T]) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|e| BicepError::io(&self.dir, e))?;
        let path = self.table_path(name);
        let count = write_rows(&path, rows)?;
        info!("Saved {count} records to {}", path.display());
        Ok(path)
    }

    /// Reads `<name>.csv`, returning no rows when the file is absent.
    pub fn load_table<T: DeserializeOwned>(&self, name: &str) -> Result<Vec<T>> {
        let path = self.table_path(name);
        if !path.exists() {
            warn!("Local mirror file not found: {}", path.display());
            return Ok(Vec::new());
        }
        let rows = read_csv(&path)?;
        info!("Loaded {} records from {}", rows.len(), path.display());
        Ok(rows)
    }

    /// Reads `<name>.csv`, failing when the file is absent.
    pub fn require_table<T: DeserializeOwned>(&self, name: &str) -> Result<Vec<T>> {
        let path = self.table_path(name);
        if !path.exists() {
            return Err(BicepError::MissingFile(path));
        }
        read_csv(&path)
    }

    /// Deletes every `.csv` and `.json` file in the mirror directory.
    pub fn clear_parsed_inputs(&self) -> Result<usize> {
        if !self.dir.exists() {
            info!("Parsed inputs directory does not exist");
            return Ok(0);
        }
        let entries = fs::read_dir(&self.dir).map_err(|e| BicepError::io(&self.dir, e))?;
        let mut removed = 0;
        for entry in entries {
            let path = entry.map_err(|e| BicepError::io(&self.dir, e))?.path();
            let is_table = matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("csv" | "json")
            );
            if is_table && path.is_file() {
                fs::remove_file(&path).map_err(|e| BicepError::io(&path, e))?;
                removed += 1;
            }
        }
        info!("Cleared {removed} parsed input files");
        Ok(removed)
    }
}

/// Deserializes every row of a CSV file.
pub fn read_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path).map_err(|e| BicepError::io(path, e))?;
    let mut rdr = csv::Reader::from_reader(file);
    let mut rows = Vec::new();
    for row in rdr.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

/// Serializes rows to a CSV file with a header row.
pub fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<usize> {
    let file = File::create(path).map_err(|e| BicepError::io(path, e))?;
    let mut wtr = csv::Writer::from_writer(BufWriter::new(file));
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush().map_err(|e| BicepError::io(path, e))?;
    Ok(rows.len())
}
