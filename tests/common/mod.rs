//! Shared fixtures for integration tests over the bundled sample dataset.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use bicep::config::ModelConfig;
use bicep::data::{DataPaths, Dataset};

/// Root of `data/sample`.
pub fn sample_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("data").join("sample")
}

/// Business-as-usual configuration reading the sample dataset.
pub fn sample_config() -> ModelConfig {
    let mut config = ModelConfig::bau();
    config.data.root = sample_root();
    config
}

/// High electrification configuration reading the sample dataset.
pub fn sample_high_config() -> ModelConfig {
    let mut config = ModelConfig::high();
    config.data.root = sample_root();
    config
}

/// Loads the sample tables for `config`.
pub fn sample_dataset(config: &ModelConfig) -> Dataset {
    Dataset::load(&DataPaths::new(&config.data.root), &config.upgrades)
        .expect("sample dataset should load")
}

/// Copies the sample dataset below `dir` and returns the copy's root.
///
/// Used by tests that write into the data directories.
pub fn copy_sample(dir: &Path) -> PathBuf {
    let root = dir.join("data");
    for sub in ["parsed_inputs", "required_input", "raw_inputs"] {
        let from = sample_root().join(sub);
        let to = root.join(sub);
        fs::create_dir_all(&to).expect("create data dir");
        for entry in fs::read_dir(&from).expect("read sample dir") {
            let path = entry.expect("dir entry").path();
            if path.is_file() {
                let name = path.file_name().expect("file name");
                fs::copy(&path, to.join(name)).expect("copy sample file");
            }
        }
    }
    root
}
