//! Crate-wide error type.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading inputs, sampling, or running the model.
#[derive(Debug, Error)]
pub enum BicepError {
    #[error("io error on \"{path}\": {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Config(String),

    #[error("missing input file \"{}\"", .0.display())]
    MissingFile(PathBuf),

    #[error("missing column \"{column}\" in {table}")]
    MissingColumn { table: String, column: String },

    #[error("technology must be one of [{known}], got \"{name}\"")]
    UnknownTechnology { name: String, known: String },

    #[error("scenario must be in [\"bau\", \"high\"], got \"{0}\"")]
    UnknownScenario(String),

    #[error("end uses must be either 'water heating' or 'heating', got \"{0}\"")]
    UnknownEndUse(String),

    #[error("no {scenario} projection for {tech} in {year}")]
    MissingProjection {
        tech: String,
        scenario: String,
        year: i32,
    },

    #[error("the distribution must be initialized before sampling")]
    EmptyDistribution,

    #[error("invalid distribution: {0}")]
    InvalidDistribution(String),

    #[error("parse error: {0}")]
    Parse(String),
}

impl BicepError {
    /// Wraps an `io::Error` with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, BicepError>;
