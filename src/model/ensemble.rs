//! Monte Carlo ensemble of model runs.

use std::fmt;

use log::info;
use serde::Serialize;

use crate::config::ModelConfig;
use crate::data::Dataset;
use crate::error::{BicepError, Result};
use crate::model::{ModelRun, UpgradeEstimator};

/// Distribution of the total cost across iterations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnsembleSummary {
    pub iterations: usize,
    pub mean: f64,
    /// Population standard deviation (divides by the iteration count).
    pub std: f64,
    pub min: f64,
    pub p5: f64,
    pub p50: f64,
    pub p95: f64,
    pub max: f64,
}

impl EnsembleSummary {
    /// Summary statistics of `totals`; `None` when empty.
    pub fn from_totals(totals: &[f64]) -> Option<Self> {
        if totals.is_empty() {
            return None;
        }
        let mut sorted = totals.to_vec();
        sorted.sort_by(f64::total_cmp);
        let n = sorted.len() as f64;
        let mean = sorted.iter().sum::<f64>() / n;
        let std = (sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
        Some(Self {
            iterations: sorted.len(),
            mean,
            std,
            min: sorted[0],
            p5: percentile(&sorted, 5.0),
            p50: percentile(&sorted, 50.0),
            p95: percentile(&sorted, 95.0),
            max: sorted[sorted.len() - 1],
        })
    }
}

impl fmt::Display for EnsembleSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Ensemble Summary ---")?;
        writeln!(f, "Iterations:            {}", self.iterations)?;
        writeln!(f, "Mean total cost:       ${:.2}", self.mean)?;
        writeln!(f, "Std deviation:         ${:.2}", self.std)?;
        writeln!(f, "Min / max:             ${:.2} / ${:.2}", self.min, self.max)?;
        write!(
            f,
            "P5 / P50 / P95:        ${:.2} / ${:.2} / ${:.2}",
            self.p5, self.p50, self.p95
        )
    }
}

/// Linear interpolation between closest ranks of an ascending slice.
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        len => {
            let rank = q / 100.0 * (len - 1) as f64;
            let lo = rank.floor() as usize;
            let hi = rank.ceil() as usize;
            sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
        }
    }
}

/// Ensemble result: the first run in full plus every run's total.
#[derive(Debug, Clone)]
pub struct Ensemble {
    pub first: ModelRun,
    pub totals: Vec<f64>,
    pub summary: EnsembleSummary,
}

/// Runs `config.model.iterations` model runs with seeds `seed + i`.
pub fn run_ensemble(config: &ModelConfig, dataset: &Dataset) -> Result<Ensemble> {
    let iterations = config.model.iterations.max(1);
    let estimator = UpgradeEstimator::new(config, dataset);
    let seed = config.model.seed;

    let first = estimator.run(seed)?;
    let mut totals = Vec::with_capacity(iterations);
    totals.push(first.report.total_cost);
    for i in 1..iterations {
        let run = estimator.run(seed.wrapping_add(i as u64))?;
        totals.push(run.report.total_cost);
    }
    info!("Completed {iterations} model iterations");

    let summary = EnsembleSummary::from_totals(&totals)
        .ok_or_else(|| BicepError::Config("ensemble produced no runs".to_string()))?;
    Ok(Ensemble {
        first,
        totals,
        summary,
    })
}
