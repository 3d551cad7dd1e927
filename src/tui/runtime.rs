//! Ensemble runner and TUI application state.

use std::time::Instant;

use log::warn;

use crate::config::ModelConfig;
use crate::data::Dataset;
use crate::model::{CostReport, EnsembleSummary, UpgradeEstimator};

/// Tick interval options in milliseconds (slowest → fastest).
const SPEED_LEVELS_MS: [u64; 6] = [1000, 500, 250, 100, 50, 10];

/// Default speed index (250 ms).
const DEFAULT_SPEED_IDX: usize = 2;

/// Dashboard state: one Monte Carlo iteration per tick.
pub struct App {
    /// Configuration of the active scenario.
    config: ModelConfig,
    dataset: Dataset,
    /// Total cost of every completed iteration, in run order.
    pub totals: Vec<f64>,
    /// Report of the most recent iteration.
    pub latest: Option<CostReport>,
    /// Error of the last failed iteration; the run pauses on failure.
    pub last_error: Option<String>,
    /// Iterations to run before the ensemble is complete.
    pub total_iterations: usize,
    pub paused: bool,
    /// Current index into `SPEED_LEVELS_MS`.
    pub speed_idx: usize,
    pub quit: bool,
    /// When the last iteration was executed.
    pub last_tick: Instant,
    /// Name of the active scenario preset.
    pub preset_name: String,
}

impl App {
    /// Creates a dashboard for `config` over `dataset`.
    pub fn new(config: ModelConfig, dataset: Dataset) -> Self {
        let total_iterations = config.model.iterations.max(1);
        let preset_name = config.model.scenario.clone();
        Self {
            config,
            dataset,
            totals: Vec::with_capacity(total_iterations),
            latest: None,
            last_error: None,
            total_iterations,
            paused: false,
            speed_idx: DEFAULT_SPEED_IDX,
            quit: false,
            last_tick: Instant::now(),
            preset_name,
        }
    }

    /// Runs the next iteration with seed `seed + iteration`.
    pub fn tick(&mut self) {
        if self.is_finished() {
            return;
        }
        let seed = self.config.model.seed.wrapping_add(self.iteration() as u64);
        match UpgradeEstimator::new(&self.config, &self.dataset).run(seed) {
            Ok(run) => {
                self.totals.push(run.report.total_cost);
                self.latest = Some(run.report);
            }
            Err(e) => {
                warn!("Iteration with seed {seed} failed: {e}");
                self.last_error = Some(e.to_string());
                self.paused = true;
            }
        }
    }

    /// Number of completed iterations.
    pub fn iteration(&self) -> usize {
        self.totals.len()
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Shortens the tick interval.
    pub fn speed_up(&mut self) {
        if self.speed_idx + 1 < SPEED_LEVELS_MS.len() {
            self.speed_idx += 1;
        }
    }

    /// Lengthens the tick interval.
    pub fn speed_down(&mut self) {
        if self.speed_idx > 0 {
            self.speed_idx -= 1;
        }
    }

    pub fn tick_interval_ms(&self) -> u64 {
        SPEED_LEVELS_MS[self.speed_idx]
    }

    /// Switches the adoption scenario, discarding completed iterations.
    ///
    /// Every other setting of the current configuration is kept.
    pub fn switch_preset(&mut self, name: &str) {
        if name.parse::<crate::types::Scenario>().is_err() {
            return;
        }
        self.config.model.scenario = name.to_string();
        self.preset_name = name.to_string();
        self.totals.clear();
        self.latest = None;
        self.last_error = None;
        self.paused = false;
    }

    /// Restarts the ensemble of the current scenario.
    pub fn restart(&mut self) {
        let name = self.preset_name.clone();
        self.switch_preset(&name);
    }

    pub fn is_finished(&self) -> bool {
        self.iteration() >= self.total_iterations
    }

    /// Summary statistics of the iterations completed so far.
    pub fn summary(&self) -> Option<EnsembleSummary> {
        EnsembleSummary::from_totals(&self.totals)
    }
}
