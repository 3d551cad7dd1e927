//! BICEP entry point: CLI wiring for model runs and input preparation.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};
use log::{info, warn};

use bicep::config::ModelConfig;
use bicep::data::paths::{SCOUT_BAU_FILE, SCOUT_HIGH_FILE, SCOUT_STOCK_FILE, TECHNOLOGY_MAP_FILE};
use bicep::data::{DataPaths, Dataset, LocalMirror, PeakLoad, mirror};
use bicep::error::{BicepError, Result};
use bicep::io::export::{write_buildings_csv, write_state_costs_csv, write_stock_records};
use bicep::model::load_diff::calc_building_peak_loads;
use bicep::model::run_ensemble;
use bicep::parsing::scout::{missing_base_year, to_adoption_forecasts, validate_output_format};
use bicep::parsing::{TechnologyStockParser, parse_file_url, peak_from_timeseries};

#[derive(Parser)]
#[command(name = "bicep")]
#[command(version)]
#[command(about = "Behind-the-meter Infrastructure Costs for Electrification Progression", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Run the upgrade cost model")]
    Run(RunOpts),

    #[command(about = "Report missing input files below the data root")]
    Check(ConfigOpts),

    #[command(about = "Compute peak load differences of the configured upgrades")]
    LoadDiff(ConfigOpts),

    #[command(about = "Parse Scout technology stock projections")]
    ParseScout(ParseScoutOpts),

    #[command(about = "Find the peak interval of one building timeseries")]
    PeakLoad(PeakLoadOpts),

    #[command(about = "Delete the parsed input tables")]
    Clear(ConfigOpts),
}

#[derive(Args)]
struct ConfigOpts {
    /// Load the model configuration from a TOML file
    #[arg(long, conflicts_with = "preset")]
    config: Option<PathBuf>,

    /// Use a built-in preset (bau, high)
    #[arg(long)]
    preset: Option<String>,

    /// Override the data root directory
    #[arg(long, env = "BICEP_DATA_DIR")]
    data_dir: Option<PathBuf>,
}

#[derive(Args)]
struct RunOpts {
    #[command(flatten)]
    config: ConfigOpts,

    /// Override the random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the number of Monte Carlo iterations
    #[arg(long)]
    iterations: Option<usize>,

    /// Export per-building results of the first iteration to CSV
    #[arg(long)]
    buildings_out: Option<PathBuf>,

    /// Export weighted costs per state of the first iteration to CSV
    #[arg(long)]
    states_out: Option<PathBuf>,

    /// Start the REST API after the run
    #[cfg(feature = "api")]
    #[arg(long)]
    serve: bool,

    /// API server port
    #[cfg(feature = "api")]
    #[arg(long, default_value_t = bicep::api::DEFAULT_PORT)]
    port: u16,

    /// Run the ensemble in the interactive dashboard
    #[cfg(feature = "tui")]
    #[arg(long)]
    tui: bool,
}

#[derive(Args)]
struct ParseScoutOpts {
    #[command(flatten)]
    config: ConfigOpts,

    /// Scout high electrification scenario JSON [default: raw_inputs/Scout_high_scenario.json]
    #[arg(long)]
    high: Option<PathBuf>,

    /// Scout stated policies (reference) scenario JSON [default: raw_inputs/Scout_ref_scenario.json]
    #[arg(long)]
    stated: Option<PathBuf>,

    /// Scout to x-stock technology map CSV [default: raw_inputs/technology_map.csv]
    #[arg(long)]
    map: Option<PathBuf>,

    /// Output CSV of aggregated stock records [default: parsed_inputs/scout_technology_stock.csv]
    #[arg(long)]
    out: Option<PathBuf>,

    /// Also write national adoption forecasts as CSV
    ///
    /// Scout years start in 2024; technologies without a `bau` row in the
    /// configured base year are reported as warnings.
    #[arg(long)]
    forecasts_out: Option<PathBuf>,
}

#[derive(Args)]
struct PeakLoadOpts {
    /// Timeseries CSV of one building model
    #[arg(long)]
    file: PathBuf,

    /// OEDI URL of the timeseries; prints a `peak_load` row when given
    #[arg(long, requires = "state")]
    url: Option<String>,

    /// State abbreviation of the building
    #[arg(long)]
    state: Option<String>,
}

impl ConfigOpts {
    /// Resolves and validates the configuration.
    fn load(&self) -> std::result::Result<ModelConfig, Vec<String>> {
        let config = self.resolve()?;
        validated(config)
    }

    /// Resolves the configuration: `--config`, then `--preset`, then `bau`.
    fn resolve(&self) -> std::result::Result<ModelConfig, Vec<String>> {
        let mut config = if let Some(path) = &self.config {
            ModelConfig::from_toml_file(path).map_err(|e| vec![e.to_string()])?
        } else if let Some(name) = &self.preset {
            ModelConfig::from_preset(name).map_err(|e| vec![e.to_string()])?
        } else {
            ModelConfig::bau()
        };
        if let Some(dir) = &self.data_dir {
            config.data.root = dir.clone();
        }
        Ok(config)
    }

    fn paths(&self) -> std::result::Result<DataPaths, Vec<String>> {
        self.load().map(|c| DataPaths::new(c.data.root))
    }
}

fn validated(config: ModelConfig) -> std::result::Result<ModelConfig, Vec<String>> {
    let errors = config.validate();
    if errors.is_empty() {
        Ok(config)
    } else {
        Err(errors.iter().map(ToString::to_string).collect())
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run(opts) => cmd_run(opts),
        Commands::Check(opts) => with_paths(&opts, cmd_check),
        Commands::LoadDiff(opts) => cmd_load_diff(&opts),
        Commands::ParseScout(opts) => cmd_parse_scout(&opts),
        Commands::PeakLoad(opts) => cmd_peak_load(&opts).map_err(|e| vec![e.to_string()]),
        Commands::Clear(opts) => with_paths(&opts, |paths| {
            let removed = LocalMirror::new(&paths).clear_parsed_inputs()?;
            println!("Removed {removed} parsed input files");
            Ok(())
        }),
    };

    if let Err(errors) = result {
        for e in &errors {
            eprintln!("error: {e}");
        }
        process::exit(1);
    }
}

fn with_paths(
    opts: &ConfigOpts,
    f: impl FnOnce(DataPaths) -> Result<()>,
) -> std::result::Result<(), Vec<String>> {
    let paths = opts.paths()?;
    f(paths).map_err(|e| vec![e.to_string()])
}

fn cmd_run(opts: RunOpts) -> std::result::Result<(), Vec<String>> {
    let mut config = opts.config.resolve()?;
    if let Some(seed) = opts.seed {
        config.model.seed = seed;
    }
    if let Some(iterations) = opts.iterations {
        config.model.iterations = iterations;
    }
    let config = validated(config)?;

    let fail = |e: BicepError| vec![e.to_string()];
    let paths = DataPaths::new(&config.data.root);
    let dataset = Dataset::load(&paths, &config.upgrades).map_err(fail)?;

    #[cfg(feature = "tui")]
    if opts.tui {
        return bicep::tui::run(config, dataset).map_err(|e| vec![format!("dashboard failed: {e}")]);
    }

    let ensemble = run_ensemble(&config, &dataset).map_err(fail)?;
    println!("{}", ensemble.first.report);
    if ensemble.summary.iterations > 1 {
        println!("\n{}", ensemble.summary);
    }

    if let Some(path) = &opts.buildings_out {
        write_buildings_csv(&ensemble.first.buildings, path)
            .map_err(|e| fail(BicepError::io(path, e)))?;
        info!("Building results written to {}", path.display());
    }
    if let Some(path) = &opts.states_out {
        write_state_costs_csv(&ensemble.first.report.state_costs, path)
            .map_err(|e| fail(BicepError::io(path, e)))?;
        info!("State costs written to {}", path.display());
    }

    #[cfg(feature = "api")]
    if opts.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let summary = (ensemble.summary.iterations > 1).then_some(ensemble.summary);
        let state = Arc::new(bicep::api::AppState {
            config,
            report: ensemble.first.report,
            summary,
            buildings: ensemble.first.buildings,
        });
        let addr = SocketAddr::from(([0, 0, 0, 0], opts.port));
        let rt = tokio::runtime::Runtime::new()
            .map_err(|e| vec![format!("failed to create tokio runtime: {e}")])?;
        rt.block_on(bicep::api::serve(state, addr))
            .map_err(|e| vec![format!("API server failed: {e}")])?;
    }

    Ok(())
}

fn cmd_check(paths: DataPaths) -> Result<()> {
    paths.ensure_directories()?;
    println!("Data root: {}", paths.root.display());
    let required = paths.validate_required_files();
    let raw = paths.validate_data_files();
    for path in &required {
        println!("missing required file: {}", path.display());
    }
    for path in &raw {
        println!("missing data file: {}", path.display());
    }
    if required.is_empty() && raw.is_empty() {
        println!("All input files present");
    } else if required.is_empty() {
        println!("All required files present");
    }
    Ok(())
}

fn cmd_load_diff(opts: &ConfigOpts) -> std::result::Result<(), Vec<String>> {
    let config = opts.load()?;
    let run = || -> Result<()> {
        let paths = DataPaths::new(&config.data.root);
        paths.ensure_directories()?;
        let store = LocalMirror::new(&paths);
        let peaks: Vec<PeakLoad> = store.require_table(mirror::PEAK_LOAD)?;
        let diffs = calc_building_peak_loads(&peaks, &config.upgrades);
        if diffs.is_empty() {
            warn!("No peak load differences for upgrades {:?}", config.upgrades.pairs());
        }
        let path = store.save_table(mirror::LOAD_DIFF, &diffs)?;
        println!("Wrote {} load differences to {}", diffs.len(), path.display());
        Ok(())
    };
    run().map_err(|e| vec![e.to_string()])
}

fn cmd_parse_scout(opts: &ParseScoutOpts) -> std::result::Result<(), Vec<String>> {
    let config = opts.config.load()?;
    let run = || -> Result<()> {
        let paths = DataPaths::new(&config.data.root);
        paths.ensure_directories()?;
        let raw = |arg: &Option<PathBuf>, name: &str| arg.clone().unwrap_or_else(|| paths.raw_input_path(name));
        let high = raw(&opts.high, SCOUT_HIGH_FILE);
        let stated = raw(&opts.stated, SCOUT_BAU_FILE);
        let map = raw(&opts.map, TECHNOLOGY_MAP_FILE);
        let out = opts
            .out
            .clone()
            .unwrap_or_else(|| paths.parsed_output_path(SCOUT_STOCK_FILE));

        let mut parser = TechnologyStockParser::new(&high, &stated, &map)?;
        let records = parser.parse_all_technologies();
        if !validate_output_format(&records) {
            warn!("Parsed stock records failed validation");
        }

        let file = File::create(&out).map_err(|e| BicepError::io(&out, e))?;
        write_stock_records(&records, BufWriter::new(file)).map_err(|e| BicepError::io(&out, e))?;
        println!("Wrote {} stock records to {}", records.len(), out.display());

        if let Some(path) = &opts.forecasts_out {
            let forecasts = to_adoption_forecasts(&records)?;
            let base_year = config.model.base_year;
            for tech in missing_base_year(&forecasts, base_year) {
                warn!("{tech} has no bau stock for base year {base_year}; model runs will fail on it");
            }
            let count = mirror::write_rows(path, &forecasts)?;
            println!("Wrote {count} adoption forecasts to {}", path.display());
        }
        Ok(())
    };
    run().map_err(|e| vec![e.to_string()])
}

fn cmd_peak_load(opts: &PeakLoadOpts) -> Result<()> {
    let peak = peak_from_timeseries(open(&opts.file)?)?;
    match (&opts.url, &opts.state) {
        (Some(url), Some(state)) => {
            let file = parse_file_url(url)?;
            let row = peak.into_peak_load(&file, state);
            let mut wtr = csv::Writer::from_writer(io::stdout());
            wtr.serialize(&row)?;
            wtr.flush().map_err(|e| BicepError::io(&opts.file, e))?;
        }
        _ => println!(
            "Peak interval: {:.4} kWh at {}",
            peak.max_elec_consumption_kwh, peak.timestamp
        ),
    }
    Ok(())
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| BicepError::io(path, e))
}
