//! Groundwater Telemetry CLI
//!
//! Feature engineering and live composite-index scoring for groundwater
//! monitoring stations.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use crossbeam_channel::RecvTimeoutError;
use groundwater_telemetry::{
    audit::create_shared_log_with_persistence,
    config::Config,
    core::{IndexKind, Observation, RollingWindow, SensorSignals, TickSnapshot},
    dataset::{self, ExportFormat},
    simulator::{generate_series, FeedConfig, SeededNoise, StationRegistry, TickFeed},
    DashboardState, FeatureEngineer, IndexCalculator, RunLog, INDEX_LEGEND, VERSION,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gw-telemetry")]
#[command(version = VERSION)]
#[command(about = "Groundwater feature engineering and live risk scoring", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Engineer a training table and fit the encoding vocabulary
    Engineer {
        /// Observation CSV (a synthetic series is generated when omitted)
        #[arg(long, short)]
        input: Option<PathBuf>,

        /// Days of synthetic data to generate
        #[arg(long, default_value = "1000")]
        days: usize,

        /// Seed for the synthetic series
        #[arg(long)]
        seed: Option<u64>,

        /// Engineered table output (defaults to the data directory)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Vocabulary output (defaults to the data directory)
        #[arg(long)]
        vocabulary: Option<PathBuf>,
    },

    /// Transform new observations with a saved vocabulary
    Transform {
        /// Observation CSV
        #[arg(long, short)]
        input: PathBuf,

        /// Vocabulary written by `engineer`
        #[arg(long)]
        vocabulary: PathBuf,

        /// Engineered table output
        #[arg(long, short)]
        output: PathBuf,
    },

    /// Score a single reading
    Score {
        /// Water level (m)
        #[arg(long)]
        water_level: f64,

        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Recent anomaly score
        #[arg(long, default_value = "0.0")]
        anomaly_score: f64,

        /// Estimated data-gap factor
        #[arg(long, default_value = "0.0")]
        data_gap: f64,

        /// Seed for the jitter terms
        #[arg(long)]
        seed: Option<u64>,

        /// Print the indices as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the live dashboard loop against a mock station
    Simulate {
        /// Station id (defaults to the first station)
        #[arg(long)]
        station: Option<String>,

        /// Number of ticks to run
        #[arg(long, default_value = "20")]
        ticks: u64,

        /// What-if rainfall (mm)
        #[arg(long, default_value = "0.0")]
        rainfall: f64,

        /// Seed for stations and readings
        #[arg(long)]
        seed: Option<u64>,

        /// Tick interval in milliseconds (defaults to the configured interval)
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Export format (json or jsonl)
        #[arg(long, default_value = "json")]
        format: String,

        /// Export file (defaults to the export directory)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// List the mock station network
    Stations {
        /// Seed for station generation
        #[arg(long)]
        seed: Option<u64>,

        /// Show at most this many stations
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Display the index legend
    Legend,

    /// Show cumulative run statistics
    Status,

    /// Show configuration
    Config,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Engineer {
            input,
            days,
            seed,
            output,
            vocabulary,
        } => cmd_engineer(input, days, seed, output, vocabulary),
        Commands::Transform {
            input,
            vocabulary,
            output,
        } => cmd_transform(input, vocabulary, output),
        Commands::Score {
            water_level,
            lat,
            lon,
            anomaly_score,
            data_gap,
            seed,
            json,
        } => cmd_score(
            water_level,
            lat,
            lon,
            SensorSignals::new(anomaly_score, data_gap),
            seed,
            json,
        ),
        Commands::Simulate {
            station,
            ticks,
            rainfall,
            seed,
            interval_ms,
            format,
            output,
        } => cmd_simulate(station, ticks, rainfall, seed, interval_ms, &format, output),
        Commands::Stations { seed, limit } => cmd_stations(seed, limit),
        Commands::Legend => {
            println!("{INDEX_LEGEND}");
            Ok(())
        }
        Commands::Status => cmd_status(),
        Commands::Config => cmd_config(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config() -> Result<Config> {
    Config::load().context("failed to load configuration")
}

fn cmd_engineer(
    input: Option<PathBuf>,
    days: usize,
    seed: Option<u64>,
    output: Option<PathBuf>,
    vocabulary: Option<PathBuf>,
) -> Result<()> {
    let config = load_config()?;
    let output = output.unwrap_or_else(|| config.data_path.join("prepared_data.csv"));
    let vocabulary_path =
        vocabulary.unwrap_or_else(|| config.data_path.join("encoding_vocabulary.json"));

    let observations = match input {
        Some(ref path) => dataset::load_observations(path)
            .with_context(|| format!("failed to read observations from {}", path.display()))?,
        None => {
            let mut noise = SeededNoise::new(seed.or(config.simulation.seed));
            generate_series(days, &mut noise)
        }
    };
    let input_rows = observations.len();

    let engineer = FeatureEngineer::new(config.features.clone())?;
    let (table, vocabulary) = engineer
        .fit_transform(observations)
        .context("feature engineering failed")?;

    dataset::write_table(&output, &table)?;
    dataset::save_vocabulary(&vocabulary_path, &vocabulary)?;

    let run_log = RunLog::with_persistence(config.run_log_path());
    run_log.record_rows_engineered(table.len() as u64);
    if let Err(e) = run_log.save() {
        tracing::warn!(error = %e, "could not save run stats");
    }

    println!("Data pipeline finished.");
    println!("  Input rows: {input_rows}");
    println!(
        "  Output rows: {} ({} warm-up rows dropped)",
        table.len(),
        input_rows - table.len()
    );
    println!("  Indicator columns: {}", vocabulary.column_names().join(", "));
    println!("  Table: {}", output.display());
    println!("  Vocabulary: {}", vocabulary_path.display());
    Ok(())
}

fn cmd_transform(input: PathBuf, vocabulary: PathBuf, output: PathBuf) -> Result<()> {
    let config = load_config()?;
    let vocabulary = dataset::load_vocabulary(&vocabulary)
        .with_context(|| format!("failed to read vocabulary from {}", vocabulary.display()))?;
    let observations = dataset::load_observations(&input)
        .with_context(|| format!("failed to read observations from {}", input.display()))?;

    let engineer = FeatureEngineer::new(config.features.clone())?;
    let table = engineer
        .transform(observations, &vocabulary)
        .context("feature engineering failed")?;
    dataset::write_table(&output, &table)?;

    let run_log = RunLog::with_persistence(config.run_log_path());
    run_log.record_rows_engineered(table.len() as u64);
    if let Err(e) = run_log.save() {
        tracing::warn!(error = %e, "could not save run stats");
    }

    println!("Transformed {} rows into {}", table.len(), output.display());
    Ok(())
}

fn cmd_score(
    water_level: f64,
    lat: f64,
    lon: f64,
    signals: SensorSignals,
    seed: Option<u64>,
    json: bool,
) -> Result<()> {
    let config = load_config()?;
    let calculator = IndexCalculator::new(config.scoring.clone())?;
    let mut noise = SeededNoise::new(seed.or(config.simulation.seed));

    let current = Observation {
        timestamp: Utc::now(),
        water_level,
        rainfall_mm: 0.0,
        pet_mm: 0.0,
        avg_temp_c: 0.0,
        lat,
        lon,
        elevation: 0.0,
        soil_type: String::new(),
        land_use: String::new(),
    };
    let window = RollingWindow::new(config.history_capacity);
    let indices = calculator
        .compute(&current, signals, &window, &mut noise)
        .context("reading rejected")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&indices)?);
        return Ok(());
    }

    println!("Composite Indices");
    println!("=================");
    for kind in IndexKind::ALL {
        let tier = indices.tier(kind);
        println!(
            "  {:<11} {:>8}  {:<22} ({})",
            kind.name(),
            indices.value(kind),
            kind.status_text(tier),
            kind.description()
        );
    }
    println!();
    println!("  Density factor: {:.4}", indices.density_factor);
    println!("  Alert: {}", if indices.is_alert() { "YES" } else { "no" });
    Ok(())
}

fn cmd_simulate(
    station_id: Option<String>,
    ticks: u64,
    rainfall: f64,
    seed: Option<u64>,
    interval_ms: Option<u64>,
    format: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    let format = match format {
        "json" => ExportFormat::Json,
        "jsonl" => ExportFormat::Jsonl,
        other => bail!("unknown export format '{other}' (expected json or jsonl)"),
    };

    let config = load_config()?;
    if let Err(e) = config.ensure_directories() {
        tracing::warn!(error = %e, "could not create directories");
    }

    let mut noise = SeededNoise::new(seed.or(config.simulation.seed));
    let registry = StationRegistry::generate(&config.simulation, &mut noise);
    let station = registry
        .get_or_first(station_id.as_deref().unwrap_or_default())
        .cloned()
        .context("station network is empty")?;
    if let Some(requested) = station_id.as_deref() {
        if requested != station.id {
            println!("Unknown station '{requested}', using {}", station.id);
        }
    }

    let run_log = create_shared_log_with_persistence(config.run_log_path());
    let session_id = format!("SESS-{}", Utc::now().timestamp_millis());
    let mut dashboard = DashboardState::new(&config, station)?
        .with_run_log(run_log.clone())
        .with_session_id(session_id);
    dashboard.set_rainfall(rainfall);

    let station = dashboard.station();
    println!("Groundwater Telemetry v{VERSION}");
    println!();
    println!("Station: {} ({}, {})", station.name, station.state, station.id);
    println!("  Status: {}  Type: {}", station.status, station.station_type);
    println!("  Starting level: {:.2} m", station.initial_level);
    println!("  What-if rainfall: {rainfall} mm");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let interval = interval_ms
        .map(Duration::from_millis)
        .unwrap_or(config.tick_interval);
    let mut feed = TickFeed::new(FeedConfig {
        interval,
        max_ticks: Some(ticks),
        ..FeedConfig::default()
    });

    feed.start()?;
    ctrlc_handler(feed.running_flag())?;

    let receiver = feed.receiver().clone();
    let mut snapshots: Vec<TickSnapshot> = Vec::new();
    let mut seen = 0u64;

    while seen < ticks {
        match receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(tick) => {
                seen += 1;
                match dashboard.on_tick(&tick, &mut noise) {
                    Ok(snapshot) => {
                        print_tick(&snapshot);
                        snapshots.push(snapshot);
                    }
                    Err(e) => eprintln!("Warning: tick {} rejected: {e}", tick.sequence),
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                if !feed.is_running() && receiver.is_empty() {
                    break;
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                eprintln!("Tick feed disconnected unexpectedly");
                break;
            }
        }
    }
    feed.stop();

    println!();
    if let Some(summary) = dashboard.window().summary() {
        println!(
            "Window: {} readings, mean {:.2} m, range {:.2}-{:.2} m",
            summary.count, summary.mean, summary.min, summary.max
        );
    }

    if !snapshots.is_empty() {
        let path = output.unwrap_or_else(|| {
            config.export_path.join(format!(
                "ticks_{}.{}",
                Utc::now().format("%Y%m%d_%H%M%S"),
                if format == ExportFormat::Jsonl { "jsonl" } else { "json" }
            ))
        });
        let written = dataset::export_snapshots(&path, &snapshots, format)?;
        run_log.record_snapshots_exported(written as u64);
        println!("Exported {written} snapshots to {}", path.display());
    }

    if let Err(e) = run_log.save() {
        eprintln!("Warning: could not save run stats: {e}");
    }
    println!();
    println!("{}", run_log.summary());
    Ok(())
}

fn print_tick(snapshot: &TickSnapshot) {
    let line = snapshot
        .index_readings
        .iter()
        .map(|r| format!("{} {}", r.index.name(), r.value))
        .collect::<Vec<_>>()
        .join(" | ");
    println!(
        "[{}] level {:.2} m -> {} m | {}{}",
        snapshot.observed_at_local,
        snapshot.reading.water_level,
        snapshot
            .reading
            .predicted_level
            .map(|p| format!("{p:.2}"))
            .unwrap_or_else(|| "-".to_string()),
        line,
        if snapshot.alert { " | ALERT" } else { "" }
    );
    if let Some(outlook) = snapshot.outlook {
        println!(
            "    drought risk {:.0}% | 30d recharge {:+.2} m | extraction {:.2}{}",
            outlook.drought_risk * 100.0,
            outlook.recharge_30d,
            outlook.extraction_rate,
            if outlook.is_anomaly { " | anomaly" } else { "" }
        );
    }
}

fn cmd_stations(seed: Option<u64>, limit: Option<usize>) -> Result<()> {
    let config = load_config()?;
    let mut noise = SeededNoise::new(seed.or(config.simulation.seed));
    let registry = StationRegistry::generate(&config.simulation, &mut noise);

    println!("{} stations", registry.len());
    println!();
    println!(
        "{:<28} {:<38} {:>9} {:>9} {:<9} {:<10} {:>7}",
        "ID", "State", "Lat", "Lon", "Type", "Status", "Level"
    );
    for station in registry
        .stations()
        .iter()
        .take(limit.unwrap_or(usize::MAX))
    {
        println!(
            "{:<28} {:<38} {:>9.5} {:>9.5} {:<9} {:<10} {:>7.2}",
            station.id,
            station.state,
            station.lat,
            station.lon,
            station.station_type,
            station.status,
            station.initial_level
        );
    }
    Ok(())
}

fn cmd_status() -> Result<()> {
    let config = load_config()?;

    println!("Groundwater Telemetry Status");
    println!("============================");
    println!();
    println!("Configuration:");
    println!("  History capacity: {}", config.history_capacity);
    println!("  Tick interval: {}s", config.tick_interval.as_secs_f64());
    println!("  Timezone: {}", config.timezone);
    println!();

    let stats_path = config.run_log_path();
    if stats_path.exists() {
        println!("{}", RunLog::with_persistence(stats_path).summary());
    } else {
        println!("No previous run data found.");
    }
    Ok(())
}

fn cmd_config() -> Result<()> {
    let config = load_config()?;

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

/// Set up Ctrl+C handler that stops the tick feed.
fn ctrlc_handler(running: Arc<AtomicBool>) -> Result<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .context("error setting Ctrl+C handler")
}
