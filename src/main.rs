//! FlightStat - flight delay statistics from CSV exports
//!
//! A CLI tool that cleans a flights table, aggregates it per airport and
//! per airline, and writes a Markdown or JSON report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (bad arguments, unreadable input, schema mismatch, etc.)

mod analysis;
mod cli;
mod config;
mod error;
mod flights;
mod loader;
mod models;
mod preprocess;
mod report;
mod table;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use models::ReportMetadata;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        if let Err(e) = handle_init_config() {
            eprintln!("❌ Error: {:#}", e);
            std::process::exit(1);
        }
        return;
    }

    // Initialize logging
    init_logging(&args);

    info!("FlightStat v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(&args) {
        error!("Report failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Handle --init-config: generate a default .flightstat.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        anyhow::bail!(
            "{} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize input files, filters, thresholds, and more.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: failed to set tracing subscriber: {}", e);
    }
}

/// Run the complete load, clean, aggregate and report workflow.
fn run(args: &Args) -> Result<()> {
    let start_time = Instant::now();
    let say = |line: String| {
        if !args.quiet {
            println!("{}", line);
        }
    };

    // Load configuration
    let mut config = load_config(args)?;
    config.merge_with_args(args);

    // Step 1: Load the inputs
    say(format!(
        "📥 Loading flights: {}",
        config.data.flights_csv.display()
    ));
    let raw = loader::load_csv(&config.data.flights_csv, args.show_progress())?;
    let airports = loader::load_csv(&config.data.airports_csv, args.show_progress())?;
    let airlines = loader::load_csv(&config.data.airlines_csv, args.show_progress())?;
    say(format!(
        "   {} flights, {} airports, {} airlines",
        raw.row_count(),
        airports.row_count(),
        airlines.row_count()
    ));

    // Step 2: Clean the flights
    say("\n🧹 Cleaning flights...".to_string());
    let options = flights::preprocess_options(&config.preprocess);
    let cleaned = preprocess::preprocess(&raw, &options)
        .context("Failed to preprocess flights table")?;
    info!(
        "Cleaning kept {} of {} rows",
        cleaned.row_count(),
        raw.row_count()
    );
    if cleaned.is_empty() {
        warn!("No flights remain after cleaning");
    }

    // Step 3: Aggregate
    say("\n📊 Computing statistics...".to_string());
    let metadata = ReportMetadata {
        generated_at: Utc::now(),
        flights_source: config.data.flights_csv.display().to_string(),
        rows_loaded: raw.row_count(),
        rows_cleaned: cleaned.row_count(),
        filter_airports: config.preprocess.filter_airports.clone(),
        delay_threshold: config.preprocess.delay_threshold,
        delayed_minutes: config.preprocess.delayed_minutes,
        duration_seconds: 0.0,
    };
    let mut report =
        flights::build_report(&cleaned, &airports, &airlines, &config.report, metadata)
            .context("Failed to compute flight statistics")?;
    report.metadata.record_duration(start_time);

    // Step 4: Render and write the report
    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };

    match args.output {
        Some(ref path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
        }
        None => println!("\n{}", output),
    }

    // Print summary
    say("\n📈 Summary:".to_string());
    say(format!("   Rows kept: {} / {}", cleaned.row_count(), raw.row_count()));
    say(format!(
        "   Delayed flights (>= {} min): {}",
        config.preprocess.delayed_minutes, report.delayed_flights
    ));
    if let Some(top) = report.top_airports_by_flights.rows.first() {
        say(format!(
            "   Busiest airport: {} ({})",
            top.code,
            report.top_airports_by_flights.format_value(top.value)
        ));
    }
    say(format!(
        "   Duration: {:.1}s",
        start_time.elapsed().as_secs_f64()
    ));
    if let Some(ref path) = args.output {
        say(format!("\n✅ Report saved to: {}", path.display()));
    }

    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
