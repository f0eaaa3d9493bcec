//! Regiocast CLI binary.
//!
//! Runs the forecasting pipeline stage by stage or end to end.

mod integration;

use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use integration::cache_manager;
use integration::data_pipeline::{FetchConfig, fetch_raw_tables, print_cache_info};
use regiocast::PipelineConfig;
use regiocast::model::TrainingOutcome;
use regiocast::pipeline::{build_processed, build_report, train_from_features};
use regiocast_output::MetricsTable;
use std::error::Error;
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tracing::Level;

#[derive(Parser)]
#[command(name = "regiocast")]
#[command(about = "Regiocast: regional unemployment forecasting for Italy", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory artifacts are read from and written to
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, build and train in one go
    Run {
        /// Disable caching (always fetch fresh data)
        #[arg(long)]
        no_cache: bool,

        /// Force refresh cached data
        #[arg(long)]
        refresh: bool,
    },

    /// Download both datasets and write the raw tables
    Fetch {
        /// Disable caching (always fetch fresh data)
        #[arg(long)]
        no_cache: bool,

        /// Force refresh cached data
        #[arg(long)]
        refresh: bool,
    },

    /// Build the panel and feature tables from the raw tables
    Build,

    /// Train the models on the feature table
    Train,

    /// Summarize the artifacts on disk
    Report {
        /// Output format
        #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
        format: ReportFormat,
    },

    /// Inspect or clear the document cache
    Cache {
        /// Show cache statistics
        #[arg(long)]
        stats: bool,

        /// Delete all cached documents
        #[arg(long)]
        clear: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Text,
    Markdown,
    Json,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        let mut source = e.source();
        while let Some(cause) = source {
            eprintln!("  caused by: {cause}");
            source = cause.source();
        }
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<PipelineConfig, Box<dyn Error>> {
    let config = match &cli.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    Ok(match &cli.root {
        Some(root) => config.with_root(root.clone()),
        None => config,
    })
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message.to_string());
    pb
}

async fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Run { no_cache, refresh } => {
            let fetch = FetchConfig {
                use_cache: !no_cache,
                force_refresh: refresh,
            };
            fetch_stage(&config, &fetch).await?;
            build_stage(&config)?;
            let outcome = train_stage(&config)?;
            let report = build_report(&config, Some(outcome.strategy.to_string()))?;
            print!("{}", report.to_text());
        }
        Commands::Fetch { no_cache, refresh } => {
            let fetch = FetchConfig {
                use_cache: !no_cache,
                force_refresh: refresh,
            };
            fetch_stage(&config, &fetch).await?;
        }
        Commands::Build => build_stage(&config)?,
        Commands::Train => {
            train_stage(&config)?;
        }
        Commands::Report { format } => {
            let report = build_report(&config, None)?;
            match format {
                ReportFormat::Text => print!("{}", report.to_text()),
                ReportFormat::Markdown => print!("{}", report.to_markdown()),
                ReportFormat::Json => println!("{}", report.to_json()?),
            }
        }
        Commands::Cache { stats, clear } => cache_command(stats, clear)?,
    }

    Ok(())
}

async fn fetch_stage(config: &PipelineConfig, fetch: &FetchConfig) -> Result<(), Box<dyn Error>> {
    println!("1) Downloading raw data from Eurostat");
    if fetch.use_cache {
        print_cache_info();
        if fetch.force_refresh {
            println!("  Mode: Force refresh (re-fetching all data)");
        }
    } else {
        println!("  Cache: Disabled");
    }

    let pb = spinner("Fetching datasets...");
    match fetch_raw_tables(config, fetch, Some(&pb)).await {
        Ok(raw) => {
            pb.finish_with_message(format!(
                "Raw tables: {} unemployment rows ({}), {} GDP rows ({})",
                raw.unemployment.len(),
                raw.sources[0].as_str(),
                raw.gdp.len(),
                raw.sources[1].as_str()
            ));
            Ok(())
        }
        Err(e) => {
            pb.finish_with_message("Failed!");
            Err(e.into())
        }
    }
}

fn build_stage(config: &PipelineConfig) -> Result<(), Box<dyn Error>> {
    println!("2) Building panel and features");
    let pb = spinner("Assembling panel...");
    match build_processed(config) {
        Ok(features) => {
            let regions = {
                let mut geos: Vec<&str> = features.iter().map(|f| f.geo.as_str()).collect();
                geos.sort_unstable();
                geos.dedup();
                geos.len()
            };
            pb.finish_with_message(format!(
                "Feature table: {} rows for {} regions -> {}",
                features.len(),
                regions,
                config.features_path().display()
            ));
            Ok(())
        }
        Err(e) => {
            pb.finish_with_message("Failed!");
            Err(e.into())
        }
    }
}

fn train_stage(config: &PipelineConfig) -> Result<TrainingOutcome, Box<dyn Error>> {
    println!("3) Training models");
    let pb = spinner("Fitting ridge and random forest...");
    match train_from_features(config) {
        Ok(outcome) => {
            pb.finish_with_message(format!("Split: {}", outcome.strategy));
            print!("{}", MetricsTable::from(outcome.metrics.clone()));
            Ok(outcome)
        }
        Err(e) => {
            pb.finish_with_message("Failed!");
            Err(e.into())
        }
    }
}

fn cache_command(stats: bool, clear: bool) -> Result<(), Box<dyn Error>> {
    if clear {
        let cache = cache_manager::open_cache()?;
        cache.clear_all()?;
        println!("Cache cleared: {}", cache_manager::cache_path().display());
    }
    if stats || !clear {
        print_cache_info();
    }
    Ok(())
}
