// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 pilog contributors

//! pilog CLI
//!
//! Polls the sensors listed in the manifest for this device and appends the
//! readings to the local SQLite store.
//!
//! # Usage
//!
//! ```bash
//! # One poll cycle
//! pilog poll
//!
//! # Poll every interval_secs (or every N s with --freq N)
//! pilog poll --freq
//!
//! # Without hardware
//! pilog --simulate --manifest sensors.csv poll
//!
//! # Inspect the store
//! pilog last
//! pilog since "2024-06-01 12:00:00"
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pilog::{
    import_legacy_csv, manifest, query::QueryFacade, AdapterOptions, HardwareKind, Poller,
    ReadingStore, Settings, SqliteStore,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Environmental sensor logger
#[derive(Parser, Debug)]
#[command(name = "pilog")]
#[command(about = "Poll environmental sensors and log readings to SQLite")]
#[command(version)]
struct Args {
    /// Settings file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Device name used to select manifest rows
    #[arg(long, global = true)]
    device_name: Option<String>,

    /// Sensor manifest (CSV)
    #[arg(short, long, global = true)]
    manifest: Option<PathBuf>,

    /// Database path (SQLite file)
    #[arg(short, long, global = true)]
    db: Option<PathBuf>,

    /// Use simulated hardware
    #[arg(long, global = true)]
    simulate: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Poll all configured sensors
    Poll {
        /// Keep polling, pausing this many seconds between cycles
        /// (the configured interval when no value is given)
        #[arg(long, num_args = 0..=1, value_parser = clap::value_parser!(u64).range(1..))]
        freq: Option<Option<u64>>,
    },

    /// Create the database schema
    InitDb,

    /// Print the most recent reading
    Last,

    /// Print readings newer than a timestamp
    Since {
        /// RFC 3339, "YYYY-MM-DD HH:MM:SS" or "YYYY-MM-DD" (UTC)
        timestamp: String,
    },

    /// Print the device serial number
    Serial,

    /// Show statistics
    Stats,

    /// Import a legacy CSV log
    Import {
        /// Legacy log file
        csv: PathBuf,
    },

    /// Generate a settings file with the defaults
    GenConfig {
        /// Output file path
        #[arg(short, long, default_value = "pilog.toml")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = build_settings(&args)?;

    let filter = EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match args.command {
        Commands::Poll { freq } => cmd_poll(settings, freq).await,
        Commands::InitDb => cmd_init_db(&settings),
        Commands::Last => cmd_last(&settings),
        Commands::Since { timestamp } => cmd_since(&settings, &timestamp),
        Commands::Serial => {
            println!("{}", settings.identity().device_id);
            Ok(())
        }
        Commands::Stats => cmd_stats(&settings),
        Commands::Import { csv } => cmd_import(&settings, csv),
        Commands::GenConfig { output } => cmd_gen_config(&settings, output),
    }
}

fn build_settings(args: &Args) -> Result<Settings> {
    let mut builder = Settings::builder();

    if let Some(path) = &args.config {
        let loaded = Settings::from_file(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?;
        builder = builder.base(loaded);
    }
    if let Some(name) = &args.device_name {
        builder = builder.device_name(name);
    }
    if let Some(path) = &args.manifest {
        builder = builder.manifest_path(path);
    }
    if let Some(path) = &args.db {
        builder = builder.database_path(path);
    }
    if args.simulate {
        builder = builder.hardware(HardwareKind::Simulated);
    }
    if let Some(level) = &args.log_level {
        builder = builder.log_level(level);
    }

    Ok(builder.build()?)
}

fn open_store(settings: &Settings) -> Result<SqliteStore> {
    SqliteStore::open(&settings.database_path).with_context(|| {
        format!(
            "Failed to open database {}",
            settings.database_path.display()
        )
    })
}

/// Pause between cycles, or `None` for a single cycle.
fn loop_interval(freq: Option<Option<u64>>, settings: &Settings) -> Option<Duration> {
    freq.map(|secs| secs.map_or_else(|| settings.interval(), Duration::from_secs))
}

async fn cmd_poll(settings: Settings, freq: Option<Option<u64>>) -> Result<()> {
    let manifest = manifest::load(&settings.device_name, &settings.manifest_path)
        .context("Failed to load sensor manifest")?;
    let store = Arc::new(open_store(&settings)?);
    let identity = settings.identity();

    tracing::info!("pilog v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("  Device: {} ({})", identity.device_name, identity.device_id);
    tracing::info!("  Database: {}", settings.database_path.display());
    tracing::info!("  Hardware: {:?}", settings.hardware);

    let poller = Arc::new(Poller::new(
        manifest,
        settings.hardware(),
        &AdapterOptions::default(),
        identity,
        store,
    ));

    let Some(interval) = loop_interval(freq, &settings) else {
        let written = tokio::task::spawn_blocking(move || poller.run_once()).await??;
        println!("{} readings written", written);
        return Ok(());
    };

    let stats_source = Arc::clone(&poller);
    tokio::select! {
        _ = poller.run_loop(interval) => {}
        result = tokio::signal::ctrl_c() => {
            result?;
            println!("\nShutting down...");
        }
    }

    let stats = stats_source.stats();
    println!(
        "Cycles: {}, written: {}, failed reads: {}, storage errors: {}",
        stats.cycles, stats.written, stats.failed_reads, stats.storage_errors
    );
    Ok(())
}

fn cmd_init_db(settings: &Settings) -> Result<()> {
    open_store(settings)?;
    println!("Database ready at {}", settings.database_path.display());
    Ok(())
}

fn cmd_last(settings: &Settings) -> Result<()> {
    let facade = QueryFacade::new(Arc::new(open_store(settings)?));
    let response = facade.latest()?;
    println!("{}", serde_json::to_string_pretty(&response.to_json())?);
    Ok(())
}

fn cmd_since(settings: &Settings, timestamp: &str) -> Result<()> {
    let facade = QueryFacade::new(Arc::new(open_store(settings)?));
    let response = facade.since(timestamp)?;
    println!("{}", serde_json::to_string_pretty(&response.to_json())?);
    Ok(())
}

fn cmd_stats(settings: &Settings) -> Result<()> {
    let store = open_store(settings)?;
    println!("Total readings stored: {}", store.count()?);

    if let Some(latest) = store.query_latest()? {
        println!("Latest: {} {} ({})", latest.timestamp, latest.location, latest.sensor_type);
    }
    Ok(())
}

fn cmd_import(settings: &Settings, csv: PathBuf) -> Result<()> {
    let store = open_store(settings)?;
    let summary = import_legacy_csv(&csv, &settings.identity(), &store)
        .with_context(|| format!("Failed to import {}", csv.display()))?;

    println!(
        "Imported {} readings ({} rows skipped)",
        summary.imported, summary.skipped
    );
    Ok(())
}

fn cmd_gen_config(settings: &Settings, output: PathBuf) -> Result<()> {
    std::fs::write(&output, settings.to_toml()?)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("Settings written to {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poll_freq(argv: &[&str]) -> Result<Option<Option<u64>>, clap::Error> {
        let args = Args::try_parse_from(argv)?;
        match args.command {
            Commands::Poll { freq } => Ok(freq),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_bare_freq_uses_configured_interval() {
        let settings = Settings::builder().interval_secs(60).build().unwrap();
        let freq = poll_freq(&["pilog", "poll", "--freq"]).unwrap();

        assert_eq!(freq, Some(None));
        assert_eq!(
            loop_interval(freq, &settings),
            Some(Duration::from_secs(60))
        );
    }

    #[test]
    fn test_explicit_freq_and_single_cycle() {
        let settings = Settings::builder().build().unwrap();

        let freq = poll_freq(&["pilog", "poll", "--freq", "15"]).unwrap();
        assert_eq!(loop_interval(freq, &settings), Some(Duration::from_secs(15)));

        let freq = poll_freq(&["pilog", "poll"]).unwrap();
        assert_eq!(loop_interval(freq, &settings), None);
    }

    #[test]
    fn test_zero_freq_rejected() {
        assert!(poll_freq(&["pilog", "poll", "--freq", "0"]).is_err());
    }
}
