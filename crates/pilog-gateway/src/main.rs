// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 pilog contributors

//! pilog gateway
//!
//! Serves the local reading store over HTTP.
//!
//! # Usage
//!
//! ```bash
//! # Default settings, listen on 0.0.0.0:5002
//! pilog-gateway
//!
//! # Also poll every 5 minutes in-process
//! pilog-gateway --poll-interval 300
//!
//! # Settings file, custom listen address
//! pilog-gateway --config pilog.toml --bind 127.0.0.1:8080
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use pilog::{AdapterOptions, HardwareKind, Poller, Settings, SqliteStore};
use pilog_gateway::{build_router, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// pilog HTTP gateway
#[derive(Parser, Debug)]
#[command(name = "pilog-gateway")]
#[command(about = "HTTP query gateway for pilog sensor readings")]
#[command(version)]
struct Args {
    /// Settings file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address
    #[arg(short, long)]
    bind: Option<String>,

    /// Database path (SQLite file)
    #[arg(short, long)]
    db: Option<PathBuf>,

    /// Sensor manifest (CSV), needed for GET /poll
    #[arg(short, long)]
    manifest: Option<PathBuf>,

    /// Device name used to select manifest rows
    #[arg(long)]
    device_name: Option<String>,

    /// Use simulated hardware
    #[arg(long)]
    simulate: bool,

    /// Also poll in-process every N seconds
    #[arg(long)]
    poll_interval: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
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

    let store = Arc::new(SqliteStore::open(&settings.database_path).with_context(|| {
        format!(
            "Failed to open database {}",
            settings.database_path.display()
        )
    })?);

    let mut state = AppState::new(Arc::clone(&store));

    // Without a manifest the gateway still serves queries, unless it was
    // asked to poll on an interval
    let manifest = pilog_gateway::load_manifest(
        &settings.device_name,
        &settings.manifest_path,
        args.poll_interval.is_some(),
    )
    .context("Failed to load sensor manifest")?;

    let poller = manifest.map(|manifest| {
        Arc::new(Poller::new(
            manifest,
            settings.hardware(),
            &AdapterOptions::default(),
            settings.identity(),
            Arc::clone(&store),
        ))
    });

    if let Some(poller) = &poller {
        state = state.with_poller(Arc::clone(poller));

        if args.poll_interval.is_some() {
            tokio::spawn(Arc::clone(poller).run_loop(settings.interval()));
        }
    }

    let app = build_router(Arc::new(state));

    info!("pilog gateway v{}", env!("CARGO_PKG_VERSION"));
    info!("HTTP server: http://{}", settings.bind);
    info!("Database: {}", settings.database_path.display());

    let listener = tokio::net::TcpListener::bind(&settings.bind)
        .await
        .with_context(|| format!("Failed to bind {}", settings.bind))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await
        .context("Server error")?;

    Ok(())
}

fn build_settings(args: &Args) -> Result<Settings> {
    let mut builder = Settings::builder();

    if let Some(path) = &args.config {
        let loaded = Settings::from_file(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?;
        builder = builder.base(loaded);
    }
    if let Some(bind) = &args.bind {
        builder = builder.bind(bind);
    }
    if let Some(path) = &args.db {
        builder = builder.database_path(path);
    }
    if let Some(path) = &args.manifest {
        builder = builder.manifest_path(path);
    }
    if let Some(name) = &args.device_name {
        builder = builder.device_name(name);
    }
    if args.simulate {
        builder = builder.hardware(HardwareKind::Simulated);
    }
    if let Some(level) = &args.log_level {
        builder = builder.log_level(level);
    }
    if let Some(secs) = args.poll_interval {
        builder = builder.interval_secs(secs);
    }

    Ok(builder.build()?)
}
