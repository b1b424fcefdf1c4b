// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! HDDS Domain Monitor CLI
//!
//! Reports participants, node names and locators of a DDS domain.
//!
//! # Usage
//!
//! ```bash
//! # Monitor domain 0, poll every 5 seconds
//! hdds-monitor --domain 0
//!
//! # Replay a topology file and stop after 3 polls
//! hdds-monitor --topology domain.json --max-ticks 3
//!
//! # Using configuration file
//! hdds-monitor --config monitor.toml
//!
//! # Generate an example configuration file
//! hdds-monitor gen-config --output monitor.toml
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hdds_monitor::{
    MemoryBackend, Monitor, MonitorConfig, OutputFormat, Reporter, StopHandle, Topology,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// HDDS Domain Monitor
#[derive(Parser, Debug)]
#[command(name = "hdds-monitor")]
#[command(about = "Live DDS domain monitor - participants, node names and locators")]
#[command(version)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// DDS domain ID
    #[arg(short, long)]
    domain: Option<u32>,

    /// Histogram bin count (reserved)
    #[arg(long)]
    bins: Option<u32>,

    /// Polling interval (seconds)
    #[arg(short, long)]
    interval: Option<u64>,

    /// Output format: text, json
    #[arg(short, long)]
    format: Option<OutputFormat>,

    /// Stop after N polls
    #[arg(long)]
    max_ticks: Option<u64>,

    /// Topology file (JSON) to feed the in-process backend
    #[arg(short, long)]
    topology: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate example configuration file
    GenConfig {
        /// Output file path
        #[arg(short, long, default_value = "monitor.toml")]
        output: PathBuf,
    },

    /// Validate a configuration file
    Validate {
        /// Configuration file path
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(ref cmd) = args.command {
        return match cmd {
            Commands::GenConfig { output } => cmd_gen_config(output),
            Commands::Validate { config } => cmd_validate(config),
        };
    }

    let config = build_config(&args)?;

    // Diagnostics go to stderr, reports to stdout
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let topology = args
        .topology
        .as_ref()
        .map(|path| {
            Topology::from_file(path)
                .with_context(|| format!("Failed to load topology {}", path.display()))
        })
        .transpose()?;

    let backend = Arc::new(MemoryBackend::new());
    let reporter = Arc::new(Reporter::stdout(config.format));
    let mut monitor = Monitor::with_reporter(config, backend.clone(), reporter)
        .context("Failed to create monitor")?;

    if let Err(err) = monitor.init() {
        eprintln!("Error creating monitor: {}", err);
        std::process::exit(1);
    }

    if let Some(topology) = topology {
        let ids = backend.load(&topology);
        tracing::info!(entities = ids.len(), "Topology loaded");
    }

    ctrlc_handler(monitor.stop_handle());

    monitor.run().context("Monitor error")?;
    monitor.shutdown().context("Monitor teardown failed")?;

    Ok(())
}

fn build_config(args: &Args) -> Result<MonitorConfig> {
    let mut config = match args.config {
        Some(ref path) => MonitorConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => MonitorConfig::default(),
    };

    if let Some(domain) = args.domain {
        config.domain = domain;
    }
    if let Some(bins) = args.bins {
        config.bins = bins;
    }
    if let Some(interval) = args.interval {
        config.interval_secs = interval;
    }
    if let Some(format) = args.format {
        config.format = format;
    }
    if args.max_ticks.is_some() {
        config.max_ticks = args.max_ticks;
    }
    if let Some(ref level) = args.log_level {
        config.log_level = level.clone();
    }

    config.validate()?;
    Ok(config)
}

fn cmd_gen_config(output: &Path) -> Result<()> {
    let config = MonitorConfig::default();

    let toml_str = toml::to_string_pretty(&config)?;
    let content = format!(
        r#"# HDDS Monitor Configuration
# Generated by hdds-monitor gen-config

{}
"#,
        toml_str
    );

    std::fs::write(output, content)?;
    println!("Generated configuration file: {}", output.display());
    Ok(())
}

fn cmd_validate(config_path: &Path) -> Result<()> {
    match MonitorConfig::from_file(config_path) {
        Ok(config) => {
            println!("Configuration valid!");
            println!();
            println!("Domain: {}", config.domain);
            println!("Interval: {}s", config.interval_secs);
            println!("Format: {:?}", config.format);
            Ok(())
        }
        Err(e) => {
            eprintln!("Configuration invalid: {}", e);
            std::process::exit(1);
        }
    }
}

/// Setup Ctrl+C handler.
fn ctrlc_handler(stop_handle: StopHandle) {
    let _ = ctrlc::set_handler(move || {
        tracing::info!("Received Ctrl+C, stopping after the current interval...");
        stop_handle.stop();
    });
}
