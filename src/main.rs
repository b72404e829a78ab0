mod config;
mod constants;
mod core_cli;
mod core_detect;
mod core_ftpcommand;
mod core_log;
mod core_network;
mod core_vfs;
mod helpers;
mod server;
mod session;

pub use crate::config::Config;

use crate::core_cli::Cli;
use crate::core_detect::analyzer;
use crate::core_log::{EventLog, FileEventStore};
use anyhow::{Context, Result};
use clap::Parser;
use env_logger::{Builder, Env};
use log::{info, warn};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Cli::parse();

    // Initialize the logger with a custom format
    let default_filter = if args.verbose { "debug" } else { "info" };
    Builder::from_env(Env::default().default_filter_or(default_filter))
        .format(|buf, record| {
            let timestamp = buf.timestamp();
            writeln!(
                buf,
                "[{}] [{}] {}",
                timestamp,
                record.level(),
                record.args()
            )
        })
        .init();

    // Load configuration from the TOML file; a missing file means defaults,
    // only a file that exists but will not parse is an error.
    let config_path = if args.config.is_empty() {
        "/etc/mielftpd.conf"
    } else {
        args.config.as_str()
    };
    let config = Arc::new(load_config(config_path)?);

    // One store appends live events, the other replays them for analysis;
    // both point at the same newline-delimited record file.
    let store = Arc::new(FileEventStore::new(&config.server.log_file));
    let events = Arc::new(EventLog::new(Box::new(FileEventStore::new(
        &config.server.log_file,
    ))));

    // Periodic analysis over the full event history.
    let detection = config.detection.clone();
    let report_path = PathBuf::from(&config.server.report_file);
    let interval_secs = config.server.analysis_interval_secs.max(1);
    let analysis_store = Arc::clone(&store);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        // The first tick completes immediately; skip it so the first pass
        // runs a full interval after startup.
        interval.tick().await;
        loop {
            interval.tick().await;
            analyzer::run_analysis(analysis_store.as_ref(), &detection, &report_path);
        }
    });

    // Run the FTP honeypot; on Ctrl-C produce one last report before exit.
    tokio::select! {
        result = server::run(Arc::clone(&config), events) => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down, running final analysis");
            analyzer::run_analysis(
                store.as_ref(),
                &config.detection,
                &PathBuf::from(&config.server.report_file),
            );
        }
    }

    Ok(())
}

fn load_config(path: &str) -> Result<Config> {
    match fs::read_to_string(path) {
        Ok(raw) => toml::from_str(&raw)
            .with_context(|| format!("Failed to parse configuration file: {}", path)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("configuration file {} not found, using defaults", path);
            Ok(Config::default())
        }
        Err(e) => Err(anyhow::Error::new(e))
            .with_context(|| format!("Failed to read configuration file: {}", path)),
    }
}
