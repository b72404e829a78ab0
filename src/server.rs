use crate::core_log::EventLog;
use crate::core_network::network;
use crate::Config;
use anyhow::Result;
use log::{error, info};
use std::sync::Arc;

/// Runs the honeypot with the provided configuration and event log.
///
/// This function starts the control-port accept loop and logs significant
/// steps and potential issues. It only returns on a startup failure; a
/// running server serves until the process is stopped.
///
/// # Arguments
///
/// * `config` - The server configuration.
/// * `events` - The shared event log every session records into.
///
/// # Returns
///
/// Result<(), anyhow::Error> indicating the success or failure of the operation.
pub async fn run(config: Arc<Config>, events: Arc<EventLog>) -> Result<()> {
    info!("starting honeypot with config: {:?}", config);

    match network::start_server(config, events).await {
        Ok(_) => info!("server stopped."),
        Err(e) => {
            error!("failed to start server: {}", e);
            return Err(e);
        }
    }

    Ok(())
}
