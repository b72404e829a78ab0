use crate::core_log::{EventKind, EventLog, LogEvent};
use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use crate::Config;
use log::{info, warn};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the RMD (and XRMD) FTP command.
///
/// Succeeds only for a known, empty subdirectory of the current directory;
/// anything else leaves the tree untouched and records `rmd_failed`.
/// Successful removals record `rmd`, the other half of the
/// directory-tamper signal.
pub async fn handle_rmd_command(
    writer: ControlWriter,
    _config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    events: Arc<EventLog>,
    arg: String,
) -> Result<(), std::io::Error> {
    let dirname = arg.trim();
    let mut session = session.lock().await;
    let client = session.client.clone();
    let current_dir = session.current_dir.clone();

    match session.vfs.remove_directory(&current_dir, dirname) {
        Ok(()) => {
            info!("[{}] removed directory {} from {}", client, dirname, current_dir);
            send_response(&writer, b"250 Directory removed\r\n").await?;
            events.record(LogEvent::new(EventKind::Rmd, &client).field("dirname", dirname));
        }
        Err(e) => {
            warn!("[{}] RMD refused: {}", client, e);
            send_response(&writer, b"550 Permission denied\r\n").await?;
            events.record(LogEvent::new(EventKind::RmdFailed, &client).field("dirname", dirname));
        }
    }

    Ok(())
}
