use crate::core_log::{EventKind, EventLog, LogEvent};
use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use crate::Config;
use log::{info, warn};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the MKD (and XMKD) FTP command.
///
/// Creates a subdirectory of the current directory in the session's
/// synthetic tree. A name that already exists as a child or as a tracked
/// path is refused without mutating anything and without a terminating
/// event; successful creations record `mkd`, which feeds the
/// directory-tamper heuristic.
///
/// # Arguments
///
/// * `writer` - A shared, locked control stream for writing responses.
/// * `session` - A shared, locked session containing the client's state.
/// * `events` - The honeypot event log.
/// * `arg` - The directory name to create.
///
/// # Returns
///
/// Result<(), std::io::Error> indicating the success or failure of the operation.
pub async fn handle_mkd_command(
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

    match session.vfs.make_directory(&current_dir, dirname) {
        Ok(()) => {
            info!("[{}] created directory {} in {}", client, dirname, current_dir);
            let response = format!("257 \"{}\" created\r\n", dirname);
            send_response(&writer, response.as_bytes()).await?;
            events.record(LogEvent::new(EventKind::Mkd, &client).field("dirname", dirname));
        }
        Err(e) => {
            warn!("[{}] MKD refused: {}", client, e);
            send_response(&writer, b"550 Directory exists\r\n").await?;
        }
    }

    Ok(())
}
