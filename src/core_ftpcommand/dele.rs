use crate::core_log::{EventKind, EventLog, LogEvent};
use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use crate::Config;
use log::info;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the DELE FTP command.
///
/// Removes a file from the current directory of the session's synthetic
/// tree. The refusal text deliberately claims a permission problem rather
/// than a missing file.
pub async fn handle_dele_command(
    writer: ControlWriter,
    _config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    events: Arc<EventLog>,
    arg: String,
) -> Result<(), std::io::Error> {
    let filename = arg.trim();
    let mut session = session.lock().await;
    let client = session.client.clone();
    let current_dir = session.current_dir.clone();

    match session.vfs.delete_file(&current_dir, filename) {
        Ok(()) => {
            info!("[{}] deleted {}/{}", client, current_dir, filename);
            send_response(&writer, b"250 File deleted\r\n").await?;
            events.record(LogEvent::new(EventKind::Dele, &client).field("filename", filename));
        }
        Err(_) => {
            send_response(&writer, b"550 Permission denied\r\n").await?;
            events
                .record(LogEvent::new(EventKind::DeleFailed, &client).field("filename", filename));
        }
    }

    Ok(())
}
