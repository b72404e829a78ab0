use crate::core_log::{EventKind, EventLog, LogEvent};
use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use crate::Config;
use log::info;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the QUIT FTP command.
///
/// Replies 221 and records `quit`; the connection loop tears the session
/// down afterwards, releasing any open data channel with it.
pub async fn handle_quit_command(
    writer: ControlWriter,
    _config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    events: Arc<EventLog>,
    _arg: String,
) -> Result<(), std::io::Error> {
    let client = session.lock().await.client.clone();
    info!("[{}] QUIT, closing connection", client);
    send_response(&writer, b"221 Goodbye\r\n").await?;
    events.record(LogEvent::new(EventKind::Quit, &client));
    Ok(())
}
