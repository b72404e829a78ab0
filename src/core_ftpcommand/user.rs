use crate::constants::BAIT_USERNAME;
use crate::core_log::{EventKind, EventLog, LogEvent};
use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use crate::Config;
use log::info;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the USER FTP command.
///
/// Only the bait username is ever accepted. Anything else clears the
/// stored username and is recorded as an invalid attempt -- which is
/// deliberately not the event the brute-force heuristic counts.
///
/// # Arguments
///
/// * `writer` - A shared, locked control stream for writing responses.
/// * `session` - A shared, locked session containing the client's state.
/// * `events` - The honeypot event log.
/// * `arg` - The username provided by the client.
///
/// # Returns
///
/// Result<(), std::io::Error> indicating the success or failure of the operation.
pub async fn handle_user_command(
    writer: ControlWriter,
    _config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    events: Arc<EventLog>,
    arg: String,
) -> Result<(), std::io::Error> {
    let username = arg.trim();
    let mut session = session.lock().await;
    let client = session.client.clone();

    if username == BAIT_USERNAME {
        info!("[{}] USER accepted: {}", client, username);
        session.username = Some(username.to_string());
        send_response(&writer, b"331 Username OK, need password\r\n").await?;
        events.record(LogEvent::new(EventKind::UserSet, &client).field("username", username));
    } else {
        info!("[{}] USER rejected: {}", client, username);
        session.username = None;
        send_response(&writer, b"530 Invalid username\r\n").await?;
        events.record(LogEvent::new(EventKind::UserInvalid, &client).field("username", username));
    }

    Ok(())
}
