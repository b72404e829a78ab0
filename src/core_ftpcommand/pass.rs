use crate::constants::{BAIT_PASSWORD, BAIT_USERNAME};
use crate::core_log::{EventKind, EventLog, LogEvent};
use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use crate::Config;
use log::info;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the PASS FTP command.
///
/// Authentication succeeds only for the bait credential pair. A failure
/// emits `login_failed` -- the record the brute-force window counts -- and
/// reverts the session to the no-user state, so the next attempt has to
/// start over with USER.
pub async fn handle_pass_command(
    writer: ControlWriter,
    _config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    events: Arc<EventLog>,
    arg: String,
) -> Result<(), std::io::Error> {
    let mut session = session.lock().await;
    let client = session.client.clone();

    if session.username.as_deref() == Some(BAIT_USERNAME) && arg == BAIT_PASSWORD {
        info!("[{}] login successful", client);
        session.is_authenticated = true;
        send_response(&writer, b"230 Login successful\r\n").await?;
        events.record(
            LogEvent::new(EventKind::LoginSuccess, &client).field("username", BAIT_USERNAME),
        );
    } else {
        info!("[{}] login failed", client);
        send_response(&writer, b"530 Login incorrect\r\n").await?;
        let mut event = LogEvent::new(EventKind::LoginFailed, &client);
        if let Some(username) = &session.username {
            event = event.field("username", username);
        }
        events.record(event);
        session.username = None;
    }

    Ok(())
}
