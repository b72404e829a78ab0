use crate::core_log::{EventKind, EventLog, LogEvent};
use crate::core_vfs::VirtualFs;
use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use crate::Config;
use log::info;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the CWD FTP command against the synthetic tree.
///
/// `..` always succeeds and clamps at root. Any other argument resolves by
/// concatenation against the current directory; a miss replies 550 and
/// records `cwd_failed` -- the signal the directory-traversal heuristic
/// counts.
pub async fn handle_cwd_command(
    writer: ControlWriter,
    _config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    events: Arc<EventLog>,
    arg: String,
) -> Result<(), std::io::Error> {
    let arg = arg.trim();
    let mut session = session.lock().await;
    let client = session.client.clone();
    let from = session.current_dir.clone();
    let target = VirtualFs::resolve(&from, arg);

    if arg == ".." || session.vfs.exists(&target) {
        session.current_dir = target.clone();
        let response = format!("250 Directory changed to {}\r\n", target);
        send_response(&writer, response.as_bytes()).await?;
        events.record(
            LogEvent::new(EventKind::Cwd, &client)
                .field("from", from)
                .field("to", target),
        );
    } else {
        info!("[{}] CWD to nonexistent directory: {}", client, arg);
        send_response(&writer, b"550 Directory not found\r\n").await?;
        events.record(LogEvent::new(EventKind::CwdFailed, &client).field("argument", arg));
    }

    Ok(())
}
