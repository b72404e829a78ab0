use crate::constants::LISTING_TIMESTAMP;
use crate::core_log::{EventKind, EventLog, LogEvent};
use crate::core_network::pasv::close_data_stream;
use crate::core_vfs::VirtualFs;
use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use crate::Config;
use log::{error, info, warn};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Handles the LIST FTP command.
///
/// The optional argument selects a target directory relative to the
/// current one; without it the current directory is listed. The listing
/// goes over the passive data connection, which is consumed by the
/// transfer: a follow-up LIST needs a fresh PASV. A LIST with no bound
/// data connection replies 425 and records `list_failed_no_data`, the
/// null-data-connection case the scan heuristic measures against PASV
/// counts; a completed listing records `list_done`, which feeds the
/// enumeration heuristic.
///
/// # Arguments
///
/// * `writer` - A shared, locked control stream for writing responses.
/// * `session` - A shared, locked session containing the client's state.
/// * `events` - The honeypot event log.
/// * `arg` - Optional directory to list.
///
/// # Returns
///
/// Result<(), std::io::Error> indicating the success or failure of the operation.
pub async fn handle_list_command(
    writer: ControlWriter,
    _config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    events: Arc<EventLog>,
    arg: String,
) -> Result<(), std::io::Error> {
    let arg = arg.trim();
    let mut session = session.lock().await;
    let client = session.client.clone();

    let target = if arg.is_empty() {
        session.current_dir.clone()
    } else {
        VirtualFs::resolve(&session.current_dir, arg)
    };

    let (dirs, files) = match session.vfs.list_entries(&target) {
        Ok(entries) => entries,
        Err(_) => {
            warn!("[{}] LIST of nonexistent directory: {}", client, arg);
            send_response(&writer, b"550 Directory not found\r\n").await?;
            events.record(
                LogEvent::new(EventKind::ListFailedNoDir, &client).field("argument", arg),
            );
            return Ok(());
        }
    };

    let stream = match session.bound_data_stream() {
        Some(stream) => stream,
        None => {
            send_response(&writer, b"425 No data connection\r\n").await?;
            events.record(LogEvent::new(EventKind::ListFailedNoData, &client));
            return Ok(());
        }
    };

    send_response(&writer, b"150 Here comes the directory listing\r\n").await?;
    events.record(LogEvent::new(EventKind::ListStart, &client).field("cwd", target.as_str()));

    let mut listing = String::new();
    for dir in &dirs {
        listing.push_str(&format!(
            "drwxr-xr-x 1 owner group 0 {} {}\r\n",
            LISTING_TIMESTAMP, dir
        ));
    }
    for (file, size) in &files {
        listing.push_str(&format!(
            "-rw-r--r-- 1 owner group {} {} {}\r\n",
            size, LISTING_TIMESTAMP, file
        ));
    }

    {
        let mut data = stream.lock().await;
        if let Err(e) = data.write_all(listing.as_bytes()).await {
            // A scanner that hangs up mid-listing is still a completed bait
            // interaction; the control channel stays up.
            error!("[{}] error writing listing to data connection: {}", client, e);
        }
    }
    close_data_stream(&stream).await;
    session.data_channel = None;

    send_response(&writer, b"226 Directory send OK\r\n").await?;
    events.record(LogEvent::new(EventKind::ListDone, &client).field("cwd", target.as_str()));
    info!("[{}] listed {} ({} dirs, {} files)", client, target, dirs.len(), files.len());

    Ok(())
}
