use crate::core_log::{EventKind, EventLog, LogEvent};
use crate::core_network::pasv::close_data_stream;
use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use crate::Config;
use log::{error, info, warn};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Handles the RETR FTP command.
///
/// Downloads are synthetic: the payload is a fixed line of text naming the
/// requested file. The file must exist in the current directory of the
/// session's tree and a data connection must be bound; the channel is
/// consumed by the transfer.
///
/// # Arguments
///
/// * `writer` - A shared, locked control stream for writing responses.
/// * `session` - A shared, locked session containing the client's state.
/// * `events` - The honeypot event log.
/// * `arg` - The name of the file to retrieve.
///
/// # Returns
///
/// Result<(), std::io::Error> indicating the success or failure of the operation.
pub async fn handle_retr_command(
    writer: ControlWriter,
    _config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    events: Arc<EventLog>,
    arg: String,
) -> Result<(), std::io::Error> {
    let filename = arg.trim();
    let mut session = session.lock().await;
    let client = session.client.clone();

    let stream = match session.bound_data_stream() {
        Some(stream) => stream,
        None => {
            send_response(&writer, b"425 No data connection for RETR\r\n").await?;
            events.record(LogEvent::new(EventKind::RetrFailedNoData, &client));
            return Ok(());
        }
    };

    let known = session
        .vfs
        .node(&session.current_dir)
        .map(|node| node.files.contains_key(filename))
        .unwrap_or(false);
    if !known {
        warn!("[{}] RETR of unknown file: {}", client, filename);
        send_response(&writer, b"550 File not found\r\n").await?;
        return Ok(());
    }

    send_response(&writer, b"150 Opening data connection\r\n").await?;
    events.record(LogEvent::new(EventKind::RetrStart, &client).field("filename", filename));

    let content = format!("Fake content of file {}\r\n", filename);
    {
        let mut data = stream.lock().await;
        if let Err(e) = data.write_all(content.as_bytes()).await {
            error!("[{}] error writing payload to data connection: {}", client, e);
        }
    }
    close_data_stream(&stream).await;
    session.data_channel = None;

    send_response(&writer, b"226 Transfer complete\r\n").await?;
    events.record(LogEvent::new(EventKind::RetrDone, &client).field("filename", filename));
    info!("[{}] served synthetic download of {}", client, filename);

    Ok(())
}
