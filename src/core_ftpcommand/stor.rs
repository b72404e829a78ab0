use crate::core_log::{EventKind, EventLog, LogEvent};
use crate::core_network::pasv::close_data_stream;
use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use crate::Config;
use log::info;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handles the STOR FTP command.
///
/// Nothing is ever read from the data connection: the upload is recorded
/// in the session's synthetic tree as a zero-byte file and the channel is
/// closed. STOR always succeeds once a data connection is bound -- the
/// permissive behavior is the bait.
pub async fn handle_stor_command(
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
            send_response(&writer, b"425 No data connection for STOR\r\n").await?;
            events.record(LogEvent::new(EventKind::StorFailedNoData, &client));
            return Ok(());
        }
    };

    send_response(&writer, b"150 Ok to receive data\r\n").await?;
    events.record(LogEvent::new(EventKind::StorStart, &client).field("filename", filename));

    let current_dir = session.current_dir.clone();
    session.vfs.put_file(&current_dir, filename, 0);

    close_data_stream(&stream).await;
    session.data_channel = None;

    send_response(&writer, b"226 Transfer complete\r\n").await?;
    events.record(LogEvent::new(EventKind::StorDone, &client).field("filename", filename));
    info!("[{}] recorded upload {}/{}", client, current_dir, filename);

    Ok(())
}
