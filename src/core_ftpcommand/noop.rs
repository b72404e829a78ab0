use crate::core_log::EventLog;
use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use crate::Config;
use std::sync::Arc;
use tokio::sync::Mutex;

pub async fn handle_noop_command(
    writer: ControlWriter,
    _config: Arc<Config>,
    _session: Arc<Mutex<Session>>,
    _events: Arc<EventLog>,
    _arg: String,
) -> Result<(), std::io::Error> {
    send_response(&writer, b"200 NOOP ok\r\n").await?;
    Ok(())
}
