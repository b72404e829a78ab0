use crate::constants::HELP_COMMANDS;
use crate::core_log::EventLog;
use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use crate::Config;
use std::sync::Arc;
use tokio::sync::Mutex;

pub async fn handle_help_command(
    writer: ControlWriter,
    _config: Arc<Config>,
    _session: Arc<Mutex<Session>>,
    _events: Arc<EventLog>,
    _arg: String,
) -> Result<(), std::io::Error> {
    let response = format!("214-Commands:\r\n{}\r\n214 End of HELP\r\n", HELP_COMMANDS);
    send_response(&writer, response.as_bytes()).await?;
    Ok(())
}
