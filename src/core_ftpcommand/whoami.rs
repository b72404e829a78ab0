use crate::core_log::EventLog;
use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use crate::Config;
use std::sync::Arc;
use tokio::sync::Mutex;

pub async fn handle_whoami_command(
    writer: ControlWriter,
    _config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    _events: Arc<EventLog>,
    _arg: String,
) -> Result<(), std::io::Error> {
    let username = session.lock().await.username.clone().unwrap_or_default();
    let response = format!("200 You are: {}\r\n", username);
    send_response(&writer, response.as_bytes()).await?;
    Ok(())
}
