// src/core_ftpcommand/pwd.rs
use crate::core_log::EventLog;
use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use crate::Config;
use std::sync::Arc;
use tokio::sync::Mutex;

pub async fn handle_pwd_command(
    writer: ControlWriter,
    _config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    _events: Arc<EventLog>,
    _arg: String,
) -> Result<(), std::io::Error> {
    let current_dir = session.lock().await.current_dir.clone();
    let response = format!("257 \"{}\" is the current directory\r\n", current_dir);
    send_response(&writer, response.as_bytes()).await?;
    Ok(())
}
