use crate::constants::{SESSION_IDLE_TIMEOUT_SECS, WELCOME_BANNER};
use crate::core_ftpcommand::handlers::{dispatch_command, CommandFlow};
use crate::core_log::{EventKind, EventLog, LogEvent};
use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use crate::Config;
use anyhow::{Context, Result};
use log::{debug, info};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio::time::timeout;

pub async fn start_server(config: Arc<Config>, events: Arc<EventLog>) -> Result<()> {
    let listener = TcpListener::bind(format!("0.0.0.0:{}", config.server.listen_port))
        .await
        .with_context(|| format!("failed to bind control port {}", config.server.listen_port))?;
    info!("honeypot listening on port {}", config.server.listen_port);

    loop {
        let (socket, addr) = listener.accept().await?;
        info!("new connection from {}", addr);

        let config = Arc::clone(&config);
        let events = Arc::clone(&events);

        tokio::spawn(async move {
            handle_connection(socket, addr, config, events).await;
            info!("connection closed for {}", addr);
        });
    }
}

pub async fn handle_connection(
    socket: TcpStream,
    addr: SocketAddr,
    config: Arc<Config>,
    events: Arc<EventLog>,
) {
    let client = addr.ip().to_string();
    let state = Session::new(client.clone());
    debug!("[{}] session {} started", client, state.id);
    let session = Arc::new(Mutex::new(state));
    events.record(LogEvent::new(EventKind::ConnectionMade, &client));

    // Split the control socket: the reader (and its buffer) stays in the
    // command loop, the writer is shared with the handlers.
    let (read_half, write_half) = socket.into_split();
    let writer = Arc::new(Mutex::new(write_half));
    let mut reader = BufReader::new(read_half);

    let reason = match command_loop(&writer, &mut reader, &config, &session, &events, &client).await
    {
        Ok(reason) => reason,
        Err(e) => {
            debug!("[{}] connection error: {}", client, e);
            format!("connection error: {}", e)
        }
    };

    // Teardown releases any open data channel, bound or not.
    session.lock().await.data_channel = None;
    events.record(LogEvent::new(EventKind::ConnectionLost, &client).field("reason", reason));
}

/// Reads command lines until the session ends one way or another and
/// returns the reason. Every line is recorded before it is dispatched.
async fn command_loop(
    writer: &ControlWriter,
    reader: &mut BufReader<OwnedReadHalf>,
    config: &Arc<Config>,
    session: &Arc<Mutex<Session>>,
    events: &Arc<EventLog>,
    client: &str,
) -> Result<String, std::io::Error> {
    send_response(writer, format!("{}\r\n", WELCOME_BANNER).as_bytes()).await?;

    let mut buffer = String::new();
    loop {
        buffer.clear();
        let read = timeout(
            Duration::from_secs(SESSION_IDLE_TIMEOUT_SECS),
            reader.read_line(&mut buffer),
        )
        .await;
        let n = match read {
            Ok(result) => result?,
            Err(_) => {
                debug!("[{}] idle timeout", client);
                return Ok("idle timeout".to_string());
            }
        };
        if n == 0 {
            return Ok("client disconnected".to_string());
        }

        let line = buffer.trim();
        if line.is_empty() {
            continue;
        }

        let (cmd, arg) = match line.split_once(char::is_whitespace) {
            Some((cmd, rest)) => (cmd, rest.trim()),
            None => (line, ""),
        };
        let cmd = cmd.to_ascii_uppercase();
        debug!("[{}] received command: {} {}", client, cmd, arg);

        // Every line is captured, whatever becomes of it.
        events.record(
            LogEvent::new(EventKind::CommandReceived, client)
                .field("command", cmd.as_str())
                .field("argument", arg),
        );

        let flow = dispatch_command(
            &cmd,
            arg,
            Arc::clone(writer),
            Arc::clone(config),
            Arc::clone(session),
            Arc::clone(events),
        )
        .await?;
        if flow == CommandFlow::Disconnect {
            return Ok("quit".to_string());
        }
    }
}
