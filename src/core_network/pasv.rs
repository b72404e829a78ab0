use crate::constants::{
    DATA_ACCEPT_TIMEOUT_SECS, PASV_BIND_ATTEMPTS, PASV_PORT_MAX, PASV_PORT_MIN,
};
use crate::core_log::{EventKind, EventLog, LogEvent};
use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use crate::Config;
use log::{debug, error, info, warn};
use rand::Rng;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio::time::timeout;

/// A single-use passive-mode data endpoint. A session holds at most one;
/// the transfer that uses it takes it down with it.
#[derive(Debug)]
pub struct DataChannel {
    pub port: u16,
    /// Set by the accept task once the client connects back to the
    /// advertised port.
    pub stream: Option<Arc<Mutex<TcpStream>>>,
}

/// Sets up a passive mode (PASV) listener and sends the 227 response.
///
/// One outstanding channel per session: a second PASV while one is open is
/// rejected with 425, never replaced. The listener port is drawn at random
/// from the dynamic/private range and advertised in the standard
/// `(h1,h2,h3,h4,p1,p2)` encoding. A spawned accept task binds the inbound
/// connection back into this session's channel; if nobody connects within
/// the accept timeout the unused channel is cleared.
pub async fn handle_pasv_command(
    writer: ControlWriter,
    config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    events: Arc<EventLog>,
    _arg: String,
) -> Result<(), std::io::Error> {
    let client = {
        let session = session.lock().await;
        if session.data_channel.is_some() {
            warn!("[{}] PASV with a data channel already open", session.client);
            drop(session);
            send_response(&writer, b"425 Data connection already open\r\n").await?;
            return Ok(());
        }
        session.client.clone()
    };

    let pasv_ip: Ipv4Addr = config
        .server
        .pasv_address
        .parse()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    let (listener, port) = match bind_pasv_listener(pasv_ip).await {
        Some(bound) => bound,
        None => {
            error!("[{}] no free passive port after {} attempts", client, PASV_BIND_ATTEMPTS);
            send_response(&writer, b"425 Can't open data connection\r\n").await?;
            return Ok(());
        }
    };

    session.lock().await.data_channel = Some(DataChannel { port, stream: None });

    let response = format_pasv_response(pasv_ip, port);
    send_response(&writer, response.as_bytes()).await?;
    events.record(LogEvent::new(EventKind::Pasv, &client).field("port", port.to_string()));
    info!("[{}] passive listener on port {}", client, port);

    // Accept task: the one callback allowed to reach back into the session,
    // and only to bind the inbound connection to the channel it was opened
    // for. Matching on the port keeps a stale accept from clobbering a
    // fresh channel.
    let session = Arc::clone(&session);
    tokio::spawn(async move {
        match timeout(
            Duration::from_secs(DATA_ACCEPT_TIMEOUT_SECS),
            listener.accept(),
        )
        .await
        {
            Ok(Ok((stream, peer))) => {
                debug!("data connection from {} on port {}", peer, port);
                let mut session = session.lock().await;
                match session.data_channel.as_mut() {
                    Some(channel) if channel.port == port => {
                        channel.stream = Some(Arc::new(Mutex::new(stream)));
                    }
                    _ => debug!("data connection for a stale channel on port {}", port),
                }
            }
            Ok(Err(e)) => error!("failed to accept data connection on port {}: {}", port, e),
            Err(_) => {
                let mut session = session.lock().await;
                let unused = matches!(
                    session.data_channel.as_ref(),
                    Some(channel) if channel.port == port && channel.stream.is_none()
                );
                if unused {
                    info!("passive listener on port {} expired unused", port);
                    session.data_channel = None;
                }
            }
        }
    });

    Ok(())
}

/// Binds a listener on a pseudo-random port in the dynamic/private range,
/// re-rolling a few times on collision.
async fn bind_pasv_listener(ip: Ipv4Addr) -> Option<(TcpListener, u16)> {
    for _ in 0..PASV_BIND_ATTEMPTS {
        let port = rand::thread_rng().gen_range(PASV_PORT_MIN..=PASV_PORT_MAX);
        match TcpListener::bind((ip, port)).await {
            Ok(listener) => return Some((listener, port)),
            Err(e) => debug!("passive port {} unavailable: {}", port, e),
        }
    }
    None
}

/// The 227 reply: four address octets plus the port split into
/// `p1 = port / 256` and `p2 = port % 256`.
pub fn format_pasv_response(ip: Ipv4Addr, port: u16) -> String {
    let octets = ip.octets();
    format!(
        "227 Entering Passive Mode ({},{},{},{},{},{})\r\n",
        octets[0],
        octets[1],
        octets[2],
        octets[3],
        port / 256,
        port % 256
    )
}

/// Shuts a consumed data connection down. Errors are ignored; the peer may
/// already be gone.
pub async fn close_data_stream(stream: &Arc<Mutex<TcpStream>>) {
    let mut stream = stream.lock().await;
    let _ = stream.shutdown().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pasv_response_encoding() {
        let response = format_pasv_response(Ipv4Addr::new(192, 168, 1, 9), 50123);
        assert_eq!(
            response,
            "227 Entering Passive Mode (192,168,1,9,195,203)\r\n"
        );
    }

    #[test]
    fn test_pasv_response_low_port_byte() {
        let response = format_pasv_response(Ipv4Addr::new(127, 0, 0, 1), 256);
        assert_eq!(response, "227 Entering Passive Mode (127,0,0,1,1,0)\r\n");
    }
}
