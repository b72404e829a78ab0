// State machine tests driving the real command handlers over loopback
// sockets, with an in-memory event store standing in for the log file.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

use crate::config::Config;
use crate::core_detect::analyze;
use crate::core_ftpcommand::handlers::{dispatch_command, CommandFlow};
use crate::core_log::{EventKind, EventLog, MemoryEventStore};
use crate::helpers::ControlWriter;
use crate::session::Session;

struct Harness {
    writer: ControlWriter,
    config: Arc<Config>,
    session: Arc<Mutex<Session>>,
    store: Arc<MemoryEventStore>,
    events: Arc<EventLog>,
    client: BufReader<TcpStream>,
    _server_read: OwnedReadHalf,
}

impl Harness {
    async fn new() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (server, _) = listener.accept().await.unwrap();
        let (read_half, write_half) = server.into_split();

        let store = Arc::new(MemoryEventStore::new());
        let events = Arc::new(EventLog::new(Box::new(Arc::clone(&store))));
        Self {
            writer: Arc::new(Mutex::new(write_half)),
            config: Arc::new(Config::default()),
            session: Arc::new(Mutex::new(Session::new("10.0.0.1".to_string()))),
            store,
            events,
            client: BufReader::new(client),
            _server_read: read_half,
        }
    }

    async fn dispatch(&self, line: &str) -> CommandFlow {
        let (cmd, arg) = match line.split_once(char::is_whitespace) {
            Some((cmd, rest)) => (cmd, rest.trim()),
            None => (line, ""),
        };
        dispatch_command(
            &cmd.to_ascii_uppercase(),
            arg,
            Arc::clone(&self.writer),
            Arc::clone(&self.config),
            Arc::clone(&self.session),
            Arc::clone(&self.events),
        )
        .await
        .unwrap()
    }

    async fn reply(&mut self) -> String {
        let mut line = String::new();
        self.client.read_line(&mut line).await.unwrap();
        line.trim_end().to_string()
    }

    /// Dispatches one command line and returns the first reply line.
    async fn send(&mut self, line: &str) -> String {
        self.dispatch(line).await;
        self.reply().await
    }

    async fn login(&mut self) {
        assert_eq!(self.send("USER admin").await, "331 Username OK, need password");
        assert_eq!(self.send("PASS 123456").await, "230 Login successful");
    }

    fn kinds(&self) -> Vec<EventKind> {
        self.store.events().iter().map(|e| e.event).collect()
    }

    /// PASV, then connect a data socket and wait for the accept task to
    /// bind it into the session.
    async fn open_data_connection(&mut self) -> TcpStream {
        let reply = self.send("PASV").await;
        let port = parse_pasv_port(&reply);
        let data = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        for _ in 0..200 {
            if self.session.lock().await.bound_data_stream().is_some() {
                return data;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("data connection was never bound to the session");
    }
}

fn parse_pasv_port(reply: &str) -> u16 {
    let inner = reply
        .split_once('(')
        .and_then(|(_, rest)| rest.split_once(')'))
        .map(|(inner, _)| inner)
        .expect("227 reply with address tuple");
    let parts: Vec<u16> = inner.split(',').map(|p| p.parse().unwrap()).collect();
    assert_eq!(parts.len(), 6);
    parts[4] * 256 + parts[5]
}

#[tokio::test]
async fn test_only_bait_credentials_authenticate() {
    let mut h = Harness::new().await;

    assert_eq!(h.send("USER root").await, "530 Invalid username");
    assert!(h.session.lock().await.username.is_none());

    // The right password after the wrong username must not log in.
    assert_eq!(h.send("PASS 123456").await, "530 Login incorrect");
    assert!(!h.session.lock().await.is_authenticated);

    assert_eq!(h.send("USER admin").await, "331 Username OK, need password");
    assert_eq!(h.send("PASS letmein").await, "530 Login incorrect");
    assert!(!h.session.lock().await.is_authenticated);
    // A failed PASS reverts to the no-user state.
    assert!(h.session.lock().await.username.is_none());

    h.login().await;
    assert!(h.session.lock().await.is_authenticated);

    let kinds = h.kinds();
    assert_eq!(
        kinds,
        vec![
            EventKind::UserInvalid,
            EventKind::LoginFailed,
            EventKind::UserSet,
            EventKind::LoginFailed,
            EventKind::UserSet,
            EventKind::LoginSuccess,
        ]
    );
}

#[tokio::test]
async fn test_commands_before_login_have_no_side_effects() {
    let mut h = Harness::new().await;

    assert_eq!(h.send("PWD").await, "530 Please login with USER and PASS");
    assert_eq!(h.send("MKD evil").await, "530 Please login with USER and PASS");
    assert_eq!(h.send("NLST").await, "530 Please login with USER and PASS");

    let session = h.session.lock().await;
    assert!(!session.vfs.exists("/evil"));
    assert_eq!(session.current_dir, "/");
    assert!(h.store.events().is_empty());
}

#[tokio::test]
async fn test_unknown_command_after_login_gets_502() {
    let mut h = Harness::new().await;
    h.login().await;
    assert_eq!(h.send("SITE CHMOD 777 x").await, "502 Command not implemented");
}

#[tokio::test]
async fn test_cwd_dotdot_is_clamped_at_root() {
    let mut h = Harness::new().await;
    h.login().await;

    assert_eq!(h.send("CWD ..").await, "250 Directory changed to /");
    assert_eq!(h.send("CWD ..").await, "250 Directory changed to /");
    assert_eq!(h.session.lock().await.current_dir, "/");
    assert_eq!(h.send("PWD").await, "257 \"/\" is the current directory");
}

#[tokio::test]
async fn test_cwd_resolution_and_failure() {
    let mut h = Harness::new().await;
    h.login().await;

    assert_eq!(h.send("CWD fake_dir").await, "250 Directory changed to /fake_dir");
    assert_eq!(h.session.lock().await.current_dir, "/fake_dir");
    assert_eq!(h.send("CWD ..").await, "250 Directory changed to /");

    assert_eq!(h.send("CWD secrets").await, "550 Directory not found");
    assert_eq!(h.session.lock().await.current_dir, "/");

    let events = h.store.events();
    let failed = events
        .iter()
        .find(|e| e.event == EventKind::CwdFailed)
        .unwrap();
    assert_eq!(failed.fields.get("argument").unwrap(), "secrets");
}

#[tokio::test]
async fn test_mkd_rmd_round_trip_over_protocol() {
    let mut h = Harness::new().await;
    h.login().await;

    assert_eq!(h.send("MKD uploads").await, "257 \"uploads\" created");
    assert_eq!(h.send("MKD uploads").await, "550 Directory exists");
    assert_eq!(h.send("RMD uploads").await, "250 Directory removed");
    assert!(!h.session.lock().await.vfs.exists("/uploads"));

    // Removing the seeded, non-empty directory must not mutate anything.
    assert_eq!(h.send("RMD fake_dir").await, "550 Permission denied");
    assert!(h.session.lock().await.vfs.exists("/fake_dir"));

    let kinds = h.kinds();
    assert!(kinds.contains(&EventKind::Mkd));
    assert!(kinds.contains(&EventKind::Rmd));
    assert!(kinds.contains(&EventKind::RmdFailed));
}

#[tokio::test]
async fn test_dele_semantics() {
    let mut h = Harness::new().await;
    h.login().await;

    assert_eq!(h.send("DELE file1.txt").await, "550 Permission denied");
    assert_eq!(h.send("CWD fake_dir").await, "250 Directory changed to /fake_dir");
    assert_eq!(h.send("DELE file1.txt").await, "250 File deleted");
    assert_eq!(h.send("DELE file1.txt").await, "550 Permission denied");

    let kinds = h.kinds();
    assert_eq!(kinds.iter().filter(|k| **k == EventKind::Dele).count(), 1);
    assert_eq!(
        kinds.iter().filter(|k| **k == EventKind::DeleFailed).count(),
        2
    );
}

#[tokio::test]
async fn test_pasv_second_request_rejected() {
    let mut h = Harness::new().await;
    h.login().await;

    let reply = h.send("PASV").await;
    assert!(reply.starts_with("227 Entering Passive Mode ("), "got: {}", reply);
    assert_eq!(h.send("PASV").await, "425 Data connection already open");
}

#[tokio::test]
async fn test_list_without_data_connection_end_to_end() {
    let mut h = Harness::new().await;
    h.login().await;

    // PASV allocates a channel, but nobody connects to it before LIST.
    let reply = h.send("PASV").await;
    assert!(reply.starts_with("227"));
    assert_eq!(h.send("LIST").await, "425 No data connection");

    let events = h.store.events();
    assert!(events.iter().any(|e| e.event == EventKind::ListFailedNoData));
    assert!(!events.iter().any(|e| e.event == EventKind::ListDone));

    // And the aborted listing contributes nothing to the enumeration set.
    let report = analyze(&events, &h.config.detection);
    assert!(report.file_enum.is_empty());
}

#[tokio::test]
async fn test_list_transfers_listing_and_consumes_channel() {
    let mut h = Harness::new().await;
    h.login().await;

    let mut data = h.open_data_connection().await;
    assert_eq!(h.send("LIST").await, "150 Here comes the directory listing");

    let mut listing = String::new();
    data.read_to_string(&mut listing).await.unwrap();
    assert_eq!(
        listing,
        "drwxr-xr-x 1 owner group 0 Apr 28 12:00 fake_dir\r\n"
    );
    assert_eq!(h.reply().await, "226 Directory send OK");

    // The channel is consumed; the next LIST needs a fresh PASV.
    assert!(h.session.lock().await.data_channel.is_none());
    assert_eq!(h.send("LIST").await, "425 No data connection");

    let done = h.store.events();
    let done = done.iter().find(|e| e.event == EventKind::ListDone).unwrap();
    assert_eq!(done.fields.get("cwd").unwrap(), "/");
}

#[tokio::test]
async fn test_list_of_missing_directory() {
    let mut h = Harness::new().await;
    h.login().await;

    assert_eq!(h.send("LIST secrets").await, "550 Directory not found");
    let events = h.store.events();
    let failed = events
        .iter()
        .find(|e| e.event == EventKind::ListFailedNoDir)
        .unwrap();
    assert_eq!(failed.fields.get("argument").unwrap(), "secrets");
}

#[tokio::test]
async fn test_list_resolves_target_argument() {
    let mut h = Harness::new().await;
    h.login().await;

    let mut data = h.open_data_connection().await;
    assert_eq!(
        h.send("LIST fake_dir").await,
        "150 Here comes the directory listing"
    );

    let mut listing = String::new();
    data.read_to_string(&mut listing).await.unwrap();
    assert_eq!(
        listing,
        "-rw-r--r-- 1 owner group 123 Apr 28 12:00 file1.txt\r\n\
         -rw-r--r-- 1 owner group 456 Apr 28 12:00 file2.txt\r\n"
    );
    assert_eq!(h.reply().await, "226 Directory send OK");

    let done = h.store.events();
    let done = done.iter().find(|e| e.event == EventKind::ListDone).unwrap();
    assert_eq!(done.fields.get("cwd").unwrap(), "/fake_dir");
}

#[tokio::test]
async fn test_stor_records_zero_byte_file() {
    let mut h = Harness::new().await;
    h.login().await;

    assert_eq!(h.send("STOR dropper.bin").await, "425 No data connection for STOR");

    let _data = h.open_data_connection().await;
    assert_eq!(h.send("STOR dropper.bin").await, "150 Ok to receive data");
    assert_eq!(h.reply().await, "226 Transfer complete");

    let session = h.session.lock().await;
    let node = session.vfs.node("/").unwrap();
    assert_eq!(node.files.get("dropper.bin"), Some(&0));
    assert!(session.data_channel.is_none());
    drop(session);

    let kinds = h.kinds();
    assert!(kinds.contains(&EventKind::StorFailedNoData));
    assert!(kinds.contains(&EventKind::StorStart));
    assert!(kinds.contains(&EventKind::StorDone));
}

#[tokio::test]
async fn test_retr_serves_synthetic_payload() {
    let mut h = Harness::new().await;
    h.login().await;
    assert_eq!(h.send("CWD fake_dir").await, "250 Directory changed to /fake_dir");

    assert_eq!(h.send("RETR file1.txt").await, "425 No data connection for RETR");

    // An unknown file fails on the control channel and keeps the data
    // channel for a later transfer.
    let mut data = h.open_data_connection().await;
    assert_eq!(h.send("RETR nothere.txt").await, "550 File not found");
    assert!(h.session.lock().await.data_channel.is_some());

    assert_eq!(h.send("RETR file1.txt").await, "150 Opening data connection");
    let mut payload = String::new();
    data.read_to_string(&mut payload).await.unwrap();
    assert_eq!(payload, "Fake content of file file1.txt\r\n");
    assert_eq!(h.reply().await, "226 Transfer complete");

    let kinds = h.kinds();
    assert!(kinds.contains(&EventKind::RetrFailedNoData));
    assert!(kinds.contains(&EventKind::RetrStart));
    assert!(kinds.contains(&EventKind::RetrDone));
}

#[tokio::test]
async fn test_quit_disconnects() {
    let mut h = Harness::new().await;
    h.login().await;

    assert_eq!(h.dispatch("QUIT").await, CommandFlow::Disconnect);
    assert_eq!(h.reply().await, "221 Goodbye");
    assert!(h.kinds().contains(&EventKind::Quit));
}

#[tokio::test]
async fn test_whoami_and_help() {
    let mut h = Harness::new().await;
    h.login().await;

    assert_eq!(h.send("WHOAMI").await, "200 You are: admin");
    assert_eq!(h.send("NOOP").await, "200 NOOP ok");

    assert_eq!(h.send("HELP").await, "214-Commands:");
    assert_eq!(
        h.reply().await,
        "USER PASS PWD CWD LIST PASV STOR RETR DELE MKD RMD NOOP WHOAMI HELP QUIT"
    );
    assert_eq!(h.reply().await, "214 End of HELP");
}
