use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use crate::core_network::pasv::DataChannel;
use crate::core_vfs::VirtualFs;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Per-connection state. Each session owns its own copy of the bait
/// filesystem; nothing here is shared between clients.
#[derive(Debug)]
pub struct Session {
    pub id: u64,
    /// Dotted client address as it appears in event records.
    pub client: String,
    pub username: Option<String>,
    pub is_authenticated: bool,
    pub current_dir: String,
    pub vfs: VirtualFs,
    /// At most one outstanding passive data channel. A second PASV while
    /// this is `Some` is rejected, never replaced.
    pub data_channel: Option<DataChannel>,
}

impl Session {
    pub fn new(client: String) -> Self {
        Self {
            id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
            client,
            username: None,
            is_authenticated: false,
            current_dir: String::from("/"),
            vfs: VirtualFs::seeded(),
            data_channel: None,
        }
    }

    /// A bound data connection ready for a single transfer, if any.
    pub fn bound_data_stream(&self) -> Option<Arc<Mutex<TcpStream>>> {
        self.data_channel
            .as_ref()
            .and_then(|channel| channel.stream.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_unauthenticated_at_root() {
        let session = Session::new("10.0.0.1".to_string());
        assert!(!session.is_authenticated);
        assert!(session.username.is_none());
        assert_eq!(session.current_dir, "/");
        assert!(session.data_channel.is_none());
        assert!(session.vfs.exists("/fake_dir"));
    }

    #[test]
    fn test_session_ids_are_unique() {
        let a = Session::new("10.0.0.1".to_string());
        let b = Session::new("10.0.0.1".to_string());
        assert_ne!(a.id, b.id);
    }
}
