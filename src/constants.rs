// src/constants.rs

/// The one credential pair the honeypot accepts.
pub const BAIT_USERNAME: &str = "admin";
pub const BAIT_PASSWORD: &str = "123456";

pub const WELCOME_BANNER: &str = "220 Welcome to FTP honeypot";

/// Timestamp format shared by event records and reports, local time.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Fixed timestamp shown for every entry in a directory listing.
pub const LISTING_TIMESTAMP: &str = "Apr 28 12:00";

/// IANA dynamic/private port range for PASV data listeners.
pub const PASV_PORT_MIN: u16 = 49152;
pub const PASV_PORT_MAX: u16 = 65535;
/// Re-rolls on a bind collision before giving up with 425.
pub const PASV_BIND_ATTEMPTS: u32 = 8;

/// A passive listener nobody connects to is torn down after this long.
pub const DATA_ACCEPT_TIMEOUT_SECS: u64 = 30;
/// A control connection idle this long is disconnected.
pub const SESSION_IDLE_TIMEOUT_SECS: u64 = 300;

pub const HELP_COMMANDS: &str =
    "USER PASS PWD CWD LIST PASV STOR RETR DELE MKD RMD NOOP WHOAMI HELP QUIT";
