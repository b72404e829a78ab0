use std::collections::BTreeMap;

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::constants::TIMESTAMP_FORMAT;

/// Everything a client can be observed doing, as a closed set. The wire
/// names (snake_case) are the vocabulary the detection engine consumes;
/// adding a kind here is a compile-time-checked variant addition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ConnectionMade,
    ConnectionLost,
    CommandReceived,
    UserSet,
    UserInvalid,
    LoginSuccess,
    LoginFailed,
    Cwd,
    CwdFailed,
    Pasv,
    ListFailedNoDir,
    ListFailedNoData,
    ListStart,
    ListDone,
    StorFailedNoData,
    StorStart,
    StorDone,
    RetrFailedNoData,
    RetrStart,
    RetrDone,
    Dele,
    DeleFailed,
    Mkd,
    Rmd,
    RmdFailed,
    Quit,
}

/// One structured record in the honeypot event log.
///
/// Serialized as a single JSON object per line. Event-specific fields
/// (`command`, `argument`, `username`, `filename`, `dirname`, `port`,
/// `cwd`, `from`, `to`, ...) are flattened next to the fixed ones.
/// Immutable once written; consumers order by `timestamp`, never by
/// position in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    pub timestamp: String,
    pub event: EventKind,
    pub client: String,
    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,
}

impl LogEvent {
    /// A record stamped with the current local time, second resolution.
    pub fn new(event: EventKind, client: &str) -> Self {
        Self::at(
            Local::now().format(TIMESTAMP_FORMAT).to_string(),
            event,
            client,
        )
    }

    /// A record with an explicit timestamp string, for replay and tests.
    pub fn at(timestamp: String, event: EventKind, client: &str) -> Self {
        Self {
            timestamp,
            event,
            client: client.to_string(),
            fields: BTreeMap::new(),
        }
    }

    pub fn field(mut self, key: &str, value: impl Into<String>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    /// The parsed timestamp, or `None` for a malformed record.
    pub fn parsed_timestamp(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.timestamp, TIMESTAMP_FORMAT).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_are_snake_case() {
        let event = LogEvent::at(
            "2026-04-28 12:00:00".to_string(),
            EventKind::ListFailedNoData,
            "10.0.0.1",
        );
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"list_failed_no_data\""));
        assert!(json.contains("\"client\":\"10.0.0.1\""));
    }

    #[test]
    fn test_fields_flatten() {
        let event = LogEvent::at(
            "2026-04-28 12:00:00".to_string(),
            EventKind::Pasv,
            "10.0.0.1",
        )
        .field("port", "50123");
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"port\":\"50123\""));

        let back: LogEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_parsed_timestamp() {
        let good = LogEvent::at(
            "2026-04-28 12:00:00".to_string(),
            EventKind::Quit,
            "10.0.0.1",
        );
        assert!(good.parsed_timestamp().is_some());

        let bad = LogEvent::at("yesterday-ish".to_string(), EventKind::Quit, "10.0.0.1");
        assert!(bad.parsed_timestamp().is_none());
    }
}
