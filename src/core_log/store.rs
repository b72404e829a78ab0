use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use log::{debug, error};
use thiserror::Error;

use super::event::LogEvent;

#[derive(Error, Debug)]
pub enum EventLogError {
    #[error("event log I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("event serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Append-only destination for honeypot events.
pub trait EventSink: Send + Sync {
    fn append(&self, event: &LogEvent) -> Result<(), EventLogError>;
}

/// Replayable history of everything appended so far. The detection engine
/// depends on this abstraction, never on a concrete file.
pub trait EventSource: Send + Sync {
    fn read_all(&self) -> Result<Vec<LogEvent>, EventLogError>;
}

/// Newline-delimited JSON records in a single file.
///
/// Appends are one line per event. Reads parse line by line and skip
/// anything malformed, so a truncated or hand-edited log never aborts an
/// analysis run. A reader racing an appender simply sees the lines that
/// were complete when it opened the file.
pub struct FileEventStore {
    path: PathBuf,
}

impl FileEventStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl EventSink for FileEventStore {
    fn append(&self, event: &LogEvent) -> Result<(), EventLogError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let line = serde_json::to_string(event)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }
}

impl EventSource for FileEventStore {
    fn read_all(&self) -> Result<Vec<LogEvent>, EventLogError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut events = Vec::new();
        for line in contents.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<LogEvent>(line) {
                Ok(event) => events.push(event),
                Err(e) => debug!("skipping malformed event record: {}", e),
            }
        }
        Ok(events)
    }
}

/// In-process store backing tests and ad-hoc replay.
#[derive(Default)]
pub struct MemoryEventStore {
    events: Mutex<Vec<LogEvent>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LogEvent> {
        self.events.lock().expect("event store lock poisoned").clone()
    }
}

impl EventSink for MemoryEventStore {
    fn append(&self, event: &LogEvent) -> Result<(), EventLogError> {
        self.events
            .lock()
            .expect("event store lock poisoned")
            .push(event.clone());
        Ok(())
    }
}

impl EventSource for MemoryEventStore {
    fn read_all(&self) -> Result<Vec<LogEvent>, EventLogError> {
        Ok(self.events())
    }
}

impl<T: EventSink + ?Sized> EventSink for std::sync::Arc<T> {
    fn append(&self, event: &LogEvent) -> Result<(), EventLogError> {
        (**self).append(event)
    }
}

/// The recording facade session handlers talk to. A sink failure is an
/// operator problem, not a client-visible one: it is logged and the
/// session keeps serving.
pub struct EventLog {
    sink: Box<dyn EventSink>,
}

impl EventLog {
    pub fn new(sink: Box<dyn EventSink>) -> Self {
        Self { sink }
    }

    pub fn record(&self, event: LogEvent) {
        if let Err(e) = self.sink.append(&event) {
            error!("failed to record {:?} event: {}", event.event, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_log::event::EventKind;

    #[test]
    fn test_file_store_round_trip_skips_malformed() {
        let dir = std::env::temp_dir().join(format!("mielftpd-test-{}", std::process::id()));
        let path = dir.join("events.json");
        let _ = fs::remove_file(&path);

        let store = FileEventStore::new(&path);
        store
            .append(&LogEvent::at(
                "2026-04-28 12:00:00".to_string(),
                EventKind::Pasv,
                "10.0.0.1",
            ))
            .unwrap();
        store
            .append(&LogEvent::at(
                "2026-04-28 12:00:01".to_string(),
                EventKind::Quit,
                "10.0.0.1",
            ))
            .unwrap();

        // A corrupt line in the middle of the log must not poison the read.
        {
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            writeln!(file, "{{not json").unwrap();
            writeln!(file, "{{\"event\": \"made_up_kind\", \"client\": \"x\"}}").unwrap();
        }

        let events = store.read_all().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event, EventKind::Pasv);
        assert_eq!(events[1].event, EventKind::Quit);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_missing_file_reads_empty() {
        let store = FileEventStore::new("/nonexistent/mielftpd/events.json");
        assert!(store.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryEventStore::new();
        store
            .append(&LogEvent::at(
                "2026-04-28 12:00:00".to_string(),
                EventKind::Mkd,
                "10.0.0.2",
            ))
            .unwrap();
        assert_eq!(store.read_all().unwrap().len(), 1);
    }
}
