pub mod event;
pub mod store;

pub use event::{EventKind, LogEvent};
pub use store::{EventLog, EventLogError, EventSink, EventSource, FileEventStore, MemoryEventStore};
