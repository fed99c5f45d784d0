//! Audit sinks: fire-and-forget recipients of free-text events.
//!
//! Recording never blocks an operation on failure and never returns an error.

use std::{
    fs::{File, OpenOptions},
    io::{self, Write},
    path::Path,
    sync::Mutex,
    time::{SystemTime, UNIX_EPOCH},
};
use tracing::{info, warn};

/// Destination for audit events.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: &str);
}

/// Appends `AUDIT: <unix-ms> <event>` lines to a file.
pub struct FileAuditSink {
    file: Mutex<File>,
}

impl FileAuditSink {
    /// Open `path` for appending, creating it if needed.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, event: &str) {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let Ok(mut file) = self.file.lock() else {
            warn!(event, "audit log lock poisoned; event dropped");
            return;
        };
        if let Err(err) = writeln!(file, "AUDIT: {millis} {event}") {
            warn!(%err, event, "failed to write audit event");
        }
    }
}

/// Emits events as `tracing` records under the `audit` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: &str) {
        info!(target: "audit", "{event}");
    }
}

/// Keeps events in memory.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<String>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every event recorded so far.
    pub fn events(&self) -> Vec<String> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: &str) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_sink_appends_prefixed_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("audit.log");

        let sink = FileAuditSink::open(&path).unwrap();
        sink.record("first");
        sink.record("second");
        drop(sink);

        // Reopening appends rather than truncating.
        FileAuditSink::open(&path).unwrap().record("third");

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| l.starts_with("AUDIT: ")));
        assert!(lines[0].ends_with(" first"));
        assert!(lines[2].ends_with(" third"));
    }

    #[test]
    fn memory_sink_keeps_order() {
        let sink = MemoryAuditSink::new();
        sink.record("a");
        sink.record("b");
        assert_eq!(sink.events(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn tracing_sink_never_fails() {
        TracingAuditSink.record("no subscriber installed");
    }
}
