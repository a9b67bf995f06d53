//! Operator-facing event log: newest first, bounded.

use std::collections::VecDeque;

use chrono::{DateTime, Local};

/// Default number of entries kept.
pub const DEFAULT_CAPACITY: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub message: String,
    pub severity: Severity,
    pub at: DateTime<Local>,
}

impl LogEntry {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        LogEntry {
            message: message.into(),
            severity,
            at: Local::now(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Severity::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Wall-clock time of the entry, `HH:MM:SS` local.
    pub fn time(&self) -> String {
        self.at.format("%H:%M:%S").to_string()
    }
}

/// Bounded log. Index 0 is the newest entry.
#[derive(Debug, Clone)]
pub struct LogBook {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl Default for LogBook {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl LogBook {
    /// A capacity of zero is bumped to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        LogBook {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Add an entry at the top, dropping the oldest past capacity.
    pub fn push(&mut self, entry: LogEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Newest first.
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn newest(&self) -> Option<&LogEntry> {
        self.entries.front()
    }
}
