//! Per-session progress state shared between a worker and its observers.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

use amdl_web_types::{DownloadStatus, Severity};

/// One appended progress line.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressMessage {
    pub text: String,
    pub severity: Severity,
    /// Unix timestamp, second resolution.
    pub timestamp: i64,
}

/// `(message_count, percent, status)` read under one critical section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
    pub message_count: usize,
    pub percent: f64,
    pub status: DownloadStatus,
}

/// Messages appended after some offset, plus the percent and status that
/// were current when they were read.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressDelta {
    pub messages: Vec<ProgressMessage>,
    pub percent: f64,
    pub status: DownloadStatus,
    /// Total message count at read time (the next offset to ask for).
    pub total: usize,
}

#[derive(Debug)]
struct Inner {
    percent: f64,
    messages: Vec<ProgressMessage>,
    status: DownloadStatus,
    finished_at: Option<Instant>,
}

/// Mutable progress of one download session.
///
/// Every field lives behind a single record-scoped `RwLock`: mutations take
/// the write side, readers the read side, so an append or a status change is
/// never observed half-done. Percent and messages are independent fields;
/// nothing pairs a percent with the message that was appended next to it.
#[derive(Debug)]
pub struct ProgressRecord {
    id: String,
    inner: RwLock<Inner>,
}

impl ProgressRecord {
    /// Fresh record: no messages, 0 %, `started`.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            inner: RwLock::new(Inner {
                percent: 0.0,
                messages: Vec::new(),
                status: DownloadStatus::Started,
                finished_at: None,
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn append_message(&self, text: impl Into<String>, severity: Severity) {
        let message = ProgressMessage {
            text: text.into(),
            severity,
            timestamp: chrono::Utc::now().timestamp(),
        };
        self.write().messages.push(message);
    }

    /// Overwrites the percent. Callers only ever raise it; this is not checked.
    pub fn set_percent(&self, value: f64) {
        self.write().percent = value;
    }

    /// Overwrites the status. Once terminal, further transitions are ignored.
    pub fn set_status(&self, status: DownloadStatus) {
        let mut inner = self.write();
        if inner.status.is_terminal() {
            tracing::debug!(
                download_id = %self.id,
                current = %inner.status,
                requested = %status,
                "Ignoring status change on a finished download"
            );
            return;
        }
        inner.status = status;
        if status.is_terminal() {
            inner.finished_at = Some(Instant::now());
        }
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let inner = self.read();
        ProgressSnapshot {
            message_count: inner.messages.len(),
            percent: inner.percent,
            status: inner.status,
        }
    }

    /// Messages after `offset`, with the current percent and status.
    pub fn read_since(&self, offset: usize) -> ProgressDelta {
        let inner = self.read();
        let start = offset.min(inner.messages.len());
        ProgressDelta {
            messages: inner.messages[start..].to_vec(),
            percent: inner.percent,
            status: inner.status,
            total: inner.messages.len(),
        }
    }

    pub fn status(&self) -> DownloadStatus {
        self.read().status
    }

    /// When the record reached a terminal status, if it has.
    pub fn finished_at(&self) -> Option<Instant> {
        self.read().finished_at
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|poisoned| {
            tracing::error!(download_id = %self.id, "Progress lock poisoned (read)");
            poisoned.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|poisoned| {
            tracing::error!(download_id = %self.id, "Progress lock poisoned (write)");
            poisoned.into_inner()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn new_record_is_zeroed() {
        let record = ProgressRecord::new("1");
        let snap = record.snapshot();
        assert_eq!(snap.message_count, 0);
        assert_eq!(snap.percent, 0.0);
        assert_eq!(snap.status, DownloadStatus::Started);
        assert!(record.finished_at().is_none());
    }

    #[test]
    fn lifecycle() {
        let record = ProgressRecord::new("2");
        record.set_status(DownloadStatus::Running);
        record.append_message("first", Severity::Info);
        record.set_percent(40.0);
        record.append_message("second", Severity::Warning);

        let snap = record.snapshot();
        assert_eq!(snap.message_count, 2);
        assert_eq!(snap.percent, 40.0);
        assert_eq!(snap.status, DownloadStatus::Running);

        record.set_status(DownloadStatus::Completed);
        assert_eq!(record.status(), DownloadStatus::Completed);
        assert!(record.finished_at().is_some());
    }

    #[test]
    fn terminal_status_is_sticky() {
        let record = ProgressRecord::new("3");
        record.set_status(DownloadStatus::Failed);
        record.set_status(DownloadStatus::Completed);
        record.set_status(DownloadStatus::Running);
        assert_eq!(record.status(), DownloadStatus::Failed);
    }

    #[test]
    fn read_since_returns_only_new_messages() {
        let record = ProgressRecord::new("4");
        for i in 0..5 {
            record.append_message(format!("m{i}"), Severity::Info);
        }
        record.set_percent(55.0);

        let delta = record.read_since(3);
        let texts: Vec<_> = delta.messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["m3", "m4"]);
        assert_eq!(delta.total, 5);
        assert_eq!(delta.percent, 55.0);

        // Offsets past the end are clamped.
        let empty = record.read_since(99);
        assert!(empty.messages.is_empty());
        assert_eq!(empty.total, 5);
    }

    #[test]
    fn concurrent_appends_are_all_kept_in_lock_order() {
        let record = Arc::new(ProgressRecord::new("5"));
        let writers: Vec<_> = (0..4)
            .map(|w| {
                let record = Arc::clone(&record);
                std::thread::spawn(move || {
                    for i in 0..250 {
                        record.append_message(format!("{w}:{i}"), Severity::Info);
                    }
                })
            })
            .collect();
        for w in writers {
            w.join().unwrap();
        }

        let delta = record.read_since(0);
        assert_eq!(delta.total, 1000);
        // Per-producer order survives interleaving.
        for w in 0..4 {
            let mine: Vec<usize> = delta
                .messages
                .iter()
                .filter_map(|m| m.text.strip_prefix(&format!("{w}:")))
                .map(|n| n.parse().unwrap())
                .collect();
            assert_eq!(mine, (0..250).collect::<Vec<_>>());
        }
    }

    #[test]
    fn messages_carry_a_timestamp() {
        let record = ProgressRecord::new("6");
        let before = chrono::Utc::now().timestamp();
        record.append_message("hello", Severity::Success);
        let msg = &record.read_since(0).messages[0];
        assert!(msg.timestamp >= before);
        assert_eq!(msg.severity, Severity::Success);
    }
}
