//! Analysis event log
//!
//! Every component reports progress through an [`EventLog`]. Events are
//! mirrored to `tracing` as they happen and end up in
//! [`AnalysisResult::logs`](super::AnalysisResult). Callers that want the
//! events elsewhere can plug in a [`LogSink`].

use super::model::{LogEvent, Severity};

/// External append-only collector for analysis events.
///
/// Implementations must not block and must not panic.
pub trait LogSink: Send + Sync {
    fn append(&self, timestamp: &str, severity: Severity, message: &str);
}

/// Discards everything
pub struct NullSink;

impl LogSink for NullSink {
    fn append(&self, _timestamp: &str, _severity: Severity, _message: &str) {}
}

/// Ordered buffer of log events with bounded message length
#[derive(Debug, Clone)]
pub struct EventLog {
    events: Vec<LogEvent>,
    message_limit: usize,
}

impl EventLog {
    pub fn new(message_limit: usize) -> Self {
        Self {
            events: Vec::new(),
            message_limit,
        }
    }

    pub fn info(&mut self, message: impl AsRef<str>) {
        self.push(Severity::Info, message);
    }

    pub fn warn(&mut self, message: impl AsRef<str>) {
        self.push(Severity::Warn, message);
    }

    pub fn push(&mut self, severity: Severity, message: impl AsRef<str>) {
        let message = truncate_message(message.as_ref(), self.message_limit);

        match severity {
            Severity::Info => tracing::info!(target: "pdf_link_miner::analysis", "{}", message),
            Severity::Warn => tracing::warn!(target: "pdf_link_miner::analysis", "{}", message),
            Severity::Error => tracing::error!(target: "pdf_link_miner::analysis", "{}", message),
        }

        self.events.push(LogEvent {
            timestamp: chrono::Local::now().format("%H:%M:%S").to_string(),
            severity,
            message,
        });
    }

    /// Move all events of `other` to the end of this log
    pub fn append(&mut self, other: EventLog) {
        self.events.extend(other.events);
    }

    pub fn into_events(self) -> Vec<LogEvent> {
        self.events
    }
}

/// Cut `message` to at most `limit` characters, marking the cut with `...`
pub fn truncate_message(message: &str, limit: usize) -> String {
    if message.chars().count() <= limit {
        return message.to_string();
    }
    let keep = limit.saturating_sub(3);
    let mut out: String = message.chars().take(keep).collect();
    out.push_str("...");
    out
}
