use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The kind of log event emitted during a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogEventKind {
    /// Raw output chunk from the terminal
    Output,
    /// Lifecycle message (spawn, write, terminate, exit)
    System,
    /// Something went wrong
    Error,
}

impl std::fmt::Display for LogEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogEventKind::Output => write!(f, "output"),
            LogEventKind::System => write!(f, "system"),
            LogEventKind::Error => write!(f, "error"),
        }
    }
}

/// A log event from session execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    /// When this event occurred
    pub timestamp: DateTime<Utc>,

    /// The kind of event
    pub kind: LogEventKind,

    /// Session this event belongs to
    pub session_id: Option<String>,

    /// Message text, or the decoded chunk for output events
    pub summary: String,
}

impl LogEvent {
    /// Create a new log event
    pub fn new(kind: LogEventKind, summary: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
            session_id: None,
            summary: summary.into(),
        }
    }

    /// Set the session ID for this event
    pub fn for_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Create an output event from decoded terminal text
    pub fn output(text: impl Into<String>) -> Self {
        Self::new(LogEventKind::Output, text)
    }

    /// Create a system event
    pub fn system(summary: impl Into<String>) -> Self {
        Self::new(LogEventKind::System, summary)
    }

    /// Create an error event
    pub fn error(summary: impl Into<String>) -> Self {
        Self::new(LogEventKind::Error, summary)
    }
}
