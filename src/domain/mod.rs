//! Core domain types for ptyrun

mod log_event;
mod session;
mod task;

pub use log_event::{LogEvent, LogEventKind};
pub use session::{SessionOutcome, SessionState, Termination};
pub use task::{NOTES_DIR_VAR, NOTES_FLAG_VAR, TaskRequest};
