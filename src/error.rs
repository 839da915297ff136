//! Error type for session execution

use std::path::PathBuf;

/// Errors surfaced by [`crate::session::SessionRunner`]
///
/// Timeouts are not errors: a session ended by a deadline or idle timer still
/// returns an outcome, tagged with its [`crate::Termination`].
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Working directory does not exist or is not a directory: {}", .0.display())]
    InvalidWorkingDirectory(PathBuf),

    #[error("Instructions cannot be passed to the shell: {0}")]
    InvalidInstructions(String),

    #[error("Invalid session configuration: {0}")]
    InvalidConfig(String),

    #[error("No shell configured for platform '{0}'")]
    UnsupportedPlatform(String),

    #[error("Failed to spawn shell '{program}': {reason}")]
    Spawn { program: String, reason: String },

    #[error("PTY I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Process {pid:?} did not exit after forced termination")]
    ExitNotObserved {
        pid: Option<u32>,
        /// Output accumulated before giving up
        output: String,
    },
}

impl SessionError {
    /// Output collected before the failure, if the session got that far
    pub fn partial_output(&self) -> Option<&str> {
        match self {
            SessionError::ExitNotObserved { output, .. } => Some(output),
            _ => None,
        }
    }
}
