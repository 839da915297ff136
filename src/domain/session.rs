use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lifecycle state of one session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Shell is being spawned
    Launching,
    /// Shell is running, no termination requested
    Running,
    /// Termination requested, waiting for the exit notification
    Terminating,
    /// Exit notification received (terminal)
    Exited,
}

impl SessionState {
    /// Whether the state machine allows moving from `self` to `next`
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Launching, Running) | (Running, Terminating) | (Running, Exited) | (Terminating, Exited)
        )
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Launching => write!(f, "launching"),
            SessionState::Running => write!(f, "running"),
            SessionState::Terminating => write!(f, "terminating"),
            SessionState::Exited => write!(f, "exited"),
        }
    }
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The process exited on its own; no termination was requested
    Exited,
    /// The completion signal appeared and the process was terminated
    Sentinel,
    /// The overall deadline passed
    TimedOut,
    /// Output went quiet for too long
    Idle,
}

impl Termination {
    /// True when the runner issued a termination request
    pub fn was_forced(self) -> bool {
        self != Termination::Exited
    }
}

impl std::fmt::Display for Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Termination::Exited => write!(f, "exited"),
            Termination::Sentinel => write!(f, "completed"),
            Termination::TimedOut => write!(f, "timed out"),
            Termination::Idle => write!(f, "idle"),
        }
    }
}

/// Result of a finished session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionOutcome {
    /// Everything the shell printed, in delivery order
    pub output: String,

    /// What ended the session
    pub termination: Termination,

    /// Exit code reported by the process, when available
    pub exit_code: Option<u32>,

    /// The line written to the shell (without the trailing carriage return)
    pub command_line: String,

    /// Wall time from launch to exit
    #[serde(with = "duration_ms")]
    pub duration: Duration,
}

impl SessionOutcome {
    /// The completion signal was seen, or the process exited cleanly on its own
    pub fn succeeded(&self) -> bool {
        match self.termination {
            Termination::Sentinel => true,
            Termination::Exited => self.exit_code == Some(0),
            Termination::TimedOut | Termination::Idle => false,
        }
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}
