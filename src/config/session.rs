//! Session settings

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Terminal geometry, completion detection and timing for one session
///
/// Timeout fields set to `0` are disabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Terminal width in columns
    #[serde(default = "default_cols")]
    pub cols: u16,

    /// Terminal height in rows
    #[serde(default = "default_rows")]
    pub rows: u16,

    /// Value of TERM inside the session
    #[serde(default = "default_term")]
    pub term: String,

    /// Output substring that marks the task as done (empty disables detection)
    #[serde(default = "default_sentinel")]
    pub sentinel: String,

    /// Output substrings that show the tool is still working
    ///
    /// Once any of these has appeared, `idle_timeout_secs` no longer applies.
    #[serde(default = "default_keepalive_markers")]
    pub keepalive_markers: Vec<String>,

    /// Overall deadline from launch
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Silence allowed before any keep-alive marker has been seen
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,

    /// Silence allowed regardless of keep-alive markers
    #[serde(default = "default_stall_timeout_secs")]
    pub stall_timeout_secs: u64,

    /// How long to wait for the exit notification after a termination request
    #[serde(default = "default_kill_grace_ms")]
    pub kill_grace_ms: u64,

    /// Regex matched against output to detect that the shell is ready
    #[serde(default)]
    pub ready_pattern: Option<String>,

    /// How long to wait for `ready_pattern` before writing anyway
    #[serde(default = "default_ready_timeout_ms")]
    pub ready_timeout_ms: u64,

    /// Delay before writing when no `ready_pattern` is configured
    #[serde(default = "default_startup_delay_ms")]
    pub startup_delay_ms: u64,

    /// The command line is written in pieces of at most this many bytes
    #[serde(default = "default_write_chunk_size")]
    pub write_chunk_size: usize,

    /// Pause between pieces of the command line
    #[serde(default = "default_write_chunk_delay_ms")]
    pub write_chunk_delay_ms: u64,
}

fn default_cols() -> u16 {
    80
}

fn default_rows() -> u16 {
    30
}

fn default_term() -> String {
    "xterm-color".to_string()
}

fn default_sentinel() -> String {
    "Complete!".to_string()
}

fn default_keepalive_markers() -> Vec<String> {
    vec!["Wait...".to_string(), "file:".to_string()]
}

fn default_timeout_secs() -> u64 {
    900
}

fn default_idle_timeout_secs() -> u64 {
    10
}

fn default_stall_timeout_secs() -> u64 {
    30
}

fn default_kill_grace_ms() -> u64 {
    5000
}

fn default_ready_timeout_ms() -> u64 {
    5000
}

fn default_startup_delay_ms() -> u64 {
    100
}

fn default_write_chunk_size() -> usize {
    1024
}

fn default_write_chunk_delay_ms() -> u64 {
    100
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            cols: default_cols(),
            rows: default_rows(),
            term: default_term(),
            sentinel: default_sentinel(),
            keepalive_markers: default_keepalive_markers(),
            timeout_secs: default_timeout_secs(),
            idle_timeout_secs: default_idle_timeout_secs(),
            stall_timeout_secs: default_stall_timeout_secs(),
            kill_grace_ms: default_kill_grace_ms(),
            ready_pattern: None,
            ready_timeout_ms: default_ready_timeout_ms(),
            startup_delay_ms: default_startup_delay_ms(),
            write_chunk_size: default_write_chunk_size(),
            write_chunk_delay_ms: default_write_chunk_delay_ms(),
        }
    }
}

fn secs(value: u64) -> Option<Duration> {
    (value > 0).then(|| Duration::from_secs(value))
}

impl SessionSettings {
    /// Settings with every timer disabled; the session ends only on exit
    pub fn without_timeouts() -> Self {
        Self {
            timeout_secs: 0,
            idle_timeout_secs: 0,
            stall_timeout_secs: 0,
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        secs(self.timeout_secs)
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        secs(self.idle_timeout_secs)
    }

    pub fn stall_timeout(&self) -> Option<Duration> {
        secs(self.stall_timeout_secs)
    }

    pub fn kill_grace(&self) -> Duration {
        Duration::from_millis(self.kill_grace_ms)
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }

    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }

    pub fn write_chunk_delay(&self) -> Duration {
        Duration::from_millis(self.write_chunk_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = SessionSettings::default();
        assert_eq!((settings.cols, settings.rows), (80, 30));
        assert_eq!(settings.term, "xterm-color");
        assert_eq!(settings.sentinel, "Complete!");
        assert_eq!(settings.timeout(), Some(Duration::from_secs(900)));
        assert_eq!(settings.idle_timeout(), Some(Duration::from_secs(10)));
        assert_eq!(settings.stall_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_zero_disables_timeouts() {
        let settings = SessionSettings::without_timeouts();
        assert_eq!(settings.timeout(), None);
        assert_eq!(settings.idle_timeout(), None);
        assert_eq!(settings.stall_timeout(), None);
    }
}
