//! Configuration loading and management

mod command;
mod env;
mod io;
mod session;
mod shell;

pub use command::{CommandTemplate, Quoting};
pub use env::EnvPolicy;
pub use session::SessionSettings;
pub use shell::{ShellSpec, ShellTable};

use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Terminal, completion and timing settings
    #[serde(default)]
    pub session: SessionSettings,

    /// The command typed into the shell
    #[serde(default)]
    pub command: CommandTemplate,

    /// Environment handed to the shell
    #[serde(default)]
    pub env: EnvPolicy,

    /// Shell per platform
    #[serde(default = "ShellTable::with_defaults")]
    pub shell: ShellTable,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            session: SessionSettings::default(),
            command: CommandTemplate::default(),
            env: EnvPolicy::default(),
            shell: ShellTable::with_defaults(),
        }
    }
}

impl Config {
    /// Parse configuration from TOML text
    ///
    /// Platforms missing from `[shell]` fall back to the built-in shells.
    pub fn parse(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content)?;
        config.shell.fill_defaults();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load configuration for a working directory
    /// Looks for: <dir>/.ptyrun/config.toml, then ~/.ptyrun/config.toml
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let project_path = dir.join(".ptyrun/config.toml");
        if project_path.exists() {
            return Self::from_file(&project_path);
        }

        let global_path = Self::global_config_path();
        if global_path.exists() {
            return Self::from_file(&global_path);
        }

        Ok(Self::default())
    }

    /// Load from an explicit path if given, otherwise search from `dir`
    pub fn load(path: Option<&Path>, dir: &Path) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::from_dir(dir),
        }
    }

    /// Reject settings that would make every session fail
    pub fn validate(&self) -> Result<()> {
        if self.session.cols == 0 || self.session.rows == 0 {
            bail!("session.cols and session.rows must be greater than zero");
        }
        if self.session.write_chunk_size == 0 {
            bail!("session.write_chunk_size must be greater than zero");
        }
        if self.command.program.trim().is_empty() {
            bail!("command.program must not be empty");
        }
        if let Some(pattern) = &self.session.ready_pattern {
            regex::Regex::new(pattern)
                .with_context(|| format!("Invalid session.ready_pattern: {}", pattern))?;
        }
        Ok(())
    }
}
