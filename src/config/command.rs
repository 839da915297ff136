//! Command template configuration

use serde::{Deserialize, Serialize};

/// How instructions are quoted when embedded in the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quoting {
    /// Wrap in double quotes with no escaping at all.
    ///
    /// Quotes and shell metacharacters in the instructions are interpreted by
    /// the shell. Only use with trusted input.
    Verbatim,
    /// POSIX single-quote literal (`'` becomes `'\''`)
    #[default]
    Posix,
    /// PowerShell single-quote literal (`'` becomes `''`)
    PowerShell,
}

impl std::fmt::Display for Quoting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Quoting::Verbatim => write!(f, "verbatim"),
            Quoting::Posix => write!(f, "posix"),
            Quoting::PowerShell => write!(f, "powershell"),
        }
    }
}

/// The line typed into the shell: `<program> <context> <instructions>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandTemplate {
    /// Tool invoked inside the shell
    #[serde(default = "default_program")]
    pub program: String,

    /// Working-context argument passed before the instructions
    #[serde(default = "default_context")]
    pub context: String,

    /// Append `; exit` so the shell closes when the tool returns
    #[serde(default)]
    pub exit_after: bool,

    /// Overrides the quoting of the platform's shell entry
    #[serde(default)]
    pub quoting: Option<Quoting>,
}

fn default_program() -> String {
    "manicode".to_string()
}

fn default_context() -> String {
    ".".to_string()
}

impl Default for CommandTemplate {
    fn default() -> Self {
        Self {
            program: default_program(),
            context: default_context(),
            exit_after: false,
            quoting: None,
        }
    }
}
