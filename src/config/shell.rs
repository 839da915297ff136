//! Shell selection per platform

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Quoting;
use crate::error::SessionError;

/// Executable and arguments used to start the interactive shell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellSpec {
    /// Shell binary (looked up on PATH if not absolute)
    pub program: String,

    /// Arguments passed to the shell
    #[serde(default)]
    pub args: Vec<String>,

    /// Quoting rules the shell understands
    #[serde(default)]
    pub quoting: Quoting,
}

impl ShellSpec {
    pub fn new(program: impl Into<String>, args: &[&str], quoting: Quoting) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
            quoting,
        }
    }
}

/// Shells keyed by platform identifier (`std::env::consts::OS` values)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShellTable(BTreeMap<String, ShellSpec>);

const POSIX_PLATFORMS: &[&str] = &["linux", "macos", "freebsd", "openbsd", "netbsd"];

impl ShellTable {
    /// Built-in table: bash on Unix-likes, PowerShell on Windows
    pub fn with_defaults() -> Self {
        let mut table = BTreeMap::new();
        for os in POSIX_PLATFORMS {
            table.insert(os.to_string(), ShellSpec::new("bash", &[], Quoting::Posix));
        }
        table.insert(
            "windows".to_string(),
            ShellSpec::new("powershell.exe", &["-NoLogo"], Quoting::PowerShell),
        );
        Self(table)
    }

    /// Add built-in entries for platforms the table does not mention
    pub fn fill_defaults(&mut self) {
        for (os, spec) in Self::with_defaults().0 {
            self.0.entry(os).or_insert(spec);
        }
    }

    pub fn insert(&mut self, os: impl Into<String>, spec: ShellSpec) {
        self.0.insert(os.into(), spec);
    }

    /// Shell for the given platform, or an error if none is configured
    pub fn resolve(&self, os: &str) -> Result<&ShellSpec, SessionError> {
        self.0
            .get(os)
            .ok_or_else(|| SessionError::UnsupportedPlatform(os.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_linux_and_windows() {
        let table = ShellTable::with_defaults();
        let linux = table.resolve("linux").unwrap();
        assert_eq!(linux.program, "bash");
        assert_eq!(linux.quoting, Quoting::Posix);

        let windows = table.resolve("windows").unwrap();
        assert_eq!(windows.program, "powershell.exe");
        assert_eq!(windows.quoting, Quoting::PowerShell);
    }

    #[test]
    fn test_unknown_platform_is_an_error() {
        let table = ShellTable::with_defaults();
        assert!(matches!(
            table.resolve("plan9"),
            Err(SessionError::UnsupportedPlatform(os)) if os == "plan9"
        ));
    }

    #[test]
    fn test_fill_defaults_keeps_overrides() {
        let mut table = ShellTable::default();
        table.insert("linux", ShellSpec::new("/bin/zsh", &["-i"], Quoting::Posix));
        table.fill_defaults();

        assert_eq!(table.resolve("linux").unwrap().program, "/bin/zsh");
        assert_eq!(table.resolve("macos").unwrap().program, "bash");
    }

    #[test]
    fn test_host_platform_resolves_with_defaults() {
        assert!(ShellTable::with_defaults().resolve(std::env::consts::OS).is_ok());
    }
}
