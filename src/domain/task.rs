use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::SessionError;

/// Environment variable enabling notes access for the invoked tool
pub const NOTES_FLAG_VAR: &str = "MANICODE_ALLOW_NOTES";
/// Environment variable carrying the notes directory
pub const NOTES_DIR_VAR: &str = "MANICODE_NOTES_DIR";

/// A single task handed to the shell session
///
/// Immutable once built; one request drives exactly one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRequest {
    /// Free-form instructions for the invoked tool
    pub instructions: String,

    /// Directory the shell starts in
    pub working_directory: PathBuf,

    /// Grants the tool access to a notes directory when set
    #[serde(default)]
    pub notes_dir: Option<PathBuf>,
}

impl TaskRequest {
    pub fn new(instructions: impl Into<String>, working_directory: impl Into<PathBuf>) -> Self {
        Self {
            instructions: instructions.into(),
            working_directory: working_directory.into(),
            notes_dir: None,
        }
    }

    /// Grant the invoked tool access to `dir` for notes
    pub fn with_notes_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.notes_dir = Some(dir.into());
        self
    }

    /// Check that the working directory exists and is a directory
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.working_directory.is_dir() {
            Ok(())
        } else {
            Err(SessionError::InvalidWorkingDirectory(
                self.working_directory.clone(),
            ))
        }
    }

    /// Variables this request adds on top of the configured environment
    pub fn extra_env(&self) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        if let Some(dir) = &self.notes_dir {
            env.insert(NOTES_FLAG_VAR.to_string(), "1".to_string());
            env.insert(NOTES_DIR_VAR.to_string(), path_string(dir));
        }
        env
    }
}

fn path_string(path: &Path) -> String {
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_existing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let request = TaskRequest::new("noop", dir.path());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_directory() {
        let request = TaskRequest::new("noop", "/definitely/not/here/ptyrun");
        assert!(matches!(
            request.validate(),
            Err(SessionError::InvalidWorkingDirectory(_))
        ));
    }

    #[test]
    fn test_validate_rejects_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let request = TaskRequest::new("noop", file.path());
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_notes_dir_adds_env() {
        let request = TaskRequest::new("x", "/tmp").with_notes_dir("/tmp/notes");
        let env = request.extra_env();
        assert_eq!(env.get(NOTES_FLAG_VAR).map(String::as_str), Some("1"));
        assert_eq!(env.get(NOTES_DIR_VAR).map(String::as_str), Some("/tmp/notes"));
    }

    #[test]
    fn test_no_notes_dir_adds_nothing() {
        assert!(TaskRequest::new("x", "/tmp").extra_env().is_empty());
    }
}
