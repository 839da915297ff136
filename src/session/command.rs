//! Synthesis of the line typed into the shell

use crate::config::{CommandTemplate, Quoting};
use crate::error::SessionError;

/// Characters PowerShell accepts as single quotes besides `'`
const POWERSHELL_QUOTES: &[char] = &['\'', '\u{2018}', '\u{2019}', '\u{201A}', '\u{201B}'];

/// The command line written to the shell, without the terminating `\r`
///
/// `program` and `context` come from configuration and are written as-is;
/// only the instructions are quoted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    line: String,
}

impl CommandLine {
    pub fn build(
        template: &CommandTemplate,
        instructions: &str,
        quoting: Quoting,
    ) -> Result<Self, SessionError> {
        let quoted = match quoting {
            Quoting::Verbatim => format!("\"{}\"", instructions),
            Quoting::Posix => posix_quote(&normalize(instructions)?),
            Quoting::PowerShell => powershell_quote(&normalize(instructions)?),
        };

        let mut line = format!("{} {} {}", template.program, template.context, quoted);
        if template.exit_after {
            line.push_str("; exit");
        }

        Ok(Self { line })
    }

    pub fn as_str(&self) -> &str {
        &self.line
    }

    /// Bytes to write, including the carriage return that submits the line
    pub fn to_input(&self) -> Vec<u8> {
        let mut input = Vec::with_capacity(self.line.len() + 1);
        input.extend_from_slice(self.line.as_bytes());
        input.push(b'\r');
        input
    }
}

impl std::fmt::Display for CommandLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.line)
    }
}

/// A raw `\r` would submit the line early, so carriage returns become `\n`
fn normalize(instructions: &str) -> Result<String, SessionError> {
    if instructions.contains('\0') {
        return Err(SessionError::InvalidInstructions(
            "instructions contain a NUL byte".to_string(),
        ));
    }
    Ok(instructions.replace("\r\n", "\n").replace('\r', "\n"))
}

fn posix_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

fn powershell_quote(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('\'');
    for c in s.chars() {
        if POWERSHELL_QUOTES.contains(&c) {
            quoted.push(c);
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}
