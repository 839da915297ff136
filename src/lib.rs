//! ptyrun - drive a coding tool through an interactive shell
//!
//! ptyrun launches a shell inside a pseudo-terminal, types a single command
//! built from a task description, streams back everything the terminal
//! prints, and finishes when the tool reports completion or the shell exits.
//!
//! ## Lifecycle
//!
//! 1. The shell for the host platform is picked from the configured table.
//! 2. The command line `<tool> <context> <instructions>` is written once the
//!    shell is ready.
//! 3. Output accumulates; when the completion signal appears (or a deadline
//!    or idle timer fires) the shell is terminated.
//! 4. The run settles with the full output once the shell has exited.

pub mod config;
pub mod domain;
pub mod error;
pub mod session;

pub use domain::*;
pub use error::SessionError;
