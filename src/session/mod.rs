//! Pseudo-terminal session execution.
//!
//! One [`SessionRunner::run`] call owns one shell process for the lifetime of
//! one [`TaskRequest`](crate::TaskRequest):
//!
//! - **[`CommandLine`]** - the single line typed into the shell, quoted per
//!   the shell's rules.
//! - **[`OutputBuffer`] / [`Marker`]** - append-only output and the
//!   completion / keep-alive literals watched in it.
//! - **[`PtyLauncher`]** - the seam to the OS; [`NativePtyLauncher`] uses
//!   `portable-pty`.
//! - **[`SessionRunner`]** - the lifecycle: launch, write, watch, terminate
//!   and settle on the exit notification.
//!
//! # Example
//!
//! ```rust,ignore
//! use ptyrun::{config::Config, session::SessionRunner, TaskRequest};
//!
//! let runner = SessionRunner::new(Config::default())?;
//! let outcome = runner
//!     .run(&TaskRequest::new("double the font size", "../template"), None)
//!     .await?;
//! println!("{}", outcome.output);
//! ```

mod command;
mod output;
mod pty;
mod runner;

pub use command::CommandLine;
pub use output::{Marker, OutputBuffer, TextDecoder};
pub use pty::{LaunchSpec, Launched, NativePtyLauncher, PtyEvent, PtyLauncher, PtyProcess};
pub use runner::SessionRunner;
