//! Command preview implementation

use anyhow::Result;
use std::path::Path;

use ptyrun::config::{Config, Quoting};
use ptyrun::session::SessionRunner;

/// Print the line `run` would type into the shell
pub fn command_command(
    work_dir: &Path,
    config_path: Option<&Path>,
    instructions: &str,
    verbatim: bool,
    platform: Option<String>,
) -> Result<()> {
    let mut config = Config::load(config_path, work_dir)?;
    if verbatim {
        config.command.quoting = Some(Quoting::Verbatim);
    }

    let mut runner = SessionRunner::new(config)?;
    if let Some(platform) = platform {
        runner = runner.for_platform(platform);
    }

    println!("{}", runner.command_line(instructions)?);
    Ok(())
}
