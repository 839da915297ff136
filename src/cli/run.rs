//! Run command implementation

use anyhow::{Context, Result};
use clap::Args;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

use ptyrun::config::{Config, Quoting};
use ptyrun::session::SessionRunner;
use ptyrun::{LogEvent, LogEventKind, TaskRequest};

/// Arguments for `ptyrun run`
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Instructions for the tool
    pub instructions: String,

    /// Directory to run in (defaults to the current directory)
    #[arg(long)]
    pub cwd: Option<PathBuf>,

    /// Give the tool access to a notes directory
    #[arg(long)]
    pub notes_dir: Option<PathBuf>,

    /// Overall deadline in seconds (0 disables it)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Embed the instructions in double quotes without escaping
    #[arg(long)]
    pub verbatim: bool,

    /// Print log events as JSON lines instead of raw output
    #[arg(long)]
    pub json: bool,

    /// Do not stream output; print only the summary
    #[arg(short, long)]
    pub quiet: bool,
}

/// Apply command-line overrides on top of the loaded config
fn apply_overrides(config: &mut Config, args: &RunArgs) {
    if let Some(timeout) = args.timeout {
        config.session.timeout_secs = timeout;
    }
    if args.verbatim {
        config.command.quoting = Some(Quoting::Verbatim);
    }
}

/// Run one session and return the process exit code for the CLI
pub async fn run_command(work_dir: &Path, config_path: Option<&Path>, args: RunArgs) -> Result<i32> {
    let cwd = match &args.cwd {
        Some(dir) if dir.is_absolute() => dir.clone(),
        Some(dir) => work_dir.join(dir),
        None => work_dir.to_path_buf(),
    };

    let mut config = Config::load(config_path, &cwd)?;
    apply_overrides(&mut config, &args);

    let runner = SessionRunner::new(config)?;

    let mut request = TaskRequest::new(args.instructions.clone(), cwd);
    if let Some(notes_dir) = &args.notes_dir {
        request = request.with_notes_dir(notes_dir);
    }

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(print_events(event_rx, args.json, args.quiet));

    let result = runner.run(&request, Some(event_tx)).await;
    // The runner has dropped its sender, so the printer drains and stops
    printer.await.context("Event printer panicked")?;

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            if let Some(output) = e.partial_output() {
                tracing::debug!(bytes = output.len(), "Partial output before failure");
            }
            return Err(e).context("Session failed");
        }
    };

    eprintln!(
        "\n[ptyrun] session {} after {:.1}s (exit code {})",
        outcome.termination,
        outcome.duration.as_secs_f64(),
        outcome
            .exit_code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    );

    Ok(if outcome.succeeded() { 0 } else { 1 })
}

async fn print_events(mut rx: mpsc::UnboundedReceiver<LogEvent>, json: bool, quiet: bool) {
    while let Some(event) = rx.recv().await {
        if json {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{}", line),
                Err(e) => tracing::warn!("Failed to serialize log event: {}", e),
            }
            continue;
        }

        match event.kind {
            LogEventKind::Output if !quiet => {
                let mut stdout = std::io::stdout().lock();
                let _ = stdout.write_all(event.summary.as_bytes());
                let _ = stdout.flush();
            }
            LogEventKind::Error => eprintln!("[ptyrun] {}", event.summary),
            _ => tracing::debug!("{}", event.summary),
        }
    }
}
