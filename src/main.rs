use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "ptyrun")]
#[command(about = "Run a coding tool inside a pseudo-terminal shell and collect its output")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to .ptyrun/config.toml, then ~/.ptyrun/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run instructions through the tool in a new shell session
    Run(cli::run::RunArgs),

    /// Print the command line that would be typed into the shell
    Command {
        /// Instructions for the tool
        instructions: String,

        /// Embed the instructions in double quotes without escaping
        #[arg(long)]
        verbatim: bool,

        /// Platform whose shell entry to use (defaults to this host)
        #[arg(long)]
        platform: Option<String>,
    },

    /// Write a default configuration file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,

        /// Write ~/.ptyrun/config.toml instead of ./.ptyrun/config.toml
        #[arg(long)]
        global: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so session output on stdout stays clean
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let work_dir = std::env::current_dir()?;

    match cli.command {
        Commands::Run(args) => {
            let code = cli::run::run_command(&work_dir, cli.config.as_deref(), args).await?;
            if code != 0 {
                std::process::exit(code);
            }
        }
        Commands::Command {
            instructions,
            verbatim,
            platform,
        } => {
            cli::command::command_command(
                &work_dir,
                cli.config.as_deref(),
                &instructions,
                verbatim,
                platform,
            )?;
        }
        Commands::Init { force, global } => {
            cli::init::init_command(&work_dir, force, global)?;
        }
    }

    Ok(())
}
