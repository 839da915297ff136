//! Init command implementation

use anyhow::{Result, bail};
use std::path::Path;
use tracing::info;

use ptyrun::config::Config;

/// Default configuration content for ptyrun init
pub const DEFAULT_CONFIG: &str = r#"# ptyrun configuration
# =====================
#
# Durations set to 0 are disabled.

# ============================================================================
# SESSION - Terminal, completion detection and timers
# ============================================================================

[session]
cols = 80
rows = 30
term = "xterm-color"

# The run ends (after the shell exits) once this appears in the output
sentinel = "Complete!"

# While none of these has appeared, idle_timeout_secs applies
keepalive_markers = ["Wait...", "file:"]

timeout_secs = 900
idle_timeout_secs = 10
stall_timeout_secs = 30

# Wait this long for the shell to exit after terminating it
kill_grace_ms = 5000

# Write the command once this regex matches the output...
# ready_pattern = '\$ $'
ready_timeout_ms = 5000
# ...or, without a pattern, after this delay
startup_delay_ms = 100

write_chunk_size = 1024
write_chunk_delay_ms = 100

# ============================================================================
# COMMAND - The line typed into the shell: <program> <context> <instructions>
# ============================================================================
#
#   quoting - "posix", "powershell" or "verbatim" (defaults to the shell's)
#             verbatim wraps the instructions in double quotes unescaped

[command]
program = "manicode"
context = "."
exit_after = false

# ============================================================================
# ENV - Environment of the shell
# ============================================================================

[env]
inherit = true
remove = []

[env.set]

# ============================================================================
# SHELL - Shell per platform (keys are Rust's std::env::consts::OS values)
# ============================================================================

[shell.linux]
program = "bash"
args = []
quoting = "posix"

[shell.macos]
program = "bash"
args = []
quoting = "posix"

[shell.windows]
program = "powershell.exe"
args = ["-NoLogo"]
quoting = "powershell"
"#;

/// Write the default config to the project or global location
pub fn init_command(work_dir: &Path, force: bool, global: bool) -> Result<()> {
    let path = if global {
        Config::global_config_path()
    } else {
        work_dir.join(".ptyrun/config.toml")
    };

    if path.exists() && !force {
        bail!(
            "Config file already exists: {}\nUse --force to overwrite",
            path.display()
        );
    }

    Config::save_text_to_file(&path, DEFAULT_CONFIG)?;
    info!("Wrote {}", path.display());
    println!("Created {}", path.display());
    Ok(())
}
