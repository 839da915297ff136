//! Pseudo-terminal process abstraction
//!
//! [`PtyLauncher`] is the seam between the session lifecycle and the OS.
//! [`NativePtyLauncher`] spawns real shells through `portable-pty`; tests
//! substitute a scripted launcher.

use portable_pty::{Child, ChildKiller, CommandBuilder, MasterPty, PtySize, native_pty_system};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self as std_mpsc, RecvTimeoutError};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::SessionError;

/// How long output may keep draining after the shell has exited
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Something the terminal reported, in delivery order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PtyEvent {
    /// A chunk of raw output
    Data(Vec<u8>),
    /// The process exited; follows all output read before the terminal
    /// drained (or [`DRAIN_GRACE`] ran out)
    Exit(Option<u32>),
}

/// Everything needed to start the shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    /// Complete environment of the child; nothing else is inherited
    pub env: BTreeMap<OsString, OsString>,
    pub cols: u16,
    pub rows: u16,
}

/// Handle to a running terminal process
pub trait PtyProcess: Send {
    /// Write raw bytes to the terminal input
    fn write(&mut self, data: &[u8]) -> std::io::Result<()>;

    /// Ask the process to end (non-blocking)
    fn terminate(&mut self) -> std::io::Result<()>;

    /// Escalation used when `terminate` produced no exit
    fn force_kill(&mut self) -> std::io::Result<()> {
        self.terminate()
    }

    fn process_id(&self) -> Option<u32>;
}

/// A started process plus its ordered event stream
pub struct Launched {
    pub process: Box<dyn PtyProcess>,
    pub events: mpsc::UnboundedReceiver<PtyEvent>,
}

/// Starts shells attached to a pseudo-terminal
pub trait PtyLauncher: Send + Sync {
    fn launch(&self, spec: &LaunchSpec) -> Result<Launched, SessionError>;
}

/// Launcher backed by the platform's native PTY implementation
#[derive(Debug, Default, Clone, Copy)]
pub struct NativePtyLauncher;

impl PtyLauncher for NativePtyLauncher {
    fn launch(&self, spec: &LaunchSpec) -> Result<Launched, SessionError> {
        let spawn_err = |e: anyhow::Error| SessionError::Spawn {
            program: spec.program.clone(),
            reason: format!("{:#}", e),
        };

        let pty_system = native_pty_system();
        let pair = pty_system
            .openpty(PtySize {
                rows: spec.rows,
                cols: spec.cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(spawn_err)?;

        let mut cmd = CommandBuilder::new(&spec.program);
        cmd.args(&spec.args);
        cmd.cwd(&spec.cwd);
        cmd.env_clear();
        for (key, value) in &spec.env {
            cmd.env(key, value);
        }

        let child = pair.slave.spawn_command(cmd).map_err(spawn_err)?;

        // Only the child may hold the slave side, otherwise reads never hit EOF
        drop(pair.slave);

        let pid = child.process_id();
        let killer = child.clone_killer();
        let reader = pair.master.try_clone_reader().map_err(spawn_err)?;
        let writer = pair.master.take_writer().map_err(spawn_err)?;

        let (tx, rx) = mpsc::unbounded_channel();
        let exited = Arc::new(AtomicBool::new(false));
        let (drained_tx, drained_rx) = std_mpsc::channel();

        let reader_tx = tx.clone();
        std::thread::Builder::new()
            .name(format!("pty-reader-{}", pid.unwrap_or_default()))
            .spawn(move || read_output(reader, reader_tx, drained_tx))?;

        let exited_clone = exited.clone();
        std::thread::Builder::new()
            .name(format!("pty-waiter-{}", pid.unwrap_or_default()))
            .spawn(move || wait_for_exit(child, drained_rx, tx, exited_clone))?;

        Ok(Launched {
            process: Box::new(NativePtyProcess {
                _master: pair.master,
                writer,
                killer,
                pid,
                exited,
            }),
            events: rx,
        })
    }
}

/// Forward output until EOF or a read error
///
/// Dropping `drained` tells the waiter that no more output will follow.
fn read_output(
    mut reader: Box<dyn Read + Send>,
    tx: mpsc::UnboundedSender<PtyEvent>,
    drained: std_mpsc::Sender<()>,
) {
    let mut buf = [0u8; 4096];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                if tx.send(PtyEvent::Data(buf[..n].to_vec())).is_err() {
                    debug!("PTY output receiver dropped");
                    break;
                }
            }
            // Linux reports EIO once the slave side has closed
            Err(e) => {
                debug!(error = %e, "PTY read ended");
                break;
            }
        }
    }
    drop(drained);
}

/// Reap the child, then report its exit after the output has drained
///
/// A descendant that keeps the terminal open would hold the reader
/// forever, so draining is bounded by [`DRAIN_GRACE`]. Output arriving
/// after the exit notification is not delivered.
fn wait_for_exit(
    mut child: Box<dyn Child + Send + Sync>,
    drained: std_mpsc::Receiver<()>,
    tx: mpsc::UnboundedSender<PtyEvent>,
    exited: Arc<AtomicBool>,
) {
    let exit_code = match child.wait() {
        Ok(status) => Some(status.exit_code()),
        Err(e) => {
            warn!(error = %e, "Failed to wait for PTY child");
            None
        }
    };
    exited.store(true, Ordering::SeqCst);

    if let Err(RecvTimeoutError::Timeout) = drained.recv_timeout(DRAIN_GRACE) {
        debug!("PTY still open after exit, descendants hold the terminal");
    }
    let _ = tx.send(PtyEvent::Exit(exit_code));
}

struct NativePtyProcess {
    // Dropping the master closes the terminal, so it lives as long as the handle
    _master: Box<dyn MasterPty + Send>,
    writer: Box<dyn Write + Send>,
    killer: Box<dyn ChildKiller + Send + Sync>,
    pid: Option<u32>,
    exited: Arc<AtomicBool>,
}

impl PtyProcess for NativePtyProcess {
    fn write(&mut self, data: &[u8]) -> std::io::Result<()> {
        self.writer.write_all(data)?;
        self.writer.flush()
    }

    fn terminate(&mut self) -> std::io::Result<()> {
        self.killer.kill()
    }

    fn force_kill(&mut self) -> std::io::Result<()> {
        #[cfg(unix)]
        if let Some(pid) = self.pid {
            // SAFETY: plain signal delivery to a pid we spawned
            let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGKILL) };
            if rc == 0 {
                return Ok(());
            }
            return Err(std::io::Error::last_os_error());
        }

        self.killer.kill()
    }

    fn process_id(&self) -> Option<u32> {
        self.pid
    }
}

impl Drop for NativePtyProcess {
    fn drop(&mut self) {
        if !self.exited.load(Ordering::SeqCst) {
            if let Err(e) = self.killer.kill() {
                debug!(pid = ?self.pid, error = %e, "Kill on drop failed");
            }
        }
    }
}
