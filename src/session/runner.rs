//! Session lifecycle: launch, write, watch, terminate, settle
//!
//! A run settles only on the process's exit notification. The completion
//! signal and the timers merely request termination; the runner then keeps
//! waiting for the exit, escalating once if it does not arrive.

use regex::bytes::Regex;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::command::CommandLine;
use super::output::{Marker, OutputBuffer, TextDecoder};
use super::pty::{LaunchSpec, Launched, NativePtyLauncher, PtyEvent, PtyLauncher, PtyProcess};
use crate::config::Config;
use crate::error::SessionError;
use crate::{LogEvent, SessionOutcome, SessionState, TaskRequest, Termination};

/// Runs one task per call in its own pseudo-terminal shell
///
/// Cheap to clone; concurrent runs share only configuration and the launcher.
#[derive(Clone)]
pub struct SessionRunner {
    config: Arc<Config>,
    launcher: Arc<dyn PtyLauncher>,
    ready_pattern: Option<Regex>,
    platform: String,
}

impl SessionRunner {
    /// Runner using the native PTY implementation
    pub fn new(config: Config) -> Result<Self, SessionError> {
        Self::with_launcher(config, Arc::new(NativePtyLauncher))
    }

    pub fn with_launcher(
        config: Config,
        launcher: Arc<dyn PtyLauncher>,
    ) -> Result<Self, SessionError> {
        config
            .validate()
            .map_err(|e| SessionError::InvalidConfig(format!("{:#}", e)))?;

        let ready_pattern = config
            .session
            .ready_pattern
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(|e| SessionError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            config: Arc::new(config),
            launcher,
            ready_pattern,
            platform: std::env::consts::OS.to_string(),
        })
    }

    /// Select the shell table entry for `platform` instead of the host's
    pub fn for_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The line that would be written for `instructions` on this platform
    pub fn command_line(&self, instructions: &str) -> Result<CommandLine, SessionError> {
        let shell = self.config.shell.resolve(&self.platform)?;
        let quoting = self.config.command.quoting.unwrap_or(shell.quoting);
        CommandLine::build(&self.config.command, instructions, quoting)
    }

    /// Run `instructions` in `working_directory` and return the raw output
    pub async fn run_text(
        &self,
        instructions: &str,
        working_directory: &Path,
    ) -> Result<String, SessionError> {
        let request = TaskRequest::new(instructions, working_directory);
        Ok(self.run(&request, None).await?.output)
    }

    /// Run one task to completion
    ///
    /// Returns once the shell has exited. Output chunks and lifecycle messages
    /// are forwarded to `events` as they happen; the channel is unbounded so
    /// a caller may also drain it after `run` returns.
    pub async fn run(
        &self,
        request: &TaskRequest,
        events: Option<mpsc::UnboundedSender<LogEvent>>,
    ) -> Result<SessionOutcome, SessionError> {
        request.validate()?;

        let settings = &self.config.session;
        let shell = self.config.shell.resolve(&self.platform)?;
        let command = self.command_line(&request.instructions)?;

        let spec = LaunchSpec {
            program: shell.program.clone(),
            args: shell.args.clone(),
            cwd: request.working_directory.clone(),
            env: self.config.env.build(&settings.term, &request.extra_env()),
            cols: settings.cols,
            rows: settings.rows,
        };

        let session_id = Uuid::new_v4().to_string();
        let started = Instant::now();

        let Launched { process, events: pty_events } = self.launcher.launch(&spec)?;
        let pid = process.process_id();

        info!(
            session_id = %session_id,
            pid = ?pid,
            shell = %spec.program,
            cwd = %spec.cwd.display(),
            "Session started"
        );

        let mut session = Session {
            runner: self,
            id: session_id,
            events,
            process,
            pid,
            state: SessionState::Launching,
            buffer: OutputBuffer::new(),
            decoder: TextDecoder::new(),
            sentinel: Marker::new(&settings.sentinel),
            keepalive: settings
                .keepalive_markers
                .iter()
                .map(|m| Marker::new(m))
                .collect(),
            termination: None,
            started,
            last_output: started,
            kill_deadline: None,
            escalated: false,
            pending_input: Some(command.to_input()),
        };

        session.advance(SessionState::Running);
        session.emit(LogEvent::system(format!(
            "Started {} (pid {})",
            spec.program,
            pid.map(|p| p.to_string()).unwrap_or_else(|| "?".to_string())
        )));

        let exit_code = session.drive(pty_events).await?;
        let tail = session.decoder.finish();
        if !tail.is_empty() {
            session.emit(LogEvent::output(tail));
        }
        session.advance(SessionState::Exited);

        let termination = session.termination.unwrap_or(Termination::Exited);
        let duration = session.started.elapsed();

        info!(
            session_id = %session.id,
            pid = ?pid,
            exit_code = ?exit_code,
            termination = %termination,
            forced = termination.was_forced(),
            bytes = session.buffer.len(),
            chunks = session.buffer.chunk_count(),
            "Session finished"
        );
        session.emit(LogEvent::system(format!(
            "Session {} (exit code {})",
            termination,
            exit_code.map(|c| c.to_string()).unwrap_or_else(|| "unknown".to_string())
        )));

        Ok(SessionOutcome {
            output: session.buffer.into_text(),
            termination,
            exit_code,
            command_line: command.to_string(),
            duration,
        })
    }
}

/// State owned by one in-flight run
struct Session<'a> {
    runner: &'a SessionRunner,
    id: String,
    events: Option<mpsc::UnboundedSender<LogEvent>>,
    process: Box<dyn PtyProcess>,
    pid: Option<u32>,
    state: SessionState,
    buffer: OutputBuffer,
    decoder: TextDecoder,
    sentinel: Marker,
    keepalive: Vec<Marker>,
    termination: Option<Termination>,
    started: Instant,
    last_output: Instant,
    kill_deadline: Option<Instant>,
    escalated: bool,
    /// Command input not yet written (cleared once written or abandoned)
    pending_input: Option<Vec<u8>>,
}

/// What woke the event loop
enum Wake {
    Event(Option<PtyEvent>),
    Ready,
    Deadline,
    Idle,
    KillGrace,
}

impl Session<'_> {
    /// Consume terminal events until the exit notification
    async fn drive(
        &mut self,
        mut pty_events: mpsc::UnboundedReceiver<PtyEvent>,
    ) -> Result<Option<u32>, SessionError> {
        let runner = self.runner;
        let settings = &runner.config.session;
        let deadline = settings.timeout().map(|t| self.started + t);
        let ready_at = self.started
            + if runner.ready_pattern.is_some() {
                settings.ready_timeout()
            } else {
                settings.startup_delay()
            };

        loop {
            let write_at = self.pending_input.as_ref().map(|_| ready_at);
            let running = self.state == SessionState::Running;
            let deadline_at = deadline.filter(|_| running);
            let idle_at = if running { self.idle_at() } else { None };

            // The command goes out as soon as the shell is ready; after that,
            // queued output is always handled before any timer fires
            let wake = tokio::select! {
                biased;
                _ = sleep_until(write_at) => Wake::Ready,
                event = pty_events.recv() => Wake::Event(event),
                _ = sleep_until(self.kill_deadline) => Wake::KillGrace,
                _ = sleep_until(deadline_at) => Wake::Deadline,
                _ = sleep_until(idle_at) => Wake::Idle,
            };

            match wake {
                Wake::Event(Some(PtyEvent::Data(chunk))) => self.on_output(chunk).await,
                Wake::Event(Some(PtyEvent::Exit(code))) => return Ok(code),
                Wake::Event(None) => {
                    debug!(session_id = %self.id, "PTY event stream closed without exit status");
                    return Ok(None);
                }
                Wake::Ready => {
                    if runner.ready_pattern.is_some() {
                        warn!(session_id = %self.id, "Shell prompt not detected, writing command anyway");
                    }
                    self.write_command().await;
                }
                Wake::Deadline => {
                    warn!(session_id = %self.id, "Session deadline reached");
                    self.request_termination(Termination::TimedOut);
                }
                Wake::Idle => {
                    warn!(session_id = %self.id, "No output from session, terminating");
                    self.request_termination(Termination::Idle);
                }
                Wake::KillGrace => {
                    if self.escalated {
                        warn!(session_id = %self.id, pid = ?self.pid, "Process did not exit after kill");
                        self.emit(LogEvent::error("Process did not exit after forced termination"));
                        return Err(SessionError::ExitNotObserved {
                            pid: self.pid,
                            output: self.buffer.to_text(),
                        });
                    }
                    self.escalate();
                }
            }
        }
    }

    async fn on_output(&mut self, chunk: Vec<u8>) {
        let offset = self.buffer.push(&chunk);
        self.last_output = Instant::now();
        let text = self.decoder.push(&chunk);
        if !text.is_empty() {
            self.emit(LogEvent::output(text));
        }

        for marker in &mut self.keepalive {
            marker.observe(&self.buffer, offset);
        }

        if self.sentinel.observe(&self.buffer, offset) && self.state == SessionState::Running {
            info!(session_id = %self.id, "Completion signal detected");
            self.request_termination(Termination::Sentinel);
        }

        if self.pending_input.is_some() && self.state == SessionState::Running {
            let ready = self
                .runner
                .ready_pattern
                .as_ref()
                .is_some_and(|re| re.is_match(self.buffer.as_bytes()));
            if ready {
                debug!(session_id = %self.id, "Shell prompt detected");
                self.write_command().await;
            }
        }
    }

    /// Earliest instant at which an idle timer would fire
    fn idle_at(&self) -> Option<Instant> {
        let settings = &self.runner.config.session;
        let marker_seen = self.keepalive.iter().any(Marker::seen);
        let idle = settings
            .idle_timeout()
            .filter(|_| !marker_seen)
            .map(|t| self.last_output + t);
        let stall = settings.stall_timeout().map(|t| self.last_output + t);

        match (idle, stall) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    async fn write_command(&mut self) {
        let Some(input) = self.pending_input.take() else {
            return;
        };
        if self.state != SessionState::Running {
            debug!(session_id = %self.id, "Session ending, command not written");
            return;
        }

        let runner = self.runner;
        let settings = &runner.config.session;
        let delay = settings.write_chunk_delay();
        let mut pieces = input.chunks(settings.write_chunk_size).peekable();

        while let Some(piece) = pieces.next() {
            if let Err(e) = self.process.write(piece) {
                warn!(session_id = %self.id, error = %e, "Failed to write command to PTY");
                self.emit(LogEvent::error(format!("Failed to write command: {}", e)));
                return;
            }
            if pieces.peek().is_some() && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        debug!(session_id = %self.id, bytes = input.len(), "Command written");
        self.emit(LogEvent::system("Command written"));
    }

    /// Issue the first termination request; later triggers are ignored
    fn request_termination(&mut self, cause: Termination) {
        if self.termination.is_some() {
            return;
        }
        self.termination = Some(cause);
        self.advance(SessionState::Terminating);
        self.kill_deadline = Some(Instant::now() + self.runner.config.session.kill_grace());

        if let Err(e) = self.process.terminate() {
            warn!(session_id = %self.id, pid = ?self.pid, error = %e, "Termination request failed");
        }
        self.emit(LogEvent::system(format!("Terminating session ({})", cause)));
    }

    fn escalate(&mut self) {
        self.escalated = true;
        self.kill_deadline = Some(Instant::now() + self.runner.config.session.kill_grace());

        warn!(session_id = %self.id, pid = ?self.pid, "No exit after termination, killing");
        if let Err(e) = self.process.force_kill() {
            warn!(session_id = %self.id, pid = ?self.pid, error = %e, "Kill failed");
        }
        self.emit(LogEvent::system("Killing unresponsive process"));
    }

    fn advance(&mut self, next: SessionState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid session transition {} -> {}",
            self.state,
            next
        );
        debug!(session_id = %self.id, from = %self.state, to = %next, "Session state");
        self.state = next;
    }

    fn emit(&self, event: LogEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event.for_session(self.id.clone()));
        }
    }
}

async fn sleep_until(at: Option<Instant>) {
    match at {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
