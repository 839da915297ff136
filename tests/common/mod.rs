//! Shared test utilities: a scripted PTY launcher

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::sync::mpsc;

use ptyrun::SessionError;
use ptyrun::config::{Config, EnvPolicy, SessionSettings};
use ptyrun::session::{LaunchSpec, Launched, PtyEvent, PtyLauncher, PtyProcess};

/// What the runner did to the scripted process
#[derive(Debug, Default)]
pub struct MockLog {
    pub spec: Option<LaunchSpec>,
    pub writes: Vec<Vec<u8>>,
    pub terminations: usize,
    pub kills: usize,
}

impl MockLog {
    /// All written bytes, concatenated
    pub fn written(&self) -> Vec<u8> {
        self.writes.concat()
    }
}

/// Launcher whose process emits whatever the test pushes
pub struct MockLauncher {
    tx: mpsc::UnboundedSender<PtyEvent>,
    rx: Mutex<Option<mpsc::UnboundedReceiver<PtyEvent>>>,
    log: Arc<Mutex<MockLog>>,
    exit_on_terminate: Option<Option<u32>>,
    exit_on_kill: Option<Option<u32>>,
    fail_spawn: bool,
}

impl MockLauncher {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Mutex::new(Some(rx)),
            log: Arc::new(Mutex::new(MockLog::default())),
            exit_on_terminate: None,
            exit_on_kill: None,
            fail_spawn: false,
        }
    }

    /// The process exits with `code` as soon as termination is requested
    pub fn exiting_on_terminate(mut self, code: Option<u32>) -> Self {
        self.exit_on_terminate = Some(code);
        self
    }

    /// The process ignores termination but dies on the escalated kill
    pub fn exiting_on_kill(mut self, code: Option<u32>) -> Self {
        self.exit_on_kill = Some(code);
        self
    }

    pub fn failing() -> Self {
        Self {
            fail_spawn: true,
            ..Self::new()
        }
    }

    pub fn emit(&self, chunk: impl AsRef<[u8]>) {
        let _ = self.tx.send(PtyEvent::Data(chunk.as_ref().to_vec()));
    }

    pub fn exit(&self, code: Option<u32>) {
        let _ = self.tx.send(PtyEvent::Exit(code));
    }

    pub fn log(&self) -> std::sync::MutexGuard<'_, MockLog> {
        self.log.lock().unwrap()
    }
}

impl PtyLauncher for MockLauncher {
    fn launch(&self, spec: &LaunchSpec) -> Result<Launched, SessionError> {
        self.log.lock().unwrap().spec = Some(spec.clone());

        if self.fail_spawn {
            return Err(SessionError::Spawn {
                program: spec.program.clone(),
                reason: "No such file or directory".to_string(),
            });
        }

        let events = self
            .rx
            .lock()
            .unwrap()
            .take()
            .expect("mock launcher used twice");

        Ok(Launched {
            process: Box::new(MockProcess {
                tx: self.tx.clone(),
                log: self.log.clone(),
                exit_on_terminate: self.exit_on_terminate,
                exit_on_kill: self.exit_on_kill,
            }),
            events,
        })
    }
}

struct MockProcess {
    tx: mpsc::UnboundedSender<PtyEvent>,
    log: Arc<Mutex<MockLog>>,
    exit_on_terminate: Option<Option<u32>>,
    exit_on_kill: Option<Option<u32>>,
}

impl PtyProcess for MockProcess {
    fn write(&mut self, data: &[u8]) -> std::io::Result<()> {
        self.log.lock().unwrap().writes.push(data.to_vec());
        Ok(())
    }

    fn terminate(&mut self) -> std::io::Result<()> {
        self.log.lock().unwrap().terminations += 1;
        if let Some(code) = self.exit_on_terminate {
            let _ = self.tx.send(PtyEvent::Exit(code));
        }
        Ok(())
    }

    fn force_kill(&mut self) -> std::io::Result<()> {
        self.log.lock().unwrap().kills += 1;
        if let Some(code) = self.exit_on_kill {
            let _ = self.tx.send(PtyEvent::Exit(code));
        }
        Ok(())
    }

    fn process_id(&self) -> Option<u32> {
        Some(4242)
    }
}

/// Config with no timers, no write delays and an empty environment
pub fn test_config() -> Config {
    Config {
        session: SessionSettings {
            startup_delay_ms: 0,
            write_chunk_delay_ms: 0,
            ..SessionSettings::without_timeouts()
        },
        env: EnvPolicy::isolated(),
        ..Config::default()
    }
}

/// Creates a temporary project directory
pub fn project_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}
