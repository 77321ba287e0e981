use anyhow::{Context, Result, anyhow, bail};
use std::io::Read;
use std::process::{Child, ChildStderr, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

pub const MIN_RATE: u32 = 50;
pub const MAX_RATE: u32 = 300;
pub const DEFAULT_RATE: u32 = 150;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechConfig {
    /// Words per minute, clamped to `MIN_RATE..=MAX_RATE`.
    pub rate: u32,
    pub voice: Option<String>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            rate: DEFAULT_RATE,
            voice: None,
        }
    }
}

impl SpeechConfig {
    pub fn new(rate: u32, voice: Option<String>) -> Self {
        Self {
            rate: rate.clamp(MIN_RATE, MAX_RATE),
            voice: voice.filter(|value| !value.trim().is_empty()),
        }
    }
}

/// Interrupts a backend from another thread while `speak` is blocking.
pub type Interrupt = Arc<dyn Fn() + Send + Sync>;

/// A speech synthesizer. `speak` blocks until the text has been spoken or
/// the interrupt fires.
pub trait SpeechBackend: Send + 'static {
    fn configure(&mut self, config: &SpeechConfig) -> Result<()>;
    fn speak(&mut self, text: &str) -> Result<()>;
    fn interrupter(&self) -> Interrupt;
    /// Brings the backend back to a clean state after an interrupt.
    fn reinit(&mut self) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Ready,
    Speaking,
    /// Hard-stopped; must be reinitialized before it can speak again.
    Stopped,
}

/// Cloneable hard-stop for an engine that may be owned by a playback worker.
#[derive(Clone)]
pub struct StopHandle {
    stopped: Arc<AtomicBool>,
    interrupt: Interrupt,
}

impl StopHandle {
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        (self.interrupt)();
    }
}

pub struct SpeechEngine<B: SpeechBackend> {
    backend: B,
    config: SpeechConfig,
    state: EngineState,
    stopped: Arc<AtomicBool>,
}

impl<B: SpeechBackend> SpeechEngine<B> {
    pub fn new(mut backend: B, config: SpeechConfig) -> Result<Self> {
        backend
            .configure(&config)
            .with_context(|| "failed to configure speech engine")?;
        Ok(Self {
            backend,
            config,
            state: EngineState::Ready,
            stopped: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn state(&self) -> EngineState {
        if self.stopped.load(Ordering::SeqCst) {
            EngineState::Stopped
        } else {
            self.state
        }
    }

    pub fn config(&self) -> &SpeechConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            stopped: self.stopped.clone(),
            interrupt: self.backend.interrupter(),
        }
    }

    pub fn set_config(&mut self, config: SpeechConfig) -> Result<()> {
        self.backend.configure(&config)?;
        self.config = config;
        Ok(())
    }

    pub fn speak(&mut self, text: &str) -> Result<()> {
        if self.state() == EngineState::Stopped {
            bail!("speech engine was stopped; reinitialize before speaking");
        }
        self.state = EngineState::Speaking;
        let result = self.backend.speak(text);
        self.state = EngineState::Ready;
        result
    }

    pub fn stop(&self) {
        self.stop_handle().stop();
    }

    /// Stopped -> Ready. Reapplies the current rate and voice.
    pub fn reinit(&mut self) -> Result<()> {
        self.backend
            .reinit()
            .with_context(|| "failed to reinitialize speech engine")?;
        self.backend.configure(&self.config)?;
        self.stopped.store(false, Ordering::SeqCst);
        self.state = EngineState::Ready;
        debug!("speech engine reinitialized");
        Ok(())
    }
}

/// Speaks through an external program such as `espeak-ng` or `say`, one
/// process per utterance.
pub struct CommandSpeech {
    program: String,
    config: SpeechConfig,
    child: Arc<Mutex<Option<Child>>>,
}

impl CommandSpeech {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            config: SpeechConfig::default(),
            child: Arc::new(Mutex::new(None)),
        }
    }

    fn build_command(&self, text: &str) -> Command {
        let mut command = Command::new(&self.program);
        command.args(speech_args(&self.program, &self.config, text));
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        command
    }
}

fn speech_args(program: &str, config: &SpeechConfig, text: &str) -> Vec<String> {
    // macOS `say` takes -r for rate; espeak and espeak-ng take -s
    let rate_flag = if program.ends_with("say") { "-r" } else { "-s" };
    let mut args = vec![rate_flag.to_string(), config.rate.to_string()];
    if let Some(voice) = &config.voice {
        args.push("-v".to_string());
        args.push(voice.clone());
    }
    args.push("--".to_string());
    args.push(text.to_string());
    args
}

fn kill_child(slot: &Mutex<Option<Child>>) {
    let Ok(mut guard) = slot.lock() else {
        return;
    };
    if let Some(mut child) = guard.take() {
        child.kill().ok();
        child.wait().ok();
    }
}

/// Reads stderr on its own thread so a chatty process never fills the pipe
/// while it is being polled.
fn drain_stderr(pipe: Option<ChildStderr>) -> Option<JoinHandle<String>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = String::new();
            pipe.read_to_string(&mut buf).ok();
            buf
        })
    })
}

/// Polls the child in `slot` until it exits or an interrupt takes it away.
fn wait_for_exit(
    slot: &Mutex<Option<Child>>,
    program: &str,
    stderr: Option<JoinHandle<String>>,
) -> Result<()> {
    let status = loop {
        {
            let mut guard = slot
                .lock()
                .map_err(|_| anyhow!("speech process lock poisoned"))?;
            // the interrupt took the child away
            let Some(child) = guard.as_mut() else {
                break None;
            };
            if let Some(status) = child.try_wait()? {
                guard.take();
                break Some(status);
            }
        }
        thread::sleep(POLL_INTERVAL);
    };

    let stderr = stderr
        .and_then(|reader| reader.join().ok())
        .unwrap_or_default();
    match status {
        Some(status) if !status.success() => {
            Err(anyhow!("{} failed: {}", program, stderr.trim()))
        }
        _ => Ok(()),
    }
}

impl SpeechBackend for CommandSpeech {
    fn configure(&mut self, config: &SpeechConfig) -> Result<()> {
        self.config = config.clone();
        Ok(())
    }

    fn speak(&mut self, text: &str) -> Result<()> {
        let mut spawned = self
            .build_command(text)
            .spawn()
            .with_context(|| format!("failed to run {} (is it installed?)", self.program))?;
        let stderr = drain_stderr(spawned.stderr.take());
        *self
            .child
            .lock()
            .map_err(|_| anyhow!("speech process lock poisoned"))? = Some(spawned);
        wait_for_exit(&self.child, &self.program, stderr)
    }

    fn interrupter(&self) -> Interrupt {
        let child = self.child.clone();
        Arc::new(move || kill_child(&child))
    }

    fn reinit(&mut self) -> Result<()> {
        let leftover = self
            .child
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false);
        if leftover {
            warn!("speech process still running at reinit; killing it");
        }
        kill_child(&self.child);
        Ok(())
    }
}
