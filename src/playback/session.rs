use anyhow::{Context, Result, anyhow};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::display::TextDisplay;
use super::speech::{EngineState, SpeechBackend, SpeechConfig, SpeechEngine, StopHandle};
use super::{Highlight, PlaybackOutcome, play};
use crate::reader::Reading;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Speaking,
    Cancelling,
}

impl PlaybackState {
    fn to_u8(self) -> u8 {
        match self {
            PlaybackState::Idle => 0,
            PlaybackState::Speaking => 1,
            PlaybackState::Cancelling => 2,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => PlaybackState::Speaking,
            2 => PlaybackState::Cancelling,
            _ => PlaybackState::Idle,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Default)]
struct SharedState(Arc<AtomicU8>);

impl SharedState {
    fn get(&self) -> PlaybackState {
        PlaybackState::from_u8(self.0.load(Ordering::SeqCst))
    }

    fn set(&self, state: PlaybackState) {
        self.0.store(state.to_u8(), Ordering::SeqCst);
    }

    /// Moves `from` -> `to` only if nothing changed the state in between.
    fn transition(&self, from: PlaybackState, to: PlaybackState) -> bool {
        self.0
            .compare_exchange(from.to_u8(), to.to_u8(), Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}

type Worker<B, D> = JoinHandle<(SpeechEngine<B>, D, PlaybackOutcome)>;

/// Owns the speech engine and the display between captures. While a
/// playback runs both are moved into the worker, so nothing else can touch
/// the display until the worker has observed cancellation and handed them
/// back.
pub struct PlaybackSession<B: SpeechBackend, D: TextDisplay> {
    engine: Option<SpeechEngine<B>>,
    display: Option<D>,
    highlight: bool,
    cancel: CancellationToken,
    state: SharedState,
    stop: Option<StopHandle>,
    worker: Option<Worker<B, D>>,
    last_outcome: Option<PlaybackOutcome>,
}

impl<B: SpeechBackend, D: TextDisplay> PlaybackSession<B, D> {
    pub fn new(engine: SpeechEngine<B>, display: D) -> Self {
        Self {
            engine: Some(engine),
            display: Some(display),
            highlight: true,
            cancel: CancellationToken::new(),
            state: SharedState::default(),
            stop: None,
            worker: None,
            last_outcome: None,
        }
    }

    pub fn with_highlight(mut self, highlight: bool) -> Self {
        self.highlight = highlight;
        self
    }

    pub fn state(&self) -> PlaybackState {
        self.state.get()
    }

    pub fn is_speaking(&self) -> bool {
        self.state() != PlaybackState::Idle
    }

    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// `None` while a playback holds the engine.
    pub fn engine(&self) -> Option<&SpeechEngine<B>> {
        self.engine.as_ref()
    }

    /// `None` while a playback holds the display.
    pub fn display(&self) -> Option<&D> {
        self.display.as_ref()
    }

    pub fn last_outcome(&self) -> Option<&PlaybackOutcome> {
        self.last_outcome.as_ref()
    }

    pub fn set_highlight(&mut self, highlight: bool) {
        self.highlight = highlight;
    }

    /// Applies a new rate/voice. Only possible between playbacks.
    pub fn set_speech_config(&mut self, config: SpeechConfig) -> Result<()> {
        let engine = self
            .engine
            .as_mut()
            .ok_or_else(|| anyhow!("cannot reconfigure speech while playing"))?;
        engine.set_config(config)
    }

    /// Shows `reading` and starts speaking it in the background. Any playback
    /// still running is hard-stopped first.
    pub async fn start(&mut self, reading: &Reading) -> Result<()> {
        self.restart().await?;

        let (Some(mut engine), Some(mut display)) = (self.engine.take(), self.display.take())
        else {
            return Err(anyhow!("playback session lost its engine or display"));
        };
        display.render(&reading.display_text);

        self.cancel.reset();
        self.stop = Some(engine.stop_handle());
        self.state.set(PlaybackState::Speaking);

        let segments = reading.segments.clone();
        let cancel = self.cancel.clone();
        let state = self.state.clone();
        let highlight = self.highlight;
        info!("starting playback of {} segments", segments.len());

        self.worker = Some(tokio::task::spawn_blocking(move || {
            let outcome = play(
                &segments,
                |text| engine.speak(text),
                |event| apply_highlight(&mut display, event, highlight),
                || cancel.is_cancelled(),
            );
            state.set(PlaybackState::Idle);
            (engine, display, outcome)
        }));
        Ok(())
    }

    /// Asks the running playback to stop before its next segment.
    pub fn cancel(&self) {
        if self.worker.is_some() {
            self.cancel.cancel();
            // a worker that already went Idle must stay Idle
            self.state
                .transition(PlaybackState::Speaking, PlaybackState::Cancelling);
        }
    }

    /// Waits for the running playback to finish and takes the engine and
    /// display back. Returns `None` when nothing was playing.
    pub async fn wait(&mut self) -> Result<Option<PlaybackOutcome>> {
        let Some(worker) = self.worker.take() else {
            return Ok(None);
        };
        let (engine, display, outcome) = worker
            .await
            .with_context(|| "playback task failed")?;
        self.engine = Some(engine);
        self.display = Some(display);
        self.stop = None;
        self.state.set(PlaybackState::Idle);
        debug!("playback finished: {:?}", outcome);
        self.last_outcome = Some(outcome.clone());
        Ok(Some(outcome))
    }

    /// Cancels and hard-stops any active playback, waits for it, then
    /// reinitializes the speech engine so the next start begins clean.
    pub async fn restart(&mut self) -> Result<()> {
        if self.worker.is_some() {
            self.cancel();
            if let Some(stop) = &self.stop {
                stop.stop();
            }
            self.wait().await?;
        }
        if let Some(engine) = self.engine.as_mut() {
            if engine.state() == EngineState::Stopped {
                engine.reinit()?;
            }
        }
        Ok(())
    }
}

fn apply_highlight<D: TextDisplay>(display: &mut D, event: Highlight, enabled: bool) {
    match event {
        Highlight::Range { start, end } if enabled => {
            display.clear_highlight();
            display.highlight(start, end);
            display.scroll_into_view(start);
        }
        Highlight::Range { .. } => {}
        Highlight::Clear => display.clear_highlight(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelling_transition_needs_speaking() {
        let state = SharedState::default();
        assert!(!state.transition(PlaybackState::Speaking, PlaybackState::Cancelling));
        assert_eq!(state.get(), PlaybackState::Idle);

        state.set(PlaybackState::Speaking);
        assert!(state.transition(PlaybackState::Speaking, PlaybackState::Cancelling));
        assert_eq!(state.get(), PlaybackState::Cancelling);
    }
}
