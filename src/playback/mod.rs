mod display;
mod session;
mod speech;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::reader::Segment;

pub use display::{TerminalDisplay, TextDisplay};
pub use session::{CancellationToken, PlaybackSession, PlaybackState};
pub use speech::{
    CommandSpeech, DEFAULT_RATE, EngineState, Interrupt, MAX_RATE, MIN_RATE, SpeechBackend,
    SpeechConfig, SpeechEngine, StopHandle,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Completed,
    Interrupted,
    /// A speak call failed; the remaining segments were skipped.
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Highlight {
    Range { start: usize, end: usize },
    Clear,
}

/// Speaks `segments` strictly in order, highlighting each one before it is
/// spoken. Cancellation is checked before every segment; a speak call
/// already running is not interrupted. The highlight is always cleared at
/// the end, whatever the outcome.
pub fn play<S, H, C>(
    segments: &[Segment],
    mut speak: S,
    mut highlight: H,
    is_cancelled: C,
) -> PlaybackOutcome
where
    S: FnMut(&str) -> Result<()>,
    H: FnMut(Highlight),
    C: Fn() -> bool,
{
    let mut outcome = PlaybackOutcome::Completed;
    for (idx, segment) in segments.iter().enumerate() {
        if is_cancelled() {
            info!("playback cancelled before segment {}", idx + 1);
            outcome = PlaybackOutcome::Interrupted;
            break;
        }
        highlight(Highlight::Range {
            start: segment.start_offset,
            end: segment.end_offset,
        });
        debug!(
            "speaking segment {}/{} [{}..{}]",
            idx + 1,
            segments.len(),
            segment.start_offset,
            segment.end_offset
        );
        if let Err(err) = speak(&segment.text) {
            warn!("speech failed on segment {}: {:#}", idx + 1, err);
            outcome = PlaybackOutcome::Failed(err.to_string());
            break;
        }
    }
    highlight(Highlight::Clear);
    outcome
}
