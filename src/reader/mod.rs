//! Rebuilds readable text from word-level OCR tokens.
//!
//! The pipeline is pure and runs to completion before playback starts:
//! filter tokens, assemble lines, join hyphen breaks, classify headers,
//! compose display/speech strings, split the display string into segments.

mod classify;
mod compose;
mod filter;
mod hyphen;
mod lines;
mod segments;

use serde::Serialize;
use tracing::debug;

use crate::ocr::Token;

pub use classify::{ClassifiedLine, baseline_height};
pub use compose::PAUSE_CUE;
pub use hyphen::JoinedLine;
pub use lines::Line;
pub use segments::Segment;

pub const DEFAULT_HEADER_RATIO: f64 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReaderOptions {
    /// A line is a header candidate when taller than `baseline * header_ratio`.
    pub header_ratio: f64,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            header_ratio: DEFAULT_HEADER_RATIO,
        }
    }
}

/// Result of one capture. An empty capture yields empty strings and no
/// segments.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Reading {
    pub display_text: String,
    pub speech_text: String,
    pub segments: Vec<Segment>,
}

impl Reading {
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

pub fn process(tokens: &[Token]) -> Reading {
    process_with(tokens, &ReaderOptions::default())
}

pub fn process_with(tokens: &[Token], options: &ReaderOptions) -> Reading {
    let filtered = filter::filter_tokens(tokens);
    if filtered.is_empty() {
        debug!("no tokens survived filtering ({} raw)", tokens.len());
        return Reading::default();
    }

    let lines = lines::assemble_lines(filtered);
    let joined = hyphen::join_hyphenated(lines.iter().map(JoinedLine::from).collect());
    debug!(
        "assembled {} lines, {} after hyphen joining",
        lines.len(),
        joined.len()
    );
    let classified = classify::classify_lines(joined, options.header_ratio);
    let composed = compose::compose(&classified);

    let display_text = hyphen::rejoin_broken_words(&composed.display);
    let speech_text = hyphen::rejoin_broken_words(&composed.speech);
    let segments = segments::split_segments(&display_text);

    Reading {
        display_text,
        speech_text,
        segments,
    }
}
