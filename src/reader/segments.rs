use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    /// Terminator run followed by the whitespace it swallows.
    static ref RE_SENTENCE_END: Regex = Regex::new(r"([.!?]+)\s+").unwrap();
}

/// A sentence-like chunk of the display text. Offsets are character (not
/// byte) positions, half-open: `start_offset..end_offset`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
    pub start_offset: usize,
    pub end_offset: usize,
}

impl Segment {
    pub fn len(&self) -> usize {
        self.end_offset - self.start_offset
    }

    pub fn is_empty(&self) -> bool {
        self.start_offset == self.end_offset
    }
}

/// Splits `display` after every run of `.`, `!` or `?` that is followed by
/// whitespace. The terminator stays with its sentence; the following
/// whitespace and any leading whitespace of a sentence are skipped but still
/// counted, so offsets index the original string exactly.
pub(crate) fn split_segments(display: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut cursor = 0usize;
    let mut offset = 0usize;

    for caps in RE_SENTENCE_END.captures_iter(display) {
        let (Some(whole), Some(terminator)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        push_fragment(&mut segments, &display[cursor..terminator.end()], offset);
        offset += display[cursor..whole.end()].chars().count();
        cursor = whole.end();
    }
    push_fragment(&mut segments, &display[cursor..], offset);

    segments
}

fn push_fragment(segments: &mut Vec<Segment>, fragment: &str, offset: usize) {
    let trimmed_start = fragment.trim_start();
    let body = trimmed_start.trim_end();
    if body.is_empty() {
        return;
    }
    let lead = fragment.len() - trimmed_start.len();
    let start_offset = offset + fragment[..lead].chars().count();
    segments.push(Segment {
        text: body.to_string(),
        start_offset,
        end_offset: start_offset + body.chars().count(),
    });
}
