use lazy_static::lazy_static;
use regex::Regex;

use super::lines::Line;

lazy_static! {
    /// `word- word` or `word-\nword` left over after line-level joining.
    static ref RE_BROKEN_WORD: Regex = Regex::new(r"(\w+)-\s+(\w+)").unwrap();
}

/// A logical line after hyphen joining: its words and the tallest effective
/// height among the physical lines it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedLine {
    pub words: Vec<String>,
    pub height: f64,
}

impl From<&Line> for JoinedLine {
    fn from(line: &Line) -> Self {
        Self {
            words: line.words().map(str::to_string).collect(),
            height: line.effective_height(),
        }
    }
}

impl JoinedLine {
    pub fn text(&self) -> String {
        self.words.join(" ")
    }

    fn ends_with_hyphen(&self) -> bool {
        self.words
            .last()
            .is_some_and(|word| word.trim_end_matches(' ').ends_with('-'))
    }

    fn absorb(&mut self, next: JoinedLine) {
        let stem = self
            .words
            .pop()
            .map(|word| word.trim_end_matches(['-', ' ']).to_string())
            .unwrap_or_default();
        let mut rest = next.words.into_iter();
        let head = rest.next().unwrap_or_default();
        self.words.push(format!("{stem}{head}"));
        self.words.extend(rest);
        self.height = self.height.max(next.height);
    }
}

/// Merges every line whose last word ends in a hyphen with the line after
/// it, repeating while the merged line still ends in a hyphen.
pub(crate) fn join_hyphenated(lines: Vec<JoinedLine>) -> Vec<JoinedLine> {
    let mut joined = Vec::with_capacity(lines.len());
    let mut iter = lines.into_iter();

    while let Some(mut current) = iter.next() {
        while current.ends_with_hyphen() {
            let Some(next) = iter.next() else {
                break;
            };
            current.absorb(next);
        }
        joined.push(current);
    }

    joined
}

/// Text-level pass for hyphen breaks the line-level join could not see.
pub(crate) fn rejoin_broken_words(text: &str) -> String {
    RE_BROKEN_WORD.replace_all(text, "${1}${2}").into_owned()
}
