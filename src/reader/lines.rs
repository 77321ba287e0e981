use crate::ocr::Token;

/// Tokens judged to share one visual text line, sorted left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub tokens: Vec<Token>,
}

impl Line {
    /// Mean token height. Heights below 1 are floored to 1 so zero-height
    /// detections never produce a zero or NaN line height.
    pub fn effective_height(&self) -> f64 {
        if self.tokens.is_empty() {
            return 1.0;
        }
        let total: f64 = self
            .tokens
            .iter()
            .map(|token| f64::from(token.height.max(1)))
            .sum();
        total / self.tokens.len() as f64
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(|token| token.text.as_str())
    }
}

/// Groups filtered tokens into lines. A boundary falls between two
/// consecutive tokens when the next one starts below the bottom edge of the
/// current one.
///
/// Known limitation: mixed glyph sizes on one printed line can over-split,
/// because the test compares against the previous token only.
pub(crate) fn assemble_lines(tokens: Vec<Token>) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut current: Vec<Token> = Vec::new();
    let mut iter = tokens.into_iter().peekable();

    while let Some(token) = iter.next() {
        let boundary = match iter.peek() {
            Some(next) => next.top > token.bottom(),
            None => true,
        };
        current.push(token);
        if boundary {
            let mut tokens = std::mem::take(&mut current);
            tokens.sort_by_key(|token| token.left);
            lines.push(Line { tokens });
        }
    }

    lines
}
