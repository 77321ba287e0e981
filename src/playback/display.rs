use std::io::Write;

/// The widget showing the capture. Offsets are character positions into the
/// rendered text; implementations translate them to their own indexing.
pub trait TextDisplay: Send + 'static {
    fn render(&mut self, text: &str);
    fn highlight(&mut self, start: usize, end: usize);
    fn clear_highlight(&mut self);
    fn scroll_into_view(&mut self, offset: usize);
}

/// Writes each highlighted range as its own line, for terminal use.
pub struct TerminalDisplay<W: Write + Send + 'static> {
    out: W,
    text: Vec<char>,
}

impl<W: Write + Send + 'static> TerminalDisplay<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            text: Vec::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send + 'static> TextDisplay for TerminalDisplay<W> {
    fn render(&mut self, text: &str) {
        self.text = text.chars().collect();
    }

    fn highlight(&mut self, start: usize, end: usize) {
        let end = end.min(self.text.len());
        let start = start.min(end);
        let slice = self.text[start..end].iter().collect::<String>();
        let line = slice.split_whitespace().collect::<Vec<_>>().join(" ");
        writeln!(self.out, "> {}", line).ok();
        self.out.flush().ok();
    }

    fn clear_highlight(&mut self) {}

    fn scroll_into_view(&mut self, _offset: usize) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prints_highlighted_range_on_one_line() {
        let mut display = TerminalDisplay::new(Vec::new());
        display.render("\n\nÜber\n\nAlles gut. Next");
        display.highlight(2, 18);
        display.highlight(19, 99);
        let out = String::from_utf8(display.into_inner()).unwrap();
        assert_eq!(out, "> Über Alles gut.\n> Next\n");
    }
}
