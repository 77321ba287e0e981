use super::classify::ClassifiedLine;

/// Spoken after a header to force a pause without a visible artifact.
pub const PAUSE_CUE: &str = ". . . ";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComposedText {
    pub display: String,
    pub speech: String,
}

/// Builds the display and speech strings in one pass. Their offsets are not
/// aligned: headers get blank-line spacing on screen and a pause cue in speech.
pub(crate) fn compose(lines: &[ClassifiedLine]) -> ComposedText {
    let mut composed = ComposedText::default();
    for line in lines {
        if line.is_header {
            composed.display.push_str("\n\n");
            composed.display.push_str(&line.text);
            composed.display.push_str("\n\n");
            composed.speech.push_str(&line.text);
            composed.speech.push_str(PAUSE_CUE);
        } else {
            composed.display.push_str(&line.text);
            composed.display.push(' ');
            composed.speech.push_str(&line.text);
            composed.speech.push(' ');
        }
    }
    composed
}
