use serde::Serialize;
use tracing::debug;

use super::hyphen::JoinedLine;

const PREVIEW_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedLine {
    pub text: String,
    pub height: f64,
    pub is_header: bool,
}

/// Median line height. Even counts average the two middle values.
pub fn baseline_height(heights: &[f64]) -> Option<f64> {
    if heights.is_empty() {
        return None;
    }
    let mut sorted = heights.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Flags lines taller than `baseline * header_ratio` that do not end a
/// sentence. A single line is its own baseline and is never a header, so
/// ratios below 1.0 are raised to 1.0.
pub(crate) fn classify_lines(lines: Vec<JoinedLine>, header_ratio: f64) -> Vec<ClassifiedLine> {
    let header_ratio = header_ratio.max(1.0);
    let heights = lines.iter().map(|line| line.height).collect::<Vec<_>>();
    let Some(baseline) = baseline_height(&heights) else {
        return Vec::new();
    };
    debug!("baseline height: {:.2}", baseline);

    lines
        .into_iter()
        .enumerate()
        .map(|(idx, line)| {
            let text = line.text().trim().to_string();
            let is_header = line.height > baseline * header_ratio && !text.ends_with('.');
            debug!(
                "line {}: height={:.2}, ratio={:.2}, is_header={}, text='{}'",
                idx,
                line.height,
                line.height / baseline,
                is_header,
                preview(&text)
            );
            ClassifiedLine {
                text,
                height: line.height,
                is_header,
            }
        })
        .collect()
}

fn preview(text: &str) -> String {
    if text.chars().count() > PREVIEW_CHARS {
        let head = text.chars().take(PREVIEW_CHARS).collect::<String>();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str, height: f64) -> JoinedLine {
        JoinedLine {
            words: text.split_whitespace().map(str::to_string).collect(),
            height,
        }
    }

    #[test]
    fn median_of_two_is_their_mean() {
        assert_eq!(baseline_height(&[40.0, 20.0]), Some(30.0));
        assert_eq!(baseline_height(&[20.0, 50.0, 21.0]), Some(21.0));
        assert_eq!(baseline_height(&[]), None);
    }

    #[test]
    fn tall_unterminated_line_is_header() {
        let classified = classify_lines(
            vec![line("INTRODUCTION", 40.0), line("This is body text.", 20.0)],
            1.2,
        );
        assert!(classified[0].is_header);
        assert!(!classified[1].is_header);
    }

    #[test]
    fn tall_line_ending_with_period_is_body() {
        let classified = classify_lines(
            vec![
                line("Big closing sentence.", 40.0),
                line("small", 20.0),
                line("small", 20.0),
            ],
            1.2,
        );
        assert!(classified.iter().all(|line| !line.is_header));
    }

    #[test]
    fn single_line_is_never_header() {
        for height in [1.0, 20.0, 400.0] {
            let classified = classify_lines(vec![line("LONELY TITLE", height)], 1.2);
            assert_eq!(classified.len(), 1);
            assert!(!classified[0].is_header);
        }
    }

    #[test]
    fn single_line_stays_body_with_ratio_below_one() {
        for ratio in [0.5, 0.0, -3.0, f64::NAN] {
            let classified = classify_lines(vec![line("LONELY", 30.0)], ratio);
            assert!(!classified[0].is_header, "ratio {ratio}");
        }
    }

    #[test]
    fn ratio_must_be_strictly_exceeded() {
        let classified = classify_lines(
            vec![line("Edge", 24.0), line("body", 20.0), line("body", 20.0)],
            1.2,
        );
        assert!(!classified[0].is_header);
    }

    #[test]
    fn no_lines_yields_nothing() {
        assert!(classify_lines(Vec::new(), 1.2).is_empty());
    }
}
