use super::Token;

const COL_LEFT: usize = 6;
const COL_TOP: usize = 7;
const COL_HEIGHT: usize = 9;
const COL_CONF: usize = 10;
const COL_TEXT: usize = 11;

/// Parses `tesseract ... tsv` output into tokens, one per data row, in the
/// order tesseract emitted them. Page/block/paragraph/line rows carry
/// confidence -1 and no text; they are kept so the token filter sees the raw
/// engine output.
pub fn parse_tsv_tokens(tsv: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    for (idx, row) in tsv.lines().enumerate() {
        if idx == 0 || row.trim().is_empty() {
            continue;
        }
        let cols = row.split('\t').collect::<Vec<_>>();
        if cols.len() <= COL_CONF {
            continue;
        }
        let left: i32 = cols[COL_LEFT].trim().parse().unwrap_or(0);
        let top: i32 = cols[COL_TOP].trim().parse().unwrap_or(0);
        let height: i32 = cols[COL_HEIGHT].trim().parse().unwrap_or(0);
        let confidence: f32 = cols[COL_CONF].trim().parse().unwrap_or(-1.0);
        let text = cols.get(COL_TEXT).copied().unwrap_or_default();
        tokens.push(Token::new(text, left, top, height, confidence));
    }
    tokens
}
