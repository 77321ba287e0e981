use crate::ocr::Token;

/// Drops recognition noise: tokens without positive confidence or with
/// whitespace-only text. Survivors keep engine order and carry trimmed text.
pub(crate) fn filter_tokens(tokens: &[Token]) -> Vec<Token> {
    tokens
        .iter()
        .filter(|token| token.confidence > 0.0)
        .filter_map(|token| {
            let text = token.text.trim();
            if text.is_empty() {
                return None;
            }
            Some(Token {
                text: text.to_string(),
                ..token.clone()
            })
        })
        .collect()
}
