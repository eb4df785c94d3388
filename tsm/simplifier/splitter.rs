use once_cell::sync::Lazy;
use regex::Regex;

static SENTENCE_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]+(?:\s+|$)").expect("sentence end pattern"));

/// Splits a paragraph after every run of `.`, `!` or `?` followed by
/// whitespace or the end of input.
///
/// Terminators stay with their sentence, pieces are trimmed and empty pieces
/// dropped. A trailing fragment without terminator is kept. When nothing is
/// left the whole input is returned as a single unit.
#[must_use]
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for boundary in SENTENCE_END.find_iter(text) {
        push_trimmed(&mut sentences, &text[start..boundary.end()]);
        start = boundary.end();
    }
    push_trimmed(&mut sentences, &text[start..]);
    if sentences.is_empty() {
        sentences.push(text.to_string());
    }
    sentences
}

fn push_trimmed(out: &mut Vec<String>, piece: &str) {
    let piece = piece.trim();
    if !piece.is_empty() {
        out.push(piece.to_string());
    }
}
