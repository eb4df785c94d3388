use std::collections::HashSet;

use crate::oracle::{Evaluator, RewriteReverter};

const TERMINATORS: [char; 3] = ['.', '!', '?'];

/// Lowercased word with surrounding non-alphanumeric characters removed.
#[must_use]
pub fn normalize_word(word: &str) -> String {
    word.trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase()
}

fn normalized_words(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(normalize_word)
        .filter(|word| !word.is_empty())
        .collect()
}

/// Word-overlap sub-scores, all in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalEvaluator;

impl Evaluator for LexicalEvaluator {
    #[allow(clippy::cast_precision_loss)]
    fn semantic_score(&self, reference: &str, candidate: &str) -> f64 {
        let left: HashSet<String> = normalized_words(reference).into_iter().collect();
        let right: HashSet<String> = normalized_words(candidate).into_iter().collect();
        let union = left.union(&right).count();
        if union == 0 {
            return 1.0;
        }
        left.intersection(&right).count() as f64 / union as f64
    }

    #[allow(clippy::cast_precision_loss)]
    fn paraphrase_score(&self, source: &str, candidate: &str) -> f64 {
        let candidate = normalized_words(candidate);
        if candidate.is_empty() {
            return 0.0;
        }
        let mut source = normalized_words(source).into_iter();
        let matched = candidate
            .iter()
            .filter(|word| source.any(|next| &next == *word))
            .count();
        matched as f64 / candidate.len() as f64
    }

    #[allow(clippy::cast_precision_loss)]
    fn length_score(&self, source: &str, candidate: &str, target_ratio: f64) -> f64 {
        let source_chars = source.chars().count();
        if source_chars == 0 {
            return 0.0;
        }
        let ratio = candidate.chars().count() as f64 / source_chars as f64;
        let spread = target_ratio.max(1.0 - target_ratio);
        if spread <= 0.0 {
            return 0.0;
        }
        (1.0 - (ratio - target_ratio).abs() / spread).clamp(0.0, 1.0)
    }
}

/// Projects a rewrite back onto the words of the text it was made from.
///
/// Candidate words are matched in order against the source; matches are
/// emitted with the source spelling and everything else (substitutions,
/// insertions) is dropped. The result is therefore always an order-preserving
/// subsequence of the source words.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeletionReverter;

impl RewriteReverter for DeletionReverter {
    fn revert(&self, original: &str, candidate: &str) -> String {
        let source: Vec<&str> = original.split_whitespace().collect();
        let mut next = 0;
        let mut kept = Vec::new();
        for word in candidate.split_whitespace() {
            let key = normalize_word(word);
            if key.is_empty() {
                continue;
            }
            if let Some(offset) = source[next..]
                .iter()
                .position(|source_word| normalize_word(source_word) == key)
            {
                kept.push(source[next + offset]);
                next += offset + 1;
            }
        }
        let mut reverted = kept.join(" ");
        let terminator = candidate
            .trim_end()
            .chars()
            .last()
            .filter(|c| TERMINATORS.contains(c));
        if let Some(terminator) = terminator {
            if !reverted.is_empty() && !reverted.ends_with(TERMINATORS) {
                let trimmed = reverted.trim_end_matches([',', ';', ':']).len();
                reverted.truncate(trimmed);
                reverted.push(terminator);
            }
        }
        reverted
    }
}
