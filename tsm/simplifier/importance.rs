use serde::{Deserialize, Serialize};

use crate::ladder::Ladder;

/// Characters ignored at the end of a word when comparing levels.
pub const STRIPPED_PUNCTUATION: [char; 9] = ['.', ',', ':', '?', '!', ';', '"', '(', ')'];

/// A word of the original paragraph and the deepest level it survives to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordImportance {
    /// Word as written in level 0.
    pub text: String,
    /// 0 = dropped at level 1, 4 = still present at level 4.
    pub importance: u8,
}

/// Case-insensitive comparison ignoring one trailing punctuation mark.
#[must_use]
pub fn words_equal(left: &str, right: &str) -> bool {
    strip_trailing(left).to_lowercase() == strip_trailing(right).to_lowercase()
}

fn strip_trailing(word: &str) -> &str {
    word.strip_suffix(|c: char| STRIPPED_PUNCTUATION.contains(&c))
        .unwrap_or(word)
}

struct Cursor<'a> {
    words: Vec<&'a str>,
    position: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            words: text.split_whitespace().collect(),
            position: 0,
        }
    }

    /// Advances past the next word when it equals `word`.
    fn consume(&mut self, word: &str) -> bool {
        let matched = self
            .words
            .get(self.position)
            .is_some_and(|next| words_equal(word, next));
        if matched {
            self.position += 1;
        }
        matched
    }
}

/// Labels each word of `l0` with how deep it survives in `deeper`
/// (levels 1 to 4, any of which may be empty).
///
/// A word missing from level 1 is 0. Otherwise the deepest of levels 4, 3, 2
/// whose cursor matches wins, falling back to 1. Every cursor only moves on a
/// match, so levels that are not order-preserving subsequences of the level
/// above degrade to shallower labels instead of failing.
#[must_use]
pub fn align_importance(l0: &str, deeper: [&str; 4]) -> Vec<WordImportance> {
    let [mut l1, l2, l3, l4] = deeper.map(Cursor::new);
    let mut deep = [(4u8, l4), (3, l3), (2, l2)];
    l0.split_whitespace()
        .map(|word| {
            let importance = if l1.consume(word) {
                deep.iter_mut()
                    .find_map(|(level, cursor)| cursor.consume(word).then_some(*level))
                    .unwrap_or(1)
            } else {
                0
            };
            WordImportance {
                text: word.to_string(),
                importance,
            }
        })
        .collect()
}

/// [`align_importance`] over the first five levels of a ladder.
#[must_use]
pub fn align_ladder(ladder: &Ladder) -> Vec<WordImportance> {
    align_importance(
        ladder.level(0),
        [ladder.level(1), ladder.level(2), ladder.level(3), ladder.level(4)],
    )
}

/// Indices of levels that are not an order-preserving subsequence (under
/// [`words_equal`]) of the level before them.
#[must_use]
pub fn misaligned_levels(levels: &[&str]) -> Vec<usize> {
    levels
        .windows(2)
        .enumerate()
        .filter(|(_, pair)| !is_subsequence(pair[1], pair[0]))
        .map(|(index, _)| index + 1)
        .collect()
}

fn is_subsequence(shorter: &str, longer: &str) -> bool {
    let mut source = longer.split_whitespace();
    shorter
        .split_whitespace()
        .all(|word| source.any(|candidate| words_equal(word, candidate)))
}
