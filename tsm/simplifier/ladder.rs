use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Successive shortenings of one sentence; index 0 is the original.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthChain {
    levels: Vec<String>,
}

impl DepthChain {
    /// Chain holding only the original sentence.
    #[must_use]
    pub fn new(original: impl Into<String>) -> Self {
        Self {
            levels: vec![original.into()],
        }
    }

    /// Appends the next accepted rewrite.
    pub fn push(&mut self, text: impl Into<String>) {
        self.levels.push(text.into());
    }

    /// Number of entries, at least 1.
    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Chains always hold the original, so this is always `false`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Entry at `depth`, or the deepest one when the chain stopped early.
    #[must_use]
    pub fn at_clamped(&self, depth: usize) -> &str {
        let index = depth.min(self.levels.len().saturating_sub(1));
        self.levels.get(index).map_or("", String::as_str)
    }

    /// Most recent entry.
    #[must_use]
    pub fn last(&self) -> &str {
        self.levels.last().map_or("", String::as_str)
    }

    /// The unmodified sentence.
    #[must_use]
    pub fn original(&self) -> &str {
        self.levels.first().map_or("", String::as_str)
    }

    /// All entries, shallowest first.
    #[must_use]
    pub fn levels(&self) -> &[String] {
        &self.levels
    }
}

/// Paragraph variants indexed by simplification depth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ladder {
    levels: Vec<String>,
    produced: usize,
}

impl Ladder {
    /// Joins the chains depth by depth and pads to at least `width` levels by
    /// repeating the deepest one.
    #[must_use]
    pub fn recombine(chains: &[DepthChain], width: usize) -> Self {
        let produced = chains.iter().map(DepthChain::len).max().unwrap_or(1);
        let mut levels: Vec<String> = (0..produced)
            .map(|depth| {
                chains
                    .iter()
                    .map(|chain| chain.at_clamped(depth))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect();
        while levels.len() < width {
            let last = levels.last().cloned().unwrap_or_default();
            levels.push(last);
        }
        Self { levels, produced }
    }

    /// Every level, level 0 being the original paragraph.
    #[must_use]
    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    /// Level `depth`, clamped to the deepest level.
    #[must_use]
    pub fn level(&self, depth: usize) -> &str {
        let index = depth.min(self.levels.len().saturating_sub(1));
        self.levels.get(index).map_or("", String::as_str)
    }

    /// Levels actually produced before padding.
    #[must_use]
    pub const fn produced_depth(&self) -> usize {
        self.produced
    }

    /// Levels keyed `"0"`, `"1"`, ... in order.
    #[must_use]
    pub fn as_level_map(&self) -> IndexMap<String, String> {
        self.levels
            .iter()
            .enumerate()
            .map(|(depth, text)| (depth.to_string(), text.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(entries: &[&str]) -> DepthChain {
        let mut chain = DepthChain::new(entries[0]);
        for entry in &entries[1..] {
            chain.push(*entry);
        }
        chain
    }

    #[test]
    fn uneven_chains_clamp_to_their_deepest_entry() {
        let chains = vec![
            chain(&["a0", "a1", "a2"]),
            chain(&["b0", "b1", "b2", "b3", "b4"]),
            chain(&["c0", "c1"]),
        ];
        let ladder = Ladder::recombine(&chains, 5);
        assert_eq!(ladder.levels().len(), 5);
        assert_eq!(ladder.produced_depth(), 5);
        assert_eq!(ladder.level(0), "a0 b0 c0");
        assert_eq!(ladder.level(4), "a2 b4 c1");
    }

    #[test]
    fn short_ladders_repeat_last_level() {
        let ladder = Ladder::recombine(&[chain(&["x0", "x1"])], 5);
        assert_eq!(ladder.produced_depth(), 2);
        assert_eq!(ladder.levels(), &["x0", "x1", "x1", "x1", "x1"]);
        assert_eq!(ladder.level(9), "x1");
        let map = ladder.as_level_map();
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["0", "1", "2", "3", "4"]);
    }

    #[test]
    fn no_chains_yield_blank_levels() {
        let ladder = Ladder::recombine(&[], 5);
        assert_eq!(ladder.levels(), &["", "", "", "", ""]);
    }

    #[test]
    fn chain_accessors() {
        let chain = chain(&["orig", "short"]);
        assert_eq!(chain.original(), "orig");
        assert_eq!(chain.last(), "short");
        assert_eq!(chain.at_clamped(7), "short");
        assert!(!chain.is_empty());
    }
}
