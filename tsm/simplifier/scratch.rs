use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use crate::scoring::GrammarGrade;

/// Working state owned by one sentence task.
///
/// Never shared between tasks; [`release`](Self::release) consumes it so it
/// is dropped on every exit path of the depth iterator.
#[derive(Debug)]
pub struct SentenceScratch {
    id: Uuid,
    sentence_index: usize,
    grades: HashMap<String, GrammarGrade>,
    generations: usize,
    candidates: usize,
    classifications: usize,
    memo_hits: usize,
}

/// Counters reported when a scratch is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScratchStats {
    /// Scratch identifier.
    pub id: Uuid,
    /// Sentence position in the paragraph.
    pub sentence_index: usize,
    /// Oracle generation calls.
    pub generations: usize,
    /// Candidates received.
    pub candidates: usize,
    /// Grammar classifier calls.
    pub classifications: usize,
    /// Grades served from the memo.
    pub memo_hits: usize,
}

impl SentenceScratch {
    /// Fresh scratch for the sentence at `sentence_index`.
    #[must_use]
    pub fn new(sentence_index: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            sentence_index,
            grades: HashMap::new(),
            generations: 0,
            candidates: 0,
            classifications: 0,
            memo_hits: 0,
        }
    }

    /// Scratch identifier.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Grade memoised for `text`, if any.
    pub fn cached_grade(&mut self, text: &str) -> Option<GrammarGrade> {
        let grade = self.grades.get(text).copied();
        if grade.is_some() {
            self.memo_hits += 1;
        }
        grade
    }

    /// Memoises a classifier result.
    pub fn store_grade(&mut self, text: &str, grade: GrammarGrade) {
        self.classifications += 1;
        self.grades.insert(text.to_string(), grade);
    }

    /// Counts one oracle call returning `candidates` rewrites.
    pub fn record_generation(&mut self, candidates: usize) {
        self.generations += 1;
        self.candidates += candidates;
    }

    /// Drops the working state, keeping only the counters.
    #[must_use]
    pub fn release(self) -> ScratchStats {
        ScratchStats {
            id: self.id,
            sentence_index: self.sentence_index,
            generations: self.generations,
            candidates: self.candidates,
            classifications: self.classifications,
            memo_hits: self.memo_hits,
        }
    }
}
