use std::cmp::Ordering;

use crate::scoring::{CandidateResponse, GrammarGrade};

/// Ranked candidates of one round and the chosen winner.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundSelection {
    ranked: Vec<CandidateResponse>,
    winner: usize,
}

impl RoundSelection {
    /// Selection of `ranked[winner]`; `None` when the index is out of range.
    #[must_use]
    pub fn new(ranked: Vec<CandidateResponse>, winner: usize) -> Option<Self> {
        (winner < ranked.len()).then_some(Self { ranked, winner })
    }

    /// Grade-filtered candidates, best composite score first.
    #[must_use]
    pub fn ranked(&self) -> &[CandidateResponse] {
        &self.ranked
    }

    /// Candidate ranked second, if any.
    #[must_use]
    pub fn runner_up(&self) -> Option<&CandidateResponse> {
        self.ranked.get(1)
    }

    /// Makes the second-ranked candidate the winner. Returns `false` when
    /// there is none.
    pub fn promote_runner_up(&mut self) -> bool {
        if self.ranked.len() < 2 {
            return false;
        }
        self.winner = 1;
        true
    }

    /// The winning candidate.
    #[must_use]
    pub fn winner(&self) -> &CandidateResponse {
        &self.ranked[self.winner]
    }

    /// Consumes the selection, returning the winner.
    #[must_use]
    pub fn into_winner(mut self) -> CandidateResponse {
        self.ranked.swap_remove(self.winner)
    }
}

/// Keeps only the best grade present: all A's if any, else all B's if any,
/// else everything.
#[must_use]
pub fn filter_by_grade(candidates: Vec<CandidateResponse>) -> Vec<CandidateResponse> {
    let best = candidates.iter().map(|c| c.grade).min();
    match best {
        Some(grade @ (GrammarGrade::A | GrammarGrade::B)) => {
            candidates.into_iter().filter(|c| c.grade == grade).collect()
        }
        _ => candidates,
    }
}

/// Stable sort by composite score, descending.
#[must_use]
pub fn rank(mut candidates: Vec<CandidateResponse>) -> Vec<CandidateResponse> {
    candidates.sort_by(|a, b| {
        b.composite_score
            .partial_cmp(&a.composite_score)
            .unwrap_or(Ordering::Equal)
    });
    candidates
}

/// Index of the round winner within a ranked list.
///
/// The top candidate wins unless it is graded C while A/B candidates exist;
/// then any A beats any B, ties broken by score.
#[must_use]
pub fn grammar_override(ranked: &[CandidateResponse]) -> Option<usize> {
    let top = ranked.first()?;
    if top.grade != GrammarGrade::C || ranked.len() < 2 {
        return Some(0);
    }
    let better = ranked
        .iter()
        .enumerate()
        .filter(|(_, c)| c.grade != GrammarGrade::C)
        .min_by(|(_, a), (_, b)| {
            let a_key = a.grade != GrammarGrade::A;
            let b_key = b.grade != GrammarGrade::A;
            a_key.cmp(&b_key).then_with(|| {
                b.composite_score
                    .partial_cmp(&a.composite_score)
                    .unwrap_or(Ordering::Equal)
            })
        })
        .map(|(index, _)| index);
    Some(better.unwrap_or(0))
}

/// Filters, ranks and picks the winner. `None` when there are no candidates.
#[must_use]
pub fn select(candidates: Vec<CandidateResponse>) -> Option<RoundSelection> {
    let ranked = rank(filter_by_grade(candidates));
    let winner = grammar_override(&ranked)?;
    RoundSelection::new(ranked, winner)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(text: &str, grade: GrammarGrade, score: f64) -> CandidateResponse {
        CandidateResponse {
            text: text.into(),
            reverted: text.into(),
            grade,
            grammar_score: grade.score(),
            composite_score: score,
        }
    }

    fn texts(candidates: &[CandidateResponse]) -> Vec<&str> {
        candidates.iter().map(|c| c.text.as_str()).collect()
    }

    #[test]
    fn rejects_winner_outside_ranked_list() {
        assert!(RoundSelection::new(Vec::new(), 0).is_none());
        let ranked = vec![candidate("a", GrammarGrade::A, 1.0)];
        assert!(RoundSelection::new(ranked.clone(), 1).is_none());
        let mut selection = RoundSelection::new(ranked, 0).unwrap();
        assert!(selection.runner_up().is_none());
        assert!(!selection.promote_runner_up());
        assert_eq!(selection.winner().text, "a");
    }

    #[test]
    fn keeps_only_a_when_present() {
        let kept = filter_by_grade(vec![
            candidate("a", GrammarGrade::A, 1.0),
            candidate("b", GrammarGrade::B, 3.0),
            candidate("c", GrammarGrade::C, 5.0),
        ]);
        assert_eq!(texts(&kept), vec!["a"]);
    }

    #[test]
    fn keeps_only_b_without_a() {
        let kept = filter_by_grade(vec![
            candidate("b1", GrammarGrade::B, 1.0),
            candidate("b2", GrammarGrade::B, 2.0),
            candidate("c", GrammarGrade::C, 5.0),
        ]);
        assert_eq!(texts(&kept), vec!["b1", "b2"]);
    }

    #[test]
    fn keeps_everything_when_all_c() {
        let kept = filter_by_grade(vec![
            candidate("c1", GrammarGrade::C, 1.0),
            candidate("c2", GrammarGrade::C, 2.0),
        ]);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn ranking_is_stable_and_descending() {
        let ranked = rank(vec![
            candidate("low", GrammarGrade::A, 0.5),
            candidate("tie1", GrammarGrade::A, 2.0),
            candidate("tie2", GrammarGrade::A, 2.0),
        ]);
        assert_eq!(texts(&ranked), vec!["tie1", "tie2", "low"]);
    }

    #[test]
    fn top_c_candidate_loses_to_b() {
        let selection = select(vec![
            candidate("c", GrammarGrade::C, 9.0),
            candidate("b", GrammarGrade::B, 0.1),
        ])
        .unwrap();
        assert_eq!(selection.winner().text, "b");
    }

    #[test]
    fn override_prefers_a_over_higher_scored_b() {
        let ranked = vec![
            candidate("c", GrammarGrade::C, 9.0),
            candidate("b", GrammarGrade::B, 5.0),
            candidate("a", GrammarGrade::A, 1.0),
        ];
        assert_eq!(grammar_override(&ranked), Some(2));
        let ranked = vec![
            candidate("c", GrammarGrade::C, 9.0),
            candidate("b1", GrammarGrade::B, 1.0),
            candidate("b2", GrammarGrade::B, 4.0),
        ];
        assert_eq!(grammar_override(&ranked), Some(2));
    }

    #[test]
    fn empty_round_has_no_winner() {
        assert!(select(Vec::new()).is_none());
    }
}
