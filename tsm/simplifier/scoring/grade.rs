use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::ScoringWeights;

static GRADE_LETTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([ABC])\b").expect("grade letter pattern"));

/// Grammaticality class of a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GrammarGrade {
    /// Fully grammatical.
    A,
    /// Minor issues.
    B,
    /// Major errors, or the grade could not be determined.
    C,
}

impl GrammarGrade {
    /// Numeric grammar score: A = 1, B = 0.5, C = 0.
    #[must_use]
    pub const fn score(self) -> f64 {
        match self {
            Self::A => 1.0,
            Self::B => 0.5,
            Self::C => 0.0,
        }
    }

    /// Additive penalty for this grade.
    #[must_use]
    pub fn penalty(self, weights: &ScoringWeights) -> f64 {
        match self {
            Self::A => 0.0,
            Self::B => weights.penalty_b,
            Self::C => weights.penalty_c,
        }
    }

    /// Single-letter label.
    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
        }
    }

    /// Parses a free-form grader reply. Anything unrecognisable is graded C.
    #[must_use]
    pub fn parse_reply(reply: &str) -> Self {
        let upper = reply.trim().to_uppercase();
        let mut answer = upper.as_str();
        if let Some(index) = answer.find("ANSWER") {
            answer = answer[index + "ANSWER".len()..].trim_start();
            answer = answer.strip_prefix(':').unwrap_or(answer).trim_start();
        }
        let letter = GRADE_LETTER
            .captures(answer)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().chars().next())
            .or_else(|| answer.chars().next());
        match letter {
            Some('A') => Self::A,
            Some('B') => Self::B,
            _ => Self::C,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_and_decorated_letters() {
        assert_eq!(GrammarGrade::parse_reply("A"), GrammarGrade::A);
        assert_eq!(GrammarGrade::parse_reply(" b\n"), GrammarGrade::B);
        assert_eq!(GrammarGrade::parse_reply("Answer: B"), GrammarGrade::B);
        assert_eq!(GrammarGrade::parse_reply("The grade is (A)."), GrammarGrade::A);
        assert_eq!(GrammarGrade::parse_reply("Bad"), GrammarGrade::B);
    }

    #[test]
    fn unparsable_replies_default_to_c() {
        assert_eq!(GrammarGrade::parse_reply(""), GrammarGrade::C);
        assert_eq!(GrammarGrade::parse_reply("Excellent"), GrammarGrade::C);
        assert_eq!(GrammarGrade::parse_reply("D"), GrammarGrade::C);
    }

    #[test]
    fn scores_and_penalties() {
        let weights = ScoringWeights::default();
        assert_eq!(GrammarGrade::B.score(), 0.5);
        assert_eq!(GrammarGrade::A.penalty(&weights), 0.0);
        assert_eq!(GrammarGrade::B.penalty(&weights), -0.3);
        assert_eq!(GrammarGrade::C.penalty(&weights), -2.0);
    }
}
