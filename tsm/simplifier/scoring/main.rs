/// Grammar grades and reply parsing.
pub mod grade;
/// Composite score arithmetic.
pub mod scorer;
/// Grade filtering, ranking and winner selection.
pub mod selection;

pub use grade::GrammarGrade;
pub use scorer::{composite_score, length_reduction, CandidateResponse, SubScores};
pub use selection::{filter_by_grade, rank, select, RoundSelection};
