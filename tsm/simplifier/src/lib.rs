#![deny(clippy::all, clippy::pedantic, clippy::nursery, rust_2018_idioms)]
#![warn(missing_docs)]

//! Progressive simplification of legal text.
//!
//! A paragraph is split into sentences; every sentence is shortened over up to
//! `max_depth` rounds of LLM rewriting (scored and filtered on grammar, meaning
//! and length), the per-sentence depth chains are recombined into a fixed
//! width [`Ladder`](ladder::Ladder), and the ladder is aligned back onto the
//! original words to label how deep each word survives.

/// Runtime configuration and TOML loading.
#[path = "../config.rs"]
pub mod config;

/// Error taxonomy.
#[path = "../error.rs"]
pub mod error;

/// Structured logging and progress events.
#[path = "../telemetry.rs"]
pub mod telemetry;

/// Contracts for the generation oracle and evaluators.
#[path = "../oracle.rs"]
pub mod oracle;

/// Sentence length to generation parameters.
#[path = "../schedule.rs"]
pub mod schedule;

/// Candidate grading, composite scoring and winner selection.
#[path = "../scoring/main.rs"]
pub mod scoring;

/// Paragraph to sentence decomposition.
#[path = "../splitter.rs"]
pub mod splitter;

/// Per-sentence ephemeral state.
#[path = "../scratch.rs"]
pub mod scratch;

/// Depth chains and their recombination into ladders.
#[path = "../ladder.rs"]
pub mod ladder;

/// Per-sentence iterative shortening.
#[path = "../depth/main.rs"]
pub mod depth;

/// Concurrent paragraph orchestration.
#[path = "../orchestrator.rs"]
pub mod orchestrator;

/// Word importance alignment.
#[path = "../importance.rs"]
pub mod importance;

/// CEFR vocabulary levels.
#[path = "../cefr.rs"]
pub mod cefr;

/// Concrete collaborators (HTTP oracle, lexical evaluator, ...).
#[path = "../adapters/main.rs"]
pub mod adapters;

/// End-to-end text analysis.
#[path = "../analysis.rs"]
pub mod analysis;

pub use analysis::{AnalysisReport, ImportanceToken, TextAnalyzer};
pub use cefr::{CefrLevel, DifficultyClassifier, ZipfDifficultyClassifier};
pub use config::SimplifierConfig;
pub use error::{OracleError, SimplifyError};
pub use importance::{align_importance, align_ladder, WordImportance};
pub use ladder::{DepthChain, Ladder};
pub use oracle::{Collaborators, Credentials, GenerationOracle, PromptVariant};
pub use orchestrator::{Simplifier, SimplifierBuilder};
pub use splitter::split_sentences;
pub use telemetry::{SimplifierTelemetry, SimplifierTelemetryBuilder};
