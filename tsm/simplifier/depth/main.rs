/// Round loop producing one sentence's depth chain.
pub mod iterator;
/// Early-stop rules applied after each round.
pub mod stopping;

pub use iterator::{DepthIterator, DepthOutcome, SentenceContext};
pub use stopping::{evaluate, StopDecision, StopReason};
