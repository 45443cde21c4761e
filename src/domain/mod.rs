//! Core data model: tools, test cases, candidates and their evaluations.
//! These are plain value objects, never mutated in place once constructed.

mod candidate;
mod test_case;
mod tool;

pub use candidate::{Candidate, CandidateId, EvalResult, EvaluatedCandidate};
pub use test_case::TestCase;
pub use tool::Tool;
