//! The Genetic-Pareto search engine: archive, per-task Pareto index,
//! evaluator, reflective mutator, and the scheduler that ties them
//! together under a budget and a rate-limited concurrency gate.

pub mod archive;
pub mod config;
pub mod events;
pub mod evaluator;
pub mod mutator;
pub mod pareto;
pub mod prompts;
pub mod rate_limiter;
pub mod rng;
pub mod scheduler;

pub use archive::Archive;
pub use config::{RunConfig, SelectionPolicyConfig};
pub use events::{CandidateStatus, EvalOutcome, Event, EventEmitter, FailureContext, NoOpEmitter, RecordingEmitter};
pub use pareto::{PerTaskPareto, SelectionPolicy};
pub use rate_limiter::ConcurrencyGate;
pub use rng::RunRng;
pub use scheduler::{CancelToken, RunOutcome, RunStatus, Scheduler};
