//! Concrete [`crate::core::LlmGateway`] backends.
//!
//! `openrouter` is the real HTTP-backed implementation used in production;
//! `stub` is a deterministic in-memory double used in tests and for running
//! the optimizer without network access.

pub mod openrouter;
pub mod stub;

pub use openrouter::OpenRouterGateway;
pub use stub::{FailingGateway, StubGateway};
