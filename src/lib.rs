//! # gepa-tool-optimizer
//!
//! A Genetic-Pareto (GEPA) search engine that rewrites the natural-language
//! descriptions attached to a fixed set of LLM tools so that a model selects
//! the correct tool more often while keeping descriptions short. Mutation is
//! itself an LLM call that reflects on a failing query (or, once a
//! candidate has no failures left, on shortening a description).
//!
//! ## Architecture
//!
//! - **Core abstractions** (`core`): the LLM gateway trait and the wire
//!   types every backend shares.
//! - **Domain model** (`domain`): tools, test cases, candidates, and their
//!   evaluation results — plain value objects, immutable once constructed.
//! - **Providers** (`providers`): concrete gateway backends — an
//!   OpenRouter-compatible HTTP client, and a deterministic in-memory stub
//!   for tests and offline runs.
//! - **GEPA** (`gepa`): the search engine itself — archive, per-task Pareto
//!   index, evaluator, reflective mutator, rate limiter, and the scheduler
//!   that drives the main loop.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gepa_tool_optimizer::gepa::{CancelToken, NoOpEmitter, RunConfig, Scheduler};
//! use gepa_tool_optimizer::providers::StubGateway;
//! use gepa_tool_optimizer::domain::{TestCase, Tool};
//! use gepa_tool_optimizer::Result;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let tools = vec![Tool {
//!         id: "t1".into(),
//!         name: "weather".into(),
//!         description: "x".into(),
//!         input_schema: serde_json::json!({}),
//!         server_id: "srv".into(),
//!     }];
//!     let test_cases = vec![TestCase {
//!         id: "q1".into(),
//!         query: "what is the temperature".into(),
//!         expected_tool_name: "weather".into(),
//!     }];
//!     let gateway = StubGateway::new(vec![("temperature", "weather")]);
//!     let scheduler = Scheduler::new(RunConfig::default());
//!     let outcome = scheduler
//!         .run(tools, test_cases, &gateway, &NoOpEmitter, CancelToken::new(), 0)
//!         .await?;
//!     println!("archive size: {}", outcome.archive.size());
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domain;
pub mod error;
pub mod gepa;
pub mod providers;

pub use error::{Error, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const NAME: &str = env!("CARGO_PKG_NAME");
