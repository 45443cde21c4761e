//! Core abstractions: the LLM gateway trait and the wire types it shares
//! with every backend, kept separate from concrete implementations (see
//! `crate::providers`).

pub mod gateway;
pub mod types;

pub use gateway::{LlmGateway, ToolSelection};
pub use types::{FunctionDefinition, GenerationOptions, Message, Role, ToolDefinition};
