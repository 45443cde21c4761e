//! Error types for the GEPA tool-description optimizer.
//!
//! The three kinds below map directly onto the error taxonomy the core is
//! specified against: `Config` is fatal and raised before the scheduler loop
//! starts, `Provider` is contained (degrades to a `null` selection or a no-op
//! mutation, never propagated out of the Evaluator/Mutator), and `Internal`
//! is fatal and marks the run failed.

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Crate-wide error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Fatal, raised before the scheduler loop: empty test set, unknown
    /// model name, invalid numeric range, unknown selection policy.
    #[error("configuration error: {0}")]
    Config(String),

    /// Non-fatal, contained: any failure surfaced by the LLM gateway
    /// (transport, protocol, malformed tool call).
    #[error("LLM provider error: {0}")]
    Provider(String),

    /// Fatal, contained: archive/Pareto/scheduler invariant violation. The
    /// run is marked failed and an `error` event is emitted.
    #[error("internal error: {0}")]
    Internal(String),

    /// HTTP transport error from the gateway's underlying client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error (reading tool/test-case files).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Prompt template rendering error from the reflective mutator.
    #[error("template error: {0}")]
    Template(#[from] handlebars::RenderError),

    /// Prompt template registration error, raised once at mutator construction.
    #[error("template registration error: {0}")]
    TemplateRegistration(#[from] Box<handlebars::TemplateError>),
}

impl Error {
    /// Whether the gateway's retry wrapper should retry this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Http(_) | Error::Provider(_))
    }

    /// Collapse any error into a `Provider` error, for the evaluator and
    /// mutator degradation paths that treat all gateway failures uniformly.
    pub fn into_provider(self) -> Error {
        match self {
            Error::Provider(_) => self,
            other => Error::Provider(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_errors_are_retryable() {
        let err = Error::Provider("timeout".into());
        assert!(err.is_retryable());
        let err = Error::Config("bad".into());
        assert!(!err.is_retryable());
    }

    #[test]
    fn into_provider_wraps_non_provider_errors() {
        let err = Error::Internal("archive corrupt".into()).into_provider();
        assert!(matches!(err, Error::Provider(_)));
    }
}
