//! Recognized scheduler configuration, its defaults, and the validation
//! that turns out-of-range values into a `ConfigError` before the loop
//! starts rather than partway through a run.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::gepa::pareto::SelectionPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum SelectionPolicyConfig {
    Dominance,
    GlobalScore,
}

impl From<SelectionPolicyConfig> for SelectionPolicy {
    fn from(value: SelectionPolicyConfig) -> Self {
        match value {
            SelectionPolicyConfig::Dominance => SelectionPolicy::Dominance,
            SelectionPolicyConfig::GlobalScore => SelectionPolicy::GlobalScore,
        }
    }
}

/// Scheduler configuration, one instance per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// LLM call budget counted in test-case-equivalents. Mutation calls do
    /// not count.
    pub max_evaluations: u64,
    /// Capped at `|test_cases|` at run start.
    pub subsample_size: usize,
    /// Semaphore width gating every gateway call.
    pub max_concurrent_evaluations: usize,
    /// Model passed through to `tool_selection`.
    pub evaluation_model: String,
    /// Model passed through to `text_completion`.
    pub generation_model: String,
    /// Acceptance floor and selection filter.
    pub min_accuracy: f64,
    /// Global-score mixing weight between accuracy and conciseness.
    pub accuracy_weight: f64,
    /// Exploration knob, clamped to `>= 0.1` at use.
    pub selection_temperature: f64,
    pub selection_policy: SelectionPolicyConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            max_evaluations: 500,
            subsample_size: 5,
            max_concurrent_evaluations: 3,
            evaluation_model: "openrouter/auto".to_string(),
            generation_model: "openrouter/auto".to_string(),
            min_accuracy: 0.0,
            accuracy_weight: 0.5,
            selection_temperature: 1.0,
            selection_policy: SelectionPolicyConfig::GlobalScore,
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_evaluations < 1 {
            return Err(Error::Config("max_evaluations must be >= 1".into()));
        }
        if self.subsample_size < 1 {
            return Err(Error::Config("subsample_size must be >= 1".into()));
        }
        if self.max_concurrent_evaluations < 1 {
            return Err(Error::Config("max_concurrent_evaluations must be >= 1".into()));
        }
        if self.evaluation_model.trim().is_empty() {
            return Err(Error::Config("evaluation_model must not be empty".into()));
        }
        if self.generation_model.trim().is_empty() {
            return Err(Error::Config("generation_model must not be empty".into()));
        }
        if !(0.0..=1.0).contains(&self.min_accuracy) {
            return Err(Error::Config("min_accuracy must be within [0, 1]".into()));
        }
        if !(0.0..=1.0).contains(&self.accuracy_weight) {
            return Err(Error::Config("accuracy_weight must be within [0, 1]".into()));
        }
        if self.selection_temperature <= 0.0 {
            return Err(Error::Config("selection_temperature must be > 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(RunConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_accuracy() {
        let cfg = RunConfig { min_accuracy: 1.5, ..RunConfig::default() };
        assert!(matches!(cfg.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn rejects_zero_subsample_size() {
        let cfg = RunConfig { subsample_size: 0, ..RunConfig::default() };
        assert!(matches!(cfg.validate(), Err(Error::Config(_))));
    }
}
