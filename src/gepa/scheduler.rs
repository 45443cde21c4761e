//! Main optimization loop: select parent, mutate, subsample-filter,
//! full-evaluate, archive, emit progress — tying every other component
//! together under a budget and a cooperative cancellation signal.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::core::gateway::LlmGateway;
use crate::domain::{Candidate, TestCase, Tool};
use crate::error::{Error, Result};
use crate::gepa::archive::Archive;
use crate::gepa::config::RunConfig;
use crate::gepa::evaluator::{evaluate_full, evaluate_subsample_accuracy};
use crate::gepa::events::{CandidateStatus, Event, EventEmitter};
use crate::gepa::mutator::mutate;
use crate::gepa::pareto::{PerTaskPareto, SelectionPolicy};
use crate::gepa::rate_limiter::ConcurrencyGate;
use crate::gepa::rng::RunRng;

const ACCEPTANCE_EPSILON: f64 = 1e-3;

/// Cooperative cancellation flag, checked at iteration boundaries and
/// between subsample and full evaluation. In-flight LLM calls are allowed
/// to finish; nothing is torn down mid-call.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    Failed,
}

pub struct RunOutcome {
    pub run_id: Uuid,
    pub status: RunStatus,
    pub archive: Archive,
    pub budget_consumed: u64,
    pub accepted_count: u64,
    pub rejected_count: u64,
}

pub struct Scheduler {
    config: RunConfig,
}

impl Scheduler {
    pub fn new(config: RunConfig) -> Self {
        Scheduler { config }
    }

    /// Run optimization to completion: budget exhaustion, no eligible
    /// parent, or cancellation. Only a missing configuration precondition
    /// (an empty test set, or an invalid config value) returns `Err`;
    /// everything else surfaces through the returned `RunOutcome` and the
    /// emitted event stream.
    pub async fn run(
        &self,
        tools: Vec<Tool>,
        test_cases: Vec<TestCase>,
        gateway: &dyn LlmGateway,
        emitter: &dyn EventEmitter,
        cancel: CancelToken,
        seed: u64,
    ) -> Result<RunOutcome> {
        if test_cases.is_empty() {
            return Err(Error::Config("test_cases must not be empty".into()));
        }
        self.config.validate()?;

        let run_id = Uuid::new_v4();
        let mut rng = RunRng::from_seed(seed);
        let gate = ConcurrencyGate::new(self.config.max_concurrent_evaluations);
        let mut archive = Archive::new();
        let mut pareto = PerTaskPareto::new();
        let mut budget_consumed: u64 = 0;
        let mut accepted_count: u64 = 0;
        let mut rejected_count: u64 = 0;
        let mut iteration: u64 = 0;
        let mut status = RunStatus::Completed;
        let policy: SelectionPolicy = self.config.selection_policy.into();

        emitter.emit(Event::OptimizationStart { run_id });

        let baseline = Candidate::baseline(tools);
        let evaluated_baseline =
            evaluate_full(&baseline, &test_cases, &self.config.evaluation_model, gateway, &gate, emitter).await;
        budget_consumed += test_cases.len() as u64;
        let baseline_id = evaluated_baseline.id();
        archive.add(evaluated_baseline.clone(), None);
        pareto.update(&evaluated_baseline, &archive);
        accepted_count += 1;
        emitter.emit(Event::CandidateDone {
            candidate_id: baseline_id,
            iteration: 0,
            tool_descriptions: tool_descriptions(&evaluated_baseline.candidate),
            accuracy: evaluated_baseline.accuracy,
            avg_length: evaluated_baseline.avg_description_length,
            is_pareto: pareto.is_pareto(baseline_id),
            status: CandidateStatus::Accepted,
            rejection_reason: None,
            parent_id: None,
        });
        emitter.emit(Event::ArchiveUpdate {
            archive_size: archive.size(),
            budget_consumed,
            accepted: accepted_count,
            rejected: rejected_count,
        });

        'main: while budget_consumed < self.config.max_evaluations && !cancel.is_cancelled() {
            iteration += 1;
            emitter.emit(Event::IterationStart { iteration, budget_consumed });

            let Some(parent_id) = pareto.select_parent(
                policy,
                self.config.selection_temperature,
                self.config.accuracy_weight,
                self.config.min_accuracy,
                &archive,
                &mut rng,
            ) else {
                break;
            };

            let parent = match archive.get(parent_id) {
                Some(p) => p.clone(),
                None => {
                    let message = format!("selected parent {parent_id} is missing from the archive");
                    info!(%message, "internal error, failing run");
                    emitter.emit(Event::Error { message });
                    status = RunStatus::Failed;
                    break 'main;
                }
            };
            let global_score = pareto.global_score(&parent, self.config.accuracy_weight, &archive);
            emitter.emit(Event::ParentSelected { candidate_id: parent_id, iteration, global_score });

            emitter.emit(Event::MutationStart { candidate_id: parent_id });
            let offspring = mutate(&parent, &self.config.generation_model, gateway, emitter, &mut rng).await;

            let subsample_size = self.config.subsample_size.min(test_cases.len());
            let subsample: Vec<TestCase> =
                rng.sample_without_replacement(&test_cases, subsample_size).into_iter().cloned().collect();
            let subsample_ids: Vec<String> = subsample.iter().map(|t| t.id.clone()).collect();
            let offspring_score = evaluate_subsample_accuracy(
                &offspring,
                &subsample,
                &self.config.evaluation_model,
                gateway,
                &gate,
                emitter,
            )
            .await;
            let parent_score = parent.accuracy_on(&subsample_ids);
            budget_consumed += subsample.len() as u64;

            emitter.emit(Event::SubsampleEval {
                candidate_id: offspring.id,
                iteration,
                offspring_score,
                parent_score,
                subsample_size: subsample.len(),
            });

            let rejection_reason = acceptance_rejection_reason(offspring_score, parent_score, self.config.min_accuracy);

            if let Some(reason) = rejection_reason {
                rejected_count += 1;
                emitter.emit(Event::CandidateDone {
                    candidate_id: offspring.id,
                    iteration,
                    tool_descriptions: tool_descriptions(&offspring),
                    accuracy: offspring_score,
                    avg_length: offspring.avg_description_length(),
                    is_pareto: false,
                    status: CandidateStatus::Rejected,
                    rejection_reason: Some(reason.clone()),
                    parent_id: Some(parent_id),
                });
                emitter.emit(Event::OffspringRejected { candidate_id: offspring.id, reason, iteration });
                emitter.emit(Event::ArchiveUpdate {
                    archive_size: archive.size(),
                    budget_consumed,
                    accepted: accepted_count,
                    rejected: rejected_count,
                });
                emitter.emit(Event::IterationDone { iteration, budget_consumed, archive_size: archive.size() });
                continue;
            }

            if cancel.is_cancelled() {
                break;
            }

            let evaluated_offspring =
                evaluate_full(&offspring, &test_cases, &self.config.evaluation_model, gateway, &gate, emitter).await;
            budget_consumed += test_cases.len() as u64;
            let offspring_id = evaluated_offspring.id();
            let archive_index = archive.add(evaluated_offspring.clone(), Some(parent_id));
            pareto.update(&evaluated_offspring, &archive);
            accepted_count += 1;

            emitter.emit(Event::CandidateDone {
                candidate_id: offspring_id,
                iteration,
                tool_descriptions: tool_descriptions(&evaluated_offspring.candidate),
                accuracy: evaluated_offspring.accuracy,
                avg_length: evaluated_offspring.avg_description_length,
                is_pareto: pareto.is_pareto(offspring_id),
                status: CandidateStatus::Accepted,
                rejection_reason: None,
                parent_id: Some(parent_id),
            });
            emitter.emit(Event::OffspringAccepted {
                candidate_id: offspring_id,
                accuracy: evaluated_offspring.accuracy,
                avg_length: evaluated_offspring.avg_description_length,
                archive_index,
                parent_id,
                iteration,
            });
            emitter.emit(Event::ArchiveUpdate {
                archive_size: archive.size(),
                budget_consumed,
                accepted: accepted_count,
                rejected: rejected_count,
            });
            emitter.emit(Event::IterationDone { iteration, budget_consumed, archive_size: archive.size() });
        }

        emitter.emit(Event::OptimizationComplete {
            run_id,
            archive_size: archive.size(),
            budget_consumed,
            accepted: accepted_count,
            rejected: rejected_count,
        });

        Ok(RunOutcome { run_id, status, archive, budget_consumed, accepted_count, rejected_count })
    }
}

fn tool_descriptions(candidate: &Candidate) -> Vec<(String, String)> {
    candidate.tools.iter().map(|t| (t.name.clone(), t.description.clone())).collect()
}

/// `None` means accept (a tie or an improvement both accept); `Some(reason)`
/// means reject, either because the offspring regressed past the parent's
/// subsample score or because it fell under the configured accuracy floor.
fn acceptance_rejection_reason(offspring_score: f64, parent_score: f64, min_accuracy: f64) -> Option<String> {
    if offspring_score < parent_score - ACCEPTANCE_EPSILON {
        Some(format!("offspring subsample accuracy {offspring_score:.4} fell below parent's {parent_score:.4}"))
    } else if offspring_score < min_accuracy {
        Some(format!(
            "offspring subsample accuracy {offspring_score:.4} is below the minimum accuracy floor {min_accuracy:.4}"
        ))
    } else {
        None
    }
}
