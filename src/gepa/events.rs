//! Progress events the scheduler emits as a run proceeds, and the sink
//! capability it emits them through. Event names and payload keys are a
//! stable contract: a caller's live UI and its durable replay log both
//! depend on not having to special-case fields across versions.

use serde::{Deserialize, Serialize};

use crate::domain::CandidateId;

/// Whether a candidate's evaluation resulted in acceptance or rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateStatus {
    Accepted,
    Rejected,
}

/// Context attached to `reflection_start` when the mutator is in the
/// failure-directed mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureContext {
    pub query: String,
    pub expected_tool_name: String,
    pub selected_tool_name: Option<String>,
}

/// Outcome of a single test-case evaluation, as carried on `evaluation`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalOutcome {
    pub correct: bool,
    pub selected: Option<String>,
    pub expected: String,
}

/// One observable step of an optimization run. Variant names and fields
/// mirror the documented progress-event taxonomy verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    OptimizationStart {
        run_id: uuid::Uuid,
    },
    IterationStart {
        iteration: u64,
        budget_consumed: u64,
    },
    ParentSelected {
        candidate_id: CandidateId,
        iteration: u64,
        global_score: f64,
    },
    MutationStart {
        candidate_id: CandidateId,
    },
    ReflectionStart {
        candidate_id: CandidateId,
        tool: String,
        failure: Option<FailureContext>,
    },
    ReflectionDone {
        candidate_id: CandidateId,
        tool: String,
        old_desc: String,
        new_desc: String,
    },
    Evaluation {
        candidate_id: CandidateId,
        test_case_id: String,
        query: String,
        result: EvalOutcome,
    },
    SubsampleEval {
        candidate_id: CandidateId,
        iteration: u64,
        offspring_score: f64,
        parent_score: f64,
        subsample_size: usize,
    },
    CandidateDone {
        candidate_id: CandidateId,
        iteration: u64,
        tool_descriptions: Vec<(String, String)>,
        accuracy: f64,
        avg_length: f64,
        is_pareto: bool,
        status: CandidateStatus,
        rejection_reason: Option<String>,
        parent_id: Option<CandidateId>,
    },
    OffspringAccepted {
        candidate_id: CandidateId,
        accuracy: f64,
        avg_length: f64,
        archive_index: usize,
        parent_id: CandidateId,
        iteration: u64,
    },
    OffspringRejected {
        candidate_id: CandidateId,
        reason: String,
        iteration: u64,
    },
    ArchiveUpdate {
        archive_size: usize,
        budget_consumed: u64,
        accepted: u64,
        rejected: u64,
    },
    IterationDone {
        iteration: u64,
        budget_consumed: u64,
        archive_size: usize,
    },
    OptimizationComplete {
        run_id: uuid::Uuid,
        archive_size: usize,
        budget_consumed: u64,
        accepted: u64,
        rejected: u64,
    },
    Error {
        message: String,
    },
}

/// Sink capability for progress events. Implementations must not block; the
/// scheduler never persists events itself, it only hands them off.
pub trait EventEmitter: Send + Sync {
    fn emit(&self, event: Event);
}

/// Discards every event. Used where a caller has no interest in progress
/// (tests, one-shot CLI runs without `--verbose`).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpEmitter;

impl EventEmitter for NoOpEmitter {
    fn emit(&self, _event: Event) {}
}

/// Collects every emitted event in order, for assertions in tests and for
/// the CLI's own replay-as-fold log.
#[derive(Default)]
pub struct RecordingEmitter {
    events: std::sync::Mutex<Vec<Event>>,
}

impl RecordingEmitter {
    pub fn new() -> Self {
        RecordingEmitter::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().expect("recording emitter mutex poisoned").clone()
    }
}

impl EventEmitter for RecordingEmitter {
    fn emit(&self, event: Event) {
        self.events.lock().expect("recording emitter mutex poisoned").push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_emitter_preserves_order() {
        let emitter = RecordingEmitter::new();
        emitter.emit(Event::IterationStart { iteration: 1, budget_consumed: 0 });
        emitter.emit(Event::IterationDone { iteration: 1, budget_consumed: 5, archive_size: 1 });
        let events = emitter.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Event::IterationStart { .. }));
        assert!(matches!(events[1], Event::IterationDone { .. }));
    }

    #[test]
    fn noop_emitter_drops_everything() {
        NoOpEmitter.emit(Event::Error { message: "ignored".into() });
    }
}
