//! Unbounded, append-only store of evaluated candidates with lineage.
//!
//! Parent pointers form a forest, stored as a flat `child -> parent`
//! mapping; no cyclic structure is needed. Iteration order is insertion
//! order, which combined with each candidate's random id makes a run
//! trivially replayable.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::domain::{CandidateId, EvaluatedCandidate};

struct Entry {
    candidate: EvaluatedCandidate,
    parent_id: Option<CandidateId>,
    inserted_at: DateTime<Utc>,
}

/// Single-writer store the scheduler owns exclusively for the run.
#[derive(Default)]
pub struct Archive {
    order: Vec<CandidateId>,
    entries: HashMap<CandidateId, Entry>,
}

impl Archive {
    pub fn new() -> Self {
        Archive::default()
    }

    /// Append a candidate. Never rejects; deduplication is the caller's
    /// responsibility — the scheduler never adds the same candidate id
    /// twice by construction. Returns the candidate's insertion index.
    pub fn add(&mut self, candidate: EvaluatedCandidate, parent_id: Option<CandidateId>) -> usize {
        let id = candidate.id();
        let index = self.order.len();
        self.order.push(id);
        self.entries.insert(id, Entry { candidate, parent_id, inserted_at: Utc::now() });
        index
    }

    pub fn get(&self, id: CandidateId) -> Option<&EvaluatedCandidate> {
        self.entries.get(&id).map(|e| &e.candidate)
    }

    pub fn parent_of(&self, id: CandidateId) -> Option<CandidateId> {
        self.entries.get(&id).and_then(|e| e.parent_id)
    }

    pub fn inserted_at(&self, id: CandidateId) -> Option<DateTime<Utc>> {
        self.entries.get(&id).map(|e| e.inserted_at)
    }

    pub fn size(&self) -> usize {
        self.order.len()
    }

    /// All candidates in insertion order.
    pub fn all(&self) -> Vec<&EvaluatedCandidate> {
        self.order.iter().filter_map(|id| self.entries.get(id)).map(|e| &e.candidate).collect()
    }

    pub fn contains(&self, id: CandidateId) -> bool {
        self.entries.contains_key(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Candidate, EvalResult, Tool};

    fn tool(name: &str) -> Tool {
        Tool {
            id: format!("id-{name}"),
            name: name.to_string(),
            description: "d".into(),
            input_schema: serde_json::json!({}),
            server_id: "srv".into(),
        }
    }

    fn evaluated(name: &str) -> EvaluatedCandidate {
        let c = Candidate::baseline(vec![tool(name)]);
        EvaluatedCandidate::new(c, vec![EvalResult::new("t1", "q", name, Some(name.to_string()))])
    }

    #[test]
    fn add_assigns_sequential_indices_and_preserves_order() {
        let mut archive = Archive::new();
        let a = evaluated("a");
        let a_id = a.id();
        let b = evaluated("b");
        let b_id = b.id();
        assert_eq!(archive.add(a, None), 0);
        assert_eq!(archive.add(b, Some(a_id)), 1);
        assert_eq!(archive.size(), 2);
        assert_eq!(archive.parent_of(b_id), Some(a_id));
        assert_eq!(archive.parent_of(a_id), None);
        let ids: Vec<_> = archive.all().iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec![a_id, b_id]);
    }

    #[test]
    fn get_returns_none_for_unknown_id() {
        let archive = Archive::new();
        assert!(archive.get(CandidateId::new()).is_none());
    }
}
