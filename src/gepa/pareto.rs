//! Per-task Pareto front bookkeeping and parent selection.
//!
//! One front per test case: the set of archived candidates not dominated by
//! any other archived candidate on that task. A candidate's dominance count
//! (how many task fronts it sits on) drives the default selection policy.

use std::collections::{HashMap, HashSet};

use crate::domain::{CandidateId, EvaluatedCandidate};
use crate::gepa::archive::Archive;
use crate::gepa::rng::RunRng;

/// Which parent-selection distribution a run uses. Fixed for the lifetime
/// of the run at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPolicy {
    /// Sample proportionally to `exp(dominance_count / T)`.
    Dominance,
    /// Sample proportionally to `exp(score / T)` where score mixes accuracy
    /// and conciseness by `accuracy_weight`.
    GlobalScore,
}

/// Candidate A dominates B on task `t` iff A is correct and B is not, or
/// both are correct and A's whole-candidate average description length is
/// strictly shorter. Ties in either direction do not dominate.
fn dominates(a: &EvaluatedCandidate, b: &EvaluatedCandidate, test_case_id: &str) -> bool {
    let (Some(ra), Some(rb)) = (a.result_for(test_case_id), b.result_for(test_case_id)) else {
        return false;
    };
    ra.correct && (!rb.correct || a.avg_description_length < b.avg_description_length)
}

#[derive(Default)]
pub struct PerTaskPareto {
    fronts: HashMap<String, HashSet<CandidateId>>,
    dominance_count: HashMap<CandidateId, u64>,
}

impl PerTaskPareto {
    pub fn new() -> Self {
        PerTaskPareto::default()
    }

    /// Update every task front the new candidate was evaluated on. Task
    /// update order is irrelevant to the final state since fronts are
    /// independent of each other.
    pub fn update(&mut self, new_candidate: &EvaluatedCandidate, archive: &Archive) {
        let new_id = new_candidate.id();
        for result in &new_candidate.evaluations {
            let task = result.test_case_id.as_str();
            let front = self.fronts.entry(task.to_string()).or_default();

            let dominated_by_existing = front
                .iter()
                .filter_map(|id| archive.get(*id))
                .any(|existing| dominates(existing, new_candidate, task));
            if dominated_by_existing {
                continue;
            }

            let dominated: Vec<CandidateId> = front
                .iter()
                .copied()
                .filter(|id| archive.get(*id).is_some_and(|existing| dominates(new_candidate, existing, task)))
                .collect();
            for id in &dominated {
                front.remove(id);
                if let Some(count) = self.dominance_count.get_mut(id) {
                    *count -= 1;
                }
            }

            if front.insert(new_id) {
                *self.dominance_count.entry(new_id).or_insert(0) += 1;
            }
        }
    }

    pub fn dominance_count(&self, id: CandidateId) -> u64 {
        self.dominance_count.get(&id).copied().unwrap_or(0)
    }

    /// Whether `id` currently sits on at least one task front.
    pub fn is_pareto(&self, id: CandidateId) -> bool {
        self.dominance_count(id) > 0
    }

    pub fn front(&self, test_case_id: &str) -> Option<&HashSet<CandidateId>> {
        self.fronts.get(test_case_id)
    }

    /// Select a parent under the configured policy. Returns `None` only
    /// when the Archive itself is empty.
    pub fn select_parent(
        &self,
        policy: SelectionPolicy,
        temperature: f64,
        accuracy_weight: f64,
        min_accuracy: f64,
        archive: &Archive,
        rng: &mut RunRng,
    ) -> Option<CandidateId> {
        let t = temperature.max(0.1);
        match policy {
            SelectionPolicy::Dominance => self.select_dominance_weighted(t, archive, rng),
            SelectionPolicy::GlobalScore => self.select_global_score_weighted(t, accuracy_weight, min_accuracy, archive, rng),
        }
    }

    fn select_dominance_weighted(&self, t: f64, archive: &Archive, rng: &mut RunRng) -> Option<CandidateId> {
        let weighted: Vec<(CandidateId, f64)> = self
            .dominance_count
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(id, count)| (*id, (*count as f64 / t).exp()))
            .collect();

        if weighted.is_empty() {
            return uniform_over_archive(archive, rng);
        }

        let weights: Vec<f64> = weighted.iter().map(|(_, w)| *w).collect();
        rng.weighted_pick(&weights).map(|idx| weighted[idx].0)
    }

    fn select_global_score_weighted(
        &self,
        t: f64,
        accuracy_weight: f64,
        min_accuracy: f64,
        archive: &Archive,
        rng: &mut RunRng,
    ) -> Option<CandidateId> {
        let all = archive.all();
        if all.is_empty() {
            return None;
        }
        let max_avg_len = all.iter().map(|c| c.avg_description_length).fold(0.0_f64, f64::max);

        let eligible: Vec<&EvaluatedCandidate> = all.iter().copied().filter(|c| c.accuracy >= min_accuracy).collect();
        let pool = if eligible.is_empty() { all } else { eligible };

        let scores: Vec<f64> = pool
            .iter()
            .map(|c| {
                let conciseness = if max_avg_len > 0.0 {
                    (1.0 - c.avg_description_length / max_avg_len).clamp(0.0, 1.0)
                } else {
                    1.0
                };
                let score = c.accuracy * accuracy_weight + conciseness * (1.0 - accuracy_weight);
                (score / t).exp()
            })
            .collect();

        rng.weighted_pick(&scores).map(|idx| pool[idx].id())
    }

    /// Global score for a specific candidate, used only for event payloads.
    pub fn global_score(&self, candidate: &EvaluatedCandidate, accuracy_weight: f64, archive: &Archive) -> f64 {
        let max_avg_len = archive.all().iter().map(|c| c.avg_description_length).fold(0.0_f64, f64::max);
        let conciseness = if max_avg_len > 0.0 {
            (1.0 - candidate.avg_description_length / max_avg_len).clamp(0.0, 1.0)
        } else {
            1.0
        };
        candidate.accuracy * accuracy_weight + conciseness * (1.0 - accuracy_weight)
    }
}

fn uniform_over_archive(archive: &Archive, rng: &mut RunRng) -> Option<CandidateId> {
    let all = archive.all();
    rng.pick(&all).map(|c| c.id())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Candidate, EvalResult, Tool};

    fn tool(name: &str, len: usize) -> Tool {
        Tool {
            id: format!("id-{name}"),
            name: name.to_string(),
            description: "x".repeat(len),
            input_schema: serde_json::json!({}),
            server_id: "srv".into(),
        }
    }

    fn candidate_with(name: &str, len: usize, results: Vec<(&str, bool)>) -> EvaluatedCandidate {
        let c = Candidate::baseline(vec![tool(name, len)]);
        let evals = results
            .into_iter()
            .map(|(task, correct)| {
                EvalResult::new(task, "q", "weather", if correct { Some("weather".into()) } else { None })
            })
            .collect();
        EvaluatedCandidate::new(c, evals)
    }

    #[test]
    fn pareto_coexistence_scenario() {
        let mut archive = Archive::new();
        let mut pareto = PerTaskPareto::new();

        let a = candidate_with("a", 100, vec![("t1", true), ("t2", true), ("t3", true), ("t4", false)]);
        let a_id = a.id();
        archive.add(a.clone(), None);
        pareto.update(&a, &archive);

        let b = candidate_with("b", 50, vec![("t1", true), ("t2", true), ("t3", false), ("t4", true)]);
        let b_id = b.id();
        archive.add(b.clone(), Some(a_id));
        pareto.update(&b, &archive);

        assert_eq!(pareto.front("t3").unwrap(), &HashSet::from([a_id]));
        assert_eq!(pareto.front("t4").unwrap(), &HashSet::from([b_id]));
        assert_eq!(pareto.front("t1").unwrap(), &HashSet::from([b_id]));
        assert_eq!(pareto.front("t2").unwrap(), &HashSet::from([b_id]));
        assert_eq!(pareto.dominance_count(a_id), 1);
        assert_eq!(pareto.dominance_count(b_id), 3);
    }

    #[test]
    fn reinserting_same_candidate_is_idempotent() {
        let mut archive = Archive::new();
        let mut pareto = PerTaskPareto::new();
        let a = candidate_with("a", 10, vec![("t1", true)]);
        archive.add(a.clone(), None);
        pareto.update(&a, &archive);
        let before = pareto.dominance_count(a.id());
        pareto.update(&a, &archive);
        assert_eq!(pareto.dominance_count(a.id()), before);
    }

    #[test]
    fn dominance_weighted_falls_back_to_uniform_before_any_insertion() {
        let mut archive = Archive::new();
        let pareto = PerTaskPareto::new();
        let a = candidate_with("a", 10, vec![("t1", true)]);
        archive.add(a.clone(), None);
        let mut rng = RunRng::from_seed(1);
        let picked = pareto.select_parent(SelectionPolicy::Dominance, 1.0, 0.5, 0.0, &archive, &mut rng);
        assert_eq!(picked, Some(a.id()));
    }

    #[test]
    fn global_score_weighted_prefers_shorter_and_more_accurate() {
        let mut archive = Archive::new();
        let mut pareto = PerTaskPareto::new();
        let a = candidate_with("a", 100, vec![("t1", true)]);
        archive.add(a.clone(), None);
        pareto.update(&a, &archive);
        let b = candidate_with("b", 10, vec![("t1", true)]);
        archive.add(b.clone(), Some(a.id()));
        pareto.update(&b, &archive);

        let mut rng = RunRng::from_seed(2);
        let mut b_wins = 0;
        for _ in 0..200 {
            if pareto.select_parent(SelectionPolicy::GlobalScore, 0.3, 0.5, 0.0, &archive, &mut rng) == Some(b.id()) {
                b_wins += 1;
            }
        }
        assert!(b_wins > 100);
    }
}
