//! Process-wide concurrency gate bounding in-flight LLM gateway calls.
//!
//! A single semaphore of width `max_concurrent_evaluations` is shared by
//! every evaluation task the Evaluator fans out and by the Mutator's
//! reflection call, so no more than N gateway calls are ever in flight
//! regardless of how many test cases or candidates are being processed.

use std::sync::Arc;

use tokio::sync::{Semaphore, SemaphorePermit};

#[derive(Clone)]
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
}

impl ConcurrencyGate {
    pub fn new(width: usize) -> Self {
        ConcurrencyGate { semaphore: Arc::new(Semaphore::new(width.max(1))) }
    }

    /// Suspend until a slot is free, then hold it until the returned permit
    /// drops.
    pub async fn acquire(&self) -> SemaphorePermit<'_> {
        self.semaphore.acquire().await.expect("concurrency gate semaphore is never closed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn never_exceeds_configured_width() {
        let gate = ConcurrencyGate::new(2);
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_observed = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let gate = gate.clone();
                let in_flight = in_flight.clone();
                let max_observed = max_observed.clone();
                tokio::spawn(async move {
                    let _permit = gate.acquire().await;
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    max_observed.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap();
        }

        assert!(max_observed.load(Ordering::SeqCst) <= 2);
    }
}
