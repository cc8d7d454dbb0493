//! Deferred release of superseded resources.

use std::time::{Duration, Instant};

pub const DEFAULT_GRACE: Duration = Duration::from_millis(500);

struct PendingDisposal<T> {
    resource: T,
    due: Instant,
}

/// Holds resources until their grace period has passed.
///
/// The disposer never releases anything itself; [`poll`](Self::poll) hands
/// due resources back to the owner, which releases each one exactly once.
pub struct DeferredDisposer<T> {
    pending: Vec<PendingDisposal<T>>,
}

impl<T> DeferredDisposer<T> {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    /// Queue `resource` for release at `now + delay`. `None` is a no-op.
    pub fn schedule(&mut self, resource: Option<T>, delay: Duration, now: Instant) {
        if let Some(resource) = resource {
            self.pending.push(PendingDisposal {
                resource,
                due: now + delay,
            });
        }
    }

    /// Remove and return every resource whose due instant has passed.
    pub fn poll(&mut self, now: Instant) -> Vec<T> {
        if !self.pending.iter().any(|p| p.due <= now) {
            return Vec::new();
        }

        let (due, waiting): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.pending).into_iter().partition(|p| p.due <= now);
        self.pending = waiting;
        due.into_iter().map(|p| p.resource).collect()
    }

    /// Teardown: return everything still pending without releasing it.
    pub fn cancel_all(&mut self) -> Vec<T> {
        self.pending.drain(..).map(|p| p.resource).collect()
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.pending.iter().map(|p| p.due).min()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<T> Default for DeferredDisposer<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_released_after_grace_exactly_once() {
        let t0 = Instant::now();
        let mut disposer = DeferredDisposer::new();
        disposer.schedule(Some("gen1"), ms(500), t0);

        assert!(disposer.poll(t0 + ms(499)).is_empty());
        assert_eq!(disposer.poll(t0 + ms(500)), vec!["gen1"]);
        assert!(disposer.poll(t0 + ms(5000)).is_empty());
        assert!(disposer.is_empty());
    }

    #[test]
    fn test_schedule_none_is_noop() {
        let mut disposer: DeferredDisposer<u32> = DeferredDisposer::new();
        disposer.schedule(None, ms(500), Instant::now());
        assert!(disposer.is_empty());
        assert_eq!(disposer.next_due(), None);
    }

    #[test]
    fn test_independent_due_times() {
        let t0 = Instant::now();
        let mut disposer = DeferredDisposer::new();
        disposer.schedule(Some(1), ms(500), t0);
        disposer.schedule(Some(2), ms(500), t0 + ms(200));
        assert_eq!(disposer.next_due(), Some(t0 + ms(500)));

        assert_eq!(disposer.poll(t0 + ms(600)), vec![1]);
        assert_eq!(disposer.len(), 1);
        assert_eq!(disposer.poll(t0 + ms(700)), vec![2]);
    }

    #[test]
    fn test_cancel_all_returns_unreleased() {
        let t0 = Instant::now();
        let mut disposer = DeferredDisposer::new();
        disposer.schedule(Some(1), ms(500), t0);
        disposer.schedule(Some(2), ms(500), t0);

        let mut abandoned = disposer.cancel_all();
        abandoned.sort_unstable();
        assert_eq!(abandoned, vec![1, 2]);
        assert!(disposer.poll(t0 + ms(10_000)).is_empty());
    }
}
