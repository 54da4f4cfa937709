use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Process-wide poll counter shared between the synthetic sampler (which reads and
/// reports it as `PollCount`) and the sender pool (which resets it after a successful
/// delivery). Cloning shares the same underlying counter.
#[derive(Clone, Default)]
pub struct PollCounter(Arc<AtomicI64>);

impl PollCounter {
    pub fn new() -> Self {
        Self(Arc::new(AtomicI64::new(0)))
    }

    pub fn increment(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }

    /// Resets the counter to zero after a successful batch delivery, returning the
    /// value it held immediately before the reset.
    pub fn reset(&self) -> i64 {
        self.0.swap(0, Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increments_and_resets() {
        let c = PollCounter::new();
        c.increment();
        c.increment();
        assert_eq!(c.snapshot(), 2);
        assert_eq!(c.reset(), 2);
        assert_eq!(c.snapshot(), 0);
    }
}
