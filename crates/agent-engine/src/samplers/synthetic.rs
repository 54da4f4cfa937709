use metrics_core::Metric;
use rand::Rng;

use crate::poll_counter::PollCounter;

/// Emits `PollCount` (the running poll tally, reset by the sender pool on successful
/// delivery) and a fresh `RandomValue` draw each tick.
pub struct SyntheticSampler {
    poll_counter: PollCounter,
}

impl SyntheticSampler {
    pub fn new(poll_counter: PollCounter) -> Self {
        Self { poll_counter }
    }

    pub fn sample(&mut self) -> Vec<Metric> {
        self.poll_counter.increment();
        let random_value: f64 = rand::thread_rng().r#gen();
        vec![
            Metric::Counter { id: "PollCount".into(), delta: self.poll_counter.snapshot() },
            Metric::Gauge { id: "RandomValue".into(), value: random_value },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poll_count_tracks_ticks_since_last_reset() {
        let counter = PollCounter::new();
        let mut sampler = SyntheticSampler::new(counter.clone());
        sampler.sample();
        sampler.sample();
        let sample = sampler.sample();
        let poll_count = sample.iter().find(|m| m.id() == "PollCount").unwrap();
        assert_eq!(*poll_count, Metric::Counter { id: "PollCount".into(), delta: 3 });
    }

    #[test]
    fn reset_between_samples_restarts_the_count() {
        let counter = PollCounter::new();
        let mut sampler = SyntheticSampler::new(counter.clone());
        sampler.sample();
        counter.reset();
        let sample = sampler.sample();
        let poll_count = sample.iter().find(|m| m.id() == "PollCount").unwrap();
        assert_eq!(*poll_count, Metric::Counter { id: "PollCount".into(), delta: 1 });
    }
}
