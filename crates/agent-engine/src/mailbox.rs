use std::sync::{Arc, Mutex};

use metrics_core::Metric;

/// A single-slot, overwrite-on-write handoff from a sampler to the dispatcher. The
/// dispatcher never blocks a sampler: a new sample simply replaces whatever was there.
/// Reading the slot takes it, leaving the mailbox empty, so a dispatch tick that finds
/// nothing new never re-reports a sample a previous tick already consumed.
pub fn mailbox() -> (MailboxSender, MailboxReceiver) {
    let slot = Arc::new(Mutex::new(None));
    (MailboxSender(slot.clone()), MailboxReceiver(slot))
}

#[derive(Clone)]
pub struct MailboxSender(Arc<Mutex<Option<Vec<Metric>>>>);

impl MailboxSender {
    /// Publishes a new sample, replacing any value the dispatcher has not yet taken.
    pub fn publish(&self, sample: Vec<Metric>) {
        *self.0.lock().expect("mailbox mutex poisoned") = Some(sample);
    }
}

#[derive(Clone)]
pub struct MailboxReceiver(Arc<Mutex<Option<Vec<Metric>>>>);

impl MailboxReceiver {
    /// Non-blocking take of the current sample. Returns an empty vec, and leaves the
    /// mailbox empty, if the sampler has not published since the last take.
    pub fn take(&self) -> Vec<Metric> {
        self.0.lock().expect("mailbox mutex poisoned").take().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_write_wins_without_blocking() {
        let (tx, rx) = mailbox();
        tx.publish(vec![Metric::Gauge { id: "a".into(), value: 1.0 }]);
        tx.publish(vec![Metric::Gauge { id: "a".into(), value: 2.0 }]);
        assert_eq!(rx.take(), vec![Metric::Gauge { id: "a".into(), value: 2.0 }]);
    }

    #[test]
    fn take_empties_the_mailbox_so_a_missed_tick_reports_nothing() {
        let (tx, rx) = mailbox();
        tx.publish(vec![Metric::Counter { id: "c".into(), delta: 1 }]);
        assert_eq!(rx.take().len(), 1);
        assert_eq!(rx.take().len(), 0);
    }
}
