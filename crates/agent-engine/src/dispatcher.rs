use metrics_core::Metric;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::mailbox::{MailboxReceiver, MailboxSender, mailbox};
use crate::poll_counter::PollCounter;
use crate::samplers::{HostSampler, RuntimeSampler, SyntheticSampler};

/// Owns the three sampler mailboxes and the tasks that keep them fresh. Spawned once at
/// startup; each sampler task runs until `cancel` fires.
pub struct SamplerSet {
    pub runtime: MailboxReceiver,
    pub host: MailboxReceiver,
    pub synthetic: MailboxReceiver,
}

pub fn spawn_samplers(
    poll_interval: std::time::Duration,
    poll_counter: PollCounter,
    cancel: CancellationToken,
) -> SamplerSet {
    let (runtime_tx, runtime_rx) = mailbox();
    let (host_tx, host_rx) = mailbox();
    let (synthetic_tx, synthetic_rx) = mailbox();

    spawn_runtime_loop(runtime_tx, poll_interval, cancel.clone());
    spawn_host_loop(host_tx, poll_interval, cancel.clone());
    spawn_synthetic_loop(synthetic_tx, poll_interval, poll_counter, cancel);

    SamplerSet { runtime: runtime_rx, host: host_rx, synthetic: synthetic_rx }
}

fn spawn_runtime_loop(tx: MailboxSender, interval: std::time::Duration, cancel: CancellationToken) {
    tokio::spawn(async move {
        let mut sampler = RuntimeSampler::new();
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    tx.publish(sampler.sample());
                }
            }
        }
    });
}

fn spawn_host_loop(tx: MailboxSender, interval: std::time::Duration, cancel: CancellationToken) {
    tokio::spawn(async move {
        let mut sampler = HostSampler::new();
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        sample = sampler.sample() => tx.publish(sample),
                    }
                }
            }
        }
    });
}

fn spawn_synthetic_loop(
    tx: MailboxSender,
    interval: std::time::Duration,
    poll_counter: PollCounter,
    cancel: CancellationToken,
) {
    tokio::spawn(async move {
        let mut sampler = SyntheticSampler::new(poll_counter);
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    tx.publish(sampler.sample());
                }
            }
        }
    });
}

/// Drains the latest sample from each mailbox on every report tick and enqueues the
/// flattened metrics for delivery. Enqueuing blocks when the job channel is full — that
/// backpressure is the intended throttle on the whole pipeline.
pub async fn run_dispatcher(
    samplers: SamplerSet,
    job_tx: mpsc::Sender<Metric>,
    report_interval: std::time::Duration,
    batch_size: usize,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(report_interval);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let mut batch = samplers.runtime.take();
                batch.extend(samplers.host.take());
                batch.extend(samplers.synthetic.take());

                if batch.is_empty() {
                    debug!("dispatch tick produced no metrics");
                    continue;
                }
                if batch_size > 0 && batch.len() > batch_size {
                    batch.truncate(batch_size);
                }

                for metric in batch {
                    tokio::select! {
                        _ = cancel.cancelled() => return,
                        send_result = job_tx.send(metric) => {
                            if send_result.is_err() {
                                return;
                            }
                        }
                    }
                }
            }
        }
    }
}
