use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::AgentConfig;
use crate::dispatcher::{run_dispatcher, spawn_samplers};
use crate::poll_counter::PollCounter;
use crate::sender::{SendOutcome, spawn_workers};

/// A running agent pipeline: samplers, dispatcher, and sender pool all wired together.
pub struct AgentHandle {
    cancel: CancellationToken,
    dispatcher_join: tokio::task::JoinHandle<()>,
    result_collector_join: tokio::task::JoinHandle<()>,
}

impl AgentHandle {
    /// Requests a graceful stop; in-flight sends are allowed to finish.
    pub fn request_stop(&self) {
        self.cancel.cancel();
    }

    /// Waits for the dispatcher and result collector to finish, which happens once
    /// `request_stop` has been called and in-flight work has drained.
    pub async fn wait(self) -> anyhow::Result<()> {
        self.dispatcher_join.await.map_err(|e| anyhow::anyhow!("dispatcher task panicked: {e}"))?;
        self.result_collector_join
            .await
            .map_err(|e| anyhow::anyhow!("result collector task panicked: {e}"))?;
        Ok(())
    }
}

/// Starts the full agent pipeline: three samplers feeding a dispatcher, a fixed pool of
/// sender workers, and a result collector that logs each delivery outcome.
pub fn start_agent(config: AgentConfig, http: reqwest::Client) -> AgentHandle {
    let config = Arc::new(config);
    let cancel = CancellationToken::new();
    let poll_counter = PollCounter::new();

    let samplers = spawn_samplers(config.poll_interval, poll_counter.clone(), cancel.clone());

    let (job_tx, job_rx) = mpsc::channel(config.rate_limit.max(1));
    let (result_tx, mut result_rx) = mpsc::unbounded_channel::<SendOutcome>();

    spawn_workers(config.clone(), http, job_rx, result_tx, poll_counter, cancel.clone());

    let dispatcher_join = tokio::spawn({
        let report_interval = config.report_interval;
        let batch_size = config.batch_size;
        let cancel = cancel.clone();
        async move {
            run_dispatcher(samplers, job_tx, report_interval, batch_size, cancel).await;
        }
    });

    let result_collector_join = tokio::spawn(async move {
        while let Some(outcome) = result_rx.recv().await {
            match outcome.result {
                Ok(()) => info!(metric = outcome.metric_id, attempts = outcome.attempts, "delivered"),
                Err(err) => error!(metric = outcome.metric_id, attempts = outcome.attempts, error = err, "delivery failed"),
            }
        }
    });

    AgentHandle { cancel, dispatcher_join, result_collector_join }
}
