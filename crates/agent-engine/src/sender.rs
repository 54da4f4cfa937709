use std::sync::Arc;
use std::time::Duration;

use metrics_core::{Metric, MetricDto};
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::config::AgentConfig;
use crate::poll_counter::PollCounter;

/// Outcome of one worker's attempt to deliver a single metric, reported back so the
/// caller can log or test against it without the worker itself owning a logging policy.
#[derive(Debug, Clone)]
pub struct SendOutcome {
    pub metric_id: String,
    pub attempts: u32,
    pub result: Result<(), String>,
}

#[derive(Debug, thiserror::Error)]
enum SendError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server returned {0}")]
    ServerStatus(reqwest::StatusCode),
    #[error("client rejected request: {0}")]
    ClientStatus(reqwest::StatusCode),
    #[error(transparent)]
    Encode(#[from] metrics_core::Error),
}

impl SendError {
    fn is_retryable(&self) -> bool {
        match self {
            SendError::Transport(_) | SendError::ServerStatus(_) => true,
            SendError::ClientStatus(_) | SendError::Encode(_) => false,
        }
    }
}

/// Spawns `config.rate_limit` worker tasks sharing one job receiver. Each delivered
/// metric's outcome is reported on `result_tx`; the channel is never awaited on by more
/// than one worker at a time because the receiver is behind a mutex that is held only
/// across the `recv` call.
pub fn spawn_workers(
    config: Arc<AgentConfig>,
    http: reqwest::Client,
    job_rx: mpsc::Receiver<Metric>,
    result_tx: mpsc::UnboundedSender<SendOutcome>,
    poll_counter: PollCounter,
    cancel: CancellationToken,
) {
    let job_rx = Arc::new(Mutex::new(job_rx));
    for _ in 0..config.rate_limit {
        let config = config.clone();
        let http = http.clone();
        let job_rx = job_rx.clone();
        let result_tx = result_tx.clone();
        let poll_counter = poll_counter.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            loop {
                let metric = {
                    let mut rx = job_rx.lock().await;
                    tokio::select! {
                        _ = cancel.cancelled() => return,
                        job = rx.recv() => match job {
                            Some(m) => m,
                            None => return,
                        },
                    }
                };
                let metric_id = metric.id().to_string();
                let (attempts, result) =
                    send_with_retry(&config, &http, &metric, &cancel).await;
                if result.is_ok() {
                    poll_counter.reset();
                }
                let _ = result_tx.send(SendOutcome { metric_id, attempts, result });
            }
        });
    }
}

async fn send_with_retry(
    config: &AgentConfig,
    http: &reqwest::Client,
    metric: &Metric,
    cancel: &CancellationToken,
) -> (u32, Result<(), String>) {
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        match send_once(config, http, metric).await {
            Ok(()) => {
                debug!(metric = metric.id(), attempts, "metric delivered");
                return (attempts, Ok(()));
            }
            Err(err) if err.is_retryable() && attempts <= AgentConfig::DEFAULT_RETRY_ATTEMPTS => {
                warn!(metric = metric.id(), attempts, error = %err, "retrying metric delivery");
                let backoff = Duration::from_secs(
                    (attempts as u64 * AgentConfig::RETRY_STEP_SECS).saturating_sub(1),
                );
                tokio::select! {
                    _ = cancel.cancelled() => return (attempts, Err("cancelled during backoff".into())),
                    _ = tokio::time::sleep(backoff) => {}
                }
            }
            Err(err) => {
                error!(metric = metric.id(), attempts, error = %err, "giving up on metric delivery");
                return (attempts, Err(err.to_string()));
            }
        }
    }
}

async fn send_once(config: &AgentConfig, http: &reqwest::Client, metric: &Metric) -> Result<(), SendError> {
    let dto = MetricDto::from(metric.clone());
    let body = serde_json::to_vec(&[dto]).expect("metric DTOs always serialize");
    let compressed = metrics_core::gzip::compress(&body)?;

    let url = config
        .server_url
        .join("updates/")
        .expect("server_url is a valid base");

    let mut request = http
        .post(url)
        .header("Content-Type", "application/json")
        .header("Content-Encoding", "gzip");

    if let Some(key) = &config.key {
        let signature = metrics_core::sign::sign(&body, key.as_bytes());
        request = request.header("HashSHA256", signature);
    }

    let response = request.body(compressed).send().await?;
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else if status.is_client_error() {
        Err(SendError::ClientStatus(status))
    } else {
        Err(SendError::ServerStatus(status))
    }
}
