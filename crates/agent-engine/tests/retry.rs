use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow as _;
use rand as _;
use serde_json as _;
use sysinfo as _;
use thiserror as _;
use tracing as _;

use agent_engine::config::AgentConfig;
use agent_engine::poll_counter::PollCounter;
use agent_engine::sender::spawn_workers;
use metrics_core::Metric;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Respond, ResponseTemplate};

struct FailThenSucceed(Arc<AtomicUsize>);

impl Respond for FailThenSucceed {
    fn respond(&self, _req: &wiremock::Request) -> ResponseTemplate {
        let call = self.0.fetch_add(1, Ordering::SeqCst);
        if call == 0 {
            ResponseTemplate::new(500)
        } else {
            ResponseTemplate::new(200)
        }
    }
}

#[tokio::test]
async fn failed_delivery_is_retried_until_it_succeeds() {
    let calls = Arc::new(AtomicUsize::new(0));
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/updates/"))
        .respond_with(FailThenSucceed(calls.clone()))
        .mount(&server)
        .await;

    let config = Arc::new(AgentConfig {
        server_url: reqwest::Url::parse(&server.uri()).unwrap(),
        poll_interval: std::time::Duration::from_secs(1),
        report_interval: std::time::Duration::from_secs(1),
        batch_size: 0,
        rate_limit: 1,
        key: None,
    });

    let (job_tx, job_rx) = mpsc::channel(1);
    let (result_tx, mut result_rx) = mpsc::unbounded_channel();
    let poll_counter = PollCounter::new();
    poll_counter.increment();
    let cancel = CancellationToken::new();

    spawn_workers(
        config,
        reqwest::Client::new(),
        job_rx,
        result_tx,
        poll_counter.clone(),
        cancel.clone(),
    );

    job_tx.send(Metric::Counter { id: "PollCount".into(), delta: 1 }).await.unwrap();

    let outcome = tokio::time::timeout(std::time::Duration::from_secs(5), result_rx.recv())
        .await
        .expect("worker should report an outcome")
        .expect("channel should not close early");

    assert!(outcome.result.is_ok());
    assert_eq!(outcome.attempts, 2);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(poll_counter.snapshot(), 0, "successful delivery resets the poll counter");
}

#[tokio::test]
async fn client_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/updates/"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;

    let config = Arc::new(AgentConfig {
        server_url: reqwest::Url::parse(&server.uri()).unwrap(),
        poll_interval: std::time::Duration::from_secs(1),
        report_interval: std::time::Duration::from_secs(1),
        batch_size: 0,
        rate_limit: 1,
        key: None,
    });

    let (job_tx, job_rx) = mpsc::channel(1);
    let (result_tx, mut result_rx) = mpsc::unbounded_channel();
    let poll_counter = PollCounter::new();
    let cancel = CancellationToken::new();

    spawn_workers(config, reqwest::Client::new(), job_rx, result_tx, poll_counter, cancel.clone());

    job_tx.send(Metric::Gauge { id: "RandomValue".into(), value: 1.0 }).await.unwrap();

    let outcome = tokio::time::timeout(std::time::Duration::from_secs(5), result_rx.recv())
        .await
        .expect("worker should report an outcome")
        .expect("channel should not close early");

    assert!(outcome.result.is_err());
    assert_eq!(outcome.attempts, 1, "a 4xx must not be retried");
}
