use std::time::Duration;

/// Resolved, validated agent configuration. Built from CLI flags/env by the `agent`
/// binary; kept free of `clap` so the engine has no dependency on argument parsing.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Server base URL, e.g. `http://127.0.0.1:8080`.
    pub server_url: reqwest::Url,

    /// How often each sampler takes a new reading.
    pub poll_interval: Duration,

    /// How often the dispatcher drains samplers and enqueues metrics for delivery.
    pub report_interval: Duration,

    /// Maximum metrics dispatched per report tick (0 = unbounded).
    pub batch_size: usize,

    /// Number of concurrent sender workers.
    pub rate_limit: usize,

    /// Shared signing key; `None` disables request signing.
    pub key: Option<String>,
}

impl AgentConfig {
    pub const DEFAULT_RATE_LIMIT: usize = 10;
    pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
    pub const RETRY_STEP_SECS: u64 = 2;

    /// Validates the cross-field invariant the dispatcher relies on: the report cadence
    /// must not run ahead of the poll cadence, or every report would re-send stale data.
    pub fn validate(&self) -> Result<(), String> {
        if self.report_interval < self.poll_interval {
            return Err(format!(
                "report interval ({:?}) must be >= poll interval ({:?})",
                self.report_interval, self.poll_interval
            ));
        }
        if self.rate_limit == 0 {
            return Err("rate limit must be >= 1".to_string());
        }
        Ok(())
    }
}
