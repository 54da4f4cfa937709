use std::time::Duration;

use clap::Parser;

/// Samples runtime, host, and synthetic metrics and reports them to a metrics server.
#[derive(Debug, Parser)]
#[command(name = "agent", version)]
pub struct Cli {
    /// Server host:port.
    #[arg(short = 'a', long, env = "ADDRESS", default_value = "127.0.0.1:8080")]
    pub address: String,

    /// Use HTTPS instead of plain HTTP when talking to the server.
    #[arg(short = 's', long, env = "USE_HTTPS", default_value_t = false)]
    pub use_https: bool,

    /// Sampling interval, in seconds.
    #[arg(short = 'p', long = "poll-interval", env = "POLL_INTERVAL", default_value_t = 2)]
    pub poll_interval_secs: u64,

    /// Reporting interval, in seconds. Must be >= poll interval.
    #[arg(short = 'r', long = "report-interval", env = "REPORT_INTERVAL", default_value_t = 10)]
    pub report_interval_secs: u64,

    /// Maximum metrics dispatched per report tick (0 = unbounded).
    #[arg(short = 'b', long = "batch-size", env = "BATCH_SIZE", default_value_t = 0)]
    pub batch_size: usize,

    /// Number of concurrent sender workers.
    #[arg(short = 'l', long = "rate-limit", env = "RATE_LIMIT", default_value_t = agent_engine::AgentConfig::DEFAULT_RATE_LIMIT)]
    pub rate_limit: usize,

    /// Shared signing key. Empty disables request signing.
    #[arg(short = 'k', long, env = "KEY", default_value = "")]
    pub key: String,

    /// Log level: debug, info, warn, or error.
    #[arg(long = "log", env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Cli {
    pub fn server_url(&self) -> anyhow::Result<reqwest::Url> {
        let scheme = if self.use_https { "https" } else { "http" };
        let raw = format!("{scheme}://{}/", self.address);
        reqwest::Url::parse(&raw).map_err(|e| anyhow::anyhow!("invalid address '{}': {e}", self.address))
    }

    pub fn into_config(self) -> anyhow::Result<agent_engine::AgentConfig> {
        let server_url = self.server_url()?;
        let config = agent_engine::AgentConfig {
            server_url,
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            report_interval: Duration::from_secs(self.report_interval_secs),
            batch_size: self.batch_size,
            rate_limit: self.rate_limit,
            key: if self.key.is_empty() { None } else { Some(self.key) },
        };
        config.validate().map_err(|e| anyhow::anyhow!(e))?;
        Ok(config)
    }
}
