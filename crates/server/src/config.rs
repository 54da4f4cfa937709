use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Ingests, aggregates, persists, and serves runtime/host/synthetic metrics.
#[derive(Debug, Parser)]
#[command(name = "server", version)]
pub struct Cli {
    /// Listen host:port.
    #[arg(short = 'a', long, env = "ADDRESS", default_value = "127.0.0.1:8080")]
    pub address: String,

    /// Journal checkpoint period, in seconds. 0 selects synchronous flushing.
    #[arg(short = 'i', long = "store-interval", env = "STORE_INTERVAL", default_value_t = 300)]
    pub store_interval_secs: u64,

    /// Journal file path. Selects the file backend when set.
    #[arg(short = 'f', long = "file-storage-path", env = "FILE_STORAGE_PATH", default_value = "")]
    pub file_storage_path: String,

    /// Database DSN. Selects the relational backend when set; takes precedence over `-f`.
    #[arg(short = 'd', long = "database-dsn", env = "DATABASE_DSN", default_value = "")]
    pub database_dsn: String,

    /// Restore from the journal at startup.
    #[arg(short = 'r', long, env = "RESTORE", default_value_t = false)]
    pub restore: bool,

    /// Shared signing key. Empty disables signature verification.
    #[arg(short = 'k', long, env = "KEY", default_value = "")]
    pub key: String,

    /// Log level: debug, info, warn, or error.
    #[arg(long = "log", env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

pub struct ServerConfig {
    pub address: String,
    pub backend: server_storage::BackendSelection,
    pub restore: bool,
    pub key: Option<String>,
}

impl Cli {
    pub fn into_config(self) -> ServerConfig {
        let dsn = (!self.database_dsn.is_empty()).then_some(self.database_dsn);
        let file_path = (!self.file_storage_path.is_empty()).then(|| PathBuf::from(self.file_storage_path));
        let store_interval = Duration::from_secs(self.store_interval_secs);
        let backend = server_storage::BackendSelection::resolve(dsn, file_path, store_interval);
        ServerConfig {
            address: self.address,
            backend,
            restore: self.restore,
            key: (!self.key.is_empty()).then_some(self.key),
        }
    }
}
