use std::collections::BTreeMap;

use async_trait::async_trait;
use metrics_core::Metric;

use crate::error::StorageError;

/// The contract every storage backend honors. Handlers and the background flusher
/// depend only on this trait, never on a concrete backend, so the server can switch
/// backends by constructing a different `Arc<dyn MetricStore>` at startup.
#[async_trait]
pub trait MetricStore: Send + Sync {
    /// Applies the single-metric merge rule and persists the result, returning what was
    /// actually stored.
    async fn save_metric(&self, metric: Metric) -> Result<Metric, StorageError>;

    /// Applies the batch merge rule and persists every resulting metric, returning what
    /// was actually stored (order matches first occurrence in the request).
    async fn save_batch_metrics(&self, metrics: Vec<Metric>) -> Result<Vec<Metric>, StorageError>;

    async fn get_metric(&self, id: &str) -> Result<Option<Metric>, StorageError>;

    async fn get_all_metrics(&self) -> Result<BTreeMap<String, Metric>, StorageError>;

    /// Loads previously persisted state, if any. A no-op for backends with no durable
    /// state of their own (plain memory).
    async fn startup_restore(&self) -> Result<(), StorageError>;

    /// Forces a checkpoint of in-memory state to durable storage. A no-op for backends
    /// that persist synchronously on every write.
    async fn flush_metrics(&self) -> Result<(), StorageError>;

    /// Liveness check backing `GET /ping`.
    async fn status(&self) -> Result<(), StorageError>;

    async fn close(&self) -> Result<(), StorageError>;
}
