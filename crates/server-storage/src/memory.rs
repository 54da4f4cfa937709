use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use metrics_core::Metric;

use crate::error::StorageError;
use crate::merge::{merge_against_store, reduce_batch};
use crate::store::MetricStore;

/// Holds every metric in a mutex-guarded map. No field of this backend ever holds a
/// lock across an `.await`, so a plain `std::sync::Mutex` is enough.
#[derive(Default)]
pub struct MemoryStore {
    metrics: Mutex<BTreeMap<String, Metric>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetricStore for MemoryStore {
    async fn save_metric(&self, metric: Metric) -> Result<Metric, StorageError> {
        let mut guard = self.metrics.lock().expect("memory store mutex poisoned");
        let stored = match guard.get(metric.id()) {
            Some(current) => current.merge(metric),
            None => metric,
        };
        guard.insert(stored.id().to_string(), stored.clone());
        Ok(stored)
    }

    async fn save_batch_metrics(&self, metrics: Vec<Metric>) -> Result<Vec<Metric>, StorageError> {
        let mut guard = self.metrics.lock().expect("memory store mutex poisoned");
        let reduced = reduce_batch(metrics);
        let merged = merge_against_store(&guard, reduced);
        for metric in &merged {
            guard.insert(metric.id().to_string(), metric.clone());
        }
        Ok(merged)
    }

    async fn get_metric(&self, id: &str) -> Result<Option<Metric>, StorageError> {
        let guard = self.metrics.lock().expect("memory store mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    async fn get_all_metrics(&self) -> Result<BTreeMap<String, Metric>, StorageError> {
        let guard = self.metrics.lock().expect("memory store mutex poisoned");
        Ok(guard.clone())
    }

    async fn startup_restore(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn flush_metrics(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn status(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn single_metric_merge_sums_counters() {
        let store = MemoryStore::new();
        store.save_metric(Metric::Counter { id: "hits".into(), delta: 5 }).await.unwrap();
        let stored = store.save_metric(Metric::Counter { id: "hits".into(), delta: 3 }).await.unwrap();
        assert_eq!(stored, Metric::Counter { id: "hits".into(), delta: 8 });
    }

    #[tokio::test]
    async fn batch_merge_matches_sequential_single_merges() {
        let store = MemoryStore::new();
        let batch = vec![
            Metric::Counter { id: "x".into(), delta: 10 },
            Metric::Counter { id: "x".into(), delta: 2 },
        ];
        store.save_batch_metrics(batch).await.unwrap();
        let stored = store.get_metric("x").await.unwrap().unwrap();
        assert_eq!(stored, Metric::Counter { id: "x".into(), delta: 12 });
    }

    #[tokio::test]
    async fn get_all_metrics_is_empty_initially() {
        let store = MemoryStore::new();
        assert!(store.get_all_metrics().await.unwrap().is_empty());
    }
}
