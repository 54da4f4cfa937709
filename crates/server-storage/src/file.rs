use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex as StdMutex;
use std::sync::Arc;

use async_trait::async_trait;
use metrics_core::{Metric, MetricDto};
use tokio::io::AsyncWriteExt;
use tracing::{error, info, warn};

use crate::error::StorageError;
use crate::merge::{merge_against_store, reduce_batch};
use crate::store::MetricStore;

/// Composes an in-memory map with a single append-only journal file. The journal is
/// checkpointed by a full rewrite rather than incremental appends; the rewrite itself is
/// done atomically via write-to-temp-then-rename, the same pattern the agent uses for
/// its own local state files, so a crash mid-flush never leaves a half-written journal.
pub struct FileStore {
    metrics: StdMutex<BTreeMap<String, Metric>>,
    path: PathBuf,
    synchronous: bool,
    file_lock: tokio::sync::Mutex<()>,
}

impl FileStore {
    pub fn new(path: PathBuf, store_interval: std::time::Duration) -> Self {
        Self {
            metrics: StdMutex::new(BTreeMap::new()),
            path,
            synchronous: store_interval.is_zero(),
            file_lock: tokio::sync::Mutex::new(()),
        }
    }

    fn snapshot(&self) -> BTreeMap<String, Metric> {
        self.metrics.lock().expect("file store mutex poisoned").clone()
    }

    fn apply_locally(&self, metric: Metric) -> Metric {
        let mut guard = self.metrics.lock().expect("file store mutex poisoned");
        let stored = match guard.get(metric.id()) {
            Some(current) => current.merge(metric),
            None => metric,
        };
        guard.insert(stored.id().to_string(), stored.clone());
        stored
    }

    fn apply_batch_locally(&self, metrics: Vec<Metric>) -> Vec<Metric> {
        let mut guard = self.metrics.lock().expect("file store mutex poisoned");
        let reduced = reduce_batch(metrics);
        let merged = merge_against_store(&guard, reduced);
        for metric in &merged {
            guard.insert(metric.id().to_string(), metric.clone());
        }
        merged
    }

    /// Spawns a background task that checkpoints the journal every `interval`. Only
    /// meaningful when the store was constructed with a non-zero store interval; callers
    /// using synchronous mode should not call this.
    pub fn spawn_background_flush(self: &Arc<Self>, interval: std::time::Duration) -> tokio::task::JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                if let Err(err) = store.flush_metrics().await {
                    error!(error = %err, "periodic journal flush failed");
                }
            }
        })
    }
}

#[async_trait]
impl MetricStore for FileStore {
    async fn save_metric(&self, metric: Metric) -> Result<Metric, StorageError> {
        let stored = self.apply_locally(metric);
        if self.synchronous {
            self.flush_metrics().await?;
        }
        Ok(stored)
    }

    async fn save_batch_metrics(&self, metrics: Vec<Metric>) -> Result<Vec<Metric>, StorageError> {
        let merged = self.apply_batch_locally(metrics);
        if self.synchronous {
            self.flush_metrics().await?;
        }
        Ok(merged)
    }

    async fn get_metric(&self, id: &str) -> Result<Option<Metric>, StorageError> {
        Ok(self.metrics.lock().expect("file store mutex poisoned").get(id).cloned())
    }

    async fn get_all_metrics(&self) -> Result<BTreeMap<String, Metric>, StorageError> {
        Ok(self.snapshot())
    }

    async fn startup_restore(&self) -> Result<(), StorageError> {
        let _guard = self.file_lock.lock().await;
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no existing journal, starting empty");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        let mut restored = 0usize;
        for line in contents.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let dto: MetricDto = serde_json::from_str(line)?;
            let metric: Metric = dto.try_into().map_err(|_| {
                StorageError::Unavailable(format!("malformed journal line: {line}"))
            })?;
            self.apply_locally(metric);
            restored += 1;
        }
        info!(restored, path = %self.path.display(), "restored metrics from journal");
        Ok(())
    }

    async fn flush_metrics(&self) -> Result<(), StorageError> {
        let snapshot = self.snapshot();
        let mut buffer = String::new();
        for metric in snapshot.values() {
            let dto = MetricDto::from(metric.clone());
            buffer.push_str(&serde_json::to_string(&dto)?);
            buffer.push('\n');
        }

        let _guard = self.file_lock.lock().await;
        let tmp_path = self.path.with_extension("journal.tmp");
        let mut tmp = tokio::fs::File::create(&tmp_path).await?;
        tmp.write_all(buffer.as_bytes()).await?;
        tmp.flush().await?;
        drop(tmp);
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }

    async fn status(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), StorageError> {
        warn!("closing file store, performing final flush");
        self.flush_metrics().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn flush_then_restore_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.jsonl");

        let store = FileStore::new(path.clone(), std::time::Duration::from_secs(0));
        store.save_metric(Metric::Counter { id: "hits".into(), delta: 5 }).await.unwrap();
        store.save_metric(Metric::Gauge { id: "load".into(), value: 1.5 }).await.unwrap();
        store.flush_metrics().await.unwrap();

        let restored = FileStore::new(path, std::time::Duration::from_secs(0));
        restored.startup_restore().await.unwrap();
        assert_eq!(restored.get_all_metrics().await.unwrap(), store.get_all_metrics().await.unwrap());
    }

    #[tokio::test]
    async fn synchronous_mode_flushes_on_every_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.jsonl");
        let store = FileStore::new(path.clone(), std::time::Duration::from_secs(0));
        store.save_metric(Metric::Counter { id: "hits".into(), delta: 1 }).await.unwrap();
        let on_disk = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(on_disk.contains("\"hits\""));
    }

    #[tokio::test]
    async fn restore_from_missing_file_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist.jsonl");
        let store = FileStore::new(path, std::time::Duration::from_secs(0));
        store.startup_restore().await.unwrap();
        assert!(store.get_all_metrics().await.unwrap().is_empty());
    }
}
