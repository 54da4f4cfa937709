use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use metrics_core::Metric;
use sqlx::Row;
use sqlx::postgres::{PgPoolOptions, PgRow};
use tracing::warn;

use crate::error::StorageError;
use crate::merge::reduce_batch;
use crate::store::MetricStore;

const RETRY_ATTEMPTS: u32 = 3;
const RETRY_STEP_SECS: u64 = 2;

/// Upsert-backed storage over Postgres. Each save runs inside the same linear-backoff
/// retry schedule the agent uses for delivery, distinguishing transient connection
/// failures (retried) from constraint violations (surfaced immediately).
pub struct RelationalStore {
    pool: sqlx::PgPool,
}

impl RelationalStore {
    pub async fn connect(dsn: &str) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new().max_connections(10).connect(dsn).await?;
        Ok(Self { pool })
    }

    /// Establishes the `metrics` table, refusing to start if the migration history is
    /// dirty or at an unexpected version.
    pub async fn migrate(&self) -> Result<(), StorageError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn upsert_one(&self, metric: &Metric) -> Result<Metric, StorageError> {
        with_retry(|| self.upsert_one_attempt(metric)).await
    }

    async fn upsert_one_attempt(&self, metric: &Metric) -> Result<Metric, sqlx::Error> {
        let row = match metric {
            Metric::Gauge { id, value } => {
                sqlx::query(
                    "INSERT INTO metrics (id, kind, value, delta) VALUES ($1, 'gauge', $2, NULL)
                     ON CONFLICT (id) DO UPDATE SET kind = 'gauge', value = EXCLUDED.value, delta = NULL
                     RETURNING id, kind, value, delta",
                )
                .bind(id)
                .bind(value)
                .fetch_one(&self.pool)
                .await?
            }
            Metric::Counter { id, delta } => {
                sqlx::query(
                    "INSERT INTO metrics (id, kind, value, delta) VALUES ($1, 'counter', NULL, $2)
                     ON CONFLICT (id) DO UPDATE SET
                       kind = 'counter',
                       value = NULL,
                       delta = CASE WHEN metrics.kind = 'counter' THEN metrics.delta + EXCLUDED.delta ELSE EXCLUDED.delta END
                     RETURNING id, kind, value, delta",
                )
                .bind(id)
                .bind(delta)
                .fetch_one(&self.pool)
                .await?
            }
        };
        Ok(row_to_metric(&row))
    }
}

fn row_to_metric(row: &PgRow) -> Metric {
    let id: String = row.get("id");
    let kind: String = row.get("kind");
    match kind.as_str() {
        "gauge" => Metric::Gauge { id, value: row.get("value") },
        _ => Metric::Counter { id, delta: row.get("delta") },
    }
}

fn is_transient(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Tls(_))
}

async fn with_retry<F, Fut, T>(mut attempt: F) -> Result<T, StorageError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, sqlx::Error>>,
{
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(err) if is_transient(&err) && attempts <= RETRY_ATTEMPTS => {
                let backoff = Duration::from_secs((attempts as u64 * RETRY_STEP_SECS).saturating_sub(1));
                warn!(attempts, error = %err, "retrying database operation");
                tokio::time::sleep(backoff).await;
            }
            Err(err) => return Err(err.into()),
        }
    }
}

#[async_trait]
impl MetricStore for RelationalStore {
    async fn save_metric(&self, metric: Metric) -> Result<Metric, StorageError> {
        self.upsert_one(&metric).await
    }

    async fn save_batch_metrics(&self, metrics: Vec<Metric>) -> Result<Vec<Metric>, StorageError> {
        let reduced = reduce_batch(metrics);
        let mut tx = self.pool.begin().await?;
        let mut stored = Vec::with_capacity(reduced.len());
        for metric in &reduced {
            let row = match metric {
                Metric::Gauge { id, value } => {
                    sqlx::query(
                        "INSERT INTO metrics (id, kind, value, delta) VALUES ($1, 'gauge', $2, NULL)
                         ON CONFLICT (id) DO UPDATE SET kind = 'gauge', value = EXCLUDED.value, delta = NULL
                         RETURNING id, kind, value, delta",
                    )
                    .bind(id)
                    .bind(value)
                    .fetch_one(&mut *tx)
                    .await?
                }
                Metric::Counter { id, delta } => {
                    sqlx::query(
                        "INSERT INTO metrics (id, kind, value, delta) VALUES ($1, 'counter', NULL, $2)
                         ON CONFLICT (id) DO UPDATE SET
                           kind = 'counter',
                           value = NULL,
                           delta = CASE WHEN metrics.kind = 'counter' THEN metrics.delta + EXCLUDED.delta ELSE EXCLUDED.delta END
                         RETURNING id, kind, value, delta",
                    )
                    .bind(id)
                    .bind(delta)
                    .fetch_one(&mut *tx)
                    .await?
                }
            };
            stored.push(row_to_metric(&row));
        }
        tx.commit().await?;
        Ok(stored)
    }

    async fn get_metric(&self, id: &str) -> Result<Option<Metric>, StorageError> {
        let row = sqlx::query("SELECT id, kind, value, delta FROM metrics WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_metric))
    }

    async fn get_all_metrics(&self) -> Result<BTreeMap<String, Metric>, StorageError> {
        let rows = sqlx::query("SELECT id, kind, value, delta FROM metrics").fetch_all(&self.pool).await?;
        Ok(rows.iter().map(|r| { let m = row_to_metric(r); (m.id().to_string(), m) }).collect())
    }

    async fn startup_restore(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn flush_metrics(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn status(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), StorageError> {
        self.pool.close().await;
        Ok(())
    }
}
