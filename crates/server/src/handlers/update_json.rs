use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use metrics_core::Metric;

use crate::error::ApiError;
use crate::state::AppState;

/// `POST /update/` — single-metric JSON update. Echoes the metric as actually stored
/// (post-merge) back to the caller. The payload is `Result<Json<_>, JsonRejection>`
/// rather than a bare `Json<_>` so malformed bodies, field/type mismatches, and a missing
/// `Content-Type` all surface as 400 instead of axum's default 422/415.
#[tracing::instrument(skip(state, payload), fields(id = tracing::field::Empty))]
pub async fn update_json(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Metric>, JsonRejection>,
) -> Result<Json<Metric>, ApiError> {
    let Json(metric) = payload?;
    tracing::Span::current().record("id", metric.id());
    let stored = state.store.save_metric(metric).await?;
    Ok(Json(stored))
}

/// `POST /updates/` — batch JSON update.
#[tracing::instrument(skip(state, payload), fields(count = tracing::field::Empty))]
pub async fn updates_json(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Vec<Metric>>, JsonRejection>,
) -> Result<Json<Vec<Metric>>, ApiError> {
    let Json(metrics) = payload?;
    tracing::Span::current().record("count", metrics.len());
    let stored = state.store.save_batch_metrics(metrics).await?;
    Ok(Json(stored))
}
