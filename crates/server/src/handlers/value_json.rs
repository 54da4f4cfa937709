use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use metrics_core::{Metric, MetricKind};
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ValueQuery {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: MetricKind,
}

/// `POST /value/` — looks a metric up by `{id, type}`, returning it as JSON. Like the
/// update routes, the query is `Result<Json<_>, JsonRejection>` so a malformed or
/// wrong-shaped body is a 400, not axum's default 422/415.
pub async fn value_json(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ValueQuery>, JsonRejection>,
) -> Result<Json<Metric>, ApiError> {
    let Json(query) = payload?;
    let metric = state.store.get_metric(&query.id).await?.ok_or(ApiError::NotFound)?;
    if metric.kind() != query.kind {
        return Err(ApiError::NotFound);
    }
    Ok(Json(metric))
}
