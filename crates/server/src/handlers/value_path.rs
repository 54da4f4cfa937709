use std::sync::Arc;

use axum::extract::{Path, State};
use metrics_core::MetricKind;

use crate::error::ApiError;
use crate::state::AppState;

/// `GET /value/{type}/{name}` — returns the stored value as plain text, or 404 when the
/// id is unknown or stored under a different type.
pub async fn value_path(
    State(state): State<Arc<AppState>>,
    Path((kind, name)): Path<(String, String)>,
) -> Result<String, ApiError> {
    let kind: MetricKind = kind.parse().map_err(|_| ApiError::BadRequest(format!("unknown metric type '{kind}'")))?;
    let metric = state.store.get_metric(&name).await?.ok_or(ApiError::NotFound)?;
    if metric.kind() != kind {
        return Err(ApiError::NotFound);
    }
    Ok(format!("{}\n", metric.value_text()))
}
