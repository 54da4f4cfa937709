use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use metrics_core::{Metric, MetricKind, any_to_f64, any_to_i64};

use crate::error::ApiError;
use crate::state::AppState;

/// `POST /update/{type}/{name}/{value}` — the plain-URL update variant. Absent from the
/// JSON envelope entirely; the three path segments carry everything needed to build a
/// [`Metric`].
pub async fn update_path(
    State(state): State<Arc<AppState>>,
    Path((kind, name, value)): Path<(String, String, String)>,
) -> Result<StatusCode, ApiError> {
    if name.is_empty() {
        return Err(ApiError::NotFound);
    }
    let kind: MetricKind = kind.parse().map_err(|_| ApiError::BadRequest(format!("unknown metric type '{kind}'")))?;
    let metric = match kind {
        MetricKind::Gauge => {
            let value = any_to_f64(&value).map_err(|e| ApiError::BadRequest(e.to_string()))?;
            Metric::Gauge { id: name, value }
        }
        MetricKind::Counter => {
            let delta = any_to_i64(&value).map_err(|e| ApiError::BadRequest(e.to_string()))?;
            Metric::Counter { id: name, delta }
        }
    };
    state.store.save_metric(metric).await?;
    Ok(StatusCode::OK)
}
