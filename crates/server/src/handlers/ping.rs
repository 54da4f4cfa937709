use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;

use crate::error::ApiError;
use crate::state::AppState;

/// `GET /ping` — liveness check backed by the storage backend's own status probe.
pub async fn ping(State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    state.store.status().await?;
    Ok(StatusCode::OK)
}
