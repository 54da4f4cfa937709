use std::fmt::Write as _;
use std::sync::Arc;

use axum::extract::State;
use axum::response::Html;

use crate::error::ApiError;
use crate::state::AppState;

/// `GET /` — an HTML dump of every stored metric, one `id=value` line per metric,
/// ordered by id (the store's map is already a `BTreeMap`, so this falls out for free).
pub async fn list(State(state): State<Arc<AppState>>) -> Result<Html<String>, ApiError> {
    let metrics = state.store.get_all_metrics().await?;
    let mut body = String::from("<html><body>\n");
    for metric in metrics.values() {
        let _ = writeln!(body, "{}={}<br/>", metric.id(), metric.value_text());
    }
    body.push_str("</body></html>\n");
    Ok(Html(body))
}
