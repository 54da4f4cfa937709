use std::sync::Arc;

use server_storage::MetricStore;

pub struct AppState {
    pub store: Arc<dyn MetricStore>,
    pub key: Option<String>,
}
