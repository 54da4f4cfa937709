use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::{compress_response, verify_and_decompress};
use crate::state::AppState;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Assembles the router: five handler families wrapped by the middleware pipeline, in
/// the order panic-recovery, request-id, request-logging, response-compression,
/// signature-verification-and-decompression (innermost, closest to the handlers).
pub fn build_router(state: Arc<AppState>) -> Router {
    let request_id_header: axum::http::HeaderName = REQUEST_ID_HEADER.parse().expect("static header name is valid");

    Router::new()
        .route("/update/{kind}/{name}/{value}", post(handlers::update_path))
        .route("/update/", post(handlers::update_json))
        .route("/updates/", post(handlers::updates_json))
        .route("/value/{kind}/{name}", get(handlers::value_path))
        .route("/value/", post(handlers::value_json))
        .route("/", get(handlers::list))
        .route("/ping", get(handlers::ping))
        .layer(axum::middleware::from_fn_with_state(state.clone(), verify_and_decompress))
        .layer(axum::middleware::from_fn(compress_response))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(CatchPanicLayer::new())
        .with_state(state)
}
