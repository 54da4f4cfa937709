use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::{Request, State};
use axum::http::HeaderValue;
use axum::http::header::{CONTENT_ENCODING, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;

use crate::error::ApiError;
use crate::state::AppState;

/// 10 MiB cap on a decompressed request body; well above any realistic metrics batch,
/// just large enough to stop a malicious gzip bomb from exhausting memory.
const MAX_DECOMPRESSED_BYTES: u64 = 10 * 1024 * 1024;
const MAX_RAW_BODY_BYTES: usize = 10 * 1024 * 1024;

fn is_gzipped(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("gzip"))
        .unwrap_or(false)
}

fn hash_bypass_requested(headers: &HeaderMap) -> bool {
    headers
        .get("Hash")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.eq_ignore_ascii_case("none"))
        .unwrap_or(false)
}

/// Decompresses the request body (if gzipped) and verifies its `HashSHA256` signature
/// against the decompressed bytes before the handler ever sees them. Combining the two
/// concerns in one layer avoids buffering the body twice and keeps the load-bearing
/// ordering (verify against decompressed bytes) from being an accident of layer order.
pub async fn verify_and_decompress(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (mut parts, body) = req.into_parts();
    let raw: Bytes = axum::body::to_bytes(body, MAX_RAW_BODY_BYTES)
        .await
        .map_err(|e| ApiError::BadRequest(format!("failed to read request body: {e}")))?;

    let decompressed = if is_gzipped(&parts.headers) {
        metrics_core::gzip::decompress(&raw, MAX_DECOMPRESSED_BYTES)
            .map_err(|e| ApiError::BadRequest(format!("failed to decompress request body: {e}")))?
    } else {
        raw.to_vec()
    };

    if let Some(key) = &state.key {
        let skip = decompressed.is_empty() || hash_bypass_requested(&parts.headers);
        if !skip {
            let header_sig = parts.headers.get("HashSHA256").and_then(|v| v.to_str().ok());
            let valid = header_sig
                .map(|sig| metrics_core::sign::verify(&decompressed, key.as_bytes(), sig))
                .unwrap_or(false);
            if !valid {
                return Err(ApiError::InvalidSignature);
            }
        }
    }

    parts.headers.remove(CONTENT_ENCODING);
    let forwarded = Request::from_parts(parts, Body::from(decompressed.clone()));

    let mut response = next.run(forwarded).await;

    if let Some(key) = &state.key {
        let response_sig = metrics_core::sign::sign(&decompressed, key.as_bytes());
        if let Ok(value) = HeaderValue::from_str(&response_sig) {
            response.headers_mut().insert("HashSHA256", value);
        }
    }

    Ok(response)
}
