use axum::body::Body;
use axum::extract::Request;
use axum::http::header::{ACCEPT_ENCODING, CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

fn wants_gzip(req: &Request) -> bool {
    req.headers()
        .get(ACCEPT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("gzip"))
        .unwrap_or(false)
}

fn is_compressible(content_type: &str) -> bool {
    content_type.is_empty()
        || content_type.starts_with("application/json")
        || content_type.starts_with("text/html")
}

/// Gzips the response body when the client advertises `Accept-Encoding: gzip` and the
/// response content type is one we want to compress. Other content types pass through
/// untouched.
pub async fn compress_response(req: Request, next: Next) -> Response {
    let should_compress = wants_gzip(&req);
    let response = next.run(req).await;
    if !should_compress {
        return response;
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    if !is_compressible(&content_type) {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(err) => {
            debug!(error = %err, "failed to buffer response body for compression");
            return Response::from_parts(parts, Body::empty());
        }
    };

    match metrics_core::gzip::compress(&bytes) {
        Ok(compressed) => {
            parts.headers.insert(CONTENT_ENCODING, HeaderValue::from_static("gzip"));
            parts.headers.remove(CONTENT_LENGTH);
            Response::from_parts(parts, Body::from(compressed))
        }
        Err(err) => {
            debug!(error = %err, "failed to gzip response body, sending uncompressed");
            Response::from_parts(parts, Body::from(bytes))
        }
    }
}
