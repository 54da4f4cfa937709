use std::sync::Arc;

use anyhow as _;
use clap as _;
use serde as _;
use thiserror as _;
use tower_http as _;
use tracing as _;
use tracing_subscriber as _;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use server::app::build_router;
use server::state::AppState;
use server_storage::MemoryStore;
use tower::ServiceExt;

fn router_without_signing() -> Router {
    let state = Arc::new(AppState { store: Arc::new(MemoryStore::new()), key: None });
    build_router(state)
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn counter_updates_accumulate_via_path_route() {
    let app = router_without_signing();

    let req1 = Request::post("/update/counter/hits/5").body(Body::empty()).unwrap();
    let res1 = app.clone().oneshot(req1).await.unwrap();
    assert_eq!(res1.status(), StatusCode::OK);

    let req2 = Request::post("/update/counter/hits/3").body(Body::empty()).unwrap();
    let res2 = app.clone().oneshot(req2).await.unwrap();
    assert_eq!(res2.status(), StatusCode::OK);

    let req3 = Request::get("/value/counter/hits").body(Body::empty()).unwrap();
    let res3 = app.clone().oneshot(req3).await.unwrap();
    assert_eq!(res3.status(), StatusCode::OK);
    assert_eq!(body_text(res3).await, "8\n");
}

#[tokio::test]
async fn gauge_updates_keep_the_latest_reading() {
    let app = router_without_signing();

    for value in ["1.5", "2.25"] {
        let req = Request::post(format!("/update/gauge/load/{value}")).body(Body::empty()).unwrap();
        let res = app.clone().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    let req = Request::get("/value/gauge/load").body(Body::empty()).unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(body_text(res).await, "2.25\n");
}

#[tokio::test]
async fn batch_update_sums_duplicate_counter_ids_in_one_request() {
    let app = router_without_signing();

    let payload = r#"[{"id":"x","type":"counter","delta":10},{"id":"x","type":"counter","delta":2}]"#;
    let req = Request::post("/updates/")
        .header("content-type", "application/json")
        .body(Body::from(payload))
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let req = Request::get("/value/counter/x").body(Body::empty()).unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(body_text(res).await, "12\n");
}

#[tokio::test]
async fn counter_update_missing_delta_is_a_bad_request_not_unprocessable() {
    let app = router_without_signing();
    let req = Request::post("/update/")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"id":"x","type":"counter"}"#))
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn json_update_without_content_type_is_a_bad_request_not_unsupported_media_type() {
    let app = router_without_signing();
    let req = Request::post("/update/")
        .body(Body::from(r#"{"id":"x","type":"counter","delta":1}"#))
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn non_integer_counter_value_is_rejected() {
    let app = router_without_signing();
    let req = Request::post("/update/counter/foo/1.5").body(Body::empty()).unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_metric_is_a_404() {
    let app = router_without_signing();
    let req = Request::get("/value/counter/missing").body(Body::empty()).unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listing_is_sorted_by_id() {
    let app = router_without_signing();
    for (path,) in [("/update/counter/a/1",), ("/update/gauge/b/2.5",)] {
        let req = Request::post(path).body(Body::empty()).unwrap();
        assert_eq!(app.clone().oneshot(req).await.unwrap().status(), StatusCode::OK);
    }

    let req = Request::get("/").body(Body::empty()).unwrap();
    let res = app.oneshot(req).await.unwrap();
    let html = body_text(res).await;
    let a_pos = html.find("a=1").unwrap();
    let b_pos = html.find("b=2.5").unwrap();
    assert!(a_pos < b_pos);
}

#[tokio::test]
async fn ping_succeeds_against_memory_store() {
    let app = router_without_signing();
    let req = Request::get("/ping").body(Body::empty()).unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn signed_request_with_bad_signature_is_rejected_and_store_is_unchanged() {
    let state = Arc::new(AppState { store: Arc::new(MemoryStore::new()), key: Some("secret".into()) });
    let store = state.store.clone();
    let app = build_router(state);

    let payload = br#"[{"id":"x","type":"counter","delta":1}]"#;
    let req = Request::post("/updates/")
        .header("content-type", "application/json")
        .header("HashSHA256", "not-a-real-signature")
        .body(Body::from(payload.to_vec()))
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(store.get_metric("x").await.unwrap().is_none());
}

#[tokio::test]
async fn signed_request_with_correct_signature_is_accepted() {
    let key = "secret";
    let state = Arc::new(AppState { store: Arc::new(MemoryStore::new()), key: Some(key.into()) });
    let app = build_router(state);

    let payload = br#"[{"id":"x","type":"counter","delta":1}]"#;
    let signature = metrics_core::sign::sign(payload, key.as_bytes());
    let req = Request::post("/updates/")
        .header("content-type", "application/json")
        .header("HashSHA256", signature)
        .body(Body::from(payload.to_vec()))
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("HashSHA256"));
}
