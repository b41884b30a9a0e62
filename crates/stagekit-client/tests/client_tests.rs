//! Tests for stagekit-client: HTTP source against a local mock server, memory source

use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use stagekit_client::*;
use stagekit_core::{to_document_string, Component};
use std::time::Duration;

fn sample() -> Component {
    Component::root().with_child(Component::plain("base").attached_to("root").at([0.0, 0.0, 1.0]))
}

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn sample_value() -> serde_json::Value {
    serde_json::from_str(&to_document_string(&sample()).unwrap()).unwrap()
}

// ===========================================================================
// HttpAssemblySource: fetch
// ===========================================================================

#[tokio::test]
async fn http_fetch_returns_document() {
    let doc = sample_value();
    let app = Router::new().route(DEFAULT_FETCH_PATH, get(move || async move { Json(doc) }));
    let source = HttpAssemblySource::new(spawn(app).await);
    let fetched = source.fetch(None).await.unwrap();
    assert_eq!(fetched, sample());
}

#[tokio::test]
async fn http_fetch_trailing_slash_in_base_url() {
    let doc = sample_value();
    let app = Router::new().route(DEFAULT_FETCH_PATH, get(move || async move { Json(doc) }));
    let base = format!("{}/", spawn(app).await);
    let source = HttpAssemblySource::new(base);
    assert!(!source.base_url().ends_with('/'));
    assert!(source.fetch(None).await.is_ok());
}

#[tokio::test]
async fn http_fetch_custom_paths() {
    let doc = sample_value();
    let app = Router::new().route("/assembly", get(move || async move { Json(doc) }));
    let source = HttpAssemblySource::new(spawn(app).await).with_paths("/assembly", "/assembly");
    assert_eq!(source.fetch(None).await.unwrap(), sample());
}

#[tokio::test]
async fn http_fetch_error_status_is_request_failed() {
    let app = Router::new().route(
        DEFAULT_FETCH_PATH,
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response() }),
    );
    let source = HttpAssemblySource::new(spawn(app).await);
    let err = source.fetch(None).await.unwrap_err();
    assert!(matches!(err, SourceError::RequestFailed(ref m) if m.contains("boom")));
    assert!(err.is_transport());
}

#[tokio::test]
async fn http_fetch_malformed_document_is_schema_error() {
    let app = Router::new().route(
        DEFAULT_FETCH_PATH,
        get(|| async {
            Json(json!({"name": "root", "kind": "Plain", "children": [{"name": "x"}]}))
        }),
    );
    let source = HttpAssemblySource::new(spawn(app).await);
    let err = source.fetch(None).await.unwrap_err();
    assert!(matches!(err, SourceError::Schema(_)));
    assert!(!err.is_transport());
}

#[tokio::test]
async fn http_fetch_non_json_is_invalid_response() {
    let app = Router::new().route(DEFAULT_FETCH_PATH, get(|| async { "not json" }));
    let source = HttpAssemblySource::new(spawn(app).await);
    assert!(matches!(source.fetch(None).await, Err(SourceError::InvalidResponse(_))));
}

#[tokio::test]
async fn http_fetch_unreachable_is_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let source = HttpAssemblySource::new(format!("http://{}", addr));
    assert!(matches!(source.fetch(None).await, Err(SourceError::NetworkError(_))));
}

#[tokio::test]
async fn http_fetch_cancelled() {
    let app = Router::new().route(
        DEFAULT_FETCH_PATH,
        get(|| async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            "late"
        }),
    );
    let source = HttpAssemblySource::new(spawn(app).await);
    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });
    assert!(matches!(source.fetch(Some(token)).await, Err(SourceError::Cancelled)));
}

#[tokio::test]
async fn http_fetch_timeout() {
    let app = Router::new().route(
        DEFAULT_FETCH_PATH,
        get(|| async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            "late"
        }),
    );
    let source = HttpAssemblySource::new(spawn(app).await)
        .with_timeout(Duration::from_millis(100))
        .unwrap();
    assert!(matches!(source.fetch(None).await, Err(SourceError::NetworkError(_))));
}

// ===========================================================================
// HttpAssemblySource: submit
// ===========================================================================

#[tokio::test]
async fn http_submit_returns_canonical_document() {
    let app = Router::new().route(
        DEFAULT_SUBMIT_PATH,
        post(|Json(mut body): Json<serde_json::Value>| async move {
            body["children"][0]["attach_to"] = json!("root (canonical)");
            Json(body)
        }),
    );
    let source = HttpAssemblySource::new(spawn(app).await);
    let canonical = source.submit(&sample(), None).await.unwrap();
    assert_eq!(canonical.children[0].attach_to, "root (canonical)");
}

#[tokio::test]
async fn http_submit_rejection_carries_error_payload() {
    let app = Router::new().route(
        DEFAULT_SUBMIT_PATH,
        post(|| async {
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({"error": "duplicate name"})),
            )
        }),
    );
    let source = HttpAssemblySource::new(spawn(app).await);
    match source.submit(&sample(), None).await {
        Err(SourceError::Rejected { status, message }) => {
            assert_eq!(status, 422);
            assert_eq!(message, "duplicate name");
        }
        other => panic!("Expected Rejected, got {:?}", other),
    }
}

#[tokio::test]
async fn http_submit_rejection_plain_text() {
    let app = Router::new().route(
        DEFAULT_SUBMIT_PATH,
        post(|| async { (StatusCode::CONFLICT, "stale") }),
    );
    let source = HttpAssemblySource::new(spawn(app).await);
    match source.submit(&sample(), None).await {
        Err(SourceError::Rejected { status, message }) => {
            assert_eq!(status, 409);
            assert_eq!(message, "stale");
        }
        other => panic!("Expected Rejected, got {:?}", other),
    }
}

// ===========================================================================
// MemorySource
// ===========================================================================

#[tokio::test]
async fn memory_fetch_and_submit() {
    let source = MemorySource::new(sample());
    assert_eq!(source.fetch(None).await.unwrap(), sample());

    let mut next = sample();
    next.children.push(Component::plain("extra").rotated([0.0, 0.0, 0.0, 2.0]));
    let canonical = source.submit(&next, None).await.unwrap();
    assert_eq!(canonical.children[1].attachment_rotation, [0.0, 0.0, 0.0, 1.0]);
    assert_eq!(source.document(), canonical);
    assert_eq!(source.fetch_count(), 1);
    assert_eq!(source.submit_count(), 1);
}

#[tokio::test]
async fn memory_scripted_failures_are_one_shot() {
    let source = MemorySource::new(sample());
    source.fail_next("offline");
    assert!(matches!(source.fetch(None).await, Err(SourceError::RequestFailed(_))));
    assert!(source.fetch(None).await.is_ok());

    source.reject_next("no");
    assert!(matches!(
        source.submit(&sample(), None).await,
        Err(SourceError::Rejected { status: 422, .. })
    ));
    assert!(source.submit(&sample(), None).await.is_ok());
}

#[tokio::test]
async fn memory_rejects_invalid_document() {
    let source = MemorySource::new(sample());
    let bad = Component::plain("not_root");
    assert!(matches!(source.submit(&bad, None).await, Err(SourceError::Rejected { .. })));
    assert_eq!(source.document(), sample());
}

#[tokio::test]
async fn memory_respects_cancelled_token() {
    let source = MemorySource::new(sample());
    let token = CancellationToken::new();
    token.cancel();
    assert!(matches!(source.fetch(Some(token)).await, Err(SourceError::Cancelled)));
}
