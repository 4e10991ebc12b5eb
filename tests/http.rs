use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use ttlkv::store::{Clock, ManualClock};
use ttlkv::web::{router, AppState};
use ttlkv::{AuditLog, KvStore, SnapshotFile};

struct TestApp {
    _dir: tempfile::TempDir,
    store: Arc<KvStore>,
    clock: Arc<ManualClock>,
    app: Router,
}

fn test_app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::starting_now());
    let store = Arc::new(KvStore::with_clock(
        SnapshotFile::new(dir.path().join("kv-data.json")),
        AuditLog::disabled(),
        clock.clone(),
    ));
    let app = router(AppState::new(
        Arc::clone(&store),
        Duration::from_secs(24 * 60 * 60),
    ));
    TestApp {
        _dir: dir,
        store,
        clock,
        app,
    }
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let body = match body {
        Some(json) => Body::from(json.to_string()),
        None => Body::empty(),
    };
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(body)
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

#[tokio::test]
async fn set_then_get() {
    let t = test_app();

    let (status, body) = send(
        &t.app,
        Method::POST,
        "/set",
        Some(json!({"Key": "color", "value": "blue", "ttl": "10m"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "Success");

    let (status, body) = send(&t.app, Method::GET, "/get?key=color", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"data": "blue"}));

    let remaining = t.store.entry("color").unwrap().expire_at - t.clock.now();
    assert_eq!(remaining.num_seconds(), 600);
}

#[tokio::test]
async fn get_errors() {
    let t = test_app();

    let (status, _) = send(&t.app, Method::GET, "/get?key=missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&t.app, Method::GET, "/get", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&t.app, Method::GET, "/get?key=", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn set_conflict_and_validation() {
    let t = test_app();
    let body = json!({"Key": "k", "value": "v1", "ttl": "1h"});

    let (status, _) = send(&t.app, Method::POST, "/set", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &t.app,
        Method::POST,
        "/set",
        Some(json!({"Key": "k", "value": "v2", "ttl": "1h"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], "Failure");
    assert_eq!(t.store.get("k").unwrap(), "v1");

    let (status, _) = send(&t.app, Method::POST, "/set", Some(json!({"value": "v"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/set")
        .body(Body::from("{not json"))
        .unwrap();
    let response = t.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn set_with_bad_ttl_uses_default() {
    let t = test_app();

    for (key, ttl) in [
        ("a", json!("soon")),
        ("b", json!("-5m")),
        ("c", Value::Null),
        ("d", json!("3000000h")),
    ] {
        let mut body = json!({"Key": key, "value": "v"});
        if !ttl.is_null() {
            body["ttl"] = ttl;
        }
        let (status, _) = send(&t.app, Method::POST, "/set", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);

        let remaining = t.store.entry(key).unwrap().expire_at - t.clock.now();
        assert_eq!(remaining.num_hours(), 24, "key {}", key);
    }
}

#[tokio::test]
async fn update_via_patch_and_put() {
    let t = test_app();
    t.store.set("k", "v1", Duration::from_secs(60)).unwrap();
    let deadline = t.store.entry("k").unwrap().expire_at;

    let (status, body) = send(
        &t.app,
        Method::PATCH,
        "/update",
        Some(json!({"Key": "k", "value": "v2"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Success");

    let (status, _) = send(
        &t.app,
        Method::PUT,
        "/update",
        Some(json!({"Key": "k", "value": "v3", "ttl": "999h"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let entry = t.store.entry("k").unwrap();
    assert_eq!(entry.value, "v3");
    assert_eq!(entry.expire_at, deadline);
}

#[tokio::test]
async fn update_errors() {
    let t = test_app();

    let (status, body) = send(
        &t.app,
        Method::PATCH,
        "/update",
        Some(json!({"Key": "ghost", "value": "v"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "Failure");

    let (status, _) = send(&t.app, Method::PUT, "/update", Some(json!({"value": "v"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_flow() {
    let t = test_app();
    t.store.set("k", "v", Duration::from_secs(60)).unwrap();

    let (status, body) = send(&t.app, Method::DELETE, "/delete?Key=k", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Success");

    let (status, _) = send(&t.app, Method::GET, "/get?key=k", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&t.app, Method::DELETE, "/delete?Key=k", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&t.app, Method::DELETE, "/delete", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn wrong_method_is_rejected() {
    let t = test_app();

    let (status, _) = send(&t.app, Method::POST, "/get?key=k", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    let (status, _) = send(&t.app, Method::GET, "/set", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    let (status, _) = send(&t.app, Method::POST, "/update", Some(json!({"Key": "k"}))).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}
