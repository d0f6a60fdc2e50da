use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use poolbook::catalog::Catalog;
use poolbook::engine::Engine;
use poolbook::http::{AppState, cors_layer, create_router};

// ── Test infrastructure ──────────────────────────────────────

fn test_app(name: &str) -> Router {
    let dir = std::env::temp_dir().join("poolbook_int_test");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(format!("{name}.wal"));
    let _ = std::fs::remove_file(&path);

    let engine = Arc::new(Engine::new(path, Catalog::default()).unwrap());
    let state = AppState::new(engine, chrono_tz::Europe::Copenhagen);
    create_router(state, cors_layer(None).unwrap(), Path::new("does-not-exist"))
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(b) => builder
            .header("content-type", "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
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

fn booking_body(resource_id: i64, start_time: &str, duration_minutes: i64) -> Value {
    json!({
        "resource_id": resource_id,
        "name": "Lars",
        "phone": "40 50 60 70",
        "date": "2025-08-30",
        "start_time": start_time,
        "duration_minutes": duration_minutes,
    })
}

// ── Tests ────────────────────────────────────────────────────

#[tokio::test]
async fn healthz_reports_zone() {
    let app = test_app("healthz");
    let (status, body) = call(&app, Method::GET, "/healthz", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true, "tz": "Europe/Copenhagen"}));
}

#[tokio::test]
async fn resources_are_listed_in_order() {
    let app = test_app("resources");
    let (status, body) = call(&app, Method::GET, "/api/resources", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0], json!({"id": 1, "name": "Pool 1"}));
    assert_eq!(body[3], json!({"id": 4, "name": "Shuffleboard 1"}));
}

#[tokio::test]
async fn create_returns_local_times() {
    let app = test_app("create_local");
    let (status, body) = call(&app, Method::POST, "/api/bookings", Some(booking_body(1, "14:00", 90))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "id": 1,
            "resource_id": 1,
            "name": "Lars",
            "phone": "40 50 60 70",
            "start_iso_local": "2025-08-30T14:00:00+02:00",
            "end_iso_local": "2025-08-30T15:30:00+02:00",
        })
    );
}

#[tokio::test]
async fn create_conflict_is_409() {
    let app = test_app("create_conflict");
    call(&app, Method::POST, "/api/bookings", Some(booking_body(1, "14:00", 60))).await;
    let (status, body) = call(&app, Method::POST, "/api/bookings", Some(booking_body(1, "14:30", 60))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["detail"], "Booking overlaps existing reservation");

    // Back-to-back on the same pool and same time on another pool both succeed.
    let (status, _) = call(&app, Method::POST, "/api/bookings", Some(booking_body(1, "15:00", 60))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(&app, Method::POST, "/api/bookings", Some(booking_body(2, "14:30", 60))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn create_input_errors() {
    let app = test_app("create_errors");

    let (status, body) = call(&app, Method::POST, "/api/bookings", Some(booking_body(9, "14:00", 60))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Unknown resource_id");

    let mut bad_time = booking_body(1, "2pm", 60);
    let (status, _) = call(&app, Method::POST, "/api/bookings", Some(bad_time.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    bad_time["start_time"] = json!("14:00");
    bad_time["date"] = json!("30-08-2025");
    let (status, _) = call(&app, Method::POST, "/api/bookings", Some(bad_time)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    for minutes in [10, 481] {
        let (status, _) = call(&app, Method::POST, "/api/bookings", Some(booking_body(1, "14:00", minutes))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    let mut blank = booking_body(1, "14:00", 60);
    blank["name"] = json!("   ");
    let (status, _) = call(&app, Method::POST, "/api/bookings", Some(blank)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, list) = call(&app, Method::GET, "/api/bookings", None).await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn extend_by_minutes_and_absolute_end() {
    let app = test_app("extend");
    call(&app, Method::POST, "/api/bookings", Some(booking_body(1, "10:00", 60))).await;

    let (status, body) = call(&app, Method::PUT, "/api/bookings/1", Some(json!({"add_minutes": 30}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["end_iso_local"], "2025-08-30T11:30:00+02:00");

    let (status, body) = call(
        &app,
        Method::PUT,
        "/api/bookings/1",
        Some(json!({"end_iso_local": "2025-08-30T10:45:00+02:00"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["start_iso_local"], "2025-08-30T10:00:00+02:00");
    assert_eq!(body["end_iso_local"], "2025-08-30T10:45:00+02:00");
}

#[tokio::test]
async fn extend_errors() {
    let app = test_app("extend_errors");
    call(&app, Method::POST, "/api/bookings", Some(booking_body(1, "10:00", 60))).await;
    call(&app, Method::POST, "/api/bookings", Some(booking_body(1, "12:00", 60))).await;

    let (status, body) = call(&app, Method::PUT, "/api/bookings/1", Some(json!({"add_minutes": 90}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["detail"], "Extension overlaps another booking");

    let (status, body) = call(
        &app,
        Method::PUT,
        "/api/bookings/1",
        Some(json!({"end_iso_local": "2025-08-30T09:00:00+02:00"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "New end must be after start");

    let (status, _) = call(&app, Method::PUT, "/api/bookings/1", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(&app, Method::PUT, "/api/bookings/1", Some(json!({"end_iso_local": "soon"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(&app, Method::PUT, "/api/bookings/1", Some(json!({"add_minutes": 0}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = call(&app, Method::PUT, "/api/bookings/99", Some(json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = call(&app, Method::PUT, "/api/bookings/99", Some(json!({"add_minutes": 15}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Failed extensions left the original end untouched.
    let (_, list) = call(&app, Method::GET, "/api/bookings", None).await;
    assert_eq!(list[0]["end_iso_local"], "2025-08-30T11:00:00+02:00");
}

#[tokio::test]
async fn delete_then_not_found() {
    let app = test_app("delete");
    call(&app, Method::POST, "/api/bookings", Some(booking_body(1, "10:00", 60))).await;

    let (status, body) = call(&app, Method::DELETE, "/api/bookings/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));

    let (status, body) = call(&app, Method::DELETE, "/api/bookings/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Booking not found");
}

#[tokio::test]
async fn list_with_range_filter() {
    let app = test_app("list_range");
    for (pool, start) in [(1, "08:00"), (2, "10:00"), (1, "12:00")] {
        call(&app, Method::POST, "/api/bookings", Some(booking_body(pool, start, 60))).await;
    }

    // [09:00, 12:00) local: only the 10:00 booking intersects.
    let uri = "/api/bookings?from_=2025-08-30T09:00:00%2B02:00&to=2025-08-30T12:00:00%2B02:00";
    let (status, body) = call(&app, Method::GET, uri, None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = body.as_array().unwrap().iter().map(|b| b["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![2]);

    // Only a lower bound: the 08:00–09:00 booking ends exactly at it.
    let (_, body) = call(&app, Method::GET, "/api/bookings?from_=2025-08-30T07:00:00Z", None).await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (_, body) = call(&app, Method::GET, "/api/bookings?resource_id=1", None).await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, _) = call(&app, Method::GET, "/api/bookings?to=tomorrow", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
