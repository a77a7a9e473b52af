//! In-process scenario tests for desk-daemon HTTP endpoints.
//!
//! These tests spin up the Axum router **without** binding a TCP socket.
//! Each test builds the router over a fresh in-memory store and drives it
//! via `tower::ServiceExt::oneshot`; no network or database required.

use std::sync::Arc;

use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use desk_daemon::{api_types, routes, state};
use tower::ServiceExt; // oneshot

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn call(router: axum::Router, req: Request<axum::body::Body>) -> (StatusCode, bytes::Bytes) {
    let resp = router.oneshot(req).await.expect("oneshot failed");
    let status = resp.status();
    let body = resp
        .into_body()
        .collect()
        .await
        .expect("body collect failed")
        .to_bytes();
    (status, body)
}

fn get(uri: &str) -> Request<axum::body::Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<axum::body::Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .unwrap()
}

fn parse_json(b: bytes::Bytes) -> serde_json::Value {
    serde_json::from_slice(&b).expect("body is not valid JSON")
}

fn text(b: &bytes::Bytes) -> &str {
    std::str::from_utf8(b).expect("body is not utf-8")
}

// ---------------------------------------------------------------------------
// Liveness
// ---------------------------------------------------------------------------

#[tokio::test]
async fn ping_returns_pong() {
    let st = Arc::new(state::AppState::in_memory());
    let (status, body) = call(routes::build_router(st), get("/ping")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text(&body), "pong");
}

#[tokio::test]
async fn health_reports_service_and_storage() {
    let st = Arc::new(state::AppState::in_memory());
    let (status, body) = call(routes::build_router(st), get("/v1/health")).await;
    assert_eq!(status, StatusCode::OK);

    let json = parse_json(body);
    assert_eq!(json["ok"], true);
    assert_eq!(json["service"], "desk-daemon");
    assert_eq!(json["storage"], "memory");
}

// ---------------------------------------------------------------------------
// Listing on a fresh daemon
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fresh_lists_are_empty_arrays() {
    let st = Arc::new(state::AppState::in_memory());
    for uri in ["/allHoldings", "/allPositions", "/allOrders"] {
        let (status, body) = call(routes::build_router(Arc::clone(&st)), get(uri)).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(parse_json(body), serde_json::json!([]), "{uri}");
    }
}

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

#[tokio::test]
async fn add_holdings_seeds_demo_rows() {
    let st = Arc::new(state::AppState::in_memory());

    let (status, body) = call(routes::build_router(Arc::clone(&st)), get("/addHoldings")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text(&body), api_types::HOLDINGS_SEEDED);

    let (_, body) = call(routes::build_router(Arc::clone(&st)), get("/allHoldings")).await;
    let json = parse_json(body);
    let rows = json.as_array().unwrap();
    assert_eq!(rows.len(), 5);

    let infy = rows.iter().find(|r| r["name"] == "INFY").unwrap();
    assert_eq!(infy["qty"], 1);
    assert_eq!(infy["avg"], 1350.5);
    assert_eq!(infy["price"], 1555.45);
    assert_eq!(infy["net"], "+15.18%");
    assert_eq!(infy["day"], "-1.60%");
    assert_eq!(infy["isLoss"], true);
}

#[tokio::test]
async fn add_holdings_twice_fails_without_duplicates() {
    let st = Arc::new(state::AppState::in_memory());
    let _ = call(routes::build_router(Arc::clone(&st)), get("/addHoldings")).await;

    let (status, body) = call(routes::build_router(Arc::clone(&st)), get("/addHoldings")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(text(&body), api_types::HOLDINGS_SEED_FAILED);

    let (_, body) = call(routes::build_router(Arc::clone(&st)), get("/allHoldings")).await;
    assert_eq!(parse_json(body).as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn add_positions_seeds_demo_rows() {
    let st = Arc::new(state::AppState::in_memory());

    let (status, body) = call(routes::build_router(Arc::clone(&st)), get("/addPositions")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text(&body), api_types::POSITIONS_SEEDED);

    let (_, body) = call(routes::build_router(Arc::clone(&st)), get("/allPositions")).await;
    let json = parse_json(body);
    let rows = json.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["name"], "EVEREADY");
    assert_eq!(rows[0]["product"], "CNC");
    assert_eq!(rows[1]["name"], "JUBLFOOD");
    assert_eq!(rows[1]["isLoss"], true);
}

// ---------------------------------------------------------------------------
// POST /newOrder input handling
// ---------------------------------------------------------------------------

#[tokio::test]
async fn new_order_rejects_bad_fields_with_400() {
    let st = Arc::new(state::AppState::in_memory());

    let bad = [
        serde_json::json!({"name": "INFY", "qty": 0, "price": 100.0, "mode": "BUY"}),
        serde_json::json!({"name": "INFY", "qty": -2, "price": 100.0, "mode": "BUY"}),
        serde_json::json!({"name": "INFY", "qty": 2, "price": 0, "mode": "BUY"}),
        serde_json::json!({"name": "INFY", "qty": 2, "price": 100.0, "mode": "HOLD"}),
        serde_json::json!({"name": "", "qty": 2, "price": 100.0, "mode": "BUY"}),
        serde_json::json!({"name": "INFY", "qty": 2.5, "price": 100.0, "mode": "BUY"}),
        serde_json::json!({"name": "INFY", "price": 100.0, "mode": "BUY"}),
    ];

    for body in bad {
        let (status, resp) =
            call(routes::build_router(Arc::clone(&st)), post_json("/newOrder", body.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
        assert!(text(&resp).starts_with("Invalid order"), "body: {body}");
    }

    // Nothing was recorded.
    let (_, body) = call(routes::build_router(Arc::clone(&st)), get("/allOrders")).await;
    assert_eq!(parse_json(body), serde_json::json!([]));
    let (_, body) = call(routes::build_router(Arc::clone(&st)), get("/allHoldings")).await;
    assert_eq!(parse_json(body), serde_json::json!([]));
}

#[tokio::test]
async fn new_order_rejects_non_json_body() {
    let st = Arc::new(state::AppState::in_memory());
    let req = Request::builder()
        .method("POST")
        .uri("/newOrder")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();

    let (status, _) = call(routes::build_router(st), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
