//! A backend that fails every call must surface as 500 with a generic body;
//! the storage cause stays in the logs.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::http::{Request, StatusCode};
use desk_core::{
    Holding, HoldingStore, Order, OrderKey, OrderStore, Position, PositionStore, SettlementStore,
};
use desk_daemon::{api_types, routes, state::AppState};
use http_body_util::BodyExt;
use tower::ServiceExt;

struct UnreachableDb;

#[async_trait]
impl OrderStore for UnreachableDb {
    async fn upsert_increment(&self, _: &OrderKey, _: i64, _: f64) -> Result<Order> {
        Err(anyhow!("connection refused"))
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        Err(anyhow!("connection refused"))
    }
}

#[async_trait]
impl HoldingStore for UnreachableDb {
    async fn find_by_name(&self, _: &str) -> Result<Option<Holding>> {
        Err(anyhow!("connection refused"))
    }

    async fn create(&self, _: &Holding) -> Result<Holding> {
        Err(anyhow!("connection refused"))
    }

    async fn save(&self, _: &Holding) -> Result<Holding> {
        Err(anyhow!("connection refused"))
    }

    async fn delete_by_name(&self, _: &str) -> Result<()> {
        Err(anyhow!("connection refused"))
    }

    async fn list_holdings(&self) -> Result<Vec<Holding>> {
        Err(anyhow!("connection refused"))
    }

    async fn insert_holdings(&self, _: &[Holding]) -> Result<()> {
        Err(anyhow!("connection refused"))
    }
}

#[async_trait]
impl PositionStore for UnreachableDb {
    async fn list_positions(&self) -> Result<Vec<Position>> {
        Err(anyhow!("connection refused"))
    }

    async fn insert_positions(&self, _: &[Position]) -> Result<()> {
        Err(anyhow!("connection refused"))
    }
}

impl SettlementStore for UnreachableDb {}

fn state() -> Arc<AppState> {
    Arc::new(AppState::new(Arc::new(UnreachableDb), "test"))
}

async fn call(st: &Arc<AppState>, req: Request<axum::body::Body>) -> (StatusCode, String) {
    let resp = routes::build_router(Arc::clone(st))
        .oneshot(req)
        .await
        .expect("oneshot failed");
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

fn get(uri: &str) -> Request<axum::body::Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap()
}

#[tokio::test]
async fn new_order_storage_failure_is_generic_500() {
    let st = state();
    let req = Request::builder()
        .method("POST")
        .uri("/newOrder")
        .header("content-type", "application/json")
        .body(axum::body::Body::from(
            r#"{"name":"INFY","qty":1,"price":100.0,"mode":"BUY"}"#,
        ))
        .unwrap();

    let (status, body) = call(&st, req).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, api_types::SERVER_ERROR);
    assert!(!body.contains("connection refused"));
}

#[tokio::test]
async fn list_and_seed_failures_are_500() {
    let st = state();
    let cases = [
        ("/allHoldings", api_types::HOLDINGS_LIST_FAILED),
        ("/allPositions", api_types::POSITIONS_LIST_FAILED),
        ("/allOrders", api_types::ORDERS_LIST_FAILED),
        ("/addHoldings", api_types::HOLDINGS_SEED_FAILED),
        ("/addPositions", api_types::POSITIONS_SEED_FAILED),
    ];

    for (uri, expected) in cases {
        let (status, body) = call(&st, get(uri)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
        assert_eq!(body, expected, "{uri}");
    }
}

#[tokio::test]
async fn health_still_answers_when_storage_is_down() {
    let st = state();
    let (status, body) = call(&st, get("/v1/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"storage\":\"test\""));
}
