//! Axum router and all HTTP handlers for desk-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers. Tests compose the bare router directly.
//!
//! Route paths are the ones the dashboard front-end already calls, so they
//! keep their camelCase names.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use desk_core::{seed, HoldingStore, OrderStore, OrderTicket, PositionStore, SettlementError};
use tracing::{error, info, warn};

use crate::{
    api_types::{
        HealthResponse, NewOrderRequest, HOLDINGS_LIST_FAILED, HOLDINGS_SEEDED,
        HOLDINGS_SEED_FAILED, NOT_ENOUGH_STOCK, ORDERS_LIST_FAILED, ORDER_SETTLED,
        POSITIONS_LIST_FAILED, POSITIONS_SEEDED, POSITIONS_SEED_FAILED, SERVER_ERROR,
    },
    state::AppState,
};

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the complete application router wired to the given shared state.
///
/// Middleware layers (CORS, tracing) are **not** applied here.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ping", get(ping))
        .route("/v1/health", get(health))
        .route("/allHoldings", get(all_holdings))
        .route("/allPositions", get(all_positions))
        .route("/allOrders", get(all_orders))
        .route("/addHoldings", get(add_holdings))
        .route("/addPositions", get(add_positions))
        .route("/newOrder", post(new_order))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Liveness
// ---------------------------------------------------------------------------

pub(crate) async fn ping() -> &'static str {
    "pong"
}

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service.to_string(),
            version: st.build.version.to_string(),
            storage: st.storage.to_string(),
        }),
    )
}

// ---------------------------------------------------------------------------
// GET /allHoldings  /allPositions  /allOrders
// ---------------------------------------------------------------------------

pub(crate) async fn all_holdings(State(st): State<Arc<AppState>>) -> Response {
    match st.store.list_holdings().await {
        Ok(rows) => (StatusCode::OK, Json(rows)).into_response(),
        Err(e) => {
            error!(error = %format!("{e:#}"), "failed to fetch holdings");
            (StatusCode::INTERNAL_SERVER_ERROR, HOLDINGS_LIST_FAILED).into_response()
        }
    }
}

pub(crate) async fn all_positions(State(st): State<Arc<AppState>>) -> Response {
    match st.store.list_positions().await {
        Ok(rows) => (StatusCode::OK, Json(rows)).into_response(),
        Err(e) => {
            error!(error = %format!("{e:#}"), "failed to fetch positions");
            (StatusCode::INTERNAL_SERVER_ERROR, POSITIONS_LIST_FAILED).into_response()
        }
    }
}

pub(crate) async fn all_orders(State(st): State<Arc<AppState>>) -> Response {
    match st.store.list_orders().await {
        Ok(rows) => (StatusCode::OK, Json(rows)).into_response(),
        Err(e) => {
            error!(error = %format!("{e:#}"), "failed to fetch orders");
            (StatusCode::INTERNAL_SERVER_ERROR, ORDERS_LIST_FAILED).into_response()
        }
    }
}

// ---------------------------------------------------------------------------
// GET /addHoldings  /addPositions  (demo seeding)
// ---------------------------------------------------------------------------

pub(crate) async fn add_holdings(State(st): State<Arc<AppState>>) -> Response {
    let batch = seed::demo_holdings();
    match st.store.insert_holdings(&batch).await {
        Ok(()) => {
            info!(rows = batch.len(), "seeded holdings");
            (StatusCode::OK, HOLDINGS_SEEDED).into_response()
        }
        Err(e) => {
            error!(error = %format!("{e:#}"), "failed to seed holdings");
            (StatusCode::INTERNAL_SERVER_ERROR, HOLDINGS_SEED_FAILED).into_response()
        }
    }
}

pub(crate) async fn add_positions(State(st): State<Arc<AppState>>) -> Response {
    let batch = seed::demo_positions();
    match st.store.insert_positions(&batch).await {
        Ok(()) => {
            info!(rows = batch.len(), "seeded positions");
            (StatusCode::OK, POSITIONS_SEEDED).into_response()
        }
        Err(e) => {
            error!(error = %format!("{e:#}"), "failed to seed positions");
            (StatusCode::INTERNAL_SERVER_ERROR, POSITIONS_SEED_FAILED).into_response()
        }
    }
}

// ---------------------------------------------------------------------------
// POST /newOrder
// ---------------------------------------------------------------------------

/// Settle one order.
///
/// 200 on success, 400 for a rejected or malformed order, 500 when storage
/// fails. The storage cause is logged, never returned to the caller.
pub(crate) async fn new_order(
    State(st): State<Arc<AppState>>,
    payload: Result<Json<NewOrderRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(p) => p,
        Err(rej) => {
            let reason = rej.body_text();
            warn!(%reason, "newOrder: malformed body");
            return (StatusCode::BAD_REQUEST, format!("Invalid order: {reason}")).into_response();
        }
    };

    let ticket = match OrderTicket::from_wire(&req.name, req.qty, req.price, &req.mode) {
        Ok(t) => t,
        Err(e) => return settlement_error_response(e),
    };

    match st.settlement.submit_order(&ticket).await {
        Ok(_) => (StatusCode::OK, ORDER_SETTLED).into_response(),
        Err(e) => settlement_error_response(e),
    }
}

fn settlement_error_response(e: SettlementError) -> Response {
    match e {
        SettlementError::InsufficientInventory { .. } => {
            (StatusCode::BAD_REQUEST, NOT_ENOUGH_STOCK).into_response()
        }
        SettlementError::InvalidInput(reason) => {
            warn!(%reason, "newOrder: invalid input");
            (StatusCode::BAD_REQUEST, format!("Invalid order: {reason}")).into_response()
        }
        SettlementError::Storage(cause) => {
            error!(error = %format!("{cause:#}"), "order update error");
            (StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR).into_response()
        }
    }
}
