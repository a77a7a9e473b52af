//! Request and response types for the desk-daemon HTTP endpoints.
//!
//! The dashboard front-end expects plain-text confirmations on the write
//! routes; those strings live here too so tests can match them exactly.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// /v1/health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: String,
    pub version: String,
    /// "postgres" | "memory"
    pub storage: String,
}

// ---------------------------------------------------------------------------
// POST /newOrder
// ---------------------------------------------------------------------------

/// Raw order body. Field-level validation happens in
/// [`desk_core::OrderTicket::from_wire`], not in serde.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderRequest {
    pub name: String,
    pub qty: i64,
    pub price: f64,
    pub mode: String,
}

pub const ORDER_SETTLED: &str = "Order and Holdings updated successfully!";
pub const NOT_ENOUGH_STOCK: &str = "Not enough stock to sell";
pub const SERVER_ERROR: &str = "Server error";

// ---------------------------------------------------------------------------
// Seeding and listing
// ---------------------------------------------------------------------------

pub const HOLDINGS_SEEDED: &str = "Holdings inserted successfully!";
pub const HOLDINGS_SEED_FAILED: &str = "Error inserting holdings";
pub const POSITIONS_SEEDED: &str = "Positions inserted successfully!";
pub const POSITIONS_SEED_FAILED: &str = "Error inserting positions";

pub const HOLDINGS_LIST_FAILED: &str = "Server error while fetching holdings";
pub const POSITIONS_LIST_FAILED: &str = "Server error while fetching positions";
pub const ORDERS_LIST_FAILED: &str = "Server error while fetching orders";
