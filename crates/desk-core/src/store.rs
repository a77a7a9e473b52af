//! Storage boundary for the desk.
//!
//! The settlement core only ever talks to these traits. Concrete backends are
//! [`MemoryStore`](crate::MemoryStore) (tests, demo mode) and the Postgres
//! store in `desk-db`.
//!
//! All traits are object-safe so the daemon can hold an `Arc<dyn DeskStore>`
//! and `Send + Sync` so they can cross task boundaries.

use anyhow::Result;
use async_trait::async_trait;

use crate::types::{Holding, Order, OrderKey, OrderTicket, Position};

// ---------------------------------------------------------------------------
// Order ledger
// ---------------------------------------------------------------------------

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Create the order for `key` with `delta_qty` / `new_price`, or add
    /// `delta_qty` to the stored quantity and overwrite the stored price.
    ///
    /// Must be atomic for a single key.
    async fn upsert_increment(&self, key: &OrderKey, delta_qty: i64, new_price: f64)
        -> Result<Order>;

    async fn list_orders(&self) -> Result<Vec<Order>>;
}

// ---------------------------------------------------------------------------
// Holdings
// ---------------------------------------------------------------------------

#[async_trait]
pub trait HoldingStore: Send + Sync {
    async fn find_by_name(&self, name: &str) -> Result<Option<Holding>>;

    /// Insert a new holding. Fails if one already exists for `holding.name`.
    async fn create(&self, holding: &Holding) -> Result<Holding>;

    /// Update the existing holding with the same `name` in place.
    async fn save(&self, holding: &Holding) -> Result<Holding>;

    async fn delete_by_name(&self, name: &str) -> Result<()>;

    async fn list_holdings(&self) -> Result<Vec<Holding>>;

    /// All-or-nothing batch insert (seeding). Any duplicate name fails the batch.
    async fn insert_holdings(&self, batch: &[Holding]) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Positions (display only)
// ---------------------------------------------------------------------------

#[async_trait]
pub trait PositionStore: Send + Sync {
    async fn list_positions(&self) -> Result<Vec<Position>>;

    async fn insert_positions(&self, batch: &[Position]) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Settlement commit
// ---------------------------------------------------------------------------

/// What a settlement does to the instrument's holding.
#[derive(Clone, Debug, PartialEq)]
pub enum HoldingChange {
    Create(Holding),
    Update(Holding),
    Delete { name: String },
}

impl HoldingChange {
    /// The holding as it stands after the change, `None` once deleted.
    pub fn resulting(&self) -> Option<&Holding> {
        match self {
            HoldingChange::Create(h) | HoldingChange::Update(h) => Some(h),
            HoldingChange::Delete { .. } => None,
        }
    }
}

#[async_trait]
pub trait SettlementStore: OrderStore + HoldingStore {
    /// Record the order and apply the holding change.
    ///
    /// The default runs the two writes back to back. Backends with
    /// transactions override this so both writes land or neither does.
    async fn commit_settlement(&self, ticket: &OrderTicket, change: &HoldingChange) -> Result<Order> {
        let order = self
            .upsert_increment(&ticket.key(), ticket.qty(), ticket.price())
            .await?;
        match change {
            HoldingChange::Create(h) => {
                self.create(h).await?;
            }
            HoldingChange::Update(h) => {
                self.save(h).await?;
            }
            HoldingChange::Delete { name } => self.delete_by_name(name).await?,
        }
        Ok(order)
    }
}

/// Everything the HTTP surface needs from one backend.
pub trait DeskStore: SettlementStore + PositionStore {}

impl<T: SettlementStore + PositionStore> DeskStore for T {}
