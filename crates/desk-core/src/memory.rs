//! In-memory backend.
//!
//! Used by the daemon when no database is configured and by every in-process
//! test. All state sits behind one `RwLock`; `commit_settlement` applies the
//! order and holding writes under a single write guard so readers never see
//! one without the other.

use std::collections::BTreeMap;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::QuantityOverflow;
use crate::store::{HoldingChange, HoldingStore, OrderStore, PositionStore, SettlementStore};
use crate::types::{Holding, Order, OrderKey, OrderTicket, Position};

#[derive(Default)]
struct Tables {
    holdings: BTreeMap<String, Holding>,
    orders: BTreeMap<OrderKey, Order>,
    positions: Vec<Position>,
}

impl Tables {
    fn upsert_order(&mut self, key: &OrderKey, delta_qty: i64, new_price: f64) -> Result<Order> {
        let held = self.orders.get(key).map(|o| o.qty).unwrap_or(0);
        let qty = held.checked_add(delta_qty).ok_or_else(|| {
            QuantityOverflow(format!(
                "order quantity overflow for {} {}: {held} + {delta_qty}",
                key.name, key.mode
            ))
        })?;

        let order = Order {
            name: key.name.clone(),
            mode: key.mode,
            qty,
            price: new_price,
        };
        self.orders.insert(key.clone(), order.clone());
        Ok(order)
    }

    fn create_holding(&mut self, holding: &Holding) -> Result<Holding> {
        if self.holdings.contains_key(&holding.name) {
            return Err(anyhow!("duplicate holding: {}", holding.name));
        }
        self.holdings.insert(holding.name.clone(), holding.clone());
        Ok(holding.clone())
    }

    fn save_holding(&mut self, holding: &Holding) -> Result<Holding> {
        let slot = self
            .holdings
            .get_mut(&holding.name)
            .ok_or_else(|| anyhow!("holding not found: {}", holding.name))?;
        *slot = holding.clone();
        Ok(holding.clone())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn upsert_increment(
        &self,
        key: &OrderKey,
        delta_qty: i64,
        new_price: f64,
    ) -> Result<Order> {
        self.tables.write().await.upsert_order(key, delta_qty, new_price)
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        Ok(self.tables.read().await.orders.values().cloned().collect())
    }
}

#[async_trait]
impl HoldingStore for MemoryStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<Holding>> {
        Ok(self.tables.read().await.holdings.get(name).cloned())
    }

    async fn create(&self, holding: &Holding) -> Result<Holding> {
        self.tables.write().await.create_holding(holding)
    }

    async fn save(&self, holding: &Holding) -> Result<Holding> {
        self.tables.write().await.save_holding(holding)
    }

    async fn delete_by_name(&self, name: &str) -> Result<()> {
        self.tables.write().await.holdings.remove(name);
        Ok(())
    }

    async fn list_holdings(&self) -> Result<Vec<Holding>> {
        Ok(self.tables.read().await.holdings.values().cloned().collect())
    }

    async fn insert_holdings(&self, batch: &[Holding]) -> Result<()> {
        let mut t = self.tables.write().await;
        let mut seen = std::collections::BTreeSet::new();
        for h in batch {
            if t.holdings.contains_key(&h.name) || !seen.insert(h.name.as_str()) {
                return Err(anyhow!("duplicate holding: {}", h.name));
            }
        }
        for h in batch {
            t.holdings.insert(h.name.clone(), h.clone());
        }
        Ok(())
    }
}

#[async_trait]
impl PositionStore for MemoryStore {
    async fn list_positions(&self) -> Result<Vec<Position>> {
        Ok(self.tables.read().await.positions.clone())
    }

    async fn insert_positions(&self, batch: &[Position]) -> Result<()> {
        self.tables.write().await.positions.extend_from_slice(batch);
        Ok(())
    }
}

#[async_trait]
impl SettlementStore for MemoryStore {
    async fn commit_settlement(&self, ticket: &OrderTicket, change: &HoldingChange) -> Result<Order> {
        let mut t = self.tables.write().await;

        // Check the holding write first so a failure leaves the ledger alone.
        match change {
            HoldingChange::Create(h) if t.holdings.contains_key(&h.name) => {
                return Err(anyhow!("duplicate holding: {}", h.name));
            }
            HoldingChange::Update(h) if !t.holdings.contains_key(&h.name) => {
                return Err(anyhow!("holding not found: {}", h.name));
            }
            _ => {}
        }

        let order = t.upsert_order(&ticket.key(), ticket.qty(), ticket.price())?;
        match change {
            HoldingChange::Create(h) => {
                t.create_holding(h)?;
            }
            HoldingChange::Update(h) => {
                t.save_holding(h)?;
            }
            HoldingChange::Delete { name } => {
                t.holdings.remove(name);
            }
        }
        Ok(order)
    }
}
