//! Order settlement: apply one order to the order ledger and the holding.
//!
//! Rules:
//! - BUY on an existing holding: qty adds up, `avg` becomes the
//!   quantity-weighted average of old cost and new price, `price` = order price.
//! - BUY with nothing held: open a holding at `avg = price`.
//! - SELL with nothing held, or more than held: `InsufficientInventory`.
//! - SELL down to exactly zero: delete the holding.
//! - Partial SELL: reduce qty and record the order price as last price;
//!   `avg` is not reduced.
//!
//! The holding change is planned and validated before anything is written,
//! so a rejected order leaves both the ledger and the holding untouched.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::SettlementError;
use crate::locks::InstrumentLocks;
use crate::store::{HoldingChange, SettlementStore};
use crate::types::{Holding, Order, OrderTicket, Side};

/// Result of a successful settlement.
#[derive(Clone, Debug, PartialEq)]
pub struct SettlementOutcome {
    /// Order ledger row for the ticket's (name, mode) after the increment.
    pub order: Order,
    /// Holding after the change; `None` when the sell closed it out.
    pub holding: Option<Holding>,
}

/// `(q*avg + qty*price) / (q + qty)`
///
/// Summed in `f64`, so it never overflows; a result too large to represent
/// comes back as `inf`.
pub fn weighted_average(held_qty: i64, held_avg: f64, qty: i64, price: f64) -> f64 {
    let total = held_qty as f64 + qty as f64;
    (held_qty as f64 * held_avg + qty as f64 * price) / total
}

/// Decide what `ticket` does to the current holding. Pure; no IO.
///
/// A partial SELL keeps `avg` and records the sell price as the last `price`.
/// A BUY whose quantity or average cost cannot be represented is rejected
/// with `InvalidInput`.
pub fn plan_holding_change(
    existing: Option<&Holding>,
    ticket: &OrderTicket,
) -> Result<HoldingChange, SettlementError> {
    match ticket.mode() {
        Side::Buy => match existing {
            Some(h) => {
                let qty = h.qty.checked_add(ticket.qty()).ok_or_else(|| {
                    SettlementError::InvalidInput(format!(
                        "quantity overflow for {}: held {} + bought {}",
                        h.name,
                        h.qty,
                        ticket.qty()
                    ))
                })?;
                let avg = weighted_average(h.qty, h.avg, ticket.qty(), ticket.price());
                if !avg.is_finite() {
                    return Err(SettlementError::InvalidInput(format!(
                        "average cost for {} is out of range",
                        h.name
                    )));
                }

                let mut next = h.clone();
                next.qty = qty;
                next.avg = avg;
                next.price = ticket.price();
                Ok(HoldingChange::Update(next))
            }
            None => Ok(HoldingChange::Create(Holding::opened_at(
                ticket.name(),
                ticket.qty(),
                ticket.price(),
            ))),
        },
        Side::Sell => {
            let held = existing.map(|h| h.qty).unwrap_or(0);
            let h = match existing {
                Some(h) if h.qty >= ticket.qty() => h,
                _ => {
                    return Err(SettlementError::InsufficientInventory {
                        name: ticket.name().to_string(),
                        held,
                        requested: ticket.qty(),
                    })
                }
            };

            let remaining = h.qty - ticket.qty();
            if remaining == 0 {
                Ok(HoldingChange::Delete {
                    name: h.name.clone(),
                })
            } else {
                let mut next = h.clone();
                next.qty = remaining;
                next.price = ticket.price();
                Ok(HoldingChange::Update(next))
            }
        }
    }
}

/// Settlement service. One per process; cheap to share behind an `Arc`.
pub struct OrderSettlement<S: SettlementStore + ?Sized> {
    store: Arc<S>,
    locks: InstrumentLocks,
}

impl<S: SettlementStore + ?Sized> OrderSettlement<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            locks: InstrumentLocks::new(),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Settle one order.
    ///
    /// Same-instrument calls are serialized: everything from the holding read
    /// through the commit runs under the instrument's lock.
    pub async fn submit_order(
        &self,
        ticket: &OrderTicket,
    ) -> Result<SettlementOutcome, SettlementError> {
        let _guard = self.locks.lock(ticket.name()).await;

        let existing = self.store.find_by_name(ticket.name()).await?;
        let change = match plan_holding_change(existing.as_ref(), ticket) {
            Ok(c) => c,
            Err(e) => {
                warn!(
                    name = ticket.name(),
                    mode = %ticket.mode(),
                    qty = ticket.qty(),
                    error = %e,
                    "order rejected"
                );
                return Err(e);
            }
        };

        let order = self
            .store
            .commit_settlement(ticket, &change)
            .await
            .map_err(SettlementError::from_store)?;
        let holding = change.resulting().cloned();

        info!(
            name = ticket.name(),
            mode = %ticket.mode(),
            qty = ticket.qty(),
            price = ticket.price(),
            held_after = holding.as_ref().map(|h| h.qty).unwrap_or(0),
            "order settled"
        );

        Ok(SettlementOutcome { order, holding })
    }
}
