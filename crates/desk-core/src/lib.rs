//! desk-core
//!
//! Holdings, positions and the order ledger for the brokerage dashboard,
//! plus the settlement routine that applies a new order to them.
//! - Storage is reached only through the traits in [`store`]
//! - Settlement is validated before anything is written
//! - Same-instrument settlements are serialized in-process

mod error;
mod locks;
mod memory;
mod types;

pub mod seed;
pub mod settlement;
pub mod store;

pub use error::{QuantityOverflow, SettlementError};
pub use locks::InstrumentLocks;
pub use memory::MemoryStore;
pub use settlement::{
    plan_holding_change, weighted_average, OrderSettlement, SettlementOutcome,
};
pub use store::{
    DeskStore, HoldingChange, HoldingStore, OrderStore, PositionStore, SettlementStore,
};
pub use types::{Holding, Order, OrderKey, OrderTicket, Position, Side, FLAT_CHANGE};
