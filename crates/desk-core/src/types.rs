use serde::{Deserialize, Serialize};

use crate::error::SettlementError;

/// Display default for the `net` / `day` change strings of a fresh holding.
pub const FLAT_CHANGE: &str = "+0%";

/// BUY or SELL side of an order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }

    /// Exact, case-sensitive parse of the wire value.
    pub fn parse(s: &str) -> Result<Self, SettlementError> {
        match s {
            "BUY" => Ok(Side::Buy),
            "SELL" => Ok(Side::Sell),
            other => Err(SettlementError::InvalidInput(format!(
                "mode must be BUY or SELL, got {other:?}"
            ))),
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current aggregate position in one instrument.
///
/// `qty` is always > 0 for a persisted holding; `avg` is only meaningful while
/// something is held, which is why a holding sold down to zero is deleted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub name: String,
    pub qty: i64,
    pub avg: f64,
    pub price: f64,
    #[serde(default = "flat_change")]
    pub net: String,
    #[serde(default = "flat_change")]
    pub day: String,
    #[serde(rename = "isLoss", default)]
    pub is_loss: bool,
}

impl Holding {
    /// First purchase of an instrument: cost basis is the purchase price.
    pub fn opened_at(name: impl Into<String>, qty: i64, price: f64) -> Self {
        Self {
            name: name.into(),
            qty,
            avg: price,
            price,
            net: FLAT_CHANGE.to_string(),
            day: FLAT_CHANGE.to_string(),
            is_loss: false,
        }
    }
}

fn flat_change() -> String {
    FLAT_CHANGE.to_string()
}

/// Composite key of the order ledger.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OrderKey {
    pub name: String,
    pub mode: Side,
}

/// Running total of every submission for one (instrument, side) pair.
///
/// `qty` accumulates; `price` is the most recent submitted price.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub name: String,
    pub mode: Side,
    pub qty: i64,
    pub price: f64,
}

impl Order {
    pub fn key(&self) -> OrderKey {
        OrderKey {
            name: self.name.clone(),
            mode: self.mode,
        }
    }
}

/// Display-only open position row. Settlement never touches these.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub product: String,
    pub name: String,
    pub qty: i64,
    pub avg: f64,
    pub price: f64,
    #[serde(default = "flat_change")]
    pub net: String,
    #[serde(default = "flat_change")]
    pub day: String,
    #[serde(rename = "isLoss", default)]
    pub is_loss: bool,
}

/// A validated order submission.
///
/// Construction goes through [`OrderTicket::new`], so every ticket in the
/// system has a non-empty name, `qty > 0` and a finite `price > 0`.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderTicket {
    name: String,
    qty: i64,
    price: f64,
    mode: Side,
}

impl OrderTicket {
    pub fn new(
        name: impl AsRef<str>,
        qty: i64,
        price: f64,
        mode: Side,
    ) -> Result<Self, SettlementError> {
        let name = name.as_ref().trim();
        if name.is_empty() {
            return Err(SettlementError::InvalidInput(
                "name must not be empty".to_string(),
            ));
        }
        if qty <= 0 {
            return Err(SettlementError::InvalidInput(format!(
                "qty must be > 0, got {qty}"
            )));
        }
        if !price.is_finite() || price <= 0.0 {
            return Err(SettlementError::InvalidInput(format!(
                "price must be a finite number > 0, got {price}"
            )));
        }
        Ok(Self {
            name: name.to_string(),
            qty,
            price,
            mode,
        })
    }

    /// Parse the raw wire fields of a `/newOrder` body.
    pub fn from_wire(
        name: &str,
        qty: i64,
        price: f64,
        mode: &str,
    ) -> Result<Self, SettlementError> {
        let side = Side::parse(mode)?;
        Self::new(name, qty, price, side)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn qty(&self) -> i64 {
        self.qty
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn mode(&self) -> Side {
        self.mode
    }

    pub fn key(&self) -> OrderKey {
        OrderKey {
            name: self.name.clone(),
            mode: self.mode,
        }
    }
}
