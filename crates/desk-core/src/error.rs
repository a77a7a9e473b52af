use thiserror::Error;

/// Every way an order submission can fail.
///
/// `InsufficientInventory` and `InvalidInput` are expected outcomes that the
/// caller should surface to the user; `Storage` is not.
#[derive(Debug, Error)]
pub enum SettlementError {
    /// SELL for more than is held, or for an instrument not held at all.
    #[error("insufficient inventory for {name}: held {held}, requested {requested}")]
    InsufficientInventory {
        name: String,
        held: i64,
        requested: i64,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// A running quantity would not fit in an `i64`.
///
/// Stores return it inside their `anyhow::Error` so settlement can report it
/// as a rejection rather than a storage failure.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct QuantityOverflow(pub String);

impl SettlementError {
    /// Lift an error from a store write.
    pub fn from_store(e: anyhow::Error) -> Self {
        match e.downcast_ref::<QuantityOverflow>() {
            Some(overflow) => SettlementError::InvalidInput(overflow.to_string()),
            None => SettlementError::Storage(e),
        }
    }


    /// True for rejections the caller caused (maps to a 4xx).
    pub fn is_rejection(&self) -> bool {
        !matches!(self, SettlementError::Storage(_))
    }
}
