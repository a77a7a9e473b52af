//! Shared runtime state for desk-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum.

use std::sync::Arc;

use desk_core::{DeskStore, MemoryStore, OrderSettlement};

/// Static build metadata included in health responses.
#[derive(Clone, Debug)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

pub struct AppState {
    pub build: BuildInfo,
    /// Which backend is live: "postgres" | "memory".
    pub storage: &'static str,
    /// Read and seed access.
    pub store: Arc<dyn DeskStore>,
    /// Order submission. Shares `store`.
    pub settlement: OrderSettlement<dyn DeskStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn DeskStore>, storage: &'static str) -> Self {
        Self {
            build: BuildInfo {
                service: "desk-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
            storage,
            settlement: OrderSettlement::new(Arc::clone(&store)),
            store,
        }
    }

    /// Fresh, empty, process-local state.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), "memory")
    }
}
