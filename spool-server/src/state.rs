//! Application state shared across all request handlers.

use spool_core::address::Address;
use spool_core::store::EntityStore;
use std::sync::Arc;

/// Cloneable handle to the read side of the entity store.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EntityStore>,
    /// Id of the pool served at `/pool`.
    pub pool_id: Address,
}

impl AppState {
    pub fn new(store: Arc<dyn EntityStore>, pool_id: Address) -> Self {
        Self { store, pool_id }
    }
}
