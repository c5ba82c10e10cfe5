pub mod memory;
pub mod retention;
pub mod sqlite;
pub mod traits;

pub use memory::InMemoryApprovalStore;
pub use sqlite::SqliteApprovalStore;
pub use traits::{APPROVAL_PREFIX, ApprovalLookup, ApprovalStore, approval_key, content_id_of};

use crate::config::Config;
use std::sync::Arc;

/// Factory: create the right store backend from config.
///
/// An unusable sqlite backend falls back to the ephemeral store with a
/// warning. Nothing in an empty store is approved, so the fallback stays on
/// the blocked side of every decision.
pub fn create_store(config: &Config) -> Arc<dyn ApprovalStore> {
    match config.store.backend.as_str() {
        "memory" => Arc::new(InMemoryApprovalStore::new()),
        "sqlite" => match SqliteApprovalStore::open(&config.store_db_path()) {
            Ok(store) => Arc::new(store),
            Err(e) => {
                tracing::warn!("sqlite store unavailable ({e}), falling back to memory");
                Arc::new(InMemoryApprovalStore::new())
            }
        },
        other => {
            tracing::warn!("unknown store backend '{other}', falling back to memory");
            Arc::new(InMemoryApprovalStore::new())
        }
    }
}
