use super::traits::ApprovalStore;
use crate::error::StoreError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

/// Ephemeral approval store. Used for `backend = "memory"` runs and as the
/// test double; `set_unavailable` lets tests exercise the fail-closed path.
#[derive(Default)]
pub struct InMemoryApprovalStore {
    entries: Mutex<Vec<(String, bool)>>,
    unavailable: AtomicBool,
}

impl InMemoryApprovalStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail with `StoreError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("backend offline".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ApprovalStore for InMemoryApprovalStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn health_check(&self) -> bool {
        self.check_available().is_ok()
    }

    async fn get(&self, keys: &[String]) -> Result<HashMap<String, bool>, StoreError> {
        self.check_available()?;
        let entries = self.entries.lock().await;
        Ok(entries
            .iter()
            .filter(|(key, _)| keys.contains(key))
            .map(|(key, value)| (key.clone(), *value))
            .collect())
    }

    async fn set(&self, new_entries: HashMap<String, bool>) -> Result<(), StoreError> {
        self.check_available()?;
        let mut entries = self.entries.lock().await;
        for (key, value) in new_entries {
            entries.retain(|(existing, _)| *existing != key);
            entries.push((key, value));
        }
        Ok(())
    }

    async fn remove(&self, keys: &[String]) -> Result<(), StoreError> {
        self.check_available()?;
        let mut entries = self.entries.lock().await;
        entries.retain(|(key, _)| !keys.contains(key));
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<(String, bool)>, StoreError> {
        self.check_available()?;
        Ok(self.entries.lock().await.clone())
    }
}
