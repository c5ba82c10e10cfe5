use crate::content_id::ContentId;
use crate::error::StoreError;
use async_trait::async_trait;
use std::collections::HashMap;

/// Key prefix for approval records. Presence of `approved:<id> = true`
/// denotes approval; absence or deletion denotes "not approved".
pub const APPROVAL_PREFIX: &str = "approved:";

#[must_use]
pub fn approval_key(id: &ContentId) -> String {
    format!("{APPROVAL_PREFIX}{id}")
}

/// Inverse of [`approval_key`]: recover the content identifier from a key.
#[must_use]
pub fn content_id_of(key: &str) -> Option<ContentId> {
    key.strip_prefix(APPROVAL_PREFIX)
        .filter(|rest| !rest.is_empty())
        .map(ContentId::new)
}

/// Result of an approval lookup, modelled as an explicit tri-state so that
/// "key missing" and "store failed" can never be confused by accident.
/// Both non-approved states resolve to the blocked branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalLookup {
    Approved,
    NotApproved,
    Failed,
}

impl ApprovalLookup {
    #[must_use]
    pub const fn is_approved(self) -> bool {
        matches!(self, Self::Approved)
    }
}

/// Durable key-value store shared by every execution context.
///
/// Each key is written atomically and independently; no cross-key
/// transactions exist because every decision is scoped to one content
/// identifier. `get_all` enumerates in insertion order, oldest first, which
/// is what retention housekeeping prunes by.
#[async_trait]
pub trait ApprovalStore: Send + Sync {
    fn name(&self) -> &str;

    async fn health_check(&self) -> bool;

    async fn get(&self, keys: &[String]) -> Result<HashMap<String, bool>, StoreError>;

    async fn set(&self, entries: HashMap<String, bool>) -> Result<(), StoreError>;

    async fn remove(&self, keys: &[String]) -> Result<(), StoreError>;

    /// All entries in insertion order, oldest first. Re-setting an existing
    /// key refreshes its position.
    async fn get_all(&self) -> Result<Vec<(String, bool)>, StoreError>;

    async fn approve(&self, id: &ContentId) -> Result<(), StoreError> {
        self.set(HashMap::from([(approval_key(id), true)])).await
    }

    async fn revoke(&self, id: &ContentId) -> Result<(), StoreError> {
        self.remove(std::slice::from_ref(&approval_key(id))).await
    }

    /// Tri-state lookup. A store failure folds into [`ApprovalLookup::Failed`]
    /// here rather than propagating: lookup errors must never approve.
    async fn lookup(&self, id: &ContentId) -> ApprovalLookup {
        let key = approval_key(id);
        match self.get(std::slice::from_ref(&key)).await {
            Ok(found) => {
                if found.get(&key).copied().unwrap_or(false) {
                    ApprovalLookup::Approved
                } else {
                    ApprovalLookup::NotApproved
                }
            }
            Err(e) => {
                tracing::warn!("approval lookup failed for {id}: {e}");
                ApprovalLookup::Failed
            }
        }
    }
}
