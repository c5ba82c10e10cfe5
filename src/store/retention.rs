use super::traits::{APPROVAL_PREFIX, ApprovalStore};
use crate::error::StoreError;

/// Enforce the retention cap on approval records.
///
/// Enumerates the store, keeps the `cap` most recently inserted approvals and
/// deletes everything older. Deleting a record a user still cares about only
/// means that content re-evaluates as unapproved on its next visit, so this
/// is pure housekeeping with no correctness impact on displayed content.
/// Returns the number of records removed.
pub async fn enforce_cap(store: &dyn ApprovalStore, cap: usize) -> Result<usize, StoreError> {
    let entries = store.get_all().await?;
    let approvals: Vec<String> = entries
        .into_iter()
        .filter(|(key, value)| *value && key.starts_with(APPROVAL_PREFIX))
        .map(|(key, _)| key)
        .collect();

    if approvals.len() <= cap {
        return Ok(0);
    }

    let excess = approvals.len() - cap;
    let doomed: Vec<String> = approvals.into_iter().take(excess).collect();
    store.remove(&doomed).await?;
    tracing::info!(removed = excess, cap, "pruned old approval records");
    Ok(excess)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content_id::ContentId;
    use crate::store::memory::InMemoryApprovalStore;
    use std::collections::HashMap;

    #[tokio::test]
    async fn under_cap_removes_nothing() {
        let store = InMemoryApprovalStore::new();
        for n in 0..10 {
            store.approve(&ContentId::new(format!("vid{n}"))).await.unwrap();
        }
        assert_eq!(enforce_cap(&store, 100).await.unwrap(), 0);
        assert_eq!(store.get_all().await.unwrap().len(), 10);
    }

    #[tokio::test]
    async fn over_cap_keeps_most_recently_inserted() {
        let store = InMemoryApprovalStore::new();
        for n in 0..130 {
            store.approve(&ContentId::new(format!("vid{n:03}"))).await.unwrap();
        }

        assert_eq!(enforce_cap(&store, 100).await.unwrap(), 30);

        let survivors = store.get_all().await.unwrap();
        assert_eq!(survivors.len(), 100);
        assert_eq!(survivors.first().unwrap().0, "approved:vid030");
        assert_eq!(survivors.last().unwrap().0, "approved:vid129");
    }

    #[tokio::test]
    async fn foreign_keys_are_left_alone() {
        let store = InMemoryApprovalStore::new();
        store
            .set(HashMap::from([("settings:volume".to_string(), true)]))
            .await
            .unwrap();
        for n in 0..3 {
            store.approve(&ContentId::new(format!("vid{n}"))).await.unwrap();
        }

        enforce_cap(&store, 1).await.unwrap();

        let keys: Vec<String> = store
            .get_all()
            .await
            .unwrap()
            .into_iter()
            .map(|(key, _)| key)
            .collect();
        assert!(keys.contains(&"settings:volume".to_string()));
        assert!(keys.contains(&"approved:vid2".to_string()));
        assert_eq!(keys.len(), 2);
    }

    #[tokio::test]
    async fn store_failure_propagates() {
        let store = InMemoryApprovalStore::new();
        store.set_unavailable(true);
        assert!(enforce_cap(&store, 100).await.is_err());
    }
}
