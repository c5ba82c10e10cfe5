use crate::analysis::{AnalysisClient, HealthReport};
use crate::config::Config;
use crate::error::{AnalysisError, StoreError};
use crate::messaging::{ContextId, ContextRegistry};
use crate::page::{Injection, PageAgent, PageSurface};
use crate::store::{ApprovalStore, retention};
use std::sync::Arc;
use tokio::time::Duration;

/// Long-lived lifecycle component. Reacts to page lifecycle events by
/// (re-)ensuring an agent is present, runs retention housekeeping over the
/// approval store and brokers health probes. Never decides approval itself.
pub struct Coordinator {
    config: Arc<Config>,
    store: Arc<dyn ApprovalStore>,
    registry: ContextRegistry,
    analysis: AnalysisClient,
}

impl Coordinator {
    pub fn new(
        config: Arc<Config>,
        store: Arc<dyn ApprovalStore>,
        registry: ContextRegistry,
    ) -> Result<Self, AnalysisError> {
        let analysis = AnalysisClient::new(&config.analysis)?;
        Ok(Self {
            config,
            store,
            registry,
            analysis,
        })
    }

    #[must_use]
    pub fn registry(&self) -> &ContextRegistry {
        &self.registry
    }

    /// On page-load completion: make sure exactly one agent runs in
    /// `context`. Safe to call again on every load event; a repeat while an
    /// agent is alive fails harmlessly.
    pub async fn ensure_agent(
        &self,
        context: ContextId,
        surface: Arc<dyn PageSurface>,
    ) -> Injection {
        PageAgent::inject(
            context,
            surface,
            Arc::clone(&self.store),
            &self.config.agent,
            &self.registry,
        )
        .await
    }

    /// Page context destroyed (tab closed, navigated off the host site).
    pub async fn page_closed(&self, context: &ContextId) {
        self.registry.destroy(context).await;
        tracing::debug!(context = %context, "page context destroyed");
    }

    /// Relay an opaque reachability probe to the analysis endpoint.
    pub async fn probe_analysis_health(&self) -> HealthReport {
        self.analysis.probe_health().await
    }

    /// One retention pass over the approval store.
    pub async fn run_retention_once(&self) -> Result<usize, StoreError> {
        retention::enforce_cap(self.store.as_ref(), self.config.retention.cap).await
    }

    /// Periodic retention worker. Runs until the task is dropped.
    pub async fn run_retention_worker(&self) {
        let interval_mins = self.config.retention.interval_minutes.max(1);
        let mut interval = tokio::time::interval(Duration::from_secs(interval_mins * 60));

        loop {
            interval.tick().await;
            match self.run_retention_once().await {
                Ok(0) => {}
                Ok(removed) => tracing::info!(removed, "retention housekeeping complete"),
                Err(e) => tracing::warn!("retention housekeeping failed: {e}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content_id::ContentId;
    use crate::page::{Injection, SimulatedPage};
    use crate::store::InMemoryApprovalStore;

    fn coordinator_with_store() -> (Coordinator, Arc<InMemoryApprovalStore>) {
        let store = Arc::new(InMemoryApprovalStore::new());
        let coordinator = Coordinator::new(
            Arc::new(Config::default()),
            Arc::clone(&store) as Arc<dyn ApprovalStore>,
            ContextRegistry::new(),
        )
        .unwrap();
        (coordinator, store)
    }

    #[tokio::test]
    async fn repeated_injection_is_harmless() {
        let (coordinator, _store) = coordinator_with_store();
        let page = SimulatedPage::new();
        let context = ContextId::new("tab-1");

        let first = coordinator.ensure_agent(context.clone(), page.clone()).await;
        let second = coordinator.ensure_agent(context.clone(), page.clone()).await;

        assert_eq!(first, Injection::Installed);
        assert_eq!(second, Injection::AlreadyPresent);
    }

    #[tokio::test]
    async fn closed_page_frees_the_context() {
        let (coordinator, _store) = coordinator_with_store();
        let page = SimulatedPage::new();
        let context = ContextId::new("tab-1");

        coordinator.ensure_agent(context.clone(), page.clone()).await;
        assert!(coordinator.registry().contains(&context).await);

        coordinator.page_closed(&context).await;
        assert!(!coordinator.registry().contains(&context).await);
    }

    #[tokio::test]
    async fn retention_pass_prunes_to_cap() {
        let (coordinator, store) = coordinator_with_store();
        for n in 0..130 {
            store
                .approve(&ContentId::new(format!("vid{n:03}")))
                .await
                .unwrap();
        }

        let removed = coordinator.run_retention_once().await.unwrap();
        assert_eq!(removed, 30);
        assert_eq!(store.get_all().await.unwrap().len(), 100);
    }
}
