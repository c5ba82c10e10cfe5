pub mod render;

use crate::analysis::{AnalysisClient, Verdict};
use crate::content_id::ContentId;
use crate::error::{GuardError, MessagingError, StoreError, SurfaceError};
use crate::messaging::{AgentRequest, ContextId, OverrideOutcome, PageChannel, StatusReport};
use crate::store::{APPROVAL_PREFIX, ApprovalStore, content_id_of};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// How a verdict was applied to the page agent, distinguishing "agent not
/// there" from "agent refused": an unreachable agent means unknown status,
/// never an implicit approval or block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyStatus {
    Applied,
    AgentUnreachable(String),
    Failed(String),
}

/// One check run: the verdict and what happened when it was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub verdict: Verdict,
    pub application: ApplyStatus,
}

/// The on-demand control surface: queries status, runs analysis checks and
/// issues explicit overrides.
///
/// The protocol has no idempotency key, so the surface refuses to start a
/// second override while one is outstanding, the message-passing equivalent
/// of disabling the button during the in-flight call.
pub struct ControlSurface {
    channel: Arc<dyn PageChannel>,
    analysis: AnalysisClient,
    store: Arc<dyn ApprovalStore>,
    override_in_flight: AtomicBool,
}

impl ControlSurface {
    pub fn new(
        channel: Arc<dyn PageChannel>,
        analysis: AnalysisClient,
        store: Arc<dyn ApprovalStore>,
    ) -> Self {
        Self {
            channel,
            analysis,
            store,
            override_in_flight: AtomicBool::new(false),
        }
    }

    /// Read-only status of the agent in `context`.
    pub async fn status(&self, context: &ContextId) -> Result<StatusReport, GuardError> {
        let reply = self.channel.call(context, AgentRequest::GetStatus).await?;
        reply
            .as_status()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("unexpected reply to getStatus").into())
    }

    /// Fetch a verdict for `address` and apply it: allowed turns into an
    /// `approve` override, blocked into a `block` override. Analysis failures
    /// propagate typed and leave the agent's state untouched.
    pub async fn check(
        &self,
        context: &ContextId,
        address: &str,
    ) -> Result<CheckReport, GuardError> {
        let verdict = self.analysis.fetch_verdict(address).await?;
        let request = if verdict.is_allowed() {
            AgentRequest::Approve
        } else {
            AgentRequest::Block
        };

        let application = match self.send_override(context, request).await {
            Ok(outcome) if outcome.success => ApplyStatus::Applied,
            Ok(outcome) => ApplyStatus::Failed(
                outcome.error.unwrap_or_else(|| "override rejected".into()),
            ),
            Err(GuardError::Messaging(MessagingError::RecipientAbsent { context })) => {
                ApplyStatus::AgentUnreachable(context)
            }
            Err(e) => ApplyStatus::Failed(e.to_string()),
        };

        Ok(CheckReport {
            verdict,
            application,
        })
    }

    /// Explicit user override: force the displayed content approved.
    pub async fn force_approve(&self, context: &ContextId) -> Result<OverrideOutcome, GuardError> {
        self.send_override(context, AgentRequest::Approve).await
    }

    /// Explicit user override: force the displayed content blocked.
    pub async fn force_block(&self, context: &ContextId) -> Result<OverrideOutcome, GuardError> {
        self.send_override(context, AgentRequest::Block).await
    }

    async fn send_override(
        &self,
        context: &ContextId,
        request: AgentRequest,
    ) -> Result<OverrideOutcome, GuardError> {
        if self.override_in_flight.swap(true, Ordering::SeqCst) {
            return Err(SurfaceError::OverrideInFlight.into());
        }
        let result = self.channel.call(context, request).await;
        self.override_in_flight.store(false, Ordering::SeqCst);

        let reply = result?;
        reply
            .as_override()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("unexpected reply to override").into())
    }

    /// Enumerate approved content identifiers, oldest approval first.
    pub async fn list_approvals(&self) -> Result<Vec<ContentId>, StoreError> {
        Ok(self
            .store
            .get_all()
            .await?
            .into_iter()
            .filter(|(key, value)| *value && key.starts_with(APPROVAL_PREFIX))
            .filter_map(|(key, _)| content_id_of(&key))
            .collect())
    }

    /// Remove every approval record. Returns how many were cleared.
    pub async fn clear_approvals(&self) -> Result<usize, StoreError> {
        let doomed: Vec<String> = self
            .store
            .get_all()
            .await?
            .into_iter()
            .filter(|(key, _)| key.starts_with(APPROVAL_PREFIX))
            .map(|(key, _)| key)
            .collect();
        let cleared = doomed.len();
        if cleared > 0 {
            self.store.remove(&doomed).await?;
        }
        Ok(cleared)
    }
}
