use super::navigation::NavigationSignal;
use super::session::AgentSessionState;
use super::surface::{PageSurface, PlaybackState, SuppressionMode};
use crate::config::AgentConfig;
use crate::content_id::{self, ContentId};
use crate::error::AgentError;
use crate::messaging::{
    AgentReply, AgentRequest, ContextId, ContextRegistry, Envelope, OverrideOutcome, StatusReport,
};
use crate::store::{ApprovalLookup, ApprovalStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Outcome of an injection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Injection {
    Installed,
    AlreadyPresent,
}

/// The page-embedded agent: owns the blocking overlay, the per-navigation
/// re-evaluation state machine and playback suppression for one page context.
///
/// States run `UNINITIALIZED → EVALUATING(id) → {BLOCKED(id), APPROVED(id)}`,
/// re-entering EVALUATING whenever the derived identifier changes. Entry to
/// EVALUATING is fail-closed: the overlay mounts and playback is suppressed
/// before the store is consulted, so content never plays ahead of a decision.
pub struct PageAgent {
    context: ContextId,
    session: AgentSessionState,
    surface: Arc<dyn PageSurface>,
    store: Arc<dyn ApprovalStore>,
    suppression: SuppressionMode,
    captured: Option<PlaybackState>,
    /// Evaluation generation: advanced by every EVALUATING entry and every
    /// locally-applied override, so a store lookup can only act if no newer
    /// decision superseded it.
    generation: u64,
    lookups_tx: mpsc::Sender<LookupResult>,
    poll_interval: Duration,
    supervision_interval: Duration,
}

type LookupResult = (u64, ContentId, ApprovalLookup);

impl PageAgent {
    /// Ensure exactly one agent is active for `context`.
    ///
    /// Idempotent: a second attempt while an agent is alive changes nothing
    /// and reports [`Injection::AlreadyPresent`].
    pub async fn inject(
        context: ContextId,
        surface: Arc<dyn PageSurface>,
        store: Arc<dyn ApprovalStore>,
        config: &AgentConfig,
        registry: &ContextRegistry,
    ) -> Injection {
        let (mailbox_tx, mailbox_rx) = mpsc::channel(16);
        if !registry.register(context.clone(), mailbox_tx).await {
            tracing::debug!(context = %context, "page agent already present, skipping injection");
            return Injection::AlreadyPresent;
        }

        let (agent, lookups_rx) = Self::new(context.clone(), surface, store, config);
        tokio::spawn(agent.run(mailbox_rx, lookups_rx));
        tracing::info!(context = %context, "page agent installed");
        Injection::Installed
    }

    fn new(
        context: ContextId,
        surface: Arc<dyn PageSurface>,
        store: Arc<dyn ApprovalStore>,
        config: &AgentConfig,
    ) -> (Self, mpsc::Receiver<LookupResult>) {
        let (lookups_tx, lookups_rx) = mpsc::channel(16);
        let agent = Self {
            context,
            session: AgentSessionState::new(),
            surface,
            store,
            suppression: config.suppression,
            captured: None,
            generation: 0,
            lookups_tx,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            supervision_interval: Duration::from_millis(config.supervision_interval_ms),
        };
        (agent, lookups_rx)
    }

    async fn run(
        mut self,
        mut mailbox: mpsc::Receiver<Envelope>,
        mut lookups: mpsc::Receiver<LookupResult>,
    ) {
        let mut signal = NavigationSignal::start(Arc::clone(&self.surface), self.poll_interval);
        let mut supervise = tokio::time::interval(self.supervision_interval);
        supervise.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                changed = signal.next_change() => match changed {
                    Some(id) => self.on_navigation(id),
                    None => break,
                },
                envelope = mailbox.recv() => match envelope {
                    Some(envelope) => self.handle_request(envelope).await,
                    // Mailbox gone: the page context was destroyed.
                    None => break,
                },
                resolved = lookups.recv() => {
                    if let Some((generation, id, outcome)) = resolved {
                        self.apply_lookup(generation, &id, outcome);
                    }
                },
                _ = supervise.tick() => self.reassert(),
            }
        }
        tracing::debug!(context = %self.context, "page agent stopped");
    }

    /// Navigation event: re-evaluate only when the identifier actually
    /// differs from the displayed one.
    fn on_navigation(&mut self, id: ContentId) {
        if !self.session.is_current(&id) {
            self.enter_evaluating(id);
        }
    }

    /// Entry to `EVALUATING(id)`. Everything up to the store lookup is
    /// synchronous so the fail-closed default is in force before any yield.
    fn enter_evaluating(&mut self, id: ContentId) {
        tracing::debug!(context = %self.context, content = %id, "content changed, re-evaluating");
        self.session.current_content_id = Some(id.clone());
        self.session.is_blocked = true;
        self.captured = None;
        self.apply_block(true);
        self.generation += 1;

        let generation = self.generation;
        let store = Arc::clone(&self.store);
        let results = self.lookups_tx.clone();
        tokio::spawn(async move {
            let outcome = store.lookup(&id).await;
            let _ = results.send((generation, id, outcome)).await;
        });
    }

    /// A resolved store lookup. A superseded result (the content changed,
    /// or an override already decided this content) is discarded, checked
    /// here rather than assumed.
    fn apply_lookup(&mut self, generation: u64, id: &ContentId, outcome: ApprovalLookup) {
        if generation != self.generation || !self.session.is_current(id) {
            tracing::debug!(content = %id, "discarding superseded lookup result");
            return;
        }
        if outcome.is_approved() {
            self.approve_now();
        }
        // NotApproved and Failed both stay blocked; the overlay is already up.
    }

    async fn handle_request(&mut self, envelope: Envelope) {
        let reply = match envelope.request {
            AgentRequest::GetStatus => AgentReply::Status(self.status()),
            AgentRequest::Approve => AgentReply::Override(self.handle_approve().await),
            AgentRequest::Block => AgentReply::Override(self.handle_block().await),
            AgentRequest::NavigationHint { url } => {
                tracing::debug!(hinted = %url, "navigation hint received");
                // Advisory only: re-derive from the surface, not the hint.
                self.poll_current_address();
                AgentReply::Ack
            }
        };
        // At most one reply per request; a caller that went away misses it.
        let _ = envelope.reply.send(reply);
    }

    fn status(&self) -> StatusReport {
        StatusReport {
            is_blocked: self.session.is_blocked,
            content_id: self.session.current_content_id.clone(),
            overlay_present: self.surface.overlay_mounted(),
        }
    }

    /// `approve` override: persist first, then update local state only if
    /// the same content is still displayed. A write that lands after a fast
    /// navigation affects a no-longer-displayed identifier and nothing else.
    async fn handle_approve(&mut self) -> OverrideOutcome {
        let Some(id) = self.session.current_content_id.clone() else {
            return OverrideOutcome::failed(AgentError::NoContentIdentifier.to_string());
        };
        if let Err(e) = self.store.approve(&id).await {
            tracing::warn!(content = %id, "approve override failed to persist: {e}");
            return OverrideOutcome::failed(e.to_string());
        }
        if self.session.is_current(&id) {
            self.generation += 1;
            self.approve_now();
        }
        OverrideOutcome::ok()
    }

    /// `block` override: delete the approval record and re-block. The local
    /// block applies even if the delete failed; uncertainty lands on the
    /// blocked side.
    async fn handle_block(&mut self) -> OverrideOutcome {
        let Some(id) = self.session.current_content_id.clone() else {
            return OverrideOutcome::failed(AgentError::NoContentIdentifier.to_string());
        };
        let revoked = self.store.revoke(&id).await;
        if self.session.is_current(&id) {
            self.generation += 1;
            self.session.is_blocked = true;
            self.apply_block(true);
        }
        match revoked {
            Ok(()) => OverrideOutcome::ok(),
            Err(e) => {
                tracing::warn!(content = %id, "block override failed to persist: {e}");
                OverrideOutcome::failed(e.to_string())
            }
        }
    }

    fn poll_current_address(&mut self) {
        let Some(address) = self.surface.current_address() else {
            return;
        };
        let Some(id) = content_id::derive(&address) else {
            return;
        };
        if !self.session.is_current(&id) {
            self.enter_evaluating(id);
        }
    }

    /// Mount the overlay and suppress playback. `capture_fresh` records the
    /// pre-suppression play/mute state for exact restore on approval; the
    /// supervisory path passes `false` so re-suppression can never clobber
    /// an earlier capture with an already-suppressed state.
    fn apply_block(&mut self, capture_fresh: bool) {
        if !self.surface.overlay_mounted() {
            self.surface.mount_overlay();
        }
        if let Some(media) = self.surface.media() {
            if capture_fresh || self.captured.is_none() {
                self.captured = Some(media.capture());
            }
            media.suppress(self.suppression);
        }
    }

    fn approve_now(&mut self) {
        self.session.is_blocked = false;
        if self.surface.overlay_mounted() {
            self.surface.unmount_overlay();
        }
        if let Some(state) = self.captured.take() {
            if let Some(media) = self.surface.media() {
                media.restore(state);
            }
        }
        if let Some(id) = &self.session.current_content_id {
            tracing::info!(context = %self.context, content = %id, "content approved");
        }
    }

    /// Supervisory re-assertion for the current state. Idempotent; never
    /// changes the current identifier and never queries the store.
    fn reassert(&mut self) {
        if self.session.is_blocked {
            self.apply_block(false);
        } else if self.surface.overlay_mounted() {
            self.surface.unmount_overlay();
        }
    }
}
