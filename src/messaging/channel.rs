use super::protocol::{AgentReply, AgentRequest};
use crate::error::MessagingError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc, oneshot};

/// Identity of one page execution context (one tab showing the host site).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContextId(String);

impl ContextId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContextId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One request and its single-use reply slot.
#[derive(Debug)]
pub struct Envelope {
    pub request: AgentRequest,
    pub reply: oneshot::Sender<AgentReply>,
}

/// Asynchronous call/response primitive scoped to one page context.
///
/// Delivery is at most once and carries no retry or idempotency key; a
/// missing recipient surfaces as [`MessagingError::RecipientAbsent`], which
/// callers must treat as "unknown status".
#[async_trait]
pub trait PageChannel: Send + Sync {
    async fn call(
        &self,
        context: &ContextId,
        request: AgentRequest,
    ) -> Result<AgentReply, MessagingError>;
}

/// Live page-agent mailboxes, shared between the channel and the coordinator.
///
/// A mailbox whose receiver has gone away counts as absent; `register`
/// replaces it so a respawned agent can take the context over.
#[derive(Clone, Default)]
pub struct ContextRegistry {
    inner: Arc<Mutex<HashMap<ContextId, mpsc::Sender<Envelope>>>>,
}

impl ContextRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mailbox for `context`. Returns `false` (and changes
    /// nothing) when a live agent already holds the context.
    pub async fn register(&self, context: ContextId, mailbox: mpsc::Sender<Envelope>) -> bool {
        let mut inner = self.inner.lock().await;
        if let Some(existing) = inner.get(&context) {
            if !existing.is_closed() {
                return false;
            }
        }
        inner.insert(context, mailbox);
        true
    }

    /// Whether a live agent currently holds `context`.
    pub async fn contains(&self, context: &ContextId) -> bool {
        let inner = self.inner.lock().await;
        inner.get(context).is_some_and(|tx| !tx.is_closed())
    }

    /// Tear down a page context: the agent's mailbox closes and its task
    /// drains out. Mirrors navigating away from the host site entirely.
    pub async fn destroy(&self, context: &ContextId) {
        self.inner.lock().await.remove(context);
    }

    async fn mailbox_for(&self, context: &ContextId) -> Option<mpsc::Sender<Envelope>> {
        let mut inner = self.inner.lock().await;
        match inner.get(context) {
            Some(tx) if !tx.is_closed() => Some(tx.clone()),
            Some(_) => {
                inner.remove(context);
                None
            }
            None => None,
        }
    }
}

/// In-process channel implementation over the registry.
pub struct LocalPageChannel {
    registry: ContextRegistry,
}

impl LocalPageChannel {
    #[must_use]
    pub fn new(registry: ContextRegistry) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl PageChannel for LocalPageChannel {
    async fn call(
        &self,
        context: &ContextId,
        request: AgentRequest,
    ) -> Result<AgentReply, MessagingError> {
        let mailbox =
            self.registry
                .mailbox_for(context)
                .await
                .ok_or_else(|| MessagingError::RecipientAbsent {
                    context: context.to_string(),
                })?;

        let (reply_tx, reply_rx) = oneshot::channel();
        mailbox
            .send(Envelope {
                request,
                reply: reply_tx,
            })
            .await
            .map_err(|_| MessagingError::RecipientAbsent {
                context: context.to_string(),
            })?;

        reply_rx.await.map_err(|_| MessagingError::NoReply {
            context: context.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn call_without_agent_is_recipient_absent() {
        let registry = ContextRegistry::new();
        let channel = LocalPageChannel::new(registry);
        let err = channel
            .call(&ContextId::new("tab-1"), AgentRequest::GetStatus)
            .await
            .unwrap_err();
        assert!(matches!(err, MessagingError::RecipientAbsent { .. }));
    }

    #[tokio::test]
    async fn register_rejects_live_duplicate() {
        let registry = ContextRegistry::new();
        let context = ContextId::new("tab-1");
        let (tx_a, _rx_a) = mpsc::channel(1);
        let (tx_b, _rx_b) = mpsc::channel(1);

        assert!(registry.register(context.clone(), tx_a).await);
        assert!(!registry.register(context.clone(), tx_b).await);
    }

    #[tokio::test]
    async fn register_replaces_dead_mailbox() {
        let registry = ContextRegistry::new();
        let context = ContextId::new("tab-1");
        let (tx_a, rx_a) = mpsc::channel(1);
        assert!(registry.register(context.clone(), tx_a).await);
        drop(rx_a);

        let (tx_b, _rx_b) = mpsc::channel(1);
        assert!(registry.register(context.clone(), tx_b).await);
        assert!(registry.contains(&context).await);
    }

    #[tokio::test]
    async fn call_round_trips_through_a_responder() {
        let registry = ContextRegistry::new();
        let context = ContextId::new("tab-1");
        let (tx, mut rx) = mpsc::channel::<Envelope>(4);
        registry.register(context.clone(), tx).await;

        tokio::spawn(async move {
            while let Some(envelope) = rx.recv().await {
                let _ = envelope.reply.send(AgentReply::Ack);
            }
        });

        let channel = LocalPageChannel::new(registry);
        let reply = channel
            .call(
                &context,
                AgentRequest::NavigationHint {
                    url: "https://example.com".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(reply, AgentReply::Ack);
    }

    #[tokio::test]
    async fn dropped_reply_is_no_reply_not_a_value() {
        let registry = ContextRegistry::new();
        let context = ContextId::new("tab-1");
        let (tx, mut rx) = mpsc::channel::<Envelope>(4);
        registry.register(context.clone(), tx).await;

        tokio::spawn(async move {
            if let Some(envelope) = rx.recv().await {
                drop(envelope.reply);
            }
        });

        let channel = LocalPageChannel::new(registry);
        let err = channel
            .call(&context, AgentRequest::GetStatus)
            .await
            .unwrap_err();
        assert!(matches!(err, MessagingError::NoReply { .. }));
    }

    #[tokio::test]
    async fn destroyed_context_becomes_absent() {
        let registry = ContextRegistry::new();
        let context = ContextId::new("tab-1");
        let (tx, _rx) = mpsc::channel::<Envelope>(4);
        registry.register(context.clone(), tx).await;
        registry.destroy(&context).await;

        let channel = LocalPageChannel::new(registry);
        let err = channel
            .call(&context, AgentRequest::GetStatus)
            .await
            .unwrap_err();
        assert!(matches!(err, MessagingError::RecipientAbsent { .. }));
    }
}
