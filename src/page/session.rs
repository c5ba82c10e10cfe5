use crate::content_id::ContentId;

/// In-memory session state, owned exclusively by one page agent and passed
/// to its handlers explicitly. Created when the agent initializes, replaced
/// piecewise on navigation, discarded with the page context; nothing in it
/// outlives the context except what was written to the approval store.
///
/// Overlay presence is not stored here: it is derived from the page surface,
/// and the supervisory loop keeps it equal to `is_blocked` at every stable
/// point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentSessionState {
    pub current_content_id: Option<ContentId>,
    pub is_blocked: bool,
}

impl AgentSessionState {
    /// Fresh sessions know nothing and block nothing yet; the first derived
    /// identifier drives the first evaluation.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            current_content_id: None,
            is_blocked: false,
        }
    }

    /// Whether `id` is the content currently displayed.
    #[must_use]
    pub fn is_current(&self, id: &ContentId) -> bool {
        self.current_content_id.as_ref() == Some(id)
    }
}

impl Default for AgentSessionState {
    fn default() -> Self {
        Self::new()
    }
}
