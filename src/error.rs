use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for viewguard.
///
/// Each subsystem defines its own error variant. Library callers can match on
/// these to decide recovery strategy; internal code continues to use
/// `anyhow::Result` for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum GuardError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Approval store ──────────────────────────────────────────────────
    #[error("store: {0}")]
    Store(#[from] StoreError),

    // ── Page agent ──────────────────────────────────────────────────────
    #[error("agent: {0}")]
    Agent(#[from] AgentError),

    // ── Messaging channel ───────────────────────────────────────────────
    #[error("messaging: {0}")]
    Messaging(#[from] MessagingError),

    // ── Analysis service ────────────────────────────────────────────────
    #[error("analysis: {0}")]
    Analysis(#[from] AnalysisError),

    // ── Control surface ─────────────────────────────────────────────────
    #[error("surface: {0}")]
    Surface(#[from] SurfaceError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Approval store errors ──────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("schema init failed: {0}")]
    Schema(String),
}

// ─── Page agent errors ──────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("current address does not resolve to a content identifier")]
    NoContentIdentifier,
}

// ─── Messaging errors ───────────────────────────────────────────────────────

/// Delivery failures on the per-page-context channel.
///
/// `RecipientAbsent` must stay distinguishable from every other outcome:
/// callers treat it as "unknown status", never as approval or block.
#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("no page agent present in context {context}")]
    RecipientAbsent { context: String },

    #[error("agent in context {context} dropped the request without replying")]
    NoReply { context: String },
}

// ─── Analysis service errors ────────────────────────────────────────────────

/// One variant per user-distinguishable failure category.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("could not reach analysis service: {0}")]
    Connectivity(String),

    #[error("analysis timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("malformed analysis response: {0}")]
    Malformed(String),

    #[error("analysis service error: {0}")]
    Service(String),
}

// ─── Control surface errors ─────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("an override is already in flight")]
    OverrideInFlight,
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, GuardError>;
