pub mod channel;
pub mod protocol;

pub use channel::{ContextId, ContextRegistry, Envelope, LocalPageChannel, PageChannel};
pub use protocol::{AgentReply, AgentRequest, OverrideOutcome, StatusReport};
