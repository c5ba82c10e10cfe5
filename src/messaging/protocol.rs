use crate::content_id::ContentId;
use serde::{Deserialize, Serialize};

/// Requests understood by a page agent, tagged the way they travel on the
/// wire. `navigationHint` is advisory; the agent re-derives the identifier
/// from its own surface and never trusts the hinted address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum AgentRequest {
    GetStatus,
    Approve,
    Block,
    NavigationHint { url: String },
}

/// Read-only snapshot of a page agent's session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub is_blocked: bool,
    pub content_id: Option<ContentId>,
    pub overlay_present: bool,
}

/// Result of an `approve`/`block` override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OverrideOutcome {
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// The single reply a request gets. At most one per request; a dropped reply
/// surfaces to the caller as a delivery failure, never as a default value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AgentReply {
    Status(StatusReport),
    Override(OverrideOutcome),
    Ack,
}

impl AgentReply {
    #[must_use]
    pub fn as_status(&self) -> Option<&StatusReport> {
        match self {
            Self::Status(status) => Some(status),
            Self::Override(_) | Self::Ack => None,
        }
    }

    #[must_use]
    pub fn as_override(&self) -> Option<&OverrideOutcome> {
        match self {
            Self::Override(outcome) => Some(outcome),
            Self::Status(_) | Self::Ack => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_serialize_with_action_tag() {
        let json = serde_json::to_value(&AgentRequest::GetStatus).unwrap();
        assert_eq!(json["action"], "getStatus");

        let json = serde_json::to_value(&AgentRequest::NavigationHint {
            url: "https://example.com/watch?v=abc".into(),
        })
        .unwrap();
        assert_eq!(json["action"], "navigationHint");
        assert_eq!(json["url"], "https://example.com/watch?v=abc");
    }

    #[test]
    fn status_report_uses_wire_field_names() {
        let report = StatusReport {
            is_blocked: true,
            content_id: Some(ContentId::new("abc123")),
            overlay_present: true,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["isBlocked"], true);
        assert_eq!(json["contentId"], "abc123");
        assert_eq!(json["overlayPresent"], true);
    }

    #[test]
    fn successful_override_omits_error_field() {
        let json = serde_json::to_value(&OverrideOutcome::ok()).unwrap();
        assert_eq!(json["success"], true);
        assert!(json.get("error").is_none());
    }

    #[test]
    fn failed_override_carries_error() {
        let json = serde_json::to_value(&OverrideOutcome::failed("no content identifier")).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "no content identifier");
    }

    #[test]
    fn reply_accessors_reject_wrong_shape() {
        let reply = AgentReply::Override(OverrideOutcome::ok());
        assert!(reply.as_status().is_none());
        assert!(reply.as_override().is_some());
    }
}
