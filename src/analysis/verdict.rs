use serde::{Deserialize, Serialize};

/// Binary classification carried alongside the verdict text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Allowed,
    Blocked,
}

/// What an analysis run produced: the textual verdict and its
/// allowed/blocked classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub summary: String,
    pub classification: Classification,
}

impl Verdict {
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self.classification, Classification::Allowed)
    }
}

/// Classification from a summary-mode `status` field. Only an explicit
/// `allowed` approves; anything else, including a missing field, blocks.
#[must_use]
pub fn classify_status(status: Option<&str>) -> Classification {
    match status {
        Some("allowed") => Classification::Allowed,
        _ => Classification::Blocked,
    }
}

/// Parse a chat-mode reply whose first line carries an explicit marker,
/// `VERDICT: allowed` or `VERDICT: blocked`. A missing or unparseable marker
/// classifies as blocked, and the marker line is dropped from the summary.
#[must_use]
pub fn parse_marked(reply: &str) -> Verdict {
    let trimmed = reply.trim();
    let mut lines = trimmed.lines();
    let first = lines.next().unwrap_or_default().trim();

    if let Some(value) = first.strip_prefix("VERDICT:") {
        let classification = match value.trim().to_lowercase().as_str() {
            "allowed" => Classification::Allowed,
            _ => Classification::Blocked,
        };
        let summary = lines.collect::<Vec<_>>().join("\n").trim().to_string();
        return Verdict {
            summary,
            classification,
        };
    }

    Verdict {
        summary: trimmed.to_string(),
        classification: Classification::Blocked,
    }
}
