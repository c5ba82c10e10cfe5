use super::verdict::{self, Verdict};
use crate::config::{AnalysisConfig, AnalysisMode};
use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Reachability of the analysis service, as reported by the health probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthReport {
    pub reachable: bool,
    pub detail: Option<String>,
}

// ─── Wire types ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    summary: Option<String>,
    status: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TranscriptResponse {
    transcript: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

const CHAT_SYSTEM_PROMPT: &str = "You analyze video transcripts and decide whether the content \
is appropriate for children. Reply with `VERDICT: allowed` or `VERDICT: blocked` on the first \
line, then a short summary of the content.";

// ─── Client ─────────────────────────────────────────────────────────────────

/// HTTP client for the external analysis service. Consumed by the control
/// surface only; the page agent never talks to this service.
///
/// Every failure maps to one distinguishable [`AnalysisError`] category, and
/// none of them touch blocked/approved state anywhere.
pub struct AnalysisClient {
    config: AnalysisConfig,
    cached_summary_url: String,
    cached_transcript_url: String,
    cached_health_url: String,
    client: reqwest::Client,
}

impl AnalysisClient {
    pub fn new(config: &AnalysisConfig) -> Result<Self, AnalysisError> {
        let base = config.base_url.trim_end_matches('/');
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AnalysisError::Connectivity(e.to_string()))?;

        Ok(Self {
            cached_summary_url: format!("{base}/summary"),
            cached_transcript_url: format!("{base}/transcript"),
            cached_health_url: format!("{base}/health"),
            config: config.clone(),
            client,
        })
    }

    /// Request a verdict for the content at `address`, in whichever mode the
    /// config selects.
    pub async fn fetch_verdict(&self, address: &str) -> Result<Verdict, AnalysisError> {
        match self.config.mode {
            AnalysisMode::Summary => self.fetch_summary_verdict(address).await,
            AnalysisMode::Chat => self.fetch_chat_verdict(address).await,
        }
    }

    async fn fetch_summary_verdict(&self, address: &str) -> Result<Verdict, AnalysisError> {
        let response = self
            .client
            .get(&self.cached_summary_url)
            .query(&[
                ("url", address.to_string()),
                ("max_length", self.config.max_length.to_string()),
            ])
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        // Error payloads arrive with non-success statuses too; parse the
        // body either way and let the `error` field speak.
        let body: SummaryResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::Malformed(e.to_string()))?;

        if let Some(error) = body.error {
            return Err(AnalysisError::Service(error));
        }
        let summary = body
            .summary
            .ok_or_else(|| AnalysisError::Malformed("response carries no summary".into()))?;

        Ok(Verdict {
            classification: verdict::classify_status(body.status.as_deref()),
            summary,
        })
    }

    async fn fetch_chat_verdict(&self, address: &str) -> Result<Verdict, AnalysisError> {
        let transcript = self.fetch_transcript(address).await?;

        let proxy_url = self
            .config
            .proxy_url
            .as_deref()
            .ok_or_else(|| AnalysisError::Service("chat mode has no proxy_url".into()))?;
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| AnalysisError::Service("chat mode has no api_key".into()))?;
        let model = self
            .config
            .model
            .as_deref()
            .ok_or_else(|| AnalysisError::Service("chat mode has no model".into()))?;

        let request = ChatRequest {
            model: model.to_string(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: CHAT_SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: format!(
                        "Analyze this video transcript and give your verdict. Transcript: {transcript}"
                    ),
                },
            ],
            temperature: 0.7,
            max_tokens: 32_000,
        };

        let response = self
            .client
            .post(proxy_url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|value| {
                    value
                        .get("detail")
                        .or_else(|| value.get("error"))
                        .and_then(|detail| detail.as_str().map(ToString::to_string))
                })
                .unwrap_or_else(|| "API error".to_string());
            return Err(AnalysisError::Service(format!("{status}: {detail}")));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::Malformed(e.to_string()))?;
        let content = body
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| AnalysisError::Malformed("response carries no choices".into()))?;

        Ok(verdict::parse_marked(&content))
    }

    async fn fetch_transcript(&self, address: &str) -> Result<String, AnalysisError> {
        let response = self
            .client
            .get(&self.cached_transcript_url)
            .query(&[("url", address)])
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let body: TranscriptResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::Malformed(e.to_string()))?;

        if let Some(error) = body.error {
            return Err(AnalysisError::Service(error));
        }
        body.transcript
            .ok_or_else(|| AnalysisError::Service("no transcript available".into()))
    }

    /// Opaque reachability probe against the service's health endpoint.
    pub async fn probe_health(&self) -> HealthReport {
        let result = self
            .client
            .get(&self.cached_health_url)
            .timeout(Duration::from_secs(self.config.health_timeout_secs))
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => HealthReport {
                reachable: true,
                detail: None,
            },
            Ok(response) => HealthReport {
                reachable: false,
                detail: Some(format!("status {}", response.status())),
            },
            Err(e) => HealthReport {
                reachable: false,
                detail: Some(e.to_string()),
            },
        }
    }

    fn transport_error(&self, error: &reqwest::Error) -> AnalysisError {
        if error.is_timeout() {
            AnalysisError::Timeout {
                seconds: self.config.timeout_secs,
            }
        } else {
            AnalysisError::Connectivity(error.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_are_cached_without_trailing_slash() {
        let config = AnalysisConfig {
            base_url: "http://127.0.0.1:5000/".into(),
            ..AnalysisConfig::default()
        };
        let client = AnalysisClient::new(&config).unwrap();
        assert_eq!(client.cached_summary_url, "http://127.0.0.1:5000/summary");
        assert_eq!(
            client.cached_transcript_url,
            "http://127.0.0.1:5000/transcript"
        );
        assert_eq!(client.cached_health_url, "http://127.0.0.1:5000/health");
    }

    #[test]
    fn chat_request_serializes_expected_shape() {
        let request = ChatRequest {
            model: "some-model".into(),
            messages: vec![ChatMessage {
                role: "user",
                content: "hello".into(),
            }],
            temperature: 0.7,
            max_tokens: 32_000,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "some-model");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["max_tokens"], 32_000);
    }

    #[test]
    fn chat_response_deserializes_choices() {
        let json = r#"{"choices":[{"message":{"role":"assistant","content":"VERDICT: allowed\nFine."}}]}"#;
        let response: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            response.choices[0].message.content,
            "VERDICT: allowed\nFine."
        );
    }
}
