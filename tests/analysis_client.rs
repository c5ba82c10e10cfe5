use std::time::Duration;
use viewguard::analysis::AnalysisClient;
use viewguard::config::{AnalysisConfig, AnalysisMode};
use viewguard::error::AnalysisError;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WATCH: &str = "https://www.youtube.com/watch?v=abc123";

fn summary_config(base_url: String) -> AnalysisConfig {
    AnalysisConfig {
        base_url,
        timeout_secs: 2,
        ..AnalysisConfig::default()
    }
}

fn chat_config(base_url: String) -> AnalysisConfig {
    AnalysisConfig {
        proxy_url: Some(format!("{base_url}/chat")),
        api_key: Some("test-key".into()),
        model: Some("test-model".into()),
        mode: AnalysisMode::Chat,
        base_url,
        timeout_secs: 2,
        ..AnalysisConfig::default()
    }
}

#[tokio::test]
async fn summary_allowed_verdict_parses() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/summary"))
        .and(query_param("url", WATCH))
        .and(query_param("max_length", "150"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "summary": "A calm documentary about penguins.",
            "status": "allowed"
        })))
        .mount(&server)
        .await;

    let client = AnalysisClient::new(&summary_config(server.uri())).unwrap();
    let verdict = client.fetch_verdict(WATCH).await.unwrap();
    assert!(verdict.is_allowed());
    assert_eq!(verdict.summary, "A calm documentary about penguins.");
}

#[tokio::test]
async fn summary_without_status_classifies_blocked() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/summary"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "summary": "Something ambiguous."
        })))
        .mount(&server)
        .await;

    let client = AnalysisClient::new(&summary_config(server.uri())).unwrap();
    let verdict = client.fetch_verdict(WATCH).await.unwrap();
    assert!(!verdict.is_allowed());
}

#[tokio::test]
async fn explicit_error_payload_is_a_service_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/summary"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "error": "No subtitles available for this video"
        })))
        .mount(&server)
        .await;

    let client = AnalysisClient::new(&summary_config(server.uri())).unwrap();
    let err = client.fetch_verdict(WATCH).await.unwrap_err();
    match err {
        AnalysisError::Service(message) => assert!(message.contains("No subtitles")),
        other => panic!("expected service error, got {other:?}"),
    }
}

#[tokio::test]
async fn non_json_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/summary"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = AnalysisClient::new(&summary_config(server.uri())).unwrap();
    assert!(matches!(
        client.fetch_verdict(WATCH).await.unwrap_err(),
        AnalysisError::Malformed(_)
    ));
}

#[tokio::test]
async fn missing_summary_field_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/summary"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "allowed"
        })))
        .mount(&server)
        .await;

    let client = AnalysisClient::new(&summary_config(server.uri())).unwrap();
    assert!(matches!(
        client.fetch_verdict(WATCH).await.unwrap_err(),
        AnalysisError::Malformed(_)
    ));
}

#[tokio::test]
async fn unreachable_service_is_a_connectivity_error() {
    // Nothing is listening on this port.
    let config = summary_config("http://127.0.0.1:9".into());
    let client = AnalysisClient::new(&config).unwrap();
    assert!(matches!(
        client.fetch_verdict(WATCH).await.unwrap_err(),
        AnalysisError::Connectivity(_)
    ));
}

#[tokio::test]
async fn slow_service_is_a_timeout_not_a_connectivity_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/summary"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(5))
                .set_body_json(serde_json::json!({"summary": "late"})),
        )
        .mount(&server)
        .await;

    let mut config = summary_config(server.uri());
    config.timeout_secs = 1;
    let client = AnalysisClient::new(&config).unwrap();
    assert!(matches!(
        client.fetch_verdict(WATCH).await.unwrap_err(),
        AnalysisError::Timeout { seconds: 1 }
    ));
}

#[tokio::test]
async fn chat_mode_fetches_transcript_then_asks_the_proxy() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/transcript"))
        .and(query_param("url", WATCH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "transcript": "penguins walk on ice"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(serde_json::json!({"model": "test-model"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"message": {"role": "assistant",
                "content": "VERDICT: allowed\nPenguins being penguins."}}]
        })))
        .mount(&server)
        .await;

    let client = AnalysisClient::new(&chat_config(server.uri())).unwrap();
    let verdict = client.fetch_verdict(WATCH).await.unwrap();
    assert!(verdict.is_allowed());
    assert_eq!(verdict.summary, "Penguins being penguins.");
}

#[tokio::test]
async fn chat_reply_without_marker_classifies_blocked() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/transcript"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "transcript": "some words"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "Probably fine?"}}]
        })))
        .mount(&server)
        .await;

    let client = AnalysisClient::new(&chat_config(server.uri())).unwrap();
    let verdict = client.fetch_verdict(WATCH).await.unwrap();
    assert!(!verdict.is_allowed());
}

#[tokio::test]
async fn missing_transcript_is_a_service_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/transcript"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "error": "Transcript language is not English"
        })))
        .mount(&server)
        .await;

    let client = AnalysisClient::new(&chat_config(server.uri())).unwrap();
    assert!(matches!(
        client.fetch_verdict(WATCH).await.unwrap_err(),
        AnalysisError::Service(_)
    ));
}

#[tokio::test]
async fn proxy_error_detail_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/transcript"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "transcript": "some words"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "detail": "invalid api key"
        })))
        .mount(&server)
        .await;

    let client = AnalysisClient::new(&chat_config(server.uri())).unwrap();
    match client.fetch_verdict(WATCH).await.unwrap_err() {
        AnalysisError::Service(message) => assert!(message.contains("invalid api key")),
        other => panic!("expected service error, got {other:?}"),
    }
}

#[tokio::test]
async fn health_probe_reports_reachable_service() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .mount(&server)
        .await;

    let client = AnalysisClient::new(&summary_config(server.uri())).unwrap();
    let report = client.probe_health().await;
    assert!(report.reachable);
    assert!(report.detail.is_none());
}

#[tokio::test]
async fn health_probe_reports_failing_service_with_detail() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = AnalysisClient::new(&summary_config(server.uri())).unwrap();
    let report = client.probe_health().await;
    assert!(!report.reachable);
    assert!(report.detail.unwrap().contains("500"));
}

#[tokio::test]
async fn health_probe_reports_unreachable_service() {
    let client = AnalysisClient::new(&summary_config("http://127.0.0.1:9".into())).unwrap();
    let report = client.probe_health().await;
    assert!(!report.reachable);
    assert!(report.detail.is_some());
}
