use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::agent_api::ChatMessage;
use shared::error::SummarizeError;
use shared::records::Credential;
use shared::settings::SummarizerSettings;
use shared::summarizer::Summarizer;
use std::time::Duration;

pub const SYSTEM_PROMPT: &str = "You are a professional text summarizer. Create concise, accurate summaries that capture the key points and main ideas of the given text. Keep the summary clear and well-structured.";

/// Longest slice of an unparseable error body kept in the error message.
const MAX_ERROR_DETAIL: usize = 800;

pub fn user_prompt(text: &str) -> String {
    format!("Please summarize the following text:\n\n{}", text)
}

// ── Request types ────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

// ── Response types ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorBody {
    error: OpenAIErrorDetail,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorDetail {
    message: String,
}

/// Pull the provider's `error.message`, falling back to the raw body, then to
/// the status text when the body is empty.
fn error_message(body: &str, status_text: Option<&str>) -> String {
    if let Ok(parsed) = serde_json::from_str::<OpenAIErrorBody>(body) {
        return parsed.error.message;
    }
    let detail = body.chars().take(MAX_ERROR_DETAIL).collect::<String>();
    let detail = detail.trim();
    if detail.is_empty() {
        status_text.unwrap_or_default().to_string()
    } else {
        detail.to_string()
    }
}

fn extract_summary(status: u16, body: &str) -> Result<String, SummarizeError> {
    let parsed: OpenAIResponse = serde_json::from_str(body)
        .map_err(|e| SummarizeError::remote(status, format!("malformed response: {}", e)))?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| SummarizeError::remote(status, "malformed response: no completion content"))
}

// ── Client ───────────────────────────────────────────────────────────

pub struct OpenAIClient {
    http: Client,
    url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAIClient {
    pub fn from_settings(settings: &SummarizerSettings) -> Result<Self, SummarizeError> {
        let mut builder = Client::builder().pool_max_idle_per_host(2);
        if let Some(secs) = settings.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| SummarizeError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            url: settings.chat_completions_url(),
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
        })
    }

    pub async fn generate(&self, text: &str, credential: &Credential) -> Result<String, SummarizeError> {
        let req = OpenAIRequest {
            model: &self.model,
            messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(user_prompt(text))],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        tracing::info!(chars = text.chars().count(), model = %self.model, "requesting summary");

        let resp = self
            .http
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", credential.expose()))
            .header("Content-Type", "application/json")
            .json(&req)
            .send()
            .await
            .map_err(|e| SummarizeError::Transport(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| SummarizeError::Transport(e.to_string()))?;

        if !status.is_success() {
            let message = error_message(&body, status.canonical_reason());
            tracing::warn!(status = status.as_u16(), "summary request failed: {}", message);
            return Err(SummarizeError::remote(status.as_u16(), message));
        }

        extract_summary(status.as_u16(), &body)
    }
}

#[async_trait]
impl Summarizer for OpenAIClient {
    async fn summarize(&self, text: &str, credential: &Credential) -> Result<String, SummarizeError> {
        self.generate(text, credential).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let req = OpenAIRequest {
            model: "gpt-3.5-turbo",
            messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(user_prompt("abc"))],
            max_tokens: 500,
            temperature: 0.3,
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["model"], "gpt-3.5-turbo");
        assert_eq!(v["max_tokens"], 500);
        assert_eq!(v["messages"][0]["role"], "system");
        assert_eq!(v["messages"][1]["content"], "Please summarize the following text:\n\nabc");
    }

    #[test]
    fn test_error_message_prefers_provider_field() {
        let body = r#"{"error": {"message": "Invalid API key", "type": "invalid_request_error"}}"#;
        assert_eq!(error_message(body, Some("Unauthorized")), "Invalid API key");
        assert_eq!(error_message("  gateway down ", Some("Bad Gateway")), "gateway down");
    }

    #[test]
    fn test_error_message_empty_body_uses_status_text() {
        assert_eq!(error_message("", Some("Too Many Requests")), "Too Many Requests");
        assert_eq!(error_message(" \n", None), "");
    }

    #[test]
    fn test_extract_summary_missing_choices() {
        let err = extract_summary(200, r#"{"choices": []}"#).unwrap_err();
        assert_eq!(err.status(), Some(200));
        assert!(err.to_string().contains("malformed"));
    }

    mod http_tests {
        use super::*;
        use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

        fn client_for(server: &MockServer) -> OpenAIClient {
            let settings = SummarizerSettings {
                base_url: server.uri(),
                ..Default::default()
            };
            OpenAIClient::from_settings(&settings).unwrap()
        }

        fn credential() -> Credential {
            Credential::new("sk-test").unwrap()
        }

        #[tokio::test]
        async fn test_generate_success() {
            let mock_server = MockServer::start().await;

            let response_body = serde_json::json!({
                "id": "chatcmpl-123",
                "choices": [{
                    "index": 0,
                    "message": { "role": "assistant", "content": "X" },
                    "finish_reason": "stop"
                }]
            })
            .to_string();

            Mock::given(matchers::method("POST"))
                .and(matchers::path("/v1/chat/completions"))
                .and(matchers::header("Authorization", "Bearer sk-test"))
                .respond_with(ResponseTemplate::new(200).set_body_string(&response_body))
                .expect(1)
                .mount(&mock_server)
                .await;

            let summary = client_for(&mock_server)
                .summarize("some long text to summarize", &credential())
                .await
                .unwrap();
            assert_eq!(summary, "X");
        }

        #[tokio::test]
        async fn test_generate_sends_fixed_parameters() {
            let mock_server = MockServer::start().await;

            Mock::given(matchers::method("POST"))
                .and(matchers::path("/v1/chat/completions"))
                .and(matchers::body_partial_json(serde_json::json!({
                    "model": "gpt-3.5-turbo",
                    "max_tokens": 500,
                    "messages": [
                        { "role": "system", "content": SYSTEM_PROMPT },
                        { "role": "user", "content": "Please summarize the following text:\n\nhello there" }
                    ]
                })))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "choices": [{ "message": { "content": "ok" } }]
                })))
                .expect(1)
                .mount(&mock_server)
                .await;

            let summary = client_for(&mock_server)
                .summarize("hello there", &credential())
                .await
                .unwrap();
            assert_eq!(summary, "ok");
        }

        #[tokio::test]
        async fn test_generate_rate_limit() {
            let mock_server = MockServer::start().await;

            let error_body = r#"{"error": {"message": "Rate limit exceeded", "type": "rate_limit_error"}}"#;

            Mock::given(matchers::method("POST"))
                .respond_with(ResponseTemplate::new(429).set_body_string(error_body))
                .expect(1)
                .mount(&mock_server)
                .await;

            let err = client_for(&mock_server)
                .summarize("text", &credential())
                .await
                .unwrap_err();
            match err {
                SummarizeError::Remote { status, message } => {
                    assert_eq!(status, Some(429));
                    assert_eq!(message, "Rate limit exceeded");
                }
                other => panic!("Expected Remote, got {:?}", other),
            }
        }

        #[tokio::test]
        async fn test_generate_server_error_plain_body() {
            let mock_server = MockServer::start().await;

            Mock::given(matchers::method("POST"))
                .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
                .mount(&mock_server)
                .await;

            let err = client_for(&mock_server)
                .summarize("text", &credential())
                .await
                .unwrap_err();
            assert_eq!(err.status(), Some(500));
            assert!(err.to_string().contains("Internal Server Error"));
        }

        #[tokio::test]
        async fn test_generate_empty_error_body() {
            let mock_server = MockServer::start().await;

            Mock::given(matchers::method("POST"))
                .respond_with(ResponseTemplate::new(429))
                .expect(1)
                .mount(&mock_server)
                .await;

            let err = client_for(&mock_server)
                .summarize("text", &credential())
                .await
                .unwrap_err();
            assert_eq!(err.to_string(), "API Error: 429 - Too Many Requests");
        }

        #[tokio::test]
        async fn test_generate_malformed_success_payload() {
            let mock_server = MockServer::start().await;

            Mock::given(matchers::method("POST"))
                .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
                .mount(&mock_server)
                .await;

            let err = client_for(&mock_server)
                .summarize("text", &credential())
                .await
                .unwrap_err();
            assert!(matches!(err, SummarizeError::Remote { status: Some(200), .. }));
        }

        #[tokio::test]
        async fn test_generate_transport_error() {
            let settings = SummarizerSettings {
                // Port 9 (discard) is not expected to accept HTTP.
                base_url: "http://127.0.0.1:9".to_string(),
                request_timeout_secs: Some(5),
                ..Default::default()
            };
            let client = OpenAIClient::from_settings(&settings).unwrap();
            let err = client.summarize("text", &credential()).await.unwrap_err();
            assert!(matches!(err, SummarizeError::Transport(_)));
        }
    }
}
