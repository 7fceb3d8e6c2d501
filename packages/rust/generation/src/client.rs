//! OpenAI-compatible chat-completions client.
//!
//! One request/response call per completion; no streaming. An outer
//! timeout is applied on top of whatever the API enforces, and expiry is
//! classified as a generation failure.

use std::time::Duration;

use async_trait::async_trait;
use babelwiki_shared::{BabelWikiError, OpenAiConfig, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::{CompletionRequest, TextGenerator};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    presence_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_penalty: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// HTTP client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiClient {
    http: reqwest::Client,
    endpoint: Url,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl OpenAiClient {
    /// Build a client from config plus the resolved API key.
    pub fn new(config: &OpenAiConfig, api_key: String) -> Result<Self> {
        let base = Url::parse(config.base_url.trim_end_matches('/'))
            .map_err(|e| BabelWikiError::config(format!("invalid base_url: {e}")))?;
        let endpoint = Url::parse(&format!("{base}/chat/completions"))
            .map_err(|e| BabelWikiError::config(format!("invalid base_url: {e}")))?;

        let http = reqwest::Client::builder()
            .user_agent(concat!("babelwiki/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BabelWikiError::Generation(format!("client build: {e}")))?;

        Ok(Self {
            http,
            endpoint,
            api_key,
            model: config.model.clone(),
            timeout: Duration::from_secs(config.request_timeout_secs),
        })
    }

    fn build_body(&self, request: &CompletionRequest) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: request.system.clone(),
                },
                ChatMessage {
                    role: "user",
                    content: request.user.clone(),
                },
            ],
            temperature: request.params.temperature,
            max_tokens: request.params.max_tokens,
            presence_penalty: request.params.presence_penalty,
            frequency_penalty: request.params.frequency_penalty,
        }
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        let body = self.build_body(&request);

        let send = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send();

        let response = tokio::time::timeout(self.timeout, send)
            .await
            .map_err(|_| {
                BabelWikiError::Generation(format!(
                    "completion timed out after {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| BabelWikiError::Generation(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            let detail: String = detail.chars().take(200).collect();
            return Err(BabelWikiError::Generation(format!("HTTP {status}: {detail}")));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| BabelWikiError::Generation(format!("invalid response: {e}")))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(BabelWikiError::Generation(
                "completion returned no content".into(),
            ));
        }

        debug!(model = %self.model, output_len = text.len(), "completion received");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use babelwiki_shared::OpenAiConfig;

    use super::*;
    use crate::SamplingParams;

    fn test_client() -> OpenAiClient {
        OpenAiClient::new(&OpenAiConfig::default(), "sk-test".into()).expect("client")
    }

    fn completion_request() -> CompletionRequest {
        CompletionRequest {
            system: "system prompt".into(),
            user: "user prompt".into(),
            params: SamplingParams::from(&OpenAiConfig::default()),
        }
    }

    #[test]
    fn endpoint_is_derived_from_base_url() {
        let client = test_client();
        assert_eq!(
            client.endpoint.as_str(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn request_body_serializes_messages_and_params() {
        let client = test_client();
        let body = client.build_body(&completion_request());
        let json = serde_json::to_string(&body).expect("serialize");

        assert!(json.contains(r#""model":"gpt-4o"#));
        assert!(json.contains(r#""role":"system"#));
        assert!(json.contains(r#""role":"user"#));
        assert!(json.contains(r#""temperature":0.7"#));
        assert!(json.contains(r#""presence_penalty":0.6"#));
        assert!(json.contains(r#""frequency_penalty":0.6"#));
    }

    #[test]
    fn request_body_omits_absent_penalties() {
        let client = test_client();
        let mut request = completion_request();
        request.params = request.params.without_penalties();
        let json = serde_json::to_string(&client.build_body(&request)).expect("serialize");

        assert!(!json.contains("presence_penalty"));
        assert!(!json.contains("frequency_penalty"));
    }

    #[test]
    fn response_parses_first_choice() {
        let json = r###"{"choices":[{"message":{"role":"assistant","content":"## Article"}}]}"###;
        let parsed: ChatResponse = serde_json::from_str(json).expect("deserialize");
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("## Article")
        );
    }

    #[test]
    fn response_tolerates_missing_content() {
        let json = r#"{"choices":[{"message":{"role":"assistant"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(json).expect("deserialize");
        assert!(parsed.choices[0].message.content.is_none());
    }

    #[test]
    fn invalid_base_url_is_a_config_error() {
        let config = OpenAiConfig {
            base_url: "not a url".into(),
            ..OpenAiConfig::default()
        };
        let result = OpenAiClient::new(&config, "sk-test".into());
        assert!(result.is_err());
    }
}
