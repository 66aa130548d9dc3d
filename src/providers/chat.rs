//! OpenAI-compatible chat-completion client (LM Studio, llama.cpp server,
//! hosted APIs).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use tubedigest_common::{Error, Result};

use super::capability::Summarizer;
use super::http::{build_client, decode, ensure_success, transport};
use crate::config::SummarizerConfig;

const SERVICE: &str = "summarizer";

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// [`Summarizer`] that calls `POST {base_url}/chat/completions`.
pub struct ChatCompletionClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl ChatCompletionClient {
    pub fn new(base_url: &str, model: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key: None,
            model: model.into(),
            temperature: 0.7,
            max_tokens: 1000,
        })
    }

    pub fn from_config(config: &SummarizerConfig) -> Result<Self> {
        let base_url = config
            .base_url
            .as_deref()
            .ok_or_else(|| Error::Config("summarizer.base_url is not set".into()))?;
        let mut client = Self::new(
            base_url,
            config.model.clone(),
            Duration::from_secs(config.timeout_secs),
        )?;
        client.api_key = config.api_key.clone().filter(|k| !k.is_empty());
        client.temperature = config.temperature;
        client.max_tokens = config.max_tokens;
        Ok(client)
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

#[async_trait]
impl Summarizer for ChatCompletionClient {
    fn name(&self) -> &'static str {
        SERVICE
    }

    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let request = CompletionRequest {
            model: &self.model,
            messages: [
                Message { role: "system", content: system },
                Message { role: "user", content: user },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        debug!(model = %self.model, chars = user.len(), "Requesting completion");

        let mut req = self.client.post(&self.endpoint).json(&request);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let resp = req.send().await.map_err(|e| transport(SERVICE, e))?;
        let body: CompletionResponse = decode(SERVICE, ensure_success(SERVICE, resp).await?).await?;

        body.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::format("completion response has no choices"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> ChatCompletionClient {
        ChatCompletionClient::new(
            &format!("{}/v1/", server.uri()),
            "meta-llama-3.1-8b-instruct",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn returns_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(json!({
                "model": "meta-llama-3.1-8b-instruct",
                "messages": [
                    { "role": "system", "content": "be brief" },
                    { "role": "user", "content": "transcript" },
                ],
                "max_tokens": 1000,
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": "Alice, Bob\nSummary" } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = client(&server).complete("be brief", "transcript").await.unwrap();
        assert_eq!(text, "Alice, Bob\nSummary");
    }

    #[tokio::test]
    async fn sends_bearer_token_when_configured() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "content": "ok" } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = client(&server)
            .with_api_key("sk-test")
            .complete("s", "u")
            .await
            .unwrap();
        assert_eq!(text, "ok");
    }

    #[tokio::test]
    async fn empty_choices_is_format_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        assert_matches!(
            client(&server).complete("s", "u").await,
            Err(Error::Format(_))
        );
    }

    #[tokio::test]
    async fn server_error_is_external() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
            .mount(&server)
            .await;

        let err = client(&server).complete("s", "u").await.unwrap_err();
        assert_matches!(err, Error::External { ref message, .. } if message.contains("model not loaded"));
    }
}
