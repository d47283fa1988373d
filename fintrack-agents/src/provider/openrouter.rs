use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::CompletionProvider;
use crate::error::{InsightsError, InsightsResult};

pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";
pub const DEFAULT_APP_NAME: &str = "FinTrack";
pub const DEFAULT_SITE_URL: &str = "http://localhost:3000";

/// Settings for the OpenRouter chat-completion gateway
#[derive(Debug, Clone)]
pub struct OpenRouterConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    /// Sent as `HTTP-Referer`
    pub site_url: String,
    /// Sent as `X-Title`
    pub app_name: String,
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: OPENROUTER_BASE_URL.to_string(),
            site_url: DEFAULT_SITE_URL.to_string(),
            app_name: DEFAULT_APP_NAME.to_string(),
        }
    }
}

impl OpenRouterConfig {
    /// Defaults overridden by `OPENROUTER_API_KEY` and `NEXT_PUBLIC_APP_NAME`
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var("OPENROUTER_API_KEY") {
            if !key.trim().is_empty() {
                self.api_key = Some(key);
            }
        }
        if let Ok(name) = std::env::var("NEXT_PUBLIC_APP_NAME") {
            if !name.trim().is_empty() {
                self.app_name = name;
            }
        }
        self
    }

    fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Gateway to OpenRouter's `/chat/completions` endpoint
#[derive(Clone)]
pub struct OpenRouterGateway {
    client: reqwest::Client,
    config: OpenRouterConfig,
}

impl OpenRouterGateway {
    pub fn new(config: OpenRouterConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &OpenRouterConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl CompletionProvider for OpenRouterGateway {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> InsightsResult<String> {
        let api_key = self.config.api_key().ok_or(InsightsError::NotConfigured)?;

        let request = ChatCompletionRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        tracing::debug!(model = %self.config.model, "Requesting insights from OpenRouter");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .header("HTTP-Referer", &self.config.site_url)
            .header("X-Title", &self.config.app_name)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        read_completion(status, &body)
    }

    fn is_configured(&self) -> bool {
        self.config.api_key().is_some()
    }

    fn provider_name(&self) -> &'static str {
        "openrouter"
    }
}

/// Turn an OpenRouter HTTP reply into the completion text or a typed error.
pub fn read_completion(status: u16, body: &str) -> InsightsResult<String> {
    if !(200..300).contains(&status) {
        let details = error_details(body);
        tracing::error!("OpenRouter API error status: {}", status);
        tracing::error!("OpenRouter API error details: {}", details);
        return Err(InsightsError::Upstream { status, details });
    }

    let parsed: ChatCompletionResponse = serde_json::from_str(body).map_err(|e| {
        tracing::error!("OpenRouter response was not a chat completion: {}", e);
        InsightsError::EmptyCompletion
    })?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| {
            tracing::error!("OpenRouter returned no completion content");
            InsightsError::EmptyCompletion
        })
}

/// Best-effort detail from an error body: structured JSON message first,
/// raw text otherwise.
fn error_details(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }

    let value: Value = match serde_json::from_str(trimmed) {
        Ok(value) => value,
        Err(_) => return trimmed.to_string(),
    };

    let structured = value
        .pointer("/error/message")
        .and_then(Value::as_str)
        .or_else(|| value.get("error").and_then(Value::as_str))
        .or_else(|| value.get("message").and_then(Value::as_str));

    match structured {
        Some(message) => message.to_string(),
        None => value.to_string(),
    }
}
