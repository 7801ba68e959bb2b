//! OpenAI chat-completions protocol client.
//!
//! Used for OpenAI itself, for xAI (same wire format, different token-limit
//! field) and for any custom `base_url` endpoint speaking the same protocol.

use biominer_core::AppResult;
use serde::Deserialize;
use serde_json::{Map, Value};
use url::Url;

use super::common::{apply_fields, merge_extra, send_json};
use crate::client::{ChatMessage, ChatResponse, ClientOptions, LlmClient, LlmUsage};
use crate::types::{FieldMap, ProviderKind};

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    model: String,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<CompletionUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: Option<u32>,
}

/// Client for OpenAI-compatible `/chat/completions` endpoints.
pub struct OpenAiCompatibleClient {
    provider: String,
    endpoint: String,
    fields: FieldMap,
    options: ClientOptions,
    client: reqwest::Client,
}

impl OpenAiCompatibleClient {
    fn build(
        provider: impl Into<String>,
        endpoint: String,
        kind: ProviderKind,
        options: ClientOptions,
    ) -> Self {
        Self {
            provider: provider.into(),
            endpoint,
            fields: kind.field_map(),
            options,
            client: reqwest::Client::new(),
        }
    }

    /// OpenAI's hosted API.
    pub fn openai(options: ClientOptions) -> Self {
        let endpoint = ProviderKind::OpenAi.default_endpoint().unwrap_or_default();
        Self::build("openai", endpoint.to_string(), ProviderKind::OpenAi, options)
    }

    /// xAI's hosted API.
    pub fn xai(options: ClientOptions) -> Self {
        let endpoint = ProviderKind::XAi.default_endpoint().unwrap_or_default();
        Self::build("xai", endpoint.to_string(), ProviderKind::XAi, options)
    }

    /// Any endpoint rooted at `base_url`, reported under `provider`.
    pub fn custom(provider: impl Into<String>, base_url: &Url, options: ClientOptions) -> Self {
        let endpoint = format!("{}/chat/completions", base_url.as_str().trim_end_matches('/'));
        Self::build(provider, endpoint, ProviderKind::Custom, options)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_body(&self, messages: &[ChatMessage]) -> AppResult<Value> {
        let mut body = Map::new();
        apply_fields(&mut body, self.fields, &self.options);
        body.insert("messages".to_string(), serde_json::to_value(messages)?);
        merge_extra(&mut body, &self.options.extra);
        Ok(Value::Object(body))
    }

    fn convert_response(&self, completion: ChatCompletion) -> ChatResponse {
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        let usage = completion.usage.map(|u| {
            let mut usage = LlmUsage::new(u.prompt_tokens, u.completion_tokens);
            if let Some(total) = u.total_tokens {
                usage.total_tokens = total;
            }
            usage
        });

        ChatResponse {
            content,
            model: if completion.model.is_empty() {
                self.options.model.clone()
            } else {
                completion.model
            },
            usage,
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for OpenAiCompatibleClient {
    fn provider_name(&self) -> &str {
        &self.provider
    }

    fn model(&self) -> &str {
        &self.options.model
    }

    fn is_verbose(&self) -> bool {
        self.options.verbose
    }

    async fn invoke(&self, messages: &[ChatMessage]) -> AppResult<ChatResponse> {
        tracing::info!("Sending chat completion request to {}", self.provider);

        let body = self.request_body(messages)?;
        let request = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.options.api_key.expose_secret());

        let completion: ChatCompletion =
            send_json(&self.provider, request, &body, self.options.verbose).await?;

        tracing::info!("Received chat completion from {}", self.provider);
        Ok(self.convert_response(completion))
    }
}
