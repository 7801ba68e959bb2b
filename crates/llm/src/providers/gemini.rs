//! Google Gemini `generateContent` client.
//!
//! The model is part of the URL path, sampling settings live under
//! `generationConfig`, and assistant turns use the role `model`.

use biominer_core::{AppError, AppResult};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use url::Url;

use super::common::{apply_fields, merge_extra, send_json};
use crate::client::{ChatMessage, ChatResponse, ClientOptions, LlmClient, LlmUsage, Role};
use crate::types::{FieldMap, ProviderKind};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: Option<u32>,
}

/// Gemini LLM client.
pub struct GeminiClient {
    endpoint: Url,
    fields: FieldMap,
    options: ClientOptions,
    client: reqwest::Client,
}

impl GeminiClient {
    /// The model name becomes one escaped path segment of the endpoint.
    pub fn new(options: ClientOptions) -> AppResult<Self> {
        let endpoint = generate_content_url(&options.model)?;
        Ok(Self {
            endpoint,
            fields: ProviderKind::Gemini.field_map(),
            options,
            client: reqwest::Client::new(),
        })
    }

    fn request_body(&self, messages: &[ChatMessage]) -> Value {
        let mut body = Map::new();

        let system: Vec<Value> = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| json!({ "text": m.content }))
            .collect();
        if !system.is_empty() {
            body.insert("systemInstruction".to_string(), json!({ "parts": system }));
        }

        let contents: Vec<Value> = messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| {
                let role = match m.role {
                    Role::Assistant => "model",
                    _ => "user",
                };
                json!({ "role": role, "parts": [{ "text": m.content }] })
            })
            .collect();
        body.insert("contents".to_string(), Value::Array(contents));

        apply_fields(&mut body, self.fields, &self.options);
        merge_extra(&mut body, &self.options.extra);
        Value::Object(body)
    }

    fn convert_response(&self, response: GenerateContentResponse) -> ChatResponse {
        let content = response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        let usage = response.usage_metadata.map(|u| {
            let mut usage = LlmUsage::new(u.prompt_token_count, u.candidates_token_count);
            if let Some(total) = u.total_token_count {
                usage.total_tokens = total;
            }
            usage
        });

        ChatResponse {
            content,
            model: response
                .model_version
                .unwrap_or_else(|| self.options.model.clone()),
            usage,
        }
    }
}

fn generate_content_url(model: &str) -> AppResult<Url> {
    let base = ProviderKind::Gemini.default_endpoint().unwrap_or_default();
    let mut url = Url::parse(base)
        .map_err(|e| AppError::Config(format!("Invalid Gemini endpoint '{}': {}", base, e)))?;
    url.path_segments_mut()
        .map_err(|_| AppError::Config(format!("Gemini endpoint '{}' cannot take a path", base)))?
        .pop_if_empty()
        .push(&format!("{}:generateContent", model));
    Ok(url)
}

#[async_trait::async_trait]
impl LlmClient for GeminiClient {
    fn provider_name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.options.model
    }

    fn is_verbose(&self) -> bool {
        self.options.verbose
    }

    async fn invoke(&self, messages: &[ChatMessage]) -> AppResult<ChatResponse> {
        tracing::info!("Sending generateContent request to Gemini");

        let body = self.request_body(messages);
        let request = self
            .client
            .post(self.endpoint.clone())
            .header("x-goog-api-key", self.options.api_key.expose_secret());

        let response: GenerateContentResponse =
            send_json("gemini", request, &body, self.options.verbose).await?;

        tracing::info!("Received generateContent response from Gemini");
        Ok(self.convert_response(response))
    }
}
