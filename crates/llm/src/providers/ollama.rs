//! Ollama LLM provider implementation.
//!
//! Ollama chat API: https://github.com/ollama/ollama/blob/main/docs/api.md
//! The chat endpoint has no token-limit field; `max_tokens` is not sent.

use biominer_core::AppResult;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::common::{apply_fields, merge_extra, send_json};
use crate::client::{ChatMessage, ChatResponse, ClientOptions, LlmClient, LlmUsage};
use crate::types::{FieldMap, ProviderKind};

/// Ollama API response format.
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    model: String,
    message: OllamaMessage,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    #[serde(default)]
    content: String,
}

/// Ollama LLM client.
pub struct OllamaClient {
    /// Chat endpoint URL
    endpoint: String,

    fields: FieldMap,

    options: ClientOptions,

    /// HTTP client
    client: reqwest::Client,
}

impl OllamaClient {
    /// Create a client for the local Ollama runtime.
    ///
    /// Default URL: http://localhost:11434
    pub fn new(options: ClientOptions) -> Self {
        Self {
            endpoint: ProviderKind::Ollama
                .default_endpoint()
                .unwrap_or_default()
                .to_string(),
            fields: ProviderKind::Ollama.field_map(),
            options,
            client: reqwest::Client::new(),
        }
    }

    /// Convert messages to Ollama format.
    fn to_ollama_request(&self, messages: &[ChatMessage]) -> AppResult<Value> {
        let mut body = Map::new();
        apply_fields(&mut body, self.fields, &self.options);
        body.insert("messages".to_string(), serde_json::to_value(messages)?);
        body.insert("stream".to_string(), Value::Bool(false));
        merge_extra(&mut body, &self.options.extra);
        Ok(Value::Object(body))
    }

    /// Convert Ollama response to ChatResponse.
    fn convert_response(&self, response: OllamaResponse) -> ChatResponse {
        let usage = match (response.prompt_eval_count, response.eval_count) {
            (None, None) => None,
            (prompt, completion) => Some(LlmUsage::new(
                prompt.unwrap_or(0),
                completion.unwrap_or(0),
            )),
        };

        ChatResponse {
            content: response.message.content,
            model: if response.model.is_empty() {
                self.options.model.clone()
            } else {
                response.model
            },
            usage,
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for OllamaClient {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.options.model
    }

    fn is_verbose(&self) -> bool {
        self.options.verbose
    }

    async fn invoke(&self, messages: &[ChatMessage]) -> AppResult<ChatResponse> {
        tracing::info!("Sending chat request to Ollama");

        let body = self.to_ollama_request(messages)?;
        let mut request = self.client.post(&self.endpoint);
        if !self.options.api_key.is_empty() {
            request = request.bearer_auth(self.options.api_key.expose_secret());
        }

        let ollama_response: OllamaResponse =
            send_json("ollama", request, &body, self.options.verbose).await?;

        tracing::info!("Received chat response from Ollama");
        Ok(self.convert_response(ollama_response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ExtraOptions;
    use biominer_core::SecretString;
    use serde_json::json;

    fn client() -> OllamaClient {
        OllamaClient::new(ClientOptions {
            model: "llama3".to_string(),
            temperature: Some(0.7),
            max_tokens: 100,
            api_key: SecretString::new("ollama"),
            extra: ExtraOptions::new(),
            verbose: false,
        })
    }

    #[test]
    fn test_ollama_client_creation() {
        let client = client();
        assert_eq!(client.provider_name(), "ollama");
        assert_eq!(client.endpoint, "http://localhost:11434/api/chat");
    }

    #[test]
    fn test_ollama_request_conversion() {
        let body = client()
            .to_ollama_request(&[ChatMessage::user("Hello")])
            .unwrap();

        assert_eq!(body["model"], "llama3");
        assert_eq!(body["messages"][0]["content"], "Hello");
        assert_eq!(body["options"]["temperature"], json!(0.7));
        assert_eq!(body["stream"], false);
        assert!(body.get("num_predict").is_none());
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn test_extra_options_merge_into_generated_options() {
        let mut client = client();
        client.options.extra.insert(
            "options".to_string(),
            json!({ "num_ctx": 4096 }),
        );

        let body = client
            .to_ollama_request(&[ChatMessage::user("Hello")])
            .unwrap();
        assert_eq!(body["options"]["num_ctx"], 4096);
        assert_eq!(body["options"]["temperature"], json!(0.7));
    }

    #[test]
    fn test_ollama_response_conversion() {
        let response: OllamaResponse = serde_json::from_value(json!({
            "model": "llama3",
            "message": { "role": "assistant", "content": "2" },
            "done": true,
            "prompt_eval_count": 26,
            "eval_count": 2
        }))
        .unwrap();

        let response = client().convert_response(response);
        assert_eq!(response.content, "2");
        assert_eq!(response.usage, Some(LlmUsage::new(26, 2)));
    }
}
