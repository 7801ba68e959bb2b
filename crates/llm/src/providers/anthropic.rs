//! Anthropic Messages API client.
//!
//! System messages are lifted into the top-level `system` field; the
//! remaining turns go into `messages`.

use biominer_core::AppResult;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::common::{apply_fields, merge_extra, send_json};
use crate::client::{ChatMessage, ChatResponse, ClientOptions, LlmClient, LlmUsage, Role};
use crate::types::{FieldMap, ProviderKind};

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    model: String,
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<MessagesUsage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessagesUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

/// Anthropic LLM client.
pub struct AnthropicClient {
    endpoint: String,
    fields: FieldMap,
    options: ClientOptions,
    client: reqwest::Client,
}

impl AnthropicClient {
    pub fn new(options: ClientOptions) -> Self {
        Self {
            endpoint: ProviderKind::Anthropic
                .default_endpoint()
                .unwrap_or_default()
                .to_string(),
            fields: ProviderKind::Anthropic.field_map(),
            options,
            client: reqwest::Client::new(),
        }
    }

    fn request_body(&self, messages: &[ChatMessage]) -> Value {
        let mut body = Map::new();
        apply_fields(&mut body, self.fields, &self.options);

        let system: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();
        if !system.is_empty() {
            body.insert("system".to_string(), Value::from(system.join("\n\n")));
        }

        let turns: Vec<Value> = messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| json!({ "role": m.role.as_str(), "content": m.content }))
            .collect();
        body.insert("messages".to_string(), Value::Array(turns));

        merge_extra(&mut body, &self.options.extra);
        Value::Object(body)
    }

    fn convert_response(&self, response: MessagesResponse) -> ChatResponse {
        let content = response
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        ChatResponse {
            content,
            model: if response.model.is_empty() {
                self.options.model.clone()
            } else {
                response.model
            },
            usage: response
                .usage
                .map(|u| LlmUsage::new(u.input_tokens, u.output_tokens)),
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for AnthropicClient {
    fn provider_name(&self) -> &str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.options.model
    }

    fn is_verbose(&self) -> bool {
        self.options.verbose
    }

    async fn invoke(&self, messages: &[ChatMessage]) -> AppResult<ChatResponse> {
        tracing::info!("Sending messages request to Anthropic");

        let body = self.request_body(messages);
        let request = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", self.options.api_key.expose_secret())
            .header("anthropic-version", ANTHROPIC_VERSION);

        let response: MessagesResponse =
            send_json("anthropic", request, &body, self.options.verbose).await?;

        tracing::info!("Received messages response from Anthropic");
        Ok(self.convert_response(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ExtraOptions;
    use biominer_core::SecretString;

    fn client() -> AnthropicClient {
        AnthropicClient::new(ClientOptions {
            model: "claude-3-sonnet-20240229".to_string(),
            temperature: Some(0.5),
            max_tokens: 4096,
            api_key: SecretString::new("sk-ant-test"),
            extra: ExtraOptions::new(),
            verbose: true,
        })
    }

    #[test]
    fn test_request_body() {
        let body = client().request_body(&[
            ChatMessage::system("Be brief."),
            ChatMessage::user("1 + 1 = ?"),
            ChatMessage::assistant("2"),
            ChatMessage::user("And 2 + 2?"),
        ]);

        assert_eq!(body["model"], "claude-3-sonnet-20240229");
        assert_eq!(body["max_tokens"], 4096);
        assert_eq!(body["temperature"], json!(0.5));
        assert_eq!(body["system"], "Be brief.");
        assert_eq!(body["messages"].as_array().map(Vec::len), Some(3));
        assert_eq!(body["messages"][1]["role"], "assistant");
    }

    #[test]
    fn test_request_body_without_system() {
        let body = client().request_body(&[ChatMessage::user("hi")]);
        assert!(body.get("system").is_none());
    }

    #[test]
    fn test_convert_response() {
        let response: MessagesResponse = serde_json::from_value(json!({
            "model": "claude-3-sonnet-20240229",
            "content": [
                { "type": "text", "text": "The answer " },
                { "type": "text", "text": "is 2." }
            ],
            "usage": { "input_tokens": 14, "output_tokens": 6 }
        }))
        .unwrap();

        let response = client().convert_response(response);
        assert_eq!(response.content, "The answer is 2.");
        assert_eq!(response.usage, Some(LlmUsage::new(14, 6)));
    }
}
