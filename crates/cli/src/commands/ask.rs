//! Ask command handler.
//!
//! Builds the client for the resolved configuration, sends an optional
//! system message plus the prompt, and prints the answer with token usage.

use biominer_core::{AppError, AppResult, LlmConfig};
use biominer_llm::{get_tokens_usage, init_llm, ChatMessage, ChatResponse, ExtraOptions};
use clap::Args;
use serde_json::Value;

/// Send a prompt to the configured provider
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub prompt: String,

    /// System message sent before the prompt
    #[arg(short, long)]
    pub system: Option<String>,

    /// Extra request option as key=value (value parsed as JSON, else string)
    #[arg(short = 'x', long, value_parser = parse_extra)]
    pub extra: Vec<(String, Value)>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &LlmConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");

        let extra = self.extra_options();
        let llm = init_llm(config, (!extra.is_empty()).then_some(extra))?;

        let response = llm.invoke(&self.messages()).await?;

        if self.json {
            println!("{}", self.render_json(llm.provider_name(), &response)?);
        } else {
            println!("{}", response.content);

            let usage = get_tokens_usage(&response);
            if usage.is_empty() {
                tracing::debug!("Provider returned no token usage");
            } else {
                eprintln!(
                    "tokens: prompt={} completion={} total={}",
                    usage["prompt_tokens"], usage["completion_tokens"], usage["total_tokens"]
                );
            }
        }

        Ok(())
    }

    fn messages(&self) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &self.system {
            messages.push(ChatMessage::system(system.clone()));
        }
        messages.push(ChatMessage::user(self.prompt.clone()));
        messages
    }

    fn extra_options(&self) -> ExtraOptions {
        self.extra.iter().cloned().collect()
    }

    fn render_json(&self, provider: &str, response: &ChatResponse) -> AppResult<String> {
        let output = serde_json::json!({
            "answer": response.content,
            "model": response.model,
            "provider": provider,
            "usage": get_tokens_usage(response),
        });
        serde_json::to_string_pretty(&output).map_err(AppError::from)
    }
}

/// Parse a `key=value` extra option.
fn parse_extra(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty option name in '{}'", raw));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use biominer_llm::{LlmUsage, Role};
    use serde_json::json;

    fn command(system: Option<&str>) -> AskCommand {
        AskCommand {
            prompt: "1 + 1 = ?".to_string(),
            system: system.map(str::to_string),
            extra: vec![("top_p".to_string(), json!(0.9))],
            json: false,
        }
    }

    #[test]
    fn test_parse_extra_json_value() {
        assert_eq!(parse_extra("top_p=0.9").unwrap(), ("top_p".to_string(), json!(0.9)));
        assert_eq!(
            parse_extra("stop=[\"\\n\"]").unwrap().1,
            json!(["\n"])
        );
    }

    #[test]
    fn test_parse_extra_falls_back_to_string() {
        assert_eq!(
            parse_extra("user=alice").unwrap(),
            ("user".to_string(), json!("alice"))
        );
        assert_eq!(parse_extra("user=").unwrap().1, json!(""));
    }

    #[test]
    fn test_parse_extra_rejects_malformed() {
        assert!(parse_extra("top_p").is_err());
        assert!(parse_extra("=1").is_err());
    }

    #[test]
    fn test_messages_order() {
        let messages = command(Some("Be brief.")).messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].role, Role::User);

        assert_eq!(command(None).messages().len(), 1);
    }

    #[test]
    fn test_render_json() {
        let response = ChatResponse {
            content: "2".to_string(),
            model: "gpt-4o".to_string(),
            usage: Some(LlmUsage::new(20, 1)),
        };
        let rendered = command(None).render_json("openai", &response).unwrap();
        let value: Value = serde_json::from_str(&rendered).unwrap();

        assert_eq!(value["answer"], "2");
        assert_eq!(value["provider"], "openai");
        assert_eq!(value["usage"]["total_tokens"], 21);
        assert_eq!(command(None).extra_options()["top_p"], json!(0.9));
    }
}
