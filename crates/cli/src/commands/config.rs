//! Config command handler.

use biominer_core::{AppResult, LlmConfig};
use clap::Args;

/// Print the resolved configuration
#[derive(Args, Debug)]
pub struct ConfigCommand {
    /// Print compact JSON on one line
    #[arg(long)]
    pub compact: bool,
}

impl ConfigCommand {
    pub fn execute(&self, config: &LlmConfig) -> AppResult<()> {
        tracing::info!("Executing config command");
        println!("{}", self.render(config)?);
        Ok(())
    }

    fn render(&self, config: &LlmConfig) -> AppResult<String> {
        let map = config.to_map();
        let json = if self.compact {
            serde_json::to_string(&map)?
        } else {
            serde_json::to_string_pretty(&map)?
        };
        Ok(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use biominer_core::{ConfigSources, Environment, LlmConfigInput};

    #[test]
    fn test_render_redacts_api_key() {
        let sources = ConfigSources::new(
            LlmConfigInput::new()
                .provider("anthropic")
                .api_key("sk-ant-secret"),
        )
        .with_environment(Environment::default())
        .without_env_file();
        let config = LlmConfig::resolve(&sources).unwrap();

        let json = ConfigCommand { compact: true }.render(&config).unwrap();
        assert!(json.contains("\"provider\":\"anthropic\""));
        assert!(!json.contains("sk-ant-secret"));
    }
}
