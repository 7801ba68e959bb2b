//! BioMiner CLI
//!
//! Main entry point for the biominer command-line tool.
//! Resolves the LLM configuration from flags, environment and env file,
//! then shows it or sends a prompt through the configured provider.

mod commands;

use biominer_core::{logging, AppResult, ConfigSources, LlmConfig, LlmConfigInput};
use clap::{Parser, Subcommand};
use commands::{AskCommand, ConfigCommand};
use std::path::PathBuf;

/// BioMiner CLI - LLM provider configuration and chat
#[derive(Parser, Debug)]
#[command(name = "biominer")]
#[command(about = "Resolve LLM provider settings and talk to the model", long_about = None)]
#[command(version)]
struct Cli {
    /// LLM provider (openai, anthropic, ollama, xai, gemini)
    #[arg(short, long, global = true)]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Sampling temperature (0.0-1.0)
    #[arg(long, global = true)]
    temperature: Option<f32>,

    /// Maximum tokens in response
    #[arg(long, global = true, allow_negative_numbers = true)]
    max_tokens: Option<i64>,

    /// OpenAI-compatible endpoint; selects the custom provider
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// API key (falls back to <PROVIDER>_API_KEY)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Path to env file (default: $BIOMINER_AI_ENV or .env)
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the resolved configuration (api key redacted)
    Config(ConfigCommand),

    /// Send a prompt to the configured provider
    Ask(AskCommand),
}

impl Cli {
    fn config_input(&self) -> LlmConfigInput {
        let mut input = LlmConfigInput::new();
        if let Some(provider) = &self.provider {
            input = input.provider(provider);
        }
        if let Some(model) = &self.model {
            input = input.model(model);
        }
        if let Some(temperature) = self.temperature {
            input = input.temperature(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            input = input.max_tokens(max_tokens);
        }
        if let Some(base_url) = &self.base_url {
            input = input.base_url(base_url);
        }
        if let Some(api_key) = &self.api_key {
            input = input.api_key(api_key);
        }
        input
    }

    fn sources(&self) -> ConfigSources {
        let sources = ConfigSources::new(self.config_input());
        match &self.env_file {
            Some(path) => sources.with_env_file(path),
            None => sources,
        }
    }

    fn log_level(&self) -> Option<&str> {
        if self.verbose {
            Some("debug")
        } else {
            self.log_level.as_deref()
        }
    }
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    logging::init_logging(cli.log_level(), cli.no_color)?;
    tracing::info!("BioMiner CLI starting");

    let config = LlmConfig::resolve(&cli.sources())?;
    tracing::debug!("Provider: {}", config.provider());
    tracing::debug!("Model: {}", config.model());

    let command_name = match &cli.command {
        Commands::Config(_) => "config",
        Commands::Ask(_) => "ask",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match &cli.command {
        Commands::Config(cmd) => cmd.execute(&config),
        Commands::Ask(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_become_explicit_input() {
        let cli = Cli::parse_from([
            "biominer",
            "--provider",
            "anthropic",
            "--temperature",
            "0.3",
            "--max-tokens",
            "256",
            "--api-key",
            "k1",
            "config",
        ]);
        let input = cli.config_input();
        let raw = input.as_raw();

        assert_eq!(raw.get("provider"), Some("anthropic"));
        assert_eq!(raw.get("temperature"), Some("0.3"));
        assert_eq!(raw.get("max_tokens"), Some("256"));
        assert_eq!(raw.get("api_key"), Some("k1"));
        assert!(!raw.contains_key("model"));
    }

    #[test]
    fn test_verbose_overrides_log_level() {
        let cli = Cli::parse_from(["biominer", "--log-level", "warn", "-v", "config"]);
        assert_eq!(cli.log_level(), Some("debug"));
    }

    #[test]
    fn test_negative_max_tokens_reaches_validation() {
        let cli = Cli::parse_from(["biominer", "--max-tokens", "-1", "config"]);
        assert_eq!(cli.config_input().as_raw().get("max_tokens"), Some("-1"));
    }

    #[test]
    fn test_ask_arguments() {
        let cli = Cli::parse_from([
            "biominer",
            "ask",
            "1 + 1 = ?",
            "--system",
            "Be brief.",
            "--extra",
            "top_p=0.9",
            "--json",
        ]);
        match cli.command {
            Commands::Ask(cmd) => {
                assert_eq!(cmd.prompt, "1 + 1 = ?");
                assert_eq!(cmd.system.as_deref(), Some("Be brief."));
                assert_eq!(cmd.extra.len(), 1);
                assert!(cmd.json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
