//! Command handlers for the BioMiner CLI.

pub mod ask;
pub mod config;

pub use ask::AskCommand;
pub use config::ConfigCommand;
