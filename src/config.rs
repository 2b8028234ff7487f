//! CLI arguments and runtime configuration.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::generator::GeneratorConfig;

/// taskdeck: hierarchical to-do service with LLM-assisted task breakdown.
#[derive(Debug, Parser)]
#[command(name = "taskdeck", version, about)]
pub struct Cli {
    /// Path to the SQLite database file.
    #[arg(long, default_value = "taskdeck.db", env = "TASKDECK_DB")]
    pub db: PathBuf,

    /// Address to bind the HTTP server to.
    #[arg(long, default_value = "127.0.0.1:8080", env = "TASKDECK_ADDR")]
    pub addr: SocketAddr,

    /// Base URL of an OpenAI-compatible chat-completions API.
    #[arg(
        long,
        default_value = "https://api.openai.com/v1",
        env = "TASKDECK_GENERATOR_URL"
    )]
    pub generator_url: String,

    /// Model used for task breakdown.
    #[arg(long, default_value = "gpt-4o-mini", env = "TASKDECK_GENERATOR_MODEL")]
    pub generator_model: String,

    /// API key for the generator. When absent, breakdown requests fail
    /// with an upstream error while the CRUD API keeps working.
    #[arg(long, env = "TASKDECK_GENERATOR_API_KEY", hide_env_values = true)]
    pub generator_api_key: Option<String>,

    /// Generator request timeout in seconds.
    #[arg(long, default_value_t = 30, env = "TASKDECK_GENERATOR_TIMEOUT")]
    pub generator_timeout_secs: u64,
}

impl Cli {
    pub fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig {
            base_url: self.generator_url.trim_end_matches('/').to_string(),
            model: self.generator_model.clone(),
            api_key: self.generator_api_key.clone(),
            timeout_secs: self.generator_timeout_secs,
        }
    }
}
