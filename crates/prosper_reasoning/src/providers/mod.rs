pub mod anthropic;
pub mod mock;
pub mod openai;

pub use anthropic::AnthropicClient;
pub use mock::MockProvider;
pub use openai::OpenAiClient;

use crate::llm::LlmClient;
use anyhow::Result;
use prosper_core::config::LlmConfig;
use std::sync::Arc;

/// Build the client named by `config.provider`.
pub fn from_config(config: &LlmConfig) -> Result<Arc<dyn LlmClient>> {
    let client: Arc<dyn LlmClient> = match config.provider.to_lowercase().as_str() {
        "anthropic" | "claude" => Arc::new(AnthropicClient::new(config)?),
        "openai" | "deepseek" | "openai-compatible" => Arc::new(OpenAiClient::new(config)?),
        "mock" => Arc::new(MockProvider::new(&config.model)),
        other => anyhow::bail!("Unknown LLM provider: {}", other),
    };
    tracing::info!("LLM provider: {} ({})", config.provider, config.model);
    Ok(client)
}
