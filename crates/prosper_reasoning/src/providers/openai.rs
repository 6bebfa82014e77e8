use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::{json, Value};
use std::env;
use std::time::Duration;

use crate::api_types::{ContentBlock, Message, MessagesResponse, Role, Usage};
use crate::llm::{CompletionParams, LlmClient};
use crate::retry::{with_retry, RetryConfig};
use prosper_core::config::LlmConfig;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Client for any chat-completions compatible endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    retry: RetryConfig,
}

impl OpenAiClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| env::var("OPENAI_API_KEY").ok())
            .context("No OpenAI API key (set llm.api_key, LLM_API_KEY or OPENAI_API_KEY)")?;
        let base_url = config
            .base_url
            .clone()
            .or_else(|| env::var("OPENAI_BASE_URL").ok())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(60)).build()?,
            api_key,
            base_url,
            model: config.model.clone(),
            retry: RetryConfig::default(),
        })
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

/// System prompt first, then each message flattened to its text.
fn to_openai_messages(system: &str, messages: Vec<Message>) -> Vec<Value> {
    let mut out = Vec::with_capacity(messages.len() + 1);
    if !system.is_empty() {
        out.push(json!({"role": "system", "content": system}));
    }
    for msg in messages {
        let role = match msg.role {
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        let text = msg
            .content
            .into_iter()
            .map(|ContentBlock::Text { text }| text)
            .collect::<Vec<_>>()
            .join("\n");
        out.push(json!({"role": role, "content": text}));
    }
    out
}

#[async_trait::async_trait]
impl LlmClient for OpenAiClient {
    #[tracing::instrument(skip(self, system, messages, params), fields(model = %self.model))]
    async fn complete(
        &self,
        system: &str,
        messages: Vec<Message>,
        params: CompletionParams,
    ) -> Result<MessagesResponse> {
        let mut payload = json!({
            "model": self.model,
            "messages": to_openai_messages(system, messages),
            "max_tokens": params.max_tokens,
            "temperature": params.temperature,
        });
        if params.json_mode {
            payload["response_format"] = json!({"type": "json_object"});
        }

        let url = format!("{}/chat/completions", self.base_url);
        let client = &self.client;
        let auth = format!("Bearer {}", self.api_key);
        let response = with_retry(&self.retry, "OpenAI", || async {
            client
                .post(&url)
                .header("Authorization", &auth)
                .json(&payload)
                .send()
                .await
                .context("Failed to send request to OpenAI")
        })
        .await?;

        let resp_json: Value = response
            .json()
            .await
            .context("Failed to parse OpenAI response")?;
        let choice = &resp_json["choices"][0];
        let content = choice["message"]["content"].as_str().unwrap_or_default();
        let usage = resp_json.get("usage").map(|u| Usage {
            input_tokens: u["prompt_tokens"].as_u64().unwrap_or(0) as u32,
            output_tokens: u["completion_tokens"].as_u64().unwrap_or(0) as u32,
        });

        Ok(MessagesResponse {
            content: vec![ContentBlock::Text {
                text: content.to_string(),
            }],
            stop_reason: choice["finish_reason"].as_str().map(|s| s.to_string()),
            usage,
        })
    }
}
