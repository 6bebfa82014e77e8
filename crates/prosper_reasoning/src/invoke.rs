//! Single-prompt LLM invocation with an optional JSON-schema reply.

use crate::api_types::Message;
use crate::llm::{CompletionParams, LlmClient};
use anyhow::{Context, Result};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq)]
pub enum LlmOutput {
    Text(String),
    Json(Value),
}

fn json_system_prompt(schema: &Value) -> String {
    format!(
        "Respond with a single JSON object and nothing else. \
         No prose, no markdown. The object must match this JSON schema:\n{}",
        serde_json::to_string_pretty(schema).unwrap_or_else(|_| schema.to_string())
    )
}

/// Send `prompt` as one user message. With a schema the reply must parse as
/// a JSON object; otherwise the raw text is returned.
pub async fn invoke_llm(
    client: &dyn LlmClient,
    prompt: &str,
    schema: Option<&Value>,
    params: CompletionParams,
) -> Result<LlmOutput> {
    let system = schema.map(json_system_prompt).unwrap_or_default();
    let params = CompletionParams {
        json_mode: schema.is_some(),
        ..params
    };

    let response = client
        .complete(&system, vec![Message::user(prompt)], params)
        .await
        .context("LLM completion failed")?;
    let text = response.text();

    match schema {
        None => Ok(LlmOutput::Text(text)),
        Some(_) => parse_json_reply(&text)
            .map(LlmOutput::Json)
            .with_context(|| {
                format!(
                    "LLM reply is not a JSON object: {}",
                    text.chars().take(200).collect::<String>()
                )
            }),
    }
}

fn fenced_block() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").expect("valid regex"))
}

/// Lenient JSON-object extraction: the whole reply, then a fenced code
/// block, then the span from the first `{` to the last `}`.
pub fn parse_json_reply(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    let as_object = |s: &str| serde_json::from_str::<Value>(s).ok().filter(Value::is_object);

    if let Some(v) = as_object(trimmed) {
        return Some(v);
    }
    if let Some(v) = fenced_block()
        .captures(trimmed)
        .and_then(|c| c.get(1))
        .and_then(|m| as_object(m.as_str()))
    {
        return Some(v);
    }
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    as_object(&trimmed[start..=end])
}
