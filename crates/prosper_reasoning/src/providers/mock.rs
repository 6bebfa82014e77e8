//! Mock LLM provider with canned replies, for tests and offline runs.

use crate::api_types::{ContentBlock, Message, MessagesResponse};
use crate::llm::{CompletionParams, LlmClient};
use anyhow::Result;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Prompts kept for inspection; older ones are dropped.
const PROMPT_HISTORY: usize = 32;

/// A report-shaped JSON reply, returned in JSON mode when no reply is scripted.
const CANNED_REPORT: &str = r#"{
  "overall_summary": "Mock summary: steady rhythms across body and spirit this month.",
  "interconnected_insights": ["Days with movement tend to carry a brighter mood."],
  "areas_of_strength": ["Consistency"],
  "growth_opportunities": ["Rest"],
  "personalized_recommendation": "Keep pairing a short walk with evening prayer."
}"#;

#[derive(Debug, Default)]
pub struct MockProvider {
    model: String,
    reply: Option<String>,
    prompts: Mutex<VecDeque<String>>,
}

impl MockProvider {
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
            ..Default::default()
        }
    }

    /// Always answer with `reply`.
    pub fn with_reply(reply: impl Into<String>) -> Self {
        Self {
            model: "mock".to_string(),
            reply: Some(reply.into()),
            ..Default::default()
        }
    }

    /// User-message text of the most recent calls, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        let prompts = self.prompts.lock().unwrap_or_else(|e| e.into_inner());
        prompts.iter().cloned().collect()
    }
}

#[async_trait::async_trait]
impl LlmClient for MockProvider {
    async fn complete(
        &self,
        _system: &str,
        messages: Vec<Message>,
        params: CompletionParams,
    ) -> Result<MessagesResponse> {
        let prompt = messages
            .iter()
            .flat_map(|m| m.content.iter())
            .map(|ContentBlock::Text { text }| text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        {
            let mut prompts = self.prompts.lock().unwrap_or_else(|e| e.into_inner());
            if prompts.len() == PROMPT_HISTORY {
                prompts.pop_front();
            }
            prompts.push_back(prompt);
        }

        let text = match (&self.reply, params.json_mode) {
            (Some(reply), _) => reply.clone(),
            (None, true) => CANNED_REPORT.to_string(),
            (None, false) => format!("(Mock {} Response) I received your prompt.", self.model),
        };
        Ok(MessagesResponse {
            content: vec![ContentBlock::Text { text }],
            stop_reason: Some("end_turn".to_string()),
            usage: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_complete() {
        let provider = MockProvider::new("test-model");
        let resp = provider
            .complete("system", vec![Message::user("hello")], CompletionParams::default())
            .await
            .unwrap();
        assert!(resp.text().contains("Mock test-model"));
        assert_eq!(provider.prompts(), vec!["hello".to_string()]);
    }

    #[tokio::test]
    async fn test_prompt_history_is_bounded() {
        let provider = MockProvider::new("test-model");
        for i in 0..PROMPT_HISTORY + 8 {
            provider
                .complete("", vec![Message::user(format!("call {}", i))], CompletionParams::default())
                .await
                .unwrap();
        }
        let prompts = provider.prompts();
        assert_eq!(prompts.len(), PROMPT_HISTORY);
        assert_eq!(prompts[0], "call 8");
        assert_eq!(prompts.last().unwrap(), &format!("call {}", PROMPT_HISTORY + 7));
    }

    #[tokio::test]
    async fn test_mock_json_mode_returns_object() {
        let provider = MockProvider::new("test-model");
        let resp = provider
            .complete(
                "",
                vec![],
                CompletionParams {
                    json_mode: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let v: serde_json::Value = serde_json::from_str(&resp.text()).unwrap();
        assert!(v["overall_summary"].is_string());
    }
}
