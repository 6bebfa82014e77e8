use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::entities::Confidence;

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProsperConfig {
    pub llm: LlmConfig,
    pub store: StoreConfig,
    pub engagement: EngagementConfig,
    pub suggestions: SuggestionConfig,
    pub report: ReportConfig,
    pub gateway: GatewayConfig,
}

impl ProsperConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    /// After loading, env var overrides are applied.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let mut config: ProsperConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML config")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Try to load from path; if file doesn't exist, return defaults with env overrides.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::info!("Config file not found or invalid ({:#}), using defaults", e);
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                cfg
            }
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("LLM_PROVIDER") {
            self.llm.provider = v;
        }
        if let Ok(v) = std::env::var("LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("LLM_BASE_URL") {
            self.llm.base_url = Some(v);
        }
        if let Ok(v) = std::env::var("LLM_API_KEY") {
            self.llm.api_key = Some(v);
        }
        if let Ok(v) = std::env::var("LLM_MAX_TOKENS") {
            if let Ok(n) = v.parse() {
                self.llm.max_tokens = n;
            }
        }
        if let Ok(v) = std::env::var("PROSPER_DB") {
            self.store.db_path = v;
        }
        if let Ok(v) = std::env::var("PROSPER_PORT") {
            if let Ok(n) = v.parse() {
                self.gateway.port = n;
            }
        }
    }
}

// ============================================================================
// Sub-configs
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// "anthropic", "openai" or "mock".
    pub provider: String,
    pub model: String,
    pub base_url: Option<String>,
    /// Falls back to the provider's conventional env var when unset.
    pub api_key: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            model: "claude-sonnet-4-5-20250929".to_string(),
            base_url: None,
            api_key: None,
            max_tokens: 4096,
            temperature: 0.7,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub db_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: "prosper.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngagementConfig {
    /// Streak length that earns a "streak maintained" notification.
    pub streak_milestone: u32,
    /// Deep-study sessions needed (with high engagement) for the deep-study message.
    pub deep_study_threshold: u32,
    /// Fixed seed for message selection; entropy when unset.
    pub seed: Option<u64>,
}

impl Default for EngagementConfig {
    fn default() -> Self {
        Self {
            streak_milestone: 7,
            deep_study_threshold: 5,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SuggestionConfig {
    pub expiry_days: i64,
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self { expiry_days: 5 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub window_days: i64,
    pub correlation: CorrelationConfig,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            window_days: 30,
            correlation: CorrelationConfig::default(),
        }
    }
}

/// Occurrence threshold and fixed confidence labels for the co-occurrence
/// correlations. These are not statistically derived.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CorrelationConfig {
    pub min_occurrences: u32,
    pub workout_mood_confidence: Confidence,
    pub spiritual_journaling_confidence: Confidence,
    pub nutrition_fitness_confidence: Confidence,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            min_occurrences: 3,
            workout_mood_confidence: Confidence::High,
            spiritual_journaling_confidence: Confidence::Medium,
            nutrition_fitness_confidence: Confidence::Medium,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8787,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
