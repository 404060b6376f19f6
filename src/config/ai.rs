// src/config/ai.rs
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use super::env_string;

pub const ENV_SUMMARIZER_CONFIG_PATH: &str = "SUMMARIZER_CONFIG_PATH";
pub const ENV_GROQ_API_KEY: &str = "GROQ_API_KEY";
pub const ENV_SUMMARIZER_BASE_URL: &str = "SUMMARIZER_BASE_URL";
pub const ENV_SUMMARIZER_MODEL: &str = "SUMMARIZER_MODEL";

fn default_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}
fn default_model() -> String {
    "llama-3.1-8b-instant".to_string()
}
fn default_max_tokens() -> u32 {
    2000
}

/// Settings of the OpenAI-compatible summarization endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// "ENV" means: read from GROQ_API_KEY.
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_enabled() -> bool {
    true
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_base_url(),
            model: default_model(),
            api_key: String::new(),
            temperature: 0.0,
            max_tokens: default_max_tokens(),
        }
    }
}

impl SummarizerConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)?;
        let mut cfg: SummarizerConfig = serde_json::from_str(&data)?;

        if cfg.api_key.trim().eq_ignore_ascii_case("env") {
            cfg.api_key = env_string(ENV_GROQ_API_KEY)
                .ok_or_else(|| anyhow::anyhow!("Missing {ENV_GROQ_API_KEY} env var"))?;
        }
        cfg.sanitize();
        Ok(cfg)
    }

    /// `$SUMMARIZER_CONFIG_PATH` when set, otherwise plain env vars.
    pub fn from_env() -> anyhow::Result<Self> {
        if let Some(path) = env_string(ENV_SUMMARIZER_CONFIG_PATH) {
            return Self::load_from_file(path);
        }
        let mut cfg = Self {
            api_key: env_string(ENV_GROQ_API_KEY).unwrap_or_default(),
            ..Self::default()
        };
        if let Some(url) = env_string(ENV_SUMMARIZER_BASE_URL) {
            cfg.base_url = url;
        }
        if let Some(model) = env_string(ENV_SUMMARIZER_MODEL) {
            cfg.model = model;
        }
        cfg.sanitize();
        Ok(cfg)
    }

    /// Usable only when enabled and a key is present.
    pub fn is_usable(&self) -> bool {
        self.enabled && !self.api_key.trim().is_empty()
    }

    fn sanitize(&mut self) {
        self.base_url = self.base_url.trim_end_matches('/').to_string();
        if !(0.0..=2.0).contains(&self.temperature) {
            self.temperature = 0.0;
        }
        if self.max_tokens == 0 {
            self.max_tokens = default_max_tokens();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[serial_test::serial]
    #[test]
    fn file_with_env_key_resolves_from_environment() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("ai.json");
        fs::write(&p, r#"{"api_key":"ENV","model":"m","temperature":9.0,"base_url":"http://x/v1/"}"#).unwrap();

        std::env::set_var(ENV_GROQ_API_KEY, "k-123");
        let cfg = SummarizerConfig::load_from_file(&p).unwrap();
        assert_eq!(cfg.api_key, "k-123");
        assert_eq!(cfg.model, "m");
        assert_eq!(cfg.temperature, 0.0);
        assert_eq!(cfg.base_url, "http://x/v1");
        assert!(cfg.is_usable());

        std::env::remove_var(ENV_GROQ_API_KEY);
        assert!(SummarizerConfig::load_from_file(&p).is_err());
    }

    #[serial_test::serial]
    #[test]
    fn missing_key_is_not_usable() {
        std::env::remove_var(ENV_SUMMARIZER_CONFIG_PATH);
        std::env::remove_var(ENV_GROQ_API_KEY);
        let cfg = SummarizerConfig::from_env().unwrap();
        assert!(!cfg.is_usable());
        assert_eq!(cfg.model, "llama-3.1-8b-instant");
    }
}
