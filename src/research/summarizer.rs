// src/research/summarizer.rs
//! Summarization over an OpenAI-compatible chat-completions endpoint
//! (Groq by default).

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::Summarizer;
use crate::config::ai::SummarizerConfig;

pub struct ChatSummarizer {
    http: reqwest::Client,
    cfg: SummarizerConfig,
}

impl ChatSummarizer {
    pub fn new(cfg: SummarizerConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("research-assistant/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(60))
            .build()
            .context("building summarizer http client")?;
        Ok(Self { http, cfg })
    }
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct Req<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct Resp {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMsg,
}

#[derive(Deserialize)]
struct ChoiceMsg {
    content: String,
}

#[async_trait]
impl Summarizer for ChatSummarizer {
    async fn summarize(&self, context: &str) -> Result<String> {
        if !self.cfg.is_usable() {
            bail!("summarizer has no API key");
        }
        let req = Req {
            model: &self.cfg.model,
            messages: vec![Msg {
                role: "user",
                content: context,
            }],
            temperature: self.cfg.temperature,
            max_tokens: self.cfg.max_tokens,
        };

        let resp = self
            .http
            .post(format!("{}/chat/completions", self.cfg.base_url))
            .bearer_auth(&self.cfg.api_key)
            .json(&req)
            .send()
            .await
            .context("summarizer http post()")?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            bail!("summarizer answered HTTP {status}: {}", text.chars().take(200).collect::<String>());
        }
        let body: Resp = resp.json().await.context("summarizer json body")?;
        let content = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| anyhow!("summarizer returned no content"))?;
        Ok(content)
    }

    fn name(&self) -> &'static str {
        "groq"
    }
}

/// Used when no key is configured; always fails so callers fall back.
pub struct DisabledSummarizer;

#[async_trait]
impl Summarizer for DisabledSummarizer {
    async fn summarize(&self, _context: &str) -> Result<String> {
        Err(anyhow!("summarizer disabled"))
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}
