// src/research/mod.rs
//! Topic research: encyclopedia lookup, recent news, then a summary.

pub mod summarizer;
pub mod wikipedia;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

use crate::ingest::aggregate::{NewsAggregator, NewsDigest, NewsOrigin};

pub const ERROR_SUMMARY: &str = "Error processing the request";

#[async_trait]
pub trait Encyclopedia: Send + Sync {
    async fn lookup(&self, topic: &str) -> Result<String>;
    fn name(&self) -> &'static str;
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, context: &str) -> Result<String>;
    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchResponse {
    pub topic: String,
    pub summary: String,
    pub sources: Vec<String>,
    pub tools_used: Vec<String>,
    #[serde(default)]
    pub recent_news: Option<Vec<String>>,
}

impl ResearchResponse {
    pub fn failed(topic: &str) -> Self {
        Self {
            topic: topic.to_string(),
            summary: ERROR_SUMMARY.to_string(),
            sources: Vec::new(),
            tools_used: Vec::new(),
            recent_news: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.summary == ERROR_SUMMARY && self.sources.is_empty()
    }
}

/// Plain-text report, as printed by the CLI.
impl fmt::Display for ResearchResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Research Results:")?;
        writeln!(f, "Topic: {}", self.topic)?;
        writeln!(f)?;
        writeln!(f, "Summary:")?;
        writeln!(f, "{}", self.summary)?;
        if let Some(news) = self.recent_news.as_ref().filter(|n| !n.is_empty()) {
            writeln!(f)?;
            writeln!(f, "Recent News:")?;
            for line in news {
                writeln!(f, "- {line}")?;
            }
        }
        writeln!(f)?;
        writeln!(f, "Sources: {}", self.sources.join(", "))?;
        write!(f, "Tools Used: {}", self.tools_used.join(", "))
    }
}

/// Subject and body for mailing a research result.
pub fn format_results_for_email(result: &ResearchResponse) -> (String, String) {
    let subject = format!("Research Results: {}", result.topic);
    let mut body = format!(
        "Research Results for: {}\n\nSummary:\n{}\n\n",
        result.topic, result.summary
    );
    if let Some(news) = result.recent_news.as_ref().filter(|n| !n.is_empty()) {
        body.push_str("\nRecent News:\n");
        for line in news {
            body.push_str("- ");
            body.push_str(line);
            body.push('\n');
        }
    }
    body.push_str(&format!("\nSources: {}", result.sources.join(", ")));
    body.push_str(&format!("\nTools Used: {}", result.tools_used.join(", ")));
    (subject, body)
}

/// The prompt handed to the summarizer.
pub fn build_prompt(topic: &str, wiki: &str, news: &[String]) -> String {
    let news_block = if news.is_empty() {
        "No recent news available.".to_string()
    } else {
        news.iter().map(|n| format!("- {n}")).collect::<Vec<_>>().join("\n")
    };
    format!(
        "Based on the following information about {topic}, please provide a clear and concise summary:\n\n\
         Information from Wikipedia:\n{wiki}\n\n\
         Recent News Articles:\n{news_block}\n\n\
         Please focus on the most relevant and recent information in your summary."
    )
}

pub struct Researcher {
    encyclopedia: Arc<dyn Encyclopedia>,
    summarizer: Arc<dyn Summarizer>,
    news: Arc<NewsAggregator>,
}

impl Researcher {
    pub fn new(
        encyclopedia: Arc<dyn Encyclopedia>,
        summarizer: Arc<dyn Summarizer>,
        news: Arc<NewsAggregator>,
    ) -> Self {
        Self {
            encyclopedia,
            summarizer,
            news,
        }
    }

    pub fn news(&self) -> &NewsAggregator {
        &self.news
    }

    pub async fn research(&self, topic: &str) -> ResearchResponse {
        let topic = topic.trim();
        let wiki = match self.encyclopedia.lookup(topic).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = ?e, topic, provider = self.encyclopedia.name(), "lookup failed");
                return ResearchResponse::failed(topic);
            }
        };

        let digest = match self.news.aggregate(topic).await {
            Ok(d) => Some(d),
            Err(e) => {
                warn!(error = ?e, topic, "news aggregation failed; continuing without news");
                None
            }
        };
        let lines = digest.as_ref().map(NewsDigest::lines).unwrap_or_default();

        let prompt = build_prompt(topic, &wiki, &lines);
        let summary = match self.summarizer.summarize(&prompt).await {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, provider = self.summarizer.name(), "summarizer unavailable; using lookup text");
                wiki
            }
        };

        let mut sources = vec!["Wikipedia".to_string()];
        let mut tools_used = vec![self.encyclopedia.name().to_string()];
        match digest.as_ref().map(|d| d.origin) {
            Some(NewsOrigin::Feeds) => {
                sources.push("RSS News Feeds".into());
                tools_used.push("rss_feeds".into());
            }
            Some(NewsOrigin::Fallback) => {
                sources.push("GNews".into());
                tools_used.push("gnews".into());
            }
            Some(NewsOrigin::Empty) | None => {}
        }

        info!(topic, news = lines.len(), sources = ?sources, "research complete");
        ResearchResponse {
            topic: topic.to_string(),
            summary,
            sources,
            tools_used,
            recent_news: if lines.is_empty() { None } else { Some(lines) },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ResearchResponse {
        ResearchResponse {
            topic: "solar energy".into(),
            summary: "Sun power.".into(),
            sources: vec!["Wikipedia".into(), "GNews".into()],
            tools_used: vec!["wikipedia".into(), "gnews".into()],
            recent_news: Some(vec!["Panels (General News: Wire, 2024-01-01 00:00 UTC)".into()]),
        }
    }

    #[test]
    fn email_subject_and_body() {
        let (subject, body) = format_results_for_email(&sample());
        assert_eq!(subject, "Research Results: solar energy");
        assert!(body.starts_with("Research Results for: solar energy\n\nSummary:\nSun power.\n\n"));
        assert!(body.contains("\nRecent News:\n- Panels (General News: Wire, 2024-01-01 00:00 UTC)\n"));
        assert!(body.ends_with("\nSources: Wikipedia, GNews\nTools Used: wikipedia, gnews"));
    }

    #[test]
    fn email_body_skips_empty_news() {
        let mut r = sample();
        r.recent_news = None;
        let (_, body) = format_results_for_email(&r);
        assert!(!body.contains("Recent News"));
    }

    #[test]
    fn prompt_mentions_missing_news() {
        let p = build_prompt("tides", "Page: Tide\nSummary: water", &[]);
        assert!(p.contains("Recent News Articles:\nNo recent news available."));
        assert!(p.starts_with("Based on the following information about tides"));
    }

    #[test]
    fn report_lists_news_and_sources() {
        let text = sample().to_string();
        assert!(text.contains("Topic: solar energy"));
        assert!(text.contains("- Panels"));
        assert!(text.ends_with("Tools Used: wikipedia, gnews"));
        assert!(!ResearchResponse::failed("x").to_string().contains("Recent News"));
    }
}
