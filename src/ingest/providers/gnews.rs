// src/ingest/providers/gnews.rs
//! GNews search, used only when none of the feeds matched the query.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{SecondsFormat, TimeDelta, Utc};
use metrics::counter;
use serde::Deserialize;
use std::time::Duration;

use crate::config::{NewsConfig, MAX_FALLBACK_WINDOW_DAYS};
use crate::ingest::dates::normalize_timestamp_at;
use crate::ingest::normalize_text;
use crate::ingest::registry::Category;
use crate::ingest::types::{Article, FallbackSearch};
use crate::relevance::QueryContext;

pub const DEFAULT_GNEWS_BASE_URL: &str = "https://gnews.io/api/v4";

#[derive(Debug, Deserialize)]
struct SearchResp {
    #[serde(default)]
    articles: Vec<GnewsArticle>,
}

#[derive(Debug, Deserialize)]
struct GnewsArticle {
    title: Option<String>,
    url: Option<String>,
    #[serde(rename = "publishedAt")]
    published_at: Option<String>,
    source: Option<GnewsSource>,
}

#[derive(Debug, Deserialize)]
struct GnewsSource {
    name: Option<String>,
}

pub struct GnewsSearch {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    window_days: i64,
}

impl GnewsSearch {
    pub fn new(cfg: &NewsConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(cfg.user_agent.as_str())
            .connect_timeout(Duration::from_secs(4))
            .timeout(cfg.fetch_timeout)
            .build()
            .context("building gnews http client")?;
        Ok(Self {
            http,
            base_url: cfg.gnews_base_url.trim_end_matches('/').to_string(),
            api_key: cfg.gnews_api_key.clone(),
            window_days: cfg.fallback_window_days.clamp(1, MAX_FALLBACK_WINDOW_DAYS),
        })
    }

    async fn search_impl(&self, key: &str, query: &QueryContext, max_results: usize) -> Result<Vec<Article>> {
        let now = Utc::now();
        let from = TimeDelta::try_days(self.window_days)
            .and_then(|window| now.checked_sub_signed(window))
            .context("fallback window out of range")?
            .to_rfc3339_opts(SecondsFormat::Secs, true);
        let q = query.search_phrase();
        let max = max_results.to_string();

        let resp = self
            .http
            .get(format!("{}/search", self.base_url))
            .query(&[
                ("q", q.as_str()),
                ("lang", "en"),
                ("country", "us"),
                ("max", max.as_str()),
                ("from", from.as_str()),
                ("apikey", key),
            ])
            .send()
            .await
            .context("gnews http get()")?;

        let status = resp.status();
        tracing::debug!(%status, "gnews response");
        if !status.is_success() {
            bail!("gnews answered HTTP {status}");
        }
        let body: SearchResp = resp.json().await.context("gnews json body")?;

        let out: Vec<Article> = body
            .articles
            .into_iter()
            .filter_map(|a| {
                let title = normalize_text(a.title.as_deref().unwrap_or_default());
                if title.is_empty() {
                    return None;
                }
                let source = a
                    .source
                    .and_then(|s| s.name)
                    .map(|n| n.trim().to_string())
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| "GNews".to_string());
                Some(Article {
                    title,
                    published_at: normalize_timestamp_at(a.published_at.as_deref().unwrap_or_default(), now),
                    source,
                    category: Category::GeneralNews,
                    link: a.url.unwrap_or_default(),
                })
            })
            .take(max_results)
            .collect();
        Ok(out)
    }
}

#[async_trait]
impl FallbackSearch for GnewsSearch {
    async fn search(&self, query: &QueryContext, max_results: usize) -> Result<Vec<Article>> {
        let Some(key) = self.api_key.as_deref() else {
            tracing::info!("GNews API key not configured; fallback search disabled");
            return Ok(Vec::new());
        };
        if query.is_empty() || max_results == 0 {
            return Ok(Vec::new());
        }
        counter!("news_fallback_requests_total").increment(1);
        self.search_impl(key, query, max_results).await
    }

    fn name(&self) -> &'static str {
        "gnews"
    }
}
