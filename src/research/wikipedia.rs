// src/research/wikipedia.rs
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use super::Encyclopedia;

pub const DEFAULT_WIKIPEDIA_API: &str = "https://en.wikipedia.org/w/api.php";

const TOP_K_PAGES: usize = 3;
const MAX_CHARS_PER_PAGE: usize = 2000;

#[derive(Debug, Deserialize)]
struct QueryResp {
    query: Option<QueryBody>,
}

#[derive(Debug, Deserialize)]
struct QueryBody {
    #[serde(default)]
    pages: HashMap<String, Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    title: String,
    #[serde(default)]
    index: usize,
    #[serde(default)]
    extract: String,
}

/// MediaWiki search + intro extracts for the top pages of a topic.
pub struct WikipediaClient {
    http: reqwest::Client,
    api_url: String,
}

impl WikipediaClient {
    pub fn new(user_agent: &str) -> Result<Self> {
        Self::with_api_url(user_agent, DEFAULT_WIKIPEDIA_API)
    }

    pub fn with_api_url(user_agent: &str, api_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(20))
            .build()
            .context("building wikipedia http client")?;
        Ok(Self {
            http,
            api_url: api_url.to_string(),
        })
    }
}

#[async_trait]
impl Encyclopedia for WikipediaClient {
    async fn lookup(&self, topic: &str) -> Result<String> {
        let limit = TOP_K_PAGES.to_string();
        let resp = self
            .http
            .get(&self.api_url)
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("generator", "search"),
                ("gsrsearch", topic),
                ("gsrlimit", limit.as_str()),
                ("prop", "extracts"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("exlimit", "max"),
            ])
            .send()
            .await
            .context("wikipedia http get()")?;
        if !resp.status().is_success() {
            bail!("wikipedia answered HTTP {}", resp.status());
        }
        let body: QueryResp = resp.json().await.context("wikipedia json body")?;
        let text = render_pages(body);
        if text.is_empty() {
            bail!("no good Wikipedia search result was found for {topic:?}");
        }
        Ok(text)
    }

    fn name(&self) -> &'static str {
        "wikipedia"
    }
}

fn render_pages(body: QueryResp) -> String {
    let mut pages: Vec<Page> = body
        .query
        .map(|q| q.pages.into_values().collect())
        .unwrap_or_default();
    pages.sort_by_key(|p| p.index);
    pages
        .into_iter()
        .filter(|p| !p.extract.trim().is_empty())
        .take(TOP_K_PAGES)
        .map(|p| {
            let extract: String = p.extract.trim().chars().take(MAX_CHARS_PER_PAGE).collect();
            format!("Page: {}\nSummary: {}", p.title, extract)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
