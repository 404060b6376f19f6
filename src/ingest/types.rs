// src/ingest/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ingest::registry::{Category, FeedSource};
use crate::relevance::QueryContext;

/// One entry as read from a feed, before relevance and date handling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEntry {
    pub title: String,
    pub description: String,
    pub published: Option<String>, // pubDate / dc:date / published / updated, verbatim
    pub link: Option<String>,
}

/// A matched entry tagged with where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub published_at: DateTime<Utc>,
    pub source: String,
    pub category: Category,
    pub link: String,
}

/// Reads the entries of a single feed.
#[async_trait::async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, source: &FeedSource) -> Result<Vec<RawEntry>>;
    fn name(&self) -> &'static str;
}

/// Last-resort search used when no feed produced a match.
#[async_trait::async_trait]
pub trait FallbackSearch: Send + Sync {
    async fn search(&self, query: &QueryContext, max_results: usize) -> Result<Vec<Article>>;
    fn name(&self) -> &'static str;
}

/// Fallback that never finds anything.
pub struct NoFallback;

#[async_trait::async_trait]
impl FallbackSearch for NoFallback {
    async fn search(&self, _query: &QueryContext, _max_results: usize) -> Result<Vec<Article>> {
        Ok(Vec::new())
    }

    fn name(&self) -> &'static str {
        "none"
    }
}
