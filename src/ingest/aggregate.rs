// src/ingest/aggregate.rs
//! One aggregation pass: fetch every feed, keep what matches the query,
//! pick a category-balanced handful, and fall back to a search provider when
//! nothing matched.
//!
//! Fetches fan out as one task per source (bounded by a semaphore, each with
//! its own timeout) and fan back in before any selection happens, because
//! round 1 of the selector needs the complete matched set.

use anyhow::{anyhow, Result};
use chrono::Utc;
use metrics::counter;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::config::NewsConfig;
use crate::ingest::format::render_lines;
use crate::ingest::providers::gnews::GnewsSearch;
use crate::ingest::providers::rss::HttpFeedFetcher;
use crate::ingest::registry::{Category, FeedRegistry};
use crate::ingest::select::{dedup_exact_titles, select_balanced};
use crate::ingest::types::{Article, FallbackSearch, FeedFetcher};
use crate::ingest::{ensure_metrics_described, fetch_isolated, match_articles, SourceBatch};
use crate::relevance::QueryContext;

/// Where the final items came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NewsOrigin {
    Feeds,
    Fallback,
    /// Neither feeds nor fallback produced anything: "no recent news".
    Empty,
}

/// Outcome of one aggregation call.
#[derive(Debug, Clone, Serialize)]
pub struct NewsDigest {
    pub query: String,
    pub origin: NewsOrigin,
    pub items: Vec<Article>,
}

impl NewsDigest {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The rendered news lines, in selection order.
    pub fn lines(&self) -> Vec<String> {
        render_lines(&self.items)
    }

    /// Item count per category, in order of first appearance.
    pub fn category_counts(&self) -> Vec<(Category, usize)> {
        let mut out: Vec<(Category, usize)> = Vec::new();
        for a in &self.items {
            match out.iter_mut().find(|(c, _)| *c == a.category) {
                Some((_, n)) => *n += 1,
                None => out.push((a.category, 1)),
            }
        }
        out
    }
}

pub struct NewsAggregator {
    registry: Arc<FeedRegistry>,
    fetcher: Arc<dyn FeedFetcher>,
    fallback: Arc<dyn FallbackSearch>,
    cfg: NewsConfig,
}

impl NewsAggregator {
    pub fn new(
        registry: Arc<FeedRegistry>,
        fetcher: Arc<dyn FeedFetcher>,
        fallback: Arc<dyn FallbackSearch>,
        cfg: NewsConfig,
    ) -> Self {
        Self {
            registry,
            fetcher,
            fallback,
            cfg,
        }
    }

    /// HTTP feeds plus GNews fallback.
    pub fn from_config(registry: Arc<FeedRegistry>, cfg: NewsConfig) -> Result<Self> {
        let fetcher = Arc::new(HttpFeedFetcher::new(&cfg)?);
        let fallback = Arc::new(GnewsSearch::new(&cfg)?);
        Ok(Self::new(registry, fetcher, fallback, cfg))
    }

    pub fn registry(&self) -> &FeedRegistry {
        &self.registry
    }

    pub fn config(&self) -> &NewsConfig {
        &self.cfg
    }

    /// Rendered lines for `query`; empty means "no recent news".
    pub async fn recent_news(&self, query: &str) -> Result<Vec<String>> {
        Ok(self.aggregate(query).await?.lines())
    }

    pub async fn aggregate(&self, query: &str) -> Result<NewsDigest> {
        self.aggregate_until(query, std::future::pending::<()>()).await
    }

    /// Like [`aggregate`](Self::aggregate), but stops waiting for feeds at `deadline`.
    pub async fn aggregate_within(&self, query: &str, deadline: Duration) -> Result<NewsDigest> {
        self.aggregate_until(query, tokio::time::sleep(deadline)).await
    }

    pub async fn aggregate_until<F>(&self, query: &str, cancel: F) -> Result<NewsDigest>
    where
        F: Future<Output = ()>,
    {
        self.aggregate_with_limit(query, self.cfg.max_results, cancel).await
    }

    /// Full pass with an explicit result bound. When `cancel` resolves during
    /// the fan-out, in-flight fetches are aborted and the completed ones are used.
    pub async fn aggregate_with_limit<F>(&self, query: &str, max_results: usize, cancel: F) -> Result<NewsDigest>
    where
        F: Future<Output = ()>,
    {
        ensure_metrics_described();
        let ctx = QueryContext::new(query);

        let batches = self.fetch_all(cancel).await?;
        let now = Utc::now();
        let matched = match_articles(&ctx, &batches, now);
        let (matched, dups) = dedup_exact_titles(matched);
        counter!("news_dedup_total").increment(dups as u64);

        let selected = select_balanced(matched, max_results);
        if !selected.is_empty() {
            info!(query = %ctx.raw(), selected = selected.len(), "news selected from feeds");
            return Ok(NewsDigest {
                query: ctx.raw().to_string(),
                origin: NewsOrigin::Feeds,
                items: selected,
            });
        }

        counter!("news_fallback_total").increment(1);
        let fallback = match self.fallback.search(&ctx, max_results).await {
            Ok(mut items) => {
                items.truncate(max_results);
                items
            }
            Err(e) => {
                warn!(error = ?e, provider = self.fallback.name(), "fallback search failed");
                Vec::new()
            }
        };
        let origin = if fallback.is_empty() {
            NewsOrigin::Empty
        } else {
            NewsOrigin::Fallback
        };
        info!(query = %ctx.raw(), selected = fallback.len(), ?origin, "no feed matched; used fallback");
        Ok(NewsDigest {
            query: ctx.raw().to_string(),
            origin,
            items: fallback,
        })
    }

    /// Fan out one task per source and wait for all of them (or `cancel`).
    /// Batches come back in registry order.
    async fn fetch_all<F>(&self, cancel: F) -> Result<Vec<SourceBatch>>
    where
        F: Future<Output = ()>,
    {
        let permits = Arc::new(Semaphore::new(self.cfg.max_concurrency.max(1)));
        let timeout = self.cfg.fetch_timeout;
        let mut set: JoinSet<SourceBatch> = JoinSet::new();

        for (index, source) in self.registry.iter().cloned().enumerate() {
            let fetcher = Arc::clone(&self.fetcher);
            let permits = Arc::clone(&permits);
            set.spawn(async move {
                let _permit = permits.acquire_owned().await.ok();
                let entries = fetch_isolated(fetcher.as_ref(), &source, timeout).await;
                SourceBatch { index, source, entries }
            });
        }

        tokio::pin!(cancel);
        let mut batches: Vec<SourceBatch> = Vec::with_capacity(self.registry.len());
        loop {
            tokio::select! {
                joined = set.join_next() => match joined {
                    Some(Ok(batch)) => batches.push(batch),
                    Some(Err(e)) if e.is_panic() => {
                        set.abort_all();
                        return Err(anyhow!("feed fetch task panicked: {e}"));
                    }
                    Some(Err(_)) => {}
                    None => break,
                },
                _ = &mut cancel => {
                    warn!(
                        completed = batches.len(),
                        pending = set.len(),
                        "aggregation cancelled; aborting in-flight fetches"
                    );
                    counter!("news_cancelled_total").increment(1);
                    set.abort_all();
                    break;
                }
            }
        }

        batches.sort_by_key(|b| b.index);
        Ok(batches)
    }
}
