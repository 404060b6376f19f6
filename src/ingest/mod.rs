// src/ingest/mod.rs
pub mod aggregate;
pub mod config;
pub mod dates;
pub mod format;
pub mod providers;
pub mod registry;
pub mod select;
pub mod types;

use crate::ingest::registry::FeedSource;
use crate::ingest::types::{Article, FeedFetcher, RawEntry};
use crate::relevance::QueryContext;
use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use std::time::{Duration, Instant};

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("news_fetch_total", "Feed fetches that returned entries.");
        describe_counter!("news_entries_total", "Entries parsed from feeds.");
        describe_counter!("news_source_errors_total", "Feed fetch/parse errors.");
        describe_counter!("news_source_timeouts_total", "Feed fetches that hit the per-source timeout.");
        describe_counter!("news_matched_total", "Entries that matched a query.");
        describe_counter!("news_dedup_total", "Matched entries dropped as exact-title repeats.");
        describe_counter!("news_fallback_total", "Aggregations that fell through to fallback search.");
        describe_counter!("news_fallback_requests_total", "Requests sent to the fallback provider.");
        describe_counter!("news_cancelled_total", "Aggregations cancelled mid fan-out.");
        describe_histogram!("news_fetch_ms", "Per-source fetch time in milliseconds.");
        describe_histogram!("news_parse_ms", "Feed parse time in milliseconds.");
    });
}

/// Normalize feed text: decode entities, strip tags, fold quotes and whitespace.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").expect("static regex"));
    out = re_tags.replace_all(&out, " ").to_string();

    // 3) Curly quotes to ASCII
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace (incl. NBSP)
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").expect("static regex"));
    out = re_ws.replace_all(&out, " ").trim().to_string();

    // 5) Length cap: 1500 chars
    if out.chars().count() > 1500 {
        out = out.chars().take(1500).collect();
    }

    out
}

/// Fetch one source, absorbing failure and timeout into an empty result.
pub async fn fetch_isolated(fetcher: &dyn FeedFetcher, source: &FeedSource, timeout: Duration) -> Vec<RawEntry> {
    let t0 = Instant::now();
    match tokio::time::timeout(timeout, fetcher.fetch(source)).await {
        Ok(Ok(entries)) => {
            histogram!("news_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
            counter!("news_fetch_total").increment(1);
            tracing::debug!(source = %source.name, entries = entries.len(), "feed fetched");
            entries
        }
        Ok(Err(e)) => {
            tracing::warn!(error = ?e, source = %source.name, provider = fetcher.name(), "feed error");
            counter!("news_source_errors_total").increment(1);
            Vec::new()
        }
        Err(_) => {
            tracing::warn!(
                source = %source.name,
                timeout_ms = timeout.as_millis() as u64,
                "feed timed out"
            );
            counter!("news_source_timeouts_total").increment(1);
            Vec::new()
        }
    }
}

/// Entries fetched from one registry slot.
#[derive(Debug, Clone)]
pub struct SourceBatch {
    pub index: usize,
    pub source: FeedSource,
    pub entries: Vec<RawEntry>,
}

/// Keep matching entries and turn them into dated, tagged articles.
/// Batches must already be in registry order; the output keeps that order.
pub fn match_articles(query: &QueryContext, batches: &[SourceBatch], now: DateTime<Utc>) -> Vec<Article> {
    let mut out = Vec::new();
    for batch in batches {
        for entry in batch.entries.iter().filter(|e| query.matches(e)) {
            out.push(Article {
                title: entry.title.clone(),
                published_at: dates::normalize_timestamp_at(entry.published.as_deref().unwrap_or_default(), now),
                source: batch.source.name.clone(),
                category: batch.source.category,
                link: entry.link.clone().unwrap_or_default(),
            });
        }
    }
    counter!("news_matched_total").increment(out.len() as u64);
    out
}
