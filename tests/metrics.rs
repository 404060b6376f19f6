// tests/metrics.rs
#![cfg(feature = "strict-metrics")]
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use research_assistant::config::NewsConfig;
use research_assistant::ingest::providers::rss::FixtureFetcher;
use research_assistant::ingest::types::NoFallback;
use research_assistant::metrics::Metrics;
use research_assistant::{Category, FeedRegistry, FeedSource, NewsAggregator};
use std::sync::Arc;
use tower::ServiceExt;

const TECH_RSS: &str = include_str!("fixtures/tech_rss.xml");

#[tokio::test]
async fn metrics_exposed_after_aggregation() {
    let metrics = Metrics::init().expect("recorder");

    let agg = NewsAggregator::new(
        Arc::new(FeedRegistry::new(vec![
            FeedSource::new("Tech Wire", "fixture://tech", Category::Technology),
            FeedSource::new("Nowhere", "fixture://none", Category::Health),
        ])),
        Arc::new(FixtureFetcher::new().with_doc("Tech Wire", TECH_RSS)),
        Arc::new(NoFallback),
        NewsConfig::default(),
    );
    agg.aggregate("energy").await.unwrap();
    agg.aggregate("zeppelin").await.unwrap();

    let req = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
    let resp = metrics.router().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();

    for series in [
        "news_fetch_total",
        "news_entries_total",
        "news_source_errors_total",
        "news_matched_total",
        "news_fallback_total",
        "news_fetch_ms",
    ] {
        assert!(text.contains(series), "missing {series} in:\n{text}");
    }

    // a second init reuses the installed recorder
    assert!(Metrics::init().is_ok());
}
