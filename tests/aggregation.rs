// tests/aggregation.rs
//
// The full aggregation pass with scripted fetchers: fan-out isolation,
// timeouts, cancellation, fallback and the rendered line contract.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use research_assistant::config::NewsConfig;
use research_assistant::ingest::types::NoFallback;
use research_assistant::{
    parse_line, Article, Category, FallbackSearch, FeedFetcher, FeedRegistry, FeedSource, NewsAggregator,
    NewsOrigin, QueryContext, RawEntry,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
enum Script {
    Entries(Vec<RawEntry>),
    Fail,
    Sleep(Duration, Vec<RawEntry>),
    Panic,
}

#[derive(Default)]
struct ScriptedFetcher {
    by_source: HashMap<String, Script>,
}

impl ScriptedFetcher {
    fn with(mut self, source: &str, script: Script) -> Self {
        self.by_source.insert(source.to_string(), script);
        self
    }
}

#[async_trait]
impl FeedFetcher for ScriptedFetcher {
    async fn fetch(&self, source: &FeedSource) -> Result<Vec<RawEntry>> {
        match self.by_source.get(&source.name).cloned() {
            Some(Script::Entries(e)) => Ok(e),
            Some(Script::Sleep(d, e)) => {
                tokio::time::sleep(d).await;
                Ok(e)
            }
            Some(Script::Panic) => panic!("scripted panic for {}", source.name),
            Some(Script::Fail) | None => Err(anyhow!("connection refused: {}", source.name)),
        }
    }
    fn name(&self) -> &'static str {
        "scripted"
    }
}

struct CountingFallback {
    calls: AtomicUsize,
    result: Result<Vec<Article>, String>,
}

impl CountingFallback {
    fn returning(items: Vec<Article>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            result: Ok(items),
        }
    }
    fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            result: Err("quota exceeded".into()),
        }
    }
}

#[async_trait]
impl FallbackSearch for CountingFallback {
    async fn search(&self, _query: &QueryContext, _max: usize) -> Result<Vec<Article>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone().map_err(|e| anyhow!(e))
    }
    fn name(&self) -> &'static str {
        "counting"
    }
}

fn entry(title: &str, published: &str) -> RawEntry {
    RawEntry {
        title: title.into(),
        description: String::new(),
        published: Some(published.into()),
        link: None,
    }
}

fn registry() -> Arc<FeedRegistry> {
    Arc::new(FeedRegistry::new(vec![
        FeedSource::new("TechCrunch", "https://techcrunch.test/feed", Category::Technology),
        FeedSource::new("Nature", "https://nature.test/rss", Category::Science),
        FeedSource::new("Forbes", "https://forbes.test/rss", Category::Business),
    ]))
}

fn abc_fetcher() -> ScriptedFetcher {
    ScriptedFetcher::default()
        .with(
            "TechCrunch",
            Script::Entries(vec![
                entry("A: energy storage", "2024-01-10T12:00:00Z"),
                entry("Phones", "2024-01-11T12:00:00Z"),
            ]),
        )
        .with("Nature", Script::Entries(vec![entry("B: Energy in cells", "2024-01-12T12:00:00Z")]))
        .with("Forbes", Script::Entries(vec![entry("C: energy stocks", "Fri, 05 Jan 2024 12:00:00 GMT")]))
}

fn aggregator(fetcher: ScriptedFetcher, fallback: Arc<dyn FallbackSearch>, cfg: NewsConfig) -> NewsAggregator {
    NewsAggregator::new(registry(), Arc::new(fetcher), fallback, cfg)
}

#[tokio::test]
async fn scenario_one_item_per_category() {
    let agg = aggregator(abc_fetcher(), Arc::new(NoFallback), NewsConfig::default());
    let digest = agg.aggregate("energy").await.unwrap();
    assert_eq!(digest.origin, NewsOrigin::Feeds);
    assert_eq!(
        digest.lines(),
        vec![
            "A: energy storage (Technology: TechCrunch, 2024-01-10 12:00 UTC)",
            "B: Energy in cells (Science: Nature, 2024-01-12 12:00 UTC)",
            "C: energy stocks (Business: Forbes, 2024-01-05 12:00 UTC)",
        ]
    );
}

#[tokio::test]
async fn scenario_two_slots_keeps_registry_order() {
    let agg = aggregator(abc_fetcher(), Arc::new(NoFallback), NewsConfig::default());
    let digest = agg.aggregate_with_limit("energy", 2, std::future::pending()).await.unwrap();
    let got: Vec<String> = digest.items.iter().map(|a| a.title.clone()).collect();
    assert_eq!(got, ["A: energy storage", "B: Energy in cells"]);
}

#[tokio::test]
async fn rendered_lines_parse_back() {
    let agg = aggregator(abc_fetcher(), Arc::new(NoFallback), NewsConfig::default());
    let digest = agg.aggregate("energy").await.unwrap();
    for (line, item) in digest.lines().iter().zip(&digest.items) {
        let parsed = parse_line(line).expect("line follows the contract");
        assert_eq!(parsed.title, item.title);
        assert_eq!(parsed.category, item.category);
        assert_eq!(parsed.source, item.source);
        assert_eq!(parsed.published_at, item.published_at);
    }
}

#[tokio::test]
async fn failing_source_does_not_reduce_the_others() {
    let healthy = aggregator(abc_fetcher(), Arc::new(NoFallback), NewsConfig::default())
        .aggregate("energy")
        .await
        .unwrap();

    let reg = Arc::new(FeedRegistry::new(vec![
        FeedSource::new("Broken", "https://down.test/rss", Category::Health),
        FeedSource::new("TechCrunch", "https://techcrunch.test/feed", Category::Technology),
        FeedSource::new("Nature", "https://nature.test/rss", Category::Science),
        FeedSource::new("Forbes", "https://forbes.test/rss", Category::Business),
    ]));
    let agg = NewsAggregator::new(
        reg,
        Arc::new(abc_fetcher().with("Broken", Script::Fail)),
        Arc::new(NoFallback),
        NewsConfig::default(),
    );
    let with_broken = agg.aggregate("energy").await.unwrap();
    assert_eq!(with_broken.items, healthy.items);
}

#[tokio::test(start_paused = true)]
async fn slow_source_times_out_without_stalling_the_pass() {
    let cfg = NewsConfig {
        fetch_timeout: Duration::from_secs(2),
        ..NewsConfig::default()
    };
    let fetcher = abc_fetcher().with(
        "Nature",
        Script::Sleep(
            Duration::from_secs(600),
            vec![entry("B: Energy in cells", "2024-01-12T12:00:00Z")],
        ),
    );
    let digest = aggregator(fetcher, Arc::new(NoFallback), cfg).aggregate("energy").await.unwrap();
    let cats: Vec<Category> = digest.items.iter().map(|a| a.category).collect();
    assert_eq!(cats, [Category::Technology, Category::Business]);
}

#[tokio::test(start_paused = true)]
async fn cancellation_keeps_completed_fetches() {
    let cfg = NewsConfig {
        fetch_timeout: Duration::from_secs(3600),
        ..NewsConfig::default()
    };
    let fetcher = abc_fetcher()
        .with("Nature", Script::Sleep(Duration::from_secs(600), vec![]))
        .with("Forbes", Script::Sleep(Duration::from_secs(600), vec![]));
    let agg = aggregator(fetcher, Arc::new(NoFallback), cfg);

    let digest = agg.aggregate_within("energy", Duration::from_secs(1)).await.unwrap();
    assert_eq!(digest.origin, NewsOrigin::Feeds);
    assert_eq!(digest.items.len(), 1);
    assert_eq!(digest.items[0].source, "TechCrunch");
}

#[tokio::test(start_paused = true)]
async fn cancellation_with_nothing_fetched_falls_back() {
    let cfg = NewsConfig {
        fetch_timeout: Duration::from_secs(3600),
        ..NewsConfig::default()
    };
    let late = vec![entry("A: energy storage", "2024-01-10T12:00:00Z")];
    let fetcher = ScriptedFetcher::default()
        .with("TechCrunch", Script::Sleep(Duration::from_secs(600), late.clone()))
        .with("Nature", Script::Sleep(Duration::from_secs(600), late.clone()))
        .with("Forbes", Script::Sleep(Duration::from_secs(600), late));
    let rescue = Article {
        title: "Grid batteries".into(),
        published_at: Utc.with_ymd_and_hms(2024, 2, 1, 8, 0, 0).unwrap(),
        source: "Wire".into(),
        category: Category::GeneralNews,
        link: "https://wire.test/grid".into(),
    };
    let fallback = Arc::new(CountingFallback::returning(vec![rescue.clone()]));
    let agg = aggregator(fetcher, fallback.clone(), cfg);

    let digest = agg.aggregate_within("energy", Duration::from_secs(1)).await.unwrap();
    assert_eq!(fallback.calls.load(Ordering::SeqCst), 1);
    assert_eq!(digest.origin, NewsOrigin::Fallback);
    assert_eq!(digest.items, vec![rescue]);
}

#[tokio::test]
async fn no_match_invokes_fallback_once_and_returns_it_verbatim() {
    let at = Utc.with_ymd_and_hms(2024, 2, 1, 8, 0, 0).unwrap();
    let fallback_items = vec![
        Article {
            title: "Tidal power pilot".into(),
            published_at: at,
            source: "Wire".into(),
            category: Category::GeneralNews,
            link: "https://wire.test/1".into(),
        },
        Article {
            title: "Ocean turbines".into(),
            published_at: at + chrono::Duration::hours(3),
            source: "GNews".into(),
            category: Category::GeneralNews,
            link: "https://wire.test/2".into(),
        },
    ];
    let fallback = Arc::new(CountingFallback::returning(fallback_items.clone()));
    let agg = aggregator(abc_fetcher(), fallback.clone(), NewsConfig::default());

    let digest = agg.aggregate("tidal").await.unwrap();
    assert_eq!(fallback.calls.load(Ordering::SeqCst), 1);
    assert_eq!(digest.origin, NewsOrigin::Fallback);
    assert_eq!(digest.items, fallback_items);
}

#[tokio::test]
async fn fallback_is_not_called_when_feeds_matched() {
    let fallback = Arc::new(CountingFallback::returning(vec![]));
    let agg = aggregator(abc_fetcher(), fallback.clone(), NewsConfig::default());
    agg.aggregate("energy").await.unwrap();
    assert_eq!(fallback.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn fallback_failure_means_no_recent_news() {
    let fallback = Arc::new(CountingFallback::failing());
    let agg = aggregator(abc_fetcher(), fallback.clone(), NewsConfig::default());
    let digest = agg.aggregate("volcano").await.unwrap();
    assert_eq!(fallback.calls.load(Ordering::SeqCst), 1);
    assert_eq!(digest.origin, NewsOrigin::Empty);
    assert!(agg.recent_news("volcano").await.unwrap().is_empty());
}

#[tokio::test]
async fn panicking_fetch_task_fails_the_aggregation() {
    let fetcher = abc_fetcher().with("Forbes", Script::Panic);
    let res = aggregator(fetcher, Arc::new(NoFallback), NewsConfig::default())
        .aggregate("energy")
        .await;
    assert!(res.is_err());
}

#[tokio::test]
async fn concurrency_of_one_still_visits_every_source() {
    let cfg = NewsConfig {
        max_concurrency: 1,
        ..NewsConfig::default()
    };
    let digest = aggregator(abc_fetcher(), Arc::new(NoFallback), cfg)
        .aggregate("energy")
        .await
        .unwrap();
    assert_eq!(digest.items.len(), 3);
}
