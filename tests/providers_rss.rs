// tests/providers_rss.rs
//
// Feed dialects from fixtures, plus the HTTP fetcher against a local server.

use axum::{http::StatusCode, routing::get, Router};
use research_assistant::config::NewsConfig;
use research_assistant::ingest::providers::rss::{parse_feed, FixtureFetcher, HttpFeedFetcher};
use research_assistant::{Category, FeedFetcher, FeedSource};
use std::time::Duration;

const TECH_RSS: &str = include_str!("fixtures/tech_rss.xml");
const SCIENCE_RDF: &str = include_str!("fixtures/science_rdf.xml");
const BUSINESS_ATOM: &str = include_str!("fixtures/business_atom.xml");

#[test]
fn rss2_fixture_parses_and_drops_untitled_items() {
    let items = parse_feed(TECH_RSS).expect("rss parse ok");
    assert_eq!(items.len(), 3, "the untitled item must be dropped");

    let first = &items[0];
    assert_eq!(first.title, "Grid-scale battery startup raises & expands");
    assert_eq!(first.description, "New energy storage plant announced.");
    assert_eq!(first.published.as_deref(), Some("Wed, 10 Jan 2024 09:30:00 GMT"));
    assert_eq!(first.link.as_deref(), Some("https://tech.example.test/battery"));

    assert_eq!(items[2].title, "Solar Energy costs fall again");
    assert_eq!(items[2].description, "");
}

#[test]
fn rdf_fixture_parses_items_outside_channel() {
    let items = parse_feed(SCIENCE_RDF).expect("rdf parse ok");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].title, "Fusion experiment sustains plasma for a record time");
    assert_eq!(items[0].published.as_deref(), Some("2024-01-12T11:00:00Z"));
    assert_eq!(items[1].link.as_deref(), Some("https://science.example.test/coral"));
}

#[test]
fn atom_fixture_prefers_alternate_link_and_published_date() {
    let items = parse_feed(BUSINESS_ATOM).expect("atom parse ok");
    assert_eq!(items.len(), 2);

    let utilities = &items[0];
    assert_eq!(utilities.title, "Utilities rally on energy demand");
    assert_eq!(utilities.link.as_deref(), Some("https://biz.example.test/utilities"));
    assert_eq!(utilities.published.as_deref(), Some("2024-01-05T16:45:00Z"));
    assert_eq!(utilities.description, "Investors rotate into power producers.");

    // no <published>: falls back to <updated>; no <summary>: falls back to <content>
    let retail = &items[1];
    assert_eq!(retail.published.as_deref(), Some("2024-01-04T10:00:00Z"));
    assert_eq!(retail.description, "Holiday spending cooled.");
    assert_eq!(retail.link.as_deref(), Some("https://biz.example.test/retail"));
}

#[test]
fn unknown_documents_are_errors() {
    assert!(parse_feed("<html><body>nope</body></html>").is_err());
    assert!(parse_feed("").is_err());
}

#[tokio::test]
async fn fixture_fetcher_fails_for_unknown_sources() {
    let f = FixtureFetcher::new().with_doc("Tech Wire", TECH_RSS);
    let known = FeedSource::new("Tech Wire", "fixture://tech", Category::Technology);
    let unknown = FeedSource::new("Elsewhere", "fixture://x", Category::Science);
    assert_eq!(f.fetch(&known).await.unwrap().len(), 3);
    assert!(f.fetch(&unknown).await.is_err());
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn http_fetcher_reads_feeds_and_rejects_error_statuses() {
    let app = Router::new()
        .route("/atom.xml", get(|| async { BUSINESS_ATOM }))
        .route("/gone.xml", get(|| async { (StatusCode::NOT_FOUND, "gone") }));
    let base = serve(app).await;

    let cfg = NewsConfig {
        fetch_timeout: Duration::from_secs(5),
        ..NewsConfig::default()
    };
    let fetcher = HttpFeedFetcher::new(&cfg).unwrap();

    let ok = FeedSource::new("Market Desk", format!("{base}/atom.xml"), Category::Business);
    let items = fetcher.fetch(&ok).await.expect("served feed parses");
    assert_eq!(items.len(), 2);

    let gone = FeedSource::new("Gone", format!("{base}/gone.xml"), Category::Business);
    let err = fetcher.fetch(&gone).await.unwrap_err();
    assert!(format!("{err:#}").contains("404"), "error should carry the status: {err:#}");
}
