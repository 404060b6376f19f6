// src/ingest/providers/rss.rs
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::config::NewsConfig;
use crate::ingest::normalize_text;
use crate::ingest::registry::FeedSource;
use crate::ingest::types::{FeedFetcher, RawEntry};

// Text content of an element, ignoring any attributes (`type="html"` etc.).
#[derive(Debug, Default, Deserialize)]
struct Text {
    #[serde(rename = "$text", default)]
    value: String,
}

fn text(t: &Option<Text>) -> &str {
    t.as_ref().map(|t| t.value.as_str()).unwrap_or_default()
}

// --- RSS 2.0 ---
#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    title: Option<Text>,
    link: Option<Text>,
    description: Option<Text>,
    #[serde(rename = "pubDate")]
    pub_date: Option<Text>,
    #[serde(rename = "dc:date", alias = "date")]
    dc_date: Option<Text>,
}

// --- RSS 1.0 (RDF): items are siblings of <channel> ---
#[derive(Debug, Deserialize)]
struct Rdf {
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

// --- Atom ---
#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<Text>,
    summary: Option<Text>,
    content: Option<Text>,
    published: Option<Text>,
    updated: Option<Text>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

impl AtomEntry {
    fn best_link(&self) -> Option<String> {
        self.links
            .iter()
            .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
            .or_else(|| self.links.first())
            .and_then(|l| l.href.clone())
    }
}

fn non_empty(s: &str) -> Option<String> {
    let t = s.trim();
    (!t.is_empty()).then(|| t.to_string())
}

impl From<RssItem> for RawEntry {
    fn from(it: RssItem) -> Self {
        RawEntry {
            title: normalize_text(text(&it.title)),
            description: normalize_text(text(&it.description)),
            published: non_empty(text(&it.pub_date)).or_else(|| non_empty(text(&it.dc_date))),
            link: non_empty(text(&it.link)),
        }
    }
}

impl From<AtomEntry> for RawEntry {
    fn from(it: AtomEntry) -> Self {
        let link = it.best_link();
        let body = match text(&it.summary) {
            "" => text(&it.content),
            s => s,
        };
        RawEntry {
            title: normalize_text(text(&it.title)),
            description: normalize_text(body),
            published: non_empty(text(&it.published)).or_else(|| non_empty(text(&it.updated))),
            link,
        }
    }
}

/// Local name of the document element (`rss`, `RDF`, `feed`).
fn root_element(xml: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e) | Event::Empty(e)) => {
                return Some(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Ok(Event::Eof) | Err(_) => return None,
            Ok(_) => {}
        }
    }
}

/// Parse an RSS 2.0, RSS 1.0 or Atom document. Entries without a title are dropped.
pub fn parse_feed(xml: &str) -> Result<Vec<RawEntry>> {
    let t0 = std::time::Instant::now();
    let xml_clean = scrub_html_entities_for_xml(xml);

    let root = root_element(&xml_clean).ok_or_else(|| anyhow!("no root element in feed"))?;
    let entries: Vec<RawEntry> = match root.as_str() {
        "rss" => {
            let rss: Rss = from_str(&xml_clean).context("parsing rss 2.0 xml")?;
            rss.channel.items.into_iter().map(RawEntry::from).collect()
        }
        "RDF" => {
            let rdf: Rdf = from_str(&xml_clean).context("parsing rss 1.0 xml")?;
            rdf.items.into_iter().map(RawEntry::from).collect()
        }
        "feed" => {
            let feed: AtomFeed = from_str(&xml_clean).context("parsing atom xml")?;
            feed.entries.into_iter().map(RawEntry::from).collect()
        }
        other => bail!("unsupported feed root <{other}>"),
    };
    let entries: Vec<RawEntry> = entries.into_iter().filter(|e| !e.title.is_empty()).collect();

    histogram!("news_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    counter!("news_entries_total").increment(entries.len() as u64);
    Ok(entries)
}

/// Fetches feeds over HTTP with one shared client.
pub struct HttpFeedFetcher {
    client: reqwest::Client,
}

impl HttpFeedFetcher {
    pub fn new(cfg: &NewsConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(cfg.user_agent.as_str())
            .connect_timeout(Duration::from_secs(4))
            .timeout(cfg.fetch_timeout)
            .build()
            .context("building feed http client")?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FeedFetcher for HttpFeedFetcher {
    async fn fetch(&self, source: &FeedSource) -> Result<Vec<RawEntry>> {
        let resp = self
            .client
            .get(&source.url)
            .send()
            .await
            .with_context(|| format!("{} http get()", source.name))?;
        let status = resp.status();
        if !status.is_success() {
            bail!("{} answered HTTP {}", source.name, status);
        }
        let body = resp
            .text()
            .await
            .with_context(|| format!("{} http .text()", source.name))?;
        parse_feed(&body).with_context(|| format!("parsing feed of {}", source.name))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Serves feed documents from memory, keyed by source name.
/// A source without a document fails like an unreachable host.
#[derive(Default)]
pub struct FixtureFetcher {
    docs: HashMap<String, String>,
}

impl FixtureFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_doc(mut self, source_name: &str, xml: &str) -> Self {
        self.docs.insert(source_name.to_string(), xml.to_string());
        self
    }
}

#[async_trait]
impl FeedFetcher for FixtureFetcher {
    async fn fetch(&self, source: &FeedSource) -> Result<Vec<RawEntry>> {
        let xml = self
            .docs
            .get(&source.name)
            .ok_or_else(|| anyhow!("no fixture for {}", source.name))?;
        parse_feed(xml)
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}

// XML only knows five named entities; feeds happily use HTML ones.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&hellip;", "...")
}
