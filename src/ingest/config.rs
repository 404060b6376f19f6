// src/ingest/config.rs
use anyhow::{anyhow, bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::ingest::registry::{FeedRegistry, FeedSource};

pub const ENV_FEEDS_PATH: &str = "NEWS_FEEDS_PATH";

/// Load a feed roster from an explicit path. Supports TOML or JSON formats.
pub fn load_registry_from(path: &Path) -> Result<FeedRegistry> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading feed roster from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let sources = parse_roster(&content, ext.as_str())
        .with_context(|| format!("parsing feed roster {}", path.display()))?;
    Ok(FeedRegistry::new(sources))
}

/// Resolve the feed roster:
/// 1) $NEWS_FEEDS_PATH
/// 2) config/feeds.toml
/// 3) config/feeds.json
/// 4) built-in roster
pub fn load_registry_default() -> Result<FeedRegistry> {
    if let Ok(p) = std::env::var(ENV_FEEDS_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_registry_from(&pb);
        }
        bail!("{ENV_FEEDS_PATH} points to non-existent path {}", pb.display());
    }
    let toml_p = PathBuf::from("config/feeds.toml");
    if toml_p.exists() {
        return load_registry_from(&toml_p);
    }
    let json_p = PathBuf::from("config/feeds.json");
    if json_p.exists() {
        return load_registry_from(&json_p);
    }
    Ok(FeedRegistry::builtin())
}

fn parse_roster(s: &str, hint_ext: &str) -> Result<Vec<FeedSource>> {
    let parsed = match hint_ext {
        "toml" => parse_toml(s),
        "json" => parse_json(s),
        _ => parse_toml(s).or_else(|_| parse_json(s)),
    }?;
    let cleaned = clean_roster(parsed);
    if cleaned.is_empty() {
        return Err(anyhow!("feed roster is empty"));
    }
    Ok(cleaned)
}

fn parse_toml(s: &str) -> Result<Vec<FeedSource>> {
    #[derive(serde::Deserialize)]
    struct TomlRoster {
        #[serde(default)]
        feeds: Vec<FeedSource>,
    }
    let v: TomlRoster = toml::from_str(s)?;
    Ok(v.feeds)
}

fn parse_json(s: &str) -> Result<Vec<FeedSource>> {
    let v: Vec<FeedSource> = serde_json::from_str(s)?;
    Ok(v)
}

/// Trim names/urls, drop blanks, keep the first entry for a repeated name.
fn clean_roster(items: Vec<FeedSource>) -> Vec<FeedSource> {
    let mut out: Vec<FeedSource> = Vec::with_capacity(items.len());
    for it in items {
        let name = it.name.trim();
        let url = it.url.trim();
        if name.is_empty() || url.is_empty() {
            continue;
        }
        if out.iter().any(|s| s.name.eq_ignore_ascii_case(name)) {
            continue;
        }
        out.push(FeedSource::new(name, url, it.category));
    }
    out
}
