// src/ingest/registry.rs
//! Feed source roster: which feeds we read and which topical category each one
//! stands for. This is the only place that names concrete sources.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Topical bucket a feed (and every article read from it) belongs to.
///
/// Declaration order is only used for display; selection order comes from
/// the registry, not from this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Category {
    Technology,
    Science,
    Business,
    Health,
    Environment,
    GeneralNews,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Technology,
        Category::Science,
        Category::Business,
        Category::Health,
        Category::Environment,
        Category::GeneralNews,
    ];

    /// Human label, also used verbatim in the rendered news line.
    pub fn label(self) -> &'static str {
        match self {
            Category::Technology => "Technology",
            Category::Science => "Science",
            Category::Business => "Business",
            Category::Health => "Health",
            Category::Environment => "Environment",
            Category::GeneralNews => "General News",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "technology" | "tech" => Ok(Category::Technology),
            "science" => Ok(Category::Science),
            "business" => Ok(Category::Business),
            "health" => Ok(Category::Health),
            "environment" => Ok(Category::Environment),
            "generalnews" | "general" | "news" => Ok(Category::GeneralNews),
            _ => Err(anyhow::anyhow!("unknown feed category: {s:?}")),
        }
    }
}

impl TryFrom<String> for Category {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Category> for String {
    fn from(c: Category) -> Self {
        c.label().to_string()
    }
}

/// One syndicated feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSource {
    pub name: String,
    #[serde(alias = "location")]
    pub url: String,
    pub category: Category,
}

impl FeedSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>, category: Category) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            category,
        }
    }
}

/// Ordered, read-only list of feeds. Order matters: it decides which
/// categories win the diversity round when there are more of them than slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRegistry {
    sources: Vec<FeedSource>,
}

impl FeedRegistry {
    pub fn new(sources: Vec<FeedSource>) -> Self {
        Self { sources }
    }

    pub fn sources(&self) -> &[FeedSource] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FeedSource> {
        self.sources.iter()
    }

    /// Built-in roster used when no feeds file is configured.
    pub fn builtin() -> Self {
        use Category::*;
        const ROSTER: &[(&str, &str, Category)] = &[
            ("TechCrunch", "https://techcrunch.com/feed/", Technology),
            ("The Verge", "https://www.theverge.com/rss/index.xml", Technology),
            ("Wired", "https://www.wired.com/feed/rss", Technology),
            ("Ars Technica", "https://feeds.arstechnica.com/arstechnica/index", Technology),
            ("MIT Technology Review", "https://www.technologyreview.com/feed/", Technology),
            ("Nature", "https://www.nature.com/nature.rss", Science),
            ("ScienceDaily", "https://www.sciencedaily.com/rss/all.xml", Science),
            ("NASA", "https://www.nasa.gov/news-release/feed/", Science),
            ("New Scientist", "https://www.newscientist.com/feed/home/", Science),
            ("Forbes", "https://www.forbes.com/business/feed/", Business),
            ("CNBC", "https://search.cnbc.com/rs/search/combinedcms/view.xml?partnerId=wrss01&id=10001147", Business),
            ("MarketWatch", "https://feeds.content.dowjones.io/public/rss/mw_topstories", Business),
            ("Harvard Business Review", "https://feeds.hbr.org/harvardbusiness", Business),
            ("Medical News Today", "https://www.medicalnewstoday.com/newsfeeds/rss/medical_all", Health),
            ("WHO News", "https://www.who.int/rss-feeds/news-english.xml", Health),
            ("NPR Health", "https://feeds.npr.org/1128/rss.xml", Health),
            ("Guardian Environment", "https://www.theguardian.com/environment/rss", Environment),
            ("Inside Climate News", "https://insideclimatenews.org/feed/", Environment),
            ("Grist", "https://grist.org/feed/", Environment),
            ("Yale Environment 360", "https://e360.yale.edu/feed.xml", Environment),
            ("BBC News", "https://feeds.bbci.co.uk/news/rss.xml", GeneralNews),
            ("NPR News", "https://feeds.npr.org/1001/rss.xml", GeneralNews),
            ("Al Jazeera", "https://www.aljazeera.com/xml/rss/all.xml", GeneralNews),
            ("Guardian World", "https://www.theguardian.com/world/rss", GeneralNews),
        ];

        Self::new(
            ROSTER
                .iter()
                .map(|(name, url, category)| FeedSource::new(*name, *url, *category))
                .collect(),
        )
    }

    /// Distinct categories in registry order.
    pub fn categories(&self) -> Vec<Category> {
        let mut out = Vec::new();
        for s in &self.sources {
            if !out.contains(&s.category) {
                out.push(s.category);
            }
        }
        out
    }
}

impl Default for FeedRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl<'a> IntoIterator for &'a FeedRegistry {
    type Item = &'a FeedSource;
    type IntoIter = std::slice::Iter<'a, FeedSource>;

    fn into_iter(self) -> Self::IntoIter {
        self.sources.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_covers_every_category() {
        let reg = FeedRegistry::builtin();
        assert!(reg.len() >= 20);
        for c in Category::ALL {
            assert!(reg.iter().any(|s| s.category == c), "missing {c}");
        }
    }

    #[test]
    fn builtin_names_are_unique_and_parenthesis_free() {
        let reg = FeedRegistry::builtin();
        let mut names: Vec<&str> = reg.iter().map(|s| s.name.as_str()).collect();
        assert!(names.iter().all(|n| !n.contains(['(', ')', ':'])));
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), reg.len());
    }

    #[test]
    fn category_parsing_is_lenient() {
        assert_eq!("General News".parse::<Category>().unwrap(), Category::GeneralNews);
        assert_eq!("general_news".parse::<Category>().unwrap(), Category::GeneralNews);
        assert_eq!(" TECH ".parse::<Category>().unwrap(), Category::Technology);
        assert!("sports".parse::<Category>().is_err());
    }

    #[test]
    fn categories_follow_registry_order() {
        let reg = FeedRegistry::new(vec![
            FeedSource::new("a", "http://a", Category::Health),
            FeedSource::new("b", "http://b", Category::Science),
            FeedSource::new("c", "http://c", Category::Health),
        ]);
        assert_eq!(reg.categories(), vec![Category::Health, Category::Science]);
    }
}
