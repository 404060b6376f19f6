// src/relevance.rs
//! Relevance gate: does a feed entry talk about the user's topic?
//!
//! Deliberately plain: a query is split into lowercase terms and an entry
//! matches when any term occurs as a substring of its title or description.
//! No stemming, no scoring. The category-balanced selector downstream
//! tolerates the noise this lets through.

use std::collections::BTreeSet;

use crate::ingest::types::RawEntry;

/// Query terms derived once per aggregation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryContext {
    raw: String,
    terms: BTreeSet<String>,
}

impl QueryContext {
    pub fn new(raw_query: &str) -> Self {
        let terms = raw_query
            .split_whitespace()
            .map(|w| {
                w.trim_matches(|c: char| !c.is_alphanumeric())
                    .to_lowercase()
            })
            .filter(|w| !w.is_empty())
            .collect();
        Self {
            raw: raw_query.to_string(),
            terms,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn terms(&self) -> &BTreeSet<String> {
        &self.terms
    }

    /// True when the query produced no usable term; such a query matches nothing.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Query as sent to a search provider: trimmed, outer punctuation removed.
    pub fn search_phrase(&self) -> String {
        self.raw
            .trim()
            .trim_matches(|c: char| matches!(c, '?' | '!' | '.' | ','))
            .trim()
            .to_string()
    }

    /// Case-insensitive substring match of any term against title or description.
    pub fn matches_text(&self, title: &str, description: &str) -> bool {
        if self.terms.is_empty() {
            return false;
        }
        let title = title.to_lowercase();
        let description = description.to_lowercase();
        self.terms
            .iter()
            .any(|t| title.contains(t.as_str()) || description.contains(t.as_str()))
    }

    pub fn matches(&self, entry: &RawEntry) -> bool {
        self.matches_text(&entry.title, &entry.description)
    }
}
