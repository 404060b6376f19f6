// src/ingest/select.rs
//! Category-balanced selection.
//!
//! Round 1 takes the newest article of each matched category, in the order
//! the categories first appear in the registry. Round 2 backfills the
//! remaining slots with the newest leftovers of any category. The output is
//! not re-sorted afterwards: the first slots buy topical spread at the price
//! of strict recency.
//!
//! When more categories matched than there are slots, the categories that
//! come first in the registry win, even over newer articles elsewhere.

use std::collections::{HashMap, HashSet};

use crate::ingest::registry::Category;
use crate::ingest::types::Article;

pub const DEFAULT_MAX_RESULTS: usize = 3;

/// Select up to `max_results` articles.
///
/// `articles` must be in registry order (source by source, feed order within
/// a source); that order defines which categories are "first".
pub fn select_balanced(articles: Vec<Article>, max_results: usize) -> Vec<Article> {
    if max_results == 0 || articles.is_empty() {
        return Vec::new();
    }

    let mut order: Vec<Category> = Vec::new();
    let mut buckets: HashMap<Category, Vec<usize>> = HashMap::new();
    for (i, a) in articles.iter().enumerate() {
        buckets
            .entry(a.category)
            .or_insert_with(|| {
                order.push(a.category);
                Vec::new()
            })
            .push(i);
    }

    let newest_first = |x: &usize, y: &usize| articles[*y].published_at.cmp(&articles[*x].published_at);

    let mut picked: Vec<usize> = Vec::with_capacity(max_results);
    for category in &order {
        if picked.len() >= max_results {
            break;
        }
        let newest = buckets
            .get(category)
            .and_then(|idx| idx.iter().copied().min_by(|x, y| newest_first(x, y)));
        if let Some(i) = newest {
            picked.push(i);
        }
    }

    if picked.len() < max_results {
        let taken: HashSet<usize> = picked.iter().copied().collect();
        let mut rest: Vec<usize> = (0..articles.len()).filter(|i| !taken.contains(i)).collect();
        rest.sort_by(newest_first);
        picked.extend(rest.into_iter().take(max_results - picked.len()));
    }

    let mut slots: Vec<Option<Article>> = articles.into_iter().map(Some).collect();
    picked
        .into_iter()
        .filter_map(|i| slots.get_mut(i).and_then(Option::take))
        .collect()
}

/// Drop later articles whose title exactly repeats an earlier one.
/// Returns the survivors and the number removed.
pub fn dedup_exact_titles(articles: Vec<Article>) -> (Vec<Article>, usize) {
    let mut seen: HashSet<String> = HashSet::new();
    let mut keep = Vec::with_capacity(articles.len());
    let mut removed = 0usize;
    for a in articles {
        if seen.insert(a.title.clone()) {
            keep.push(a);
        } else {
            removed += 1;
        }
    }
    (keep, removed)
}
