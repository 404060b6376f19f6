// src/ingest/format.rs
//! The news line contract: `"<title> (<category>: <source>, <date>)"`.
//!
//! Consumers split these lines on the first `(`, the first `:` after it and
//! the closing `)`. The renderer keeps that unambiguous: parentheses in titles
//! become brackets and `:` in source names becomes `-`.
//!
//! A `:` inside the title is kept as published ("A: energy storage"), so the
//! first `:` of the whole line is not a delimiter. Split at the `(` first.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::ingest::dates::{format_display, parse_display};
use crate::ingest::registry::Category;
use crate::ingest::types::Article;

/// Structured view of one rendered line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedLine {
    pub title: String,
    pub category: Category,
    pub source: String,
    pub published_at: DateTime<Utc>,
}

pub fn render_line(a: &Article) -> String {
    format!(
        "{} ({}: {}, {})",
        sanitize_title(&a.title),
        a.category,
        sanitize_source(&a.source),
        format_display(&a.published_at)
    )
}

pub fn render_lines(items: &[Article]) -> Vec<String> {
    items.iter().map(render_line).collect()
}

/// Split a rendered line back apart. `None` when the line does not follow
/// the contract.
pub fn parse_line(line: &str) -> Option<ParsedLine> {
    let open = line.find('(')?;
    let close = line.rfind(')')?;
    if close <= open {
        return None;
    }
    let title = line[..open].trim();
    let meta = &line[open + 1..close];
    let (category, rest) = meta.split_once(':')?;
    let (source, date) = rest.rsplit_once(',')?;
    Some(ParsedLine {
        title: title.to_string(),
        category: category.trim().parse().ok()?,
        source: source.trim().to_string(),
        published_at: parse_display(date)?,
    })
}

fn sanitize_title(t: &str) -> String {
    t.replace('(', "[").replace(')', "]").trim().to_string()
}

fn sanitize_source(s: &str) -> String {
    s.replace(['(', ')'], "").replace(':', "-").trim().to_string()
}
