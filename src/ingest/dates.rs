// src/ingest/dates.rs
//! Publication date normalization.
//!
//! Feeds disagree on timestamp layout (RFC 2822, RFC 3339, ISO 8601, ad-hoc
//! human formats, sometimes nothing). Everything resolves to a UTC instant; a
//! date we cannot read becomes "now" so the article still takes part in
//! selection, it just looks fresher than it is.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use time::format_description::well_known::{Iso8601, Rfc2822, Rfc3339};
use time::OffsetDateTime;

/// Layout of the `<date>` part of a rendered news line.
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

/// Normalize against the wall clock.
pub fn normalize_timestamp(raw: &str) -> DateTime<Utc> {
    normalize_timestamp_at(raw, Utc::now())
}

/// Normalize with an explicit "now" used when nothing parses.
pub fn normalize_timestamp_at(raw: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    parse_timestamp(raw).unwrap_or(now)
}

/// Strict parsers first, then the permissive pass.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    parse_strict(s).or_else(|| parse_fuzzy(s))
}

pub fn format_display(ts: &DateTime<Utc>) -> String {
    ts.format(DISPLAY_FORMAT).to_string()
}

/// Inverse of [`format_display`]; minute precision.
pub fn parse_display(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    let body = s.strip_suffix("UTC").unwrap_or(s).trim();
    NaiveDateTime::parse_from_str(body, "%Y-%m-%d %H:%M")
        .ok()
        .map(|n| n.and_utc())
}

fn parse_strict(s: &str) -> Option<DateTime<Utc>> {
    OffsetDateTime::parse(s, &Rfc2822)
        .ok()
        .or_else(|| OffsetDateTime::parse(s, &Rfc3339).ok())
        .or_else(|| OffsetDateTime::parse(s, &Iso8601::DEFAULT).ok())
        .and_then(offset_to_utc)
        .or_else(|| DateTime::parse_from_rfc2822(s).ok().map(|d| d.with_timezone(&Utc)))
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|d| d.with_timezone(&Utc)))
}

fn offset_to_utc(dt: OffsetDateTime) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(dt.unix_timestamp(), dt.nanosecond()).single()
}

const ZONED_LAYOUTS: &[&str] = &[
    "%a, %d %b %Y %H:%M:%S %z",
    "%a, %d %b %Y %H:%M %z",
    "%d %b %Y %H:%M:%S %z",
    "%d %b %Y %H:%M %z",
    "%a %b %d %H:%M:%S %z %Y",
    "%A, %d %B %Y %H:%M:%S %z",
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y-%m-%d %H:%M:%S %z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%z",
];

const NAIVE_LAYOUTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%a, %d %b %Y %H:%M:%S",
    "%a, %d %b %Y %H:%M",
    "%d %b %Y %H:%M:%S",
    "%d %B %Y %H:%M",
    "%B %d, %Y %H:%M:%S",
    "%B %d, %Y %H:%M",
    "%b %d, %Y %H:%M",
    "%B %d, %Y %I:%M %p",
    "%b %d, %Y %I:%M %p",
];

const DATE_LAYOUTS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%a, %d %b %Y",
];

// Zone abbreviations seen in the wild, mapped to numeric offsets.
const NAMED_ZONES: &[(&str, &str)] = &[
    ("UTC", "+0000"),
    ("GMT", "+0000"),
    ("UT", "+0000"),
    ("Z", "+0000"),
    ("EST", "-0500"),
    ("EDT", "-0400"),
    ("CST", "-0600"),
    ("CDT", "-0500"),
    ("MST", "-0700"),
    ("MDT", "-0600"),
    ("PST", "-0800"),
    ("PDT", "-0700"),
    ("BST", "+0100"),
    ("CET", "+0100"),
    ("CEST", "+0200"),
    ("IST", "+0530"),
    ("JST", "+0900"),
    ("AEST", "+1000"),
];

static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));
static RE_TRAILING_ZONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*\b([A-Z]{1,4})$").expect("static regex"));
static RE_EMBEDDED_ISO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|\D)(\d{4})-(\d{2})-(\d{2})(?:[T ](\d{2}):(\d{2})(?::(\d{2}))?)?(?:\D|$)")
        .expect("static regex")
});

fn parse_fuzzy(s: &str) -> Option<DateTime<Utc>> {
    let cleaned = RE_WS.replace_all(s, " ").trim().to_string();

    if cleaned.len() == 10 && cleaned.bytes().all(|b| b.is_ascii_digit()) {
        let secs: i64 = cleaned.parse().ok()?;
        return Utc.timestamp_opt(secs, 0).single();
    }

    let zoned = replace_named_zone(&cleaned);
    if let Some(text) = zoned.as_deref() {
        if let Some(dt) = try_zoned(text) {
            return Some(dt);
        }
    }
    if let Some(dt) = try_zoned(&cleaned) {
        return Some(dt);
    }

    // A trailing zone name we could not map still should not block a parse.
    let bare = match zoned {
        Some(_) => strip_trailing_zone(&cleaned),
        None => cleaned.clone(),
    };
    try_naive(&bare)
        .or_else(|| try_naive(&cleaned))
        .or_else(|| embedded_iso(&cleaned))
}

fn replace_named_zone(s: &str) -> Option<String> {
    let caps = RE_TRAILING_ZONE.captures(s)?;
    let name = caps.get(1)?.as_str().to_ascii_uppercase();
    let offset = NAMED_ZONES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, o)| *o)?;
    let head = &s[..caps.get(0)?.start()];
    Some(format!("{} {}", head.trim_end(), offset))
}

fn strip_trailing_zone(s: &str) -> String {
    RE_TRAILING_ZONE.replace(s, "").trim().to_string()
}

fn try_zoned(s: &str) -> Option<DateTime<Utc>> {
    ZONED_LAYOUTS.iter().find_map(|layout| {
        DateTime::<FixedOffset>::parse_from_str(s, layout)
            .ok()
            .map(|d| d.with_timezone(&Utc))
    })
}

fn try_naive(s: &str) -> Option<DateTime<Utc>> {
    NAIVE_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(s, layout).ok())
        .map(|n| n.and_utc())
        .or_else(|| {
            DATE_LAYOUTS
                .iter()
                .find_map(|layout| NaiveDate::parse_from_str(s, layout).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|n| n.and_utc())
        })
}

fn embedded_iso(s: &str) -> Option<DateTime<Utc>> {
    let caps = RE_EMBEDDED_ISO.captures(s)?;
    let num = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
    let date = NaiveDate::from_ymd_opt(caps.get(1)?.as_str().parse().ok()?, num(2)?, num(3)?)?;
    let time = date.and_hms_opt(num(4).unwrap_or(0), num(5).unwrap_or(0), num(6).unwrap_or(0))?;
    Some(time.and_utc())
}
