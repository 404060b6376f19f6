// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod api;
pub mod bootstrap;
pub mod config;
pub mod ingest;
pub mod metrics;
pub mod notify;
pub mod relevance;
pub mod research;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::ingest::aggregate::{NewsAggregator, NewsDigest, NewsOrigin};
pub use crate::ingest::format::{parse_line, render_line, ParsedLine};
pub use crate::ingest::registry::{Category, FeedRegistry, FeedSource};
pub use crate::ingest::types::{Article, FallbackSearch, FeedFetcher, RawEntry};
pub use crate::relevance::QueryContext;
pub use crate::research::{ResearchResponse, Researcher};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact fmt logs filtered by `RUST_LOG` (default `info`).
/// A no-op when a global subscriber is already installed.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}
