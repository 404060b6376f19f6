//! Research Assistant: binary entrypoint.
//! Boots the Axum HTTP server: news aggregation, research and email routes
//! plus `/metrics`.

use research_assistant::bootstrap::Runtime;
use research_assistant::metrics::Metrics;
use research_assistant::{create_router, init_tracing};
use shuttle_axum::ShuttleAxum;
use tracing::info;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let runtime = Runtime::from_env()?;
    let metrics = Metrics::init()?;

    let router = create_router(runtime.app_state()).merge(metrics.router());
    info!(
        email = runtime.mailer.is_some(),
        "router ready: /health /news /research /email/status /email/check /research/email /metrics"
    );

    Ok(router.into())
}
