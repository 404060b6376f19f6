use std::sync::Arc;

use serde::{Deserialize, Serialize};
use shuttle_axum::axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::ingest::aggregate::NewsOrigin;
use crate::ingest::types::Article;
use crate::notify::email::EmailStatus;
use crate::notify::Mailer;
use crate::research::{format_results_for_email, ResearchResponse, Researcher};

const MAX_NEWS_PER_REQUEST: usize = 20;

#[derive(Clone)]
pub struct AppState {
    pub researcher: Arc<Researcher>,
    pub mailer: Option<Arc<dyn Mailer>>,
    pub email_status: EmailStatus,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/news", get(news))
        .route("/research", post(research))
        .route("/email/status", get(email_status))
        .route("/email/check", get(email_check))
        .route("/research/email", post(email_research))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

type ApiError = (StatusCode, String);

#[derive(Deserialize)]
struct NewsQuery {
    #[serde(default)]
    q: String,
    max: Option<usize>,
}

#[derive(Serialize)]
struct NewsResp {
    query: String,
    origin: NewsOrigin,
    lines: Vec<String>,
    items: Vec<Article>,
}

async fn news(State(state): State<AppState>, Query(params): Query<NewsQuery>) -> Result<Json<NewsResp>, ApiError> {
    let q = params.q.trim();
    if q.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "missing query parameter `q`".into()));
    }
    let agg = state.researcher.news();
    let max = params
        .max
        .unwrap_or(agg.config().max_results)
        .clamp(1, MAX_NEWS_PER_REQUEST);
    let digest = agg
        .aggregate_with_limit(q, max, std::future::pending::<()>())
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("news aggregation failed: {e}")))?;
    Ok(Json(NewsResp {
        lines: digest.lines(),
        query: digest.query,
        origin: digest.origin,
        items: digest.items,
    }))
}

#[derive(Deserialize)]
struct ResearchReq {
    topic: String,
}

async fn research(
    State(state): State<AppState>,
    Json(body): Json<ResearchReq>,
) -> Result<Json<ResearchResponse>, ApiError> {
    let topic = body.topic.trim();
    if topic.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "topic must not be empty".into()));
    }
    Ok(Json(state.researcher.research(topic).await))
}

async fn email_status(State(state): State<AppState>) -> Json<EmailStatus> {
    Json(state.email_status.clone())
}

#[derive(Serialize)]
struct EmailCheckResp {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

async fn email_check(State(state): State<AppState>) -> Result<Json<EmailCheckResp>, ApiError> {
    let Some(mailer) = state.mailer.as_ref() else {
        return Err((StatusCode::SERVICE_UNAVAILABLE, "email is not configured".into()));
    };
    let resp = match mailer.check_connection().await {
        Ok(ok) => EmailCheckResp { ok, error: None },
        Err(e) => {
            warn!(error = ?e, "email connection check failed");
            EmailCheckResp {
                ok: false,
                error: Some(format!("{e:#}")),
            }
        }
    };
    Ok(Json(resp))
}

#[derive(Deserialize)]
struct EmailReq {
    recipient: String,
    research: ResearchResponse,
}

#[derive(Serialize)]
struct EmailResp {
    sent: bool,
}

async fn email_research(
    State(state): State<AppState>,
    Json(body): Json<EmailReq>,
) -> Result<Json<EmailResp>, ApiError> {
    let Some(mailer) = state.mailer.as_ref() else {
        return Err((StatusCode::SERVICE_UNAVAILABLE, "email is not configured".into()));
    };
    let recipient = body.recipient.trim();
    if !recipient.contains('@') {
        return Err((StatusCode::BAD_REQUEST, "recipient must be an email address".into()));
    }
    let (subject, text) = format_results_for_email(&body.research);
    let sent = mailer.send(recipient, &subject, &text).await;
    info!(recipient, sent, "research email requested");
    Ok(Json(EmailResp { sent }))
}
