// src/bootstrap.rs
//! Process wiring: env config -> collaborators -> `Researcher`.
use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::AppState;
use crate::config::ai::SummarizerConfig;
use crate::config::NewsConfig;
use crate::ingest::aggregate::NewsAggregator;
use crate::ingest::config::load_registry_default;
use crate::notify::email::{EmailConfig, SmtpMailer};
use crate::notify::Mailer;
use crate::research::summarizer::{ChatSummarizer, DisabledSummarizer};
use crate::research::wikipedia::WikipediaClient;
use crate::research::{Researcher, Summarizer};

pub struct Runtime {
    pub researcher: Arc<Researcher>,
    pub email: Option<EmailConfig>,
    pub mailer: Option<Arc<dyn Mailer>>,
}

impl Runtime {
    /// Reads the environment once; a missing key only disables its collaborator.
    pub fn from_env() -> Result<Self> {
        let news_cfg = NewsConfig::from_env();
        let registry = Arc::new(load_registry_default()?);
        info!(
            feeds = registry.len(),
            categories = registry.categories().len(),
            max_results = news_cfg.max_results,
            gnews = news_cfg.gnews_api_key.is_some(),
            "news registry loaded"
        );
        if news_cfg.gnews_api_key.is_none() {
            warn!("GNEWS_API_KEY not set; fallback search disabled");
        }

        let encyclopedia = Arc::new(WikipediaClient::new(&news_cfg.user_agent)?);
        let news = Arc::new(NewsAggregator::from_config(registry, news_cfg)?);

        let ai_cfg = SummarizerConfig::from_env()?;
        // Safe diagnostics: model + enabled + key length
        info!(
            model = %ai_cfg.model,
            enabled = ai_cfg.enabled,
            key_len = ai_cfg.api_key.len(),
            "summarizer config loaded"
        );
        let summarizer: Arc<dyn Summarizer> = if ai_cfg.is_usable() {
            Arc::new(ChatSummarizer::new(ai_cfg)?)
        } else {
            warn!("summarizer disabled; research summaries will use Wikipedia text only");
            Arc::new(DisabledSummarizer)
        };

        let email = EmailConfig::from_env();
        let mailer: Option<Arc<dyn Mailer>> = match email.as_ref().filter(|c| c.is_configured()) {
            Some(cfg) => match SmtpMailer::new(cfg) {
                Ok(m) => Some(Arc::new(m)),
                Err(e) => {
                    warn!(error = ?e, "email transport unavailable");
                    None
                }
            },
            None => None,
        };

        Ok(Self {
            researcher: Arc::new(Researcher::new(encyclopedia, summarizer, news)),
            email,
            mailer,
        })
    }

    pub fn app_state(&self) -> AppState {
        AppState {
            researcher: Arc::clone(&self.researcher),
            mailer: self.mailer.clone(),
            email_status: EmailConfig::status(self.email.as_ref()),
        }
    }
}
