// src/notify/email.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};
use serde::Serialize;
use tracing::{info, warn};

use super::Mailer;
use crate::config::{env_parse, env_string};

pub const DEFAULT_SMTP_SERVER: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// SMTP settings. The password never leaves this struct.
#[derive(Clone)]
pub struct EmailConfig {
    pub smtp_server: String,
    pub smtp_port: u16,
    pub sender: String,
    password: String,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_server", &self.smtp_server)
            .field("smtp_port", &self.smtp_port)
            .field("sender", &self.sender)
            .finish_non_exhaustive()
    }
}

/// What `/email/status` reports.
#[derive(Debug, Clone, Serialize)]
pub struct EmailStatus {
    pub configured: bool,
    pub smtp_server: String,
    pub smtp_port: u16,
    pub sender: Option<String>,
}

impl EmailConfig {
    pub fn new(smtp_server: &str, smtp_port: u16, sender: &str, password: &str) -> Self {
        Self {
            smtp_server: smtp_server.to_string(),
            smtp_port,
            sender: sender.to_string(),
            password: password.to_string(),
        }
    }

    /// `None` when sender or password is missing.
    pub fn from_env() -> Option<Self> {
        let sender = env_string("SENDER_EMAIL").or_else(|| env_string("EMAIL_ADDRESS"))?;
        let password = env_string("SENDER_PASSWORD").or_else(|| env_string("EMAIL_PASSWORD"))?;
        let smtp_server = env_string("SMTP_SERVER").unwrap_or_else(|| DEFAULT_SMTP_SERVER.to_string());
        let smtp_port = env_parse("SMTP_PORT", DEFAULT_SMTP_PORT);
        Some(Self {
            smtp_server,
            smtp_port,
            sender,
            password,
        })
    }

    pub fn is_configured(&self) -> bool {
        !self.smtp_server.is_empty() && self.sender.contains('@') && !self.password.is_empty()
    }

    pub fn status(cfg: Option<&EmailConfig>) -> EmailStatus {
        match cfg {
            Some(c) => EmailStatus {
                configured: c.is_configured(),
                smtp_server: c.smtp_server.clone(),
                smtp_port: c.smtp_port,
                sender: Some(c.sender.clone()),
            },
            None => EmailStatus {
                configured: false,
                smtp_server: env_string("SMTP_SERVER").unwrap_or_else(|| DEFAULT_SMTP_SERVER.to_string()),
                smtp_port: DEFAULT_SMTP_PORT,
                sender: None,
            },
        }
    }
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(cfg: &EmailConfig) -> Result<Self> {
        let creds = Credentials::new(cfg.sender.clone(), cfg.password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.smtp_server)
            .with_context(|| format!("invalid SMTP server {}", cfg.smtp_server))?
            .port(cfg.smtp_port)
            .credentials(creds)
            .build();
        let from: Mailbox = cfg
            .sender
            .parse()
            .with_context(|| format!("invalid sender address {}", cfg.sender))?;
        Ok(Self { transport, from })
    }

    async fn deliver(&self, recipient: &str, subject: &str, body: &str) -> Result<()> {
        let to: Mailbox = recipient
            .parse()
            .with_context(|| format!("invalid recipient {recipient}"))?;
        let msg = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(header::ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .context("build email")?;
        self.transport.send(msg).await.context("send email")?;
        Ok(())
    }

    /// Open a STARTTLS session and authenticate, then hang up.
    pub async fn test_connection(&self) -> Result<bool> {
        let ok = self
            .transport
            .test_connection()
            .await
            .context("SMTP connection test")?;
        info!(ok, "SMTP connection test finished");
        Ok(ok)
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> bool {
        match self.deliver(recipient, subject, body).await {
            Ok(()) => {
                info!(recipient, subject, "email sent");
                true
            }
            Err(e) => {
                warn!(error = ?e, recipient, "email failed");
                false
            }
        }
    }

    async fn check_connection(&self) -> Result<bool> {
        self.test_connection().await
    }
}
