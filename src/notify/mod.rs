// src/notify/mod.rs
pub mod email;

use anyhow::Result;
use async_trait::async_trait;

/// Outbound delivery of a finished research result.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// `true` when the message was handed to the transport.
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> bool;

    /// Log in to the transport without sending anything. Transports with no
    /// session to open report ready.
    async fn check_connection(&self) -> Result<bool> {
        Ok(true)
    }
}
