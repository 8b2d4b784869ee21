//! The messaging transport boundary.
//!
//! The dispatch loop only ever sees [`InboundMessage`] values and the narrow
//! [`Transport`] surface. How messages actually reach the provider is the
//! adapter's problem.

pub mod whatsapp;

use async_trait::async_trait;
use thiserror::Error;

pub use whatsapp::{WebhookGuard, WhatsAppTransport};

/// One inbound chat message, built from a webhook delivery and dropped once
/// handled.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Provider message id, used for read receipts and the typing indicator.
    pub id: String,
    /// Sender id the reply goes back to.
    pub from: String,
    /// Sender's profile name, when the webhook carries one.
    pub display_name: Option<String>,
    pub body: String,
    /// The message originated in a group chat.
    pub group: bool,
    /// The message came from the broadcast status channel.
    pub broadcast: bool,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("WhatsApp API returned {0}: {1}")]
    Api(reqwest::StatusCode, String),
    #[error("WhatsApp API request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("webhook rejected: {0}")]
    Rejected(String),
}

/// Reply surface injected into the dispatch loop.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one text message to a chat.
    async fn reply(&self, to: &str, text: &str) -> Result<(), TransportError>;

    /// Mark the message read and show the typing indicator while a lookup is
    /// in flight. Best-effort side channel.
    async fn set_typing(&self, message_id: &str) -> Result<(), TransportError>;

    /// Whether the last credential check against the provider succeeded.
    fn is_connected(&self) -> bool;
}
