//! Shared application state handed to the HTTP surface.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;

use crate::transport::whatsapp::WebhookGuard;
use crate::transport::{InboundMessage, Transport};

/// Everything the web handlers need. Built once at startup and shared behind
/// an `Arc`; nothing in here is mutated after that.
pub struct AppState {
    /// Validates webhook handshakes and signatures.
    pub webhook: WebhookGuard,
    /// Reply transport, queried for its connection flag.
    pub transport: Arc<dyn Transport>,
    /// Queue feeding the dispatch loop.
    pub inbound_tx: mpsc::Sender<InboundMessage>,
    /// Process start, for the uptime probe.
    pub started_at: Instant,
}
