//! Per-message dispatch from the inbound queue to an outbound reply.
//!
//! One consumer drains the inbound queue, so replies to a given chat go out
//! in the order the messages arrived. No failure escapes an iteration; the
//! worst case is a generic apology.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::orders::format::{format_order_details, format_search_results};
use crate::orders::{LookupOutcome, OrderApi, SearchOutcome};
use crate::replies;
use crate::router::{self, Action};
use crate::transport::{InboundMessage, Transport, TransportError};

pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    orders: OrderApi,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>, orders: OrderApi) -> Self {
        Self { transport, orders }
    }

    /// Drain the inbound queue until the webhook side closes it.
    pub async fn run(self, mut inbound: mpsc::Receiver<InboundMessage>) {
        while let Some(message) = inbound.recv().await {
            if message.group || message.broadcast {
                debug!(target: "handler", from = %message.from, "skipping group/broadcast message");
                continue;
            }
            if let Err(error) = self.handle(&message).await {
                error!(target: "handler", %error, from = %message.from, "message handling failed");
                if let Err(error) = self.transport.reply(&message.from, replies::APOLOGY).await {
                    debug!(target: "handler", %error, "apology reply failed as well");
                }
            }
        }
        info!(target: "handler", "inbound queue closed; dispatcher stopping");
    }

    async fn handle(&self, message: &InboundMessage) -> Result<(), TransportError> {
        info!(target: "handler", from = %message.from, body = %message.body, "📨 inbound message");
        let reply = match router::route(&message.body) {
            Action::Welcome => replies::welcome(message.display_name.as_deref()),
            Action::Help => replies::HELP.to_string(),
            Action::Support => replies::SUPPORT.to_string(),
            Action::Track(order_number) => self.track(message, &order_number).await,
            Action::Search(term) => self.search(message, &term).await,
            Action::Default => replies::FALLBACK.to_string(),
        };
        self.transport.reply(&message.from, &reply).await
    }

    async fn track(&self, message: &InboundMessage, order_number: &str) -> String {
        self.show_typing(message).await;
        info!(target: "handler", order_number, "🔍 tracking order");
        match self.orders.lookup(order_number).await {
            LookupOutcome::Found(order) => format_order_details(&order),
            LookupOutcome::NotFound => replies::order_not_found(order_number),
            LookupOutcome::TransientError => replies::SERVICE_UNAVAILABLE.to_string(),
        }
    }

    async fn search(&self, message: &InboundMessage, term: &str) -> String {
        self.show_typing(message).await;
        info!(target: "handler", term, "🔍 searching orders");
        match self.orders.search(term).await {
            SearchOutcome::Found(orders) => format_search_results(term, &orders),
            SearchOutcome::NoMatches => replies::no_orders_found(term),
            SearchOutcome::TransientError => replies::SEARCH_UNAVAILABLE.to_string(),
        }
    }

    async fn show_typing(&self, message: &InboundMessage) {
        if let Err(error) = self.transport.set_typing(&message.id).await {
            debug!(target: "handler", %error, "typing indicator failed");
        }
    }
}
