//! Runtime configuration, read once at startup and threaded into each
//! component at construction time.

use std::env;

use anyhow::{Context, Result};

const DEFAULT_BASE_API_URL: &str = "http://order.nuwandibambooblinds.lk";
const DEFAULT_GRAPH_API_URL: &str = "https://graph.facebook.com/v18.0";
const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the order tracking REST API.
    pub base_api_url: String,
    /// Port for the health/status/webhook HTTP server.
    pub port: u16,
    /// Graph API root for the WhatsApp Cloud API, overridable for proxies.
    pub graph_api_url: String,
    /// WhatsApp Business access token.
    pub access_token: String,
    /// Phone number id messages are sent from.
    pub phone_number_id: String,
    /// Token echoed back during the webhook verification handshake.
    pub verify_token: String,
    /// App secret for webhook signature checks; verification is skipped when unset.
    pub app_secret: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let port = match env::var("PORT") {
            Ok(raw) => raw.parse().context("PORT must be a valid port number")?,
            Err(_) => DEFAULT_PORT,
        };
        Ok(Self {
            base_api_url: env::var("BASE_API_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_API_URL.to_string()),
            port,
            graph_api_url: env::var("GRAPH_API_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_GRAPH_API_URL.to_string()),
            access_token: env::var("WHATSAPP_ACCESS_TOKEN")
                .context("Expected WHATSAPP_ACCESS_TOKEN in the .env file")?,
            phone_number_id: env::var("WHATSAPP_PHONE_NUMBER_ID")
                .context("Expected WHATSAPP_PHONE_NUMBER_ID in the .env file")?,
            verify_token: env::var("WHATSAPP_VERIFY_TOKEN")
                .context("Expected WHATSAPP_VERIFY_TOKEN in the .env file")?,
            app_secret: env::var("WHATSAPP_APP_SECRET").ok(),
        })
    }
}
