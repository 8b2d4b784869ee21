//! WhatsApp Business Cloud API adapter.
//!
//! Inbound messages arrive as webhook deliveries from Meta and are parsed
//! into [`InboundMessage`] values; outbound traffic goes through the Graph
//! API `/messages` endpoint. Session state lives on Meta's side, so
//! "connected" here just means the credentials checked out.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::config::Config;

use super::{InboundMessage, Transport, TransportError};

type HmacSha256 = Hmac<Sha256>;

/// Validates webhook handshakes and payload signatures.
///
/// Meta signs each delivery with the app secret; when no secret is
/// configured the signature check is skipped and only the subscribe
/// handshake is enforced.
pub struct WebhookGuard {
    verify_token: String,
    app_secret: Option<String>,
}

impl WebhookGuard {
    pub fn new(verify_token: String, app_secret: Option<String>) -> Self {
        Self {
            verify_token,
            app_secret,
        }
    }

    /// Meta's GET handshake: echo the challenge iff the mode and token match.
    pub fn verify_challenge(
        &self,
        mode: &str,
        token: &str,
        challenge: &str,
    ) -> Result<String, TransportError> {
        if mode != "subscribe" {
            return Err(TransportError::Rejected(format!(
                "unexpected hub.mode {mode:?}"
            )));
        }
        let matches = self.verify_token.as_bytes().ct_eq(token.as_bytes());
        if !bool::from(matches) {
            return Err(TransportError::Rejected(
                "hub.verify_token mismatch".to_string(),
            ));
        }
        Ok(challenge.to_string())
    }

    /// Check the `X-Hub-Signature-256` header against the raw request body.
    pub fn verify_signature(
        &self,
        raw_body: &[u8],
        header: Option<&str>,
    ) -> Result<(), TransportError> {
        let Some(secret) = &self.app_secret else {
            return Ok(());
        };
        let header = header.ok_or_else(|| {
            TransportError::Rejected("missing X-Hub-Signature-256 header".to_string())
        })?;
        let hex_digest = header.strip_prefix("sha256=").ok_or_else(|| {
            TransportError::Rejected("signature header is not sha256".to_string())
        })?;
        let provided = hex::decode(hex_digest)
            .map_err(|e| TransportError::Rejected(format!("signature is not valid hex: {e}")))?;
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| TransportError::Rejected(format!("bad HMAC key: {e}")))?;
        mac.update(raw_body);
        let computed = mac.finalize().into_bytes();
        if !bool::from(computed.as_slice().ct_eq(&provided)) {
            return Err(TransportError::Rejected(
                "signature mismatch".to_string(),
            ));
        }
        Ok(())
    }
}

/// Top of the webhook delivery tree. Only the parts the bot consumes are
/// modelled; everything else is ignored by serde.
#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookEntry {
    #[serde(default)]
    pub changes: Vec<WebhookChange>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookChange {
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub value: WebhookValue,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookValue {
    #[serde(default)]
    pub contacts: Vec<WebhookContact>,
    #[serde(default)]
    pub messages: Vec<WebhookMessage>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookContact {
    pub wa_id: String,
    #[serde(default)]
    pub profile: Option<ContactProfile>,
}

#[derive(Debug, Deserialize)]
pub struct ContactProfile {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct WebhookMessage {
    pub from: String,
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<TextBody>,
}

#[derive(Debug, Deserialize)]
pub struct TextBody {
    pub body: String,
}

/// Flatten a webhook delivery into the text messages it carries, pairing each
/// with the sender's profile name when the contacts block has one.
pub fn inbound_messages(payload: WebhookPayload) -> Vec<InboundMessage> {
    let mut out = Vec::new();
    for entry in payload.entry {
        for change in entry.changes {
            if change.field != "messages" {
                continue;
            }
            let WebhookValue { contacts, messages } = change.value;
            for message in messages {
                if message.kind != "text" {
                    debug!(target: "transport", kind = %message.kind, "ignoring non-text message");
                    continue;
                }
                let Some(text) = message.text else {
                    continue;
                };
                let display_name = contacts
                    .iter()
                    .find(|contact| contact.wa_id == message.from)
                    .and_then(|contact| contact.profile.as_ref())
                    .map(|profile| profile.name.clone())
                    .filter(|name| !name.is_empty());
                let group = message.from.contains("@g.us");
                let broadcast = message.from.contains("status@broadcast");
                out.push(InboundMessage {
                    id: message.id,
                    from: message.from,
                    display_name,
                    body: text.body,
                    group,
                    broadcast,
                });
            }
        }
    }
    out
}

pub struct WhatsAppTransport {
    client: Client,
    messages_url: String,
    number_url: String,
    access_token: String,
    connected: AtomicBool,
}

impl WhatsAppTransport {
    pub fn new(config: &Config) -> Self {
        Self::with_base_url(
            &config.graph_api_url,
            &config.phone_number_id,
            &config.access_token,
        )
    }

    /// Point the adapter at a different Graph API root. Tests aim this at a
    /// local mock server.
    pub fn with_base_url(graph_api_url: &str, phone_number_id: &str, access_token: &str) -> Self {
        let root = format!("{}/{}", graph_api_url.trim_end_matches('/'), phone_number_id);
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| Client::new()),
            messages_url: format!("{root}/messages"),
            number_url: root,
            access_token: access_token.to_string(),
            connected: AtomicBool::new(false),
        }
    }

    /// Verify the credentials by fetching the phone number object, and flip
    /// the connection flag accordingly.
    pub async fn connect(&self) -> Result<(), TransportError> {
        let response = self
            .client
            .get(&self.number_url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let detail = api_error_detail(response.text().await.unwrap_or_default());
            self.connected.store(false, Ordering::Relaxed);
            return Err(TransportError::Api(status, detail));
        }
        self.connected.store(true, Ordering::Relaxed);
        Ok(())
    }

    async fn post_messages(&self, body: serde_json::Value) -> Result<(), TransportError> {
        let response = self
            .client
            .post(&self.messages_url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let detail = api_error_detail(response.text().await.unwrap_or_default());
            return Err(TransportError::Api(status, detail));
        }
        Ok(())
    }
}

#[async_trait]
impl Transport for WhatsAppTransport {
    async fn reply(&self, to: &str, text: &str) -> Result<(), TransportError> {
        debug!(target: "transport", to, "sending text message");
        self.post_messages(json!({
            "messaging_product": "whatsapp",
            "recipient_type": "individual",
            "to": to,
            "type": "text",
            "text": { "body": text }
        }))
        .await
    }

    async fn set_typing(&self, message_id: &str) -> Result<(), TransportError> {
        self.post_messages(json!({
            "messaging_product": "whatsapp",
            "status": "read",
            "message_id": message_id,
            "typing_indicator": { "type": "text" }
        }))
        .await
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }
}

/// Pull the human-readable message out of a Graph API error body, falling
/// back to the raw text.
fn api_error_detail(body: String) -> String {
    #[derive(Deserialize)]
    struct ApiError {
        error: Option<ApiErrorInner>,
    }
    #[derive(Deserialize)]
    struct ApiErrorInner {
        message: String,
    }
    serde_json::from_str::<ApiError>(&body)
        .ok()
        .and_then(|e| e.error)
        .map(|e| e.message)
        .unwrap_or(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_payload() -> WebhookPayload {
        serde_json::from_value(json!({
            "object": "whatsapp_business_account",
            "entry": [{
                "id": "102290129340398",
                "changes": [{
                    "value": {
                        "messaging_product": "whatsapp",
                        "metadata": {
                            "display_phone_number": "15550001111",
                            "phone_number_id": "123456"
                        },
                        "contacts": [{
                            "profile": { "name": "Nimal Perera" },
                            "wa_id": "94771234567"
                        }],
                        "messages": [{
                            "from": "94771234567",
                            "id": "wamid.ABC123",
                            "timestamp": "1700000000",
                            "text": { "body": "track ORD123" },
                            "type": "text"
                        }]
                    },
                    "field": "messages"
                }]
            }]
        }))
        .unwrap()
    }

    #[test]
    fn delivery_parses_into_an_inbound_message() {
        let messages = inbound_messages(sample_payload());
        assert_eq!(messages.len(), 1);
        let message = &messages[0];
        assert_eq!(message.from, "94771234567");
        assert_eq!(message.id, "wamid.ABC123");
        assert_eq!(message.display_name.as_deref(), Some("Nimal Perera"));
        assert_eq!(message.body, "track ORD123");
        assert!(!message.group);
        assert!(!message.broadcast);
    }

    #[test]
    fn non_text_messages_are_ignored() {
        let payload: WebhookPayload = serde_json::from_value(json!({
            "entry": [{
                "changes": [{
                    "field": "messages",
                    "value": {
                        "messages": [{
                            "from": "94771234567",
                            "id": "wamid.IMG",
                            "type": "image"
                        }]
                    }
                }]
            }]
        }))
        .unwrap();
        assert!(inbound_messages(payload).is_empty());
    }

    #[test]
    fn status_only_deliveries_produce_nothing() {
        let payload: WebhookPayload = serde_json::from_value(json!({
            "entry": [{
                "changes": [{
                    "field": "messages",
                    "value": {
                        "statuses": [{ "id": "wamid.X", "status": "delivered" }]
                    }
                }]
            }]
        }))
        .unwrap();
        assert!(inbound_messages(payload).is_empty());
    }

    #[test]
    fn group_senders_are_flagged() {
        let payload: WebhookPayload = serde_json::from_value(json!({
            "entry": [{
                "changes": [{
                    "field": "messages",
                    "value": {
                        "messages": [{
                            "from": "94771234567-1602846963@g.us",
                            "id": "wamid.GRP",
                            "type": "text",
                            "text": { "body": "hi" }
                        }]
                    }
                }]
            }]
        }))
        .unwrap();
        let messages = inbound_messages(payload);
        assert_eq!(messages.len(), 1);
        assert!(messages[0].group);
    }

    #[test]
    fn challenge_round_trips_for_the_right_token() {
        let guard = WebhookGuard::new("sekrit".to_string(), None);
        let challenge = guard
            .verify_challenge("subscribe", "sekrit", "1158201444")
            .unwrap();
        assert_eq!(challenge, "1158201444");
    }

    #[test]
    fn challenge_rejects_a_wrong_token_or_mode() {
        let guard = WebhookGuard::new("sekrit".to_string(), None);
        assert!(guard.verify_challenge("subscribe", "guess", "x").is_err());
        assert!(guard.verify_challenge("unsubscribe", "sekrit", "x").is_err());
    }

    #[test]
    fn signature_check_accepts_a_properly_signed_body() {
        let guard = WebhookGuard::new("tok".to_string(), Some("app-secret".to_string()));
        let body = br#"{"entry":[]}"#;
        let mut mac = HmacSha256::new_from_slice(b"app-secret").unwrap();
        mac.update(body);
        let header = format!("sha256={}", hex::encode(mac.finalize().into_bytes()));
        assert!(guard.verify_signature(body, Some(&header)).is_ok());
    }

    #[test]
    fn signature_check_rejects_a_tampered_body() {
        let guard = WebhookGuard::new("tok".to_string(), Some("app-secret".to_string()));
        let mut mac = HmacSha256::new_from_slice(b"app-secret").unwrap();
        mac.update(br#"{"entry":[]}"#);
        let header = format!("sha256={}", hex::encode(mac.finalize().into_bytes()));
        assert!(guard
            .verify_signature(br#"{"entry":[{}]}"#, Some(&header))
            .is_err());
        assert!(guard.verify_signature(br#"{"entry":[]}"#, None).is_err());
    }

    #[test]
    fn signature_check_is_skipped_without_a_secret() {
        let guard = WebhookGuard::new("tok".to_string(), None);
        assert!(guard.verify_signature(b"anything", None).is_ok());
    }

    #[tokio::test]
    async fn reply_posts_to_the_messages_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/123456/messages"))
            .and(header("authorization", "Bearer test-token"))
            .and(body_partial_json(json!({
                "to": "94771234567",
                "type": "text",
                "text": { "body": "hello!" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "messages": [{ "id": "wamid.OUT" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let transport = WhatsAppTransport::with_base_url(&server.uri(), "123456", "test-token");
        transport.reply("94771234567", "hello!").await.unwrap();
    }

    #[tokio::test]
    async fn api_errors_surface_the_graph_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/123456/messages"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": { "message": "Invalid OAuth access token", "code": 190 }
            })))
            .mount(&server)
            .await;

        let transport = WhatsAppTransport::with_base_url(&server.uri(), "123456", "bad-token");
        match transport.reply("94771234567", "hello!").await {
            Err(TransportError::Api(status, detail)) => {
                assert_eq!(status.as_u16(), 401);
                assert_eq!(detail, "Invalid OAuth access token");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn connect_flips_the_connection_flag() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/123456"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "123456",
                "display_phone_number": "15550001111"
            })))
            .mount(&server)
            .await;

        let transport = WhatsAppTransport::with_base_url(&server.uri(), "123456", "test-token");
        assert!(!transport.is_connected());
        transport.connect().await.unwrap();
        assert!(transport.is_connected());
    }

    #[tokio::test]
    async fn failed_credential_check_stays_disconnected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/123456"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": { "message": "Invalid OAuth access token" }
            })))
            .mount(&server)
            .await;

        let transport = WhatsAppTransport::with_base_url(&server.uri(), "123456", "bad-token");
        assert!(transport.connect().await.is_err());
        assert!(!transport.is_connected());
    }
}
