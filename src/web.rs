//! HTTP surface: status page, health probe, and the WhatsApp webhook.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::model::AppState;
use crate::transport::whatsapp::{self, WebhookPayload};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/webhook", get(verify_webhook).post(receive_webhook))
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
    uptime: u64,
    connected: bool,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        timestamp: chrono::Utc::now().to_rfc3339(),
        uptime: state.started_at.elapsed().as_secs(),
        connected: state.transport.is_connected(),
    })
}

/// Meta sends the three `hub.*` parameters when the webhook is registered.
#[derive(Debug, Deserialize)]
struct VerifyQuery {
    #[serde(rename = "hub.mode")]
    mode: String,
    #[serde(rename = "hub.verify_token")]
    verify_token: String,
    #[serde(rename = "hub.challenge")]
    challenge: String,
}

async fn verify_webhook(
    State(state): State<Arc<AppState>>,
    Query(params): Query<VerifyQuery>,
) -> Response {
    match state
        .webhook
        .verify_challenge(&params.mode, &params.verify_token, &params.challenge)
    {
        Ok(challenge) => {
            debug!(target: "web", "webhook verified");
            (StatusCode::OK, challenge).into_response()
        }
        Err(error) => {
            warn!(target: "web", %error, "webhook verification rejected");
            StatusCode::FORBIDDEN.into_response()
        }
    }
}

/// Deliveries are acknowledged with 200 even when nothing useful is inside;
/// Meta retries (and eventually disables) webhooks that keep failing.
async fn receive_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = headers
        .get("x-hub-signature-256")
        .and_then(|value| value.to_str().ok());
    if let Err(error) = state.webhook.verify_signature(&body, signature) {
        warn!(target: "web", %error, "webhook delivery rejected");
        return StatusCode::FORBIDDEN.into_response();
    }

    let payload: WebhookPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(error) => {
            warn!(target: "web", %error, "unparsable webhook payload");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    for message in whatsapp::inbound_messages(payload) {
        if state.inbound_tx.send(message).await.is_err() {
            warn!(target: "web", "dispatcher is gone; dropping inbound message");
            break;
        }
    }
    (StatusCode::OK, "EVENT_RECEIVED").into_response()
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>Nuwandi Bamboo Blinds - WhatsApp Bot</title>
    <style>
        body { font-family: Arial, sans-serif; margin: 40px; background: #f5f5f5; }
        .container { max-width: 600px; margin: 0 auto; background: white; padding: 30px; border-radius: 10px; box-shadow: 0 2px 10px rgba(0,0,0,0.1); }
        h1 { color: #25D366; text-align: center; }
        .status { padding: 15px; border-radius: 5px; margin: 20px 0; }
        .online { background: #d4edda; color: #155724; border: 1px solid #c3e6cb; }
        .info { background: #d1ecf1; color: #0c5460; border: 1px solid #bee5eb; }
        .commands { background: #f8f9fa; padding: 20px; border-radius: 5px; margin: 20px 0; }
        .command { margin: 10px 0; padding: 10px; background: white; border-radius: 3px; }
        .footer { text-align: center; margin-top: 30px; color: #666; }
        .contact { background: #fff3cd; color: #856404; border: 1px solid #ffeaa7; padding: 15px; border-radius: 5px; margin: 20px 0; }
    </style>
</head>
<body>
    <div class="container">
        <h1>🎋 Nuwandi Bamboo Blinds - WhatsApp Bot</h1>

        <div class="status online">
            <strong>✅ Bot Status:</strong> Online & Active
        </div>

        <div class="contact">
            <strong>📞 Support Contact:</strong><br>
            Phone: 077 122 9598<br>
            Email: nuwandhibambooblinds@gmail.com<br>
            Website: https://nuwandibambooblinds.lk/
        </div>

        <div class="info">
            <strong>📱 How to Use:</strong><br>
            1. Save this number in your contacts<br>
            2. Send a WhatsApp message<br>
            3. Start with "hi" or send your order number
        </div>

        <div class="commands">
            <h3>🤖 Available Commands:</h3>
            <div class="command"><strong>hi/hello</strong> - Welcome message</div>
            <div class="command"><strong>track ORD123</strong> - Track specific order</div>
            <div class="command"><strong>ORD123</strong> - Direct order tracking</div>
            <div class="command"><strong>search John Doe</strong> - Find orders by name, phone, or email</div>
            <div class="command"><strong>support</strong> - Get contact information</div>
            <div class="command"><strong>help</strong> - Show all commands</div>
        </div>

        <div class="footer">
            <p>🌐 <a href="https://nuwandibambooblinds.lk/" target="_blank">Visit Our Website</a></p>
            <p>© 2024 Nuwandi Bamboo Blinds</p>
        </div>
    </div>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use hmac::{Hmac, Mac};
    use http_body_util::BodyExt;
    use serde_json::json;
    use sha2::Sha256;
    use tokio::sync::mpsc;
    use tower::ServiceExt;

    use crate::transport::whatsapp::WebhookGuard;
    use crate::transport::{InboundMessage, Transport, TransportError};

    struct StubTransport;

    #[async_trait]
    impl Transport for StubTransport {
        async fn reply(&self, _to: &str, _text: &str) -> Result<(), TransportError> {
            Ok(())
        }
        async fn set_typing(&self, _message_id: &str) -> Result<(), TransportError> {
            Ok(())
        }
        fn is_connected(&self) -> bool {
            true
        }
    }

    fn test_state(app_secret: Option<&str>) -> (Arc<AppState>, mpsc::Receiver<InboundMessage>) {
        let (inbound_tx, inbound_rx) = mpsc::channel(8);
        let state = Arc::new(AppState {
            webhook: WebhookGuard::new("vtoken".to_string(), app_secret.map(str::to_string)),
            transport: Arc::new(StubTransport),
            inbound_tx,
            started_at: Instant::now(),
        });
        (state, inbound_rx)
    }

    fn delivery_body() -> String {
        json!({
            "object": "whatsapp_business_account",
            "entry": [{
                "changes": [{
                    "field": "messages",
                    "value": {
                        "contacts": [{ "profile": { "name": "Nimal" }, "wa_id": "94771234567" }],
                        "messages": [{
                            "from": "94771234567",
                            "id": "wamid.XYZ",
                            "type": "text",
                            "text": { "body": "hi" }
                        }]
                    }
                }]
            }]
        })
        .to_string()
    }

    #[tokio::test]
    async fn handshake_echoes_the_challenge() {
        let (state, _rx) = test_state(None);
        let response = router(state)
            .oneshot(
                Request::get(
                    "/webhook?hub.mode=subscribe&hub.verify_token=vtoken&hub.challenge=1158201444",
                )
                .body(Body::empty())
                .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"1158201444");
    }

    #[tokio::test]
    async fn handshake_rejects_a_wrong_token() {
        let (state, _rx) = test_state(None);
        let response = router(state)
            .oneshot(
                Request::get("/webhook?hub.mode=subscribe&hub.verify_token=guess&hub.challenge=x")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn delivery_lands_on_the_dispatch_queue() {
        let (state, mut rx) = test_state(None);
        let response = router(state)
            .oneshot(
                Request::post("/webhook")
                    .header("content-type", "application/json")
                    .body(Body::from(delivery_body()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let message = rx.recv().await.unwrap();
        assert_eq!(message.from, "94771234567");
        assert_eq!(message.body, "hi");
        assert_eq!(message.display_name.as_deref(), Some("Nimal"));
    }

    #[tokio::test]
    async fn signed_delivery_passes_the_signature_check() {
        let (state, mut rx) = test_state(Some("app-secret"));
        let body = delivery_body();
        let mut mac = Hmac::<Sha256>::new_from_slice(b"app-secret").unwrap();
        mac.update(body.as_bytes());
        let signature = format!("sha256={}", hex::encode(mac.finalize().into_bytes()));

        let response = router(state)
            .oneshot(
                Request::post("/webhook")
                    .header("x-hub-signature-256", signature)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn unsigned_delivery_is_rejected_when_a_secret_is_set() {
        let (state, mut rx) = test_state(Some("app-secret"));
        let response = router(state)
            .oneshot(
                Request::post("/webhook")
                    .body(Body::from(delivery_body()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn health_reports_status_and_connection() {
        let (state, _rx) = test_state(None);
        let response = router(state)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "OK");
        assert_eq!(body["connected"], true);
        assert!(body["uptime"].is_u64());
    }

    #[tokio::test]
    async fn status_page_serves_html() {
        let (state, _rx) = test_state(None);
        let response = router(state)
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let page = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(page.contains("Nuwandi Bamboo Blinds - WhatsApp Bot"));
    }
}
