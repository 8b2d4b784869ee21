use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{info, warn};

use nuwandi_bamboo_bot::config::Config;
use nuwandi_bamboo_bot::handler::Dispatcher;
use nuwandi_bamboo_bot::model::AppState;
use nuwandi_bamboo_bot::orders::OrderApi;
use nuwandi_bamboo_bot::transport::{WebhookGuard, WhatsAppTransport};
use nuwandi_bamboo_bot::web;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nuwandi_bamboo_bot=info".into()),
        )
        .init();

    let config = Config::from_env()?;
    info!("🚀 Starting WhatsApp order tracking bot...");

    let transport = Arc::new(WhatsAppTransport::new(&config));
    match transport.connect().await {
        Ok(()) => info!("✅ WhatsApp Cloud API credentials verified"),
        Err(error) => {
            warn!(%error, "WhatsApp credential check failed; /health will report disconnected")
        }
    }

    let (inbound_tx, inbound_rx) = mpsc::channel(256);
    let dispatcher = Dispatcher::new(transport.clone(), OrderApi::new(&config.base_api_url));
    tokio::spawn(dispatcher.run(inbound_rx));

    let state = Arc::new(AppState {
        webhook: WebhookGuard::new(config.verify_token.clone(), config.app_secret.clone()),
        transport,
        inbound_tx,
        started_at: Instant::now(),
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("🌐 Web interface running on http://localhost:{}", config.port);
    axum::serve(listener, web::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("🔄 Bot stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("🔄 Shutting down bot..."),
        Err(error) => {
            warn!(%error, "could not install the interrupt handler; running until killed");
            std::future::pending::<()>().await;
        }
    }
}
