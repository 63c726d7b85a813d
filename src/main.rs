use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use formrelay::config::Config;
use formrelay::platform::telegram::TelegramClient;
use formrelay::relay::{self, RelayState};

#[tokio::main]
async fn main() -> Result<()> {
    // Development convenience; production sets variables via systemd.
    dotenvy::dotenv().ok();

    let _log_guard = formrelay::logging::init("relay.log")?;

    let config = Config::from_env().context("Failed to load configuration")?;

    info!("Configuration loaded successfully");
    info!("  Bind address: {}", config.relay.bind_addr);
    info!("  Destination chat: {}", config.telegram.chat_id);
    if config.relay.session_secret.is_none() {
        warn!("SESSION_SECRET is not set");
    }

    let client = TelegramClient::new(config.telegram.clone());
    let chat_id = client.default_chat_id().to_string();
    let state = Arc::new(RelayState::new(Arc::new(client), chat_id));
    let app = relay::router(state);

    let listener = tokio::net::TcpListener::bind(config.relay.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.relay.bind_addr))?;

    info!("Relay listening on http://{}", config.relay.bind_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(formrelay::signal::shutdown())
    .await
    .context("Server error")?;

    info!("Relay stopped");
    Ok(())
}
