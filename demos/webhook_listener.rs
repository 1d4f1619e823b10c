// Registers a webhook for the API key and serves the receiver until Ctrl-C,
// then removes the registration again.
//
// Usage: API_KEY=... cargo run --example webhook_listener -- <public-url> [port]

use anyhow::{Context, Result};
use eyeson::webhook::{WEBHOOK_RECORDING, WEBHOOK_ROOM, WEBHOOK_SNAPSHOT};
use eyeson::{create_router, AppState, Client, Webhook};
use tokio::sync::mpsc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let public_url = args.next().context("Usage: webhook_listener <public-url> [port]")?;
    let port: u16 = args.next().map(|p| p.parse::<u16>()).transpose()?.unwrap_or(8080);
    let api_key = std::env::var("API_KEY").context("Please set the environment variable API_KEY")?;

    let client = Client::new(api_key.clone())?;
    client
        .webhooks()
        .register(&public_url, &[WEBHOOK_ROOM, WEBHOOK_RECORDING, WEBHOOK_SNAPSHOT])
        .await?;
    info!("✅ Webhook registered at {}", public_url);

    let (tx, mut rx) = mpsc::channel::<Webhook>(32);
    tokio::spawn(async move {
        while let Some(webhook) = rx.recv().await {
            if let Some(recording) = &webhook.recording {
                info!("🎬 Recording {} available at {}", recording.id, recording.links.download);
            } else if let Some(room) = &webhook.room {
                info!("🏠 Room {} ({}) shutdown={}", room.name, room.id, room.shutdown);
            } else {
                info!("📨 Webhook {}", webhook.kind);
            }
        }
    });

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Listening on port {}", port);

    axum::serve(listener, create_router(AppState::new(api_key, tx)))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    client.webhooks().unregister().await?;
    info!("Webhook unregistered");

    Ok(())
}
