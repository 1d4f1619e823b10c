// Connects to the realtime observer of a running room, greets every participant
// that comes online and stops once the room shuts down.
//
// Usage: API_KEY=... cargo run --example observer -- <room-id> [endpoint]

use anyhow::{Context, Result};
use eyeson::{Client, Event};
use futures::StreamExt;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let room_id = args.next().context("Usage: observer <room-id> [endpoint]")?;
    let api_key = std::env::var("API_KEY").context("Please set the environment variable API_KEY")?;

    let mut builder = Client::builder(api_key);
    if let Some(endpoint) = args.next() {
        builder = builder.endpoint(endpoint);
    }
    let client = builder.build()?;

    let cancel = CancellationToken::new();
    let mut events = client.observer().connect(cancel.clone(), &room_id).await?;
    info!("✅ Observing room {}", room_id);

    while let Some(event) = events.next().await {
        let event = match event {
            Ok(event) => event,
            Err(e) => {
                warn!("❌ Observer disconnected: {}", e);
                break;
            }
        };

        info!("📨 Received event type: {}", event.event_type());

        match event {
            Event::ParticipantUpdate(update) if update.participant.online => {
                info!("👋 Please welcome {} to this meeting", update.participant.name);
            }
            Event::RoomUpdate(update) => {
                info!("Room {} is ready: {}", update.content.name, update.content.ready);
                if update.content.shutdown {
                    info!("Room {} is shutting down now", update.content.name);
                    cancel.cancel();
                }
            }
            Event::Chat(chat) => info!("💬 {} - {}", chat.client_id, chat.content),
            _ => {}
        }
    }

    // Give the session a moment to close the socket before exiting
    let _ = tokio::time::timeout(Duration::from_secs(2), events.closed()).await;
    info!("Observer stats: {:?}", events.stats());

    Ok(())
}
