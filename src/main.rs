use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use eyeson::{create_router, AppState, Client, Config, Event};
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "eyeson", about = "Observe rooms and manage webhooks")]
struct Cli {
    /// Config file (extension optional)
    #[arg(long, default_value = "config/eyeson")]
    config: String,

    /// Override the API endpoint
    #[arg(long)]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the realtime events of a room until it shuts down
    Observe {
        #[arg(long)]
        room: String,
    },
    /// Run the webhook receiver
    Listen,
    /// Register a webhook for the API key
    Register {
        #[arg(long)]
        url: String,
        /// Comma separated webhook types
        #[arg(long, default_value = "room_update,recording_update")]
        types: String,
    },
    /// Remove the registered webhook
    Unregister,
    /// Force stop a meeting
    Shutdown {
        #[arg(long)]
        room: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut cfg = Config::load(&cli.config).context("Failed to load config")?;
    if let Some(endpoint) = cli.endpoint {
        cfg.api.endpoint = Some(endpoint);
    }
    if cfg.api.api_key.is_empty() {
        anyhow::bail!("No API key configured, set EYESON__API__API_KEY");
    }

    let client = Client::from_config(&cfg).context("Failed to create client")?;

    match cli.command {
        Command::Observe { room } => observe(&client, &room).await,
        Command::Listen => listen(&cfg).await,
        Command::Register { url, types } => {
            let types: Vec<&str> = types.split(',').map(str::trim).collect();
            client.webhooks().register(&url, &types).await?;
            let details = client.webhooks().get().await?;
            info!("Webhook {} registered for {:?}", details.id, details.types);
            Ok(())
        }
        Command::Unregister => {
            client.webhooks().unregister().await?;
            Ok(())
        }
        Command::Shutdown { room } => {
            client.rooms().shutdown(&room).await?;
            info!("Room {} shut down", room);
            Ok(())
        }
    }
}

async fn observe(client: &Client, room: &str) -> Result<()> {
    let cancel = CancellationToken::new();

    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let mut events = client
        .observer()
        .connect(cancel.clone(), room)
        .await
        .context("Failed to connect observer")?;

    while let Some(event) = events.next().await {
        let event = match event {
            Ok(event) => event,
            Err(e) => {
                error!("Observer stopped: {}", e);
                return Err(e.into());
            }
        };

        match event {
            Event::RoomUpdate(update) => {
                info!("Room {} ready={}", update.content.name, update.content.ready);
                if update.content.shutdown {
                    info!("Room {} is shutting down", update.content.name);
                    cancel.cancel();
                }
            }
            Event::ParticipantUpdate(update) => {
                info!(
                    "User {} online={}",
                    update.participant.name, update.participant.online
                );
            }
            Event::Chat(chat) => info!("Chat {}: {}", chat.client_id, chat.content),
            other => info!("Received {}", other.event_type()),
        }
    }

    let stats = events.stats();
    if stats.dropped() > 0 {
        warn!("{} frames were dropped", stats.dropped());
    }
    info!("Observer finished ({} events)", stats.events_forwarded);

    Ok(())
}

async fn listen(cfg: &Config) -> Result<()> {
    let (tx, mut rx) = tokio::sync::mpsc::channel(64);
    let app = create_router(AppState::new(cfg.api.api_key.clone(), tx));

    let addr = format!("{}:{}", cfg.webhook.bind, cfg.webhook.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Webhook receiver listening on {}", addr);

    tokio::spawn(async move {
        while let Some(webhook) = rx.recv().await {
            info!("Webhook: {:?}", webhook);
        }
    });

    axum::serve(listener, app).await?;
    Ok(())
}
