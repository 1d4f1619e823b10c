use super::decoder::decode_frame;
use super::events::Event;
use super::stats::{SessionStats, StatsCounters};
use super::transport::{CableConnector, Connector, Transport};
use crate::client::Client;
use crate::error::{Error, Result};
use futures::Stream;
use reqwest::Url;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Lifecycle of an observer subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Subscribing,
    Active,
    Closing,
    Closed,
}

/// Listens to the realtime events of a room
pub struct ObserverService<'a> {
    client: &'a Client,
}

impl<'a> ObserverService<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Connect to the event channel of `room_id`.
    ///
    /// Returns once the subscription is confirmed. Cancelling `cancel` (or calling
    /// [`EventStream::cancel`]) tears the subscription down and ends the stream.
    pub async fn connect(&self, cancel: CancellationToken, room_id: &str) -> Result<EventStream> {
        let timeout = Duration::from_secs(self.client.observer_config().handshake_timeout_secs);
        self.connect_with(&CableConnector::new(timeout), cancel, room_id)
            .await
    }

    /// Like [`connect`](Self::connect) but over the given connector
    pub async fn connect_with<C: Connector>(
        &self,
        connector: &C,
        cancel: CancellationToken,
        room_id: &str,
    ) -> Result<EventStream> {
        let base_url = self
            .client
            .base_url()
            .ok_or_else(|| Error::Configuration("client base url not specified".to_string()))?;
        let url = observer_url(base_url, room_id)?;
        let config = self.client.observer_config();
        let close_timeout = Duration::from_secs(config.handshake_timeout_secs);

        let subscription_id = Uuid::new_v4();
        let span = info_span!("observer", %subscription_id, room_id);
        let (state_tx, state_rx) = watch::channel(SessionState::Connecting);

        let mut transport = connector
            .connect(&url, self.client.authorization())
            .instrument(span.clone())
            .await?;

        state_tx.send_replace(SessionState::Subscribing);

        if let Err(e) = transport.subscribe(&config.channel).instrument(span.clone()).await {
            error!(parent: &span, "Failed to subscribe: {}", e);
            close_transport(&mut transport, close_timeout)
                .instrument(span.clone())
                .await;
            return Err(e);
        }

        state_tx.send_replace(SessionState::Active);
        info!(parent: &span, "Observer active");

        let (tx, rx) = mpsc::channel(config.buffer.max(1));
        let stats = Arc::new(StatsCounters::default());

        tokio::spawn(
            receive_loop(
                transport,
                tx,
                cancel.clone(),
                state_tx,
                Arc::clone(&stats),
                close_timeout,
            )
            .instrument(span),
        );

        Ok(EventStream {
            rx,
            state: state_rx,
            stats,
            cancel,
            subscription_id,
        })
    }
}

/// Derive the observer socket URL from the REST base URL
pub fn observer_url(base: &Url, room_id: &str) -> Result<Url> {
    let base = base.as_str().trim_end_matches('/');

    let socket_base = if let Some(rest) = base.strip_prefix("https") {
        format!("wss{}", rest)
    } else if let Some(rest) = base.strip_prefix("http") {
        format!("ws{}", rest)
    } else {
        base.to_string()
    };

    let mut url = Url::parse(&format!("{}/rt", socket_base))
        .map_err(|e| Error::Configuration(format!("invalid observer url: {}", e)))?;
    url.query_pairs_mut().append_pair("room_id", room_id);

    Ok(url)
}

async fn receive_loop<T: Transport>(
    mut transport: T,
    tx: mpsc::Sender<Result<Event>>,
    cancel: CancellationToken,
    state: watch::Sender<SessionState>,
    stats: Arc<StatsCounters>,
    close_timeout: Duration,
) {
    let failure = loop {
        let frame = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Observer cancelled");
                break None;
            }
            _ = tx.closed() => {
                info!("Event stream dropped by consumer");
                break None;
            }
            frame = transport.next_frame() => frame,
        };

        let raw = match frame {
            Some(Ok(raw)) => raw,
            Some(Err(e)) => {
                error!("Observer transport failed: {}", e);
                break Some(e);
            }
            None => {
                info!("Observer channel closed");
                break None;
            }
        };

        if raw.is_empty() {
            continue;
        }
        stats.frame_received();

        let event = match decode_frame(&raw) {
            Ok(event) => event,
            Err(e) => {
                stats.frame_dropped(&e);
                warn!(reason = e.label(), "Dropping frame: {}", e);
                continue;
            }
        };

        debug!(event_type = event.event_type(), "Forwarding event");

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Observer cancelled");
                break None;
            }
            permit = tx.reserve() => match permit {
                Ok(permit) => {
                    stats.event_forwarded();
                    permit.send(Ok(event));
                }
                Err(_) => {
                    info!("Event stream dropped by consumer");
                    break None;
                }
            }
        }
    };

    state.send_replace(SessionState::Closing);

    if let Some(e) = failure {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {}
            _ = tx.send(Err(e)) => {}
        }
    }

    // The consumer sees the end of the stream without waiting on the peer
    drop(tx);

    close_transport(&mut transport, close_timeout).await;

    state.send_replace(SessionState::Closed);
    info!("Observer closed");
}

async fn close_transport<T: Transport>(transport: &mut T, limit: Duration) {
    match tokio::time::timeout(limit, transport.close()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("Failed to close observer transport: {}", e),
        Err(_) => warn!("Closing observer transport timed out after {:?}", limit),
    }
}

/// Ordered stream of events of one subscription.
///
/// Yields `Err` at most once, as the last item, when the connection failed.
/// `None` marks the end of the subscription.
pub struct EventStream {
    rx: mpsc::Receiver<Result<Event>>,
    state: watch::Receiver<SessionState>,
    stats: Arc<StatsCounters>,
    cancel: CancellationToken,
    subscription_id: Uuid,
}

impl EventStream {
    /// Wait for the next event
    pub async fn recv(&mut self) -> Option<Result<Event>> {
        self.rx.recv().await
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Wait until the session has torn down its transport.
    ///
    /// The event stream may end before this returns; closing the transport is
    /// bounded by the handshake timeout.
    pub async fn closed(&mut self) {
        let _ = self
            .state
            .wait_for(|state| *state == SessionState::Closed)
            .await;
    }

    pub fn stats(&self) -> SessionStats {
        self.stats.snapshot()
    }

    /// Stop the subscription; the stream ends shortly after
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn subscription_id(&self) -> Uuid {
        self.subscription_id
    }
}

impl Stream for EventStream {
    type Item = Result<Event>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
