use crate::error::{Error, Result};
use futures::{SinkExt, StreamExt};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

/// Opens realtime connections for the observer
#[async_trait::async_trait]
pub trait Connector: Send + Sync {
    type Transport: Transport;

    /// Open a duplex connection, sending `authorization` as connection header
    async fn connect(&self, url: &Url, authorization: &str) -> Result<Self::Transport>;
}

/// A duplex pub/sub connection owned by one observer session
#[async_trait::async_trait]
pub trait Transport: Send + 'static {
    /// Subscribe to `channel`, returning once the subscription is confirmed
    async fn subscribe(&mut self, channel: &str) -> Result<()>;

    /// Next inbound message payload; `None` once the channel is closed
    async fn next_frame(&mut self) -> Option<Result<Vec<u8>>>;

    async fn close(&mut self) -> Result<()>;
}

/// Connector for the cable-framed WebSocket endpoint of the API
#[derive(Debug, Clone)]
pub struct CableConnector {
    handshake_timeout: Duration,
}

impl CableConnector {
    pub fn new(handshake_timeout: Duration) -> Self {
        Self { handshake_timeout }
    }
}

impl Default for CableConnector {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

#[async_trait::async_trait]
impl Connector for CableConnector {
    type Transport = CableTransport;

    async fn connect(&self, url: &Url, authorization: &str) -> Result<CableTransport> {
        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| Error::Configuration(format!("invalid observer url {}: {}", url, e)))?;
        let header = HeaderValue::from_str(authorization)
            .map_err(|_| Error::Configuration("api key is not a valid header value".to_string()))?;
        request.headers_mut().insert("Authorization", header);

        info!("Connecting observer socket at {}", url.host_str().unwrap_or_default());

        let (ws, _response) =
            tokio::time::timeout(self.handshake_timeout, tokio_tungstenite::connect_async(request))
                .await
                .map_err(|_| Error::Transport("timed out connecting observer socket".to_string()))?
                .map_err(|e| Error::Transport(format!("failed to connect observer socket: {}", e)))?;

        Ok(CableTransport {
            ws,
            identifier: None,
            handshake_timeout: self.handshake_timeout,
        })
    }
}

#[derive(Serialize)]
struct ChannelIdentifier<'a> {
    channel: &'a str,
}

#[derive(Serialize)]
struct SubscribeCommand {
    command: &'static str,
    identifier: String,
}

/// Frame as sent by the cable server, either a protocol frame or a channel message
#[derive(Deserialize)]
struct CableFrame<'a> {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(borrow, default)]
    message: Option<&'a RawValue>,
    #[serde(default)]
    reason: Option<String>,
}

/// What a text frame from the cable server means for the transport
#[derive(Debug, PartialEq)]
enum Inbound {
    /// `welcome`, `ping` and anything else without payload
    Control,
    Confirmed,
    Rejected,
    Disconnect(Option<String>),
    Message(Vec<u8>),
}

fn classify(text: &str) -> Result<Inbound> {
    let frame: CableFrame<'_> = serde_json::from_str(text)?;

    let inbound = match frame.kind.as_deref() {
        Some("confirm_subscription") => Inbound::Confirmed,
        Some("reject_subscription") => Inbound::Rejected,
        Some("disconnect") => Inbound::Disconnect(frame.reason),
        Some(_) => Inbound::Control,
        None => match frame.message {
            Some(message) => Inbound::Message(message.get().as_bytes().to_vec()),
            None => Inbound::Control,
        },
    };

    Ok(inbound)
}

/// WebSocket connection speaking the cable subscribe protocol
pub struct CableTransport {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    identifier: Option<String>,
    handshake_timeout: Duration,
}

impl CableTransport {
    /// Next text frame from the socket, `None` when closed
    async fn next_text(&mut self) -> Option<Result<String>> {
        loop {
            match self.ws.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Close(frame)) => {
                    debug!("Observer socket closed by server: {:?}", frame);
                    return None;
                }
                // Pings are answered by tungstenite itself
                Ok(_) => continue,
                Err(e) => return Some(Err(Error::Transport(e.to_string()))),
            }
        }
    }
}

#[async_trait::async_trait]
impl Transport for CableTransport {
    async fn subscribe(&mut self, channel: &str) -> Result<()> {
        let identifier = serde_json::to_string(&ChannelIdentifier { channel })?;
        let command = serde_json::to_string(&SubscribeCommand {
            command: "subscribe",
            identifier: identifier.clone(),
        })?;

        self.ws
            .send(Message::Text(command))
            .await
            .map_err(|e| Error::Handshake(format!("failed to send subscribe command: {}", e)))?;

        let timeout = self.handshake_timeout;
        let confirmation = async {
            loop {
                let text = match self.next_text().await {
                    Some(Ok(text)) => text,
                    Some(Err(e)) => return Err(Error::Handshake(e.to_string())),
                    None => {
                        return Err(Error::Handshake(
                            "connection closed before subscription was confirmed".to_string(),
                        ))
                    }
                };

                match classify(&text) {
                    Ok(Inbound::Confirmed) => return Ok(()),
                    Ok(Inbound::Rejected) => {
                        return Err(Error::Handshake(format!(
                            "subscription to {} rejected",
                            channel
                        )))
                    }
                    Ok(Inbound::Disconnect(reason)) => {
                        return Err(Error::Handshake(format!(
                            "server disconnected: {}",
                            reason.unwrap_or_else(|| "no reason given".to_string())
                        )))
                    }
                    Ok(_) => continue,
                    Err(e) => warn!("Ignoring unreadable frame during handshake: {}", e),
                }
            }
        };

        tokio::time::timeout(timeout, confirmation)
            .await
            .map_err(|_| Error::Handshake("timed out waiting for subscription".to_string()))??;

        info!("Subscribed to {}", channel);
        self.identifier = Some(identifier);
        Ok(())
    }

    async fn next_frame(&mut self) -> Option<Result<Vec<u8>>> {
        loop {
            let text = match self.next_text().await? {
                Ok(text) => text,
                Err(e) => return Some(Err(e)),
            };

            match classify(&text) {
                Ok(Inbound::Message(payload)) => return Some(Ok(payload)),
                Ok(Inbound::Disconnect(reason)) => {
                    info!("Observer socket disconnected: {:?}", reason);
                    return None;
                }
                Ok(_) => continue,
                Err(e) => warn!("Ignoring unreadable socket frame: {}", e),
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(identifier) = self.identifier.take() {
            let command = serde_json::to_string(&SubscribeCommand {
                command: "unsubscribe",
                identifier,
            })?;
            // Best effort, the socket may already be gone
            let _ = self.ws.send(Message::Text(command)).await;
        }

        match self.ws.close(None).await {
            Ok(()) => Ok(()),
            Err(tokio_tungstenite::tungstenite::Error::ConnectionClosed)
            | Err(tokio_tungstenite::tungstenite::Error::AlreadyClosed) => Ok(()),
            Err(e) => Err(Error::Transport(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_protocol_frames() {
        assert_eq!(classify(r#"{"type":"welcome"}"#).unwrap(), Inbound::Control);
        assert_eq!(
            classify(r#"{"type":"ping","message":1700000000}"#).unwrap(),
            Inbound::Control
        );
        assert_eq!(
            classify(r#"{"identifier":"{}","type":"confirm_subscription"}"#).unwrap(),
            Inbound::Confirmed
        );
        assert_eq!(
            classify(r#"{"identifier":"{}","type":"reject_subscription"}"#).unwrap(),
            Inbound::Rejected
        );
        assert_eq!(
            classify(r#"{"type":"disconnect","reason":"unauthorized"}"#).unwrap(),
            Inbound::Disconnect(Some("unauthorized".to_string()))
        );
    }

    #[test]
    fn test_classify_message_keeps_raw_payload() {
        let inbound =
            classify(r#"{"identifier":"{\"channel\":\"RoomChannel\"}","message":{"type":"chat","content":"hi"}}"#)
                .unwrap();
        assert_eq!(
            inbound,
            Inbound::Message(br#"{"type":"chat","content":"hi"}"#.to_vec())
        );
    }

    #[test]
    fn test_classify_rejects_garbage() {
        assert!(classify("not json").is_err());
    }

    #[test]
    fn test_subscribe_command_format() {
        let identifier = serde_json::to_string(&ChannelIdentifier { channel: "RoomChannel" }).unwrap();
        let command = serde_json::to_string(&SubscribeCommand {
            command: "subscribe",
            identifier,
        })
        .unwrap();
        assert_eq!(
            command,
            r#"{"command":"subscribe","identifier":"{\"channel\":\"RoomChannel\"}"}"#
        );
    }
}
