use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

/// Header carrying the hex HMAC-SHA256 of the request body
pub const SIGNATURE_HEADER: &str = "X-Eyeson-Signature";

pub const WEBHOOK_ROOM: &str = "room_update";
pub const WEBHOOK_RECORDING: &str = "recording_update";
pub const WEBHOOK_SNAPSHOT: &str = "snapshot_update";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadLink {
    pub download: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomRef {
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookRoom {
    pub id: String,
    pub name: String,
    pub started_at: Option<DateTime<Utc>>,
    pub shutdown: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookRecording {
    pub id: String,
    pub duration: i64,
    /// Unix timestamp (seconds)
    pub created_at: i64,
    pub links: DownloadLink,
    pub room: RoomRef,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookSnapshot {
    pub id: String,
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
    pub links: DownloadLink,
    pub room: RoomRef,
}

/// Notification posted by the API to a registered webhook URL
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Webhook {
    #[serde(rename = "type")]
    pub kind: String,
    pub room: Option<WebhookRoom>,
    pub recording: Option<WebhookRecording>,
    pub snapshot: Option<WebhookSnapshot>,
}

impl Webhook {
    /// Verify the body against `signature` and decode it
    pub fn from_signed(api_key: &str, body: &[u8], signature: &str) -> Result<Self> {
        verify_signature(api_key, body, signature)?;
        Ok(serde_json::from_slice(body)?)
    }
}

fn mac(api_key: &str, body: &[u8]) -> Result<HmacSha256> {
    let mut mac =
        HmacSha256::new_from_slice(api_key.as_bytes()).map_err(|_| Error::InvalidSignature)?;
    mac.update(body);
    Ok(mac)
}

/// Hex encoded HMAC-SHA256 of `body` keyed with the API key
pub fn sign(api_key: &str, body: &[u8]) -> Result<String> {
    Ok(hex::encode(mac(api_key, body)?.finalize().into_bytes()))
}

/// Check a webhook signature in constant time
pub fn verify_signature(api_key: &str, body: &[u8], signature: &str) -> Result<()> {
    let provided = hex::decode(signature.trim()).map_err(|_| Error::InvalidSignature)?;

    let expected = mac(api_key, body)?.finalize().into_bytes();

    if expected.len() != provided.len() || !bool::from(expected.as_slice().ct_eq(&provided)) {
        return Err(Error::InvalidSignature);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const API_KEY: &str = "test-api-key";

    #[test]
    fn test_valid_signature() {
        let body = br#"{"type":"room_update","room":{"id":"r1","name":"demo","shutdown":true}}"#;
        let signature = sign(API_KEY, body).unwrap();

        let webhook = Webhook::from_signed(API_KEY, body, &signature).unwrap();
        assert_eq!(webhook.kind, WEBHOOK_ROOM);
        let room = webhook.room.unwrap();
        assert_eq!(room.id, "r1");
        assert!(room.shutdown);
        assert!(webhook.recording.is_none());
    }

    #[test]
    fn test_signature_with_wrong_key() {
        let body = br#"{"type":"room_update"}"#;
        let signature = sign("other-key", body).unwrap();

        let err = Webhook::from_signed(API_KEY, body, &signature).unwrap_err();
        assert!(matches!(err, Error::InvalidSignature));
    }

    #[test]
    fn test_tampered_body() {
        let signature = sign(API_KEY, br#"{"type":"room_update"}"#).unwrap();
        let err = verify_signature(API_KEY, br#"{"type":"recording_update"}"#, &signature)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidSignature));
    }

    #[test]
    fn test_non_hex_and_empty_signature() {
        let body = b"{}";
        assert!(matches!(
            verify_signature(API_KEY, body, "zz-not-hex"),
            Err(Error::InvalidSignature)
        ));
        assert!(matches!(
            verify_signature(API_KEY, body, ""),
            Err(Error::InvalidSignature)
        ));
    }

    #[test]
    fn test_known_digest() {
        // HMAC-SHA256("key", "The quick brown fox jumps over the lazy dog")
        assert_eq!(
            sign("key", b"The quick brown fox jumps over the lazy dog").unwrap(),
            "f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8"
        );
    }

    #[test]
    fn test_recording_payload() {
        let body = br#"{"type":"recording_update","recording":{"id":"rec1","duration":60,"created_at":1700000000,"links":{"download":"https://dl/rec1"},"room":{"id":"r1"}}}"#;
        let signature = sign(API_KEY, body).unwrap();
        let webhook = Webhook::from_signed(API_KEY, body, &signature).unwrap();

        let recording = webhook.recording.unwrap();
        assert_eq!(recording.duration, 60);
        assert_eq!(recording.links.download, "https://dl/rec1");
        assert_eq!(recording.room.id, "r1");
    }

    #[test]
    fn test_any_key_length_signs() {
        let body = br#"{"type":"snapshot_update"}"#;
        let long_key = "x".repeat(200);
        for key in ["", "k", long_key.as_str()] {
            let signature = sign(key, body).unwrap();
            assert_eq!(signature.len(), 64);
            verify_signature(key, body, &signature).unwrap();
        }
    }
}
