//! Two-phase frame decoding
//!
//! A frame is first decoded into an envelope holding only its `type`, the type is
//! looked up in the registry, and the same bytes are then decoded into the matching
//! payload. None of the failures here are fatal to a session.

use super::events::{Event, EventKind};
use super::registry;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed frame: {0}")]
    MalformedFrame(#[source] serde_json::Error),

    #[error("message-type {0} not supported")]
    UnknownEventType(String),

    #[error("failed to decode {kind} payload: {source}")]
    PayloadDecode {
        kind: EventKind,
        #[source]
        source: serde_json::Error,
    },
}

impl DecodeError {
    /// Short label used in logs
    pub fn label(&self) -> &'static str {
        match self {
            DecodeError::MalformedFrame(_) => "malformed_frame",
            DecodeError::UnknownEventType(_) => "unknown_event_type",
            DecodeError::PayloadDecode { .. } => "payload_decode",
        }
    }
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
}

/// Decode one raw frame into a typed event
pub fn decode_frame(raw: &[u8]) -> Result<Event, DecodeError> {
    // Only objects carry a `type`; derived struct decoding would also take arrays
    let object: Map<String, Value> =
        serde_json::from_slice(raw).map_err(DecodeError::MalformedFrame)?;
    let envelope =
        Envelope::deserialize(Value::Object(object)).map_err(DecodeError::MalformedFrame)?;

    let entry = registry::lookup(&envelope.kind)
        .ok_or(DecodeError::UnknownEventType(envelope.kind))?;

    (entry.decode)(raw).map_err(|source| DecodeError::PayloadDecode {
        kind: entry.kind,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::registry::REGISTRY;

    #[test]
    fn test_decode_chat() {
        let event = decode_frame(br#"{"type":"chat","content":"hi","cid":"u1"}"#).unwrap();

        assert_eq!(event.event_type(), "chat");
        match event {
            Event::Chat(chat) => {
                assert_eq!(chat.content, "hi");
                assert_eq!(chat.client_id, "u1");
                assert!(chat.user_id.is_empty());
                assert!(chat.created_at.is_none());
            }
            other => panic!("expected chat, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_room_update_shutdown() {
        let event = decode_frame(br#"{"type":"room_update","content":{"shutdown":true}}"#).unwrap();

        match event {
            Event::RoomUpdate(update) => {
                assert!(update.content.shutdown);
                assert!(!update.content.ready);
                assert!(update.content.participants.is_empty());
            }
            other => panic!("expected room update, got {:?}", other),
        }
    }

    #[test]
    fn test_every_known_type_keeps_its_discriminator() {
        for entry in REGISTRY.iter() {
            let frame = format!(r#"{{"type":"{}"}}"#, entry.discriminator);
            let event = decode_frame(frame.as_bytes()).unwrap();
            assert_eq!(event.event_type(), entry.discriminator);
        }
    }

    #[test]
    fn test_unknown_type() {
        let err = decode_frame(br#"{"type":"lobby_update","content":{}}"#).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownEventType(ref t) if t == "lobby_update"));
        assert_eq!(err.label(), "unknown_event_type");
    }

    #[test]
    fn test_malformed_frames() {
        for raw in [
            &b"{not json"[..],
            &b"[]"[..],
            &br#"["chat"]"#[..],
            &br#"["room_update"]"#[..],
            &br#"["lobby"]"#[..],
            &br#""chat""#[..],
            &br#"{"content":"no type"}"#[..],
            &br#"{"type":42}"#[..],
        ] {
            let err = decode_frame(raw).unwrap_err();
            assert!(matches!(err, DecodeError::MalformedFrame(_)), "{:?}", err);
            assert_eq!(err.label(), "malformed_frame");
        }
    }

    #[test]
    fn test_payload_decode_error() {
        let err = decode_frame(br#"{"type":"participant_update","participant":{"online":"yes"}}"#)
            .unwrap_err();
        assert!(matches!(
            err,
            DecodeError::PayloadDecode {
                kind: EventKind::ParticipantUpdate,
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let raw = br#"{"type":"playback_update","playing":{"url":"https://x/y.mp4","play_id":"p1","audio":true,"volume":3},"extra":1}"#;
        match decode_frame(raw).unwrap() {
            Event::PlaybackUpdate(update) => {
                assert_eq!(update.playing.url, "https://x/y.mp4");
                assert_eq!(update.playing.play_id, "p1");
                assert!(update.playing.audio);
            }
            other => panic!("expected playback update, got {:?}", other),
        }
    }

    #[test]
    fn test_null_collections() {
        let raw = br#"{"type":"room_update","content":{"name":"demo","participants":null,"broadcasts":null}}"#;
        match decode_frame(raw).unwrap() {
            Event::RoomUpdate(update) => {
                assert_eq!(update.content.name, "demo");
                assert!(update.content.participants.is_empty());
                assert!(update.content.broadcasts.is_empty());
            }
            other => panic!("expected room update, got {:?}", other),
        }
    }

    #[test]
    fn test_podium_and_recording_shapes() {
        let raw = br#"{"type":"podium_update","podium":[{"user_id":"u1","play_id":null,"width":640,"height":360,"left":0,"top":0,"z-index":2}]}"#;
        match decode_frame(raw).unwrap() {
            Event::PodiumUpdate(update) => {
                assert_eq!(update.podium.len(), 1);
                assert_eq!(update.podium[0].z_index, 2);
                assert!(update.podium[0].play_id.is_none());
            }
            other => panic!("expected podium update, got {:?}", other),
        }

        let raw = br#"{"type":"recording_update","recording":{"id":"r1","created_at":1700000000,"duration":42,"links":{"self":"https://api/r1","download":null},"room":{"id":"room-1"}}}"#;
        match decode_frame(raw).unwrap() {
            Event::RecordingUpdate(update) => {
                assert_eq!(update.recording.duration, 42);
                assert_eq!(update.recording.links.self_link.as_deref(), Some("https://api/r1"));
                assert!(update.recording.links.download.is_none());
                assert_eq!(update.recording.room.id, "room-1");
            }
            other => panic!("expected recording update, got {:?}", other),
        }
    }

    #[test]
    fn test_decoding_is_repeatable() {
        let raw = br#"{"type":"participant_update","participant":{"id":"p1","name":"Ada","online":true}}"#;
        assert_eq!(decode_frame(raw).unwrap(), decode_frame(raw).unwrap());
    }
}
