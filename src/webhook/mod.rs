//! Webhooks: registration through the REST API and verification of incoming
//! notifications.

mod payload;
mod service;

pub use payload::{
    sign, verify_signature, DownloadLink, RoomRef, Webhook, WebhookRecording, WebhookRoom,
    WebhookSnapshot, SIGNATURE_HEADER, WEBHOOK_RECORDING, WEBHOOK_ROOM, WEBHOOK_SNAPSHOT,
};
pub use service::{WebhookDetails, WebhookService};
