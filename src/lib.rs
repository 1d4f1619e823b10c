pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod observer;
pub mod webhook;

pub use client::{Client, ClientBuilder, RoomsService};
pub use config::Config;
pub use error::{ApiError, Error, Result};
pub use http::{create_router, AppState};
pub use observer::{
    decode_frame, DecodeError, Event, EventKind, EventStream, ObserverService, SessionState,
    SessionStats,
};
pub use webhook::{verify_signature, Webhook, WebhookDetails, WebhookService};
