//! Realtime room observer
//!
//! This module subscribes to the event channel of a running room and exposes the
//! decoded events as an ordered, cancellable stream:
//! - `transport` - connection seam plus the default cable-framed WebSocket adapter
//! - `registry` - fixed table of known event types
//! - `decoder` - two-phase JSON frame decoding
//! - `session` - subscription lifecycle and receive loop

mod decoder;
mod events;
mod registry;
mod session;
mod stats;
mod transport;

pub use decoder::{decode_frame, DecodeError};
pub use events::{
    Broadcast, BroadcastUpdate, Chat, Event, EventKind, EventRoom, EventUser, Links, Options,
    OptionsUpdate, Participant, ParticipantUpdate, Playback, PlaybackUpdate, PodiumPosition,
    PodiumUpdate, Recording, RecordingUpdate, RoomUpdate, Snapshot, SnapshotUpdate,
};
pub use registry::{lookup, DecodeFn, RegistryEntry, REGISTRY};
pub use session::{observer_url, EventStream, ObserverService, SessionState};
pub use stats::SessionStats;
pub use transport::{CableConnector, CableTransport, Connector, Transport};
