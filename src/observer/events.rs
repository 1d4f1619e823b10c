use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Wire discriminator of an observer event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    RoomUpdate,
    ParticipantUpdate,
    PodiumUpdate,
    RecordingUpdate,
    BroadcastUpdate,
    OptionsUpdate,
    SnapshotUpdate,
    PlaybackUpdate,
    Chat,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::RoomUpdate => "room_update",
            EventKind::ParticipantUpdate => "participant_update",
            EventKind::PodiumUpdate => "podium_update",
            EventKind::RecordingUpdate => "recording_update",
            EventKind::BroadcastUpdate => "broadcasts_update",
            EventKind::OptionsUpdate => "options_update",
            EventKind::SnapshotUpdate => "snapshots_update",
            EventKind::PlaybackUpdate => "playback_update",
            EventKind::Chat => "chat",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded event received on the observer socket
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    RoomUpdate(RoomUpdate),
    ParticipantUpdate(ParticipantUpdate),
    PodiumUpdate(PodiumUpdate),
    RecordingUpdate(RecordingUpdate),
    BroadcastUpdate(BroadcastUpdate),
    OptionsUpdate(OptionsUpdate),
    SnapshotUpdate(SnapshotUpdate),
    PlaybackUpdate(PlaybackUpdate),
    Chat(Chat),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::RoomUpdate(_) => EventKind::RoomUpdate,
            Event::ParticipantUpdate(_) => EventKind::ParticipantUpdate,
            Event::PodiumUpdate(_) => EventKind::PodiumUpdate,
            Event::RecordingUpdate(_) => EventKind::RecordingUpdate,
            Event::BroadcastUpdate(_) => EventKind::BroadcastUpdate,
            Event::OptionsUpdate(_) => EventKind::OptionsUpdate,
            Event::SnapshotUpdate(_) => EventKind::SnapshotUpdate,
            Event::PlaybackUpdate(_) => EventKind::PlaybackUpdate,
            Event::Chat(_) => EventKind::Chat,
        }
    }

    /// The wire discriminator, e.g. `"room_update"`
    pub fn event_type(&self) -> &'static str {
        self.kind().as_str()
    }
}

/// Decode `null` the same way as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================================================
// Shared payload types
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    pub show_names: bool,
}

/// Room state as carried by room, recording, broadcast and snapshot updates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventRoom {
    pub id: String,
    pub name: String,
    pub ready: bool,
    pub started_at: Option<DateTime<Utc>>,
    /// Set once the meeting is shutting down
    pub shutdown: bool,
    pub guest_token: String,
    #[serde(deserialize_with = "null_as_default")]
    pub options: Options,
    #[serde(deserialize_with = "null_as_default")]
    pub participants: Vec<Participant>,
    #[serde(deserialize_with = "null_as_default")]
    pub broadcasts: Vec<Broadcast>,
}

/// A participant and its online status
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Participant {
    pub id: String,
    pub room_id: String,
    pub name: String,
    pub guest: bool,
    pub online: bool,
    pub avatar: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventUser {
    pub id: String,
    pub name: String,
    pub guest: bool,
    pub avatar: String,
    pub joined_at: Option<DateTime<Utc>>,
}

/// Area on the podium assigned to a user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PodiumPosition {
    pub user_id: String,
    pub play_id: Option<String>,
    pub width: i64,
    pub height: i64,
    pub left: i64,
    pub top: i64,
    #[serde(rename = "z-index")]
    pub z_index: i64,
}

/// Live-stream broadcast
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Broadcast {
    pub id: String,
    pub platform: String,
    pub player_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub user: EventUser,
    #[serde(deserialize_with = "null_as_default")]
    pub room: EventRoom,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Links {
    #[serde(rename = "self")]
    pub self_link: Option<String>,
    pub download: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Recording {
    pub id: String,
    /// Unix timestamp (seconds)
    pub created_at: i64,
    pub duration: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub links: Links,
    #[serde(deserialize_with = "null_as_default")]
    pub user: EventUser,
    #[serde(deserialize_with = "null_as_default")]
    pub room: EventRoom,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub id: String,
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub links: Links,
    #[serde(deserialize_with = "null_as_default")]
    pub creator: EventUser,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "null_as_default")]
    pub room: EventRoom,
}

/// Media injected into the meeting
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Playback {
    pub url: String,
    pub play_id: String,
    pub audio: bool,
}

// ============================================================================
// Event payloads
// ============================================================================

/// Sent whenever any room property changes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomUpdate {
    #[serde(deserialize_with = "null_as_default")]
    pub content: EventRoom,
}

/// Sent whenever a participant joins, leaves or changes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticipantUpdate {
    #[serde(deserialize_with = "null_as_default")]
    pub participant: Participant,
}

/// Sent whenever the podium layout or participant positioning changes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PodiumUpdate {
    #[serde(deserialize_with = "null_as_default")]
    pub podium: Vec<PodiumPosition>,
}

/// Sent when a recording is started or stopped
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingUpdate {
    #[serde(deserialize_with = "null_as_default")]
    pub recording: Recording,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BroadcastUpdate {
    #[serde(deserialize_with = "null_as_default")]
    pub broadcasts: Vec<Broadcast>,
}

/// Sent whenever an option is modified or added through the REST interface
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionsUpdate {
    #[serde(deserialize_with = "null_as_default")]
    pub options: Options,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotUpdate {
    #[serde(deserialize_with = "null_as_default")]
    pub snapshots: Vec<Snapshot>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackUpdate {
    #[serde(deserialize_with = "null_as_default")]
    pub playing: Playback,
}

/// Chat message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Chat {
    pub content: String,
    #[serde(rename = "cid")]
    pub client_id: String,
    pub user_id: String,
    pub created_at: Option<DateTime<Utc>>,
}
