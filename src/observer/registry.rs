use super::events::{
    BroadcastUpdate, Chat, Event, EventKind, OptionsUpdate, ParticipantUpdate, PlaybackUpdate,
    PodiumUpdate, RecordingUpdate, RoomUpdate, SnapshotUpdate,
};

/// Decodes a full frame into the payload of one event kind
pub type DecodeFn = fn(&[u8]) -> serde_json::Result<Event>;

/// Maps a wire discriminator to its event kind and payload decoder
#[derive(Clone, Copy)]
pub struct RegistryEntry {
    pub discriminator: &'static str,
    pub kind: EventKind,
    pub decode: DecodeFn,
}

impl std::fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("discriminator", &self.discriminator)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Every event type the observer understands
pub static REGISTRY: [RegistryEntry; 9] = [
    RegistryEntry {
        discriminator: "room_update",
        kind: EventKind::RoomUpdate,
        decode: |raw| serde_json::from_slice::<RoomUpdate>(raw).map(Event::RoomUpdate),
    },
    RegistryEntry {
        discriminator: "participant_update",
        kind: EventKind::ParticipantUpdate,
        decode: |raw| serde_json::from_slice::<ParticipantUpdate>(raw).map(Event::ParticipantUpdate),
    },
    RegistryEntry {
        discriminator: "podium_update",
        kind: EventKind::PodiumUpdate,
        decode: |raw| serde_json::from_slice::<PodiumUpdate>(raw).map(Event::PodiumUpdate),
    },
    RegistryEntry {
        discriminator: "recording_update",
        kind: EventKind::RecordingUpdate,
        decode: |raw| serde_json::from_slice::<RecordingUpdate>(raw).map(Event::RecordingUpdate),
    },
    RegistryEntry {
        discriminator: "broadcasts_update",
        kind: EventKind::BroadcastUpdate,
        decode: |raw| serde_json::from_slice::<BroadcastUpdate>(raw).map(Event::BroadcastUpdate),
    },
    RegistryEntry {
        discriminator: "options_update",
        kind: EventKind::OptionsUpdate,
        decode: |raw| serde_json::from_slice::<OptionsUpdate>(raw).map(Event::OptionsUpdate),
    },
    RegistryEntry {
        discriminator: "snapshots_update",
        kind: EventKind::SnapshotUpdate,
        decode: |raw| serde_json::from_slice::<SnapshotUpdate>(raw).map(Event::SnapshotUpdate),
    },
    RegistryEntry {
        discriminator: "playback_update",
        kind: EventKind::PlaybackUpdate,
        decode: |raw| serde_json::from_slice::<PlaybackUpdate>(raw).map(Event::PlaybackUpdate),
    },
    RegistryEntry {
        discriminator: "chat",
        kind: EventKind::Chat,
        decode: |raw| serde_json::from_slice::<Chat>(raw).map(Event::Chat),
    },
];

/// Find the registry entry for a discriminator
pub fn lookup(discriminator: &str) -> Option<&'static RegistryEntry> {
    REGISTRY
        .iter()
        .find(|entry| entry.discriminator == discriminator)
}

impl EventKind {
    pub fn from_discriminator(discriminator: &str) -> Option<Self> {
        lookup(discriminator).map(|entry| entry.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_matches_kind_names() {
        for entry in REGISTRY.iter() {
            assert_eq!(entry.discriminator, entry.kind.as_str());
        }
    }

    #[test]
    fn test_lookup_known() {
        let entry = lookup("broadcasts_update").expect("known type");
        assert_eq!(entry.kind, EventKind::BroadcastUpdate);
        assert_eq!(EventKind::from_discriminator("chat"), Some(EventKind::Chat));
    }

    #[test]
    fn test_lookup_unknown() {
        assert!(lookup("broadcast_update").is_none()); // wire name is plural
        assert!(lookup("").is_none());
        assert!(lookup("CHAT").is_none());
    }
}
