use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::decoder::DecodeError;

/// Snapshot of the counters kept by an observer session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Non-empty frames read from the transport
    pub frames_received: usize,

    /// Events pushed to the consumer
    pub events_forwarded: usize,

    /// Frames that were not JSON or carried no `type`
    pub malformed_frames: usize,

    /// Frames whose `type` is not a known event
    pub unknown_event_types: usize,

    /// Frames of a known type whose payload failed to decode
    pub payload_errors: usize,
}

impl SessionStats {
    /// Total frames dropped without reaching the consumer
    pub fn dropped(&self) -> usize {
        self.malformed_frames + self.unknown_event_types + self.payload_errors
    }
}

#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    frames_received: AtomicUsize,
    events_forwarded: AtomicUsize,
    malformed_frames: AtomicUsize,
    unknown_event_types: AtomicUsize,
    payload_errors: AtomicUsize,
}

impl StatsCounters {
    pub(crate) fn frame_received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn event_forwarded(&self) {
        self.events_forwarded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn frame_dropped(&self, err: &DecodeError) {
        let counter = match err {
            DecodeError::MalformedFrame(_) => &self.malformed_frames,
            DecodeError::UnknownEventType(_) => &self.unknown_event_types,
            DecodeError::PayloadDecode { .. } => &self.payload_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> SessionStats {
        SessionStats {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            events_forwarded: self.events_forwarded.load(Ordering::Relaxed),
            malformed_frames: self.malformed_frames.load(Ordering::Relaxed),
            unknown_event_types: self.unknown_event_types.load(Ordering::Relaxed),
            payload_errors: self.payload_errors.load(Ordering::Relaxed),
        }
    }
}
