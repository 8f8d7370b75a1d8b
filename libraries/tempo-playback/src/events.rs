//! Playback events
//!
//! Discrete deltas for hosts that prefer events over full snapshots.
//! Events are queued as the controller changes state and handed out by
//! [`PlaybackController::drain_events`](crate::PlaybackController::drain_events).

use crate::types::{PlaybackStatus, RepeatMode};
use serde::{Deserialize, Serialize};

/// Events emitted by the playback controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlaybackEvent {
    /// Status changed (loading, playing, paused, ...)
    StateChanged {
        /// The new status
        status: PlaybackStatus,
    },

    /// A different track became current
    TrackChanged {
        /// ID of the new current track, `None` once playback stopped
        track_id: Option<String>,
        /// ID of the previous track
        previous_track_id: Option<String>,
    },

    /// Periodic position report
    PositionUpdate {
        /// Seconds into the track
        position: f64,
        /// Track duration in seconds, once known
        duration: Option<f64>,
    },

    /// Volume changed
    VolumeChanged {
        /// Applied level in `[0, 1]`
        volume: f32,
    },

    /// Tracks added or queue cleared
    QueueChanged {
        /// New queue length
        length: usize,
    },

    ShuffleChanged {
        enabled: bool,
    },

    RepeatChanged {
        mode: RepeatMode,
    },

    /// Load or playback failure
    Error {
        /// Human-readable reason
        message: String,
    },
}
