//! Core types for playback management

use crate::error::PolicyNoOp;
use serde::{Deserialize, Serialize};

/// Repeat mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Stop when queue ends
    #[default]
    Off,

    /// Loop entire queue
    All,

    /// Loop current track only
    One,
}

impl RepeatMode {
    /// Next mode in the off → all → one → off cycle
    pub fn cycle(self) -> Self {
        match self {
            RepeatMode::Off => RepeatMode::All,
            RepeatMode::All => RepeatMode::One,
            RepeatMode::One => RepeatMode::Off,
        }
    }
}

/// Controller state machine status
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PlaybackStatus {
    /// No current track
    #[default]
    Idle,

    /// A load is in flight
    Loading,

    /// Audio is playing
    Playing,

    /// Paused mid-track
    Paused,

    /// Track reached its end, advance decision pending
    Ended,

    /// Load or playback failed; waits for an explicit retry or skip
    Error {
        /// Human-readable failure reason
        reason: String,
    },
}

impl PlaybackStatus {
    /// Whether the status is `Error`
    pub fn is_error(&self) -> bool {
        matches!(self, PlaybackStatus::Error { .. })
    }

    /// Short lowercase label, used in logs
    pub fn label(&self) -> &'static str {
        match self {
            PlaybackStatus::Idle => "idle",
            PlaybackStatus::Loading => "loading",
            PlaybackStatus::Playing => "playing",
            PlaybackStatus::Paused => "paused",
            PlaybackStatus::Ended => "ended",
            PlaybackStatus::Error { .. } => "error",
        }
    }
}

/// Result of a controller command
///
/// Commands never fail; they are either applied or ignored with a reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum CommandOutcome {
    /// State changed (or an async transition was started)
    Applied,

    /// Silently ignored under the playback policy
    Ignored(PolicyNoOp),
}

impl CommandOutcome {
    /// Whether the command was applied
    pub fn is_applied(self) -> bool {
        matches!(self, CommandOutcome::Applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeat_cycles_off_all_one() {
        let mode = RepeatMode::Off;
        assert_eq!(mode.cycle(), RepeatMode::All);
        assert_eq!(mode.cycle().cycle(), RepeatMode::One);
        assert_eq!(mode.cycle().cycle().cycle(), RepeatMode::Off);
    }

    #[test]
    fn repeat_mode_serializes_lowercase() {
        let json = serde_json::to_string(&RepeatMode::All).unwrap();
        assert_eq!(json, "\"all\"");
        let mode: RepeatMode = serde_json::from_str("\"one\"").unwrap();
        assert_eq!(mode, RepeatMode::One);
    }

    #[test]
    fn error_status_carries_reason() {
        let status = PlaybackStatus::Error {
            reason: "Media unreachable: 404".to_string(),
        };
        assert!(status.is_error());
        assert_eq!(status.label(), "error");
        assert!(!PlaybackStatus::Playing.is_error());
    }
}
