//! Tempo - Playback Management
//!
//! Playback core of the Tempo mobile app: one controller that every screen
//! talks to for starting, pausing, seeking and sequencing tracks.
//!
//! This crate provides:
//! - One canonical track descriptor with normalization of backend records
//! - Duplicate-free queue with cursor, shuffle permutation and repeat policy
//! - Transport session owning at most one media handle
//! - Load supersession: only the most recent load may start playing
//! - Snapshot subscriptions and discrete playback events for the UI
//!
//! # Architecture
//!
//! `tempo-playback` does not produce sound itself. The platform audio
//! primitive is plugged in through the [`AudioBackend`] trait; completions
//! come back over a channel and are applied when the host calls
//! [`PlaybackController::process_events`] or [`PlaybackController::tick`].
//! [`InMemoryBackend`] stands in for the platform in tests and headless runs.
//!
//! # Example: Basic Playback
//!
//! ```rust
//! use tempo_playback::{
//!     InMemoryBackend, PlaybackConfig, PlaybackController, PlaybackStatus, TrackDescriptor,
//! };
//!
//! let (backend, _control) = InMemoryBackend::auto_loading(180.0);
//! let mut controller =
//!     PlaybackController::init(PlaybackConfig::default(), Box::new(backend)).unwrap();
//!
//! let track = TrackDescriptor::new("t1", "Night Drive", "https://cdn.example.com/t1.mp3");
//! assert!(controller.play(track).is_applied());
//! assert_eq!(controller.status(), &PlaybackStatus::Loading);
//!
//! // Platform reported the media as loaded
//! controller.process_events();
//! assert!(controller.is_playing());
//!
//! // Out-of-range seeks are clamped
//! assert!(controller.seek_to(9999.0).is_applied());
//! assert_eq!(controller.position(), 180.0);
//! ```
//!
//! # Example: Shuffle and Repeat
//!
//! ```rust
//! use tempo_playback::{InMemoryBackend, PlaybackConfig, PlaybackController, RepeatMode};
//!
//! let (backend, _control) = InMemoryBackend::new();
//! let mut controller =
//!     PlaybackController::init(PlaybackConfig::default(), Box::new(backend)).unwrap();
//!
//! assert!(controller.toggle_shuffle().is_applied());
//! assert!(controller.set_repeat(RepeatMode::All).is_applied());
//! assert!(controller.snapshot().is_shuffled);
//! ```
//!
//! # Example: Backend Records
//!
//! ```rust
//! use tempo_playback::RawTrack;
//!
//! let json = r#"[{"track_id": 42, "name": "Tide", "audio_url": "https://cdn.example.com/42.mp3"}]"#;
//! let tracks: Vec<_> = RawTrack::list_from_str(json)
//!     .unwrap()
//!     .into_iter()
//!     .filter_map(|raw| raw.normalize().ok())
//!     .collect();
//!
//! assert_eq!(tracks[0].id, "42");
//! assert_eq!(tracks[0].title, "Tide");
//! ```

pub mod config;
mod controller;
mod error;
mod events;
mod queue;
mod shared;
mod shuffle;
mod track;
pub mod transport;
pub mod types;

// Public exports
pub use crate::config::PlaybackConfig;
pub use controller::{PlaybackController, PlayerSnapshot};
pub use error::{ConfigError, LoadError, PolicyNoOp, TrackError, TransportError};
pub use events::PlaybackEvent;
pub use queue::Queue;
pub use shared::SharedController;
pub use track::{Creator, RawTrack, TrackDescriptor, TrackPatch};
pub use transport::{
    AudioBackend, BackendCall, EventSink, InMemoryBackend, InMemoryControl, LoadToken,
    TransportEvent, TransportEventKind, TransportSession,
};
pub use types::{CommandOutcome, PlaybackStatus, RepeatMode};
