//! Events reported by the audio backend

use crate::error::{LoadError, TransportError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one load request and the handle it produced
///
/// Tokens are issued in strictly increasing order by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LoadToken(pub u64);

impl fmt::Display for LoadToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Raw event from the transport, delivered in issue order
#[derive(Debug, Clone, PartialEq)]
pub struct TransportEvent {
    /// Load the event belongs to
    pub token: LoadToken,

    /// What happened
    pub kind: TransportEventKind,
}

/// Transport event payloads
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEventKind {
    /// Metadata resolved, media ready to play
    Loaded {
        /// Authoritative duration in seconds
        duration: f64,
    },

    /// Asynchronous open failed
    LoadFailed(LoadError),

    /// Periodic position report while playing
    PositionTick {
        /// Position in seconds
        position: f64,
    },

    /// Playback reached the end of the media
    Ended,

    /// Decode or network failure after playback started
    Failed(TransportError),
}

impl TransportEvent {
    /// Build an event for `token`
    pub fn new(token: LoadToken, kind: TransportEventKind) -> Self {
        Self { token, kind }
    }
}
