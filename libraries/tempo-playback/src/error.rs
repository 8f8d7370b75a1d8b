//! Error types for playback management

use thiserror::Error;

/// Media could not be opened
///
/// Surfaced once per load; the controller never retries on its own.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// Locator is not a parseable URI
    #[error("Invalid media locator: {0}")]
    InvalidLocator(String),

    /// Scheme is not in the configured allow-list
    #[error("Unsupported locator scheme: {0}")]
    UnsupportedScheme(String),

    /// Media could not be reached (network, missing file)
    #[error("Media unreachable: {0}")]
    Unreachable(String),

    /// Media was reached but the platform cannot play it
    #[error("Unsupported media: {0}")]
    Unsupported(String),
}

/// Failure reported by the platform after playback started
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Decoder gave up mid-stream
    #[error("Decode error: {0}")]
    Decode(String),

    /// Stream dropped mid-playback
    #[error("Network error: {0}")]
    Network(String),

    /// Any other platform failure
    #[error("Audio backend error: {0}")]
    Backend(String),
}

/// A backend record could not be turned into a track descriptor
#[derive(Debug, Error)]
pub enum TrackError {
    /// Required field absent or blank
    #[error("Track record is missing required field `{0}`")]
    MissingField(&'static str),

    /// Record is not shaped like a track at all
    #[error("Malformed track record: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Source could not be read or deserialized
    #[error("Failed to load playback config: {0}")]
    Load(#[from] config::ConfigError),

    /// Value out of range
    #[error("Invalid playback config: {0}")]
    Invalid(String),
}

/// Why a command was ignored
///
/// Ignored commands are not failures. They are reported so hosts can tell a
/// no-op apart from an applied change without wrapping calls in error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PolicyNoOp {
    /// No media handle is loaded
    #[error("nothing is loaded")]
    NothingLoaded,

    /// Command only applies while playing
    #[error("not playing")]
    NotPlaying,

    /// Command only applies while paused
    #[error("not paused")]
    NotPaused,

    /// Track id already queued
    #[error("track already queued")]
    DuplicateTrack,

    /// Patch targets a track that is no longer current
    #[error("update targets a track that is no longer current")]
    StaleUpdate,

    /// Same track is already loading
    #[error("track is already loading")]
    AlreadyLoading,

    /// There is no current track
    #[error("no current track")]
    NoCurrentTrack,

    /// Queue has nothing left under the active policy
    #[error("queue exhausted")]
    QueueExhausted,

    /// Value already set
    #[error("value unchanged")]
    Unchanged,

    /// Track lacks an id or media locator
    #[error("track is missing an id or media locator")]
    InvalidTrack,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_error_messages_are_human_readable() {
        let err = LoadError::UnsupportedScheme("ftp".to_string());
        assert_eq!(err.to_string(), "Unsupported locator scheme: ftp");

        let err = TransportError::Network("connection reset".to_string());
        assert_eq!(err.to_string(), "Network error: connection reset");
    }

    #[test]
    fn missing_field_names_the_field() {
        let err = TrackError::MissingField("media_url");
        assert!(err.to_string().contains("media_url"));
    }
}
