//! Platform audio primitive seam

use super::event::{LoadToken, TransportEvent, TransportEventKind};
use crate::error::{LoadError, TransportError};
use crossbeam_channel::Sender;

/// Sender half of the session's inbound event queue
///
/// Handed to the backend on every open so platform callbacks (which may fire
/// on any thread) can report back. Sends after the session is gone are
/// dropped.
#[derive(Debug, Clone)]
pub struct EventSink {
    token: LoadToken,
    tx: Sender<TransportEvent>,
}

impl EventSink {
    pub(crate) fn new(token: LoadToken, tx: Sender<TransportEvent>) -> Self {
        Self { token, tx }
    }

    /// Token of the handle this sink reports for
    pub fn token(&self) -> LoadToken {
        self.token
    }

    /// Metadata resolved
    pub fn loaded(&self, duration: f64) {
        self.send(TransportEventKind::Loaded { duration });
    }

    /// Open failed
    pub fn load_failed(&self, error: LoadError) {
        self.send(TransportEventKind::LoadFailed(error));
    }

    /// Position report
    pub fn position(&self, position: f64) {
        self.send(TransportEventKind::PositionTick { position });
    }

    /// End of media
    pub fn ended(&self) {
        self.send(TransportEventKind::Ended);
    }

    /// Mid-playback failure
    pub fn failed(&self, error: TransportError) {
        self.send(TransportEventKind::Failed(error));
    }

    fn send(&self, kind: TransportEventKind) {
        // Receiver gone means the session was torn down; nothing to report to
        self.tx.send(TransportEvent::new(self.token, kind)).ok();
    }
}

/// Platform audio primitive
///
/// Implementations wrap whatever the platform offers (media player, audio
/// element, native bridge). The session guarantees at most one open handle:
/// `release` is always called for the previous token before `open`.
///
/// `open` starts an asynchronous load and returns immediately. Completion is
/// reported through `events` (`loaded` or `load_failed`). Returning `Err`
/// means the request was refused outright.
pub trait AudioBackend: Send {
    /// Begin opening `locator` as handle `events.token()`
    fn open(&mut self, locator: &str, events: EventSink) -> Result<(), LoadError>;

    /// Start or resume output for `token`
    fn start(&mut self, token: LoadToken);

    /// Pause output for `token`
    fn pause(&mut self, token: LoadToken);

    /// Seek `token` to `position` seconds (already clamped)
    fn seek(&mut self, token: LoadToken, position: f64);

    /// Output volume in `[0, 1]`
    fn set_volume(&mut self, volume: f32);

    /// Current position of `token` in seconds, if known
    fn position(&self, token: LoadToken) -> Option<f64>;

    /// Release `token`; must tolerate unknown tokens
    fn release(&mut self, token: LoadToken);
}
