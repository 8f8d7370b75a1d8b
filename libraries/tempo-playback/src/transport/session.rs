//! Transport session
//!
//! Owns exactly one media handle at a time and translates controller intents
//! into backend calls. Out-of-range requests are clamped, never rejected.

use super::backend::{AudioBackend, EventSink};
use super::event::{LoadToken, TransportEvent, TransportEventKind};
use super::ticker::TickScheduler;
use crate::error::LoadError;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use url::Url;

/// State of the single handle
#[derive(Debug, Clone, Copy)]
struct Handle {
    token: LoadToken,
    /// `None` until the backend reports metadata
    duration: Option<f64>,
    /// Seek requested before the duration was known
    early_seek: Option<f64>,
    ready: bool,
    playing: bool,
}

/// Adapter around the platform audio primitive
pub struct TransportSession {
    backend: Box<dyn AudioBackend>,
    handle: Option<Handle>,
    volume: f32,
    allowed_schemes: Vec<String>,
    ticker: TickScheduler,
    tx: Sender<TransportEvent>,
    rx: Receiver<TransportEvent>,
}

impl TransportSession {
    /// Wrap `backend`
    ///
    /// Locators whose scheme is not in `allowed_schemes` are refused at load.
    pub fn new(
        backend: Box<dyn AudioBackend>,
        allowed_schemes: Vec<String>,
        tick_interval: Duration,
    ) -> Self {
        let (tx, rx) = unbounded();
        Self {
            backend,
            handle: None,
            volume: 1.0,
            allowed_schemes,
            ticker: TickScheduler::new(tick_interval),
            tx,
            rx,
        }
    }

    /// Open `locator` as handle `token`
    ///
    /// Releases the previous handle first, even if the new locator is then
    /// refused: a failed load leaves nothing loaded.
    pub fn load(&mut self, locator: &str, token: LoadToken) -> Result<LoadToken, LoadError> {
        self.dispose();

        let url = Url::parse(locator)
            .map_err(|e| LoadError::InvalidLocator(format!("{}: {}", locator, e)))?;
        if !self
            .allowed_schemes
            .iter()
            .any(|s| s.eq_ignore_ascii_case(url.scheme()))
        {
            return Err(LoadError::UnsupportedScheme(url.scheme().to_string()));
        }

        self.backend
            .open(locator, EventSink::new(token, self.tx.clone()))?;
        self.backend.set_volume(self.volume);

        self.handle = Some(Handle {
            token,
            duration: None,
            early_seek: None,
            ready: false,
            playing: false,
        });
        self.ticker.reset();
        debug!(%token, locator, "Opening media");
        Ok(token)
    }

    /// Start or resume output; no-op unless a handle is ready
    pub fn play(&mut self) -> bool {
        match self.handle.as_mut() {
            Some(handle) if handle.ready => {
                self.backend.start(handle.token);
                handle.playing = true;
                self.ticker.reset();
                true
            }
            _ => false,
        }
    }

    /// Pause output; no-op unless a handle is playing
    pub fn pause(&mut self) -> bool {
        match self.handle.as_mut() {
            Some(handle) if handle.ready && handle.playing => {
                self.backend.pause(handle.token);
                handle.playing = false;
                true
            }
            _ => false,
        }
    }

    /// Seek to `position` seconds, clamped to `[0, duration]`
    ///
    /// Returns the clamped position, or `None` with nothing loaded. Before the
    /// duration is known only the lower bound applies; the upper bound is
    /// enforced on the backend once metadata arrives.
    pub fn seek(&mut self, position: f64) -> Option<f64> {
        let handle = self.handle.as_mut()?;
        let clamped = clamp_position(position, handle.duration);
        if handle.duration.is_none() {
            handle.early_seek = Some(clamped);
        }
        self.backend.seek(handle.token, clamped);
        self.ticker.reset();
        Some(clamped)
    }

    /// Set output volume, clamped to `[0, 1]`; returns the applied value
    ///
    /// Remembered and re-applied to every newly opened handle.
    pub fn set_volume(&mut self, volume: f32) -> f32 {
        if volume.is_nan() {
            return self.volume;
        }
        self.volume = volume.clamp(0.0, 1.0);
        self.backend.set_volume(self.volume);
        self.volume
    }

    /// Release the handle; safe to call with nothing loaded
    pub fn dispose(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.backend.release(handle.token);
            debug!(token = %handle.token, "Released media handle");
        }
    }

    /// Emit a position tick if one is due at `now`
    ///
    /// Ticks only flow while the handle is playing.
    pub fn poll_tick(&mut self, now: Instant) {
        let Some(handle) = self.handle else {
            return;
        };
        if !(handle.ready && handle.playing) || !self.ticker.due(now) {
            return;
        }
        if let Some(position) = self.backend.position(handle.token) {
            let position = clamp_position(position, handle.duration);
            EventSink::new(handle.token, self.tx.clone()).position(position);
        }
    }

    /// Take every pending event, in the order it was emitted
    ///
    /// Handle bookkeeping (duration, end, failure) is applied here for events
    /// of the live handle; events of released handles pass through untouched
    /// so the caller can log and drop them.
    pub fn drain_events(&mut self) -> Vec<TransportEvent> {
        let events: Vec<TransportEvent> = self.rx.try_iter().collect();
        for event in &events {
            self.observe(event);
        }
        events
    }

    fn observe(&mut self, event: &TransportEvent) {
        let Some(handle) = self.handle.as_mut() else {
            return;
        };
        if handle.token != event.token {
            return;
        }

        match &event.kind {
            // Metadata is reported once per handle; repeats are ignored
            TransportEventKind::Loaded { .. } if handle.ready => {}
            TransportEventKind::Loaded { duration } => {
                let duration = duration.max(0.0);
                handle.ready = true;
                handle.duration = Some(duration);
                if handle.early_seek.take().is_some_and(|p| p > duration) {
                    self.backend.seek(handle.token, duration);
                }
            }
            TransportEventKind::Ended => {
                handle.playing = false;
            }
            TransportEventKind::LoadFailed(error) => {
                warn!(token = %event.token, %error, "Media failed to load");
                self.dispose();
            }
            TransportEventKind::Failed(error) => {
                warn!(token = %event.token, %error, "Playback failed");
                self.dispose();
            }
            TransportEventKind::PositionTick { .. } => {}
        }
    }

    /// Token of the live handle
    pub fn loaded_token(&self) -> Option<LoadToken> {
        self.handle.map(|h| h.token)
    }

    /// Whether a handle is open and its metadata resolved
    pub fn is_ready(&self) -> bool {
        self.handle.is_some_and(|h| h.ready)
    }

    /// Whether output is running
    pub fn is_playing(&self) -> bool {
        self.handle.is_some_and(|h| h.playing)
    }

    /// Duration of the live handle, once known
    pub fn duration(&self) -> Option<f64> {
        self.handle.and_then(|h| h.duration)
    }

    /// Applied volume
    pub fn volume(&self) -> f32 {
        self.volume
    }
}

impl Drop for TransportSession {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn clamp_position(position: f64, duration: Option<f64>) -> f64 {
    let position = if position.is_nan() { 0.0 } else { position.max(0.0) };
    match duration {
        Some(duration) => position.min(duration),
        None => position,
    }
}
