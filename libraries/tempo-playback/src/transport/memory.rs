//! In-memory audio backend
//!
//! Produces no sound. Loads resolve either immediately (auto-load) or when the
//! test drives them through [`InMemoryControl`], which makes superseded and
//! out-of-order completions easy to reproduce.

use super::backend::{AudioBackend, EventSink};
use super::event::LoadToken;
use crate::error::{LoadError, TransportError};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Record of one call made into the backend
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Open(LoadToken, String),
    Start(LoadToken),
    Pause(LoadToken),
    Seek(LoadToken, f64),
    SetVolume(f32),
    Release(LoadToken),
}

struct Media {
    locator: String,
    sink: EventSink,
    duration: Option<f64>,
    position: f64,
    playing: bool,
}

#[derive(Default)]
struct State {
    handles: BTreeMap<LoadToken, Media>,
    calls: Vec<BackendCall>,
    volume: f32,
    /// Duration reported on open when auto-loading
    auto_load: Option<f64>,
    durations: HashMap<String, f64>,
    unreachable: HashSet<String>,
}

fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Backend half, handed to the session
pub struct InMemoryBackend {
    state: Arc<Mutex<State>>,
}

/// Driver half, kept by the test or demo
#[derive(Clone)]
pub struct InMemoryControl {
    state: Arc<Mutex<State>>,
}

impl InMemoryBackend {
    /// Backend whose loads stay pending until resolved through the control
    pub fn new() -> (Self, InMemoryControl) {
        Self::with_state(State {
            volume: 1.0,
            ..State::default()
        })
    }

    /// Backend that reports `Loaded` as soon as a locator is opened
    ///
    /// Media reports `default_duration` unless a per-locator duration was set
    /// with [`InMemoryControl::set_duration`].
    pub fn auto_loading(default_duration: f64) -> (Self, InMemoryControl) {
        Self::with_state(State {
            volume: 1.0,
            auto_load: Some(default_duration),
            ..State::default()
        })
    }

    fn with_state(state: State) -> (Self, InMemoryControl) {
        let state = Arc::new(Mutex::new(state));
        (
            Self {
                state: Arc::clone(&state),
            },
            InMemoryControl { state },
        )
    }
}

impl AudioBackend for InMemoryBackend {
    fn open(&mut self, locator: &str, events: EventSink) -> Result<(), LoadError> {
        let mut state = lock(&self.state);
        let token = events.token();
        state
            .calls
            .push(BackendCall::Open(token, locator.to_string()));

        let mut media = Media {
            locator: locator.to_string(),
            sink: events,
            duration: None,
            position: 0.0,
            playing: false,
        };

        if state.unreachable.contains(locator) {
            media
                .sink
                .load_failed(LoadError::Unreachable(locator.to_string()));
        } else if let Some(default) = state.auto_load {
            let duration = state.durations.get(locator).copied().unwrap_or(default);
            media.duration = Some(duration);
            media.sink.loaded(duration);
        }

        state.handles.insert(token, media);
        Ok(())
    }

    fn start(&mut self, token: LoadToken) {
        let mut state = lock(&self.state);
        state.calls.push(BackendCall::Start(token));
        if let Some(media) = state.handles.get_mut(&token) {
            media.playing = true;
        }
    }

    fn pause(&mut self, token: LoadToken) {
        let mut state = lock(&self.state);
        state.calls.push(BackendCall::Pause(token));
        if let Some(media) = state.handles.get_mut(&token) {
            media.playing = false;
        }
    }

    fn seek(&mut self, token: LoadToken, position: f64) {
        let mut state = lock(&self.state);
        state.calls.push(BackendCall::Seek(token, position));
        if let Some(media) = state.handles.get_mut(&token) {
            media.position = position;
        }
    }

    fn set_volume(&mut self, volume: f32) {
        let mut state = lock(&self.state);
        state.calls.push(BackendCall::SetVolume(volume));
        state.volume = volume;
    }

    fn position(&self, token: LoadToken) -> Option<f64> {
        lock(&self.state).handles.get(&token).map(|m| m.position)
    }

    fn release(&mut self, token: LoadToken) {
        let mut state = lock(&self.state);
        state.calls.push(BackendCall::Release(token));
        state.handles.remove(&token);
    }
}

impl InMemoryControl {
    /// Report metadata for a pending load; false if `token` is not open
    pub fn resolve(&self, token: LoadToken, duration: f64) -> bool {
        let mut state = lock(&self.state);
        match state.handles.get_mut(&token) {
            Some(media) => {
                media.duration = Some(duration);
                media.sink.loaded(duration);
                true
            }
            None => false,
        }
    }

    /// Report an asynchronous open failure
    pub fn fail_load(&self, token: LoadToken, error: LoadError) -> bool {
        let state = lock(&self.state);
        match state.handles.get(&token) {
            Some(media) => {
                media.sink.load_failed(error);
                true
            }
            None => false,
        }
    }

    /// Move a playing handle forward by `seconds`
    ///
    /// Reaching the known duration stops the handle and reports `Ended`.
    pub fn advance(&self, token: LoadToken, seconds: f64) {
        let mut state = lock(&self.state);
        let Some(media) = state.handles.get_mut(&token) else {
            return;
        };
        if !media.playing {
            return;
        }

        media.position += seconds;
        if let Some(duration) = media.duration {
            if media.position >= duration {
                media.position = duration;
                media.playing = false;
                media.sink.ended();
            }
        }
    }

    /// Report end of media regardless of position
    pub fn end(&self, token: LoadToken) {
        let mut state = lock(&self.state);
        if let Some(media) = state.handles.get_mut(&token) {
            media.position = media.duration.unwrap_or(media.position);
            media.playing = false;
            media.sink.ended();
        }
    }

    /// Report a mid-playback failure
    pub fn fail(&self, token: LoadToken, error: TransportError) {
        let mut state = lock(&self.state);
        if let Some(media) = state.handles.get_mut(&token) {
            media.playing = false;
            media.sink.failed(error);
        }
    }

    /// Most recently opened handle that is still open
    pub fn latest(&self) -> Option<LoadToken> {
        lock(&self.state).handles.keys().next_back().copied()
    }

    /// Duration reported for `locator` when auto-loading
    pub fn set_duration(&self, locator: &str, seconds: f64) {
        lock(&self.state)
            .durations
            .insert(locator.to_string(), seconds);
    }

    /// Make every future open of `locator` fail as unreachable
    pub fn set_unreachable(&self, locator: &str) {
        lock(&self.state).unreachable.insert(locator.to_string());
    }

    /// Tokens of open handles, oldest first
    pub fn open_handles(&self) -> Vec<LoadToken> {
        lock(&self.state).handles.keys().copied().collect()
    }

    /// Locator opened as `token`
    pub fn locator(&self, token: LoadToken) -> Option<String> {
        lock(&self.state)
            .handles
            .get(&token)
            .map(|m| m.locator.clone())
    }

    pub fn is_playing(&self, token: LoadToken) -> bool {
        lock(&self.state)
            .handles
            .get(&token)
            .is_some_and(|m| m.playing)
    }

    pub fn position(&self, token: LoadToken) -> Option<f64> {
        lock(&self.state).handles.get(&token).map(|m| m.position)
    }

    /// Last volume applied
    pub fn volume(&self) -> f32 {
        lock(&self.state).volume
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<BackendCall> {
        lock(&self.state).calls.clone()
    }

    pub fn clear_calls(&self) {
        lock(&self.state).calls.clear();
    }
}
