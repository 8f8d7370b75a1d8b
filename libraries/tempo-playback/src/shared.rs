//! Shared controller handle
//!
//! One controller per process, reachable from every screen. The mutex only
//! serializes commands; it never blocks on audio work.

use crate::controller::{PlaybackController, PlayerSnapshot};
use crossbeam_channel::Receiver;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Cloneable handle to the process-wide controller
#[derive(Clone)]
pub struct SharedController {
    inner: Arc<Mutex<PlaybackController>>,
}

impl SharedController {
    pub fn new(controller: PlaybackController) -> Self {
        Self {
            inner: Arc::new(Mutex::new(controller)),
        }
    }

    /// Run `f` with exclusive access to the controller
    ///
    /// A panic inside an earlier call does not lock everyone else out: the
    /// poisoned guard is recovered.
    pub fn with<R>(&self, f: impl FnOnce(&mut PlaybackController) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        self.lock().snapshot()
    }

    pub fn subscribe(&self) -> Receiver<PlayerSnapshot> {
        self.lock().subscribe()
    }

    /// Apply pending transport events
    pub fn process_events(&self) -> usize {
        self.lock().process_events()
    }

    fn lock(&self) -> MutexGuard<'_, PlaybackController> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for SharedController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedController").finish_non_exhaustive()
    }
}
