//! Playback controller - core orchestration
//!
//! Composes the transport session and the queue into one state machine:
//!
//! ```text
//! Idle ──play──> Loading ──Loaded──> Playing <──pause/resume──> Paused
//!                   │                   │
//!                   │ LoadFailed        ├── Ended ──> next track / Idle
//!                   v                   v
//!                 Error <──────────── Failed
//! ```
//!
//! Commands run on the caller's thread and never fail; they return
//! [`CommandOutcome`]. Transport completions are applied when the host calls
//! [`PlaybackController::process_events`] or [`PlaybackController::tick`].
//! Completions of superseded loads are dropped there.

use crate::config::PlaybackConfig;
use crate::error::{ConfigError, PolicyNoOp};
use crate::events::PlaybackEvent;
use crate::queue::Queue;
use crate::track::{TrackDescriptor, TrackPatch};
use crate::transport::{AudioBackend, LoadToken, TransportEventKind, TransportSession};
use crate::types::{CommandOutcome, PlaybackStatus, RepeatMode};
use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Everything a screen needs to render the player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub current_track: Option<TrackDescriptor>,

    /// Artwork of the current track, or the placeholder
    pub artwork_url: Option<String>,

    pub status: PlaybackStatus,
    pub is_playing: bool,

    /// Seconds into the current track
    pub position: f64,

    /// Authoritative duration, once the media reported it
    pub duration: Option<f64>,

    pub volume: f32,
    pub is_shuffled: bool,
    pub repeat_mode: RepeatMode,

    /// Queue in canonical order
    pub queue: Vec<TrackDescriptor>,

    /// Tracks after the cursor in effective play order
    pub upcoming: Vec<TrackDescriptor>,
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Next,
    Previous,
}

/// Process-wide playback controller
///
/// Sole owner of the transport session. Create one with
/// [`PlaybackController::init`] and share it through
/// [`SharedController`](crate::SharedController) when several call-sites
/// need it.
pub struct PlaybackController {
    config: PlaybackConfig,
    session: TransportSession,
    queue: Queue,

    current_track: Option<TrackDescriptor>,
    status: PlaybackStatus,
    position: f64,
    duration: Option<f64>,
    volume: f32,
    shuffled: bool,
    repeat: RepeatMode,

    // Last issued token; `None` once the load it belongs to is finished with
    next_token: u64,
    latest_token: Option<LoadToken>,

    // Event queue for hosts that consume deltas
    pending_events: Vec<PlaybackEvent>,

    subscribers: Vec<Sender<PlayerSnapshot>>,
}

impl PlaybackController {
    /// Create a controller on top of `backend`
    pub fn init(
        config: PlaybackConfig,
        backend: Box<dyn AudioBackend>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut session = TransportSession::new(
            backend,
            config.allowed_schemes.clone(),
            config.tick_interval(),
        );
        let volume = session.set_volume(config.volume);

        let mut queue = Queue::new(config.shuffle_seed);
        queue.set_shuffled(config.shuffle);

        info!(
            volume,
            shuffle = config.shuffle,
            repeat = ?config.repeat,
            "Playback controller initialized"
        );

        Ok(Self {
            shuffled: config.shuffle,
            repeat: config.repeat,
            config,
            session,
            queue,
            current_track: None,
            status: PlaybackStatus::Idle,
            position: 0.0,
            duration: None,
            volume,
            next_token: 0,
            latest_token: None,
            pending_events: Vec::new(),
            subscribers: Vec::new(),
        })
    }

    // ===== Playback Control =====

    /// Play `track`
    ///
    /// The track is queued if absent and the cursor moves to it. Asking for
    /// the current track resumes it when paused, restarts it after an end or
    /// error, and is ignored while it is playing or loading.
    pub fn play(&mut self, track: TrackDescriptor) -> CommandOutcome {
        let track = match track.normalized() {
            Ok(track) => track,
            Err(e) => {
                warn!(error = %e, "Refusing to play unusable track");
                return self.commit(CommandOutcome::Ignored(PolicyNoOp::InvalidTrack));
            }
        };

        let outcome = if self.is_current(&track.id) {
            match self.status {
                PlaybackStatus::Playing => CommandOutcome::Ignored(PolicyNoOp::Unchanged),
                PlaybackStatus::Paused => self.resume_current(),
                _ => self.restart_current(),
            }
        } else {
            if self.queue.select(track.clone()) {
                self.emit_queue_changed();
            }
            self.start_load(track)
        };
        self.commit(outcome)
    }

    /// Pause playback
    pub fn pause(&mut self) -> CommandOutcome {
        let outcome = match self.status {
            PlaybackStatus::Playing => {
                self.session.pause();
                self.set_status(PlaybackStatus::Paused);
                CommandOutcome::Applied
            }
            _ if self.current_track.is_none() => {
                CommandOutcome::Ignored(PolicyNoOp::NothingLoaded)
            }
            _ => CommandOutcome::Ignored(PolicyNoOp::NotPlaying),
        };
        self.commit(outcome)
    }

    /// Resume paused playback
    pub fn resume(&mut self) -> CommandOutcome {
        let outcome = self.resume_current();
        self.commit(outcome)
    }

    /// Skip to the next track under the active shuffle and repeat policy
    ///
    /// With nothing current the track under the queue cursor is started.
    /// Running off the end of the queue stops playback.
    pub fn play_next(&mut self) -> CommandOutcome {
        let outcome = self.step(Step::Next);
        self.commit(outcome)
    }

    /// Go back to the previous track; mirror of [`PlaybackController::play_next`]
    pub fn play_previous(&mut self) -> CommandOutcome {
        let outcome = self.step(Step::Previous);
        self.commit(outcome)
    }

    /// Seek to `position` seconds, clamped to the track bounds
    pub fn seek_to(&mut self, position: f64) -> CommandOutcome {
        let outcome = match self.session.seek(position) {
            Some(clamped) => {
                self.position = clamped;
                self.emit_position();
                CommandOutcome::Applied
            }
            None => CommandOutcome::Ignored(PolicyNoOp::NothingLoaded),
        };
        self.commit(outcome)
    }

    /// Stop playback and drop the current track; the queue is kept
    pub fn stop(&mut self) -> CommandOutcome {
        let outcome = if self.current_track.is_none() {
            CommandOutcome::Ignored(PolicyNoOp::NothingLoaded)
        } else {
            self.stop_current();
            CommandOutcome::Applied
        };
        self.commit(outcome)
    }

    // ===== Volume, Shuffle, Repeat =====

    /// Set volume, clamped to `[0, 1]`
    pub fn set_volume(&mut self, volume: f32) -> CommandOutcome {
        let applied = self.session.set_volume(volume);
        let outcome = if applied == self.volume {
            CommandOutcome::Ignored(PolicyNoOp::Unchanged)
        } else {
            self.volume = applied;
            self.pending_events
                .push(PlaybackEvent::VolumeChanged { volume: applied });
            CommandOutcome::Applied
        };
        self.commit(outcome)
    }

    pub fn toggle_shuffle(&mut self) -> CommandOutcome {
        self.set_shuffle(!self.shuffled)
    }

    /// Enable or disable shuffle
    ///
    /// Enabling keeps the current track and shuffles what follows it.
    /// Disabling restores the order tracks were queued in.
    pub fn set_shuffle(&mut self, enabled: bool) -> CommandOutcome {
        let outcome = if enabled == self.shuffled {
            CommandOutcome::Ignored(PolicyNoOp::Unchanged)
        } else {
            self.shuffled = enabled;
            self.queue.set_shuffled(enabled);
            self.pending_events
                .push(PlaybackEvent::ShuffleChanged { enabled });
            CommandOutcome::Applied
        };
        self.commit(outcome)
    }

    /// Cycle repeat mode: off, all, one
    pub fn toggle_repeat(&mut self) -> CommandOutcome {
        self.set_repeat(self.repeat.cycle())
    }

    pub fn set_repeat(&mut self, mode: RepeatMode) -> CommandOutcome {
        let outcome = if mode == self.repeat {
            CommandOutcome::Ignored(PolicyNoOp::Unchanged)
        } else {
            self.repeat = mode;
            self.pending_events.push(PlaybackEvent::RepeatChanged { mode });
            CommandOutcome::Applied
        };
        self.commit(outcome)
    }

    // ===== Queue Management =====

    /// Append `track` unless it is already queued
    pub fn add_to_queue(&mut self, track: TrackDescriptor) -> CommandOutcome {
        let outcome = match track.normalized() {
            Ok(track) => {
                let id = track.id.clone();
                if self.queue.insert_if_absent(track) {
                    debug!(track_id = %id, "Queued track");
                    self.emit_queue_changed();
                    CommandOutcome::Applied
                } else {
                    CommandOutcome::Ignored(PolicyNoOp::DuplicateTrack)
                }
            }
            Err(e) => {
                warn!(error = %e, "Refusing to queue unusable track");
                CommandOutcome::Ignored(PolicyNoOp::InvalidTrack)
            }
        };
        self.commit(outcome)
    }

    /// Empty the queue; the current track keeps playing
    pub fn clear_queue(&mut self) -> CommandOutcome {
        let outcome = if self.queue.is_empty() {
            CommandOutcome::Ignored(PolicyNoOp::Unchanged)
        } else {
            self.queue.clear();
            self.emit_queue_changed();
            CommandOutcome::Applied
        };
        self.commit(outcome)
    }

    /// Merge fresh metadata into the current track
    ///
    /// Ignored unless `patch.id` is the track playing right now, so late
    /// responses for a previous track are harmless.
    pub fn update_current_track(&mut self, patch: TrackPatch) -> CommandOutcome {
        let outcome = match self.current_track.as_mut() {
            Some(current) if current.id == patch.id => {
                current.apply(&patch);
                self.queue.update_track(&patch);
                CommandOutcome::Applied
            }
            Some(current) => {
                debug!(
                    patch_id = %patch.id,
                    current_id = %current.id,
                    "Dropping stale track update"
                );
                CommandOutcome::Ignored(PolicyNoOp::StaleUpdate)
            }
            None => CommandOutcome::Ignored(PolicyNoOp::NoCurrentTrack),
        };
        self.commit(outcome)
    }

    // ===== Transport Events =====

    /// Apply every pending transport event
    ///
    /// Returns the number of events applied; events of superseded loads are
    /// discarded and not counted.
    pub fn process_events(&mut self) -> usize {
        let mut applied = 0;

        // Applying an event can start a new load whose completion is already
        // queued (synchronous backends), so drain until quiet
        loop {
            let events = self.session.drain_events();
            if events.is_empty() {
                break;
            }

            for event in events {
                if self.latest_token != Some(event.token) {
                    debug!(
                        token = %event.token,
                        latest = ?self.latest_token,
                        "Discarding event of superseded load"
                    );
                    continue;
                }
                self.apply_transport_event(event.kind);
                applied += 1;
            }
        }

        if applied > 0 {
            self.publish();
        }
        applied
    }

    /// Drive position ticks, then apply pending events
    ///
    /// Hosts call this from their frame or timer loop.
    pub fn tick(&mut self, now: Instant) -> usize {
        self.session.poll_tick(now);
        self.process_events()
    }

    fn apply_transport_event(&mut self, kind: TransportEventKind) {
        match kind {
            TransportEventKind::Loaded { duration } => {
                if self.status != PlaybackStatus::Loading {
                    return;
                }
                let duration = duration.max(0.0);
                self.duration = Some(duration);
                self.position = self.position.min(duration);
                self.session.play();
                self.set_status(PlaybackStatus::Playing);
                self.emit_position();
            }
            TransportEventKind::LoadFailed(error) => self.fail(error.to_string()),
            TransportEventKind::PositionTick { position } => {
                if self.status != PlaybackStatus::Playing {
                    return;
                }
                self.position = match self.duration {
                    Some(duration) => position.min(duration),
                    None => position,
                };
                self.emit_position();
            }
            TransportEventKind::Ended => {
                if let Some(duration) = self.duration {
                    self.position = duration;
                }
                self.set_status(PlaybackStatus::Ended);
                if let CommandOutcome::Ignored(reason) = self.step(Step::Next) {
                    debug!(%reason, "Auto-advance skipped");
                }
            }
            TransportEventKind::Failed(error) => self.fail(error.to_string()),
        }
    }

    // ===== State Queries =====

    /// Current state as one value
    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            current_track: self.current_track.clone(),
            artwork_url: self
                .current_track
                .as_ref()
                .map(|t| t.artwork_or(&self.config.placeholder_artwork).to_string()),
            status: self.status.clone(),
            is_playing: self.status == PlaybackStatus::Playing,
            position: self.position,
            duration: self.duration,
            volume: self.volume,
            is_shuffled: self.shuffled,
            repeat_mode: self.repeat,
            queue: self.queue.tracks().to_vec(),
            upcoming: self
                .queue
                .upcoming(self.shuffled)
                .into_iter()
                .cloned()
                .collect(),
        }
    }

    /// Receive a fresh snapshot after every applied command or event
    ///
    /// The current snapshot is delivered immediately. Dropping the receiver
    /// unsubscribes.
    pub fn subscribe(&mut self) -> Receiver<PlayerSnapshot> {
        let (tx, rx) = unbounded();
        // Receiver is alive right here
        tx.send(self.snapshot()).ok();
        self.subscribers.push(tx);
        rx
    }

    /// Take queued playback events
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn has_pending_events(&self) -> bool {
        !self.pending_events.is_empty()
    }

    pub fn status(&self) -> &PlaybackStatus {
        &self.status
    }

    pub fn current_track(&self) -> Option<&TrackDescriptor> {
        self.current_track.as_ref()
    }

    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_shuffled(&self) -> bool {
        self.shuffled
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.repeat
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    // ===== Internals =====

    fn is_current(&self, id: &str) -> bool {
        self.current_track.as_ref().is_some_and(|t| t.id == id)
    }

    fn step(&mut self, step: Step) -> CommandOutcome {
        if self.current_track.is_none() {
            return match self.queue.current().cloned() {
                Some(track) => self.start_load(track),
                None => CommandOutcome::Ignored(PolicyNoOp::QueueExhausted),
            };
        }

        if self.repeat == RepeatMode::One {
            return self.restart_current();
        }

        // Queue was cleared and refilled under the current track: the cursor
        // already points at what comes next
        if let Some(track) = self.queue.current() {
            if !self.is_current(&track.id) {
                let track = track.clone();
                return self.start_load(track);
            }
        }

        let target = match step {
            Step::Next => self.queue.next(self.repeat, self.shuffled),
            Step::Previous => self.queue.previous(self.repeat, self.shuffled),
        }
        .cloned();

        match target {
            Some(track) if self.is_current(&track.id) => self.restart_current(),
            Some(track) => self.start_load(track),
            None => {
                info!("Reached the end of the queue");
                self.stop_current();
                CommandOutcome::Applied
            }
        }
    }

    fn resume_current(&mut self) -> CommandOutcome {
        match self.status {
            PlaybackStatus::Paused => {
                self.session.play();
                self.set_status(PlaybackStatus::Playing);
                CommandOutcome::Applied
            }
            _ if self.current_track.is_none() => {
                CommandOutcome::Ignored(PolicyNoOp::NothingLoaded)
            }
            _ => CommandOutcome::Ignored(PolicyNoOp::NotPaused),
        }
    }

    /// Play the current track from the top, reusing its handle when loaded
    fn restart_current(&mut self) -> CommandOutcome {
        if self.status == PlaybackStatus::Loading {
            return CommandOutcome::Ignored(PolicyNoOp::AlreadyLoading);
        }

        if self.session.is_ready() {
            if let Some(position) = self.session.seek(0.0) {
                self.position = position;
            }
            self.session.play();
            self.set_status(PlaybackStatus::Playing);
            self.emit_position();
            return CommandOutcome::Applied;
        }

        match self.current_track.clone() {
            Some(track) => self.start_load(track),
            None => CommandOutcome::Ignored(PolicyNoOp::NoCurrentTrack),
        }
    }

    /// Issue a new load; supersedes any load in flight
    fn start_load(&mut self, track: TrackDescriptor) -> CommandOutcome {
        self.next_token += 1;
        let token = LoadToken(self.next_token);
        self.latest_token = Some(token);

        let previous = self.current_track.replace(track.clone()).map(|t| t.id);
        if previous.as_deref() != Some(track.id.as_str()) {
            self.pending_events.push(PlaybackEvent::TrackChanged {
                track_id: Some(track.id.clone()),
                previous_track_id: previous,
            });
        }

        self.position = 0.0;
        self.duration = None;
        self.set_status(PlaybackStatus::Loading);

        match self.session.load(&track.media_url, token) {
            Ok(token) => info!(%token, track_id = %track.id, title = %track.title, "Loading track"),
            Err(e) => self.fail(e.to_string()),
        }
        CommandOutcome::Applied
    }

    fn stop_current(&mut self) {
        self.session.dispose();
        self.latest_token = None;
        self.position = 0.0;
        self.duration = None;

        if let Some(previous) = self.current_track.take() {
            self.pending_events.push(PlaybackEvent::TrackChanged {
                track_id: None,
                previous_track_id: Some(previous.id),
            });
        }
        self.set_status(PlaybackStatus::Idle);
    }

    /// Enter `Error`; leaves nothing loaded and waits for retry or skip
    fn fail(&mut self, reason: String) {
        warn!(
            track_id = ?self.current_track.as_ref().map(|t| t.id.as_str()),
            %reason,
            "Playback failed"
        );
        self.session.dispose();
        self.latest_token = None;
        self.set_status(PlaybackStatus::Error {
            reason: reason.clone(),
        });
        self.pending_events
            .push(PlaybackEvent::Error { message: reason });
    }

    fn set_status(&mut self, status: PlaybackStatus) {
        if self.status == status {
            return;
        }
        debug!(from = self.status.label(), to = status.label(), "Status changed");
        self.status = status.clone();
        self.pending_events
            .push(PlaybackEvent::StateChanged { status });
    }

    fn emit_position(&mut self) {
        self.pending_events.push(PlaybackEvent::PositionUpdate {
            position: self.position,
            duration: self.duration,
        });
    }

    fn emit_queue_changed(&mut self) {
        self.pending_events.push(PlaybackEvent::QueueChanged {
            length: self.queue.len(),
        });
    }

    fn commit(&mut self, outcome: CommandOutcome) -> CommandOutcome {
        match outcome {
            CommandOutcome::Applied => self.publish(),
            CommandOutcome::Ignored(reason) => debug!(%reason, "Command ignored"),
        }
        outcome
    }

    fn publish(&mut self) {
        if self.subscribers.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        self.subscribers
            .retain(|tx| tx.send(snapshot.clone()).is_ok());
    }
}

impl std::fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackController")
            .field("status", &self.status)
            .field("current_track", &self.current_track.as_ref().map(|t| &t.id))
            .field("position", &self.position)
            .field("queue_len", &self.queue.len())
            .field("latest_token", &self.latest_token)
            .finish_non_exhaustive()
    }
}
