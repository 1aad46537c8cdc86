//! Bridge between the timeline store and an external frame-based player.
//!
//! Two one-directional channels with explicit tolerances:
//! - push (store -> player): play/pause on change, volume on change, seeks
//!   only when the playhead drifts more than `seek_tolerance_frames` and at
//!   most once per `debounce` (a later flush sends the deferred seek);
//! - pull (player -> store): time updates only move the playhead when they
//!   differ by more than `pull_tolerance_seconds`.
//!
//! Every pull also records what the player already shows, so the next push
//! does not echo it back as a seek.

use std::time::{Duration, Instant};

use log::{debug, trace, warn};

use crate::error::Result;
use crate::state::{TimelineSettings, TimelineStore};

/// Commands understood by the external player.
pub trait PlayerTransport {
    fn play(&mut self) -> Result<()>;
    fn pause(&mut self) -> Result<()>;
    fn seek_to_frame(&mut self, frame: u64) -> Result<()>;
    fn set_volume(&mut self, volume: f64) -> Result<()>;
}

/// Events emitted by the external player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerEvent {
    TimeUpdate { frame: u64 },
    Play,
    Pause,
    Ended,
    Seeked { frame: u64 },
}

/// Store time to player frame.
pub fn frame_for_time(time_seconds: f64, fps: f64) -> u64 {
    (time_seconds.max(0.0) * fps.max(1.0)).round() as u64
}

/// Player frame to store time.
pub fn time_for_frame(frame: u64, fps: f64) -> f64 {
    frame as f64 / fps.max(1.0)
}

/// Tolerances for both channels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncSettings {
    pub fps: f64,
    pub seek_tolerance_frames: u64,
    pub debounce: Duration,
    pub pull_tolerance_seconds: f64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self::from(&TimelineSettings::default())
    }
}

impl From<&TimelineSettings> for SyncSettings {
    fn from(settings: &TimelineSettings) -> Self {
        Self {
            fps: settings.fps,
            seek_tolerance_frames: settings.sync_seek_tolerance_frames,
            debounce: Duration::from_millis(settings.sync_debounce_ms),
            pull_tolerance_seconds: settings.sync_pull_tolerance_seconds,
        }
    }
}

/// What the player is believed to show, plus the rate limiter for seeks.
#[derive(Debug, Clone, Default)]
struct PushChannel {
    playing: Option<bool>,
    frame: Option<u64>,
    /// Store time right after the last player report. While the store still
    /// holds it, the player leads and no seek is pushed.
    reported_time: Option<f64>,
    volume: Option<f64>,
    last_seek_at: Option<Instant>,
    pending_seek: Option<u64>,
}

impl PushChannel {
    fn forget(&mut self) {
        *self = Self::default();
    }
}

/// Store <-> player synchronizer.
pub struct PlaybackSynchronizer {
    player: Option<Box<dyn PlayerTransport>>,
    settings: SyncSettings,
    push: PushChannel,
}

impl PlaybackSynchronizer {
    pub fn new(settings: SyncSettings) -> Self {
        Self {
            player: None,
            settings,
            push: PushChannel::default(),
        }
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Attach a player and bring it fully in line with the store.
    pub fn attach(&mut self, player: Box<dyn PlayerTransport>, store: &TimelineStore, now: Instant) {
        self.player = Some(player);
        self.push.forget();
        self.push(store, now);
    }

    /// Detach the player. Pending seeks are dropped.
    pub fn detach(&mut self) -> Option<Box<dyn PlayerTransport>> {
        self.push.forget();
        self.player.take()
    }

    pub fn is_attached(&self) -> bool {
        self.player.is_some()
    }

    /// A seek is waiting for the debounce window to pass.
    pub fn has_pending_seek(&self) -> bool {
        self.push.pending_seek.is_some()
    }

    /// Drop any deferred seek (component teardown).
    pub fn cancel_pending(&mut self) {
        self.push.pending_seek = None;
    }

    /// Push store changes to the player.
    pub fn push(&mut self, store: &TimelineStore, now: Instant) {
        if self.player.is_none() {
            return;
        }

        let playing = store.is_playing();
        if self.push.playing != Some(playing) {
            let sent = self.send(|player| if playing { player.play() } else { player.pause() });
            if !sent {
                return;
            }
            self.push.playing = Some(playing);
        }

        let volume = store.volume();
        if self.push.volume != Some(volume) {
            if !self.send(|player| player.set_volume(volume)) {
                return;
            }
            self.push.volume = Some(volume);
        }

        let current_time = store.current_time();
        if self.push.reported_time == Some(current_time) {
            self.push.pending_seek = None;
            return;
        }
        let frame = frame_for_time(current_time, self.settings.fps);
        let drifted = match self.push.frame {
            Some(shown) => shown.abs_diff(frame) > self.settings.seek_tolerance_frames,
            None => true,
        };
        if !drifted {
            self.push.pending_seek = None;
            return;
        }

        let throttled = self
            .push
            .last_seek_at
            .map(|at| now.saturating_duration_since(at) < self.settings.debounce)
            .unwrap_or(false);
        if throttled {
            trace!("Deferring seek to frame {}", frame);
            self.push.pending_seek = Some(frame);
        } else {
            self.seek(frame, now);
        }
    }

    /// Send a deferred seek once its debounce window has passed.
    /// Returns true if a seek went out.
    pub fn flush_pending(&mut self, now: Instant) -> bool {
        let Some(frame) = self.push.pending_seek else {
            return false;
        };
        let ready = self
            .push
            .last_seek_at
            .map(|at| now.saturating_duration_since(at) >= self.settings.debounce)
            .unwrap_or(true);
        if !ready || self.player.is_none() {
            return false;
        }
        self.seek(frame, now)
    }

    /// Apply a player event to the store.
    pub fn handle_event(&mut self, event: PlayerEvent, store: &mut TimelineStore) {
        if self.player.is_none() {
            return;
        }
        match event {
            PlayerEvent::TimeUpdate { frame } | PlayerEvent::Seeked { frame } => {
                self.push.frame = Some(frame);
                let time = time_for_frame(frame, self.settings.fps);
                if (time - store.current_time()).abs() > self.settings.pull_tolerance_seconds {
                    trace!("Pulling playhead to frame {}", frame);
                    store.set_current_time(time);
                    self.push.pending_seek = None;
                }
                self.push.reported_time = Some(store.current_time());
            }
            PlayerEvent::Play => {
                self.push.playing = Some(true);
                store.set_playing(true);
            }
            PlayerEvent::Pause => {
                self.push.playing = Some(false);
                store.set_playing(false);
            }
            PlayerEvent::Ended => {
                debug!("Player reached the end; rewinding");
                self.push.playing = Some(false);
                store.set_playing(false);
                store.set_current_time(0.0);
            }
        }
    }

    fn seek(&mut self, frame: u64, now: Instant) -> bool {
        if !self.send(|player| player.seek_to_frame(frame)) {
            return false;
        }
        self.push.frame = Some(frame);
        self.push.last_seek_at = Some(now);
        self.push.pending_seek = None;
        true
    }

    /// Run one command. A failing player is treated as gone.
    fn send<F>(&mut self, command: F) -> bool
    where
        F: FnOnce(&mut dyn PlayerTransport) -> Result<()>,
    {
        let Some(player) = self.player.as_deref_mut() else {
            return false;
        };
        match command(player) {
            Ok(()) => true,
            Err(err) => {
                warn!("{}; detaching player", err);
                self.detach();
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TimelineError;
    use crate::state::{ClipKind, NewClip};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    enum Command {
        Play,
        Pause,
        Seek(u64),
        Volume(f64),
    }

    #[derive(Clone, Default)]
    struct RecordingPlayer {
        log: Rc<RefCell<Vec<Command>>>,
        fail: Rc<RefCell<bool>>,
    }

    impl RecordingPlayer {
        fn record(&self, command: Command) -> Result<()> {
            if *self.fail.borrow() {
                return Err(TimelineError::Transport("player unavailable".into()));
            }
            self.log.borrow_mut().push(command);
            Ok(())
        }

        fn take(&self) -> Vec<Command> {
            std::mem::take(&mut *self.log.borrow_mut())
        }
    }

    impl PlayerTransport for RecordingPlayer {
        fn play(&mut self) -> Result<()> {
            self.record(Command::Play)
        }
        fn pause(&mut self) -> Result<()> {
            self.record(Command::Pause)
        }
        fn seek_to_frame(&mut self, frame: u64) -> Result<()> {
            self.record(Command::Seek(frame))
        }
        fn set_volume(&mut self, volume: f64) -> Result<()> {
            self.record(Command::Volume(volume))
        }
    }

    fn store_with_clip(duration: f64) -> TimelineStore {
        let mut store = TimelineStore::new();
        store
            .add_clip(NewClip::new(ClipKind::Video, 0.0, duration).on_track(0))
            .unwrap();
        store
    }

    fn attached(store: &TimelineStore, now: Instant) -> (PlaybackSynchronizer, RecordingPlayer) {
        let player = RecordingPlayer::default();
        let mut sync = PlaybackSynchronizer::new(SyncSettings::default());
        sync.attach(Box::new(player.clone()), store, now);
        (sync, player)
    }

    #[test]
    fn test_frame_mapping() {
        assert_eq!(frame_for_time(5.0, 30.0), 150);
        assert_eq!(frame_for_time(4.99, 30.0), 150);
        assert_eq!(frame_for_time(-1.0, 30.0), 0);
        assert_eq!(time_for_frame(150, 30.0), 5.0);
    }

    #[test]
    fn test_attach_pushes_full_state() {
        let store = store_with_clip(10.0);
        let now = Instant::now();
        let (_sync, player) = attached(&store, now);
        assert_eq!(
            player.take(),
            vec![Command::Pause, Command::Volume(1.0), Command::Seek(0)]
        );
    }

    #[test]
    fn test_play_state_pushed_on_change_only() {
        let mut store = store_with_clip(10.0);
        let now = Instant::now();
        let (mut sync, player) = attached(&store, now);
        player.take();

        store.set_playing(true);
        sync.push(&store, now);
        sync.push(&store, now);
        assert_eq!(player.take(), vec![Command::Play]);
    }

    #[test]
    fn test_small_drift_does_not_seek() {
        let mut store = store_with_clip(10.0);
        let start = Instant::now();
        let (mut sync, player) = attached(&store, start);
        player.take();

        // Two frames at 30fps is within tolerance.
        store.set_current_time(2.0 / 30.0);
        sync.push(&store, start + Duration::from_secs(1));
        assert!(player.take().is_empty());

        store.set_current_time(3.0 / 30.0);
        sync.push(&store, start + Duration::from_secs(1));
        assert_eq!(player.take(), vec![Command::Seek(3)]);
    }

    #[test]
    fn test_seeks_are_debounced() {
        let mut store = store_with_clip(10.0);
        let start = Instant::now();
        let (mut sync, player) = attached(&store, start);
        player.take();

        store.set_current_time(1.0);
        sync.push(&store, start + Duration::from_millis(20));
        assert!(player.take().is_empty());
        assert!(sync.has_pending_seek());

        store.set_current_time(2.0);
        sync.push(&store, start + Duration::from_millis(60));
        assert!(!sync.flush_pending(start + Duration::from_millis(90)));

        assert!(sync.flush_pending(start + Duration::from_millis(100)));
        assert_eq!(player.take(), vec![Command::Seek(60)]);
        assert!(!sync.has_pending_seek());
    }

    #[test]
    fn test_cancel_pending_drops_seek() {
        let mut store = store_with_clip(10.0);
        let start = Instant::now();
        let (mut sync, player) = attached(&store, start);
        player.take();
        store.set_current_time(4.0);
        sync.push(&store, start);
        sync.cancel_pending();
        assert!(!sync.flush_pending(start + Duration::from_secs(1)));
        assert!(player.take().is_empty());
    }

    #[test]
    fn test_time_update_within_tolerance_is_ignored() {
        let mut store = store_with_clip(10.0);
        let now = Instant::now();
        let (mut sync, _player) = attached(&store, now);
        store.set_current_time(4.95);
        let revision = store.revision();

        sync.handle_event(PlayerEvent::TimeUpdate { frame: 150 }, &mut store);
        assert_eq!(store.current_time(), 4.95);
        assert_eq!(store.revision(), revision);
    }

    #[test]
    fn test_time_update_pulls_and_does_not_echo() {
        let mut store = store_with_clip(10.0);
        let now = Instant::now();
        let (mut sync, player) = attached(&store, now);
        player.take();
        store.set_playing(true);
        sync.push(&store, now);
        player.take();

        sync.handle_event(PlayerEvent::TimeUpdate { frame: 90 }, &mut store);
        assert_eq!(store.current_time(), 3.0);
        sync.push(&store, now + Duration::from_secs(1));
        assert!(player.take().is_empty());
    }

    #[test]
    fn test_playback_updates_inside_pull_tolerance_do_not_seek_back() {
        let mut store = store_with_clip(10.0);
        store.set_current_time(4.935);
        store.set_playing(true);
        let start = Instant::now();
        let (mut sync, player) = attached(&store, start);
        player.take();

        // The player runs up to three frames ahead of the store, which is
        // still inside the pull tolerance.
        for (step, frame) in [149, 150, 151].into_iter().enumerate() {
            sync.handle_event(PlayerEvent::TimeUpdate { frame }, &mut store);
            sync.push(&store, start + Duration::from_millis(200 * (step as u64 + 1)));
            assert!(!sync.flush_pending(start + Duration::from_secs(2)));
        }
        assert_eq!(store.current_time(), 4.935);
        assert!(player.take().is_empty());

        // A store-side seek still goes out.
        store.set_current_time(8.0);
        sync.push(&store, start + Duration::from_secs(3));
        assert_eq!(player.take(), vec![Command::Seek(240)]);
    }

    #[test]
    fn test_ended_rewinds_and_stops() {
        let mut store = store_with_clip(10.0);
        let now = Instant::now();
        let (mut sync, player) = attached(&store, now);
        store.set_playing(true);
        sync.push(&store, now);
        sync.handle_event(PlayerEvent::TimeUpdate { frame: 300 }, &mut store);
        player.take();

        sync.handle_event(PlayerEvent::Ended, &mut store);
        assert!(!store.is_playing());
        assert_eq!(store.current_time(), 0.0);
        // The rewind is pushed as a seek; no redundant pause.
        sync.push(&store, now + Duration::from_secs(1));
        assert_eq!(player.take(), vec![Command::Seek(0)]);
    }

    #[test]
    fn test_player_events_update_play_state() {
        let mut store = store_with_clip(10.0);
        let now = Instant::now();
        let (mut sync, player) = attached(&store, now);
        player.take();
        sync.handle_event(PlayerEvent::Play, &mut store);
        assert!(store.is_playing());
        sync.push(&store, now);
        assert!(player.take().is_empty());
        sync.handle_event(PlayerEvent::Pause, &mut store);
        assert!(!store.is_playing());
    }

    #[test]
    fn test_volume_pushed_without_debounce() {
        let mut store = store_with_clip(10.0);
        let now = Instant::now();
        let (mut sync, player) = attached(&store, now);
        player.take();
        store.set_volume(0.25);
        sync.push(&store, now);
        store.set_volume(0.5);
        sync.push(&store, now);
        assert_eq!(player.take(), vec![Command::Volume(0.25), Command::Volume(0.5)]);
    }

    #[test]
    fn test_failing_player_is_detached() {
        let mut store = store_with_clip(10.0);
        let now = Instant::now();
        let (mut sync, player) = attached(&store, now);
        *player.fail.borrow_mut() = true;

        store.set_playing(true);
        sync.push(&store, now);
        assert!(!sync.is_attached());

        // Events from a detached player are ignored; the store is untouched.
        let before = store.state().clone();
        sync.handle_event(PlayerEvent::TimeUpdate { frame: 200 }, &mut store);
        assert_eq!(store.state(), &before);
        assert!(store.is_playing());
    }
}
