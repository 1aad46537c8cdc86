//! `TimelineEditor` owns the store and every controller that mutates it.
//!
//! Hosts feed it pointer, keyboard, drag-and-drop and player events on a
//! single event loop; each call runs to completion before the next. Frame
//! requests from [`TimelineEditor::spawn_frame_loop`] are answered with
//! [`TimelineEditor::tick`] on the same loop.

use std::time::Instant;

use log::{debug, warn};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::core::auto_scroll::{AutoScrollLoop, AutoScroller, ScrollViewport};
use crate::core::geometry::TimelineGeometry;
use crate::core::playback_sync::{PlaybackSynchronizer, PlayerEvent, PlayerTransport, SyncSettings};
use crate::error::{Result, TimelineError};
use crate::hotkeys::{handle_hotkey, HotkeyAction, HotkeyContext, HotkeyResult, Key, Modifiers};
use crate::state::{
    group_tracks, visible_track_count, Clip, MediaLibrary, NewClip, TimelineSettings,
    TimelineSnapshot, TimelineStore, TrackLane,
};
use crate::timeline::{
    zoom_to_fit, ClipInteractionController, DropIngestController, DropOutcome, DropPreview,
    DropTarget, GestureFeedback, GestureKind, PointerSample,
};

pub struct TimelineEditor {
    store: TimelineStore,
    settings: TimelineSettings,
    geometry: TimelineGeometry,
    viewport: ScrollViewport,
    interaction: ClipInteractionController,
    ingest: DropIngestController,
    auto_scroll: AutoScroller,
    frame_loop: Option<AutoScrollLoop>,
    sync: PlaybackSynchronizer,
    clipboard: Option<Clip>,
    /// Last pointer x during a gesture and whether snapping was on
    last_pointer: Option<(f64, bool)>,
}

impl Default for TimelineEditor {
    fn default() -> Self {
        Self::new(TimelineSettings::default())
    }
}

impl TimelineEditor {
    pub fn new(settings: TimelineSettings) -> Self {
        let settings = settings.sanitized();
        Self {
            store: TimelineStore::new(),
            geometry: TimelineGeometry::new(settings.base_pixels_per_second),
            viewport: ScrollViewport::default(),
            interaction: ClipInteractionController::new(&settings),
            ingest: DropIngestController::new(&settings),
            auto_scroll: AutoScroller::new(settings.auto_scroll_edge_px, settings.auto_scroll_max_speed_px),
            frame_loop: None,
            sync: PlaybackSynchronizer::new(SyncSettings::from(&settings)),
            clipboard: None,
            last_pointer: None,
            settings,
        }
    }

    pub fn store(&self) -> &TimelineStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut TimelineStore {
        &mut self.store
    }

    pub fn settings(&self) -> &TimelineSettings {
        &self.settings
    }

    pub fn geometry(&self) -> &TimelineGeometry {
        &self.geometry
    }

    pub fn viewport(&self) -> &ScrollViewport {
        &self.viewport
    }

    pub fn interaction(&self) -> &ClipInteractionController {
        &self.interaction
    }

    pub fn clipboard(&self) -> Option<&Clip> {
        self.clipboard.as_ref()
    }

    /// Lanes to render, including empty ones up to the visible count.
    pub fn track_lanes(&self) -> Vec<TrackLane<'_>> {
        let clips = self.store.clips();
        let count = visible_track_count(clips, self.settings.min_track_count, self.settings.track_buffer);
        group_tracks(clips, count)
    }

    // Viewport and zoom

    /// Record where the scroll container sits and how wide it is.
    pub fn set_viewport(&mut self, left: f64, client_width: f64) {
        self.viewport.left = left;
        self.viewport.client_width = client_width.max(0.0);
        self.refresh_scroll_width();
    }

    pub fn set_scroll_left(&mut self, scroll_left: f64) {
        self.viewport.set_scroll_left(scroll_left);
    }

    pub fn zoom_in(&mut self) {
        self.geometry.zoom_in();
        self.refresh_scroll_width();
    }

    pub fn zoom_out(&mut self) {
        self.geometry.zoom_out();
        self.refresh_scroll_width();
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.geometry.set_zoom(zoom);
        self.refresh_scroll_width();
    }

    /// Fit the whole timeline into the viewport.
    pub fn zoom_to_fit(&mut self) {
        let width = Some(self.viewport.client_width).filter(|w| *w > 0.0);
        let zoom = zoom_to_fit(
            self.store.total_duration(),
            width,
            self.geometry.base_pixels_per_second(),
        );
        self.set_zoom(zoom);
    }

    fn refresh_scroll_width(&mut self) {
        let content = self.geometry.content_width(self.store.total_duration());
        self.viewport.set_scroll_width(content.max(self.viewport.client_width));
    }

    // Clip gestures

    /// Pointer-down `offset_x` pixels into a clip.
    pub fn pointer_down(&mut self, clip_id: Uuid, offset_x: f64, client_x: f64) -> Option<GestureKind> {
        let pointer = PointerSample::new(client_x, self.viewport.scroll_left);
        let gesture = self
            .interaction
            .begin(&mut self.store, &self.geometry, clip_id, offset_x, pointer)?;
        self.last_pointer = Some((client_x, self.settings.snap_enabled));
        self.auto_scroll.begin();
        self.refresh_frame_loop();
        Some(gesture)
    }

    /// Pointer-move while a gesture is active. Holding Alt disables snapping.
    pub fn pointer_move(&mut self, client_x: f64, modifiers: Modifiers) -> GestureFeedback {
        if !self.interaction.is_active() {
            return GestureFeedback::default();
        }
        let snap_enabled = self.settings.snap_enabled && !modifiers.alt;
        self.last_pointer = Some((client_x, snap_enabled));
        self.auto_scroll.pointer_moved(client_x, &self.viewport);
        self.refresh_frame_loop();
        self.update_gesture(client_x, snap_enabled)
    }

    /// Pointer-up anywhere. Always cleans up.
    pub fn pointer_up(&mut self) -> GestureFeedback {
        self.auto_scroll.stop();
        self.last_pointer = None;
        self.refresh_frame_loop();
        self.interaction.end()
    }

    pub fn cancel_gesture(&mut self) -> GestureFeedback {
        self.auto_scroll.stop();
        self.last_pointer = None;
        self.refresh_frame_loop();
        let feedback = self.interaction.cancel(&mut self.store);
        self.refresh_scroll_width();
        feedback
    }

    fn update_gesture(&mut self, client_x: f64, snap_enabled: bool) -> GestureFeedback {
        let pointer = PointerSample::new(client_x, self.viewport.scroll_left);
        let feedback = self
            .interaction
            .update(&mut self.store, &self.geometry, pointer, snap_enabled);
        if feedback.committed {
            self.refresh_scroll_width();
        }
        feedback
    }

    /// Split a clip at a double-click `relative_x` pixels into it.
    pub fn split_clip_at(&mut self, clip_id: Uuid, relative_x: f64) -> Result<(Uuid, Uuid)> {
        self.interaction
            .split(&mut self.store, &self.geometry, clip_id, relative_x)
    }

    /// One animation frame: auto-scroll the viewport (the dragged clip
    /// follows) and flush a deferred player seek. Returns pixels scrolled.
    pub fn tick(&mut self, now: Instant) -> f64 {
        let scrolled = self.auto_scroll.tick(&mut self.viewport);
        if scrolled != 0.0 {
            if let Some((client_x, snap_enabled)) = self.last_pointer {
                self.update_gesture(client_x, snap_enabled);
            }
        }
        self.sync.flush_pending(now);
        self.refresh_frame_loop();
        scrolled
    }

    /// Start the frame clock on the current tokio runtime. While a drag sits
    /// in an edge zone or a seek is deferred, a request arrives on the
    /// returned receiver every frame; answer each with [`TimelineEditor::tick`].
    pub fn spawn_frame_loop(&mut self) -> mpsc::Receiver<()> {
        let (frame_loop, frames) = AutoScrollLoop::spawn();
        self.frame_loop = Some(frame_loop);
        self.refresh_frame_loop();
        frames
    }

    /// Returns true while the frame clock is requesting frames.
    pub fn wants_frames(&self) -> bool {
        self.auto_scroll.is_scrolling() || self.sync.has_pending_seek()
    }

    fn push_to_player(&mut self, now: Instant) {
        self.sync.push(&self.store, now);
        self.refresh_frame_loop();
    }

    fn refresh_frame_loop(&self) {
        if let Some(frame_loop) = &self.frame_loop {
            frame_loop.set_active(self.wants_frames());
        }
    }

    // Drag and drop

    pub fn drag_over(
        &mut self,
        library: &dyn MediaLibrary,
        raw_payload: &str,
        track_index: u32,
        client_x: f64,
    ) -> Option<&DropPreview> {
        let target = DropTarget {
            track_index,
            client_x,
            viewport: &self.viewport,
        };
        self.ingest
            .drag_over(&self.store, library, &self.geometry, raw_payload, target)
    }

    pub fn drag_leave(&mut self) {
        self.ingest.drag_leave();
    }

    pub fn drop_media(
        &mut self,
        library: &dyn MediaLibrary,
        raw_payload: &str,
        track_index: u32,
        client_x: f64,
    ) -> Result<DropOutcome> {
        let target = DropTarget {
            track_index,
            client_x,
            viewport: &self.viewport,
        };
        let outcome = self
            .ingest
            .drop(&mut self.store, library, &self.geometry, raw_payload, target)?;
        self.refresh_scroll_width();
        Ok(outcome)
    }

    /// The library finished probing `media_id`.
    pub fn apply_probed_duration(&mut self, media_id: Uuid, duration_seconds: f64) -> usize {
        let touched = self.store.apply_media_duration(
            media_id,
            duration_seconds,
            self.settings.default_media_duration,
        );
        self.refresh_scroll_width();
        touched
    }

    // Clipboard and selection edits

    pub fn copy_selection(&mut self) -> bool {
        match self.store.selected_clip() {
            Some(clip) => {
                self.clipboard = Some(clip.clone());
                true
            }
            None => false,
        }
    }

    /// Paste the clipboard clip at the playhead on its original lane.
    pub fn paste(&mut self) -> Option<Uuid> {
        let source = self.clipboard.as_ref()?;
        let mut new_clip = NewClip::from(source.clone());
        new_clip.id = None;
        new_clip.start_time = self.store.current_time();
        let track_index = source.track_index;

        let Some(id) = self.store.add_clip(new_clip) else {
            warn!("Paste at {:.3}s collides on track {}", self.store.current_time(), track_index);
            return None;
        };
        self.store.select_clip(Some(id));
        self.refresh_scroll_width();
        Some(id)
    }

    pub fn delete_selection(&mut self, now: Instant) -> bool {
        let Some(id) = self.store.selected_clip_id() else {
            return false;
        };
        if self.interaction.session().map(|s| s.clip_id) == Some(id) {
            self.pointer_up();
        }
        let removed = self.store.remove_clip(id);
        self.refresh_scroll_width();
        self.push_to_player(now);
        removed
    }

    pub fn split_selected_at_playhead(&mut self) -> Result<(Uuid, Uuid)> {
        let clip = self.store.selected_clip().ok_or(TimelineError::NothingSelected)?;
        let (id, offset) = (clip.id, self.store.current_time() - clip.start_time);
        self.interaction.split_at_offset(&mut self.store, id, offset)
    }

    pub fn move_selected_to_adjacent_track(&mut self, direction: i32) -> bool {
        self.store
            .selected_clip_id()
            .map(|id| self.store.move_clip_to_adjacent_track(id, direction))
            .unwrap_or(false)
    }

    // Keyboard

    pub fn hotkey_context(&self, input_focused: bool) -> HotkeyContext {
        HotkeyContext {
            has_selection: self.store.selected_clip_id().is_some(),
            has_clipboard: self.clipboard.is_some(),
            gesture_active: self.interaction.is_active(),
            input_focused,
        }
    }

    /// Map a key press and run the matching action.
    pub fn handle_key(&mut self, key: &Key, modifiers: Modifiers, input_focused: bool, now: Instant) -> Result<HotkeyResult> {
        let result = handle_hotkey(key, modifiers, &self.hotkey_context(input_focused));
        if let HotkeyResult::Action(action) = result {
            self.apply_hotkey(action, now)?;
        }
        Ok(result)
    }

    pub fn apply_hotkey(&mut self, action: HotkeyAction, now: Instant) -> Result<()> {
        debug!("Hotkey action {:?}", action);
        match action {
            HotkeyAction::TimelineZoomIn => self.zoom_in(),
            HotkeyAction::TimelineZoomOut => self.zoom_out(),
            HotkeyAction::PlayPause => self.toggle_playback(now),
            HotkeyAction::SplitAtPlayhead => {
                self.split_selected_at_playhead()?;
            }
            HotkeyAction::DeleteSelection => {
                self.delete_selection(now);
            }
            HotkeyAction::CopySelection => {
                self.copy_selection();
            }
            HotkeyAction::Paste => {
                self.paste();
            }
            HotkeyAction::MoveClipUp => {
                self.move_selected_to_adjacent_track(-1);
            }
            HotkeyAction::MoveClipDown => {
                self.move_selected_to_adjacent_track(1);
            }
            HotkeyAction::CancelGesture => {
                self.cancel_gesture();
            }
        }
        Ok(())
    }

    // Playback

    pub fn attach_player(&mut self, player: Box<dyn PlayerTransport>, now: Instant) {
        self.sync.attach(player, &self.store, now);
    }

    pub fn detach_player(&mut self) -> Option<Box<dyn PlayerTransport>> {
        self.sync.detach()
    }

    pub fn is_player_attached(&self) -> bool {
        self.sync.is_attached()
    }

    pub fn player_event(&mut self, event: PlayerEvent, now: Instant) {
        self.sync.handle_event(event, &mut self.store);
        self.push_to_player(now);
    }

    pub fn seek(&mut self, time: f64, now: Instant) {
        self.store.set_current_time(time);
        self.push_to_player(now);
    }

    pub fn toggle_playback(&mut self, now: Instant) {
        let playing = !self.store.is_playing();
        self.store.set_playing(playing);
        self.push_to_player(now);
    }

    pub fn set_volume(&mut self, volume: f64, now: Instant) {
        self.store.set_volume(volume);
        self.push_to_player(now);
    }

    // Persistence

    pub fn snapshot(&self) -> TimelineSnapshot {
        self.store.snapshot()
    }

    /// Replace the timeline with a saved one. Gestures in flight are dropped.
    pub fn restore(&mut self, snapshot: TimelineSnapshot, now: Instant) {
        self.pointer_up();
        self.ingest.drag_leave();
        self.store = TimelineStore::restore(snapshot);
        self.refresh_scroll_width();
        self.push_to_player(now);
    }

    /// Release timers and the player before the editor goes away.
    pub fn teardown(&mut self) {
        self.pointer_up();
        self.ingest.drag_leave();
        self.sync.cancel_pending();
        self.sync.detach();
        self.frame_loop = None;
    }
}
