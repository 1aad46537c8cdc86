//! Pointer gestures on a single clip: drag, resize from either edge, split.
//!
//! `ClipInteractionController` is an explicit state machine with
//! `begin`/`update`/`end` entry points; it never touches input plumbing.
//! Anchors and snap targets are captured once in `begin` and never re-read
//! while the gesture runs.

use log::{debug, trace, warn};
use uuid::Uuid;

use crate::constants::{MIN_CLIP_DURATION_SECONDS, RESIZE_HANDLE_BASE_PX, TIMELINE_SNAP_THRESHOLD_PX};
use crate::core::collision::{find_valid_position, has_collision, Span};
use crate::core::geometry::TimelineGeometry;
use crate::core::timeline_snap::{best_snap_delta, compute_snap_points, SnapIndex};
use crate::error::{Result, TimelineError};
use crate::state::{ClipPatch, TimelineSettings, TimelineStore};

const EDGE_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    Dragging,
    ResizingLeft,
    ResizingRight,
}

impl GestureKind {
    pub fn cursor(self) -> CursorStyle {
        match self {
            GestureKind::Dragging => CursorStyle::Grabbing,
            GestureKind::ResizingLeft | GestureKind::ResizingRight => CursorStyle::EwResize,
        }
    }
}

/// Pick the gesture for a press `offset_x` pixels into a clip's rendered box.
pub fn classify(offset_x: f64, rendered_width: f64, handle_width: f64) -> GestureKind {
    if offset_x <= handle_width {
        GestureKind::ResizingLeft
    } else if offset_x >= rendered_width - handle_width {
        GestureKind::ResizingRight
    } else {
        GestureKind::Dragging
    }
}

/// Pointer position plus the viewport scroll at the time it was sampled.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerSample {
    pub client_x: f64,
    pub scroll_left: f64,
}

impl PointerSample {
    pub fn new(client_x: f64, scroll_left: f64) -> Self {
        Self {
            client_x,
            scroll_left,
        }
    }

    /// Position in content space; stays put while the viewport auto-scrolls.
    fn content_x(&self) -> f64 {
        self.client_x + self.scroll_left
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorStyle {
    #[default]
    Default,
    Grabbing,
    EwResize,
}

impl CursorStyle {
    pub fn as_css(self) -> &'static str {
        match self {
            CursorStyle::Default => "default",
            CursorStyle::Grabbing => "grabbing",
            CursorStyle::EwResize => "ew-resize",
        }
    }
}

/// What the view should show after a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GestureFeedback {
    /// A candidate was written to the store
    pub committed: bool,
    /// Time of the snap point applied to the committed candidate
    pub snap_indicator: Option<f64>,
    pub cursor: CursorStyle,
}

/// Ephemeral state of the active gesture.
#[derive(Debug, Clone)]
pub struct InteractionSession {
    pub clip_id: Uuid,
    pub gesture: GestureKind,
    pub track_index: u32,
    pub anchor: PointerSample,
    pub anchor_start: f64,
    pub anchor_duration: f64,
    pub anchor_trim_in: f64,
    snap_index: SnapIndex,
}

impl InteractionSession {
    fn anchor_end(&self) -> f64 {
        self.anchor_start + self.anchor_duration
    }
}

/// A candidate placement that passed snapping, awaiting validation.
struct Candidate {
    start: f64,
    duration: f64,
    trim_in: Option<f64>,
    snapped_to: Option<f64>,
}

pub struct ClipInteractionController {
    session: Option<InteractionSession>,
    snap_tolerance_px: f64,
    min_clip_duration: f64,
    handle_base_px: f64,
    snap_indicator: Option<f64>,
}

impl Default for ClipInteractionController {
    fn default() -> Self {
        Self {
            session: None,
            snap_tolerance_px: TIMELINE_SNAP_THRESHOLD_PX,
            min_clip_duration: MIN_CLIP_DURATION_SECONDS,
            handle_base_px: RESIZE_HANDLE_BASE_PX,
            snap_indicator: None,
        }
    }
}

impl ClipInteractionController {
    pub fn new(settings: &TimelineSettings) -> Self {
        Self {
            snap_tolerance_px: settings.snap_tolerance_px,
            min_clip_duration: settings.min_clip_duration,
            handle_base_px: settings.resize_handle_px,
            ..Self::default()
        }
    }

    pub fn session(&self) -> Option<&InteractionSession> {
        self.session.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn snap_indicator(&self) -> Option<f64> {
        self.snap_indicator
    }

    pub fn cursor(&self) -> CursorStyle {
        self.session
            .as_ref()
            .map(|session| session.gesture.cursor())
            .unwrap_or_default()
    }

    /// Pointer-down on a clip. Selects it and starts the gesture picked by
    /// where inside the clip the press landed.
    pub fn begin(
        &mut self,
        store: &mut TimelineStore,
        geometry: &TimelineGeometry,
        clip_id: Uuid,
        offset_x: f64,
        pointer: PointerSample,
    ) -> Option<GestureKind> {
        self.session = None;
        self.snap_indicator = None;
        store.select_clip(Some(clip_id));
        let clip = store.clip(clip_id)?;

        let rendered_width = geometry.clip_width(clip.duration);
        let handle = geometry.resize_handle_width(self.handle_base_px, rendered_width);
        let gesture = classify(offset_x, rendered_width, handle);

        self.session = Some(InteractionSession {
            clip_id,
            gesture,
            track_index: clip.track_index,
            anchor: pointer,
            anchor_start: clip.start_time,
            anchor_duration: clip.duration,
            anchor_trim_in: clip.trim_in_seconds,
            snap_index: compute_snap_points(store.total_duration(), store.clips(), Some(clip_id)),
        });
        debug!("Begin {:?} on clip {}", gesture, clip_id);
        Some(gesture)
    }

    /// Pointer-move during a gesture. Invalid candidates are dropped silently;
    /// the clip keeps its last committed position.
    pub fn update(
        &mut self,
        store: &mut TimelineStore,
        geometry: &TimelineGeometry,
        pointer: PointerSample,
        snap_enabled: bool,
    ) -> GestureFeedback {
        let Some(session) = self.session.as_ref() else {
            return GestureFeedback::default();
        };
        if store.clip(session.clip_id).is_none() {
            // Removed under us; nothing left to edit.
            self.session = None;
            self.snap_indicator = None;
            return GestureFeedback::default();
        }

        let pixels_per_second = geometry.pixels_per_second();
        let delta_time = geometry.pixels_to_time(pointer.content_x() - session.anchor.content_x());
        let tolerance_px = if snap_enabled { self.snap_tolerance_px } else { 0.0 };

        let candidate = match session.gesture {
            GestureKind::Dragging => {
                self.drag_candidate(session, store, delta_time, pixels_per_second, tolerance_px)
            }
            GestureKind::ResizingLeft => {
                self.resize_left_candidate(session, store, delta_time, pixels_per_second, tolerance_px)
            }
            GestureKind::ResizingRight => {
                self.resize_right_candidate(session, store, delta_time, pixels_per_second, tolerance_px)
            }
        };
        let cursor = session.gesture.cursor();
        let clip_id = session.clip_id;

        let Some(candidate) = candidate else {
            self.snap_indicator = None;
            return GestureFeedback {
                committed: false,
                snap_indicator: None,
                cursor,
            };
        };

        let mut patch = ClipPatch::span(candidate.start, candidate.duration);
        if let Some(trim_in) = candidate.trim_in {
            patch = patch.with_trim_in(trim_in);
        }
        let committed = store.update_clip(clip_id, patch);
        self.snap_indicator = if committed { candidate.snapped_to } else { None };
        GestureFeedback {
            committed,
            snap_indicator: self.snap_indicator,
            cursor,
        }
    }

    /// Pointer-up. Whatever was last committed stays.
    pub fn end(&mut self) -> GestureFeedback {
        if let Some(session) = self.session.take() {
            debug!("End {:?} on clip {}", session.gesture, session.clip_id);
        }
        self.snap_indicator = None;
        GestureFeedback::default()
    }

    /// Abort the gesture and put the clip back where it started.
    pub fn cancel(&mut self, store: &mut TimelineStore) -> GestureFeedback {
        self.snap_indicator = None;
        let Some(session) = self.session.take() else {
            return GestureFeedback::default();
        };
        let mut patch = ClipPatch::span(session.anchor_start, session.anchor_duration);
        if let Some(clip) = store.clip(session.clip_id) {
            if clip.trim_in_seconds != session.anchor_trim_in {
                patch = patch.with_trim_in(session.anchor_trim_in);
            }
        }
        let restored = store.update_clip(session.clip_id, patch);
        debug!("Cancelled {:?} on clip {}", session.gesture, session.clip_id);
        GestureFeedback {
            committed: restored,
            snap_indicator: None,
            cursor: CursorStyle::Default,
        }
    }

    /// Split a clip at a pointer position `relative_x` pixels into its
    /// rendered box. The first half is selected.
    pub fn split(
        &mut self,
        store: &mut TimelineStore,
        geometry: &TimelineGeometry,
        clip_id: Uuid,
        relative_x: f64,
    ) -> Result<(Uuid, Uuid)> {
        let clip = store.clip(clip_id).ok_or(TimelineError::ClipNotFound(clip_id))?;
        let rendered_width = geometry.clip_width(clip.duration);
        let offset = relative_x / rendered_width * clip.duration;
        self.split_at_offset(store, clip_id, offset)
    }

    /// Split a clip `offset` seconds after its start.
    pub fn split_at_offset(&mut self, store: &mut TimelineStore, clip_id: Uuid, offset: f64) -> Result<(Uuid, Uuid)> {
        if store.clip(clip_id).is_none() {
            return Err(TimelineError::ClipNotFound(clip_id));
        }
        if self.session.as_ref().map(|s| s.clip_id) == Some(clip_id) {
            self.end();
        }
        store
            .split_clip(clip_id, offset, self.min_clip_duration)
            .ok_or_else(|| {
                warn!("Split of clip {} at +{:.3}s rejected", clip_id, offset);
                TimelineError::InvalidSplit {
                    offset,
                    min: self.min_clip_duration,
                }
            })
    }

    fn drag_candidate(
        &self,
        session: &InteractionSession,
        store: &TimelineStore,
        delta_time: f64,
        pixels_per_second: f64,
        tolerance_px: f64,
    ) -> Option<Candidate> {
        let clip = store.clip(session.clip_id)?;
        let duration = clip.duration;
        let max_start = (store.total_duration() - duration).max(0.0);
        let mut start = (session.anchor_start + delta_time).clamp(0.0, max_start);
        let mut snapped_to = None;

        // Both edges are attracted; the start edge wins ties.
        if let Some(hit) = best_snap_delta(
            &[start, start + duration],
            &session.snap_index,
            pixels_per_second,
            tolerance_px,
        ) {
            // Land exactly on the target so touching edges stay touching.
            let snapped = if (start + hit.delta - hit.target.time).abs() <= EDGE_EPSILON {
                hit.target.time
            } else {
                Span::ending_at(hit.target.time, duration).start
            };
            if snapped >= -EDGE_EPSILON && snapped <= max_start + EDGE_EPSILON {
                start = snapped.clamp(0.0, max_start);
                snapped_to = Some(hit.target.time);
            }
        }

        let track_clips = store.clips_on_track(session.track_index);
        let resolved = find_valid_position(clip, start, &track_clips, store.total_duration());
        if (resolved - start).abs() > EDGE_EPSILON {
            trace!("Drag of clip {} to {:.3}s collides", clip.id, start);
            return None;
        }
        Some(Candidate {
            start: resolved,
            duration,
            trim_in: None,
            snapped_to,
        })
    }

    fn resize_left_candidate(
        &self,
        session: &InteractionSession,
        store: &TimelineStore,
        delta_time: f64,
        pixels_per_second: f64,
        tolerance_px: f64,
    ) -> Option<Candidate> {
        let clip = store.clip(session.clip_id)?;
        let mut start = session.anchor_start + delta_time;
        let mut snapped_to = None;
        if let Some(target) = session.snap_index.nearest(start, pixels_per_second, tolerance_px) {
            start = target.time;
            snapped_to = Some(target.time);
        }

        let duration = Span::between(start, session.anchor_end()).duration;
        if start < 0.0 || duration < self.min_clip_duration - EDGE_EPSILON {
            trace!("Left resize of clip {} out of range: start={:.3}", clip.id, start);
            return None;
        }

        let trim_in = if clip.has_source_trim() {
            let trim_in = session.anchor_trim_in + (start - session.anchor_start);
            if trim_in < -EDGE_EPSILON {
                trace!("Left resize of clip {} would run past the source start", clip.id);
                return None;
            }
            Some(trim_in.max(0.0))
        } else {
            None
        };

        let span = Span::new(start, duration);
        if has_collision(span, &store.clips_on_track(session.track_index), Some(clip.id)) {
            trace!("Left resize of clip {} collides", clip.id);
            return None;
        }
        Some(Candidate {
            start,
            duration,
            trim_in,
            snapped_to,
        })
    }

    fn resize_right_candidate(
        &self,
        session: &InteractionSession,
        store: &TimelineStore,
        delta_time: f64,
        pixels_per_second: f64,
        tolerance_px: f64,
    ) -> Option<Candidate> {
        let clip = store.clip(session.clip_id)?;
        let start = clip.start_time;
        let mut duration = session.anchor_duration + delta_time;
        let mut snapped_to = None;
        if let Some(target) = session.snap_index.nearest(start + duration, pixels_per_second, tolerance_px) {
            duration = Span::between(start, target.time).duration;
            snapped_to = Some(target.time);
        }

        if !duration.is_finite() || duration < self.min_clip_duration - EDGE_EPSILON {
            trace!("Right resize of clip {} below minimum duration", clip.id);
            return None;
        }
        if let Some(limit) = clip.source_duration_limit() {
            if duration > limit {
                duration = limit;
                snapped_to = snapped_to.filter(|time| (time - (start + limit)).abs() <= EDGE_EPSILON);
            }
            if duration < self.min_clip_duration - EDGE_EPSILON {
                return None;
            }
        }

        let span = Span::new(start, duration);
        if has_collision(span, &store.clips_on_track(session.track_index), Some(clip.id)) {
            trace!("Right resize of clip {} collides", clip.id);
            return None;
        }
        Some(Candidate {
            start,
            duration,
            trim_in: None,
            snapped_to,
        })
    }
}
