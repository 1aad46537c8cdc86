use log::{debug, trace, warn};
use uuid::Uuid;

use crate::core::collision::{has_collision, Span};
use crate::state::SelectionState;

use super::{track_accepts, Clip, ClipPatch, NewClip};

/// The authoritative timeline model.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineState {
    /// All clips placed on tracks
    pub clips: Vec<Clip>,
    /// Current selection
    pub selection: SelectionState,
    /// Max end time over all clips; only shrinks when a removal recomputes it
    pub total_duration: f64,
    /// Playhead position, always within `[0, total_duration]`
    pub current_time: f64,
    pub is_playing: bool,
    /// Master volume, 0.0..=1.0
    pub volume: f64,
}

impl Default for TimelineState {
    fn default() -> Self {
        Self {
            clips: Vec::new(),
            selection: SelectionState::default(),
            total_duration: 0.0,
            current_time: 0.0,
            is_playing: false,
            volume: 1.0,
        }
    }
}

/// Single-writer owner of [`TimelineState`].
///
/// Every mutation goes through the methods below, each of which leaves the
/// state consistent: clips on one track never overlap, spans are well formed
/// and the playhead stays in range. Invalid requests are logged no-ops.
#[derive(Debug, Clone, Default)]
pub struct TimelineStore {
    state: TimelineState,
    revision: u64,
}

impl TimelineStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &TimelineState {
        &self.state
    }

    /// Bumped on every committed mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn clips(&self) -> &[Clip] {
        &self.state.clips
    }

    /// Find a clip by ID
    pub fn clip(&self, id: Uuid) -> Option<&Clip> {
        self.state.clips.iter().find(|c| c.id == id)
    }

    /// Get all clips on a specific track
    pub fn clips_on_track(&self, track_index: u32) -> Vec<&Clip> {
        self.state
            .clips
            .iter()
            .filter(|c| c.track_index == track_index)
            .collect()
    }

    /// Get all clips that overlap a time range
    pub fn clips_in_range(&self, start: f64, end: f64) -> Vec<&Clip> {
        self.state.clips.iter().filter(|c| c.overlaps(start, end)).collect()
    }

    pub fn total_duration(&self) -> f64 {
        self.state.total_duration
    }

    pub fn current_time(&self) -> f64 {
        self.state.current_time
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing
    }

    pub fn volume(&self) -> f64 {
        self.state.volume
    }

    pub fn selected_clip_id(&self) -> Option<Uuid> {
        self.state.selection.primary_clip()
    }

    pub fn selected_clip(&self) -> Option<&Clip> {
        self.selected_clip_id().and_then(|id| self.clip(id))
    }

    /// Returns true if `span` fits on `track_index` without touching other clips.
    pub fn is_placement_free(&self, track_index: u32, span: Span, exclude: Option<Uuid>) -> bool {
        span.is_well_formed() && !has_collision(span, &self.clips_on_track(track_index), exclude)
    }

    /// Add a clip. Assigns an id when unset, and a track when unset: the first
    /// lane past the highest used one that accepts the clip kind.
    ///
    /// Returns None (and changes nothing) for malformed spans, duplicate ids,
    /// incompatible tracks or collisions.
    pub fn add_clip(&mut self, new_clip: NewClip) -> Option<Uuid> {
        let span = Span::new(new_clip.start_time, new_clip.duration);
        if !span.is_well_formed() {
            warn!(
                "Rejected clip with invalid span: start={} duration={}",
                new_clip.start_time, new_clip.duration
            );
            return None;
        }

        let id = new_clip.id.unwrap_or_else(Uuid::new_v4);
        if self.clip(id).is_some() {
            warn!("Rejected clip with duplicate id {}", id);
            return None;
        }

        let kind = new_clip.kind();
        let track_index = new_clip.track_index.unwrap_or_else(|| {
            let next = self
                .state
                .clips
                .iter()
                .map(|c| c.track_index + 1)
                .max()
                .unwrap_or(0);
            // Free lanes accept every kind, so this always terminates.
            (next..)
                .find(|&index| track_accepts(index, kind))
                .unwrap_or(next)
        });
        if !track_accepts(track_index, kind) {
            trace!("Track {} does not accept {:?} clips", track_index, kind);
            return None;
        }
        if !self.is_placement_free(track_index, span, None) {
            trace!("Clip placement collides on track {}", track_index);
            return None;
        }

        let clip = Clip {
            id,
            track_index,
            start_time: new_clip.start_time,
            duration: new_clip.duration,
            trim_in_seconds: new_clip.trim_in_seconds.max(0.0),
            media: new_clip.media,
            label: new_clip.label,
            content: new_clip.content,
        };
        debug!(
            "Added {:?} clip {} on track {} at {:.3}s for {:.3}s",
            kind, id, track_index, clip.start_time, clip.duration
        );
        self.state.clips.push(clip);
        self.extend_total_duration();
        self.bump();
        Some(id)
    }

    /// Merge `patch` into a clip.
    ///
    /// Controllers validate placement before calling; the store still refuses
    /// any patch that would break its invariants and returns false.
    pub fn update_clip(&mut self, id: Uuid, patch: ClipPatch) -> bool {
        let Some(index) = self.state.clips.iter().position(|c| c.id == id) else {
            trace!("Update for unknown clip {}", id);
            return false;
        };
        if patch.is_empty() {
            return true;
        }
        let Some(next) = patch.applied_to(&self.state.clips[index]) else {
            warn!("Rejected patch changing the kind of clip {}", id);
            return false;
        };

        let span = Span::of(&next);
        if !span.is_well_formed() || !next.trim_in_seconds.is_finite() || next.trim_in_seconds < 0.0 {
            trace!("Rejected patch with invalid span for clip {}", id);
            return false;
        }
        if !track_accepts(next.track_index, next.kind()) {
            trace!("Rejected move of clip {} to incompatible track {}", id, next.track_index);
            return false;
        }
        if !self.is_placement_free(next.track_index, span, Some(id)) {
            trace!("Rejected patch colliding on track {} for clip {}", next.track_index, id);
            return false;
        }

        if self.state.clips[index] != next {
            self.state.clips[index] = next;
            self.extend_total_duration();
            self.bump();
        }
        true
    }

    /// Remove a clip by ID
    pub fn remove_clip(&mut self, id: Uuid) -> bool {
        let len = self.state.clips.len();
        self.state.clips.retain(|c| c.id != id);
        if self.state.clips.len() == len {
            return false;
        }
        self.state.selection.remove_clip(id);
        self.recompute_total_duration();
        debug!("Removed clip {}", id);
        self.bump();
        true
    }

    /// Replace a clip with two halves cut `offset` seconds after its start.
    /// The first half becomes the selection.
    pub fn split_clip(&mut self, id: Uuid, offset: f64, min_part: f64) -> Option<(Uuid, Uuid)> {
        let index = self.state.clips.iter().position(|c| c.id == id)?;
        let (head, tail) = self.state.clips[index].split_at(offset, min_part)?;
        let ids = (head.id, tail.id);

        // Both halves cover exactly the original footprint.
        let fits = |clip: &Clip| self.is_placement_free(clip.track_index, Span::of(clip), Some(id));
        if !fits(&head) || !fits(&tail) {
            warn!("Rejected split of clip {}: a half would overlap its neighbours", id);
            return None;
        }
        self.state.clips.splice(index..=index, [head, tail]);
        self.state.selection.select_clip(Some(ids.0));
        debug!("Split clip {} at +{:.3}s into {} and {}", id, offset, ids.0, ids.1);
        self.bump();
        Some(ids)
    }

    /// Move a clip to the nearest compatible track above (-1) or below (+1)
    /// where it fits without collision.
    pub fn move_clip_to_adjacent_track(&mut self, id: Uuid, direction: i32) -> bool {
        if direction == 0 {
            return false;
        }
        let Some(clip) = self.clip(id) else {
            return false;
        };
        let kind = clip.kind();
        let span = Span::of(clip);
        let step = direction.signum() as i64;

        // Free lanes are unbounded below; look a reasonable distance past the
        // highest used lane.
        let highest = self.state.clips.iter().map(|c| c.track_index).max().unwrap_or(0) as i64;
        let mut index = clip.track_index as i64 + step;
        while index >= 0 && index <= highest + 1 {
            let track_index = index as u32;
            if track_accepts(track_index, kind) && self.is_placement_free(track_index, span, Some(id)) {
                return self.update_clip(
                    id,
                    ClipPatch {
                        track_index: Some(track_index),
                        ..Default::default()
                    },
                );
            }
            index += step;
        }
        false
    }

    /// Record a probed source duration for `media_id`.
    ///
    /// Clips still carrying the unprobed media get the duration attached;
    /// those whose length is still the `placeholder` adopt the probed length
    /// when it fits on their track. Returns the number of clips touched.
    pub fn apply_media_duration(&mut self, media_id: Uuid, duration_seconds: f64, placeholder: f64) -> usize {
        if !duration_seconds.is_finite() || duration_seconds <= 0.0 {
            return 0;
        }
        let pending: Vec<Uuid> = self
            .state
            .clips
            .iter()
            .filter(|c| {
                c.media
                    .as_ref()
                    .map(|m| m.id == media_id && m.duration_seconds.is_none())
                    .unwrap_or(false)
            })
            .map(|c| c.id)
            .collect();

        let mut touched = 0;
        for id in pending {
            let Some(clip) = self.clip(id) else {
                continue;
            };
            let mut media = clip.media.clone();
            if let Some(media) = media.as_mut() {
                media.set_duration_seconds(Some(duration_seconds));
            }
            let mut patch = ClipPatch {
                media: Some(media),
                ..Default::default()
            };
            if (clip.duration - placeholder).abs() < 1e-9 {
                let fitted = (duration_seconds - clip.trim_in_seconds).max(0.0);
                let span = Span::new(clip.start_time, fitted);
                if self.is_placement_free(clip.track_index, span, Some(id)) {
                    patch.duration = Some(fitted);
                } else {
                    debug!("Probed duration for clip {} would collide; keeping placeholder", id);
                }
            }
            if self.update_clip(id, patch) {
                touched += 1;
            }
        }
        touched
    }

    /// Select a clip, or clear the clip selection with None.
    pub fn select_clip(&mut self, id: Option<Uuid>) {
        let id = id.filter(|id| self.clip(*id).is_some());
        if self.state.selection.clip_id != id {
            self.state.selection.select_clip(id);
            self.bump();
        }
    }

    /// Move the playhead, clamped to `[0, total_duration]`.
    pub fn set_current_time(&mut self, time: f64) {
        if !time.is_finite() {
            return;
        }
        let clamped = time.clamp(0.0, self.state.total_duration);
        if clamped != self.state.current_time {
            self.state.current_time = clamped;
            self.bump();
        }
    }

    pub fn set_playing(&mut self, playing: bool) {
        if self.state.is_playing != playing {
            self.state.is_playing = playing;
            self.bump();
        }
    }

    /// Set the master volume, clamped to `[0, 1]`.
    pub fn set_volume(&mut self, volume: f64) {
        if !volume.is_finite() {
            return;
        }
        let clamped = volume.clamp(0.0, 1.0);
        if clamped != self.state.volume {
            self.state.volume = clamped;
            self.bump();
        }
    }

    /// Replace the whole state after validating it clip by clip.
    pub(crate) fn replace_clips(&mut self, clips: Vec<Clip>, total_duration: f64) -> usize {
        self.state = TimelineState::default();
        let mut dropped = 0;
        for clip in clips {
            if self.add_clip(NewClip::from(clip)).is_none() {
                dropped += 1;
            }
        }
        if total_duration.is_finite() && total_duration > self.state.total_duration {
            self.state.total_duration = total_duration;
        }
        self.bump();
        dropped
    }

    fn max_clip_end(&self) -> f64 {
        self.state.clips.iter().map(|c| c.end_time()).fold(0.0, f64::max)
    }

    fn extend_total_duration(&mut self) {
        self.state.total_duration = self.state.total_duration.max(self.max_clip_end());
    }

    fn recompute_total_duration(&mut self) {
        self.state.total_duration = self.max_clip_end();
        self.state.current_time = self.state.current_time.clamp(0.0, self.state.total_duration);
    }

    fn bump(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}
