//! Overlap checks between clips sharing a track.
//!
//! Placement policy is strict: a move that would collide is not committed at
//! all. Nothing here searches for the nearest free slot.

use uuid::Uuid;

use crate::state::Clip;

/// A half-open time interval `[start, start + duration)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    pub start: f64,
    pub duration: f64,
}

impl Span {
    pub fn new(start: f64, duration: f64) -> Self {
        Self { start, duration }
    }

    pub fn of(clip: &Clip) -> Self {
        Self::new(clip.start_time, clip.duration)
    }

    /// The span from `start` to `end`, with its computed end landing on `end`
    /// whenever a representable duration allows it and never past it.
    pub fn between(start: f64, end: f64) -> Self {
        let mut duration = end - start;
        if start.is_finite() && duration.is_finite() {
            while start + duration > end {
                duration = next_float(duration, false);
            }
            while start + duration < end && start + next_float(duration, true) <= end {
                duration = next_float(duration, true);
            }
        }
        Self::new(start, duration)
    }

    /// The span of `duration` ending at `end`, with the same landing rule as
    /// [`Span::between`].
    pub fn ending_at(end: f64, duration: f64) -> Self {
        let mut start = end - duration;
        if start.is_finite() && duration.is_finite() {
            while start + duration > end {
                start = next_float(start, false);
            }
            while start + duration < end && next_float(start, true) + duration <= end {
                start = next_float(start, true);
            }
        }
        Self::new(start, duration)
    }

    /// Cut `offset` seconds after the start into two spans that meet exactly
    /// and together end exactly where this one does. The cut may move by a
    /// few ulps to make that hold; None if no nearby cut does.
    pub fn split_at(&self, offset: f64) -> Option<(Span, Span)> {
        let end = self.end();
        let cut = self.start + offset;
        if !cut.is_finite() || !end.is_finite() {
            return None;
        }
        let (mut above, mut below) = (cut, cut);
        let mut candidates = vec![cut];
        for _ in 0..4 {
            above = next_float(above, true);
            below = next_float(below, false);
            candidates.extend([above, below]);
        }
        candidates.into_iter().find_map(|at| {
            let head = Span::between(self.start, at);
            let tail = Span::between(at, end);
            (head.end() == at && tail.end() == end && head.duration > 0.0 && tail.duration > 0.0)
                .then_some((head, tail))
        })
    }

    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    /// Finite, non-negative start and strictly positive duration.
    pub fn is_well_formed(&self) -> bool {
        self.start.is_finite() && self.duration.is_finite() && self.start >= 0.0 && self.duration > 0.0
    }
}

/// The adjacent representable value above (`up`) or below a finite `x`.
fn next_float(x: f64, up: bool) -> f64 {
    if x == 0.0 {
        let tiny = f64::from_bits(1);
        return if up { tiny } else { -tiny };
    }
    let bits = x.to_bits();
    if (x > 0.0) == up {
        f64::from_bits(bits + 1)
    } else {
        f64::from_bits(bits - 1)
    }
}

/// Half-open overlap test; touching endpoints do not overlap.
pub fn overlaps(a: Span, b: Span) -> bool {
    a.start < b.end() && a.end() > b.start
}

/// Returns true if `candidate` overlaps any clip other than `exclude`.
pub fn has_collision(candidate: Span, track_clips: &[&Clip], exclude: Option<Uuid>) -> bool {
    track_clips
        .iter()
        .filter(|clip| Some(clip.id) != exclude)
        .any(|clip| overlaps(candidate, Span::of(clip)))
}

/// Resolve where `clip` may move when asked to start at `desired_start`.
///
/// The desired start is bounded to `[0, total_duration - duration]`. If that
/// position collides with another clip on the track, the clip keeps its
/// current start.
pub fn find_valid_position(
    clip: &Clip,
    desired_start: f64,
    track_clips: &[&Clip],
    total_duration: f64,
) -> f64 {
    if !desired_start.is_finite() {
        return clip.start_time;
    }
    let max_start = (total_duration - clip.duration).max(0.0);
    let start = desired_start.clamp(0.0, max_start);
    if has_collision(Span::new(start, clip.duration), track_clips, Some(clip.id)) {
        clip.start_time
    } else {
        start
    }
}
