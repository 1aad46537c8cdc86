use uuid::Uuid;

use crate::state::Clip;

/// Category of snap target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SnapTargetKind {
    /// Whole-second grid tick.
    Grid,
    /// Clip start or end edge.
    ClipEdge,
}

impl SnapTargetKind {
    /// Priority when a grid tick and a clip edge coincide.
    pub fn priority(self) -> i32 {
        match self {
            SnapTargetKind::ClipEdge => 2,
            SnapTargetKind::Grid => 1,
        }
    }
}

/// Snap target expressed in seconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SnapTarget {
    /// Time position of the target.
    pub time: f64,
    /// Target category.
    pub kind: SnapTargetKind,
    /// Clip id if this target comes from a clip edge.
    pub clip_id: Option<Uuid>,
}

impl SnapTarget {
    /// Build a grid target.
    pub fn grid(time: f64) -> Self {
        Self {
            time,
            kind: SnapTargetKind::Grid,
            clip_id: None,
        }
    }

    /// Build a clip-edge target.
    pub fn clip_edge(time: f64, clip_id: Uuid) -> Self {
        Self {
            time,
            kind: SnapTargetKind::ClipEdge,
            clip_id: Some(clip_id),
        }
    }
}

/// Result of a snap query.
#[derive(Clone, Copy, Debug)]
pub struct SnapMatch {
    /// Delta in seconds that should be applied to the source.
    pub delta: f64,
    /// The target that was snapped to.
    pub target: SnapTarget,
}

const SNAP_EPSILON: f64 = 1e-9;

/// Ascending, de-duplicated snap targets for one gesture.
#[derive(Clone, Debug, Default)]
pub struct SnapIndex {
    targets: Vec<SnapTarget>,
}

impl SnapIndex {
    pub fn targets(&self) -> &[SnapTarget] {
        &self.targets
    }

    /// Target times in ascending order.
    pub fn times(&self) -> Vec<f64> {
        self.targets.iter().map(|target| target.time).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Nearest target to `candidate` within `tolerance_px`; earlier wins ties.
    pub fn nearest(
        &self,
        candidate: f64,
        pixels_per_second: f64,
        tolerance_px: f64,
    ) -> Option<SnapTarget> {
        best_snap_delta(&[candidate], self, pixels_per_second, tolerance_px).map(|hit| hit.target)
    }
}

/// Collect grid ticks `0..=ceil(total)` plus the edges of every clip except
/// `exclude`, sorted ascending. Coinciding points keep the clip edge.
pub fn compute_snap_points(total_duration: f64, clips: &[Clip], exclude: Option<Uuid>) -> SnapIndex {
    let last_tick = if total_duration.is_finite() && total_duration > 0.0 {
        total_duration.ceil() as u64
    } else {
        0
    };

    let mut targets: Vec<SnapTarget> = (0..=last_tick).map(|s| SnapTarget::grid(s as f64)).collect();
    for clip in clips.iter().filter(|clip| Some(clip.id) != exclude) {
        targets.push(SnapTarget::clip_edge(clip.start_time, clip.id));
        targets.push(SnapTarget::clip_edge(clip.end_time(), clip.id));
    }

    targets.sort_by(|a, b| {
        a.time
            .total_cmp(&b.time)
            .then(b.kind.priority().cmp(&a.kind.priority()))
    });
    targets.dedup_by(|next, kept| (next.time - kept.time).abs() <= SNAP_EPSILON);

    SnapIndex { targets }
}

/// Nearest snap point to `candidate` whose pixel distance is within
/// `tolerance_px`. `snap_points` must be ascending; ties keep the earlier one.
pub fn find_nearest_snap(
    candidate: f64,
    snap_points: &[f64],
    pixels_per_second: f64,
    tolerance_px: f64,
) -> Option<f64> {
    let mut best: Option<(f64, f64)> = None;
    for &point in snap_points {
        let distance = (candidate - point).abs();
        if distance * pixels_per_second > tolerance_px {
            continue;
        }
        match best {
            Some((_, best_distance)) if distance + SNAP_EPSILON >= best_distance => {}
            _ => best = Some((point, distance)),
        }
    }
    best.map(|(point, _)| point)
}

/// Find the best snap delta between sources and targets within a threshold.
///
/// Sources are tried in order, so on equal distance the first source (e.g. a
/// clip's start edge before its end edge) and the earlier target win.
pub fn best_snap_delta(
    sources: &[f64],
    index: &SnapIndex,
    pixels_per_second: f64,
    tolerance_px: f64,
) -> Option<SnapMatch> {
    if sources.is_empty() || index.is_empty() || tolerance_px <= 0.0 || pixels_per_second <= 0.0 {
        return None;
    }

    let threshold = tolerance_px / pixels_per_second;
    let mut best_match: Option<SnapMatch> = None;
    let mut best_distance = f64::INFINITY;

    for &source in sources {
        for &target in &index.targets {
            let delta = target.time - source;
            let distance = delta.abs();
            if distance > threshold + SNAP_EPSILON {
                continue;
            }
            if distance + SNAP_EPSILON < best_distance {
                best_distance = distance;
                best_match = Some(SnapMatch { delta, target });
            }
        }
    }

    best_match
}

/// Convert seconds to frame units using the given fps.
pub fn frames_from_seconds(time_seconds: f64, fps: f64) -> f64 {
    time_seconds * fps.max(1.0)
}

/// Convert frame units back to seconds using the given fps.
pub fn seconds_from_frames(frames: f64, fps: f64) -> f64 {
    let fps = fps.max(1.0);
    frames / fps
}

/// Round a time value to the nearest frame boundary.
pub fn snap_time_to_frame(time_seconds: f64, fps: f64) -> f64 {
    let fps = fps.max(1.0);
    (time_seconds * fps).round() / fps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{ClipContent, ClipKind};

    fn clip(start: f64, duration: f64) -> Clip {
        Clip {
            id: Uuid::new_v4(),
            track_index: 0,
            start_time: start,
            duration,
            trim_in_seconds: 0.0,
            media: None,
            label: None,
            content: ClipContent::defaults_for(ClipKind::Video),
        }
    }

    #[test]
    fn test_snap_points_include_grid_and_edges() {
        let a = clip(0.0, 5.0);
        let b = clip(10.5, 2.0);
        let index = compute_snap_points(12.5, &[a.clone(), b.clone()], Some(a.id));
        let times = index.times();
        assert_eq!(times.first(), Some(&0.0));
        assert_eq!(times.last(), Some(&13.0));
        assert!(times.contains(&10.5));
        assert!(times.contains(&12.5));
        assert!(times.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_coinciding_points_keep_clip_edge() {
        let b = clip(10.0, 5.0);
        let index = compute_snap_points(15.0, &[b.clone()], None);
        let ten: Vec<_> = index.targets().iter().filter(|t| t.time == 10.0).collect();
        assert_eq!(ten.len(), 1);
        assert_eq!(ten[0].kind, SnapTargetKind::ClipEdge);
        assert_eq!(ten[0].clip_id, Some(b.id));
    }

    #[test]
    fn test_nearest_snap_within_tolerance() {
        let points = [0.0, 1.0, 2.0, 5.0];
        // 0.03s at 100px/s is 3px.
        assert_eq!(find_nearest_snap(4.97, &points, 100.0, 10.0), Some(5.0));
        assert_eq!(find_nearest_snap(4.97, &points, 1.0, 0.01), None);
        assert_eq!(find_nearest_snap(3.5, &points, 100.0, 10.0), None);
    }

    #[test]
    fn test_nearest_snap_prefers_earlier_on_tie() {
        let points = [1.0, 2.0];
        assert_eq!(find_nearest_snap(1.5, &points, 20.0, 10.0), Some(1.0));
        let index = compute_snap_points(2.0, &[], None);
        let hit = index.nearest(1.5, 20.0, 10.0).unwrap();
        assert_eq!(hit.time, 1.0);
    }

    #[test]
    fn test_best_snap_delta_picks_closest_source() {
        let other = clip(10.0, 5.0);
        let index = compute_snap_points(15.0, &[other], None);
        // Start at 3.4 (0.4 from grid), end at 9.98 (0.02 from the clip edge).
        let hit = best_snap_delta(&[3.4, 9.98], &index, 100.0, 10.0).unwrap();
        assert!((hit.delta - 0.02).abs() < 1e-9);
        assert_eq!(hit.target.kind, SnapTargetKind::ClipEdge);
        assert!(best_snap_delta(&[3.4], &index, 100.0, 10.0).is_none());
        assert!(best_snap_delta(&[], &index, 100.0, 10.0).is_none());
    }

    #[test]
    fn test_frame_helpers() {
        assert_eq!(frames_from_seconds(5.0, 30.0), 150.0);
        assert_eq!(seconds_from_frames(150.0, 30.0), 5.0);
        assert!((snap_time_to_frame(1.01, 30.0) - 1.0).abs() < 1e-9);
    }
}
