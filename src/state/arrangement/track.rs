use serde::{Deserialize, Serialize};

use super::{Clip, ClipKind};

/// The semantic binding of a track lane.
///
/// Tracks are not stored; a lane is just an index and its role decides which
/// clip kinds it accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackRole {
    /// Lane 0 - video clips only
    Video,
    /// Lane 1 - audio clips only
    Audio,
    /// Lane 2 - text clips only
    Text,
    /// Lane 3 - image clips only
    Image,
    /// Any other lane - accepts every kind
    Free,
}

impl TrackRole {
    /// Role of the lane at `index`.
    pub fn for_index(index: u32) -> Self {
        match index {
            0 => TrackRole::Video,
            1 => TrackRole::Audio,
            2 => TrackRole::Text,
            3 => TrackRole::Image,
            _ => TrackRole::Free,
        }
    }

    /// Returns true if clips of `kind` may be placed on this lane.
    pub fn accepts(self, kind: ClipKind) -> bool {
        match self {
            TrackRole::Video => kind == ClipKind::Video,
            TrackRole::Audio => kind == ClipKind::Audio,
            TrackRole::Text => kind == ClipKind::Text,
            TrackRole::Image => kind == ClipKind::Image,
            TrackRole::Free => true,
        }
    }

    /// Display name for the lane (e.g., "Video", "Track 6").
    pub fn label(self, index: u32) -> String {
        match self {
            TrackRole::Video => "Video".to_string(),
            TrackRole::Audio => "Audio".to_string(),
            TrackRole::Text => "Text".to_string(),
            TrackRole::Image => "Image".to_string(),
            TrackRole::Free => format!("Track {}", index + 1),
        }
    }
}

/// Returns true if a clip of `kind` may land on lane `index`.
pub fn track_accepts(index: u32, kind: ClipKind) -> bool {
    TrackRole::for_index(index).accepts(kind)
}

/// Number of lanes to show: `max(min_count, highest used index + buffer)`.
pub fn visible_track_count(clips: &[Clip], min_count: usize, buffer: usize) -> usize {
    let highest = clips.iter().map(|clip| clip.track_index as usize).max();
    match highest {
        Some(highest) => min_count.max(highest + buffer),
        None => min_count,
    }
}

/// A lane derived by grouping clips on their track index.
#[derive(Debug, Clone)]
pub struct TrackLane<'a> {
    pub index: u32,
    pub role: TrackRole,
    /// Clips on this lane, ordered by start time
    pub clips: Vec<&'a Clip>,
}

impl TrackLane<'_> {
    pub fn label(&self) -> String {
        self.role.label(self.index)
    }
}

/// Group clips into `count` lanes.
pub fn group_tracks(clips: &[Clip], count: usize) -> Vec<TrackLane<'_>> {
    (0..count as u32)
        .map(|index| {
            let mut lane_clips: Vec<&Clip> =
                clips.iter().filter(|clip| clip.track_index == index).collect();
            lane_clips.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
            TrackLane {
                index,
                role: TrackRole::for_index(index),
                clips: lane_clips,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ClipContent;
    use uuid::Uuid;

    fn clip_on(track_index: u32, start: f64) -> Clip {
        Clip {
            id: Uuid::new_v4(),
            track_index,
            start_time: start,
            duration: 1.0,
            trim_in_seconds: 0.0,
            media: None,
            label: None,
            content: ClipContent::defaults_for(ClipKind::Text),
        }
    }

    #[test]
    fn test_fixed_lanes_are_typed() {
        assert!(track_accepts(0, ClipKind::Video));
        assert!(!track_accepts(0, ClipKind::Audio));
        assert!(track_accepts(1, ClipKind::Audio));
        assert!(!track_accepts(1, ClipKind::Video));
        assert!(track_accepts(2, ClipKind::Text));
        assert!(track_accepts(3, ClipKind::Image));
        assert!(!track_accepts(3, ClipKind::Subtitle));
    }

    #[test]
    fn test_free_lanes_accept_anything() {
        for kind in [
            ClipKind::Video,
            ClipKind::Audio,
            ClipKind::Image,
            ClipKind::Text,
            ClipKind::Subtitle,
        ] {
            assert!(track_accepts(4, kind));
            assert!(track_accepts(17, kind));
        }
    }

    #[test]
    fn test_visible_track_count() {
        assert_eq!(visible_track_count(&[], 5, 2), 5);
        assert_eq!(visible_track_count(&[clip_on(2, 0.0)], 5, 2), 5);
        assert_eq!(visible_track_count(&[clip_on(7, 0.0)], 5, 2), 9);
    }

    #[test]
    fn test_group_tracks_sorts_lanes() {
        let clips = vec![clip_on(4, 3.0), clip_on(4, 1.0), clip_on(0, 0.0)];
        let lanes = group_tracks(&clips, 5);
        assert_eq!(lanes.len(), 5);
        assert_eq!(lanes[0].clips.len(), 1);
        assert_eq!(lanes[4].clips[0].start_time, 1.0);
        assert_eq!(lanes[4].label(), "Track 5");
        assert_eq!(lanes[1].role, TrackRole::Audio);
    }
}
