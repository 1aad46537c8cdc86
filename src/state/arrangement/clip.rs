use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{
    DEFAULT_SUBTITLE_BACKGROUND, DEFAULT_SUBTITLE_COLOR, DEFAULT_SUBTITLE_FONT_SIZE,
    DEFAULT_TEXT_COLOR, DEFAULT_TEXT_FONT_FAMILY, DEFAULT_TEXT_FONT_SIZE,
};
use crate::core::collision::Span;
use crate::state::MediaReference;

/// The kind of content a clip carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipKind {
    Video,
    Audio,
    Image,
    Text,
    Subtitle,
}

/// Transform controls for a visual clip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipTransform {
    /// Horizontal translation in project pixels.
    pub position_x: f32,
    /// Vertical translation in project pixels.
    pub position_y: f32,
    /// Uniform scale factor.
    pub scale: f32,
    /// Rotation in degrees.
    pub rotation_deg: f32,
    /// Opacity from 0.0 (transparent) to 1.0 (opaque).
    pub opacity: f32,
}

impl Default for ClipTransform {
    fn default() -> Self {
        Self {
            position_x: 0.0,
            position_y: 0.0,
            scale: 1.0,
            rotation_deg: 0.0,
            opacity: 1.0,
        }
    }
}

/// One cue of a subtitle clip, relative to the clip start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleEntry {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// Styling shared by every cue in a subtitle clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubtitleStyle {
    pub font_size: f32,
    pub color: String,
    pub background: String,
    /// Vertical anchor as a fraction of frame height (0 = top, 1 = bottom).
    pub position_y: f32,
}

impl Default for SubtitleStyle {
    fn default() -> Self {
        Self {
            font_size: DEFAULT_SUBTITLE_FONT_SIZE,
            color: DEFAULT_SUBTITLE_COLOR.to_string(),
            background: DEFAULT_SUBTITLE_BACKGROUND.to_string(),
            position_y: 0.9,
        }
    }
}

/// Kind-specific clip properties. Each variant only carries what applies to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClipContent {
    Video {
        #[serde(default = "default_volume")]
        volume: f32,
        #[serde(default)]
        transform: ClipTransform,
    },
    Audio {
        #[serde(default = "default_volume")]
        volume: f32,
    },
    Image {
        #[serde(default)]
        transform: ClipTransform,
    },
    Text {
        #[serde(default)]
        text: String,
        #[serde(default = "default_font_family")]
        font_family: String,
        #[serde(default = "default_font_size")]
        font_size: f32,
        #[serde(default = "default_text_color")]
        color: String,
        #[serde(default)]
        transform: ClipTransform,
    },
    Subtitle {
        #[serde(default)]
        entries: Vec<SubtitleEntry>,
        #[serde(default)]
        style: SubtitleStyle,
    },
}

impl ClipContent {
    /// Default properties for a freshly created clip of `kind`.
    pub fn defaults_for(kind: ClipKind) -> Self {
        match kind {
            ClipKind::Video => ClipContent::Video {
                volume: default_volume(),
                transform: ClipTransform::default(),
            },
            ClipKind::Audio => ClipContent::Audio {
                volume: default_volume(),
            },
            ClipKind::Image => ClipContent::Image {
                transform: ClipTransform::default(),
            },
            ClipKind::Text => ClipContent::Text {
                text: String::new(),
                font_family: default_font_family(),
                font_size: default_font_size(),
                color: default_text_color(),
                transform: ClipTransform::default(),
            },
            ClipKind::Subtitle => ClipContent::Subtitle {
                entries: Vec::new(),
                style: SubtitleStyle::default(),
            },
        }
    }

    pub fn kind(&self) -> ClipKind {
        match self {
            ClipContent::Video { .. } => ClipKind::Video,
            ClipContent::Audio { .. } => ClipKind::Audio,
            ClipContent::Image { .. } => ClipKind::Image,
            ClipContent::Text { .. } => ClipKind::Text,
            ClipContent::Subtitle { .. } => ClipKind::Subtitle,
        }
    }

    /// Playback volume for clips that carry sound.
    pub fn volume(&self) -> Option<f32> {
        match self {
            ClipContent::Video { volume, .. } | ClipContent::Audio { volume } => Some(*volume),
            _ => None,
        }
    }

    /// Compositing transform for visual clips.
    pub fn transform(&self) -> Option<&ClipTransform> {
        match self {
            ClipContent::Video { transform, .. }
            | ClipContent::Image { transform }
            | ClipContent::Text { transform, .. } => Some(transform),
            _ => None,
        }
    }

    /// Split content at `offset` seconds into the clip. Subtitle cues are
    /// partitioned and re-based; everything else is shared.
    fn split_at(&self, offset: f64) -> (ClipContent, ClipContent) {
        match self {
            ClipContent::Subtitle { entries, style } => {
                let head = entries
                    .iter()
                    .filter(|entry| entry.start < offset)
                    .map(|entry| SubtitleEntry {
                        start: entry.start,
                        end: entry.end.min(offset),
                        text: entry.text.clone(),
                    })
                    .collect();
                let tail = entries
                    .iter()
                    .filter(|entry| entry.end > offset)
                    .map(|entry| SubtitleEntry {
                        start: (entry.start - offset).max(0.0),
                        end: entry.end - offset,
                        text: entry.text.clone(),
                    })
                    .collect();
                (
                    ClipContent::Subtitle {
                        entries: head,
                        style: style.clone(),
                    },
                    ClipContent::Subtitle {
                        entries: tail,
                        style: style.clone(),
                    },
                )
            }
            other => (other.clone(), other.clone()),
        }
    }
}

/// A clip placed on a track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    /// Unique identifier
    pub id: Uuid,
    /// The track lane this clip is on
    pub track_index: u32,
    /// Start time in seconds
    pub start_time: f64,
    /// Duration in seconds
    pub duration: f64,
    /// Trim-in time in seconds (offset into source media)
    #[serde(default)]
    pub trim_in_seconds: f64,
    /// The media this clip plays, if any (text clips have none)
    #[serde(default)]
    pub media: Option<MediaReference>,
    /// Optional user-facing label for this clip instance.
    #[serde(default)]
    pub label: Option<String>,
    /// Kind-specific properties
    pub content: ClipContent,
}

impl Clip {
    pub fn kind(&self) -> ClipKind {
        self.content.kind()
    }

    /// Get the end time of this clip
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    /// Check if this clip overlaps with a half-open time range
    pub fn overlaps(&self, start: f64, end: f64) -> bool {
        self.start_time < end && self.end_time() > start
    }

    /// Longest duration the source allows from the current trim-in, if bounded.
    pub fn source_duration_limit(&self) -> Option<f64> {
        let media = self.media.as_ref()?;
        if !media.kind.is_timed() {
            return None;
        }
        media
            .duration_seconds
            .map(|duration| (duration - self.trim_in_seconds).max(0.0))
    }

    /// Returns true if resizing from the left edge moves the source in-point.
    pub fn has_source_trim(&self) -> bool {
        self.media
            .as_ref()
            .map(|media| media.kind.is_timed())
            .unwrap_or(false)
    }

    /// Cut the clip `offset` seconds after its start into two fresh clips.
    /// Returns None unless both parts are at least `min_part` long.
    pub fn split_at(&self, offset: f64, min_part: f64) -> Option<(Clip, Clip)> {
        if !offset.is_finite() || offset < min_part || self.duration - offset < min_part {
            return None;
        }
        let (head_span, tail_span) = Span::of(self).split_at(offset)?;
        let (head_content, tail_content) = self.content.split_at(offset);
        let head = Clip {
            id: Uuid::new_v4(),
            duration: head_span.duration,
            content: head_content,
            ..self.clone()
        };
        let tail = Clip {
            id: Uuid::new_v4(),
            start_time: tail_span.start,
            duration: tail_span.duration,
            trim_in_seconds: if self.has_source_trim() {
                self.trim_in_seconds + head_span.duration
            } else {
                self.trim_in_seconds
            },
            content: tail_content,
            ..self.clone()
        };
        Some((head, tail))
    }
}

/// A clip about to be added to the store. Unset id and track are assigned on insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewClip {
    pub id: Option<Uuid>,
    pub track_index: Option<u32>,
    pub start_time: f64,
    pub duration: f64,
    pub trim_in_seconds: f64,
    pub media: Option<MediaReference>,
    pub label: Option<String>,
    pub content: ClipContent,
}

impl NewClip {
    /// A clip of `kind` with default properties.
    pub fn new(kind: ClipKind, start_time: f64, duration: f64) -> Self {
        Self {
            id: None,
            track_index: None,
            start_time,
            duration,
            trim_in_seconds: 0.0,
            media: None,
            label: None,
            content: ClipContent::defaults_for(kind),
        }
    }

    /// A clip playing `media`, typed after the media kind.
    pub fn from_media(media: MediaReference, start_time: f64, duration: f64) -> Self {
        let mut clip = Self::new(media.kind.clip_kind(), start_time, duration);
        clip.label = Some(media.name.clone()).filter(|name| !name.trim().is_empty());
        clip.media = Some(media);
        clip
    }

    pub fn on_track(mut self, track_index: u32) -> Self {
        self.track_index = Some(track_index);
        self
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_content(mut self, content: ClipContent) -> Self {
        self.content = content;
        self
    }

    pub fn kind(&self) -> ClipKind {
        self.content.kind()
    }
}

impl From<Clip> for NewClip {
    fn from(clip: Clip) -> Self {
        Self {
            id: Some(clip.id),
            track_index: Some(clip.track_index),
            start_time: clip.start_time,
            duration: clip.duration,
            trim_in_seconds: clip.trim_in_seconds,
            media: clip.media,
            label: clip.label,
            content: clip.content,
        }
    }
}

/// Partial update for an existing clip. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClipPatch {
    pub start_time: Option<f64>,
    pub duration: Option<f64>,
    pub track_index: Option<u32>,
    pub trim_in_seconds: Option<f64>,
    pub media: Option<Option<MediaReference>>,
    pub label: Option<Option<String>>,
    pub content: Option<ClipContent>,
}

impl ClipPatch {
    pub fn start(start_time: f64) -> Self {
        Self {
            start_time: Some(start_time),
            ..Default::default()
        }
    }

    pub fn span(start_time: f64, duration: f64) -> Self {
        Self {
            start_time: Some(start_time),
            duration: Some(duration),
            ..Default::default()
        }
    }

    pub fn duration(duration: f64) -> Self {
        Self {
            duration: Some(duration),
            ..Default::default()
        }
    }

    pub fn with_trim_in(mut self, trim_in_seconds: f64) -> Self {
        self.trim_in_seconds = Some(trim_in_seconds);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply onto a copy of `clip`. Content of a different kind is rejected.
    pub(crate) fn applied_to(&self, clip: &Clip) -> Option<Clip> {
        if let Some(content) = &self.content {
            if content.kind() != clip.kind() {
                return None;
            }
        }
        let mut next = clip.clone();
        if let Some(start_time) = self.start_time {
            next.start_time = start_time;
        }
        if let Some(duration) = self.duration {
            next.duration = duration;
        }
        if let Some(track_index) = self.track_index {
            next.track_index = track_index;
        }
        if let Some(trim_in) = self.trim_in_seconds {
            next.trim_in_seconds = trim_in;
        }
        if let Some(media) = &self.media {
            next.media = media.clone();
        }
        if let Some(label) = &self.label {
            next.label = label.clone();
        }
        if let Some(content) = &self.content {
            next.content = content.clone();
        }
        Some(next)
    }
}

fn default_volume() -> f32 {
    1.0
}

fn default_font_family() -> String {
    DEFAULT_TEXT_FONT_FAMILY.to_string()
}

fn default_font_size() -> f32 {
    DEFAULT_TEXT_FONT_SIZE
}

fn default_text_color() -> String {
    DEFAULT_TEXT_COLOR.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn test_clip_overlap() {
        let clip = clip(5.0, 10.0);
        assert!(clip.overlaps(0.0, 10.0)); // Overlaps start
        assert!(clip.overlaps(10.0, 20.0)); // Overlaps end
        assert!(clip.overlaps(7.0, 12.0)); // Overlaps middle
        assert!(!clip.overlaps(0.0, 5.0)); // Just before
        assert!(!clip.overlaps(15.0, 20.0)); // Just after
    }

    #[test]
    fn test_kind_defaults() {
        assert_eq!(ClipContent::defaults_for(ClipKind::Audio).volume(), Some(1.0));
        match ClipContent::defaults_for(ClipKind::Text) {
            ClipContent::Text { font_size, .. } => assert_eq!(font_size, 24.0),
            other => panic!("unexpected content {:?}", other),
        }
        assert!(ClipContent::defaults_for(ClipKind::Subtitle).transform().is_none());
    }

    #[test]
    fn test_partial_text_json_gets_defaults() {
        let content: ClipContent =
            serde_json::from_str(r#"{ "kind": "text", "text": "Hello" }"#).unwrap();
        match content {
            ClipContent::Text {
                text,
                font_size,
                transform,
                ..
            } => {
                assert_eq!(text, "Hello");
                assert_eq!(font_size, 24.0);
                assert_eq!(transform, ClipTransform::default());
            }
            other => panic!("unexpected content {:?}", other),
        }
    }

    #[test]
    fn test_split_reconstructs_interval() {
        let original = clip(2.0, 8.0);
        let (head, tail) = original.split_at(4.0, 0.1).unwrap();
        assert_eq!(head.start_time, 2.0);
        assert_eq!(head.end_time(), 6.0);
        assert_eq!(tail.start_time, 6.0);
        assert_eq!(tail.end_time(), 10.0);
        assert_ne!(head.id, original.id);
        assert_ne!(tail.id, head.id);
    }

    #[test]
    fn test_split_tail_ends_where_the_original_did() {
        let original = clip(199.0 * 0.1, 97.0 * 0.1);
        let (head, tail) = original.split_at(94.0 * 0.1, 0.1).unwrap();
        assert_eq!(head.end_time(), tail.start_time);
        assert_eq!(tail.end_time(), original.end_time());
    }

    #[test]
    fn test_split_rejects_short_parts() {
        let original = clip(0.0, 1.0);
        assert!(original.split_at(0.05, 0.1).is_none());
        assert!(original.split_at(0.95, 0.1).is_none());
        assert!(original.split_at(0.5, 0.1).is_some());
    }

    #[test]
    fn test_split_advances_media_trim() {
        let mut original = clip(0.0, 6.0);
        original.media = Some(MediaReference::new_video("Shot", "video/shot.mp4").with_duration(10.0));
        original.trim_in_seconds = 1.0;
        let (head, tail) = original.split_at(2.0, 0.1).unwrap();
        assert_eq!(head.trim_in_seconds, 1.0);
        assert_eq!(tail.trim_in_seconds, 3.0);
        assert_eq!(tail.source_duration_limit(), Some(7.0));
    }

    #[test]
    fn test_split_partitions_subtitle_cues() {
        let mut original = clip(0.0, 10.0);
        original.content = ClipContent::Subtitle {
            entries: vec![
                SubtitleEntry { start: 0.0, end: 3.0, text: "one".into() },
                SubtitleEntry { start: 4.0, end: 6.0, text: "two".into() },
                SubtitleEntry { start: 7.0, end: 9.0, text: "three".into() },
            ],
            style: SubtitleStyle::default(),
        };
        let (head, tail) = original.split_at(5.0, 0.1).unwrap();
        let ClipContent::Subtitle { entries: head_cues, .. } = head.content else {
            panic!("head lost its subtitle content");
        };
        let ClipContent::Subtitle { entries: tail_cues, .. } = tail.content else {
            panic!("tail lost its subtitle content");
        };
        assert_eq!(head_cues.len(), 2);
        assert_eq!(head_cues[1].end, 5.0);
        assert_eq!(tail_cues.len(), 2);
        assert_eq!(tail_cues[0].start, 0.0);
        assert_eq!(tail_cues[1].start, 2.0);
    }

    #[test]
    fn test_patch_rejects_kind_change() {
        let original = clip(0.0, 2.0);
        let patch = ClipPatch {
            content: Some(ClipContent::defaults_for(ClipKind::Audio)),
            ..Default::default()
        };
        assert!(patch.applied_to(&original).is_none());
        assert!(ClipPatch::default().is_empty());
        assert_eq!(ClipPatch::default().applied_to(&original).unwrap(), original);
    }
}
