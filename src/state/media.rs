//! Media references
//!
//! Media references point at content owned by the media library (imported
//! files, generated assets). The timeline only reads them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ClipKind;

/// The kind of media a reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    /// A video file
    Video,
    /// An audio file
    Audio,
    /// A still image
    Image,
    /// A subtitle file (already parsed by the library)
    Subtitle,
}

impl MediaKind {
    /// The clip kind created when this media lands on the timeline.
    pub fn clip_kind(self) -> ClipKind {
        match self {
            MediaKind::Video => ClipKind::Video,
            MediaKind::Audio => ClipKind::Audio,
            MediaKind::Image => ClipKind::Image,
            MediaKind::Subtitle => ClipKind::Subtitle,
        }
    }

    /// Returns true if the source has an intrinsic length that bounds clip duration.
    pub fn is_timed(self) -> bool {
        matches!(self, MediaKind::Video | MediaKind::Audio)
    }
}

/// A media asset known to the library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaReference {
    /// Unique identifier
    pub id: Uuid,
    /// User-facing display name
    #[serde(default)]
    pub name: String,
    /// What kind of content this is
    pub kind: MediaKind,
    /// Opaque handle to the bytes (path or URL); never interpreted here
    pub source: String,
    /// Probed duration in seconds, once known
    #[serde(default)]
    pub duration_seconds: Option<f64>,
}

impl MediaReference {
    /// Create a reference whose duration has not been probed yet.
    pub fn new(kind: MediaKind, name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            source: source.into(),
            duration_seconds: None,
        }
    }

    pub fn new_video(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self::new(MediaKind::Video, name, source)
    }

    pub fn new_audio(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self::new(MediaKind::Audio, name, source)
    }

    pub fn new_image(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self::new(MediaKind::Image, name, source)
    }

    pub fn new_subtitle(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self::new(MediaKind::Subtitle, name, source)
    }

    /// Builder-style helper for references that arrive already probed.
    pub fn with_duration(mut self, duration_seconds: f64) -> Self {
        self.set_duration_seconds(Some(duration_seconds));
        self
    }

    /// Set the probed duration. Non-positive or non-finite values mean "unknown".
    pub fn set_duration_seconds(&mut self, duration_seconds: Option<f64>) {
        self.duration_seconds = duration_seconds.filter(|d| d.is_finite() && *d > 0.0);
    }

    /// Duration to use for a new clip, falling back while probing is pending.
    pub fn clip_duration_or(&self, fallback: f64) -> f64 {
        self.duration_seconds.unwrap_or(fallback)
    }
}

/// Read access to the media library.
///
/// Probing happens elsewhere; once a duration is known the library returns it
/// from `resolve` and the host calls `TimelineStore::apply_media_duration`.
pub trait MediaLibrary {
    /// Look up a reference by id.
    fn resolve(&self, id: Uuid) -> Option<MediaReference>;
}

/// Simple in-memory media library.
#[derive(Debug, Clone, Default)]
pub struct MediaBin {
    items: Vec<MediaReference>,
}

impl MediaBin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a reference, replacing any existing one with the same id.
    pub fn insert(&mut self, media: MediaReference) -> Uuid {
        let id = media.id;
        if let Some(existing) = self.items.iter_mut().find(|m| m.id == id) {
            *existing = media;
        } else {
            self.items.push(media);
        }
        id
    }

    /// Remove a reference by id.
    pub fn remove(&mut self, id: Uuid) -> bool {
        let len = self.items.len();
        self.items.retain(|m| m.id != id);
        self.items.len() < len
    }

    /// Record a probed duration for a reference.
    pub fn set_duration(&mut self, id: Uuid, duration_seconds: Option<f64>) -> bool {
        if let Some(media) = self.items.iter_mut().find(|m| m.id == id) {
            media.set_duration_seconds(duration_seconds);
            return true;
        }
        false
    }

    pub fn iter(&self) -> impl Iterator<Item = &MediaReference> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl MediaLibrary for MediaBin {
    fn resolve(&self, id: Uuid) -> Option<MediaReference> {
        self.items.iter().find(|m| m.id == id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_kind_maps_to_clip_kind() {
        assert_eq!(MediaKind::Video.clip_kind(), ClipKind::Video);
        assert_eq!(MediaKind::Subtitle.clip_kind(), ClipKind::Subtitle);
        assert!(MediaKind::Audio.is_timed());
        assert!(!MediaKind::Image.is_timed());
    }

    #[test]
    fn test_invalid_duration_is_unknown() {
        let mut media = MediaReference::new_video("Clip", "video/clip.mp4");
        media.set_duration_seconds(Some(-3.0));
        assert_eq!(media.duration_seconds, None);
        media.set_duration_seconds(Some(f64::NAN));
        assert_eq!(media.duration_seconds, None);
        assert_eq!(media.clip_duration_or(5.0), 5.0);
    }

    #[test]
    fn test_media_bin_resolve_and_probe() {
        let mut bin = MediaBin::new();
        let id = bin.insert(MediaReference::new_audio("Music", "audio/music.wav"));
        assert_eq!(bin.resolve(id).unwrap().duration_seconds, None);

        assert!(bin.set_duration(id, Some(12.5)));
        assert_eq!(bin.resolve(id).unwrap().duration_seconds, Some(12.5));
        assert!(bin.resolve(Uuid::new_v4()).is_none());

        assert!(bin.remove(id));
        assert!(bin.is_empty());
    }

    #[test]
    fn test_media_serialization() {
        let media = MediaReference::new_image("Still", "images/still.png").with_duration(3.0);
        let json = serde_json::to_string_pretty(&media).unwrap();
        let parsed: MediaReference = serde_json::from_str(&json).unwrap();
        assert_eq!(media, parsed);
    }
}
