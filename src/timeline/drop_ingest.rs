//! Drag-and-drop of media library items onto a track lane.

use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::DEFAULT_CLIP_DURATION_SECONDS;
use crate::core::auto_scroll::ScrollViewport;
use crate::core::collision::Span;
use crate::core::geometry::TimelineGeometry;
use crate::error::{Result, TimelineError};
use crate::state::{
    track_accepts, ClipKind, MediaKind, MediaLibrary, MediaReference, NewClip, TimelineSettings,
    TimelineStore,
};

/// Record carried by the platform drag transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DragPayload {
    pub media_reference_id: Uuid,
    #[serde(default)]
    pub media_kind: Option<MediaKind>,
    #[serde(default)]
    pub source_tag: Option<String>,
}

impl DragPayload {
    pub fn new(media_reference_id: Uuid) -> Self {
        Self {
            media_reference_id,
            media_kind: None,
            source_tag: None,
        }
    }

    /// Parse a transfer string: the JSON record, or a bare media id.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if let Ok(payload) = serde_json::from_str::<DragPayload>(raw) {
            return Ok(payload);
        }
        Uuid::parse_str(raw)
            .map(Self::new)
            .map_err(|_| TimelineError::InvalidPayload(raw.chars().take(64).collect()))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Why a drop target refuses the dragged media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DropRejection {
    #[error("Track {track_index} does not accept {kind:?} clips")]
    IncompatibleTrack { track_index: u32, kind: ClipKind },
    #[error("Drop position overlaps another clip")]
    Collision,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropStyle {
    Valid,
    Invalid,
}

/// Where the dragged media would land and whether it may.
#[derive(Debug, Clone, PartialEq)]
pub struct DropPreview {
    pub track_index: u32,
    pub start_time: f64,
    pub duration: f64,
    pub media_id: Uuid,
    pub rejection: Option<DropRejection>,
}

impl DropPreview {
    pub fn is_valid(&self) -> bool {
        self.rejection.is_none()
    }

    pub fn style(&self) -> DropStyle {
        if self.is_valid() {
            DropStyle::Valid
        } else {
            DropStyle::Invalid
        }
    }

    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    Placed(Uuid),
    Rejected(DropRejection),
}

/// Pointer position of a drag over a lane.
#[derive(Debug, Clone, Copy)]
pub struct DropTarget<'a> {
    pub track_index: u32,
    pub client_x: f64,
    pub viewport: &'a ScrollViewport,
}

pub struct DropIngestController {
    preview: Option<DropPreview>,
    default_media_duration: f64,
}

impl Default for DropIngestController {
    fn default() -> Self {
        Self {
            preview: None,
            default_media_duration: DEFAULT_CLIP_DURATION_SECONDS,
        }
    }
}

impl DropIngestController {
    pub fn new(settings: &TimelineSettings) -> Self {
        Self {
            preview: None,
            default_media_duration: settings.default_media_duration,
        }
    }

    pub fn preview(&self) -> Option<&DropPreview> {
        self.preview.as_ref()
    }

    /// Drag moved over a lane. Unreadable payloads and unknown media simply
    /// show no preview.
    pub fn drag_over(
        &mut self,
        store: &TimelineStore,
        library: &dyn MediaLibrary,
        geometry: &TimelineGeometry,
        raw_payload: &str,
        target: DropTarget<'_>,
    ) -> Option<&DropPreview> {
        match self.evaluate(store, library, geometry, raw_payload, target) {
            Ok((preview, _)) => self.preview = Some(preview),
            Err(err) => {
                trace!("No drop preview: {}", err);
                self.preview = None;
            }
        }
        self.preview.as_ref()
    }

    pub fn drag_leave(&mut self) {
        self.preview = None;
    }

    /// Drop on a lane. A valid drop adds the clip and selects it; an invalid
    /// one leaves the store untouched.
    pub fn drop(
        &mut self,
        store: &mut TimelineStore,
        library: &dyn MediaLibrary,
        geometry: &TimelineGeometry,
        raw_payload: &str,
        target: DropTarget<'_>,
    ) -> Result<DropOutcome> {
        self.preview = None;
        let (preview, media) = self
            .evaluate(store, library, geometry, raw_payload, target)
            .map_err(|err| {
                warn!("Drop rejected: {}", err);
                err
            })?;

        if let Some(rejection) = preview.rejection {
            debug!("Drop on track {} rejected: {}", preview.track_index, rejection);
            return Ok(DropOutcome::Rejected(rejection));
        }

        let new_clip = NewClip::from_media(media, preview.start_time, preview.duration).on_track(preview.track_index);
        match store.add_clip(new_clip) {
            Some(id) => {
                store.select_clip(Some(id));
                Ok(DropOutcome::Placed(id))
            }
            None => Ok(DropOutcome::Rejected(DropRejection::Collision)),
        }
    }

    fn evaluate(
        &self,
        store: &TimelineStore,
        library: &dyn MediaLibrary,
        geometry: &TimelineGeometry,
        raw_payload: &str,
        target: DropTarget<'_>,
    ) -> Result<(DropPreview, MediaReference)> {
        let payload = DragPayload::parse(raw_payload)?;
        let media = library
            .resolve(payload.media_reference_id)
            .ok_or(TimelineError::UnresolvedMedia(payload.media_reference_id))?;
        if payload.media_kind.is_some_and(|kind| kind != media.kind) {
            trace!("Payload kind differs from library for {}; using library", media.id);
        }

        let start_time = geometry
            .pixels_to_time(target.viewport.content_x(target.client_x))
            .max(0.0);
        let duration = media.clip_duration_or(self.default_media_duration);
        let kind = media.kind.clip_kind();

        let rejection = if !track_accepts(target.track_index, kind) {
            Some(DropRejection::IncompatibleTrack {
                track_index: target.track_index,
                kind,
            })
        } else if !store.is_placement_free(target.track_index, Span::new(start_time, duration), None) {
            Some(DropRejection::Collision)
        } else {
            None
        };

        let preview = DropPreview {
            track_index: target.track_index,
            start_time,
            duration,
            media_id: media.id,
            rejection,
        };
        Ok((preview, media))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::MediaBin;

    struct Fixture {
        store: TimelineStore,
        library: MediaBin,
        geometry: TimelineGeometry,
        viewport: ScrollViewport,
        controller: DropIngestController,
    }

    fn fixture() -> Fixture {
        Fixture {
            store: TimelineStore::new(),
            library: MediaBin::new(),
            geometry: TimelineGeometry::new(100.0),
            viewport: ScrollViewport::new(100.0, 800.0, 3000.0),
            controller: DropIngestController::default(),
        }
    }

    #[test]
    fn test_payload_accepts_json_and_bare_id() {
        let id = Uuid::new_v4();
        let json = format!(r#"{{"mediaReferenceId":"{}","mediaKind":"video","sourceTag":"assets"}}"#, id);
        let payload = DragPayload::parse(&json).unwrap();
        assert_eq!(payload.media_reference_id, id);
        assert_eq!(payload.media_kind, Some(MediaKind::Video));
        assert_eq!(payload.source_tag.as_deref(), Some("assets"));

        assert_eq!(DragPayload::parse(&format!(" {} ", id)).unwrap(), DragPayload::new(id));
        assert!(matches!(
            DragPayload::parse("not a payload"),
            Err(TimelineError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_drop_position_accounts_for_scroll() {
        let mut f = fixture();
        let media = MediaReference::new_video("Shot", "video/shot.mp4").with_duration(8.0);
        let media_id = f.library.insert(media);
        f.viewport.set_scroll_left(200.0);
        let target = DropTarget {
            track_index: 0,
            client_x: 400.0,
            viewport: &f.viewport,
        };

        let preview = f
            .controller
            .drag_over(&f.store, &f.library, &f.geometry, &media_id.to_string(), target)
            .cloned()
            .unwrap();
        assert_eq!(preview.start_time, 5.0);
        assert_eq!(preview.duration, 8.0);
        assert_eq!(preview.style(), DropStyle::Valid);

        let outcome = f
            .controller
            .drop(&mut f.store, &f.library, &f.geometry, &media_id.to_string(), target)
            .unwrap();
        let DropOutcome::Placed(id) = outcome else {
            panic!("expected placement, got {:?}", outcome);
        };
        let clip = f.store.clip(id).unwrap();
        assert_eq!((clip.start_time, clip.end_time()), (5.0, 13.0));
        assert_eq!(clip.kind(), ClipKind::Video);
        assert_eq!(f.store.selected_clip_id(), Some(id));
        assert!(f.controller.preview().is_none());
    }

    #[test]
    fn test_drop_left_of_content_floors_at_zero() {
        let mut f = fixture();
        let media_id = f.library.insert(MediaReference::new_image("Still", "img/still.png"));
        let target = DropTarget {
            track_index: 3,
            client_x: 20.0,
            viewport: &f.viewport,
        };
        let outcome = f
            .controller
            .drop(&mut f.store, &f.library, &f.geometry, &media_id.to_string(), target)
            .unwrap();
        let DropOutcome::Placed(id) = outcome else {
            panic!("expected placement, got {:?}", outcome);
        };
        let clip = f.store.clip(id).unwrap();
        assert_eq!(clip.start_time, 0.0);
        // Unprobed media gets the placeholder duration.
        assert_eq!(clip.duration, 5.0);
    }

    #[test]
    fn test_video_on_audio_track_is_rejected() {
        let mut f = fixture();
        let media = MediaReference::new_video("Shot", "video/shot.mp4").with_duration(8.0);
        let media_id = f.library.insert(media);
        let payload = DragPayload::new(media_id).to_json().unwrap();

        for client_x in [100.0, 350.0, 2000.0] {
            let target = DropTarget {
                track_index: 1,
                client_x,
                viewport: &f.viewport,
            };
            let preview = f
                .controller
                .drag_over(&f.store, &f.library, &f.geometry, &payload, target)
                .cloned()
                .unwrap();
            assert_eq!(preview.style(), DropStyle::Invalid);

            let before = f.store.state().clone();
            let outcome = f
                .controller
                .drop(&mut f.store, &f.library, &f.geometry, &payload, target)
                .unwrap();
            assert_eq!(
                outcome,
                DropOutcome::Rejected(DropRejection::IncompatibleTrack {
                    track_index: 1,
                    kind: ClipKind::Video,
                })
            );
            assert_eq!(f.store.state(), &before);
        }
    }

    #[test]
    fn test_drop_onto_occupied_range_is_rejected() {
        let mut f = fixture();
        f.store
            .add_clip(NewClip::new(ClipKind::Audio, 4.0, 4.0).on_track(1))
            .unwrap();
        let media_id = f
            .library
            .insert(MediaReference::new_audio("Music", "audio/music.wav").with_duration(3.0));
        let target = DropTarget {
            track_index: 1,
            client_x: 300.0,
            viewport: &f.viewport,
        };
        let outcome = f
            .controller
            .drop(&mut f.store, &f.library, &f.geometry, &media_id.to_string(), target)
            .unwrap();
        assert_eq!(outcome, DropOutcome::Rejected(DropRejection::Collision));
        assert_eq!(f.store.clips().len(), 1);
    }

    #[test]
    fn test_unknown_media_is_an_error() {
        let mut f = fixture();
        let missing = Uuid::new_v4();
        let target = DropTarget {
            track_index: 4,
            client_x: 300.0,
            viewport: &f.viewport,
        };
        assert!(f
            .controller
            .drag_over(&f.store, &f.library, &f.geometry, &missing.to_string(), target)
            .is_none());
        let err = f
            .controller
            .drop(&mut f.store, &f.library, &f.geometry, &missing.to_string(), target)
            .unwrap_err();
        assert!(matches!(err, TimelineError::UnresolvedMedia(id) if id == missing));
        assert!(f.store.clips().is_empty());
    }

    #[test]
    fn test_drag_leave_clears_preview() {
        let mut f = fixture();
        let media_id = f.library.insert(MediaReference::new_audio("Music", "audio/music.wav"));
        let target = DropTarget {
            track_index: 1,
            client_x: 300.0,
            viewport: &f.viewport,
        };
        f.controller
            .drag_over(&f.store, &f.library, &f.geometry, &media_id.to_string(), target);
        assert!(f.controller.preview().is_some());
        f.controller.drag_leave();
        assert!(f.controller.preview().is_none());
    }
}
