use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::SNAPSHOT_VERSION;
use crate::error::{Result, TimelineError};
use crate::state::MediaReference;

use super::{Clip, TimelineStore};

/// Serializable projection of the timeline handed to project storage.
///
/// Built only from store state, so snapshotting a restored snapshot yields
/// the same value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineSnapshot {
    /// Schema version for future compatibility
    pub version: String,
    /// All clips placed on tracks
    pub clips: Vec<Clip>,
    pub total_duration: f64,
    /// Media referenced by the clips, keyed by id
    #[serde(default)]
    pub media: BTreeMap<Uuid, MediaReference>,
}

impl TimelineSnapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write the snapshot to a file.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        fs::write(path, json).map_err(|source| TimelineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Saved timeline snapshot: {:?}", path);
        Ok(())
    }

    /// Read a snapshot from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).map_err(|source| TimelineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }
}

impl TimelineStore {
    /// Capture clips, total duration and referenced media.
    pub fn snapshot(&self) -> TimelineSnapshot {
        let media = self
            .clips()
            .iter()
            .filter_map(|clip| clip.media.as_ref())
            .map(|media| (media.id, media.clone()))
            .collect();
        TimelineSnapshot {
            version: SNAPSHOT_VERSION.to_string(),
            clips: self.clips().to_vec(),
            total_duration: self.total_duration(),
            media,
        }
    }

    /// Rebuild a store from a snapshot.
    ///
    /// Clips are re-validated on the way in; any that would break track
    /// invariants are dropped with a warning. Media entries in the map win
    /// over copies embedded in clips.
    pub fn restore(snapshot: TimelineSnapshot) -> Self {
        let TimelineSnapshot {
            clips,
            total_duration,
            media,
            ..
        } = snapshot;
        let clips = clips
            .into_iter()
            .map(|mut clip| {
                if let Some(embedded) = clip.media.as_mut() {
                    if let Some(latest) = media.get(&embedded.id) {
                        *embedded = latest.clone();
                    }
                }
                clip
            })
            .collect();

        let mut store = TimelineStore::new();
        let dropped = store.replace_clips(clips, total_duration);
        if dropped > 0 {
            warn!("Dropped {} invalid clips while restoring snapshot", dropped);
        }
        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{ClipKind, NewClip};

    fn sample_store() -> TimelineStore {
        let mut store = TimelineStore::new();
        let media = MediaReference::new_video("Shot", "video/shot.mp4").with_duration(8.0);
        store
            .add_clip(NewClip::from_media(media, 0.0, 8.0).on_track(0))
            .unwrap();
        store
            .add_clip(NewClip::new(ClipKind::Text, 2.0, 3.0).on_track(2))
            .unwrap();
        store
    }

    #[test]
    fn test_snapshot_round_trip() {
        let store = sample_store();
        let snapshot = store.snapshot();
        assert_eq!(snapshot.media.len(), 1);

        let json = snapshot.to_json().unwrap();
        let parsed = TimelineSnapshot::from_json(&json).unwrap();
        assert_eq!(parsed, snapshot);

        let restored = TimelineStore::restore(parsed);
        assert_eq!(restored.snapshot(), snapshot);
        assert_eq!(restored.clips(), store.clips());
    }

    #[test]
    fn test_restore_drops_overlapping_clips() {
        let mut snapshot = sample_store().snapshot();
        let mut clash = snapshot.clips[0].clone();
        clash.id = Uuid::new_v4();
        clash.start_time = 4.0;
        snapshot.clips.push(clash);

        let restored = TimelineStore::restore(snapshot);
        assert_eq!(restored.clips().len(), 2);
    }

    #[test]
    fn test_restore_prefers_media_map() {
        let mut snapshot = sample_store().snapshot();
        let media_id = *snapshot.media.keys().next().unwrap();
        snapshot.media.get_mut(&media_id).unwrap().name = "Renamed".to_string();
        let restored = TimelineStore::restore(snapshot);
        let clip = restored.clips().iter().find(|c| c.media.is_some()).unwrap();
        assert_eq!(clip.media.as_ref().unwrap().name, "Renamed");
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir().join(format!("nla-timeline-{}.json", Uuid::new_v4()));
        let snapshot = sample_store().snapshot();
        snapshot.save_to(&path).unwrap();
        let loaded = TimelineSnapshot::load(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(loaded, snapshot);
    }
}
