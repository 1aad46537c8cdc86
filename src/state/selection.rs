//! Selection state shared across the timeline and the media library.

use uuid::Uuid;

/// Tracks the current selection. At most one clip is selected at a time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    /// Selected clip in the timeline.
    pub clip_id: Option<Uuid>,
    /// Selected media reference in the library panel.
    pub media_id: Option<Uuid>,
}

impl SelectionState {
    /// Clear all selections.
    pub fn clear(&mut self) {
        self.clip_id = None;
        self.media_id = None;
    }

    /// Replace the selection with a single clip (or nothing).
    pub fn select_clip(&mut self, clip_id: Option<Uuid>) {
        self.clear();
        self.clip_id = clip_id;
    }

    /// Replace the selection with a single media reference.
    pub fn select_media(&mut self, media_id: Uuid) {
        self.clear();
        self.media_id = Some(media_id);
    }

    /// Drop a clip from the selection, if it is the selected one.
    pub fn remove_clip(&mut self, clip_id: Uuid) -> bool {
        if self.clip_id == Some(clip_id) {
            self.clip_id = None;
            return true;
        }
        false
    }

    /// Return the selected clip, if any.
    pub fn primary_clip(&self) -> Option<Uuid> {
        self.clip_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selecting_clip_replaces_media() {
        let mut selection = SelectionState::default();
        selection.select_media(Uuid::new_v4());
        let clip = Uuid::new_v4();
        selection.select_clip(Some(clip));
        assert_eq!(selection.primary_clip(), Some(clip));
        assert_eq!(selection.media_id, None);
    }

    #[test]
    fn test_remove_only_clears_matching_clip() {
        let mut selection = SelectionState::default();
        let clip = Uuid::new_v4();
        selection.select_clip(Some(clip));
        assert!(!selection.remove_clip(Uuid::new_v4()));
        assert!(selection.remove_clip(clip));
        assert_eq!(selection.primary_clip(), None);
    }
}
