//! Timeline arrangement model
//!
//! This module contains the data structures for the clip arrangement:
//! - Clip: Content placed on a track lane
//! - Track lanes: Derived from clip track indices, each with a kind rule
//! - TimelineStore: The single-writer owner of the timeline state
//! - TimelineSnapshot: What project storage receives

mod clip;
mod persistence;
mod settings;
mod store;
mod track;

pub use clip::{
    Clip, ClipContent, ClipKind, ClipPatch, ClipTransform, NewClip, SubtitleEntry, SubtitleStyle,
};
pub use persistence::TimelineSnapshot;
pub use settings::TimelineSettings;
pub use store::{TimelineState, TimelineStore};
pub use track::{group_tracks, track_accepts, visible_track_count, TrackLane, TrackRole};
