//! NLA Timeline
//!
//! Timeline arrangement engine for the NLA editor: the clip/track data model,
//! time <-> pixel geometry, snapping, collision checks, pointer gesture
//! controllers, drag-and-drop ingestion and the playhead/player bridge.
//!
//! Rendering, decoding and project storage live outside this crate; they talk
//! to it through [`core::playback_sync::PlayerTransport`],
//! [`state::MediaLibrary`] and [`state::TimelineSnapshot`].

pub mod constants;
pub mod core;
pub mod editor;
pub mod error;
pub mod hotkeys;
pub mod state;
pub mod timeline;

pub use editor::TimelineEditor;
pub use error::{Result, TimelineError};
