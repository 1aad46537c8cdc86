//! Pure timeline logic: geometry, snapping, collision checks, edge
//! auto-scroll and the player bridge.

pub mod auto_scroll;
pub mod collision;
pub mod geometry;
pub mod playback_sync;
pub mod timeline_snap;
