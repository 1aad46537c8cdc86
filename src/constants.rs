//! Shared timeline constants such as zoom limits and interaction sizing.
//! Tunables that a host may want to change live in `TimelineSettings` instead.

pub const DEFAULT_PIXELS_PER_SECOND: f64 = 100.0;
pub const TIMELINE_MIN_ZOOM: f64 = 0.2;
pub const TIMELINE_MAX_ZOOM: f64 = 5.0;
pub const TIMELINE_ZOOM_STEP: f64 = 1.5;

/// Cosmetic floor for rendered clip width. Never written back into durations.
pub const MIN_CLIP_WIDTH_PX: f64 = 20.0;
pub const MIN_CLIP_DURATION_SECONDS: f64 = 0.1;
pub const DEFAULT_CLIP_DURATION_SECONDS: f64 = 5.0;

pub const RESIZE_HANDLE_BASE_PX: f64 = 10.0;
pub const RESIZE_HANDLE_MIN_PX: f64 = 8.0;
pub const RESIZE_HANDLE_MAX_PX: f64 = 12.0;

pub const TIMELINE_SNAP_THRESHOLD_PX: f64 = 10.0;

pub const MIN_TRACK_COUNT: usize = 5;
pub const TRACK_BUFFER: usize = 2;

pub const AUTO_SCROLL_EDGE_PX: f64 = 50.0;
pub const AUTO_SCROLL_MAX_SPEED_PX: f64 = 15.0;
pub const AUTO_SCROLL_FRAME_INTERVAL_MS: u64 = 16;

pub const PLAYER_FPS: f64 = 30.0;
pub const SYNC_SEEK_TOLERANCE_FRAMES: u64 = 2;
pub const SYNC_DEBOUNCE_MS: u64 = 100;
pub const SYNC_PULL_TOLERANCE_SECONDS: f64 = 0.1;

pub const DEFAULT_TEXT_FONT_SIZE: f32 = 24.0;
pub const DEFAULT_TEXT_FONT_FAMILY: &str = "Inter";
pub const DEFAULT_TEXT_COLOR: &str = "#fafafa";
pub const DEFAULT_SUBTITLE_FONT_SIZE: f32 = 32.0;
pub const DEFAULT_SUBTITLE_COLOR: &str = "#ffffff";
pub const DEFAULT_SUBTITLE_BACKGROUND: &str = "#000000b3";

pub const SNAPSHOT_VERSION: &str = "1.0";
