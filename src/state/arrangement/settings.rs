use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{
    AUTO_SCROLL_EDGE_PX, AUTO_SCROLL_MAX_SPEED_PX, DEFAULT_CLIP_DURATION_SECONDS,
    DEFAULT_PIXELS_PER_SECOND, MIN_CLIP_DURATION_SECONDS, MIN_TRACK_COUNT, PLAYER_FPS,
    RESIZE_HANDLE_BASE_PX, SYNC_DEBOUNCE_MS, SYNC_PULL_TOLERANCE_SECONDS,
    SYNC_SEEK_TOLERANCE_FRAMES, TIMELINE_SNAP_THRESHOLD_PX, TRACK_BUFFER,
};
use crate::error::{Result, TimelineError};

/// Timeline tunables. Missing fields fall back to their defaults on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineSettings {
    /// Pixels per second at zoom 1.0
    pub base_pixels_per_second: f64,
    /// Frame rate of the external player
    pub fps: f64,
    /// Whether drag/resize edges are attracted to snap points
    pub snap_enabled: bool,
    /// Snap tolerance in screen pixels
    pub snap_tolerance_px: f64,
    /// Shortest clip that drag, resize and split may produce
    pub min_clip_duration: f64,
    /// Duration given to dropped media whose length is not known yet
    pub default_media_duration: f64,
    /// Lanes shown even when empty
    pub min_track_count: usize,
    /// Empty lanes kept below the highest used lane
    pub track_buffer: usize,
    /// Resize handle width at zoom 1.0
    pub resize_handle_px: f64,
    /// Distance from a viewport edge at which auto-scroll kicks in
    pub auto_scroll_edge_px: f64,
    /// Auto-scroll speed right at the edge, in pixels per animation frame
    pub auto_scroll_max_speed_px: f64,
    /// Store/player frame drift tolerated before a seek is pushed
    pub sync_seek_tolerance_frames: u64,
    /// Minimum interval between pushed seeks
    pub sync_debounce_ms: u64,
    /// Player/store drift tolerated before the store is pulled to the player
    pub sync_pull_tolerance_seconds: f64,
}

impl Default for TimelineSettings {
    fn default() -> Self {
        Self {
            base_pixels_per_second: DEFAULT_PIXELS_PER_SECOND,
            fps: PLAYER_FPS,
            snap_enabled: true,
            snap_tolerance_px: TIMELINE_SNAP_THRESHOLD_PX,
            min_clip_duration: MIN_CLIP_DURATION_SECONDS,
            default_media_duration: DEFAULT_CLIP_DURATION_SECONDS,
            min_track_count: MIN_TRACK_COUNT,
            track_buffer: TRACK_BUFFER,
            resize_handle_px: RESIZE_HANDLE_BASE_PX,
            auto_scroll_edge_px: AUTO_SCROLL_EDGE_PX,
            auto_scroll_max_speed_px: AUTO_SCROLL_MAX_SPEED_PX,
            sync_seek_tolerance_frames: SYNC_SEEK_TOLERANCE_FRAMES,
            sync_debounce_ms: SYNC_DEBOUNCE_MS,
            sync_pull_tolerance_seconds: SYNC_PULL_TOLERANCE_SECONDS,
        }
    }
}

impl TimelineSettings {
    /// Load settings from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).map_err(|source| TimelineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: TimelineSettings = serde_json::from_str(&json)?;
        Ok(settings.sanitized())
    }

    /// Save settings to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| TimelineError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Replace nonsensical values with defaults.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        let positive = |value: f64, fallback: f64| {
            if value.is_finite() && value > 0.0 {
                value
            } else {
                fallback
            }
        };
        self.base_pixels_per_second =
            positive(self.base_pixels_per_second, defaults.base_pixels_per_second);
        self.fps = positive(self.fps, defaults.fps);
        self.snap_tolerance_px = positive(self.snap_tolerance_px, defaults.snap_tolerance_px);
        self.min_clip_duration = positive(self.min_clip_duration, defaults.min_clip_duration);
        self.default_media_duration =
            positive(self.default_media_duration, defaults.default_media_duration);
        self.resize_handle_px = positive(self.resize_handle_px, defaults.resize_handle_px);
        self.auto_scroll_edge_px = positive(self.auto_scroll_edge_px, defaults.auto_scroll_edge_px);
        self.auto_scroll_max_speed_px =
            positive(self.auto_scroll_max_speed_px, defaults.auto_scroll_max_speed_px);
        self.sync_pull_tolerance_seconds = positive(
            self.sync_pull_tolerance_seconds,
            defaults.sync_pull_tolerance_seconds,
        );
        self.min_track_count = self.min_track_count.max(1);
        self
    }
}
