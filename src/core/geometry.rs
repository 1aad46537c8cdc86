//! Time <-> pixel conversion for the timeline viewport.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_PIXELS_PER_SECOND, MIN_CLIP_WIDTH_PX, RESIZE_HANDLE_BASE_PX, RESIZE_HANDLE_MAX_PX,
    RESIZE_HANDLE_MIN_PX, TIMELINE_MAX_ZOOM, TIMELINE_MIN_ZOOM, TIMELINE_ZOOM_STEP,
};

/// Convert seconds to a horizontal pixel offset.
pub fn time_to_pixels(time_seconds: f64, pixels_per_second: f64) -> f64 {
    time_seconds * pixels_per_second
}

/// Convert a horizontal pixel offset back to seconds.
pub fn pixels_to_time(pixels: f64, pixels_per_second: f64) -> f64 {
    if pixels_per_second <= 0.0 {
        return 0.0;
    }
    pixels / pixels_per_second
}

/// Clamp a zoom factor to the supported range.
pub fn clamp_zoom(zoom: f64) -> f64 {
    if !zoom.is_finite() {
        return 1.0;
    }
    zoom.clamp(TIMELINE_MIN_ZOOM, TIMELINE_MAX_ZOOM)
}

/// On-screen width of a clip. Floored for usability; purely cosmetic.
pub fn clip_render_width(duration_seconds: f64, pixels_per_second: f64) -> f64 {
    time_to_pixels(duration_seconds.max(0.0), pixels_per_second).max(MIN_CLIP_WIDTH_PX)
}

/// Zoom-dependent pixel density of the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimelineGeometry {
    base_pixels_per_second: f64,
    zoom: f64,
}

impl Default for TimelineGeometry {
    fn default() -> Self {
        Self::new(DEFAULT_PIXELS_PER_SECOND)
    }
}

impl TimelineGeometry {
    pub fn new(base_pixels_per_second: f64) -> Self {
        let base = if base_pixels_per_second.is_finite() && base_pixels_per_second > 0.0 {
            base_pixels_per_second
        } else {
            DEFAULT_PIXELS_PER_SECOND
        };
        Self {
            base_pixels_per_second: base,
            zoom: 1.0,
        }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn base_pixels_per_second(&self) -> f64 {
        self.base_pixels_per_second
    }

    pub fn pixels_per_second(&self) -> f64 {
        self.base_pixels_per_second * self.zoom
    }

    /// Set the zoom factor, clamped to `[0.2, 5.0]`.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = clamp_zoom(zoom);
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom * TIMELINE_ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom / TIMELINE_ZOOM_STEP);
    }

    pub fn time_to_pixels(&self, time_seconds: f64) -> f64 {
        time_to_pixels(time_seconds, self.pixels_per_second())
    }

    pub fn pixels_to_time(&self, pixels: f64) -> f64 {
        pixels_to_time(pixels, self.pixels_per_second())
    }

    /// Rendered width for a clip of `duration_seconds`.
    pub fn clip_width(&self, duration_seconds: f64) -> f64 {
        clip_render_width(duration_seconds, self.pixels_per_second())
    }

    /// Width of the content area for a timeline of `total_duration`.
    pub fn content_width(&self, total_duration: f64) -> f64 {
        self.time_to_pixels(total_duration.max(0.0))
    }

    /// Grab zone at each clip edge. Shrinks as zoom grows, stays within
    /// 8-12px and never covers more than a third of the clip.
    pub fn resize_handle_width(&self, base_handle_px: f64, rendered_width: f64) -> f64 {
        let base = if base_handle_px > 0.0 {
            base_handle_px
        } else {
            RESIZE_HANDLE_BASE_PX
        };
        let handle = (base / self.zoom).clamp(RESIZE_HANDLE_MIN_PX, RESIZE_HANDLE_MAX_PX);
        handle.min(rendered_width / 3.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_conversions_are_inverse() {
        assert_eq!(time_to_pixels(2.5, 100.0), 250.0);
        assert_eq!(pixels_to_time(250.0, 100.0), 2.5);
        assert_eq!(pixels_to_time(250.0, 0.0), 0.0);
    }

    #[test]
    fn test_zoom_steps_and_clamps() {
        let mut geometry = TimelineGeometry::new(100.0);
        geometry.zoom_in();
        assert_relative_eq!(geometry.zoom(), 1.5);
        assert_relative_eq!(geometry.pixels_per_second(), 150.0);
        for _ in 0..10 {
            geometry.zoom_in();
        }
        assert_eq!(geometry.zoom(), 5.0);
        for _ in 0..20 {
            geometry.zoom_out();
        }
        assert_eq!(geometry.zoom(), 0.2);
        geometry.set_zoom(f64::NAN);
        assert_eq!(geometry.zoom(), 1.0);
    }

    #[test]
    fn test_render_width_has_cosmetic_floor() {
        let geometry = TimelineGeometry::new(100.0);
        assert_eq!(geometry.clip_width(0.05), 20.0);
        assert_eq!(geometry.clip_width(2.0), 200.0);
        assert_eq!(geometry.clip_width(-1.0), 20.0);
    }

    #[test]
    fn test_handle_width_scales_inversely_with_zoom() {
        let mut geometry = TimelineGeometry::new(100.0);
        assert_eq!(geometry.resize_handle_width(10.0, 500.0), 10.0);
        geometry.set_zoom(0.5);
        assert_eq!(geometry.resize_handle_width(10.0, 500.0), 12.0);
        geometry.set_zoom(4.0);
        assert_eq!(geometry.resize_handle_width(10.0, 500.0), 8.0);
        assert_eq!(geometry.resize_handle_width(10.0, 21.0), 7.0);
    }

    #[test]
    fn test_invalid_base_falls_back() {
        assert_eq!(TimelineGeometry::new(0.0).pixels_per_second(), 100.0);
    }
}
