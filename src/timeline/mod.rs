//! Timeline interaction
//!
//! Pointer-facing controllers that turn gestures into store mutations:
//! - Clip interaction: drag, resize and split of placed clips
//! - Drop ingestion: media library items dropped onto a lane

mod clip_interaction;
mod drop_ingest;

pub use clip_interaction::{
    classify, ClipInteractionController, CursorStyle, GestureFeedback, GestureKind,
    InteractionSession, PointerSample,
};
pub use drop_ingest::{
    DragPayload, DropIngestController, DropOutcome, DropPreview, DropRejection, DropStyle,
    DropTarget,
};

use crate::core::geometry::clamp_zoom;

/// Fallback viewport width before the view has been measured.
const DEFAULT_VIEWPORT_WIDTH_PX: f64 = 600.0;

/// Zoom factor that fits `duration` seconds into the viewport, clamped to
/// the supported zoom range.
pub fn zoom_to_fit(duration: f64, viewport_width: Option<f64>, base_pixels_per_second: f64) -> f64 {
    let duration = duration.max(0.01);
    let viewport_width = viewport_width.unwrap_or(DEFAULT_VIEWPORT_WIDTH_PX).max(1.0);
    if base_pixels_per_second <= 0.0 {
        return 1.0;
    }
    clamp_zoom(viewport_width / (duration * base_pixels_per_second))
}
