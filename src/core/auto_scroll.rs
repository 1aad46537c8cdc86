//! Edge auto-scroll while a drag is active.
//!
//! `AutoScroller` is the pure part: pointer position in, scroll velocity out.
//! `AutoScrollLoop` is the frame clock: while switched on it requests a frame
//! every interval, and the host answers each request with
//! `TimelineEditor::tick`. Dropping the loop aborts its task.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::constants::{AUTO_SCROLL_EDGE_PX, AUTO_SCROLL_FRAME_INTERVAL_MS, AUTO_SCROLL_MAX_SPEED_PX};

/// Horizontal scroll state of the timeline viewport.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollViewport {
    /// Client-space x of the viewport's left edge
    pub left: f64,
    /// Visible width
    pub client_width: f64,
    /// Full content width
    pub scroll_width: f64,
    pub scroll_left: f64,
}

impl ScrollViewport {
    pub fn new(left: f64, client_width: f64, scroll_width: f64) -> Self {
        Self {
            left,
            client_width,
            scroll_width,
            scroll_left: 0.0,
        }
    }

    pub fn max_scroll_left(&self) -> f64 {
        (self.scroll_width - self.client_width).max(0.0)
    }

    /// Set the scroll offset, clamped to `[0, scroll_width - client_width]`.
    pub fn set_scroll_left(&mut self, scroll_left: f64) {
        if scroll_left.is_finite() {
            self.scroll_left = scroll_left.clamp(0.0, self.max_scroll_left());
        }
    }

    /// Scroll by `delta` pixels and return the distance actually moved.
    pub fn scroll_by(&mut self, delta: f64) -> f64 {
        let before = self.scroll_left;
        self.set_scroll_left(before + delta);
        self.scroll_left - before
    }

    /// Content-space x for a client-space pointer x.
    pub fn content_x(&self, client_x: f64) -> f64 {
        client_x - self.left + self.scroll_left
    }

    /// Grow or shrink the content; keeps the offset in range.
    pub fn set_scroll_width(&mut self, scroll_width: f64) {
        self.scroll_width = scroll_width.max(0.0);
        self.set_scroll_left(self.scroll_left);
    }
}

/// Scroll speed for a pointer at `client_x`. Negative scrolls left.
///
/// Speed ramps linearly from 0 at `edge_px` inside the edge to `max_speed`
/// at (or past) the edge.
pub fn edge_velocity(client_x: f64, viewport: &ScrollViewport, edge_px: f64, max_speed: f64) -> f64 {
    if edge_px <= 0.0 || viewport.client_width <= 0.0 {
        return 0.0;
    }
    let from_left = client_x - viewport.left;
    let from_right = viewport.left + viewport.client_width - client_x;
    if from_left < edge_px && from_left <= from_right {
        let ratio = (1.0 - from_left / edge_px).clamp(0.0, 1.0);
        -max_speed * ratio
    } else if from_right < edge_px {
        let ratio = (1.0 - from_right / edge_px).clamp(0.0, 1.0);
        max_speed * ratio
    } else {
        0.0
    }
}

/// Per-drag auto-scroll state.
#[derive(Debug, Clone)]
pub struct AutoScroller {
    edge_px: f64,
    max_speed: f64,
    velocity: f64,
    active: bool,
}

impl Default for AutoScroller {
    fn default() -> Self {
        Self::new(AUTO_SCROLL_EDGE_PX, AUTO_SCROLL_MAX_SPEED_PX)
    }
}

impl AutoScroller {
    pub fn new(edge_px: f64, max_speed: f64) -> Self {
        Self {
            edge_px,
            max_speed,
            velocity: 0.0,
            active: false,
        }
    }

    /// Arm for a new drag.
    pub fn begin(&mut self) {
        self.active = true;
        self.velocity = 0.0;
    }

    /// Update from a pointer move and return the new velocity.
    pub fn pointer_moved(&mut self, client_x: f64, viewport: &ScrollViewport) -> f64 {
        self.velocity = if self.active {
            edge_velocity(client_x, viewport, self.edge_px, self.max_speed)
        } else {
            0.0
        };
        self.velocity
    }

    /// Advance one animation frame. Returns the distance scrolled.
    pub fn tick(&self, viewport: &mut ScrollViewport) -> f64 {
        if !self.is_scrolling() {
            return 0.0;
        }
        viewport.scroll_by(self.velocity)
    }

    /// Stop immediately; called when the drag ends.
    pub fn stop(&mut self) {
        self.active = false;
        self.velocity = 0.0;
    }

    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_scrolling(&self) -> bool {
        self.active && self.velocity != 0.0
    }
}

/// Frame clock for auto-scroll and deferred seeks.
pub struct AutoScrollLoop {
    active_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl AutoScrollLoop {
    /// Spawn the clock on the current tokio runtime. Frame requests arrive on
    /// the returned receiver; requests the host has not consumed yet coalesce.
    pub fn spawn() -> (Self, mpsc::Receiver<()>) {
        Self::spawn_with_interval(Duration::from_millis(AUTO_SCROLL_FRAME_INTERVAL_MS))
    }

    pub fn spawn_with_interval(frame: Duration) -> (Self, mpsc::Receiver<()>) {
        let (active_tx, mut active_rx) = watch::channel(false);
        let (frame_tx, frame_rx) = mpsc::channel(1);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(frame);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                if !*active_rx.borrow_and_update() {
                    if active_rx.changed().await.is_err() {
                        break;
                    }
                    interval.reset();
                    continue;
                }
                interval.tick().await;
                if !*active_rx.borrow() {
                    continue;
                }
                match frame_tx.try_send(()) {
                    Ok(()) | Err(mpsc::error::TrySendError::Full(())) => {}
                    Err(mpsc::error::TrySendError::Closed(())) => break,
                }
            }
        });
        (Self { active_tx, handle }, frame_rx)
    }

    /// Switch frame requests on or off.
    pub fn set_active(&self, active: bool) {
        self.active_tx.send_if_modified(|current| {
            let changed = *current != active;
            *current = active;
            changed
        });
    }

    pub fn is_active(&self) -> bool {
        *self.active_tx.borrow()
    }

    /// Stop the clock and release its task.
    pub fn cancel(self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for AutoScrollLoop {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
