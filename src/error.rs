//! Error types surfaced by the timeline engine.
//!
//! Ordinary invalid placements during a gesture are not errors; they are
//! discarded silently. Only conditions a host might want to show the user, or
//! I/O at the crate boundary, end up here.

use std::path::PathBuf;

use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum TimelineError {
    #[error("Media reference {0} is not in the library")]
    UnresolvedMedia(Uuid),

    #[error("Drag payload could not be parsed: {0}")]
    InvalidPayload(String),

    #[error("Clip {0} not found")]
    ClipNotFound(Uuid),

    #[error("No clip is selected")]
    NothingSelected,

    #[error("Split at {offset:.3}s would leave a part shorter than {min:.3}s")]
    InvalidSplit { offset: f64, min: f64 },

    #[error("Player transport failed: {0}")]
    Transport(String),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TimelineError>;
