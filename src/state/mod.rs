//! State management module
//!
//! This module contains all the core data structures for the timeline:
//! - Arrangement: Clips, track lanes, the store and its snapshot
//! - Media: References to library content
//! - Selection: What the user has picked

mod arrangement;
mod media;
mod selection;

pub use arrangement::*;
pub use media::*;
pub use selection::*;
