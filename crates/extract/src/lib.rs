//! Pure parsing for the mirror engine.
//!
//! - [`parse_listing`] turns the HTML of an auto-generated directory index
//!   into [`RemoteEntry`] values.
//! - [`extract_metadata`] pulls the radar ID, timestamp and site code out of a
//!   radar volume filename.
//!
//! Neither function performs I/O.

mod consts;
pub mod error;
mod filename;
mod listing;
pub mod models;

pub use crate::filename::extract_metadata;
pub use crate::listing::parse_listing;
pub use crate::models::{EntryKind, RadarMetadata, RemoteEntry};
