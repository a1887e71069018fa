//! Domain types for the cinevault catalog.
//!
//! This module contains the core data structures:
//! - ContentItem: One movie or series in the catalog
//! - PublicRating: Third-party rating snapshot attached to an item
//! - NewContent: User-entered fields for a new item

pub mod content;

// Re-export commonly used types
pub use content::{
    now_millis, ContentId, ContentItem, ContentStatus, ContentType, EpochMillis, NewContent,
    PublicRating, ValidationError,
};
