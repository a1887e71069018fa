//! Persistent storage for catalog entries.
//!
//! # Storage Layout
//!
//! ```text
//! content_items
//! ├── id              TEXT PRIMARY KEY
//! ├── type, status    canonical variant names (MOVIE, WATCHED, ...)
//! ├── cast, genre     comma-joined text (lossy for embedded commas)
//! ├── public_ratings  JSON array, '' when empty
//! └── date_added      epoch millis, newest first in every listing
//! ```

pub mod codec;
pub mod error;
pub mod sqlite;

pub use error::{DecodeError, EncodeError, StoreError};
pub use sqlite::{CatalogStore, ContentFilter, SnapshotStream, SCHEMA_VERSION};
