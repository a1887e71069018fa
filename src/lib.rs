//! cinevault - Personal movie and show poster catalog
//!
//! Keeps a local catalog of movies and series the user wants to watch or
//! has watched, backed by a single SQLite table.
//!
//! # Architecture
//!
//! Reads are live queries: every listing is a stream that emits the current
//! snapshot and re-emits after each committed change.
//! - The store owns persistence and the change feed
//! - The catalog service adds the create/toggle/review workflows
//! - Views re-partition every `all` snapshot for browsing
//!
//! # Modules
//!
//! - `domain`: Data structures (ContentItem, ContentType, ContentStatus)
//! - `store`: SQLite table, column codec, live queries
//! - `catalog`: Service facade and derived views
//! - `posters`: Imported poster images
//! - `config`: Path and browsing configuration
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Add a title to the watchlist
//! cinevault add "Dune" --poster ~/Pictures/dune.jpg --genre "Sci-Fi,Drama"
//!
//! # Mark it watched
//! cinevault toggle <content-id>
//!
//! # Browse watched shows matching a query
//! cinevault browse watched --tab shows --query dark
//! ```

pub mod catalog;
pub mod cli;
pub mod config;
pub mod domain;
pub mod posters;
pub mod store;

// Re-export main types at crate root for convenience
pub use catalog::{Browse, CatalogService, CatalogViews, ContentTab, ViewAggregator};
pub use domain::{ContentId, ContentItem, ContentStatus, ContentType, NewContent, PublicRating};
pub use posters::PosterLibrary;
pub use store::{CatalogStore, ContentFilter, SnapshotStream, StoreError};
