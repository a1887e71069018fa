//! Catalog operations and the views derived from them.
//!
//! - `service`: typed facade over the store, plus the add/toggle/review workflows
//! - `views`: partitions, completion counts, shuffle and free-text filtering
//!
//! # Data Flow
//!
//! ```text
//! CatalogStore ──live(all)──► ViewAggregator ──► CatalogViews / shuffled / browse
//!      ▲
//!      └── CatalogService (insert / update / delete / toggle)
//! ```

pub mod service;
pub mod views;

pub use service::CatalogService;
pub use views::{filter_text, Browse, CatalogViews, ContentTab, ViewAggregator};
