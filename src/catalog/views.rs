//! Derived views over the full catalog stream.
//!
//! Every emission of the `all` stream is re-partitioned from scratch; no
//! extra store queries are made. The shuffled home list is only reshuffled
//! when asked for; between shuffles it follows membership changes, keeping
//! its order for surviving rows and appending new ones.

use std::collections::HashMap;

use futures::StreamExt;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::domain::{ContentId, ContentItem, ContentStatus, ContentType};
use crate::store::{SnapshotStream, StoreError};

/// Partitions and counts derived from one snapshot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogViews {
    pub all: Vec<ContentItem>,
    pub watched: Vec<ContentItem>,
    pub watchlist: Vec<ContentItem>,
    pub movies: Vec<ContentItem>,
    pub shows: Vec<ContentItem>,
    pub watchlist_movies: Vec<ContentItem>,
    pub watched_movies: Vec<ContentItem>,
    pub watchlist_shows: Vec<ContentItem>,
    pub watched_shows: Vec<ContentItem>,
    pub completed_movies: usize,
    pub completed_shows: usize,
}

impl CatalogViews {
    /// Split a snapshot, keeping its order inside every partition
    pub fn derive(snapshot: Vec<ContentItem>) -> Self {
        let pick = |content_type: Option<ContentType>, status: Option<ContentStatus>| {
            snapshot
                .iter()
                .filter(|item| content_type.map_or(true, |t| item.content_type == t))
                .filter(|item| status.map_or(true, |s| item.status == s))
                .cloned()
                .collect::<Vec<_>>()
        };

        let watched_movies = pick(Some(ContentType::Movie), Some(ContentStatus::Watched));
        let watched_shows = pick(Some(ContentType::Series), Some(ContentStatus::Watched));

        Self {
            watched: pick(None, Some(ContentStatus::Watched)),
            watchlist: pick(None, Some(ContentStatus::Watchlist)),
            movies: pick(Some(ContentType::Movie), None),
            shows: pick(Some(ContentType::Series), None),
            watchlist_movies: pick(Some(ContentType::Movie), Some(ContentStatus::Watchlist)),
            watchlist_shows: pick(Some(ContentType::Series), Some(ContentStatus::Watchlist)),
            completed_movies: watched_movies.len(),
            completed_shows: watched_shows.len(),
            watched_movies,
            watched_shows,
            all: snapshot,
        }
    }

    /// One of the four (type, status) partitions
    pub fn partition(&self, tab: ContentTab, status: ContentStatus) -> &[ContentItem] {
        match (tab, status) {
            (ContentTab::Movies, ContentStatus::Watchlist) => &self.watchlist_movies,
            (ContentTab::Movies, ContentStatus::Watched) => &self.watched_movies,
            (ContentTab::Shows, ContentStatus::Watchlist) => &self.watchlist_shows,
            (ContentTab::Shows, ContentStatus::Watched) => &self.watched_shows,
        }
    }

    pub fn total_completed(&self) -> usize {
        self.completed_movies + self.completed_shows
    }
}

/// Type tab on the watchlist/watched screens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentTab {
    Movies,
    Shows,
}

/// Which list the user is browsing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Browse {
    /// Shuffled list of everything
    Home,
    Watchlist(ContentTab),
    Watched(ContentTab),
}

/// Case-insensitive match of `query` against title or description.
///
/// A blank query keeps everything. No match yields an empty list.
pub fn filter_text(items: &[ContentItem], query: &str) -> Vec<ContentItem> {
    if query.trim().is_empty() {
        return items.to_vec();
    }
    let needle = query.to_lowercase();
    items
        .iter()
        .filter(|item| {
            item.title.to_lowercase().contains(&needle)
                || item
                    .description
                    .as_ref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle))
        })
        .cloned()
        .collect()
}

/// Keeps [`CatalogViews`] current from a live `all` stream
pub struct ViewAggregator {
    updates: SnapshotStream,
    views: CatalogViews,
    /// `None` until the first shuffle
    shuffled: Option<Vec<ContentItem>>,
}

impl ViewAggregator {
    /// Start from an `all` stream (e.g. `CatalogService::all_items`)
    pub fn new(updates: SnapshotStream) -> Self {
        Self {
            updates,
            views: CatalogViews::default(),
            shuffled: None,
        }
    }

    /// Wait for the next snapshot and re-derive every partition.
    ///
    /// Returns `None` once the stream has ended. On error the previous
    /// views are kept.
    pub async fn next_update(&mut self) -> Option<Result<&CatalogViews, StoreError>> {
        match self.updates.next().await? {
            Ok(snapshot) => {
                tracing::debug!("Catalog snapshot with {} items", snapshot.len());
                self.views = CatalogViews::derive(snapshot);
                if let Some(order) = self.shuffled.as_mut() {
                    reconcile_order(order, &self.views.all);
                }
                Some(Ok(&self.views))
            }
            Err(e) => Some(Err(e)),
        }
    }

    /// Views from the latest snapshot
    pub fn views(&self) -> &CatalogViews {
        &self.views
    }

    /// Reshuffle the latest snapshot with the thread RNG
    pub fn shuffle(&mut self) -> &[ContentItem] {
        self.shuffle_with(&mut rand::rng())
    }

    /// Reshuffle the latest snapshot; every call draws a new permutation
    pub fn shuffle_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> &[ContentItem] {
        let mut items = self.views.all.clone();
        items.shuffle(rng);
        &self.shuffled.insert(items)[..]
    }

    /// Last shuffled order (empty until the first shuffle)
    pub fn shuffled(&self) -> &[ContentItem] {
        self.shuffled.as_deref().unwrap_or(&[])
    }

    /// Items for a browse selection, narrowed by the free-text filter
    pub fn browse(&self, selection: Browse, query: &str) -> Vec<ContentItem> {
        let base = match selection {
            Browse::Home => self.shuffled(),
            Browse::Watchlist(tab) => self.views.partition(tab, ContentStatus::Watchlist),
            Browse::Watched(tab) => self.views.partition(tab, ContentStatus::Watched),
        };
        filter_text(base, query)
    }
}

/// Bring a shuffled order in line with a new snapshot.
///
/// Rows that are gone are dropped, surviving rows keep their position and
/// take their fields from the snapshot, new rows go at the end in snapshot
/// order.
fn reconcile_order(order: &mut Vec<ContentItem>, snapshot: &[ContentItem]) {
    let mut fresh: HashMap<&ContentId, &ContentItem> =
        snapshot.iter().map(|item| (&item.id, item)).collect();

    let mut next: Vec<ContentItem> = order
        .iter()
        .filter_map(|item| fresh.remove(&item.id).cloned())
        .collect();
    next.extend(
        snapshot
            .iter()
            .filter(|item| fresh.contains_key(&item.id))
            .cloned(),
    );
    *order = next;
}
