//! Typed catalog operations over the content store.
//!
//! Reads and writes pass straight through to [`CatalogStore`]; store errors
//! are returned unchanged. The only rules added here are the creation,
//! status-toggle and review-edit workflows.

use crate::domain::{
    now_millis, ContentId, ContentItem, ContentStatus, ContentType, NewContent, PublicRating,
};
use crate::store::{CatalogStore, SnapshotStream, StoreError};

/// Catalog facade handed to the presentation layer
#[derive(Clone)]
pub struct CatalogService {
    store: CatalogStore,
}

impl CatalogService {
    pub fn new(store: CatalogStore) -> Self {
        Self { store }
    }

    /// The underlying store
    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    pub fn all_items(&self) -> SnapshotStream {
        self.store.get_all()
    }

    pub fn items_by_status(&self, status: ContentStatus) -> SnapshotStream {
        self.store.get_by_status(status)
    }

    pub fn items_by_type(&self, content_type: ContentType) -> SnapshotStream {
        self.store.get_by_type(content_type)
    }

    pub fn items_by_genre(&self, genre: impl Into<String>) -> SnapshotStream {
        self.store.get_by_genre(genre)
    }

    pub fn search_items(&self, query: impl Into<String>) -> SnapshotStream {
        self.store.search_by_title(query)
    }

    pub async fn item(&self, id: &ContentId) -> Result<Option<ContentItem>, StoreError> {
        self.store.get_by_id(id).await
    }

    pub async fn insert_item(&self, item: &ContentItem) -> Result<(), StoreError> {
        self.store.insert(item).await
    }

    pub async fn update_item(&self, item: &ContentItem) -> Result<usize, StoreError> {
        self.store.update(item).await
    }

    pub async fn delete_item(&self, item: &ContentItem) -> Result<usize, StoreError> {
        self.store.delete(item).await
    }

    pub async fn delete_item_by_id(&self, id: &ContentId) -> Result<usize, StoreError> {
        self.store.delete_by_id(id).await
    }

    pub async fn count_by_status(&self, status: ContentStatus) -> Result<usize, StoreError> {
        self.store.count_by_status(status).await
    }

    /// Save a new entry with a fresh id and `date_added = now`.
    ///
    /// Callers validate required fields first (see [`NewContent::validate`]).
    pub async fn add_content(&self, draft: NewContent) -> Result<ContentItem, StoreError> {
        let item = draft.into_item(now_millis());
        self.store.insert(&item).await?;
        tracing::info!("Added {} \"{}\" ({})", item.content_type, item.title, item.id);
        Ok(item)
    }

    /// Flip Watchlist <-> Watched and write the whole row back.
    ///
    /// Not atomic against other writers: the row written is `item` with the
    /// status flipped, whatever the table holds at that moment.
    pub async fn toggle_status(&self, item: &ContentItem) -> Result<ContentItem, StoreError> {
        let updated = item.toggled(now_millis());
        self.store.update(&updated).await?;
        tracing::info!("\"{}\" moved to {}", updated.title, updated.status);
        Ok(updated)
    }

    /// Read the current row, flip its status, write it back
    pub async fn toggle_status_by_id(
        &self,
        id: &ContentId,
    ) -> Result<Option<ContentItem>, StoreError> {
        match self.store.get_by_id(id).await? {
            Some(current) => Ok(Some(self.toggle_status(&current).await?)),
            None => Ok(None),
        }
    }

    /// Put the row into `status`; no write when it is already there
    pub async fn mark_status(
        &self,
        id: &ContentId,
        status: ContentStatus,
    ) -> Result<Option<ContentItem>, StoreError> {
        let Some(current) = self.store.get_by_id(id).await? else {
            return Ok(None);
        };
        if current.status == status {
            return Ok(Some(current));
        }
        Ok(Some(self.toggle_status(&current).await?))
    }

    /// Replace the user's rating, notes and public ratings.
    ///
    /// A rating <= 0 and blank notes are stored as unset.
    pub async fn update_rating_and_notes(
        &self,
        item: &ContentItem,
        rating: f32,
        notes: &str,
        public_ratings: Vec<PublicRating>,
    ) -> Result<ContentItem, StoreError> {
        let updated = item.with_user_review(rating, notes, public_ratings);
        self.store.update(&updated).await?;
        Ok(updated)
    }
}
