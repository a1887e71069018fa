//! SQLite-backed content store with live queries.
//!
//! One `content_items` table keyed by id. Blocking SQLite work runs on the
//! tokio blocking pool; the connection sits behind a mutex so every
//! statement reads a consistent snapshot.
//!
//! Live queries re-run their SELECT whenever a committed write changes at
//! least one row. A `watch` channel carries a change counter, so bursts of
//! writes may coalesce into one emission, but an emission always reflects
//! the latest committed state.

use std::path::Path;
use std::sync::Arc;

use futures::stream::{BoxStream, StreamExt};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, ToSql};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::domain::{ContentId, ContentItem, ContentStatus, ContentType};

use super::codec::{self, StoredRow, COLUMNS};
use super::error::StoreError;

/// Schema version recorded in `PRAGMA user_version`
pub const SCHEMA_VERSION: i32 = 1;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS content_items (
    id                    TEXT PRIMARY KEY NOT NULL,
    title                 TEXT NOT NULL,
    poster_path           TEXT NOT NULL,
    type                  TEXT NOT NULL,
    status                TEXT NOT NULL,
    imdb_rating           REAL,
    rotten_tomatoes_score INTEGER,
    description           TEXT,
    release_year          INTEGER,
    director              TEXT,
    "cast"                TEXT NOT NULL DEFAULT '',
    genre                 TEXT NOT NULL DEFAULT '',
    runtime               INTEGER,
    user_rating           REAL,
    user_notes            TEXT,
    public_ratings        TEXT NOT NULL DEFAULT '',
    date_added            INTEGER NOT NULL,
    date_watched          INTEGER,
    imdb_id               TEXT
);
CREATE INDEX IF NOT EXISTS idx_content_items_date_added ON content_items (date_added DESC);
CREATE INDEX IF NOT EXISTS idx_content_items_status ON content_items (status);
"#;

const ORDER: &str = "ORDER BY date_added DESC, id ASC";

/// A live, cancellable sequence of snapshots. Drop it to unsubscribe.
pub type SnapshotStream = BoxStream<'static, Result<Vec<ContentItem>, StoreError>>;

/// Row filter for snapshot queries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentFilter {
    All,
    Status(ContentStatus),
    Type(ContentType),
    /// Case-sensitive substring of the encoded genre column
    Genre(String),
    /// Case-insensitive substring of the title
    Title(String),
}

impl ContentFilter {
    fn where_clause(&self) -> (&'static str, Option<String>) {
        match self {
            ContentFilter::All => ("", None),
            ContentFilter::Status(status) => (
                "WHERE status = ?1",
                Some(codec::encode_status(*status).to_string()),
            ),
            ContentFilter::Type(content_type) => (
                "WHERE type = ?1",
                Some(codec::encode_content_type(*content_type).to_string()),
            ),
            ContentFilter::Genre(needle) => ("WHERE instr(genre, ?1) > 0", Some(needle.clone())),
            ContentFilter::Title(needle) => (
                "WHERE title LIKE '%' || ?1 || '%' ESCAPE '\\'",
                Some(escape_like(needle)),
            ),
        }
    }
}

/// Escape LIKE wildcards so the needle matches literally
fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

struct Inner {
    conn: Mutex<Connection>,
    changes: watch::Sender<u64>,
}

/// Handle to the catalog table.
///
/// Cheap to clone; all clones share one connection and one change feed.
/// Construct it once per process and pass it to whatever needs it.
#[derive(Clone)]
pub struct CatalogStore {
    inner: Arc<Inner>,
}

impl CatalogStore {
    /// Open (or create) a database file, creating parent directories
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        tracing::debug!("Journal mode: {}", mode);
        tracing::info!("Opened catalog database at {}", path.display());
        Self::from_connection(conn)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;

        let (changes, _) = watch::channel(0u64);
        Ok(Self {
            inner: Arc::new(Inner {
                conn: Mutex::new(conn),
                changes,
            }),
        })
    }

    /// Schema version stored in the database header
    pub async fn schema_version(&self) -> Result<i32, StoreError> {
        self.with_conn(|conn| {
            Ok(conn.query_row("PRAGMA user_version", [], |row| row.get(0))?)
        })
        .await
    }

    /// Run blocking work against the connection on the blocking pool
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            let conn = inner.conn.lock();
            f(&conn)
        })
        .await?
    }

    /// Run a write on the blocking pool and wake live queries if it
    /// changed rows.
    ///
    /// The signal is sent from the blocking task, so a committed write is
    /// announced even when the calling future is dropped mid-flight.
    async fn with_write<F>(&self, f: F) -> Result<usize, StoreError>
    where
        F: FnOnce(&Connection) -> Result<usize, StoreError> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            let affected = {
                let conn = inner.conn.lock();
                f(&conn)?
            };
            if affected > 0 {
                inner.changes.send_modify(|version| *version += 1);
            }
            Ok(affected)
        })
        .await?
    }

    /// One-shot snapshot for a filter
    pub async fn snapshot(&self, filter: ContentFilter) -> Result<Vec<ContentItem>, StoreError> {
        self.with_conn(move |conn| query_items(conn, &filter)).await
    }

    /// Live snapshots for a filter.
    ///
    /// Emits the current snapshot first, then again after every change.
    pub fn live(&self, filter: ContentFilter) -> SnapshotStream {
        let store = self.clone();
        WatchStream::new(self.inner.changes.subscribe())
            .then(move |_| {
                let store = store.clone();
                let filter = filter.clone();
                async move { store.snapshot(filter).await }
            })
            .boxed()
    }

    /// All entries, newest first
    pub fn get_all(&self) -> SnapshotStream {
        self.live(ContentFilter::All)
    }

    pub fn get_by_status(&self, status: ContentStatus) -> SnapshotStream {
        self.live(ContentFilter::Status(status))
    }

    pub fn get_by_type(&self, content_type: ContentType) -> SnapshotStream {
        self.live(ContentFilter::Type(content_type))
    }

    /// Entries whose encoded genre list contains `needle` (case-sensitive).
    ///
    /// The match runs over the joined column, so it can span entries.
    pub fn get_by_genre(&self, needle: impl Into<String>) -> SnapshotStream {
        self.live(ContentFilter::Genre(needle.into()))
    }

    /// Entries whose title contains `needle`, ignoring ASCII case
    pub fn search_by_title(&self, needle: impl Into<String>) -> SnapshotStream {
        self.live(ContentFilter::Title(needle.into()))
    }

    /// Point lookup; `None` when no row has this id
    pub async fn get_by_id(&self, id: &ContentId) -> Result<Option<ContentItem>, StoreError> {
        let id = id.as_str().to_string();
        self.with_conn(move |conn| {
            let sql = format!("SELECT {} FROM content_items WHERE id = ?1", COLUMNS);
            let row = conn
                .query_row(&sql, params![id], StoredRow::from_sql_row)
                .optional()?;
            match row {
                Some(row) => Ok(Some(codec::decode_item(row)?)),
                None => Ok(None),
            }
        })
        .await
    }

    /// Insert, replacing any row with the same id
    pub async fn insert(&self, item: &ContentItem) -> Result<(), StoreError> {
        let row = codec::encode_item(item)?;
        self.with_write(move |conn| {
            let sql = format!(
                "INSERT OR REPLACE INTO content_items ({}) VALUES \
                 (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
                COLUMNS
            );
            Ok(conn.execute(&sql, row_params(&row).as_slice())?)
        })
        .await?;

        tracing::debug!("Upserted content item {}", item.id);
        Ok(())
    }

    /// Replace the row with `item.id`. Returns the number of rows changed;
    /// 0 means no such row existed, which is not an error.
    pub async fn update(&self, item: &ContentItem) -> Result<usize, StoreError> {
        let row = codec::encode_item(item)?;
        let affected = self
            .with_write(move |conn| {
                Ok(conn.execute(
                    "UPDATE content_items SET title = ?2, poster_path = ?3, type = ?4, status = ?5, \
                     imdb_rating = ?6, rotten_tomatoes_score = ?7, description = ?8, release_year = ?9, \
                     director = ?10, \"cast\" = ?11, genre = ?12, runtime = ?13, user_rating = ?14, \
                     user_notes = ?15, public_ratings = ?16, date_added = ?17, date_watched = ?18, \
                     imdb_id = ?19 WHERE id = ?1",
                    row_params(&row).as_slice(),
                )?)
            })
            .await?;

        if affected == 0 {
            tracing::warn!("Update skipped, no content item {}", item.id);
        } else {
            tracing::debug!("Updated content item {}", item.id);
        }
        Ok(affected)
    }

    /// Delete the row with this item's id
    pub async fn delete(&self, item: &ContentItem) -> Result<usize, StoreError> {
        self.delete_by_id(&item.id).await
    }

    /// Delete by id. Missing rows are a no-op.
    pub async fn delete_by_id(&self, id: &ContentId) -> Result<usize, StoreError> {
        let key = id.as_str().to_string();
        let affected = self
            .with_write(move |conn| {
                Ok(conn.execute("DELETE FROM content_items WHERE id = ?1", params![key])?)
            })
            .await?;

        if affected == 0 {
            tracing::debug!("Delete skipped, no content item {}", id);
        } else {
            tracing::debug!("Deleted content item {}", id);
        }
        Ok(affected)
    }

    pub async fn count_by_status(&self, status: ContentStatus) -> Result<usize, StoreError> {
        let status = codec::encode_status(status);
        self.with_conn(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM content_items WHERE status = ?1",
                params![status],
                |row| row.get(0),
            )?;
            Ok(count as usize)
        })
        .await
    }

    pub async fn count_all(&self) -> Result<usize, StoreError> {
        self.with_conn(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM content_items", [], |row| row.get(0))?;
            Ok(count as usize)
        })
        .await
    }
}

fn row_params(row: &StoredRow) -> [&dyn ToSql; 19] {
    [
        &row.id,
        &row.title,
        &row.poster_path,
        &row.content_type,
        &row.status,
        &row.imdb_rating,
        &row.rotten_tomatoes_score,
        &row.description,
        &row.release_year,
        &row.director,
        &row.cast,
        &row.genre,
        &row.runtime,
        &row.user_rating,
        &row.user_notes,
        &row.public_ratings,
        &row.date_added,
        &row.date_watched,
        &row.imdb_id,
    ]
}

fn query_items(conn: &Connection, filter: &ContentFilter) -> Result<Vec<ContentItem>, StoreError> {
    let (clause, param) = filter.where_clause();
    let sql = format!("SELECT {} FROM content_items {} {}", COLUMNS, clause, ORDER);
    let mut stmt = conn.prepare_cached(&sql)?;

    let rows = match param {
        Some(value) => stmt
            .query_map(params![value], StoredRow::from_sql_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?,
        None => stmt
            .query_map([], StoredRow::from_sql_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?,
    };

    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        items.push(codec::decode_item(row)?);
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn item(id: &str, title: &str, date_added: i64) -> ContentItem {
        ContentItem::new(
            id,
            title,
            format!("/posters/{}.jpg", id),
            ContentType::Movie,
            ContentStatus::Watchlist,
            date_added,
        )
    }

    #[tokio::test]
    async fn test_insert_and_get_by_id() {
        let store = CatalogStore::open_in_memory().unwrap();
        let dune = item("1", "Dune", 1000);

        store.insert(&dune).await.unwrap();

        let loaded = store.get_by_id(&ContentId::from("1")).await.unwrap();
        assert_eq!(loaded, Some(dune));
        assert!(store.get_by_id(&ContentId::from("2")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_snapshot_ordering() {
        let store = CatalogStore::open_in_memory().unwrap();
        store.insert(&item("a", "Old", 100)).await.unwrap();
        store.insert(&item("b", "New", 300)).await.unwrap();
        store.insert(&item("c", "Middle", 200)).await.unwrap();

        let titles: Vec<String> = store
            .snapshot(ContentFilter::All)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.title)
            .collect();
        assert_eq!(titles, vec!["New", "Middle", "Old"]);
    }

    #[tokio::test]
    async fn test_update_missing_row_is_noop() {
        let store = CatalogStore::open_in_memory().unwrap();
        let affected = store.update(&item("ghost", "Ghost", 1)).await.unwrap();

        assert_eq!(affected, 0);
        assert_eq!(store.count_all().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_genre_match_is_case_sensitive_and_spans_entries() {
        let store = CatalogStore::open_in_memory().unwrap();
        store
            .insert(&item("1", "Alien", 1).with_genres(["Horror", "Sci-Fi"]))
            .await
            .unwrap();

        assert_eq!(store.snapshot(ContentFilter::Genre("Sci".into())).await.unwrap().len(), 1);
        assert_eq!(store.snapshot(ContentFilter::Genre("sci".into())).await.unwrap().len(), 0);
        // "r,S" only exists across the joined boundary
        assert_eq!(store.snapshot(ContentFilter::Genre("r,S".into())).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_title_search_treats_wildcards_literally() {
        let store = CatalogStore::open_in_memory().unwrap();
        store.insert(&item("1", "100% Wolf", 1)).await.unwrap();
        store.insert(&item("2", "1000 Wolves", 2)).await.unwrap();

        let hits = store.snapshot(ContentFilter::Title("0%".into())).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "100% Wolf");

        let hits = store.snapshot(ContentFilter::Title("wol".into())).await.unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_status_surfaces_decode_error() {
        let store = CatalogStore::open_in_memory().unwrap();
        store.insert(&item("1", "Dune", 1)).await.unwrap();
        store
            .with_conn(|conn| {
                conn.execute("UPDATE content_items SET status = 'DROPPED'", [])?;
                Ok(())
            })
            .await
            .unwrap();

        let err = store.get_by_id(&ContentId::from("1")).await.unwrap_err();
        assert!(err.is_decode());
        let err = store.snapshot(ContentFilter::All).await.unwrap_err();
        assert!(err.is_decode());
    }

    #[tokio::test]
    async fn test_file_database_persists_across_opens() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("catalog.db");

        {
            let store = CatalogStore::open(&path).unwrap();
            store.insert(&item("1", "Dune", 1)).await.unwrap();
        }

        let reopened = CatalogStore::open(&path).unwrap();
        assert_eq!(reopened.count_all().await.unwrap(), 1);
        assert_eq!(reopened.schema_version().await.unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }
}
