//! Catalog Store Integration Tests
//!
//! Persistence contract of the content table: upserts, point lookups,
//! filtered snapshots and the lossy list columns.

use cinevault::domain::{ContentId, ContentItem, ContentStatus, ContentType, PublicRating};
use cinevault::store::{CatalogStore, ContentFilter, SCHEMA_VERSION};
use futures::StreamExt;
use tempfile::TempDir;

fn movie(id: &str, title: &str, status: ContentStatus, date_added: i64) -> ContentItem {
    ContentItem::new(id, title, "/posters/p.jpg", ContentType::Movie, status, date_added)
}

fn series(id: &str, title: &str, status: ContentStatus, date_added: i64) -> ContentItem {
    ContentItem::new(id, title, "/posters/p.jpg", ContentType::Series, status, date_added)
}

fn fully_populated() -> ContentItem {
    let mut item = movie("full", "Arrival", ContentStatus::Watched, 1_700_000_000_000)
        .with_description("Linguist decodes an alien language")
        .with_release_year(2016)
        .with_genres(["Sci-Fi", "Drama"])
        .with_cast(["Amy Adams", "Jeremy Renner"]);
    item.director = Some("Denis Villeneuve".to_string());
    item.imdb_rating = Some(7.9);
    item.rotten_tomatoes_score = Some(94);
    item.runtime = Some(116);
    item.user_rating = Some(4.5);
    item.user_notes = Some("Rewatch with subtitles".to_string());
    item.public_ratings = vec![
        PublicRating::new("IMDb", "7.9"),
        PublicRating::new("Metacritic", "").with_logo("/logos/mc.png"),
    ];
    item.imdb_id = Some("tt2543164".to_string());
    item
}

#[tokio::test]
async fn test_add_then_find() {
    let store = CatalogStore::open_in_memory().unwrap();
    let dune = movie("1", "Dune", ContentStatus::Watchlist, 1000);

    store.insert(&dune).await.unwrap();

    let found = store.get_by_id(&ContentId::from("1")).await.unwrap();
    assert_eq!(found, Some(dune.clone()));

    let mut watchlist = store.get_by_status(ContentStatus::Watchlist);
    assert_eq!(watchlist.next().await.unwrap().unwrap(), vec![dune]);

    let mut watched = store.get_by_status(ContentStatus::Watched);
    assert!(watched.next().await.unwrap().unwrap().is_empty());
}

#[tokio::test]
async fn test_round_trip_through_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested").join("catalog.db");
    let item = fully_populated();

    {
        let store = CatalogStore::open(&path).unwrap();
        store.insert(&item).await.unwrap();
    }

    let reopened = CatalogStore::open(&path).unwrap();
    assert_eq!(reopened.schema_version().await.unwrap(), SCHEMA_VERSION);
    assert_eq!(reopened.get_by_id(&item.id).await.unwrap(), Some(item));
}

#[tokio::test]
async fn test_list_columns_split_on_commas() {
    let store = CatalogStore::open_in_memory().unwrap();
    let item = movie("1", "Heat", ContentStatus::Watchlist, 1).with_cast(["A,B", "C"]);

    store.insert(&item).await.unwrap();

    let stored = store.get_by_id(&item.id).await.unwrap().unwrap();
    assert_eq!(stored.cast, vec!["A", "B", "C"]);
}

#[tokio::test]
async fn test_upsert_keeps_one_row_with_latest_fields() {
    let store = CatalogStore::open_in_memory().unwrap();
    let first = movie("1", "Dune", ContentStatus::Watchlist, 1000);
    let second = movie("1", "Dune: Part One", ContentStatus::Watched, 2000);

    store.insert(&first).await.unwrap();
    store.insert(&second).await.unwrap();

    assert_eq!(store.count_all().await.unwrap(), 1);
    assert_eq!(
        store.get_by_id(&ContentId::from("1")).await.unwrap(),
        Some(second)
    );
}

#[tokio::test]
async fn test_delete_non_existent() {
    let store = CatalogStore::open_in_memory().unwrap();

    let affected = store.delete_by_id(&ContentId::from("missing")).await.unwrap();

    assert_eq!(affected, 0);
    assert!(store.snapshot(ContentFilter::All).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_by_item_uses_primary_key() {
    let store = CatalogStore::open_in_memory().unwrap();
    let stored = movie("1", "Dune", ContentStatus::Watchlist, 1000);
    store.insert(&stored).await.unwrap();

    // Other fields differ; only the id matters
    let stale = movie("1", "Old title", ContentStatus::Watched, 5);
    assert_eq!(store.delete(&stale).await.unwrap(), 1);
    assert_eq!(store.count_all().await.unwrap(), 0);
}

#[tokio::test]
async fn test_search_is_case_insensitive_substring() {
    let store = CatalogStore::open_in_memory().unwrap();
    store
        .insert(&movie("1", "Inception", ContentStatus::Watched, 1))
        .await
        .unwrap();
    store
        .insert(&movie("2", "The Matrix", ContentStatus::Watched, 2))
        .await
        .unwrap();

    let mut results = store.search_by_title("in");
    let titles: Vec<String> = results
        .next()
        .await
        .unwrap()
        .unwrap()
        .into_iter()
        .map(|i| i.title)
        .collect();
    assert_eq!(titles, vec!["Inception"]);

    let upper = store
        .snapshot(ContentFilter::Title("MATRIX".to_string()))
        .await
        .unwrap();
    assert_eq!(upper.len(), 1);
}

#[tokio::test]
async fn test_status_filter_is_ordered_subset_of_all() {
    let store = CatalogStore::open_in_memory().unwrap();
    let items = vec![
        movie("a", "Alien", ContentStatus::Watched, 10),
        series("b", "Dark", ContentStatus::Watched, 40),
        movie("c", "Heat", ContentStatus::Watchlist, 30),
        series("d", "Severance", ContentStatus::Watchlist, 20),
        movie("e", "Dune", ContentStatus::Watched, 50),
    ];
    for item in &items {
        store.insert(item).await.unwrap();
    }

    let all = store.snapshot(ContentFilter::All).await.unwrap();
    let all_ids: Vec<&str> = all.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(all_ids, vec!["e", "b", "c", "d", "a"]);

    let watched = store
        .snapshot(ContentFilter::Status(ContentStatus::Watched))
        .await
        .unwrap();
    let expected: Vec<ContentItem> = all
        .iter()
        .filter(|i| i.status == ContentStatus::Watched)
        .cloned()
        .collect();
    assert_eq!(watched, expected);

    let shows = store
        .snapshot(ContentFilter::Type(ContentType::Series))
        .await
        .unwrap();
    let show_ids: Vec<&str> = shows.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(show_ids, vec!["b", "d"]);

    assert_eq!(
        store.count_by_status(ContentStatus::Watched).await.unwrap(),
        watched.len()
    );
}

#[tokio::test]
async fn test_genre_filter_matches_encoded_column() {
    let store = CatalogStore::open_in_memory().unwrap();
    store
        .insert(&movie("1", "Dune", ContentStatus::Watchlist, 1).with_genres(["Sci-Fi", "Drama"]))
        .await
        .unwrap();
    store
        .insert(&movie("2", "Heat", ContentStatus::Watchlist, 2).with_genres(["Crime"]))
        .await
        .unwrap();

    let drama = store
        .snapshot(ContentFilter::Genre("Drama".to_string()))
        .await
        .unwrap();
    assert_eq!(drama.len(), 1);

    // Case-sensitive
    let lower = store
        .snapshot(ContentFilter::Genre("drama".to_string()))
        .await
        .unwrap();
    assert!(lower.is_empty());
}

#[tokio::test]
async fn test_corrupt_enum_surfaces_decode_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("catalog.db");

    {
        let store = CatalogStore::open(&path).unwrap();
        store
            .insert(&movie("1", "Dune", ContentStatus::Watchlist, 1))
            .await
            .unwrap();
    }
    {
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.execute("UPDATE content_items SET status = 'DROPPED'", [])
            .unwrap();
    }

    let store = CatalogStore::open(&path).unwrap();
    let err = store
        .snapshot(ContentFilter::All)
        .await
        .unwrap_err();
    assert!(err.is_decode());
}
