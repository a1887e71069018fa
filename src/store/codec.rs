//! Flat-row encoding of catalog entries.
//!
//! Enum fields are stored as their canonical names. `cast` and `genre` are
//! comma-joined, which is lossy: an entry containing a comma cannot be told
//! apart from two entries after a round trip, and `[""]` decodes as `[]`.
//! Public ratings are stored as a JSON array, with `""` for an empty list.

use crate::domain::{ContentId, ContentItem, ContentStatus, ContentType, EpochMillis, PublicRating};

use super::error::{DecodeError, EncodeError};

const LIST_SEPARATOR: &str = ",";

/// Join a string list for storage
pub fn encode_list(values: &[String]) -> String {
    values.join(LIST_SEPARATOR)
}

/// Split a stored string list. Empty input is an empty list.
pub fn decode_list(encoded: &str) -> Vec<String> {
    if encoded.is_empty() {
        Vec::new()
    } else {
        encoded.split(LIST_SEPARATOR).map(str::to_string).collect()
    }
}

pub fn encode_content_type(value: ContentType) -> &'static str {
    value.as_str()
}

pub fn decode_content_type(name: &str) -> Result<ContentType, DecodeError> {
    ContentType::from_canonical(name).ok_or_else(|| DecodeError::UnknownVariant {
        field: "type",
        value: name.to_string(),
    })
}

pub fn encode_status(value: ContentStatus) -> &'static str {
    value.as_str()
}

pub fn decode_status(name: &str) -> Result<ContentStatus, DecodeError> {
    ContentStatus::from_canonical(name).ok_or_else(|| DecodeError::UnknownVariant {
        field: "status",
        value: name.to_string(),
    })
}

pub fn encode_public_ratings(ratings: &[PublicRating]) -> Result<String, EncodeError> {
    if ratings.is_empty() {
        return Ok(String::new());
    }
    Ok(serde_json::to_string(ratings)?)
}

pub fn decode_public_ratings(encoded: &str) -> Result<Vec<PublicRating>, DecodeError> {
    if encoded.is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(encoded)?)
}

/// One `content_items` row as stored columns
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRow {
    pub id: String,
    pub title: String,
    pub poster_path: String,
    pub content_type: String,
    pub status: String,
    pub imdb_rating: Option<f64>,
    pub rotten_tomatoes_score: Option<i32>,
    pub description: Option<String>,
    pub release_year: Option<i32>,
    pub director: Option<String>,
    pub cast: String,
    pub genre: String,
    pub runtime: Option<i32>,
    pub user_rating: Option<f64>,
    pub user_notes: Option<String>,
    pub public_ratings: String,
    pub date_added: EpochMillis,
    pub date_watched: Option<EpochMillis>,
    pub imdb_id: Option<String>,
}

/// Column order shared by every SELECT and INSERT
pub const COLUMNS: &str = "id, title, poster_path, type, status, imdb_rating, \
    rotten_tomatoes_score, description, release_year, director, \"cast\", genre, runtime, \
    user_rating, user_notes, public_ratings, date_added, date_watched, imdb_id";

impl StoredRow {
    /// Read a row selected with [`COLUMNS`]
    pub fn from_sql_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            poster_path: row.get(2)?,
            content_type: row.get(3)?,
            status: row.get(4)?,
            imdb_rating: row.get(5)?,
            rotten_tomatoes_score: row.get(6)?,
            description: row.get(7)?,
            release_year: row.get(8)?,
            director: row.get(9)?,
            cast: row.get(10)?,
            genre: row.get(11)?,
            runtime: row.get(12)?,
            user_rating: row.get(13)?,
            user_notes: row.get(14)?,
            public_ratings: row.get(15)?,
            date_added: row.get(16)?,
            date_watched: row.get(17)?,
            imdb_id: row.get(18)?,
        })
    }
}

pub fn encode_item(item: &ContentItem) -> Result<StoredRow, EncodeError> {
    Ok(StoredRow {
        id: item.id.as_str().to_string(),
        title: item.title.clone(),
        poster_path: item.poster_path.clone(),
        content_type: encode_content_type(item.content_type).to_string(),
        status: encode_status(item.status).to_string(),
        imdb_rating: item.imdb_rating.map(f64::from),
        rotten_tomatoes_score: item.rotten_tomatoes_score,
        description: item.description.clone(),
        release_year: item.release_year,
        director: item.director.clone(),
        cast: encode_list(&item.cast),
        genre: encode_list(&item.genre),
        runtime: item.runtime,
        user_rating: item.user_rating.map(f64::from),
        user_notes: item.user_notes.clone(),
        public_ratings: encode_public_ratings(&item.public_ratings)?,
        date_added: item.date_added,
        date_watched: item.date_watched,
        imdb_id: item.imdb_id.clone(),
    })
}

pub fn decode_item(row: StoredRow) -> Result<ContentItem, DecodeError> {
    Ok(ContentItem {
        id: ContentId::from(row.id),
        title: row.title,
        poster_path: row.poster_path,
        content_type: decode_content_type(&row.content_type)?,
        status: decode_status(&row.status)?,
        imdb_rating: row.imdb_rating.map(|r| r as f32),
        rotten_tomatoes_score: row.rotten_tomatoes_score,
        description: row.description,
        release_year: row.release_year,
        director: row.director,
        cast: decode_list(&row.cast),
        genre: decode_list(&row.genre),
        runtime: row.runtime,
        user_rating: row.user_rating.map(|r| r as f32),
        user_notes: row.user_notes,
        public_ratings: decode_public_ratings(&row.public_ratings)?,
        date_added: row.date_added,
        date_watched: row.date_watched,
        imdb_id: row.imdb_id,
    })
}
