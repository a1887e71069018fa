//! Catalog entry types.
//!
//! A `ContentItem` is one movie or series in the personal catalog, keyed by
//! an opaque `ContentId`. Timestamps are epoch milliseconds.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Milliseconds since the Unix epoch
pub type EpochMillis = i64;

/// Current wall-clock time in epoch milliseconds
pub fn now_millis() -> EpochMillis {
    Utc::now().timestamp_millis()
}

/// Opaque, immutable identifier of a catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the raw string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ContentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ContentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for ContentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of title
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentType {
    Movie,
    Series,
}

impl ContentType {
    /// Canonical stored name
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Movie => "MOVIE",
            ContentType::Series => "SERIES",
        }
    }

    /// Parse a canonical stored name. Matching is exact.
    pub fn from_canonical(name: &str) -> Option<Self> {
        match name {
            "MOVIE" => Some(ContentType::Movie),
            "SERIES" => Some(ContentType::Series),
            _ => None,
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentType::Movie => write!(f, "movie"),
            ContentType::Series => write!(f, "series"),
        }
    }
}

/// Where an entry sits in the user's viewing lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentStatus {
    Watchlist,
    Watched,
}

impl ContentStatus {
    /// Canonical stored name
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentStatus::Watchlist => "WATCHLIST",
            ContentStatus::Watched => "WATCHED",
        }
    }

    /// Parse a canonical stored name. Matching is exact.
    pub fn from_canonical(name: &str) -> Option<Self> {
        match name {
            "WATCHLIST" => Some(ContentStatus::Watchlist),
            "WATCHED" => Some(ContentStatus::Watched),
            _ => None,
        }
    }

    /// The other state
    pub fn flipped(self) -> Self {
        match self {
            ContentStatus::Watchlist => ContentStatus::Watched,
            ContentStatus::Watched => ContentStatus::Watchlist,
        }
    }
}

impl std::fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentStatus::Watchlist => write!(f, "watchlist"),
            ContentStatus::Watched => write!(f, "watched"),
        }
    }
}

/// Snapshot of a third-party rating (e.g. "Rotten Tomatoes", "94%")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicRating {
    pub source_name: String,
    pub score: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_path: Option<String>,
}

impl PublicRating {
    pub fn new(source_name: impl Into<String>, score: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            score: score.into(),
            logo_path: None,
        }
    }

    pub fn with_logo(mut self, logo_path: impl Into<String>) -> Self {
        self.logo_path = Some(logo_path.into());
        self
    }
}

/// A single catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    /// Primary key, never changes after creation
    pub id: ContentId,

    /// Display title (non-empty)
    pub title: String,

    /// Local file path or URI of the poster image
    pub poster_path: String,

    #[serde(rename = "type")]
    pub content_type: ContentType,

    pub status: ContentStatus,

    /// IMDb rating, 0..=10
    pub imdb_rating: Option<f32>,

    /// Rotten Tomatoes score, 0..=100
    pub rotten_tomatoes_score: Option<i32>,

    pub description: Option<String>,

    pub release_year: Option<i32>,

    pub director: Option<String>,

    /// Display order is significant
    #[serde(default)]
    pub cast: Vec<String>,

    #[serde(default)]
    pub genre: Vec<String>,

    /// Runtime in minutes
    pub runtime: Option<i32>,

    /// User rating, 0..=5. Values <= 0 mean "unset".
    pub user_rating: Option<f32>,

    pub user_notes: Option<String>,

    #[serde(default)]
    pub public_ratings: Vec<PublicRating>,

    /// Set once at creation
    pub date_added: EpochMillis,

    /// Present iff status is Watched (maintained by the mutation paths)
    pub date_watched: Option<EpochMillis>,

    pub imdb_id: Option<String>,
}

impl ContentItem {
    /// Create an entry with only the required fields populated.
    ///
    /// `date_watched` follows the status: set to `date_added` when the
    /// entry starts out Watched, absent otherwise.
    pub fn new(
        id: impl Into<ContentId>,
        title: impl Into<String>,
        poster_path: impl Into<String>,
        content_type: ContentType,
        status: ContentStatus,
        date_added: EpochMillis,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            poster_path: poster_path.into(),
            content_type,
            status,
            imdb_rating: None,
            rotten_tomatoes_score: None,
            description: None,
            release_year: None,
            director: None,
            cast: Vec::new(),
            genre: Vec::new(),
            runtime: None,
            user_rating: None,
            user_notes: None,
            public_ratings: Vec::new(),
            date_added,
            date_watched: (status == ContentStatus::Watched).then_some(date_added),
            imdb_id: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_release_year(mut self, year: i32) -> Self {
        self.release_year = Some(year);
        self
    }

    pub fn with_genres(mut self, genres: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.genre.extend(genres.into_iter().map(Into::into));
        self
    }

    pub fn with_cast(mut self, cast: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.cast.extend(cast.into_iter().map(Into::into));
        self
    }

    pub fn is_watched(&self) -> bool {
        self.status == ContentStatus::Watched
    }

    /// User rating, treating non-positive values as unset
    pub fn effective_user_rating(&self) -> Option<f32> {
        self.user_rating.filter(|r| *r > 0.0)
    }

    /// Copy of this entry moved to the other status.
    ///
    /// Watchlist -> Watched stamps `date_watched = now`; Watched -> Watchlist
    /// clears it. Every other field is carried over unchanged.
    pub fn toggled(&self, now: EpochMillis) -> Self {
        self.with_status(self.status.flipped(), now)
    }

    /// Copy of this entry in `status`, keeping `date_watched` consistent.
    ///
    /// Returns an unchanged copy when the entry is already in `status`.
    pub fn with_status(&self, status: ContentStatus, now: EpochMillis) -> Self {
        if self.status == status {
            return self.clone();
        }
        Self {
            status,
            date_watched: (status == ContentStatus::Watched).then_some(now),
            ..self.clone()
        }
    }

    /// Copy with the user's rating, notes and public ratings replaced.
    ///
    /// A rating <= 0 is stored as unset and blank notes are stored as unset.
    pub fn with_user_review(
        &self,
        rating: f32,
        notes: &str,
        public_ratings: Vec<PublicRating>,
    ) -> Self {
        Self {
            user_rating: (rating > 0.0).then_some(rating),
            user_notes: (!notes.trim().is_empty()).then(|| notes.to_string()),
            public_ratings,
            ..self.clone()
        }
    }

    pub fn date_added_utc(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.date_added).single()
    }

    pub fn date_watched_utc(&self) -> Option<DateTime<Utc>> {
        self.date_watched
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
    }
}

/// Errors from validating user-entered fields
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Title is required")]
    MissingTitle,

    #[error("Poster image is required")]
    MissingPoster,
}

/// User-entered fields for a new catalog entry
#[derive(Debug, Clone)]
pub struct NewContent {
    pub title: String,
    pub poster_path: String,
    pub content_type: ContentType,
    pub status: ContentStatus,
    pub release_year: Option<i32>,
    pub description: Option<String>,
    pub director: Option<String>,
    pub genre: Vec<String>,
    pub cast: Vec<String>,
    pub runtime: Option<i32>,
    pub imdb_rating: Option<f32>,
    pub rotten_tomatoes_score: Option<i32>,
    pub imdb_id: Option<String>,
}

impl NewContent {
    pub fn new(
        title: impl Into<String>,
        poster_path: impl Into<String>,
        content_type: ContentType,
        status: ContentStatus,
    ) -> Self {
        Self {
            title: title.into(),
            poster_path: poster_path.into(),
            content_type,
            status,
            release_year: None,
            description: None,
            director: None,
            genre: Vec::new(),
            cast: Vec::new(),
            runtime: None,
            imdb_rating: None,
            rotten_tomatoes_score: None,
            imdb_id: None,
        }
    }

    /// Check required fields are present
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::MissingTitle);
        }
        if self.poster_path.trim().is_empty() {
            return Err(ValidationError::MissingPoster);
        }
        Ok(())
    }

    /// Build the stored entry with a fresh id, added at `now`
    pub fn into_item(self, now: EpochMillis) -> ContentItem {
        let mut item = ContentItem::new(
            ContentId::generate(),
            self.title.trim(),
            self.poster_path,
            self.content_type,
            self.status,
            now,
        );
        item.release_year = self.release_year;
        item.description = self.description;
        item.director = self.director;
        item.genre = self.genre;
        item.cast = self.cast;
        item.runtime = self.runtime;
        item.imdb_rating = self.imdb_rating;
        item.rotten_tomatoes_score = self.rotten_tomatoes_score;
        item.imdb_id = self.imdb_id;
        item
    }
}
