//! Command-line interface for cinevault.
//!
//! Provides commands for adding titles, listing and searching the catalog,
//! toggling watched state, rating, browsing the derived views and
//! following live updates.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use futures::StreamExt;

use crate::catalog::{filter_text, Browse, CatalogService, ContentTab, ViewAggregator};
use crate::config::{self, ResolvedConfig};
use crate::domain::{ContentItem, ContentStatus, ContentType, NewContent, PublicRating};
use crate::posters::PosterLibrary;
use crate::store::{codec, CatalogStore, ContentFilter, SnapshotStream};

/// cinevault - Personal movie and show poster catalog
#[derive(Parser, Debug)]
#[command(name = "cinevault")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Database file (overrides config)
    #[arg(long, global = true, env = "CINEVAULT_DB")]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a movie or series
    Add {
        /// Title
        title: String,

        /// Poster image (file path or URI)
        #[arg(short, long)]
        poster: String,

        #[arg(short = 't', long = "type", value_enum, default_value = "movie")]
        content_type: TypeArg,

        #[arg(short, long, value_enum, default_value = "watchlist")]
        status: StatusArg,

        /// Release year
        #[arg(short, long)]
        year: Option<i32>,

        /// Genres (comma-separated)
        #[arg(short, long)]
        genre: Option<String>,

        /// Cast members (comma-separated)
        #[arg(long)]
        cast: Option<String>,

        #[arg(long)]
        director: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        /// Runtime in minutes
        #[arg(long)]
        runtime: Option<i32>,

        #[arg(long)]
        imdb_rating: Option<f32>,

        #[arg(long)]
        imdb_id: Option<String>,

        /// Rotten Tomatoes score (0-100)
        #[arg(long)]
        rt_score: Option<i32>,

        /// Store the poster reference as given instead of copying the file
        #[arg(long)]
        no_import: bool,
    },

    /// List catalog entries
    List {
        #[arg(short, long, value_enum)]
        status: Option<StatusArg>,

        #[arg(short = 't', long = "type", value_enum)]
        content_type: Option<TypeArg>,

        /// Genre substring (case-sensitive)
        #[arg(short, long)]
        genre: Option<String>,

        /// Maximum number of items to show
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },

    /// Show details of an entry
    Show {
        /// Content ID (or unique prefix)
        content_id: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Move an entry between watchlist and watched
    Toggle {
        /// Content ID (or unique prefix)
        content_id: String,
    },

    /// Set your rating, notes and public ratings
    Rate {
        /// Content ID (or unique prefix)
        content_id: String,

        /// Rating 0-5 (0 clears it)
        #[arg(short, long, default_value = "0")]
        rating: f32,

        /// Notes (empty clears them)
        #[arg(short, long, default_value = "")]
        notes: String,

        /// Public rating as SOURCE=SCORE (repeatable, replaces existing)
        #[arg(long = "public")]
        public: Vec<String>,

        /// Remove all public ratings
        #[arg(long, conflicts_with = "public")]
        clear_public: bool,
    },

    /// Delete an entry (its poster file is kept)
    Delete {
        /// Content ID (or unique prefix)
        content_id: String,
    },

    /// Search titles
    Search {
        /// Search query
        query: String,
    },

    /// Browse a view (home, watchlist or watched)
    Browse {
        #[arg(value_enum, default_value = "home")]
        view: ViewArg,

        #[arg(long, value_enum, default_value = "movies")]
        tab: TabArg,

        /// Filter by title or description
        #[arg(short, long, default_value = "")]
        query: String,
    },

    /// Show completion counts
    Stats,

    /// Print the catalog in a random order
    Shuffle,

    /// Follow live updates of a listing until Ctrl-C
    Watch {
        #[arg(short, long, value_enum)]
        status: Option<StatusArg>,
    },

    /// List poster files no entry references
    Orphans,

    /// Show resolved configuration (debug)
    Config,
}

/// Content type for CLI (maps to ContentType)
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TypeArg {
    Movie,
    Series,
}

impl From<TypeArg> for ContentType {
    fn from(t: TypeArg) -> Self {
        match t {
            TypeArg::Movie => ContentType::Movie,
            TypeArg::Series => ContentType::Series,
        }
    }
}

/// Status for CLI (maps to ContentStatus)
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StatusArg {
    Watchlist,
    Watched,
}

impl From<StatusArg> for ContentStatus {
    fn from(s: StatusArg) -> Self {
        match s {
            StatusArg::Watchlist => ContentStatus::Watchlist,
            StatusArg::Watched => ContentStatus::Watched,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ViewArg {
    Home,
    Watchlist,
    Watched,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TabArg {
    Movies,
    Shows,
}

impl From<TabArg> for ContentTab {
    fn from(t: TabArg) -> Self {
        match t {
            TabArg::Movies => ContentTab::Movies,
            TabArg::Shows => ContentTab::Shows,
        }
    }
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let cfg = config::config()?;

        if let Commands::Config = self.command {
            return show_config(cfg, self.database.as_deref());
        }

        let db_path = self.database.unwrap_or_else(|| cfg.database.clone());
        let store = CatalogStore::open(&db_path)
            .with_context(|| format!("Failed to open catalog: {}", db_path.display()))?;
        let service = CatalogService::new(store);
        let posters = PosterLibrary::new(&cfg.posters);

        match self.command {
            Commands::Add {
                title,
                poster,
                content_type,
                status,
                year,
                genre,
                cast,
                director,
                description,
                runtime,
                imdb_rating,
                imdb_id,
                rt_score,
                no_import,
            } => {
                let mut draft = NewContent::new(title, poster, content_type.into(), status.into());
                draft.release_year = year;
                draft.genre = split_list(genre.as_deref());
                draft.cast = split_list(cast.as_deref());
                draft.director = director;
                draft.description = description;
                draft.runtime = runtime;
                draft.imdb_rating = imdb_rating;
                draft.imdb_id = imdb_id;
                draft.rotten_tomatoes_score = rt_score;
                add_content(&service, &posters, draft, !no_import).await
            }
            Commands::List {
                status,
                content_type,
                genre,
                limit,
            } => {
                let filter = ListFilter {
                    status: status.map(Into::into),
                    content_type: content_type.map(Into::into),
                    genre,
                };
                list_items(&service, &filter, limit).await
            }
            Commands::Show { content_id, json } => show_item(&service, &content_id, json).await,
            Commands::Toggle { content_id } => toggle_item(&service, &content_id).await,
            Commands::Rate {
                content_id,
                rating,
                notes,
                public,
                clear_public,
            } => rate_item(&service, &content_id, rating, &notes, public, clear_public).await,
            Commands::Delete { content_id } => delete_item(&service, &content_id).await,
            Commands::Search { query } => search_items(&service, &query).await,
            Commands::Browse { view, tab, query } => {
                let selection = match view {
                    ViewArg::Home => Browse::Home,
                    ViewArg::Watchlist => Browse::Watchlist(tab.into()),
                    ViewArg::Watched => Browse::Watched(tab.into()),
                };
                browse(&service, selection, &query, cfg.shuffle_on_start).await
            }
            Commands::Stats => show_stats(&service).await,
            Commands::Shuffle => browse(&service, Browse::Home, "", true).await,
            Commands::Watch { status } => {
                let stream = match status {
                    Some(s) => service.items_by_status(s.into()),
                    None => service.all_items(),
                };
                watch_items(stream).await
            }
            Commands::Orphans => list_orphans(&service, &posters).await,
            Commands::Config => Ok(()),
        }
    }
}

/// Split a comma-separated argument into trimmed, non-empty entries
fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .map(|s| {
            s.split(',')
                .map(|part| part.trim().to_string())
                .filter(|part| !part.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Parse `SOURCE=SCORE`
fn parse_public_rating(value: &str) -> Result<PublicRating> {
    let (source, score) = value
        .split_once('=')
        .with_context(|| format!("Expected SOURCE=SCORE, got: {}", value))?;
    let (source, score) = (source.trim(), score.trim());
    if source.is_empty() || score.is_empty() {
        anyhow::bail!("Expected SOURCE=SCORE, got: {}", value);
    }
    Ok(PublicRating::new(source, score))
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let cut: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}

fn print_table(items: &[ContentItem]) {
    println!("{:<38} {:<8} {:<10} {:<40}", "ID", "TYPE", "STATUS", "TITLE");
    println!("{}", "-".repeat(98));

    for item in items {
        println!(
            "{:<38} {:<8} {:<10} {:<40}",
            item.id.as_str(),
            item.content_type.to_string(),
            item.status.to_string(),
            truncate(&item.title, 40)
        );
    }
}

/// Find an entry by exact id or unique id prefix
async fn resolve_item(service: &CatalogService, content_id: &str) -> Result<ContentItem> {
    if let Some(item) = service.item(&content_id.into()).await? {
        return Ok(item);
    }

    let matches: Vec<ContentItem> = service
        .store()
        .snapshot(ContentFilter::All)
        .await?
        .into_iter()
        .filter(|i| i.id.as_str().starts_with(content_id))
        .collect();

    match matches.len() {
        0 => anyhow::bail!("Content not found: {}", content_id),
        1 => Ok(matches.into_iter().next().context("Content not found")?),
        n => anyhow::bail!("Ambiguous id prefix {} matches {} entries", content_id, n),
    }
}

/// Poster values that look like URIs are stored as-is
fn is_uri(poster: &str) -> bool {
    poster.contains("://")
}

async fn add_content(
    service: &CatalogService,
    posters: &PosterLibrary,
    mut draft: NewContent,
    import_poster: bool,
) -> Result<()> {
    draft.validate()?;

    if import_poster && !is_uri(&draft.poster_path) {
        let stored = posters
            .import(Path::new(&draft.poster_path))
            .await
            .context("Failed to save poster image")?;
        draft.poster_path = stored.to_string_lossy().to_string();
    }

    let item = service.add_content(draft).await?;

    eprintln!("Added \"{}\" to your {}", item.title, item.status);
    println!("{}", item.id);
    Ok(())
}

/// Filters for `list`; every given filter must match
#[derive(Debug, Clone, Default, PartialEq)]
struct ListFilter {
    status: Option<ContentStatus>,
    content_type: Option<ContentType>,
    genre: Option<String>,
}

impl ListFilter {
    /// The narrowest filter the store can run on its own
    fn store_filter(&self) -> ContentFilter {
        match (self.status, self.content_type, &self.genre) {
            (Some(status), _, _) => ContentFilter::Status(status),
            (None, Some(content_type), _) => ContentFilter::Type(content_type),
            (None, None, Some(genre)) => ContentFilter::Genre(genre.clone()),
            (None, None, None) => ContentFilter::All,
        }
    }

    /// Genre matches the encoded column, same as the store's genre query
    fn matches(&self, item: &ContentItem) -> bool {
        self.status.map_or(true, |s| item.status == s)
            && self.content_type.map_or(true, |t| item.content_type == t)
            && self
                .genre
                .as_ref()
                .map_or(true, |g| codec::encode_list(&item.genre).contains(g.as_str()))
    }
}

async fn filtered_items(service: &CatalogService, filter: &ListFilter) -> Result<Vec<ContentItem>> {
    let items = service.store().snapshot(filter.store_filter()).await?;
    Ok(items.into_iter().filter(|item| filter.matches(item)).collect())
}

async fn list_items(service: &CatalogService, filter: &ListFilter, limit: usize) -> Result<()> {
    let items = filtered_items(service, filter).await?;

    if items.is_empty() {
        println!("Nothing here yet. Use 'cinevault add <title> --poster <image>' to add a title.");
        return Ok(());
    }

    print_table(&items[..items.len().min(limit)]);
    println!("\nTotal: {} items", items.len());
    Ok(())
}

async fn show_item(service: &CatalogService, content_id: &str, json: bool) -> Result<()> {
    let item = resolve_item(service, content_id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&item)?);
        return Ok(());
    }

    println!("  ID: {}", item.id);
    println!("  Title: {}", item.title);
    println!("  Type: {}", item.content_type);
    println!("  Status: {}", item.status);
    println!("  Poster: {}", item.poster_path);
    if let Some(year) = item.release_year {
        println!("  Year: {}", year);
    }
    if let Some(director) = &item.director {
        println!("  Director: {}", director);
    }
    if !item.genre.is_empty() {
        println!("  Genre: {}", item.genre.join(", "));
    }
    if !item.cast.is_empty() {
        println!("  Cast: {}", item.cast.join(", "));
    }
    if let Some(runtime) = item.runtime {
        println!("  Runtime: {} min", runtime);
    }
    if let Some(description) = &item.description {
        println!("  Description: {}", description);
    }
    if let Some(rating) = item.imdb_rating {
        println!("  IMDb: {:.1}/10", rating);
    }
    if let Some(score) = item.rotten_tomatoes_score {
        println!("  Rotten Tomatoes: {}%", score);
    }
    for rating in &item.public_ratings {
        println!("  {}: {}", rating.source_name, rating.score);
    }
    if let Some(rating) = item.effective_user_rating() {
        println!("  Your rating: {:.1}/5", rating);
    }
    if let Some(notes) = &item.user_notes {
        println!("  Notes: {}", notes);
    }
    if let Some(added) = item.date_added_utc() {
        println!("  Added: {}", added.format("%Y-%m-%d %H:%M"));
    }
    if let Some(watched) = item.date_watched_utc() {
        println!("  Watched: {}", watched.format("%Y-%m-%d %H:%M"));
    }
    Ok(())
}

async fn toggle_item(service: &CatalogService, content_id: &str) -> Result<()> {
    let item = resolve_item(service, content_id).await?;
    let updated = service.toggle_status(&item).await?;
    println!("\"{}\" is now in your {}", updated.title, updated.status);
    Ok(())
}

async fn rate_item(
    service: &CatalogService,
    content_id: &str,
    rating: f32,
    notes: &str,
    public: Vec<String>,
    clear_public: bool,
) -> Result<()> {
    if !(0.0..=5.0).contains(&rating) {
        anyhow::bail!("Rating must be between 0 and 5, got {}", rating);
    }

    let item = resolve_item(service, content_id).await?;
    let public_ratings = if clear_public {
        Vec::new()
    } else if public.is_empty() {
        item.public_ratings.clone()
    } else {
        public
            .iter()
            .map(|p| parse_public_rating(p))
            .collect::<Result<Vec<_>>>()?
    };

    let updated = service
        .update_rating_and_notes(&item, rating, notes, public_ratings)
        .await?;
    match updated.effective_user_rating() {
        Some(r) => println!("Rated \"{}\" {:.1}/5", updated.title, r),
        None => println!("Cleared rating for \"{}\"", updated.title),
    }
    Ok(())
}

async fn delete_item(service: &CatalogService, content_id: &str) -> Result<()> {
    let item = resolve_item(service, content_id).await?;
    service.delete_item(&item).await?;
    println!("Deleted \"{}\"", item.title);
    Ok(())
}

async fn search_items(service: &CatalogService, query: &str) -> Result<()> {
    let results = service
        .store()
        .snapshot(ContentFilter::Title(query.to_string()))
        .await?;

    if results.is_empty() {
        println!("No results found for: {}", query);
        return Ok(());
    }

    println!("Found {} result(s) for \"{}\":\n", results.len(), query);
    print_table(&results);
    Ok(())
}

async fn browse(
    service: &CatalogService,
    selection: Browse,
    query: &str,
    shuffle: bool,
) -> Result<()> {
    let mut aggregator = ViewAggregator::new(service.all_items());
    match aggregator.next_update().await {
        Some(result) => {
            result?;
        }
        None => anyhow::bail!("Catalog stream closed"),
    }

    let items = match selection {
        // Newest-first order when shuffling is turned off
        Browse::Home if !shuffle => filter_text(&aggregator.views().all, query),
        Browse::Home => {
            aggregator.shuffle();
            aggregator.browse(selection, query)
        }
        _ => aggregator.browse(selection, query),
    };

    if items.is_empty() {
        if query.trim().is_empty() {
            println!("Nothing here yet.");
        } else {
            println!("No results found for: {}", query);
        }
        return Ok(());
    }

    print_table(&items);
    Ok(())
}

async fn show_stats(service: &CatalogService) -> Result<()> {
    let mut aggregator = ViewAggregator::new(service.all_items());
    let views = match aggregator.next_update().await {
        Some(result) => result?,
        None => anyhow::bail!("Catalog stream closed"),
    };

    println!("Completed movies: {}", views.completed_movies);
    println!("Completed shows:  {}", views.completed_shows);
    println!();
    println!(
        "Watchlist: {} movies, {} shows",
        views.watchlist_movies.len(),
        views.watchlist_shows.len()
    );
    println!("Total:     {} items", views.all.len());
    println!();

    let watched = service.count_by_status(ContentStatus::Watched).await?;
    let watchlist = service.count_by_status(ContentStatus::Watchlist).await?;
    println!("Watched:   {} items", watched);
    println!("On watchlist: {} items", watchlist);
    Ok(())
}

async fn watch_items(mut stream: SnapshotStream) -> Result<()> {
    eprintln!("Watching for changes (Ctrl-C to stop)...");

    loop {
        tokio::select! {
            next = stream.next() => {
                let Some(snapshot) = next else { break };
                let items = snapshot?;
                println!("\n[{} items]", items.len());
                print_table(&items);
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    Ok(())
}

async fn list_orphans(service: &CatalogService, posters: &PosterLibrary) -> Result<()> {
    let referenced: Vec<String> = service
        .store()
        .snapshot(ContentFilter::All)
        .await?
        .into_iter()
        .map(|item| item.poster_path)
        .collect();

    let orphans = posters.orphans(&referenced).await?;
    if orphans.is_empty() {
        println!("No orphaned posters in {}", posters.dir().display());
        return Ok(());
    }

    for path in &orphans {
        println!("{}", path.display());
    }
    println!("\n{} orphaned poster(s)", orphans.len());
    Ok(())
}

/// Show the resolved configuration (for debugging)
fn show_config(cfg: &ResolvedConfig, database_override: Option<&Path>) -> Result<()> {
    println!("CineVault Configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Home:     {}", cfg.home.display());
    println!(
        "  Database: {}",
        database_override.unwrap_or(&cfg.database).display()
    );
    println!("  Posters:  {}", cfg.posters.display());
    println!();
    println!("Browse:");
    println!("  Shuffle on start: {}", cfg.shuffle_on_start);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list() {
        assert_eq!(
            split_list(Some("Drama, Sci-Fi ,,")),
            vec!["Drama".to_string(), "Sci-Fi".to_string()]
        );
        assert!(split_list(None).is_empty());
    }

    #[test]
    fn test_parse_public_rating() {
        let rating = parse_public_rating("Rotten Tomatoes = 94%").unwrap();
        assert_eq!(rating, PublicRating::new("Rotten Tomatoes", "94%"));
        assert!(parse_public_rating("no-separator").is_err());
        assert!(parse_public_rating("=8").is_err());
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("Amélie", 10), "Amélie");
        assert_eq!(truncate("Crouching Tiger, Hidden Dragon", 10), "Crouchi...");
    }

    #[test]
    fn test_is_uri() {
        assert!(is_uri("content://media/external/images/1"));
        assert!(!is_uri("/home/me/poster.jpg"));
    }

    #[test]
    fn test_cli_parses_add() {
        let cli = Cli::try_parse_from([
            "cinevault", "add", "Dune", "--poster", "dune.jpg", "--type", "series", "--status",
            "watched", "--genre", "Sci-Fi,Drama",
        ])
        .unwrap();

        match cli.command {
            Commands::Add {
                title,
                content_type,
                status,
                genre,
                ..
            } => {
                assert_eq!(title, "Dune");
                assert_eq!(ContentType::from(content_type), ContentType::Series);
                assert_eq!(ContentStatus::from(status), ContentStatus::Watched);
                assert_eq!(genre.as_deref(), Some("Sci-Fi,Drama"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_list_filters_combine() {
        let service = CatalogService::new(CatalogStore::open_in_memory().unwrap());
        let entries = [
            ("1", ContentType::Movie, ContentStatus::Watched, "Drama"),
            ("2", ContentType::Series, ContentStatus::Watched, "Drama"),
            ("3", ContentType::Movie, ContentStatus::Watchlist, "Drama"),
            ("4", ContentType::Movie, ContentStatus::Watched, "Comedy"),
        ];
        for (id, content_type, status, genre) in entries {
            let item = ContentItem::new(id, "T", "/p.jpg", content_type, status, 1)
                .with_genres([genre]);
            service.insert_item(&item).await.unwrap();
        }

        let cli = Cli::try_parse_from([
            "cinevault", "list", "--status", "watched", "--type", "movie", "--genre", "Drama",
        ])
        .unwrap();
        let filter = match cli.command {
            Commands::List {
                status,
                content_type,
                genre,
                ..
            } => ListFilter {
                status: status.map(Into::into),
                content_type: content_type.map(Into::into),
                genre,
            },
            other => panic!("unexpected command: {:?}", other),
        };

        let items = filtered_items(&service, &filter).await.unwrap();
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["1"]);

        let type_only = ListFilter {
            content_type: Some(ContentType::Movie),
            ..Default::default()
        };
        assert_eq!(filtered_items(&service, &type_only).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_resolve_item_by_prefix() {
        let service = CatalogService::new(CatalogStore::open_in_memory().unwrap());
        let item = ContentItem::new(
            "abc123",
            "Dune",
            "/p.jpg",
            ContentType::Movie,
            ContentStatus::Watchlist,
            1,
        );
        service.insert_item(&item).await.unwrap();
        service
            .insert_item(&ContentItem::new(
                "abd999",
                "Heat",
                "/p.jpg",
                ContentType::Movie,
                ContentStatus::Watchlist,
                2,
            ))
            .await
            .unwrap();

        assert_eq!(resolve_item(&service, "abc").await.unwrap(), item);
        assert!(resolve_item(&service, "ab").await.is_err());
        assert!(resolve_item(&service, "zzz").await.is_err());
    }
}
