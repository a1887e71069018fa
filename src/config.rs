//! Configuration for cinevault paths and browsing defaults.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (CINEVAULT_HOME, CINEVAULT_DB)
//! 2. Config file (.cinevault/config.yaml)
//! 3. Defaults (~/.cinevault)
//!
//! Config file discovery:
//! - Searches current directory and parents for .cinevault/config.yaml
//! - `paths.home` is relative to the .cinevault/ directory; `paths.database`
//!   and `paths.posters` are relative to the project root that contains it

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Cached configuration for the binary (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

const CONFIG_DIR: &str = ".cinevault";
const CONFIG_FILE: &str = "config.yaml";
const DATABASE_FILE: &str = "cinevault.db";
const POSTERS_DIR: &str = "posters";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub browse: Option<BrowseConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// State directory (relative to .cinevault/)
    pub home: Option<String>,
    /// Database file (relative to project root)
    pub database: Option<String>,
    /// Poster directory (relative to project root)
    pub posters: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrowseConfig {
    pub shuffle_on_start: Option<bool>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// State directory
    pub home: PathBuf,
    /// SQLite database file
    pub database: PathBuf,
    /// Imported poster images
    pub posters: PathBuf,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    /// Shuffle the home list when browsing starts
    pub shuffle_on_start: bool,
}

/// Find config file by searching a directory and its parents
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_DIR).join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to `base`
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Environment overrides, read once so resolution stays testable
#[derive(Debug, Clone, Default)]
struct EnvOverrides {
    home: Option<PathBuf>,
    database: Option<PathBuf>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            home: std::env::var("CINEVAULT_HOME").ok().map(PathBuf::from),
            database: std::env::var("CINEVAULT_DB").ok().map(PathBuf::from),
        }
    }
}

fn resolve(
    default_home: PathBuf,
    config_file: Option<PathBuf>,
    env: EnvOverrides,
) -> Result<ResolvedConfig> {
    let Some(config_path) = config_file else {
        let home = env.home.unwrap_or(default_home);
        let database = env.database.unwrap_or_else(|| home.join(DATABASE_FILE));
        return Ok(ResolvedConfig {
            posters: home.join(POSTERS_DIR),
            database,
            home,
            config_file: None,
            shuffle_on_start: true,
        });
    };

    let config = load_config_file(&config_path)?;

    let config_dir = config_path.parent().unwrap_or(Path::new("."));
    let project_root = config_dir.parent().unwrap_or(Path::new("."));

    let home = if let Some(home) = env.home {
        home
    } else if let Some(ref home_path) = config.paths.home {
        resolve_path(config_dir, home_path)
    } else {
        default_home
    };

    let database = if let Some(database) = env.database {
        database
    } else if let Some(ref db_path) = config.paths.database {
        resolve_path(project_root, db_path)
    } else {
        home.join(DATABASE_FILE)
    };

    let posters = match config.paths.posters {
        Some(ref posters) => resolve_path(project_root, posters),
        None => home.join(POSTERS_DIR),
    };

    let shuffle_on_start = config
        .browse
        .as_ref()
        .and_then(|b| b.shuffle_on_start)
        .unwrap_or(true);

    Ok(ResolvedConfig {
        home,
        database,
        posters,
        config_file: Some(config_path),
        shuffle_on_start,
    })
}

/// Load configuration from all sources
pub fn load_config() -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(CONFIG_DIR);

    let config_file = std::env::current_dir()
        .ok()
        .and_then(|cwd| find_config_file(&cwd));

    resolve(default_home, config_file, EnvOverrides::from_env())
}

/// Get the process configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}
