//! Poster image files managed alongside the catalog.
//!
//! Images are copied into a single posters directory before an entry is
//! saved, and the entry stores the absolute path. Deleting an entry never
//! touches its poster; `orphans` reports files no entry points at.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;
use uuid::Uuid;

const DEFAULT_EXTENSION: &str = "jpg";

/// Directory of imported poster images
#[derive(Debug, Clone)]
pub struct PosterLibrary {
    dir: PathBuf,
}

impl PosterLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Copy `source` into the library as `poster_<uuid>.<ext>`.
    ///
    /// Returns the stored file's absolute path.
    pub async fn import(&self, source: &Path) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create posters directory: {}", self.dir.display()))?;

        let extension = source
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty())
            .unwrap_or(DEFAULT_EXTENSION)
            .to_lowercase();
        let target = self
            .dir
            .join(format!("poster_{}.{}", Uuid::new_v4(), extension));

        fs::copy(source, &target).await.with_context(|| {
            format!(
                "Failed to copy poster {} -> {}",
                source.display(),
                target.display()
            )
        })?;

        let stored = fs::canonicalize(&target).await.unwrap_or(target);
        tracing::debug!("Imported poster {}", stored.display());
        Ok(stored)
    }

    /// Poster files in the library that no entry references
    pub async fn orphans(&self, referenced: &[String]) -> Result<Vec<PathBuf>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let referenced: HashSet<PathBuf> = referenced.iter().map(PathBuf::from).collect();
        let mut orphans = Vec::new();
        let mut entries = fs::read_dir(&self.dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let path = entry.path();
            let canonical = fs::canonicalize(&path).await.unwrap_or_else(|_| path.clone());
            if !referenced.contains(&path) && !referenced.contains(&canonical) {
                orphans.push(path);
            }
        }

        orphans.sort();
        Ok(orphans)
    }
}
