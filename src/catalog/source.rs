//! Pattern sources.
//!
//! A pattern source is the external collaborator that supplies catalog
//! contents at session start: the builtin set compiled into the crate, a local
//! JSON file or directory, or a JSON document served over HTTP.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;

use super::models::AttackPattern;

const BUILTIN_PATTERNS_JSON: &str = include_str!("default_patterns.json");

/// Supplies the raw pattern list for a catalog.
#[async_trait]
pub trait PatternSource: Send + Sync {
    /// Short description used in logs and `CatalogError::Unavailable`.
    fn describe(&self) -> String;

    /// Loads all patterns from the source, in declared order.
    async fn fetch(&self) -> Result<Vec<AttackPattern>>;
}

/// The default catalog shipped with the crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinSource;

#[async_trait]
impl PatternSource for BuiltinSource {
    fn describe(&self) -> String {
        "builtin".to_string()
    }

    async fn fetch(&self) -> Result<Vec<AttackPattern>> {
        parse_patterns(BUILTIN_PATTERNS_JSON).context("Failed to parse builtin patterns")
    }
}

/// Patterns from a local JSON file, or from every `*.json` file in a
/// directory (merged in file-name order).
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /// Creates a source reading from `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl PatternSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch(&self) -> Result<Vec<AttackPattern>> {
        if self.path.is_dir() {
            load_from_dir(&self.path).await
        } else {
            load_from_file(&self.path).await
        }
    }
}

async fn load_from_file(path: &Path) -> Result<Vec<AttackPattern>> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_patterns(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

async fn load_from_dir(dir: &Path) -> Result<Vec<AttackPattern>> {
    let mut files = Vec::new();
    let mut entries = fs::read_dir(dir)
        .await
        .with_context(|| format!("Failed to read directory {}", dir.display()))?;
    while let Some(entry) = entries.next_entry().await? {
        let file_path = entry.path();
        if file_path.extension().and_then(|s| s.to_str()) == Some("json") {
            files.push(file_path);
        }
    }
    files.sort();

    // Any bad file fails the whole load
    let mut patterns = Vec::new();
    for file_path in files {
        patterns.extend(load_from_file(&file_path).await?);
    }
    Ok(patterns)
}

/// Patterns from a JSON document fetched over HTTP(S).
#[derive(Debug, Clone)]
pub struct UrlSource {
    url: String,
    client: reqwest::Client,
}

impl UrlSource {
    /// Creates a source fetching `url` with `client`.
    pub fn new(url: &str, client: reqwest::Client) -> Self {
        Self {
            url: url.to_string(),
            client,
        }
    }
}

#[async_trait]
impl PatternSource for UrlSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    async fn fetch(&self) -> Result<Vec<AttackPattern>> {
        log::info!("Fetching attack patterns from {}", self.url);
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", self.url))?
            .error_for_status()
            .with_context(|| format!("Pattern source {} returned an error status", self.url))?;
        let body = response
            .text()
            .await
            .context("Failed to read pattern source body")?;
        parse_patterns(&body).with_context(|| format!("Failed to parse patterns from {}", self.url))
    }
}

fn parse_patterns(content: &str) -> Result<Vec<AttackPattern>> {
    let patterns: Vec<AttackPattern> =
        serde_json::from_str(content).context("Invalid attack pattern JSON")?;
    Ok(patterns)
}
