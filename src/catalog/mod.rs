//! Attack pattern catalog.
//!
//! The catalog is the immutable, ordered set of attack patterns available to a
//! session. It is loaded once from a [`PatternSource`], checked for present
//! and unique ids, and then shared read-only between the engine and every
//! batch run. An empty catalog loads; running a batch over it does not.

mod models;
mod source;

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error_handling::CatalogError;

pub use models::{AttackCategory, AttackPattern, RequestTemplate};
pub use source::{BuiltinSource, FileSource, PatternSource, UrlSource};

/// Ordered, id-indexed set of attack patterns.
#[derive(Debug, Clone)]
pub struct PatternCatalog {
    patterns: Vec<AttackPattern>,
    index: HashMap<String, usize>,
    origin: String,
}

impl PatternCatalog {
    /// Builds a catalog from patterns, keeping their order.
    ///
    /// Fails with `CatalogError::Unavailable` if an id is empty or appears
    /// more than once.
    pub fn from_patterns(
        origin: &str,
        patterns: Vec<AttackPattern>,
    ) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(patterns.len());
        for (position, pattern) in patterns.iter().enumerate() {
            if pattern.id.trim().is_empty() {
                return Err(CatalogError::Unavailable {
                    origin: origin.to_string(),
                    reason: format!("pattern at position {} has an empty id", position),
                });
            }
            if index.insert(pattern.id.clone(), position).is_some() {
                return Err(CatalogError::Unavailable {
                    origin: origin.to_string(),
                    reason: format!("duplicate pattern id '{}'", pattern.id),
                });
            }
        }
        Ok(Self {
            patterns,
            index,
            origin: origin.to_string(),
        })
    }

    /// Where the catalog was loaded from.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// All patterns, in catalog order.
    pub fn list(&self) -> &[AttackPattern] {
        &self.patterns
    }

    /// Looks a pattern up by id.
    pub fn get(&self, id: &str) -> Result<&AttackPattern, CatalogError> {
        self.index
            .get(id)
            .map(|&position| &self.patterns[position])
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))
    }

    /// Category of the pattern with `id`, if it exists.
    pub fn category_of(&self, id: &str) -> Option<AttackCategory> {
        self.get(id).ok().map(|p| p.category)
    }

    /// Number of patterns.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether the catalog has no patterns.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Patterns of one category, in catalog order.
    pub fn by_category(&self, category: AttackCategory) -> Vec<&AttackPattern> {
        self.patterns
            .iter()
            .filter(|p| p.category == category)
            .collect()
    }

    /// Categories present in the catalog.
    pub fn categories(&self) -> BTreeSet<AttackCategory> {
        self.patterns.iter().map(|p| p.category).collect()
    }

    /// Resolves a list of ids to patterns.
    ///
    /// The result follows catalog order regardless of the order of `ids`.
    /// Unknown ids fail with `CatalogError::NotFound` naming the first one.
    pub fn select(&self, ids: &[String]) -> Result<Vec<AttackPattern>, CatalogError> {
        let mut wanted = HashSet::with_capacity(ids.len());
        for id in ids {
            self.get(id)?;
            wanted.insert(id.as_str());
        }
        Ok(self
            .patterns
            .iter()
            .filter(|p| wanted.contains(p.id.as_str()))
            .cloned()
            .collect())
    }
}

/// Loads and validates a catalog from `source`.
///
/// Every failure, from I/O to malformed JSON to duplicate ids, surfaces as
/// `CatalogError::Unavailable` naming the source.
pub async fn load_catalog(source: &dyn PatternSource) -> Result<PatternCatalog, CatalogError> {
    let origin = source.describe();
    let patterns = source
        .fetch()
        .await
        .map_err(|e| CatalogError::Unavailable {
            origin: origin.clone(),
            reason: format!("{:#}", e),
        })?;
    let catalog = PatternCatalog::from_patterns(&origin, patterns)?;
    if catalog.is_empty() {
        log::warn!("Pattern catalog from {} is empty", origin);
    } else {
        log::info!(
            "Loaded {} attack patterns in {} categories from {}",
            catalog.len(),
            catalog.categories().len(),
            origin
        );
    }
    Ok(catalog)
}

/// Session-scoped catalog cache.
///
/// The first successful load is kept for the life of the session. A failed
/// load is not cached, so the next call tries the source again.
pub struct SessionCatalog {
    source: Arc<dyn PatternSource>,
    cached: RwLock<Option<Arc<PatternCatalog>>>,
}

impl SessionCatalog {
    /// Creates a cache over `source`. Nothing is loaded yet.
    pub fn new(source: Arc<dyn PatternSource>) -> Self {
        Self {
            source,
            cached: RwLock::new(None),
        }
    }

    /// Returns the cached catalog, loading it on first use.
    pub async fn get_or_load(&self) -> Result<Arc<PatternCatalog>, CatalogError> {
        {
            let cache = self.cached.read().await;
            if let Some(catalog) = cache.as_ref() {
                return Ok(Arc::clone(catalog));
            }
        }

        let mut cache = self.cached.write().await;
        // Another caller may have loaded it while we waited for the write lock
        if let Some(catalog) = cache.as_ref() {
            return Ok(Arc::clone(catalog));
        }
        let catalog = Arc::new(load_catalog(self.source.as_ref()).await?);
        *cache = Some(Arc::clone(&catalog));
        Ok(catalog)
    }

    /// Whether a catalog has been loaded.
    pub async fn is_loaded(&self) -> bool {
        self.cached.read().await.is_some()
    }
}
