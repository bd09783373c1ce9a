//! Persistence of the last viewed recipe, so a revisit restores it instead of
//! the default search term. One JSON file plays the role of a single
//! local-storage key.

use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::config::ClientConfig;
use crate::error::ApiError;

/// Entries older than this are treated as absent
pub const EXPIRY_DAYS: i64 = 30;

/// Pointer to the most recently opened recipe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastViewedRecipe {
    pub id: String,
    pub name: String,
    pub search_term: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

impl LastViewedRecipe {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        let cutoff = now - Duration::days(EXPIRY_DAYS);
        self.timestamp < cutoff.timestamp_millis()
    }
}

/// What the page should load at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitialRecipeInfo {
    pub search_term: String,
    pub recipe_id: Option<String>,
}

/// File-backed store for [`LastViewedRecipe`]
#[derive(Debug, Clone)]
pub struct LastViewedStore {
    path: PathBuf,
}

impl LastViewedStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.storage_file())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Save the last viewed recipe. Failures are logged, never raised.
    pub fn save(&self, id: &str, name: &str, search_term: &str) {
        if let Err(e) = self.save_at(id, name, search_term, Utc::now()) {
            warn!("Failed to save last viewed recipe: {}", e);
        }
    }

    pub fn save_at(
        &self,
        id: &str,
        name: &str,
        search_term: &str,
        now: DateTime<Utc>,
    ) -> Result<(), ApiError> {
        let data = LastViewedRecipe {
            id: id.to_string(),
            name: name.to_string(),
            search_term: search_term.to_string(),
            timestamp: now.timestamp_millis(),
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string(&data)?)?;
        debug!("Saved last viewed recipe: {:?}", data);
        Ok(())
    }

    /// Read the stored recipe; expired entries are removed and reported as absent
    pub fn load(&self) -> Option<LastViewedRecipe> {
        self.load_at(Utc::now())
    }

    pub fn load_at(&self, now: DateTime<Utc>) -> Option<LastViewedRecipe> {
        let stored = match fs::read_to_string(&self.path) {
            Ok(stored) => stored,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Failed to get last viewed recipe: {}", e);
                return None;
            }
        };

        let data: LastViewedRecipe = match serde_json::from_str(&stored) {
            Ok(data) => data,
            Err(e) => {
                warn!("Failed to get last viewed recipe: {}", e);
                return None;
            }
        };

        if data.is_expired(now) {
            debug!("Last viewed recipe '{}' expired", data.name);
            self.clear();
            return None;
        }

        Some(data)
    }

    pub fn clear(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => info!("Cleared last viewed recipe"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to clear last viewed recipe: {}", e),
        }
    }

    /// Last viewed search term, or `default`
    pub fn initial_search_term(&self, default: &str) -> String {
        self.load()
            .map(|last| last.search_term)
            .unwrap_or_else(|| default.to_string())
    }

    /// Recipe to restore at startup, or just the default search term
    pub fn initial_recipe_info(&self, default: &str) -> InitialRecipeInfo {
        match self.load() {
            Some(last) => InitialRecipeInfo {
                search_term: last.search_term,
                recipe_id: Some(last.id),
            },
            None => InitialRecipeInfo {
                search_term: default.to_string(),
                recipe_id: None,
            },
        }
    }
}
