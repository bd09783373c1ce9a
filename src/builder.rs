use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::api::{HttpRecipeApi, RecipeApi};
use crate::config::{Backend, ClientConfig};
use crate::display::RecipeView;
use crate::error::ApiError;
use crate::generation::{generated_to_recipe, RecipeGeneration, RecipeSelector};
use crate::page::RecipePage;
use crate::search::SearchController;
use crate::storage::LastViewedStore;

/// Builder for a configured [`HowToCook`] client
#[derive(Debug, Default)]
pub struct HowToCookBuilder {
    config: Option<ClientConfig>,
    backend: Option<Backend>,
    base_url: Option<String>,
    timeout: Option<Duration>,
    storage_path: Option<PathBuf>,
}

impl HowToCookBuilder {
    /// Start from an explicit configuration instead of `howtocook.toml` and the environment
    ///
    /// # Example
    /// ```
    /// use howtocook::{ClientConfig, HowToCook};
    ///
    /// let builder = HowToCook::builder().config(ClientConfig::default());
    /// ```
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Talk to the hosted backend
    ///
    /// # Example
    /// ```
    /// use howtocook::HowToCook;
    ///
    /// let builder = HowToCook::builder().remote();
    /// ```
    pub fn remote(mut self) -> Self {
        self.backend = Some(Backend::Remote);
        self
    }

    pub fn backend(mut self, backend: Backend) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Use a backend at an arbitrary address, e.g. a test server
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Where the last viewed recipe is kept
    pub fn storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = Some(path.into());
        self
    }

    pub fn build(self) -> Result<HowToCook, ApiError> {
        let mut config = match self.config {
            Some(config) => config,
            None => ClientConfig::load()?,
        };

        if let Some(url) = self.base_url {
            config.local_url = url;
            config.backend = Backend::Local;
        } else if let Some(backend) = self.backend {
            config.set_backend(backend);
        }
        if let Some(timeout) = self.timeout {
            config.timeout = timeout.as_secs().max(1);
        }
        if let Some(path) = self.storage_path {
            config.storage_path = Some(path);
        }

        let api = HttpRecipeApi::new(&config)?;
        Ok(HowToCook {
            store: LastViewedStore::from_config(&config),
            api: Arc::new(api),
            config,
        })
    }
}

/// A ready-to-use client: backend, last-viewed storage and configuration
pub struct HowToCook {
    config: ClientConfig,
    api: Arc<dyn RecipeApi>,
    store: LastViewedStore,
}

impl HowToCook {
    pub fn builder() -> HowToCookBuilder {
        HowToCookBuilder::default()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn api(&self) -> Arc<dyn RecipeApi> {
        Arc::clone(&self.api)
    }

    pub fn store(&self) -> &LastViewedStore {
        &self.store
    }

    /// Page state wired to this client
    pub fn page(&self) -> RecipePage {
        RecipePage::new(self.api(), self.store.clone(), &self.config)
    }

    /// Search bar driver wired to this client; call `spawn` on it inside a runtime
    pub fn search_controller(&self, initial_text: impl Into<String>) -> SearchController {
        SearchController::new(
            self.api(),
            &self.config.search,
            self.config.page_size,
            initial_text,
        )
    }

    /// Generate a recipe from the picks and turn it into a displayable card
    pub async fn generate(&self, selector: &RecipeSelector) -> Result<RecipeView, ApiError> {
        let mut generation = RecipeGeneration::new();
        let data = generation
            .generate(self.api.as_ref(), &selector.selections())
            .await?;
        let recipe = generated_to_recipe(&data, chrono::Utc::now());
        Ok(RecipeView::from_recipe(&recipe))
    }
}
