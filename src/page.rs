//! Page-level state: which recipe is on screen, loading flags and the error banner.

use log::{debug, info, warn};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::api::RecipeApi;
use crate::config::ClientConfig;
use crate::display::RecipeView;
use crate::model::Recipe;
use crate::storage::LastViewedStore;

const LOAD_FAILED: &str = "加载食谱失败";
const SEARCH_FAILED: &str = "搜索出错，请稍后再试";

fn not_found(term: &str) -> String {
    format!("未找到\"{}\"的相关食谱", term)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageState {
    /// First load after start-up
    InitialLoading,
    /// A later search or selection is being fetched
    Loading,
    Loaded(Box<RecipeView>),
    /// Nothing to show
    Empty,
}

/// Transient error message, removed by [`RecipePage::tick`] once `until` passes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorBanner {
    pub message: String,
    pub until: Instant,
}

/// Slot holding the token of the page search in progress.
///
/// Clones share the slot, so another task can cancel the search a page is awaiting.
#[derive(Debug, Clone, Default)]
pub struct PendingSearch {
    slot: Arc<Mutex<Option<(u64, CancellationToken)>>>,
}

impl PendingSearch {
    /// Cancel the search in progress, if any
    pub fn cancel(&self) {
        if let Some((id, token)) = self.lock().take() {
            debug!("Cancelling page search #{}", id);
            token.cancel();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.lock().is_some()
    }

    /// Register a new search, cancelling the one it supersedes
    fn begin(&self, id: u64, token: CancellationToken) {
        if let Some((old, previous)) = self.lock().replace((id, token)) {
            debug!("Page search #{} superseded by #{}", old, id);
            previous.cancel();
        }
    }

    fn finish(&self, id: u64) {
        let mut slot = self.lock();
        if matches!(slot.as_ref(), Some((current, _)) if *current == id) {
            *slot = None;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<(u64, CancellationToken)>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct RecipePage {
    api: Arc<dyn RecipeApi>,
    store: LastViewedStore,
    default_term: String,
    page_size: u32,
    error_dismiss: Duration,
    state: PageState,
    recipe: Option<Recipe>,
    search_term: String,
    error: Option<ErrorBanner>,
    pending: PendingSearch,
    searches: u64,
}

impl RecipePage {
    pub fn new(api: Arc<dyn RecipeApi>, store: LastViewedStore, config: &ClientConfig) -> Self {
        Self {
            api,
            store,
            default_term: config.default_search_term.clone(),
            page_size: config.page_size,
            error_dismiss: config.error_dismiss(),
            state: PageState::InitialLoading,
            recipe: None,
            search_term: String::new(),
            error: None,
            pending: PendingSearch::default(),
            searches: 0,
        }
    }

    pub fn state(&self) -> &PageState {
        &self.state
    }

    pub fn recipe(&self) -> Option<&Recipe> {
        self.recipe.as_ref()
    }

    pub fn view(&self) -> Option<&RecipeView> {
        match &self.state {
            PageState::Loaded(view) => Some(view),
            _ => None,
        }
    }

    /// Current contents of the search field
    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn error(&self) -> Option<&ErrorBanner> {
        self.error.as_ref()
    }

    /// Handle on the search in progress. Cancelling it from another task abandons that search.
    pub fn pending_search(&self) -> PendingSearch {
        self.pending.clone()
    }

    /// Restore the last viewed recipe, or search for the default term
    pub async fn initialize(&mut self) {
        self.state = PageState::InitialLoading;
        let initial = self.store.initial_recipe_info(&self.default_term);
        self.search_term = initial.search_term.clone();

        if let Some(id) = initial.recipe_id {
            info!("Restoring last viewed recipe {}", id);
            match self.api.get_recipe_by_id(&id).await {
                Some(recipe) => {
                    self.show(recipe);
                    return;
                }
                None => warn!("Last viewed recipe {} is gone, searching instead", id),
            }
        }

        self.search_and_show(&initial.search_term).await;
    }

    /// Search `term` and show the first hit
    pub async fn search_and_show(&mut self, term: &str) {
        self.pending.cancel();
        self.search_term = term.to_string();

        let term = term.trim();
        if term.is_empty() {
            self.recipe = None;
            self.state = PageState::Empty;
            return;
        }

        self.searches += 1;
        let id = self.searches;
        let token = CancellationToken::new();
        self.pending.begin(id, token.clone());
        if self.state != PageState::InitialLoading {
            self.state = PageState::Loading;
        }

        debug!("Searching for: {}", term);
        let result = self
            .api
            .search_recipes(term, "", 1, self.page_size, &token)
            .await;

        let page = match result {
            _ if token.is_cancelled() => {
                self.abandon(term);
                return;
            }
            Ok(page) => page,
            Err(e) => {
                self.pending.finish(id);
                warn!("Error searching recipes: {}", e);
                self.show_error(SEARCH_FAILED);
                self.settle_empty();
                return;
            }
        };

        let Some(first) = page.data.first() else {
            self.pending.finish(id);
            self.show_error(&not_found(term));
            self.settle_empty();
            return;
        };

        info!("Found recipe: {}", first.name);
        let recipe = self.api.get_recipe_by_id(&first.id).await;
        if token.is_cancelled() {
            self.abandon(term);
            return;
        }
        self.pending.finish(id);

        match recipe {
            Some(recipe) => self.show(recipe),
            None => {
                self.show_error(&not_found(term));
                self.settle_empty();
            }
        }
    }

    /// Open a recipe picked from the search results.
    ///
    /// Returns the text the search field should now show.
    pub async fn select_recipe(&mut self, id: &str) -> Option<String> {
        self.pending.cancel();
        self.state = PageState::Loading;

        match self.api.get_recipe_by_id(id).await {
            Some(recipe) => {
                self.search_term = recipe.name.clone();
                self.store.save(&recipe.id, &recipe.name, &self.search_term);
                self.show(recipe);
                Some(self.search_term.clone())
            }
            None => {
                self.show_error(LOAD_FAILED);
                self.settle_empty();
                None
            }
        }
    }

    /// Drop the error banner once it has expired
    pub fn tick(&mut self, now: Instant) {
        if matches!(&self.error, Some(banner) if banner.until <= now) {
            self.error = None;
        }
    }

    /// A cancelled search leaves whatever was on screen before it
    fn abandon(&mut self, term: &str) {
        debug!("Search for {} was cancelled", term);
        self.settle_empty();
    }

    fn show(&mut self, recipe: Recipe) {
        self.state = PageState::Loaded(Box::new(RecipeView::from_recipe(&recipe)));
        self.recipe = Some(recipe);
    }

    /// Leave whatever was showing, unless nothing ever loaded
    fn settle_empty(&mut self) {
        self.state = match self.recipe.as_ref() {
            Some(recipe) => PageState::Loaded(Box::new(RecipeView::from_recipe(recipe))),
            None => PageState::Empty,
        };
    }

    fn show_error(&mut self, message: &str) {
        warn!("{}", message);
        self.error = Some(ErrorBanner {
            message: message.to_string(),
            until: Instant::now() + self.error_dismiss,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::model::{
        Category, GeneratedRecipeData, GeneratedRecipeSelections, Page, RecipeSummary,
    };
    use async_trait::async_trait;
    use tempfile::TempDir;

    /// In-memory backend holding a fixed set of recipes
    struct FixedApi {
        recipes: Vec<Recipe>,
        search_delay: Duration,
    }

    #[async_trait]
    impl RecipeApi for FixedApi {
        async fn fetch_recipes(&self, _page: u32, _limit: u32) -> Page<RecipeSummary> {
            Page::empty()
        }

        async fn search_recipes(
            &self,
            query: &str,
            _category: &str,
            _page: u32,
            _limit: u32,
            cancel: &CancellationToken,
        ) -> Result<Page<RecipeSummary>, ApiError> {
            tokio::select! {
                _ = cancel.cancelled() => return Err(ApiError::Cancelled),
                _ = tokio::time::sleep(self.search_delay) => {}
            }
            let data: Vec<RecipeSummary> = self
                .recipes
                .iter()
                .filter(|r| r.name.contains(query))
                .map(|r| RecipeSummary {
                    id: r.id.clone(),
                    name: r.name.clone(),
                    category: r.category.clone(),
                })
                .collect();
            Ok(Page {
                total: data.len() as u64,
                total_pages: 1,
                page: 1,
                data,
            })
        }

        async fn get_recipe_by_id(&self, id: &str) -> Option<Recipe> {
            self.recipes.iter().find(|r| r.id == id).cloned()
        }

        async fn get_categories(&self) -> Vec<Category> {
            Vec::new()
        }

        async fn generate_recipe_with_ai(
            &self,
            _selections: &GeneratedRecipeSelections,
        ) -> Result<GeneratedRecipeData, ApiError> {
            Err(ApiError::Generation("unused".to_string()))
        }
    }

    fn recipe(id: &str, name: &str) -> Recipe {
        Recipe {
            id: id.to_string(),
            name: name.to_string(),
            difficulty: 2,
            ..Default::default()
        }
    }

    fn page(dir: &TempDir) -> RecipePage {
        slow_page(dir, Duration::ZERO)
    }

    fn slow_page(dir: &TempDir, search_delay: Duration) -> RecipePage {
        let api = Arc::new(FixedApi {
            recipes: vec![recipe("r1", "酸梅汤"), recipe("r2", "红烧肉")],
            search_delay,
        });
        let store = LastViewedStore::new(dir.path().join("last_viewed.json"));
        RecipePage::new(api, store, &ClientConfig::default())
    }

    #[tokio::test]
    async fn test_initialize_searches_default_term() {
        let dir = TempDir::new().unwrap();
        let mut page = page(&dir);

        page.initialize().await;
        assert_eq!(page.recipe().map(|r| r.id.as_str()), Some("r1"));
        assert_eq!(page.search_term(), "酸梅汤");
        assert!(page.error().is_none());
    }

    #[tokio::test]
    async fn test_initialize_restores_last_viewed() {
        let dir = TempDir::new().unwrap();
        LastViewedStore::new(dir.path().join("last_viewed.json")).save("r2", "红烧肉", "红烧");
        let mut page = page(&dir);

        page.initialize().await;
        assert_eq!(page.recipe().map(|r| r.id.as_str()), Some("r2"));
        assert_eq!(page.search_term(), "红烧");
    }

    #[tokio::test]
    async fn test_select_recipe_saves_last_viewed() {
        let dir = TempDir::new().unwrap();
        let mut page = page(&dir);

        let text = page.select_recipe("r2").await;
        assert_eq!(text.as_deref(), Some("红烧肉"));

        let saved = LastViewedStore::new(dir.path().join("last_viewed.json"))
            .load()
            .unwrap();
        assert_eq!(saved.id, "r2");
        assert_eq!(saved.name, "红烧肉");
    }

    #[tokio::test]
    async fn test_select_missing_recipe_shows_banner() {
        let dir = TempDir::new().unwrap();
        let mut page = page(&dir);

        assert!(page.select_recipe("nope").await.is_none());
        assert_eq!(page.error().map(|e| e.message.as_str()), Some("加载食谱失败"));
        assert_eq!(page.state(), &PageState::Empty);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_banner_dismisses() {
        let dir = TempDir::new().unwrap();
        let mut page = page(&dir);

        page.search_and_show("佛跳墙").await;
        assert_eq!(
            page.error().map(|e| e.message.as_str()),
            Some("未找到\"佛跳墙\"的相关食谱")
        );

        page.tick(Instant::now() + Duration::from_millis(2999));
        assert!(page.error().is_some());
        page.tick(Instant::now() + Duration::from_millis(3000));
        assert!(page.error().is_none());
    }

    #[tokio::test]
    async fn test_failed_search_keeps_current_recipe() {
        let dir = TempDir::new().unwrap();
        let mut page = page(&dir);

        page.search_and_show("红烧").await;
        page.search_and_show("佛跳墙").await;
        assert_eq!(page.view().map(|v| v.id.as_str()), Some("r2"));
        assert!(page.error().is_some());
    }

    #[tokio::test]
    async fn test_empty_term_clears_page() {
        let dir = TempDir::new().unwrap();
        let mut page = page(&dir);

        page.search_and_show("酸梅").await;
        page.search_and_show("   ").await;
        assert_eq!(page.state(), &PageState::Empty);
        assert!(page.recipe().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_search_keeps_current_recipe() {
        let dir = TempDir::new().unwrap();
        let mut page = slow_page(&dir, Duration::from_secs(1));
        page.select_recipe("r2").await;

        let pending = page.pending_search();
        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            pending.cancel();
        });

        page.search_and_show("酸梅").await;
        canceller.await.unwrap();

        assert_eq!(page.view().map(|v| v.id.as_str()), Some("r2"));
        assert!(page.error().is_none());
        assert!(!page.pending_search().is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_first_search_settles_empty() {
        let dir = TempDir::new().unwrap();
        let mut page = slow_page(&dir, Duration::from_secs(1));

        let pending = page.pending_search();
        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            assert!(pending.is_pending());
            pending.cancel();
        });

        page.initialize().await;
        canceller.await.unwrap();

        assert_eq!(page.state(), &PageState::Empty);
        assert!(page.recipe().is_none());
        assert!(page.error().is_none());
    }

    #[tokio::test]
    async fn test_finished_search_is_no_longer_pending() {
        let dir = TempDir::new().unwrap();
        let mut page = page(&dir);

        page.search_and_show("酸梅").await;
        assert!(!page.pending_search().is_pending());
        page.search_and_show("佛跳墙").await;
        assert!(!page.pending_search().is_pending());
    }
}
