mod http;

pub use http::HttpRecipeApi;

use async_trait::async_trait;
use log::debug;
use tokio_util::sync::CancellationToken;

use crate::error::ApiError;
use crate::model::{
    Category, GeneratedRecipeData, GeneratedRecipeSelections, Page, Recipe, RecipeSummary,
};

/// The backend's REST surface as the client sees it.
///
/// List and lookup calls never fail: transport and decoding problems are logged
/// and turned into a neutral value. The only error a list call can return is
/// [`ApiError::Cancelled`], so callers can tell "aborted" from "nothing found".
#[async_trait]
pub trait RecipeApi: Send + Sync {
    /// `GET /api/recipes?page&limit`
    async fn fetch_recipes(&self, page: u32, limit: u32) -> Page<RecipeSummary>;

    /// `GET /api/search?query&category&page&limit`
    async fn search_recipes(
        &self,
        query: &str,
        category: &str,
        page: u32,
        limit: u32,
        cancel: &CancellationToken,
    ) -> Result<Page<RecipeSummary>, ApiError>;

    /// `GET /api/recipes/:id`, normalized
    async fn get_recipe_by_id(&self, id: &str) -> Option<Recipe>;

    /// `GET /api/categories`
    async fn get_categories(&self) -> Vec<Category>;

    /// `POST /api/recipes/generate`
    async fn generate_recipe_with_ai(
        &self,
        selections: &GeneratedRecipeSelections,
    ) -> Result<GeneratedRecipeData, ApiError>;
}

/// Page size used when scanning the full list
const SCAN_PAGE_SIZE: u32 = 20;

/// Walk the paginated recipe list until a recipe whose name contains `name` turns up
pub async fn find_recipe_by_name(api: &dyn RecipeApi, name: &str) -> Option<RecipeSummary> {
    let mut page = 1;
    debug!("Searching for recipe: \"{}\"", name);

    loop {
        debug!("Checking page {}...", page);
        let result = api.fetch_recipes(page, SCAN_PAGE_SIZE).await;
        if result.is_empty() {
            return None;
        }

        if let Some(found) = result.data.into_iter().find(|r| r.name.contains(name)) {
            return Some(found);
        }

        if page >= result.total_pages {
            return None;
        }
        page += 1;
    }
}
