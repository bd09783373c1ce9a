use async_trait::async_trait;
use log::{debug, error, info};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::api::RecipeApi;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::model::{
    Category, GeneratedRecipeData, GeneratedRecipeSelections, Page, Recipe, RecipeSummary,
};
use crate::normalize::{normalize_recipe, RawRecipe};

const DEFAULT_GENERATION_ERROR: &str = "Failed to generate recipe";

/// Everything but unreserved characters is escaped inside a path segment
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Envelope of `POST /api/recipes/generate`
#[derive(Debug, Deserialize)]
struct GenerationResponse {
    #[serde(default)]
    success: bool,
    message: Option<String>,
    data: Option<GeneratedRecipeData>,
}

/// [`RecipeApi`] over HTTP with reqwest
pub struct HttpRecipeApi {
    client: Client,
    base_url: String,
}

impl HttpRecipeApi {
    /// Create a client for the backend selected in `config`
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("howtocook-client/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(HttpRecipeApi {
            client,
            base_url: config.api_url().trim_end_matches('/').to_string(),
        })
    }

    #[doc(hidden)]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        HttpRecipeApi {
            client: Client::builder()
                .timeout(Duration::from_secs(5))
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl RecipeApi for HttpRecipeApi {
    async fn fetch_recipes(&self, page: u32, limit: u32) -> Page<RecipeSummary> {
        let request = self
            .client
            .get(self.url("/api/recipes"))
            .query(&[("page", page), ("limit", limit)]);

        match self.send_json(request).await {
            Ok(page) => page,
            Err(e) => {
                error!("Error fetching recipes: {}", e);
                Page::empty()
            }
        }
    }

    async fn search_recipes(
        &self,
        query: &str,
        category: &str,
        page: u32,
        limit: u32,
        cancel: &CancellationToken,
    ) -> Result<Page<RecipeSummary>, ApiError> {
        if cancel.is_cancelled() {
            return Err(ApiError::Cancelled);
        }

        let mut params: Vec<(&str, String)> =
            vec![("page", page.to_string()), ("limit", limit.to_string())];
        if !query.is_empty() {
            params.push(("query", query.to_string()));
        }
        if !category.is_empty() {
            params.push(("category", category.to_string()));
        }

        let request = self.client.get(self.url("/api/search")).query(&params);
        debug!("Searching with query '{}' category '{}'", query, category);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Search for '{}' aborted", query);
                Err(ApiError::Cancelled)
            }
            result = self.send_json::<Page<RecipeSummary>>(request) => match result {
                Ok(page) => Ok(page),
                Err(e) => {
                    error!("Search error details: {}", e);
                    Ok(Page::empty())
                }
            }
        }
    }

    async fn get_recipe_by_id(&self, id: &str) -> Option<Recipe> {
        if id.is_empty() {
            return None;
        }

        let url = self.url(&format!(
            "/api/recipes/{}",
            utf8_percent_encode(id, PATH_SEGMENT)
        ));
        debug!("Fetching recipe with ID {} from: {}", id, url);

        match self.send_json::<RawRecipe>(self.client.get(url)).await {
            Ok(raw) => {
                let recipe = normalize_recipe(raw);
                info!("Successfully fetched recipe: {}", recipe.name);
                Some(recipe)
            }
            Err(e) => {
                error!("Error fetching recipe with ID {}: {}", id, e);
                None
            }
        }
    }

    async fn get_categories(&self) -> Vec<Category> {
        match self
            .send_json(self.client.get(self.url("/api/categories")))
            .await
        {
            Ok(categories) => categories,
            Err(e) => {
                error!("Error fetching categories: {}", e);
                Vec::new()
            }
        }
    }

    async fn generate_recipe_with_ai(
        &self,
        selections: &GeneratedRecipeSelections,
    ) -> Result<GeneratedRecipeData, ApiError> {
        info!("Starting recipe generation with selections: {:?}", selections);

        let response = self
            .client
            .post(self.url("/api/recipes/generate"))
            .json(&json!({ "selections": selections }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let parsed = serde_json::from_str::<GenerationResponse>(&body);

        if !status.is_success() {
            let message = parsed
                .ok()
                .and_then(|r| r.message)
                .unwrap_or_else(|| format!("{} (status {})", DEFAULT_GENERATION_ERROR, status.as_u16()));
            error!("Recipe generation failed: {}", message);
            return Err(ApiError::Generation(message));
        }

        let parsed = parsed?;
        if !parsed.success {
            let message = parsed
                .message
                .unwrap_or_else(|| DEFAULT_GENERATION_ERROR.to_string());
            error!("Recipe generation failed: {}", message);
            return Err(ApiError::Generation(message));
        }

        parsed.data.ok_or_else(|| {
            ApiError::Generation("Generation response did not include a recipe".to_string())
        })
    }
}
