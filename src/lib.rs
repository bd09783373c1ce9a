pub mod api;
pub mod builder;
pub mod config;
pub mod display;
pub mod error;
pub mod generation;
pub mod markdown;
pub mod model;
pub mod normalize;
pub mod page;
pub mod search;
pub mod storage;

pub use api::{find_recipe_by_name, HttpRecipeApi, RecipeApi};
pub use builder::{HowToCook, HowToCookBuilder};
pub use config::{Backend, ClientConfig, SearchConfig};
pub use display::{RecipeView, SafeImage};
pub use error::ApiError;
pub use generation::{generated_to_recipe, RecipeGeneration, RecipeSelector, SelectionCategory};
pub use model::{
    Category, GeneratedRecipeData, GeneratedRecipeSelections, HierarchicalItem, Page, Recipe,
    RecipeSummary, SearchResult, Section,
};
pub use page::{PageState, PendingSearch, RecipePage};
pub use search::{SearchBar, SearchController, SearchEvent};
pub use storage::{LastViewedRecipe, LastViewedStore};
