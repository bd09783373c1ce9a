//! Ingredient picking and AI recipe generation.

use chrono::{DateTime, Utc};
use log::{error, info};
use std::time::Duration;
use tokio::time::Instant;

use crate::api::RecipeApi;
use crate::error::ApiError;
use crate::model::{GeneratedRecipeData, GeneratedRecipeSelections, HierarchicalItem, Recipe};
use crate::normalize::{extract_recipe_images, RawContentItem};

/// How long a generation error stays on screen
pub const GENERATION_ERROR_DISMISS: Duration = Duration::from_secs(3);

const DEFAULT_CATEGORY: &str = "AI生成";
const DEFAULT_DIFFICULTY: u32 = 1;
const BULLET: &str = "- ";

/// A row of options on the ingredient picker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectionCategory {
    Vegetables,
    Meats,
    Staples,
    Equipment,
    /// Matching strictness, single choice
    Mode,
}

impl SelectionCategory {
    pub const ALL: [SelectionCategory; 5] = [
        SelectionCategory::Vegetables,
        SelectionCategory::Meats,
        SelectionCategory::Staples,
        SelectionCategory::Equipment,
        SelectionCategory::Mode,
    ];

    /// Options offered before any custom entries
    pub fn presets(&self) -> &'static [&'static str] {
        match self {
            SelectionCategory::Vegetables => &[
                "土豆", "胡萝卜", "花菜", "白萝卜", "西葫芦", "番茄", "芹菜", "黄瓜", "洋葱",
                "莴笋", "菌菇", "茄子", "豆腐", "包菜", "白菜",
            ],
            SelectionCategory::Meats => &[
                "午餐肉", "香肠", "腊肠", "鸡肉", "猪肉", "鸡蛋", "虾", "牛肉", "骨头", "鱼",
            ],
            SelectionCategory::Staples => &["面食", "面包", "米", "方便面"],
            SelectionCategory::Equipment => {
                &["烤箱", "空气炸锅", "微波炉", "电饭煲", "一口能炒又能煮的大锅"]
            }
            SelectionCategory::Mode => &["模糊匹配", "严格匹配"],
        }
    }

    /// Name used on the command line
    pub fn key(&self) -> &'static str {
        match self {
            SelectionCategory::Vegetables => "vegetables",
            SelectionCategory::Meats => "meats",
            SelectionCategory::Staples => "staples",
            SelectionCategory::Equipment => "equipment",
            SelectionCategory::Mode => "mode",
        }
    }

    pub fn from_key(key: &str) -> Result<Self, ApiError> {
        Self::ALL
            .into_iter()
            .find(|category| category.key() == key.trim())
            .ok_or_else(|| ApiError::InvalidInput(format!("Unknown category: {}", key)))
    }

    fn is_single_choice(&self) -> bool {
        matches!(self, SelectionCategory::Mode)
    }
}

/// The user's picks, in selection order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeSelector {
    vegetables: Vec<String>,
    meats: Vec<String>,
    staples: Vec<String>,
    equipment: Vec<String>,
    mode: Vec<String>,
}

impl RecipeSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self, category: SelectionCategory) -> &[String] {
        match category {
            SelectionCategory::Vegetables => &self.vegetables,
            SelectionCategory::Meats => &self.meats,
            SelectionCategory::Staples => &self.staples,
            SelectionCategory::Equipment => &self.equipment,
            SelectionCategory::Mode => &self.mode,
        }
    }

    fn selected_mut(&mut self, category: SelectionCategory) -> &mut Vec<String> {
        match category {
            SelectionCategory::Vegetables => &mut self.vegetables,
            SelectionCategory::Meats => &mut self.meats,
            SelectionCategory::Staples => &mut self.staples,
            SelectionCategory::Equipment => &mut self.equipment,
            SelectionCategory::Mode => &mut self.mode,
        }
    }

    pub fn is_selected(&self, category: SelectionCategory, item: &str) -> bool {
        self.selected(category).iter().any(|s| s == item)
    }

    /// Select or deselect `item`. Picking a different mode replaces the current one.
    pub fn toggle(&mut self, category: SelectionCategory, item: &str) {
        let single = category.is_single_choice();
        let selected = self.selected_mut(category);

        if selected.iter().any(|s| s == item) {
            if single {
                selected.clear();
            } else {
                selected.retain(|s| s != item);
            }
        } else {
            if single {
                selected.clear();
            }
            selected.push(item.to_string());
        }
    }

    /// Add a typed-in option. Blank input is ignored; returns whether anything was added.
    pub fn add_custom(&mut self, category: SelectionCategory, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() || self.is_selected(category, text) {
            return false;
        }
        self.toggle(category, text);
        true
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn selections(&self) -> GeneratedRecipeSelections {
        GeneratedRecipeSelections {
            vegetables: self.vegetables.clone(),
            meats: self.meats.clone(),
            staples: self.staples.clone(),
            equipment: self.equipment.clone(),
            mode: self.mode.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GenerationState {
    Idle,
    Generating,
    Done(Box<GeneratedRecipeData>),
}

/// Progress of one generation request plus its error banner
#[derive(Debug)]
pub struct RecipeGeneration {
    state: GenerationState,
    error: Option<(String, Instant)>,
}

impl Default for RecipeGeneration {
    fn default() -> Self {
        Self::new()
    }
}

impl RecipeGeneration {
    pub fn new() -> Self {
        Self {
            state: GenerationState::Idle,
            error: None,
        }
    }

    pub fn state(&self) -> &GenerationState {
        &self.state
    }

    pub fn is_generating(&self) -> bool {
        self.state == GenerationState::Generating
    }

    pub fn generated(&self) -> Option<&GeneratedRecipeData> {
        match &self.state {
            GenerationState::Done(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_ref().map(|(message, _)| message.as_str())
    }

    /// Post the selections; on failure the message is kept for the banner
    pub async fn generate(
        &mut self,
        api: &dyn RecipeApi,
        selections: &GeneratedRecipeSelections,
    ) -> Result<GeneratedRecipeData, ApiError> {
        self.state = GenerationState::Generating;
        self.error = None;
        info!("Starting recipe generation with selections: {:?}", selections);

        match api.generate_recipe_with_ai(selections).await {
            Ok(data) => {
                self.state = GenerationState::Done(Box::new(data.clone()));
                Ok(data)
            }
            Err(e) => {
                error!("Recipe generation failed: {}", e);
                self.state = GenerationState::Idle;
                self.error = Some((e.to_string(), Instant::now() + GENERATION_ERROR_DISMISS));
                Err(e)
            }
        }
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn clear_recipe(&mut self) {
        self.state = GenerationState::Idle;
        self.error = None;
    }

    /// Dismiss the error banner once it has been up long enough
    pub fn tick(&mut self, now: Instant) {
        if matches!(&self.error, Some((_, until)) if *until <= now) {
            self.error = None;
        }
    }
}

fn bulleted(items: &[RawContentItem]) -> Vec<HierarchicalItem> {
    items
        .iter()
        .map(|item| {
            let mut item = item.normalize();
            if !item.text.starts_with(BULLET) {
                item.text = format!("{}{}", BULLET, item.text);
            }
            item
        })
        .collect()
}

/// Turn a generator response into a displayable recipe
pub fn generated_to_recipe(data: &GeneratedRecipeData, now: DateTime<Utc>) -> Recipe {
    let generated = &data.recipe;

    let mut recipe = Recipe {
        id: format!("generated-{}", now.timestamp_millis()),
        name: generated.name.clone().unwrap_or_default(),
        category: generated
            .category
            .clone()
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        difficulty: generated
            .difficulty
            .as_ref()
            .map(|d| d.as_u32())
            .filter(|d| *d > 0)
            .unwrap_or(DEFAULT_DIFFICULTY),
        description: generated.description.clone().unwrap_or_default(),
        materials: bulleted(&generated.materials),
        calculations: bulleted(&generated.calculations),
        procedure: bulleted(&generated.procedure),
        extra_info: generated
            .extra_info
            .iter()
            .map(RawContentItem::normalize)
            .collect(),
        image_url: generated.image_url.clone().unwrap_or_default(),
        all_image_urls: generated.all_image_urls.clone(),
        images: Vec::new(),
        source_url: generated
            .source_url
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "#".to_string()),
    };
    recipe.images = extract_recipe_images(&recipe);
    recipe
}
