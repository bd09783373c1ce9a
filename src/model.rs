use serde::{Deserialize, Serialize};

/// One line of recipe content with its indentation depth (0 is baseline)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchicalItem {
    pub text: String,
    pub level: u32,
}

impl HierarchicalItem {
    pub fn new(text: impl Into<String>, level: u32) -> Self {
        Self {
            text: text.into(),
            level,
        }
    }
}

/// A recipe in canonical shape. Only produced by the normalization boundary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub category: String,
    pub difficulty: u32,
    pub description: String,
    pub materials: Vec<HierarchicalItem>,
    pub calculations: Vec<HierarchicalItem>,
    pub procedure: Vec<HierarchicalItem>,
    pub extra_info: Vec<HierarchicalItem>,
    pub image_url: String,
    pub all_image_urls: Vec<String>,
    /// Every image URL known for this recipe, derived at ingestion
    pub images: Vec<String>,
    pub source_url: String,
}

impl Recipe {
    pub fn section(&self, section: Section) -> &[HierarchicalItem] {
        match section {
            Section::Materials => &self.materials,
            Section::Calculations => &self.calculations,
            Section::Procedure => &self.procedure,
            Section::ExtraInfo => &self.extra_info,
        }
    }

    /// Known image URLs used when resolving relative markdown images
    pub fn known_image_urls(&self) -> Vec<String> {
        let mut urls = self.images.clone();
        for url in &self.all_image_urls {
            if !urls.contains(url) {
                urls.push(url.clone());
            }
        }
        urls
    }
}

/// The four content sections of a recipe, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Materials,
    Calculations,
    Procedure,
    ExtraInfo,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::Materials,
        Section::Calculations,
        Section::Procedure,
        Section::ExtraInfo,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Section::Materials => "必备原料和工具",
            Section::Calculations => "计算",
            Section::Procedure => "操作",
            Section::ExtraInfo => "附加内容",
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            Section::Materials => "materials",
            Section::Calculations => "calculations",
            Section::Procedure => "procedure",
            Section::ExtraInfo => "extra-info",
        }
    }
}

/// Minimal projection used by the search dropdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub name: String,
}

/// Row of a list or search response
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RecipeSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub category: String,
}

impl From<&RecipeSummary> for SearchResult {
    fn from(summary: &RecipeSummary) -> Self {
        SearchResult {
            id: summary.id.clone(),
            name: summary.name.clone(),
        }
    }
}

/// Paginated list response
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub total: u64,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub total_pages: u32,
}

fn first_page() -> u32 {
    1
}

impl<T> Page<T> {
    /// Neutral result returned whenever a list call fails
    pub fn empty() -> Self {
        Page {
            data: Vec::new(),
            total: 0,
            page: 1,
            total_pages: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A backend category; older deployments return bare strings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Category {
    Name(String),
    Counted {
        name: String,
        #[serde(default)]
        count: u64,
    },
}

impl Category {
    pub fn name(&self) -> &str {
        match self {
            Category::Name(name) => name,
            Category::Counted { name, .. } => name,
        }
    }
}

/// User choices sent verbatim to the generation endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GeneratedRecipeSelections {
    pub vegetables: Vec<String>,
    pub meats: Vec<String>,
    pub staples: Vec<String>,
    pub equipment: Vec<String>,
    pub mode: Vec<String>,
}

/// Payload of a successful generation
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedRecipeData {
    pub recipe: GeneratedRecipe,
    #[serde(default)]
    pub raw_markdown: String,
}

/// Recipe shape returned by the generator. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratedRecipe {
    pub name: Option<String>,
    pub category: Option<String>,
    pub difficulty: Option<crate::normalize::RawNumber>,
    pub description: Option<String>,
    pub materials: Vec<crate::normalize::RawContentItem>,
    pub calculations: Vec<crate::normalize::RawContentItem>,
    pub procedure: Vec<crate::normalize::RawContentItem>,
    pub extra_info: Vec<crate::normalize::RawContentItem>,
    pub image_url: Option<String>,
    pub all_image_urls: Vec<String>,
    pub source_url: Option<String>,
}
